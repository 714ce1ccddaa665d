//! Conversation history window.
//!
//! Renders the most recent turns of a conversation into the transcript
//! block used by the prompt assembler.

use docent_core::types::{Message, Role, Turn};

/// Emitted verbatim when a conversation has no completed turns yet.
pub const NO_HISTORY_SENTINEL: &str = "No previous conversation.";

/// Pair stored messages into user/assistant turns.
///
/// Messages are expected in chronological order. A user message opens a
/// turn; the next assistant message closes it. Unpaired messages (an
/// assistant reply with no preceding question, or a trailing question
/// with no reply yet) are skipped.
pub fn pair_turns(messages: &[Message]) -> Vec<Turn> {
    let mut turns = Vec::new();
    let mut pending: Option<&Message> = None;

    for message in messages {
        match message.role {
            Role::User => pending = Some(message),
            Role::Assistant => {
                if let Some(question) = pending.take() {
                    turns.push(Turn {
                        question: question.content.clone(),
                        answer: message.content.clone(),
                    });
                }
            }
        }
    }

    turns
}

/// Renders the last N turns of a conversation as a transcript block.
#[derive(Debug, Clone, Copy)]
pub struct HistoryWindow {
    turns: usize,
}

impl HistoryWindow {
    pub fn new(turns: usize) -> Self {
        Self { turns }
    }

    /// Render the trailing window of `turns` as a transcript.
    ///
    /// Returns [`NO_HISTORY_SENTINEL`] when there are no completed turns.
    pub fn render(&self, turns: &[Turn]) -> String {
        let start = turns.len().saturating_sub(self.turns);
        let window = &turns[start..];

        if window.is_empty() {
            return NO_HISTORY_SENTINEL.to_string();
        }

        window
            .iter()
            .map(|turn| format!("User: {}\nAssistant: {}", turn.question, turn.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Pair raw messages and render the trailing window in one step.
    pub fn render_messages(&self, messages: &[Message]) -> String {
        self.render(&pair_turns(messages))
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new(docent_core::config::ChatConfig::default().history_turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn message(role: Role, content: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    fn turn(q: &str, a: &str) -> Turn {
        Turn {
            question: q.to_string(),
            answer: a.to_string(),
        }
    }

    // ---- Pairing ----

    #[test]
    fn test_pairs_user_then_assistant() {
        let messages = vec![
            message(Role::User, "What is a runnable?"),
            message(Role::Assistant, "A composable unit of work."),
        ];
        let turns = pair_turns(&messages);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].question, "What is a runnable?");
        assert_eq!(turns[0].answer, "A composable unit of work.");
    }

    #[test]
    fn test_trailing_unanswered_question_skipped() {
        let messages = vec![
            message(Role::User, "first"),
            message(Role::Assistant, "answer"),
            message(Role::User, "still pending"),
        ];
        let turns = pair_turns(&messages);
        assert_eq!(turns.len(), 1);
    }

    #[test]
    fn test_orphan_assistant_message_skipped() {
        let messages = vec![message(Role::Assistant, "hello")];
        assert!(pair_turns(&messages).is_empty());
    }

    #[test]
    fn test_consecutive_user_messages_keep_latest() {
        let messages = vec![
            message(Role::User, "first attempt"),
            message(Role::User, "second attempt"),
            message(Role::Assistant, "answer"),
        ];
        let turns = pair_turns(&messages);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].question, "second attempt");
    }

    // ---- Rendering ----

    #[test]
    fn test_empty_history_yields_sentinel() {
        let window = HistoryWindow::default();
        assert_eq!(window.render(&[]), NO_HISTORY_SENTINEL);
    }

    #[test]
    fn test_single_turn_format() {
        let window = HistoryWindow::default();
        let rendered = window.render(&[turn("q1", "a1")]);
        assert_eq!(rendered, "User: q1\nAssistant: a1");
    }

    #[test]
    fn test_window_keeps_most_recent_turns() {
        let window = HistoryWindow::new(3);
        let turns: Vec<Turn> = (1..=5).map(|i| turn(&format!("q{i}"), &format!("a{i}"))).collect();
        let rendered = window.render(&turns);
        assert!(!rendered.contains("q1"));
        assert!(!rendered.contains("q2"));
        assert!(rendered.contains("User: q3"));
        assert!(rendered.contains("User: q5"));
    }

    #[test]
    fn test_window_preserves_chronological_order() {
        let window = HistoryWindow::new(3);
        let rendered = window.render(&[turn("older", "x"), turn("newer", "y")]);
        let older = rendered.find("older").unwrap();
        let newer = rendered.find("newer").unwrap();
        assert!(older < newer);
    }

    #[test]
    fn test_fewer_turns_than_window_renders_all() {
        let window = HistoryWindow::new(3);
        let rendered = window.render(&[turn("only", "one")]);
        assert_eq!(rendered, "User: only\nAssistant: one");
    }

    #[test]
    fn test_render_messages_end_to_end() {
        let window = HistoryWindow::default();
        let messages = vec![
            message(Role::User, "q"),
            message(Role::Assistant, "a"),
            message(Role::User, "pending"),
        ];
        assert_eq!(window.render_messages(&messages), "User: q\nAssistant: a");
    }
}
