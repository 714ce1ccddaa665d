//! Prompt assembly.
//!
//! Fills the answer-generation template with the curated context, the
//! rendered history window, and the user's question.

use crate::error::ChatError;

/// Fallback phrasing the model is instructed to use when the context
/// does not cover the question.
pub const CAVEAT_SENTINEL: &str =
    "I don't have information about that in my specific documentation, but generally speaking...";

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const HISTORY_PLACEHOLDER: &str = "{chat_history}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// Which slot a template placeholder fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Context,
    History,
    Question,
}

/// Assembles the final prompt from a validated template.
///
/// The template is split at its placeholders once, at construction, so
/// `assemble` cannot fail and substituted values are never re-scanned.
/// A context block that happens to contain the literal text
/// `{question}` lands in the prompt verbatim.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    template: String,
    /// Fixed text between placeholders, in template order. Always one
    /// more entry than `order`.
    parts: Vec<String>,
    /// Which slot fills the gap after each part.
    order: Vec<Slot>,
}

impl PromptAssembler {
    /// Build an assembler from a template.
    ///
    /// The template must contain each of `{context}`, `{chat_history}`
    /// and `{question}` exactly once.
    pub fn new(template: impl Into<String>) -> Result<Self, ChatError> {
        let template = template.into();

        let mut found: Vec<(usize, usize, Slot)> = Vec::with_capacity(3);
        for (placeholder, slot) in [
            (CONTEXT_PLACEHOLDER, Slot::Context),
            (HISTORY_PLACEHOLDER, Slot::History),
            (QUESTION_PLACEHOLDER, Slot::Question),
        ] {
            match template.matches(placeholder).count() {
                1 => {
                    if let Some(pos) = template.find(placeholder) {
                        found.push((pos, placeholder.len(), slot));
                    }
                }
                0 => {
                    return Err(ChatError::InvalidTemplate(format!(
                        "missing placeholder {placeholder}"
                    )))
                }
                n => {
                    return Err(ChatError::InvalidTemplate(format!(
                        "placeholder {placeholder} appears {n} times, expected once"
                    )))
                }
            }
        }
        found.sort_by_key(|(pos, _, _)| *pos);

        let mut parts = Vec::with_capacity(4);
        let mut order = Vec::with_capacity(3);
        let mut cursor = 0;
        for (pos, len, slot) in found {
            parts.push(template[cursor..pos].to_string());
            order.push(slot);
            cursor = pos + len;
        }
        parts.push(template[cursor..].to_string());

        Ok(Self {
            template,
            parts,
            order,
        })
    }

    /// Fill every slot with the caller-provided blocks.
    pub fn assemble(&self, context: &str, history: &str, question: &str) -> String {
        let mut prompt = String::new();
        for (part, slot) in self.parts.iter().zip(&self.order) {
            prompt.push_str(part);
            prompt.push_str(match slot {
                Slot::Context => context,
                Slot::History => history,
                Slot::Question => question,
            });
        }
        if let Some(tail) = self.parts.last() {
            prompt.push_str(tail);
        }
        prompt
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        // The default template is known valid.
        Self::new(default_template()).expect("default template is valid")
    }
}

/// The built-in answer-generation template.
pub fn default_template() -> String {
    format!(
        "You are a helpful technical documentation assistant. Answer the question \
using the documentation excerpts below.\n\
\n\
Guidelines:\n\
- Ground your answer in the provided documentation whenever it is relevant.\n\
- If the documentation does not cover the question, begin your answer with: \
\"{CAVEAT_SENTINEL}\"\n\
- Keep answers concise and include code examples from the documentation when helpful.\n\
\n\
Documentation:\n\
{CONTEXT_PLACEHOLDER}\n\
\n\
Conversation so far:\n\
{HISTORY_PLACEHOLDER}\n\
\n\
Question: {QUESTION_PLACEHOLDER}\n\
Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Template validation ----

    #[test]
    fn test_default_template_is_valid() {
        let assembler = PromptAssembler::default();
        assert!(assembler.template.contains(CAVEAT_SENTINEL));
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let err = PromptAssembler::new("{context} {question}").unwrap_err();
        assert!(matches!(err, ChatError::InvalidTemplate(_)));
        assert!(err.to_string().contains("{chat_history}"));
    }

    #[test]
    fn test_duplicate_placeholder_rejected() {
        let err =
            PromptAssembler::new("{context} {context} {chat_history} {question}").unwrap_err();
        assert!(matches!(err, ChatError::InvalidTemplate(_)));
        assert!(err.to_string().contains("2 times"));
    }

    // ---- Assembly ----

    #[test]
    fn test_substitutes_all_slots() {
        let assembler =
            PromptAssembler::new("C:{context}|H:{chat_history}|Q:{question}").unwrap();
        let prompt = assembler.assemble("ctx", "hist", "what?");
        assert_eq!(prompt, "C:ctx|H:hist|Q:what?");
    }

    #[test]
    fn test_values_containing_placeholder_text_not_resubstituted() {
        let assembler =
            PromptAssembler::new("C:{context}|H:{chat_history}|Q:{question}").unwrap();
        // A context that itself contains "{question}" must land verbatim.
        let prompt = assembler.assemble("mentions {question} literally", "none", "real");
        assert!(prompt.contains("mentions {question} literally"));
        assert!(prompt.ends_with("Q:real"));
    }

    #[test]
    fn test_each_slot_filled_from_its_own_input_only() {
        // Documentation about prompt templates puts placeholder text in
        // every slot; none of it may leak into a neighbouring slot.
        let assembler =
            PromptAssembler::new("C:{context}|H:{chat_history}|Q:{question}").unwrap();
        let prompt = assembler.assemble(
            "ctx holds {chat_history} and {question}",
            "hist holds {question}",
            "what is {context}?",
        );
        assert_eq!(
            prompt,
            "C:ctx holds {chat_history} and {question}|H:hist holds {question}|Q:what is {context}?"
        );
    }

    #[test]
    fn test_slots_filled_in_any_template_order() {
        let assembler =
            PromptAssembler::new("Q:{question}|C:{context}|H:{chat_history}").unwrap();
        let prompt = assembler.assemble("ctx", "hist", "what?");
        assert_eq!(prompt, "Q:what?|C:ctx|H:hist");
    }

    #[test]
    fn test_default_template_round_trip() {
        let assembler = PromptAssembler::default();
        let prompt = assembler.assemble(
            "No relevant documentation found in the knowledge base.",
            "No previous conversation.",
            "How do I configure retries?",
        );
        assert!(prompt.contains("No relevant documentation found"));
        assert!(prompt.contains("No previous conversation."));
        assert!(prompt.contains("Question: How do I configure retries?"));
        assert!(!prompt.contains("{context}"));
        assert!(!prompt.contains("{chat_history}"));
        assert!(!prompt.contains("{question}"));
    }

    #[test]
    fn test_caveat_sentinel_in_default_template() {
        let template = default_template();
        assert_eq!(template.matches(CAVEAT_SENTINEL).count(), 1);
    }
}
