//! Passage quality filtering.
//!
//! Classifies a retrieved passage as usable or discardable before it can
//! reach a prompt. Pure and deterministic: the same passage always gets
//! the same verdict, and classification has no side effects.

use docent_core::config::RetrievalConfig;
use docent_core::types::Passage;

/// Marker left behind by client-side redirect pages.
pub const REDIRECT_MARKER: &str = "Redirecting";

/// Navigation boilerplate that dominates skeleton pages.
pub const NAV_MARKER: &str = "Skip to main content";

/// Why a passage was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Content is a redirect stub, not documentation.
    Redirect,
    /// Too little content after trimming whitespace.
    TooShort,
    /// Navigation chrome repeated past the tolerated count.
    NavigationNoise,
}

/// Classification verdict for a single passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Discard(DiscardReason),
}

impl Verdict {
    pub fn is_keep(&self) -> bool {
        matches!(self, Verdict::Keep)
    }
}

/// Classifies retrieved passages as usable or discardable.
#[derive(Debug, Clone)]
pub struct QualityFilter {
    /// Minimum trimmed content length, in characters.
    min_chars: usize,
    /// Navigation marker occurrences tolerated before discarding.
    max_nav_markers: usize,
}

impl QualityFilter {
    pub fn new(min_chars: usize, max_nav_markers: usize) -> Self {
        Self {
            min_chars,
            max_nav_markers,
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(config.min_passage_chars, config.max_nav_markers)
    }

    /// Classify one passage.
    pub fn classify(&self, passage: &Passage) -> Verdict {
        let content = &passage.content;

        if content.contains(REDIRECT_MARKER) {
            return Verdict::Discard(DiscardReason::Redirect);
        }

        if content.trim().chars().count() < self.min_chars {
            return Verdict::Discard(DiscardReason::TooShort);
        }

        if content.matches(NAV_MARKER).count() > self.max_nav_markers {
            return Verdict::Discard(DiscardReason::NavigationNoise);
        }

        Verdict::Keep
    }
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(content: &str) -> Passage {
        Passage {
            content: content.to_string(),
            source_label: "docs".to_string(),
            source_url: "https://docs.example.com".to_string(),
            similarity_rank: 1,
        }
    }

    fn long_text() -> String {
        "Agents call tools in a loop until the model emits a final answer. ".repeat(4)
    }

    // ---- Redirect marker ----

    #[test]
    fn test_redirect_marker_discards() {
        let filter = QualityFilter::default();
        let p = passage(&format!("{} {}", REDIRECT_MARKER, long_text()));
        assert_eq!(filter.classify(&p), Verdict::Discard(DiscardReason::Redirect));
    }

    #[test]
    fn test_redirect_marker_anywhere_in_content() {
        let filter = QualityFilter::default();
        let p = passage(&format!("{} ... Redirecting to the new docs site", long_text()));
        assert_eq!(filter.classify(&p), Verdict::Discard(DiscardReason::Redirect));
    }

    // ---- Length threshold ----

    #[test]
    fn test_short_content_discards() {
        let filter = QualityFilter::default();
        let p = passage("tiny");
        assert_eq!(filter.classify(&p), Verdict::Discard(DiscardReason::TooShort));
    }

    #[test]
    fn test_whitespace_padding_does_not_rescue_short_content() {
        let filter = QualityFilter::default();
        let padded = format!("   {}   \n\n", "x".repeat(50));
        let p = passage(&padded);
        assert_eq!(filter.classify(&p), Verdict::Discard(DiscardReason::TooShort));
    }

    #[test]
    fn test_boundary_exactly_min_chars_keeps() {
        let filter = QualityFilter::new(100, 2);
        let p = passage(&"x".repeat(100));
        assert!(filter.classify(&p).is_keep());
    }

    #[test]
    fn test_boundary_one_under_min_chars_discards() {
        let filter = QualityFilter::new(100, 2);
        let p = passage(&"x".repeat(99));
        assert_eq!(filter.classify(&p), Verdict::Discard(DiscardReason::TooShort));
    }

    // ---- Navigation noise ----

    #[test]
    fn test_nav_marker_over_threshold_discards() {
        let filter = QualityFilter::default();
        // Three occurrences exceed the default tolerance of two, even when
        // the passage is otherwise long enough.
        let content = format!("{} {} {} {}", NAV_MARKER, NAV_MARKER, NAV_MARKER, long_text());
        let p = passage(&content);
        assert_eq!(
            filter.classify(&p),
            Verdict::Discard(DiscardReason::NavigationNoise)
        );
    }

    #[test]
    fn test_nav_marker_skeleton_page_discards() {
        let filter = QualityFilter::default();
        let p = passage(
            "Skip to main content Skip to main content Skip to main content \
             Skip to main content Skip to main content Skip to main content",
        );
        // Short AND noisy; verdict order reports the first failing check.
        assert!(!filter.classify(&p).is_keep());
    }

    #[test]
    fn test_nav_marker_at_threshold_keeps() {
        let filter = QualityFilter::default();
        let content = format!("{} {} {}", NAV_MARKER, NAV_MARKER, long_text());
        let p = passage(&content);
        assert!(filter.classify(&p).is_keep());
    }

    // ---- Clean content ----

    #[test]
    fn test_clean_passage_keeps() {
        let filter = QualityFilter::default();
        let p = passage(&long_text());
        assert!(filter.classify(&p).is_keep());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let filter = QualityFilter::default();
        let p = passage(&long_text());
        let first = filter.classify(&p);
        for _ in 0..10 {
            assert_eq!(filter.classify(&p), first);
        }
    }

    #[test]
    fn test_unicode_content_counts_chars_not_bytes() {
        let filter = QualityFilter::new(100, 2);
        // 100 multi-byte chars: enough characters even though each is > 1 byte.
        let p = passage(&"\u{00e9}".repeat(100));
        assert!(filter.classify(&p).is_keep());
    }
}
