//! Read-only screening policy shared by every session.

use std::ops::RangeInclusive;

pub const DEFAULT_EXIT_KEYWORDS: &[&str] = &["exit", "quit", "bye", "goodbye", "end", "stop"];

/// Validation limits, generation caps and exit keywords.
///
/// Built once from `Config` and shared behind an `Arc`; never mutated after startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningLimits {
    pub max_tech_stack_size: usize,
    pub max_questions_total: usize,
    pub questions_per_tech: RangeInclusive<usize>,
    pub phone_digits: RangeInclusive<usize>,
    pub max_role_suggestions: usize,
    /// Stored lowercase.
    pub exit_keywords: Vec<String>,
}

impl Default for ScreeningLimits {
    fn default() -> Self {
        Self {
            max_tech_stack_size: 10,
            max_questions_total: 10,
            questions_per_tech: 3..=5,
            phone_digits: 7..=15,
            max_role_suggestions: 5,
            exit_keywords: DEFAULT_EXIT_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl ScreeningLimits {
    /// True when the whole utterance is an exit keyword.
    ///
    /// Case-insensitive, ignores surrounding whitespace and trailing `.`/`!`.
    /// Substrings never match: "I want to end up at a startup" is an answer, not an exit.
    pub fn is_exit_keyword(&self, utterance: &str) -> bool {
        let normalized = utterance
            .trim()
            .trim_end_matches(['.', '!'])
            .trim()
            .to_lowercase();
        if normalized.is_empty() {
            return false;
        }
        self.exit_keywords.iter().any(|k| *k == normalized)
    }

    /// How many technologies questions are requested for, so that every one of
    /// them can receive the per-technology minimum within the global cap.
    pub fn question_technology_budget(&self) -> usize {
        let min = (*self.questions_per_tech.start()).max(1);
        (self.max_questions_total / min).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_keyword_case_insensitive() {
        let limits = ScreeningLimits::default();
        assert!(limits.is_exit_keyword("bye"));
        assert!(limits.is_exit_keyword("  BYE "));
        assert!(limits.is_exit_keyword("Quit!"));
        assert!(limits.is_exit_keyword("goodbye."));
    }

    #[test]
    fn test_exit_keyword_requires_whole_utterance() {
        let limits = ScreeningLimits::default();
        assert!(!limits.is_exit_keyword("I want to end up at a startup"));
        assert!(!limits.is_exit_keyword("byebye"));
        assert!(!limits.is_exit_keyword(""));
        assert!(!limits.is_exit_keyword("   "));
    }

    #[test]
    fn test_question_technology_budget() {
        let limits = ScreeningLimits::default();
        assert_eq!(limits.question_technology_budget(), 3);

        let tight = ScreeningLimits {
            max_questions_total: 2,
            ..ScreeningLimits::default()
        };
        assert_eq!(tight.question_technology_budget(), 1);
    }
}
