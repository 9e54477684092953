//! Keyword and pattern based trigger evaluation.

use parley_types::config::TriggerConfig;

/// Decides whether a message should provoke a bot response.
///
/// Fires when any mention case-insensitively contains an activation
/// keyword as a substring, or when any configured pattern occurs as a
/// case-insensitive substring of the content. The evaluator yields a
/// single boolean; choosing WHICH bot responds is a separate, later step.
#[derive(Debug, Clone)]
pub struct TriggerEvaluator {
    keywords: Vec<String>,
    patterns: Vec<String>,
}

impl TriggerEvaluator {
    pub fn new(keywords: Vec<String>, patterns: Vec<String>) -> Self {
        Self { keywords, patterns }
    }

    pub fn from_config(config: &TriggerConfig) -> Self {
        Self::new(config.keywords.clone(), config.patterns.clone())
    }

    /// Whether any keyword occurs inside any mention (case-insensitive).
    ///
    /// Empty mentions or an empty keyword set never match.
    pub fn is_mentioned(&self, mentions: &[String]) -> bool {
        if mentions.is_empty() || self.keywords.is_empty() {
            return false;
        }
        mentions.iter().any(|mention| {
            let mention = mention.to_lowercase();
            self.keywords
                .iter()
                .any(|keyword| mention.contains(&keyword.to_lowercase()))
        })
    }

    /// Whether a specific target name appears among the mentions
    /// (case-insensitive, exact token match).
    pub fn is_specific_mentioned(&self, mentions: &[String], target: &str) -> bool {
        if mentions.is_empty() || target.is_empty() {
            return false;
        }
        let target = target.to_lowercase();
        mentions.iter().any(|m| m.to_lowercase() == target)
    }

    /// The trigger decision for a message.
    pub fn should_trigger(&self, content: &str, mentions: &[String]) -> bool {
        if self.is_mentioned(mentions) {
            return true;
        }

        if !self.patterns.is_empty() {
            let content = content.to_lowercase();
            if self
                .patterns
                .iter()
                .any(|p| content.contains(&p.to_lowercase()))
            {
                return true;
            }
        }

        false
    }
}

impl Default for TriggerEvaluator {
    /// Evaluator with the default activation keywords and no patterns.
    fn default() -> Self {
        Self::from_config(&TriggerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_mention_containing_keyword_triggers() {
        let evaluator = TriggerEvaluator::default();
        assert!(evaluator.should_trigger("please @assistant help", &strs(&["assistant"])));
    }

    #[test]
    fn test_no_mentions_no_patterns_does_not_trigger() {
        let evaluator = TriggerEvaluator::default();
        assert!(!evaluator.should_trigger("no mentions here", &[]));
    }

    #[test]
    fn test_keyword_substring_match_is_case_insensitive() {
        let evaluator = TriggerEvaluator::default();
        assert!(evaluator.is_mentioned(&strs(&["Research-BOT"])));
        assert!(evaluator.is_mentioned(&strs(&["HelpDesk"])));
    }

    #[test]
    fn test_unrelated_mention_does_not_trigger() {
        let evaluator = TriggerEvaluator::default();
        assert!(!evaluator.should_trigger("hi @alice", &strs(&["alice"])));
    }

    #[test]
    fn test_pattern_matches_content() {
        let evaluator = TriggerEvaluator::new(vec![], strs(&["urgent question"]));
        assert!(evaluator.should_trigger("I have an URGENT Question", &[]));
        assert!(!evaluator.should_trigger("nothing to see", &[]));
    }

    #[test]
    fn test_empty_everything_never_triggers() {
        let evaluator = TriggerEvaluator::new(vec![], vec![]);
        assert!(!evaluator.should_trigger("", &[]));
        assert!(!evaluator.should_trigger("hello @assistant", &strs(&["assistant"])));
    }

    #[test]
    fn test_specific_mention_exact_token() {
        let evaluator = TriggerEvaluator::default();
        let mentions = strs(&["Assistant_Bot", "alice"]);
        assert!(evaluator.is_specific_mentioned(&mentions, "assistant_bot"));
        assert!(!evaluator.is_specific_mentioned(&mentions, "assistant"));
        assert!(!evaluator.is_specific_mentioned(&mentions, ""));
    }
}
