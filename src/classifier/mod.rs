pub mod rules;

use serde::{Deserialize, Serialize};

use rules::SignatureRule;

/// Recognized root causes of a workflow failure.
///
/// The set is closed and fixed at build time; anything unrecognized maps
/// to `Unknown` and is flagged for manual review.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum FailureCategory {
    DeprecatedActionVersion,
    MissingPermission,
    UnsupportedLanguage,
    RateLimit,
    TokenInvalid,
    Unknown,
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureCategory::DeprecatedActionVersion => "deprecated-action-version",
            FailureCategory::MissingPermission => "missing-permission",
            FailureCategory::UnsupportedLanguage => "unsupported-language",
            FailureCategory::RateLimit => "rate-limit",
            FailureCategory::TokenInvalid => "token-invalid",
            FailureCategory::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Matches log text against an ordered list of signature rules.
pub struct Classifier {
    rules: Vec<SignatureRule>,
}

impl Classifier {
    pub fn new(rules: Vec<SignatureRule>) -> Self {
        Self { rules }
    }

    /// Assign a failure category to a run's log text.
    ///
    /// Matching is case-insensitive and stops at the first matching rule.
    /// Empty or unavailable logs classify as `Unknown` without error.
    pub fn classify(&self, log: &str) -> FailureCategory {
        if log.trim().is_empty() {
            return FailureCategory::Unknown;
        }

        let lowered = log.to_lowercase();

        for rule in &self.rules {
            if rule.matches(&lowered) {
                tracing::debug!(
                    category = %rule.category,
                    rule = %rule.describe(),
                    "Log matched signature rule"
                );
                return rule.category;
            }
        }

        FailureCategory::Unknown
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(rules::default_rules())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_is_unknown() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(""), FailureCategory::Unknown);
        assert_eq!(classifier.classify("   \n  "), FailureCategory::Unknown);
    }

    #[test]
    fn unrecognized_log_is_unknown() {
        let classifier = Classifier::default();
        let log = "##[error]Process completed with exit code 1.";
        assert_eq!(classifier.classify(log), FailureCategory::Unknown);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.classify("ERROR: Resource Not Accessible By Integration"),
            FailureCategory::MissingPermission
        );
    }

    #[test]
    fn missing_permission_signature() {
        let classifier = Classifier::default();
        let log = "Error: Resource not accessible by integration";
        assert_eq!(classifier.classify(log), FailureCategory::MissingPermission);
    }

    #[test]
    fn rate_limit_beats_generic_permission_substring() {
        let classifier = Classifier::default();
        // A permission warning buried inside a rate-limit failure must not
        // misclassify the run.
        let log = "warning: permission denied for cache restore\n\
                   Error: API rate limit exceeded for installation";
        assert_eq!(classifier.classify(log), FailureCategory::RateLimit);
    }

    #[test]
    fn token_rules_beat_generic_forbidden() {
        let classifier = Classifier::default();
        let log = "403 Forbidden: Bad credentials";
        assert_eq!(classifier.classify(log), FailureCategory::TokenInvalid);
    }

    #[test]
    fn codeql_signatures_map_to_unsupported_language() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.classify("No source code was seen during the build"),
            FailureCategory::UnsupportedLanguage
        );
        assert_eq!(
            classifier.classify("Language 'javascript' not found in repository"),
            FailureCategory::UnsupportedLanguage
        );
    }

    #[test]
    fn unresolvable_action_maps_to_deprecated_version() {
        let classifier = Classifier::default();
        let log = "Unable to resolve action `lowlighter/metrics@master`";
        assert_eq!(
            classifier.classify(log),
            FailureCategory::DeprecatedActionVersion
        );
    }

    #[test]
    fn expired_token_pattern() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.classify("Error: the provided token has expired"),
            FailureCategory::TokenInvalid
        );
    }
}
