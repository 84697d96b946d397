use regex::Regex;

use super::FailureCategory;

/// A pattern-to-category mapping. Rules are evaluated in order against the
/// lowercased log text, so every signature here is written in lowercase.
pub struct SignatureRule {
    pub signature: Signature,
    pub category: FailureCategory,
}

pub enum Signature {
    Substring(&'static str),
    Pattern(Regex),
}

impl SignatureRule {
    fn substring(needle: &'static str, category: FailureCategory) -> Self {
        Self {
            signature: Signature::Substring(needle),
            category,
        }
    }

    fn pattern(pattern: &str, category: FailureCategory) -> Self {
        Self {
            // Patterns are fixed at build time; a malformed one is a bug.
            signature: Signature::Pattern(
                Regex::new(pattern).unwrap_or_else(|e| panic!("invalid signature rule: {e}")),
            ),
            category,
        }
    }

    pub fn matches(&self, lowered_log: &str) -> bool {
        match &self.signature {
            Signature::Substring(needle) => lowered_log.contains(needle),
            Signature::Pattern(regex) => regex.is_match(lowered_log),
        }
    }

    /// The signature as written, for classification reasoning in the logs.
    pub fn describe(&self) -> String {
        match &self.signature {
            Signature::Substring(needle) => format!("substring `{needle}`"),
            Signature::Pattern(regex) => format!("pattern `{}`", regex.as_str()),
        }
    }
}

/// The built-in rule set, most specific first. Order matters: failure logs
/// routinely contain several superficially-matching substrings (a permission
/// warning inside a rate-limit failure, say), and the first match wins.
pub fn default_rules() -> Vec<SignatureRule> {
    use FailureCategory::*;

    vec![
        // Exact error strings
        SignatureRule::substring("resource not accessible by integration", MissingPermission),
        SignatureRule::substring("bad credentials", TokenInvalid),
        SignatureRule::pattern(
            r"token[^\n]{0,40}(invalid|expired)|(invalid|expired)[^\n]{0,40}token",
            TokenInvalid,
        ),
        SignatureRule::substring("no source code was seen during the build", UnsupportedLanguage),
        SignatureRule::pattern(r"language '[^']+' (was )?not found", UnsupportedLanguage),
        SignatureRule::substring("autobuild failed", UnsupportedLanguage),
        // Rate limiting, before the generic permission substrings
        SignatureRule::substring("api rate limit exceeded", RateLimit),
        SignatureRule::substring("secondary rate limit", RateLimit),
        SignatureRule::pattern(r"rate limit (exceeded|reached|hit)|error: rate limit", RateLimit),
        // Action resolution problems
        SignatureRule::substring("unable to resolve action", DeprecatedActionVersion),
        SignatureRule::substring("uses a deprecated version of", DeprecatedActionVersion),
        SignatureRule::pattern(r"node\d+ actions are deprecated", DeprecatedActionVersion),
        // Generic fallbacks, least specific last
        SignatureRule::substring("permission denied", MissingPermission),
        SignatureRule::substring("forbidden", MissingPermission),
    ]
}
