//! Safety layer — crisis-language detection.
//!
//! Nothing is blocked or filtered. When a user message looks like it
//! mentions self-harm, the companion's reply gets a hotline referral
//! appended.

use regex::Regex;

/// Paragraph appended to replies when crisis language is detected.
pub const HOTLINE_HINT: &str = "\
If you're thinking about harming yourself, please reach out for help right now. \
In the US you can call or text 988 (Suicide & Crisis Lifeline); elsewhere, please contact \
your local emergency services. You don't have to go through this alone 💙";

const CRISIS_PATTERNS: &[(&str, &str)] = &[
    ("suicide", r"(?i)\bsuicid(e|al)\b"),
    ("kill_myself", r"(?i)\bkill(ing)?\s+my\s?self\b"),
    ("end_my_life", r"(?i)\bend(ing)?\s+(my\s+(own\s+)?life|it\s+all)\b"),
    ("want_to_die", r"(?i)\b(want|wanna|going)\s+(to\s+)?die\b"),
    ("self_harm", r"(?i)\bself[\s\-]?harm(ing)?\b"),
    ("hurt_myself", r"(?i)\b(hurt(ing)?|cut(ting)?)\s+my\s?self\b"),
    ("no_reason_to_live", r"(?i)\bno\s+reason\s+to\s+live\b"),
];

/// A crisis pattern that matched a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrisisMatch {
    pub rule: &'static str,
}

/// Case-insensitive crisis-language detector.
pub struct SafetyLayer {
    rules: Vec<(&'static str, Regex)>,
}

impl SafetyLayer {
    pub fn new() -> Self {
        let rules = CRISIS_PATTERNS
            .iter()
            .filter_map(|(name, pattern)| match Regex::new(pattern) {
                Ok(regex) => Some((*name, regex)),
                Err(e) => {
                    tracing::warn!(rule = %name, error = %e, "Invalid crisis pattern, skipping");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// First crisis rule matching `text`, if any.
    pub fn check(&self, text: &str) -> Option<CrisisMatch> {
        self.rules
            .iter()
            .find(|(_, regex)| regex.is_match(text))
            .map(|(rule, _)| CrisisMatch { rule })
    }

    /// Append the hotline referral to `reply` when `user_text` matches.
    pub fn annotate(&self, user_text: &str, reply: String) -> String {
        match self.check(user_text) {
            Some(hit) => {
                tracing::info!(rule = hit.rule, "Crisis language detected, adding hotline hint");
                format!("{reply}\n\n{HOTLINE_HINT}")
            }
            None => reply,
        }
    }
}

impl Default for SafetyLayer {
    fn default() -> Self {
        Self::new()
    }
}
