//! Password composition policy.
//!
//! A policy is fixed once built. Checks run in this order: minimum length,
//! letter present, digit present, allowed pattern matching the whole password
//! (only when specials are required), and finally no forbidden character
//! anywhere.

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_MIN_LENGTH: i64 = 8;
pub const DEFAULT_FORBIDDEN_PATTERN: &str = "[^a-zA-Z0-9]";

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("minimum length cannot be negative (got {0})")]
    NegativeLength(i64),
    #[error("special characters are required but no allowed pattern was supplied")]
    MissingAllowedPattern,
    #[error("invalid {kind} pattern {pattern:?}: {reason}")]
    InvalidPattern {
        kind: &'static str,
        pattern: String,
        reason: String,
    },
    #[error("policy requires special characters but holds no allowed pattern")]
    IllegalState,
}

/// Raw policy parameters as they arrive from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolicySettings {
    pub min_length: i64,
    /// Pattern searched anywhere in the password; a hit rejects it.
    pub blacklist: String,
    /// Pattern the whole password must match when specials are required.
    pub whitelist: Option<String>,
    pub requires_number: bool,
    pub requires_letter: bool,
    pub requires_special: bool,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            blacklist: DEFAULT_FORBIDDEN_PATTERN.to_string(),
            whitelist: None,
            requires_number: true,
            requires_letter: true,
            requires_special: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    required_length: usize,
    forbidden: Regex,
    allowed: Option<Regex>,
    requires_letter: bool,
    requires_number: bool,
    requires_special: bool,
}

impl PasswordPolicy {
    pub fn new(settings: &PolicySettings) -> Result<Self, PolicyError> {
        let required_length = usize::try_from(settings.min_length)
            .map_err(|_| PolicyError::NegativeLength(settings.min_length))?;

        let whitelist = settings.whitelist.as_deref().filter(|p| !p.is_empty());
        if settings.requires_special && whitelist.is_none() {
            warn!("password policy requires specials without an allowed pattern");
            return Err(PolicyError::MissingAllowedPattern);
        }

        let forbidden = compile("forbidden", &settings.blacklist, false)?;
        let allowed = whitelist
            .map(|pattern| compile("allowed", pattern, true))
            .transpose()?;

        Ok(Self {
            required_length,
            forbidden,
            allowed,
            requires_letter: settings.requires_letter,
            requires_number: settings.requires_number,
            requires_special: settings.requires_special,
        })
    }

    /// Policy built from [`PolicySettings::default`]: eight characters, a
    /// letter and a digit, ASCII alphanumerics only.
    pub fn standard() -> Result<Self, PolicyError> {
        Self::new(&PolicySettings::default())
    }

    pub fn required_length(&self) -> usize {
        self.required_length
    }

    /// Returns whether `password` satisfies every rule of this policy.
    pub fn is_valid(&self, password: &str) -> Result<bool, PolicyError> {
        if password.chars().count() < self.required_length {
            return Ok(false);
        }

        let letter_met = !self.requires_letter || password.chars().any(|c| c.is_ascii_alphabetic());
        let number_met = !self.requires_number || password.chars().any(|c| c.is_ascii_digit());

        let special_met = if self.requires_special {
            let allowed = self.allowed.as_ref().ok_or(PolicyError::IllegalState)?;
            allowed.is_match(password)
        } else {
            true
        };

        let unsafe_found = self.forbidden.is_match(password);

        Ok(letter_met && number_met && special_met && !unsafe_found)
    }
}

/// Compiles a user pattern; `anchored` wraps it so only a whole-string match
/// counts.
fn compile(kind: &'static str, pattern: &str, anchored: bool) -> Result<Regex, PolicyError> {
    let source = if anchored {
        format!("^(?:{pattern})$")
    } else {
        pattern.to_string()
    };
    Regex::new(&source).map_err(|e| PolicyError::InvalidPattern {
        kind,
        pattern: pattern.to_string(),
        reason: format!("{e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::{PasswordPolicy, PolicyError, PolicySettings};

    fn custom(
        min_length: i64,
        whitelist: Option<&str>,
        blacklist: Option<&str>,
        requires_number: bool,
        requires_letter: bool,
        requires_special: bool,
    ) -> Result<PasswordPolicy, PolicyError> {
        let mut settings = PolicySettings {
            min_length,
            whitelist: whitelist.map(str::to_string),
            requires_number,
            requires_letter,
            requires_special,
            ..PolicySettings::default()
        };
        if let Some(blacklist) = blacklist {
            settings.blacklist = blacklist.to_string();
        }
        PasswordPolicy::new(&settings)
    }

    #[test]
    fn default_policy_cases() {
        let policy = PasswordPolicy::standard().unwrap();
        let cases = [
            ("abc12345", true),
            ("GoodPass1", true),
            ("abcdefgh", false),
            ("noNumberTest", false),
            ("abc123", false),
            ("2short", false),
            ("abc123!!", false),
            ("un$af3found", false),
            ("12345678", false),
            ("", false),
        ];
        for (password, expected) in cases {
            assert_eq!(policy.is_valid(password).unwrap(), expected, "{password}");
        }
    }

    #[test]
    fn standard_policy_follows_default_settings() {
        let policy = PasswordPolicy::standard().unwrap();
        let settings = PolicySettings::default();
        assert_eq!(policy.required_length() as i64, settings.min_length);
        assert_eq!(policy.forbidden.as_str(), settings.blacklist);
        assert!(policy.allowed.is_none());
        assert_eq!(policy.requires_letter, settings.requires_letter);
        assert_eq!(policy.requires_number, settings.requires_number);
        assert_eq!(policy.requires_special, settings.requires_special);
        // Brackets and underscores fall outside the ASCII letter ranges.
        assert!(!policy.is_valid("abc[1234").unwrap());
        assert!(!policy.is_valid("ab_12345").unwrap());
    }

    #[test]
    fn custom_policy_cases() {
        let cases = [
            (custom(3, None, None, true, true, false), "pa1", true),
            (custom(3, None, None, true, true, false), "p1", false),
            (custom(8, None, None, false, true, false), "noNumberPass", true),
            (custom(8, None, None, false, true, false), "noNumberPas1", true),
            (custom(3, None, None, true, false, false), "12345678", true),
            (custom(3, None, None, true, false, false), "1234567E", true),
            (
                custom(8, Some(".*\\$.*"), Some("[^a-zA-Z0-9$]"), true, true, true),
                "pa$$wor8",
                true,
            ),
            (
                custom(8, Some(".*\\$.*"), Some("[^a-zA-Z0-9$]"), true, true, true),
                "passwor8",
                false,
            ),
            (
                custom(8, Some(".*\\$.*"), Some("[^a-zA-Z0-9$]"), true, true, true),
                "pa$$wor8!",
                false,
            ),
            (custom(0, None, None, false, false, false), "", true),
        ];
        for (policy, password, expected) in cases {
            let policy = policy.expect("policy should build");
            assert_eq!(policy.is_valid(password).unwrap(), expected, "{password}");
        }
    }

    #[test]
    fn allowed_pattern_must_match_whole_password() {
        let policy = custom(4, Some("[a-z0-9$]+"), Some("[^a-z0-9$#]"), true, true, true).unwrap();
        assert!(policy.is_valid("ab$1").unwrap());
        // `#` passes the forbidden check but breaks the whole-string allowed match.
        assert!(!policy.is_valid("ab$1#").unwrap());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let policy = custom(4, None, Some("[^\\p{L}0-9]"), false, false, false).unwrap();
        assert!(policy.is_valid("äöü1").unwrap());
        assert!(!policy.is_valid("äö1").unwrap());
    }

    #[test]
    fn specials_without_allowed_pattern_fail_construction() {
        assert!(matches!(
            custom(8, None, None, true, true, true),
            Err(PolicyError::MissingAllowedPattern)
        ));
        assert!(matches!(
            custom(8, Some(""), None, true, true, true),
            Err(PolicyError::MissingAllowedPattern)
        ));
    }

    #[test]
    fn rejects_negative_length_and_bad_patterns() {
        assert!(matches!(
            custom(-1, None, None, true, true, false),
            Err(PolicyError::NegativeLength(-1))
        ));
        let err = custom(8, None, Some("[unclosed"), true, true, false).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidPattern { kind: "forbidden", .. }));
        let err = custom(8, Some("(open"), None, true, true, true).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidPattern { kind: "allowed", .. }));
    }

    #[test]
    fn missing_allowed_pattern_at_check_time_is_illegal_state() {
        let mut policy = PasswordPolicy::standard().unwrap();
        policy.requires_special = true;
        assert!(matches!(
            policy.is_valid("abc12345"),
            Err(PolicyError::IllegalState)
        ));
    }

    #[test]
    fn settings_deserialize_from_named_properties() {
        let settings: PolicySettings = serde_json::from_str(
            r#"{"minLength": 10, "whitelist": ".*[!$].*", "blacklist": "[^a-zA-Z0-9!$]", "requiresSpecial": true}"#,
        )
        .unwrap();
        assert_eq!(settings.min_length, 10);
        assert!(settings.requires_letter);
        assert!(settings.requires_number);
        let policy = PasswordPolicy::new(&settings).unwrap();
        assert!(policy.is_valid("Password!1").unwrap());
        assert!(!policy.is_valid("Password11").unwrap());
    }
}
