//! Validation rule value object

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationKind {
    Required,
    MinLength,
    MaxLength,
    Email,
    Password,
}

impl ValidationKind {
    pub const ALL: [ValidationKind; 5] = [
        ValidationKind::Required,
        ValidationKind::MinLength,
        ValidationKind::MaxLength,
        ValidationKind::Email,
        ValidationKind::Password,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationKind::Required => "required",
            ValidationKind::MinLength => "minLength",
            ValidationKind::MaxLength => "maxLength",
            ValidationKind::Email => "email",
            ValidationKind::Password => "password",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Whether the rule reads its threshold.
    pub fn uses_threshold(&self) -> bool {
        matches!(self, ValidationKind::MinLength | ValidationKind::MaxLength)
    }

    /// User-facing message a new rule of this kind starts with.
    pub fn default_message(&self, threshold: Option<u32>) -> String {
        let n = threshold.unwrap_or(0);
        match self {
            ValidationKind::Required => "This field is required".to_string(),
            ValidationKind::MinLength => format!("Minimum length is {} characters", n),
            ValidationKind::MaxLength => format!("Maximum length is {} characters", n),
            ValidationKind::Email => "Please enter a valid email address".to_string(),
            ValidationKind::Password => {
                "Password must be at least 8 characters and contain a number".to_string()
            }
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named check applied to a field's value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub kind: ValidationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
    pub message: String,
}

impl ValidationRule {
    /// Rule with the kind's default message.
    pub fn new(kind: ValidationKind, threshold: Option<u32>) -> Self {
        let threshold = if kind.uses_threshold() { threshold } else { None };
        Self {
            kind,
            threshold,
            message: kind.default_message(threshold),
        }
    }

    pub fn required() -> Self {
        Self::new(ValidationKind::Required, None)
    }

    pub fn min_length(n: u32) -> Self {
        Self::new(ValidationKind::MinLength, Some(n))
    }

    pub fn max_length(n: u32) -> Self {
        Self::new(ValidationKind::MaxLength, Some(n))
    }

    pub fn email() -> Self {
        Self::new(ValidationKind::Email, None)
    }

    pub fn password() -> Self {
        Self::new(ValidationKind::Password, None)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Edit applied to one property of an existing rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleFieldChange {
    Threshold(Option<u32>),
    Message(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_messages() {
        assert_eq!(ValidationRule::required().message, "This field is required");
        assert_eq!(
            ValidationRule::min_length(3).message,
            "Minimum length is 3 characters"
        );
    }

    #[test]
    fn test_threshold_dropped_for_non_length_rules() {
        let rule = ValidationRule::new(ValidationKind::Email, Some(4));
        assert_eq!(rule.threshold, None);
    }

    #[test]
    fn test_kind_wire_names() {
        let json = serde_json::to_string(&ValidationKind::MinLength).unwrap();
        assert_eq!(json, "\"minLength\"");
        assert_eq!(ValidationKind::parse("maxlength"), Some(ValidationKind::MaxLength));
    }
}
