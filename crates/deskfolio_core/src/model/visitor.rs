//! Visitor identity for the email-capture gate.

use crate::model::validation::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const MAX_EMAIL_CHARS: usize = 254;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)+$")
        .expect("valid email regex")
});

/// Normalised visitor email: trimmed, lower-cased, shape-checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VisitorEmail(String);

impl VisitorEmail {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.chars().count() > MAX_EMAIL_CHARS || !EMAIL_RE.is_match(&normalized) {
            return Err(ValidationError::InvalidEmail(raw.trim().to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe form: first character of the local part plus the domain.
    pub fn masked(&self) -> String {
        match self.0.split_once('@') {
            Some((local, domain)) => {
                let head = local.chars().next().unwrap_or('*');
                format!("{head}***@{domain}")
            }
            None => "***".to_string(),
        }
    }
}

impl Display for VisitorEmail {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VisitorEmail {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VisitorEmail> for String {
    fn from(value: VisitorEmail) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::VisitorEmail;

    #[test]
    fn email_is_normalized_and_masked() {
        let email = VisitorEmail::parse("  V@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "v@example.com");
        assert_eq!(email.masked(), "v***@example.com");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for raw in ["", "plain", "a@b", "a@@b.com", "a b@c.com"] {
            assert!(VisitorEmail::parse(raw).is_err(), "{raw} should be rejected");
        }
    }
}
