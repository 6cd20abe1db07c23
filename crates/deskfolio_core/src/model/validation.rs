//! Field validation errors and shared normalisation helpers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_SHORT_TEXT_CHARS: usize = 500;
pub const MAX_BODY_CHARS: usize = 100_000;
pub const MAX_URL_CHARS: usize = 2048;
pub const MAX_LIST_ENTRIES: usize = 50;

static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));
static HTTP_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url regex"));

/// Rejection reasons for malformed or out-of-range input.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required text field is blank after trim.
    BlankField(&'static str),
    /// A text field exceeds its maximum length.
    TooLong { field: &'static str, max_chars: usize },
    /// A non-nullable field was sent as null.
    RequiredFieldCleared(&'static str),
    /// A list field exceeds its maximum entry count.
    TooManyEntries { field: &'static str, max: usize },
    /// A coordinate is NaN or infinite.
    NonFiniteCoordinate(&'static str),
    /// Currency code is not three upper-case letters.
    InvalidCurrency(String),
    /// Price amount is negative.
    NegativePrice(i64),
    /// Value is not an absolute http(s) URL.
    InvalidUrl { field: &'static str, value: String },
    /// Value does not look like an email address.
    InvalidEmail(String),
    /// Desktop handle has an unsupported shape.
    InvalidHandle(String),
    /// Heading level outside `1..=3`.
    InvalidHeadingLevel(u8),
    /// A batch request carries no rows.
    EmptyBatch,
    /// A batch request exceeds its cap.
    BatchTooLarge { len: usize, max: usize },
    /// The same id appears twice in one request.
    DuplicateId(Uuid),
    /// Sibling reorder rows do not share one parent.
    MixedParents,
    /// Field combination is not valid for this item kind.
    UnsupportedForKind { field: &'static str, kind: &'static str },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "field `{field}` must not be blank"),
            Self::TooLong { field, max_chars } => {
                write!(f, "field `{field}` exceeds {max_chars} characters")
            }
            Self::RequiredFieldCleared(field) => write!(f, "field `{field}` cannot be cleared"),
            Self::TooManyEntries { field, max } => {
                write!(f, "field `{field}` holds more than {max} entries")
            }
            Self::NonFiniteCoordinate(axis) => write!(f, "coordinate `{axis}` must be finite"),
            Self::InvalidCurrency(value) => {
                write!(f, "currency `{value}` must be a 3-letter upper-case code")
            }
            Self::NegativePrice(amount) => write!(f, "price amount {amount} must not be negative"),
            Self::InvalidUrl { field, value } => {
                write!(f, "field `{field}` must be an http(s) url, got `{value}`")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::InvalidHandle(value) => write!(f, "invalid desktop handle `{value}`"),
            Self::InvalidHeadingLevel(level) => {
                write!(f, "heading level {level} must be between 1 and 3")
            }
            Self::EmptyBatch => write!(f, "batch must contain at least one row"),
            Self::BatchTooLarge { len, max } => {
                write!(f, "batch of {len} rows exceeds limit of {max}")
            }
            Self::DuplicateId(id) => write!(f, "id {id} appears more than once"),
            Self::MixedParents => write!(f, "reordered items must share one parent"),
            Self::UnsupportedForKind { field, kind } => {
                write!(f, "field `{field}` is not supported for `{kind}` items")
            }
        }
    }
}

impl Error for ValidationError {}

/// Trims and checks a required text value.
pub fn normalize_required(
    value: &str,
    field: &'static str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    check_length(trimmed, field, max_chars)?;
    Ok(trimmed.to_string())
}

/// Trims an optional text value; blank collapses to `None`.
pub fn normalize_optional(
    value: Option<&str>,
    field: &'static str,
    max_chars: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            check_length(trimmed, field, max_chars)?;
            Ok(Some(trimmed.to_string()))
        }
    }
}

pub fn check_length(
    value: &str,
    field: &'static str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() > max_chars {
        return Err(ValidationError::TooLong { field, max_chars });
    }
    Ok(())
}

pub fn check_entries<T>(
    values: &[T],
    field: &'static str,
    max: usize,
) -> Result<(), ValidationError> {
    if values.len() > max {
        return Err(ValidationError::TooManyEntries { field, max });
    }
    Ok(())
}

/// Requires an absolute http(s) URL.
pub fn validate_http_url(value: &str, field: &'static str) -> Result<(), ValidationError> {
    check_length(value, field, MAX_URL_CHARS)?;
    if !HTTP_URL_RE.is_match(value) {
        return Err(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub fn validate_currency(value: &str) -> Result<(), ValidationError> {
    if !CURRENCY_RE.is_match(value) {
        return Err(ValidationError::InvalidCurrency(value.to_string()));
    }
    Ok(())
}
