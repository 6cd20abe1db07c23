//! Three-valued field updates for partial patches.
//!
//! A plain `Option<T>` cannot tell "field omitted" from "field sent as null",
//! so merging with it silently drops the caller's intent to clear a value.
//! `Patch<T>` keeps the three states apart:
//!
//! | wire shape        | value              |
//! |-------------------|--------------------|
//! | field omitted     | `Patch::Unchanged` |
//! | `"field": null`   | `Patch::Clear`     |
//! | `"field": <value>`| `Patch::Set(v)`    |
//!
//! Struct fields must carry `#[serde(default)]` so omission maps to `Unchanged`.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One field of a partial update.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    /// Field was not part of the request.
    Unchanged,
    /// Field was explicitly sent as null.
    Clear,
    /// Field carries a new value.
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Unchanged
    }
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Transforms the carried value, keeping the patch state.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Self::Unchanged => Patch::Unchanged,
            Self::Clear => Patch::Clear,
            Self::Set(value) => Patch::Set(f(value)),
        }
    }

    /// Merges into a nullable slot: `Clear` writes `None`.
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Self::Unchanged => {}
            Self::Clear => *slot = None,
            Self::Set(value) => *slot = Some(value),
        }
    }

    /// Merges into a non-nullable slot; `Clear` is rejected.
    pub fn apply_required(self, slot: &mut T, field: &'static str) -> Result<(), ValidationError> {
        match self {
            Self::Unchanged => Ok(()),
            Self::Clear => Err(ValidationError::RequiredFieldCleared(field)),
            Self::Set(value) => {
                *slot = value;
                Ok(())
            }
        }
    }

    /// Merges into a non-nullable slot; `Clear` resets it to `fallback`.
    pub fn apply_or_reset(self, slot: &mut T, fallback: T) {
        match self {
            Self::Unchanged => {}
            Self::Clear => *slot = fallback,
            Self::Set(value) => *slot = value,
        }
    }
}

impl<E> Patch<Vec<E>> {
    /// Merges into a list slot: `Clear` empties it, `Unchanged` keeps every entry.
    pub fn apply_list(self, slot: &mut Vec<E>) {
        match self {
            Self::Unchanged => {}
            Self::Clear => slot.clear(),
            Self::Set(values) => *slot = values,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Self::Set(value),
            None => Self::Clear,
        })
    }
}

impl<T> Serialize for Patch<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Set(value) => serializer.serialize_some(value),
            Self::Unchanged | Self::Clear => serializer.serialize_none(),
        }
    }
}
