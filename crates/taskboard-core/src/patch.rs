//! Field-level patches for partial updates
//!
//! A [`Patch`] distinguishes a field the caller did not mention from one
//! they explicitly cleared. With `#[serde(default)]` on the containing
//! struct, JSON maps onto it as:
//!
//! | JSON              | Patch                 |
//! |-------------------|-----------------------|
//! | field absent      | `Patch::Unchanged`    |
//! | `"field": null`   | `Patch::Clear`        |
//! | `"field": value`  | `Patch::Set(value)`   |

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single field change
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Keep the current value
    #[default]
    Unchanged,
    /// Reset the field to its default
    Clear,
    /// Replace the field
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Patch::Unchanged)
    }

    /// Resolve against the current value, using `default` for `Clear`.
    pub fn apply(self, current: T, default: impl FnOnce() -> T) -> T {
        match self {
            Patch::Unchanged => current,
            Patch::Clear => default(),
            Patch::Set(value) => value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Unchanged => Patch::Unchanged,
            Patch::Clear => Patch::Clear,
            Patch::Set(value) => Patch::Set(f(value)),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Set(v),
            None => Patch::Clear,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Set(value) => serializer.serialize_some(value),
            Patch::Unchanged | Patch::Clear => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Edit {
        title: Patch<String>,
        description: Patch<String>,
        flag: Patch<bool>,
    }

    #[test]
    fn test_absent_null_and_value() {
        let edit: Edit =
            serde_json::from_str(r#"{"description": null, "flag": true}"#).unwrap();
        assert_eq!(edit.title, Patch::Unchanged);
        assert_eq!(edit.description, Patch::Clear);
        assert_eq!(edit.flag, Patch::Set(true));
    }

    #[test]
    fn test_apply() {
        let keep: Patch<u32> = Patch::Unchanged;
        assert_eq!(keep.apply(3, || 0), 3);
        assert_eq!(Patch::Clear.apply(3, || 0), 0);
        assert_eq!(Patch::Set(9).apply(3, || 0), 9);
    }

    #[test]
    fn test_map_preserves_variant() {
        assert_eq!(Patch::Set(" a ").map(str::trim), Patch::Set("a"));
        assert_eq!(Patch::<&str>::Clear.map(str::len), Patch::Clear);
        assert!(Patch::<&str>::Unchanged.map(str::len).is_unchanged());
    }
}
