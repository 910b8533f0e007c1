//! The payload module defines `Field`, the building block of partial-update payloads.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Field represents one member of a partial update.  `Unset` means the caller didn't mention the
/// field at all, and the stored value must be left alone; `Set` carries a replacement value, which
/// may well be empty.
///
/// When deserializing, a missing field becomes `Unset` (via `#[serde(default)]` on the containing
/// struct) and so does an explicit null, since JSON clients commonly send null to mean "no
/// change".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> Field<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Field::Set(_))
    }

    pub fn is_unset(&self) -> bool {
        !self.is_set()
    }

    /// Overwrites `target` with the carried value if the field is set; otherwise leaves it as is.
    pub fn apply_to(self, target: &mut T) {
        if let Field::Set(value) = self {
            *target = value;
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(option: Option<T>) -> Self {
        match option {
            Some(value) => Field::Set(value),
            None => Field::Unset,
        }
    }
}

impl<'de, T> Deserialize<'de> for Field<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Field::from)
    }
}

// Unset fields should be skipped with skip_serializing_if = "Field::is_unset"; if they aren't,
// they come out as null (or as an error, for formats without null).
impl<T> Serialize for Field<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Field::Set(value) => serializer.serialize_some(value),
            Field::Unset => serializer.serialize_none(),
        }
    }
}
