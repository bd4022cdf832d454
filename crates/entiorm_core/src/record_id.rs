//! Record references.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Reference to one row: a table name plus the row's local key.
///
/// On the wire a reference is either the text form `table:key` or a
/// structured `{ "tb": .., "id": .. }` object. Both deserialize into a
/// `RecordId`; serialization always produces the text form.
///
/// A reference deserialized from text without a `:` separator carries only
/// a key. Such a reference is *unqualified* and is resolved against the
/// entity's table with [`RecordId::qualified_for`] before it is sent back to
/// the database.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId {
    table: String,
    key: String,
}

impl RecordId {
    /// Creates a fully-qualified record reference.
    #[must_use]
    pub fn new(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Creates a reference that only knows its local key.
    #[must_use]
    pub fn key_only(key: impl Into<String>) -> Self {
        Self {
            table: String::new(),
            key: key.into(),
        }
    }

    /// Parses the text form.
    ///
    /// `users:42` yields a qualified reference; `42` yields a key-only one.
    /// Empty input, an empty table before the separator, or an empty key
    /// are rejected.
    pub fn parse(input: &str) -> CoreResult<Self> {
        match input.split_once(':') {
            Some((table, key)) if !table.is_empty() && !key.is_empty() => {
                Ok(Self::new(table, key))
            }
            Some(_) => Err(CoreError::invalid_record_id(input)),
            None if input.is_empty() => Err(CoreError::invalid_record_id(input)),
            None => Ok(Self::key_only(input)),
        }
    }

    /// Returns the table, empty for a key-only reference.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the local key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true if the reference names its table.
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        !self.table.is_empty()
    }

    /// Resolves a key-only reference against `table`.
    ///
    /// Qualified references are returned unchanged, even when they name a
    /// different table.
    #[must_use]
    pub fn qualified_for(&self, table: &str) -> Self {
        if self.is_qualified() {
            self.clone()
        } else {
            Self::new(table, self.key.clone())
        }
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({self})")
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_qualified() {
            write!(f, "{}:{}", self.table, self.key)
        } else {
            f.write_str(&self.key)
        }
    }
}

impl FromStr for RecordId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireRecordId {
    Text(String),
    Structured { tb: String, id: Value },
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match WireRecordId::deserialize(deserializer)? {
            WireRecordId::Text(text) => Self::parse(&text).map_err(serde::de::Error::custom),
            WireRecordId::Structured { tb, id } => {
                let key = match id {
                    Value::String(key) => key,
                    other => other.to_string(),
                };
                Ok(Self::new(tb, key))
            }
        }
    }
}
