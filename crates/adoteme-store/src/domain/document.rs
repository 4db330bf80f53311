//! Document Model
//!
//! A schema-flexible record addressed by collection and identity.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field map of a document (identity excluded)
pub type Fields = Map<String, Value>;

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identity within its collection
    pub id: String,
    /// Field values
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a document from a serializable record.
    ///
    /// An `id` field on the record is lifted out into the document identity.
    pub fn encode<T: Serialize>(id: impl Into<String>, record: &T) -> Result<Self, serde_json::Error> {
        let mut fields = to_fields(record)?;
        fields.remove("id");
        Ok(Self::new(id, fields))
    }

    /// Decode into a typed record, exposing the identity as an `id` field.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
    }

    /// Apply a partial write: supplied fields overwrite, others stay.
    pub fn merge(&mut self, partial: Fields) {
        for (key, value) in partial {
            self.fields.insert(key, value);
        }
    }
}

/// Serialize a value into a field map
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Equality predicate on a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.fields.get(&self.field) == Some(&self.value)
    }
}
