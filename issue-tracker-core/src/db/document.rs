use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::StoreError;

/// Flat field mapping persisted for every document.
pub type Fields = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
    /// Bumped by the store on every write; used as the optimistic-concurrency token.
    pub version: u64,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
            version: 0,
        }
    }

    /// Decode into a model, exposing the document id as its `id` field.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Serialize a model or input into a field mapping.
pub fn encode<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Backend(format!(
            "expected a field mapping, got {other}"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    Set(Value),
    /// Append each value not already present, creating the array when absent.
    ArrayUnion(Vec<Value>),
}

/// Merge-update applied to an existing document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    changes: BTreeMap<String, FieldChange>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Fields) -> Self {
        let changes = fields
            .into_iter()
            .map(|(name, value)| (name, FieldChange::Set(value)))
            .collect();
        Self { changes }
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.changes
            .insert(field.to_string(), FieldChange::Set(value.into()));
        self
    }

    pub fn array_union(mut self, field: &str, values: Vec<Value>) -> Self {
        self.changes
            .insert(field.to_string(), FieldChange::ArrayUnion(values));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> impl Iterator<Item = (&String, &FieldChange)> {
        self.changes.iter()
    }

    pub fn apply(&self, fields: &mut Fields) {
        for (name, change) in &self.changes {
            match change {
                FieldChange::Set(value) => {
                    fields.insert(name.clone(), value.clone());
                }
                FieldChange::ArrayUnion(values) => {
                    let slot = fields
                        .entry(name.clone())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if !slot.is_array() {
                        *slot = Value::Array(Vec::new());
                    }
                    if let Value::Array(items) = slot {
                        for value in values {
                            if !items.contains(value) {
                                items.push(value.clone());
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Equality filter; queries combine filters conjunctively.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}
