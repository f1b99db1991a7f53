//! The document-store capability: keyed JSON documents grouped in
//! collections, single-field equality queries, and atomic write batches.

use rand::{Rng, distr::Alphanumeric};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::StoreError;

const AUTO_ID_LEN: usize = 20;

/// A random 20-character alphanumeric document id.
pub fn auto_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

/// A document returned by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: String,
    pub data: Value,
}

impl Snapshot {
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.data)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(Value),
    /// Append each element not already present (deep equality). A missing
    /// or non-array field is replaced by a new array.
    ArrayUnion(Vec<Value>),
    /// Append every element, duplicates included. A missing or non-array
    /// field is replaced by a new array.
    ArrayAppend(Vec<Value>),
    /// Milliseconds since the epoch, assigned by the store at commit.
    ServerTimestamp,
}

/// Ordered top-level field writes for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(pub Vec<(String, FieldValue)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.push((name.to_string(), FieldValue::Value(value.into())));
        self
    }

    pub fn array_union(mut self, name: &str, items: Vec<Value>) -> Self {
        self.0.push((name.to_string(), FieldValue::ArrayUnion(items)));
        self
    }

    pub fn array_append(mut self, name: &str, items: Vec<Value>) -> Self {
        self.0.push((name.to_string(), FieldValue::ArrayAppend(items)));
        self
    }

    pub fn server_timestamp(mut self, name: &str) -> Self {
        self.0.push((name.to_string(), FieldValue::ServerTimestamp));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One write in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Replace the whole document.
    Set {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Apply fields to an existing document; fails with `NotFound` otherwise.
    Update {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Merge `patch` into the first object of array `field` whose `key_field`
    /// equals `key`. Other elements are left untouched.
    PatchArrayEntry {
        collection: String,
        id: String,
        field: String,
        key_field: String,
        key: Value,
        patch: Map<String, Value>,
    },
}

impl Write {
    pub fn set(collection: &str, id: &str, fields: Fields) -> Self {
        Write::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        }
    }

    pub fn update(collection: &str, id: &str, fields: Fields) -> Self {
        Write::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        }
    }

    pub fn patch_array_entry(
        collection: &str,
        id: &str,
        field: &str,
        key_field: &str,
        key: impl Into<Value>,
        patch: Map<String, Value>,
    ) -> Self {
        Write::PatchArrayEntry {
            collection: collection.to_string(),
            id: id.to_string(),
            field: field.to_string(),
            key_field: key_field.to_string(),
            key: key.into(),
            patch,
        }
    }
}

pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Documents whose top-level `field` equals `value`, ordered by id.
    fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Snapshot>, StoreError>;

    /// Apply all writes atomically: either every write lands or none does.
    /// Returns one flag per write telling whether it matched its target;
    /// only `PatchArrayEntry` can report `false`.
    fn commit(&self, writes: Vec<Write>) -> Result<Vec<bool>, StoreError>;

    fn new_id(&self) -> String {
        auto_id()
    }

    fn get_as<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, StoreError>
    where
        Self: Sized,
    {
        match self.get(collection, id)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.commit(vec![Write::set(collection, id, fields)])?;
        Ok(())
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.commit(vec![Write::update(collection, id, fields)])?;
        Ok(())
    }

    fn patch_array_entry(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        key_field: &str,
        key: Value,
        patch: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        let applied = self.commit(vec![Write::patch_array_entry(
            collection, id, field, key_field, key, patch,
        )])?;
        Ok(applied.first().copied().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_ids_are_distinct_alphanumerics() {
        let a = auto_id();
        let b = auto_id();
        assert_eq!(a.len(), AUTO_ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn fields_keep_insertion_order() {
        let fields = Fields::new()
            .server_timestamp("createAt")
            .value("messages", Value::Array(vec![]));
        let names: Vec<&str> = fields.0.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["createAt", "messages"]);
    }
}
