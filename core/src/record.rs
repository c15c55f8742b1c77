//! Immutable, schema-less representation of JSON response bodies.
//!
//! # Design
//! The API returns loosely shaped JSON that differs per resource and per
//! server version, so responses are not bound to fixed DTOs. A `Record`
//! mirrors the document structurally and only hands out shared
//! references: once the normalizer builds one, nothing can change it.
//! Object fields are held in a `BTreeMap`, which makes equality and
//! serialization independent of the order the server emitted them in.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

/// A parsed response body, or any value nested inside one.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    node: Node,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Record>),
    Object(BTreeMap<String, Record>),
}

/// Borrowed, read-only view of a `Record` for pattern matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordView<'a> {
    Null,
    Bool(bool),
    Number(&'a Number),
    String(&'a str),
    Array(&'a [Record]),
    Object(&'a BTreeMap<String, Record>),
}

impl Record {
    /// Parse JSON text into a record.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Value>(text).map(Record::from)
    }

    pub fn view(&self) -> RecordView<'_> {
        match &self.node {
            Node::Null => RecordView::Null,
            Node::Bool(b) => RecordView::Bool(*b),
            Node::Number(n) => RecordView::Number(n),
            Node::String(s) => RecordView::String(s),
            Node::Array(items) => RecordView::Array(items),
            Node::Object(fields) => RecordView::Object(fields),
        }
    }

    /// Field of an object record. `None` for missing fields and non-objects.
    pub fn get(&self, key: &str) -> Option<&Record> {
        match &self.node {
            Node::Object(fields) => fields.get(key),
            _ => None,
        }
    }

    /// Element of an array record.
    pub fn at(&self, index: usize) -> Option<&Record> {
        match &self.node {
            Node::Array(items) => items.get(index),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.node, Node::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self.node, Node::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.node, Node::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.node {
            Node::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match &self.node {
            Node::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match &self.node {
            Node::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match &self.node {
            Node::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.node {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// Number of array items or object fields; zero for scalars.
    pub fn len(&self) -> usize {
        match &self.node {
            Node::Array(items) => items.len(),
            Node::Object(fields) => fields.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Array items in server order. Empty for non-arrays.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        let items: &[Record] = match &self.node {
            Node::Array(items) => items,
            _ => &[],
        };
        items.iter()
    }

    /// Field names of an object record, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let fields = match &self.node {
            Node::Object(fields) => Some(fields),
            _ => None,
        };
        fields.into_iter().flat_map(|f| f.keys().map(String::as_str))
    }

    /// Split an array record into its items; `Err(self)` for anything else.
    pub fn into_items(self) -> Result<Vec<Record>, Record> {
        match self.node {
            Node::Array(items) => Ok(items),
            node => Err(Record { node }),
        }
    }

    /// Convert back into a `serde_json::Value`.
    pub fn to_value(&self) -> Value {
        match &self.node {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => Value::Number(n.clone()),
            Node::String(s) => Value::String(s.clone()),
            Node::Array(items) => Value::Array(items.iter().map(Record::to_value).collect()),
            Node::Object(fields) => Value::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.to_value())).collect(),
            ),
        }
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        let node = match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => Node::Number(n),
            Value::String(s) => Node::String(s),
            Value::Array(items) => Node::Array(items.into_iter().map(Record::from).collect()),
            Value::Object(fields) => {
                Node::Object(fields.into_iter().map(|(k, v)| (k, Record::from(v))).collect())
            }
        };
        Record { node }
    }
}

impl From<Vec<Record>> for Record {
    fn from(items: Vec<Record>) -> Self {
        Record { node: Node::Array(items) }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.node {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Number(n) => n.serialize(serializer),
            Node::String(s) => serializer.serialize_str(s),
            Node::Array(items) => items.serialize(serializer),
            Node::Object(fields) => fields.serialize(serializer),
        }
    }
}

impl std::ops::Index<&str> for Record {
    type Output = Record;

    /// Missing fields index to a shared null record, like `serde_json::Value`.
    fn index(&self, key: &str) -> &Record {
        static NULL: Record = Record { node: Node::Null };
        self.get(key).unwrap_or(&NULL)
    }
}
