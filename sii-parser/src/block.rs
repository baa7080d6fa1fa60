use indexmap::IndexMap;
use serde::Serialize;

/// Key suffix marking a repeatable item (`lanes_left[] : ...`)
pub const ARRAY_MARKER: &str = "[]";

/// Value stored under one key of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SiiValue {
    Scalar(String),
    /// Every occurrence of an `[]`-suffixed key, in file order
    Array(Vec<String>),
}

impl SiiValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            Self::Scalar(_) => None,
            Self::Array(v) => Some(v),
        }
    }
}

impl PartialEq<&str> for SiiValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_scalar() == Some(*other)
    }
}

/// One `type : name { ... }` unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiiBlock {
    pub block_type: String,
    pub block_name: String,
    pub items: IndexMap<String, SiiValue>,
}

impl SiiBlock {
    pub fn new(block_type: impl Into<String>, block_name: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            block_name: block_name.into(),
            items: IndexMap::new(),
        }
    }

    /// Store an item. Array keys accumulate, scalar keys keep the last value.
    pub fn insert(&mut self, key: &str, value: String) {
        if key.ends_with(ARRAY_MARKER) {
            match self.items.get_mut(key) {
                Some(SiiValue::Array(values)) => values.push(value),
                _ => {
                    self.items.insert(key.to_string(), SiiValue::Array(vec![value]));
                }
            }
        } else {
            self.items.insert(key.to_string(), SiiValue::Scalar(value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&SiiValue> {
        self.items.get(key)
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.items.get(key).and_then(SiiValue::as_scalar)
    }

    /// Values of an array key; empty when the key never occurred.
    pub fn array(&self, key: &str) -> &[String] {
        self.items
            .get(key)
            .and_then(SiiValue::as_array)
            .unwrap_or(&[])
    }
}
