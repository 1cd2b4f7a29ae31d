//! Property system for node and arc attributes.
//!
//! Source attributes, arc weights and analytics annotations all live in the same
//! open string-keyed map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strongly-typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Text value (names, road classes)
    String(String),
    /// Integer value (codes, counts, cluster IDs)
    Int(i64),
    /// Floating point value (lengths, speeds, scores)
    Float(f64),
    /// Boolean flag
    Bool(bool),
    /// Opaque bytes carried through from the source
    Bytes(Vec<u8>),
    /// Explicit null/absence of value
    Null,
}

impl PropertyValue {
    /// Numeric view of the value, used when the property is a weight field.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Whether the value is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, PropertyValue::Int(_) | PropertyValue::Float(_))
    }

    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::String(_) => "string",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Bytes(_) => "bytes",
            PropertyValue::Null => "null",
        }
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(value as i64)
    }
}

impl From<usize> for PropertyValue {
    fn from(value: usize) -> Self {
        PropertyValue::Int(value as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(value: Vec<u8>) -> Self {
        PropertyValue::Bytes(value)
    }
}

/// Open key-value attribute store for nodes and arcs.
///
/// Keys iterate in sorted order so exports produce stable column layouts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMap {
    data: BTreeMap<String, PropertyValue>,
}

impl PropertyMap {
    /// Create a new empty property map.
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Builder pattern: add a property and return self.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Insert a property value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.data.insert(key.into(), value.into());
    }

    /// Get a property value by key.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.data.get(key)
    }

    /// Remove a property by key.
    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.data.remove(key)
    }

    /// Check if a property exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Get the number of properties.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the property map is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.data.iter()
    }

    /// Copy every entry of `other` into this map, overwriting duplicates.
    pub fn extend_from(&mut self, other: &PropertyMap) {
        for (key, value) in other.iter() {
            self.data.insert(key.clone(), value.clone());
        }
    }

    /// Type-safe getter for string properties.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.data.get(key) {
            Some(PropertyValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Type-safe getter for integer properties.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.data.get(key) {
            Some(PropertyValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Type-safe getter for float properties.
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.data.get(key) {
            Some(PropertyValue::Float(f)) => Some(*f),
            _ => None,
        }
    }

    /// Numeric getter accepting both integers and floats.
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(PropertyValue::as_f64)
    }

    /// Type-safe getter for boolean properties.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.data.get(key) {
            Some(PropertyValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

impl FromIterator<(String, PropertyValue)> for PropertyMap {
    fn from_iter<T: IntoIterator<Item = (String, PropertyValue)>>(iter: T) -> Self {
        Self {
            data: BTreeMap::from_iter(iter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_conversions() {
        let s: PropertyValue = "primary".into();
        assert!(matches!(s, PropertyValue::String(_)));

        let i: PropertyValue = 42i64.into();
        assert!(matches!(i, PropertyValue::Int(42)));

        let f: PropertyValue = 2.5.into();
        assert!(matches!(f, PropertyValue::Float(_)));

        let b: PropertyValue = vec![1u8, 2].into();
        assert!(matches!(b, PropertyValue::Bytes(_)));
    }

    #[test]
    fn test_property_map_builder() {
        let props = PropertyMap::new()
            .with("name", "Main Street")
            .with("lanes", 2i64)
            .with("oneway", false);

        assert_eq!(props.get_string("name"), Some("Main Street"));
        assert_eq!(props.get_int("lanes"), Some(2));
        assert_eq!(props.get_bool("oneway"), Some(false));
    }

    #[test]
    fn test_numeric_getter_accepts_int_and_float() {
        let props = PropertyMap::new().with("length", 12i64).with("time", 1.5);
        assert_eq!(props.get_number("length"), Some(12.0));
        assert_eq!(props.get_number("time"), Some(1.5));
        assert_eq!(props.get_number("missing"), None);
    }

    #[test]
    fn test_property_map_type_safety() {
        let props = PropertyMap::new().with("name", "arc").with("lanes", 3i64);

        // Wrong type returns None
        assert_eq!(props.get_int("name"), None);
        assert_eq!(props.get_string("lanes"), None);
        assert_eq!(props.get_number("name"), None);
    }

    #[test]
    fn test_extend_from_overwrites() {
        let mut props = PropertyMap::new().with("a", 1i64).with("b", 2i64);
        props.extend_from(&PropertyMap::new().with("b", 3i64).with("c", "x"));
        assert_eq!(props.len(), 3);
        assert_eq!(props.get_int("b"), Some(3));
    }

    #[test]
    fn test_keys_iterate_sorted() {
        let props = PropertyMap::new().with("z", 1i64).with("a", 2i64).with("m", 3i64);
        let keys: Vec<_> = props.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "m", "z"]);
    }
}
