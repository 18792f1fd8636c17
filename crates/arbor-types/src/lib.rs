//! # arbor-types: Core types for `Arbor`
//!
//! This crate contains the small set of types shared by every Arbor crate:
//! - Node handles ([`NodeId`])
//! - Dynamically typed attribute values ([`Value`], [`ValueType`])
//! - Attribute maps ([`Attributes`])

use std::{
    collections::BTreeMap,
    fmt::{Debug, Display},
};

use serde::{Deserialize, Serialize};

// ============================================================================
// Node handles
// ============================================================================

/// Handle to a node stored in a tree arena.
///
/// The handle pairs an arena slot with the generation the slot had when the
/// node was created. Once a node is removed its slot generation moves on, so
/// a handle kept across a structural change is detected as stale instead of
/// silently pointing at whatever node reused the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the arena slot.
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Returns the slot generation this handle was issued for.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

// ============================================================================
// Values
// ============================================================================

/// Declared properties of a node, keyed by member name.
pub type Attributes = BTreeMap<String, Value>;

/// A dynamically typed value reachable through a path address.
///
/// Serialized untagged so persisted documents read naturally:
/// `true`, `42`, `0.5`, `"text"`, `[1, 2]`, `{"a": 1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

/// The variant of a [`Value`], used for type checks on assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Text,
    List,
    Record,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Text => "text",
            ValueType::List => "list",
            ValueType::Record => "record",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Text(_) => ValueType::Text,
            Value::List(_) => ValueType::List,
            Value::Record(_) => ValueType::Record,
        }
    }

    /// Returns true if `other` can be stored where `self` currently lives.
    ///
    /// Variants must match exactly: an `Int` is never accepted for a `Float`.
    pub fn same_type(&self, other: &Value) -> bool {
        self.value_type() == other.value_type()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// False if any float in the value is NaN or infinite. JSON has no
    /// spelling for those, so they cannot be persisted.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Float(x) => x.is_finite(),
            Value::List(items) => items.iter().all(Value::is_finite),
            Value::Record(fields) => fields.values().all(Value::is_finite),
            Value::Bool(_) | Value::Int(_) | Value::Text(_) => true,
        }
    }

    /// Returns a list of strings if this is a `List` made only of `Text`.
    pub fn as_text_list(&self) -> Option<Vec<&str>> {
        self.as_list()?.iter().map(Value::as_text).collect()
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Record(fields) => {
                f.write_str("{")?;
                for (i, (key, item)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            (-1_000_000i32..1_000_000).prop_map(|n| Value::Float(f64::from(n) / 4.0)),
            "[a-zA-Z0-9 ._]{0,12}".prop_map(Value::Text),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Record),
            ]
        })
    }

    proptest! {
        #[test]
        fn finite_values_survive_json(value in arb_value()) {
            prop_assert!(value.is_finite());
            let json = serde_json::to_string(&value).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, value);
        }
    }

    #[test_case(Value::Float(f64::NAN); "nan")]
    #[test_case(Value::Float(f64::INFINITY); "infinity")]
    #[test_case(Value::from(vec![1.0, f64::NEG_INFINITY]); "nested in a list")]
    fn non_finite_floats_are_detected(value: Value) {
        assert!(!value.is_finite());
    }

    #[test_case("true", ValueType::Bool; "bool")]
    #[test_case("7", ValueType::Int; "int")]
    #[test_case("7.5", ValueType::Float; "float")]
    #[test_case("2.0", ValueType::Float; "float with zero fraction")]
    #[test_case("\"x\"", ValueType::Text; "text")]
    #[test_case("[1, \"a\"]", ValueType::List; "list")]
    #[test_case("{\"a\": 1}", ValueType::Record; "record")]
    fn json_scalars_map_to_expected_variant(json: &str, expected: ValueType) {
        let value: Value = serde_json::from_str(json).unwrap();
        assert_eq!(value.value_type(), expected);
    }

    #[test]
    fn float_with_zero_fraction_keeps_its_type_when_written() {
        let json = serde_json::to_string(&Value::Float(2.0)).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Float(2.0));
    }

    #[test]
    fn same_type_never_crosses_numeric_variants() {
        assert!(!Value::Int(1).same_type(&Value::Float(1.0)));
        assert!(Value::Int(1).same_type(&Value::Int(9)));
    }

    #[test]
    fn text_list_requires_every_item_to_be_text() {
        let names = Value::from(vec!["a", "b"]);
        assert_eq!(names.as_text_list(), Some(vec!["a", "b"]));

        let mixed = Value::List(vec![Value::from("a"), Value::Int(1)]);
        assert_eq!(mixed.as_text_list(), None);
    }

    #[test]
    fn display_is_human_readable() {
        let value = Value::List(vec![Value::Int(1), Value::from("two"), Value::Bool(false)]);
        assert_eq!(value.to_string(), "[1, two, false]");
    }

    #[test]
    fn node_id_exposes_slot_and_generation() {
        let id = NodeId::new(4, 2);
        assert_eq!(id.index(), 4);
        assert_eq!(id.generation(), 2);
        assert_eq!(id.to_string(), "#4v2");
    }
}
