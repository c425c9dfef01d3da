//! Dynamic values for structural interpolation.
//!
//! `Value` is the data tree walked by [`deep_lerp`](crate::tweening::interpolation::deep_lerp).
//! Custom types join in by implementing [`Interpolatable`] and being wrapped
//! with [`Value::custom`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Number,
    Text,
    Bool,
    List,
    Map,
    Object,
    Custom,
}

/// Values that know how to interpolate themselves.
///
/// `lerp_to` returns `None` when `to` is not something this value can blend
/// with, which makes `deep_lerp` fall back to a hard cutover.
pub trait Interpolatable: fmt::Debug {
    fn lerp_to(&self, to: &Value, progress: f64) -> Option<Value>;
    fn eq_dyn(&self, other: &dyn Interpolatable) -> bool;
    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
    Bool(bool),
    List(Vec<Value>),
    /// Keyed collection.
    Map(HashMap<String, Value>),
    /// Record keyed by property name.
    Object(BTreeMap<String, Value>),
    Custom(Rc<dyn Interpolatable>),
}

impl Value {
    pub fn custom(value: impl Interpolatable + 'static) -> Self {
        Value::Custom(Rc::new(value))
    }

    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Number(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::Text,
            Value::Bool(_) => ValueKind::Bool,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Object(_) => ValueKind::Object,
            Value::Custom(_) => ValueKind::Custom,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn downcast_custom<T: 'static>(&self) -> Option<&T> {
        match self {
            Value::Custom(inner) => inner.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Convert back to JSON. Custom values have no JSON form.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        Some(match self {
            Value::Null => serde_json::Value::Null,
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Option<Vec<_>>>()?,
            ),
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                    .collect::<Option<serde_json::Map<_, _>>>()?,
            ),
            Value::Object(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                    .collect::<Option<serde_json::Map<_, _>>>()?,
            ),
            Value::Custom(_) => return None,
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => a.eq_dyn(b.as_ref()),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
