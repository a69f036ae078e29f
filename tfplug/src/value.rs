//! Tri-state attribute values
//!
//! Every attribute Terraform sends can be null, unknown (during planning)
//! or known. `Value<T>` keeps that distinction visible to provider code;
//! `FromDynamic`/`IntoDynamic` convert between Rust types and `Dynamic`.

use crate::error::{Result, TfplugError};
use crate::types::{AttributePath, Dynamic, DynamicValue};
use std::collections::{BTreeMap, HashMap};

/// A value that is null, not yet known, or known
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value<T> {
    #[default]
    Null,
    Unknown,
    Known(T),
}

impl<T> Value<T> {
    pub fn known(value: T) -> Self {
        Value::Known(value)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Value::Known(_))
    }

    pub fn as_ref(&self) -> Value<&T> {
        match self {
            Value::Null => Value::Null,
            Value::Unknown => Value::Unknown,
            Value::Known(v) => Value::Known(v),
        }
    }

    /// Known value or `None`; null and unknown are treated alike
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Value::Known(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Value::Known(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Value<U> {
        match self {
            Value::Null => Value::Null,
            Value::Unknown => Value::Unknown,
            Value::Known(v) => Value::Known(f(v)),
        }
    }

    /// Returns self when known, otherwise `fallback`
    pub fn or(self, fallback: Value<T>) -> Value<T> {
        match self {
            Value::Known(_) => self,
            _ => fallback,
        }
    }
}

impl<T: Clone> Value<T> {
    pub fn cloned_option(&self) -> Option<T> {
        self.as_option().cloned()
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Value::Known(v),
            None => Value::Null,
        }
    }
}

/// Conversion from a known (non-null, wholly known) `Dynamic`
pub trait FromDynamic: Sized {
    fn from_dynamic(value: &Dynamic) -> Result<Self>;
}

/// Conversion into `Dynamic`
pub trait IntoDynamic {
    fn into_dynamic(self) -> Dynamic;
}

fn mismatch(expected: &str, actual: &Dynamic) -> TfplugError {
    TfplugError::TypeMismatch {
        path: String::new(),
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

impl FromDynamic for Dynamic {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromDynamic for String {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        match value {
            Dynamic::String(s) => Ok(s.clone()),
            other => Err(mismatch("string", other)),
        }
    }
}

impl FromDynamic for bool {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        match value {
            Dynamic::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromDynamic for f64 {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        match value {
            Dynamic::Number(n) => Ok(*n),
            // Numbers beyond float precision travel as strings
            Dynamic::String(s) => s.parse().map_err(|_| mismatch("number", value)),
            other => Err(mismatch("number", other)),
        }
    }
}

impl FromDynamic for i64 {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        let n = f64::from_dynamic(value)?;
        if n.fract() != 0.0 || !n.is_finite() {
            return Err(TfplugError::TypeMismatch {
                path: String::new(),
                expected: "whole number".to_string(),
                actual: n.to_string(),
            });
        }
        Ok(n as i64)
    }
}

impl<T: FromDynamic> FromDynamic for Vec<T> {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        let items = value.as_list().ok_or_else(|| mismatch("list", value))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                if item.is_null() {
                    return Err(TfplugError::TypeMismatch {
                        path: format!("[{}]", i),
                        expected: "non-null element".to_string(),
                        actual: "null".to_string(),
                    });
                }
                T::from_dynamic(item).map_err(|e| e.at_path(&AttributePath::root().index(i as i64)))
            })
            .collect()
    }
}

impl<T: FromDynamic> FromDynamic for BTreeMap<String, T> {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        let entries = value.as_map().ok_or_else(|| mismatch("map", value))?;
        entries
            .iter()
            .map(|(k, v)| {
                T::from_dynamic(v)
                    .map(|parsed| (k.clone(), parsed))
                    .map_err(|e| e.at_path(&AttributePath::root().key(k)))
            })
            .collect()
    }
}

impl<T: FromDynamic> FromDynamic for HashMap<String, T> {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        Ok(BTreeMap::<String, T>::from_dynamic(value)?.into_iter().collect())
    }
}

impl<T: FromDynamic> FromDynamic for Value<T> {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        match value {
            Dynamic::Null => Ok(Value::Null),
            v if v.contains_unknown() => Ok(Value::Unknown),
            v => T::from_dynamic(v).map(Value::Known),
        }
    }
}

impl IntoDynamic for Dynamic {
    fn into_dynamic(self) -> Dynamic {
        self
    }
}

impl IntoDynamic for String {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::String(self)
    }
}

impl IntoDynamic for &str {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::String(self.to_string())
    }
}

impl IntoDynamic for bool {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Bool(self)
    }
}

impl IntoDynamic for f64 {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Number(self)
    }
}

impl IntoDynamic for i64 {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Number(self as f64)
    }
}

impl IntoDynamic for u64 {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Number(self as f64)
    }
}

impl<T: IntoDynamic> IntoDynamic for Vec<T> {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::List(self.into_iter().map(IntoDynamic::into_dynamic).collect())
    }
}

impl<T: IntoDynamic> IntoDynamic for BTreeMap<String, T> {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Map(
            self.into_iter()
                .map(|(k, v)| (k, v.into_dynamic()))
                .collect(),
        )
    }
}

impl<T: IntoDynamic> IntoDynamic for HashMap<String, T> {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Map(
            self.into_iter()
                .map(|(k, v)| (k, v.into_dynamic()))
                .collect(),
        )
    }
}

impl<T: IntoDynamic> IntoDynamic for Option<T> {
    fn into_dynamic(self) -> Dynamic {
        match self {
            Some(v) => v.into_dynamic(),
            None => Dynamic::Null,
        }
    }
}

impl<T: IntoDynamic> IntoDynamic for Value<T> {
    fn into_dynamic(self) -> Dynamic {
        match self {
            Value::Null => Dynamic::Null,
            Value::Unknown => Dynamic::Unknown,
            Value::Known(v) => v.into_dynamic(),
        }
    }
}

/// Typed reads from a nested object value
pub struct ObjectReader<'a> {
    entries: &'a HashMap<String, Dynamic>,
}

impl<'a> ObjectReader<'a> {
    pub fn new(value: &'a Dynamic) -> Result<Self> {
        let entries = value.as_map().ok_or_else(|| mismatch("object", value))?;
        Ok(Self { entries })
    }

    pub fn get<T: FromDynamic>(&self, name: &str) -> Result<Value<T>> {
        match self.entries.get(name) {
            None | Some(Dynamic::Null) => Ok(Value::Null),
            Some(v) if v.contains_unknown() => Ok(Value::Unknown),
            Some(v) => T::from_dynamic(v)
                .map(Value::Known)
                .map_err(|e| e.at_path(&AttributePath::root().attribute(name))),
        }
    }
}

/// Builds nested object values attribute by attribute
#[derive(Debug, Default)]
pub struct ObjectBuilder {
    entries: HashMap<String, Dynamic>,
}

impl ObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &str, value: impl IntoDynamic) -> Self {
        self.entries.insert(name.to_string(), value.into_dynamic());
        self
    }

    pub fn build(self) -> Dynamic {
        Dynamic::Map(self.entries)
    }
}

impl From<ObjectBuilder> for DynamicValue {
    fn from(builder: ObjectBuilder) -> Self {
        DynamicValue::new(builder.build())
    }
}
