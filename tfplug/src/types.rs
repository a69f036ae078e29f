//! Values, attribute paths and diagnostics
//!
//! Terraform hands every configuration, plan and state object to the
//! provider as a msgpack document. This module holds the decoded form
//! (`Dynamic`), the wire wrapper (`DynamicValue`), attribute paths and
//! diagnostics.

use crate::error::{Result, TfplugError};
use crate::value::{FromDynamic, IntoDynamic, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// msgpack extension type Terraform uses for unknown values
const UNKNOWN_EXT_TYPE: i8 = 0;

/// A decoded Terraform value. Objects and maps share the `Map` variant; sets and tuples share `List`.
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    Null,
    Bool(bool),
    /// All numbers are f64 to match Terraform
    Number(f64),
    String(String),
    /// List, set or tuple
    List(Vec<Dynamic>),
    /// Object or map
    Map(HashMap<String, Dynamic>),
    /// Not known until apply
    Unknown,
}

impl Dynamic {
    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
            Dynamic::Unknown => "unknown",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    /// True when this value or anything nested inside it is unknown
    pub fn contains_unknown(&self) -> bool {
        match self {
            Dynamic::Unknown => true,
            Dynamic::List(items) => items.iter().any(Dynamic::contains_unknown),
            Dynamic::Map(entries) => entries.values().any(Dynamic::contains_unknown),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Dynamic::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Dynamic>> {
        match self {
            Dynamic::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Dynamic>> {
        match self {
            Dynamic::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up an attribute of an object value
    pub fn attribute(&self, name: &str) -> Option<&Dynamic> {
        self.as_map().and_then(|m| m.get(name))
    }

    fn to_msgpack_value(&self) -> rmpv::Value {
        match self {
            Dynamic::Null => rmpv::Value::Nil,
            Dynamic::Bool(b) => rmpv::Value::Boolean(*b),
            Dynamic::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    rmpv::Value::from(*n as i64)
                } else {
                    rmpv::Value::F64(*n)
                }
            }
            Dynamic::String(s) => rmpv::Value::from(s.as_str()),
            Dynamic::List(items) => {
                rmpv::Value::Array(items.iter().map(Dynamic::to_msgpack_value).collect())
            }
            Dynamic::Map(entries) => {
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                rmpv::Value::Map(
                    keys.into_iter()
                        .map(|k| (rmpv::Value::from(k.as_str()), entries[k].to_msgpack_value()))
                        .collect(),
                )
            }
            Dynamic::Unknown => rmpv::Value::Ext(UNKNOWN_EXT_TYPE, vec![0]),
        }
    }

    fn from_msgpack_value(value: rmpv::Value) -> Result<Self> {
        Ok(match value {
            rmpv::Value::Nil => Dynamic::Null,
            rmpv::Value::Boolean(b) => Dynamic::Bool(b),
            rmpv::Value::Integer(i) => Dynamic::Number(i.as_f64().ok_or_else(|| {
                TfplugError::DecodingError(format!("integer {} out of range", i))
            })?),
            rmpv::Value::F32(f) => Dynamic::Number(f64::from(f)),
            rmpv::Value::F64(f) => Dynamic::Number(f),
            rmpv::Value::String(s) => Dynamic::String(s.into_str().ok_or_else(|| {
                TfplugError::DecodingError("string is not valid UTF-8".to_string())
            })?),
            rmpv::Value::Binary(bytes) => Dynamic::String(String::from_utf8(bytes).map_err(
                |e| TfplugError::DecodingError(format!("binary is not valid UTF-8: {}", e)),
            )?),
            rmpv::Value::Array(items) => Dynamic::List(
                items
                    .into_iter()
                    .map(Dynamic::from_msgpack_value)
                    .collect::<Result<_>>()?,
            ),
            rmpv::Value::Map(entries) => {
                let mut map = HashMap::with_capacity(entries.len());
                for (k, v) in entries {
                    let key = k.as_str().map(str::to_string).ok_or_else(|| {
                        TfplugError::DecodingError(format!("map key {} is not a string", k))
                    })?;
                    map.insert(key, Dynamic::from_msgpack_value(v)?);
                }
                Dynamic::Map(map)
            }
            // Refined unknowns arrive with other extension codes
            rmpv::Value::Ext(_, _) => Dynamic::Unknown,
        })
    }
}

impl Serialize for Dynamic {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Dynamic::Null => serializer.serialize_unit(),
            Dynamic::Bool(b) => serializer.serialize_bool(*b),
            Dynamic::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Dynamic::String(s) => serializer.serialize_str(s),
            Dynamic::List(l) => l.serialize(serializer),
            Dynamic::Map(m) => m.serialize(serializer),
            Dynamic::Unknown => Err(serde::ser::Error::custom(
                "unknown values cannot be serialized",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct DynamicVisitor;

        impl<'de> Visitor<'de> for DynamicVisitor {
            type Value = Dynamic;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a Terraform value")
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Null)
            }

            fn visit_none<E: de::Error>(self) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Null)
            }

            fn visit_some<D2>(self, deserializer: D2) -> std::result::Result<Dynamic, D2::Error>
            where
                D2: serde::Deserializer<'de>,
            {
                Dynamic::deserialize(deserializer)
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Bool(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Number(value as f64))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Number(value as f64))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Number(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::String(value.to_string()))
            }

            fn visit_string<E: de::Error>(self, value: String) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::String(value))
            }

            fn visit_seq<V>(self, mut seq: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Dynamic::List(vec))
            }

            fn visit_map<V>(self, mut map: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut hashmap = HashMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    hashmap.insert(key, value);
                }
                Ok(Dynamic::Map(hashmap))
            }
        }

        deserializer.deserialize_any(DynamicVisitor)
    }
}

/// A whole config, plan or state object, with its msgpack and JSON codecs
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl Default for DynamicValue {
    fn default() -> Self {
        Self::null()
    }
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self {
            value: Dynamic::Null,
        }
    }

    pub fn unknown() -> Self {
        Self {
            value: Dynamic::Unknown,
        }
    }

    /// An empty object, the usual starting point for building state
    pub fn object() -> Self {
        Self {
            value: Dynamic::Map(HashMap::new()),
        }
    }

    pub fn encode_msgpack(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &self.value.to_msgpack_value())
            .map_err(|e| TfplugError::EncodingError(format!("msgpack encoding failed: {}", e)))?;
        Ok(buf)
    }

    pub fn decode_msgpack(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::null());
        }

        let mut reader = data;
        let raw = rmpv::decode::read_value(&mut reader)
            .map_err(|e| TfplugError::DecodingError(format!("msgpack decoding failed: {}", e)))?;
        Ok(Self {
            value: Dynamic::from_msgpack_value(raw)?,
        })
    }

    pub fn encode_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.value)
            .map_err(|e| TfplugError::EncodingError(format!("json encoding failed: {}", e)))
    }

    pub fn decode_json(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::null());
        }
        let value = serde_json::from_slice(data)
            .map_err(|e| TfplugError::DecodingError(format!("json decoding failed: {}", e)))?;
        Ok(Self { value })
    }

    /// Reads an attribute as a tri-state value.
    ///
    /// Missing attributes read as `Null`. Values that are unknown anywhere
    /// inside read as `Unknown`.
    pub fn get<T: FromDynamic>(&self, path: &AttributePath) -> Result<Value<T>> {
        match self.lookup(path)? {
            None | Some(Dynamic::Null) => Ok(Value::Null),
            Some(v) if v.contains_unknown() => Ok(Value::Unknown),
            Some(v) => T::from_dynamic(v)
                .map(Value::Known)
                .map_err(|e| e.at_path(path)),
        }
    }

    /// Writes a tri-state value, creating intermediate objects as needed
    pub fn set<T: IntoDynamic>(&mut self, path: &AttributePath, value: T) -> Result<()> {
        self.set_value(path, value.into_dynamic())
    }

    /// Raw access to the value at a path, `None` when absent
    pub fn lookup(&self, path: &AttributePath) -> Result<Option<&Dynamic>> {
        let mut current = &self.value;

        for step in &path.steps {
            let next = match (current, step) {
                (Dynamic::Null, _) => return Ok(None),
                (Dynamic::Unknown, _) => return Ok(Some(&Dynamic::Unknown)),
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => m.get(name),
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                    usize::try_from(*idx).ok().and_then(|i| l.get(i))
                }
                (other, _) => {
                    return Err(TfplugError::InvalidPath(format!(
                        "cannot step into {} at {}",
                        other.type_name(),
                        path
                    )))
                }
            };
            match next {
                Some(v) => current = v,
                None => return Ok(None),
            }
        }

        Ok(Some(current))
    }

    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        self.get_known(path)
    }

    pub fn get_number(&self, path: &AttributePath) -> Result<f64> {
        self.get_known(path)
    }

    pub fn get_i64(&self, path: &AttributePath) -> Result<i64> {
        self.get_known(path)
    }

    pub fn get_bool(&self, path: &AttributePath) -> Result<bool> {
        self.get_known(path)
    }

    pub fn get_list(&self, path: &AttributePath) -> Result<Vec<Dynamic>> {
        self.get_known(path)
    }

    pub fn get_map(&self, path: &AttributePath) -> Result<HashMap<String, Dynamic>> {
        self.get_known(path)
    }

    fn get_known<T: FromDynamic>(&self, path: &AttributePath) -> Result<T> {
        match self.get::<T>(path)? {
            Value::Known(v) => Ok(v),
            Value::Null => Err(TfplugError::InvalidPath(format!("{} is null", path))),
            Value::Unknown => Err(TfplugError::InvalidPath(format!("{} is unknown", path))),
        }
    }

    pub fn set_string(&mut self, path: &AttributePath, value: String) -> Result<()> {
        self.set_value(path, Dynamic::String(value))
    }

    pub fn set_number(&mut self, path: &AttributePath, value: f64) -> Result<()> {
        self.set_value(path, Dynamic::Number(value))
    }

    pub fn set_bool(&mut self, path: &AttributePath, value: bool) -> Result<()> {
        self.set_value(path, Dynamic::Bool(value))
    }

    pub fn set_list(&mut self, path: &AttributePath, value: Vec<Dynamic>) -> Result<()> {
        self.set_value(path, Dynamic::List(value))
    }

    pub fn set_map(&mut self, path: &AttributePath, value: HashMap<String, Dynamic>) -> Result<()> {
        self.set_value(path, Dynamic::Map(value))
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.value.is_unknown()
    }

    pub fn mark_unknown(&mut self, path: &AttributePath) -> Result<()> {
        self.set_value(path, Dynamic::Unknown)
    }

    pub fn set_value(&mut self, path: &AttributePath, new_value: Dynamic) -> Result<()> {
        let Some((last, parents)) = path.steps.split_last() else {
            self.value = new_value;
            return Ok(());
        };

        if !matches!(self.value, Dynamic::Map(_)) {
            self.value = Dynamic::Map(HashMap::new());
        }

        let mut current = &mut self.value;
        for (idx, step) in parents.iter().enumerate() {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                    let entry = m.entry(name.clone()).or_insert(Dynamic::Null);
                    if entry.is_null() || entry.is_unknown() {
                        *entry = match path.steps.get(idx + 1) {
                            Some(AttributePathStep::ElementKeyInt(_)) => Dynamic::List(Vec::new()),
                            _ => Dynamic::Map(HashMap::new()),
                        };
                    }
                    entry
                }
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(i)) => {
                    let len = l.len();
                    usize::try_from(*i)
                        .ok()
                        .and_then(|i| l.get_mut(i))
                        .ok_or_else(|| {
                            TfplugError::InvalidPath(format!(
                                "index {} out of bounds (len {}) at {}",
                                i, len, path
                            ))
                        })?
                }
                (other, _) => {
                    return Err(TfplugError::InvalidPath(format!(
                        "cannot step into {} at {}",
                        other.type_name(),
                        path
                    )))
                }
            };
        }

        match (current, last) {
            (Dynamic::Map(m), AttributePathStep::AttributeName(name))
            | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                m.insert(name.clone(), new_value);
                Ok(())
            }
            (Dynamic::List(l), AttributePathStep::ElementKeyInt(i)) => {
                let len = l.len();
                let slot = usize::try_from(*i)
                    .ok()
                    .and_then(|i| l.get_mut(i))
                    .ok_or_else(|| {
                        TfplugError::InvalidPath(format!(
                            "index {} out of bounds (len {}) at {}",
                            i, len, path
                        ))
                    })?;
                *slot = new_value;
                Ok(())
            }
            (other, _) => Err(TfplugError::InvalidPath(format!(
                "cannot set inside {} at {}",
                other.type_name(),
                path
            ))),
        }
    }
}

impl TfplugError {
    /// Prefixes type errors raised by nested conversions with the full path
    pub(crate) fn at_path(self, path: &AttributePath) -> Self {
        match self {
            TfplugError::TypeMismatch {
                path: inner,
                expected,
                actual,
            } => TfplugError::TypeMismatch {
                path: if inner.is_empty() {
                    path.to_string()
                } else {
                    format!("{}{}", path, inner)
                },
                expected,
                actual,
            },
            other => other,
        }
    }
}

/// Location of a value inside an object, e.g. `rules[0].dest_port`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributePath {
    pub steps: Vec<AttributePathStep>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self {
            steps: vec![AttributePathStep::AttributeName(name.to_string())],
        }
    }

    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps
            .push(AttributePathStep::AttributeName(name.to_string()));
        self
    }

    pub fn index(mut self, idx: i64) -> Self {
        self.steps.push(AttributePathStep::ElementKeyInt(idx));
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.steps
            .push(AttributePathStep::ElementKeyString(key.to_string()));
        self
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                AttributePathStep::AttributeName(name) if i == 0 => write!(f, "{}", name)?,
                AttributePathStep::AttributeName(name) => write!(f, ".{}", name)?,
                AttributePathStep::ElementKeyString(key) => write!(f, "[{:?}]", key)?,
                AttributePathStep::ElementKeyInt(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributePathStep {
    AttributeName(String),
    ElementKeyString(String),
    ElementKeyInt(i64),
}

/// State as stored by Terraform, before it is decoded against a schema
#[derive(Debug, Clone, Default)]
pub struct RawState {
    pub json: Option<Vec<u8>>,
    pub flatmap: Option<HashMap<String, String>>,
}

/// Error or warning reported back to Terraform
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

impl From<TfplugError> for Diagnostic {
    fn from(err: TfplugError) -> Self {
        Diagnostic::error("Provider framework error", err.to_string())
    }
}

/// Returns true if any diagnostic is an error
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiagnosticSeverity {
    Invalid,
    Error,
    Warning,
}

#[derive(Debug, Clone, Default)]
pub struct ServerCapabilities {
    pub plan_destroy: bool,
    pub get_provider_schema_optional: bool,
    pub move_resource_state: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ClientCapabilities {
    pub deferral_allowed: bool,
    pub write_only_attributes_allowed: bool,
}

/// Asks Terraform to postpone a change to a later round
#[derive(Debug, Clone)]
pub struct Deferred {
    pub reason: DeferredReason,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeferredReason {
    Unknown,
    ResourceConfigUnknown,
    ProviderConfigUnknown,
    AbsentPrereq,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_value_string_access() {
        let mut dv = DynamicValue::object();
        dv.set_string(&AttributePath::new("name"), "test".to_string())
            .unwrap();

        let result = dv.get_string(&AttributePath::new("name")).unwrap();
        assert_eq!(result, "test");
    }

    #[test]
    fn dynamic_value_nested_access() {
        let mut dv = DynamicValue::object();
        let path = AttributePath::new("api").attribute("enabled");
        dv.set_bool(&path, true).unwrap();

        assert!(dv.get_bool(&path).unwrap());
    }

    #[test]
    fn missing_attribute_reads_as_null() {
        let dv = DynamicValue::object();
        let value: Value<String> = dv.get(&AttributePath::new("notes")).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn list_with_unknown_element_reads_as_unknown() {
        let mut dv = DynamicValue::object();
        dv.set_list(
            &AttributePath::new("tags"),
            vec![Dynamic::String("a".into()), Dynamic::Unknown],
        )
        .unwrap();

        let value: Value<Vec<String>> = dv.get(&AttributePath::new("tags")).unwrap();
        assert!(value.is_unknown());
    }

    #[test]
    fn type_mismatch_reports_path() {
        let mut dv = DynamicValue::object();
        dv.set_string(&AttributePath::new("vlan_id"), "ten".into())
            .unwrap();

        let err = dv.get::<i64>(&AttributePath::new("vlan_id")).unwrap_err();
        assert!(err.to_string().contains("vlan_id"));
    }

    #[test]
    fn msgpack_preserves_unknown_and_null() {
        let mut dv = DynamicValue::object();
        dv.set_value(&AttributePath::new("id"), Dynamic::Unknown)
            .unwrap();
        dv.set_value(&AttributePath::new("notes"), Dynamic::Null)
            .unwrap();
        dv.set_number(&AttributePath::new("vlan_id"), 10.0).unwrap();

        let bytes = dv.encode_msgpack().unwrap();
        let decoded = DynamicValue::decode_msgpack(&bytes).unwrap();

        assert_eq!(decoded, dv);
    }

    #[test]
    fn msgpack_null_is_nil_byte() {
        let bytes = DynamicValue::null().encode_msgpack().unwrap();
        assert_eq!(bytes, vec![0xc0]);
    }

    #[test]
    fn whole_numbers_encode_as_integers() {
        let bytes = DynamicValue::new(Dynamic::Number(10.0))
            .encode_msgpack()
            .unwrap();
        assert_eq!(bytes, vec![0x0a]);
    }

    #[test]
    fn json_state_decodes_into_objects() {
        let dv = DynamicValue::decode_json(br#"{"name":"My VLAN","vlan_id":10,"notes":null}"#)
            .unwrap();
        assert_eq!(dv.get_string(&AttributePath::new("name")).unwrap(), "My VLAN");
        assert_eq!(dv.get_i64(&AttributePath::new("vlan_id")).unwrap(), 10);
        assert!(dv
            .get::<String>(&AttributePath::new("notes"))
            .unwrap()
            .is_null());
    }

    #[test]
    fn attribute_path_display() {
        let path = AttributePath::new("rules").index(2).attribute("policy");
        assert_eq!(path.to_string(), "rules[2].policy");

        let path = AttributePath::new("fixed_ip_assignments").key("aa:bb");
        assert_eq!(path.to_string(), "fixed_ip_assignments[\"aa:bb\"]");
    }
}
