//! Raw values returned by external tools.
//!
//! A [`RawValue`] is the closed set of shapes the sanitizer knows how to
//! visit. Anything that is not a plain scalar or container is carried as an
//! [`RawValue::Object`] and described through the [`RawObject`] capability
//! trait, so the sanitizer probes what an object can do rather than what
//! concrete type it is.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::error::ConversionError;

/// A JSON-safe value: null, bool, number, string, array or string-keyed object.
pub type SafeValue = serde_json::Value;

/// Capabilities of an opaque domain object.
///
/// Every method has a default that reports "capability absent", so an
/// implementation only overrides what the object actually supports.
pub trait RawObject: fmt::Debug + Send + Sync {
    /// Name of the object's type, used for URL recognition and diagnostics.
    fn type_name(&self) -> &str;

    /// String form of the object if it represents a URL.
    fn as_url(&self) -> Option<String> {
        None
    }

    /// Named attributes, when the object is introspectable.
    fn fields(&self) -> Option<Vec<(String, RawValue)>> {
        None
    }

    /// Conversion to a structured value, when the object supports one.
    fn to_mapping(&self) -> Option<Result<RawValue, ConversionError>> {
        None
    }

    /// String representation used when nothing else applies.
    fn repr(&self) -> String {
        format!("<{}>", self.type_name())
    }
}

/// A value produced by an external call, before sanitization.
#[derive(Debug, Clone)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Sequence(Vec<RawValue>),
    Mapping(BTreeMap<String, RawValue>),
    Url(Url),
    Object(Arc<dyn RawObject>),
}

impl RawValue {
    /// Wrap an object implementing [`RawObject`].
    pub fn object(object: impl RawObject + 'static) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Wrap any serializable value; its to-mapping capability goes through serde.
    pub fn from_serialize<T>(value: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Self::object(SerializedObject::new(value))
    }

    /// Parse a URL leaf.
    pub fn url(input: &str) -> Result<Self, url::ParseError> {
        Url::parse(input).map(Self::Url)
    }

    /// Build a mapping from key/value pairs.
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<RawValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a sequence from items.
    pub fn sequence<V, I>(items: I) -> Self
    where
        V: Into<RawValue>,
        I: IntoIterator<Item = V>,
    {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Short name of the shape, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "bool",
            RawValue::Int(_) | RawValue::UInt(_) => "integer",
            RawValue::Float(_) => "float",
            RawValue::String(_) => "string",
            RawValue::Bytes(_) => "bytes",
            RawValue::Sequence(_) => "sequence",
            RawValue::Mapping(_) => "mapping",
            RawValue::Url(_) => "url",
            RawValue::Object(_) => "object",
        }
    }
}

impl Default for RawValue {
    fn default() -> Self {
        Self::Null
    }
}

impl From<()> for RawValue {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for RawValue {
    fn from(value: u32) -> Self {
        Self::UInt(value.into())
    }
}

impl From<u64> for RawValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<usize> for RawValue {
    fn from(value: usize) -> Self {
        Self::UInt(value as u64)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Url> for RawValue {
    fn from(value: Url) -> Self {
        Self::Url(value)
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(value: Vec<RawValue>) -> Self {
        Self::Sequence(value)
    }
}

impl From<BTreeMap<String, RawValue>> for RawValue {
    fn from(value: BTreeMap<String, RawValue>) -> Self {
        Self::Mapping(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

impl From<Arc<dyn RawObject>> for RawValue {
    fn from(value: Arc<dyn RawObject>) -> Self {
        Self::Object(value)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<serde_yaml::Value> for RawValue {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Self::Null,
            serde_yaml::Value::Bool(b) => Self::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_yaml::Value::String(s) => Self::String(s),
            serde_yaml::Value::Sequence(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_yaml::Value::Mapping(map) => Self::Mapping(
                map.into_iter()
                    .map(|(k, v)| (yaml_key(&k), Self::from(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Self::object(TaggedValue {
                tag: tagged.tag.to_string(),
                value: Self::from(tagged.value),
            }),
        }
    }
}

/// JSON object keys must be strings; YAML keys can be anything.
fn yaml_key(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{:?}", other)),
    }
}

/// A YAML value carrying an explicit `!tag`.
#[derive(Debug, Clone)]
pub struct TaggedValue {
    pub tag: String,
    pub value: RawValue,
}

impl RawObject for TaggedValue {
    fn type_name(&self) -> &str {
        "TaggedValue"
    }

    fn fields(&self) -> Option<Vec<(String, RawValue)>> {
        Some(vec![
            ("tag".to_string(), RawValue::String(self.tag.clone())),
            ("value".to_string(), self.value.clone()),
        ])
    }

    fn repr(&self) -> String {
        format!("{} {:?}", self.tag, self.value)
    }
}

/// Adapts a `Serialize` type to [`RawObject`] through `serde_json`.
pub struct SerializedObject<T> {
    inner: T,
    type_name: &'static str,
}

impl<T> SerializedObject<T> {
    pub fn new(inner: T) -> Self {
        let full = std::any::type_name::<T>();
        let base = full.split('<').next().unwrap_or(full);
        let type_name = base.rsplit("::").next().unwrap_or(base);
        Self { inner, type_name }
    }
}

impl<T: fmt::Debug> fmt::Debug for SerializedObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T> RawObject for SerializedObject<T>
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn to_mapping(&self) -> Option<Result<RawValue, ConversionError>> {
        Some(
            serde_json::to_value(&self.inner)
                .map(RawValue::from)
                .map_err(|e| ConversionError::new(e.to_string())),
        )
    }

    fn repr(&self) -> String {
        format!("{:?}", self.inner)
    }
}
