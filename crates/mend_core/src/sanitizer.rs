//! Recursive conversion of raw tool output into JSON-safe values.
//!
//! The walk is depth-first over the [`RawValue`] shape:
//!
//! 1. Mappings and sequences are rebuilt with sanitized children.
//! 2. URL leaves become their string form. An object counts as a URL when it
//!    reports one through [`RawObject::as_url`] or when its type name is in
//!    [`SanitizerOptions::url_type_names`].
//! 3. Introspectable objects become mappings of their public fields.
//! 4. Objects with a to-mapping capability are converted, then sanitized.
//! 5. JSON primitives pass through; everything else becomes its string form.
//!
//! Step 5 fallbacks are never errors. They are logged at debug level and
//! collected in a [`SanitizeReport`]. The only hard failures are a cycle
//! through shared objects and nesting beyond the configured depth.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number};
use tracing::debug;

use crate::error::{SanitizeError, SanitizeResult};
use crate::value::{RawObject, RawValue, SafeValue};

/// Type names treated as URL leaves when an object does not say so itself.
pub const DEFAULT_URL_TYPE_NAMES: &[&str] = &["AnyUrl", "AnyHttpUrl", "HttpUrl", "FileUrl", "Url"];

/// Default nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Sanitizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerOptions {
    /// Field names starting with this prefix are dropped from introspected objects
    pub private_prefix: String,
    /// Object type names recognized as URL leaves
    pub url_type_names: Vec<String>,
    /// Maximum nesting depth
    pub max_depth: usize,
}

impl Default for SanitizerOptions {
    fn default() -> Self {
        Self {
            private_prefix: "_".to_string(),
            url_type_names: DEFAULT_URL_TYPE_NAMES.iter().map(|s| s.to_string()).collect(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SanitizerOptions {
    pub fn private_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.private_prefix = prefix.into();
        self
    }

    pub fn url_type(mut self, type_name: impl Into<String>) -> Self {
        self.url_type_names.push(type_name.into());
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Why a value was replaced by its string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    /// NaN or infinite float
    NonFiniteNumber,
    /// Raw bytes
    Bytes,
    /// The object's to-mapping conversion failed
    ConversionFailed { type_name: String, message: String },
    /// The object exposes no capability the sanitizer understands
    Opaque { type_name: String },
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteNumber => write!(f, "non-finite number"),
            Self::Bytes => write!(f, "raw bytes"),
            Self::ConversionFailed { type_name, message } => {
                write!(f, "{} conversion failed: {}", type_name, message)
            }
            Self::Opaque { type_name } => write!(f, "opaque {}", type_name),
        }
    }
}

/// A value that was stringified instead of converted structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fallback {
    /// Location in the value, e.g. `$.items[2].url`
    pub path: String,
    #[serde(flatten)]
    pub reason: FallbackReason,
}

/// Fallbacks recorded during one sanitization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SanitizeReport {
    pub fallbacks: Vec<Fallback>,
}

impl SanitizeReport {
    /// True when every value was converted structurally.
    pub fn is_clean(&self) -> bool {
        self.fallbacks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fallbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fallbacks.is_empty()
    }
}

/// Converts [`RawValue`]s into [`SafeValue`]s.
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    options: SanitizerOptions,
}

impl Sanitizer {
    pub fn new(options: SanitizerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SanitizerOptions {
        &self.options
    }

    /// Sanitize a value, discarding the fallback report.
    pub fn sanitize(&self, value: &RawValue) -> SanitizeResult<SafeValue> {
        self.sanitize_with_report(value).map(|(safe, _)| safe)
    }

    /// Sanitize a value and report every string fallback taken.
    pub fn sanitize_with_report(
        &self,
        value: &RawValue,
    ) -> SanitizeResult<(SafeValue, SanitizeReport)> {
        let mut walk = Walk {
            options: &self.options,
            active: HashSet::new(),
            path: Vec::new(),
            report: SanitizeReport::default(),
        };
        let safe = walk.visit(value, 0)?;
        Ok((safe, walk.report))
    }
}

/// Sanitize with default options.
pub fn sanitize(value: &RawValue) -> SanitizeResult<SafeValue> {
    Sanitizer::default().sanitize(value)
}

enum Segment {
    Key(String),
    Index(usize),
}

struct Walk<'a> {
    options: &'a SanitizerOptions,
    /// Identities of objects on the current descent path
    active: HashSet<usize>,
    path: Vec<Segment>,
    report: SanitizeReport,
}

impl Walk<'_> {
    fn visit(&mut self, value: &RawValue, depth: usize) -> SanitizeResult<SafeValue> {
        if depth > self.options.max_depth {
            return Err(SanitizeError::DepthExceeded {
                limit: self.options.max_depth,
                path: self.path_string(),
            });
        }

        match value {
            RawValue::Null => Ok(SafeValue::Null),
            RawValue::Bool(b) => Ok(SafeValue::Bool(*b)),
            RawValue::Int(i) => Ok(SafeValue::from(*i)),
            RawValue::UInt(u) => Ok(SafeValue::from(*u)),
            RawValue::Float(f) => Ok(match Number::from_f64(*f) {
                Some(n) => SafeValue::Number(n),
                None => self.fallback(f.to_string(), FallbackReason::NonFiniteNumber),
            }),
            RawValue::String(s) => Ok(SafeValue::String(s.clone())),
            RawValue::Bytes(bytes) => Ok(self.fallback(
                String::from_utf8_lossy(bytes).into_owned(),
                FallbackReason::Bytes,
            )),
            RawValue::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    self.path.push(Segment::Index(index));
                    let safe = self.visit(item, depth + 1);
                    self.path.pop();
                    out.push(safe?);
                }
                Ok(SafeValue::Array(out))
            }
            RawValue::Mapping(map) => {
                let mut out = Map::new();
                for (key, item) in map {
                    self.path.push(Segment::Key(key.clone()));
                    let safe = self.visit(item, depth + 1);
                    self.path.pop();
                    out.insert(key.clone(), safe?);
                }
                Ok(SafeValue::Object(out))
            }
            RawValue::Url(url) => Ok(SafeValue::String(url.as_str().to_string())),
            RawValue::Object(object) => self.visit_object(object, depth),
        }
    }

    fn visit_object(
        &mut self,
        object: &Arc<dyn RawObject>,
        depth: usize,
    ) -> SanitizeResult<SafeValue> {
        let identity = Arc::as_ptr(object) as *const () as usize;
        if !self.active.insert(identity) {
            return Err(SanitizeError::CyclicStructure {
                type_name: object.type_name().to_string(),
                path: self.path_string(),
            });
        }

        let result = self.visit_object_shape(object.as_ref(), depth);
        self.active.remove(&identity);
        result
    }

    fn visit_object_shape(
        &mut self,
        object: &dyn RawObject,
        depth: usize,
    ) -> SanitizeResult<SafeValue> {
        if let Some(url) = object.as_url() {
            return Ok(SafeValue::String(url));
        }
        if self.is_url_type(object.type_name()) {
            return Ok(SafeValue::String(object.repr()));
        }

        if let Some(fields) = object.fields() {
            let mut out = Map::new();
            for (name, item) in fields {
                if self.is_private(&name) {
                    continue;
                }
                self.path.push(Segment::Key(name.clone()));
                let safe = self.visit(&item, depth + 1);
                self.path.pop();
                out.insert(name, safe?);
            }
            return Ok(SafeValue::Object(out));
        }

        match object.to_mapping() {
            Some(Ok(converted)) => self.visit(&converted, depth + 1),
            Some(Err(e)) => Ok(self.fallback(
                object.repr(),
                FallbackReason::ConversionFailed {
                    type_name: object.type_name().to_string(),
                    message: e.to_string(),
                },
            )),
            None => Ok(self.fallback(
                object.repr(),
                FallbackReason::Opaque {
                    type_name: object.type_name().to_string(),
                },
            )),
        }
    }

    fn is_url_type(&self, type_name: &str) -> bool {
        self.options.url_type_names.iter().any(|t| t == type_name)
    }

    fn is_private(&self, name: &str) -> bool {
        !self.options.private_prefix.is_empty() && name.starts_with(&self.options.private_prefix)
    }

    fn fallback(&mut self, text: String, reason: FallbackReason) -> SafeValue {
        let path = self.path_string();
        debug!(path = %path, reason = %reason, "Falling back to string form");
        self.report.fallbacks.push(Fallback { path, reason });
        SafeValue::String(text)
    }

    fn path_string(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            match segment {
                Segment::Key(key) if is_plain_key(key) => {
                    out.push('.');
                    out.push_str(key);
                }
                Segment::Key(key) => {
                    out.push('[');
                    out.push_str(&SafeValue::String(key.clone()).to_string());
                    out.push(']');
                }
                Segment::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

/// Keys that can be written after a `.` without ambiguity.
fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;
    use slot::Slot;
    use serde_json::json;

    /// Stand-in for a URL class that does not advertise itself.
    #[derive(Debug)]
    struct AnyUrl(String);

    impl RawObject for AnyUrl {
        fn type_name(&self) -> &str {
            "AnyUrl"
        }

        fn repr(&self) -> String {
            self.0.clone()
        }
    }

    #[derive(Debug)]
    struct Record {
        x: i64,
        private: i64,
    }

    impl RawObject for Record {
        fn type_name(&self) -> &str {
            "Record"
        }

        fn fields(&self) -> Option<Vec<(String, RawValue)>> {
            Some(vec![
                ("x".to_string(), RawValue::from(self.x)),
                ("_private".to_string(), RawValue::from(self.private)),
            ])
        }
    }

    #[derive(Debug)]
    struct BrokenModel;

    impl RawObject for BrokenModel {
        fn type_name(&self) -> &str {
            "BrokenModel"
        }

        fn to_mapping(&self) -> Option<Result<RawValue, ConversionError>> {
            Some(Err(ConversionError::new("validation error")))
        }

        fn repr(&self) -> String {
            "BrokenModel(id=3)".to_string()
        }
    }

    #[derive(Debug)]
    struct Model;

    impl RawObject for Model {
        fn type_name(&self) -> &str {
            "Model"
        }

        fn to_mapping(&self) -> Option<Result<RawValue, ConversionError>> {
            Some(Ok(RawValue::mapping([
                ("html_url", RawValue::url("https://github.com/o/r/pull/1").unwrap()),
                ("number", RawValue::from(1)),
            ])))
        }
    }

    /// Object whose single field can be pointed back at itself.
    #[derive(Debug, Default)]
    struct Node {
        next: Slot,
    }

    impl RawObject for Node {
        fn type_name(&self) -> &str {
            "Node"
        }

        fn fields(&self) -> Option<Vec<(String, RawValue)>> {
            Some(vec![("next".to_string(), self.next.get())])
        }
    }

    /// Minimal interior-mutable slot for building cycles in tests.
    mod slot {
        use std::sync::Mutex;

        use crate::value::RawValue;

        #[derive(Debug, Default)]
        pub struct Slot(Mutex<Option<RawValue>>);

        impl Slot {
            pub fn set(&self, value: RawValue) {
                *self.0.lock().unwrap() = Some(value);
            }

            pub fn get(&self) -> RawValue {
                self.0.lock().unwrap().clone().unwrap_or_default()
            }
        }
    }

    #[test]
    fn test_mapping_with_url_leaf() {
        let raw = RawValue::mapping([
            ("a", RawValue::from(1)),
            ("b", RawValue::url("https://example.com/issues/42").unwrap()),
        ]);

        let safe = sanitize(&raw).unwrap();
        assert_eq!(safe, json!({"a": 1, "b": "https://example.com/issues/42"}));
    }

    #[test]
    fn test_sequence_elements_become_primitives() {
        let raw = RawValue::sequence([
            RawValue::from(1),
            RawValue::from("two"),
            RawValue::from(true),
            RawValue::Null,
            RawValue::object(AnyUrl("https://api.github.com/repos/o/r".to_string())),
        ]);

        let safe = sanitize(&raw).unwrap();
        let items = safe.as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|v| !v.is_array() && !v.is_object()));
        assert_eq!(items[4], json!("https://api.github.com/repos/o/r"));
    }

    #[test]
    fn test_private_fields_are_dropped() {
        let raw = RawValue::object(Record { x: 1, private: 2 });
        let safe = sanitize(&raw).unwrap();
        assert_eq!(safe, json!({"x": 1}));
    }

    #[test]
    fn test_empty_private_prefix_keeps_everything() {
        let sanitizer = Sanitizer::new(SanitizerOptions::default().private_prefix(""));
        let safe = sanitizer
            .sanitize(&RawValue::object(Record { x: 1, private: 2 }))
            .unwrap();
        assert_eq!(safe, json!({"x": 1, "_private": 2}));
    }

    #[test]
    fn test_failed_conversion_falls_back_to_string() {
        let (safe, report) = Sanitizer::default()
            .sanitize_with_report(&RawValue::mapping([("model", RawValue::object(BrokenModel))]))
            .unwrap();

        assert_eq!(safe, json!({"model": "BrokenModel(id=3)"}));
        assert_eq!(report.len(), 1);
        assert_eq!(report.fallbacks[0].path, "$.model");
        assert!(matches!(
            report.fallbacks[0].reason,
            FallbackReason::ConversionFailed { .. }
        ));
    }

    #[test]
    fn test_conversion_result_is_sanitized() {
        let safe = sanitize(&RawValue::object(Model)).unwrap();
        assert_eq!(
            safe,
            json!({"html_url": "https://github.com/o/r/pull/1", "number": 1})
        );
    }

    #[test]
    fn test_non_finite_and_bytes_fall_back() {
        let raw = RawValue::sequence([
            RawValue::from(f64::NAN),
            RawValue::from(f64::INFINITY),
            RawValue::from(b"diff --git".to_vec()),
        ]);

        let (safe, report) = Sanitizer::default().sanitize_with_report(&raw).unwrap();
        assert_eq!(safe, json!(["NaN", "inf", "diff --git"]));
        assert_eq!(report.len(), 3);
        assert_eq!(report.fallbacks[2].path, "$[2]");
    }

    #[test]
    fn test_fallback_paths_quote_awkward_keys() {
        let raw = RawValue::mapping([
            ("a.b", RawValue::from(f64::NAN)),
            ("x[0]", RawValue::from(f64::NAN)),
            (
                "files",
                RawValue::mapping([("src/main.rs", RawValue::from(b"fn main".to_vec()))]),
            ),
        ]);

        let (_, report) = Sanitizer::default().sanitize_with_report(&raw).unwrap();
        let mut paths: Vec<_> = report.fallbacks.iter().map(|f| f.path.as_str()).collect();
        paths.sort();
        assert_eq!(paths, vec![r#"$.files["src/main.rs"]"#, r#"$["a.b"]"#, r#"$["x[0]"]"#]);
    }

    #[test]
    fn test_opaque_object_uses_repr() {
        #[derive(Debug)]
        struct Handle;

        impl RawObject for Handle {
            fn type_name(&self) -> &str {
                "Handle"
            }
        }

        let (safe, report) = Sanitizer::default()
            .sanitize_with_report(&RawValue::object(Handle))
            .unwrap();
        assert_eq!(safe, json!("<Handle>"));
        assert_eq!(
            report.fallbacks[0].reason,
            FallbackReason::Opaque {
                type_name: "Handle".to_string()
            }
        );
    }

    #[test]
    fn test_configured_url_type_names() {
        #[derive(Debug)]
        struct Link;

        impl RawObject for Link {
            fn type_name(&self) -> &str {
                "Link"
            }

            fn fields(&self) -> Option<Vec<(String, RawValue)>> {
                Some(vec![("scheme".to_string(), RawValue::from("https"))])
            }

            fn repr(&self) -> String {
                "https://jira.example.com/browse/BUG-1".to_string()
            }
        }

        let sanitizer = Sanitizer::new(SanitizerOptions::default().url_type("Link"));
        assert_eq!(
            sanitizer.sanitize(&RawValue::object(Link)).unwrap(),
            json!("https://jira.example.com/browse/BUG-1")
        );
        assert_eq!(
            sanitize(&RawValue::object(Link)).unwrap(),
            json!({"scheme": "https"})
        );
    }

    #[test]
    fn test_cycle_is_detected() {
        let node = Arc::new(Node::default());
        let as_object: Arc<dyn RawObject> = node.clone();
        node.next.set(RawValue::mapping([("back", RawValue::Object(as_object.clone()))]));

        let err = sanitize(&RawValue::Object(as_object)).unwrap_err();
        assert_eq!(
            err,
            SanitizeError::CyclicStructure {
                type_name: "Node".to_string(),
                path: "$.next.back".to_string(),
            }
        );

        // Break the cycle so the Arcs can be freed.
        node.next.set(RawValue::Null);
    }

    #[test]
    fn test_shared_object_is_not_a_cycle() {
        let shared: Arc<dyn RawObject> = Arc::new(Record { x: 5, private: 0 });
        let raw = RawValue::sequence([
            RawValue::Object(shared.clone()),
            RawValue::Object(shared),
        ]);

        assert_eq!(sanitize(&raw).unwrap(), json!([{"x": 5}, {"x": 5}]));
    }

    #[test]
    fn test_depth_limit() {
        let mut raw = RawValue::from(0);
        for _ in 0..10 {
            raw = RawValue::sequence([raw]);
        }

        let sanitizer = Sanitizer::new(SanitizerOptions::default().max_depth(5));
        let err = sanitizer.sanitize(&raw).unwrap_err();
        assert!(matches!(err, SanitizeError::DepthExceeded { limit: 5, .. }));
        assert!(sanitize(&raw).is_ok());
    }
}
