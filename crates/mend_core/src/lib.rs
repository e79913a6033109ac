//! # mend_core
//!
//! Value model, response sanitizer and configuration for mend.
//!
//! Tool calls made on behalf of an agent return arbitrary shapes: nested
//! mappings, URL objects, model objects with private state, raw bytes. Before
//! any of that crosses an agent boundary it is converted into a
//! [`SafeValue`] (plain JSON) by the [`Sanitizer`].
//!
//! # Example
//!
//! ```rust
//! use mend_core::{sanitize, RawValue};
//! use serde_json::json;
//!
//! let raw = RawValue::mapping([
//!     ("number", RawValue::from(42)),
//!     ("html_url", RawValue::url("https://github.com/o/r/issues/42").unwrap()),
//! ]);
//!
//! let safe = sanitize(&raw).unwrap();
//! assert_eq!(safe, json!({"number": 42, "html_url": "https://github.com/o/r/issues/42"}));
//! ```

pub mod config;
pub mod error;
pub mod sanitizer;
pub mod value;

pub use config::{AdapterConfig, MendConfig, RetrieverConfig};
pub use error::{ConfigError, ConfigResult, ConversionError, SanitizeError, SanitizeResult};
pub use sanitizer::{
    sanitize, Fallback, FallbackReason, SanitizeReport, Sanitizer, SanitizerOptions,
    DEFAULT_MAX_DEPTH, DEFAULT_URL_TYPE_NAMES,
};
pub use value::{RawObject, RawValue, SafeValue, SerializedObject, TaggedValue};
