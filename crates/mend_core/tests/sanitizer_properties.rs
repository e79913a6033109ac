//! Integration tests for sanitizer laws on realistic tool payloads.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use mend_core::{sanitize, ConversionError, RawObject, RawValue, SafeValue, Sanitizer};

/// A pull request as a source-control client might return it.
#[derive(Debug)]
struct PullRequest {
    number: u64,
    title: String,
    html_url: url::Url,
    labels: Vec<String>,
    session: Arc<dyn RawObject>,
}

impl RawObject for PullRequest {
    fn type_name(&self) -> &str {
        "PullRequest"
    }

    fn fields(&self) -> Option<Vec<(String, RawValue)>> {
        Some(vec![
            ("number".to_string(), RawValue::from(self.number)),
            ("title".to_string(), RawValue::from(self.title.clone())),
            ("html_url".to_string(), RawValue::from(self.html_url.clone())),
            (
                "labels".to_string(),
                RawValue::sequence(self.labels.iter().map(String::as_str)),
            ),
            ("_session".to_string(), RawValue::Object(self.session.clone())),
        ])
    }
}

#[derive(Debug)]
struct HttpSession;

impl RawObject for HttpSession {
    fn type_name(&self) -> &str {
        "HttpSession"
    }

    fn to_mapping(&self) -> Option<Result<RawValue, ConversionError>> {
        Some(Err(ConversionError::new("session is not serializable")))
    }
}

#[derive(Debug, Serialize)]
struct Ticket {
    key: String,
    priority: Option<String>,
    story_points: f64,
}

fn realistic_payloads() -> Vec<RawValue> {
    let pr = PullRequest {
        number: 17,
        title: "Fix NPE in OrderService".to_string(),
        html_url: url::Url::parse("https://github.com/acme/shop/pull/17").unwrap(),
        labels: vec!["bug".to_string(), "auto-fix".to_string()],
        session: Arc::new(HttpSession),
    };

    vec![
        RawValue::object(pr),
        RawValue::from_serialize(Ticket {
            key: "SHOP-101".to_string(),
            priority: None,
            story_points: 2.5,
        }),
        RawValue::mapping([
            ("results", RawValue::sequence([
                RawValue::url("https://stackoverflow.com/q/218384").unwrap(),
                RawValue::from(f64::NAN),
                RawValue::from(vec![0xffu8, 0x41]),
            ])),
            ("total", RawValue::from(3u64)),
        ]),
        RawValue::from(json!({"nested": {"deep": [1, 2, {"x": null}]}, "ok": true})),
    ]
}

fn is_json_primitive_tree(value: &SafeValue) -> bool {
    match value {
        SafeValue::Array(items) => items.iter().all(is_json_primitive_tree),
        SafeValue::Object(map) => map.values().all(is_json_primitive_tree),
        _ => true,
    }
}

#[test]
fn test_round_trip_through_json_text() {
    for raw in realistic_payloads() {
        let safe = sanitize(&raw).unwrap();
        let text = serde_json::to_string(&safe).unwrap();
        let decoded: SafeValue = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, safe);
        assert!(is_json_primitive_tree(&safe));
    }
}

#[test]
fn test_idempotent_on_safe_values() {
    for raw in realistic_payloads() {
        let once = sanitize(&raw).unwrap();
        let twice = sanitize(&RawValue::from(once.clone())).unwrap();
        assert_eq!(once, twice);
    }
}

#[test]
fn test_pull_request_shape() {
    let safe = sanitize(&realistic_payloads().remove(0)).unwrap();
    assert_eq!(
        safe,
        json!({
            "number": 17,
            "title": "Fix NPE in OrderService",
            "html_url": "https://github.com/acme/shop/pull/17",
            "labels": ["bug", "auto-fix"],
        })
    );
}

#[test]
fn test_serialize_types_convert_through_serde() {
    let safe = sanitize(&realistic_payloads().remove(1)).unwrap();
    assert_eq!(
        safe,
        json!({"key": "SHOP-101", "priority": null, "story_points": 2.5})
    );
}

#[test]
fn test_report_lists_every_fallback() {
    let payload = realistic_payloads().remove(2);
    let (safe, report) = Sanitizer::default().sanitize_with_report(&payload).unwrap();

    assert_eq!(safe["results"][0], json!("https://stackoverflow.com/q/218384"));
    assert_eq!(safe["results"][1], json!("NaN"));
    assert_eq!(safe["results"][2], json!("\u{fffd}A"));
    let paths: Vec<_> = report.fallbacks.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["$.results[1]", "$.results[2]"]);
}
