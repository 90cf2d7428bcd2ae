//! Rendering of API outcomes into MCP tool results.
//!
//! Every failure is rendered as a single text block prefixed with its kind in parentheses, e.g.
//! `Kinsta API Error (NOT_FOUND): The requested site was not found.`

use crate::classify::{ClassifiedError, ErrorKind};
use crate::runtime::ApiResult;
use rmcp::model::{CallToolResult, Content};
use serde_json::Value;

pub const API_ERROR_PREFIX: &str = "Kinsta API Error";
pub const AUTH_ERROR_PREFIX: &str = "Kinsta Authentication Error";
pub const VALIDATION_ERROR_PREFIX: &str = "Kinsta Validation Error";

/// Render a successful payload as pretty JSON text.
///
/// Objects and arrays are also returned as `structured_content`; clients that only render
/// `content` still get the text block.
#[must_use]
pub fn success(payload: Value) -> CallToolResult {
    let text = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
    let structured_content = match payload {
        Value::Object(_) | Value::Array(_) => Some(payload),
        _ => None,
    };
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content,
        is_error: Some(false),
        meta: None,
    }
}

#[must_use]
pub fn failure(error: &ClassifiedError, resource: Option<&str>) -> CallToolResult {
    let message = match (error.kind(), resource) {
        (ErrorKind::NotFound, Some(noun)) => format!("The requested {noun} was not found."),
        (kind, _) => kind
            .friendly_message()
            .map_or_else(|| error.message().to_string(), str::to_string),
    };
    error_result(format!("{API_ERROR_PREFIX} ({}): {message}", error.kind()))
}

/// Failure that happened before any network call because credentials could not be loaded.
#[must_use]
pub fn auth_failure(message: &str) -> CallToolResult {
    error_result(format!("{AUTH_ERROR_PREFIX}: {message}"))
}

/// Failure that happened before any network call because the tool input was rejected.
#[must_use]
pub fn validation_failure(message: &str) -> CallToolResult {
    error_result(format!("{VALIDATION_ERROR_PREFIX}: {message}"))
}

#[must_use]
pub fn render(result: ApiResult, resource: Option<&str>) -> CallToolResult {
    match result {
        Ok(payload) => success(payload),
        Err(e) => failure(&e, resource),
    }
}

fn error_result(text: String) -> CallToolResult {
    CallToolResult::error(vec![Content::text(text)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use serde_json::json;

    fn text_of(result: &CallToolResult) -> String {
        let v = serde_json::to_value(result).expect("CallToolResult serializes");
        v.get("content")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .and_then(|c| c.get("text"))
            .and_then(Value::as_str)
            .expect("content[0].text")
            .to_string()
    }

    #[test]
    fn success_object_exposes_structured_content() {
        let payload = json!({"company": {"sites": []}});
        let result = success(payload.clone());
        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.structured_content, Some(payload.clone()));
        let parsed: Value = serde_json::from_str(&text_of(&result)).expect("json text");
        assert_eq!(parsed, payload);
    }

    #[test]
    fn success_array_exposes_structured_content() {
        let result = success(json!([1, 2]));
        assert_eq!(result.structured_content, Some(json!([1, 2])));
    }

    #[test]
    fn success_primitive_and_null_are_text_only() {
        let result = success(json!("done"));
        assert_eq!(result.structured_content, None);
        assert_eq!(text_of(&result), "\"done\"");

        let result = success(Value::Null);
        assert_eq!(result.structured_content, None);
        assert_eq!(text_of(&result), "null");
    }

    #[test]
    fn not_found_with_noun_is_synthesized() {
        let result = failure(&classify(404, Some("x not found")), Some("site"));
        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            text_of(&result),
            "Kinsta API Error (NOT_FOUND): The requested site was not found."
        );
    }

    #[test]
    fn not_found_without_noun_uses_classified_message() {
        let result = failure(&classify(404, Some("x not found")), None);
        assert_eq!(
            text_of(&result),
            "Kinsta API Error (NOT_FOUND): Resource not found: x not found"
        );
    }

    #[test]
    fn friendly_override_replaces_api_detail() {
        let result = failure(&classify(429, Some("slow down")), None);
        let text = text_of(&result);
        assert!(text.starts_with("Kinsta API Error (RATE_LIMITED): Rate limit exceeded."));
        assert!(!text.contains("slow down"));
    }

    #[test]
    fn generic_kinds_render_raw_message() {
        let result = failure(&classify(422, Some("bad tag")), Some("backup"));
        assert_eq!(
            text_of(&result),
            "Kinsta API Error (VALIDATION_ERROR): Request rejected by the Kinsta API (HTTP 422): bad tag"
        );
    }

    #[test]
    fn pre_network_failures_use_distinct_prefixes() {
        let auth = auth_failure("KINSTA_API_KEY environment variable is required.");
        assert_eq!(auth.is_error, Some(true));
        assert!(text_of(&auth).starts_with("Kinsta Authentication Error: "));

        let validation = validation_failure("Missing required parameter: site_id");
        assert!(text_of(&validation).starts_with("Kinsta Validation Error: "));
        assert!(!text_of(&validation).starts_with(API_ERROR_PREFIX));
    }
}
