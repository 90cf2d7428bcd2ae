//! Tool annotations derived from the HTTP method behind each Kinsta operation.

use reqwest::Method;
use rmcp::model::ToolAnnotations;

/// Build MCP tool annotations for an operation using RFC 9110 method semantics.
///
/// Every Kinsta tool talks to a remote system, so `openWorldHint` is always set. Methods outside
/// the standard set only get `openWorldHint`.
#[must_use]
pub fn annotations_for(method: &Method, title: &str) -> ToolAnnotations {
    // (read_only, destructive, idempotent)
    let hints = if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
        Some((true, false, Some(true)))
    } else if method == Method::POST {
        Some((false, false, Some(false)))
    } else if method == Method::PUT || method == Method::DELETE {
        Some((false, true, Some(true)))
    } else if method == Method::PATCH {
        // PATCH may or may not be idempotent; do not guess.
        Some((false, true, None))
    } else {
        None
    };

    ToolAnnotations {
        title: Some(title.to_string()),
        read_only_hint: hints.map(|h| h.0),
        destructive_hint: hints.map(|h| h.1),
        idempotent_hint: hints.and_then(|h| h.2),
        open_world_hint: Some(true),
    }
}
