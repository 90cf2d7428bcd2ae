//! Static table of Kinsta operations exposed as MCP tools.
//!
//! Each entry declares how tool arguments map onto an HTTP request: path segments, query pairs and
//! JSON body fields. Execution is left to [`kinsta_api_client::KinstaClient`].

use crate::error::{Result, ServerError};
use kinsta_api_client::{ApiRequest, Configuration};
use reqwest::Method;
use rmcp::model::{JsonObject, Tool};
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Delete => Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    StringList,
}

impl ParamKind {
    fn schema(self) -> Value {
        match self {
            Self::String => json!({"type": "string"}),
            Self::Integer => json!({"type": "integer"}),
            Self::Boolean => json!({"type": "boolean"}),
            Self::StringList => json!({"type": "array", "items": {"type": "string"}}),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub location: ParamLocation,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl Param {
    const fn new(name: &'static str, location: ParamLocation, description: &'static str) -> Self {
        Self {
            name,
            location,
            kind: ParamKind::String,
            required: true,
            description,
        }
    }

    const fn path(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamLocation::Path, description)
    }

    const fn query(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamLocation::Query, description)
    }

    const fn body(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamLocation::Body, description)
    }

    const fn optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }

    const fn kind(self, kind: ParamKind) -> Self {
        Self { kind, ..self }
    }
}

/// How the configured company ID is attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyScope {
    None,
    /// `company=<id>` query pair.
    Query,
    /// `{company_id}` placeholder in the path.
    Path,
}

#[derive(Debug, Clone, Copy)]
pub struct Operation {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub verb: Verb,
    pub path: &'static str,
    pub company: CompanyScope,
    /// Noun used when rendering `NOT_FOUND`, e.g. "The requested site was not found."
    pub resource: Option<&'static str>,
    pub params: &'static [Param],
}

const SITE_ID: Param = Param::path("site_id", "Kinsta site ID");
const ENV_ID: Param = Param::path("env_id", "Site environment ID");
const ENVIRONMENT_ID_BODY: Param = Param::body("environment_id", "Site environment ID");

static OPERATIONS: &[Operation] = &[
    Operation {
        name: "kinsta_list_sites",
        title: "List sites",
        description: "List all WordPress sites in the configured company.",
        verb: Verb::Get,
        path: "/sites",
        company: CompanyScope::Query,
        resource: None,
        params: &[Param::query(
            "include_environments",
            "Set to \"true\" to include each site's environments",
        )
        .optional()],
    },
    Operation {
        name: "kinsta_get_site",
        title: "Get site",
        description: "Get details of a single site, including its environments.",
        verb: Verb::Get,
        path: "/sites/{site_id}",
        company: CompanyScope::None,
        resource: Some("site"),
        params: &[SITE_ID],
    },
    Operation {
        name: "kinsta_delete_site",
        title: "Delete site",
        description: "Permanently delete a site and all of its environments.",
        verb: Verb::Delete,
        path: "/sites/{site_id}",
        company: CompanyScope::None,
        resource: Some("site"),
        params: &[SITE_ID],
    },
    Operation {
        name: "kinsta_list_environments",
        title: "List environments",
        description: "List the live and staging environments of a site.",
        verb: Verb::Get,
        path: "/sites/{site_id}/environments",
        company: CompanyScope::None,
        resource: Some("site"),
        params: &[SITE_ID],
    },
    Operation {
        name: "kinsta_clear_site_cache",
        title: "Clear site cache",
        description: "Clear the server-level cache of a site environment.",
        verb: Verb::Post,
        path: "/sites/tools/clear-site-cache",
        company: CompanyScope::None,
        resource: Some("environment"),
        params: &[ENVIRONMENT_ID_BODY],
    },
    Operation {
        name: "kinsta_restart_php",
        title: "Restart PHP",
        description: "Restart the PHP engine of a site environment.",
        verb: Verb::Post,
        path: "/sites/tools/restart-php",
        company: CompanyScope::None,
        resource: Some("environment"),
        params: &[ENVIRONMENT_ID_BODY],
    },
    Operation {
        name: "kinsta_list_backups",
        title: "List backups",
        description: "List the backups of a site environment.",
        verb: Verb::Get,
        path: "/sites/environments/{env_id}/backups",
        company: CompanyScope::None,
        resource: Some("environment"),
        params: &[ENV_ID],
    },
    Operation {
        name: "kinsta_create_manual_backup",
        title: "Create manual backup",
        description: "Create a manual backup of a site environment.",
        verb: Verb::Post,
        path: "/sites/environments/{env_id}/manual-backups",
        company: CompanyScope::None,
        resource: Some("environment"),
        params: &[ENV_ID, Param::body("tag", "Label for the backup").optional()],
    },
    Operation {
        name: "kinsta_restore_backup",
        title: "Restore backup",
        description: "Restore a backup into the target environment.",
        verb: Verb::Post,
        path: "/sites/environments/{target_env_id}/backups/restore",
        company: CompanyScope::None,
        resource: Some("backup"),
        params: &[
            Param::path("target_env_id", "Environment to restore into"),
            Param::body("backup_id", "ID of the backup to restore").kind(ParamKind::Integer),
            Param::body("notified_user_emails", "Users to notify when the restore finishes")
                .kind(ParamKind::StringList)
                .optional(),
        ],
    },
    Operation {
        name: "kinsta_list_plugins",
        title: "List plugins",
        description: "List the WordPress plugins installed in a site environment.",
        verb: Verb::Get,
        path: "/sites/environments/{env_id}/plugins",
        company: CompanyScope::None,
        resource: Some("environment"),
        params: &[ENV_ID],
    },
    Operation {
        name: "kinsta_list_themes",
        title: "List themes",
        description: "List the WordPress themes installed in a site environment.",
        verb: Verb::Get,
        path: "/sites/environments/{env_id}/themes",
        company: CompanyScope::None,
        resource: Some("environment"),
        params: &[ENV_ID],
    },
    Operation {
        name: "kinsta_get_logs",
        title: "Get logs",
        description: "Read the tail of an environment log file (error, access or kinsta-cache-perf).",
        verb: Verb::Get,
        path: "/sites/environments/{env_id}/logs",
        company: CompanyScope::None,
        resource: Some("environment"),
        params: &[
            ENV_ID,
            Param::query("file_name", "Log file: error, access or kinsta-cache-perf"),
            Param::query("lines", "Number of lines to return").optional(),
        ],
    },
    Operation {
        name: "kinsta_get_operation_status",
        title: "Get operation status",
        description: "Check the status of an asynchronous operation started by another tool.",
        verb: Verb::Get,
        path: "/operations/{operation_id}",
        company: CompanyScope::None,
        resource: Some("operation"),
        params: &[Param::path("operation_id", "Operation ID returned by a previous call")],
    },
    Operation {
        name: "kinsta_list_company_users",
        title: "List company users",
        description: "List the users of the configured company.",
        verb: Verb::Get,
        path: "/company/{company_id}/users",
        company: CompanyScope::Path,
        resource: Some("company"),
        params: &[],
    },
];

/// All registered operations.
#[must_use]
pub fn operations() -> &'static [Operation] {
    OPERATIONS
}

#[must_use]
pub fn find(name: &str) -> Option<&'static Operation> {
    OPERATIONS.iter().find(|op| op.name == name)
}

impl Operation {
    #[must_use]
    pub fn input_schema(&self) -> JsonObject {
        let mut properties = JsonObject::new();
        let mut required: Vec<&str> = Vec::new();

        for param in self.params {
            let mut schema = param.kind.schema();
            schema["description"] = json!(param.description);
            properties.insert(param.name.to_string(), schema);
            if param.required {
                required.push(param.name);
            }
        }

        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }
        schema
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        let mut tool = Tool::new(self.name, self.description, Arc::new(self.input_schema()));
        tool.annotations = Some(crate::semantics::annotations_for(
            &self.verb.method(),
            self.title,
        ));
        tool
    }

    /// Map tool arguments onto a request for `config`'s company.
    ///
    /// # Errors
    ///
    /// Returns an error if a required argument is missing, or a path argument (or the configured
    /// company ID, when it is part of the path) is not exactly one literal path segment.
    pub fn build_request(&self, args: &JsonObject, config: &Configuration) -> Result<ApiRequest> {
        let mut path = self.path.to_string();
        if self.company == CompanyScope::Path {
            check_segment("company_id", config.company_id())?;
            path = path.replace("{company_id}", config.company_id());
        }

        let mut query: Vec<(&str, String)> = Vec::new();
        let mut body = JsonObject::new();

        for param in self.params {
            let value = match args.get(param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        return Err(ServerError::MissingParam(param.name.to_string()));
                    }
                    continue;
                }
                Some(v) => v,
            };

            match param.location {
                ParamLocation::Path => {
                    let segment = path_segment(param.name, value)?;
                    path = path.replace(&format!("{{{}}}", param.name), &segment);
                }
                ParamLocation::Query => query.push((param.name, value_to_string(value))),
                ParamLocation::Body => {
                    body.insert(param.name.to_string(), value.clone());
                }
            }
        }

        let mut req = ApiRequest::new(self.verb.method(), path);
        if self.company == CompanyScope::Query {
            req = req.query("company", config.company_id());
        }
        for (key, value) in query {
            req = req.query(key, value);
        }
        if !body.is_empty() {
            req = req.body(Value::Object(body));
        }
        Ok(req)
    }
}

fn path_segment(name: &str, value: &Value) -> Result<String> {
    let segment = value_to_string(value);
    check_segment(name, &segment)?;
    Ok(segment)
}

/// A segment is substituted verbatim, so anything the URL parser would reinterpret is refused:
/// separators, percent escapes and dot segments.
fn check_segment(name: &str, segment: &str) -> Result<()> {
    let reason = if segment.trim().is_empty() {
        "must not be empty"
    } else if segment.contains(['/', '\\', '?', '#', '%']) {
        "must be a single path segment"
    } else if segment == "." || segment == ".." {
        "must not be a relative path segment"
    } else {
        return Ok(());
    };
    Err(ServerError::InvalidParam {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn config() -> Configuration {
        Configuration::new("key", "company-1", "https://api.example.test/v2")
    }

    fn args(v: Value) -> JsonObject {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn operation_names_are_unique_and_prefixed() {
        let mut seen = HashSet::new();
        for op in operations() {
            assert!(op.name.starts_with("kinsta_"), "{}", op.name);
            assert!(seen.insert(op.name), "duplicate operation {}", op.name);
        }
    }

    #[test]
    fn path_placeholders_match_declared_params() {
        for op in operations() {
            let mut path = op.path.replace("{company_id}", "");
            for p in op.params.iter().filter(|p| p.location == ParamLocation::Path) {
                assert!(path.contains(&format!("{{{}}}", p.name)), "{}: {}", op.name, p.name);
                path = path.replace(&format!("{{{}}}", p.name), "");
            }
            assert!(!path.contains('{'), "{} has an undeclared placeholder", op.name);
        }
    }

    #[test]
    fn input_schema_lists_required_params() {
        let op = find("kinsta_get_logs").expect("registered");
        let schema = op.input_schema();
        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        assert!(required.contains(&json!("env_id")));
        assert!(required.contains(&json!("file_name")));
        assert!(!required.contains(&json!("lines")));
    }

    #[test]
    fn input_schema_omits_required_when_empty() {
        let op = find("kinsta_list_company_users").expect("registered");
        assert!(op.input_schema().get("required").is_none());
    }

    #[test]
    fn build_request_fills_path_and_company_query() {
        let op = find("kinsta_list_sites").expect("registered");
        let req = op
            .build_request(&args(json!({"include_environments": true})), &config())
            .expect("request");
        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.path(), "/sites");
        assert_eq!(
            req.query_pairs(),
            &[
                ("company".to_string(), "company-1".to_string()),
                ("include_environments".to_string(), "true".to_string()),
            ]
        );
        assert!(req.json_body().is_none());
    }

    #[test]
    fn build_request_fills_company_path() {
        let op = find("kinsta_list_company_users").expect("registered");
        let req = op.build_request(&JsonObject::new(), &config()).expect("request");
        assert_eq!(req.path(), "/company/company-1/users");
    }

    #[test]
    fn build_request_collects_body_fields_with_types() {
        let op = find("kinsta_restore_backup").expect("registered");
        let req = op
            .build_request(
                &args(json!({"target_env_id": "env-9", "backup_id": 42})),
                &config(),
            )
            .expect("request");
        assert_eq!(req.path(), "/sites/environments/env-9/backups/restore");
        assert_eq!(req.json_body(), Some(&json!({"backup_id": 42})));
    }

    #[test]
    fn build_request_rejects_missing_and_null_required() {
        let op = find("kinsta_get_site").expect("registered");
        assert_eq!(
            op.build_request(&JsonObject::new(), &config()).unwrap_err(),
            ServerError::MissingParam("site_id".to_string())
        );
        assert_eq!(
            op.build_request(&args(json!({"site_id": null})), &config())
                .unwrap_err(),
            ServerError::MissingParam("site_id".to_string())
        );
    }

    #[test]
    fn build_request_rejects_multi_segment_path_values() {
        let op = find("kinsta_get_site").expect("registered");
        let err = op
            .build_request(&args(json!({"site_id": "a/../b"})), &config())
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidParam { .. }));
    }

    #[test]
    fn build_request_rejects_dot_and_escaped_path_values() {
        let op = find("kinsta_delete_site").expect("registered");
        for value in ["..", ".", "%2e%2e", "%2E", "a%2Fb", "a\\b"] {
            let err = op
                .build_request(&args(json!({"site_id": value})), &config())
                .unwrap_err();
            assert!(
                matches!(&err, ServerError::InvalidParam { name, .. } if name == "site_id"),
                "{value:?} was accepted"
            );
        }

        let req = op
            .build_request(&args(json!({"site_id": "site..1"})), &config())
            .expect("dots inside a segment are literal");
        assert_eq!(req.path(), "/sites/site..1");
    }

    #[test]
    fn build_request_checks_configured_company_in_path() {
        let op = find("kinsta_list_company_users").expect("registered");
        for company in ["..", "a/b", "%2e%2e"] {
            let cfg = Configuration::new("key", company, "https://api.example.test/v2");
            let err = op.build_request(&JsonObject::new(), &cfg).unwrap_err();
            assert!(
                matches!(&err, ServerError::InvalidParam { name, .. } if name == "company_id"),
                "{company:?} was accepted"
            );
        }
    }

    #[test]
    fn tool_carries_annotations() {
        let tool = find("kinsta_delete_site").expect("registered").tool();
        let annotations = tool.annotations.expect("annotations");
        assert_eq!(annotations.destructive_hint, Some(true));
        assert_eq!(annotations.title.as_deref(), Some("Delete site"));
    }
}
