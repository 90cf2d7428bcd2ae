//! Request/response translation layer for the Kinsta MCP server.
//!
//! This crate owns everything between a tool invocation and the Kinsta REST API:
//! - credential loading and configuration fingerprints (`config`)
//! - the authenticated HTTP client (`runtime`)
//! - status-code classification (`classify`)
//! - the per-configuration client cache (`cache`)
//! - MCP result rendering (`envelope`)
//!
//! It knows nothing about individual Kinsta endpoints; those live in the server crate.

pub mod cache;
pub mod classify;
pub mod config;
pub mod envelope;
pub mod runtime;

pub use cache::ClientCache;
pub use classify::{ClassifiedError, ErrorKind, classify, classify_resource};
pub use config::{Configuration, EnvSource, MapEnv, ProcessEnv};
pub use runtime::{ApiRequest, ApiResult, ClientError, KinstaClient};
