//! Kinsta MCP server: the tool registry and the rmcp handler that routes tool calls through
//! `kinsta-api-client`.

pub mod error;
pub mod handler;
pub mod registry;
pub mod semantics;

pub use handler::KinstaServer;
