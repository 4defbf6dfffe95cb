//! MCP (Model Context Protocol) module
//!
//! Implements the MCP server protocol for tool invocation and resource reads
//! over stdio and HTTP.

pub mod http;
pub mod resources;
pub mod server;
pub mod tools;
pub mod types;
