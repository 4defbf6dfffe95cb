//! Product Search MCP Server Library
//!
//! A Model Context Protocol (MCP) server exposing a product search API.
//! Provides search tools with filtering and sorting, plus documentation
//! resources describing them.

pub mod config;
pub mod error;
pub mod mcp;
pub mod search;

pub use config::Config;
pub use error::{Result, SearchMcpError};
