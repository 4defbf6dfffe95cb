//! Search API module
//!
//! Contains types, authentication, request shaping, and the client for the
//! product search API.

pub mod auth;
pub mod client;
pub mod retry;
pub mod scope;
pub mod types;
