//! HTTP server for hkv.
//!
//! Exposes hash operations to remote callers through a single framed RPC
//! endpoint (`POST /v1/rpc`), plus health and info endpoints.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{dispatch, AppState};
pub use server::HkvServer;
