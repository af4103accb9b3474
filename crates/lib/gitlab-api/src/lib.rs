//! GitLab REST client for gitlab-mcp.
//!
//! This crate carries the per-session credentials, binds them to an HTTP
//! transport, and exposes typed wrappers for the GitLab resources the MCP
//! tools use. Failures are classified so callers can tell "not found" from
//! "unauthorized" from "rate limited".

pub mod client;
pub mod error;
pub mod resources;
pub mod session;
pub mod transport;

pub use client::{ClientFactory, GitlabClient, HttpClientConfig, HttpClientFactory};
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use resources::Page;
pub use reqwest::Url;
pub use session::SessionContext;
pub use transport::{ApiRequest, HttpTransport, Method, Transport};
