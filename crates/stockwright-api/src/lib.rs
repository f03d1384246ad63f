//! Typed access to the inventory persistence service.
//!
//! [`Gateway`] is the seam the rest of the workspace talks to; [`HttpGateway`]
//! is the production implementation over JSON/HTTP.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod models;

pub use config::ApiConfig;
pub use error::RemoteError;
pub use gateway::Gateway;
pub use http::HttpGateway;
