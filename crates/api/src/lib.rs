//! Read-only HTTP status surface.
//!
//! This crate exposes the running bot to operators:
//! - Liveness
//! - Bot status and the latest cycle outcome
//! - Lifecycle event history

/// Error types.
pub mod error;
/// Request handlers.
pub mod handlers;
/// Route definitions.
pub mod routes;
/// Server configuration and startup.
pub mod server;
/// Application state.
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use server::{ApiServer, ServerConfig};
pub use state::{AppState, StatusSource};
