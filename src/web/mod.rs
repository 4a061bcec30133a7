//! Web server module (Axum + API).

pub mod api;
pub mod auth;
pub mod router;
pub mod server;
pub mod state;

pub use router::create_app_router;
pub use server::{run_server, serve, WebServerConfig};
pub use state::AppState;
