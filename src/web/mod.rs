//! Web server module (Axum health probe).

pub mod router;
pub mod server;

pub use router::create_app_router;
pub use server::{bind, run_server, serve, WebServerConfig};
