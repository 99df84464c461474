//! HTTP and WebSocket service edge.
//!
//! The engine knows nothing about transport; everything network-facing lives
//! here. Sessions are created over REST, driven by background tick tasks, and
//! observed over a per-session WebSocket stream.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod sessions;
pub mod websocket;

pub use server::{ApiServer, AppState};
pub use sessions::{SessionEvent, SessionRegistry};
