//! crashlab: a crash-game trading simulator service.
//!
//! The engine is deterministic and transport-free: crash points come from an
//! injected entropy source, the multiplier is a pure function of elapsed time,
//! and every state transition happens inside an explicit tick. The API layer
//! wraps sessions in driver tasks and exposes them over HTTP and WebSocket.

pub mod api;
pub mod config;
pub mod engine;
pub mod errors;
pub mod metrics;

pub use config::{Config, ConfigLoader};
pub use engine::{CrashPointGenerator, CrashSession, GrowthClock};
pub use errors::BetError;
