//! Typed facade over the native data-producing service
//!
//! The native service (simulation/telemetry producer, camera capture) lives
//! outside this crate and is reached through the [`Transport`] trait:
//! request/response via `invoke`, push events via `listen`. [`Gateway`]
//! wraps the transport with one thin typed method per remote operation.
//! [`FakeBackend`] is a complete in-memory transport for tests and demos.

pub mod error;
pub mod fake;
pub mod gateway;
pub mod transport;

pub use error::BackendError;
pub use fake::FakeBackend;
pub use gateway::Gateway;
pub use transport::{EventHandler, Transport};
