//! Transport boundary to the native service
//!
//! Implementations carry named operations and push channels over whatever
//! the host process provides (an IPC bridge, a socket, or the in-memory
//! [`FakeBackend`](super::FakeBackend)). The transport itself is untyped:
//! arguments and replies are JSON values, and typing lives one layer up in
//! [`Gateway`](super::Gateway) and [`EventBridge`](crate::bridge::EventBridge).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::bridge::Disposer;

use super::error::BackendError;

/// Callback invoked once per event delivered on a push channel
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Connection to the native service
///
/// The underlying connection is process-wide shared state; implementations
/// must serialize access internally. Both methods are suspension points for
/// the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke a named remote operation and await its reply
    async fn invoke(&self, operation: &str, args: Value) -> Result<Value, BackendError>;

    /// Attach a listener to a named push channel
    ///
    /// Creates exactly one underlying subscription; the returned disposer
    /// cancels only that subscription. Delivery is asynchronous relative to
    /// this call — events may start arriving any time after it returns, and
    /// per channel they arrive in producer emission order.
    async fn listen(&self, channel: &str, handler: EventHandler) -> Result<Disposer, BackendError>;
}
