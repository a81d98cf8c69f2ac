//! Push-event plumbing: subscription handles and the typed event bridge
//!
//! Everything that attaches a listener in this crate hands back a
//! [`Disposer`]. Releasing the disposer is the only way to cancel the
//! listener; releasing twice is a no-op. [`EventBridge`] layers typed
//! payload decoding over the transport's raw channel subscriptions.

pub mod disposer;
pub mod events;

pub use disposer::{Disposer, DisposerSet};
pub use events::EventBridge;
