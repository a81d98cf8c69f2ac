//! Store error types

use crate::backend::BackendError;

/// Invalid construction parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A stream buffer needs room for at least one record
    ZeroCapacity,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroCapacity => write!(f, "Buffer capacity must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// `start()` failed; the store keeps its prior state and may be retried
#[derive(Debug)]
pub enum StoreStartError {
    /// The store is already starting or active; a second start would
    /// double-subscribe
    AlreadyActive { key: String },
    /// The historical snapshot fetch failed
    Snapshot { key: String, source: BackendError },
    /// Seeding succeeded but the live subscription could not be attached
    Subscription { key: String, source: BackendError },
}

impl std::fmt::Display for StoreStartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreStartError::AlreadyActive { key } => {
                write!(f, "Store already started: {}", key)
            }
            StoreStartError::Snapshot { key, source } => {
                write!(f, "Snapshot fetch failed for {}: {}", key, source)
            }
            StoreStartError::Subscription { key, source } => {
                write!(f, "Live subscription failed for {}: {}", key, source)
            }
        }
    }
}

impl std::error::Error for StoreStartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreStartError::AlreadyActive { .. } => None,
            StoreStartError::Snapshot { source, .. }
            | StoreStartError::Subscription { source, .. } => Some(source),
        }
    }
}
