//! Error types for the registry, queue, and business-logic boundaries.
//!
//! Every variant here is an ordinary return value, never a panic: the pipeline
//! is driven by untrusted network input and a malformed or hostile client must
//! not be able to take down an executor or session thread.

/// Failures from [`crate::registry::Registry`] operations.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry is full")]
    Full,
    #[error("client already registered")]
    Duplicate,
}

/// Failures from [`crate::queue::Queue`] operations.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue is shutting down")]
    ShutDown,
}

/// Failures from business-logic dispatch (`babble_core::business`).
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessError {
    #[error("follow target is not a registered client")]
    UnknownTarget,
    #[error("client is not registered")]
    NotLoggedIn,
}
