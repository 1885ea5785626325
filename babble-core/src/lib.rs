//! Concurrency core for the babble micro-publishing server.
//!
//! This crate is the hard part of `spec.md`: the bounded producer/consumer
//! queue, the writer-preferring registry, the shard selector, and the
//! business logic that runs under their protection. Framing, wire parsing,
//! session threading, and the executor pool live in `babble-wire` and
//! `babble-server`, which depend on this crate rather than the reverse.

pub mod business;
pub mod command;
pub mod config;
pub mod error;
pub mod hash;
pub mod queue;
pub mod registry;
pub mod rwlock;
pub mod shard;

pub use command::{Answer, AnswerSink, Cid, Command};
pub use error::{BusinessError, QueueError, RegistryError};
pub use queue::Queue;
pub use registry::{ClientBundle, ClientKey, ClientState, Publication, Registry};
pub use rwlock::WriterPreferringLock;
