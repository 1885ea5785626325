//! Framing, command-line parsing, and answer serialization for babble.
//!
//! Everything here is an "external collaborator" in `spec.md` §1's sense: the
//! concurrency core (`babble-core`) never depends on this crate, only the
//! reverse.

pub mod answer;
pub mod error;
pub mod framing;
pub mod parse;
pub mod sink;

pub use error::WireError;
pub use parse::{parse_line, ParsedLine};
pub use sink::TcpAnswerSink;
