//! Compile-time constants shared by every component of the pipeline.
//!
//! Values are fixed rather than configurable at runtime because they bound the
//! wire format (`ID_SIZE`, `PUBLICATION_SIZE`) and the shape of the in-memory
//! structures (`MAX_CLIENT`, `MAX_COMMANDS`, `PRODCONS_NB`); a client and server
//! built against different values cannot interoperate.

/// Maximum length, in bytes, of a registered client name.
pub const ID_SIZE: usize = 32;

/// Maximum length, in bytes, of a single publication.
pub const PUBLICATION_SIZE: usize = 256;

/// Maximum number of simultaneously registered clients.
pub const MAX_CLIENT: usize = 1024;

/// Capacity of a single shard's command queue.
pub const MAX_COMMANDS: usize = 10;

/// Number of shards (queue + executor pairs).
pub const PRODCONS_NB: usize = 4;

/// Default TCP port when `-p` is not given.
pub const DEFAULT_PORT: u16 = 9000;
