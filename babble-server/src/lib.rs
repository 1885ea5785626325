//! Library half of the babble server: everything `src/main.rs` wires
//! together, split out so integration tests can drive a real server without
//! going through a subprocess.

pub mod acceptor;
pub mod cli;
pub mod executor;
pub mod session;

pub use acceptor::Acceptor;
pub use cli::Cli;
pub use executor::ExecutorPool;
