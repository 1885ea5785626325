//! Command-line surface: `babble_server --port <PORT> [--random-delay]`.

use clap::Parser;

use babble_core::config::DEFAULT_PORT;

#[derive(Parser, Debug)]
#[command(name = "babble_server", about = "Babble micro-publishing server")]
pub struct Cli {
    /// TCP port to bind.
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Activate random delays before PUBLISH/FOLLOW/TIMELINE, for stress testing.
    #[arg(short = 'r', long = "random-delay")]
    pub random_delay: bool,
}
