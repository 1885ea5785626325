//! `babble_client --host <HOST> --port <PORT> --name <NAME> <SUBCOMMAND>`

use clap::{Parser, Subcommand};

use babble_client::{Client, ClientError};
use babble_core::config::DEFAULT_PORT;

#[derive(Parser, Debug)]
#[command(name = "babble_client", about = "Reference client for the babble server")]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Client identity to LOGIN with before running the subcommand.
    #[arg(short = 'n', long)]
    name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish a message.
    Publish {
        text: String,
        #[arg(short = 's', long)]
        streaming: bool,
    },
    /// Follow another client.
    Follow {
        target: String,
        #[arg(short = 's', long)]
        streaming: bool,
    },
    /// Print the merged timeline of everyone this client follows.
    Timeline,
    /// Print how many clients follow this client.
    Fcount,
    /// Send a liveness probe.
    Rdv,
}

fn main() -> std::process::ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ClientError> {
    let mut client = Client::connect(&cli.host, cli.port)?;
    client.login(&cli.name)?;

    match cli.command {
        Command::Publish { text, streaming } => {
            if let Some((author, published)) = client.publish(&text, streaming)? {
                println!("{author}: {published}");
            }
        }
        Command::Follow { target, streaming } => {
            client.follow(&target, streaming)?;
        }
        Command::Timeline => {
            for entry in client.timeline()? {
                println!("{}: {}", entry.author, entry.text);
            }
        }
        Command::Fcount => {
            println!("{}", client.follow_count()?);
        }
        Command::Rdv => {
            client.rdv()?;
            println!("rdv_ack");
        }
    }

    Ok(())
}
