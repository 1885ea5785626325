use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use babble_core::config::{MAX_CLIENT, MAX_COMMANDS, PRODCONS_NB};
use babble_core::{Command, Queue, Registry};

use babble_server::{Acceptor, Cli, ExecutorPool};

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let registry = Arc::new(Registry::new(MAX_CLIENT));
    let queues: Arc<[Queue<Command>]> = (0..PRODCONS_NB)
        .map(|_| Queue::new(MAX_COMMANDS))
        .collect::<Vec<_>>()
        .into();

    let pool = ExecutorPool::spawn(queues.clone(), registry.clone(), cli.random_delay);

    let running = Arc::new(AtomicBool::new(true));
    let acceptor = match Acceptor::bind(cli.port, registry, queues.clone(), running.clone()) {
        Ok(acceptor) => acceptor,
        Err(err) => {
            log::error!("failed to bind port {}: {err}", cli.port);
            return ExitCode::from(2);
        }
    };
    log::info!("babble_server listening on {:?}", acceptor.local_addr());

    let sigint_running = running.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        log::info!("shutdown signal received");
        sigint_running.store(false, Ordering::SeqCst);
    }) {
        log::warn!("failed to install signal handler: {err}");
    }

    // The acceptor loop itself exits once `running` drops; since it's the
    // only thing the main thread is doing, run it inline rather than on a
    // dedicated thread.
    acceptor.run();

    for queue in queues.iter() {
        queue.shutdown();
    }
    pool.join();

    log::info!("babble_server shut down cleanly");
    ExitCode::SUCCESS
}
