//! TCP accept loop: one thread per connection, cooperative shutdown on a
//! shared flag. `spec.md` §4.C and §4.F.

use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use babble_core::{Command, Queue, Registry};

use crate::session::Session;

/// How long `accept()` blocks before re-checking the shutdown flag. Short
/// enough that Ctrl-C feels immediate, long enough to not spin.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub struct Acceptor {
    listener: TcpListener,
    registry: Arc<Registry>,
    queues: Arc<[Queue<Command>]>,
    running: Arc<AtomicBool>,
}

impl Acceptor {
    pub fn bind(
        port: u16,
        registry: Arc<Registry>,
        queues: Arc<[Queue<Command>]>,
        running: Arc<AtomicBool>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        listener.set_nonblocking(true)?;
        Ok(Acceptor { listener, registry, queues, running })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the shared flag drops, spawning one detached
    /// thread per session. Per `spec.md` §4.F, the acceptor does not wait for
    /// in-flight sessions to finish -- it stops taking new ones and lets the
    /// executors drain what is already queued.
    pub fn run(self) {
        while self.running.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    log::info!("accepted connection from {peer}");
                    self.spawn_session(stream);
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(err) => {
                    log::warn!("accept() failed: {err}");
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }
        log::info!("acceptor stopped taking new connections");
    }

    fn spawn_session(&self, stream: TcpStream) {
        let registry = self.registry.clone();
        let queues = self.queues.clone();
        let build = thread::Builder::new().name("babble-session".to_string());
        let spawned = build.spawn(move || {
            let session = Session::new(stream, registry, queues);
            session.run();
        });
        if let Err(err) = spawned {
            log::error!("failed to spawn session thread: {err}");
        }
    }
}
