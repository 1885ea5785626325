//! The executor pool: one OS thread per shard, draining its queue and
//! dispatching to business logic. `spec.md` §4.E.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::Rng;

use babble_core::command::{Answer, Cid, Command};
use babble_core::error::QueueError;
use babble_core::{business, Queue, Registry};

/// Upper bound, in milliseconds, of the optional stress-test delay before
/// PUBLISH/FOLLOW/TIMELINE. Grounded in `babble_server.c`'s
/// `random_delay_activated` knob; the original's `fastrand`-seeded delay is
/// replaced with `rand::Rng`, already the idiomatic choice across the pack.
const MAX_RANDOM_DELAY_MS: u64 = 5;

pub struct ExecutorPool {
    handles: Vec<JoinHandle<()>>,
}

impl ExecutorPool {
    /// Spawn one executor per queue in `queues`.
    pub fn spawn(queues: Arc<[Queue<Command>]>, registry: Arc<Registry>, random_delay: bool) -> Self {
        let handles = (0..queues.len())
            .map(|shard_id| {
                let queues = queues.clone();
                let registry = registry.clone();
                thread::Builder::new()
                    .name(format!("babble-executor-{shard_id}"))
                    .spawn(move || executor_loop(shard_id, &queues, &registry, random_delay))
                    .expect("failed to spawn executor thread")
            })
            .collect();
        ExecutorPool { handles }
    }

    /// Block until every executor has observed shutdown and exited.
    pub fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                log::error!("executor thread panicked while joining");
            }
        }
    }
}

fn executor_loop(shard_id: usize, queues: &[Queue<Command>], registry: &Registry, random_delay: bool) {
    let queue = &queues[shard_id];
    let mut rng = rand::thread_rng();
    loop {
        let command = match queue.dequeue() {
            Ok(command) => command,
            Err(QueueError::ShutDown) => {
                log::info!("executor {shard_id} shutting down");
                return;
            }
        };
        dispatch(shard_id, registry, command, random_delay, &mut rng);
    }
}

fn dispatch(
    shard_id: usize,
    registry: &Registry,
    command: Command,
    random_delay: bool,
    rng: &mut impl Rng,
) {
    let answer_expected = command.answer_expected();
    let sink = command.sink.clone();
    let cid = command.cid;
    let key = command.key;

    // Fault isolation: a business call that panics must not take the
    // executor down with it (`spec.md` §4.E).
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        run_business_logic(registry, command, random_delay, rng)
    }));

    match outcome {
        Ok(Ok(Some(answer))) => {
            if answer_expected {
                sink.send_answer(&answer);
            }
        }
        Ok(Ok(None)) => {}
        Ok(Err(business_err)) => {
            log::error!("business error for client {key} running {cid:?}: {business_err}");
            if answer_expected {
                sink.send_answer(&Answer::Error { message: business_err.to_string() });
            }
        }
        Err(_) => {
            log::error!("executor {shard_id}: business logic panicked dispatching {cid:?} for {key}");
        }
    }
}

fn run_business_logic(
    registry: &Registry,
    command: Command,
    random_delay: bool,
    rng: &mut impl Rng,
) -> Result<Option<Answer>, babble_core::error::BusinessError> {
    match command.cid {
        Cid::Login => {
            // The session dispatches the connection's first LOGIN inline and
            // never enqueues it; a LOGIN reaching an executor means a client
            // sent a second one mid-session, which is not part of the
            // protocol. Answer rather than panic.
            Ok(Some(Answer::Error {
                message: "LOGIN is only valid as the first command on a connection".to_string(),
            }))
        }
        Cid::Publish => {
            maybe_delay(random_delay, rng);
            business::run_publish(registry, command.key, &command.payload).map(Some)
        }
        Cid::Follow => {
            maybe_delay(random_delay, rng);
            business::run_follow(registry, command.key, &command.payload).map(Some)
        }
        Cid::Timeline => {
            maybe_delay(random_delay, rng);
            business::run_timeline(registry, command.key).map(Some)
        }
        Cid::FollowCount => business::run_fcount(registry, command.key).map(Some),
        Cid::Rdv => Ok(Some(business::run_rdv())),
        Cid::Unregister => {
            business::unregister(registry, command.key);
            Ok(None)
        }
    }
}

fn maybe_delay(random_delay: bool, rng: &mut impl Rng) {
    if random_delay {
        let millis = rng.gen_range(0..=MAX_RANDOM_DELAY_MS);
        thread::sleep(Duration::from_millis(millis));
    }
}
