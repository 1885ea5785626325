//! End-to-end scenarios driving a real, in-process server over a loopback
//! TCP socket through the reference client library.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use babble_client::Client;
use babble_core::config::{MAX_CLIENT, MAX_COMMANDS, PRODCONS_NB};
use babble_core::{Command, Queue, Registry};
use babble_server::{Acceptor, ExecutorPool};

/// Spins up a full server (registry, shard queues, executor pool, acceptor)
/// bound to an ephemeral port, and returns the port plus a guard that shuts
/// everything down on drop.
struct TestServer {
    port: u16,
    running: Arc<AtomicBool>,
    acceptor_thread: Option<thread::JoinHandle<()>>,
    pool: Option<ExecutorPool>,
    queues: Arc<[Queue<Command>]>,
}

impl TestServer {
    fn start() -> Self {
        let registry = Arc::new(Registry::new(MAX_CLIENT));
        let queues: Arc<[Queue<Command>]> = (0..PRODCONS_NB)
            .map(|_| Queue::new(MAX_COMMANDS))
            .collect::<Vec<_>>()
            .into();

        let pool = ExecutorPool::spawn(queues.clone(), registry.clone(), false);

        let running = Arc::new(AtomicBool::new(true));
        let acceptor = Acceptor::bind(0, registry, queues.clone(), running.clone())
            .expect("binding an ephemeral port should never fail");
        let port = acceptor.local_addr().unwrap().port();

        let acceptor_thread = thread::spawn(move || acceptor.run());

        TestServer {
            port,
            running,
            acceptor_thread: Some(acceptor_thread),
            pool: Some(pool),
            queues,
        }
    }

    fn connect(&self, name: &str) -> Client {
        let mut client = Client::connect("127.0.0.1", self.port).expect("connect should succeed");
        client.login(name).expect("login should succeed");
        client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.acceptor_thread.take() {
            let _ = handle.join();
        }
        for queue in self.queues.iter() {
            queue.shutdown();
        }
        if let Some(pool) = self.pool.take() {
            pool.join();
        }
    }
}

/// S1: LOGIN, FOLLOW, PUBLISH, TIMELINE across two clients.
#[test]
fn follower_sees_publications_from_who_they_follow() {
    let server = TestServer::start();

    let mut alice = server.connect("alice");
    let mut bob = server.connect("bob");

    bob.follow("alice", false).unwrap();
    let (author, text) = alice.publish("hello from alice", false).unwrap().unwrap();
    assert_eq!(author, "alice");
    assert_eq!(text, "hello from alice");

    let timeline = bob.timeline().unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].author, "alice");
    assert_eq!(timeline[0].text, "hello from alice");
}

#[test]
fn follow_count_reflects_distinct_followers_only() {
    let server = TestServer::start();

    let mut alice = server.connect("alice");
    let mut bob = server.connect("bob");
    let mut carol = server.connect("carol");

    bob.follow("alice", false).unwrap();
    carol.follow("alice", false).unwrap();
    // Following twice must not double-count.
    bob.follow("alice", false).unwrap();

    assert_eq!(alice.follow_count().unwrap(), 2);
}

#[test]
fn rdv_round_trips_on_a_freshly_logged_in_connection() {
    let server = TestServer::start();
    let mut client = server.connect("solo");
    client.rdv().unwrap();
}

#[test]
fn second_login_with_the_same_name_is_rejected() {
    let server = TestServer::start();
    let _first = server.connect("duplicate");

    let mut second = Client::connect("127.0.0.1", server.port).unwrap();
    let err = second.login("duplicate").unwrap_err();
    assert!(matches!(err, babble_client::ClientError::LoginFailed));
}

/// S2: a thousand streamed publications from one client land on a
/// follower's timeline in full and newest-first.
#[test]
fn a_thousand_streamed_publications_all_arrive_in_order() {
    let server = TestServer::start();

    let mut alice = server.connect("alice");
    let mut bob = server.connect("bob");
    bob.follow("alice", false).unwrap();

    const N: usize = 1000;
    for i in 0..N {
        alice.publish(&format!("msg-{i}"), true).unwrap();
    }
    // Streaming PUBLISH carries no ack; RDV on the same connection proves the
    // shard has drained everything queued ahead of it, since ordering within
    // a shard's queue is FIFO.
    alice.rdv().unwrap();

    let timeline = bob.timeline().unwrap();
    assert_eq!(timeline.len(), N);
    for (i, entry) in timeline.iter().enumerate() {
        assert_eq!(entry.text, format!("msg-{}", N - 1 - i));
    }
}
