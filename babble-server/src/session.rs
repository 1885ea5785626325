//! The per-connection state machine: `spec.md` §4.D.
//!
//! ```text
//!  NEW ──recv──► PARSING ──login_ok──► LIVE ──eof/error──► CLOSING ──► DEAD
//!                 │                     │
//!                 └── login_fail ───────┴── parse_error ──► error answer, stays LIVE
//! ```
//!
//! LOGIN is dispatched inline on the session thread rather than enqueued
//! (the other option `spec.md` §4.D allows), so "no subsequent command from
//! this connection is enqueued before LOGIN has registered the client" holds
//! by construction: there is no queue hop to race against.

use std::net::TcpStream;
use std::sync::Arc;

use babble_core::command::Command;
use babble_core::registry::ClientKey;
use babble_core::{business, Answer, Queue, Registry};
use babble_wire::{framing, parse_line, TcpAnswerSink, WireError};

pub struct Session {
    stream: TcpStream,
    registry: Arc<Registry>,
    queues: Arc<[Queue<Command>]>,
}

impl Session {
    pub fn new(stream: TcpStream, registry: Arc<Registry>, queues: Arc<[Queue<Command>]>) -> Self {
        Session { stream, registry, queues }
    }

    /// Drive this connection to completion. Never panics: every error path
    /// ends the session instead of unwinding through the thread's top frame.
    pub fn run(mut self) {
        let write_handle = match self.stream.try_clone() {
            Ok(stream) => stream,
            Err(err) => {
                log::warn!("failed to clone session socket: {err}");
                return;
            }
        };
        let sink = Arc::new(TcpAnswerSink::new(write_handle));

        // NEW -> PARSING
        let first_line = match self.recv_line() {
            Ok(Some(line)) => line,
            Ok(None) => return, // clean close before any byte arrived: straight to DEAD
            Err(err) => {
                log::warn!("transport error awaiting LOGIN: {err}");
                return;
            }
        };

        let name = match parse_line(&first_line) {
            Ok(parsed) if parsed.cid == babble_core::Cid::Login => parsed.payload,
            _ => {
                sink.send_answer(&Answer::Error {
                    message: "expected LOGIN as the first command".to_string(),
                });
                return;
            }
        };
        let key = ClientKey::from_name(&name);

        let login_answer = business::run_login(&self.registry, key, &name, sink.clone());
        let registered = matches!(login_answer, Answer::LoginAck { .. });
        sink.send_answer(&login_answer);
        if !registered {
            return; // registration failed: no UNREGISTER, no further processing
        }

        self.live_loop(key, &sink);

        // CLOSING: always emit UNREGISTER as the terminal action of a
        // successful LOGIN, on the same shard so it drains after every
        // command this session already enqueued.
        let shard = babble_core::shard::shard_for(key, self.queues.len());
        let unregister_cmd = Command {
            cid: babble_core::Cid::Unregister,
            key,
            payload: String::new(),
            streaming: true,
            sink: sink.clone(),
        };
        if self.queues[shard].enqueue(unregister_cmd).is_err() {
            // Shutdown already fired and executors may be gone; clean up
            // directly rather than leaving the client registered forever.
            business::unregister(&self.registry, key);
        }
    }

    fn live_loop(&mut self, key: ClientKey, sink: &Arc<TcpAnswerSink>) {
        loop {
            let line = match self.recv_line() {
                Ok(Some(line)) => line,
                Ok(None) => return,
                Err(err) => {
                    log::warn!("transport error from client {key}: {err}");
                    return;
                }
            };

            let parsed = match parse_line(&line) {
                Ok(parsed) => parsed,
                Err(err) => {
                    sink.send_answer(&Answer::Error { message: err.to_string() });
                    continue;
                }
            };

            let command = Command {
                cid: parsed.cid,
                key,
                payload: parsed.payload,
                streaming: parsed.streaming,
                sink: sink.clone(),
            };

            let shard = babble_core::shard::shard_for(key, self.queues.len());
            if self.queues[shard].enqueue(command).is_err() {
                return; // shutdown observed mid-wait: exit to CLOSING
            }
        }
    }

    fn recv_line(&mut self) -> Result<Option<String>, WireError> {
        let frame = framing::recv_frame(&mut self.stream)?;
        let Some(bytes) = frame else {
            return Ok(None);
        };
        let text = String::from_utf8(bytes).map_err(|_| WireError::MalformedLine)?;
        Ok(Some(text.trim_end_matches(['\n', '\r']).to_string()))
    }
}
