//! The concrete [`AnswerSink`] used by the server: writes an answer straight
//! to a client's TCP socket.

use std::net::TcpStream;
use std::sync::Mutex;

use babble_core::{Answer, AnswerSink};

use crate::answer::send_answer;

/// Wraps the socket a session owns so the executor pool (and, for FOLLOW's
/// cross-client touch, a different executor than the one that dispatched the
/// original command) can push an answer to it without taking ownership.
pub struct TcpAnswerSink {
    stream: Mutex<TcpStream>,
    peer: String,
}

impl TcpAnswerSink {
    pub fn new(stream: TcpStream) -> Self {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());
        TcpAnswerSink {
            stream: Mutex::new(stream),
            peer,
        }
    }

    pub fn try_clone(&self) -> std::io::Result<TcpStream> {
        self.stream.lock().unwrap().try_clone()
    }
}

impl AnswerSink for TcpAnswerSink {
    fn send_answer(&self, answer: &Answer) {
        let mut stream = self.stream.lock().unwrap();
        if let Err(err) = send_answer(&mut *stream, answer) {
            log::warn!("failed to send answer to {}: {err}", self.peer);
        }
    }
}
