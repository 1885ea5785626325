//! Command and answer types shared between the session, the queue, and the
//! executor. A `Command` is value-copied into its shard's queue and never
//! mutated afterwards; the executor destroys it once business logic has run.

use std::sync::Arc;

use crate::registry::{ClientKey, Publication};

/// Command identifiers, stable across client and server (`spec.md` §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Cid {
    Login = 1,
    Publish = 2,
    Follow = 3,
    Timeline = 4,
    FollowCount = 5,
    Rdv = 6,
    Unregister = 7,
}

impl Cid {
    pub fn from_u8(raw: u8) -> Option<Cid> {
        Some(match raw {
            1 => Cid::Login,
            2 => Cid::Publish,
            3 => Cid::Follow,
            4 => Cid::Timeline,
            5 => Cid::FollowCount,
            6 => Cid::Rdv,
            7 => Cid::Unregister,
            _ => return None,
        })
    }
}

/// A sink an executor or session can push an [`Answer`] into, without caring
/// whether it is a live TCP socket, a test harness channel, or `/dev/null`.
/// This is the concrete shape of the "framing layer" collaborator `spec.md`
/// §6 leaves as an interface.
pub trait AnswerSink: Send + Sync {
    fn send_answer(&self, answer: &Answer);
}

/// One parsed client request, queued for a shard's executor.
pub struct Command {
    pub cid: Cid,
    pub key: ClientKey,
    pub payload: String,
    pub streaming: bool,
    pub sink: Arc<dyn AnswerSink>,
}

impl Command {
    /// Whether the originating session should expect an answer at all.
    /// Streaming PUBLISH/FOLLOW never get one; everything else does except
    /// UNREGISTER, which is fire-and-forget by construction.
    pub fn answer_expected(&self) -> bool {
        !self.streaming && !matches!(self.cid, Cid::Unregister)
    }
}

/// The result of running business logic on a [`Command`]. Rendered to wire
/// bytes by `babble-wire::answer`.
#[derive(Debug, Clone)]
pub enum Answer {
    LoginAck { key: ClientKey },
    LoginFailed,
    PublishAck { author: String, text: String },
    FollowAck,
    FollowCountAck { count: usize },
    RdvAck,
    Timeline { publications: Vec<Publication> },
    Error { message: String },
}
