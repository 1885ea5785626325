//! Business logic: `run_login`, `run_publish`, `run_follow`, `run_timeline`,
//! `run_fcount`, `run_rdv`, `unregister`. `spec.md` §1 treats these as an
//! external collaborator and specifies only their interface; these bodies are
//! the ordinary, un-clever implementation needed to make the pipeline
//! runnable, grounded in `examples/original_source/stage_3/babble_server.c`'s
//! `run_*_command` dispatch.
//!
//! Cross-client mutation (FOLLOW touching both the follower's and the
//! target's bundle) uses per-bundle locks, never held together -- Option (a)
//! from `spec.md` §9. Each bundle's lock is acquired, mutated, and released
//! before the next one is touched, so no two bundle locks are ever held at
//! the same time and the registry lock is never held across either.

use std::sync::Arc;

use crate::command::{Answer, AnswerSink};
use crate::error::BusinessError;
use crate::registry::{ClientKey, Publication, Registry};

/// LOGIN: register a new client under `key`/`name`. Never blocks longer than
/// the registry's writer-preferring insert; always produces an answer, even
/// on failure, since the session waits on it synchronously.
pub fn run_login(
    registry: &Registry,
    key: ClientKey,
    name: &str,
    sink: Arc<dyn AnswerSink>,
) -> Answer {
    let bundle = Arc::new(crate::registry::ClientBundle::new(key, name.to_string(), sink));
    match registry.insert(bundle) {
        Ok(()) => Answer::LoginAck { key },
        Err(err) => {
            log::warn!("LOGIN rejected for {name:?} (key {key}): {err}");
            Answer::LoginFailed
        }
    }
}

/// PUBLISH: append to the author's own timeline.
pub fn run_publish(
    registry: &Registry,
    key: ClientKey,
    text: &str,
) -> Result<Answer, BusinessError> {
    let bundle = registry.lookup(key).ok_or(BusinessError::NotLoggedIn)?;
    let seq = registry.next_publication_seq();
    let publication = Publication {
        author: bundle.name.clone(),
        text: text.to_string(),
        seq,
    };
    {
        let mut state = bundle.state.lock().unwrap();
        state.timeline.push_front(publication.clone());
    }
    Ok(Answer::PublishAck {
        author: publication.author,
        text: publication.text,
    })
}

/// FOLLOW: `key` starts following the client registered under `target_name`.
/// Idempotent: following the same target twice does not double-count (test
/// property 7 in `spec.md` §8).
pub fn run_follow(
    registry: &Registry,
    key: ClientKey,
    target_name: &str,
) -> Result<Answer, BusinessError> {
    let follower = registry.lookup(key).ok_or(BusinessError::NotLoggedIn)?;
    let target_key = ClientKey::from_name(target_name);
    let target = registry
        .lookup(target_key)
        .ok_or(BusinessError::UnknownTarget)?;

    let newly_followed = {
        let mut state = follower.state.lock().unwrap();
        state.followed.insert(target_key)
    };

    if newly_followed {
        let mut state = target.state.lock().unwrap();
        state.followers.insert(key);
    }

    Ok(Answer::FollowAck)
}

/// TIMELINE: merge the publications of everyone `key` follows, newest first.
pub fn run_timeline(registry: &Registry, key: ClientKey) -> Result<Answer, BusinessError> {
    let bundle = registry.lookup(key).ok_or(BusinessError::NotLoggedIn)?;
    let followed: Vec<ClientKey> = {
        let state = bundle.state.lock().unwrap();
        state.followed.iter().copied().collect()
    };

    let mut merged: Vec<Publication> = Vec::new();
    for followed_key in followed {
        if let Some(followed_bundle) = registry.lookup(followed_key) {
            let state = followed_bundle.state.lock().unwrap();
            merged.extend(state.timeline.iter().cloned());
        }
    }
    merged.sort_by(|a, b| b.seq.cmp(&a.seq));

    Ok(Answer::Timeline { publications: merged })
}

/// FOLLOW_COUNT: how many clients currently follow `key`.
pub fn run_fcount(registry: &Registry, key: ClientKey) -> Result<Answer, BusinessError> {
    let bundle = registry.lookup(key).ok_or(BusinessError::NotLoggedIn)?;
    let count = bundle.state.lock().unwrap().followers.len();
    Ok(Answer::FollowCountAck { count })
}

/// RDV: a liveness probe, used by tests to confirm the server is processing
/// commands end to end.
pub fn run_rdv() -> Answer {
    Answer::RdvAck
}

/// UNREGISTER: terminal action of a session. Removes the client from the
/// registry. Stale references left in other clients' `followers`/`followed`
/// sets are tolerated -- `Registry::lookup` on a removed key returns `None`,
/// and every caller above already treats a missing followed-client as "has no
/// publications" rather than an error. The original does the same: its
/// `registration_remove` never touches other clients' state either.
pub fn unregister(registry: &Registry, key: ClientKey) {
    if registry.remove(key).is_none() {
        log::warn!("UNREGISTER for key {key} found no matching client");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSink;
    impl AnswerSink for NullSink {
        fn send_answer(&self, _answer: &Answer) {}
    }

    fn login(registry: &Registry, name: &str) -> ClientKey {
        let key = ClientKey::from_name(name);
        match run_login(registry, key, name, Arc::new(NullSink)) {
            Answer::LoginAck { key } => key,
            other => panic!("expected LoginAck, got {other:?}"),
        }
    }

    #[test]
    fn follow_then_fcount_increases_by_exactly_one() {
        let registry = Registry::new(8);
        let alice = login(&registry, "alice");
        login(&registry, "bob");

        run_follow(&registry, alice, "bob").unwrap();
        let Answer::FollowCountAck { count } = run_fcount(&registry, ClientKey::from_name("bob")).unwrap() else {
            panic!("expected FollowCountAck");
        };
        assert_eq!(count, 1);

        // Following again must not double-count.
        run_follow(&registry, alice, "bob").unwrap();
        let Answer::FollowCountAck { count } = run_fcount(&registry, ClientKey::from_name("bob")).unwrap() else {
            panic!("expected FollowCountAck");
        };
        assert_eq!(count, 1);
    }

    #[test]
    fn publish_then_timeline_on_a_follower_includes_the_message() {
        let registry = Registry::new(8);
        let alice = login(&registry, "alice");
        let bob = login(&registry, "bob");

        run_follow(&registry, bob, "alice").unwrap();
        run_publish(&registry, alice, "hi").unwrap();

        let Answer::Timeline { publications } = run_timeline(&registry, bob).unwrap() else {
            panic!("expected Timeline");
        };
        assert_eq!(publications.len(), 1);
        assert_eq!(publications[0].text, "hi");
        assert_eq!(publications[0].author, "alice");
    }

    #[test]
    fn follow_of_unknown_target_is_rejected() {
        let registry = Registry::new(8);
        let alice = login(&registry, "alice");
        let err = run_follow(&registry, alice, "ghost").unwrap_err();
        assert_eq!(err, BusinessError::UnknownTarget);
    }

    #[test]
    fn unregister_then_login_restores_occupancy() {
        let registry = Registry::new(8);
        let alice = login(&registry, "alice");
        assert_eq!(registry.len(), 1);
        unregister(&registry, alice);
        assert_eq!(registry.len(), 0);
    }
}
