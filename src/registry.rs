// src/registry.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::engine::{ParticipantId, QuizSession, SessionState};

struct Slot {
    session: QuizSession,
    /// Set while the session's result is being written to storage.
    saving: bool,
}

/// Live sessions keyed by the id handed out at start.
///
/// A session is only visible to the participant that started it; lookups with
/// another participant id behave as if the session did not exist. Each
/// participant has at most one open session.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, Slot>>>,
}

/// Outcome of `SessionRegistry::checkout`.
#[derive(Debug, PartialEq, Eq)]
pub enum Checkout<T> {
    Missing,
    /// Another caller is saving this session's result.
    Busy,
    Ready(T),
}

/// Sessions picked out by `SessionRegistry::sweep`.
#[derive(Debug, Default)]
pub struct Sweep {
    /// Sessions to close and persist: finished but unsaved, or past the deadline.
    pub due: Vec<(Uuid, ParticipantId)>,
    /// Idle open sessions that were dropped.
    pub abandoned: usize,
}

fn owned_by(session: &QuizSession, participant_id: ParticipantId) -> bool {
    session.participant_id() == Some(participant_id)
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session under a fresh id.
    ///
    /// Any other open session of the same participant is dropped. Finished
    /// sessions stay until their result is saved.
    pub async fn insert(&self, session: QuizSession) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.lock().await;

        if let Some(participant_id) = session.participant_id() {
            sessions.retain(|_, slot| {
                slot.saving
                    || slot.session.state() != SessionState::Open
                    || !owned_by(&slot.session, participant_id)
            });
        }

        sessions.insert(
            id,
            Slot {
                session,
                saving: false,
            },
        );
        id
    }

    pub async fn inspect<T>(
        &self,
        id: Uuid,
        participant_id: ParticipantId,
        f: impl FnOnce(&QuizSession) -> T,
    ) -> Option<T> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&id)
            .map(|slot| &slot.session)
            .filter(|s| owned_by(s, participant_id))
            .map(f)
    }

    pub async fn update<T>(
        &self,
        id: Uuid,
        participant_id: ParticipantId,
        f: impl FnOnce(&mut QuizSession) -> T,
    ) -> Option<T> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .get_mut(&id)
            .map(|slot| &mut slot.session)
            .filter(|s| owned_by(s, participant_id))
            .map(f)
    }

    /// Runs `f` on a session nobody else is saving. When `f` succeeds the
    /// session is marked as being saved until `release` or `remove`.
    ///
    /// The session stays in the registry meanwhile, so concurrent requests
    /// still see it in its closed state.
    pub async fn checkout<T, E>(
        &self,
        id: Uuid,
        participant_id: ParticipantId,
        f: impl FnOnce(&mut QuizSession) -> Result<T, E>,
    ) -> Checkout<Result<T, E>> {
        let mut sessions = self.sessions.lock().await;
        let Some(slot) = sessions
            .get_mut(&id)
            .filter(|slot| owned_by(&slot.session, participant_id))
        else {
            return Checkout::Missing;
        };

        if slot.saving {
            return Checkout::Busy;
        }

        let outcome = f(&mut slot.session);
        slot.saving = outcome.is_ok();
        Checkout::Ready(outcome)
    }

    /// Clears the saving mark so the session can be checked out again.
    pub async fn release(&self, id: Uuid) {
        if let Some(slot) = self.sessions.lock().await.get_mut(&id) {
            slot.saving = false;
        }
    }

    pub async fn remove(&self, id: Uuid, participant_id: ParticipantId) -> Option<QuizSession> {
        let mut sessions = self.sessions.lock().await;
        let owned = sessions
            .get(&id)
            .is_some_and(|slot| owned_by(&slot.session, participant_id));

        if owned {
            sessions.remove(&id).map(|slot| slot.session)
        } else {
            None
        }
    }

    /// Finds the sessions that need closing at `now` and drops abandoned ones.
    ///
    /// Due sessions are finished sessions whose result has not been saved and,
    /// with a time limit, open sessions past their deadline. Open sessions that
    /// are not due and saw no activity for `idle_ttl_secs` are removed. Sessions
    /// being saved are left alone.
    pub async fn sweep(
        &self,
        now: DateTime<Utc>,
        time_limit: Option<u64>,
        idle_ttl_secs: u64,
    ) -> Sweep {
        let mut sessions = self.sessions.lock().await;
        let mut sweep = Sweep::default();

        sessions.retain(|id, slot| {
            if slot.saving {
                return true;
            }

            let session = &slot.session;
            let due = session.state() == SessionState::Finished
                || time_limit.is_some_and(|limit| session.is_expired(now, limit));

            if due {
                if let Some(participant_id) = session.participant_id() {
                    sweep.due.push((*id, participant_id));
                }
                true
            } else if session.is_idle(now, idle_ttl_secs) {
                sweep.abandoned += 1;
                false
            } else {
                true
            }
        });

        sweep
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
