//! Session directory: owns all session and participant records.
//!
//! Every mutation goes through one of the typed operations below, under a
//! single lock. Sessions hold at most two participants in insertion order;
//! the first member of a paired session is the negotiation initiator. A
//! session locks when it reaches two members, unlocks when one leaves, and
//! is deleted when the last member leaves.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use parley_common::{generate_code, normalize_code, PeerId, SessionError};

struct Session {
    /// Insertion order is authoritative: `participants[0]` is the initiator.
    participants: Vec<PeerId>,
    locked: bool,
}

struct Participant {
    code: Option<String>,
    tx: mpsc::UnboundedSender<String>,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, Session>,
    participants: HashMap<PeerId, Participant>,
}

/// A participant left a session (explicitly or by disconnect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub code: String,
    /// The member still in the session, if the session survived.
    pub remaining: Option<PeerId>,
}

#[derive(Debug)]
pub struct Created {
    pub code: String,
    /// Unwind of the session the caller was in before creating a new one.
    pub departed: Option<Departure>,
}

#[derive(Debug)]
pub struct Joined {
    pub code: String,
    /// Both members in insertion order, set on the join that pairs the
    /// session: `(initiator, joiner)`.
    pub ready: Option<(PeerId, PeerId)>,
    pub departed: Option<Departure>,
}

/// Thread-safe registry of sessions and connected participants.
#[derive(Clone)]
pub struct SessionDirectory {
    inner: Arc<Mutex<Inner>>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Register a new connection and its outbound sender.
    pub async fn register(&self, tx: mpsc::UnboundedSender<String>) -> PeerId {
        let peer = PeerId::new();
        let mut inner = self.inner.lock().await;
        inner
            .participants
            .insert(peer.clone(), Participant { code: None, tx });
        peer
    }

    /// Remove a connection: leave its session (if any) and drop the record.
    /// Idempotent; a second call for the same peer is a no-op.
    pub async fn unregister(&self, peer: &PeerId) -> Option<Departure> {
        let mut inner = self.inner.lock().await;
        let departed = inner.depart(peer);
        inner.participants.remove(peer);
        departed
    }

    /// Create a fresh session with the caller as sole participant. Re-rolls
    /// the code until it is unused. A caller already in a session leaves it
    /// first.
    pub async fn create(&self, peer: &PeerId) -> Created {
        let mut inner = self.inner.lock().await;
        let departed = inner.depart(peer);

        let code = loop {
            let code = generate_code();
            if !inner.sessions.contains_key(&code) {
                break code;
            }
        };

        inner.sessions.insert(
            code.clone(),
            Session {
                participants: vec![peer.clone()],
                locked: false,
            },
        );
        if let Some(p) = inner.participants.get_mut(peer) {
            p.code = Some(code.clone());
        }

        Created { code, departed }
    }

    /// Join an existing session. The join that brings the count to two locks
    /// the session and reports both members so readiness can be broadcast.
    pub async fn join(&self, peer: &PeerId, code: &str) -> Result<Joined, SessionError> {
        let code = normalize_code(code);
        let mut inner = self.inner.lock().await;

        {
            let session = inner.sessions.get(&code).ok_or(SessionError::NotFound)?;
            if session.participants.contains(peer) {
                // Already a member; nothing to change.
                return Ok(Joined {
                    code,
                    ready: None,
                    departed: None,
                });
            }
            if session.participants.len() >= 2 {
                return Err(SessionError::Full);
            }
            if session.locked {
                return Err(SessionError::Locked);
            }
        }

        // Validated: leave any previous session, then take the open slot.
        let departed = inner.depart(peer);
        let ready = match inner.sessions.get_mut(&code) {
            Some(session) => {
                session.participants.push(peer.clone());
                if session.participants.len() == 2 {
                    session.locked = true;
                    Some((
                        session.participants[0].clone(),
                        session.participants[1].clone(),
                    ))
                } else {
                    None
                }
            }
            None => None,
        };
        if let Some(p) = inner.participants.get_mut(peer) {
            p.code = Some(code.clone());
        }

        Ok(Joined {
            code,
            ready,
            departed,
        })
    }

    /// Remove the participant from its session, if any. The connection stays
    /// registered.
    pub async fn leave(&self, peer: &PeerId) -> Option<Departure> {
        self.inner.lock().await.depart(peer)
    }

    /// The code of the session the participant currently belongs to.
    pub async fn lookup(&self, peer: &PeerId) -> Option<String> {
        self.inner.lock().await.participants.get(peer)?.code.clone()
    }

    /// The other member of the participant's session, if paired.
    pub async fn counterpart(&self, peer: &PeerId) -> Option<PeerId> {
        let inner = self.inner.lock().await;
        let code = inner.participants.get(peer)?.code.as_ref()?;
        let session = inner.sessions.get(code)?;
        session.participants.iter().find(|p| *p != peer).cloned()
    }

    /// Resolve a live outbound sender. `None` if the peer is gone.
    pub async fn sender(&self, peer: &PeerId) -> Option<mpsc::UnboundedSender<String>> {
        Some(self.inner.lock().await.participants.get(peer)?.tx.clone())
    }

    #[cfg(test)]
    pub(crate) async fn force_lock(&self, code: &str) {
        if let Some(s) = self.inner.lock().await.sessions.get_mut(code) {
            s.locked = true;
        }
    }

    #[cfg(test)]
    pub(crate) async fn session_size(&self, code: &str) -> Option<usize> {
        Some(self.inner.lock().await.sessions.get(code)?.participants.len())
    }

    #[cfg(test)]
    pub(crate) async fn is_locked(&self, code: &str) -> Option<bool> {
        Some(self.inner.lock().await.sessions.get(code)?.locked)
    }
}

impl Default for SessionDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    /// Shared leave path for explicit leave, disconnect, and implicit leave
    /// on create/join. Deletes an emptied session, unlocks a surviving one.
    fn depart(&mut self, peer: &PeerId) -> Option<Departure> {
        let code = self.participants.get_mut(peer)?.code.take()?;
        let session = self.sessions.get_mut(&code)?;
        session.participants.retain(|p| p != peer);
        if session.participants.is_empty() {
            self.sessions.remove(&code);
            Some(Departure {
                code,
                remaining: None,
            })
        } else {
            session.locked = false;
            let remaining = session.participants.first().cloned();
            Some(Departure { code, remaining })
        }
    }
}
