//! Per-connection message dispatch: translates client messages into
//! directory operations and relays negotiation/chat traffic.
//!
//! Forwarding is non-blocking: messages are pushed into the destination's
//! outbound channel, and a vanished destination is a silent no-op. The
//! socket plumbing lives in `connection`; everything here is driveable with
//! in-memory channels.

use tokio::sync::mpsc;

use parley_common::{normalize_code, PeerId, SessionError};

use crate::directory::{Departure, SessionDirectory};
use crate::protocol::{ClientMessage, ServerMessage};

/// Where this connection stands in the offer/answer handshake it last sent.
/// Observability only; the relay never gates forwarding on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    AwaitingAnswer,
    Established,
}

/// One connected client's view of the relay.
pub struct Gateway {
    peer: PeerId,
    directory: SessionDirectory,
    negotiation: NegotiationState,
}

impl Gateway {
    /// Register a fresh connection with the directory.
    pub async fn connect(directory: SessionDirectory, tx: mpsc::UnboundedSender<String>) -> Self {
        let peer = directory.register(tx).await;
        Self {
            peer,
            directory,
            negotiation: NegotiationState::Idle,
        }
    }

    pub fn peer(&self) -> &PeerId {
        &self.peer
    }

    #[cfg(test)]
    pub(crate) fn negotiation_state(&self) -> NegotiationState {
        self.negotiation
    }

    /// Dispatch one inbound client message.
    pub async fn handle(&mut self, msg: ClientMessage) {
        match msg {
            ClientMessage::CreateSession => {
                let created = self.directory.create(&self.peer).await;
                if let Some(dep) = &created.departed {
                    self.notify_departure(dep).await;
                }
                self.advance(NegotiationState::Idle);
                tracing::info!(peer = %self.peer, session = %created.code, "Session created");
                self.send_self(&ServerMessage::SessionCreated { code: created.code })
                    .await;
            }

            ClientMessage::JoinSession { code } => {
                match self.directory.join(&self.peer, &code).await {
                    Ok(joined) => {
                        if let Some(dep) = &joined.departed {
                            self.notify_departure(dep).await;
                        }
                        self.advance(NegotiationState::Idle);
                        tracing::info!(peer = %self.peer, session = %joined.code, "Session joined");
                        self.send_self(&ServerMessage::SessionJoined {
                            code: joined.code.clone(),
                        })
                        .await;

                        // Pairing: readiness to both, negotiation kick-off to
                        // the first joiner only.
                        if let Some((initiator, joiner)) = joined.ready {
                            let ready = ServerMessage::SessionReady {
                                code: joined.code.clone(),
                            };
                            self.send(&initiator, &ready).await;
                            self.send(&joiner, &ready).await;
                            self.send(
                                &initiator,
                                &ServerMessage::StartNegotiation { target: joiner },
                            )
                            .await;
                        }
                    }
                    Err(reason) => {
                        tracing::debug!(peer = %self.peer, code = %code, %reason, "Join refused");
                        self.send_self(&ServerMessage::SessionError { reason }).await;
                    }
                }
            }

            ClientMessage::LeaveSession => {
                if let Some(dep) = self.directory.leave(&self.peer).await {
                    self.advance(NegotiationState::Idle);
                    tracing::info!(peer = %self.peer, session = %dep.code, "Session left");
                    self.notify_departure(&dep).await;
                }
            }

            ClientMessage::Ready => {
                if let Some(other) = self.directory.counterpart(&self.peer).await {
                    self.send(
                        &other,
                        &ServerMessage::PeerReady {
                            from: self.peer.clone(),
                        },
                    )
                    .await;
                }
            }

            // Negotiation kinds are a dumb pipe: payloads pass through
            // untouched, with the sender identity attached.
            ClientMessage::Offer { payload, to } => {
                self.send(
                    &to,
                    &ServerMessage::Offer {
                        payload,
                        from: self.peer.clone(),
                    },
                )
                .await;
                self.advance(NegotiationState::AwaitingAnswer);
            }

            ClientMessage::Answer { payload, to } => {
                self.send(
                    &to,
                    &ServerMessage::Answer {
                        payload,
                        from: self.peer.clone(),
                    },
                )
                .await;
                self.advance(NegotiationState::Established);
            }

            ClientMessage::Candidate { payload, to } => {
                self.send(
                    &to,
                    &ServerMessage::Candidate {
                        payload,
                        from: self.peer.clone(),
                    },
                )
                .await;
            }

            ClientMessage::Chat { text, code } => {
                let claimed = normalize_code(&code);
                let member_of = self.directory.lookup(&self.peer).await;
                if member_of.as_deref() == Some(claimed.as_str()) {
                    if let Some(other) = self.directory.counterpart(&self.peer).await {
                        self.send(
                            &other,
                            &ServerMessage::Chat {
                                text,
                                from: self.peer.clone(),
                            },
                        )
                        .await;
                    }
                } else {
                    tracing::debug!(peer = %self.peer, code = %claimed, "Chat claim rejected");
                    self.send_self(&ServerMessage::SessionError {
                        reason: SessionError::Unauthorized,
                    })
                    .await;
                }
            }
        }
    }

    /// Tear down the connection: leave the session and drop the record.
    /// Same directory path as an explicit leave.
    pub async fn disconnect(self) {
        if let Some(dep) = self.directory.unregister(&self.peer).await {
            self.notify_departure(&dep).await;
        }
    }

    async fn notify_departure(&self, dep: &Departure) {
        if let Some(remaining) = &dep.remaining {
            self.send(
                remaining,
                &ServerMessage::PeerDeparted {
                    id: self.peer.clone(),
                },
            )
            .await;
        }
    }

    async fn send(&self, to: &PeerId, msg: &ServerMessage) {
        if let Some(tx) = self.directory.sender(to).await {
            let json = serde_json::to_string(msg).unwrap();
            if tx.send(json).is_err() {
                tracing::debug!(peer = %to, "Outbound channel closed");
            }
        }
    }

    async fn send_self(&self, msg: &ServerMessage) {
        self.send(&self.peer, msg).await;
    }

    fn advance(&mut self, next: NegotiationState) {
        if self.negotiation != next {
            tracing::trace!(
                peer = %self.peer,
                from = ?self.negotiation,
                to = ?next,
                "Negotiation state"
            );
            self.negotiation = next;
        }
    }
}
