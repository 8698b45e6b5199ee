use serde::{Deserialize, Serialize};

/// Why a session operation was refused. All variants are recoverable
/// and reported only to the offending connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error,
)]
#[serde(rename_all = "kebab-case")]
pub enum SessionError {
    /// No session has the given code.
    #[error("session not found")]
    NotFound,

    /// The session already has two participants.
    #[error("session is full")]
    Full,

    /// A call is in progress; no third participant may join.
    #[error("session is in an active call")]
    Locked,

    /// The sender does not belong to the session it claims.
    #[error("not a member of this session")]
    Unauthorized,
}
