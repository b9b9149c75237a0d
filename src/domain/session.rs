use crate::domain::period::PeriodKey;
use crate::domain::student::{Amount, OperatorId, StudentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of one scan-to-confirm exchange.
///
/// `Connecting → AwaitingOperator → Claimed → {Confirmed | Rejected} → Closed`,
/// with `Expired` reachable from the two waiting states on timeout and
/// `Errored` reachable from any non-terminal state on transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    AwaitingOperator,
    Claimed,
    Confirmed,
    Rejected,
    Expired,
    Errored,
    Closed,
}

impl SessionState {
    /// True once no further operator or student action can change the outcome.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Confirmed
                | SessionState::Rejected
                | SessionState::Expired
                | SessionState::Errored
                | SessionState::Closed
        )
    }
}

/// One live scan-to-confirm handshake.
///
/// Owned exclusively by the session manager and never persisted; only the
/// payment record written on a confirmed approval survives it.
#[derive(Debug, Clone)]
pub struct HandshakeSession {
    pub id: SessionId,
    pub student: StudentId,
    pub period: PeriodKey,
    pub amount_due: Amount,
    pub state: SessionState,
    /// Set once an operator claims the session; exclusive from then on.
    pub operator: Option<OperatorId>,
    pub opened_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl HandshakeSession {
    pub fn open(
        id: SessionId,
        student: StudentId,
        period: PeriodKey,
        amount_due: Amount,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            student,
            period,
            amount_due,
            state: SessionState::Connecting,
            operator: None,
            opened_at: now,
            last_activity: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!SessionState::Connecting.is_terminal());
        assert!(!SessionState::AwaitingOperator.is_terminal());
        assert!(!SessionState::Claimed.is_terminal());
        assert!(SessionState::Confirmed.is_terminal());
        assert!(SessionState::Rejected.is_terminal());
        assert!(SessionState::Expired.is_terminal());
        assert!(SessionState::Errored.is_terminal());
        assert!(SessionState::Closed.is_terminal());
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}
