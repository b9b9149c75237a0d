use crate::domain::period::PeriodKey;
use crate::domain::session::SessionId;
use crate::domain::student::{Amount, StudentId};
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, mpsc};

/// Terminal outcome delivered to the student client. Rejected, expired and
/// error are distinct on the wire and must never be collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    Confirmed,
    Rejected,
    Expired,
    Error,
}

/// Server-published transport events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Broadcast to every connected operator when a session starts waiting.
    PendingCharge {
        session_id: SessionId,
        student: StudentId,
        period: PeriodKey,
        amount_due: Amount,
    },
    /// Sent to the waiting student when the session reaches a terminal state.
    Outcome {
        session_id: SessionId,
        outcome: SessionOutcome,
        period: Option<PeriodKey>,
    },
}

pub type StudentReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// Duplex publish/subscribe channel between the session manager and its
/// clients: at-least-once best-effort delivery, ordered per connection,
/// nothing ordered across connections.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Opens the per-session channel the student client listens on.
    async fn open_student_channel(&self, session: SessionId) -> Result<StudentReceiver>;
    async fn publish_to_operators(&self, event: ServerEvent) -> Result<()>;
    async fn publish_to_student(&self, session: SessionId, event: ServerEvent) -> Result<()>;
    async fn close_student_channel(&self, session: SessionId);
}

pub type TransportRef = Arc<dyn RealtimeTransport>;

/// In-process transport: a broadcast channel fans pending charges out to
/// operator clients, and each student gets an unbounded per-session channel.
pub struct ChannelTransport {
    operators: broadcast::Sender<ServerEvent>,
    students: RwLock<HashMap<SessionId, mpsc::UnboundedSender<ServerEvent>>>,
}

impl ChannelTransport {
    pub fn new(operator_capacity: usize) -> Self {
        let (operators, _) = broadcast::channel(operator_capacity);
        Self {
            operators,
            students: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribes an operator client to the pending-charge feed.
    pub fn subscribe_operators(&self) -> broadcast::Receiver<ServerEvent> {
        self.operators.subscribe()
    }
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl RealtimeTransport for ChannelTransport {
    async fn open_student_channel(&self, session: SessionId) -> Result<StudentReceiver> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.students.write().await.insert(session, sender);
        Ok(receiver)
    }

    async fn publish_to_operators(&self, event: ServerEvent) -> Result<()> {
        // A send error only means no operator is subscribed right now;
        // the claim timeout handles sessions nobody picks up.
        let _ = self.operators.send(event);
        Ok(())
    }

    async fn publish_to_student(&self, session: SessionId, event: ServerEvent) -> Result<()> {
        let students = self.students.read().await;
        let sender = students
            .get(&session)
            .ok_or_else(|| BillingError::Transport(format!("no student channel for {session}")))?;
        sender
            .send(event)
            .map_err(|_| BillingError::Transport(format!("student client for {session} is gone")))
    }

    async fn close_student_channel(&self, session: SessionId) {
        self.students.write().await.remove(&session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::student::Amount;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn pending(session: SessionId) -> ServerEvent {
        ServerEvent::PendingCharge {
            session_id: session,
            student: StudentId::from("s-001"),
            period: PeriodKey {
                ordinal: 0,
                start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            },
            amount_due: Amount::new(dec!(760.0)).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_operator_broadcast_fans_out() {
        let transport = ChannelTransport::default();
        let mut a = transport.subscribe_operators();
        let mut b = transport.subscribe_operators();

        let session = SessionId::generate();
        transport.publish_to_operators(pending(session)).await.unwrap();

        assert_eq!(a.recv().await.unwrap(), pending(session));
        assert_eq!(b.recv().await.unwrap(), pending(session));
    }

    #[tokio::test]
    async fn test_student_channel_roundtrip() {
        let transport = ChannelTransport::default();
        let session = SessionId::generate();
        let mut receiver = transport.open_student_channel(session).await.unwrap();

        let event = ServerEvent::Outcome {
            session_id: session,
            outcome: SessionOutcome::Confirmed,
            period: None,
        };
        transport.publish_to_student(session, event.clone()).await.unwrap();
        assert_eq!(receiver.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_publish_to_dropped_student_fails() {
        let transport = ChannelTransport::default();
        let session = SessionId::generate();
        let receiver = transport.open_student_channel(session).await.unwrap();
        drop(receiver);

        let event = ServerEvent::Outcome {
            session_id: session,
            outcome: SessionOutcome::Error,
            period: None,
        };
        let result = transport.publish_to_student(session, event).await;
        assert!(matches!(result, Err(BillingError::Transport(_))));
    }

    #[tokio::test]
    async fn test_closed_channel_is_unknown() {
        let transport = ChannelTransport::default();
        let session = SessionId::generate();
        let _receiver = transport.open_student_channel(session).await.unwrap();
        transport.close_student_channel(session).await;

        let event = ServerEvent::Outcome {
            session_id: session,
            outcome: SessionOutcome::Expired,
            period: None,
        };
        assert!(transport.publish_to_student(session, event).await.is_err());
    }

    #[test]
    fn test_event_wire_shape() {
        let session = SessionId::generate();
        let json = serde_json::to_value(pending(session)).unwrap();
        assert_eq!(json["type"], "pending-charge");
        assert_eq!(json["student"], "s-001");

        let outcome = ServerEvent::Outcome {
            session_id: session,
            outcome: SessionOutcome::Expired,
            period: None,
        };
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["type"], "outcome");
        assert_eq!(json["outcome"], "expired");
    }
}
