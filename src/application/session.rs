use crate::application::resolver::OutstandingResolver;
use crate::domain::payment::PaymentRecord;
use crate::domain::ports::{PaymentStoreRef, StudentStoreRef};
use crate::domain::session::{HandshakeSession, SessionId, SessionState};
use crate::domain::student::{OperatorId, StudentId};
use crate::error::{BillingError, Result};
use crate::interfaces::transport::{ServerEvent, SessionOutcome, StudentReceiver, TransportRef};
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Bounded waits of the handshake: how long an unclaimed session waits for
/// any operator, and how long a claimed session waits for the decision.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub claim_timeout: Duration,
    pub decide_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            claim_timeout: Duration::from_secs(120),
            decide_timeout: Duration::from_secs(90),
        }
    }
}

/// Handle returned to the student client: the session id plus the event
/// stream the terminal outcome arrives on.
pub struct OpenedSession {
    pub id: SessionId,
    pub events: StudentReceiver,
}

type SessionSlot = Arc<Mutex<HandshakeSession>>;

/// Owns every live scan-to-confirm session.
///
/// The active set is a map from session id to a per-session mutex; every
/// mutating operation on one session (claim, decide, cancel, expiry,
/// disconnect) serializes on that mutex, while different sessions proceed in
/// parallel. Entries leave the map exactly once, on transition into `Closed`.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    resolver: OutstandingResolver,
    payments: PaymentStoreRef,
    transport: TransportRef,
    sessions: RwLock<HashMap<SessionId, SessionSlot>>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        students: StudentStoreRef,
        payments: PaymentStoreRef,
        transport: TransportRef,
        config: SessionConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                resolver: OutstandingResolver::new(students, Arc::clone(&payments)),
                payments,
                transport,
                sessions: RwLock::new(HashMap::new()),
                config,
            }),
        }
    }

    /// Starts a handshake for a scanned student.
    ///
    /// Resolves the outstanding charge first: a fully settled profile fails
    /// with `NothingDue`, a frozen one with `ProfileInactive`. On success the
    /// session is announced to all operator clients and starts its claim wait.
    pub async fn open_session(&self, student: StudentId, as_of: NaiveDate) -> Result<OpenedSession> {
        let charge = self
            .inner
            .resolver
            .resolve(&student, as_of)
            .await?
            .ok_or(BillingError::NothingDue)?;

        let id = SessionId::generate();
        let now = Utc::now();
        let mut session = HandshakeSession::open(id, student.clone(), charge.period, charge.amount_due, now);
        let events = self.inner.transport.open_student_channel(id).await?;

        // Identity and charge are known: the session stops connecting and
        // starts waiting for a claim before it becomes visible to operators.
        session.state = SessionState::AwaitingOperator;
        self.inner
            .sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));

        let announce = self
            .inner
            .transport
            .publish_to_operators(ServerEvent::PendingCharge {
                session_id: id,
                student: student.clone(),
                period: charge.period,
                amount_due: charge.amount_due,
            })
            .await;
        if let Err(e) = announce {
            self.inner.sessions.write().await.remove(&id);
            self.inner.transport.close_student_channel(id).await;
            return Err(e);
        }

        info!(
            session = %id,
            student = %student,
            period = charge.period.ordinal,
            amount = %charge.amount_due,
            "session awaiting operator"
        );
        self.spawn_expiry_watch(id, self.inner.config.claim_timeout, SessionState::AwaitingOperator);
        Ok(OpenedSession { id, events })
    }

    /// Binds the session exclusively to `operator`. First claim wins; a
    /// repeated claim by the winner is a no-op, anyone else gets
    /// `AlreadyClaimed`, and terminal or unknown sessions get `SessionClosed`.
    pub async fn claim(&self, id: SessionId, operator: OperatorId) -> Result<()> {
        let slot = self.session_slot(id).await.ok_or(BillingError::SessionClosed)?;
        let mut session = slot.lock().await;
        match session.state {
            SessionState::AwaitingOperator => {
                session.operator = Some(operator.clone());
                session.state = SessionState::Claimed;
                session.touch(Utc::now());
                drop(session);
                info!(session = %id, operator = %operator, "session claimed");
                self.spawn_expiry_watch(id, self.inner.config.decide_timeout, SessionState::Claimed);
                Ok(())
            }
            // The transport may redeliver a claim that already succeeded.
            SessionState::Claimed if session.operator.as_ref() == Some(&operator) => Ok(()),
            SessionState::Claimed => Err(BillingError::AlreadyClaimed),
            _ => Err(BillingError::SessionClosed),
        }
    }

    /// Settles the session. Only the claiming operator may decide. On
    /// approval the payment record is written before anything else happens;
    /// if that write fails the session stays `Claimed` and the error
    /// surfaces to the operator, never silently retried.
    pub async fn decide(&self, id: SessionId, operator: OperatorId, approve: bool) -> Result<()> {
        let slot = self.session_slot(id).await.ok_or(BillingError::SessionClosed)?;
        let mut session = slot.lock().await;
        match session.state {
            SessionState::Claimed => {
                if session.operator.as_ref() != Some(&operator) {
                    return Err(BillingError::NotClaimant);
                }

                let outcome = if approve {
                    let record = PaymentRecord::confirmed(
                        session.student.clone(),
                        session.period,
                        session.amount_due,
                        operator.clone(),
                        Utc::now(),
                    );
                    // Write happens-before notify: the student must never
                    // observe `confirmed` without a durable record behind it.
                    self.inner.payments.create_payment(record).await?;
                    session.state = SessionState::Confirmed;
                    info!(session = %id, operator = %operator, "charge confirmed");
                    SessionOutcome::Confirmed
                } else {
                    session.state = SessionState::Rejected;
                    info!(session = %id, operator = %operator, "charge rejected");
                    SessionOutcome::Rejected
                };
                session.touch(Utc::now());

                let event = ServerEvent::Outcome {
                    session_id: id,
                    outcome,
                    period: Some(session.period),
                };
                drop(session);
                self.deliver_outcome_and_close(id, &slot, event).await;
                Ok(())
            }
            SessionState::AwaitingOperator => Err(BillingError::NotClaimant),
            _ => Err(BillingError::SessionClosed),
        }
    }

    /// Student-initiated withdrawal, only valid while no operator holds the
    /// session. A claimed session can only end through the claimant's
    /// decision or the decision timeout.
    pub async fn cancel(&self, id: SessionId) -> Result<()> {
        let slot = self.session_slot(id).await.ok_or(BillingError::SessionClosed)?;
        let session = slot.lock().await;
        match session.state {
            SessionState::Connecting | SessionState::AwaitingOperator => {
                drop(session);
                info!(session = %id, "session cancelled by student");
                self.close(id, &slot).await;
                Ok(())
            }
            SessionState::Claimed => Err(BillingError::AlreadyClaimed),
            _ => Err(BillingError::SessionClosed),
        }
    }

    /// Transport dropped before a terminal decision: the session errors out,
    /// the student (if still reachable) is told to retry, and no payment
    /// record is written.
    pub async fn client_disconnected(&self, id: SessionId) {
        let Some(slot) = self.session_slot(id).await else {
            return;
        };
        let mut session = slot.lock().await;
        if session.state.is_terminal() {
            return;
        }
        session.state = SessionState::Errored;
        session.touch(Utc::now());
        warn!(session = %id, "transport dropped before a decision");

        let event = ServerEvent::Outcome {
            session_id: id,
            outcome: SessionOutcome::Error,
            period: None,
        };
        drop(session);
        self.deliver_outcome_and_close(id, &slot, event).await;
    }

    /// Number of sessions still held in active memory.
    pub async fn active_session_count(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    /// Current state of a live session, if it is still in the active set.
    pub async fn session_state(&self, id: SessionId) -> Option<SessionState> {
        let slot = self.session_slot(id).await?;
        let session = slot.lock().await;
        Some(session.state)
    }

    async fn session_slot(&self, id: SessionId) -> Option<SessionSlot> {
        self.inner.sessions.read().await.get(&id).cloned()
    }

    fn spawn_expiry_watch(&self, id: SessionId, wait: Duration, expected: SessionState) {
        let manager = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            manager.expire_if_still(id, expected).await;
        });
    }

    /// Fires after a bounded wait: if the session still sits in the state
    /// the watchdog was armed for, it expires. Anything else means a claim
    /// or decision won the race and the watchdog stands down.
    async fn expire_if_still(&self, id: SessionId, expected: SessionState) {
        let Some(slot) = self.session_slot(id).await else {
            return;
        };
        let mut session = slot.lock().await;
        if session.state != expected {
            return;
        }
        session.state = SessionState::Expired;
        session.touch(Utc::now());
        warn!(session = %id, waited_in = ?expected, "session expired");

        let event = ServerEvent::Outcome {
            session_id: id,
            outcome: SessionOutcome::Expired,
            period: Some(session.period),
        };
        drop(session);
        self.deliver_outcome_and_close(id, &slot, event).await;
    }

    async fn deliver_outcome_and_close(&self, id: SessionId, slot: &SessionSlot, event: ServerEvent) {
        // Delivery is best-effort; any durable write already happened.
        if let Err(e) = self.inner.transport.publish_to_student(id, event).await {
            warn!(session = %id, error = %e, "could not deliver outcome to student");
        }
        self.close(id, slot).await;
    }

    async fn close(&self, id: SessionId, slot: &SessionSlot) {
        {
            let mut session = slot.lock().await;
            session.state = SessionState::Closed;
        }
        self.inner.sessions.write().await.remove(&id);
        self.inner.transport.close_student_channel(id).await;
        debug!(session = %id, "session closed and evicted");
    }
}
