use super::payment::PaymentRecord;
use super::student::{StudentBillingProfile, StudentId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn get(&self, student: &StudentId) -> Result<Option<StudentBillingProfile>>;
    async fn store(&self, profile: StudentBillingProfile) -> Result<()>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// All payment records for one student, any status.
    async fn find_payments(&self, student: &StudentId) -> Result<Vec<PaymentRecord>>;
    /// Writes a new record. Fails with `PaymentConflict` when a record for
    /// the same student and period already exists.
    async fn create_payment(&self, record: PaymentRecord) -> Result<PaymentRecord>;
    /// Every record in the store, for ledger output.
    async fn all_payments(&self) -> Result<Vec<PaymentRecord>>;
}

pub type StudentStoreRef = Arc<dyn StudentStore>;
pub type PaymentStoreRef = Arc<dyn PaymentStore>;
