use crate::domain::payment::PaymentRecord;
use crate::domain::period::PeriodKey;
use crate::domain::ports::{PaymentStore, StudentStore};
use crate::domain::student::{StudentBillingProfile, StudentId};
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for student billing profiles.
///
/// Uses `Arc<RwLock<HashMap>>` to allow shared concurrent access. Ideal for
/// testing or the demo driver where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryStudentStore {
    profiles: Arc<RwLock<HashMap<StudentId, StudentBillingProfile>>>,
}

impl InMemoryStudentStore {
    /// Creates a new, empty in-memory student store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StudentStore for InMemoryStudentStore {
    async fn get(&self, student: &StudentId) -> Result<Option<StudentBillingProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(student).cloned())
    }

    async fn store(&self, profile: StudentBillingProfile) -> Result<()> {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.student.clone(), profile);
        Ok(())
    }
}

/// A thread-safe in-memory store for payment records.
///
/// Records are keyed by `(student, period)`; writing the same key twice is a
/// conflict, which is what keeps a confirmed charge from double-billing.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    records: Arc<RwLock<HashMap<(StudentId, PeriodKey), PaymentRecord>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn find_payments(&self, student: &StudentId) -> Result<Vec<PaymentRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|record| &record.student == student)
            .cloned()
            .collect())
    }

    async fn create_payment(&self, record: PaymentRecord) -> Result<PaymentRecord> {
        let mut records = self.records.write().await;
        let key = (record.student.clone(), record.period);
        if records.contains_key(&key) {
            return Err(BillingError::PaymentConflict {
                student: record.student.0.clone(),
                ordinal: record.period.ordinal,
            });
        }
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn all_payments(&self) -> Result<Vec<PaymentRecord>> {
        let records = self.records.read().await;
        let mut all: Vec<PaymentRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| {
            (&a.student.0, a.period.start).cmp(&(&b.student.0, b.period.start))
        });
        Ok(all)
    }
}
