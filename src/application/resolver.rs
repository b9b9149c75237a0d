use crate::domain::payment::PaymentRecord;
use crate::domain::period::{PeriodKey, periods_open_for};
use crate::domain::ports::{PaymentStoreRef, StudentStoreRef};
use crate::domain::student::{Amount, StudentBillingProfile, StudentId};
use crate::error::{BillingError, Result};
use chrono::NaiveDate;
use std::collections::HashSet;

/// The earliest unpaid billing period of a profile and the fee due for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutstandingCharge {
    pub period: PeriodKey,
    pub amount_due: Amount,
}

/// Determines what a student owes as of a given date.
///
/// Open periods minus the settled ones; the earliest remaining ordinal wins.
/// Settlement is sequential: a later period is never offered for payment
/// while an earlier one is unpaid. Returns `None` when fully settled.
pub fn resolve_outstanding(
    profile: &StudentBillingProfile,
    payments: &[PaymentRecord],
    as_of: NaiveDate,
) -> Result<Option<OutstandingCharge>> {
    if let Some(record) = &profile.dropout
        && profile.is_frozen(as_of)
    {
        return Err(BillingError::ProfileInactive(record.date));
    }

    let settled: HashSet<PeriodKey> = payments
        .iter()
        .filter(|record| record.is_settled())
        .map(|record| record.period)
        .collect();

    let due = periods_open_for(profile, as_of)
        .into_iter()
        .find(|key| !settled.contains(key));

    Ok(due.map(|period| OutstandingCharge {
        period,
        amount_due: profile.fee,
    }))
}

/// Store-backed resolver used by the session manager.
#[derive(Clone)]
pub struct OutstandingResolver {
    students: StudentStoreRef,
    payments: PaymentStoreRef,
}

impl OutstandingResolver {
    pub fn new(students: StudentStoreRef, payments: PaymentStoreRef) -> Self {
        Self { students, payments }
    }

    pub async fn resolve(
        &self,
        student: &StudentId,
        as_of: NaiveDate,
    ) -> Result<Option<OutstandingCharge>> {
        let profile = self
            .students
            .get(student)
            .await?
            .ok_or_else(|| BillingError::StudentNotFound(student.0.clone()))?;
        let history = self.payments.find_payments(student).await?;
        resolve_outstanding(&profile, &history, as_of)
    }
}
