use crate::domain::period::PeriodKey;
use crate::domain::student::{Amount, OperatorId, StudentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Overdue,
}

/// One recorded tuition payment, keyed by student and billing period.
///
/// The persistence collaborator owns these; the core reads them to subtract
/// settled periods and writes one on a confirmed approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub student: StudentId,
    pub period: PeriodKey,
    pub amount: Amount,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<OperatorId>,
}

impl PaymentRecord {
    /// A settled record as written after an operator confirms a charge.
    pub fn confirmed(
        student: StudentId,
        period: PeriodKey,
        amount: Amount,
        operator: OperatorId,
        paid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            student,
            period,
            amount,
            status: PaymentStatus::Paid,
            paid_at: Some(paid_at),
            confirmed_by: Some(operator),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_serde_names() {
        assert_eq!(serde_json::to_string(&PaymentStatus::Paid).unwrap(), "\"paid\"");
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Overdue).unwrap(),
            "\"overdue\""
        );
        let parsed: PaymentStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, PaymentStatus::Pending);
    }

    #[test]
    fn test_confirmed_record_is_settled() {
        let record = PaymentRecord::confirmed(
            StudentId::from("s-001"),
            PeriodKey {
                ordinal: 3,
                start: NaiveDate::from_ymd_opt(2024, 1, 22).unwrap(),
            },
            Amount::new(dec!(760.0)).unwrap(),
            OperatorId::from("op-1"),
            Utc::now(),
        );
        assert!(record.is_settled());
        assert_eq!(record.confirmed_by, Some(OperatorId::from("op-1")));
    }
}
