use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::domain::period::PeriodKey;
use crate::domain::student::{Amount, OperatorId, StudentId};
use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct PaymentRow {
    student: String,
    ordinal: u32,
    period_start: NaiveDate,
    amount: Decimal,
    status: PaymentStatus,
    paid_at: Option<DateTime<Utc>>,
    confirmed_by: Option<String>,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = crate::error::BillingError;

    fn try_from(row: PaymentRow) -> Result<PaymentRecord> {
        Ok(PaymentRecord {
            student: StudentId(row.student),
            period: PeriodKey {
                ordinal: row.ordinal,
                start: row.period_start,
            },
            amount: Amount::new(row.amount)?,
            status: row.status,
            paid_at: row.paid_at,
            confirmed_by: row.confirmed_by.map(OperatorId),
        })
    }
}

/// Reads previously recorded payments from a ledger CSV.
///
/// Columns: `student, ordinal, period_start, amount, status, paid_at,
/// confirmed_by` — the last two may be empty.
pub struct PaymentReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PaymentReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn payments(self) -> impl Iterator<Item = Result<PaymentRecord>> {
        self.reader
            .into_deserialize::<PaymentRow>()
            .map(|result| result.map_err(crate::error::BillingError::from).and_then(TryInto::try_into))
    }
}
