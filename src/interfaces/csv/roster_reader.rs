use crate::domain::student::{
    Amount, DropoutRecord, Scheme, StudentBillingProfile, StudentId,
};
use crate::error::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct RosterRow {
    student: String,
    enrolled_on: NaiveDate,
    scheme: Scheme,
    fee: Decimal,
    dropout_on: Option<NaiveDate>,
    dropout_reason: Option<String>,
    reactivated_on: Option<NaiveDate>,
}

impl TryFrom<RosterRow> for StudentBillingProfile {
    type Error = crate::error::BillingError;

    fn try_from(row: RosterRow) -> Result<StudentBillingProfile> {
        let mut profile = StudentBillingProfile::new(
            StudentId(row.student),
            row.enrolled_on,
            row.scheme,
            Amount::new(row.fee)?,
        );
        profile.reactivated_on = row.reactivated_on;
        if let Some(date) = row.dropout_on {
            profile.dropout = Some(DropoutRecord {
                date,
                reason: row.dropout_reason.unwrap_or_default(),
            });
        }
        Ok(profile)
    }
}

/// Reads student billing profiles from a roster CSV.
///
/// Columns: `student, enrolled_on, scheme, fee, dropout_on, dropout_reason,
/// reactivated_on` — the last three may be empty. Wraps `csv::Reader` and
/// provides an iterator over `Result<StudentBillingProfile>` with whitespace
/// trimming and flexible record lengths.
pub struct RosterReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RosterReader<R> {
    /// Creates a new `RosterReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and converts roster rows.
    pub fn profiles(self) -> impl Iterator<Item = Result<StudentBillingProfile>> {
        self.reader
            .into_deserialize::<RosterRow>()
            .map(|result| result.map_err(crate::error::BillingError::from).and_then(TryInto::try_into))
    }
}
