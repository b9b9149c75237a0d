use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BillingError>;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("no student profile found for '{0}'")]
    StudentNotFound(String),
    #[error("no outstanding balance for this student")]
    NothingDue,
    #[error("profile is inactive (dropped out on {0}, not reactivated)")]
    ProfileInactive(NaiveDate),

    #[error("session was already claimed by another operator")]
    AlreadyClaimed,
    #[error("only the claiming operator may decide this session")]
    NotClaimant,
    #[error("session is closed")]
    SessionClosed,

    #[error("a payment for student '{student}' period {ordinal} already exists")]
    PaymentConflict { student: String, ordinal: u32 },
    #[error("transport error: {0}")]
    Transport(String),
}
