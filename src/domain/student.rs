use crate::error::{BillingError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier a student presents at the desk (badge number or QR payload).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentId(pub String);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identity of the operator confirming or rejecting a charge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatorId(pub String);

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OperatorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Billing cadence: how long one tuition period lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Daily,
    Weekly,
    Biweekly,
    #[serde(rename = "every-28-days")]
    Every28Days,
}

impl Scheme {
    /// Period length in whole calendar days.
    pub fn span_days(self) -> i64 {
        match self {
            Scheme::Daily => 1,
            Scheme::Weekly => 7,
            Scheme::Biweekly => 14,
            Scheme::Every28Days => 28,
        }
    }
}

/// Represents a positive monetary amount for tuition fees.
///
/// Ensures that fee and payment amounts are always positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(BillingError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = BillingError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recorded dropout event. Freezes period generation at its date until
/// the student is reactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropoutRecord {
    pub date: NaiveDate,
    pub reason: String,
}

/// Billing profile of one student.
///
/// `enrolled_on` is the anchor the period calculator counts from. A
/// reactivation replaces the anchor; periods opened under a previous anchor
/// are frozen and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentBillingProfile {
    pub student: StudentId,
    /// Anchor date of the current enrollment window.
    pub enrolled_on: NaiveDate,
    pub scheme: Scheme,
    /// Fee charged per billing period.
    pub fee: Amount,
    /// Present while the student is dropped out and not yet reactivated.
    pub dropout: Option<DropoutRecord>,
    /// Most recent reactivation, if any.
    pub reactivated_on: Option<NaiveDate>,
}

impl StudentBillingProfile {
    pub fn new(student: StudentId, enrolled_on: NaiveDate, scheme: Scheme, fee: Amount) -> Self {
        Self {
            student,
            enrolled_on,
            scheme,
            fee,
            dropout: None,
            reactivated_on: None,
        }
    }

    /// Records a dropout. Periods starting after `date` stop being generated.
    pub fn drop_out(&mut self, date: NaiveDate, reason: impl Into<String>) {
        self.dropout = Some(DropoutRecord {
            date,
            reason: reason.into(),
        });
    }

    /// Re-enrolls the student. The reactivation date becomes the new anchor
    /// and ordinal numbering restarts at 0.
    pub fn reactivate(&mut self, date: NaiveDate) {
        self.enrolled_on = date;
        self.reactivated_on = Some(date);
        self.dropout = None;
    }

    /// True when the profile has an unreactivated dropout and `as_of` lies
    /// after it. Frozen profiles have no collectible balance.
    pub fn is_frozen(&self, as_of: NaiveDate) -> bool {
        match &self.dropout {
            Some(record) => as_of > record.date,
            None => false,
        }
    }
}
