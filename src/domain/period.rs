use crate::domain::student::{Scheme, StudentBillingProfile};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Identifies one billing period of an enrollment window.
///
/// The ordinal counts from 0 at the anchor date. The start date is carried
/// alongside it so keys stay unambiguous when a reactivation re-anchors the
/// profile and restarts ordinal numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub ordinal: u32,
    pub start: NaiveDate,
}

impl PeriodKey {
    /// First day no longer covered by this period.
    pub fn end_exclusive(&self, scheme: Scheme) -> NaiveDate {
        self.start + Duration::days(scheme.span_days())
    }
}

/// Returns every period of the window anchored at `anchor` whose start date
/// is on or before `as_of`, ordinal ascending from 0.
///
/// Period `n` spans `[anchor + n*span, anchor + (n+1)*span)`. All arithmetic
/// is in whole calendar days; dates are calendar days, not instants, so no
/// timezone shifting can move a period edge.
pub fn periods_open(anchor: NaiveDate, scheme: Scheme, as_of: NaiveDate) -> Vec<PeriodKey> {
    if as_of < anchor {
        return Vec::new();
    }

    let span = scheme.span_days();
    let last_ordinal = as_of.signed_duration_since(anchor).num_days() / span;

    (0..=last_ordinal)
        .map(|n| PeriodKey {
            ordinal: n as u32,
            start: anchor + Duration::days(n * span),
        })
        .collect()
}

/// Periods open for a profile, honoring its dropout record: generation stops
/// at the last period whose start is on or before the dropout date, no matter
/// how far `as_of` advances.
pub fn periods_open_for(profile: &StudentBillingProfile, as_of: NaiveDate) -> Vec<PeriodKey> {
    let cutoff = match &profile.dropout {
        Some(record) => record.date.min(as_of),
        None => as_of,
    };
    periods_open(profile.enrolled_on, profile.scheme, cutoff)
}
