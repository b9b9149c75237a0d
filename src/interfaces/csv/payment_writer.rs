use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::error::Result;
use std::io::Write;

/// Writes payment records as a ledger CSV, the mirror of `PaymentReader`.
pub struct PaymentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().from_writer(sink),
        }
    }

    pub fn write_payments(&mut self, records: Vec<PaymentRecord>) -> Result<()> {
        self.writer.write_record([
            "student",
            "ordinal",
            "period_start",
            "amount",
            "status",
            "paid_at",
            "confirmed_by",
        ])?;

        for record in records {
            let status = match record.status {
                PaymentStatus::Paid => "paid",
                PaymentStatus::Pending => "pending",
                PaymentStatus::Overdue => "overdue",
            };
            self.writer.write_record([
                record.student.0.as_str(),
                &record.period.ordinal.to_string(),
                &record.period.start.to_string(),
                &record.amount.value().to_string(),
                status,
                &record
                    .paid_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default(),
                record
                    .confirmed_by
                    .as_ref()
                    .map(|op| op.0.as_str())
                    .unwrap_or(""),
            ])?;
        }

        self.writer.flush()?;
        Ok(())
    }
}
