use clap::Parser;
use miette::{IntoDiagnostic, Result};
use scholarpay::application::session::{SessionConfig, SessionManager};
use scholarpay::domain::ports::{PaymentStore, PaymentStoreRef, StudentStore, StudentStoreRef};
use scholarpay::domain::student::{OperatorId, StudentId};
use scholarpay::infrastructure::in_memory::{InMemoryPaymentStore, InMemoryStudentStore};
use scholarpay::interfaces::csv::payment_reader::PaymentReader;
use scholarpay::interfaces::csv::payment_writer::PaymentWriter;
use scholarpay::interfaces::csv::roster_reader::RosterReader;
use scholarpay::interfaces::transport::{ChannelTransport, TransportRef};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Runs one scan-to-confirm handshake against an in-memory desk.
///
/// Loads the roster (and optionally a prior payment ledger), opens a session
/// for the given student, lets the chosen decision play out, and prints every
/// transport event as a JSON line followed by the final ledger as CSV.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Student roster CSV file
    roster: PathBuf,

    /// Previously recorded payments CSV (optional)
    #[arg(long)]
    payments: Option<PathBuf>,

    /// Student presenting the scan
    #[arg(long)]
    student: String,

    /// Operator answering the pending charge
    #[arg(long, default_value = "op-desk")]
    operator: String,

    /// Evaluation date (defaults to today)
    #[arg(long)]
    as_of: Option<chrono::NaiveDate>,

    /// What the operator does with the charge
    #[arg(long, value_enum, default_value = "approve")]
    decision: Decision,

    /// How long an unclaimed session waits before expiring
    #[arg(long, default_value_t = 2000)]
    claim_timeout_ms: u64,

    /// How long a claimed session waits for the decision
    #[arg(long, default_value_t = 2000)]
    decide_timeout_ms: u64,
}

#[derive(Clone, Copy, PartialEq, clap::ValueEnum)]
enum Decision {
    Approve,
    Reject,
    /// Nobody claims; the session runs into the claim timeout.
    None,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let students = Arc::new(InMemoryStudentStore::new());
    let roster = File::open(&cli.roster).into_diagnostic()?;
    for profile in RosterReader::new(roster).profiles() {
        let profile = profile.into_diagnostic()?;
        students.store(profile).await.into_diagnostic()?;
    }

    let payments = Arc::new(InMemoryPaymentStore::new());
    if let Some(path) = &cli.payments {
        let ledger = File::open(path).into_diagnostic()?;
        for record in PaymentReader::new(ledger).payments() {
            let record = record.into_diagnostic()?;
            payments.create_payment(record).await.into_diagnostic()?;
        }
    }

    let transport = Arc::new(ChannelTransport::default());
    let manager = SessionManager::new(
        Arc::clone(&students) as StudentStoreRef,
        Arc::clone(&payments) as PaymentStoreRef,
        Arc::clone(&transport) as TransportRef,
        SessionConfig {
            claim_timeout: Duration::from_millis(cli.claim_timeout_ms),
            decide_timeout: Duration::from_millis(cli.decide_timeout_ms),
        },
    );

    let mut operator_feed = transport.subscribe_operators();
    let mut opened = manager
        .open_session(StudentId(cli.student.clone()), effective_as_of(&cli))
        .await
        .into_diagnostic()?;

    let pending = operator_feed.recv().await.into_diagnostic()?;
    println!("{}", serde_json::to_string(&pending).into_diagnostic()?);

    if cli.decision != Decision::None {
        let operator = OperatorId(cli.operator.clone());
        manager
            .claim(opened.id, operator.clone())
            .await
            .into_diagnostic()?;
        manager
            .decide(opened.id, operator, cli.decision == Decision::Approve)
            .await
            .into_diagnostic()?;
    }

    // With no decision the outcome arrives once the claim window lapses.
    if let Some(outcome) = opened.events.recv().await {
        println!("{}", serde_json::to_string(&outcome).into_diagnostic()?);
    }

    let ledger = payments.all_payments().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = PaymentWriter::new(stdout.lock());
    writer.write_payments(ledger).into_diagnostic()?;

    Ok(())
}

fn effective_as_of(cli: &Cli) -> chrono::NaiveDate {
    cli.as_of
        .unwrap_or_else(|| chrono::Utc::now().date_naive())
}
