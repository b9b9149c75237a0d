use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn roster_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "student, enrolled_on, scheme, fee, dropout_on, dropout_reason, reactivated_on"
    )
    .unwrap();
    writeln!(file, "s-001, 2024-01-01, every-28-days, 760.0, , , ").unwrap();
    writeln!(file, "s-002, 2024-01-01, weekly, 95.5, 2024-03-01, left program, ").unwrap();
    file
}

#[test]
fn test_approved_scan_writes_ledger() {
    let roster = roster_file();

    let mut cmd = Command::new(cargo_bin!("scholarpay"));
    cmd.arg(roster.path())
        .args(["--student", "s-001"])
        .args(["--as-of", "2024-02-15"])
        .args(["--operator", "op-7"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pending-charge"))
        .stdout(predicate::str::contains("\"outcome\":\"confirmed\""))
        .stdout(predicate::str::contains("s-001,0,2024-01-01,760.0,paid"))
        .stdout(predicate::str::contains("op-7"));
}

#[test]
fn test_rejected_scan_leaves_ledger_empty() {
    let roster = roster_file();

    let mut cmd = Command::new(cargo_bin!("scholarpay"));
    cmd.arg(roster.path())
        .args(["--student", "s-001"])
        .args(["--as-of", "2024-02-15"])
        .args(["--decision", "reject"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"outcome\":\"rejected\""))
        .stdout(predicate::str::contains(",paid,").not());
}

#[test]
fn test_unclaimed_scan_expires() {
    let roster = roster_file();

    let mut cmd = Command::new(cargo_bin!("scholarpay"));
    cmd.arg(roster.path())
        .args(["--student", "s-001"])
        .args(["--as-of", "2024-02-15"])
        .args(["--decision", "none"])
        .args(["--claim-timeout-ms", "200"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"outcome\":\"expired\""))
        .stdout(predicate::str::contains(",paid,").not());
}

#[test]
fn test_settled_student_has_nothing_due() {
    let roster = roster_file();

    let mut ledger = NamedTempFile::new().unwrap();
    writeln!(
        ledger,
        "student, ordinal, period_start, amount, status, paid_at, confirmed_by"
    )
    .unwrap();
    writeln!(ledger, "s-001, 0, 2024-01-01, 760.0, paid, , op-1").unwrap();
    writeln!(ledger, "s-001, 1, 2024-01-29, 760.0, paid, , op-1").unwrap();

    let mut cmd = Command::new(cargo_bin!("scholarpay"));
    cmd.arg(roster.path())
        .args(["--payments"])
        .arg(ledger.path())
        .args(["--student", "s-001"])
        .args(["--as-of", "2024-02-15"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no outstanding balance"));
}

#[test]
fn test_dropped_out_student_is_inactive() {
    let roster = roster_file();

    let mut cmd = Command::new(cargo_bin!("scholarpay"));
    cmd.arg(roster.path())
        .args(["--student", "s-002"])
        .args(["--as-of", "2024-04-01"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("inactive"));
}

#[test]
fn test_unknown_student_fails() {
    let roster = roster_file();

    let mut cmd = Command::new(cargo_bin!("scholarpay"));
    cmd.arg(roster.path()).args(["--student", "s-999"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no student profile"));
}
