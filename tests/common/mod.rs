use chrono::NaiveDate;
use rust_decimal_macros::dec;
use scholarpay::application::session::{SessionConfig, SessionManager};
use scholarpay::domain::ports::{PaymentStoreRef, StudentStore, StudentStoreRef};
use scholarpay::domain::student::{Amount, Scheme, StudentBillingProfile, StudentId};
use scholarpay::infrastructure::in_memory::{InMemoryPaymentStore, InMemoryStudentStore};
use scholarpay::interfaces::transport::{ChannelTransport, TransportRef};
use std::sync::Arc;

pub struct Desk {
    pub manager: SessionManager,
    pub transport: Arc<ChannelTransport>,
    pub students: Arc<InMemoryStudentStore>,
    pub payments: Arc<InMemoryPaymentStore>,
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Desk seeded with three students: s-001 on the 28-day scheme (760 per
/// period, anchored 2024-01-01), s-002 weekly (95.5, anchored 2024-02-01),
/// and s-003 dropped out since 2024-03-01.
pub async fn desk(config: SessionConfig) -> Desk {
    let students = Arc::new(InMemoryStudentStore::new());
    let payments = Arc::new(InMemoryPaymentStore::new());
    let transport = Arc::new(ChannelTransport::default());

    students
        .store(StudentBillingProfile::new(
            StudentId::from("s-001"),
            date(2024, 1, 1),
            Scheme::Every28Days,
            Amount::new(dec!(760.0)).unwrap(),
        ))
        .await
        .unwrap();
    students
        .store(StudentBillingProfile::new(
            StudentId::from("s-002"),
            date(2024, 2, 1),
            Scheme::Weekly,
            Amount::new(dec!(95.5)).unwrap(),
        ))
        .await
        .unwrap();
    let mut dropped = StudentBillingProfile::new(
        StudentId::from("s-003"),
        date(2024, 1, 1),
        Scheme::Biweekly,
        Amount::new(dec!(200.0)).unwrap(),
    );
    dropped.drop_out(date(2024, 3, 1), "tuition lapse");
    students.store(dropped).await.unwrap();

    let manager = SessionManager::new(
        Arc::clone(&students) as StudentStoreRef,
        Arc::clone(&payments) as PaymentStoreRef,
        Arc::clone(&transport) as TransportRef,
        config,
    );

    Desk {
        manager,
        transport,
        students,
        payments,
    }
}
