use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Account, AssignmentFilter, AssignmentStatus, BillingFilter, Consumer, Engine, EngineError,
    IssuePriority, IssueStatus, NewConsumer, NewIssue, PaymentStatus, ReadingFilter,
};
use migration::MigratorTrait;

const PASSWORD: &str = "correct-horse";

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_consumer(email: &str, meter: &str, voter: bool, initial_reading: i64) -> NewConsumer {
    NewConsumer {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        full_name: format!("Consumer {meter}"),
        water_meter_no: meter.to_string(),
        address: Some("Purok 3".to_string()),
        phone: None,
        registered_voter: voter,
        initial_reading,
    }
}

/// Moves the consumer's account creation date, which drives years of service.
async fn backdate_member_since(db: &DatabaseConnection, consumer: &Consumer, since: NaiveDate) {
    let since = Utc.from_utc_datetime(&since.and_hms_opt(0, 0, 0).unwrap());
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE accounts SET created_at = ? WHERE id = ?",
        vec![since.into(), consumer.account_id.clone().into()],
    ))
    .await
    .unwrap();
}

struct Fixture {
    engine: Engine,
    db: DatabaseConnection,
    admin: Account,
    reader: Account,
    reader_id: String,
    consumer: Consumer,
}

async fn fixture() -> Fixture {
    let (engine, db) = engine_with_db().await;
    let admin = Account::system();

    let consumer = engine
        .register_consumer(&admin, new_consumer("juan@bawasa.ph", "M-001", true, 100))
        .await
        .unwrap();
    let reader_profile = engine
        .register_meter_reader(&admin, "reader@bawasa.ph", PASSWORD, "Pedro", Some("Purok 3"))
        .await
        .unwrap();
    let reader = engine
        .authenticate("reader@bawasa.ph", PASSWORD)
        .await
        .unwrap();

    Fixture {
        engine,
        db,
        admin,
        reader,
        reader_id: reader_profile.id,
        consumer,
    }
}

#[tokio::test]
async fn opening_a_cycle_twice_creates_readings_once() {
    let f = fixture().await;

    let created = f
        .engine
        .open_billing_cycle(&f.admin, date(2026, 3, 17))
        .await
        .unwrap();
    assert_eq!(created, 1);

    let again = f
        .engine
        .open_billing_cycle(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    assert_eq!(again, 0);

    let readings = f
        .engine
        .list_readings(
            &f.admin,
            ReadingFilter {
                month: Some(date(2026, 3, 5)),
                consumer_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].cycle_month, date(2026, 3, 1));
    assert_eq!(readings[0].previous_reading, 100);
    assert_eq!(readings[0].present_reading, None);
}

#[tokio::test]
async fn full_cycle_from_reading_to_payment() {
    let f = fixture().await;
    backdate_member_since(&f.db, &f.consumer, date(2024, 1, 10)).await;

    f.engine
        .open_billing_cycle(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    let assignments = f
        .engine
        .assign_reader(&f.admin, &f.reader_id, &[f.consumer.id.clone()])
        .await
        .unwrap();
    assert_eq!(assignments[0].status, AssignmentStatus::Assigned);

    let reading = f
        .engine
        .list_readings(&f.reader, ReadingFilter::default())
        .await
        .unwrap()
        .remove(0);
    let reading = f
        .engine
        .record_present_reading(&f.reader, &reading.id, 115, date(2026, 3, 20), Some("ok"))
        .await
        .unwrap();
    assert_eq!(reading.consumption(), Some(15));

    let mine = f
        .engine
        .list_assignments(&f.reader, AssignmentFilter::default())
        .await
        .unwrap();
    assert_eq!(mine[0].status, AssignmentStatus::Completed);
    assert!(mine[0].completed_at.is_some());

    let billing = f.engine.generate_billing(&f.admin, &reading.id).await.unwrap();
    assert_eq!(billing.breakdown.years_of_service, 2);
    assert_eq!(billing.breakdown.discount_percent, 25);
    assert_eq!(billing.total_amount_due(), 37_500);
    assert_eq!(billing.due_date, date(2026, 4, 4));
    assert_eq!(billing.billing_month, date(2026, 3, 1));
    assert_eq!(billing.payment_status, PaymentStatus::Unpaid);

    let (billing, _) = f
        .engine
        .record_payment(&f.admin, &billing.id, 10_000, Some("OR-1"))
        .await
        .unwrap();
    assert_eq!(billing.payment_status, PaymentStatus::Partial);
    assert_eq!(billing.outstanding(), 27_500);

    let (billing, payment) = f
        .engine
        .record_payment(&f.admin, &billing.id, 27_500, None)
        .await
        .unwrap();
    assert_eq!(payment.cashier_id, None);
    assert_eq!(billing.payment_status, PaymentStatus::Paid);
    assert!(billing.payment_date.is_some());

    let payments = f.engine.list_payments(&f.admin, &billing.id).await.unwrap();
    assert_eq!(payments.len(), 2);

    let err = f
        .engine
        .record_payment(&f.admin, &billing.id, 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));
}

#[tokio::test]
async fn present_reading_below_previous_is_rejected() {
    let f = fixture().await;
    f.engine
        .open_billing_cycle(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    let reading = f
        .engine
        .list_readings(&f.admin, ReadingFilter::default())
        .await
        .unwrap()
        .remove(0);

    let err = f
        .engine
        .record_present_reading(&f.admin, &reading.id, 99, date(2026, 3, 20), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidReading(_)));
}

#[tokio::test]
async fn reader_without_assignment_cannot_record() {
    let f = fixture().await;
    f.engine
        .open_billing_cycle(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    let reading = f
        .engine
        .list_readings(&f.admin, ReadingFilter::default())
        .await
        .unwrap()
        .remove(0);

    let err = f
        .engine
        .record_present_reading(&f.reader, &reading.id, 120, date(2026, 3, 20), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn billed_reading_is_frozen() {
    let f = fixture().await;
    f.engine
        .open_billing_cycle(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    let reading = f
        .engine
        .list_readings(&f.admin, ReadingFilter::default())
        .await
        .unwrap()
        .remove(0);
    f.engine
        .record_present_reading(&f.admin, &reading.id, 104, date(2026, 3, 20), None)
        .await
        .unwrap();
    f.engine.generate_billing(&f.admin, &reading.id).await.unwrap();

    let err = f
        .engine
        .generate_billing(&f.admin, &reading.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = f
        .engine
        .record_present_reading(&f.admin, &reading.id, 110, date(2026, 3, 21), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidReading(_)));
}

#[tokio::test]
async fn unread_reading_cannot_be_billed() {
    let f = fixture().await;
    f.engine
        .open_billing_cycle(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    let reading = f
        .engine
        .list_readings(&f.admin, ReadingFilter::default())
        .await
        .unwrap()
        .remove(0);

    let err = f
        .engine
        .generate_billing(&f.admin, &reading.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidReading(_)));
}

#[tokio::test]
async fn next_cycle_starts_from_last_present_reading() {
    let f = fixture().await;
    f.engine
        .open_billing_cycle(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    let march = f
        .engine
        .list_readings(&f.admin, ReadingFilter::default())
        .await
        .unwrap()
        .remove(0);
    f.engine
        .record_present_reading(&f.admin, &march.id, 112, date(2026, 3, 20), None)
        .await
        .unwrap();

    f.engine
        .open_billing_cycle(&f.admin, date(2026, 4, 1))
        .await
        .unwrap();
    let april = f
        .engine
        .list_readings(
            &f.admin,
            ReadingFilter {
                month: Some(date(2026, 4, 1)),
                consumer_id: Some(f.consumer.id.clone()),
            },
        )
        .await
        .unwrap();
    assert_eq!(april[0].previous_reading, 112);
}

#[tokio::test]
async fn zero_consumption_bill_is_paid_immediately() {
    let f = fixture().await;
    f.engine
        .open_billing_cycle(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    let reading = f
        .engine
        .list_readings(&f.admin, ReadingFilter::default())
        .await
        .unwrap()
        .remove(0);
    f.engine
        .record_present_reading(&f.admin, &reading.id, 100, date(2026, 3, 20), None)
        .await
        .unwrap();

    let billed = f
        .engine
        .generate_cycle_billings(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    assert_eq!(billed, 1);

    let billings = f
        .engine
        .list_billings(&f.admin, BillingFilter::default())
        .await
        .unwrap();
    assert_eq!(billings[0].total_amount_due(), 0);
    assert_eq!(billings[0].payment_status, PaymentStatus::Paid);

    let again = f
        .engine
        .generate_cycle_billings(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    assert_eq!(again, 0);
}

#[tokio::test]
async fn overpayment_is_rejected() {
    let f = fixture().await;
    f.engine
        .open_billing_cycle(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    let reading = f
        .engine
        .list_readings(&f.admin, ReadingFilter::default())
        .await
        .unwrap()
        .remove(0);
    f.engine
        .record_present_reading(&f.admin, &reading.id, 105, date(2026, 3, 20), None)
        .await
        .unwrap();
    let billing = f.engine.generate_billing(&f.admin, &reading.id).await.unwrap();
    assert_eq!(billing.total_amount_due(), 15_000);

    let err = f
        .engine
        .record_payment(&f.admin, &billing.id, 15_001, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = f
        .engine
        .record_payment(&f.admin, &billing.id, 0, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn overdue_sweep_and_partial_payment_keep_overdue() {
    let f = fixture().await;
    f.engine
        .open_billing_cycle(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    let reading = f
        .engine
        .list_readings(&f.admin, ReadingFilter::default())
        .await
        .unwrap()
        .remove(0);
    f.engine
        .record_present_reading(&f.admin, &reading.id, 110, date(2026, 3, 20), None)
        .await
        .unwrap();
    let billing = f.engine.generate_billing(&f.admin, &reading.id).await.unwrap();

    let flagged = f
        .engine
        .mark_overdue_billings(&f.admin, date(2026, 4, 4))
        .await
        .unwrap();
    assert_eq!(flagged, 0, "due date itself is not overdue");

    let flagged = f
        .engine
        .mark_overdue_billings(&f.admin, date(2026, 4, 5))
        .await
        .unwrap();
    assert_eq!(flagged, 1);

    let (billing, _) = f
        .engine
        .record_payment(&f.admin, &billing.id, 1_000, None)
        .await
        .unwrap();
    assert_eq!(billing.payment_status, PaymentStatus::Overdue);

    let billing = f
        .engine
        .set_payment_status(&f.admin, &billing.id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(billing.payment_status, PaymentStatus::Paid);
    assert!(billing.payment_date.is_some());
}

#[tokio::test]
async fn consumer_only_sees_own_billings() {
    let f = fixture().await;
    f.engine
        .register_consumer(&f.admin, new_consumer("maria@bawasa.ph", "M-002", false, 0))
        .await
        .unwrap();
    f.engine
        .open_billing_cycle(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    for reading in f
        .engine
        .list_readings(&f.admin, ReadingFilter::default())
        .await
        .unwrap()
    {
        let present = reading.previous_reading + 3;
        f.engine
            .record_present_reading(&f.admin, &reading.id, present, date(2026, 3, 20), None)
            .await
            .unwrap();
    }
    assert_eq!(
        f.engine
            .generate_cycle_billings(&f.admin, date(2026, 3, 1))
            .await
            .unwrap(),
        2
    );

    let juan = f
        .engine
        .authenticate("juan@bawasa.ph", PASSWORD)
        .await
        .unwrap();
    let mine = f.engine.my_billings(&juan).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].consumer_id, f.consumer.id);

    let err = f
        .engine
        .list_billings(&juan, BillingFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = f.engine.consumer(&juan, &f.consumer.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let all = f
        .engine
        .list_billings(&f.admin, BillingFilter::default())
        .await
        .unwrap();
    let other = all
        .iter()
        .find(|b| b.consumer_id != f.consumer.id)
        .unwrap();
    let err = f.engine.billing(&juan, &other.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = f
        .engine
        .list_billings(&f.reader, BillingFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn consumer_cannot_be_assigned_twice() {
    let f = fixture().await;
    let consumers = [f.consumer.id.clone()];
    let first = f
        .engine
        .assign_reader(&f.admin, &f.reader_id, &consumers)
        .await
        .unwrap();

    let err = f
        .engine
        .assign_reader(&f.admin, &f.reader_id, &consumers)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    f.engine
        .update_assignment_status(&f.reader, &first[0].id, AssignmentStatus::Ongoing)
        .await
        .unwrap();
    let err = f
        .engine
        .update_assignment_status(&f.reader, &first[0].id, AssignmentStatus::Assigned)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus(_)));

    f.engine
        .update_assignment_status(&f.admin, &first[0].id, AssignmentStatus::Completed)
        .await
        .unwrap();
    f.engine
        .assign_reader(&f.admin, &f.reader_id, &consumers)
        .await
        .unwrap();
}

#[tokio::test]
async fn readers_cannot_move_each_others_assignments() {
    let f = fixture().await;
    f.engine
        .register_meter_reader(&f.admin, "maria@bawasa.ph", PASSWORD, "Maria", None)
        .await
        .unwrap();
    let maria = f
        .engine
        .authenticate("maria@bawasa.ph", PASSWORD)
        .await
        .unwrap();

    let assigned = f
        .engine
        .assign_reader(&f.admin, &f.reader_id, &[f.consumer.id.clone()])
        .await
        .unwrap();

    let err = f
        .engine
        .update_assignment_status(&maria, &assigned[0].id, AssignmentStatus::Ongoing)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let theirs = f
        .engine
        .list_assignments(&maria, AssignmentFilter::default())
        .await
        .unwrap();
    assert!(theirs.is_empty());

    let moved = f
        .engine
        .update_assignment_status(&f.reader, &assigned[0].id, AssignmentStatus::Ongoing)
        .await
        .unwrap();
    assert_eq!(moved.status, AssignmentStatus::Ongoing);
}

async fn reading_of(f: &Fixture, month: NaiveDate) -> engine::MeterReading {
    f.engine
        .list_readings(
            &f.admin,
            ReadingFilter {
                month: Some(month),
                consumer_id: Some(f.consumer.id.clone()),
            },
        )
        .await
        .unwrap()
        .remove(0)
}

#[tokio::test]
async fn late_reading_reseeds_the_next_open_cycle() {
    let f = fixture().await;
    for month in [date(2026, 2, 1), date(2026, 3, 1)] {
        f.engine.open_billing_cycle(&f.admin, month).await.unwrap();
    }
    let march = reading_of(&f, date(2026, 3, 1)).await;
    assert_eq!(march.previous_reading, 100);

    let february = reading_of(&f, date(2026, 2, 1)).await;
    f.engine
        .record_present_reading(&f.admin, &february.id, 115, date(2026, 2, 20), None)
        .await
        .unwrap();
    let march = reading_of(&f, date(2026, 3, 1)).await;
    assert_eq!(march.previous_reading, 115);

    f.engine
        .record_present_reading(&f.admin, &march.id, 130, date(2026, 3, 20), None)
        .await
        .unwrap();
    let mut billed = 0;
    for id in [&february.id, &march.id] {
        let billing = f.engine.generate_billing(&f.admin, id).await.unwrap();
        billed += billing.breakdown.consumption_m3;
    }
    assert_eq!(billed, 30);
}

#[tokio::test]
async fn late_reading_cannot_change_a_billed_cycle() {
    let f = fixture().await;
    for month in [date(2026, 2, 1), date(2026, 3, 1)] {
        f.engine.open_billing_cycle(&f.admin, month).await.unwrap();
    }
    let march = reading_of(&f, date(2026, 3, 1)).await;
    f.engine
        .record_present_reading(&f.admin, &march.id, 130, date(2026, 3, 20), None)
        .await
        .unwrap();
    f.engine.generate_billing(&f.admin, &march.id).await.unwrap();

    let february = reading_of(&f, date(2026, 2, 1)).await;
    let err = f
        .engine
        .record_present_reading(&f.admin, &february.id, 115, date(2026, 2, 20), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidReading(_)));
    assert_eq!(reading_of(&f, date(2026, 2, 1)).await.present_reading, None);

    // An unchanged meter leaves the billed March reading as it is.
    f.engine
        .record_present_reading(&f.admin, &february.id, 100, date(2026, 2, 20), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn revenue_rejects_years_out_of_range() {
    let f = fixture().await;
    for year in [i32::MAX, i32::MIN] {
        let err = f.engine.revenue_for_year(&f.admin, year).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
}

#[tokio::test]
async fn revenue_and_dashboard_reflect_payments() {
    let f = fixture().await;
    f.engine
        .open_billing_cycle(&f.admin, date(2026, 3, 1))
        .await
        .unwrap();
    let reading = f
        .engine
        .list_readings(&f.admin, ReadingFilter::default())
        .await
        .unwrap()
        .remove(0);
    f.engine
        .record_present_reading(&f.admin, &reading.id, 110, date(2026, 3, 20), None)
        .await
        .unwrap();
    let billing = f.engine.generate_billing(&f.admin, &reading.id).await.unwrap();
    f.engine
        .record_payment(&f.admin, &billing.id, 5_000, None)
        .await
        .unwrap();

    let juan = f
        .engine
        .authenticate("juan@bawasa.ph", PASSWORD)
        .await
        .unwrap();
    let issue = f
        .engine
        .create_issue(
            &juan,
            NewIssue {
                issue_type: "leak".to_string(),
                description: "Leak near the meter".to_string(),
                priority: IssuePriority::High,
                consumer_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(issue.consumer_id.as_deref(), Some(f.consumer.id.as_str()));
    assert_eq!(issue.status, IssueStatus::Open);

    let report = f
        .engine
        .revenue_for_year(&f.admin, Utc::now().year())
        .await
        .unwrap();
    assert_eq!(report.months.len(), 12);
    assert_eq!(report.total, 5_000);

    let summary = f
        .engine
        .dashboard_summary(&f.admin, date(2026, 4, 10))
        .await
        .unwrap();
    assert_eq!(summary.consumers, 1);
    assert_eq!(summary.partial, 1);
    assert_eq!(summary.past_due, 1);
    assert_eq!(summary.collected, 5_000);
    assert_eq!(summary.outstanding, 25_000);
    assert_eq!(summary.open_issues, 1);

    let resolved = f
        .engine
        .update_issue_status(&f.admin, &issue.id, IssueStatus::Resolved)
        .await
        .unwrap();
    assert!(resolved.resolved_at.is_some());
    assert!(
        f.engine
            .list_issues(&juan, Some(IssueStatus::Open))
            .await
            .unwrap()
            .is_empty()
    );
}
