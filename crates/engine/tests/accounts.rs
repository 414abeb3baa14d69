use chrono::{Duration, Utc};
use sea_orm::Database;

use engine::{
    Account, ConsumerUpdate, Engine, EngineError, NewAccount, NewConsumer, Role,
};
use migration::MigratorTrait;

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

fn admin_input(email: &str) -> NewAccount {
    NewAccount {
        email: email.to_string(),
        password: "s3cret-pass".to_string(),
        full_name: "Office Admin".to_string(),
        role: Role::Admin,
    }
}

#[tokio::test]
async fn admin_login_is_case_insensitive_on_email() {
    let engine = engine().await;
    let created = engine
        .create_account(&Account::system(), admin_input("  Admin@Bawasa.PH "))
        .await
        .unwrap();
    assert_eq!(created.email, "admin@bawasa.ph");

    let logged_in = engine
        .authenticate("ADMIN@bawasa.ph", "s3cret-pass")
        .await
        .unwrap();
    assert_eq!(logged_in.id, created.id);
    assert_eq!(logged_in.role, Role::Admin);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let engine = engine().await;
    engine
        .create_account(&Account::system(), admin_input("admin@bawasa.ph"))
        .await
        .unwrap();

    let wrong = engine
        .authenticate("admin@bawasa.ph", "nope-nope")
        .await
        .unwrap_err();
    let unknown = engine
        .authenticate("ghost@bawasa.ph", "s3cret-pass")
        .await
        .unwrap_err();
    assert_eq!(wrong, unknown);
    assert!(matches!(wrong, EngineError::Unauthorized(_)));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let engine = engine().await;
    let system = Account::system();
    engine
        .create_account(&system, admin_input("admin@bawasa.ph"))
        .await
        .unwrap();

    let err = engine
        .create_account(&system, admin_input("ADMIN@bawasa.ph"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn non_admin_roles_need_their_registration_path() {
    let engine = engine().await;
    let err = engine
        .create_account(
            &Account::system(),
            NewAccount {
                role: Role::Cashier,
                ..admin_input("cashier@bawasa.ph")
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn short_password_is_rejected() {
    let engine = engine().await;
    let err = engine
        .create_account(
            &Account::system(),
            NewAccount {
                password: "short".to_string(),
                ..admin_input("admin@bawasa.ph")
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn password_reset_flow() {
    let engine = engine().await;
    engine
        .create_account(&Account::system(), admin_input("admin@bawasa.ph"))
        .await
        .unwrap();
    let now = Utc::now();

    let unknown = engine
        .request_password_reset("ghost@bawasa.ph", now)
        .await
        .unwrap();
    assert_eq!(unknown, None);

    let token = engine
        .request_password_reset("admin@bawasa.ph", now)
        .await
        .unwrap()
        .unwrap();

    let expired = engine
        .reset_password(&token, "brand-new-pass", now + Duration::minutes(61))
        .await
        .unwrap_err();
    assert!(matches!(expired, EngineError::Unauthorized(_)));

    engine
        .reset_password(&token, "brand-new-pass", now + Duration::minutes(5))
        .await
        .unwrap();
    engine
        .authenticate("admin@bawasa.ph", "brand-new-pass")
        .await
        .unwrap();

    let reused = engine
        .reset_password(&token, "another-pass", now + Duration::minutes(6))
        .await
        .unwrap_err();
    assert!(matches!(reused, EngineError::Unauthorized(_)));
}

#[tokio::test]
async fn change_password_checks_current_one() {
    let engine = engine().await;
    let admin = engine
        .create_account(&Account::system(), admin_input("admin@bawasa.ph"))
        .await
        .unwrap();

    let err = engine
        .change_password(&admin, "not-it-at-all", "next-password")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));

    engine
        .change_password(&admin, "s3cret-pass", "next-password")
        .await
        .unwrap();
    engine
        .authenticate("admin@bawasa.ph", "next-password")
        .await
        .unwrap();
}

#[tokio::test]
async fn consumer_profile_rules() {
    let engine = engine().await;
    let system = Account::system();
    let consumer = engine
        .register_consumer(
            &system,
            NewConsumer {
                email: "juan@bawasa.ph".to_string(),
                password: "consumer-pass".to_string(),
                full_name: "Juan Dela Cruz".to_string(),
                water_meter_no: "M-001".to_string(),
                address: None,
                phone: Some(" 0917 000 0000 ".to_string()),
                registered_voter: true,
                initial_reading: 0,
            },
        )
        .await
        .unwrap();
    assert_eq!(consumer.phone.as_deref(), Some("0917 000 0000"));

    let juan = engine
        .authenticate("juan@bawasa.ph", "consumer-pass")
        .await
        .unwrap();
    assert_eq!(juan.role, Role::Consumer);
    assert_eq!(engine.my_consumer(&juan).await.unwrap().id, consumer.id);

    let err = engine.list_consumers(&juan, None).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .register_cashier(&juan, "c@bawasa.ph", "cashier-pass", "Cash", "E-1")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let updated = engine
        .update_consumer(
            &system,
            &consumer.id,
            ConsumerUpdate {
                full_name: Some("Juan D. Cruz".to_string()),
                registered_voter: Some(false),
                ..ConsumerUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name, "Juan D. Cruz");
    assert!(!updated.registered_voter);

    let found = engine
        .list_consumers(&system, Some("d. cruz"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    for wildcard in ["%", "_", "Juan%Cruz"] {
        let found = engine
            .list_consumers(&system, Some(wildcard))
            .await
            .unwrap();
        assert!(found.is_empty(), "{wildcard} matched as a wildcard");
    }
}

#[tokio::test]
async fn meter_numbers_and_employee_numbers_are_unique() {
    let engine = engine().await;
    let system = Account::system();
    let consumer = |email: &str| NewConsumer {
        email: email.to_string(),
        password: "consumer-pass".to_string(),
        full_name: "Someone".to_string(),
        water_meter_no: "M-001".to_string(),
        address: None,
        phone: None,
        registered_voter: false,
        initial_reading: 0,
    };

    engine
        .register_consumer(&system, consumer("a@bawasa.ph"))
        .await
        .unwrap();
    let err = engine
        .register_consumer(&system, consumer("b@bawasa.ph"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    engine
        .register_cashier(&system, "c1@bawasa.ph", "cashier-pass", "Ana", "E-1")
        .await
        .unwrap();
    let err = engine
        .register_cashier(&system, "c2@bawasa.ph", "cashier-pass", "Ben", "E-1")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    assert_eq!(engine.list_cashiers(&system).await.unwrap().len(), 1);

    // The failed consumer left no orphan account behind.
    let consumers = engine
        .list_accounts(&system, Some(Role::Consumer))
        .await
        .unwrap();
    assert_eq!(consumers.len(), 1);
}
