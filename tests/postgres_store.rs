//! Constraint and locking behavior that only the Postgres backend has.
//!
//! Each test gets a fresh database from `#[sqlx::test]` with the crate's
//! migrations applied. Run with `DATABASE_URL` set:
//! `cargo test --test postgres_store -- --ignored`.

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

use rota_engine::{
    db::PgRotaStore,
    models::{
        CreateShiftChangeInput, CreateShiftInput, NewShiftChangeRequest, NewWorkSchedule, ScheduleOrigin, Shift,
        WorkSchedule,
    },
    services::ShiftChangeWorkflow,
    store::{RotaStore, RotaTx},
    AppError,
};

const ANN: i32 = 10;
const BEN: i32 = 11;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

async fn early_shift(tx: &mut Box<dyn RotaTx>) -> Shift {
    tx.insert_shift(&CreateShiftInput {
        name: "Early".into(),
        start_time: "07:00:00".parse().unwrap(),
        end_time: "15:00:00".parse().unwrap(),
    })
    .await
    .unwrap()
}

async fn book(tx: &mut Box<dyn RotaTx>, employee_id: i32, day: &str, shift_id: i32) -> WorkSchedule {
    tx.insert_schedule(&NewWorkSchedule {
        employee_id,
        shift_id,
        work_date: date(day),
        origin: ScheduleOrigin::Manual,
    })
    .await
    .unwrap()
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn racing_bookings_fail_at_commit_as_double_booked(pool: PgPool) {
    let store = PgRotaStore::new(pool);
    let shift = {
        let mut tx = store.begin().await.unwrap();
        let shift = early_shift(&mut tx).await;
        tx.commit().await.unwrap();
        shift
    };

    // Neither transaction can see the other's row, so both eager checks pass.
    let mut first = store.begin().await.unwrap();
    let mut second = store.begin().await.unwrap();
    book(&mut first, ANN, "2025-03-03", shift.id).await;
    book(&mut second, ANN, "2025-03-03", shift.id).await;

    first.commit().await.unwrap();
    let err = second.commit().await.unwrap_err();
    assert!(matches!(err, AppError::DoubleBooked(_)), "got {:?}", err);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn same_day_owner_exchange_commits(pool: PgPool) {
    let store = PgRotaStore::new(pool);
    let mut tx = store.begin().await.unwrap();
    let shift = early_shift(&mut tx).await;
    let mut ann = book(&mut tx, ANN, "2025-03-03", shift.id).await;
    let mut ben = book(&mut tx, BEN, "2025-03-03", shift.id).await;

    // Between the two updates Ben holds both rows for the day.
    ann.employee_id = BEN;
    ben.employee_id = ANN;
    tx.update_schedule(&ann).await.unwrap();
    tx.update_schedule(&ben).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.find_schedule(ann.id).await.unwrap().unwrap().employee_id, BEN);
    assert_eq!(tx.find_schedule(ben.id).await.unwrap().unwrap().employee_id, ANN);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn request_creation_waits_on_the_original_row(pool: PgPool) {
    let store = Arc::new(PgRotaStore::new(pool));
    let (monday, wednesday) = {
        let mut tx = store.begin().await.unwrap();
        let shift = early_shift(&mut tx).await;
        let monday = book(&mut tx, ANN, "2025-03-03", shift.id).await;
        let wednesday = book(&mut tx, BEN, "2025-03-05", shift.id).await;
        tx.commit().await.unwrap();
        (monday, wednesday)
    };

    let mut holder = store.begin().await.unwrap();
    holder.lock_schedule(monday.id).await.unwrap().unwrap();

    let workflow = ShiftChangeWorkflow::new(store.clone());
    let competing = tokio::spawn(async move {
        workflow
            .create(
                ANN,
                CreateShiftChangeInput {
                    original_schedule_id: monday.id,
                    target_schedule_id: wednesday.id,
                    reason: "family event".into(),
                },
            )
            .await
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!competing.is_finished());

    holder
        .insert_request(&NewShiftChangeRequest {
            requester_id: ANN,
            target_id: BEN,
            original_schedule_id: monday.id,
            target_schedule_id: wednesday.id,
            reason: "family event".into(),
            request_time: Utc::now(),
        })
        .await
        .unwrap();
    holder.commit().await.unwrap();

    let err = competing.await.unwrap().unwrap_err();
    assert!(matches!(err, AppError::DuplicatePending(_)), "got {:?}", err);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn second_open_request_hits_the_partial_index(pool: PgPool) {
    let store = PgRotaStore::new(pool);
    let mut tx = store.begin().await.unwrap();
    let new = NewShiftChangeRequest {
        requester_id: ANN,
        target_id: BEN,
        original_schedule_id: Uuid::new_v4(),
        target_schedule_id: Uuid::new_v4(),
        reason: "family event".into(),
        request_time: Utc::now(),
    };
    tx.insert_request(&new).await.unwrap();
    let err = tx.insert_request(&new).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicatePending(_)), "got {:?}", err);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL pointing at a Postgres server"]
async fn deleting_a_referenced_shift_is_in_use(pool: PgPool) {
    let store = PgRotaStore::new(pool);
    let mut tx = store.begin().await.unwrap();
    let shift = early_shift(&mut tx).await;
    book(&mut tx, ANN, "2025-03-03", shift.id).await;

    let err = tx.delete_shift(shift.id).await.unwrap_err();
    assert!(matches!(err, AppError::InUse(_)), "got {:?}", err);
}
