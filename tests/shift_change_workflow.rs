mod common;

use common::*;
use rota_engine::{
    models::{ApprovalStatus, AssignScheduleInput, CreateShiftChangeInput, RequestState, WorkSchedule},
    AppError,
};
use uuid::Uuid;

async fn assign(rota: &Rota, employee_id: i32, day: &str, shift_id: i32) -> WorkSchedule {
    rota.services
        .schedules
        .assign(AssignScheduleInput {
            employee_id,
            work_date: date(day),
            shift_id,
        })
        .await
        .unwrap()
}

fn swap(original: Uuid, target: Uuid) -> CreateShiftChangeInput {
    CreateShiftChangeInput {
        original_schedule_id: original,
        target_schedule_id: target,
        reason: "family event".to_string(),
    }
}

/// Ann's Monday morning against Ben's Wednesday evening.
async fn ann_and_ben(rota: &Rota) -> (WorkSchedule, WorkSchedule) {
    let morning = shift(rota, "Morning", "07:00:00", "15:00:00").await;
    let evening = shift(rota, "Evening", "15:00:00", "23:00:00").await;
    let monday = assign(rota, ANN, "2025-03-03", morning.id).await;
    let wednesday = assign(rota, BEN, "2025-03-05", evening.id).await;
    (monday, wednesday)
}

#[tokio::test]
async fn approved_swap_exchanges_owners() {
    let rota = rota();
    let (monday, wednesday) = ann_and_ben(&rota).await;
    let workflow = &rota.services.shift_changes;

    let request = workflow.create(ANN, swap(monday.id, wednesday.id)).await.unwrap();
    assert_eq!(request.target_id, BEN);
    assert_eq!(request.state().unwrap(), RequestState::AwaitingTarget);
    assert_eq!(request.status, ApprovalStatus::Pending);

    let incoming = workflow.list_incoming(BEN).await.unwrap();
    assert_eq!(incoming.len(), 1);

    let request = workflow
        .approve(BEN, request.id, Some("happy to".into()))
        .await
        .unwrap();
    assert_eq!(request.state().unwrap(), RequestState::AwaitingAdmin);
    assert!(request.target_response_time.is_some());
    assert!(workflow.list_incoming(BEN).await.unwrap().is_empty());
    assert_eq!(workflow.list_awaiting_admin().await.unwrap().len(), 1);

    // Nothing moves until the administrator ratifies.
    assert_eq!(rota.services.schedules.get(monday.id).await.unwrap().employee_id, ANN);

    let request = workflow.admin_approve(request.id, None).await.unwrap();
    assert_eq!(request.status, ApprovalStatus::Approved);
    assert_eq!(request.state().unwrap(), RequestState::Completed);
    assert!(request.admin_response_time.is_some());

    let monday_after = rota.services.schedules.get(monday.id).await.unwrap();
    let wednesday_after = rota.services.schedules.get(wednesday.id).await.unwrap();
    assert_eq!(monday_after.employee_id, BEN);
    assert_eq!(monday_after.shift_id, monday.shift_id);
    assert_eq!(monday_after.origin, monday.origin);
    assert_eq!(wednesday_after.employee_id, ANN);
    assert_eq!(wednesday_after.shift_id, wednesday.shift_id);

    let mine = workflow.list_for_requester(ANN).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].status, ApprovalStatus::Approved);
    assert!(workflow.list_awaiting_admin().await.unwrap().is_empty());
}

#[tokio::test]
async fn transitions_out_of_order_are_refused() {
    let rota = rota();
    let (monday, wednesday) = ann_and_ben(&rota).await;
    let workflow = &rota.services.shift_changes;
    let request = workflow.create(ANN, swap(monday.id, wednesday.id)).await.unwrap();

    let err = workflow.admin_approve(request.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)), "got {:?}", err);
    assert_eq!(rota.services.schedules.get(monday.id).await.unwrap().employee_id, ANN);

    workflow.approve(BEN, request.id, None).await.unwrap();
    let err = workflow.approve(BEN, request.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    let err = workflow.reject(BEN, request.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    workflow.admin_approve(request.id, None).await.unwrap();
    let err = workflow.admin_reject(request.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn target_rejection_is_terminal() {
    let rota = rota();
    let (monday, wednesday) = ann_and_ben(&rota).await;
    let workflow = &rota.services.shift_changes;
    let request = workflow.create(ANN, swap(monday.id, wednesday.id)).await.unwrap();

    let request = workflow
        .reject(BEN, request.id, Some("busy".into()))
        .await
        .unwrap();
    assert_eq!(request.status, ApprovalStatus::Rejected);
    assert_eq!(request.state().unwrap(), RequestState::TargetRejected);
    assert_eq!(request.target_response_message.as_deref(), Some("busy"));

    let err = workflow.admin_reject(request.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    // A closed request no longer blocks a fresh one.
    workflow.create(ANN, swap(monday.id, wednesday.id)).await.unwrap();
}

#[tokio::test]
async fn admin_can_veto_before_the_target_answers() {
    let rota = rota();
    let (monday, wednesday) = ann_and_ben(&rota).await;
    let workflow = &rota.services.shift_changes;
    let request = workflow.create(ANN, swap(monday.id, wednesday.id)).await.unwrap();

    let request = workflow
        .admin_reject(request.id, Some("short staffed".into()))
        .await
        .unwrap();
    assert_eq!(request.state().unwrap(), RequestState::AdminRejected);
    assert_eq!(request.status, ApprovalStatus::Rejected);
    assert_eq!(request.target_status, ApprovalStatus::Pending);

    let err = workflow.approve(BEN, request.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    assert!(workflow.list_incoming(BEN).await.unwrap().is_empty());
}

#[tokio::test]
async fn only_the_target_may_answer() {
    let rota = rota();
    let (monday, wednesday) = ann_and_ben(&rota).await;
    let workflow = &rota.services.shift_changes;
    let request = workflow.create(ANN, swap(monday.id, wednesday.id)).await.unwrap();

    for actor in [ANN, CARA, ADMIN] {
        let err = workflow.approve(actor, request.id, None).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)), "actor {} got {:?}", actor, err);
    }
    assert_eq!(
        workflow.get(request.id).await.unwrap().state().unwrap(),
        RequestState::AwaitingTarget
    );

    let err = workflow.approve(BEN, 9999, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn creation_checks_ownership_and_duplicates() {
    let rota = rota();
    let (monday, wednesday) = ann_and_ben(&rota).await;
    let workflow = &rota.services.shift_changes;

    let err = workflow.create(BEN, swap(monday.id, wednesday.id)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let late_monday = {
        let late = shift(&rota, "Late", "14:00:00", "22:00:00").await;
        assign(&rota, ANN, "2025-03-10", late.id).await
    };
    let err = workflow.create(ANN, swap(monday.id, late_monday.id)).await.unwrap_err();
    assert!(matches!(err, AppError::SelfSwap(_)));

    let err = workflow.create(ANN, swap(monday.id, Uuid::new_v4())).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = workflow.create(ANN, swap(Uuid::new_v4(), wednesday.id)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    workflow.create(ANN, swap(monday.id, wednesday.id)).await.unwrap();
    let err = workflow.create(ANN, swap(monday.id, wednesday.id)).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicatePending(_)));
}

#[tokio::test]
async fn concurrent_creates_for_one_schedule_leave_one_open_request() {
    let rota = rota();
    let (monday, wednesday) = ann_and_ben(&rota).await;
    let workflow = &rota.services.shift_changes;

    let (first, second) = tokio::join!(
        workflow.create(ANN, swap(monday.id, wednesday.id)),
        workflow.create(ANN, swap(monday.id, wednesday.id)),
    );
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(AppError::DuplicatePending(_)))));
    assert_eq!(workflow.list_for_requester(ANN).await.unwrap().len(), 1);
}

#[tokio::test]
async fn requests_cannot_target_an_unassigned_row() {
    let rota = rota();
    let (monday, wednesday) = ann_and_ben(&rota).await;
    rota.services.schedules.unassign(monday.id).await.unwrap();

    let err = rota
        .services
        .shift_changes
        .create(ANN, swap(monday.id, wednesday.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn clashing_swap_fails_whole_and_can_be_retried() {
    let rota = rota();
    let (monday, wednesday) = ann_and_ben(&rota).await;
    let workflow = &rota.services.shift_changes;
    let request = workflow.create(ANN, swap(monday.id, wednesday.id)).await.unwrap();
    workflow.approve(BEN, request.id, None).await.unwrap();

    // Ben picks up another Monday shift after agreeing.
    let extra = shift(&rota, "Twilight", "18:00:00", "23:59:00").await;
    let clash = assign(&rota, BEN, "2025-03-03", extra.id).await;

    let err = workflow.admin_approve(request.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

    let unchanged = workflow.get(request.id).await.unwrap();
    assert_eq!(unchanged.state().unwrap(), RequestState::AwaitingAdmin);
    assert_eq!(unchanged.target_status, ApprovalStatus::Approved);
    assert_eq!(unchanged.admin_status, ApprovalStatus::Pending);
    assert!(unchanged.admin_response_time.is_none());
    assert_eq!(rota.services.schedules.get(monday.id).await.unwrap().employee_id, ANN);
    assert_eq!(rota.services.schedules.get(wednesday.id).await.unwrap().employee_id, BEN);

    rota.services.schedules.unassign(clash.id).await.unwrap();
    let done = workflow.admin_approve(request.id, None).await.unwrap();
    assert_eq!(done.state().unwrap(), RequestState::Completed);
    assert_eq!(rota.services.schedules.get(monday.id).await.unwrap().employee_id, BEN);
}

#[tokio::test]
async fn rows_held_by_open_requests_cannot_be_unassigned() {
    let rota = rota();
    let (monday, wednesday) = ann_and_ben(&rota).await;
    let workflow = &rota.services.shift_changes;
    let request = workflow.create(ANN, swap(monday.id, wednesday.id)).await.unwrap();

    for id in [monday.id, wednesday.id] {
        let err = rota.services.schedules.unassign(id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    workflow.admin_reject(request.id, None).await.unwrap();
    rota.services.schedules.unassign(monday.id).await.unwrap();
}

#[tokio::test]
async fn same_day_swap_exchanges_shifts() {
    let rota = rota();
    let morning = shift(&rota, "Morning", "07:00:00", "15:00:00").await;
    let evening = shift(&rota, "Evening", "15:00:00", "23:00:00").await;
    let ann_row = assign(&rota, ANN, "2025-03-03", morning.id).await;
    let ben_row = assign(&rota, BEN, "2025-03-03", evening.id).await;
    let workflow = &rota.services.shift_changes;

    let request = workflow.create(ANN, swap(ann_row.id, ben_row.id)).await.unwrap();
    workflow.approve(BEN, request.id, None).await.unwrap();
    workflow.admin_approve(request.id, None).await.unwrap();

    let day = rota.services.schedules.find_by_date(date("2025-03-03")).await.unwrap();
    assert_eq!(day.len(), 2);
    let ann_now = day.iter().find(|r| r.employee_id == ANN).unwrap();
    let ben_now = day.iter().find(|r| r.employee_id == BEN).unwrap();
    assert_eq!(ann_now.shift_id, evening.id);
    assert_eq!(ben_now.shift_id, morning.id);
}

#[tokio::test]
async fn swap_is_refused_once_a_row_changes_hands() {
    let rota = rota();
    let (monday, wednesday) = ann_and_ben(&rota).await;
    let friday = {
        let late = shift(&rota, "Late", "14:00:00", "22:00:00").await;
        assign(&rota, CARA, "2025-03-07", late.id).await
    };
    let workflow = &rota.services.shift_changes;

    // Ben's Wednesday is offered to Ann and, separately, Ben asks Cara about it.
    let first = workflow.create(ANN, swap(monday.id, wednesday.id)).await.unwrap();
    let second = workflow.create(BEN, swap(wednesday.id, friday.id)).await.unwrap();

    workflow.approve(CARA, second.id, None).await.unwrap();
    workflow.admin_approve(second.id, None).await.unwrap();
    assert_eq!(rota.services.schedules.get(wednesday.id).await.unwrap().employee_id, CARA);

    workflow.approve(BEN, first.id, None).await.unwrap();
    let err = workflow.admin_approve(first.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(rota.services.schedules.get(monday.id).await.unwrap().employee_id, ANN);
}
