//! Two-stage swap approval. The target answers first, then an administrator
//! ratifies; only the administrator's approval touches work schedules.

use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use uuid::Uuid;

use super::schedules::ensure_not_double_booked;
use crate::{
    models::{CreateShiftChangeInput, NewShiftChangeRequest, ShiftChangeRequest, WorkSchedule},
    store::{RotaStore, RotaTx},
    AppError, AppResult,
};

fn record_transition(transition: &'static str) {
    counter!("shift_change_transitions_total", "transition" => transition).increment(1);
}

async fn lock_request(tx: &mut dyn RotaTx, id: i32) -> AppResult<ShiftChangeRequest> {
    tx.lock_request(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Shift change request {} not found", id)))
}

/// Locks a row the request points at and checks it still belongs to `owner`.
async fn lock_owned_row(tx: &mut dyn RotaTx, id: Uuid, owner: i32) -> AppResult<WorkSchedule> {
    let row = tx
        .lock_schedule(id)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Work schedule {} no longer exists", id)))?;

    if row.employee_id != owner {
        return Err(AppError::Conflict(format!(
            "Work schedule {} has changed hands since the request was made",
            id
        )));
    }
    Ok(row)
}

/// Swap-time double booking is reported as `Conflict` so the caller can
/// resolve the clash and retry the approval.
async fn ensure_swap_fits(tx: &mut dyn RotaTx, row_for: i32, row: &WorkSchedule, moving: &[Uuid]) -> AppResult<()> {
    ensure_not_double_booked(tx, row_for, row.work_date, moving)
        .await
        .map_err(|e| match e {
            AppError::DoubleBooked(msg) => AppError::Conflict(msg),
            other => other,
        })
}

#[derive(Clone)]
pub struct ShiftChangeWorkflow {
    store: Arc<dyn RotaStore>,
}

impl ShiftChangeWorkflow {
    pub fn new(store: Arc<dyn RotaStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, requester_id: i32, input: CreateShiftChangeInput) -> AppResult<ShiftChangeRequest> {
        let mut tx = self.store.begin().await?;

        let original = tx
            .lock_schedule(input.original_schedule_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work schedule {} not found", input.original_schedule_id)))?;
        let target = tx
            .find_schedule(input.target_schedule_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work schedule {} not found", input.target_schedule_id)))?;

        if original.employee_id != requester_id {
            return Err(AppError::Forbidden(format!(
                "Work schedule {} does not belong to employee {}",
                original.id, requester_id
            )));
        }
        if target.employee_id == requester_id {
            return Err(AppError::SelfSwap("Cannot swap a shift with yourself".to_string()));
        }

        let pending = tx.open_requests_for_schedules(&[original.id]).await?;
        if let Some(existing) = pending.iter().find(|r| r.original_schedule_id == original.id) {
            return Err(AppError::DuplicatePending(format!(
                "Request {} is already open for work schedule {}",
                existing.id, original.id
            )));
        }

        let request = tx
            .insert_request(&NewShiftChangeRequest {
                requester_id,
                target_id: target.employee_id,
                original_schedule_id: original.id,
                target_schedule_id: target.id,
                reason: input.reason.trim().to_string(),
                request_time: Utc::now(),
            })
            .await?;
        tx.commit().await?;

        record_transition("created");
        tracing::info!(
            request_id = request.id,
            requester_id,
            target_id = request.target_id,
            "Shift change request created"
        );
        Ok(request)
    }

    pub async fn get(&self, id: i32) -> AppResult<ShiftChangeRequest> {
        let mut tx = self.store.begin().await?;
        tx.find_request(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shift change request {} not found", id)))
    }

    pub async fn approve(&self, actor_id: i32, id: i32, message: Option<String>) -> AppResult<ShiftChangeRequest> {
        self.respond(actor_id, id, true, message).await
    }

    pub async fn reject(&self, actor_id: i32, id: i32, reason: Option<String>) -> AppResult<ShiftChangeRequest> {
        self.respond(actor_id, id, false, reason).await
    }

    async fn respond(
        &self,
        actor_id: i32,
        id: i32,
        accept: bool,
        message: Option<String>,
    ) -> AppResult<ShiftChangeRequest> {
        let mut tx = self.store.begin().await?;
        let mut request = lock_request(tx.as_mut(), id).await?;

        if request.target_id != actor_id {
            return Err(AppError::Forbidden(format!(
                "Only the target employee can answer shift change request {}",
                id
            )));
        }

        request.respond_as_target(accept, message, Utc::now()).map_err(|e| {
            tracing::warn!(request_id = id, actor_id, error = %e, "Target response refused");
            e
        })?;
        tx.save_request(&request).await?;
        tx.commit().await?;

        record_transition(if accept { "target_approved" } else { "target_rejected" });
        tracing::info!(request_id = id, actor_id, accept, "Target answered shift change request");
        Ok(request)
    }

    /// Ratifies the request and exchanges the owners of the two rows. Any
    /// failure leaves the request awaiting the admin.
    pub async fn admin_approve(&self, id: i32, message: Option<String>) -> AppResult<ShiftChangeRequest> {
        let mut tx = self.store.begin().await?;
        let mut request = lock_request(tx.as_mut(), id).await?;

        request.approve_as_admin(message, Utc::now()).map_err(|e| {
            tracing::warn!(request_id = id, error = %e, "Admin approval refused");
            e
        })?;

        // Fixed lock order so two approvals touching the same rows cannot deadlock.
        let (original, target) = if request.original_schedule_id <= request.target_schedule_id {
            let original = lock_owned_row(tx.as_mut(), request.original_schedule_id, request.requester_id).await?;
            let target = lock_owned_row(tx.as_mut(), request.target_schedule_id, request.target_id).await?;
            (original, target)
        } else {
            let target = lock_owned_row(tx.as_mut(), request.target_schedule_id, request.target_id).await?;
            let original = lock_owned_row(tx.as_mut(), request.original_schedule_id, request.requester_id).await?;
            (original, target)
        };

        let moving = [original.id, target.id];
        ensure_swap_fits(tx.as_mut(), request.requester_id, &target, &moving).await?;
        ensure_swap_fits(tx.as_mut(), request.target_id, &original, &moving).await?;

        tx.update_schedule(&WorkSchedule {
            employee_id: request.target_id,
            ..original
        })
        .await?;
        tx.update_schedule(&WorkSchedule {
            employee_id: request.requester_id,
            ..target
        })
        .await?;
        tx.save_request(&request).await?;
        tx.commit().await.map_err(|e| match e {
            AppError::DoubleBooked(msg) => AppError::Conflict(msg),
            other => other,
        })?;

        record_transition("admin_approved");
        tracing::info!(
            request_id = id,
            requester_id = request.requester_id,
            target_id = request.target_id,
            "Shift change approved and swap applied"
        );
        Ok(request)
    }

    pub async fn admin_reject(&self, id: i32, reason: Option<String>) -> AppResult<ShiftChangeRequest> {
        let mut tx = self.store.begin().await?;
        let mut request = lock_request(tx.as_mut(), id).await?;

        request.reject_as_admin(reason, Utc::now()).map_err(|e| {
            tracing::warn!(request_id = id, error = %e, "Admin rejection refused");
            e
        })?;
        tx.save_request(&request).await?;
        tx.commit().await?;

        record_transition("admin_rejected");
        tracing::info!(request_id = id, "Shift change request rejected by admin");
        Ok(request)
    }

    pub async fn list_for_requester(&self, employee_id: i32) -> AppResult<Vec<ShiftChangeRequest>> {
        let mut tx = self.store.begin().await?;
        tx.requests_by_requester(employee_id).await
    }

    /// Requests waiting on `employee_id`'s answer.
    pub async fn list_incoming(&self, employee_id: i32) -> AppResult<Vec<ShiftChangeRequest>> {
        let mut tx = self.store.begin().await?;
        tx.requests_awaiting_target(employee_id).await
    }

    pub async fn list_awaiting_admin(&self) -> AppResult<Vec<ShiftChangeRequest>> {
        let mut tx = self.store.begin().await?;
        tx.requests_awaiting_admin().await
    }
}
