use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ApprovalStatus::Pending),
            "APPROVED" => Ok(ApprovalStatus::Approved),
            "REJECTED" => Ok(ApprovalStatus::Rejected),
            other => Err(AppError::Internal(format!("Unknown approval status: {}", other))),
        }
    }
}

/// Overall status stored next to the two stage statuses.
pub fn derive_overall(target: ApprovalStatus, admin: ApprovalStatus) -> ApprovalStatus {
    use ApprovalStatus::*;
    match (target, admin) {
        (Rejected, _) | (_, Rejected) => Rejected,
        (Approved, Approved) => Approved,
        _ => Pending,
    }
}

/// The reachable states of a request, named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    AwaitingTarget,
    AwaitingAdmin,
    Completed,
    AdminRejected,
    TargetRejected,
}

impl RequestState {
    pub fn from_statuses(target: ApprovalStatus, admin: ApprovalStatus) -> Option<Self> {
        use ApprovalStatus::*;
        match (target, admin) {
            (Pending, Pending) => Some(RequestState::AwaitingTarget),
            (Approved, Pending) => Some(RequestState::AwaitingAdmin),
            (Approved, Approved) => Some(RequestState::Completed),
            (Approved, Rejected) | (Pending, Rejected) => Some(RequestState::AdminRejected),
            (Rejected, Pending) => Some(RequestState::TargetRejected),
            (Pending, Approved) | (Rejected, Approved) | (Rejected, Rejected) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestState::AwaitingTarget | RequestState::AwaitingAdmin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShiftChangeRequest {
    pub id: i32,
    pub requester_id: i32,
    pub target_id: i32,
    pub original_schedule_id: Uuid,
    pub target_schedule_id: Uuid,
    pub reason: String,
    pub target_status: ApprovalStatus,
    pub admin_status: ApprovalStatus,
    pub status: ApprovalStatus,
    pub request_time: DateTime<Utc>,
    pub target_response_time: Option<DateTime<Utc>>,
    pub admin_response_time: Option<DateTime<Utc>>,
    pub target_response_message: Option<String>,
    pub admin_response_message: Option<String>,
}

impl ShiftChangeRequest {
    pub fn state(&self) -> AppResult<RequestState> {
        RequestState::from_statuses(self.target_status, self.admin_status).ok_or_else(|| {
            AppError::Internal(format!(
                "Shift change request {} has inconsistent statuses ({}, {})",
                self.id, self.target_status, self.admin_status
            ))
        })
    }

    pub fn is_open(&self) -> bool {
        self.state().map(|s| !s.is_terminal()).unwrap_or(false)
    }

    fn expect_state(&self, allowed: &[RequestState], action: &str) -> AppResult<()> {
        let state = self.state()?;
        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(AppError::InvalidState(format!(
                "Cannot {} shift change request {} in state {:?}",
                action, self.id, state
            )))
        }
    }

    /// Target employee accepts or declines. Fields are untouched on error.
    pub fn respond_as_target(
        &mut self,
        accept: bool,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let action = if accept { "approve" } else { "reject" };
        self.expect_state(&[RequestState::AwaitingTarget], action)?;

        self.target_status = if accept {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Rejected
        };
        self.target_response_time = Some(now);
        self.target_response_message = message;
        self.status = derive_overall(self.target_status, self.admin_status);
        Ok(())
    }

    pub fn approve_as_admin(&mut self, message: Option<String>, now: DateTime<Utc>) -> AppResult<()> {
        self.expect_state(&[RequestState::AwaitingAdmin], "admin-approve")?;

        self.admin_status = ApprovalStatus::Approved;
        self.admin_response_time = Some(now);
        self.admin_response_message = message;
        self.status = derive_overall(self.target_status, self.admin_status);
        Ok(())
    }

    /// Admin veto. Legal before the target has answered as well.
    pub fn reject_as_admin(&mut self, reason: Option<String>, now: DateTime<Utc>) -> AppResult<()> {
        self.expect_state(
            &[RequestState::AwaitingTarget, RequestState::AwaitingAdmin],
            "admin-reject",
        )?;

        self.admin_status = ApprovalStatus::Rejected;
        self.admin_response_time = Some(now);
        self.admin_response_message = reason;
        self.status = derive_overall(self.target_status, self.admin_status);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShiftChangeRequest {
    pub requester_id: i32,
    pub target_id: i32,
    pub original_schedule_id: Uuid,
    pub target_schedule_id: Uuid,
    pub reason: String,
    pub request_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApprovalStatus::*;

    fn pending_request() -> ShiftChangeRequest {
        ShiftChangeRequest {
            id: 7,
            requester_id: 1,
            target_id: 2,
            original_schedule_id: Uuid::new_v4(),
            target_schedule_id: Uuid::new_v4(),
            reason: "family event".to_string(),
            target_status: Pending,
            admin_status: Pending,
            status: Pending,
            request_time: Utc::now(),
            target_response_time: None,
            admin_response_time: None,
            target_response_message: None,
            admin_response_message: None,
        }
    }

    #[test]
    fn overall_status_follows_both_stages() {
        assert_eq!(derive_overall(Pending, Pending), Pending);
        assert_eq!(derive_overall(Approved, Pending), Pending);
        assert_eq!(derive_overall(Approved, Approved), Approved);
        assert_eq!(derive_overall(Approved, Rejected), Rejected);
        assert_eq!(derive_overall(Rejected, Pending), Rejected);
        assert_eq!(derive_overall(Pending, Rejected), Rejected);
    }

    #[test]
    fn target_cannot_answer_twice() {
        let mut request = pending_request();
        request.respond_as_target(true, None, Utc::now()).unwrap();
        assert_eq!(request.state().unwrap(), RequestState::AwaitingAdmin);

        let before = request.clone();
        let err = request.respond_as_target(false, None, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(request, before);
    }

    #[test]
    fn admin_approval_requires_target_approval() {
        let mut request = pending_request();
        let err = request.approve_as_admin(None, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(request.admin_status, Pending);
        assert!(request.admin_response_time.is_none());
    }

    #[test]
    fn admin_pre_emptive_reject_blocks_target_approval() {
        let mut request = pending_request();
        request.reject_as_admin(Some("short staffed".into()), Utc::now()).unwrap();
        assert_eq!(request.status, Rejected);
        assert_eq!(request.state().unwrap(), RequestState::AdminRejected);

        let err = request.respond_as_target(true, None, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(request.target_status, Pending);
    }

    #[test]
    fn target_rejection_is_terminal_for_admin() {
        let mut request = pending_request();
        request.respond_as_target(false, Some("busy".into()), Utc::now()).unwrap();
        assert_eq!(request.status, Rejected);
        assert!(request.reject_as_admin(None, Utc::now()).is_err());
        assert!(request.approve_as_admin(None, Utc::now()).is_err());
        assert!(!request.is_open());
    }

    #[test]
    fn full_approval_sets_both_timestamps() {
        let mut request = pending_request();
        request.respond_as_target(true, None, Utc::now()).unwrap();
        request.approve_as_admin(Some("ok".into()), Utc::now()).unwrap();
        assert_eq!(request.status, Approved);
        assert!(request.target_response_time.is_some());
        assert!(request.admin_response_time.is_some());
        assert_eq!(request.state().unwrap(), RequestState::Completed);
    }

    #[test]
    fn unreachable_status_pairs_have_no_state() {
        assert!(RequestState::from_statuses(Pending, Approved).is_none());
        assert!(RequestState::from_statuses(Rejected, Rejected).is_none());
        assert!("WITHDRAWN".parse::<ApprovalStatus>().is_err());
    }
}
