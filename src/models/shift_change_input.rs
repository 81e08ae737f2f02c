use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Input for proposing a swap of two work schedule rows
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateShiftChangeInput {
    pub original_schedule_id: Uuid,
    pub target_schedule_id: Uuid,
    pub reason: String,
}

/// Optional note attached to an approval
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ApproveInput {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RejectInput {
    pub reason: Option<String>,
}
