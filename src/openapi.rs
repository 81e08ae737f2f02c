use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::Modify;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rota Engine API",
        version = "0.1.0",
        description = "Recurring shift patterns, work schedules and two-stage shift swaps"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // Health
        crate::handlers::health::health_check,

        // Employees
        crate::handlers::employees_handler::get_me,
        crate::handlers::employees_handler::get_employees_by_role,

        // Shifts
        crate::handlers::shifts_handler::list_shifts,
        crate::handlers::shifts_handler::get_shift,
        crate::handlers::shifts_handler::create_shift,
        crate::handlers::shifts_handler::update_shift,
        crate::handlers::shifts_handler::deactivate_shift,
        crate::handlers::shifts_handler::delete_shift,

        // Patterns
        crate::handlers::patterns_handler::create_pattern,
        crate::handlers::patterns_handler::get_pattern,
        crate::handlers::patterns_handler::replace_pattern_shifts,
        crate::handlers::patterns_handler::activate_pattern,
        crate::handlers::patterns_handler::regenerate_pattern,
        crate::handlers::patterns_handler::delete_pattern,
        crate::handlers::patterns_handler::get_employee_patterns,
        crate::handlers::patterns_handler::get_active_pattern,
        crate::handlers::patterns_handler::deactivate_employee_patterns,

        // Work schedules
        crate::handlers::schedules_handler::get_schedules_for_range,
        crate::handlers::schedules_handler::get_schedules_for_date,
        crate::handlers::schedules_handler::get_coverage,
        crate::handlers::schedules_handler::get_schedule,
        crate::handlers::schedules_handler::assign_schedule,
        crate::handlers::schedules_handler::unassign_schedule,

        // Shift changes
        crate::handlers::shift_changes_handler::create_request,
        crate::handlers::shift_changes_handler::get_my_requests,
        crate::handlers::shift_changes_handler::get_incoming_requests,
        crate::handlers::shift_changes_handler::get_approval_requests,
        crate::handlers::shift_changes_handler::get_request,
        crate::handlers::shift_changes_handler::approve_request,
        crate::handlers::shift_changes_handler::reject_request,
        crate::handlers::shift_changes_handler::admin_approve_request,
        crate::handlers::shift_changes_handler::admin_reject_request,
    ),
    components(
        schemas(
            // Core models
            crate::models::Employee,
            crate::models::CoveragePeer,
            crate::models::Shift,
            crate::models::ShiftSort,
            crate::models::ShiftPage,
            crate::models::SchedulePattern,
            crate::models::PatternShift,
            crate::models::PatternWithShifts,
            crate::models::RegenerationConflict,
            crate::models::RegenerationReport,
            crate::models::ScheduleOrigin,
            crate::models::WorkSchedule,
            crate::models::ApprovalStatus,
            crate::models::ShiftChangeRequest,

            // Input models
            crate::models::CreateShiftInput,
            crate::models::UpdateShiftInput,
            crate::models::ShiftMutationResponse,
            crate::models::PatternShiftInput,
            crate::models::CreatePatternInput,
            crate::models::ReplacePatternShiftsInput,
            crate::models::RegenerateInput,
            crate::models::PatternMutationResponse,
            crate::models::AssignScheduleInput,
            crate::models::ScheduleMutationResponse,
            crate::models::CreateShiftChangeInput,
            crate::models::ApproveInput,
            crate::models::RejectInput,

            crate::handlers::employees_handler::MeResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check"),
        (name = "employees", description = "Directory lookups"),
        (name = "shifts", description = "Shift catalog"),
        (name = "patterns", description = "Recurring schedule patterns and regeneration"),
        (name = "schedules", description = "Work schedules and coverage"),
        (name = "shift-changes", description = "Two-stage shift swap workflow"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("__session"))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}
