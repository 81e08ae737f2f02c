use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{handlers, middleware, openapi::ApiDoc, AppError};

pub fn build_router(state: Arc<crate::AppState>) -> Result<Router, AppError> {
    // CORS configuration
    let origin = state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| AppError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([HeaderName::from_static("x-request-id")])
        .allow_credentials(true);

    // Shift catalog routes
    let shift_routes = Router::new()
        .route("/", get(handlers::shifts_handler::list_shifts))
        .route("/", post(handlers::shifts_handler::create_shift))
        .route("/{id}", get(handlers::shifts_handler::get_shift))
        .route("/{id}", put(handlers::shifts_handler::update_shift))
        .route("/{id}", delete(handlers::shifts_handler::delete_shift))
        .route("/{id}/deactivate", post(handlers::shifts_handler::deactivate_shift));

    // Pattern routes
    let pattern_routes = Router::new()
        .route("/", post(handlers::patterns_handler::create_pattern))
        .route("/{id}", get(handlers::patterns_handler::get_pattern))
        .route("/{id}", delete(handlers::patterns_handler::delete_pattern))
        .route("/{id}/shifts", put(handlers::patterns_handler::replace_pattern_shifts))
        .route("/{id}/activate", post(handlers::patterns_handler::activate_pattern))
        .route("/{id}/regenerate", post(handlers::patterns_handler::regenerate_pattern));

    // Employee routes
    let employee_routes = Router::new()
        .route("/me", get(handlers::employees_handler::get_me))
        .route("/by-role", get(handlers::employees_handler::get_employees_by_role))
        .route("/{id}/patterns", get(handlers::patterns_handler::get_employee_patterns))
        .route("/{id}/patterns/active", get(handlers::patterns_handler::get_active_pattern))
        .route(
            "/{id}/patterns/deactivate",
            post(handlers::patterns_handler::deactivate_employee_patterns),
        );

    // Work schedule routes
    let schedule_routes = Router::new()
        .route("/", get(handlers::schedules_handler::get_schedules_for_range))
        .route("/", post(handlers::schedules_handler::assign_schedule))
        .route("/by-date", get(handlers::schedules_handler::get_schedules_for_date))
        .route("/coverage", get(handlers::schedules_handler::get_coverage))
        .route("/{id}", get(handlers::schedules_handler::get_schedule))
        .route("/{id}", delete(handlers::schedules_handler::unassign_schedule));

    // Shift change routes
    let shift_change_routes = Router::new()
        .route("/", post(handlers::shift_changes_handler::create_request))
        .route("/my", get(handlers::shift_changes_handler::get_my_requests))
        .route("/incoming", get(handlers::shift_changes_handler::get_incoming_requests))
        .route("/approvals", get(handlers::shift_changes_handler::get_approval_requests))
        .route("/{id}", get(handlers::shift_changes_handler::get_request))
        .route("/{id}/approve", post(handlers::shift_changes_handler::approve_request))
        .route("/{id}/reject", post(handlers::shift_changes_handler::reject_request))
        .route(
            "/{id}/admin-approve",
            post(handlers::shift_changes_handler::admin_approve_request),
        )
        .route(
            "/{id}/admin-reject",
            post(handlers::shift_changes_handler::admin_reject_request),
        );

    // Metrics, optionally behind X-Metrics-Key
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_metrics_key));

    Ok(Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/shifts", shift_routes)
        .nest("/api/patterns", pattern_routes)
        .nest("/api/employees", employee_routes)
        .nest("/api/schedules", schedule_routes)
        .nest("/api/shift-changes", shift_change_routes)
        .merge(metrics_routes)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .layer(from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(middleware::request_id_middleware))
        .layer(cors)
        .with_state(state))
}
