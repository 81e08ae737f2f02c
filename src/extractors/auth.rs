use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::future::Future;
use std::sync::Arc;

use crate::{auth, AppError, AppState};

/// Extracts the JWT from either the __session cookie (frontend) or the Authorization header
fn extract_token_from_request(parts: &Parts) -> Option<String> {
    if let Some(cookie_header) = parts.headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(value) = cookie.strip_prefix("__session=") {
                    return Some(value.to_string());
                }
            }
        }
    }

    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    None
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub employee_id: i32,
    pub full_name: String,
    pub is_admin: bool,
}

impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = extract_token_from_request(parts);
        let state = state.clone();

        async move {
            let token = token.ok_or_else(|| {
                AppError::Unauthorized("Missing authentication: no __session cookie or Authorization header".to_string())
            })?;

            let claims = auth::validate_jwt(&token, &state.config.jwt_secret).map_err(AppError::Unauthorized)?;
            let employee_id = claims.employee_id().map_err(AppError::Unauthorized)?;

            let employee = state.directory.employee(employee_id).await?.ok_or_else(|| {
                tracing::warn!(employee_id, "Token subject is not a known employee");
                AppError::Unauthorized(format!("Unknown employee {}", employee_id))
            })?;

            let roles = state.directory.roles_for(employee_id).await?;
            let is_admin = roles.iter().any(|r| r == &state.config.admin_role);

            tracing::debug!(employee_id, is_admin, "Request authenticated");
            Ok(AuthenticatedUser {
                employee_id,
                full_name: employee.full_name,
                is_admin,
            })
        }
    }
}
