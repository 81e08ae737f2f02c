use super::auth::AuthenticatedUser;
use crate::{AppError, AppResult};

/// Administrator gate for rota management endpoints.
pub fn require_admin(auth: &AuthenticatedUser) -> AppResult<()> {
    if auth.is_admin {
        Ok(())
    } else {
        tracing::warn!(employee_id = auth.employee_id, "Admin permission required");
        Err(AppError::Forbidden("Administrator role required".to_string()))
    }
}

/// The caller themselves, or an administrator.
pub fn require_self_or_admin(auth: &AuthenticatedUser, employee_id: i32) -> AppResult<()> {
    if auth.employee_id == employee_id || auth.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Not allowed to act for employee {}",
            employee_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(employee_id: i32, is_admin: bool) -> AuthenticatedUser {
        AuthenticatedUser {
            employee_id,
            full_name: "Test".into(),
            is_admin,
        }
    }

    #[test]
    fn admin_gate() {
        assert!(require_admin(&user(1, true)).is_ok());
        assert!(matches!(require_admin(&user(1, false)), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn self_or_admin_gate() {
        assert!(require_self_or_admin(&user(1, false), 1).is_ok());
        assert!(require_self_or_admin(&user(2, true), 1).is_ok());
        assert!(require_self_or_admin(&user(2, false), 1).is_err());
    }
}
