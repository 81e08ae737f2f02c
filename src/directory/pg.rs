use async_trait::async_trait;
use moka::future::Cache;
use sqlx::PgPool;
use std::time::Duration;

use super::RoleDirectory;
use crate::{models::Employee, AppResult};

/// Reads the directory tables. Role lookups are cached per employee for
/// thirty seconds, since every admin check goes through them.
#[derive(Clone)]
pub struct PgRoleDirectory {
    pool: PgPool,
    roles_cache: Cache<i32, Vec<String>>,
}

impl PgRoleDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            roles_cache: Cache::builder()
                .time_to_live(Duration::from_secs(30))
                .max_capacity(1_000)
                .build(),
        }
    }
}

#[async_trait]
impl RoleDirectory for PgRoleDirectory {
    async fn employee(&self, id: i32) -> AppResult<Option<Employee>> {
        Ok(
            sqlx::query_as::<_, Employee>(r#"SELECT id, full_name FROM "Employees" WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn roles_for(&self, employee_id: i32) -> AppResult<Vec<String>> {
        if let Some(cached) = self.roles_cache.get(&employee_id).await {
            return Ok(cached);
        }

        let roles: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.role_name
            FROM "EmployeeRoles" er
            JOIN "Roles" r ON r.id = er.role_id
            WHERE er.employee_id = $1
            ORDER BY r.role_name
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        self.roles_cache.insert(employee_id, roles.clone()).await;
        Ok(roles)
    }

    async fn employees_with_role(&self, role: &str) -> AppResult<Vec<Employee>> {
        Ok(sqlx::query_as::<_, Employee>(
            r#"
            SELECT DISTINCT e.id, e.full_name
            FROM "Employees" e
            JOIN "EmployeeRoles" er ON er.employee_id = e.id
            JOIN "Roles" r ON r.id = er.role_id
            WHERE r.role_name = $1
            ORDER BY e.full_name, e.id
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?)
    }
}
