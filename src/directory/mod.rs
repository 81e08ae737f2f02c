//! Identity/role provider contract. Accounts and role management live
//! elsewhere; the rota core only asks who exists and which roles they hold.

pub mod pg;

use async_trait::async_trait;

use crate::{models::Employee, AppError, AppResult};

pub use pg::PgRoleDirectory;

#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn employee(&self, id: i32) -> AppResult<Option<Employee>>;

    /// Role names held by the employee. Unknown employees hold none.
    async fn roles_for(&self, employee_id: i32) -> AppResult<Vec<String>>;

    /// Ordered by full name.
    async fn employees_with_role(&self, role: &str) -> AppResult<Vec<Employee>>;

    /// Union over `roles`, deduplicated, ordered by full name.
    async fn employees_with_any_role(&self, roles: &[String]) -> AppResult<Vec<Employee>> {
        let mut employees: Vec<Employee> = Vec::new();
        for role in roles {
            for employee in self.employees_with_role(role).await? {
                if !employees.iter().any(|e| e.id == employee.id) {
                    employees.push(employee);
                }
            }
        }
        employees.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(employees)
    }
}

pub async fn require_employee(directory: &dyn RoleDirectory, id: i32) -> AppResult<Employee> {
    directory
        .employee(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", id)))
}
