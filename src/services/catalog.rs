use std::sync::Arc;

use crate::{
    models::{CreateShiftInput, ListShiftsQuery, Shift, ShiftPage, UpdateShiftInput},
    store::{RotaStore, RotaTx},
    AppError, AppResult,
};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 200;

/// Resolves a shift that new patterns or assignments may point at.
pub async fn require_usable_shift(tx: &mut dyn RotaTx, id: i32) -> AppResult<Shift> {
    let shift = tx
        .find_shift(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Shift {} not found", id)))?;

    if !shift.active {
        return Err(AppError::Validation(format!("Shift '{}' is inactive", shift.name)));
    }
    Ok(shift)
}

fn clean_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Shift name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

#[derive(Clone)]
pub struct ShiftCatalog {
    store: Arc<dyn RotaStore>,
}

impl ShiftCatalog {
    pub fn new(store: Arc<dyn RotaStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: CreateShiftInput) -> AppResult<Shift> {
        let input = CreateShiftInput {
            name: clean_name(&input.name)?,
            ..input
        };

        let mut tx = self.store.begin().await?;
        if let Some(existing) = tx.find_shift_by_name(&input.name).await? {
            return Err(AppError::DuplicateName(format!(
                "A shift named '{}' already exists",
                existing.name
            )));
        }

        let shift = tx.insert_shift(&input).await?;
        tx.commit().await?;

        tracing::info!(shift_id = shift.id, name = %shift.name, "Shift created");
        Ok(shift)
    }

    pub async fn get(&self, id: i32) -> AppResult<Shift> {
        let mut tx = self.store.begin().await?;
        tx.find_shift(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shift {} not found", id)))
    }

    pub async fn update(&self, id: i32, input: UpdateShiftInput) -> AppResult<Shift> {
        if input.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }

        let mut tx = self.store.begin().await?;
        let mut shift = tx
            .find_shift(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shift {} not found", id)))?;

        if let Some(name) = input.name {
            let name = clean_name(&name)?;
            if let Some(other) = tx.find_shift_by_name(&name).await? {
                if other.id != id {
                    return Err(AppError::DuplicateName(format!(
                        "A shift named '{}' already exists",
                        other.name
                    )));
                }
            }
            shift.name = name;
        }
        if let Some(start_time) = input.start_time {
            shift.start_time = start_time;
        }
        if let Some(end_time) = input.end_time {
            shift.end_time = end_time;
        }
        if let Some(active) = input.active {
            shift.active = active;
        }

        let shift = tx.save_shift(&shift).await?;
        tx.commit().await?;

        tracing::info!(shift_id = id, "Shift updated");
        Ok(shift)
    }

    /// Page numbers start at 0.
    pub async fn list(&self, query: &ListShiftsQuery) -> AppResult<ShiftPage> {
        let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = i64::from(query.page) * i64::from(size);

        let mut tx = self.store.begin().await?;
        let (items, total) = tx.list_shifts(query.sort, offset, i64::from(size)).await?;

        Ok(ShiftPage {
            items,
            page: query.page,
            size,
            total,
        })
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let shift = tx
            .find_shift(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shift {} not found", id)))?;

        let references = tx.shift_reference_count(id).await?;
        if references > 0 {
            return Err(AppError::InUse(format!(
                "Shift '{}' is referenced by {} schedules or pattern cells; deactivate it instead",
                shift.name, references
            )));
        }

        tx.delete_shift(id).await?;
        tx.commit().await?;

        tracing::info!(shift_id = id, "Shift deleted");
        Ok(())
    }

    pub async fn deactivate(&self, id: i32) -> AppResult<Shift> {
        let mut tx = self.store.begin().await?;
        let mut shift = tx
            .find_shift(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shift {} not found", id)))?;

        shift.active = false;
        let shift = tx.save_shift(&shift).await?;
        tx.commit().await?;

        tracing::info!(shift_id = id, "Shift deactivated");
        Ok(shift)
    }
}
