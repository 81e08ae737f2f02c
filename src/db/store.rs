use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::map_unique_violation,
    models::{
        CreateShiftInput, NewShiftChangeRequest, NewWorkSchedule, PatternShift, PatternShiftInput, SchedulePattern,
        ScheduleOrigin, Shift, ShiftChangeRequest, ShiftSort, WorkSchedule,
    },
    store::{RotaStore, RotaTx},
    AppError, AppResult,
};

const SHIFT_COLUMNS: &str = "id, name, start_time, end_time, active, created_at, updated_at";

const PATTERN_COLUMNS: &str = "id, employee_id, name, active, created_at, updated_at";

const SCHEDULE_COLUMNS: &str = r#"
    ws.id,
    ws.employee_id,
    ws.shift_id,
    ws.work_date,
    ws.pattern_id,
    ws.week_number,
    ws.day_of_week,
    ws.created_at,
    ws.updated_at
"#;

const REQUEST_COLUMNS: &str = r#"
    id,
    requester_id,
    target_id,
    original_schedule_id,
    target_schedule_id,
    reason,
    target_status,
    admin_status,
    status,
    request_time,
    target_response_time,
    admin_response_time,
    target_response_message,
    admin_response_message
"#;

const OPEN_REQUEST_FILTER: &str = "admin_status = 'PENDING' AND target_status <> 'REJECTED'";

#[derive(Debug, FromRow)]
struct WorkScheduleRow {
    id: Uuid,
    employee_id: i32,
    shift_id: i32,
    work_date: NaiveDate,
    pattern_id: Option<i32>,
    week_number: Option<i16>,
    day_of_week: Option<i16>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WorkScheduleRow> for WorkSchedule {
    type Error = AppError;

    fn try_from(row: WorkScheduleRow) -> AppResult<Self> {
        Ok(WorkSchedule {
            id: row.id,
            employee_id: row.employee_id,
            shift_id: row.shift_id,
            work_date: row.work_date,
            origin: ScheduleOrigin::from_columns(row.pattern_id, row.week_number, row.day_of_week)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ShiftChangeRequestRow {
    id: i32,
    requester_id: i32,
    target_id: i32,
    original_schedule_id: Uuid,
    target_schedule_id: Uuid,
    reason: String,
    target_status: String,
    admin_status: String,
    status: String,
    request_time: DateTime<Utc>,
    target_response_time: Option<DateTime<Utc>>,
    admin_response_time: Option<DateTime<Utc>>,
    target_response_message: Option<String>,
    admin_response_message: Option<String>,
}

impl TryFrom<ShiftChangeRequestRow> for ShiftChangeRequest {
    type Error = AppError;

    fn try_from(row: ShiftChangeRequestRow) -> AppResult<Self> {
        Ok(ShiftChangeRequest {
            id: row.id,
            requester_id: row.requester_id,
            target_id: row.target_id,
            original_schedule_id: row.original_schedule_id,
            target_schedule_id: row.target_schedule_id,
            reason: row.reason,
            target_status: row.target_status.parse()?,
            admin_status: row.admin_status.parse()?,
            status: row.status.parse()?,
            request_time: row.request_time,
            target_response_time: row.target_response_time,
            admin_response_time: row.admin_response_time,
            target_response_message: row.target_response_message,
            admin_response_message: row.admin_response_message,
        })
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

fn duplicate_shift_name(e: sqlx::Error, name: &str) -> AppError {
    if is_unique_violation(&e) {
        AppError::DuplicateName(format!("A shift named '{}' already exists", name))
    } else {
        AppError::Database(e)
    }
}

fn competing_activation(e: sqlx::Error, employee_id: i32) -> AppError {
    if is_unique_violation(&e) {
        AppError::Conflict(format!(
            "Another pattern for employee {} was activated concurrently",
            employee_id
        ))
    } else {
        AppError::Database(e)
    }
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23503")
        .unwrap_or(false)
}

fn shift_still_referenced(e: sqlx::Error, id: i32) -> AppError {
    if is_foreign_key_violation(&e) {
        AppError::InUse(format!("Shift {} is referenced by schedules or patterns", id))
    } else {
        AppError::Database(e)
    }
}

fn duplicate_open_request(e: sqlx::Error, schedule_id: Uuid) -> AppError {
    if is_unique_violation(&e) {
        AppError::DuplicatePending(format!(
            "A request is already open for work schedule {}",
            schedule_id
        ))
    } else {
        AppError::Database(e)
    }
}

fn into_schedules(rows: Vec<WorkScheduleRow>) -> AppResult<Vec<WorkSchedule>> {
    rows.into_iter().map(WorkSchedule::try_from).collect()
}

fn into_requests(rows: Vec<ShiftChangeRequestRow>) -> AppResult<Vec<ShiftChangeRequest>> {
    rows.into_iter().map(ShiftChangeRequest::try_from).collect()
}

/// Postgres backend. Row locks come from `SELECT ... FOR UPDATE`.
#[derive(Clone)]
pub struct PgRotaStore {
    pool: PgPool,
}

impl PgRotaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RotaStore for PgRotaStore {
    async fn begin(&self) -> AppResult<Box<dyn RotaTx>> {
        let tx = self.pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to open transaction");
            e
        })?;
        Ok(Box::new(PgRotaTx { tx }))
    }
}

pub struct PgRotaTx {
    tx: Transaction<'static, Postgres>,
}

impl PgRotaTx {
    async fn fetch_schedules(&mut self, sql: &str, binds: ScheduleBinds) -> AppResult<Vec<WorkSchedule>> {
        let mut query = sqlx::query_as::<_, WorkScheduleRow>(sql);
        match binds {
            ScheduleBinds::EmployeeRange(employee_id, start, end) => {
                query = query.bind(employee_id).bind(start).bind(end);
            }
            ScheduleBinds::Range(start, end) => {
                query = query.bind(start).bind(end);
            }
            ScheduleBinds::IdRange(id, start, end) => {
                query = query.bind(id).bind(start).bind(end);
            }
            ScheduleBinds::DateId(date, id) => {
                query = query.bind(date).bind(id);
            }
        }
        let rows = query.fetch_all(&mut *self.tx).await?;
        into_schedules(rows)
    }

    async fn fetch_requests(&mut self, filter: &str, bind: Option<i32>) -> AppResult<Vec<ShiftChangeRequest>> {
        let sql = format!(
            r#"SELECT {} FROM "ShiftChangeRequests" WHERE {} ORDER BY request_time DESC, id DESC"#,
            REQUEST_COLUMNS, filter
        );
        let mut query = sqlx::query_as::<_, ShiftChangeRequestRow>(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&mut *self.tx).await?;
        into_requests(rows)
    }

    async fn fetch_one_request(&mut self, id: i32, for_update: bool) -> AppResult<Option<ShiftChangeRequest>> {
        let sql = format!(
            r#"SELECT {} FROM "ShiftChangeRequests" WHERE id = $1{}"#,
            REQUEST_COLUMNS,
            if for_update { " FOR UPDATE" } else { "" }
        );
        let row = sqlx::query_as::<_, ShiftChangeRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(ShiftChangeRequest::try_from).transpose()
    }

    async fn fetch_one_pattern(&mut self, id: i32, for_update: bool) -> AppResult<Option<SchedulePattern>> {
        let sql = format!(
            r#"SELECT {} FROM "SchedulePatterns" WHERE id = $1{}"#,
            PATTERN_COLUMNS,
            if for_update { " FOR UPDATE" } else { "" }
        );
        Ok(sqlx::query_as::<_, SchedulePattern>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn fetch_one_schedule(&mut self, id: Uuid, for_update: bool) -> AppResult<Option<WorkSchedule>> {
        let sql = format!(
            r#"SELECT {} FROM "WorkSchedules" ws WHERE ws.id = $1{}"#,
            SCHEDULE_COLUMNS,
            if for_update { " FOR UPDATE" } else { "" }
        );
        let row = sqlx::query_as::<_, WorkScheduleRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(WorkSchedule::try_from).transpose()
    }
}

enum ScheduleBinds {
    EmployeeRange(i32, NaiveDate, NaiveDate),
    Range(NaiveDate, NaiveDate),
    IdRange(i32, NaiveDate, NaiveDate),
    DateId(NaiveDate, i32),
}

#[async_trait]
impl RotaTx for PgRotaTx {
    async fn insert_shift(&mut self, input: &CreateShiftInput) -> AppResult<Shift> {
        let sql = format!(
            r#"INSERT INTO "Shifts" (name, start_time, end_time) VALUES ($1, $2, $3) RETURNING {}"#,
            SHIFT_COLUMNS
        );
        let shift = sqlx::query_as::<_, Shift>(&sql)
            .bind(&input.name)
            .bind(input.start_time)
            .bind(input.end_time)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| duplicate_shift_name(e, &input.name))?;
        Ok(shift)
    }

    async fn find_shift(&mut self, id: i32) -> AppResult<Option<Shift>> {
        let sql = format!(r#"SELECT {} FROM "Shifts" WHERE id = $1"#, SHIFT_COLUMNS);
        Ok(sqlx::query_as::<_, Shift>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn find_shift_by_name(&mut self, name: &str) -> AppResult<Option<Shift>> {
        let sql = format!(r#"SELECT {} FROM "Shifts" WHERE LOWER(name) = LOWER($1)"#, SHIFT_COLUMNS);
        Ok(sqlx::query_as::<_, Shift>(&sql)
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn save_shift(&mut self, shift: &Shift) -> AppResult<Shift> {
        let sql = format!(
            r#"
            UPDATE "Shifts"
            SET name = $1, start_time = $2, end_time = $3, active = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            SHIFT_COLUMNS
        );
        sqlx::query_as::<_, Shift>(&sql)
            .bind(&shift.name)
            .bind(shift.start_time)
            .bind(shift.end_time)
            .bind(shift.active)
            .bind(shift.id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| duplicate_shift_name(e, &shift.name))?
            .ok_or_else(|| AppError::NotFound(format!("Shift {} not found", shift.id)))
    }

    async fn list_shifts(&mut self, sort: ShiftSort, offset: i64, limit: i64) -> AppResult<(Vec<Shift>, i64)> {
        let order = match sort {
            ShiftSort::Name => "LOWER(name), id",
            ShiftSort::Start => "start_time, id",
            ShiftSort::Id => "id",
        };
        let sql = format!(
            r#"SELECT {} FROM "Shifts" ORDER BY {} OFFSET $1 LIMIT $2"#,
            SHIFT_COLUMNS, order
        );
        let shifts = sqlx::query_as::<_, Shift>(&sql)
            .bind(offset)
            .bind(limit)
            .fetch_all(&mut *self.tx)
            .await?;

        let total: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "Shifts""#)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok((shifts, total))
    }

    async fn shift_reference_count(&mut self, id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT
                (SELECT COUNT(*) FROM "WorkSchedules" WHERE shift_id = $1)
                + (SELECT COUNT(*) FROM "PatternShifts" WHERE shift_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count)
    }

    async fn delete_shift(&mut self, id: i32) -> AppResult<bool> {
        let result = sqlx::query(r#"DELETE FROM "Shifts" WHERE id = $1"#)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| shift_still_referenced(e, id))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_pattern(&mut self, employee_id: i32, name: &str) -> AppResult<SchedulePattern> {
        let sql = format!(
            r#"INSERT INTO "SchedulePatterns" (employee_id, name, active) VALUES ($1, $2, TRUE) RETURNING {}"#,
            PATTERN_COLUMNS
        );
        sqlx::query_as::<_, SchedulePattern>(&sql)
            .bind(employee_id)
            .bind(name)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| competing_activation(e, employee_id))
    }

    async fn find_pattern(&mut self, id: i32) -> AppResult<Option<SchedulePattern>> {
        self.fetch_one_pattern(id, false).await
    }

    async fn lock_pattern(&mut self, id: i32) -> AppResult<Option<SchedulePattern>> {
        self.fetch_one_pattern(id, true).await
    }

    async fn patterns_for_employee(&mut self, employee_id: i32) -> AppResult<Vec<SchedulePattern>> {
        let sql = format!(
            r#"SELECT {} FROM "SchedulePatterns" WHERE employee_id = $1 ORDER BY created_at DESC, id DESC"#,
            PATTERN_COLUMNS
        );
        Ok(sqlx::query_as::<_, SchedulePattern>(&sql)
            .bind(employee_id)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn active_pattern(&mut self, employee_id: i32) -> AppResult<Option<SchedulePattern>> {
        let sql = format!(
            r#"SELECT {} FROM "SchedulePatterns" WHERE employee_id = $1 AND active ORDER BY id DESC LIMIT 1"#,
            PATTERN_COLUMNS
        );
        Ok(sqlx::query_as::<_, SchedulePattern>(&sql)
            .bind(employee_id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn set_pattern_active(&mut self, id: i32, active: bool) -> AppResult<()> {
        let result = sqlx::query(r#"UPDATE "SchedulePatterns" SET active = $1, updated_at = NOW() WHERE id = $2"#)
            .bind(active)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("Another pattern was activated concurrently with pattern {}", id))
                } else {
                    AppError::Database(e)
                }
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Pattern {} not found", id)));
        }
        Ok(())
    }

    async fn deactivate_patterns(&mut self, employee_id: i32, except: Option<i32>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE "SchedulePatterns"
            SET active = FALSE, updated_at = NOW()
            WHERE employee_id = $1 AND active AND ($2::INTEGER IS NULL OR id <> $2)
            "#,
        )
        .bind(employee_id)
        .bind(except)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_pattern(&mut self, id: i32) -> AppResult<bool> {
        let result = sqlx::query(r#"DELETE FROM "SchedulePatterns" WHERE id = $1"#)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn pattern_shifts(&mut self, pattern_id: i32) -> AppResult<Vec<PatternShift>> {
        Ok(sqlx::query_as::<_, PatternShift>(
            r#"
            SELECT pattern_id, week_number, day_of_week, shift_id
            FROM "PatternShifts"
            WHERE pattern_id = $1
            ORDER BY week_number, day_of_week
            "#,
        )
        .bind(pattern_id)
        .fetch_all(&mut *self.tx)
        .await?)
    }

    async fn replace_pattern_shifts(
        &mut self,
        pattern_id: i32,
        shifts: &[PatternShiftInput],
    ) -> AppResult<Vec<PatternShift>> {
        sqlx::query(r#"DELETE FROM "PatternShifts" WHERE pattern_id = $1"#)
            .bind(pattern_id)
            .execute(&mut *self.tx)
            .await?;

        for cell in shifts {
            sqlx::query(
                r#"
                INSERT INTO "PatternShifts" (pattern_id, week_number, day_of_week, shift_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(pattern_id)
            .bind(cell.week_number)
            .bind(cell.day_of_week)
            .bind(cell.shift_id)
            .execute(&mut *self.tx)
            .await?;
        }

        sqlx::query(r#"UPDATE "SchedulePatterns" SET updated_at = NOW() WHERE id = $1"#)
            .bind(pattern_id)
            .execute(&mut *self.tx)
            .await?;

        self.pattern_shifts(pattern_id).await
    }

    async fn find_schedule(&mut self, id: Uuid) -> AppResult<Option<WorkSchedule>> {
        self.fetch_one_schedule(id, false).await
    }

    async fn lock_schedule(&mut self, id: Uuid) -> AppResult<Option<WorkSchedule>> {
        self.fetch_one_schedule(id, true).await
    }

    async fn schedules_for_employee_on(&mut self, employee_id: i32, date: NaiveDate) -> AppResult<Vec<WorkSchedule>> {
        self.schedules_for_employee(employee_id, date, date).await
    }

    async fn schedules_for_employee(
        &mut self,
        employee_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<WorkSchedule>> {
        let sql = format!(
            r#"
            SELECT {} FROM "WorkSchedules" ws
            WHERE ws.employee_id = $1 AND ws.work_date BETWEEN $2 AND $3
            ORDER BY ws.work_date, ws.id
            "#,
            SCHEDULE_COLUMNS
        );
        self.fetch_schedules(&sql, ScheduleBinds::EmployeeRange(employee_id, start, end))
            .await
    }

    async fn schedules_in_range(&mut self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<WorkSchedule>> {
        let sql = format!(
            r#"
            SELECT {} FROM "WorkSchedules" ws
            LEFT JOIN "Employees" e ON e.id = ws.employee_id
            WHERE ws.work_date BETWEEN $1 AND $2
            ORDER BY ws.work_date, COALESCE(e.full_name, ''), ws.id
            "#,
            SCHEDULE_COLUMNS
        );
        self.fetch_schedules(&sql, ScheduleBinds::Range(start, end)).await
    }

    async fn schedules_from_pattern(
        &mut self,
        pattern_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<WorkSchedule>> {
        let sql = format!(
            r#"
            SELECT {} FROM "WorkSchedules" ws
            WHERE ws.pattern_id = $1 AND ws.work_date BETWEEN $2 AND $3
            ORDER BY ws.work_date, ws.id
            FOR UPDATE
            "#,
            SCHEDULE_COLUMNS
        );
        self.fetch_schedules(&sql, ScheduleBinds::IdRange(pattern_id, start, end))
            .await
    }

    async fn schedules_with_shift_on(&mut self, date: NaiveDate, shift_id: i32) -> AppResult<Vec<WorkSchedule>> {
        let sql = format!(
            r#"
            SELECT {} FROM "WorkSchedules" ws
            LEFT JOIN "Employees" e ON e.id = ws.employee_id
            WHERE ws.work_date = $1 AND ws.shift_id = $2
            ORDER BY COALESCE(e.full_name, ''), ws.id
            "#,
            SCHEDULE_COLUMNS
        );
        self.fetch_schedules(&sql, ScheduleBinds::DateId(date, shift_id)).await
    }

    async fn insert_schedule(&mut self, new: &NewWorkSchedule) -> AppResult<WorkSchedule> {
        // The unique constraint is deferred; check eagerly so callers get the error at the write.
        let taken: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM "WorkSchedules" WHERE employee_id = $1 AND work_date = $2)"#,
        )
        .bind(new.employee_id)
        .bind(new.work_date)
        .fetch_one(&mut *self.tx)
        .await?;

        if taken {
            return Err(AppError::DoubleBooked(format!(
                "Employee {} already has a shift on {}",
                new.employee_id, new.work_date
            )));
        }

        let (pattern_id, week_number, day_of_week) = new.origin.to_columns();
        let sql = format!(
            r#"
            INSERT INTO "WorkSchedules" AS ws (
                id, employee_id, shift_id, work_date, pattern_id, week_number, day_of_week
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SCHEDULE_COLUMNS
        );
        let row = sqlx::query_as::<_, WorkScheduleRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.employee_id)
            .bind(new.shift_id)
            .bind(new.work_date)
            .bind(pattern_id)
            .bind(week_number)
            .bind(day_of_week)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| {
                map_unique_violation(e, || {
                    format!("Employee {} already has a shift on {}", new.employee_id, new.work_date)
                })
            })?;
        row.try_into()
    }

    async fn update_schedule(&mut self, schedule: &WorkSchedule) -> AppResult<WorkSchedule> {
        let (pattern_id, week_number, day_of_week) = schedule.origin.to_columns();
        let sql = format!(
            r#"
            UPDATE "WorkSchedules" AS ws
            SET employee_id = $1, shift_id = $2, work_date = $3,
                pattern_id = $4, week_number = $5, day_of_week = $6, updated_at = NOW()
            WHERE ws.id = $7
            RETURNING {}
            "#,
            SCHEDULE_COLUMNS
        );
        let row = sqlx::query_as::<_, WorkScheduleRow>(&sql)
            .bind(schedule.employee_id)
            .bind(schedule.shift_id)
            .bind(schedule.work_date)
            .bind(pattern_id)
            .bind(week_number)
            .bind(day_of_week)
            .bind(schedule.id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work schedule {} not found", schedule.id)))?;
        row.try_into()
    }

    async fn delete_schedule(&mut self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(r#"DELETE FROM "WorkSchedules" WHERE id = $1"#)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_request(&mut self, new: &NewShiftChangeRequest) -> AppResult<ShiftChangeRequest> {
        let sql = format!(
            r#"
            INSERT INTO "ShiftChangeRequests" (
                requester_id, target_id, original_schedule_id, target_schedule_id, reason, request_time
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );
        let row = sqlx::query_as::<_, ShiftChangeRequestRow>(&sql)
            .bind(new.requester_id)
            .bind(new.target_id)
            .bind(new.original_schedule_id)
            .bind(new.target_schedule_id)
            .bind(&new.reason)
            .bind(new.request_time)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| duplicate_open_request(e, new.original_schedule_id))?;
        row.try_into()
    }

    async fn find_request(&mut self, id: i32) -> AppResult<Option<ShiftChangeRequest>> {
        self.fetch_one_request(id, false).await
    }

    async fn lock_request(&mut self, id: i32) -> AppResult<Option<ShiftChangeRequest>> {
        self.fetch_one_request(id, true).await
    }

    async fn save_request(&mut self, request: &ShiftChangeRequest) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE "ShiftChangeRequests"
            SET target_status = $1, admin_status = $2, status = $3,
                target_response_time = $4, admin_response_time = $5,
                target_response_message = $6, admin_response_message = $7
            WHERE id = $8
            "#,
        )
        .bind(request.target_status.as_str())
        .bind(request.admin_status.as_str())
        .bind(request.status.as_str())
        .bind(request.target_response_time)
        .bind(request.admin_response_time)
        .bind(&request.target_response_message)
        .bind(&request.admin_response_message)
        .bind(request.id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Shift change request {} not found", request.id)));
        }
        Ok(())
    }

    async fn open_requests_for_schedules(&mut self, ids: &[Uuid]) -> AppResult<Vec<ShiftChangeRequest>> {
        let sql = format!(
            r#"
            SELECT {} FROM "ShiftChangeRequests"
            WHERE {} AND (original_schedule_id = ANY($1) OR target_schedule_id = ANY($1))
            ORDER BY request_time DESC, id DESC
            "#,
            REQUEST_COLUMNS, OPEN_REQUEST_FILTER
        );
        let rows = sqlx::query_as::<_, ShiftChangeRequestRow>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&mut *self.tx)
            .await?;
        into_requests(rows)
    }

    async fn requests_by_requester(&mut self, employee_id: i32) -> AppResult<Vec<ShiftChangeRequest>> {
        self.fetch_requests("requester_id = $1", Some(employee_id)).await
    }

    async fn requests_awaiting_target(&mut self, employee_id: i32) -> AppResult<Vec<ShiftChangeRequest>> {
        self.fetch_requests(
            "target_id = $1 AND target_status = 'PENDING' AND admin_status = 'PENDING'",
            Some(employee_id),
        )
        .await
    }

    async fn requests_awaiting_admin(&mut self) -> AppResult<Vec<ShiftChangeRequest>> {
        self.fetch_requests("target_status = 'APPROVED' AND admin_status = 'PENDING'", None)
            .await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Transaction commit failed");
            map_unique_violation(e, || "Another write booked the same employee and date".to_string())
        })
    }
}
