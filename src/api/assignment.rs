//! Assignment management: which employee must confirm presence at which
//! location, on which weekdays, over which shift.

use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySqlPool};
use utoipa::ToSchema;

use crate::api::{fmt_hhmmss, parse_time_of_day};
use crate::auth::auth::AuthUser;
use crate::error::{ApiError, is_constraint_violation};
use crate::model::location::LocationSnapshot;
use crate::model::weekday::WeekdaySet;

#[derive(Deserialize, ToSchema)]
pub struct CreateAssignment {
    #[schema(example = 12)]
    pub employee_id: u64,
    #[schema(example = 3)]
    pub location_id: u64,
    #[schema(value_type = Vec<String>, example = json!(["monday", "wednesday", "friday"]))]
    pub weekdays: WeekdaySet,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "18:00")]
    pub end_time: String,
}

#[derive(FromRow)]
struct AssignmentRow {
    id: u64,
    employee_id: u64,
    employee_name: String,
    location_id: u64,
    location_name: String,
    weekdays: WeekdaySet,
    start_time: NaiveTime,
    end_time: NaiveTime,
    active: bool,
}

#[derive(Serialize, ToSchema)]
pub struct AssignmentEntry {
    pub id: u64,
    pub employee_id: u64,
    pub employee_name: String,
    pub location_id: u64,
    pub location_name: String,
    #[schema(value_type = Vec<String>)]
    pub weekdays: WeekdaySet,
    #[schema(example = "09:00:00")]
    pub start_time: String,
    #[schema(example = "18:00:00")]
    pub end_time: String,
    pub active: bool,
}

impl From<AssignmentRow> for AssignmentEntry {
    fn from(row: AssignmentRow) -> Self {
        AssignmentEntry {
            id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            location_id: row.location_id,
            location_name: row.location_name,
            weekdays: row.weekdays,
            start_time: fmt_hhmmss(row.start_time),
            end_time: fmt_hhmmss(row.end_time),
            active: row.active,
        }
    }
}

async fn fetch_assignment(
    pool: &MySqlPool,
    id: u64,
    branch_id: u64,
) -> Result<AssignmentEntry, ApiError> {
    sqlx::query_as::<_, AssignmentRow>(
        r#"
        SELECT a.id, a.employee_id, e.full_name AS employee_name,
               a.location_id, l.name AS location_name,
               a.weekdays, a.start_time, a.end_time, a.active
        FROM attendance_assignments a
        INNER JOIN employees e ON a.employee_id = e.id
        INNER JOIN control_locations l ON a.location_id = l.id
        WHERE a.id = ? AND e.branch_id = ?
        "#,
    )
    .bind(id)
    .bind(branch_id)
    .fetch_optional(pool)
    .await?
    .map(AssignmentEntry::from)
    .ok_or_else(|| ApiError::not_found("Assignment not found"))
}

fn validate_shift(start: NaiveTime, end: NaiveTime) -> Result<(), ApiError> {
    if start < end {
        Ok(())
    } else {
        Err(ApiError::validation("start_time must be before end_time"))
    }
}

/// Create an attendance assignment
///
/// Re-creating a pair that was previously deactivated reactivates the
/// existing row with the new schedule instead of inserting a duplicate.
#[utoipa::path(
    post,
    path = "/api/assignments",
    request_body = CreateAssignment,
    responses(
        (status = 201, description = "Assignment created", body = Object),
        (status = 200, description = "Inactive assignment reactivated", body = Object),
        (status = 400, description = "Invalid schedule"),
        (status = 404, description = "Employee or location not found"),
        (status = 409, description = "Active assignment already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
pub async fn create_assignment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateAssignment>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let start = parse_time_of_day(&body.start_time, "start_time")?;
    let end = parse_time_of_day(&body.end_time, "end_time")?;
    validate_shift(start, end)?;

    let employee_ok = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM employees WHERE id = ? AND branch_id = ? AND active = 1",
    )
    .bind(body.employee_id)
    .bind(auth.branch_id)
    .fetch_optional(pool.get_ref())
    .await?;
    if employee_ok.is_none() {
        return Err(ApiError::not_found("Employee not found or inactive"));
    }

    let location_ok = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM control_locations WHERE id = ? AND branch_id = ? AND active = 1",
    )
    .bind(body.location_id)
    .bind(auth.branch_id)
    .fetch_optional(pool.get_ref())
    .await?;
    if location_ok.is_none() {
        return Err(ApiError::not_found("Location not found or inactive"));
    }

    // One row per (employee, location) pair, enforced by a unique index.
    let existing = sqlx::query_as::<_, (u64, bool)>(
        "SELECT id, active FROM attendance_assignments WHERE employee_id = ? AND location_id = ?",
    )
    .bind(body.employee_id)
    .bind(body.location_id)
    .fetch_optional(pool.get_ref())
    .await?;

    if let Some((id, active)) = existing {
        if active {
            return Err(ApiError::conflict(
                "An active assignment already exists for this employee and location",
            ));
        }
        sqlx::query(
            "UPDATE attendance_assignments \
             SET weekdays = ?, start_time = ?, end_time = ?, active = 1 WHERE id = ?",
        )
        .bind(body.weekdays)
        .bind(start)
        .bind(end)
        .bind(id)
        .execute(pool.get_ref())
        .await?;

        let assignment = fetch_assignment(pool.get_ref(), id, auth.branch_id).await?;
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Assignment reactivated successfully",
            "data": assignment,
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO attendance_assignments
            (employee_id, location_id, weekdays, start_time, end_time, created_by)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(body.employee_id)
    .bind(body.location_id)
    .bind(body.weekdays)
    .bind(start)
    .bind(end)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        if is_constraint_violation(&e) {
            ApiError::conflict("An assignment already exists for this employee and location")
        } else {
            e.into()
        }
    })?;

    let assignment = fetch_assignment(pool.get_ref(), result.last_insert_id(), auth.branch_id).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Assignment created successfully",
        "data": assignment,
    })))
}

/// List the branch's assignments
#[utoipa::path(
    get,
    path = "/api/assignments",
    responses(
        (status = 200, description = "Assignments in the admin's branch", body = Object),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
pub async fn list_assignments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let rows = sqlx::query_as::<_, AssignmentRow>(
        r#"
        SELECT a.id, a.employee_id, e.full_name AS employee_name,
               a.location_id, l.name AS location_name,
               a.weekdays, a.start_time, a.end_time, a.active
        FROM attendance_assignments a
        INNER JOIN employees e ON a.employee_id = e.id
        INNER JOIN control_locations l ON a.location_id = l.id
        WHERE e.branch_id = ?
        ORDER BY a.id DESC
        "#,
    )
    .bind(auth.branch_id)
    .fetch_all(pool.get_ref())
    .await?;

    let assignments: Vec<AssignmentEntry> = rows.into_iter().map(AssignmentEntry::from).collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": assignments,
        "total": assignments.len(),
    })))
}

#[derive(FromRow)]
struct MineRow {
    id: u64,
    weekdays: WeekdaySet,
    start_time: NaiveTime,
    end_time: NaiveTime,
    location_id: u64,
    location_name: String,
    location_description: Option<String>,
    latitude: f64,
    longitude: f64,
    radius_meters: u32,
}

#[derive(Serialize, ToSchema)]
pub struct MyAssignment {
    pub id: u64,
    #[schema(value_type = Vec<String>)]
    pub weekdays: WeekdaySet,
    #[schema(example = "09:00:00")]
    pub start_time: String,
    #[schema(example = "18:00:00")]
    pub end_time: String,
    pub location: LocationSnapshot,
}

/// The caller's active assignments
#[utoipa::path(
    get,
    path = "/api/assignments/mine",
    responses(
        (status = 200, description = "Active assignments of the logged-in employee", body = Object),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
pub async fn my_assignments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, ApiError> {
    let employee_id = auth.require_employee()?;

    let rows = sqlx::query_as::<_, MineRow>(
        r#"
        SELECT a.id, a.weekdays, a.start_time, a.end_time,
               l.id AS location_id, l.name AS location_name,
               l.description AS location_description,
               l.latitude, l.longitude, l.radius_meters
        FROM attendance_assignments a
        INNER JOIN control_locations l ON a.location_id = l.id
        WHERE a.employee_id = ? AND a.active = 1 AND l.active = 1
        ORDER BY a.start_time
        "#,
    )
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await?;

    let assignments: Vec<MyAssignment> = rows
        .into_iter()
        .map(|row| MyAssignment {
            id: row.id,
            weekdays: row.weekdays,
            start_time: fmt_hhmmss(row.start_time),
            end_time: fmt_hhmmss(row.end_time),
            location: LocationSnapshot {
                id: row.location_id,
                name: row.location_name,
                description: row.location_description,
                latitude: row.latitude,
                longitude: row.longitude,
                radius_meters: row.radius_meters,
            },
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": assignments,
    })))
}

/// Schedule patch. Employee and location pairing is immutable; replacing
/// the pair means deactivating this row and creating a new one.
#[derive(Deserialize, ToSchema)]
pub struct UpdateAssignment {
    #[schema(value_type = Option<Vec<String>>)]
    pub weekdays: Option<WeekdaySet>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Update an assignment's schedule
#[utoipa::path(
    put,
    path = "/api/assignments/{id}",
    params(("id" = u64, Path, description = "Assignment ID")),
    request_body = UpdateAssignment,
    responses(
        (status = 200, description = "Assignment updated", body = Object),
        (status = 400, description = "Invalid schedule"),
        (status = 404, description = "Assignment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
pub async fn update_assignment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateAssignment>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;
    let id = path.into_inner();

    let start = body
        .start_time
        .as_deref()
        .map(|s| parse_time_of_day(s, "start_time"))
        .transpose()?;
    let end = body
        .end_time
        .as_deref()
        .map(|s| parse_time_of_day(s, "end_time"))
        .transpose()?;

    let current = fetch_assignment(pool.get_ref(), id, auth.branch_id).await?;

    // Validate the shift that will actually be stored, mixing patched and
    // existing values.
    let stored_start = parse_time_of_day(&current.start_time, "start_time")?;
    let stored_end = parse_time_of_day(&current.end_time, "end_time")?;
    validate_shift(start.unwrap_or(stored_start), end.unwrap_or(stored_end))?;

    sqlx::query(
        r#"
        UPDATE attendance_assignments a
        INNER JOIN employees e ON a.employee_id = e.id
        SET a.weekdays = COALESCE(?, a.weekdays),
            a.start_time = COALESCE(?, a.start_time),
            a.end_time = COALESCE(?, a.end_time)
        WHERE a.id = ? AND e.branch_id = ?
        "#,
    )
    .bind(body.weekdays)
    .bind(start)
    .bind(end)
    .bind(id)
    .bind(auth.branch_id)
    .execute(pool.get_ref())
    .await?;

    let assignment = fetch_assignment(pool.get_ref(), id, auth.branch_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Assignment updated successfully",
        "data": assignment,
    })))
}

/// Deactivate an assignment
///
/// Soft delete: confirmation history must stay attributable to the
/// assignment that produced it.
#[utoipa::path(
    delete,
    path = "/api/assignments/{id}",
    params(("id" = u64, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment deactivated", body = Object),
        (status = 404, description = "Assignment not found or already inactive")
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
pub async fn delete_assignment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let result = sqlx::query(
        r#"
        UPDATE attendance_assignments a
        INNER JOIN employees e ON a.employee_id = e.id
        SET a.active = 0
        WHERE a.id = ? AND e.branch_id = ? AND a.active = 1
        "#,
    )
    .bind(path.into_inner())
    .bind(auth.branch_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Assignment not found or already inactive"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Assignment deactivated successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_must_start_before_it_ends() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let six = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        assert!(validate_shift(nine, six).is_ok());
        assert!(validate_shift(six, nine).is_err());
        assert!(validate_shift(nine, nine).is_err());
    }
}
