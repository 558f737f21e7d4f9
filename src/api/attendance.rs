use crate::attendance::geo::round2;
use crate::attendance::registrar::{self, Rejection};
use crate::attendance::state::{DailyState, derive_state};
use crate::attendance::window::ConfirmationWindow;
use crate::auth::auth::AuthUser;
use crate::error::{ApiError, is_constraint_violation};
use crate::model::location::LocationSnapshot;
use crate::model::weekday::Weekday;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use sqlx::{MySqlPool, prelude::FromRow};
use utoipa::{IntoParams, ToSchema};

use super::{fmt_hhmm, fmt_hhmmss, parse_date_param};

#[derive(FromRow)]
struct TodayRow {
    assignment_id: u64,
    start_time: NaiveTime,
    end_time: NaiveTime,
    location_id: u64,
    location_name: String,
    location_description: Option<String>,
    latitude: f64,
    longitude: f64,
    radius_meters: u32,
    marked_time: Option<NaiveTime>,
    within_geofence: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct WindowInfo {
    #[schema(example = "08:55")]
    pub from: String,
    #[schema(example = "09:05")]
    pub to: String,
}

#[derive(Serialize, ToSchema)]
pub struct ScheduleInfo {
    #[schema(example = "09:00")]
    pub start: String,
    #[schema(example = "17:00")]
    pub end: String,
    pub confirmation_window: WindowInfo,
}

#[derive(Serialize, ToSchema)]
pub struct ConfirmationSnapshot {
    #[schema(example = "09:02:11")]
    pub marked_time: String,
    pub within_geofence: bool,
}

#[derive(Serialize, ToSchema)]
pub struct TodayAssignment {
    pub assignment_id: u64,
    pub location: LocationSnapshot,
    pub schedule: ScheduleInfo,
    pub state: DailyState,
    pub confirmation: Option<ConfirmationSnapshot>,
    pub puede_confirmar: bool,
}

/// Today's assignments, classified
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Classified assignments for today", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, ApiError> {
    let employee_id = auth.require_employee()?;

    let now = Local::now();
    let date = now.date_naive();
    let time = now.time();
    let weekday = Weekday::from_chrono(date.weekday());

    let rows = sqlx::query_as::<_, TodayRow>(
        r#"
        SELECT
            a.id AS assignment_id,
            a.start_time,
            a.end_time,
            l.id AS location_id,
            l.name AS location_name,
            l.description AS location_description,
            l.latitude,
            l.longitude,
            l.radius_meters,
            c.marked_time,
            c.within_geofence
        FROM attendance_assignments a
        INNER JOIN control_locations l ON a.location_id = l.id
        LEFT JOIN attendance_confirmations c
            ON c.assignment_id = a.id AND c.confirmation_date = ?
        WHERE a.employee_id = ?
          AND a.active = 1
          AND l.active = 1
          AND (a.weekdays & ?) != 0
        ORDER BY a.start_time
        "#,
    )
    .bind(date)
    .bind(employee_id)
    .bind(weekday.bit())
    .fetch_all(pool.get_ref())
    .await?;

    let assignments: Vec<TodayAssignment> = rows
        .into_iter()
        .map(|row| {
            let window = ConfirmationWindow::around(row.start_time);
            let state = derive_state(row.within_geofence, &window, time);
            TodayAssignment {
                assignment_id: row.assignment_id,
                location: LocationSnapshot {
                    id: row.location_id,
                    name: row.location_name,
                    description: row.location_description,
                    latitude: row.latitude,
                    longitude: row.longitude,
                    radius_meters: row.radius_meters,
                },
                schedule: ScheduleInfo {
                    start: fmt_hhmm(row.start_time),
                    end: fmt_hhmm(row.end_time),
                    confirmation_window: WindowInfo {
                        from: window.opens(),
                        to: window.closes(),
                    },
                },
                state,
                confirmation: row.marked_time.map(|t| ConfirmationSnapshot {
                    marked_time: fmt_hhmmss(t),
                    within_geofence: row.within_geofence.unwrap_or(false),
                }),
                puede_confirmar: state == DailyState::DisponibleConfirmacion,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {
            "date": date,
            "weekday": weekday,
            "current_time": fmt_hhmm(time),
            "assignments": assignments,
        }
    })))
}

#[derive(Deserialize, ToSchema)]
pub struct ConfirmRequest {
    #[schema(example = 1)]
    pub assignment_id: u64,
    #[schema(example = -33.4489)]
    pub latitude: f64,
    #[schema(example = -70.6693)]
    pub longitude: f64,
    #[schema(example = "arrived by bus")]
    pub notes: Option<String>,
}

#[derive(FromRow)]
struct AssignmentForConfirm {
    start_time: NaiveTime,
    location_name: String,
    latitude: f64,
    longitude: f64,
    radius_meters: u32,
}

/// Confirm attendance for an assignment
///
/// Records at most one confirmation per assignment per day. Out-of-geofence
/// submissions are persisted and reported as success with
/// `within_geofence: false`; that verdict is a business outcome, not an error.
#[utoipa::path(
    post,
    path = "/api/attendance/confirm",
    request_body = ConfirmRequest,
    responses(
        (status = 200, description = "Confirmation recorded", body = Object),
        (status = 400, description = "Invalid coordinates or outside the permitted window"),
        (status = 404, description = "Assignment not found or not scheduled for today"),
        (status = 409, description = "Already confirmed today")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn confirm(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<ConfirmRequest>,
) -> Result<impl Responder, ApiError> {
    let employee_id = auth.require_employee()?;

    if !(-90.0..=90.0).contains(&body.latitude) {
        return Err(ApiError::validation("Latitude must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&body.longitude) {
        return Err(ApiError::validation(
            "Longitude must be between -180 and 180",
        ));
    }

    let now = Local::now();
    let date = now.date_naive();
    let time = now.time();
    let marked_time = time.with_nanosecond(0).unwrap_or(time);
    let weekday = Weekday::from_chrono(date.weekday());

    // Lookup, duplicate pre-check and insert share one transaction so the
    // confirmation cannot land on an assignment that changed mid-request.
    let mut tx = pool.begin().await?;

    let assignment = sqlx::query_as::<_, AssignmentForConfirm>(
        r#"
        SELECT
            a.start_time,
            l.name AS location_name,
            l.latitude,
            l.longitude,
            l.radius_meters
        FROM attendance_assignments a
        INNER JOIN control_locations l ON a.location_id = l.id
        WHERE a.id = ?
          AND a.employee_id = ?
          AND a.active = 1
          AND l.active = 1
          AND (a.weekdays & ?) != 0
        "#,
    )
    .bind(body.assignment_id)
    .bind(employee_id)
    .bind(weekday.bit())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Assignment not found or not valid for today"))?;

    let existing = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM attendance_confirmations WHERE assignment_id = ? AND confirmation_date = ?",
    )
    .bind(body.assignment_id)
    .bind(date)
    .fetch_optional(&mut *tx)
    .await?;

    registrar::authorize(existing.is_some(), assignment.start_time, time).map_err(|r| match r {
        Rejection::AlreadyConfirmed => {
            ApiError::conflict("Attendance already confirmed for this assignment today")
        }
        Rejection::OutOfWindow(w) => ApiError::OutOfWindow {
            from: w.opens(),
            to: w.closes(),
        },
    })?;

    let check = registrar::check_geofence(
        assignment.latitude,
        assignment.longitude,
        body.latitude,
        body.longitude,
        assignment.radius_meters as f64,
    );
    let distance = round2(check.distance_meters);

    // The unique index on (assignment_id, confirmation_date) backs the
    // pre-check: a concurrent duplicate loses the race here.
    let result = sqlx::query(
        r#"
        INSERT INTO attendance_confirmations
            (assignment_id, employee_id, confirmation_date, marked_time,
             marked_latitude, marked_longitude, within_geofence, distance_meters, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(body.assignment_id)
    .bind(employee_id)
    .bind(date)
    .bind(marked_time)
    .bind(body.latitude)
    .bind(body.longitude)
    .bind(check.within_geofence)
    .bind(distance)
    .bind(body.notes.as_deref())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_constraint_violation(&e) {
            ApiError::conflict("Attendance already confirmed for this assignment today")
        } else {
            e.into()
        }
    })?;

    tx.commit().await?;

    tracing::info!(
        employee_id,
        assignment_id = body.assignment_id,
        within_geofence = check.within_geofence,
        distance_meters = distance,
        "Confirmation recorded"
    );

    let message = if check.within_geofence {
        "Attendance confirmed successfully"
    } else {
        "Attendance recorded but outside the permitted range"
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": message,
        "data": {
            "confirmation_id": result.last_insert_id(),
            "location": assignment.location_name,
            "distance_meters": distance,
            "within_geofence": check.within_geofence,
            "permitted_radius": assignment.radius_meters,
            "marked_time": fmt_hhmmss(marked_time),
            "confirmation_date": date,
        }
    })))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    #[schema(example = "2026-08-01")]
    /// Inclusive lower bound, `YYYY-MM-DD`
    pub from: Option<String>,
    #[schema(example = "2026-08-26")]
    /// Inclusive upper bound, `YYYY-MM-DD`
    pub to: Option<String>,
    #[schema(example = 50)]
    pub limit: Option<u32>,
}

#[derive(FromRow)]
struct HistoryRow {
    id: u64,
    confirmation_date: NaiveDate,
    marked_time: NaiveTime,
    within_geofence: bool,
    distance_meters: f64,
    notes: Option<String>,
    location_name: String,
    location_description: Option<String>,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryEntry {
    pub id: u64,
    #[schema(example = "2026-08-26", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "09:02:11")]
    pub marked_time: String,
    pub location: HistoryLocation,
    pub schedule: HistorySchedule,
    pub result: HistoryResult,
    pub notes: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryLocation {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct HistorySchedule {
    #[schema(example = "09:00")]
    pub start: String,
    #[schema(example = "17:00")]
    pub end: String,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResult {
    pub within_geofence: bool,
    pub distance_meters: f64,
}

/// Confirmation history for the authenticated employee
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Confirmations, newest first", body = Object),
        (status = 400, description = "Malformed date filter"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HistoryQuery>,
) -> Result<impl Responder, ApiError> {
    let employee_id = auth.require_employee()?;

    let from = parse_date_param(query.from.as_deref(), "from")?;
    let to = parse_date_param(query.to.as_deref(), "to")?;
    let limit = query.limit.unwrap_or(50).clamp(1, 500);

    let mut sql = String::from(
        r#"
        SELECT
            c.id,
            c.confirmation_date,
            c.marked_time,
            c.within_geofence,
            c.distance_meters,
            c.notes,
            l.name AS location_name,
            l.description AS location_description,
            a.start_time,
            a.end_time
        FROM attendance_confirmations c
        INNER JOIN attendance_assignments a ON c.assignment_id = a.id
        INNER JOIN control_locations l ON a.location_id = l.id
        WHERE c.employee_id = ?
        "#,
    );
    if from.is_some() {
        sql.push_str(" AND c.confirmation_date >= ?");
    }
    if to.is_some() {
        sql.push_str(" AND c.confirmation_date <= ?");
    }
    sql.push_str(" ORDER BY c.confirmation_date DESC, c.marked_time DESC LIMIT ?");

    let mut q = sqlx::query_as::<_, HistoryRow>(&sql).bind(employee_id);
    if let Some(d) = from {
        q = q.bind(d);
    }
    if let Some(d) = to {
        q = q.bind(d);
    }

    let rows = q.bind(limit).fetch_all(pool.get_ref()).await?;

    let entries: Vec<HistoryEntry> = rows
        .into_iter()
        .map(|row| HistoryEntry {
            id: row.id,
            date: row.confirmation_date,
            marked_time: fmt_hhmmss(row.marked_time),
            location: HistoryLocation {
                name: row.location_name,
                description: row.location_description,
            },
            schedule: HistorySchedule {
                start: fmt_hhmm(row.start_time),
                end: fmt_hhmm(row.end_time),
            },
            result: HistoryResult {
                within_geofence: row.within_geofence,
                distance_meters: row.distance_meters,
            },
            notes: row.notes,
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": entries,
    })))
}

#[derive(FromRow, Serialize, ToSchema)]
pub struct PendingAssignment {
    pub assignment_id: u64,
    pub location_name: String,
    #[schema(example = "09:00:00", value_type = String)]
    pub start_time: NaiveTime,
    #[schema(example = "17:00:00", value_type = String)]
    pub end_time: NaiveTime,
}

/// Today's still-unconfirmed assignments
#[utoipa::path(
    get,
    path = "/api/attendance/pending",
    responses(
        (status = 200, description = "Counts and pending assignments for today", body = Object),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn pending(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, ApiError> {
    let employee_id = auth.require_employee()?;

    let now = Local::now();
    let date = now.date_naive();
    let weekday = Weekday::from_chrono(date.weekday());

    let scheduled = sqlx::query_as::<_, PendingAssignment>(
        r#"
        SELECT
            a.id AS assignment_id,
            l.name AS location_name,
            a.start_time,
            a.end_time
        FROM attendance_assignments a
        INNER JOIN control_locations l ON a.location_id = l.id
        WHERE a.employee_id = ?
          AND a.active = 1
          AND l.active = 1
          AND (a.weekdays & ?) != 0
        ORDER BY a.start_time
        "#,
    )
    .bind(employee_id)
    .bind(weekday.bit())
    .fetch_all(pool.get_ref())
    .await?;

    let confirmed: Vec<u64> = sqlx::query_scalar(
        "SELECT assignment_id FROM attendance_confirmations \
         WHERE employee_id = ? AND confirmation_date = ?",
    )
    .bind(employee_id)
    .bind(date)
    .fetch_all(pool.get_ref())
    .await?;

    let total_today = scheduled.len();
    let pending: Vec<PendingAssignment> = scheduled
        .into_iter()
        .filter(|a| !confirmed.contains(&a.assignment_id))
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {
            "date": date,
            "weekday": weekday,
            "total_today": total_today,
            "confirmed": confirmed.len(),
            "pending": pending.len(),
            "pending_assignments": pending,
        }
    })))
}
