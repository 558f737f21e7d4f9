//! Read-only aggregation views over persisted confirmations.

use actix_web::{HttpResponse, Responder, web};
use chrono::{Duration, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::{MySqlPool, prelude::FromRow};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::weekday::{Weekday, WeekdaySet};
use crate::attendance::geo::round2;

use super::{fmt_hhmm, fmt_hhmmss, parse_date_param};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    #[schema(example = "2026-08-01")]
    pub from: Option<String>,
    #[schema(example = "2026-08-26")]
    pub to: Option<String>,
    /// Restrict the report to a single employee
    pub employee_id: Option<u64>,
    #[schema(example = 100)]
    pub limit: Option<u32>,
}

#[derive(FromRow)]
struct ReportRow {
    id: u64,
    confirmation_date: NaiveDate,
    marked_time: NaiveTime,
    within_geofence: bool,
    distance_meters: f64,
    marked_latitude: f64,
    marked_longitude: f64,
    notes: Option<String>,
    employee_name: String,
    employee_email: String,
    location_name: String,
    location_description: Option<String>,
    location_latitude: f64,
    location_longitude: f64,
    radius_meters: u32,
    start_time: NaiveTime,
    end_time: NaiveTime,
    weekdays: WeekdaySet,
    branch_name: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReportEntry {
    pub id: u64,
    #[schema(example = "2026-08-26", format = "date", value_type = String)]
    pub confirmation_date: NaiveDate,
    #[schema(example = "09:02:11")]
    pub marked_time: String,
    pub employee: ReportEmployee,
    pub location: ReportLocation,
    /// Raw coordinates the employee submitted, kept for audit.
    pub marked_position: MarkedPosition,
    pub schedule: ReportSchedule,
    pub result: ReportResult,
    pub notes: Option<String>,
    pub branch: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReportEmployee {
    pub full_name: String,
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReportLocation {
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: u32,
}

#[derive(Serialize, ToSchema)]
pub struct MarkedPosition {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, ToSchema)]
pub struct ReportSchedule {
    #[schema(example = "09:00")]
    pub start: String,
    #[schema(example = "17:00")]
    pub end: String,
    #[schema(value_type = Vec<String>, example = json!(["monday", "friday"]))]
    pub weekdays: Vec<Weekday>,
}

#[derive(Serialize, ToSchema)]
pub struct ReportResult {
    pub within_geofence: bool,
    pub distance_meters: f64,
}

/// Branch-wide confirmation report
#[utoipa::path(
    get,
    path = "/api/attendance/report",
    params(ReportQuery),
    responses(
        (status = 200, description = "Confirmations across the admin's branch", body = Object),
        (status = 400, description = "Malformed date filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let from = parse_date_param(query.from.as_deref(), "from")?;
    let to = parse_date_param(query.to.as_deref(), "to")?;
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);

    let mut sql = String::from(
        r#"
        SELECT
            c.id,
            c.confirmation_date,
            c.marked_time,
            c.within_geofence,
            c.distance_meters,
            c.marked_latitude,
            c.marked_longitude,
            c.notes,
            e.full_name AS employee_name,
            e.email AS employee_email,
            l.name AS location_name,
            l.description AS location_description,
            l.latitude AS location_latitude,
            l.longitude AS location_longitude,
            l.radius_meters,
            a.start_time,
            a.end_time,
            a.weekdays,
            b.name AS branch_name
        FROM attendance_confirmations c
        INNER JOIN attendance_assignments a ON c.assignment_id = a.id
        INNER JOIN control_locations l ON a.location_id = l.id
        INNER JOIN employees e ON c.employee_id = e.id
        INNER JOIN branches b ON e.branch_id = b.id
        WHERE e.branch_id = ?
        "#,
    );
    if from.is_some() {
        sql.push_str(" AND c.confirmation_date >= ?");
    }
    if to.is_some() {
        sql.push_str(" AND c.confirmation_date <= ?");
    }
    if query.employee_id.is_some() {
        sql.push_str(" AND c.employee_id = ?");
    }
    sql.push_str(" ORDER BY c.confirmation_date DESC, c.marked_time DESC LIMIT ?");

    let mut q = sqlx::query_as::<_, ReportRow>(&sql).bind(auth.branch_id);
    if let Some(d) = from {
        q = q.bind(d);
    }
    if let Some(d) = to {
        q = q.bind(d);
    }
    if let Some(id) = query.employee_id {
        q = q.bind(id);
    }

    let rows = q.bind(limit).fetch_all(pool.get_ref()).await?;

    let entries: Vec<ReportEntry> = rows
        .into_iter()
        .map(|row| ReportEntry {
            id: row.id,
            confirmation_date: row.confirmation_date,
            marked_time: fmt_hhmmss(row.marked_time),
            employee: ReportEmployee {
                full_name: row.employee_name,
                email: row.employee_email,
            },
            location: ReportLocation {
                name: row.location_name,
                description: row.location_description,
                latitude: row.location_latitude,
                longitude: row.location_longitude,
                radius_meters: row.radius_meters,
            },
            marked_position: MarkedPosition {
                latitude: row.marked_latitude,
                longitude: row.marked_longitude,
            },
            schedule: ReportSchedule {
                start: fmt_hhmm(row.start_time),
                end: fmt_hhmm(row.end_time),
                weekdays: row.weekdays.days(),
            },
            result: ReportResult {
                within_geofence: row.within_geofence,
                distance_meters: row.distance_meters,
            },
            notes: row.notes,
            branch: row.branch_name,
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": entries,
        "total": entries.len(),
        "filters": {
            "from": from,
            "to": to,
            "employee_id": query.employee_id,
            "limit": limit,
        }
    })))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct StatisticsQuery {
    #[schema(example = "2026-07-27")]
    pub from: Option<String>,
    #[schema(example = "2026-08-26")]
    pub to: Option<String>,
}

#[derive(FromRow)]
struct SummaryRow {
    total_confirmations: i64,
    active_employees: i64,
    successful: i64,
    failed: i64,
    average_distance: Option<f64>,
}

#[derive(FromRow, Serialize, ToSchema)]
pub struct DailyBreakdown {
    #[schema(example = "2026-08-26", format = "date", value_type = String)]
    pub confirmation_date: NaiveDate,
    pub total: i64,
    pub successful: i64,
}

#[derive(FromRow)]
struct TopEmployeeRow {
    full_name: String,
    email: String,
    total: i64,
    successful: i64,
}

#[derive(Serialize, ToSchema)]
pub struct TopEmployee {
    pub full_name: String,
    pub email: String,
    pub total_confirmations: i64,
    pub successful: i64,
    #[schema(example = 92.31)]
    pub success_rate: f64,
}

fn success_rate(successful: i64, total: i64) -> f64 {
    if total > 0 {
        round2(successful as f64 * 100.0 / total as f64)
    } else {
        0.0
    }
}

/// Branch dashboard statistics
///
/// Defaults to the trailing 30 days when no range is given.
#[utoipa::path(
    get,
    path = "/api/attendance/statistics",
    params(StatisticsQuery),
    responses(
        (status = 200, description = "Aggregate statistics for the admin's branch", body = Object),
        (status = 400, description = "Malformed date filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn statistics(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StatisticsQuery>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let today = Local::now().date_naive();
    let to = parse_date_param(query.to.as_deref(), "to")?.unwrap_or(today);
    let from = parse_date_param(query.from.as_deref(), "from")?
        .unwrap_or_else(|| today - Duration::days(30));

    // SUM/AVG come back as DECIMAL from MySQL; cast so the rows decode
    // into plain integers and doubles.
    let summary = sqlx::query_as::<_, SummaryRow>(
        r#"
        SELECT
            COUNT(*) AS total_confirmations,
            COUNT(DISTINCT c.employee_id) AS active_employees,
            CAST(COALESCE(SUM(c.within_geofence), 0) AS SIGNED) AS successful,
            CAST(COALESCE(SUM(1 - c.within_geofence), 0) AS SIGNED) AS failed,
            CAST(AVG(CASE WHEN c.within_geofence = 1 AND c.distance_meters > 0
                          THEN c.distance_meters END) AS DOUBLE) AS average_distance
        FROM attendance_confirmations c
        INNER JOIN employees e ON c.employee_id = e.id
        WHERE e.branch_id = ? AND c.confirmation_date BETWEEN ? AND ?
        "#,
    )
    .bind(auth.branch_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool.get_ref())
    .await?;

    let per_day = sqlx::query_as::<_, DailyBreakdown>(
        r#"
        SELECT
            c.confirmation_date,
            COUNT(*) AS total,
            CAST(COALESCE(SUM(c.within_geofence), 0) AS SIGNED) AS successful
        FROM attendance_confirmations c
        INNER JOIN employees e ON c.employee_id = e.id
        WHERE e.branch_id = ? AND c.confirmation_date BETWEEN ? AND ?
        GROUP BY c.confirmation_date
        ORDER BY c.confirmation_date DESC
        "#,
    )
    .bind(auth.branch_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool.get_ref())
    .await?;

    let top_rows = sqlx::query_as::<_, TopEmployeeRow>(
        r#"
        SELECT
            e.full_name,
            e.email,
            COUNT(*) AS total,
            CAST(COALESCE(SUM(c.within_geofence), 0) AS SIGNED) AS successful
        FROM attendance_confirmations c
        INNER JOIN employees e ON c.employee_id = e.id
        WHERE e.branch_id = ? AND c.confirmation_date BETWEEN ? AND ?
        GROUP BY e.id, e.full_name, e.email
        ORDER BY total DESC
        LIMIT 10
        "#,
    )
    .bind(auth.branch_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool.get_ref())
    .await?;

    let top_employees: Vec<TopEmployee> = top_rows
        .into_iter()
        .map(|row| TopEmployee {
            success_rate: success_rate(row.successful, row.total),
            full_name: row.full_name,
            email: row.email,
            total_confirmations: row.total,
            successful: row.successful,
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {
            "summary": {
                "total_confirmations": summary.total_confirmations,
                "active_employees": summary.active_employees,
                "successful": summary.successful,
                "failed": summary.failed,
                "success_rate": success_rate(summary.successful, summary.total_confirmations),
                "average_distance": round2(summary.average_distance.unwrap_or(0.0)),
            },
            "per_day": per_day,
            "top_employees": top_employees,
            "period": { "from": from, "to": to },
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_is_a_two_decimal_percentage() {
        assert_eq!(success_rate(12, 13), 92.31);
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(success_rate(5, 5), 100.0);
    }
}
