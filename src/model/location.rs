use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// A control location row as stored, scoped to its owning branch.
#[derive(Serialize, FromRow, ToSchema)]
pub struct ControlLocation {
    pub id: u64,
    pub branch_id: u64,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: u32,
    pub active: bool,
    pub created_by: u64,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The location fields echoed inside attendance payloads.
#[derive(Serialize, Clone, ToSchema)]
pub struct LocationSnapshot {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: u32,
}
