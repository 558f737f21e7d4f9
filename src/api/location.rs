//! Control-location management for branch admins.

use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::attendance::geo::{distance_meters, round2};
use crate::auth::auth::AuthUser;
use crate::error::{ApiError, is_constraint_violation};
use crate::model::location::ControlLocation;

/// Radius bounds, applied on create and update alike. The original system
/// used a tighter bound on update only; one bound is kept for both paths.
pub const MIN_RADIUS_M: u32 = 10;
pub const MAX_RADIUS_M: u32 = 5000;

const DEFAULT_RADIUS_M: u32 = 50;

fn validate_latitude(latitude: f64) -> Result<(), ApiError> {
    if (-90.0..=90.0).contains(&latitude) {
        Ok(())
    } else {
        Err(ApiError::validation("Latitude must be between -90 and 90"))
    }
}

fn validate_longitude(longitude: f64) -> Result<(), ApiError> {
    if (-180.0..=180.0).contains(&longitude) {
        Ok(())
    } else {
        Err(ApiError::validation("Longitude must be between -180 and 180"))
    }
}

fn validate_radius(radius_meters: u32) -> Result<(), ApiError> {
    if (MIN_RADIUS_M..=MAX_RADIUS_M).contains(&radius_meters) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "Radius must be between {MIN_RADIUS_M} and {MAX_RADIUS_M} meters"
        )))
    }
}

async fn fetch_location(
    pool: &MySqlPool,
    id: u64,
    branch_id: u64,
) -> Result<ControlLocation, ApiError> {
    sqlx::query_as::<_, ControlLocation>(
        "SELECT id, branch_id, name, description, latitude, longitude, radius_meters, \
                active, created_by, created_at, updated_at \
         FROM control_locations WHERE id = ? AND branch_id = ?",
    )
    .bind(id)
    .bind(branch_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Location not found"))
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLocation {
    #[schema(example = "Main entrance")]
    pub name: String,
    #[schema(example = "North gate, building A")]
    pub description: Option<String>,
    #[schema(example = -33.4489)]
    pub latitude: f64,
    #[schema(example = -70.6693)]
    pub longitude: f64,
    #[schema(example = 50)]
    pub radius_meters: Option<u32>,
}

/// Create a control location
#[utoipa::path(
    post,
    path = "/api/locations",
    request_body = CreateLocation,
    responses(
        (status = 201, description = "Location created", body = Object),
        (status = 400, description = "Invalid coordinates or radius"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn create_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateLocation>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    if body.name.trim().is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    validate_latitude(body.latitude)?;
    validate_longitude(body.longitude)?;
    let radius = body.radius_meters.unwrap_or(DEFAULT_RADIUS_M);
    validate_radius(radius)?;

    let result = sqlx::query(
        r#"
        INSERT INTO control_locations
            (branch_id, name, description, latitude, longitude, radius_meters, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.branch_id)
    .bind(body.name.trim())
    .bind(body.description.as_deref())
    .bind(body.latitude)
    .bind(body.longitude)
    .bind(radius)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await?;

    let location = fetch_location(pool.get_ref(), result.last_insert_id(), auth.branch_id).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Location created successfully",
        "data": location,
    })))
}

/// List the branch's control locations
#[utoipa::path(
    get,
    path = "/api/locations",
    responses(
        (status = 200, description = "Locations owned by the admin's branch", body = Object),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn list_locations(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let locations = sqlx::query_as::<_, ControlLocation>(
        "SELECT id, branch_id, name, description, latitude, longitude, radius_meters, \
                active, created_by, created_at, updated_at \
         FROM control_locations WHERE branch_id = ? ORDER BY created_at DESC",
    )
    .bind(auth.branch_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": locations,
    })))
}

/// Get one control location
#[utoipa::path(
    get,
    path = "/api/locations/{id}",
    params(("id" = u64, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location found", body = ControlLocation),
        (status = 404, description = "Location not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn get_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    let location = fetch_location(pool.get_ref(), path.into_inner(), auth.branch_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": location,
    })))
}

/// Explicit patch: absent fields keep their stored value.
#[derive(Deserialize, ToSchema)]
pub struct UpdateLocation {
    pub name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_meters: Option<u32>,
    pub active: Option<bool>,
}

/// Update a control location
#[utoipa::path(
    put,
    path = "/api/locations/{id}",
    params(("id" = u64, Path, description = "Location ID")),
    request_body = UpdateLocation,
    responses(
        (status = 200, description = "Location updated", body = Object),
        (status = 400, description = "Invalid coordinates or radius"),
        (status = 404, description = "Location not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn update_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateLocation>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;
    let id = path.into_inner();

    if let Some(lat) = body.latitude {
        validate_latitude(lat)?;
    }
    if let Some(lon) = body.longitude {
        validate_longitude(lon)?;
    }
    if let Some(radius) = body.radius_meters {
        validate_radius(radius)?;
    }
    if let Some(name) = &body.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Name cannot be empty"));
        }
    }

    // Existence check first: COALESCE keeps unchanged fields, so
    // rows_affected cannot distinguish "missing" from "no change".
    fetch_location(pool.get_ref(), id, auth.branch_id).await?;

    sqlx::query(
        r#"
        UPDATE control_locations SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            latitude = COALESCE(?, latitude),
            longitude = COALESCE(?, longitude),
            radius_meters = COALESCE(?, radius_meters),
            active = COALESCE(?, active)
        WHERE id = ? AND branch_id = ?
        "#,
    )
    .bind(body.name.as_deref().map(str::trim))
    .bind(body.description.as_deref())
    .bind(body.latitude)
    .bind(body.longitude)
    .bind(body.radius_meters)
    .bind(body.active)
    .bind(id)
    .bind(auth.branch_id)
    .execute(pool.get_ref())
    .await?;

    let location = fetch_location(pool.get_ref(), id, auth.branch_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Location updated successfully",
        "data": location,
    })))
}

/// Delete a control location
#[utoipa::path(
    delete,
    path = "/api/locations/{id}",
    params(("id" = u64, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location deleted", body = Object),
        (status = 404, description = "Location not found"),
        (status = 409, description = "Location still has assignments")
    ),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn delete_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;
    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM control_locations WHERE id = ? AND branch_id = ?")
        .bind(id)
        .bind(auth.branch_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            if is_constraint_violation(&e) {
                ApiError::conflict("Location still has assignments; remove them first")
            } else {
                e.into()
            }
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Location not found"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Location deleted successfully",
    })))
}

#[derive(Deserialize, ToSchema)]
pub struct ValidatePosition {
    #[schema(example = -33.4489)]
    pub latitude: f64,
    #[schema(example = -70.6693)]
    pub longitude: f64,
}

/// Probe whether a position falls inside a location's geofence
///
/// Diagnostic check only; nothing is persisted.
#[utoipa::path(
    post,
    path = "/api/locations/{id}/validate",
    params(("id" = u64, Path, description = "Location ID")),
    request_body = ValidatePosition,
    responses(
        (status = 200, description = "Distance and verdict", body = Object),
        (status = 404, description = "Location not found or inactive")
    ),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn validate_position(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<ValidatePosition>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    validate_latitude(body.latitude)?;
    validate_longitude(body.longitude)?;

    let location = fetch_location(pool.get_ref(), path.into_inner(), auth.branch_id).await?;
    if !location.active {
        return Err(ApiError::not_found("Location not found or inactive"));
    }

    let distance = round2(distance_meters(
        location.latitude,
        location.longitude,
        body.latitude,
        body.longitude,
    ));
    let within = distance <= location.radius_meters as f64;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {
            "location_id": location.id,
            "location_name": location.name,
            "distance_meters": distance,
            "permitted_radius": location.radius_meters,
            "within_geofence": within,
        }
    })))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct NearbyQuery {
    #[schema(example = -33.4489)]
    pub latitude: f64,
    #[schema(example = -70.6693)]
    pub longitude: f64,
    /// Search radius in meters
    #[schema(example = 1000.0)]
    pub search_radius: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct NearbyLocation {
    #[serde(flatten)]
    #[schema(inline)]
    pub location: ControlLocation,
    pub distance_meters: f64,
    pub within_geofence: bool,
}

/// Active locations near a coordinate, closest first
#[utoipa::path(
    get,
    path = "/api/locations/nearby",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Locations within the search radius", body = Object),
        (status = 400, description = "Invalid coordinates")
    ),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn nearby_locations(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<NearbyQuery>,
) -> Result<impl Responder, ApiError> {
    auth.require_admin()?;

    validate_latitude(query.latitude)?;
    validate_longitude(query.longitude)?;
    let search_radius = query.search_radius.unwrap_or(1000.0);

    let locations = sqlx::query_as::<_, ControlLocation>(
        "SELECT id, branch_id, name, description, latitude, longitude, radius_meters, \
                active, created_by, created_at, updated_at \
         FROM control_locations WHERE branch_id = ? AND active = 1",
    )
    .bind(auth.branch_id)
    .fetch_all(pool.get_ref())
    .await?;

    let mut nearby: Vec<NearbyLocation> = locations
        .into_iter()
        .map(|location| {
            let distance = round2(distance_meters(
                query.latitude,
                query.longitude,
                location.latitude,
                location.longitude,
            ));
            NearbyLocation {
                within_geofence: distance <= location.radius_meters as f64,
                distance_meters: distance,
                location,
            }
        })
        .filter(|n| n.distance_meters <= search_radius)
        .collect();
    nearby.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": nearby,
        "total": nearby.len(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_bounds_apply_to_create_and_update() {
        assert!(validate_radius(MIN_RADIUS_M).is_ok());
        assert!(validate_radius(MAX_RADIUS_M).is_ok());
        assert!(validate_radius(9).is_err());
        assert!(validate_radius(5001).is_err());
    }

    #[test]
    fn coordinate_bounds_are_inclusive() {
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.001).is_err());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.5).is_err());
    }
}
