use crate::{
    auth::{jwt::generate_token, password::verify_password},
    config::Config,
    error::ApiError,
    model::role::Role,
    models::{AccountSql, LoginData, LoginRequest},
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};

async fn fetch_account(
    table: &str,
    username: &str,
    pool: &MySqlPool,
) -> Result<Option<AccountSql>, ApiError> {
    // `table` is one of two compile-time constants, never user input.
    let sql = format!(
        "SELECT id, branch_id, username, password_hash, full_name \
         FROM {table} WHERE username = ? AND active = 1"
    );
    let account = sqlx::query_as::<_, AccountSql>(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(account)
}

async fn login_as(
    role: Role,
    body: &LoginRequest,
    pool: &MySqlPool,
    config: &Config,
) -> Result<HttpResponse, ApiError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    let table = match role {
        Role::Employee => "employees",
        Role::Admin => "branch_admins",
    };

    debug!(table, "Fetching account");
    let account = fetch_account(table, body.username.trim(), pool)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if verify_password(&body.password, &account.password_hash).is_err() {
        info!(username = %account.username, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let ttl = match role {
        Role::Employee => config.employee_token_ttl,
        Role::Admin => config.admin_token_ttl,
    };

    let access_token = generate_token(
        account.id,
        account.username.clone(),
        role.id(),
        account.branch_id,
        &config.jwt_secret,
        ttl,
    );

    info!(user_id = account.id, role = role.id(), "Login successful");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": LoginData {
            access_token,
            token_type: "Bearer",
            expires_in: ttl,
            full_name: account.full_name,
            branch_id: account.branch_id,
        }
    })))
}

/// Employee login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued", body = Object),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(pool, config, body), fields(username = %body.username))]
pub async fn login(
    body: web::Json<LoginRequest>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<impl Responder, ApiError> {
    login_as(Role::Employee, &body, pool.get_ref(), config.get_ref()).await
}

/// Branch admin login
#[utoipa::path(
    post,
    path = "/auth/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued", body = Object),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_admin_login", skip(pool, config, body), fields(username = %body.username))]
pub async fn admin_login(
    body: web::Json<LoginRequest>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<impl Responder, ApiError> {
    login_as(Role::Admin, &body, pool.get_ref(), config.get_ref()).await
}
