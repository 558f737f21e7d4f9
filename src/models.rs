use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "jperez")]
    pub username: String,
    #[schema(example = "secret")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginData {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: &'static str,
    /// Seconds until expiry: 8h for employees, 24h for branch admins.
    pub expires_in: usize,
    pub full_name: String,
    pub branch_id: u64,
}

/// Account row shape shared by the employee and branch-admin tables.
#[derive(FromRow)]
pub struct AccountSql {
    pub id: u64,
    pub branch_id: u64,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    /// Role id, see `model::role::Role`.
    pub role: u8,
    pub branch_id: u64,
    pub exp: usize,
    pub jti: String,
}
