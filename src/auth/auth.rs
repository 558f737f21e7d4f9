use crate::config::Config;
use crate::error::ApiError;
use crate::{model::role::Role, models::Claims};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::decode;
use jsonwebtoken::{DecodingKey, Validation};

/// The authenticated principal: either a branch employee or a branch admin.
/// Every query downstream is scoped by `branch_id` (tenant boundary).
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
    pub branch_id: u64,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => {
                return ready(Err(
                    ApiError::Unauthorized("Missing token".to_string()).into()
                ));
            }
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ApiError::Internal.into())),
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => {
                return ready(Err(
                    ApiError::Unauthorized("Invalid token".to_string()).into()
                ));
            }
        };

        let role = match Role::from_id(data.claims.role) {
            Some(r) => r,
            None => {
                return ready(Err(
                    ApiError::Unauthorized("Invalid role".to_string()).into()
                ));
            }
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            username: data.claims.sub,
            role,
            branch_id: data.claims.branch_id,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin only".to_string()))
        }
    }

    /// Returns the employee id, rejecting admin tokens.
    pub fn require_employee(&self) -> Result<u64, ApiError> {
        if self.role == Role::Employee {
            Ok(self.user_id)
        } else {
            Err(ApiError::Forbidden("Employee only".to_string()))
        }
    }
}
