//! Bearer-token identity: token issue/verify, password hashing, and the
//! authenticated-principal extractor every protected handler takes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use http::header::AUTHORIZATION;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use crate::model::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id, hex-encoded.
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

pub fn issue_token(
    user_id: &ObjectId,
    role: Role,
    secret: &str,
    ttl_hours: i64,
) -> ApiResult<String> {
    let exp = (Utc::now() + Duration::hours(ttl_hours)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_hex(),
        role,
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| ApiError::Upstream(format!("token issuance failed: {err}")))
}

pub fn decode_token(token: &str, secret: &str) -> ApiResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthenticated("not authorized, token failed".to_string()))
}

pub fn hash_password(raw: &str) -> ApiResult<String> {
    Ok(bcrypt::hash(raw, bcrypt::DEFAULT_COST)?)
}

pub fn verify_password(raw: &str, hash: &str) -> ApiResult<bool> {
    Ok(bcrypt::verify(raw, hash)?)
}

/// The authenticated principal behind the current request. Extracting it
/// verifies the bearer token and loads the live user record, so deactivated
/// accounts are cut off even while their tokens are still valid.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: ObjectId,
    pub role: Role,
    pub name: String,
    pub phone: String,
}

impl AuthUser {
    pub fn require_role(&self, role: Role, action: &str) -> ApiResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(ApiError::Authorization(format!(
                "access denied: only {role} principals can {action}"
            )))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("not authorized, no token".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthenticated("not authorized, no token".to_string()))?;

        let claims = decode_token(token, &state.auth.jwt_secret)?;
        let user_id = ObjectId::parse_str(&claims.sub)
            .map_err(|_| ApiError::Unauthenticated("not authorized, token failed".to_string()))?;

        let user = state
            .identity
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthenticated("not authorized, user not found".to_string()))?;

        if !user.is_active {
            return Err(ApiError::Unauthenticated(
                "account deactivated, please contact an administrator".to_string(),
            ));
        }

        Ok(AuthUser {
            id: user._id,
            role: user.role,
            name: user.name,
            phone: user.phone,
        })
    }
}
