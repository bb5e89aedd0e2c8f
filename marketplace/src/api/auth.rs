//! Registration and login. Customers become active immediately; restaurant
//! and rider registrations stay pending until an admin approves them.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use mongodb::bson::DateTime as BsonDateTime;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::auth::{hash_password, issue_token, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::model::mongo_model::{Restaurant, User};
use crate::model::{ApprovalStatus, Role, UserView};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRegistration {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
    pub restaurant: Option<RestaurantRegistration>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub role: Role,
    pub status: ApprovalStatus,
    pub user: UserView,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    if request.name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.password.is_empty()
    {
        return Err(ApiError::Validation(
            "name, email and password are required".to_string(),
        ));
    }

    let role: Role = request
        .role
        .parse()
        .map_err(|_| ApiError::Validation(format!("invalid role '{}'", request.role)))?;
    if role == Role::Admin {
        // Admin principals are seeded out of band
        return Err(ApiError::Validation(
            "administrator accounts cannot be self-registered".to_string(),
        ));
    }

    let email = request.email.trim().to_lowercase();
    if state.identity.user_by_email(&email).await?.is_some() {
        return Err(ApiError::Validation("user already exists".to_string()));
    }

    let password_hash = hash_password(&request.password)?;
    let status = if role == Role::Customer {
        ApprovalStatus::Active
    } else {
        ApprovalStatus::Pending
    };

    let now = BsonDateTime::now();
    let user = User {
        _id: ObjectId::new(),
        name: request.name.trim().to_string(),
        email,
        password_hash,
        role,
        status,
        phone: request.phone.unwrap_or_default(),
        address: request.address.unwrap_or_default(),
        latitude: request.latitude,
        longitude: request.longitude,
        vehicle_type: (role == Role::Rider)
            .then(|| request.vehicle_type.unwrap_or_else(|| "motorcycle".to_string())),
        license_plate: (role == Role::Rider).then(|| request.license_plate.unwrap_or_default()),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.identity.insert_user(&user).await?;
    tracing::info!(user_id = %user._id, role = %role, "user registered");

    if role == Role::Restaurant {
        if let Some(data) = request.restaurant {
            let restaurant = Restaurant {
                _id: ObjectId::new(),
                owner_id: user._id,
                name: data.name,
                description: data.description,
                phone: user.phone.clone(),
                address: data.address,
                category: data.category,
                latitude: request.latitude,
                longitude: request.longitude,
                image: String::new(),
                status: ApprovalStatus::Pending,
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            // Two single-document writes with no transaction: a failure here
            // leaves the user without a restaurant, which is reported, not
            // rolled back
            if let Err(err) = state.catalog.insert_restaurant(&restaurant).await {
                tracing::error!(
                    error = %err,
                    owner_id = %user._id,
                    "user registered but restaurant creation failed"
                );
                return Err(ApiError::Upstream(
                    "account created but restaurant registration failed".to_string(),
                ));
            }
        }
    }

    let token = issue_token(
        &user._id,
        role,
        &state.auth.jwt_secret,
        state.auth.token_ttl_hours,
    )?;
    let message = match role {
        Role::Customer => "Account created successfully! You can now login.",
        Role::Restaurant => "Restaurant account created! Waiting for admin approval.",
        Role::Rider => "Rider account created! Waiting for admin approval.",
        Role::Admin => unreachable!("admin self-registration is rejected above"),
    };

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: message.to_string(),
            token,
            role,
            status,
            user: UserView::from(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = request.email.trim().to_lowercase();
    let user = state
        .identity
        .user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("invalid email or password".to_string()))?;

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(ApiError::Unauthenticated(
            "invalid email or password".to_string(),
        ));
    }

    if !user.is_active {
        return Err(ApiError::Authorization(
            "account deactivated, please contact an administrator".to_string(),
        ));
    }

    match user.role {
        Role::Restaurant => {
            if user.status != ApprovalStatus::Approved {
                return Err(ApiError::Authorization(
                    "your restaurant account is pending admin approval".to_string(),
                ));
            }
            let restaurant = state
                .catalog
                .restaurant_by_owner(user._id)
                .await?
                .ok_or_else(|| {
                    ApiError::Authorization(
                        "restaurant not found, please contact an administrator".to_string(),
                    )
                })?;
            if restaurant.status != ApprovalStatus::Approved {
                return Err(ApiError::Authorization(
                    "your restaurant is pending admin approval".to_string(),
                ));
            }
        }
        Role::Rider => {
            if user.status != ApprovalStatus::Approved {
                return Err(ApiError::Authorization(
                    "your rider account is pending admin approval".to_string(),
                ));
            }
        }
        Role::Customer | Role::Admin => {}
    }

    let token = issue_token(
        &user._id,
        user.role,
        &state.auth.jwt_secret,
        state.auth.token_ttl_hours,
    )?;
    tracing::info!(user_id = %user._id, role = %user.role, "login successful");

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        role: user.role,
        status: user.status,
        user: UserView::from(&user),
    }))
}
