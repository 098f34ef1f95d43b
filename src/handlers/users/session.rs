use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{generate_jwt, verify_password, Claims, MAX_JWT_EXPIRY_HOURS};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub user: User,
    /// Token lifetime in seconds
    pub expires_in: u64,
}

/// POST /users/signin - Exchange credentials for a JWT
///
/// Unknown usernames and wrong passwords get the same 401 so the response
/// does not reveal which accounts exist.
pub async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> ApiResult<SignInResponse> {
    let Json(request) = payload.map_err(|rejection| ApiError::invalid_json(rejection.body_text()))?;

    let (Some(username), Some(password)) = (request.username, request.password) else {
        return Err(ApiError::bad_request("username and password are required"));
    };

    let user = state
        .store
        .find_user_by_username(&username)
        .await?
        .filter(|user| verify_password(&password, &user.password_hash))
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    let expiry_hours = state.config.security.jwt_expiry_hours.min(MAX_JWT_EXPIRY_HOURS);
    let token = generate_jwt(&Claims::for_user(&user, expiry_hours), &state.config.security)?;

    tracing::info!(user_id = %user.id, "User '{}' signed in", user.username);

    Ok(ApiResponse::success(SignInResponse {
        token,
        user,
        expires_in: expiry_hours * 3600,
    }))
}
