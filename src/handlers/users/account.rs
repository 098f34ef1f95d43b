use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::auth::hash_password;
use crate::database::models::{NewUser, User};
use crate::database::parse_id;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub admin: bool,
}

/// POST /users/signup - Create an account (admin only)
pub async fn signup(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(request) = payload.map_err(|rejection| ApiError::invalid_json(rejection.body_text()))?;

    let username = request.username.unwrap_or_default();
    let password = request.password.unwrap_or_default();
    validate_username_format(&username).map_err(ApiError::bad_request)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let new_user = NewUser {
        username,
        password_hash: hash_password(&password)?,
        admin: request.admin,
    };

    match state.store.insert_user_if_absent(new_user).await? {
        Some(user) => {
            tracing::info!(user_id = %user.id, created_by = %caller.username, "Created user '{}'", user.username);
            Ok(ApiResponse::created(user).with_message("User created successfully!"))
        }
        None => Err(ApiError::rejected("User already exists!")),
    }
}

/// GET /users - All accounts (admin only)
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = state.store.list_users().await?;
    Ok(ApiResponse::success(users))
}

/// GET /users/:id - `data` is null when nothing matches
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Option<User>> {
    let id = parse_id(&id)?;
    let user = state.store.find_user(id).await?;
    Ok(ApiResponse::success(user))
}

fn validate_username_format(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }

    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(format!("Username must be at least {} characters", MIN_USERNAME_LEN));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err("Username may only contain letters, digits, '_', '.' and '-'".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username_format("").is_err());
        assert!(validate_username_format("ab").is_err());
        assert!(validate_username_format("bad name").is_err());
        assert!(validate_username_format("jane.doe-01").is_ok());
    }
}
