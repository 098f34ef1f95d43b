use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::models::movie::{parse_id_list, CAST, CREW};
use crate::database::models::{CreditSet, Movie, PopulatedMovie};
use crate::database::{parse_id, CreditRemoval, DatabaseError};
use crate::error::ApiError;
use crate::handlers::utils::json_object;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /movies/:id/credits - Movie with cast and crew expanded to person documents
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Option<PopulatedMovie>> {
    let id = parse_id(&id)?;
    let movie = state.store.find_movie_with_credits(id).await?;
    Ok(ApiResponse::success(movie))
}

/// POST /movies/:id/credits - Add `cast` and/or `crew` ids, each one id or an array
pub async fn post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Movie> {
    let id = parse_id(&id)?;
    let mut body = json_object(payload)?;

    let credits = CreditSet {
        cast: take_ids(&mut body, CAST)?,
        crew: take_ids(&mut body, CREW)?,
    };

    match state.store.add_credits(id, &credits).await? {
        Some(movie) => Ok(ApiResponse::created(movie).with_message("Credit updated successfully!")),
        None => Err(ApiError::rejected("Credit id not found!")),
    }
}

/// PATCH /movies/:id/credits/:credit_id - Not implemented; the request shape is undecided
pub async fn patch() -> ApiResult<()> {
    Err(ApiError::not_implemented("Updating credits is not implemented yet"))
}

/// DELETE /movies/:id/credits/:credit_id - Drop a reference from cast and crew
pub async fn delete(
    State(state): State<AppState>,
    Path((id, credit_id)): Path<(String, String)>,
) -> ApiResult<Movie> {
    let id = parse_id(&id)?;

    // An unparseable credit id is never referenced by a movie
    let removal = match parse_id(&credit_id) {
        Ok(credit_id) => state.store.remove_credit(id, credit_id).await?,
        Err(_) => match state.store.find_movie(id).await? {
            Some(_) => CreditRemoval::CreditNotFound,
            None => CreditRemoval::MovieNotFound,
        },
    };

    match removal {
        CreditRemoval::Removed(movie) => {
            Ok(ApiResponse::success(movie).with_message("Crew / Cast deleted successfully!"))
        }
        CreditRemoval::MovieNotFound => Err(ApiError::rejected("Movie not found!")),
        CreditRemoval::CreditNotFound => Err(ApiError::rejected("Crew / Cast not found!")),
    }
}

/// Omitted or null fields yield no ids.
fn take_ids(body: &mut Map<String, Value>, field: &str) -> Result<Vec<Uuid>, DatabaseError> {
    match body.remove(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => Ok(parse_id_list(field, value)?),
    }
}
