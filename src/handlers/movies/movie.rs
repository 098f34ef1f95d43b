use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::database::models::{Movie, MovieDocument, MoviePatch};
use crate::database::{parse_id, DatabaseError};
use crate::error::ApiError;
use crate::handlers::utils::{json_object, PageQuery, Pagination};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MoviePage {
    pub page: u64,
    pub total_pages: u64,
    pub data: Vec<Movie>,
}

/// GET /movies?page=&limit= - Page of movies sorted by title
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<MoviePage>, ApiError> {
    let pagination = Pagination::from_query(&query, &state.config.api);

    let count = state.store.count_movies().await?;
    let data = state
        .store
        .list_movies(pagination.skip(), pagination.limit)
        .await?;

    Ok(Json(MoviePage {
        page: pagination.page,
        total_pages: pagination.total_pages(count),
        data,
    }))
}

/// GET /movies/:id - `data` is null when nothing matches
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Option<Movie>> {
    let id = parse_id(&id)?;
    let movie = state.store.find_movie(id).await?;
    Ok(ApiResponse::success(movie))
}

/// POST /movies - Create unless the title is taken; echoes the submitted body
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let body = json_object(payload)?;
    let document = MovieDocument::from_body(body.clone()).map_err(DatabaseError::from)?;

    match state.store.insert_movie_if_absent(document).await? {
        Some(movie) => {
            tracing::info!(movie_id = %movie.id, "Created movie '{}'", movie.document.title);
            Ok(ApiResponse::created(Value::Object(body)).with_message("Movie created successfully!"))
        }
        None => Err(ApiError::rejected("Movie already exists!")),
    }
}

/// PATCH /movies/:id - Replace the named fields
pub async fn update(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id)?;
    let patch = MoviePatch::from_body(json_object(payload)?).map_err(DatabaseError::from)?;

    let response = match state.store.update_movie(id, &patch).await? {
        Some(movie) => ApiResponse::success(movie)
            .with_message("Movie updated successfully!")
            .into_response(),
        // Not-found stays a 200 for compatibility with existing clients
        None => ApiResponse::message(format!("There is no movie with id {}", raw_id)).into_response(),
    };

    Ok(response)
}

/// DELETE /movies/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;

    let response = match state.store.delete_movie(id).await? {
        Some(movie) => {
            tracing::info!(movie_id = %movie.id, "Deleted movie '{}'", movie.document.title);
            ApiResponse::success(movie)
                .with_message("Movie deleted successfully!")
                .into_response()
        }
        None => ApiResponse::message("Movie not found!").into_response(),
    };

    Ok(response)
}
