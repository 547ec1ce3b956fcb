//! Bookmark CRUD endpoints. All routes here sit behind the auth middleware.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::AuthUser;
use super::validation::{validate_bookmark_id, validate_title, validate_url};
use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{
    BookmarkDto, CreateBookmarkRequest, DeleteBookmarkRequest, MessageResponse,
    UpdateBookmarkRequest,
};
use crate::services::bookmark_service::{BookmarkUpdate, NewBookmark};

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::invalid_body(e.body_text()))
}

pub async fn create_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<CreateBookmarkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = parse_body(payload)?;

    let title = validate_title(&payload.title)?;
    let url = validate_url(&payload.url)?;

    let bookmark = state
        .bookmarks
        .create_bookmark(
            user_id,
            NewBookmark {
                title: title.to_string(),
                url: url.to_string(),
                show_text: payload.show_text,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(BookmarkDto::from(bookmark))),
    ))
}

pub async fn get_bookmarks(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let bookmarks = state.bookmarks.bookmarks_for_user(user_id).await?;

    let dtos: Vec<BookmarkDto> = bookmarks.into_iter().map(BookmarkDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

pub async fn delete_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<DeleteBookmarkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = parse_body(payload)?;
    let id = validate_bookmark_id(payload.id)?;

    state.bookmarks.delete_bookmark(user_id, id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Bookmark deleted",
    ))))
}

pub async fn update_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<UpdateBookmarkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = parse_body(payload)?;

    let id = validate_bookmark_id(payload.id)?;
    let title = validate_title(&payload.title)?;
    let url = validate_url(&payload.url)?;

    let bookmark = state
        .bookmarks
        .update_bookmark(
            user_id,
            BookmarkUpdate {
                id,
                title: title.to_string(),
                url: url.to_string(),
                show_text: payload.show_text,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(BookmarkDto::from(bookmark))))
}
