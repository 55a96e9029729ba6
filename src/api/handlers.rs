use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{ItemId, MatchRequest, MatchResponse, MessageSession, RatedItem, UserId, UserProfile},
};

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct SaveBookRequest {
    pub rating: Option<i32>,
    pub review: Option<String>,
    #[serde(default)]
    pub to_be_read: bool,
}

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub user_id: UserId,
    pub other_user_id: UserId,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Ranks caller-supplied candidates against a caller-supplied target
pub async fn match_profiles(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> AppResult<Json<MatchResponse>> {
    let matches = state
        .matcher
        .rank(&request.target, &request.candidates, request.limit)
        .await?;

    Ok(Json(MatchResponse {
        user_id: request.target.user_id,
        matches,
    }))
}

pub async fn get_books(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<UserProfile>> {
    state
        .profiles
        .profile(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No saved books for user {}", user_id)))
}

/// Saves, rates or reviews a book on the user's list
pub async fn save_book(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(UserId, String)>,
    Json(request): Json<SaveBookRequest>,
) -> AppResult<Json<RatedItem>> {
    let item = RatedItem {
        item_id: ItemId(item_id),
        rating: request.rating,
        review: request.review,
        to_be_read: request.to_be_read,
    };

    let saved = state.profiles.save_item(user_id, item).await?;

    tracing::info!(
        user_id = %user_id,
        item_id = %saved.item_id,
        rating = ?saved.rating,
        "Book saved"
    );

    Ok(Json(saved))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(UserId, String)>,
) -> AppResult<StatusCode> {
    let item_id = ItemId(item_id);

    if state.profiles.remove_item(user_id, &item_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "Book {} is not on the list of user {}",
            item_id, user_id
        )))
    }
}

/// Ranks stored readers against the user's saved books
pub async fn get_matches(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<MatchQuery>,
) -> AppResult<Json<MatchResponse>> {
    let matches = state
        .matcher
        .matches_for_user(state.profiles.as_ref(), user_id, query.limit)
        .await?;

    Ok(Json(MatchResponse { user_id, matches }))
}

/// Opens or reuses the chat room between two readers
pub async fn connect(
    State(state): State<AppState>,
    Json(request): Json<ConnectRequest>,
) -> AppResult<Json<MessageSession>> {
    let session = state
        .sessions
        .connect(request.user_id, request.other_user_id)
        .await?;

    Ok(Json(session))
}

/// Looks up the chat room between two readers without touching it
pub async fn get_session(
    State(state): State<AppState>,
    Path((user_id, other_user_id)): Path<(UserId, UserId)>,
) -> AppResult<Json<MessageSession>> {
    state
        .sessions
        .get(user_id, other_user_id)
        .await
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No session between users {} and {}",
                user_id, other_user_id
            ))
        })
}
