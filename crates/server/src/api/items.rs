//! Feed item API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use youcast_core::{FeedError, ItemStatus, PodcastItem};

use super::handlers::ErrorResponse;
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for adding an item to the feed
#[derive(Debug, Deserialize)]
pub struct CreateItemBody {
    pub title: String,
    /// Media file to download
    pub media_url: String,
    pub mime_type: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    /// Page the media was discovered on
    pub original_url: Option<String>,
}

/// Request body for editing an item. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateItemBody {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Response for item operations
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub original_url: String,
    pub file_name: String,
    pub mime_type: String,
    pub content_length: u64,
    pub added_at: String,
    pub status: ItemStatus,
    pub playable: bool,
}

impl From<PodcastItem> for ItemResponse {
    fn from(item: PodcastItem) -> Self {
        Self {
            id: item.id(),
            playable: item.playable(),
            title: item.title,
            author: item.author,
            description: item.description,
            original_url: item.original_url,
            file_name: item.file_name,
            mime_type: item.mime_type,
            content_length: item.content_length,
            added_at: item.added_at.to_rfc3339(),
            status: item.status,
        }
    }
}

/// Response for listing items
#[derive(Debug, Serialize)]
pub struct ListItemsResponse {
    pub items: Vec<ItemResponse>,
    pub total: usize,
}

fn feed_error(e: FeedError) -> ApiError {
    let status = match &e {
        FeedError::InvalidMediaUrl { .. } => StatusCode::BAD_REQUEST,
        _ if e.is_not_found() => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    ErrorResponse::with_status(status, e.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// List feed items, newest first
pub async fn list_items(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListItemsResponse>, ApiError> {
    let items = state.feed().items().map_err(feed_error)?;

    Ok(Json(ListItemsResponse {
        total: items.len(),
        items: items.into_iter().map(ItemResponse::from).collect(),
    }))
}

/// Add an item and enqueue its download
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateItemBody>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    if body.title.trim().is_empty() {
        return Err(ErrorResponse::with_status(
            StatusCode::BAD_REQUEST,
            "title cannot be empty",
        ));
    }

    let mut item = PodcastItem::new(body.title, Utc::now());
    item.mime_type = body.mime_type.unwrap_or_default();
    item.author = body.author.unwrap_or_default();
    item.description = body.description.unwrap_or_default();
    item.original_url = body.original_url.unwrap_or_default();

    let item = state
        .feed()
        .add_item(item, &body.media_url)
        .map_err(feed_error)?;

    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

/// Edit the title or description of an item
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateItemBody>,
) -> Result<Json<ItemResponse>, ApiError> {
    if body.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ErrorResponse::with_status(
            StatusCode::BAD_REQUEST,
            "title cannot be empty",
        ));
    }

    let item = state
        .feed()
        .update_item(&id, body.title, body.description)
        .map_err(feed_error)?;

    Ok(Json(ItemResponse::from(item)))
}

/// Remove an item, its job and its media file
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.feed().remove_item(&id).await.map_err(feed_error)?;
    Ok(StatusCode::NO_CONTENT)
}
