//! Wire shapes of the blog admin HTTP API.
//!
//! Field names follow the JSON emitted by the API verbatim, which mixes
//! camelCase (`createdAt`, `hasMore`, `publicUrl`) and snake_case
//! (`created_at`, `blog_id`) depending on the endpoint.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// `GET media?page&limit` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaListResponse {
    #[serde(default)]
    pub media: Vec<MediaItem>,
    pub pagination: Option<Pagination>,
}

/// A single stored object as listed by the media endpoint.
///
/// Storage folder rows come through with a null `id` and `createdAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type", default = "default_media_type")]
    pub content_type: String,
    #[serde(rename = "createdAt", default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    pub url: String,
}

fn default_media_type() -> String {
    "image".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
    #[serde(default)]
    pub total: u64,
}

/// `POST upload` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "publicUrl")]
    pub public_url: String,
    pub id: String,
}

/// Error body returned by every endpoint on non-2xx statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// `GET blogs-media/{id}` and `PATCH blogs-media/{id}` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadataResponse {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `PATCH blogs-media/{id}` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadataPatch {
    pub name: String,
    pub alt: String,
    pub description: Option<String>,
}

/// `POST create-post` success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePostResponse {
    pub blog_id: serde_json::Value,
}

/// `POST update-post` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePostResponse {
    pub success: String,
}
