//! Repository traits describing the external content API.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::media::{MediaAsset, MediaMetadata};
use crate::domain::types::PostStatus;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("api responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepoError {
    pub fn from_transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn from_decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// One page of the media listing, newest first as served.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaPage {
    pub items: Vec<MediaAsset>,
    pub page: u32,
    pub has_more: bool,
    pub total: Option<u64>,
}

/// A local file ready to be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub id: String,
    pub public_url: String,
}

/// Multipart body of a post save.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSubmission {
    pub id: Option<String>,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    /// Serialized block array.
    pub content: String,
    pub thumbnail: Option<String>,
    pub cover: Option<String>,
    pub is_featured: bool,
    pub tags: Vec<String>,
    pub category: String,
    pub status: PostStatus,
    pub gradient_colors: String,
    pub author: String,
    /// RFC 3339 timestamp, sent only for published updates.
    pub published_date: Option<String>,
}

impl PostSubmission {
    /// Ordered multipart text fields. Creates send the cover as `coverImage`,
    /// updates as `cover` together with the post `id`.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("title", self.title.clone()),
            ("slug", self.slug.clone()),
            ("excerpt", self.excerpt.clone()),
            ("content", self.content.clone()),
        ];
        if let Some(thumbnail) = &self.thumbnail {
            fields.push(("thumbnail", thumbnail.clone()));
        }
        if let Some(cover) = &self.cover {
            let key = if self.id.is_some() { "cover" } else { "coverImage" };
            fields.push((key, cover.clone()));
        }
        fields.push(("isFeatured", self.is_featured.to_string()));
        fields.push((
            "tags",
            serde_json::to_string(&self.tags).unwrap_or_else(|_| "[]".to_string()),
        ));
        fields.push(("category", self.category.clone()));
        fields.push(("status", self.status.as_str().to_string()));
        fields.push(("gradient_colors", self.gradient_colors.clone()));
        if let Some(id) = &self.id {
            fields.push(("id", id.clone()));
        }
        fields.push(("author", self.author.clone()));
        if let Some(published) = &self.published_date {
            fields.push(("published_date", published.clone()));
        }
        fields
    }
}

#[async_trait]
pub trait MediaRepo: Send + Sync {
    async fn list_media(&self, page: u32, limit: u32) -> Result<MediaPage, RepoError>;

    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, RepoError>;

    /// `Ok(None)` when the asset has no metadata record.
    async fn media_metadata(&self, id: &str) -> Result<Option<MediaMetadata>, RepoError>;

    async fn update_media_metadata(
        &self,
        id: &str,
        metadata: &MediaMetadata,
    ) -> Result<MediaMetadata, RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Create a post and return its new id.
    async fn create_post(&self, submission: &PostSubmission) -> Result<String, RepoError>;

    async fn update_post(&self, submission: &PostSubmission) -> Result<(), RepoError>;
}
