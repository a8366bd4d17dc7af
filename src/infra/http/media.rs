use async_trait::async_trait;
use penna_api_types::{
    MediaItem, MediaListResponse, MediaMetadataPatch, MediaMetadataResponse, UploadResponse,
};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::warn;

use super::ApiClient;
use crate::application::repos::{MediaPage, MediaRepo, RepoError, UploadFile, UploadedMedia};
use crate::domain::media::{MediaAsset, MediaMetadata, MimeCategory};

#[async_trait]
impl MediaRepo for ApiClient {
    async fn list_media(&self, page: u32, limit: u32) -> Result<MediaPage, RepoError> {
        let mut url = self.url("media")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());

        let resp = self.send("media", self.request(Method::GET, url)).await?;
        let body: MediaListResponse = Self::handle(resp).await?;

        let pagination = body.pagination;
        Ok(MediaPage {
            items: body.media.into_iter().filter_map(asset_from_item).collect(),
            page: pagination.map_or(page, |p| p.page),
            has_more: pagination.is_some_and(|p| p.has_more),
            total: pagination.map(|p| p.total),
        })
    }

    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, RepoError> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|err| RepoError::InvalidInput {
                message: format!("invalid content type `{}`: {err}", file.content_type),
            })?;
        let form = Form::new().part("file", part);

        let url = self.url("upload")?;
        let resp = self
            .send("upload", self.request(Method::POST, url).multipart(form))
            .await?;
        let body: UploadResponse = Self::handle(resp).await?;
        Ok(UploadedMedia {
            id: body.id,
            public_url: body.public_url,
        })
    }

    async fn media_metadata(&self, id: &str) -> Result<Option<MediaMetadata>, RepoError> {
        let url = self.item_url("blogs-media", id)?;
        let resp = self
            .send("blogs-media", self.request(Method::GET, url))
            .await?;
        match Self::handle::<MediaMetadataResponse>(resp).await {
            Ok(body) => Ok(Some(metadata_from_response(body))),
            Err(RepoError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn update_media_metadata(
        &self,
        id: &str,
        metadata: &MediaMetadata,
    ) -> Result<MediaMetadata, RepoError> {
        let patch = MediaMetadataPatch {
            name: metadata.name.clone().unwrap_or_default(),
            alt: metadata.alt.clone().unwrap_or_default(),
            description: metadata.description.clone(),
        };
        let url = self.item_url("blogs-media", id)?;
        let resp = self
            .send("blogs-media", self.request(Method::PATCH, url).json(&patch))
            .await?;
        let body: MediaMetadataResponse = Self::handle(resp).await?;
        Ok(metadata_from_response(body))
    }
}

/// Listing rows without an id or URL cannot be selected and are skipped.
fn asset_from_item(item: MediaItem) -> Option<MediaAsset> {
    let Some(id) = item.id.filter(|id| !id.is_empty()) else {
        warn!(name = %item.name, "skipping media entry without an id");
        return None;
    };
    if item.url.is_empty() {
        warn!(media = %id, name = %item.name, "skipping media entry without a url");
        return None;
    }
    Some(MediaAsset {
        mime_category: MimeCategory::of(&item.content_type),
        id,
        display_name: item.name,
        byte_size: item.size,
        mime_type: item.content_type,
        storage_url: item.url,
        created_at: item.created_at,
        alt_text: None,
        description: None,
    })
}

fn metadata_from_response(body: MediaMetadataResponse) -> MediaMetadata {
    MediaMetadata {
        name: body.name,
        alt: body.alt,
        description: body.description,
    }
}
