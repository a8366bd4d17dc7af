//! In-memory repositories for service tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use time::macros::datetime;

use crate::application::repos::{
    MediaPage, MediaRepo, PostSubmission, PostsRepo, RepoError, UploadFile, UploadedMedia,
};
use crate::domain::media::{MediaAsset, MediaMetadata, MimeCategory};

pub fn asset(id: &str, name: &str, mime: &str) -> MediaAsset {
    MediaAsset {
        id: id.to_string(),
        display_name: name.to_string(),
        byte_size: 1024,
        mime_type: mime.to_string(),
        mime_category: MimeCategory::of(mime),
        storage_url: format!("https://cdn.example.com/{name}"),
        created_at: Some(datetime!(2025-03-01 12:00 UTC)),
        alt_text: None,
        description: None,
    }
}

#[derive(Debug, Default)]
struct MediaState {
    assets: Vec<MediaAsset>,
    list_calls: Vec<(u32, u32)>,
    fail_listing: bool,
    failing_uploads: HashSet<String>,
    hide_uploads: bool,
    upload_attempts: usize,
    metadata: HashMap<String, MediaMetadata>,
}

#[derive(Debug, Default)]
pub struct FakeMediaRepo {
    state: Mutex<MediaState>,
}

impl FakeMediaRepo {
    pub fn with_assets(assets: Vec<MediaAsset>) -> Self {
        Self {
            state: Mutex::new(MediaState {
                assets,
                ..MediaState::default()
            }),
        }
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().expect("state").fail_listing = fail;
    }

    pub fn fail_upload_of(&self, file_name: &str) {
        self.state
            .lock()
            .expect("state")
            .failing_uploads
            .insert(file_name.to_string());
    }

    /// Simulate a listing that lags behind uploads.
    pub fn hide_uploads_from_listing(&self, hide: bool) {
        self.state.lock().expect("state").hide_uploads = hide;
    }

    pub fn list_calls(&self) -> Vec<(u32, u32)> {
        self.state.lock().expect("state").list_calls.clone()
    }

    pub fn upload_attempts(&self) -> usize {
        self.state.lock().expect("state").upload_attempts
    }
}

#[async_trait]
impl MediaRepo for FakeMediaRepo {
    async fn list_media(&self, page: u32, limit: u32) -> Result<MediaPage, RepoError> {
        let mut state = self.state.lock().expect("state");
        state.list_calls.push((page, limit));
        if state.fail_listing {
            return Err(RepoError::Transport("connection refused".into()));
        }
        let start = (page.saturating_sub(1) * limit) as usize;
        let items: Vec<MediaAsset> = state
            .assets
            .iter()
            .skip(start)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(MediaPage {
            has_more: start + items.len() < state.assets.len(),
            items,
            page,
            total: Some(state.assets.len() as u64),
        })
    }

    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, RepoError> {
        let mut state = self.state.lock().expect("state");
        state.upload_attempts += 1;
        if state.failing_uploads.contains(&file.file_name) {
            return Err(RepoError::Status {
                status: 500,
                message: "storage unavailable".into(),
            });
        }
        let id = format!("up-{}", state.upload_attempts);
        let uploaded = asset(&id, &file.file_name, &file.content_type);
        let result = UploadedMedia {
            id,
            public_url: uploaded.storage_url.clone(),
        };
        if !state.hide_uploads {
            state.assets.insert(0, uploaded);
        }
        Ok(result)
    }

    async fn media_metadata(&self, id: &str) -> Result<Option<MediaMetadata>, RepoError> {
        Ok(self.state.lock().expect("state").metadata.get(id).cloned())
    }

    async fn update_media_metadata(
        &self,
        id: &str,
        metadata: &MediaMetadata,
    ) -> Result<MediaMetadata, RepoError> {
        let mut state = self.state.lock().expect("state");
        if let Some(name) = &metadata.name {
            for asset in state.assets.iter_mut().filter(|asset| asset.id == id) {
                asset.display_name = name.clone();
            }
        }
        state.metadata.insert(id.to_string(), metadata.clone());
        Ok(metadata.clone())
    }
}

#[derive(Debug, Default)]
struct PostsState {
    submissions: Vec<PostSubmission>,
    fail: bool,
}

#[derive(Debug, Default)]
pub struct FakePostsRepo {
    state: Mutex<PostsState>,
}

impl FakePostsRepo {
    pub fn fail(&self, fail: bool) {
        self.state.lock().expect("state").fail = fail;
    }

    pub fn submissions(&self) -> Vec<PostSubmission> {
        self.state.lock().expect("state").submissions.clone()
    }
}

#[async_trait]
impl PostsRepo for FakePostsRepo {
    async fn create_post(&self, submission: &PostSubmission) -> Result<String, RepoError> {
        let mut state = self.state.lock().expect("state");
        if state.fail {
            return Err(RepoError::Transport("network unreachable".into()));
        }
        state.submissions.push(submission.clone());
        Ok(format!("{}", 100 + state.submissions.len()))
    }

    async fn update_post(&self, submission: &PostSubmission) -> Result<(), RepoError> {
        let mut state = self.state.lock().expect("state");
        if state.fail {
            return Err(RepoError::Status {
                status: 500,
                message: "update failed".into(),
            });
        }
        state.submissions.push(submission.clone());
        Ok(())
    }
}
