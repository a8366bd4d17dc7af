//! Media picker: browse, search, upload and select one asset.
//!
//! Every open starts a new generation. Page results carry the generation
//! they were requested under and are dropped when it no longer matches, so a
//! picker that was closed or reopened is never updated by an old response.
//! Within one open, every refresh starts a new epoch and pages requested
//! before it are dropped the same way.
//! Page fetches are split into ticket, fetch and apply steps so callers that
//! drive the network themselves can keep the picker responsive meanwhile;
//! [`MediaPicker::open`] and [`MediaPicker::load_more`] run all three.

use std::sync::Arc;

use futures::future::join_all;
use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::repos::{MediaPage, MediaRepo, RepoError, UploadFile, UploadedMedia};
use crate::domain::media::{MediaAsset, MediaMetadata, MimeAllowList, MimeCategory};
use crate::util::bytes::format_bytes;

const METRIC_MEDIA_PAGES: &str = "penna_media_pages_fetched_total";
const METRIC_MEDIA_PAGE_FAILURES: &str = "penna_media_page_failures_total";
const METRIC_MEDIA_UPLOADS: &str = "penna_media_uploads_total";
const METRIC_MEDIA_UPLOAD_FAILURES: &str = "penna_media_upload_failures_total";

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum MediaPickerError {
    #[error("media picker is not open")]
    NotOpen,
    #[error("a page is already being loaded")]
    LoadInFlight,
    #[error("no more pages to load")]
    NoMorePages,
    #[error("media asset `{0}` is not available in this picker")]
    UnknownAsset(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaPickerSettings {
    pub page_size: u32,
    pub max_upload_bytes: u64,
}

impl Default for MediaPickerSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Permission to fetch one page for one picker generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub epoch: u64,
    pub page: u32,
    pub limit: u32,
}

impl PageTicket {
    pub async fn fetch(self, repo: &dyn MediaRepo) -> PageResult {
        let result = repo.list_media(self.page, self.limit).await;
        PageResult {
            ticket: self,
            result,
        }
    }
}

#[derive(Debug)]
pub struct PageResult {
    pub ticket: PageTicket,
    pub result: Result<MediaPage, RepoError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was merged; carries the number of assets it held.
    Applied(usize),
    /// The page request failed; the message is shown instead.
    Failed,
    /// The picker was closed, reopened or refreshed since the page was
    /// requested.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub file_name: String,
    pub message: String,
}

/// Result of one upload batch. Failures never hide successes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadBatchReport {
    pub uploaded: Vec<UploadedMedia>,
    pub failures: Vec<UploadFailure>,
}

impl UploadBatchReport {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct MediaPicker {
    repo: Arc<dyn MediaRepo>,
    settings: MediaPickerSettings,
    allowed: MimeAllowList,
    open: bool,
    generation: u64,
    epoch: u64,
    assets: Vec<MediaAsset>,
    page: u32,
    has_more: bool,
    in_flight: Vec<PageTicket>,
    search: String,
    upload_errors: Vec<UploadFailure>,
    empty_message: Option<String>,
}

impl std::fmt::Debug for MediaPicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPicker")
            .field("open", &self.open)
            .field("generation", &self.generation)
            .field("assets", &self.assets.len())
            .field("page", &self.page)
            .field("has_more", &self.has_more)
            .finish_non_exhaustive()
    }
}

impl MediaPicker {
    pub fn new(repo: Arc<dyn MediaRepo>, settings: MediaPickerSettings) -> Self {
        Self {
            repo,
            settings,
            allowed: MimeAllowList::default(),
            open: false,
            generation: 0,
            epoch: 0,
            assets: Vec::new(),
            page: 0,
            has_more: false,
            in_flight: Vec::new(),
            search: String::new(),
            upload_errors: Vec::new(),
            empty_message: None,
        }
    }

    pub fn repo(&self) -> Arc<dyn MediaRepo> {
        Arc::clone(&self.repo)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn allowed(&self) -> &MimeAllowList {
        &self.allowed
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn loaded(&self) -> &[MediaAsset] {
        &self.assets
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn upload_errors(&self) -> &[UploadFailure] {
        &self.upload_errors
    }

    /// Message shown instead of the grid when the listing failed.
    pub fn empty_message(&self) -> Option<&str> {
        self.empty_message.as_deref()
    }

    /// Open the picker and hand out the ticket for page 1.
    pub fn begin_open(&mut self, allowed: MimeAllowList) -> PageTicket {
        self.generation += 1;
        self.epoch = 0;
        self.in_flight.clear();
        self.open = true;
        self.allowed = allowed;
        self.assets.clear();
        self.page = 0;
        self.has_more = false;
        self.search.clear();
        self.upload_errors.clear();
        self.empty_message = None;
        self.issue(1)
    }

    /// Ticket for the next page. Rejected while any page of this open is in
    /// flight, including one a later refresh made stale.
    pub fn begin_load_more(&mut self) -> Result<PageTicket, MediaPickerError> {
        if !self.open {
            return Err(MediaPickerError::NotOpen);
        }
        if !self.in_flight.is_empty() {
            return Err(MediaPickerError::LoadInFlight);
        }
        if !self.has_more {
            return Err(MediaPickerError::NoMorePages);
        }
        Ok(self.issue(self.page + 1))
    }

    /// Ticket that reloads page 1, replacing what is loaded. Tickets issued
    /// before it come back [`PageOutcome::Stale`].
    pub fn begin_refresh(&mut self) -> Result<PageTicket, MediaPickerError> {
        if !self.open {
            return Err(MediaPickerError::NotOpen);
        }
        self.epoch += 1;
        Ok(self.issue(1))
    }

    /// Merge a fetched page. Page 1 replaces the list; later pages append.
    pub fn apply_page(&mut self, page: PageResult) -> PageOutcome {
        let PageResult { ticket, result } = page;
        if !self.open || ticket.generation != self.generation {
            return PageOutcome::Stale;
        }
        self.in_flight.retain(|pending| *pending != ticket);
        if ticket.epoch != self.epoch {
            return PageOutcome::Stale;
        }

        match result {
            Ok(listing) => {
                counter!(METRIC_MEDIA_PAGES).increment(1);
                let count = listing.items.len();
                if ticket.page == 1 {
                    self.assets = listing.items;
                } else {
                    for item in listing.items {
                        if !self.assets.iter().any(|asset| asset.id == item.id) {
                            self.assets.push(item);
                        }
                    }
                }
                self.page = ticket.page;
                self.has_more = listing.has_more;
                self.empty_message = None;
                PageOutcome::Applied(count)
            }
            Err(err) => {
                counter!(METRIC_MEDIA_PAGE_FAILURES).increment(1);
                warn!(page = ticket.page, error = %err, "media listing failed");
                if ticket.page == 1 {
                    self.assets.clear();
                    self.has_more = false;
                }
                self.empty_message = Some(format!("Could not load media: {err}"));
                PageOutcome::Failed
            }
        }
    }

    /// Open the picker restricted to `allowed` and load page 1.
    pub async fn open(&mut self, allowed: MimeAllowList) -> PageOutcome {
        let ticket = self.begin_open(allowed);
        let page = ticket.fetch(self.repo.as_ref()).await;
        self.apply_page(page)
    }

    pub async fn load_more(&mut self) -> Result<PageOutcome, MediaPickerError> {
        let ticket = self.begin_load_more()?;
        let page = ticket.fetch(self.repo.as_ref()).await;
        Ok(self.apply_page(page))
    }

    pub async fn refresh(&mut self) -> Result<PageOutcome, MediaPickerError> {
        let ticket = self.begin_refresh()?;
        let page = ticket.fetch(self.repo.as_ref()).await;
        Ok(self.apply_page(page))
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    /// Loaded assets passing the allow-list and the search text.
    pub fn visible(&self) -> Vec<&MediaAsset> {
        self.assets
            .iter()
            .filter(|asset| self.allowed.allows(&asset.mime_type))
            .filter(|asset| asset.matches_search(&self.search))
            .collect()
    }

    /// Upload `files` concurrently and wait for all of them.
    ///
    /// Oversize files fail without a request. When at least one upload
    /// succeeded, page 1 is reloaded and any uploaded asset missing from it
    /// is put back at the top of the list.
    pub async fn upload_files(
        &mut self,
        files: Vec<UploadFile>,
    ) -> Result<UploadBatchReport, MediaPickerError> {
        if !self.open {
            return Err(MediaPickerError::NotOpen);
        }

        let limit = self.settings.max_upload_bytes;
        let mut report = UploadBatchReport::default();
        let mut accepted = Vec::with_capacity(files.len());
        for file in files {
            if file.size() > limit {
                counter!(METRIC_MEDIA_UPLOAD_FAILURES).increment(1);
                report.failures.push(UploadFailure {
                    message: format!(
                        "{} exceeds the {} upload limit",
                        format_bytes(file.size()),
                        format_bytes(limit)
                    ),
                    file_name: file.file_name,
                });
            } else {
                accepted.push(file);
            }
        }

        let repo = self.repo.as_ref();
        let results = join_all(accepted.into_iter().map(|file| async move {
            let result = repo.upload(file.clone()).await;
            (file, result)
        }))
        .await;

        let mut fresh = Vec::new();
        for (file, result) in results {
            match result {
                Ok(uploaded) => {
                    counter!(METRIC_MEDIA_UPLOADS).increment(1);
                    fresh.push(uploaded_asset(&file, &uploaded));
                    report.uploaded.push(uploaded);
                }
                Err(err) => {
                    counter!(METRIC_MEDIA_UPLOAD_FAILURES).increment(1);
                    warn!(file = %file.file_name, error = %err, "media upload failed");
                    report.failures.push(UploadFailure {
                        file_name: file.file_name,
                        message: err.to_string(),
                    });
                }
            }
        }
        info!(
            uploaded = report.uploaded.len(),
            failed = report.failures.len(),
            "media upload batch finished"
        );

        self.upload_errors = report.failures.clone();
        if !report.uploaded.is_empty() {
            self.refresh_keeping(fresh).await;
        }
        Ok(report)
    }

    /// Select an asset: returns its URL and closes the picker.
    pub fn select(&mut self, asset_id: &str) -> Result<String, MediaPickerError> {
        if !self.open {
            return Err(MediaPickerError::NotOpen);
        }
        let url = self
            .visible()
            .into_iter()
            .find(|asset| asset.id == asset_id)
            .map(|asset| asset.storage_url.clone())
            .ok_or_else(|| MediaPickerError::UnknownAsset(asset_id.to_string()))?;
        self.close();
        Ok(url)
    }

    /// Close without selecting; search text and upload errors are discarded.
    pub fn cancel(&mut self) {
        self.close();
    }

    /// Metadata record of an asset, `None` when the API has none.
    pub async fn describe(&self, asset_id: &str) -> Result<Option<MediaMetadata>, MediaPickerError> {
        Ok(self.repo.media_metadata(asset_id).await?)
    }

    /// Save metadata and reload page 1 so edited names show up.
    pub async fn save_metadata(
        &mut self,
        asset_id: &str,
        metadata: &MediaMetadata,
    ) -> Result<MediaMetadata, MediaPickerError> {
        let saved = self.repo.update_media_metadata(asset_id, metadata).await?;
        if self.open {
            self.refresh().await?;
        }
        Ok(saved)
    }

    fn close(&mut self) {
        self.open = false;
        self.in_flight.clear();
        self.search.clear();
        self.upload_errors.clear();
    }

    fn issue(&mut self, page: u32) -> PageTicket {
        let ticket = PageTicket {
            generation: self.generation,
            epoch: self.epoch,
            page,
            limit: self.settings.page_size,
        };
        self.in_flight.push(ticket);
        ticket
    }

    async fn refresh_keeping(&mut self, fresh: Vec<MediaAsset>) {
        if self.refresh().await.is_err() {
            return;
        }

        let missing: Vec<MediaAsset> = fresh
            .into_iter()
            .filter(|asset| !self.assets.iter().any(|known| known.id == asset.id))
            .collect();
        if !missing.is_empty() {
            self.assets.splice(0..0, missing);
        }
    }
}

/// Listing entry for a file that was just uploaded, used until the server
/// listing includes it.
fn uploaded_asset(file: &UploadFile, uploaded: &UploadedMedia) -> MediaAsset {
    MediaAsset {
        id: uploaded.id.clone(),
        display_name: file.file_name.clone(),
        byte_size: file.size(),
        mime_type: file.content_type.clone(),
        mime_category: MimeCategory::of(&file.content_type),
        storage_url: uploaded.public_url.clone(),
        created_at: Some(OffsetDateTime::now_utc()),
        alt_text: None,
        description: None,
    }
}
