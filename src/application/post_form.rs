//! Post form controller: post metadata plus the latest document snapshot.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::application::repos::{PostSubmission, PostsRepo, RepoError};
use crate::domain::document::DocumentSnapshot;
use crate::domain::error::{DocumentError, DomainError};
use crate::domain::posts::PostForm;
use crate::domain::registry::is_public_url;
use crate::domain::types::{PostImageSlot, PostStatus};

const METRIC_POST_SAVES: &str = "penna_post_saves_total";
const METRIC_POST_SAVE_FAILURES: &str = "penna_post_save_failures_total";

#[derive(Debug, Error)]
pub enum PostSaveError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Content(#[from] DocumentError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("failed to format publish date: {0}")]
    Timestamp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created { id: String },
    Updated { id: String },
}

pub struct PostFormController {
    form: PostForm,
    content: watch::Receiver<DocumentSnapshot>,
    repo: Arc<dyn PostsRepo>,
    last_error: Option<String>,
}

impl std::fmt::Debug for PostFormController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostFormController")
            .field("form", &self.form)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl PostFormController {
    /// `content` is the editor session's snapshot channel.
    pub fn new(
        form: PostForm,
        content: watch::Receiver<DocumentSnapshot>,
        repo: Arc<dyn PostsRepo>,
    ) -> Self {
        Self {
            form,
            content,
            repo,
            last_error: None,
        }
    }

    pub fn form(&self) -> &PostForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut PostForm {
        &mut self.form
    }

    /// Latest document snapshot published by the editor.
    pub fn content(&self) -> DocumentSnapshot {
        self.content.borrow().clone()
    }

    /// User-visible message of the last failed save.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.form.set_title(title);
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        self.form.add_tag(tag)
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.form.remove_tag(tag)
    }

    /// Store a URL returned by the media picker as thumbnail or cover.
    pub fn set_image(&mut self, slot: PostImageSlot, url: &str) -> Result<(), DomainError> {
        if !is_public_url(url) {
            return Err(DomainError::validation(format!(
                "`{url}` is not an absolute http(s) URL"
            )));
        }
        self.form.set_image(slot, url);
        Ok(())
    }

    /// Save with the current time as the default publish date.
    pub async fn save(&mut self) -> Result<SaveOutcome, PostSaveError> {
        self.save_at(OffsetDateTime::now_utc()).await
    }

    /// Save the form and the latest content. On failure the form and content
    /// are left as they were and a message is recorded for display.
    pub async fn save_at(&mut self, now: OffsetDateTime) -> Result<SaveOutcome, PostSaveError> {
        match self.submit(now).await {
            Ok(outcome) => {
                counter!(METRIC_POST_SAVES).increment(1);
                self.last_error = None;
                Ok(outcome)
            }
            Err(err) => {
                counter!(METRIC_POST_SAVE_FAILURES).increment(1);
                warn!(slug = %self.form.slug, error = %err, "post save failed");
                self.last_error = Some(save_message(&err));
                Err(err)
            }
        }
    }

    /// Multipart submission for the current state.
    pub fn submission(&self, now: OffsetDateTime) -> Result<PostSubmission, PostSaveError> {
        self.form.validate()?;
        let content = self.content.borrow().to_json_string()?;

        let form = &self.form;
        let id = form.id.clone().filter(|id| !id.is_empty());
        let published_date = if id.is_some() && form.status == PostStatus::Published {
            let date = form.published_date.unwrap_or(now);
            Some(
                date.format(&Rfc3339)
                    .map_err(|err| PostSaveError::Timestamp(err.to_string()))?,
            )
        } else {
            None
        };

        Ok(PostSubmission {
            id,
            title: form.title.clone(),
            slug: form.slug.clone(),
            excerpt: form.excerpt.clone(),
            content,
            thumbnail: form.thumbnail.clone(),
            cover: form.cover.clone(),
            is_featured: form.is_featured,
            tags: form.tags.clone(),
            category: form.category.clone(),
            status: form.status,
            gradient_colors: form.gradient_colors.clone(),
            author: form.author.clone(),
            published_date,
        })
    }

    async fn submit(&mut self, now: OffsetDateTime) -> Result<SaveOutcome, PostSaveError> {
        let submission = self.submission(now)?;
        match submission.id.clone() {
            Some(id) => {
                self.repo.update_post(&submission).await?;
                info!(post = %id, slug = %submission.slug, "post updated");
                Ok(SaveOutcome::Updated { id })
            }
            None => {
                let id = self.repo.create_post(&submission).await?;
                info!(post = %id, slug = %submission.slug, "post created");
                self.form.id = Some(id.clone());
                Ok(SaveOutcome::Created { id })
            }
        }
    }
}

fn save_message(err: &PostSaveError) -> String {
    match err {
        PostSaveError::Invalid(DomainError::Validation { message }) => message.clone(),
        PostSaveError::Repo(_) => "Failed to save post. Please try again.".to_string(),
        other => format!("Failed to save post: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::application::editor::EditorSession;
    use crate::application::testing::FakePostsRepo;
    use crate::domain::blocks::{NewBlock, Placement};
    use crate::domain::commands::CommandMenu;
    use crate::domain::kinds;
    use crate::presentation::blocks::standard_registry;

    fn filled_form() -> PostForm {
        let mut form = PostForm::default();
        form.set_title("Launch Notes");
        form.excerpt = "What shipped".into();
        form.category = "news".into();
        form.author = "author-1".into();
        form
    }

    fn setup() -> (EditorSession, Arc<FakePostsRepo>, PostFormController) {
        let session =
            EditorSession::new(standard_registry(), CommandMenu::default()).expect("session");
        let repo = Arc::new(FakePostsRepo::default());
        let controller = PostFormController::new(
            filled_form(),
            session.subscribe(),
            Arc::clone(&repo) as Arc<dyn PostsRepo>,
        );
        (session, repo, controller)
    }

    #[tokio::test]
    async fn create_sends_latest_content_and_records_id() {
        let (mut session, repo, mut controller) = setup();
        let first = session.document().blocks()[0].id.clone();
        session
            .insert_block(
                NewBlock::new(kinds::HEADING).with_text("Hello"),
                &first,
                Placement::After,
            )
            .expect("insert");

        let outcome = controller.save().await.expect("save");
        assert_eq!(outcome, SaveOutcome::Created { id: "101".into() });
        assert_eq!(controller.form().id.as_deref(), Some("101"));

        let sent = repo.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content, session.snapshot().to_json_string().expect("json"));
        assert_eq!(sent[0].published_date, None);
        assert_eq!(sent[0].slug, "launch-notes");
    }

    #[tokio::test]
    async fn published_updates_default_the_publish_date() {
        let (_session, repo, mut controller) = setup();
        controller.form_mut().id = Some("55".into());
        controller.form_mut().status = PostStatus::Published;

        let outcome = controller
            .save_at(datetime!(2025-06-01 08:30 UTC))
            .await
            .expect("save");
        assert_eq!(outcome, SaveOutcome::Updated { id: "55".into() });
        assert_eq!(
            repo.submissions()[0].published_date.as_deref(),
            Some("2025-06-01T08:30:00Z")
        );
    }

    #[tokio::test]
    async fn failed_save_keeps_form_and_content() {
        let (mut session, repo, mut controller) = setup();
        let first = session.document().blocks()[0].id.clone();
        session
            .insert_block(NewBlock::new(kinds::QUOTE), &first, Placement::After)
            .expect("insert");
        repo.fail(true);

        let before_form = controller.form().clone();
        let before_content = controller.content();
        assert!(controller.save().await.is_err());

        assert_eq!(controller.form(), &before_form);
        assert_eq!(controller.content(), before_content);
        assert_eq!(controller.content().len(), 2);
        assert_eq!(
            controller.last_error(),
            Some("Failed to save post. Please try again.")
        );

        repo.fail(false);
        controller.save().await.expect("retry");
        assert!(controller.last_error().is_none());
    }

    #[tokio::test]
    async fn validation_failure_never_reaches_the_api() {
        let (_session, repo, mut controller) = setup();
        controller.form_mut().category.clear();

        assert!(matches!(
            controller.save().await,
            Err(PostSaveError::Invalid(_))
        ));
        assert!(repo.submissions().is_empty());
        assert_eq!(
            controller.last_error(),
            Some("missing required fields: category")
        );
    }

    #[test]
    fn images_must_be_public_urls() {
        let (_session, _repo, mut controller) = setup();
        assert!(
            controller
                .set_image(PostImageSlot::Thumbnail, "file:///tmp/a.png")
                .is_err()
        );
        controller
            .set_image(PostImageSlot::Thumbnail, "https://cdn.example.com/t.png")
            .expect("thumbnail");
        assert_eq!(
            controller.form().thumbnail.as_deref(),
            Some("https://cdn.example.com/t.png")
        );
    }
}
