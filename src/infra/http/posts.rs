use async_trait::async_trait;
use penna_api_types::{CreatePostResponse, UpdatePostResponse};
use reqwest::Method;
use reqwest::multipart::Form;
use serde_json::Value;
use tracing::debug;

use super::ApiClient;
use crate::application::repos::{PostSubmission, PostsRepo, RepoError};

fn multipart(submission: &PostSubmission) -> Form {
    submission
        .form_fields()
        .into_iter()
        .fold(Form::new(), |form, (key, value)| form.text(key, value))
}

#[async_trait]
impl PostsRepo for ApiClient {
    async fn create_post(&self, submission: &PostSubmission) -> Result<String, RepoError> {
        let url = self.url("create-post")?;
        let resp = self
            .send(
                "create-post",
                self.request(Method::POST, url).multipart(multipart(submission)),
            )
            .await?;
        let body: CreatePostResponse = Self::handle(resp).await?;
        match body.blog_id {
            Value::String(id) if !id.is_empty() => Ok(id),
            Value::Number(id) => Ok(id.to_string()),
            other => Err(RepoError::from_decode(format!(
                "create-post returned unusable blog_id {other}"
            ))),
        }
    }

    async fn update_post(&self, submission: &PostSubmission) -> Result<(), RepoError> {
        let url = self.url("update-post")?;
        let resp = self
            .send(
                "update-post",
                self.request(Method::POST, url).multipart(multipart(submission)),
            )
            .await?;
        let body: UpdatePostResponse = Self::handle(resp).await?;
        debug!(post = ?submission.id, success = %body.success, "update acknowledged");
        Ok(())
    }
}
