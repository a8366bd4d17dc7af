//! Content API client.
//!
//! [`ApiClient`] speaks to the blog admin API over HTTP and implements the
//! repository traits the editor, picker and post form depend on. Requests are
//! timed into `penna_api_request_ms`, labelled by endpoint.

mod media;
mod posts;

use std::time::{Duration, Instant};

use metrics::histogram;
use penna_api_types::ApiErrorBody;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::application::repos::RepoError;
use crate::config::ApiSettings;
use crate::infra::error::InfraError;

const METRIC_API_REQUEST_MS: &str = "penna_api_request_ms";

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    /// `base` must end with `/` so relative endpoint paths nest under it.
    pub fn new(base: Url, timeout: Duration, token: Option<String>) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(InfraError::HttpClient)?;
        Ok(Self {
            client,
            base,
            token,
        })
    }

    pub fn from_settings(settings: &ApiSettings) -> Result<Self, InfraError> {
        let base = settings.base_url.clone().ok_or_else(|| {
            InfraError::configuration("api.base_url is required (use --api-base-url or PENNA__API__BASE_URL)")
        })?;
        Self::new(base, settings.timeout, settings.access_token.clone())
    }

    pub fn user_agent() -> &'static str {
        concat!("penna/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, RepoError> {
        self.base.join(path).map_err(|err| RepoError::InvalidInput {
            message: format!("invalid endpoint `{path}`: {err}"),
        })
    }

    /// `{base}{collection}/{id}` with the id percent-encoded as one segment.
    fn item_url(&self, collection: &str, id: &str) -> Result<Url, RepoError> {
        let mut url = self.url(collection)?;
        url.path_segments_mut()
            .map_err(|()| RepoError::InvalidInput {
                message: format!("base URL `{}` cannot carry a path", self.base),
            })?
            .push(id);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self.client.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, endpoint: &'static str, req: RequestBuilder) -> Result<Response, RepoError> {
        let started_at = Instant::now();
        let result = req.send().await;
        histogram!(METRIC_API_REQUEST_MS, "endpoint" => endpoint)
            .record(started_at.elapsed().as_secs_f64() * 1000.0);

        let resp = result.map_err(RepoError::from_transport)?;
        debug!(endpoint, status = resp.status().as_u16(), "api response");
        Ok(resp)
    }

    async fn handle<T: DeserializeOwned>(resp: Response) -> Result<T, RepoError> {
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(RepoError::from_transport)?;
        if status == StatusCode::NOT_FOUND {
            return Err(RepoError::NotFound);
        }
        if !status.is_success() {
            return Err(RepoError::Status {
                status: status.as_u16(),
                message: error_message(&bytes),
            });
        }
        serde_json::from_slice(&bytes).map_err(RepoError::from_decode)
    }
}

/// The `error` field of an API error body, or the raw body when it is not one.
fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                "empty response body".to_string()
            } else {
                text
            }
        }
    }
}
