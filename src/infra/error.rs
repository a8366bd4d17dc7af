use thiserror::Error;

/// Failures of the runtime around the services: files, logging, HTTP client.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("local file access failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("logging could not be initialised: {0}")]
    Telemetry(String),
    #[error("client is misconfigured: {message}")]
    Configuration { message: String },
    #[error("failed to build the content API client")]
    HttpClient(#[source] reqwest::Error),
}

impl InfraError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
