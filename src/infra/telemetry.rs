//! Tracing subscriber and metric descriptions.
//!
//! Log output goes to stderr; stdout is reserved for command results.

use std::io;
use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Registry, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

const COUNTERS: [(&str, &str); 6] = [
    (
        "penna_media_pages_fetched_total",
        "Media listing pages merged into a picker.",
    ),
    (
        "penna_media_page_failures_total",
        "Media listing requests that failed.",
    ),
    (
        "penna_media_uploads_total",
        "Files uploaded to the media library.",
    ),
    (
        "penna_media_upload_failures_total",
        "Files whose upload failed or was refused locally.",
    ),
    (
        "penna_post_saves_total",
        "Successful post creates and updates.",
    ),
    (
        "penna_post_save_failures_total",
        "Post saves that failed validation or the API call.",
    ),
];

/// Install the global subscriber for `logging`. Fails if one is already set.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(output_layer(logging.format))
        .with(filter)
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|err| InfraError::telemetry(format!("subscriber already installed: {err}")))
}

fn output_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(io::stderr)
            .boxed(),
    }
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        for (name, description) in COUNTERS {
            describe_counter!(name, Unit::Count, description);
        }
        describe_histogram!(
            "penna_api_request_ms",
            Unit::Milliseconds,
            "Content API round-trip latency by endpoint."
        );
    });
}
