//! Media assets served by the library and the allow-lists that filter them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::error::DomainError;

/// Coarse media family derived from the MIME type prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeCategory {
    Image,
    Video,
    Audio,
    Other,
}

impl MimeCategory {
    pub fn of(mime_type: &str) -> Self {
        let top = mime_type
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match top.as_str() {
            "image" => MimeCategory::Image,
            "video" => MimeCategory::Video,
            "audio" => MimeCategory::Audio,
            _ => MimeCategory::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MimeCategory::Image => "image",
            MimeCategory::Video => "video",
            MimeCategory::Audio => "audio",
            MimeCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: String,
    pub display_name: String,
    pub byte_size: u64,
    pub mime_type: String,
    pub mime_category: MimeCategory,
    pub storage_url: String,
    pub created_at: Option<OffsetDateTime>,
    pub alt_text: Option<String>,
    pub description: Option<String>,
}

impl MediaAsset {
    /// Case-insensitive substring match on the display name.
    /// An empty query matches everything.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty()
            || self
                .display_name
                .to_lowercase()
                .contains(&query.to_lowercase())
    }
}

/// One allow-list entry: a whole family (`image/*`) or an exact MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MimeRule {
    Category(MimeCategory),
    Exact(String),
}

impl MimeRule {
    pub fn matches(&self, mime_type: &str) -> bool {
        match self {
            MimeRule::Category(category) => MimeCategory::of(mime_type) == *category,
            MimeRule::Exact(exact) => exact.eq_ignore_ascii_case(mime_type.trim()),
        }
    }
}

impl FromStr for MimeRule {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        let rule = match value.as_str() {
            "image/*" | "image" => MimeRule::Category(MimeCategory::Image),
            "video/*" | "video" => MimeRule::Category(MimeCategory::Video),
            "audio/*" | "audio" => MimeRule::Category(MimeCategory::Audio),
            exact if exact.contains('/') && !exact.ends_with("/*") => {
                MimeRule::Exact(exact.to_string())
            }
            other => {
                return Err(DomainError::validation(format!(
                    "unsupported media type filter `{other}`"
                )));
            }
        };
        Ok(rule)
    }
}

impl fmt::Display for MimeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MimeRule::Category(category) => write!(f, "{}/*", category.as_str()),
            MimeRule::Exact(exact) => f.write_str(exact),
        }
    }
}

/// Set of MIME rules an asset must satisfy to be offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeAllowList {
    rules: Vec<MimeRule>,
}

impl MimeAllowList {
    pub fn new(rules: Vec<MimeRule>) -> Self {
        Self { rules }
    }

    pub fn images() -> Self {
        Self::new(vec![MimeRule::Category(MimeCategory::Image)])
    }

    /// Images, video and audio: what the picker offers when nothing narrower
    /// was requested.
    pub fn media() -> Self {
        Self::new(vec![
            MimeRule::Category(MimeCategory::Image),
            MimeRule::Category(MimeCategory::Video),
            MimeRule::Category(MimeCategory::Audio),
        ])
    }

    pub fn parse<'a>(values: impl IntoIterator<Item = &'a str>) -> Result<Self, DomainError> {
        let rules = values
            .into_iter()
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[MimeRule] {
        &self.rules
    }

    pub fn allows(&self, mime_type: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(mime_type))
    }
}

impl Default for MimeAllowList {
    fn default() -> Self {
        Self::media()
    }
}

/// Editable descriptive fields of an asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub name: Option<String>,
    pub alt: Option<String>,
    pub description: Option<String>,
}
