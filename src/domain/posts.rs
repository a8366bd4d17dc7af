//! Post metadata edited next to the block document.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::error::DomainError;
use crate::domain::slug::draft_slug;
use crate::domain::types::{PostImageSlot, PostStatus};

/// Editable post record. `id` is `None` until the post has been created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub gradient_colors: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_date: Option<OffsetDateTime>,
}

impl PostForm {
    pub fn is_saved(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Set the title. While the post is unsaved the slug follows the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        if !self.is_saved() {
            self.slug = draft_slug(&self.title);
        }
    }

    /// Add a tag after trimming; blanks and duplicates are ignored.
    /// Returns whether the tag list changed.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|existing| existing == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|existing| existing != tag);
        self.tags.len() != before
    }

    pub fn set_image(&mut self, slot: PostImageSlot, url: impl Into<String>) {
        let url = Some(url.into());
        match slot {
            PostImageSlot::Thumbnail => self.thumbnail = url,
            PostImageSlot::Cover => self.cover = url,
        }
    }

    /// Check the fields the persistence API requires.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("title", &self.title),
            ("slug", &self.slug),
            ("excerpt", &self.excerpt),
            ("category", &self.category),
        ] {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        if self.is_saved() && self.author.trim().is_empty() {
            missing.push("author");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_drives_slug_until_saved() {
        let mut form = PostForm::default();
        form.set_title("Hello World");
        assert_eq!(form.slug, "hello-world");

        form.id = Some("42".into());
        form.set_title("Renamed");
        assert_eq!(form.slug, "hello-world");
        assert_eq!(form.title, "Renamed");
    }

    #[test]
    fn tags_are_trimmed_and_unique() {
        let mut form = PostForm::default();
        assert!(form.add_tag("  rust "));
        assert!(!form.add_tag("rust"));
        assert!(!form.add_tag("   "));
        assert!(form.add_tag("web"));
        assert_eq!(form.tags, ["rust", "web"]);

        assert!(form.remove_tag("rust"));
        assert!(!form.remove_tag("rust"));
        assert_eq!(form.tags, ["web"]);
    }

    #[test]
    fn validation_lists_missing_fields() {
        let mut form = PostForm::default();
        form.set_title("Only a title");
        let err = form.validate().expect_err("invalid");
        assert_eq!(
            err.to_string(),
            "domain validation failed: missing required fields: excerpt, category"
        );

        form.excerpt = "Short".into();
        form.category = "news".into();
        assert!(form.validate().is_ok());

        form.id = Some("7".into());
        assert!(form.validate().is_err());
        form.author = "a-1".into();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn image_slots_are_independent() {
        let mut form = PostForm::default();
        form.set_image(PostImageSlot::Cover, "https://cdn.example.com/c.png");
        assert_eq!(form.cover.as_deref(), Some("https://cdn.example.com/c.png"));
        assert!(form.thumbnail.is_none());
    }
}
