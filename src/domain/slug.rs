//! Post slugs derived from titles.
//!
//! Han characters are spelled out in pinyin before slugification, so
//! “基线对齐” yields `ji-xian-dui-qi` rather than nothing.

use pinyin::ToPinyin;
use slug::slugify;
use thiserror::Error;

/// Longest slug produced from a title; longer ones are cut at a hyphen.
pub const MAX_SLUG_LEN: usize = 96;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("title is blank")]
    EmptyInput,
    #[error("title `{input}` has no characters usable in a slug")]
    Unrepresentable { input: String },
}

pub fn derive_slug(title: &str) -> Result<String, SlugError> {
    if title.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let words: Vec<String> = title
        .chars()
        .map(|ch| match ch.to_pinyin() {
            Some(syllable) => format!(" {} ", syllable.plain()),
            None => ch.to_string(),
        })
        .collect();
    let slug = truncate(slugify(words.concat()));

    if slug.is_empty() {
        Err(SlugError::Unrepresentable {
            input: title.to_string(),
        })
    } else {
        Ok(slug)
    }
}

/// Slug offered while the title is still being typed; empty until the
/// title contains something usable.
pub fn draft_slug(title: &str) -> String {
    derive_slug(title).unwrap_or_default()
}

fn truncate(slug: String) -> String {
    if slug.len() <= MAX_SLUG_LEN {
        return slug;
    }
    let head = &slug[..MAX_SLUG_LEN];
    match head.rfind('-') {
        Some(cut) if cut > 0 => head[..cut].to_string(),
        _ => head.to_string(),
    }
}
