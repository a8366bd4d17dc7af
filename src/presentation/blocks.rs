//! HTML renderers for the built-in block kinds.
//!
//! Each kind is drawn by one askama template under `templates/blocks/`.
//! Inline content is escaped span by span before it reaches a template, and
//! the assembled document passes through [`sanitize::clean`] once at the end.

use std::sync::Arc;

use askama::Template;
use serde_json::Value;

use crate::domain::blocks::Block;
use crate::domain::bullet::CustomBullet;
use crate::domain::document::{Document, DocumentSnapshot};
use crate::domain::error::DocumentError;
use crate::domain::kinds;
use crate::domain::registry::{BlockRegistry, BlockRenderer, RenderError, is_public_url};
use crate::presentation::sanitize;

#[derive(Template)]
#[template(path = "blocks/text.html")]
struct TextTemplate<'a> {
    tag: &'a str,
    kind: &'a str,
    id: &'a str,
    style: String,
    inner_html: &'a str,
}

#[derive(Template)]
#[template(path = "blocks/check_item.html")]
struct CheckItemTemplate<'a> {
    id: &'a str,
    style: String,
    checked: bool,
    inner_html: &'a str,
}

#[derive(Template)]
#[template(path = "blocks/code_block.html")]
struct CodeBlockTemplate<'a> {
    id: &'a str,
    language: &'a str,
    inner_html: &'a str,
}

#[derive(Template)]
#[template(path = "blocks/custom_bullet.html")]
struct CustomBulletTemplate<'a> {
    id: &'a str,
    style: &'a str,
    alignment: &'a str,
    icon: Option<&'a str>,
    glyph: &'a str,
    color: &'a str,
    inner_html: &'a str,
}

#[derive(Template)]
#[template(path = "blocks/image.html")]
struct ImageTemplate<'a> {
    kind: &'a str,
    id: &'a str,
    alignment: &'a str,
    src: &'a str,
    alt: &'a str,
    width: Option<String>,
    caption: &'a str,
}

#[derive(Template)]
#[template(path = "blocks/player.html")]
struct PlayerTemplate<'a> {
    kind: &'a str,
    element: &'a str,
    id: &'a str,
    src: &'a str,
    width: Option<String>,
    caption: &'a str,
}

#[derive(Template)]
#[template(path = "blocks/file.html")]
struct FileTemplate<'a> {
    id: &'a str,
    src: &'a str,
    name: &'a str,
    caption: &'a str,
}

fn render_template<T: Template>(kind: &str, template: T) -> Result<String, RenderError> {
    template.render().map_err(|err| RenderError::Template {
        kind: kind.to_string(),
        message: err.to_string(),
    })
}

/// Paragraphs, headings, quotes and plain list items.
#[derive(Debug, Clone, Copy)]
pub struct TextRenderer {
    tag: &'static str,
}

impl BlockRenderer for TextRenderer {
    fn render(&self, block: &Block, inner_html: &str) -> Result<String, RenderError> {
        let tag = if block.is_kind(kinds::HEADING) {
            heading_tag(block)
        } else {
            self.tag
        };
        render_template(
            &block.kind,
            TextTemplate {
                tag,
                kind: &block.kind,
                id: block.id.as_str(),
                style: text_style(block),
                inner_html,
            },
        )
    }
}

fn heading_tag(block: &Block) -> &'static str {
    match block.prop("level").and_then(Value::as_i64) {
        Some(2) => "h2",
        Some(3) => "h3",
        _ => "h1",
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CheckItemRenderer;

impl BlockRenderer for CheckItemRenderer {
    fn render(&self, block: &Block, inner_html: &str) -> Result<String, RenderError> {
        render_template(
            &block.kind,
            CheckItemTemplate {
                id: block.id.as_str(),
                style: text_style(block),
                checked: block
                    .prop("checked")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                inner_html,
            },
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CodeBlockRenderer;

impl BlockRenderer for CodeBlockRenderer {
    fn render(&self, block: &Block, inner_html: &str) -> Result<String, RenderError> {
        let language = block.prop_str("language");
        let language = if !language.is_empty()
            && language
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '+'))
        {
            language
        } else {
            "text"
        };
        render_template(
            &block.kind,
            CodeBlockTemplate {
                id: block.id.as_str(),
                language,
                inner_html,
            },
        )
    }
}

/// Glyph in the style's color, or the icon image for `custom` bullets.
#[derive(Debug, Clone, Copy)]
pub struct CustomBulletRenderer;

impl BlockRenderer for CustomBulletRenderer {
    fn render(&self, block: &Block, inner_html: &str) -> Result<String, RenderError> {
        let bullet = CustomBullet::from_block(block).ok_or_else(|| RenderError::Template {
            kind: block.kind.clone(),
            message: "not a custom bullet block".to_string(),
        })?;
        let icon = (bullet.shows_icon() && is_public_url(&bullet.icon_url))
            .then_some(bullet.icon_url.as_str());
        render_template(
            &block.kind,
            CustomBulletTemplate {
                id: block.id.as_str(),
                style: bullet.style.as_str(),
                alignment: alignment(block),
                icon,
                glyph: bullet.style.glyph(),
                color: bullet.style.color(),
                inner_html,
            },
        )
    }
}

/// `image`, `video`, `audio` and `file` blocks addressed by `url`.
#[derive(Debug, Clone, Copy)]
pub struct FileRenderer;

impl BlockRenderer for FileRenderer {
    fn render(&self, block: &Block, _inner_html: &str) -> Result<String, RenderError> {
        let src = block.prop_str("url");
        if !is_public_url(src) {
            return Ok(String::new());
        }
        let kind = block.kind.as_str();
        let id = block.id.as_str();
        let caption = block.prop_str("caption");
        let width = preview_width(block);
        let show_preview = block
            .prop("showPreview")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        match kind {
            kinds::IMAGE if show_preview => render_template(
                kind,
                ImageTemplate {
                    kind,
                    id,
                    alignment: alignment(block),
                    src,
                    alt: block.prop_str("name"),
                    width,
                    caption,
                },
            ),
            kinds::VIDEO | kinds::AUDIO if show_preview => render_template(
                kind,
                PlayerTemplate {
                    kind,
                    element: if kind == kinds::VIDEO { "video" } else { "audio" },
                    id,
                    src,
                    width,
                    caption,
                },
            ),
            _ => render_template(
                kind,
                FileTemplate {
                    id,
                    src,
                    name: file_label(block, src),
                    caption,
                },
            ),
        }
    }
}

fn preview_width(block: &Block) -> Option<String> {
    block
        .prop("previewWidth")
        .and_then(Value::as_i64)
        .filter(|width| *width > 0)
        .map(|width| format!("{width}px"))
}

fn file_label<'a>(block: &'a Block, src: &'a str) -> &'a str {
    match block.prop_str("name") {
        "" => src
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(src),
        name => name,
    }
}

/// Library-backed image with `src`, `alt`, `width` and `caption`.
#[derive(Debug, Clone, Copy)]
pub struct MediaImageRenderer;

impl BlockRenderer for MediaImageRenderer {
    fn render(&self, block: &Block, _inner_html: &str) -> Result<String, RenderError> {
        let src = block.prop_str("src");
        if !is_public_url(src) {
            return Ok(String::new());
        }
        let width = match block.prop_str("width") {
            "" | "auto" => None,
            width if kinds::IMAGE_WIDTHS.contains(&width) => Some(width.to_string()),
            _ => None,
        };
        render_template(
            &block.kind,
            ImageTemplate {
                kind: &block.kind,
                id: block.id.as_str(),
                alignment: "",
                src,
                alt: block.prop_str("alt"),
                width,
                caption: block.prop_str("caption"),
            },
        )
    }
}

fn alignment(block: &Block) -> &str {
    match block.prop_str("textAlignment") {
        align @ ("center" | "right" | "justify") => align,
        _ => "",
    }
}

fn text_style(block: &Block) -> String {
    let mut rules = Vec::new();
    let align = alignment(block);
    if !align.is_empty() {
        rules.push(format!("text-align: {align}"));
    }
    if let Some(color) = css_color(block.prop_str("textColor")) {
        rules.push(format!("color: {color}"));
    }
    if let Some(color) = css_color(block.prop_str("backgroundColor")) {
        rules.push(format!("background-color: {color}"));
    }
    rules.join("; ")
}

fn css_color(value: &str) -> Option<&str> {
    let usable = !value.is_empty()
        && value != "default"
        && value.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '#');
    usable.then_some(value)
}

/// Escape and style inline content: a plain string or an array of
/// `text` / `link` spans.
pub fn render_inline(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(text)) => ammonia::clean_text(text),
        Some(Value::Array(spans)) => spans.iter().map(render_span).collect(),
        _ => String::new(),
    }
}

fn render_span(span: &Value) -> String {
    match span.get("type").and_then(Value::as_str) {
        Some("link") => {
            let inner = render_inline(span.get("content"));
            let href = span.get("href").and_then(Value::as_str).unwrap_or("");
            if is_public_url(href) {
                format!("<a href=\"{}\">{inner}</a>", ammonia::clean_text(href))
            } else {
                inner
            }
        }
        _ => {
            let text = span.get("text").and_then(Value::as_str).unwrap_or("");
            apply_styles(ammonia::clean_text(text), span.get("styles"))
        }
    }
}

fn apply_styles(mut html: String, styles: Option<&Value>) -> String {
    let Some(styles) = styles.and_then(Value::as_object) else {
        return html;
    };
    for (style, tag) in [
        ("code", "code"),
        ("strike", "s"),
        ("underline", "u"),
        ("italic", "em"),
        ("bold", "strong"),
    ] {
        if styles.get(style).and_then(Value::as_bool).unwrap_or(false) {
            html = format!("<{tag}>{html}</{tag}>");
        }
    }
    html
}

/// Registry holding every built-in kind with its renderer.
pub fn standard_registry() -> Arc<BlockRegistry> {
    let mut registry = BlockRegistry::new();
    for schema in kinds::builtin() {
        let renderer: Arc<dyn BlockRenderer> = match schema.kind.as_str() {
            kinds::PARAGRAPH => Arc::new(TextRenderer { tag: "p" }),
            kinds::HEADING => Arc::new(TextRenderer { tag: "h1" }),
            kinds::QUOTE => Arc::new(TextRenderer { tag: "blockquote" }),
            kinds::BULLET_LIST_ITEM | kinds::NUMBERED_LIST_ITEM => {
                Arc::new(TextRenderer { tag: "li" })
            }
            kinds::CHECK_LIST_ITEM => Arc::new(CheckItemRenderer),
            kinds::CODE_BLOCK => Arc::new(CodeBlockRenderer),
            kinds::CUSTOM_BULLET => Arc::new(CustomBulletRenderer),
            kinds::MEDIA_IMAGE => Arc::new(MediaImageRenderer),
            _ => Arc::new(FileRenderer),
        };
        registry.register(schema, renderer);
    }
    Arc::new(registry)
}

/// List wrapper for consecutive items of the same list kind.
fn list_wrapper(kind: &str) -> Option<(&'static str, &'static str)> {
    match kind {
        kinds::BULLET_LIST_ITEM => Some(("ul", "bn-list")),
        kinds::NUMBERED_LIST_ITEM => Some(("ol", "bn-list")),
        kinds::CHECK_LIST_ITEM => Some(("ul", "bn-check-list")),
        _ => None,
    }
}

/// Render blocks in order using each kind's registered renderer.
pub fn render_blocks(registry: &BlockRegistry, blocks: &[Block]) -> Result<String, RenderError> {
    let mut html = String::new();
    let mut open_list: Option<(&str, &'static str)> = None;

    for block in blocks {
        let continues = open_list.is_some_and(|(kind, _)| kind == block.kind);
        if !continues {
            if let Some((_, tag)) = open_list.take() {
                html.push_str(&format!("</{tag}>"));
            }
            if let Some((tag, class)) = list_wrapper(&block.kind) {
                html.push_str(&format!("<{tag} class=\"{class}\">"));
                open_list = Some((block.kind.as_str(), tag));
            }
        }
        html.push_str(&render_block(registry, block)?);
    }
    if let Some((_, tag)) = open_list {
        html.push_str(&format!("</{tag}>"));
    }
    Ok(html)
}

fn render_block(registry: &BlockRegistry, block: &Block) -> Result<String, RenderError> {
    let entry = registry
        .get(&block.kind)
        .ok_or_else(|| DocumentError::UnknownKind(block.kind.clone()))?;
    let inner_html = render_inline(block.content.as_ref());
    let mut html = entry.renderer.render(block, &inner_html)?;

    let children = block.children()?;
    if !children.is_empty() {
        html.push_str("<div class=\"bn-block-children\">");
        html.push_str(&render_blocks(registry, &children)?);
        html.push_str("</div>");
    }
    Ok(html)
}

/// Sanitized HTML for a snapshot.
pub fn render_snapshot(
    registry: &BlockRegistry,
    snapshot: &DocumentSnapshot,
) -> Result<String, RenderError> {
    let html = render_blocks(registry, snapshot.blocks())?;
    Ok(sanitize::clean(&html))
}

pub fn render_document(document: &Document) -> Result<String, RenderError> {
    render_snapshot(document.registry(), &document.snapshot())
}
