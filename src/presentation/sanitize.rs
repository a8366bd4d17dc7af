//! Final HTML sanitizer for rendered documents.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::OnceLock;

use ammonia::Builder as AmmoniaBuilder;

const ALLOWED_STYLE_PROPERTIES: [&str; 4] = ["text-align", "color", "background-color", "width"];

static SANITIZER: OnceLock<AmmoniaBuilder<'static>> = OnceLock::new();

/// Run rendered block HTML through the shared allow-list.
pub fn clean(html: &str) -> String {
    SANITIZER
        .get_or_init(build_sanitizer)
        .clean(html)
        .to_string()
}

fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "audio",
        "blockquote",
        "br",
        "code",
        "div",
        "em",
        "figcaption",
        "figure",
        "h1",
        "h2",
        "h3",
        "img",
        "input",
        "li",
        "ol",
        "p",
        "pre",
        "s",
        "span",
        "strong",
        "u",
        "ul",
        "video",
    ]);
    builder.tags(tags);

    let generic: HashSet<&'static str> = HashSet::from(["class", "style", "aria-hidden"]);
    builder.generic_attributes(generic);
    builder.add_generic_attribute_prefixes(&["data-"]);

    builder.add_tag_attributes("a", &["download"]);
    builder.add_tag_attributes("img", &["src", "alt", "width", "height", "loading"]);
    builder.add_tag_attributes("video", &["src", "controls", "preload"]);
    builder.add_tag_attributes("audio", &["src", "controls", "preload"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);

    builder.attribute_filter(|_element, attribute, value| {
        if attribute.eq_ignore_ascii_case("style") {
            sanitize_style(value).map(Cow::Owned)
        } else {
            Some(Cow::Borrowed(value))
        }
    });

    builder
}

/// Keep only declarations on the allowed properties with plain values.
fn sanitize_style(value: &str) -> Option<String> {
    let kept: Vec<String> = value
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            let plain = !value.is_empty()
                && value
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '#' | '%' | '.' | '-' | ' '));
            (ALLOWED_STYLE_PROPERTIES.contains(&property.as_str()) && plain)
                .then(|| format!("{property}: {value}"))
        })
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_keeps_only_layout_and_color() {
        assert_eq!(
            sanitize_style("text-align: center; position: fixed; color: red").as_deref(),
            Some("text-align: center; color: red")
        );
        assert_eq!(sanitize_style("background: url(javascript:x)"), None);
        assert_eq!(sanitize_style("width: expression(alert(1))"), None);
    }

    #[test]
    fn scripts_and_handlers_are_removed() {
        let cleaned = clean(r#"<p onclick="x()">hi<script>alert(1)</script></p>"#);
        assert_eq!(cleaned, "<p>hi</p>");
    }

    #[test]
    fn block_data_attributes_survive() {
        let cleaned = clean(r#"<p class="bn-paragraph" data-id="b1">x</p>"#);
        assert!(cleaned.contains(r#"data-id="b1""#));
        assert!(cleaned.contains(r#"class="bn-paragraph""#));
    }
}
