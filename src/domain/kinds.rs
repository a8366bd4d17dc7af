//! Schemas of the block kinds shipped with the editor.

use crate::domain::bullet::{BULLET_ICON_PROP, BULLET_TYPE_PROP, BulletStyle, CUSTOM_BULLET_KIND};
use crate::domain::registry::{BlockSchema, ContentModel, PropSpec};

pub const PARAGRAPH: &str = "paragraph";
pub const HEADING: &str = "heading";
pub const QUOTE: &str = "quote";
pub const BULLET_LIST_ITEM: &str = "bulletListItem";
pub const NUMBERED_LIST_ITEM: &str = "numberedListItem";
pub const CHECK_LIST_ITEM: &str = "checkListItem";
pub const CODE_BLOCK: &str = "codeBlock";
pub const IMAGE: &str = "image";
pub const VIDEO: &str = "video";
pub const AUDIO: &str = "audio";
pub const FILE: &str = "file";
pub const MEDIA_IMAGE: &str = "mediaImage";
pub const CUSTOM_BULLET: &str = CUSTOM_BULLET_KIND;

pub const IMAGE_WIDTHS: [&str; 8] = [
    "auto", "25%", "50%", "75%", "100%", "300px", "500px", "800px",
];

fn text_color() -> PropSpec {
    PropSpec::text("textColor", "default")
}

fn background_color() -> PropSpec {
    PropSpec::text("backgroundColor", "default")
}

fn text_alignment() -> PropSpec {
    PropSpec::text("textAlignment", "left").one_of(["left", "center", "right", "justify"])
}

fn text_props() -> Vec<PropSpec> {
    vec![text_color(), background_color(), text_alignment()]
}

pub fn paragraph() -> BlockSchema {
    BlockSchema::new(PARAGRAPH, ContentModel::Inline, text_props())
}

pub fn heading() -> BlockSchema {
    let mut props = text_props();
    props.push(PropSpec::number("level", 1).one_of([1, 2, 3]));
    BlockSchema::new(HEADING, ContentModel::Inline, props)
}

pub fn quote() -> BlockSchema {
    BlockSchema::new(
        QUOTE,
        ContentModel::Inline,
        vec![text_color(), background_color()],
    )
}

pub fn bullet_list_item() -> BlockSchema {
    BlockSchema::new(BULLET_LIST_ITEM, ContentModel::Inline, text_props())
}

pub fn numbered_list_item() -> BlockSchema {
    BlockSchema::new(NUMBERED_LIST_ITEM, ContentModel::Inline, text_props())
}

pub fn check_list_item() -> BlockSchema {
    let mut props = text_props();
    props.push(PropSpec::boolean("checked", false));
    BlockSchema::new(CHECK_LIST_ITEM, ContentModel::Inline, props)
}

pub fn code_block() -> BlockSchema {
    BlockSchema::new(
        CODE_BLOCK,
        ContentModel::Inline,
        vec![PropSpec::text("language", "text")],
    )
}

fn file_props(preview: bool) -> Vec<PropSpec> {
    let mut props = vec![
        background_color(),
        PropSpec::text("name", ""),
        PropSpec::url("url"),
        PropSpec::text("caption", ""),
    ];
    if preview {
        props.push(PropSpec::boolean("showPreview", true));
    }
    props
}

pub fn image() -> BlockSchema {
    let mut props = vec![text_alignment()];
    props.extend(file_props(true));
    props.push(PropSpec::number("previewWidth", 512));
    BlockSchema::new(IMAGE, ContentModel::None, props)
}

pub fn video() -> BlockSchema {
    let mut props = vec![text_alignment()];
    props.extend(file_props(true));
    props.push(PropSpec::number("previewWidth", 512));
    BlockSchema::new(VIDEO, ContentModel::None, props)
}

pub fn audio() -> BlockSchema {
    BlockSchema::new(AUDIO, ContentModel::None, file_props(true))
}

pub fn file() -> BlockSchema {
    BlockSchema::new(FILE, ContentModel::None, file_props(false))
}

/// Library-backed image: `src`, `alt`, `width`, `caption`.
pub fn media_image() -> BlockSchema {
    BlockSchema::new(
        MEDIA_IMAGE,
        ContentModel::None,
        vec![
            PropSpec::url("src"),
            PropSpec::text("alt", "Image"),
            PropSpec::text("width", "auto").one_of(IMAGE_WIDTHS),
            PropSpec::text("caption", ""),
        ],
    )
}

pub fn custom_bullet() -> BlockSchema {
    BlockSchema::new(
        CUSTOM_BULLET,
        ContentModel::Inline,
        vec![
            text_alignment(),
            text_color(),
            PropSpec::text(BULLET_TYPE_PROP, BulletStyle::Circle.as_str())
                .one_of(BulletStyle::ALL.map(BulletStyle::as_str)),
            PropSpec::url(BULLET_ICON_PROP),
        ],
    )
}

/// Every built-in schema, in the order kinds are offered to authors.
pub fn builtin() -> Vec<BlockSchema> {
    vec![
        paragraph(),
        heading(),
        quote(),
        bullet_list_item(),
        numbered_list_item(),
        check_list_item(),
        code_block(),
        image(),
        video(),
        audio(),
        file(),
        media_image(),
        custom_bullet(),
    ]
}
