//! Custom bullet block: styles and the property changes its menu produces.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::blocks::{Block, NewBlock, PropMap};
use crate::domain::error::DocumentError;

pub const CUSTOM_BULLET_KIND: &str = "customBullet";
pub const BULLET_TYPE_PROP: &str = "bulletType";
pub const BULLET_ICON_PROP: &str = "bulletIcon";

const FALLBACK_COLOR: &str = "#333333";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulletStyle {
    Circle,
    Square,
    Star,
    Arrow,
    Checkbox,
    Radio,
    Diamond,
    Custom,
}

impl BulletStyle {
    pub const ALL: [BulletStyle; 8] = [
        BulletStyle::Circle,
        BulletStyle::Square,
        BulletStyle::Star,
        BulletStyle::Arrow,
        BulletStyle::Checkbox,
        BulletStyle::Radio,
        BulletStyle::Diamond,
        BulletStyle::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BulletStyle::Circle => "circle",
            BulletStyle::Square => "square",
            BulletStyle::Star => "star",
            BulletStyle::Arrow => "arrow",
            BulletStyle::Checkbox => "checkbox",
            BulletStyle::Radio => "radio",
            BulletStyle::Diamond => "diamond",
            BulletStyle::Custom => "custom",
        }
    }

    /// Menu label.
    pub fn title(self) -> &'static str {
        match self {
            BulletStyle::Circle => "Circle",
            BulletStyle::Square => "Square",
            BulletStyle::Star => "Star",
            BulletStyle::Arrow => "Arrow",
            BulletStyle::Checkbox => "Checkbox",
            BulletStyle::Radio => "Radio",
            BulletStyle::Diamond => "Diamond",
            BulletStyle::Custom => "Custom",
        }
    }

    /// Glyph drawn for the style. `Custom` draws an icon image instead and
    /// only falls back to the circle glyph when no icon is set.
    pub fn glyph(self) -> &'static str {
        match self {
            BulletStyle::Circle | BulletStyle::Custom => "\u{25CF}",
            BulletStyle::Square => "\u{25A0}",
            BulletStyle::Star => "\u{2605}",
            BulletStyle::Arrow => "\u{27A4}",
            BulletStyle::Checkbox => "\u{2611}",
            BulletStyle::Radio => "\u{25CB}",
            BulletStyle::Diamond => "\u{25C6}",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            BulletStyle::Circle => "#333333",
            BulletStyle::Square => "#666666",
            BulletStyle::Star => "#ff6b35",
            BulletStyle::Arrow => "#007bff",
            BulletStyle::Checkbox => "#28a745",
            BulletStyle::Radio => "#6f42c1",
            BulletStyle::Diamond => "#e83e8c",
            BulletStyle::Custom => FALLBACK_COLOR,
        }
    }

    /// Styles offered in the block's style menu, in menu order.
    pub fn menu() -> impl Iterator<Item = BulletStyle> {
        Self::ALL
            .into_iter()
            .filter(|style| *style != BulletStyle::Custom)
    }
}

impl fmt::Display for BulletStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulletStyle {
    type Err = DocumentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == value)
            .ok_or_else(|| {
                DocumentError::invalid_value(
                    CUSTOM_BULLET_KIND,
                    BULLET_TYPE_PROP,
                    format!("unknown bullet style `{value}`"),
                )
            })
    }
}

/// Read-only view over a custom bullet block's props.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomBullet {
    pub style: BulletStyle,
    pub icon_url: String,
}

impl CustomBullet {
    pub fn from_block(block: &Block) -> Option<Self> {
        if !block.is_kind(CUSTOM_BULLET_KIND) {
            return None;
        }
        let style = block
            .prop_str(BULLET_TYPE_PROP)
            .parse()
            .unwrap_or(BulletStyle::Circle);
        Some(Self {
            style,
            icon_url: block.prop_str(BULLET_ICON_PROP).to_string(),
        })
    }

    /// Whether the icon image replaces the glyph.
    pub fn shows_icon(&self) -> bool {
        self.style == BulletStyle::Custom && !self.icon_url.is_empty()
    }
}

/// Props produced by picking `style` from the style menu. Any non-custom
/// style clears the icon; `custom` keeps the current one.
pub fn style_change(style: BulletStyle, current_icon: &str) -> PropMap {
    let icon = if style == BulletStyle::Custom {
        current_icon
    } else {
        ""
    };
    bullet_props(style, icon)
}

/// Props produced by picking an icon through the media library.
pub fn media_icon_change(url: &str) -> PropMap {
    bullet_props(BulletStyle::Custom, url)
}

/// Sibling block inserted when the user continues the list from `current`.
pub fn continuation(current: &CustomBullet) -> NewBlock {
    NewBlock::new(CUSTOM_BULLET_KIND).with_props(bullet_props(current.style, &current.icon_url))
}

fn bullet_props(style: BulletStyle, icon: &str) -> PropMap {
    let mut props = PropMap::new();
    props.insert(BULLET_TYPE_PROP.to_string(), Value::from(style.as_str()));
    props.insert(BULLET_ICON_PROP.to_string(), Value::from(icon));
    props
}
