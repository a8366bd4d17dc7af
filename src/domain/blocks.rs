//! Block values stored in a document.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::error::DocumentError;

/// Kind-specific property bag, kept in insertion order so saved documents
/// serialize back with the same key order.
pub type PropMap = Map<String, Value>;

/// Stable identifier of a block within one editing session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single block: kind tag, kind-specific props and optional inline content.
///
/// Keys other than `id`, `type`, `props` and `content` (for example nested
/// `children`) are carried in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub props: PropMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(flatten)]
    pub extra: PropMap,
}

impl Block {
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// String property, or the empty string when absent or not a string.
    pub fn prop_str(&self, key: &str) -> &str {
        self.props.get(key).and_then(Value::as_str).unwrap_or("")
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Nested child blocks, when the persisted form carries any. A
    /// `children` value that is not a block array is malformed.
    pub fn children(&self) -> Result<Vec<Block>, DocumentError> {
        match self.extra.get("children") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|err| {
                DocumentError::Malformed(format!("children of block `{}`: {err}", self.id))
            }),
        }
    }
}

/// Where a new block lands relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Before,
    After,
}

/// A block that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBlock {
    pub kind: String,
    pub props: PropMap,
    pub content: Option<Value>,
}

impl NewBlock {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            props: PropMap::new(),
            content: None,
        }
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    pub fn with_props(mut self, props: PropMap) -> Self {
        self.props.extend(props);
        self
    }

    pub fn with_content(mut self, content: Value) -> Self {
        self.content = Some(content);
        self
    }

    /// Inline content holding one plain text span.
    pub fn with_text(self, text: &str) -> Self {
        self.with_content(text_content(text))
    }
}

/// Build inline content consisting of a single unstyled text span.
pub fn text_content(text: &str) -> Value {
    serde_json::json!([{ "type": "text", "text": text, "styles": {} }])
}
