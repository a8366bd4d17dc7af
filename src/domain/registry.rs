//! Tagged-variant registry of block kinds.
//!
//! The document model stores only a kind tag plus an opaque property bag; all
//! interpretation (schema validation, defaults, rendering) goes through the
//! registry entry for that tag. New kinds are registered at runtime.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::domain::blocks::{Block, PropMap};
use crate::domain::error::DocumentError;

/// Whether a block kind carries inline rich-text content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentModel {
    Inline,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropType {
    Text,
    Boolean,
    Number,
    /// Empty string or an absolute `http`/`https` URL.
    Url,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropSpec {
    pub name: &'static str,
    pub prop_type: PropType,
    pub default: Value,
    pub allowed: Option<Vec<Value>>,
}

impl PropSpec {
    pub fn text(name: &'static str, default: &str) -> Self {
        Self {
            name,
            prop_type: PropType::Text,
            default: Value::from(default),
            allowed: None,
        }
    }

    pub fn url(name: &'static str) -> Self {
        Self {
            name,
            prop_type: PropType::Url,
            default: Value::from(""),
            allowed: None,
        }
    }

    pub fn boolean(name: &'static str, default: bool) -> Self {
        Self {
            name,
            prop_type: PropType::Boolean,
            default: Value::from(default),
            allowed: None,
        }
    }

    pub fn number(name: &'static str, default: i64) -> Self {
        Self {
            name,
            prop_type: PropType::Number,
            default: Value::from(default),
            allowed: None,
        }
    }

    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    fn check(&self, kind: &str, value: &Value) -> Result<(), DocumentError> {
        let type_ok = match self.prop_type {
            PropType::Text | PropType::Url => value.is_string(),
            PropType::Boolean => value.is_boolean(),
            PropType::Number => value.is_number(),
        };
        if !type_ok {
            return Err(DocumentError::invalid_value(
                kind,
                self.name,
                format!("expected {:?}, got `{value}`", self.prop_type),
            ));
        }

        if self.prop_type == PropType::Url {
            let raw = value.as_str().unwrap_or_default();
            if !raw.is_empty() && !is_public_url(raw) {
                return Err(DocumentError::invalid_value(
                    kind,
                    self.name,
                    format!("`{raw}` is not an absolute http(s) URL"),
                ));
            }
        }

        match &self.allowed {
            Some(allowed) if !allowed.contains(value) => Err(DocumentError::invalid_value(
                kind,
                self.name,
                format!("`{value}` is not one of the allowed values"),
            )),
            _ => Ok(()),
        }
    }
}

/// Whether `raw` is an absolute URL a browser can fetch without credentials.
pub fn is_public_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

/// Property schema of one block kind.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSchema {
    pub kind: String,
    pub content: ContentModel,
    pub props: Vec<PropSpec>,
}

impl BlockSchema {
    pub fn new(kind: impl Into<String>, content: ContentModel, props: Vec<PropSpec>) -> Self {
        Self {
            kind: kind.into(),
            content,
            props,
        }
    }

    pub fn prop(&self, name: &str) -> Option<&PropSpec> {
        self.props.iter().find(|spec| spec.name == name)
    }

    /// Default-property factory for freshly created blocks.
    pub fn default_props(&self) -> PropMap {
        self.props
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default.clone()))
            .collect()
    }

    /// Check that every key of `partial` belongs to this schema and holds a
    /// valid value. Unknown keys are reported together.
    pub fn validate_partial(&self, partial: &PropMap) -> Result<(), DocumentError> {
        let unknown: Vec<String> = partial
            .keys()
            .filter(|key| self.prop(key).is_none())
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(DocumentError::kind_mismatch(&self.kind, unknown));
        }

        for (key, value) in partial {
            if let Some(spec) = self.prop(key) {
                spec.check(&self.kind, value)?;
            }
        }
        Ok(())
    }

    pub fn accepts_inline_content(&self) -> bool {
        self.content == ContentModel::Inline
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template rendering failed for `{kind}`: {message}")]
    Template { kind: String, message: String },
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Turns one block into HTML. `inner_html` is the already rendered inline
/// content of the block (empty for kinds without content).
pub trait BlockRenderer: Send + Sync {
    fn render(&self, block: &Block, inner_html: &str) -> Result<String, RenderError>;
}

#[derive(Clone)]
pub struct RegisteredKind {
    pub schema: BlockSchema,
    pub renderer: Arc<dyn BlockRenderer>,
}

impl fmt::Debug for RegisteredKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredKind")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Mapping from kind tag to schema, renderer and default factory.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    kinds: HashMap<String, RegisteredKind>,
    order: Vec<String>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind, replacing any previous registration for the same tag.
    pub fn register(&mut self, schema: BlockSchema, renderer: Arc<dyn BlockRenderer>) -> &mut Self {
        let kind = schema.kind.clone();
        if !self.kinds.contains_key(&kind) {
            self.order.push(kind.clone());
        }
        self.kinds.insert(kind, RegisteredKind { schema, renderer });
        self
    }

    pub fn get(&self, kind: &str) -> Option<&RegisteredKind> {
        self.kinds.get(kind)
    }

    pub fn schema(&self, kind: &str) -> Result<&BlockSchema, DocumentError> {
        self.kinds
            .get(kind)
            .map(|entry| &entry.schema)
            .ok_or_else(|| DocumentError::UnknownKind(kind.to_string()))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Registered kind tags in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
