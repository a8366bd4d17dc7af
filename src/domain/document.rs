//! Ordered block document and its editing operations.
//!
//! Order in `blocks` is the only source of render order. Mutations replace a
//! whole block in place or insert relative to an existing block; a failed
//! mutation leaves the document untouched.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::domain::blocks::{Block, BlockId, NewBlock, Placement, PropMap};
use crate::domain::error::DocumentError;
use crate::domain::kinds;
use crate::domain::registry::BlockRegistry;

/// Immutable copy of the full block sequence at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    blocks: Arc<[Block]>,
}

impl DocumentSnapshot {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn to_json(&self) -> Result<Value, DocumentError> {
        serde_json::to_value(self.blocks()).map_err(|err| DocumentError::Malformed(err.to_string()))
    }

    /// Serialized block array as stored in the post's `content` field.
    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        serde_json::to_string(self.blocks()).map_err(|err| DocumentError::Malformed(err.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    registry: Arc<BlockRegistry>,
    blocks: Vec<Block>,
    issued: HashSet<BlockId>,
}

impl Document {
    /// New document holding one default paragraph.
    pub fn new(registry: Arc<BlockRegistry>) -> Result<Self, DocumentError> {
        let mut document = Self {
            registry,
            blocks: Vec::new(),
            issued: HashSet::new(),
        };
        let paragraph = document.materialize(NewBlock::new(kinds::PARAGRAPH))?;
        document.blocks.push(paragraph);
        Ok(document)
    }

    /// Hydrate from a previously saved block array.
    ///
    /// Blocks are kept verbatim so that saving without edits reproduces the
    /// same JSON. Unknown kinds and duplicate ids are rejected at every
    /// nesting level; ids must be unique across the whole tree.
    pub fn from_json(registry: Arc<BlockRegistry>, value: Value) -> Result<Self, DocumentError> {
        let blocks: Vec<Block> =
            serde_json::from_value(value).map_err(|err| DocumentError::Malformed(err.to_string()))?;
        if blocks.is_empty() {
            return Self::new(registry);
        }

        let mut issued = HashSet::with_capacity(blocks.len());
        check_tree(&registry, &blocks, &mut issued)?;

        Ok(Self {
            registry,
            blocks,
            issued,
        })
    }

    pub fn from_json_str(registry: Arc<BlockRegistry>, raw: &str) -> Result<Self, DocumentError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|err| DocumentError::Malformed(err.to_string()))?;
        Self::from_json(registry, value)
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|block| &block.id == id)
    }

    pub fn position(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| &block.id == id)
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            blocks: Arc::from(self.blocks.as_slice()),
        }
    }

    /// Insert `new_block` next to `anchor` and return its freshly issued id.
    pub fn insert_block(
        &mut self,
        new_block: NewBlock,
        anchor: &BlockId,
        placement: Placement,
    ) -> Result<BlockId, DocumentError> {
        let anchor_index = self
            .position(anchor)
            .ok_or_else(|| DocumentError::InvalidAnchor(anchor.clone()))?;
        let block = self.materialize(new_block)?;
        let id = block.id.clone();

        let index = match placement {
            Placement::Before => anchor_index,
            Placement::After => anchor_index + 1,
        };
        self.blocks.insert(index, block);
        Ok(id)
    }

    /// Merge `partial` into the props of block `id`.
    pub fn update_block(&mut self, id: &BlockId, partial: PropMap) -> Result<(), DocumentError> {
        let index = self
            .position(id)
            .ok_or_else(|| DocumentError::UnknownBlock(id.clone()))?;
        let schema = self.registry.schema(&self.blocks[index].kind)?;
        schema.validate_partial(&partial)?;

        let mut updated = self.blocks[index].clone();
        for (key, value) in partial {
            updated.props.insert(key, value);
        }
        self.blocks[index] = updated;
        Ok(())
    }

    /// Replace the inline content of block `id`.
    pub fn update_content(&mut self, id: &BlockId, content: Value) -> Result<(), DocumentError> {
        let index = self
            .position(id)
            .ok_or_else(|| DocumentError::UnknownBlock(id.clone()))?;
        let schema = self.registry.schema(&self.blocks[index].kind)?;
        if !schema.accepts_inline_content() {
            return Err(DocumentError::kind_mismatch(
                &schema.kind,
                vec!["content".to_string()],
            ));
        }
        if !matches!(content, Value::Array(_) | Value::String(_)) {
            return Err(DocumentError::Malformed(
                "inline content must be an array of spans or a string".to_string(),
            ));
        }

        let mut updated = self.blocks[index].clone();
        updated.content = Some(content);
        self.blocks[index] = updated;
        Ok(())
    }

    /// Remove block `id`. Removing the last block leaves a default paragraph.
    pub fn remove_block(&mut self, id: &BlockId) -> Result<Block, DocumentError> {
        let index = self
            .position(id)
            .ok_or_else(|| DocumentError::UnknownBlock(id.clone()))?;

        if self.blocks.len() == 1 {
            let replacement = self.materialize(NewBlock::new(kinds::PARAGRAPH))?;
            return Ok(std::mem::replace(&mut self.blocks[index], replacement));
        }
        Ok(self.blocks.remove(index))
    }

    /// Give a new block its id, defaults and (for inline kinds) empty content.
    fn materialize(&mut self, new_block: NewBlock) -> Result<Block, DocumentError> {
        let schema = self.registry.schema(&new_block.kind)?;
        schema.validate_partial(&new_block.props)?;

        let mut props = schema.default_props();
        for (key, value) in new_block.props {
            props.insert(key, value);
        }

        let content = if schema.accepts_inline_content() {
            Some(new_block.content.unwrap_or_else(|| Value::Array(Vec::new())))
        } else if new_block.content.is_some() {
            return Err(DocumentError::kind_mismatch(
                &schema.kind,
                vec!["content".to_string()],
            ));
        } else {
            None
        };

        let mut extra = PropMap::new();
        extra.insert("children".to_string(), Value::Array(Vec::new()));

        Ok(Block {
            id: self.issue_id(),
            kind: new_block.kind,
            props,
            content,
            extra,
        })
    }

    fn issue_id(&mut self) -> BlockId {
        loop {
            let id = BlockId::generate();
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }
}

/// Walk `blocks` and their nested children, recording every id.
fn check_tree(
    registry: &BlockRegistry,
    blocks: &[Block],
    issued: &mut HashSet<BlockId>,
) -> Result<(), DocumentError> {
    for block in blocks {
        if !registry.contains(&block.kind) {
            return Err(DocumentError::UnknownKind(block.kind.clone()));
        }
        if !issued.insert(block.id.clone()) {
            return Err(DocumentError::DuplicateBlockId(block.id.clone()));
        }
        check_tree(registry, &block.children()?, issued)?;
    }
    Ok(())
}
