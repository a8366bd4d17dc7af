//! HTML output for documents.

pub mod blocks;
pub mod sanitize;
