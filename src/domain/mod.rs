//! Domain layer types and invariants.

pub mod blocks;
pub mod bullet;
pub mod commands;
pub mod document;
pub mod error;
pub mod kinds;
pub mod media;
pub mod posts;
pub mod registry;
pub mod slug;
pub mod types;
