//! Application services: editing session, media picker and post form.

pub mod editor;
pub mod error;
pub mod media_picker;
pub mod post_form;
pub mod repos;

#[cfg(test)]
pub(crate) mod testing;
