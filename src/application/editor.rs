//! Editing session over one block document.
//!
//! The session is the single writer of its document. Every successful
//! mutation publishes a fresh snapshot on a watch channel and to registered
//! listeners before the call returns; failed mutations publish nothing.
//! Commands that need a media asset hand back a [`MediaRequest`] instead of
//! opening anything themselves, and the caller completes it with the URL the
//! picker returned.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::domain::blocks::{Block, BlockId, NewBlock, Placement, PropMap};
use crate::domain::bullet::{self, BulletStyle, CustomBullet};
use crate::domain::commands::{CommandAction, CommandMenu, SlashCommand};
use crate::domain::document::{Document, DocumentSnapshot};
use crate::domain::error::DocumentError;
use crate::domain::kinds;
use crate::domain::media::MimeAllowList;
use crate::domain::registry::{BlockRegistry, is_public_url};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("block `{0}` is not a custom bullet")]
    NotABullet(BlockId),
    #[error("block `{0}` is not a media image")]
    NotAMediaImage(BlockId),
    #[error("no media request is pending")]
    NoPendingMedia,
    #[error("media request {0} is no longer pending")]
    StaleMediaRequest(u64),
    #[error("`{0}` is not an absolute http(s) URL")]
    NonPublicUrl(String),
}

/// What the editor does with the URL once the picker returns one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaTarget {
    /// Insert an `image` block after the given block.
    InsertImageAfter(BlockId),
    /// Force the custom bullet style and set its icon.
    BulletIcon(BlockId),
    /// Set the `src` of a library-backed image block.
    MediaImageSource(BlockId),
}

/// A pending request for the caller to open the media picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub id: u64,
    pub target: MediaTarget,
    pub allowed: MimeAllowList,
    pub title: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Inserted(BlockId),
    MediaRequested(MediaRequest),
}

pub type ChangeListener = Box<dyn Fn(&DocumentSnapshot) + Send + Sync>;

pub struct EditorSession {
    document: Document,
    commands: CommandMenu,
    changes: watch::Sender<DocumentSnapshot>,
    listeners: Vec<ChangeListener>,
    pending_media: Option<MediaRequest>,
    next_request: u64,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("blocks", &self.document.len())
            .field("listeners", &self.listeners.len())
            .field("pending_media", &self.pending_media)
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    /// Session over a fresh document holding one empty paragraph.
    pub fn new(registry: Arc<BlockRegistry>, commands: CommandMenu) -> Result<Self, EditorError> {
        Ok(Self::with_document(Document::new(registry)?, commands))
    }

    /// Session over a previously saved block array.
    pub fn hydrate(
        registry: Arc<BlockRegistry>,
        commands: CommandMenu,
        saved: Value,
    ) -> Result<Self, EditorError> {
        Ok(Self::with_document(
            Document::from_json(registry, saved)?,
            commands,
        ))
    }

    pub fn with_document(document: Document, commands: CommandMenu) -> Self {
        let (changes, _) = watch::channel(document.snapshot());
        Self {
            document,
            commands,
            changes,
            listeners: Vec::new(),
            pending_media: None,
            next_request: 1,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.document.snapshot()
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.document.get(id)
    }

    /// Receiver that always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<DocumentSnapshot> {
        self.changes.subscribe()
    }

    /// Register a callback invoked synchronously after every mutation.
    pub fn on_change(&mut self, listener: impl Fn(&DocumentSnapshot) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn commands(&self) -> &CommandMenu {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut CommandMenu {
        &mut self.commands
    }

    pub fn pending_media(&self) -> Option<&MediaRequest> {
        self.pending_media.as_ref()
    }

    pub fn insert_block(
        &mut self,
        block: NewBlock,
        anchor: &BlockId,
        placement: Placement,
    ) -> Result<BlockId, EditorError> {
        let kind = block.kind.clone();
        let id = self.document.insert_block(block, anchor, placement)?;
        debug!(block = %id, kind = %kind, anchor = %anchor, "block inserted");
        self.publish();
        Ok(id)
    }

    pub fn update_block(&mut self, id: &BlockId, partial: PropMap) -> Result<(), EditorError> {
        self.document.update_block(id, partial)?;
        debug!(block = %id, "block props updated");
        self.publish();
        Ok(())
    }

    pub fn update_content(&mut self, id: &BlockId, content: Value) -> Result<(), EditorError> {
        self.document.update_content(id, content)?;
        self.publish();
        Ok(())
    }

    pub fn remove_block(&mut self, id: &BlockId) -> Result<Block, EditorError> {
        let removed = self.document.remove_block(id)?;
        debug!(block = %id, kind = %removed.kind, "block removed");
        if self
            .pending_media
            .as_ref()
            .is_some_and(|request| request.target_block() == id)
        {
            self.pending_media = None;
        }
        self.publish();
        Ok(removed)
    }

    /// Commands matching the text typed after the trigger character.
    pub fn slash_menu(&self, query: &str) -> Vec<&SlashCommand> {
        self.commands.filter(query)
    }

    /// Run the command `key` with the cursor in block `cursor`.
    pub fn execute_command(
        &mut self,
        key: &str,
        cursor: &BlockId,
    ) -> Result<CommandOutcome, EditorError> {
        let action = self
            .commands
            .get(key)
            .map(|command| command.action.clone())
            .ok_or_else(|| EditorError::UnknownCommand(key.to_string()))?;

        match action {
            CommandAction::InsertBlock { kind, props } => {
                let block = NewBlock::new(kind).with_props(props);
                let id = self.insert_block(block, cursor, Placement::After)?;
                Ok(CommandOutcome::Inserted(id))
            }
            CommandAction::OpenMediaLibrary => {
                if self.document.get(cursor).is_none() {
                    return Err(DocumentError::InvalidAnchor(cursor.clone()).into());
                }
                let request = self.request_media(
                    MediaTarget::InsertImageAfter(cursor.clone()),
                    "Select Image from Library",
                );
                Ok(CommandOutcome::MediaRequested(request))
            }
        }
    }

    /// Apply a style picked from a custom bullet's style menu.
    pub fn select_bullet_style(
        &mut self,
        id: &BlockId,
        style: BulletStyle,
    ) -> Result<(), EditorError> {
        let current = self.custom_bullet(id)?;
        self.update_block(id, bullet::style_change(style, &current.icon_url))
    }

    /// "Choose from Media" on a custom bullet.
    pub fn request_bullet_icon(&mut self, id: &BlockId) -> Result<MediaRequest, EditorError> {
        self.custom_bullet(id)?;
        Ok(self.request_media(
            MediaTarget::BulletIcon(id.clone()),
            "Select Bullet Icon from Library",
        ))
    }

    /// Pick the source of a library-backed image block.
    pub fn request_media_image_source(
        &mut self,
        id: &BlockId,
    ) -> Result<MediaRequest, EditorError> {
        match self.document.get(id) {
            Some(block) if block.is_kind(kinds::MEDIA_IMAGE) => {}
            Some(_) => return Err(EditorError::NotAMediaImage(id.clone())),
            None => return Err(DocumentError::UnknownBlock(id.clone()).into()),
        }
        Ok(self.request_media(
            MediaTarget::MediaImageSource(id.clone()),
            "Select Image from Library",
        ))
    }

    /// Continue a custom bullet list: insert a sibling right after `id` with
    /// the same style and icon. Returns the id the caller should focus.
    pub fn continue_bullet(&mut self, id: &BlockId) -> Result<BlockId, EditorError> {
        let current = self.custom_bullet(id)?;
        self.insert_block(bullet::continuation(&current), id, Placement::After)
    }

    /// Complete the pending media request with the URL the picker returned.
    ///
    /// Returns the block that now references the URL.
    pub fn complete_media(&mut self, request_id: u64, url: &str) -> Result<BlockId, EditorError> {
        let request = match &self.pending_media {
            Some(request) if request.id == request_id => request.clone(),
            Some(_) => return Err(EditorError::StaleMediaRequest(request_id)),
            None => return Err(EditorError::NoPendingMedia),
        };
        if !is_public_url(url) {
            return Err(EditorError::NonPublicUrl(url.to_string()));
        }

        let id = match &request.target {
            MediaTarget::InsertImageAfter(anchor) => {
                let image = NewBlock::new(kinds::IMAGE).with_prop("url", url);
                self.insert_block(image, anchor, Placement::After)?
            }
            MediaTarget::BulletIcon(id) => {
                self.custom_bullet(id)?;
                self.update_block(id, bullet::media_icon_change(url))?;
                id.clone()
            }
            MediaTarget::MediaImageSource(id) => {
                let mut partial = PropMap::new();
                partial.insert("src".to_string(), Value::from(url));
                self.update_block(id, partial)?;
                id.clone()
            }
        };

        self.pending_media = None;
        Ok(id)
    }

    /// Drop the pending media request; the document is left as it is.
    pub fn cancel_media(&mut self) -> Option<MediaRequest> {
        self.pending_media.take()
    }

    fn custom_bullet(&self, id: &BlockId) -> Result<CustomBullet, EditorError> {
        let block = self
            .document
            .get(id)
            .ok_or_else(|| DocumentError::UnknownBlock(id.clone()))?;
        CustomBullet::from_block(block).ok_or_else(|| EditorError::NotABullet(id.clone()))
    }

    fn request_media(&mut self, target: MediaTarget, title: &'static str) -> MediaRequest {
        let request = MediaRequest {
            id: self.next_request,
            target,
            allowed: MimeAllowList::images(),
            title,
        };
        self.next_request += 1;
        self.pending_media = Some(request.clone());
        request
    }

    fn publish(&self) {
        let snapshot = self.document.snapshot();
        for listener in &self.listeners {
            listener(&snapshot);
        }
        self.changes.send_replace(snapshot);
    }
}

impl MediaRequest {
    fn target_block(&self) -> &BlockId {
        match &self.target {
            MediaTarget::InsertImageAfter(id)
            | MediaTarget::BulletIcon(id)
            | MediaTarget::MediaImageSource(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::presentation::blocks::standard_registry;

    fn session() -> EditorSession {
        EditorSession::new(standard_registry(), CommandMenu::default()).expect("session")
    }

    fn first_id(session: &EditorSession) -> BlockId {
        session.document().blocks()[0].id.clone()
    }

    #[test]
    fn mutations_publish_snapshots_synchronously() {
        let mut session = session();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        session.on_change(move |snapshot| {
            sink.lock().expect("lock").push(snapshot.len());
        });
        let receiver = session.subscribe();

        let first = first_id(&session);
        session
            .insert_block(NewBlock::new(kinds::QUOTE), &first, Placement::After)
            .expect("insert");
        assert_eq!(receiver.borrow().len(), 2);

        let missing = BlockId::from("missing");
        assert!(
            session
                .insert_block(NewBlock::new(kinds::QUOTE), &missing, Placement::After)
                .is_err()
        );

        assert_eq!(*seen.lock().expect("lock"), [2]);
    }

    #[test]
    fn media_library_command_requests_images_only() {
        let mut session = session();
        let first = first_id(&session);

        let outcome = session
            .execute_command("media_library", &first)
            .expect("command");
        let CommandOutcome::MediaRequested(request) = outcome else {
            panic!("expected media request");
        };
        assert_eq!(request.allowed, MimeAllowList::images());
        assert_eq!(session.document().len(), 1);

        let image = session
            .complete_media(request.id, "https://cdn.example.com/a.png")
            .expect("complete");
        assert_eq!(session.document().position(&image), Some(1));
        assert_eq!(
            session.block(&image).expect("image").prop_str("url"),
            "https://cdn.example.com/a.png"
        );
        assert!(session.pending_media().is_none());
    }

    #[test]
    fn insert_commands_add_block_after_cursor() {
        let mut session = session();
        let first = first_id(&session);
        let CommandOutcome::Inserted(id) =
            session.execute_command("heading_3", &first).expect("command")
        else {
            panic!("expected insertion");
        };
        assert_eq!(session.block(&id).expect("heading").props["level"], json!(3));
        assert!(matches!(
            session.execute_command("table", &first),
            Err(EditorError::UnknownCommand(_))
        ));
    }

    #[test]
    fn bullet_icon_pick_forces_custom_style() {
        let mut session = session();
        let first = first_id(&session);
        let bullet = session
            .insert_block(
                NewBlock::new(kinds::CUSTOM_BULLET).with_prop("bulletType", "star"),
                &first,
                Placement::After,
            )
            .expect("insert");

        let request = session.request_bullet_icon(&bullet).expect("request");
        session
            .complete_media(request.id, "https://cdn.example.com/icon.svg")
            .expect("complete");

        let block = session.block(&bullet).expect("bullet");
        assert_eq!(block.prop_str("bulletType"), "custom");
        assert_eq!(block.prop_str("bulletIcon"), "https://cdn.example.com/icon.svg");

        session
            .select_bullet_style(&bullet, BulletStyle::Diamond)
            .expect("style");
        let block = session.block(&bullet).expect("bullet");
        assert_eq!(block.prop_str("bulletType"), "diamond");
        assert_eq!(block.prop_str("bulletIcon"), "");
    }

    #[test]
    fn non_public_urls_are_not_written() {
        let mut session = session();
        let first = first_id(&session);
        let CommandOutcome::MediaRequested(request) = session
            .execute_command("media_library", &first)
            .expect("command")
        else {
            panic!("expected media request");
        };

        assert!(matches!(
            session.complete_media(request.id, "blob:http://localhost/123"),
            Err(EditorError::NonPublicUrl(_))
        ));
        assert_eq!(session.document().len(), 1);
        assert!(session.pending_media().is_some());
    }

    #[test]
    fn superseded_requests_are_stale() {
        let mut session = session();
        let first = first_id(&session);
        let bullet = session
            .insert_block(NewBlock::new(kinds::CUSTOM_BULLET), &first, Placement::After)
            .expect("insert");

        let old = session.request_bullet_icon(&bullet).expect("first request");
        let new = session.request_bullet_icon(&bullet).expect("second request");
        assert!(matches!(
            session.complete_media(old.id, "https://cdn.example.com/a.png"),
            Err(EditorError::StaleMediaRequest(_))
        ));

        session.cancel_media();
        assert!(matches!(
            session.complete_media(new.id, "https://cdn.example.com/a.png"),
            Err(EditorError::NoPendingMedia)
        ));
        assert_eq!(session.block(&bullet).expect("bullet").prop_str("bulletIcon"), "");
    }

    #[test]
    fn continuing_a_bullet_inherits_style_and_icon() {
        let mut session = session();
        let first = first_id(&session);
        let bullet = session
            .insert_block(
                NewBlock::new(kinds::CUSTOM_BULLET)
                    .with_prop("bulletType", "custom")
                    .with_prop("bulletIcon", "https://cdn.example.com/i.png"),
                &first,
                Placement::After,
            )
            .expect("insert");
        let trailing = session
            .insert_block(NewBlock::new(kinds::PARAGRAPH), &bullet, Placement::After)
            .expect("insert");

        let next = session.continue_bullet(&bullet).expect("continue");
        assert_eq!(session.document().position(&next), Some(2));
        assert_eq!(session.document().position(&trailing), Some(3));
        let block = session.block(&next).expect("next");
        assert_eq!(block.prop_str("bulletType"), "custom");
        assert_eq!(block.prop_str("bulletIcon"), "https://cdn.example.com/i.png");

        assert!(matches!(
            session.continue_bullet(&first),
            Err(EditorError::NotABullet(_))
        ));
    }

    #[test]
    fn removing_request_target_clears_pending_request() {
        let mut session = session();
        let first = first_id(&session);
        let bullet = session
            .insert_block(NewBlock::new(kinds::CUSTOM_BULLET), &first, Placement::After)
            .expect("insert");
        session.request_bullet_icon(&bullet).expect("request");
        session.remove_block(&bullet).expect("remove");
        assert!(session.pending_media().is_none());
    }
}
