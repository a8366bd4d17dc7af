//! Trigger-character command menu.
//!
//! The menu is an ordered list of commands. Resolution filters it by a
//! free-text query without reordering, so declaration order is priority order.

use serde_json::Value;

use crate::domain::blocks::{NewBlock, PropMap};
use crate::domain::bullet::BulletStyle;
use crate::domain::error::DomainError;
use crate::domain::kinds;

/// Key of the injected media library command.
pub const MEDIA_LIBRARY_KEY: &str = "media_library";

/// Priority slot the media library command is injected at.
pub const MEDIA_LIBRARY_SLOT: usize = 11;

/// Built-in commands replaced by the media library command.
const SUPPRESSED_TITLES: [&str; 3] = ["Image", "File", "Audio"];

#[derive(Debug, Clone, PartialEq)]
pub enum CommandAction {
    /// Insert a block of `kind` with the given props after the cursor block.
    InsertBlock { kind: String, props: PropMap },
    /// Ask the caller to open the media picker for an image.
    OpenMediaLibrary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlashCommand {
    pub key: String,
    pub title: String,
    pub aliases: Vec<String>,
    pub group: String,
    pub subtext: Option<String>,
    pub action: CommandAction,
}

impl SlashCommand {
    pub fn insert(key: &str, title: &str, group: &str, kind: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            aliases: Vec::new(),
            group: group.to_string(),
            subtext: None,
            action: CommandAction::InsertBlock {
                kind: kind.to_string(),
                props: PropMap::new(),
            },
        }
    }

    pub fn media_library() -> Self {
        Self {
            key: MEDIA_LIBRARY_KEY.to_string(),
            title: "Media Library".to_string(),
            aliases: ["media", "image", "img", "library", "gallery", "photo", "picture"]
                .map(String::from)
                .to_vec(),
            group: "Image Picker".to_string(),
            subtext: Some("Select an image from your media library".to_string()),
            action: CommandAction::OpenMediaLibrary,
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|alias| alias.to_string()).collect();
        self
    }

    pub fn with_subtext(mut self, subtext: &str) -> Self {
        self.subtext = Some(subtext.to_string());
        self
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let CommandAction::InsertBlock { props, .. } = &mut self.action {
            props.insert(key.to_string(), value.into());
        }
        self
    }

    /// Case-insensitive substring match against the title or any alias.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self
                .aliases
                .iter()
                .any(|alias| alias.to_lowercase().contains(&query))
    }

    /// Block this command inserts, if it inserts one.
    pub fn new_block(&self) -> Option<NewBlock> {
        match &self.action {
            CommandAction::InsertBlock { kind, props } => {
                Some(NewBlock::new(kind.as_str()).with_props(props.clone()))
            }
            CommandAction::OpenMediaLibrary => None,
        }
    }
}

/// Commands shipped with the editor before media-library customisation.
pub fn default_commands() -> Vec<SlashCommand> {
    vec![
        SlashCommand::insert("heading_1", "Heading 1", "Headings", kinds::HEADING)
            .with_prop("level", 1)
            .with_aliases(&["h", "heading1", "h1"])
            .with_subtext("Top-level heading"),
        SlashCommand::insert("heading_2", "Heading 2", "Headings", kinds::HEADING)
            .with_prop("level", 2)
            .with_aliases(&["h2", "heading2", "subheading"])
            .with_subtext("Key section heading"),
        SlashCommand::insert("heading_3", "Heading 3", "Headings", kinds::HEADING)
            .with_prop("level", 3)
            .with_aliases(&["h3", "heading3", "subheading"])
            .with_subtext("Subsection and group heading"),
        SlashCommand::insert(
            "numbered_list",
            "Numbered List",
            "Basic blocks",
            kinds::NUMBERED_LIST_ITEM,
        )
        .with_aliases(&["ol", "li", "list", "numberedlist", "numbered list"])
        .with_subtext("List with ordered items"),
        SlashCommand::insert(
            "bullet_list",
            "Bullet List",
            "Basic blocks",
            kinds::BULLET_LIST_ITEM,
        )
        .with_aliases(&["ul", "li", "list", "bulletlist", "bullet list"])
        .with_subtext("List with unordered items"),
        SlashCommand::insert(
            "check_list",
            "Check List",
            "Basic blocks",
            kinds::CHECK_LIST_ITEM,
        )
        .with_aliases(&["ul", "li", "list", "checklist", "check list", "checkbox"])
        .with_subtext("List with checkboxes"),
        SlashCommand::insert("paragraph", "Paragraph", "Basic blocks", kinds::PARAGRAPH)
            .with_aliases(&["p", "paragraph"])
            .with_subtext("The body of your document"),
        SlashCommand::insert("code_block", "Code Block", "Basic blocks", kinds::CODE_BLOCK)
            .with_aliases(&["code", "pre"])
            .with_subtext("Code block with syntax highlighting"),
        SlashCommand::insert("quote", "Quote", "Basic blocks", kinds::QUOTE)
            .with_aliases(&["quotation", "blockquote", "bq"])
            .with_subtext("Quote or excerpt"),
        SlashCommand::insert(
            "custom_bullet",
            "Custom Bullet",
            "Basic blocks",
            kinds::CUSTOM_BULLET,
        )
        .with_prop("bulletType", BulletStyle::Circle.as_str())
        .with_aliases(&["bullet", "icon", "star", "arrow", "diamond"])
        .with_subtext("List item with a styled or custom icon bullet"),
        SlashCommand::insert("image", "Image", "Media", kinds::IMAGE)
            .with_aliases(&["image", "imageupload", "upload", "img", "picture", "media", "url"])
            .with_subtext("Resizable image with caption"),
        SlashCommand::insert("video", "Video", "Media", kinds::VIDEO)
            .with_aliases(&["video", "videoupload", "upload", "mp4", "film", "media", "url"])
            .with_subtext("Resizable video with caption"),
        SlashCommand::insert("audio", "Audio", "Media", kinds::AUDIO)
            .with_aliases(&["audio", "audioupload", "upload", "mp3", "sound", "media", "url"])
            .with_subtext("Embedded audio with caption"),
        SlashCommand::insert("file", "File", "Media", kinds::FILE)
            .with_aliases(&["file", "upload", "embed", "media", "url"])
            .with_subtext("Embedded file"),
    ]
}

/// Ordered, runtime-extensible command list.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandMenu {
    commands: Vec<SlashCommand>,
}

impl CommandMenu {
    /// Apply the media-library customisation to `defaults`: drop the built-in
    /// image, file and audio commands, then inject the media library command
    /// at [`MEDIA_LIBRARY_SLOT`] (or at the end of a shorter list).
    pub fn customized(defaults: Vec<SlashCommand>) -> Self {
        let mut commands: Vec<SlashCommand> = defaults
            .into_iter()
            .filter(|command| {
                !SUPPRESSED_TITLES.contains(&command.title.as_str())
                    && command.action != CommandAction::OpenMediaLibrary
            })
            .collect();
        let slot = MEDIA_LIBRARY_SLOT.min(commands.len());
        commands.insert(slot, SlashCommand::media_library());
        Self { commands }
    }

    pub fn commands(&self) -> &[SlashCommand] {
        &self.commands
    }

    pub fn get(&self, key: &str) -> Option<&SlashCommand> {
        self.commands.iter().find(|command| command.key == key)
    }

    /// Append a command. Keys must be unique within the menu.
    pub fn register(&mut self, command: SlashCommand) -> Result<(), DomainError> {
        let index = self.commands.len();
        self.register_at(index, command)
    }

    /// Insert a command at `index` (clamped to the list length).
    pub fn register_at(&mut self, index: usize, command: SlashCommand) -> Result<(), DomainError> {
        if self.get(&command.key).is_some() {
            return Err(DomainError::invariant(format!(
                "command `{}` is already registered",
                command.key
            )));
        }
        let index = index.min(self.commands.len());
        self.commands.insert(index, command);
        Ok(())
    }

    /// Commands matching `query`, in priority order.
    pub fn filter(&self, query: &str) -> Vec<&SlashCommand> {
        self.commands
            .iter()
            .filter(|command| command.matches(query))
            .collect()
    }
}

impl Default for CommandMenu {
    fn default() -> Self {
        Self::customized(default_commands())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(commands: &[&SlashCommand]) -> Vec<String> {
        commands.iter().map(|command| command.title.clone()).collect()
    }

    #[test]
    fn empty_query_lists_everything_with_media_library_injected() {
        let menu = CommandMenu::default();
        let all = menu.filter("");
        let titles = titles(&all);

        assert_eq!(titles.len(), 12);
        assert_eq!(titles[MEDIA_LIBRARY_SLOT], "Media Library");
        assert_eq!(titles.iter().filter(|t| *t == "Media Library").count(), 1);
        for suppressed in SUPPRESSED_TITLES {
            assert!(!titles.iter().any(|title| title == suppressed));
        }
        assert_eq!(titles[0], "Heading 1");
        assert_eq!(titles[10], "Video");
    }

    #[test]
    fn filter_matches_aliases_case_insensitively() {
        let menu = CommandMenu::default();
        let found = titles(&menu.filter("IMG"));
        assert_eq!(found, ["Media Library"]);

        let found = titles(&menu.filter("list"));
        assert_eq!(found, ["Numbered List", "Bullet List", "Check List"]);
    }

    #[test]
    fn short_default_lists_get_media_library_at_the_end() {
        let menu = CommandMenu::customized(vec![
            SlashCommand::insert("paragraph", "Paragraph", "Basic blocks", kinds::PARAGRAPH),
            SlashCommand::insert("image", "Image", "Media", kinds::IMAGE),
        ]);
        let all = menu.filter("");
        assert_eq!(titles(&all), ["Paragraph", "Media Library"]);
    }

    #[test]
    fn long_default_lists_get_media_library_at_index_eleven() {
        let defaults = (0..14)
            .map(|i| {
                SlashCommand::insert(&format!("p{i}"), &format!("P{i}"), "Basic blocks", kinds::PARAGRAPH)
            })
            .collect();
        let menu = CommandMenu::customized(defaults);
        let all = titles(&menu.filter(""));
        assert_eq!(all.len(), 15);
        assert_eq!(all[10], "P10");
        assert_eq!(all[11], "Media Library");
        assert_eq!(all[12], "P11");
    }

    #[test]
    fn runtime_registration_rejects_duplicate_keys() {
        let mut menu = CommandMenu::default();
        let callout = SlashCommand::insert("callout", "Callout", "Custom", kinds::PARAGRAPH)
            .with_aliases(&["note"]);
        menu.register(callout.clone()).expect("register");
        assert_eq!(titles(&menu.filter("note")), ["Callout"]);
        assert!(menu.register(callout).is_err());
    }

    #[test]
    fn insert_commands_carry_their_props() {
        let menu = CommandMenu::default();
        let block = menu
            .get("heading_2")
            .and_then(SlashCommand::new_block)
            .expect("heading command");
        assert_eq!(block.kind, kinds::HEADING);
        assert_eq!(block.props["level"], 2);
        assert!(menu.get(MEDIA_LIBRARY_KEY).and_then(SlashCommand::new_block).is_none());
    }
}
