use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Penna binary.
#[derive(Debug, Parser)]
#[command(
    name = "penna",
    version,
    about = "Block editor core and media library client for the blog admin API"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "PENNA_CONFIG_FILE", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the content API base URL.
    #[arg(long = "api-base-url", value_name = "URL", global = true)]
    pub api_base_url: Option<String>,

    /// Override the bearer token sent to the content API.
    #[arg(long = "api-token", env = "PENNA_API_TOKEN", value_name = "TOKEN", global = true)]
    pub api_token: Option<String>,

    /// Override the request timeout.
    #[arg(long = "api-timeout-seconds", value_name = "SECONDS", global = true)]
    pub api_timeout_seconds: Option<u64>,

    /// Override the media listing page size.
    #[arg(long = "media-page-size", value_name = "COUNT", global = true)]
    pub media_page_size: Option<u32>,

    /// Override the largest file accepted for upload, in bytes.
    #[arg(long = "media-max-upload-bytes", value_name = "BYTES", global = true)]
    pub media_max_upload_bytes: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Browse and manage the media library.
    #[command(subcommand)]
    Media(MediaCommand),
    /// List slash-menu commands matching a query.
    Commands(CommandsArgs),
    /// Render a saved block document to HTML.
    Render(RenderArgs),
    /// Post persistence.
    #[command(subcommand)]
    Post(PostCommand),
}

#[derive(Debug, Subcommand, Clone)]
pub enum MediaCommand {
    /// List media assets the picker would offer.
    List(MediaListArgs),
    /// Upload one or more files concurrently.
    Upload(MediaUploadArgs),
    /// Show the metadata record of an asset.
    Describe(MediaIdArgs),
    /// Update the name, alt text or description of an asset.
    Annotate(MediaAnnotateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct MediaListArgs {
    /// Number of pages to load, starting at page 1.
    #[arg(long, default_value_t = 1)]
    pub pages: u32,

    /// Allowed media types (`image/*`, `video/*`, `audio/*` or an exact MIME type).
    #[arg(long = "type", value_name = "MIME")]
    pub types: Vec<String>,

    /// Case-insensitive filter on the file name.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct MediaUploadArgs {
    /// Files to upload.
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct MediaIdArgs {
    /// Asset id.
    pub id: String,
}

#[derive(Debug, Args, Clone)]
pub struct MediaAnnotateArgs {
    /// Asset id.
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub alt: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CommandsArgs {
    /// Text typed after the trigger character.
    #[arg(default_value = "")]
    pub query: String,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// JSON file holding the block array.
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Write the HTML here instead of stdout.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum PostCommand {
    /// Create or update a post from a TOML manifest and a block document.
    Save(PostSaveArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PostSaveArgs {
    /// TOML manifest with the post fields.
    #[arg(value_hint = ValueHint::FilePath)]
    pub manifest: PathBuf,

    /// JSON block array; without it the post is saved with an empty document.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub content: Option<PathBuf>,
}
