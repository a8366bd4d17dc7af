use std::{path::Path, process, sync::Arc};

use penna::{
    application::{
        editor::EditorSession,
        error::AppError,
        media_picker::{MediaPicker, MediaPickerSettings, PageOutcome},
        post_form::{PostFormController, SaveOutcome},
        repos::{MediaRepo, PostsRepo},
    },
    config,
    domain::{
        commands::CommandMenu,
        document::Document,
        media::{MediaMetadata, MimeAllowList},
        posts::PostForm,
    },
    infra::{error::InfraError, http::ApiClient, telemetry, uploads},
    presentation::blocks::{render_document, standard_registry},
    util::bytes::format_bytes,
};
use tokio::fs;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        config::Command::Media(command) => run_media(&settings, command).await,
        config::Command::Commands(args) => run_commands(&args),
        config::Command::Render(args) => run_render(args).await,
        config::Command::Post(config::PostCommand::Save(args)) => {
            run_post_save(&settings, args).await
        }
    }
}

fn api_client(settings: &config::Settings) -> Result<Arc<ApiClient>, AppError> {
    Ok(Arc::new(ApiClient::from_settings(&settings.api)?))
}

fn media_picker(settings: &config::Settings, client: Arc<ApiClient>) -> MediaPicker {
    MediaPicker::new(
        client as Arc<dyn MediaRepo>,
        MediaPickerSettings {
            page_size: settings.media.page_size.get(),
            max_upload_bytes: settings.media.max_upload_bytes.get(),
        },
    )
}

async fn run_media(
    settings: &config::Settings,
    command: config::MediaCommand,
) -> Result<(), AppError> {
    let client = api_client(settings)?;
    let mut picker = media_picker(settings, client);

    match command {
        config::MediaCommand::List(args) => {
            let allowed = if args.types.is_empty() {
                MimeAllowList::media()
            } else {
                MimeAllowList::parse(args.types.iter().map(String::as_str))?
            };

            picker.open(allowed).await;
            if let Some(message) = picker.empty_message() {
                return Err(AppError::unexpected(message.to_string()));
            }
            for _ in 1..args.pages.max(1) {
                if !picker.has_more() {
                    break;
                }
                if picker.load_more().await? == PageOutcome::Failed {
                    warn!("stopped paging after a failed request");
                    break;
                }
            }
            if let Some(search) = args.search {
                picker.set_search(search);
            }

            for asset in picker.visible() {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    asset.id,
                    asset.mime_type,
                    format_bytes(asset.byte_size),
                    asset.display_name,
                    asset.storage_url
                );
            }
            Ok(())
        }
        config::MediaCommand::Upload(args) => {
            let mut files = Vec::with_capacity(args.files.len());
            let mut local_failures = 0usize;
            for loaded in uploads::load_uploads(&args.files).await {
                match loaded {
                    Ok(file) => files.push(file),
                    Err(err) => {
                        local_failures += 1;
                        eprintln!("{err}");
                    }
                }
            }

            picker.open(MimeAllowList::media()).await;
            let report = picker.upload_files(files).await?;
            for uploaded in &report.uploaded {
                println!("{}\t{}", uploaded.id, uploaded.public_url);
            }
            for failure in &report.failures {
                eprintln!("{}: {}", failure.file_name, failure.message);
            }

            let failed = report.failures.len() + local_failures;
            if failed > 0 {
                return Err(AppError::validation(format!(
                    "{failed} of {} files could not be uploaded",
                    args.files.len()
                )));
            }
            Ok(())
        }
        config::MediaCommand::Describe(args) => {
            let metadata = picker
                .describe(&args.id)
                .await?
                .ok_or_else(|| AppError::validation(format!("media `{}` has no metadata", args.id)))?;
            print_json(&metadata)
        }
        config::MediaCommand::Annotate(args) => {
            let current = picker.describe(&args.id).await?.unwrap_or_default();
            let metadata = MediaMetadata {
                name: args.name.or(current.name),
                alt: args.alt.or(current.alt),
                description: args.description.or(current.description),
            };
            let saved = picker.save_metadata(&args.id, &metadata).await?;
            info!(media = %args.id, "media metadata updated");
            print_json(&saved)
        }
    }
}

fn run_commands(args: &config::CommandsArgs) -> Result<(), AppError> {
    let menu = CommandMenu::default();
    for command in menu.filter(&args.query) {
        println!("{}\t{}\t{}", command.key, command.title, command.group);
    }
    Ok(())
}

async fn run_render(args: config::RenderArgs) -> Result<(), AppError> {
    let raw = read_to_string(&args.input).await?;
    let document = Document::from_json_str(standard_registry(), &raw)?;
    let html = render_document(&document)?;

    match args.output {
        Some(path) => {
            fs::write(&path, html).await.map_err(InfraError::from)?;
            info!(path = %path.display(), blocks = document.len(), "document rendered");
        }
        None => println!("{html}"),
    }
    Ok(())
}

async fn run_post_save(
    settings: &config::Settings,
    args: config::PostSaveArgs,
) -> Result<(), AppError> {
    let manifest = read_to_string(&args.manifest).await?;
    let mut form: PostForm = toml::from_str(&manifest)
        .map_err(|err| AppError::validation(format!("invalid post manifest: {err}")))?;
    if form.slug.is_empty() {
        let title = form.title.clone();
        form.set_title(title);
    }

    let session = match &args.content {
        Some(path) => {
            let raw = read_to_string(path).await?;
            let saved: serde_json::Value = serde_json::from_str(&raw)
                .map_err(|err| AppError::validation(format!("invalid block document: {err}")))?;
            EditorSession::hydrate(standard_registry(), CommandMenu::default(), saved)?
        }
        None => EditorSession::new(standard_registry(), CommandMenu::default())?,
    };

    let client = api_client(settings)?;
    let mut controller =
        PostFormController::new(form, session.subscribe(), client as Arc<dyn PostsRepo>);

    match controller.save().await? {
        SaveOutcome::Created { id } => println!("created post {id}"),
        SaveOutcome::Updated { id } => println!("updated post {id}"),
    }
    Ok(())
}

async fn read_to_string(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))
}

fn print_json(value: &impl serde::Serialize) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
