use clap::Parser;

use super::*;

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.api.base_url.is_none());
    assert_eq!(settings.api.timeout, Duration::from_secs(30));
    assert_eq!(settings.media.page_size.get(), 20);
    assert_eq!(settings.media.max_upload_bytes.get(), 10 * 1024 * 1024);
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.media.page_size = Some(50);
    raw.logging.level = Some("info".to_string());

    let overrides = GlobalOverrides {
        media_page_size: Some(12),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.media.page_size.get(), 12);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn base_url_gains_trailing_slash() {
    let mut raw = RawSettings::default();
    raw.api.base_url = Some("https://blog.example.com/api".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");

    let base = settings.api.base_url.expect("base url");
    assert_eq!(base.as_str(), "https://blog.example.com/api/");
    assert_eq!(
        base.join("media").expect("join").as_str(),
        "https://blog.example.com/api/media"
    );
}

#[test]
fn invalid_values_name_their_key() {
    let mut raw = RawSettings::default();
    raw.api.base_url = Some("ftp://files.example.com".to_string());
    let err = Settings::from_raw(raw).expect_err("scheme rejected");
    assert!(matches!(err, LoadError::Invalid { key: "api.base_url", .. }));

    let mut raw = RawSettings::default();
    raw.media.page_size = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero page size");
    assert!(matches!(err, LoadError::Invalid { key: "media.page_size", .. }));

    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn blank_token_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.api.access_token = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.api.access_token.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = GlobalOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn parse_media_list_arguments() {
    let args = CliArgs::parse_from([
        "penna",
        "media",
        "list",
        "--pages",
        "2",
        "--type",
        "image/*",
        "--type",
        "application/pdf",
        "--search",
        "beach",
        "--api-base-url",
        "https://blog.example.com/api/",
    ]);

    assert_eq!(
        args.overrides.api_base_url.as_deref(),
        Some("https://blog.example.com/api/")
    );
    match args.command {
        Command::Media(MediaCommand::List(list)) => {
            assert_eq!(list.pages, 2);
            assert_eq!(list.types, ["image/*", "application/pdf"]);
            assert_eq!(list.search.as_deref(), Some("beach"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_commands_query_defaults_to_empty() {
    let args = CliArgs::parse_from(["penna", "commands"]);
    match args.command {
        Command::Commands(commands) => assert_eq!(commands.query, ""),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_post_save_arguments() {
    let args = CliArgs::parse_from([
        "penna",
        "post",
        "save",
        "post.toml",
        "--content",
        "content.json",
        "--log-json",
        "true",
    ]);
    assert_eq!(args.overrides.log_json, Some(true));
    match args.command {
        Command::Post(PostCommand::Save(save)) => {
            assert_eq!(save.manifest, std::path::PathBuf::from("post.toml"));
            assert_eq!(
                save.content,
                Some(std::path::PathBuf::from("content.json"))
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
