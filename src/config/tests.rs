use std::io::Write as _;

use serial_test::serial;

use super::*;

#[test]
fn defaults_point_at_public_project() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.content, ContentSettings::default());
    assert_eq!(settings.content.project_id, DEFAULT_PROJECT_ID);
    assert_eq!(settings.content.dataset, DEFAULT_DATASET);
    assert!(settings.content.use_cdn);
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.content.project_id = Some("fromfile".to_string());
    raw.logging.level = Some("info".to_string());

    let overrides = SettingsOverrides {
        project_id: Some("fromcli".to_string()),
        log_level: Some("debug".to_string()),
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.content.project_id, "fromcli");
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn rejects_malformed_project_id() {
    let mut raw = RawSettings::default();
    raw.content.project_id = Some("Not A Project".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid project id");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "content.project_id",
            ..
        }
    ));
}

#[test]
fn rejects_explicitly_empty_dataset() {
    let mut raw = RawSettings::default();
    raw.content.dataset = Some("  ".to_string());

    let err = Settings::from_raw(raw).expect_err("empty dataset");
    assert_eq!(
        err.to_string(),
        "invalid configuration for `content.dataset`: must not be empty"
    );
}

#[test]
fn rejects_malformed_api_version_and_level() {
    let mut raw = RawSettings::default();
    raw.content.api_version = Some("yesterday".to_string());
    assert!(matches!(
        Settings::from_raw(raw).expect_err("invalid api version"),
        LoadError::Invalid {
            key: "content.api_version",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());
    assert!(matches!(
        Settings::from_raw(raw).expect_err("invalid level"),
        LoadError::Invalid {
            key: "logging.level",
            ..
        }
    ));
}

#[test]
fn api_version_accepts_leading_v() {
    let mut raw = RawSettings::default();
    raw.content.api_version = Some("v2025-02-19".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.content.api_version, "2025-02-19");
}

#[test]
fn query_endpoint_switches_between_cdn_and_live_api() {
    let mut content = ContentSettings::default();
    assert_eq!(
        content.query_endpoint().expect("endpoint").as_str(),
        "https://rsvncbtu.apicdn.sanity.io/v2024-01-01/data/query/production"
    );

    content.use_cdn = false;
    assert_eq!(
        content.query_endpoint().expect("endpoint").as_str(),
        "https://rsvncbtu.api.sanity.io/v2024-01-01/data/query/production"
    );
}

#[test]
fn api_url_override_keeps_query_path() {
    let content = ContentSettings {
        api_url: Url::parse("http://127.0.0.1:9000/proxy/").ok(),
        ..ContentSettings::default()
    };
    assert_eq!(
        content.query_endpoint().expect("endpoint").as_str(),
        "http://127.0.0.1:9000/proxy/v2024-01-01/data/query/production"
    );
}

#[test]
#[serial]
fn explicit_config_file_is_loaded() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    writeln!(
        file,
        "[content]\nproject_id = \"abc123\"\ndataset = \"staging\"\nuse_cdn = false\n\n[logging]\nlevel = \"warn\""
    )
    .expect("write config");

    let path = file.path().to_string_lossy().into_owned();
    let args = CliArgs::parse_from(["marquee", "--config-file", path.as_str(), "events"]);
    let settings = load(&args).expect("settings");

    assert_eq!(settings.content.project_id, "abc123");
    assert_eq!(settings.content.dataset, "staging");
    assert!(!settings.content.use_cdn);
    assert_eq!(settings.logging.level, LevelFilter::WARN);
}

#[test]
#[serial]
fn environment_sits_between_file_and_cli() {
    unsafe {
        std::env::set_var("MARQUEE__CONTENT__DATASET", "fromenv");
        std::env::set_var("MARQUEE__LOGGING__JSON", "true");
    }

    let env_only = load(&CliArgs::parse_from(["marquee"]));
    let with_cli = load(&CliArgs::parse_from(["marquee", "--dataset", "fromcli"]));

    unsafe {
        std::env::remove_var("MARQUEE__CONTENT__DATASET");
        std::env::remove_var("MARQUEE__LOGGING__JSON");
    }

    let env_only = env_only.expect("settings");
    assert_eq!(env_only.content.dataset, "fromenv");
    assert!(matches!(env_only.logging.format, LogFormat::Json));
    assert_eq!(with_cli.expect("settings").content.dataset, "fromcli");
}

#[test]
fn missing_explicit_config_file_fails() {
    let args = CliArgs::parse_from([
        "marquee",
        "--config-file",
        "/nonexistent/marquee-config.toml",
    ]);
    assert!(matches!(load(&args), Err(LoadError::Build(_))));
}

#[test]
fn parse_events_arguments() {
    let args = CliArgs::parse_from(["marquee", "events", "--json", "--log-level", "debug"]);

    match args.command.expect("events command") {
        Command::Events(events) => assert!(events.json),
        other => panic!("unexpected command: {other:?}"),
    }
    assert_eq!(args.overrides.log_level.as_deref(), Some("debug"));
}

#[test]
fn parse_image_url_arguments() {
    let args = CliArgs::parse_from(["marquee", "image-url", "image-abc-10x20-png"]);

    match args.command.expect("image-url command") {
        Command::ImageUrl(image) => {
            assert_eq!(image.asset, "image-abc-10x20-png");
            assert_eq!(image.width, 600);
            assert_eq!(image.height, 400);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn no_subcommand_is_allowed() {
    let args = CliArgs::parse_from(["marquee"]);
    assert!(args.command.is_none());
}
