use serial_test::serial;
use shorts_uploader::load_config::{
    load_config, load_env_config, load_static_config, DatabaseConfig, Overrides,
};
use shorts_uploader_core::config::KeyLayout;
use shorts_uploader_core::error::UploaderError;
use std::collections::HashMap;
use std::env;
use std::fs::write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const ALL_KEYS: [&str; 13] = [
    "VIDEO_ID",
    "R2_ACCESS_KEY",
    "R2_SECRET_KEY",
    "R2_ENDPOINT",
    "R2_BUCKET",
    "R2_PUBLIC_URL",
    "R2_REGION",
    "DATABASE_URL",
    "DB_HOST",
    "DB_PORT",
    "DB_NAME",
    "DB_USER",
    "DB_PASSWORD",
];

fn full_env() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("VIDEO_ID", "abc123"),
        ("R2_ACCESS_KEY", "access"),
        ("R2_SECRET_KEY", "s3cr3t-value"),
        ("R2_ENDPOINT", "https://account.r2.cloudflarestorage.com/"),
        ("R2_BUCKET", "shorts"),
        ("DATABASE_URL", "postgres://user:pw@localhost/videos"),
    ])
}

fn lookup<'a>(
    vars: &'a HashMap<&'static str, &'static str>,
) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| vars.get(key).map(|v| v.to_string())
}

fn set_full_env() {
    for key in ALL_KEYS {
        env::remove_var(key);
    }
    for (key, value) in full_env() {
        env::set_var(key, value);
    }
}

#[test]
fn test_env_config_success_with_database_url() {
    let vars = full_env();
    let config = load_env_config(lookup(&vars)).expect("config should load");

    assert_eq!(config.video_id, "abc123");
    assert_eq!(config.storage.bucket, "shorts");
    assert_eq!(config.storage.region, "auto");
    assert_eq!(config.storage.public_url, None);
    assert_eq!(
        config.database,
        DatabaseConfig::Url("postgres://user:pw@localhost/videos".to_string())
    );
}

#[test]
fn test_env_config_reports_every_missing_key() {
    let vars = HashMap::from([("R2_BUCKET", "shorts"), ("R2_SECRET_KEY", "   ")]);
    let err = load_env_config(lookup(&vars)).unwrap_err();

    match err {
        UploaderError::Configuration { missing } => assert_eq!(
            missing,
            vec![
                "VIDEO_ID",
                "R2_ACCESS_KEY",
                "R2_SECRET_KEY",
                "R2_ENDPOINT",
                "DATABASE_URL"
            ]
        ),
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn test_env_config_discrete_database_params() {
    let mut vars = full_env();
    vars.remove("DATABASE_URL");
    vars.insert("DB_HOST", "db.internal");
    vars.insert("DB_PORT", "6543");
    vars.insert("DB_NAME", "videos");
    vars.insert("DB_USER", "uploader");
    vars.insert("DB_PASSWORD", "pw");

    let config = load_env_config(lookup(&vars)).expect("config should load");
    assert_eq!(
        config.database,
        DatabaseConfig::Params {
            host: "db.internal".to_string(),
            port: 6543,
            name: "videos".to_string(),
            user: "uploader".to_string(),
            password: "pw".to_string(),
        }
    );
}

#[test]
fn test_env_config_partial_database_params_lists_the_gaps() {
    let mut vars = full_env();
    vars.remove("DATABASE_URL");
    vars.insert("DB_HOST", "db.internal");
    vars.insert("DB_USER", "uploader");

    let err = load_env_config(lookup(&vars)).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("DB_NAME"), "{msg}");
    assert!(msg.contains("DB_PASSWORD"), "{msg}");
    assert!(!msg.contains("DB_HOST"), "{msg}");
}

#[test]
fn test_env_config_invalid_port() {
    let mut vars = full_env();
    vars.remove("DATABASE_URL");
    vars.insert("DB_HOST", "db.internal");
    vars.insert("DB_PORT", "not-a-port");
    vars.insert("DB_NAME", "videos");
    vars.insert("DB_USER", "uploader");
    vars.insert("DB_PASSWORD", "pw");

    let err = load_env_config(lookup(&vars)).unwrap_err();
    assert!(matches!(err, UploaderError::InvalidConfig { ref key, .. } if key == "DB_PORT"));
}

#[test]
fn test_debug_output_redacts_secrets() {
    let vars = full_env();
    let config = load_env_config(lookup(&vars)).expect("config should load");
    let debug = format!("{config:?}");
    assert!(!debug.contains("s3cr3t-value"), "{debug}");
    assert!(!debug.contains(":pw@"), "{debug}");
}

#[test]
#[serial]
fn test_load_config_defaults_without_file() {
    set_full_env();

    let config = load_config(None, &Overrides::default()).expect("config should load");
    let settings = &config.settings;

    assert_eq!(settings.shorts_dir, PathBuf::from("shorts"));
    assert_eq!(settings.extension, "mp4");
    assert_eq!(
        settings.sidecar_path,
        Some(PathBuf::from("temp/abc123/abc123_analysis.json"))
    );
    assert_eq!(settings.key_layout, KeyLayout::Flat);
    assert!(settings.verify_uploads);
    assert!(!settings.only_target_video);
    assert_eq!(
        settings.url_base,
        "https://account.r2.cloudflarestorage.com/shorts"
    );
}

#[test]
#[serial]
fn test_load_config_yaml_and_overrides() {
    set_full_env();
    env::set_var("R2_PUBLIC_URL", "https://pub.example.com/");

    let config_yaml = r#"
shorts_dir: ./rendered
extension: .MOV
sidecar_dir: ./analysis
key_layout: per_video
verify_uploads: true
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let overrides = Overrides {
        shorts_dir: Some(PathBuf::from("/tmp/override")),
        sidecar: None,
        only_target_video: true,
        no_verify: true,
    };
    let config = load_config(Some(config_file.path()), &overrides).expect("config should load");
    let settings = &config.settings;

    assert_eq!(settings.shorts_dir, PathBuf::from("/tmp/override"));
    assert_eq!(settings.extension, "MOV");
    assert_eq!(
        settings.sidecar_path,
        Some(PathBuf::from("./analysis/abc123/abc123_analysis.json"))
    );
    assert_eq!(settings.key_layout, KeyLayout::PerVideo);
    assert!(!settings.verify_uploads, "--no-verify wins over the file");
    assert!(settings.only_target_video);
    assert_eq!(settings.url_base, "https://pub.example.com");
    assert_eq!(
        settings.public_url("abc123/abc123_x_1.MOV"),
        "https://pub.example.com/abc123/abc123_x_1.MOV"
    );

    env::remove_var("R2_PUBLIC_URL");
}

#[test]
#[serial]
fn test_load_config_missing_env_fails_before_anything_else() {
    for key in ALL_KEYS {
        env::remove_var(key);
    }

    let err = load_config(None, &Overrides::default()).unwrap_err();
    let config_err = err
        .downcast_ref::<UploaderError>()
        .expect("should be an UploaderError");
    assert!(matches!(config_err, UploaderError::Configuration { missing } if missing.len() == 6));
}

#[test]
#[serial]
fn test_load_config_reports_missing_env_before_reading_the_file() {
    for key in ALL_KEYS {
        env::remove_var(key);
    }

    let err = load_config(
        Some(Path::new("/nonexistent/shorts-uploader.yaml")),
        &Overrides::default(),
    )
    .unwrap_err();

    match err.downcast_ref::<UploaderError>() {
        Some(UploaderError::Configuration { missing }) => {
            assert!(missing.iter().any(|key| key == "VIDEO_ID"), "{missing:?}");
            assert!(missing.iter().any(|key| key == "DATABASE_URL"), "{missing:?}");
        }
        _ => panic!("expected the missing-keys error, got: {err:#}"),
    }
}

#[test]
fn test_static_config_rejects_invalid_yaml() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();

    let err = load_static_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
fn test_static_config_rejects_unknown_keys() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"shorts_directory: oops\n").unwrap();

    assert!(load_static_config(config_file.path()).is_err());
}

#[test]
fn test_static_config_empty_file_is_all_defaults() {
    let config_file = NamedTempFile::new().expect("temp file");
    let config = load_static_config(config_file.path()).expect("empty file is fine");
    assert!(config.shorts_dir.is_none());
    assert!(config.key_layout.is_none());
}
