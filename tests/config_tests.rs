//! Settings resolution tests: defaults, settings file, environment, CLI flags.

use clap::Parser;
use coredrain::engine::{Cli, resolve_settings};
use coredrain::error::ConfigError;
use coredrain::utils::{
    DEFAULT_LIVENESS_PATH, EnvSnapshot, apply_file_to_settings, load_settings_file,
    parse_settings_file, resolve_level,
};
use coredrain::{MultipartSettings, Settings, StorageClass};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["coredrain"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

fn env_with_bucket(bucket: &str) -> EnvSnapshot {
    EnvSnapshot {
        bucket: Some(bucket.to_string()),
        ..Default::default()
    }
}

// --- defaults ---

#[test]
fn test_defaults_with_env_bucket() {
    let settings = resolve_settings(&cli(&["/dumps"]), &env_with_bucket("crash")).unwrap();

    assert_eq!(settings.watch_dir, PathBuf::from("/dumps"));
    assert_eq!(settings.bucket, "crash");
    assert_eq!(settings.liveness_path, PathBuf::from(DEFAULT_LIVENESS_PATH));
    assert_eq!(settings.region, None);
    assert_eq!(settings.local_store, None);
    assert!(!settings.sweep_existing);
    assert_eq!(settings.sweep_settle, Duration::from_secs(30));
    assert_eq!(settings.pool.workers, 4);
    assert_eq!(settings.pool.max_tasks_per_slot, 1);
    assert_eq!(settings.upload.confirm.delay, Duration::from_secs(5));
    assert_eq!(settings.upload.confirm.max_attempts, 5);
    assert_eq!(settings.upload.multipart.threshold, 104_857_600);
    assert_eq!(settings.upload.multipart.max_concurrency, 20);
    assert_eq!(settings.upload.storage_class, StorageClass::StandardIa);
}

#[test]
fn test_missing_bucket_rejected() {
    let err = resolve_settings(&cli(&["/dumps"]), &EnvSnapshot::default()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingBucket));
}

#[test]
fn test_blank_bucket_rejected() {
    let err = resolve_settings(&cli(&["/dumps", "--bucket", "  "]), &EnvSnapshot::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingBucket));
}

#[test]
fn test_zero_workers_rejected() {
    let err = resolve_settings(&cli(&["/dumps", "-w", "0"]), &env_with_bucket("b")).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "workers",
            ..
        }
    ));
}

#[test]
fn test_zero_confirm_attempts_rejected() {
    let err = resolve_settings(
        &cli(&["/dumps", "--confirm-attempts", "0"]),
        &env_with_bucket("b"),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "confirm_attempts",
            ..
        }
    ));
}

fn resolve_with_file(toml: &str) -> Result<Settings, ConfigError> {
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("coredrain.toml");
    std::fs::write(&config, toml).unwrap();
    let config_arg = config.to_string_lossy().into_owned();
    resolve_settings(&cli(&["/dumps", "-c", &config_arg]), &env_with_bucket("b"))
}

#[test]
fn test_part_size_below_store_minimum_rejected() {
    let err = resolve_with_file("[settings]\nmultipart_part_size = 1048576\n").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "multipart_part_size",
            ..
        }
    ));
}

#[test]
fn test_part_size_at_store_minimum_accepted() {
    let settings = resolve_with_file("[settings]\nmultipart_part_size = 5242880\n").unwrap();
    assert_eq!(settings.upload.multipart.part_size, 5 * 1024 * 1024);
}

// --- precedence ---

#[test]
fn test_cli_overrides_env() {
    let env = EnvSnapshot {
        bucket: Some("from-env".to_string()),
        region: Some("eu-west-1".to_string()),
        ..Default::default()
    };
    let settings = resolve_settings(
        &cli(&["/dumps", "--bucket", "from-cli", "--region", "us-east-2"]),
        &env,
    )
    .unwrap();

    assert_eq!(settings.bucket, "from-cli");
    assert_eq!(settings.region.as_deref(), Some("us-east-2"));
}

#[test]
fn test_file_then_env_then_cli() {
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("coredrain.toml");
    std::fs::write(
        &config,
        r#"
[settings]
bucket = "from-file"
region = "ap-south-1"
workers = 8
confirm_attempts = 9
sweep = true
"#,
    )
    .unwrap();
    let config_arg = config.to_string_lossy().into_owned();

    let settings = resolve_settings(
        &cli(&["/dumps", "-c", &config_arg, "--workers", "2"]),
        &env_with_bucket("from-env"),
    )
    .unwrap();

    assert_eq!(settings.bucket, "from-env");
    assert_eq!(settings.region.as_deref(), Some("ap-south-1"));
    assert_eq!(settings.pool.workers, 2);
    assert_eq!(settings.upload.confirm.max_attempts, 9);
    assert!(settings.sweep_existing);
}

#[test]
fn test_cli_flags_applied() {
    let settings = resolve_settings(
        &cli(&[
            "/dumps",
            "--local-store",
            "/tmp/store",
            "-l",
            "/run/ready",
            "--max-tasks-per-worker",
            "3",
            "--confirm-delay",
            "1",
            "--sweep-settle",
            "7",
            "--sweep",
        ]),
        &env_with_bucket("b"),
    )
    .unwrap();

    assert_eq!(settings.local_store, Some(PathBuf::from("/tmp/store")));
    assert_eq!(settings.liveness_path, PathBuf::from("/run/ready"));
    assert_eq!(settings.pool.max_tasks_per_slot, 3);
    assert_eq!(settings.upload.confirm.delay, Duration::from_secs(1));
    assert!(settings.sweep_existing);
    assert_eq!(settings.sweep_settle, Duration::from_secs(7));
}

#[test]
fn test_sweep_explicit_false() {
    let settings =
        resolve_settings(&cli(&["/dumps", "--sweep", "false"]), &env_with_bucket("b")).unwrap();
    assert!(!settings.sweep_existing);
}

// --- settings file ---

#[test]
fn test_settings_file_all_upload_keys() {
    let file = parse_settings_file(
        r#"
[settings]
storage_class = "GLACIER_IR"
multipart_threshold = 1024
multipart_concurrency = 4
multipart_part_size = 512
confirm_delay_secs = 2
queue_capacity = 16
"#,
        Path::new("inline.toml"),
    )
    .unwrap();
    let mut settings = Settings::new(Path::new("/dumps"));
    apply_file_to_settings(&file, &mut settings);

    assert_eq!(settings.upload.storage_class, StorageClass::GlacierIr);
    assert_eq!(settings.upload.multipart.threshold, 1024);
    assert_eq!(settings.upload.multipart.max_concurrency, 4);
    assert_eq!(settings.upload.multipart.part_size, 512);
    assert_eq!(settings.upload.confirm.delay, Duration::from_secs(2));
    assert_eq!(settings.pool.queue_capacity, 16);
}

#[test]
fn test_settings_file_empty_is_fine() {
    let file = parse_settings_file("", Path::new("empty.toml")).unwrap();
    let mut settings = Settings::new(Path::new("/dumps"));
    apply_file_to_settings(&file, &mut settings);
    assert_eq!(settings.pool.workers, 4);
}

#[test]
fn test_settings_file_unknown_key_rejected() {
    let err = parse_settings_file("[settings]\nbuckett = \"typo\"\n", Path::new("bad.toml"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("bad.toml"));
}

#[test]
fn test_settings_file_unknown_storage_class_rejected() {
    let err = parse_settings_file(
        "[settings]\nstorage_class = \"DEEP_FREEZE\"\n",
        Path::new("bad.toml"),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_missing_settings_file() {
    let tmp = tempfile::tempdir().unwrap();
    let err = load_settings_file(&tmp.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

// --- storage class ---

#[test]
fn test_storage_class_names() {
    for class in [
        StorageClass::Standard,
        StorageClass::StandardIa,
        StorageClass::OnezoneIa,
        StorageClass::GlacierIr,
    ] {
        assert_eq!(StorageClass::parse(class.as_str()), Some(class));
        assert_eq!(class.to_string(), class.as_str());
    }
    assert_eq!(StorageClass::default().as_str(), "STANDARD_IA");
    assert_eq!(StorageClass::parse("standard_ia"), None);
}

// --- multipart sizing ---

#[test]
fn test_part_size_small_file_uses_configured() {
    let multipart = MultipartSettings::default();
    assert_eq!(multipart.part_size_for(200 * 1024 * 1024), 8 * 1024 * 1024);
}

#[test]
fn test_part_size_grows_for_huge_file() {
    let multipart = MultipartSettings::default();
    let len: u64 = 200 * 1024 * 1024 * 1024;
    let part = multipart.part_size_for(len);
    assert!(part > multipart.part_size);
    assert!(len.div_ceil(part) <= 10_000);
}

// --- log level ---

#[test]
fn test_resolve_level() {
    assert_eq!(resolve_level(true, Some("error")), LevelFilter::Debug);
    assert_eq!(resolve_level(false, Some("warn")), LevelFilter::Warn);
    assert_eq!(resolve_level(false, Some("DEBUG")), LevelFilter::Debug);
    assert_eq!(resolve_level(false, Some("loud")), LevelFilter::Info);
    assert_eq!(resolve_level(false, None), LevelFilter::Info);
}
