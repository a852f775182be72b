use std::{fs, path::PathBuf};

use tempfile::tempdir;
use tourist_config::{ConfigLoad, ConfigSource, EnvConfig, TouristApp};

fn env_in(base_dir: PathBuf) -> EnvConfig {
    EnvConfig {
        api_key: Some("test-key".into()),
        base_dir,
        ..EnvConfig::default()
    }
}

#[test]
fn defaults_apply_when_nothing_is_configured() {
    let dir = tempdir().expect("tempdir");

    let loaded =
        ConfigLoad::load(&env_in(dir.path().to_path_buf())).expect("load");

    assert_eq!(loaded.source, ConfigSource::Default);
    assert!(loaded.api_key_from_env);
    assert_eq!(loaded.config.flickr.api_key, "test-key");
    assert_eq!(loaded.config.acquisition.photos_per_pin, 10);
    assert_eq!(loaded.config.flickr.per_page, 100);
}

#[test]
fn default_file_is_found_under_the_base_dir() {
    let dir = tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("config")).expect("mkdir");
    fs::write(
        dir.path().join("config/tourist.toml"),
        "[acquisition]\nphotos_per_pin = 4\nseed = 9\n",
    )
    .expect("write");

    let loaded =
        ConfigLoad::load(&env_in(dir.path().to_path_buf())).expect("load");

    assert_eq!(
        loaded.source,
        ConfigSource::File(dir.path().join("config/tourist.toml"))
    );
    assert_eq!(loaded.config.acquisition.photos_per_pin, 4);
    assert_eq!(loaded.config.acquisition.seed, Some(9));
}

#[test]
fn explicit_path_beats_inline_json_and_default_files() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("tourist.toml"),
        "[acquisition]\nphotos_per_pin = 2\n",
    )
    .expect("write");
    let explicit = dir.path().join("custom.json");
    fs::write(
        &explicit,
        r#"{"flickr": {"api_key": "from-file", "half_width": 0.25}}"#,
    )
    .expect("write");

    let env = EnvConfig {
        config_path: Some(explicit.clone()),
        config_json: Some(r#"{"acquisition": {"photos_per_pin": 3}}"#.into()),
        api_key: None,
        base_dir: dir.path().to_path_buf(),
    };
    let loaded = ConfigLoad::load(&env).expect("load");

    assert_eq!(loaded.source, ConfigSource::EnvPath(explicit));
    assert!(!loaded.api_key_from_env);
    assert_eq!(loaded.config.flickr.api_key, "from-file");
    assert_eq!(loaded.config.flickr.half_width, 0.25);
    assert_eq!(loaded.config.acquisition.photos_per_pin, 10);
}

#[test]
fn inline_json_beats_default_files() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("tourist.toml"),
        "[acquisition]\nphotos_per_pin = 2\n",
    )
    .expect("write");

    let env = EnvConfig {
        config_json: Some(r#"{"acquisition": {"photos_per_pin": 3}}"#.into()),
        ..env_in(dir.path().to_path_buf())
    };
    let loaded = ConfigLoad::load(&env).expect("load");

    assert_eq!(loaded.source, ConfigSource::EnvInline);
    assert_eq!(loaded.config.acquisition.photos_per_pin, 3);
}

#[test]
fn missing_key_and_bad_values_fail_validation() {
    let dir = tempdir().expect("tempdir");

    let env = EnvConfig {
        base_dir: dir.path().to_path_buf(),
        ..EnvConfig::default()
    };
    let err = ConfigLoad::load(&env).expect_err("no api key");
    assert!(format!("{err:#}").contains("api_key"));

    let env = EnvConfig {
        config_json: Some(
            r#"{"acquisition": {"download_concurrency": 0}}"#.into(),
        ),
        ..env_in(dir.path().to_path_buf())
    };
    let err = ConfigLoad::load(&env).expect_err("zero concurrency");
    assert!(format!("{err:#}").contains("download_concurrency"));
}

#[test]
fn malformed_inline_json_is_reported() {
    let dir = tempdir().expect("tempdir");
    let env = EnvConfig {
        config_json: Some("{not json".into()),
        ..env_in(dir.path().to_path_buf())
    };
    let err = ConfigLoad::load(&env).expect_err("bad json");
    assert!(format!("{err:#}").contains("TOURIST_CONFIG_JSON"));
}

#[tokio::test]
async fn app_opens_its_store_under_the_configured_root() {
    let dir = tempdir().expect("tempdir");
    let mut loaded =
        ConfigLoad::load(&env_in(dir.path().to_path_buf())).expect("load");
    loaded.config.store.root = dir.path().join("cache");

    let app = TouristApp::build(&loaded.config).await.expect("build");
    assert_eq!(app.store.observe().pin_count(), 0);
    assert_eq!(app.lifecycle.acquisition().settings().photos_per_pin, 10);
}

#[test]
fn offline_load_accepts_a_missing_api_key() {
    let dir = tempdir().expect("tempdir");
    let env = EnvConfig {
        base_dir: dir.path().to_path_buf(),
        ..EnvConfig::default()
    };

    let err = ConfigLoad::load(&env).expect_err("key is required to search");
    assert!(format!("{err:#}").contains("flickr.api_key"));

    let loaded = ConfigLoad::load_offline(&env).expect("offline load");
    assert_eq!(loaded.source, ConfigSource::Default);
    assert!(loaded.config.flickr.api_key.is_empty());
}
