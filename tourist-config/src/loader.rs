use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, anyhow};
use tracing::{debug, info};

use crate::{models::TouristConfig, validation::ConfigError};

pub const CONFIG_PATH_ENV: &str = "TOURIST_CONFIG_PATH";
pub const CONFIG_JSON_ENV: &str = "TOURIST_CONFIG_JSON";
pub const API_KEY_ENV: &str = "FLICKR_API_KEY";

const DEFAULT_FILES: &[&str] =
    &["tourist.toml", "tourist.json", "config/tourist.toml"];

/// Where the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// The environment inputs the loader reads, captured up front so loading
/// itself never touches process state.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub config_json: Option<String>,
    pub api_key: Option<String>,
    /// Directory the default config files are looked up in.
    pub base_dir: PathBuf,
}

impl EnvConfig {
    /// Read `.env` (when present) and the process environment.
    pub fn gather() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!("[config] loaded {}", path.display()),
            Err(err) if err.not_found() => {}
            Err(err) => debug!("[config] ignoring .env: {}", err),
        }

        Self {
            config_path: non_empty_var(CONFIG_PATH_ENV).map(PathBuf::from),
            config_json: non_empty_var(CONFIG_JSON_ENV),
            api_key: non_empty_var(API_KEY_ENV),
            base_dir: env::current_dir().unwrap_or_default(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: TouristConfig,
    pub source: ConfigSource,
    /// True when `FLICKR_API_KEY` replaced the key from the source.
    pub api_key_from_env: bool,
}

impl ConfigLoad {
    /// Load from the process environment and validate.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::load(&EnvConfig::gather())
    }

    /// Evaluation order:
    /// 1) `$TOURIST_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$TOURIST_CONFIG_JSON` (inline JSON),
    /// 3) the first default file that exists under `base_dir`,
    /// 4) defaults.
    ///
    /// `FLICKR_API_KEY` then overrides the API key, and the result is
    /// validated.
    pub fn load(env: &EnvConfig) -> anyhow::Result<Self> {
        Self::load_checked(env, TouristConfig::validate)
    }

    /// Like [`ConfigLoad::load`], but an empty API key is accepted. For
    /// commands that never search.
    pub fn load_offline(env: &EnvConfig) -> anyhow::Result<Self> {
        Self::load_checked(env, TouristConfig::validate_offline)
    }

    fn load_checked(
        env: &EnvConfig,
        validate: fn(&TouristConfig) -> Result<(), ConfigError>,
    ) -> anyhow::Result<Self> {
        let (mut config, source) = resolve(env)?;

        let api_key_from_env = match &env.api_key {
            Some(key) => {
                config.flickr.api_key = key.trim().to_string();
                true
            }
            None => false,
        };

        validate(&config)
            .with_context(|| format!("invalid configuration from {source:?}"))?;

        info!(
            "[config] loaded from {:?} (api key from env: {})",
            source, api_key_from_env
        );
        Ok(Self {
            config,
            source,
            api_key_from_env,
        })
    }
}

fn resolve(env: &EnvConfig) -> anyhow::Result<(TouristConfig, ConfigSource)> {
    if let Some(path) = &env.config_path {
        let config = load_from_file(path)?;
        return Ok((config, ConfigSource::EnvPath(path.clone())));
    }

    if let Some(raw) = &env.config_json {
        let config = parse_json(raw)
            .with_context(|| format!("failed to parse {CONFIG_JSON_ENV}"))?;
        return Ok((config, ConfigSource::EnvInline));
    }

    if let Some(path) = find_default_file(&env.base_dir) {
        let config = load_from_file(&path)?;
        return Ok((config, ConfigSource::File(path)));
    }

    Ok((TouristConfig::default(), ConfigSource::Default))
}

pub fn load_from_file(path: &Path) -> anyhow::Result<TouristConfig> {
    let contents = fs::read_to_string(path).with_context(|| {
        format!("failed to read config from {}", path.display())
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => parse_json(&contents)
            .with_context(|| format!("invalid config {}", path.display())),
        Some("toml") => toml::from_str(&contents).map_err(|err| {
            anyhow!("invalid config {}: {}", path.display(), err)
        }),
        _ => parse_from_str(&contents, &path.display().to_string()),
    }
}

/// TOML first, then JSON.
pub fn parse_from_str(
    contents: &str,
    origin: &str,
) -> anyhow::Result<TouristConfig> {
    toml::from_str(contents).or_else(|toml_err| {
        serde_json::from_str(contents).map_err(|json_err| {
            anyhow!(
                "failed to parse config {}: toml error: {}; json error: {}",
                origin,
                toml_err,
                json_err
            )
        })
    })
}

pub fn parse_json(raw: &str) -> anyhow::Result<TouristConfig> {
    serde_json::from_str(raw)
        .map_err(|err| anyhow!("invalid config json: {err}"))
}

fn find_default_file(base_dir: &Path) -> Option<PathBuf> {
    DEFAULT_FILES
        .iter()
        .map(|candidate| base_dir.join(candidate))
        .find(|path| path.exists())
}
