use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recommend::DEFAULT_LIMIT;

/// Most recommendations a single request may ask for.
pub const MAX_RECOMMENDATION_LIMIT: usize = 20;

/// Points at a config file outside the working directory.
pub const CONFIG_PATH_ENV: &str = "TASTEBUD_CONFIG";

/// Each settable field with the environment variables that override it, first
/// match wins.
pub const ENV_OVERRIDES: &[(&str, &[&str])] = &[
    ("database.url", &["TASTEBUD_DATABASE_URL"]),
    ("database.max_connections", &["TASTEBUD_DATABASE_MAX_CONNECTIONS"]),
    ("database.timeout_secs", &["TASTEBUD_DATABASE_TIMEOUT_SECS"]),
    ("recommendation.activation_threshold", &["TASTEBUD_RECOMMENDATION_ACTIVATION_THRESHOLD"]),
    ("recommendation.default_limit", &["TASTEBUD_RECOMMENDATION_DEFAULT_LIMIT"]),
    ("logging.level", &["TASTEBUD_LOGGING_LEVEL", "TASTEBUD_LOG_LEVEL"]),
    ("logging.format", &["TASTEBUD_LOGGING_FORMAT", "TASTEBUD_LOG_FORMAT"]),
];

#[derive(Clone, Debug, Serialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub recommendation: RecommendationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecommendationConfig {
    /// Recommendations run once the interest score is strictly above this.
    pub activation_threshold: u8,
    pub default_limit: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Takes precedence over `TASTEBUD_CONFIG` and the default locations.
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` does not exist")]
    MissingConfigFile(PathBuf),
    #[error("config file references unset environment variable `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated `${{...}}` in config file")]
    UnterminatedInterpolation,
    #[error("invalid value `{value}` in `{key}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://tastebud.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            recommendation: RecommendationConfig {
                activation_threshold: 30,
                default_limit: DEFAULT_LIMIT,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file, then environment overrides. The result
    /// is validated before it is returned.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = options.config_path.as_deref() {
            if !path.exists() {
                return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
            }
        }
        if let Some(path) = resolve_config_path(options.config_path.as_deref()) {
            config.apply_patch(read_patch(&path)?);
        }

        for (field, keys) in ENV_OVERRIDES {
            let found = keys.iter().find_map(|key| read_env(key).map(|value| (*key, value)));
            if let Some((key, value)) = found {
                config.set_field(field, key, &value)?;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        let ConfigPatch { database, recommendation, logging } = patch;

        if let Some(database) = database {
            self.database.url = database.url.unwrap_or(self.database.url.clone());
            self.database.max_connections =
                database.max_connections.unwrap_or(self.database.max_connections);
            self.database.timeout_secs =
                database.timeout_secs.unwrap_or(self.database.timeout_secs);
        }
        if let Some(recommendation) = recommendation {
            self.recommendation.activation_threshold = recommendation
                .activation_threshold
                .unwrap_or(self.recommendation.activation_threshold);
            self.recommendation.default_limit =
                recommendation.default_limit.unwrap_or(self.recommendation.default_limit);
        }
        if let Some(logging) = logging {
            self.logging.level = logging.level.unwrap_or(self.logging.level.clone());
            self.logging.format = logging.format.unwrap_or(self.logging.format);
        }
    }

    /// `source` names where `raw` came from, for error messages.
    fn set_field(&mut self, field: &str, source: &str, raw: &str) -> Result<(), ConfigError> {
        match field {
            "database.url" => self.database.url = raw.trim().to_string(),
            "database.max_connections" => {
                self.database.max_connections = parse_value(source, raw)?
            }
            "database.timeout_secs" => self.database.timeout_secs = parse_value(source, raw)?,
            "recommendation.activation_threshold" => {
                self.recommendation.activation_threshold = parse_value(source, raw)?
            }
            "recommendation.default_limit" => {
                self.recommendation.default_limit = parse_value(source, raw)?
            }
            "logging.level" => self.logging.level = raw.trim().to_string(),
            "logging.format" => self.logging.format = raw.parse()?,
            other => {
                return Err(ConfigError::Validation(format!("unknown config field `{other}`")))
            }
        }
        Ok(())
    }

    /// Rendered value of a dotted field name from [`ENV_OVERRIDES`].
    pub fn field_value(&self, field: &str) -> Option<String> {
        let value = match field {
            "database.url" => self.database.url.clone(),
            "database.max_connections" => self.database.max_connections.to_string(),
            "database.timeout_secs" => self.database.timeout_secs.to_string(),
            "recommendation.activation_threshold" => {
                self.recommendation.activation_threshold.to_string()
            }
            "recommendation.default_limit" => self.recommendation.default_limit.to_string(),
            "logging.level" => self.logging.level.clone(),
            "logging.format" => self.logging.format.as_str().to_string(),
            _ => return None,
        };
        Some(value)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_recommendation(&self.recommendation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Explicit path if it exists, else `$TASTEBUD_CONFIG`, else `tastebud.toml`,
/// else `config/tastebud.toml`.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    read_env(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .into_iter()
        .chain([PathBuf::from("tastebud.toml"), PathBuf::from("config/tastebud.toml")])
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let expanded = expand_env_refs(&raw)?;
    toml::from_str::<ConfigPatch>(&expanded)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Replaces every `${NAME}` with the value of `NAME`.
fn expand_env_refs(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let name = &after[..end];
        let value = env::var(name)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: name.to_string() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }
    output.push_str(rest);

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }
    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }
    if !(1..=300).contains(&database.timeout_secs) {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    Ok(())
}

fn validate_recommendation(recommendation: &RecommendationConfig) -> Result<(), ConfigError> {
    if recommendation.activation_threshold > 100 {
        return Err(ConfigError::Validation(
            "recommendation.activation_threshold must be in range 0..=100".to_string(),
        ));
    }
    if !(1..=MAX_RECOMMENDATION_LIMIT).contains(&recommendation.default_limit) {
        return Err(ConfigError::Validation(format!(
            "recommendation.default_limit must be in range 1..={MAX_RECOMMENDATION_LIMIT}"
        )));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    match logging.level.trim().to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    recommendation: Option<RecommendationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationPatch {
    activation_threshold: Option<u8>,
    default_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
