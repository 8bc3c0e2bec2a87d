use std::env;
use std::fs;
use std::path::Path;

use tastebud_core::config::{resolve_config_path, AppConfig, LoadOptions, ENV_OVERRIDES};
use toml::Value;

/// Where an effective value came from.
#[derive(Debug, PartialEq, Eq)]
enum Source {
    Env(&'static str),
    File(String),
    Default,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env(key) => write!(f, "env ({key})"),
            Self::File(path) => write!(f, "file ({path})"),
            Self::Default => f.write_str("default"),
        }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let file_path = resolve_config_path(None);
    let file_doc = file_path.as_deref().and_then(load_file_doc);

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (field, env_keys) in ENV_OVERRIDES {
        let Some(value) = config.field_value(field) else {
            continue;
        };
        let source = field_source(field, env_keys, file_doc.as_ref(), file_path.as_deref());
        lines.push(format!("- {field} = {value} (source: {source})"));
    }
    lines.join("\n")
}

fn load_file_doc(path: &Path) -> Option<Value> {
    fs::read_to_string(path).ok()?.parse::<Value>().ok()
}

fn field_source(
    field: &str,
    env_keys: &[&'static str],
    file_doc: Option<&Value>,
    file_path: Option<&Path>,
) -> Source {
    let set_key = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(key) = set_key {
        return Source::Env(*key);
    }

    match (file_doc, file_path) {
        (Some(doc), Some(path)) if contains_field(doc, field) => {
            Source::File(path.display().to_string())
        }
        _ => Source::Default,
    }
}

fn contains_field(root: &Value, field: &str) -> bool {
    field.split('.').try_fold(root, |current, key| current.get(key)).is_some()
}
