mod json_schema;
mod schema;

pub use json_schema::{write_schema_file, JSON_SCHEMA};
pub use schema::{Config, Settings};

use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::registry::{builtin_operators, FieldType, OperatorId};

const CONFIG_ENV_VAR: &str = "QTREE_CONFIG";

/// where the config is read from, and whether the location was asked for
/// explicitly (a missing explicit file is an error)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub explicit: bool,
}

/// resolve the config location: `--config`, then `QTREE_CONFIG`, then `~/.qtree/config.json`
pub fn get_config_path(flag: Option<&Path>) -> ConfigLocation {
    resolve_path(flag, env::var(CONFIG_ENV_VAR).ok())
}

fn resolve_path(flag: Option<&Path>, env_value: Option<String>) -> ConfigLocation {
    if let Some(path) = flag {
        return ConfigLocation {
            path: path.to_path_buf(),
            explicit: true,
        };
    }

    if let Some(path) = env_value.filter(|p| !p.is_empty()) {
        return ConfigLocation {
            path: PathBuf::from(path),
            explicit: true,
        };
    }

    let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    ConfigLocation {
        path: base.join(".qtree").join("config.json"),
        explicit: false,
    }
}

/// load the config, falling back to the default when no file exists at the
/// default location
pub fn load(flag: Option<&Path>) -> Result<Config> {
    let location = get_config_path(flag);

    if !location.path.exists() {
        if location.explicit {
            return Err(anyhow!("config file not found: {}", location.path.display()));
        }
        log::debug!(
            "no config at {}, using built-in defaults",
            location.path.display()
        );
        return Ok(Config::default());
    }

    load_from(&location.path)
}

/// load a config file (JSON or JSON5)
pub fn load_from(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = json5::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    log::debug!(
        "loaded config from {}: {} fields",
        path.display(),
        config.fields.len()
    );
    Ok(config)
}

/// Verify configuration file and return a list of errors
pub fn verify(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(anyhow!("config file not found: {}", path.display()));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: Config = match json5::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            return Err(anyhow!("invalid config: {}", e));
        }
    };

    Ok(verify_config(&config))
}

/// collect every problem instead of stopping at the first, unlike registry
/// construction
pub fn verify_config(config: &Config) -> Vec<String> {
    let mut errors = Vec::new();

    let mut known: HashSet<OperatorId> = builtin_operators().into_iter().map(|op| op.id).collect();
    let mut extra_ids = HashSet::new();
    for (i, op) in config.operators.iter().enumerate() {
        let prefix = format!("operators[{}]", i);

        if !extra_ids.insert(op.id.clone()) {
            errors.push(format!("{}: duplicate operator '{}'", prefix, op.id));
        }
        if let Err(e) = op.check_shape() {
            errors.push(format!("{}: {}", prefix, e));
        }
        known.insert(op.id.clone());
    }

    let mut names = HashSet::new();
    for (i, field) in config.fields.iter().enumerate() {
        let prefix = format!("fields[{}]", i);

        if field.name.is_empty() {
            errors.push(format!("{}: field name is empty", prefix));
        }
        if !names.insert(field.name.as_str()) {
            errors.push(format!("{}: duplicate field '{}'", prefix, field.name));
        }
        if field.operators.is_empty() {
            errors.push(format!("{}: field '{}' declares no operators", prefix, field.name));
        }
        for op in &field.operators {
            if !known.contains(op) {
                errors.push(format!(
                    "{}: field '{}' uses unknown operator '{}'",
                    prefix, field.name, op
                ));
            }
        }
        if !field.options.is_empty() && field.field_type != FieldType::Enum {
            errors.push(format!(
                "{}: 'options' only apply to enum fields, '{}' is {}",
                prefix, field.name, field.field_type
            ));
        }
    }

    errors
}
