//! Configuration loader implementation

use crate::{configuration::Configuration, render::render};
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde_json::Value as JsonValue;
use std::{collections::BTreeMap, path::Path};
use tracing::debug;
use types::{ConfigError, Result, Value};

/// Loads YAML files and prefixed environment variables into a flat
/// [`Configuration`] of raw strings
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file and environment variables.
    ///
    /// `PREFIX_SECTION__KEY` overrides `section.key` from the file.
    pub fn load<P: AsRef<Path>>(config_path: P, env_prefix: &str) -> Result<Configuration> {
        let config_path = config_path.as_ref();

        // Check if config file exists
        if !config_path.exists() {
            return Err(ConfigError::FileNotFound {
                path: config_path.display().to_string(),
            });
        }

        debug!(path = %config_path.display(), env_prefix, "Loading configuration");
        let figment = Figment::new()
            .merge(Yaml::file(config_path))
            .merge(Env::prefixed(env_prefix).split("__"));

        Self::extract(figment)
    }

    /// Load configuration from a YAML string
    pub fn load_from_str(yaml_content: &str) -> Result<Configuration> {
        Self::extract(Figment::new().merge(Yaml::string(yaml_content)))
    }

    /// Write the raw content of `configuration` as a YAML mapping
    pub fn create_example<P: AsRef<Path>>(path: P, configuration: &Configuration) -> Result<()> {
        let path = path.as_ref();
        let entries: BTreeMap<&str, &str> = configuration.iter().collect();
        let yaml_content = serde_yaml::to_string(&entries)
            .map_err(|e| ConfigError::Load(format!("Failed to serialize configuration: {}", e)))?;

        std::fs::write(path, yaml_content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn extract(figment: Figment) -> Result<Configuration> {
        let tree: JsonValue = figment
            .extract()
            .map_err(|e| ConfigError::Load(format!("Failed to parse configuration: {}", e)))?;

        let mut configuration = Configuration::new();
        flatten("", &tree, &mut configuration);
        debug!(count = configuration.len(), "Configuration flattened");
        Ok(configuration)
    }
}

/// Nested mappings become dotted keys, everything else is stored in its
/// canonical text form
fn flatten(prefix: &str, node: &JsonValue, configuration: &mut Configuration) {
    match node {
        JsonValue::Object(children) => {
            for (name, child) in children {
                let key = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{}", prefix, name)
                };
                flatten(&key, child, configuration);
            }
        }
        other => {
            if let Some(value) = to_value(other) {
                configuration.set_string(prefix, render(&value));
            }
        }
    }
}

fn to_value(node: &JsonValue) -> Option<Value> {
    match node {
        JsonValue::Null => None,
        JsonValue::Bool(b) => Some(Value::Bool(*b)),
        JsonValue::Number(n) => Some(match n.as_i64() {
            Some(i) => Value::Int64(i),
            None => Value::Text(n.to_string()),
        }),
        JsonValue::String(s) => Some(Value::Text(s.clone())),
        JsonValue::Array(items) => Some(Value::List(items.iter().filter_map(to_value).collect())),
        JsonValue::Object(children) => Some(Value::Map(
            children
                .iter()
                .filter_map(|(k, v)| to_value(v).map(|v| (k.clone(), render(&v))))
                .collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    const YAML: &str = r#"
server:
  host: "0.0.0.0"
  port: 8080
  timeout: 30 s
log:
  level: info
  sample_rate: 0.25
bootstrap:
  servers:
    - "a:9092"
    - "b:9092"
labels:
  - env: prod
    zone: eu-1
optional: ~
"#;

    #[test]
    fn test_load_from_string() {
        let config = ConfigLoader::load_from_str(YAML).unwrap();

        assert_eq!(config.get_raw("server.host"), Some("0.0.0.0"));
        assert_eq!(config.get::<i32>("server.port").unwrap(), Some(8080));
        assert_eq!(
            config.get::<Duration>("server.timeout").unwrap(),
            Some(Duration::from_secs(30))
        );
        assert_eq!(config.get::<f64>("log.sample_rate").unwrap(), Some(0.25));
        assert_eq!(
            config.get::<Vec<String>>("bootstrap.servers").unwrap(),
            Some(vec!["a:9092".to_string(), "b:9092".to_string()])
        );
        assert!(!config.contains_key("optional"));
    }

    #[test]
    fn test_sequence_of_mappings() {
        let config = ConfigLoader::load_from_str(YAML).unwrap();
        let labels = config
            .get::<Vec<BTreeMap<String, String>>>("labels")
            .unwrap()
            .unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0]["env"], "prod");
        assert_eq!(labels[0]["zone"], "eu-1");
    }

    #[test]
    fn test_invalid_yaml() {
        let result = ConfigLoader::load_from_str("server: [unclosed");
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigLoader::load("/no/such/config.yaml", "CONFVAL_");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), YAML).unwrap();
        std::env::set_var("CONFVAL_LOADER_TEST_SERVER__PORT", "9999");

        let config = ConfigLoader::load(file.path(), "CONFVAL_LOADER_TEST_").unwrap();
        std::env::remove_var("CONFVAL_LOADER_TEST_SERVER__PORT");

        assert_eq!(config.get::<i32>("server.port").unwrap(), Some(9999));
        assert_eq!(config.get_raw("log.level"), Some("info"));
    }

    #[test]
    fn test_create_example() {
        let mut config = Configuration::new();
        config.set_string("server.port", "8080");
        config.set_string("bootstrap.servers", "'a,b',c");

        let temp_file = NamedTempFile::new().unwrap();
        ConfigLoader::create_example(temp_file.path(), &config).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("server.port"));

        let reloaded = ConfigLoader::load(temp_file.path(), "CONFVAL_EXAMPLE_TEST_").unwrap();
        assert_eq!(reloaded.get_raw("server.port"), Some("8080"));
        assert_eq!(
            reloaded.get::<Vec<String>>("bootstrap.servers").unwrap(),
            Some(vec!["a,b".to_string(), "c".to_string()])
        );
    }
}
