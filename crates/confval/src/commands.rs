//! Subcommand implementations. Each returns the text to print.

use anyhow::{bail, Context, Result};
use config::{
    create_configuration, render, render_for_display, ConfigLoader, Configuration, Properties,
};
use plugin::{DirectoryPluginFinder, PluginFinder};
use std::{collections::BTreeMap, path::Path};
use tracing::{debug, warn};
use types::TypeTag;

/// Prefix of environment variables overriding YAML files
pub const ENV_PREFIX: &str = "CONFVAL_";

/// Load a `.properties` file, or a YAML file merged with `CONFVAL_*` variables
pub fn load_configuration(path: &Path) -> Result<Configuration> {
    let is_yaml = path
        .extension()
        .map_or(false, |ext| ext == "yaml" || ext == "yml");

    if is_yaml {
        ConfigLoader::load(path, ENV_PREFIX)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    } else {
        let properties = Properties::load(path)
            .with_context(|| format!("Failed to load properties from {}", path.display()))?;
        Ok(create_configuration(&properties))
    }
}

pub fn get(configuration: &Configuration, key: &str, type_tag: &str, reveal: bool) -> Result<String> {
    let tag: TypeTag = type_tag
        .parse()
        .with_context(|| format!("Invalid type tag '{}'", type_tag))?;
    debug!(key, tag = %tag, "Reading typed value");

    let value = configuration
        .get_value(key, &tag)?
        .with_context(|| format!("Key '{}' is not set", key))?;

    Ok(if reveal {
        render(&value)
    } else {
        render_for_display(&value)
    })
}

/// Entries with a declared type are coerced and re-rendered, secrets masked.
pub fn render_all(configuration: &Configuration, schema: &[String]) -> Result<String> {
    let schema = parse_schema(schema)?;
    for key in schema.keys() {
        if !configuration.contains_key(key) {
            warn!(key = %key, "Declared key is not set");
        }
    }

    let mut rendered = Properties::new();
    for (key, raw) in configuration.iter() {
        let text = match schema.get(key) {
            Some(tag) => configuration
                .get_value(key, tag)?
                .map(|value| render_for_display(&value))
                .unwrap_or_default(),
            None => raw.to_string(),
        };
        rendered.set_property(key, text);
    }
    Ok(rendered.to_properties_string())
}

pub fn plugins(dir: &Path, extension: &str) -> Result<String> {
    let descriptors = DirectoryPluginFinder::new(dir)
        .with_artifact_extension(extension)
        .find_plugins()
        .context("Plugin discovery failed")?;
    let mut json =
        serde_json::to_string_pretty(&descriptors).context("Failed to serialize plugins")?;
    json.push('\n');
    Ok(json)
}

fn parse_schema(entries: &[String]) -> Result<BTreeMap<String, TypeTag>> {
    let mut schema = BTreeMap::new();
    for entry in entries {
        let Some((key, tag)) = entry.split_once('=') else {
            bail!("Schema entry '{}' is not of the form KEY=TAG", entry);
        };
        let tag: TypeTag = tag
            .parse()
            .with_context(|| format!("Invalid type tag in schema entry '{}'", entry))?;
        schema.insert(key.trim().to_string(), tag);
    }
    Ok(schema)
}
