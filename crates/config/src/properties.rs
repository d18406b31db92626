//! Flat property sources and their import into a [`Configuration`]

use crate::configuration::Configuration;
use std::{collections::BTreeMap, fmt, fs, path::Path};
use tracing::debug;
use types::{ConfigError, Result};

/// A flat set of uniquely named text properties, as read from a
/// `.properties` file
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `.properties` line format.
    ///
    /// Later occurrences of a key replace earlier ones.
    pub fn parse(input: &str) -> Result<Self> {
        let mut properties = Self::new();
        for (line_number, line) in logical_lines(input) {
            let (key, value) = split_key_value(&line);
            properties.set_property(unescape(key, line_number)?, unescape(value, line_number)?);
        }
        Ok(properties)
    }

    /// Read and parse a `.properties` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let properties = Self::parse(&content)?;
        debug!(path = %path.display(), count = properties.len(), "Loaded properties file");
        Ok(properties)
    }

    /// Serialize back into the `.properties` line format
    pub fn to_properties_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(&escape(key, true));
            out.push('=');
            out.push_str(&escape(value, false));
            out.push('\n');
        }
        out
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Properties")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Create a configuration holding every property as raw text.
///
/// No value is coerced here; malformed values surface on the first typed read.
pub fn create_configuration(properties: &Properties) -> Configuration {
    let mut configuration = Configuration::new();
    for (name, value) in properties.iter() {
        configuration.set_string(name, value);
    }
    debug!(count = configuration.len(), "Imported properties into configuration");
    configuration
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\x0c'
}

/// Joins continuation lines and drops comments and blank lines.
/// Each logical line keeps the number of its first natural line.
fn logical_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, natural) in input.lines().enumerate() {
        let text = natural.trim_start_matches(is_blank);
        let (line_number, mut buffer) = match pending.take() {
            Some(pending) => pending,
            None => {
                if text.is_empty() || text.starts_with(|c: char| c == '#' || c == '!') {
                    continue;
                }
                (index + 1, String::new())
            }
        };

        let trailing_backslashes = text.chars().rev().take_while(|&c| c == '\\').count();
        if trailing_backslashes % 2 == 1 {
            buffer.push_str(&text[..text.len() - 1]);
            pending = Some((line_number, buffer));
        } else {
            buffer.push_str(text);
            lines.push((line_number, buffer));
        }
    }

    if let Some(pending) = pending {
        lines.push(pending);
    }
    lines
}

/// Key ends at the first unescaped `=`, `:` or blank; one separator and the
/// blanks around it are skipped.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let rest = line[key_end..].trim_start_matches(is_blank);
    let rest = rest
        .strip_prefix(|c: char| c == '=' || c == ':')
        .unwrap_or(rest)
        .trim_start_matches(is_blank);
    (&line[..key_end], rest)
}

fn unescape(text: &str, line: usize) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => out.push(read_unicode_escape(&mut chars, line)?),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

fn read_hex4(chars: &mut std::str::Chars<'_>, line: usize) -> Result<u32> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.chars().count() != 4 {
        return Err(malformed_unicode(line));
    }
    u32::from_str_radix(&hex, 16).map_err(|_| malformed_unicode(line))
}

fn read_unicode_escape(chars: &mut std::str::Chars<'_>, line: usize) -> Result<char> {
    let code = read_hex4(chars, line)?;
    let code = if (0xD800..0xDC00).contains(&code) {
        if chars.next() != Some('\\') || chars.next() != Some('u') {
            return Err(malformed_unicode(line));
        }
        let low = read_hex4(chars, line)?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(malformed_unicode(line));
        }
        0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00)
    } else {
        code
    };
    char::from_u32(code).ok_or_else(|| malformed_unicode(line))
}

fn malformed_unicode(line: usize) -> ConfigError {
    ConfigError::Syntax {
        line,
        message: "malformed \\uxxxx escape".to_string(),
    }
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '=' | ':' | '#' | '!' if is_key || i == 0 => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
