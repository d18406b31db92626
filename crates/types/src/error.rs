//! Error types for typed configuration handling

use std::path::PathBuf;
use thiserror::Error;

/// Placeholder printed instead of secret values
pub const SECRET_MASK: &str = "******";

/// Errors raised while coercing a raw value into a typed value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// Text does not match the literal grammar of the target type
    #[error("Could not parse value '{value}' as {type_name}: {reason}")]
    Parse {
        value: String,
        type_name: String,
        reason: String,
    },

    /// Value is well formed but does not fit into the narrower target type
    #[error("Configuration value {value} overflows/underflows the {type_name} type")]
    Overflow { value: String, type_name: String },

    /// A list or map entry could not be split into its parts
    #[error("Malformed entry '{entry}': {reason}")]
    MalformedEntry { entry: String, reason: String },

    /// The requested type has no conversion rule
    #[error("Unsupported type: {tag}")]
    UnsupportedType { tag: String },
}

impl ConversionError {
    /// Create a parse error
    pub fn parse(
        value: impl Into<String>,
        type_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Parse {
            value: value.into(),
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a range overflow error
    pub fn overflow(value: impl ToString, type_name: impl Into<String>) -> Self {
        Self::Overflow {
            value: value.to_string(),
            type_name: type_name.into(),
        }
    }

    /// Create a malformed entry error
    pub fn malformed(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedEntry {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedEntry { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedType { .. })
    }

    /// Replace any user supplied content with the secret mask
    pub fn masked(self) -> Self {
        match self {
            Self::Parse {
                type_name, reason, ..
            } => Self::Parse {
                value: SECRET_MASK.to_string(),
                type_name,
                reason,
            },
            Self::Overflow { type_name, .. } => Self::Overflow {
                value: SECRET_MASK.to_string(),
                type_name,
            },
            Self::MalformedEntry { reason, .. } => Self::MalformedEntry {
                entry: SECRET_MASK.to_string(),
                reason,
            },
            unsupported @ Self::UnsupportedType { .. } => unsupported,
        }
    }
}

/// Configuration store and loader errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Stored text could not be read under the requested type
    #[error("Invalid configuration value for {key}: {source}")]
    Conversion {
        key: String,
        #[source]
        source: ConversionError,
    },

    /// File not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// I/O failure while reading or writing configuration files
    #[error("Configuration I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed line in a property source
    #[error("Syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Provider merge or extraction failure
    #[error("Configuration load error: {0}")]
    Load(String),
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Plugin discovery errors
#[derive(Error, Debug)]
pub enum PluginError {
    /// A plugin directory holds no packaged artifacts
    #[error("Plugin directory {} contains no plugin artifacts", dir.display())]
    NoArtifacts { dir: PathBuf },

    /// Directory listing failed
    #[error("Failed to read plugin path {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
