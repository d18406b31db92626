//! Shared types for typed configuration handling
//!
//! This crate contains the type tags, typed values and error types used
//! across the configuration, plugin and command line crates.

pub mod error;
pub mod memory;
pub mod password;
pub mod utils;
pub mod value;

// Re-export commonly used types
pub use error::{ConfigError, ConversionError, PluginError, Result, SECRET_MASK};
pub use memory::MemorySize;
pub use password::Password;
pub use value::{EnumType, EnumValue, TypeTag, Value};
