//! Plugin discovery
//!
//! A plugin root holds one directory per plugin; each plugin directory holds
//! the packaged artifacts that make up the plugin.

pub mod finder;

pub use finder::*;
pub use types::PluginError;
