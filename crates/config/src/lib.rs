//! Typed configuration handling
//!
//! Values are stored as raw text and coerced to a requested [`types::TypeTag`]
//! on read. This crate holds the coercer, the canonical renderer, the
//! quote-aware splitter they share, and the stores and loaders built on them.

pub mod configuration;
pub mod convert;
pub mod loader;
pub mod properties;
pub mod render;
pub mod splitter;

pub use configuration::{ConfigEnum, ConfigType, Configuration};
pub use convert::coerce;
pub use loader::ConfigLoader;
pub use properties::{create_configuration, Properties};
pub use render::{render, render_for_display};
pub use splitter::{escape_with_single_quote, split_escaped};
