//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect typed configuration files and plugin directories
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Read a single key under a type
    Get {
        /// Configuration file (.properties, .yaml or .yml)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Key to read
        #[arg(short, long)]
        key: String,

        /// Type tag, e.g. `int`, `duration`, `list<memory>`, `enum(A|B)`
        #[arg(short = 't', long = "type")]
        type_tag: String,

        /// Print secrets instead of the mask
        #[arg(long)]
        reveal: bool,
    },

    /// Print every entry in canonical form
    Render {
        /// Configuration file (.properties, .yaml or .yml)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Declared type of a key as `key=tag`; undeclared keys print raw
        #[arg(short, long = "schema", value_name = "KEY=TAG")]
        schema: Vec<String>,
    },

    /// List plugins found under a plugin root as JSON
    Plugins {
        /// Plugin root directory
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        dir: PathBuf,

        /// Packaged artifact extension
        #[arg(long, default_value = plugin::DEFAULT_ARTIFACT_EXTENSION)]
        extension: String,
    },
}
