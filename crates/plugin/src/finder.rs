//! Directory based plugin discovery

use serde::Serialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, info};
use types::PluginError;

/// Default extension of packaged plugin artifacts
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "jar";

/// Everything needed to load a single plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDescriptor {
    /// Name of the plugin directory
    pub plugin_id: String,
    /// Artifacts of the plugin, ordered by file name
    pub resource_paths: Vec<PathBuf>,
    /// Class name patterns that must always come from the parent loader
    pub loader_exclude_patterns: Vec<String>,
}

/// Source of plugin descriptors
pub trait PluginFinder {
    fn find_plugins(&self) -> Result<Vec<PluginDescriptor>, PluginError>;
}

/// Finds plugins laid out as `<root>/<plugin id>/<artifact>`.
///
/// Regular files directly under the root and directories nested inside a
/// plugin directory are ignored.
#[derive(Debug, Clone)]
pub struct DirectoryPluginFinder {
    root: PathBuf,
    artifact_extension: String,
    loader_exclude_patterns: Vec<String>,
}

impl DirectoryPluginFinder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            artifact_extension: DEFAULT_ARTIFACT_EXTENSION.to_string(),
            loader_exclude_patterns: Vec::new(),
        }
    }

    pub fn with_artifact_extension(mut self, extension: impl Into<String>) -> Self {
        self.artifact_extension = extension.into();
        self
    }

    /// Patterns copied into every descriptor
    pub fn with_loader_exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.loader_exclude_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn describe(&self, plugin_dir: &Path) -> Result<PluginDescriptor, PluginError> {
        let mut artifacts = Vec::new();
        for entry in read_dir(plugin_dir)? {
            let path = entry.path();
            if is_file(&path)? && self.is_artifact(&path) {
                artifacts.push(path);
            }
        }

        if artifacts.is_empty() {
            return Err(PluginError::NoArtifacts {
                dir: plugin_dir.to_path_buf(),
            });
        }
        artifacts.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(PluginDescriptor {
            plugin_id: plugin_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            resource_paths: artifacts,
            loader_exclude_patterns: self.loader_exclude_patterns.clone(),
        })
    }

    fn is_artifact(&self, path: &Path) -> bool {
        path.extension()
            .map_or(false, |ext| ext.to_string_lossy() == self.artifact_extension)
    }
}

impl PluginFinder for DirectoryPluginFinder {
    fn find_plugins(&self) -> Result<Vec<PluginDescriptor>, PluginError> {
        debug!(root = %self.root.display(), "Scanning plugin root");

        let mut descriptors = Vec::new();
        for entry in read_dir(&self.root)? {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let descriptor = self.describe(&path)?;
            debug!(
                plugin_id = %descriptor.plugin_id,
                artifacts = descriptor.resource_paths.len(),
                "Found plugin"
            );
            descriptors.push(descriptor);
        }

        descriptors.sort_by(|a, b| a.plugin_id.cmp(&b.plugin_id));
        info!(root = %self.root.display(), count = descriptors.len(), "Plugin discovery finished");
        Ok(descriptors)
    }
}

fn read_dir(dir: &Path) -> Result<Vec<fs::DirEntry>, PluginError> {
    let io_error = |source: io::Error| PluginError::Io {
        path: dir.to_path_buf(),
        source,
    };
    fs::read_dir(dir)
        .map_err(io_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)
}

/// Follows symlinks; a dangling link is not a file.
fn is_file(path: &Path) -> Result<bool, PluginError> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Skipping dangling link");
            Ok(false)
        }
        Err(source) => Err(PluginError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
