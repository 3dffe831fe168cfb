// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader generator configuration.
//!
//! Stored as RON. Every field has a default, so a config file only needs
//! the settings it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "shadercraft.ron";

/// Error while loading or saving a config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not valid RON for this config
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Config could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),

    /// Config was written by a newer version
    #[error("Config version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Highest supported version
        supported: u32,
    },
}

/// Settings for generating and writing shader sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Format version
    pub version: u32,
    /// Directory generated sources are written to
    pub output_dir: PathBuf,
    /// File name of the generated vertex shader
    pub vertex_file_name: String,
    /// File name of the generated fragment shader
    pub fragment_file_name: String,
    /// Vertex template override; the built-in template is used when unset
    pub vertex_template: Option<PathBuf>,
    /// Fragment template override; the built-in template is used when unset
    pub fragment_template: Option<PathBuf>,
    /// Spaces prepended to each line of injected node code
    pub indent_width: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            output_dir: PathBuf::from("generated"),
            vertex_file_name: "gen_shader.vs".to_string(),
            fragment_file_name: "gen_shader.ps".to_string(),
            vertex_template: None,
            fragment_template: None,
            indent_width: 4,
        }
    }
}

impl GeneratorConfig {
    /// Parse a config from RON text
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        if config.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }
        Ok(config)
    }

    /// Serialize to pretty RON text
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron(&text)?;
        tracing::debug!("Loaded generator config from {:?}", path);
        Ok(config)
    }

    /// Save to a config file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = self.to_ron()?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Path the vertex shader is written to inside `dir`
    pub fn vertex_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.vertex_file_name)
    }

    /// Path the fragment shader is written to inside `dir`
    pub fn fragment_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.fragment_file_name)
    }
}
