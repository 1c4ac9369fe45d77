use crate::{BufferUsage, SpirvVersion};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::{fs, io, path::Path};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

/// The two `OpMemoryModel` declarations a case may be generated under.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    EnumString,
    IntoStaticStr,
    EnumIter,
    Display,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MemoryModelKind {
    #[strum(to_string = "glsl450")]
    Glsl450,
    #[strum(to_string = "vulkan")]
    Vulkan,
}

impl MemoryModelKind {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config `{path}`: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("`element_count` must be between 1 and {max}, was {count}")]
    ElementCount { count: usize, max: usize },
}

/// Settings for one generation pass.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// When set, every assembled case is written below this directory.
    pub output_dir: Option<PathBuf>,
    /// Memory models to generate atomic cases for.
    pub memory_models: Vec<MemoryModelKind>,
    /// Elements per buffer for containers without a tighter byte budget.
    pub element_count: usize,
}

impl GeneratorConfig {
    /// Largest per-buffer element count; one invocation handles one element.
    pub const MAX_ELEMENT_COUNT: usize = 128;

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.element_count == 0 || self.element_count > Self::MAX_ELEMENT_COUNT {
            return Err(ConfigError::ElementCount {
                count: self.element_count,
                max: Self::MAX_ELEMENT_COUNT,
            });
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            memory_models: MemoryModelKind::iter().collect(),
            element_count: 16,
        }
    }
}

/// A buffer file written next to a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub file: String,
    pub usage: BufferUsage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<u32>,
    pub stride: usize,
    pub count: usize,
}

/// Describes one case on disk, so that an executor outside this workspace can run it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseManifest {
    pub name: String,
    pub program: String,
    pub spirv_version: SpirvVersion,
    pub capabilities: Vec<String>,
    pub spirv_extensions: Vec<String>,
    pub device_extensions: Vec<String>,
    pub features: Vec<String>,
    pub workgroups: [u32; 3],
    pub inputs: Vec<ResourceEntry>,
    pub outputs: Vec<ResourceEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub atomic_steps: Vec<String>,
}

impl CaseManifest {
    pub fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }

    pub fn read<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(io::Error::other)
    }
}
