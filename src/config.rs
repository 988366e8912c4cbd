use crate::renderer::RenderOptions;
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Policy for `UID` values that are not UUIDs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierValidation {
    /// Accept any UID.
    #[default]
    Off,
    /// Skip cards whose UID is present but not a UUID.
    Strict,
}

/// Options required to run a conversion.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub identifier_validation: IdentifierValidation,
    pub include_notes: bool,
    /// Leave an existing note alone when it is not older than its source.
    pub skip_unchanged: bool,
    pub workers: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            identifier_validation: IdentifierValidation::Off,
            include_notes: false,
            skip_unchanged: false,
            workers: 1,
        }
    }
}

impl ConvertOptions {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            include_notes: self.include_notes,
        }
    }
}

/// Persisted preferences from `config.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub obsidian: Option<PathBuf>,
    #[serde(default)]
    pub folders: Vec<PathBuf>,
    #[serde(default)]
    pub ignore: Vec<PathBuf>,
    pub workers: Option<usize>,
    pub identifier_validation: Option<IdentifierValidation>,
    pub include_notes: Option<bool>,
    pub skip_unchanged: Option<bool>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vcf-to-obsidian/config.toml"))
}

pub fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        default_config_path().filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}
