//! `essaymark.toml` loading.
//!
//! Every section is optional; an absent file means the built-in assignment,
//! rubric, model list and mark format.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use essaymark_ai::ModelConfig;
use essaymark_core::{Assignment, MarkFormat, Rubric};
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "essaymark.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Spreadsheet web-app URL. `GOOGLE_SHEET_URL` takes precedence.
    pub url: Option<String>,
    /// Longest wait for one log append before feedback is returned anyway.
    pub timeout_secs: u64,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 10,
        }
    }
}

impl SheetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub assignment: Assignment,
    pub model: ModelConfig,
    pub marking: MarkFormat,
    pub sheet: SheetConfig,
    /// JSON rubric table replacing the built-in one. Relative paths resolve
    /// against the config file's directory.
    pub rubric_file: Option<PathBuf>,
}

impl Config {
    /// Load `path`, or `./essaymark.toml` when present, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    debug!("no {DEFAULT_CONFIG_FILE}, using built-in configuration");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Config = toml::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;

        if let Some(rubric) = &config.rubric_file
            && rubric.is_relative()
            && let Some(dir) = path.parent()
        {
            config.rubric_file = Some(dir.join(rubric));
        }
        info!(path = %path.display(), assignment = %config.assignment.name, "loaded config");
        Ok(config)
    }

    /// The rubric table in force.
    pub fn rubric(&self) -> Result<Rubric> {
        let Some(path) = &self.rubric_file else {
            return Ok(Rubric::standard());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read rubric {}", path.display()))?;
        let rubric = Rubric::from_json(&json)
            .with_context(|| format!("invalid rubric {}", path.display()))?;
        info!(path = %path.display(), categories = rubric.categories.len(), "loaded rubric");
        Ok(rubric)
    }
}
