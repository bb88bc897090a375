//! Build configuration
//!
//! Directories the builder reads included assets and codex scripts from. The
//! file format is TOML; settings may live at the top level or in a `[pm]`
//! table so they can share a file with other tools.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmConfig {
    /// Root of the content tree
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Static assets (defaults to `<base_dir>/static`)
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// Codex scripts (defaults to `<base_dir>/files`)
    #[serde(default)]
    pub files_dir: Option<PathBuf>,

    /// PM assets used as the last SVG lookup (defaults to `<base_dir>/pms`)
    #[serde(default)]
    pub pms_dir: Option<PathBuf>,

    /// Search path for `{% include %}` in HTML includes (defaults to `<base_dir>/templates`)
    #[serde(default)]
    pub template_dirs: Vec<PathBuf>,

    /// Corrector harness used to compose codex scripts (built-in when unset)
    #[serde(default)]
    pub codex_template: Option<PathBuf>,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for PmConfig {
    fn default() -> Self {
        Self::with_base_dir(default_base_dir())
    }
}

impl PmConfig {
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            static_dir: None,
            files_dir: None,
            pms_dir: None,
            template_dirs: Vec::new(),
            codex_template: None,
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        // relative directories are taken relative to the config file
        if config.base_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.base_dir = parent.join(&config.base_dir);
            }
        }
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let full_config: toml::Value = toml::from_str(content)?;
        let section = full_config.get("pm").cloned().unwrap_or(full_config);
        let config: PmConfig = section.try_into()?;
        Ok(config)
    }

    pub fn static_dir(&self) -> PathBuf {
        self.static_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("static"))
    }

    pub fn files_dir(&self) -> PathBuf {
        self.files_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("files"))
    }

    pub fn pms_dir(&self) -> PathBuf {
        self.pms_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("pms"))
    }

    pub fn template_dirs(&self) -> Vec<PathBuf> {
        if self.template_dirs.is_empty() {
            vec![self.base_dir.join("templates")]
        } else {
            self.template_dirs.clone()
        }
    }
}
