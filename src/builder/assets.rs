//! Lookup of SVG and HTML files referenced from markdown

use crate::config::PmConfig;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Svg,
    Html,
}

/// A file found for an asset reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct AssetResolver {
    base_dir: PathBuf,
    static_dir: PathBuf,
    pms_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(config: &PmConfig) -> Self {
        Self {
            base_dir: config.base_dir.clone(),
            static_dir: config.static_dir(),
            pms_dir: config.pms_dir(),
        }
    }

    /// Paths tried for `src`, in order
    pub fn candidates(&self, src: &str, kind: AssetKind) -> Vec<PathBuf> {
        let src = src.trim_start_matches('/');
        let mut paths = vec![
            self.base_dir.join(src),
            self.static_dir.join(src.strip_prefix("static/").unwrap_or(src)),
        ];
        if kind == AssetKind::Svg {
            paths.push(self.pms_dir.join(src.strip_prefix("static/pm/").unwrap_or(src)));
        }
        paths
    }

    /// Content of the first readable candidate
    pub fn read(&self, src: &str, kind: AssetKind) -> Option<Asset> {
        for path in self.candidates(src, kind) {
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    log::debug!("resolved {} to {}", src, path.display());
                    return Some(Asset { path, content });
                }
                Err(e) => log::trace!("{}: {}", path.display(), e),
            }
        }
        None
    }
}
