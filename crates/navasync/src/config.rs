//! Batch configuration
//!
//! One explicit struct handed to the orchestrator. Every field except
//! `site_dir` has a default matching the usual MkDocs Material output.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{NavAsyncError, Result};

pub const DEFAULT_NAV_FILE: &str = "nav.html";
pub const DEFAULT_SPINNER_FILE: &str = "bars-rotate-fade.svg";
pub const DEFAULT_NAV_TAG: &str = "ul";
pub const DEFAULT_NAV_ATTR: &str = "class";
pub const DEFAULT_NAV_VALUE: &str = "md-nav__list";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavAsyncConfig {
    /// Finished site output directory
    pub site_dir: PathBuf,
    /// Root-relative URL prefix the site is served under, e.g. `/en`
    pub base_path: String,
    /// File name of the extracted navigation at the site root
    pub nav_file_name: String,
    /// File name of the spinner asset at the site root
    pub spinner_file_name: String,
    /// Spinner bytes to install; the bundled SVG when unset
    pub spinner_source: Option<PathBuf>,
    /// Navigation signature: tag, attribute name and exact attribute value
    pub nav_tag: String,
    pub nav_attr: String,
    pub nav_value: String,
    /// Extension of page files, without the dot
    pub page_extension: String,
    /// Size of the rewrite worker pool
    pub workers: usize,
}

impl Default for NavAsyncConfig {
    fn default() -> Self {
        Self {
            site_dir: PathBuf::from("site"),
            base_path: String::new(),
            nav_file_name: DEFAULT_NAV_FILE.to_string(),
            spinner_file_name: DEFAULT_SPINNER_FILE.to_string(),
            spinner_source: None,
            nav_tag: DEFAULT_NAV_TAG.to_string(),
            nav_attr: DEFAULT_NAV_ATTR.to_string(),
            nav_value: DEFAULT_NAV_VALUE.to_string(),
            page_extension: "html".to_string(),
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl NavAsyncConfig {
    pub fn new(site_dir: impl Into<PathBuf>, base_path: impl Into<String>) -> Self {
        Self {
            site_dir: site_dir.into(),
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Load from a TOML file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| NavAsyncError::ConfigFile {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        toml::from_str(&content).map_err(|e| NavAsyncError::ConfigFile {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
    }

    /// Check everything that would otherwise fail halfway through a run
    pub fn validate(&self) -> Result<()> {
        if self.site_dir.as_os_str().is_empty() {
            return Err(NavAsyncError::Config("site_dir is required".to_string()));
        }
        if !self.site_dir.is_dir() {
            return Err(NavAsyncError::Config(format!(
                "site_dir is not a directory: {}",
                self.site_dir.display()
            )));
        }
        if self.workers == 0 {
            return Err(NavAsyncError::Config("workers must be >= 1".to_string()));
        }
        for (key, value) in [("nav_tag", &self.nav_tag), ("nav_attr", &self.nav_attr)] {
            if value.is_empty() || value.contains(char::is_whitespace) {
                return Err(NavAsyncError::Config(format!(
                    "{key} must be a single non-empty name, got {value:?}"
                )));
            }
        }
        for (key, value) in [
            ("nav_file_name", &self.nav_file_name),
            ("spinner_file_name", &self.spinner_file_name),
        ] {
            if value.is_empty() || value.contains(['/', '\\']) || value == ".." {
                return Err(NavAsyncError::Config(format!(
                    "{key} must be a plain file name, got {value:?}"
                )));
            }
        }
        if let Some(source) = &self.spinner_source {
            if !source.is_file() {
                return Err(NavAsyncError::Config(format!(
                    "spinner_source does not exist: {}",
                    source.display()
                )));
            }
        }
        Ok(())
    }

    pub fn nav_file_path(&self) -> PathBuf {
        self.site_dir.join(&self.nav_file_name)
    }

    pub fn spinner_file_path(&self) -> PathBuf {
        self.site_dir.join(&self.spinner_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NavAsyncConfig::new("/tmp/site", "/en");
        assert_eq!(config.nav_file_name, "nav.html");
        assert_eq!(config.nav_tag, "ul");
        assert_eq!(config.nav_value, "md-nav__list");
        assert!(config.workers >= 1);
        assert_eq!(config.nav_file_path(), PathBuf::from("/tmp/site/nav.html"));
    }

    #[test]
    fn test_validate() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NavAsyncConfig::new(dir.path(), "");
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(matches!(config.validate(), Err(NavAsyncError::Config(_))));
        config.workers = 2;

        config.nav_file_name = "../nav.html".to_string();
        assert!(config.validate().is_err());
        config.nav_file_name = "nav.html".to_string();

        config.site_dir = dir.path().join("missing");
        assert!(matches!(config.validate(), Err(NavAsyncError::Config(_))));
    }

    #[test]
    fn test_load_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nav-async.toml");
        std::fs::write(&path, "site_dir = \"out\"\nbase_path = \"/docs\"\nworkers = 3\n").unwrap();

        let config = NavAsyncConfig::load(&path).unwrap();
        assert_eq!(config.site_dir, PathBuf::from("out"));
        assert_eq!(config.base_path, "/docs");
        assert_eq!(config.workers, 3);
        assert_eq!(config.spinner_file_name, DEFAULT_SPINNER_FILE);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "workers = \"many\"").unwrap();
        assert!(matches!(
            NavAsyncConfig::load(&path),
            Err(NavAsyncError::ConfigFile { .. })
        ));
    }
}
