use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::setup::DEFAULT_MENU_TEXT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overrides the PowerShell Core path found under `App Paths`.
    pub pwsh_path: Option<PathBuf>,
    pub popup: PopupBackend,
    pub menu_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PopupBackend {
    /// `rsc\messageBox.ps1` run through a shortcut link.
    #[default]
    Helper,
    /// The system `MessageBoxW`.
    Native,
}

/// Where the launcher keeps its settings and its daily log.
#[derive(Debug, Clone)]
pub struct LauncherDirs {
    pub settings: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pwsh_path: None,
            popup: PopupBackend::Helper,
            menu_text: DEFAULT_MENU_TEXT.into(),
        }
    }
}

pub fn launcher_dirs() -> Result<LauncherDirs> {
    let dirs = ProjectDirs::from("com", "cvmd2html", "MarkdownToHtml")
        .context("no home directory to keep launcher settings in")?;
    Ok(LauncherDirs {
        settings: dirs.config_dir().join("launcher.json"),
        log_dir: dirs.data_local_dir().join("logs"),
    })
}

/// Settings for this run. The log directory is left to the logger.
pub fn load() -> Result<Config> {
    Ok(read_or_create(&launcher_dirs()?.settings))
}

/// Read `settings`, writing the defaults there when it does not exist yet.
/// An unreadable file is left alone and the defaults are used.
pub fn read_or_create(settings: &Path) -> Config {
    let text = match fs::read_to_string(settings) {
        Ok(text) => text,
        Err(_) => {
            let cfg = Config::default();
            if let Err(e) = store(&cfg, settings) {
                tracing::warn!(path = %settings.display(), "could not write default settings: {:#}", e);
            }
            return cfg;
        }
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        tracing::warn!(path = %settings.display(), "ignoring malformed settings: {}", e);
        Config::default()
    })
}

/// Replace `settings` with `cfg` through a sibling temp file.
pub fn store(cfg: &Config, settings: &Path) -> Result<()> {
    if let Some(dir) = settings.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let staged = settings.with_extension("json.tmp");
    let mut file = fs::File::create(&staged)
        .with_context(|| format!("creating {}", staged.display()))?;
    file.write_all(&serde_json::to_vec_pretty(cfg)?)?;
    file.sync_all().ok();
    drop(file);
    fs::rename(&staged, settings).with_context(|| format!("replacing {}", settings.display()))?;
    Ok(())
}
