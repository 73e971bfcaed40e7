use crate::error::{Error, Result};
use crate::host::CloudinaryHost;
use crate::qrcode::DisplaySize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_cloud_name")]
    pub cloud_name: String,

    #[serde(default = "default_upload_preset")]
    pub upload_preset: String,

    /// Overrides the upload URL derived from `cloud_name`
    #[serde(default)]
    pub upload_endpoint: Option<String>,

    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Prefix of every share link
    #[serde(default = "default_origin")]
    pub origin: String,

    #[serde(default = "default_fg")]
    pub default_fg: String,

    #[serde(default = "default_bg")]
    pub default_bg: String,

    #[serde(default)]
    pub compact: bool,

    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_cloud_name() -> String {
    "dlvjvskje".to_string()
}

fn default_upload_preset() -> String {
    "qr code generator".to_string()
}

fn default_database_file() -> String {
    "qrshare.db".to_string()
}

fn default_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_fg() -> String {
    "#000000".to_string()
}

fn default_bg() -> String {
    "#ffffff".to_string()
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cloud_name: default_cloud_name(),
            upload_preset: default_upload_preset(),
            upload_endpoint: None,
            database_file: default_database_file(),
            origin: default_origin(),
            default_fg: default_fg(),
            default_bg: default_bg(),
            compact: false,
            export_dir: default_export_dir(),
        }
    }
}

impl Settings {
    pub fn upload_endpoint(&self) -> String {
        self.upload_endpoint
            .clone()
            .unwrap_or_else(|| CloudinaryHost::endpoint_for(&self.cloud_name))
    }

    pub fn display_size(&self) -> DisplaySize {
        if self.compact {
            DisplaySize::Compact
        } else {
            DisplaySize::Regular
        }
    }

    /// Reject values that would only fail later, mid-workflow.
    pub fn validate(&self) -> Result<()> {
        if self.cloud_name.trim().is_empty() {
            return Err(Error::Config("cloud_name must not be empty".to_string()));
        }
        if self.upload_preset.trim().is_empty() {
            return Err(Error::Config("upload_preset must not be empty".to_string()));
        }
        if !(self.origin.starts_with("http://") || self.origin.starts_with("https://")) {
            return Err(Error::Config(format!(
                "origin '{}' must be an http(s) URL",
                self.origin
            )));
        }
        self.default_fg
            .parse::<crate::color::Color>()
            .and(self.default_bg.parse::<crate::color::Color>())
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(())
    }
}

/// Platform data directory for the app: `$XDG_DATA_HOME/qrshare`, then
/// `~/.local/share/qrshare`, then the working directory.
pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("XDG_DATA_HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir).join("qrshare");
    }
    if let Some(home) = std::env::var_os("HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(home).join(".local").join("share").join("qrshare");
    }
    PathBuf::from(".")
}

pub struct SettingsManager {
    settings: Mutex<Settings>,
    path: PathBuf,
}

impl SettingsManager {
    /// Load `<app_data_dir>/settings.json`, falling back to defaults when
    /// the file is missing or unreadable.
    pub fn new(app_data_dir: &Path) -> Self {
        std::fs::create_dir_all(app_data_dir).ok();
        let path = app_data_dir.join("settings.json");

        let settings = if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    log::warn!("Ignoring malformed {}: {}", path.display(), e);
                    Settings::default()
                }),
                Err(_) => Settings::default(),
            }
        } else {
            Settings::default()
        };

        Self {
            settings: Mutex::new(settings),
            path,
        }
    }

    /// Load an explicit settings file; unlike [`SettingsManager::new`] a
    /// malformed file is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings =
            serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            settings: Mutex::new(settings),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Settings {
        match self.settings.lock() {
            Ok(settings) => settings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, new_settings: Settings) -> Result<()> {
        self.update_field(|s| *s = new_settings).map(|_| ())
    }

    pub fn update_field<F>(&self, updater: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self
            .settings
            .lock()
            .map_err(|_| Error::Config("settings lock poisoned".to_string()))?;
        let mut updated = settings.clone();
        updater(&mut updated);
        updated.validate()?;

        let json =
            serde_json::to_string_pretty(&updated).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(&self.path, json)?;

        *settings = updated;
        Ok(settings.clone())
    }
}
