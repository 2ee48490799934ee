use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating [`AppSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported settings format: {0:?} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
    #[error("window {axis} must be positive")]
    InvalidDimension { axis: &'static str },
    #[error("application name must not be empty")]
    EmptyName,
}

/// Startup configuration consumed by the window and the frame scheduler.
///
/// These are the only recognized options; unknown keys in a settings file are
/// rejected rather than ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppSettings {
    /// Application name, also used as the window title.
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub resizable: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "niL".into(),
            width: 100,
            height: 100,
            vsync: true,
            resizable: false,
        }
    }
}

impl AppSettings {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            ..Self::default()
        }
    }

    /// Check the invariants a window collaborator relies on.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.name.trim().is_empty() {
            return Err(SettingsError::EmptyName);
        }
        if self.width == 0 {
            return Err(SettingsError::InvalidDimension { axis: "width" });
        }
        if self.height == 0 {
            return Err(SettingsError::InvalidDimension { axis: "height" });
        }
        Ok(())
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_yaml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_str(s: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML or JSON file, picked by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let settings = match extension(path).as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&data)?,
            "json" => Self::from_json_str(&data)?,
            other => return Err(SettingsError::UnsupportedFormat(other.to_string())),
        };
        tracing::debug!(path = %path.display(), ?settings, "settings loaded");
        Ok(settings)
    }

    /// Save settings to a YAML or JSON file, picked by extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let data = match extension(path).as_str() {
            "yaml" | "yml" => serde_yaml::to_string(self)?,
            "json" => serde_json::to_string_pretty(self)?,
            other => return Err(SettingsError::UnsupportedFormat(other.to_string())),
        };
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, SettingsError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_small_untitled_window() {
        let s = AppSettings::default();
        assert_eq!(s.name, "niL");
        assert_eq!((s.width, s.height), (100, 100));
        assert!(s.vsync);
        assert!(!s.resizable);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let s = AppSettings::from_yaml_str("name: RPG Project\nwidth: 800\nheight: 460\n").unwrap();
        assert_eq!(s.name, "RPG Project");
        assert_eq!(s.width, 800);
        assert_eq!(s.height, 460);
        assert!(s.vsync);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppSettings::from_yaml_str("name: x\nfullscreen: true\n").unwrap_err();
        assert!(matches!(err, SettingsError::Yaml(_)));
    }

    #[test]
    fn zero_dimension_is_invalid() {
        let err = AppSettings::from_json_str(r#"{"width": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidDimension { axis: "width" }
        ));
    }

    #[test]
    fn empty_name_is_invalid() {
        let s = AppSettings::new("  ", 10, 10);
        assert!(matches!(s.validate(), Err(SettingsError::EmptyName)));
    }

    #[test]
    fn save_and_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut s = AppSettings::new("Arcane", 1280, 720);
        s.resizable = true;
        s.save(&path).unwrap();

        let loaded = AppSettings::load(&path).unwrap();
        assert_eq!(loaded, s);
    }

    #[test]
    fn save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let s = AppSettings::new("Arcane", 640, 480);
        s.save(&path).unwrap();
        assert_eq!(AppSettings::load(&path).unwrap(), s);
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "name = 'x'").unwrap();
        assert!(matches!(
            AppSettings::load(&path),
            Err(SettingsError::UnsupportedFormat(ext)) if ext == "toml"
        ));
    }

    #[test]
    fn aspect_ratio() {
        let s = AppSettings::new("a", 800, 400);
        assert_eq!(s.aspect_ratio(), 2.0);
    }
}
