use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Conversion parameters for one request. Range checking belongs to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSettings {
    /// Extrusion height of the main body.
    pub thickness: f64,
    /// Height of the base slab under the body; 0 disables it.
    pub base_thickness: f64,
    /// Outline offset: positive grows, negative shrinks; below 0.001 it is a no-op.
    pub offset: f64,
    /// Simplification tolerance; 0 disables simplification.
    pub simplify_tolerance: f64,
    /// Closed outlines with a smaller area are dropped; 0 disables filtering.
    pub remove_islands_threshold: f64,
    /// Chamfer size on the top edge.
    pub bevel: f64,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            thickness: 5.0,
            base_thickness: 0.0,
            offset: 0.0,
            simplify_tolerance: 0.0,
            remove_islands_threshold: 0.0,
            bevel: 0.0,
        }
    }
}

impl ProfileSettings {
    /// Load settings from the provided path. Missing files yield the defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read(path).with_context(|| format!("read settings {}", path.display()))?;
        let settings: ProfileSettings =
            serde_json::from_slice(&data).context("deserialize settings")?;
        Ok(settings)
    }

    /// Persist the settings to the provided path, ensuring the directory exists.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create settings directory {}", parent.display()))?;
        }

        let data = serde_json::to_vec_pretty(self).context("serialize settings to JSON bytes")?;
        fs::write(path, data).with_context(|| format!("write settings {}", path.display()))
    }

    /// Resolve the default settings path (`<config dir>/svgsolid/settings.json`).
    pub fn default_settings_path() -> Result<PathBuf> {
        let config =
            dirs::config_dir().ok_or_else(|| anyhow!("could not determine config directory"))?;
        Ok(config.join("svgsolid").join("settings.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: ProfileSettings =
            serde_json::from_str(r#"{"thickness": 3.0, "removeIslandsThreshold": 2.5}"#)
                .expect("deserialize");
        assert_eq!(settings.thickness, 3.0);
        assert_eq!(settings.remove_islands_threshold, 2.5);
        assert_eq!(settings.base_thickness, 0.0);
        assert_eq!(settings.bevel, 0.0);
    }

    #[test]
    fn fields_serialize_in_camel_case() {
        let json = serde_json::to_string(&ProfileSettings::default()).expect("serialize");
        assert!(json.contains("\"baseThickness\""));
        assert!(json.contains("\"simplifyTolerance\""));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("svgsolid-settings-{}", ulid::Ulid::new()));
        let path = dir.join("nested").join("settings.json");
        let settings = ProfileSettings {
            thickness: 2.0,
            bevel: 0.5,
            ..ProfileSettings::default()
        };
        settings.save_to_path(&path).expect("save");
        let loaded = ProfileSettings::load_from_path(&path).expect("load");
        assert_eq!(loaded, settings);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("svgsolid-does-not-exist").join("settings.json");
        let loaded = ProfileSettings::load_from_path(&path).expect("load");
        assert_eq!(loaded, ProfileSettings::default());
    }
}
