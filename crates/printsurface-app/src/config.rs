//! Application configuration and file loading.

use crate::error::AppError;
use printsurface_core::{DesignSnapshot, EditorConfig, PrintSpec, SideId};
use printsurface_render::{ExportOptions, RenderColors};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub editor: EditorConfig,
    /// Where exported rasters and snapshots are written.
    pub output_dir: PathBuf,
    /// Refuse to export while any side has an OUTSIDE_TRIM error.
    pub refuse_export_on_errors: bool,
    pub colors: RenderColors,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            editor: EditorConfig::default(),
            output_dir: PathBuf::from("export"),
            refuse_export_on_errors: false,
            colors: RenderColors::default(),
        }
    }
}

impl AppConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let json = fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        serde_json::from_str(&json).map_err(|source| AppError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            refuse_on_errors: self.refuse_export_on_errors,
            colors: self.colors,
        }
    }
}

/// Read and validate a print spec JSON file.
pub fn load_spec(path: &Path) -> Result<PrintSpec, AppError> {
    let json = fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
    let spec = PrintSpec::from_json(&json)?;
    log::info!(
        "Loaded print spec '{}' with {} side(s)",
        spec.id(),
        spec.sides().len()
    );
    Ok(spec)
}

/// Read a stored side design. The content is validated when it is mounted.
pub fn load_snapshot(side_id: SideId, path: &Path) -> Result<(SideId, DesignSnapshot), AppError> {
    let json = fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
    Ok((side_id, DesignSnapshot::from_json(json)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("export"));
        assert!(!config.refuse_export_on_errors);
        assert_eq!(config.editor, EditorConfig::default());
    }

    #[test]
    fn test_load_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "refuse_export_on_errors": true, "editor": {{ "snap_threshold_px": 10.0 }} }}"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert!(config.refuse_export_on_errors);
        assert_eq!(config.editor.snap_threshold_px, 10.0);
        assert_eq!(config.output_dir, PathBuf::from("export"));
        assert!(config.export_options().refuse_on_errors);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load(Path::new("/nonexistent/printsurface.json")).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }

    #[test]
    fn test_load_malformed_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }
}
