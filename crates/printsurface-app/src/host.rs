//! Callbacks into whatever embeds the editor.

use crate::error::AppError;
use base64::{Engine, engine::general_purpose::STANDARD};
use printsurface_render::ExportBundle;
use std::fs;
use std::path::{Path, PathBuf};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// The surrounding product flow. Upload, cart and persistence live behind it.
pub trait EditorHost {
    /// Receive the rasters and snapshots of every side.
    fn on_export(&mut self, bundle: &ExportBundle) -> Result<(), AppError>;

    /// The editor is being torn down.
    fn on_close(&mut self) {}
}

/// Writes each export into a directory: `<side>.png`, `<side>.snapshot.json`
/// and a shared `warnings.json`.
#[derive(Debug, Clone)]
pub struct DirectoryHost {
    dir: PathBuf,
    written: Vec<PathBuf>,
    closed: bool,
}

impl DirectoryHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
            closed: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written by the most recent export.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn write(&mut self, name: &str, contents: &[u8]) -> Result<(), AppError> {
        let path = self.dir.join(name);
        fs::write(&path, contents).map_err(|e| AppError::io(&path, e))?;
        log::debug!("Wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

impl EditorHost for DirectoryHost {
    fn on_export(&mut self, bundle: &ExportBundle) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir).map_err(|e| AppError::io(&self.dir, e))?;
        self.written.clear();

        for export in &bundle.exports {
            let png_data = export
                .raster_data_url
                .strip_prefix(PNG_DATA_URL_PREFIX)
                .and_then(|payload| STANDARD.decode(payload).ok())
                .ok_or_else(|| AppError::MalformedExport(export.side_id.clone()))?;
            self.write(&format!("{}.png", export.side_id), &png_data)?;
        }
        for entry in &bundle.snapshots {
            self.write(
                &format!("{}.snapshot.json", entry.side_id),
                entry.snapshot.as_str().as_bytes(),
            )?;
        }
        let warnings = serde_json::to_vec_pretty(&bundle.warnings)?;
        self.write("warnings.json", &warnings)?;

        log::info!(
            "Exported {} side(s) to {}",
            bundle.exports.len(),
            self.dir.display()
        );
        Ok(())
    }

    fn on_close(&mut self) {
        self.closed = true;
        log::info!("Editor closed");
    }
}
