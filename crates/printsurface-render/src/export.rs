//! Export: one PNG per side plus the stored designs.

use crate::raster::{RasterImage, TinySkiaRenderer};
use crate::renderer::{RenderColors, RenderContext, Renderer, RendererError};
use base64::{Engine, engine::general_purpose::STANDARD};
use printsurface_core::{DesignSnapshot, SideId, Stage, StageError, WarningItem};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("Export blocked by {} error(s)", .0.len())]
    Blocked(Vec<WarningItem>),
}

/// Rendered artwork of one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideExport {
    pub side_id: SideId,
    /// `data:image/png;base64,...`
    pub raster_data_url: String,
    pub width_px: u32,
    pub height_px: u32,
}

/// Stored design of one side, for the host to persist and reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub side_id: SideId,
    pub snapshot: DesignSnapshot,
}

/// Everything handed to the host when the session exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub exports: Vec<SideExport>,
    pub snapshots: Vec<SnapshotEntry>,
    /// Advisory and blocking warnings across all sides at export time.
    pub warnings: Vec<WarningItem>,
}

impl ExportBundle {
    /// Check if any side has an error-severity warning.
    pub fn has_blocking(&self) -> bool {
        printsurface_core::preflight::has_blocking(&self.warnings)
    }
}

/// Export settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExportOptions {
    /// Refuse to export while any side has error-severity warnings.
    pub refuse_on_errors: bool,
    /// Only the paper color shows up in an export.
    pub colors: RenderColors,
}

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_png(image: &RasterImage) -> Result<Vec<u8>, png::EncodingError> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().inspect_err(|e| {
            log::error!("Failed to write PNG header: {e}");
        })?;
        writer.write_image_data(&image.rgba_data).inspect_err(|e| {
            log::error!("Failed to write PNG data: {e}");
        })?;
    }
    Ok(png_data)
}

/// Wrap PNG bytes in a data URL.
pub fn png_data_url(png_data: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png_data))
}

/// Commit the active side and export every side.
///
/// Rasters cover the full canvas including bleed and are never clipped by
/// the rounded-corner preview.
pub fn export_stage(stage: &mut Stage, options: ExportOptions) -> Result<ExportBundle, ExportError> {
    export_stage_with(stage, &mut TinySkiaRenderer::new(), options)
}

/// [`export_stage`] with a caller-supplied rasterizer.
pub fn export_stage_with<R>(
    stage: &mut Stage,
    renderer: &mut R,
    options: ExportOptions,
) -> Result<ExportBundle, ExportError>
where
    R: Renderer<Output = RasterImage>,
{
    let warnings: Vec<WarningItem> = stage
        .preflight_all_sides()?
        .into_iter()
        .flat_map(|report| report.warnings)
        .collect();
    if options.refuse_on_errors && printsurface_core::preflight::has_blocking(&warnings) {
        let blockers: Vec<_> = warnings.into_iter().filter(WarningItem::is_blocking).collect();
        log::warn!("Export refused: {} blocking warning(s)", blockers.len());
        return Err(ExportError::Blocked(blockers));
    }

    let snapshots: Vec<SnapshotEntry> = stage
        .export_snapshots()?
        .into_iter()
        .map(|s| SnapshotEntry {
            side_id: s.side_id,
            snapshot: s.snapshot,
        })
        .collect();

    let dpi = stage.spec().export_dpi();
    let mut exports = Vec::with_capacity(stage.spec().sides().len());
    for side in stage.spec().sides() {
        let tree = stage.side_tree(&side.id)?;
        let ctx = RenderContext::new(side.geometry(dpi), &tree).with_colors(options.colors);
        let image = renderer.render(&ctx)?;
        let png_data = encode_png(&image)?;
        log::info!(
            "Exported side '{}': {}x{} px, {} bytes",
            side.id,
            image.width,
            image.height,
            png_data.len()
        );
        exports.push(SideExport {
            side_id: side.id.clone(),
            raster_data_url: png_data_url(&png_data),
            width_px: image.width,
            height_px: image.height,
        });
    }

    Ok(ExportBundle {
        exports,
        snapshots,
        warnings,
    })
}
