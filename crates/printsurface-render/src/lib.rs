//! PrintSurface Render Library
//!
//! Renderer abstraction plus a CPU rasterizer built on tiny-skia, and the
//! export step that turns every side into a PNG data URL.

pub mod export;
mod raster;
mod renderer;

pub use export::{
    ExportBundle, ExportError, ExportOptions, SideExport, SnapshotEntry, encode_png, export_stage,
    export_stage_with, png_data_url,
};
pub use raster::{RasterImage, TinySkiaRenderer};
pub use renderer::{Layer, RenderColors, RenderContext, RenderResult, Renderer, RendererError};
