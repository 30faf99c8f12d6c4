//! Physical unit conversion between millimetres and device pixels.

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Resolution used when a spec does not state one.
pub const DEFAULT_DPI: f64 = 300.0;

/// Convert millimetres to whole pixels at the given resolution.
///
/// The result is rounded to the nearest pixel, so it is always integral
/// even though it is returned as `f64` for use in stage coordinates.
pub fn mm_to_px(mm: f64, dpi: f64) -> f64 {
    (mm * dpi / MM_PER_INCH).round()
}

/// Convert pixels back to millimetres at the given resolution.
///
/// This is the exact inverse of the unrounded conversion. Going through
/// [`mm_to_px`] first loses up to half a pixel, so a round trip is only
/// accurate to within `25.4 / dpi` mm.
pub fn px_to_mm(px: f64, dpi: f64) -> f64 {
    px * MM_PER_INCH / dpi
}

/// Largest error a `mm -> px -> mm` round trip can introduce at `dpi`.
pub fn round_trip_tolerance_mm(dpi: f64) -> f64 {
    MM_PER_INCH / dpi
}
