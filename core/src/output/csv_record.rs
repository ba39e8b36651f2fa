use crate::error::Result;
use crate::slice::FinalizedSlice;
use serde::Serialize;
use std::path::Path;

/// One CSV row per slice
///
/// Unavailable values serialize as empty cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceRow {
    pub filepath: String,
    pub filename: String,
    pub contour_method: String,
    pub area_px2: Option<usize>,
    pub area_mm2: Option<f64>,
    pub mpv_hu: Option<f64>,
    pub wed_cm: Option<f64>,
    pub phantom: String,
    pub ctdi_vol: Option<f64>,
    pub ssde: Option<f64>,
    pub is_out_of_scan: bool,
    pub out_of_scan_px: usize,
    pub is_out_of_edge: bool,
    /// `(left, right, top, bottom)`
    pub out_of_edge_px: String,
    pub is_truncated: bool,
}

impl SliceRow {
    pub fn from_slice(slice: &FinalizedSlice) -> Self {
        let metrics = slice.metrics();
        let dose = slice.dose();
        let truncation = slice.truncation();

        Self {
            filepath: slice.file_path().display().to_string(),
            filename: slice.file_name(),
            contour_method: slice.contour().method().to_string(),
            area_px2: metrics.map(|m| m.area_px2),
            area_mm2: metrics.and_then(|m| m.area_mm2),
            mpv_hu: metrics.map(|m| m.mean_intensity),
            wed_cm: metrics.and_then(|m| m.wed_cm),
            phantom: dose
                .map(|d| d.phantom.label().to_string())
                .unwrap_or_default(),
            ctdi_vol: slice.image().ctdi_vol(),
            ssde: dose.map(|d| d.ssde_mgy),
            is_out_of_scan: truncation.is_out_of_scan,
            out_of_scan_px: truncation.out_of_scan_px,
            is_out_of_edge: truncation.is_out_of_edge,
            out_of_edge_px: format!("{:?}", truncation.out_of_edge_px.as_tuple()),
            is_truncated: truncation.is_truncated(),
        }
    }
}

/// Writes the header and the single row of a slice
pub fn write_csv(slice: &FinalizedSlice, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.serialize(SliceRow::from_slice(slice))?;
    writer.flush()?;
    Ok(())
}
