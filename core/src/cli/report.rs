use crate::slice::FinalizedSlice;
use std::fmt;

/// Text report formatter for a processed slice
pub struct TextReport<'a> {
    slice: &'a FinalizedSlice,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(slice: &'a FinalizedSlice) -> Self {
        Self { slice }
    }
}

fn or_na<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.slice.metadata();
        let metrics = self.slice.metrics();
        let dose = self.slice.dose();
        let truncation = self.slice.truncation();
        let (rows, cols) = self.slice.image().shape();

        writeln!(f, "CT Slice Contour")?;
        writeln!(f, "================")?;
        writeln!(f)?;
        writeln!(f, "File:           {}", self.slice.file_path().display())?;
        writeln!(f, "Image Type:     {}", metadata.image_type)?;
        writeln!(f, "Size:           {}x{}", rows, cols)?;
        writeln!(
            f,
            "Pixel Spacing:  {}",
            metadata
                .pixel_spacing
                .map_or_else(|| "n/a".to_string(), |s| format!("{} x {} mm", s.row, s.col))
        )?;
        writeln!(f, "Method:         {}", self.slice.contour().method())?;
        writeln!(f)?;

        writeln!(f, "Metrics")?;
        writeln!(f, "-------")?;
        writeln!(f, "Area:           {} px2", or_na(metrics.map(|m| m.area_px2)))?;
        writeln!(
            f,
            "Area:           {} mm2",
            or_na(metrics.and_then(|m| m.area_mm2).map(|a| format!("{:.1}", a)))
        )?;
        writeln!(
            f,
            "Mean Value:     {} HU",
            or_na(metrics.map(|m| format!("{:.1}", m.mean_intensity)))
        )?;
        writeln!(
            f,
            "WED:            {} cm",
            or_na(metrics.and_then(|m| m.wed_cm).map(|w| format!("{:.2}", w)))
        )?;
        writeln!(f, "Phantom:        {}", or_na(dose.map(|d| d.phantom)))?;
        writeln!(f, "CTDIvol:        {} mGy", or_na(self.slice.image().ctdi_vol()))?;
        writeln!(
            f,
            "SSDE:           {} mGy",
            or_na(dose.map(|d| format!("{:.2}", d.ssde_mgy)))
        )?;
        writeln!(f)?;

        writeln!(f, "Truncation")?;
        writeln!(f, "----------")?;
        writeln!(
            f,
            "Out of Scan:    {} ({} px)",
            truncation.is_out_of_scan, truncation.out_of_scan_px
        )?;
        writeln!(
            f,
            "Out of Edge:    {} {:?}",
            truncation.is_out_of_edge,
            truncation.out_of_edge_px.as_tuple()
        )?;
        writeln!(f, "Truncated:      {}", truncation.is_truncated())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SliceMetadata;
    use crate::calibration::CalibratedImage;
    use crate::contour::{ContourExtractor, TruncationDetector};
    use crate::slice::SliceRecord;
    use crate::types::{Phantom, PixelSpacing};
    use ndarray::Array2;
    use std::path::PathBuf;

    #[test]
    fn test_text_report_format() {
        let px = Array2::from_shape_fn((64, 64), |(r, c)| {
            if (12..52).contains(&r) && (12..52).contains(&c) {
                0_i16
            } else {
                -1000
            }
        });
        let image = CalibratedImage::new(
            px,
            Some(PixelSpacing::new(1.0, 1.0)),
            Some(Phantom::BODY_LABEL.to_string()),
            Some(10.0),
        );
        let slice = SliceRecord::new(PathBuf::from("IM1.dcm"), SliceMetadata::default(), image)
            .contour(&ContourExtractor::default())
            .flag_truncation(&TruncationDetector::default());

        let output = format!("{}", TextReport::new(&slice));
        assert!(output.contains("CT Slice Contour"));
        assert!(output.contains("File:           IM1.dcm"));
        assert!(output.contains("Area:           1600 px2"));
        assert!(output.contains(&format!("Phantom:        {}", Phantom::BODY_LABEL)));
        assert!(output.contains("Out of Edge:    false (0, 0, 0, 0)"));
        assert!(output.contains("Truncated:      false"));
    }

    #[test]
    fn test_unavailable_values() {
        let px = Array2::from_elem((16, 16), -1000_i16);
        let slice = SliceRecord::new(
            PathBuf::from("empty.dcm"),
            SliceMetadata::default(),
            CalibratedImage::new(px, None, None, None),
        )
        .contour(&ContourExtractor::default())
        .flag_truncation(&TruncationDetector::default());

        let output = format!("{}", TextReport::new(&slice));
        assert!(output.contains("Area:           n/a px2"));
        assert!(output.contains("SSDE:           n/a mGy"));
        assert!(output.contains("Pixel Spacing:  n/a"));
    }
}
