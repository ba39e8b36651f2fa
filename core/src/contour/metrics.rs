//! Geometry and dose metrics of a body contour
//!
//! Water-equivalent diameter and size-specific dose estimate follow AAPM
//! Report 220. Several surviving regions are measured as one combined region.

use crate::calibration::CalibratedImage;
use crate::types::Phantom;
use ndarray::ArrayView2;
use std::f64::consts::PI;

/// Measurements taken under the final body mask
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ContourMetrics {
    /// Pixel count of the mask
    pub area_px2: usize,
    /// Mean calibrated intensity under the mask (HU)
    pub mean_intensity: f64,
    /// Physical area, absent without pixel spacing
    pub area_mm2: Option<f64>,
    /// Water-equivalent diameter (cm), absent without a physical area
    pub wed_cm: Option<f64>,
}

/// Size-specific dose estimate for one slice
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct DoseEstimate {
    pub phantom: Phantom,
    /// Reference dose index (CTDIvol, mGy)
    pub ctdi_vol: f64,
    /// SSDE (mGy)
    pub ssde_mgy: f64,
}

/// Derives area, mean intensity, WED and SSDE from a contour
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Measures the mask over the calibrated image
    ///
    /// # Returns
    ///
    /// `None` when the mask is empty.
    pub fn measure(mask: ArrayView2<bool>, image: &CalibratedImage) -> Option<ContourMetrics> {
        let (area_px2, sum) = mask
            .iter()
            .zip(image.pixels().iter())
            .filter(|(&inside, _)| inside)
            .fold((0usize, 0f64), |(n, s), (_, &v)| (n + 1, s + v as f64));
        if area_px2 == 0 {
            return None;
        }

        let mean_intensity = sum / area_px2 as f64;
        let area_mm2 = image
            .spacing()
            .map(|s| area_px2 as f64 * s.pixel_area_mm2());
        let wed_cm = area_mm2
            .map(|a| Self::water_equivalent_diameter(mean_intensity, a))
            .filter(|w| w.is_finite());

        Some(ContourMetrics {
            area_px2,
            mean_intensity,
            area_mm2,
            wed_cm,
        })
    }

    /// Water-equivalent diameter in cm
    ///
    /// `2 * sqrt((mean/1000 + 1) * area_mm2 / π) / 10`. NaN when the mean
    /// intensity lies below -1000 HU.
    pub fn water_equivalent_diameter(mean_intensity: f64, area_mm2: f64) -> f64 {
        2.0 * (((mean_intensity / 1000.0) + 1.0) * (area_mm2 / PI)).sqrt() / 10.0
    }

    /// Size-specific dose estimate
    ///
    /// # Arguments
    ///
    /// * `wed_cm` - Water-equivalent diameter of the slice
    /// * `ctdi_vol` - Reference dose index reported by the scanner
    /// * `phantom_label` - CTDIPhantomTypeCodeSequence code meaning
    ///
    /// # Returns
    ///
    /// `None` unless the label names a known phantom exactly and CTDIvol is present.
    pub fn dose(
        wed_cm: f64,
        ctdi_vol: Option<f64>,
        phantom_label: Option<&str>,
    ) -> Option<DoseEstimate> {
        let phantom = phantom_label.and_then(Phantom::from_code_meaning)?;
        let ctdi_vol = ctdi_vol?;
        let (a, b) = phantom.conversion_coefficients();
        let ssde_mgy = ctdi_vol * a * (-b * wed_cm).exp();
        ssde_mgy.is_finite().then_some(DoseEstimate {
            phantom,
            ctdi_vol,
            ssde_mgy,
        })
    }
}
