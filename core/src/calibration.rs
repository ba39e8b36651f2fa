//! Conversion of stored pixel values to Hounsfield units
//!
//! Calibration follows the stored-value transform `HU = slope * SV + intercept`
//! on a fixed-width i16 grid. Narrowing is pinned: the product is computed in
//! f64, truncated toward zero, then wrapped two's-complement into i16; the
//! intercept is truncated and wrapped the same way and added with wrapping
//! arithmetic.

use crate::error::{CtContourError, Result};
use crate::types::PixelSpacing;
use ndarray::{Array2, ArrayView2};

/// Rescale slope and intercept read from the image header
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Rescale {
    pub slope: f64,
    pub intercept: f64,
}

impl Rescale {
    /// Creates a new Rescale
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// Pairs the two optional header values
    ///
    /// # Errors
    ///
    /// Returns `MissingCalibration` naming the first absent attribute.
    pub fn from_header(slope: Option<f64>, intercept: Option<f64>) -> Result<Self> {
        let slope =
            slope.ok_or_else(|| CtContourError::MissingCalibration("RescaleSlope".to_string()))?;
        let intercept = intercept
            .ok_or_else(|| CtContourError::MissingCalibration("RescaleIntercept".to_string()))?;
        Ok(Self::new(slope, intercept))
    }
}

/// Truncates toward zero and wraps into i16
///
/// `f64 as i64` saturates (NaN maps to 0), the second cast keeps the low
/// 16 bits.
#[inline]
fn narrow(value: f64) -> i16 {
    value as i64 as i16
}

/// Applies rescale slope and intercept to raw stored values
pub struct PixelCalibrator;

impl PixelCalibrator {
    /// Calibrates a raw grid into Hounsfield units
    ///
    /// The output has the same shape and integer width as the input.
    pub fn calibrate(raw: ArrayView2<i16>, rescale: Rescale) -> Array2<i16> {
        let intercept = narrow(rescale.intercept);
        if rescale.slope != 1.0 {
            raw.mapv(|v| narrow(rescale.slope * v as f64).wrapping_add(intercept))
        } else {
            raw.mapv(|v| v.wrapping_add(intercept))
        }
    }
}

/// A calibrated axial slice with the header values the metrics need
///
/// Immutable once built; the pixel grid is only handed out as a view.
#[derive(Debug, Clone)]
pub struct CalibratedImage {
    pixels: Array2<i16>,
    spacing: Option<PixelSpacing>,
    phantom_label: Option<String>,
    ctdi_vol: Option<f64>,
}

impl CalibratedImage {
    /// Wraps an already calibrated grid
    pub fn new(
        pixels: Array2<i16>,
        spacing: Option<PixelSpacing>,
        phantom_label: Option<String>,
        ctdi_vol: Option<f64>,
    ) -> Self {
        Self {
            pixels,
            spacing,
            phantom_label,
            ctdi_vol,
        }
    }

    /// Calibrates `raw` and wraps the result
    pub fn from_raw(
        raw: ArrayView2<i16>,
        rescale: Rescale,
        spacing: Option<PixelSpacing>,
        phantom_label: Option<String>,
        ctdi_vol: Option<f64>,
    ) -> Self {
        Self::new(
            PixelCalibrator::calibrate(raw, rescale),
            spacing,
            phantom_label,
            ctdi_vol,
        )
    }

    /// Calibrated intensities in HU
    pub fn pixels(&self) -> ArrayView2<'_, i16> {
        self.pixels.view()
    }

    /// Grid shape as `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    pub fn spacing(&self) -> Option<PixelSpacing> {
        self.spacing
    }

    /// CTDIPhantomTypeCodeSequence code meaning, as stored
    pub fn phantom_label(&self) -> Option<&str> {
        self.phantom_label.as_deref()
    }

    /// Reference dose index (CTDIvol, mGy)
    pub fn ctdi_vol(&self) -> Option<f64> {
        self.ctdi_vol
    }

    /// Smallest and largest calibrated value
    ///
    /// Returns `None` for an empty grid.
    pub fn min_max(&self) -> Option<(i16, i16)> {
        self.pixels.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}
