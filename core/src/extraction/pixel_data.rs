use crate::error::{CtContourError, Result};
use crate::types::PhotometricInterpretation;
use dicom_core::value::DicomValueType;
use dicom_core::PrimitiveValue;
use dicom_object::InMemDicomObject;
use log::debug;
use ndarray::Array2;

use super::tags::{
    get_string_value, get_u16_value, BITS_ALLOCATED, COLUMNS, PHOTOMETRIC_INTERPRETATION,
    PIXEL_DATA, PIXEL_REPRESENTATION, ROWS, SAMPLES_PER_PIXEL,
};

/// Layout of the stored pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct PixelLayout {
    pub rows: usize,
    pub columns: usize,
    pub bits_allocated: u16,
    /// `true` when PixelRepresentation is 1 (two's complement)
    pub signed: bool,
    pub samples_per_pixel: u16,
    pub photometric: PhotometricInterpretation,
}

impl PixelLayout {
    /// Reads the layout attributes
    ///
    /// SamplesPerPixel defaults to 1, PixelRepresentation to unsigned and
    /// PhotometricInterpretation to MONOCHROME2 when absent.
    ///
    /// # Errors
    ///
    /// Returns `MissingAttribute` if Rows, Columns or BitsAllocated is absent.
    pub fn extract(dcm: &InMemDicomObject) -> Result<Self> {
        let rows = get_u16_value(dcm, ROWS)
            .ok_or_else(|| CtContourError::MissingAttribute("Rows".to_string()))?;
        let columns = get_u16_value(dcm, COLUMNS)
            .ok_or_else(|| CtContourError::MissingAttribute("Columns".to_string()))?;
        let bits_allocated = get_u16_value(dcm, BITS_ALLOCATED)
            .ok_or_else(|| CtContourError::MissingAttribute("BitsAllocated".to_string()))?;

        Ok(Self {
            rows: rows as usize,
            columns: columns as usize,
            bits_allocated,
            signed: get_u16_value(dcm, PIXEL_REPRESENTATION).unwrap_or(0) == 1,
            samples_per_pixel: get_u16_value(dcm, SAMPLES_PER_PIXEL).unwrap_or(1),
            photometric: get_string_value(dcm, PHOTOMETRIC_INTERPRETATION)
                .map(|s| PhotometricInterpretation::from_str(&s))
                .unwrap_or(PhotometricInterpretation::Monochrome2),
        })
    }

    /// Number of pixels in one frame
    pub fn len(&self) -> usize {
        self.rows * self.columns
    }

    /// Whether the frame holds no pixels
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_supported(&self) -> Result<()> {
        if self.is_empty() {
            return Err(CtContourError::UnsupportedPixelData(format!(
                "empty frame {}x{}",
                self.rows, self.columns
            )));
        }
        if self.samples_per_pixel != 1 || !self.photometric.is_monochrome() {
            return Err(CtContourError::UnsupportedPixelData(format!(
                "expected single-sample monochrome data, found {} sample(s) {}",
                self.samples_per_pixel, self.photometric
            )));
        }
        if self.bits_allocated != 8 && self.bits_allocated != 16 {
            return Err(CtContourError::UnsupportedPixelData(format!(
                "BitsAllocated={} is not supported",
                self.bits_allocated
            )));
        }
        Ok(())
    }
}

/// Decodes the stored pixel buffer into a `rows × columns` grid of i16
///
/// Only native (uncompressed) pixel data is decoded. Every stored value is
/// cast to i16 with two's-complement wrap, so unsigned 16-bit values above
/// `i16::MAX` wrap to negative numbers exactly like a C cast would.
///
/// # Errors
///
/// - `MissingAttribute` if the layout attributes or PixelData are absent
/// - `UnsupportedPixelData` for encapsulated, colour or short buffers
pub fn extract_raw_pixels(dcm: &InMemDicomObject) -> Result<Array2<i16>> {
    let layout = PixelLayout::extract(dcm)?;
    layout.check_supported()?;

    let element = dcm
        .element(PIXEL_DATA)
        .map_err(|_| CtContourError::MissingAttribute("PixelData".to_string()))?;

    let stored: Vec<i16> = match (element.value().primitive(), layout.bits_allocated) {
        (Some(PrimitiveValue::I16(values)), 16) => values.to_vec(),
        (Some(PrimitiveValue::U16(values)), 16) => values.iter().map(|&v| v as i16).collect(),
        (Some(PrimitiveValue::U8(bytes)), 16) => bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect(),
        (Some(PrimitiveValue::U8(bytes)), 8) if layout.signed => {
            bytes.iter().map(|&v| v as i8 as i16).collect()
        }
        (Some(PrimitiveValue::U8(bytes)), 8) => bytes.iter().map(|&v| v as i16).collect(),
        (Some(other), bits) => {
            return Err(CtContourError::UnsupportedPixelData(format!(
                "{:?} values with BitsAllocated={}",
                other.value_type(),
                bits
            )))
        }
        (None, _) => {
            return Err(CtContourError::UnsupportedPixelData(
                "encapsulated (compressed) pixel data".to_string(),
            ))
        }
    };

    if stored.len() < layout.len() {
        return Err(CtContourError::UnsupportedPixelData(format!(
            "buffer holds {} values, expected {}x{}",
            stored.len(),
            layout.rows,
            layout.columns
        )));
    }
    if stored.len() > layout.len() {
        debug!(
            "Ignoring {} trailing pixel values beyond the first frame",
            stored.len() - layout.len()
        );
    }

    let frame = stored.into_iter().take(layout.len()).collect::<Vec<_>>();
    Array2::from_shape_vec((layout.rows, layout.columns), frame)
        .map_err(|e| CtContourError::UnsupportedPixelData(e.to_string()))
}
