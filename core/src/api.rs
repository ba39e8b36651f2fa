use crate::error::Result;
use crate::extraction::tags::{
    get_f64_value, get_multi_string_value, get_u16_value, COLUMNS, CTDI_VOL, PIXEL_SPACING,
    RECONSTRUCTION_DIAMETER, RESCALE_INTERCEPT, RESCALE_SLOPE, ROWS,
};
use crate::extraction::{extract_phantom_label, require_axial};
use crate::types::{ImageType, Phantom, PixelSpacing};
use dicom_object::InMemDicomObject;

/// Header extractor for axial CT slices
///
/// Reads the allow-listed attributes a slice needs before its pixels are
/// decoded, and rejects anything that is not an axial image.
///
/// # Example
///
/// ```
/// use ctcontour_core::SliceExtractor;
/// use dicom_object::InMemDicomObject;
/// use dicom_core::{DataElement, PrimitiveValue, VR, Tag};
///
/// let mut dcm = InMemDicomObject::new_empty();
/// dcm.put(DataElement::new(
///     Tag(0x0008, 0x0008), // ImageType
///     VR::CS,
///     PrimitiveValue::Strs(
///         vec!["ORIGINAL".to_string(), "PRIMARY".to_string(), "AXIAL".to_string()].into(),
///     ),
/// ));
/// dcm.put(DataElement::new(
///     Tag(0x0028, 0x0030), // PixelSpacing
///     VR::DS,
///     PrimitiveValue::from("0.7\\0.8"),
/// ));
/// dcm.put(DataElement::new(
///     Tag(0x0018, 0x9345), // CTDIvol
///     VR::FD,
///     PrimitiveValue::from(12.5_f64),
/// ));
///
/// let metadata = SliceExtractor::extract(&dcm).unwrap();
///
/// assert!(metadata.image_type.is_axial());
/// assert_eq!(metadata.pixel_spacing.unwrap().col, 0.8);
/// assert_eq!(metadata.ctdi_vol, Some(12.5));
/// assert_eq!(metadata.rescale_slope, None);
/// ```
pub struct SliceExtractor;

impl SliceExtractor {
    /// Extracts slice metadata from a DICOM object
    ///
    /// # Errors
    ///
    /// Returns `NotAxialImage` if ImageType does not declare `AXIAL`.
    /// Every other attribute is optional and reported as `None` when absent.
    pub fn extract(dcm: &InMemDicomObject) -> Result<SliceMetadata> {
        let image_type = require_axial(dcm)?;

        Ok(SliceMetadata {
            image_type,
            rows: get_u16_value(dcm, ROWS),
            columns: get_u16_value(dcm, COLUMNS),
            rescale_slope: get_f64_value(dcm, RESCALE_SLOPE),
            rescale_intercept: get_f64_value(dcm, RESCALE_INTERCEPT),
            pixel_spacing: Self::extract_pixel_spacing(dcm),
            reconstruction_diameter_mm: get_f64_value(dcm, RECONSTRUCTION_DIAMETER),
            ctdi_vol: get_f64_value(dcm, CTDI_VOL),
            phantom_label: extract_phantom_label(dcm),
        })
    }

    /// Extracts PixelSpacing as a (row, col) pair
    fn extract_pixel_spacing(dcm: &InMemDicomObject) -> Option<PixelSpacing> {
        let values = get_multi_string_value(dcm, PIXEL_SPACING)?;
        PixelSpacing::parse(&values.join("\\")).ok()
    }
}

/// Header values of one axial CT slice
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct SliceMetadata {
    /// Parsed ImageType field
    pub image_type: ImageType,

    pub rows: Option<u16>,
    pub columns: Option<u16>,

    /// Stored value to HU scale
    pub rescale_slope: Option<f64>,

    /// Stored value to HU offset
    pub rescale_intercept: Option<f64>,

    /// Physical pixel size in mm
    pub pixel_spacing: Option<PixelSpacing>,

    /// Diameter of the reconstructed field of view (mm)
    pub reconstruction_diameter_mm: Option<f64>,

    /// Reference dose index (CTDIvol, mGy)
    pub ctdi_vol: Option<f64>,

    /// CTDIPhantomTypeCodeSequence code meaning, as stored
    pub phantom_label: Option<String>,
}

impl SliceMetadata {
    /// Recognised dosimetry phantom, if any
    pub fn phantom(&self) -> Option<Phantom> {
        self.phantom_label
            .as_deref()
            .and_then(Phantom::from_code_meaning)
    }
}
