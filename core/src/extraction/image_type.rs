use crate::error::{CtContourError, Result};
use crate::types::ImageType;
use dicom_object::InMemDicomObject;

use super::tags::{get_multi_string_value, IMAGE_TYPE};

/// Extracts ImageType structure from DICOM file
///
/// A missing attribute yields an empty ImageType.
pub fn extract_image_type(dcm: &InMemDicomObject) -> ImageType {
    get_multi_string_value(dcm, IMAGE_TYPE)
        .map(|values| ImageType::from_values(&values))
        .unwrap_or_default()
}

/// Extracts the ImageType and checks that it declares an axial slice
///
/// # Errors
///
/// Returns `NotAxialImage` carrying the declared components when `AXIAL`
/// is absent (localisers, secondary captures, dose reports, ...).
pub fn require_axial(dcm: &InMemDicomObject) -> Result<ImageType> {
    let image_type = extract_image_type(dcm);
    if image_type.is_axial() {
        Ok(image_type)
    } else {
        Err(CtContourError::NotAxialImage(image_type.values()))
    }
}
