use dicom_core::Tag;
use dicom_object::InMemDicomObject;

// Image Classification Tags
pub const IMAGE_TYPE: Tag = Tag(0x0008, 0x0008);
pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag(0x0028, 0x0004);
pub const SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);

// Image Geometry Tags
pub const ROWS: Tag = Tag(0x0028, 0x0010);
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
pub const PIXEL_SPACING: Tag = Tag(0x0028, 0x0030);
pub const RECONSTRUCTION_DIAMETER: Tag = Tag(0x0018, 0x1100);

// Pixel Encoding Tags
pub const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
pub const PIXEL_REPRESENTATION: Tag = Tag(0x0028, 0x0103);
pub const RESCALE_INTERCEPT: Tag = Tag(0x0028, 0x1052);
pub const RESCALE_SLOPE: Tag = Tag(0x0028, 0x1053);
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

// Dosimetry Tags
pub const CTDI_VOL: Tag = Tag(0x0018, 0x9345);
pub const CTDI_PHANTOM_TYPE_CODE_SEQUENCE: Tag = Tag(0x0018, 0x9346);
pub const CODE_MEANING: Tag = Tag(0x0008, 0x0104);

/// The only attributes consulted when building a slice record
pub const ALLOWED_TAGS: [Tag; 14] = [
    IMAGE_TYPE,
    RESCALE_SLOPE,
    RESCALE_INTERCEPT,
    CTDI_PHANTOM_TYPE_CODE_SEQUENCE,
    CTDI_VOL,
    PIXEL_SPACING,
    PIXEL_DATA,
    BITS_ALLOCATED,
    ROWS,
    COLUMNS,
    RECONSTRUCTION_DIAMETER,
    PIXEL_REPRESENTATION,
    SAMPLES_PER_PIXEL,
    PHOTOMETRIC_INTERPRETATION,
];

/// Helper to get string value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to string
pub fn get_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<String> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_str().ok())
        .map(|s| s.trim().to_string())
}

/// Helper to get integer value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to i32
pub fn get_int_value(dcm: &InMemDicomObject, tag: Tag) -> Option<i32> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<i32>().ok())
}

/// Helper to get u16 value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to u16
pub fn get_u16_value(dcm: &InMemDicomObject, tag: Tag) -> Option<u16> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<u16>().ok())
}

/// Helper to get a floating point value from DICOM tag
///
/// Works for DS/FD/FL as well as integer string VRs.
/// Returns `None` if the tag is not present or cannot be converted to f64
pub fn get_f64_value(dcm: &InMemDicomObject, tag: Tag) -> Option<f64> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_float64().ok())
}

/// Helper to get multi-string value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to Vec<String>
pub fn get_multi_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<Vec<String>> {
    dcm.element(tag).ok().and_then(|elem| {
        // Try to get as multi-string
        if let Ok(strs) = elem.to_multi_str() {
            Some(strs.iter().map(|s| s.trim().to_string()).collect())
        } else {
            // Fallback: try to get as single string and split by backslash
            elem.to_str()
                .ok()
                .map(|s| s.split('\\').map(|part| part.trim().to_string()).collect())
        }
    })
}
