use crate::extraction::tags::{get_string_value, CODE_MEANING, CTDI_PHANTOM_TYPE_CODE_SEQUENCE};
use dicom_object::InMemDicomObject;

/// Extracts the CTDI phantom code meaning from a DICOM file
///
/// Navigates: CTDIPhantomTypeCodeSequence[0] → CodeMeaning.
/// The value is returned as stored (trimmed only); matching against the
/// recognised phantoms is left to [`crate::Phantom::from_code_meaning`].
///
/// # Arguments
///
/// * `dcm` - DICOM object to extract from
///
/// # Returns
///
/// `Some(String)` if a code meaning is found, `None` otherwise
pub fn extract_phantom_label(dcm: &InMemDicomObject) -> Option<String> {
    dcm.element(CTDI_PHANTOM_TYPE_CODE_SEQUENCE)
        .ok()
        .and_then(|sequence| sequence.items())
        .and_then(|items| items.first())
        .and_then(|first_item| get_string_value(first_item, CODE_MEANING))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::value::DataSetSequence;
    use dicom_core::{DataElement, PrimitiveValue, VR};

    fn with_phantom_sequence(meaning: &str) -> InMemDicomObject {
        let mut item = InMemDicomObject::new_empty();
        item.put(DataElement::new(
            CODE_MEANING,
            VR::LO,
            PrimitiveValue::from(meaning),
        ));

        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(
            CTDI_PHANTOM_TYPE_CODE_SEQUENCE,
            VR::SQ,
            DataSetSequence::from(vec![item]),
        ));
        dcm
    }

    #[test]
    fn test_extract_phantom_label_empty() {
        let dcm = InMemDicomObject::new_empty();
        assert_eq!(extract_phantom_label(&dcm), None);
    }

    #[test]
    fn test_extract_phantom_label_from_sequence() {
        let dcm = with_phantom_sequence("IEC Body Dosimetry Phantom");
        assert_eq!(
            extract_phantom_label(&dcm).as_deref(),
            Some("IEC Body Dosimetry Phantom")
        );
    }
}
