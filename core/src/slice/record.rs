use crate::api::{SliceExtractor, SliceMetadata};
use crate::calibration::{CalibratedImage, Rescale};
use crate::contour::{
    Contour, ContourExtractor, ContourMetrics, DoseEstimate, MetricsCalculator,
    TruncationDetector, TruncationResult,
};
use crate::error::Result;
use crate::extraction::extract_raw_pixels;
use dicom_object::{open_file, InMemDicomObject};
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};

/// Processing stages a slice passes through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProcessingStage {
    Loaded,
    Calibrated,
    ContourBuilt,
    MetricsComputed,
    TruncationFlagged,
    Finalized,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessingStage::Loaded => "loaded",
            ProcessingStage::Calibrated => "calibrated",
            ProcessingStage::ContourBuilt => "contour built",
            ProcessingStage::MetricsComputed => "metrics computed",
            ProcessingStage::TruncationFlagged => "truncation flagged",
            ProcessingStage::Finalized => "finalized",
        };
        write!(f, "{}", name)
    }
}

/// A calibrated axial slice, ready for contouring
///
/// Each stage consumes the record and returns the next one, so a field is
/// only reachable once the stage producing it has run.
#[derive(Debug, Clone)]
pub struct SliceRecord {
    file_path: PathBuf,
    metadata: SliceMetadata,
    image: CalibratedImage,
}

impl SliceRecord {
    /// Loads and calibrates a slice from a DICOM file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to DICOM file
    ///
    /// # Errors
    ///
    /// Returns `DicomError` for unreadable files, `NotAxialImage` for
    /// non-axial images and `MissingCalibration` without rescale attributes.
    pub fn from_file(path: PathBuf) -> Result<Self> {
        let dcm = open_file(&path)?;
        Self::from_dicom(path, &dcm)
    }

    /// Calibrates a slice from an already-opened DICOM object
    pub fn from_dicom(path: PathBuf, dcm: &InMemDicomObject) -> Result<Self> {
        let metadata = SliceExtractor::extract(dcm)?;
        debug!("{}: {}", path.display(), ProcessingStage::Loaded);

        let rescale = Rescale::from_header(metadata.rescale_slope, metadata.rescale_intercept)?;
        let raw = extract_raw_pixels(dcm)?;
        let image = CalibratedImage::from_raw(
            raw.view(),
            rescale,
            metadata.pixel_spacing,
            metadata.phantom_label.clone(),
            metadata.ctdi_vol,
        );
        debug!("{}: {}", path.display(), ProcessingStage::Calibrated);

        Ok(Self::new(path, metadata, image))
    }

    /// Wraps an image that is already calibrated
    pub fn new(file_path: PathBuf, metadata: SliceMetadata, image: CalibratedImage) -> Self {
        Self {
            file_path,
            metadata,
            image,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn metadata(&self) -> &SliceMetadata {
        &self.metadata
    }

    pub fn image(&self) -> &CalibratedImage {
        &self.image
    }

    /// Builds the contour and measures it
    pub fn contour(self, extractor: &ContourExtractor) -> ContouredSlice {
        let contour = extractor.extract(&self.image);
        debug!("{}: {}", self.file_path.display(), ProcessingStage::ContourBuilt);

        let metrics = MetricsCalculator::measure(contour.mask(), &self.image);
        let dose = metrics.and_then(|m| m.wed_cm).and_then(|wed| {
            MetricsCalculator::dose(wed, self.image.ctdi_vol(), self.image.phantom_label())
        });
        debug!(
            "{}: {}",
            self.file_path.display(),
            ProcessingStage::MetricsComputed
        );

        ContouredSlice {
            record: self,
            contour,
            metrics,
            dose,
        }
    }
}

/// A slice with its contour, metrics and dose estimate
#[derive(Debug, Clone)]
pub struct ContouredSlice {
    record: SliceRecord,
    contour: Contour,
    metrics: Option<ContourMetrics>,
    dose: Option<DoseEstimate>,
}

impl ContouredSlice {
    pub fn record(&self) -> &SliceRecord {
        &self.record
    }

    pub fn contour(&self) -> &Contour {
        &self.contour
    }

    /// Metrics of the final mask; `None` when the mask is empty
    pub fn metrics(&self) -> Option<&ContourMetrics> {
        self.metrics.as_ref()
    }

    pub fn dose(&self) -> Option<&DoseEstimate> {
        self.dose.as_ref()
    }

    /// Flags truncation of the final contour
    pub fn flag_truncation(self, detector: &TruncationDetector) -> FinalizedSlice {
        let truncation = detector.detect(self.record.image.pixels(), self.contour.mask());
        debug!(
            "{}: {}",
            self.record.file_path.display(),
            ProcessingStage::TruncationFlagged
        );
        FinalizedSlice {
            slice: self,
            truncation,
        }
    }
}

/// A fully processed slice, handed to the artifact writers
#[derive(Debug, Clone)]
pub struct FinalizedSlice {
    slice: ContouredSlice,
    truncation: TruncationResult,
}

impl FinalizedSlice {
    pub fn file_path(&self) -> &Path {
        self.slice.record.file_path()
    }

    /// File name of the source, for display and tabular output
    pub fn file_name(&self) -> String {
        self.file_path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn metadata(&self) -> &SliceMetadata {
        self.slice.record.metadata()
    }

    pub fn image(&self) -> &CalibratedImage {
        self.slice.record.image()
    }

    pub fn contour(&self) -> &Contour {
        self.slice.contour()
    }

    pub fn metrics(&self) -> Option<&ContourMetrics> {
        self.slice.metrics()
    }

    pub fn dose(&self) -> Option<&DoseEstimate> {
        self.slice.dose()
    }

    pub fn truncation(&self) -> &TruncationResult {
        &self.truncation
    }

    pub fn stage(&self) -> ProcessingStage {
        ProcessingStage::Finalized
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::CtContourError;
    use crate::extraction::tags::{
        BITS_ALLOCATED, CODE_MEANING, COLUMNS, CTDI_PHANTOM_TYPE_CODE_SEQUENCE, CTDI_VOL,
        IMAGE_TYPE, PIXEL_DATA, PIXEL_REPRESENTATION, PIXEL_SPACING, RESCALE_INTERCEPT,
        RESCALE_SLOPE, ROWS,
    };
    use crate::types::{MorphologyConfig, Phantom, PixelSpacing};
    use dicom_core::value::DataSetSequence;
    use dicom_core::{DataElement, PrimitiveValue, VR};
    use ndarray::Array2;

    /// Stored values of a disk phantom: body at 1024 (0 HU), air at 24 (-1000 HU)
    pub(crate) fn disk_stored_values(size: usize, radius: f64) -> Vec<u16> {
        let centre = (size / 2) as f64;
        (0..size * size)
            .map(|i| {
                let (r, c) = ((i / size) as f64 - centre, (i % size) as f64 - centre);
                if r * r + c * c <= radius * radius {
                    1024
                } else {
                    24
                }
            })
            .collect()
    }

    /// Helper to build an axial CT slice in memory
    pub(crate) fn create_test_dicom(size: u16, radius: f64) -> InMemDicomObject {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(
            IMAGE_TYPE,
            VR::CS,
            PrimitiveValue::Strs(
                vec![
                    "ORIGINAL".to_string(),
                    "PRIMARY".to_string(),
                    "AXIAL".to_string(),
                ]
                .into(),
            ),
        ));
        dcm.put(DataElement::new(ROWS, VR::US, PrimitiveValue::from(size)));
        dcm.put(DataElement::new(COLUMNS, VR::US, PrimitiveValue::from(size)));
        dcm.put(DataElement::new(
            BITS_ALLOCATED,
            VR::US,
            PrimitiveValue::from(16_u16),
        ));
        dcm.put(DataElement::new(
            PIXEL_REPRESENTATION,
            VR::US,
            PrimitiveValue::from(0_u16),
        ));
        dcm.put(DataElement::new(
            RESCALE_SLOPE,
            VR::DS,
            PrimitiveValue::from("1"),
        ));
        dcm.put(DataElement::new(
            RESCALE_INTERCEPT,
            VR::DS,
            PrimitiveValue::from("-1024"),
        ));
        dcm.put(DataElement::new(
            PIXEL_SPACING,
            VR::DS,
            PrimitiveValue::from("0.5\\0.5"),
        ));
        dcm.put(DataElement::new(
            CTDI_VOL,
            VR::FD,
            PrimitiveValue::from(10.0_f64),
        ));

        let mut item = InMemDicomObject::new_empty();
        item.put(DataElement::new(
            CODE_MEANING,
            VR::LO,
            PrimitiveValue::from(Phantom::BODY_LABEL),
        ));
        dcm.put(DataElement::new(
            CTDI_PHANTOM_TYPE_CODE_SEQUENCE,
            VR::SQ,
            DataSetSequence::from(vec![item]),
        ));

        dcm.put(DataElement::new(
            PIXEL_DATA,
            VR::OW,
            PrimitiveValue::U16(disk_stored_values(size as usize, radius).into()),
        ));
        dcm
    }

    #[test]
    fn test_slice_from_dicom_end_to_end() {
        let dcm = create_test_dicom(128, 40.0);
        let record = SliceRecord::from_dicom(PathBuf::from("a/b/slice.dcm"), &dcm).unwrap();
        assert_eq!(record.image().min_max(), Some((-1000, 0)));
        assert_eq!(record.image().spacing(), Some(PixelSpacing::new(0.5, 0.5)));

        let extractor = ContourExtractor::new(MorphologyConfig::default().with_areas(1));
        let finalized = record
            .contour(&extractor)
            .flag_truncation(&TruncationDetector::default());

        let metrics = finalized.metrics().unwrap();
        assert!(metrics.mean_intensity <= 0.0 && metrics.mean_intensity > -100.0);
        let area_mm2 = metrics.area_mm2.unwrap();
        assert!((area_mm2 - metrics.area_px2 as f64 * 0.25).abs() < 1e-9);

        let dose = finalized.dose().unwrap();
        assert_eq!(dose.phantom, Phantom::Body);
        let wed = metrics.wed_cm.unwrap();
        let expected = 10.0 * 3.704369 * (-0.03671937 * wed).exp();
        assert!((dose.ssde_mgy - expected).abs() < 1e-9);

        assert!(!finalized.truncation().is_truncated());
        assert_eq!(finalized.file_name(), "slice.dcm");
        assert_eq!(finalized.stage(), ProcessingStage::Finalized);
    }

    #[test]
    fn test_missing_calibration_fails() {
        let mut dcm = create_test_dicom(32, 8.0);
        dcm.remove_element(RESCALE_SLOPE);
        let err = SliceRecord::from_dicom(PathBuf::from("x.dcm"), &dcm).unwrap_err();
        assert!(matches!(err, CtContourError::MissingCalibration(_)));
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_empty_body_has_no_metrics() {
        let image = CalibratedImage::new(
            Array2::from_elem((64, 64), -1000_i16),
            Some(PixelSpacing::new(1.0, 1.0)),
            Some(Phantom::BODY_LABEL.to_string()),
            Some(10.0),
        );
        let finalized = SliceRecord::new(PathBuf::from("air.dcm"), SliceMetadata::default(), image)
            .contour(&ContourExtractor::default())
            .flag_truncation(&TruncationDetector::default());
        assert!(finalized.contour().is_empty());
        assert!(finalized.metrics().is_none());
        assert!(finalized.dose().is_none());
        assert!(!finalized.truncation().is_truncated());
    }

    #[test]
    fn test_stage_order() {
        assert!(ProcessingStage::Loaded < ProcessingStage::Calibrated);
        assert!(ProcessingStage::TruncationFlagged < ProcessingStage::Finalized);
        assert_eq!(ProcessingStage::ContourBuilt.to_string(), "contour built");
    }
}
