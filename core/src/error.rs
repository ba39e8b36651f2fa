use std::path::PathBuf;
use thiserror::Error;

/// Result type for ctcontour operations
pub type Result<T> = std::result::Result<T, CtContourError>;

/// Error types for ctcontour operations
#[derive(Error, Debug)]
pub enum CtContourError {
    /// DICOM reading error (unreadable or corrupt source)
    #[error("DICOM error: {0}")]
    DicomError(String),

    /// Image is not an axial slice (localiser, secondary capture, ...)
    #[error("Not an Axial image: {}", .0.join("\\"))]
    NotAxialImage(Vec<String>),

    /// Pixel data is present but cannot be decoded natively
    #[error("Unsupported pixel data: {0}")]
    UnsupportedPixelData(String),

    /// RescaleSlope or RescaleIntercept is absent
    #[error("Missing calibration attribute: {0}")]
    MissingCalibration(String),

    /// A required attribute is absent
    #[error("Missing attribute: {0}")]
    MissingAttribute(String),

    /// Invalid tag value
    #[error("Invalid tag value: {0}")]
    InvalidValue(String),

    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Destination path could not be prepared
    #[error("Output path error for {path}: {reason}")]
    OutputPathError { path: PathBuf, reason: String },

    /// A per-slice artifact could not be read back for merging
    #[error("Cannot merge {path}: {reason}")]
    MergeReadError { path: PathBuf, reason: String },

    /// Generic processing error
    #[error("Processing error: {0}")]
    ProcessingError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Image encoding error
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Embedded annotation font could not be parsed
    #[error("Font error: {0}")]
    FontError(#[from] ab_glyph::InvalidFont),

    /// NPZ archive error
    #[error("NPZ error: {0}")]
    NpzError(#[from] ndarray_npy::WriteNpzError),
}

impl CtContourError {
    /// Whether this error rejects the item at load time
    ///
    /// Rejected items are skipped quietly; everything else is reported
    /// as a failure of that item.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CtContourError::NotAxialImage(_)
                | CtContourError::DicomError(_)
                | CtContourError::UnsupportedPixelData(_)
        )
    }
}

// Helper conversions
impl From<String> for CtContourError {
    fn from(s: String) -> Self {
        CtContourError::ProcessingError(s)
    }
}

impl From<&str> for CtContourError {
    fn from(s: &str) -> Self {
        CtContourError::ProcessingError(s.to_string())
    }
}

// Convert dicom-object errors
impl From<dicom_object::ReadError> for CtContourError {
    fn from(e: dicom_object::ReadError) -> Self {
        CtContourError::DicomError(format!("{}", e))
    }
}

impl From<dicom_core::value::ConvertValueError> for CtContourError {
    fn from(e: dicom_core::value::ConvertValueError) -> Self {
        CtContourError::InvalidValue(format!("{}", e))
    }
}
