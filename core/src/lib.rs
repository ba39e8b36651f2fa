pub mod api;
pub mod batch;
pub mod calibration;
pub mod cli;
pub mod contour;
pub mod error;
pub mod extraction;
pub mod morphology;
pub mod output;
pub mod slice;
pub mod types;

pub use api::{SliceExtractor, SliceMetadata};
pub use batch::{BatchReport, BatchRunner, DispatchMode, SlicePipeline, TaskOutcome};
pub use calibration::{CalibratedImage, PixelCalibrator, Rescale};
pub use cli::report::TextReport;
pub use contour::{
    Contour, ContourExtractor, ContourMetrics, ContourStep, DoseEstimate, MetricsCalculator,
    TruncationDetector, TruncationResult,
};
pub use error::{CtContourError, Result};
pub use output::{ArtifactWriter, OutputDescriptor, OutputKind};
pub use slice::{ContouredSlice, FinalizedSlice, SliceRecord};
pub use types::*;
