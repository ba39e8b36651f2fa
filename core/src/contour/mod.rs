pub mod extractor;
pub mod metrics;
pub mod step;
pub mod truncation;

pub use extractor::{Contour, ContourExtractor};
pub use metrics::{ContourMetrics, DoseEstimate, MetricsCalculator};
pub use step::{ContourStep, ShapeAnnotation, StepImage};
pub use truncation::{EdgeCounts, TruncationDetector, TruncationResult};
