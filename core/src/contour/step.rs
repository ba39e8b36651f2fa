use crate::morphology::ShapeMetric;
use crate::types::Color;
use ndarray::Array2;

/// Grid captured by a pipeline step
#[derive(Debug, Clone, PartialEq)]
pub enum StepImage {
    /// Calibrated intensities (HU)
    Intensity(Array2<i16>),
    /// Binary mask
    Mask(Array2<bool>),
}

impl StepImage {
    /// Grid shape as `(rows, columns)`
    pub fn dim(&self) -> (usize, usize) {
        match self {
            StepImage::Intensity(px) => px.dim(),
            StepImage::Mask(mask) => mask.dim(),
        }
    }

    pub fn as_mask(&self) -> Option<&Array2<bool>> {
        match self {
            StepImage::Mask(mask) => Some(mask),
            StepImage::Intensity(_) => None,
        }
    }
}

/// Request to label each region of a step with one of its shape metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeAnnotation {
    pub metric: ShapeMetric,
    /// Decimal places shown
    pub decimals: usize,
    pub color: Color,
}

impl ShapeAnnotation {
    pub fn new(metric: ShapeMetric, decimals: usize) -> Self {
        Self {
            metric,
            decimals,
            color: Color::WHITE,
        }
    }

    /// Builder: Set the annotation colour
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Formats a metric value with the requested precision
    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.decimals, value)
    }
}

/// Named snapshot of one stage of the contour pipeline
///
/// Steps are kept for diagnostic rendering only.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourStep {
    label: String,
    image: StepImage,
    annotation: Option<ShapeAnnotation>,
}

impl ContourStep {
    pub fn intensity(label: impl Into<String>, pixels: Array2<i16>) -> Self {
        Self {
            label: label.into(),
            image: StepImage::Intensity(pixels),
            annotation: None,
        }
    }

    pub fn mask(label: impl Into<String>, mask: Array2<bool>) -> Self {
        Self {
            label: label.into(),
            image: StepImage::Mask(mask),
            annotation: None,
        }
    }

    /// Builder: Attach a shape annotation request
    pub fn annotated(mut self, annotation: ShapeAnnotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn image(&self) -> &StepImage {
        &self.image
    }

    pub fn annotation(&self) -> Option<&ShapeAnnotation> {
        self.annotation.as_ref()
    }
}
