use super::step::{ContourStep, ShapeAnnotation};
use crate::calibration::CalibratedImage;
use crate::morphology::{
    close, count, dilate, erode, fill_holes, remove_small_objects, threshold_above,
    ComponentSelector, Selection, ShapeMetric, StructuringElement,
};
use crate::types::MorphologyConfig;
use log::debug;
use ndarray::{Array2, ArrayView2};

/// Body contour of one slice together with its construction history
#[derive(Debug, Clone)]
pub struct Contour {
    method: &'static str,
    params: MorphologyConfig,
    steps: Vec<ContourStep>,
    mask: Array2<bool>,
}

impl Contour {
    /// Identifier of the pipeline that built this contour
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Parameters the pipeline ran with
    pub fn params(&self) -> &MorphologyConfig {
        &self.params
    }

    /// Every recorded step, starting with the original image
    pub fn steps(&self) -> &[ContourStep] {
        &self.steps
    }

    /// Final body mask
    pub fn mask(&self) -> ArrayView2<'_, bool> {
        self.mask.view()
    }

    /// Whether no body pixel survived the pipeline
    pub fn is_empty(&self) -> bool {
        !self.mask.iter().any(|&v| v)
    }
}

/// Threshold-and-morphology body contouring
///
/// Runs nine stages on the calibrated image and records each one:
/// threshold, despeckle, erode, despeckle, dilate, eccentricity filter,
/// close, fill holes and top-K area selection.
///
/// # Example
///
/// ```
/// use ctcontour_core::{CalibratedImage, ContourExtractor, MorphologyConfig};
/// use ndarray::Array2;
///
/// let mut px = Array2::from_elem((64, 64), -1000_i16);
/// for r in 12..52 {
///     for c in 12..52 {
///         px[(r, c)] = 40;
///     }
/// }
/// let image = CalibratedImage::new(px, None, None, None);
///
/// let extractor = ContourExtractor::new(MorphologyConfig::default().with_areas(1));
/// let contour = extractor.extract(&image);
///
/// assert_eq!(contour.method(), "ep");
/// assert_eq!(contour.steps().len(), 10);
/// assert!(contour.mask()[(32, 32)]);
/// assert!(!contour.mask()[(2, 2)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContourExtractor {
    config: MorphologyConfig,
}

impl ContourExtractor {
    /// Method identifier recorded on every contour
    pub const METHOD: &'static str = "ep";

    pub fn new(config: MorphologyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MorphologyConfig {
        &self.config
    }

    /// Builds the contour of a calibrated image
    ///
    /// An image without any body yields an empty mask rather than an error.
    pub fn extract(&self, image: &CalibratedImage) -> Contour {
        let cfg = &self.config;
        let selector = ComponentSelector::new(cfg.connectivity);
        let mut steps = Vec::with_capacity(10);

        steps.push(ContourStep::intensity("Original", image.pixels().to_owned()));

        let thresholded = threshold_above(image.pixels(), cfg.threshold);
        steps.push(ContourStep::mask(
            format!("Threshold: >{}HU", cfg.threshold),
            thresholded.clone(),
        ));

        let despeckled = remove_small_objects(thresholded.view(), cfg.small_objects_size);
        steps.push(ContourStep::mask(
            format!("Despeckle: <{}px", cfg.small_objects_size),
            despeckled.clone(),
        ));

        let eroded = erode(
            despeckled.view(),
            &StructuringElement::square(cfg.erosion_diam),
        );
        steps.push(ContourStep::mask(
            format!("Erode: {}px", cfg.erosion_diam),
            eroded.clone(),
        ));

        let despeckled = remove_small_objects(eroded.view(), cfg.small_objects_size);
        steps.push(ContourStep::mask(
            format!("Despeckle: <{}px", cfg.small_objects_size),
            despeckled.clone(),
        ));

        let dilated = dilate(
            despeckled.view(),
            &StructuringElement::square(cfg.dilation_diam),
        );
        steps.push(
            ContourStep::mask(format!("Dilate: {}px", cfg.dilation_diam), dilated.clone())
                .annotated(ShapeAnnotation::new(ShapeMetric::Eccentricity, 3)),
        );

        let round_shapes = selector.select(
            dilated.view(),
            Selection::Below {
                metric: ShapeMetric::Eccentricity,
                bound: cfg.eccentricity,
            },
        );
        debug!(
            "Eccentricity filter kept {} of {} regions",
            round_shapes.selected.len(),
            round_shapes.labels.count()
        );
        steps.push(ContourStep::mask(
            format!("Filter eccentricities: >{}", cfg.eccentricity),
            round_shapes.mask.clone(),
        ));

        let closed = close(
            round_shapes.mask.view(),
            &StructuringElement::disk(cfg.close_radius),
        );
        steps.push(ContourStep::mask(
            format!("Close: <{}px", cfg.close_radius),
            closed.clone(),
        ));

        let filled = fill_holes(closed.view());
        steps.push(
            ContourStep::mask("Fill", filled.clone())
                .annotated(ShapeAnnotation::new(ShapeMetric::Area, 0)),
        );

        let largest = selector.select(filled.view(), Selection::LargestAreas(cfg.areas));
        debug!(
            "Kept {} of {} regions, {} px",
            largest.selected.len(),
            largest.labels.count(),
            count(largest.mask.view())
        );
        steps.push(ContourStep::mask("Final contour", largest.mask.clone()));

        Contour {
            method: Self::METHOD,
            params: cfg.clone(),
            steps,
            mask: largest.mask,
        }
    }
}
