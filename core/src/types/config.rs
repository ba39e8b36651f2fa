use super::Connectivity;
use crate::error::{CtContourError, Result};
use std::fmt;

/// An RGB display colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const WHITE: Color = Color([255, 255, 255]);
    pub const RED: Color = Color([255, 0, 0]);
    pub const ORANGE: Color = Color([255, 165, 0]);
    pub const ORANGE_RED: Color = Color([255, 69, 0]);

    /// Parses a colour name or `#rrggbb` literal
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "w" | "white" => Some(Color::WHITE),
            "r" | "red" => Some(Color::RED),
            "orange" => Some(Color::ORANGE),
            "orangered" => Some(Color::ORANGE_RED),
            hex if hex.len() == 7 && hex.starts_with('#') => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Color([channel(1)?, channel(3)?, channel(5)?]))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

/// Parameters of the body contouring pipeline
///
/// Defaults reproduce the published reference parameters.
///
/// # Example
///
/// ```
/// use ctcontour_core::MorphologyConfig;
///
/// let config = MorphologyConfig::default()
///     .with_threshold(-300)
///     .with_areas(1);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.threshold, -300);
/// assert_eq!(config.areas, 1);
/// assert_eq!(config.small_objects_size, 300);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct MorphologyConfig {
    /// Foreground is every pixel strictly above this intensity (HU)
    pub threshold: i16,

    /// Side of the square structuring element used for erosion (px)
    pub erosion_diam: usize,

    /// Side of the square structuring element used for dilation (px)
    pub dilation_diam: usize,

    /// Components smaller than this pixel count are removed when despeckling
    pub small_objects_size: usize,

    /// Radius of the disk structuring element used for closing (px)
    pub close_radius: usize,

    /// Components are kept only if their eccentricity is strictly below this
    pub eccentricity: f64,

    /// Number of largest components kept in the final mask
    pub areas: usize,

    /// Neighbourhood of the eccentricity and largest-area passes; despeckling
    /// is always edge-connected
    #[cfg_attr(feature = "json", serde(skip))]
    pub connectivity: Connectivity,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            threshold: -260,
            erosion_diam: 4,
            dilation_diam: 4,
            small_objects_size: 300,
            close_radius: 2,
            eccentricity: 0.99,
            areas: 4,
            connectivity: Connectivity::Eight,
        }
    }
}

impl MorphologyConfig {
    /// Builder: Set the foreground threshold
    pub fn with_threshold(mut self, threshold: i16) -> Self {
        self.threshold = threshold;
        self
    }

    /// Builder: Set both erosion and dilation diameters
    pub fn with_erosion_dilation(mut self, erosion_diam: usize, dilation_diam: usize) -> Self {
        self.erosion_diam = erosion_diam;
        self.dilation_diam = dilation_diam;
        self
    }

    /// Builder: Set the despeckle floor
    pub fn with_small_objects_size(mut self, size: usize) -> Self {
        self.small_objects_size = size;
        self
    }

    /// Builder: Set the closing disk radius
    pub fn with_close_radius(mut self, radius: usize) -> Self {
        self.close_radius = radius;
        self
    }

    /// Builder: Set the eccentricity bound
    pub fn with_eccentricity(mut self, eccentricity: f64) -> Self {
        self.eccentricity = eccentricity;
        self
    }

    /// Builder: Set how many of the largest regions are kept
    pub fn with_areas(mut self, areas: usize) -> Self {
        self.areas = areas;
        self
    }

    /// Builder: Set the labelling neighbourhood
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Checks every parameter once, before any image is processed
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a structuring element is empty, `areas` is
    /// zero or the eccentricity bound lies outside `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.erosion_diam == 0 || self.dilation_diam == 0 {
            return Err(CtContourError::InvalidConfig(
                "erosion and dilation diameters must be at least 1".to_string(),
            ));
        }
        if self.areas == 0 {
            return Err(CtContourError::InvalidConfig(
                "at least one area must be kept".to_string(),
            ));
        }
        if !(self.eccentricity > 0.0 && self.eccentricity <= 1.0) {
            return Err(CtContourError::InvalidConfig(format!(
                "eccentricity bound must lie in (0, 1], got {}",
                self.eccentricity
            )));
        }
        Ok(())
    }
}

/// Parameters of truncation detection
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct TruncationConfig {
    /// Scan-limit components smaller than this pixel count are ignored
    pub small_objects_size: usize,

    /// Slice is out of scan when more contour pixels than this touch the scan limit
    pub out_of_scan_tolerance: usize,

    /// Slice is out of edge when any border carries more contour pixels than this
    pub edge_tolerance: usize,

    /// Overlay colour of out-of-scan pixels
    #[cfg_attr(feature = "json", serde(skip))]
    pub oos_color: Color,

    /// Overlay colour of out-of-edge pixels
    #[cfg_attr(feature = "json", serde(skip))]
    pub ooe_color: Color,
}

impl TruncationConfig {
    /// Side of the square used to grow the scan-limit mask
    pub const SCAN_LIMIT_DILATION: usize = 4;

    /// Side of the square used to thicken border hits for display
    pub const EDGE_DISPLAY_DILATION: usize = 6;

    /// Scan-limit threshold must lie strictly below this value (air, HU)
    /// for the image to carry padding outside the reconstructed field
    ///
    /// Only an image whose minimum is -1000 or above is exempt. A plain
    /// background below that, such as -1024 air with no padding at all, is
    /// still taken as the scan limit and a body surrounded by it is flagged
    /// out of scan.
    pub const SCAN_LIMIT_CEILING_HU: i32 = -1000;

    /// Checks every parameter once
    pub fn validate(&self) -> Result<()> {
        if self.small_objects_size == 0 {
            return Err(CtContourError::InvalidConfig(
                "truncation small-object floor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TruncationConfig {
    fn default() -> Self {
        Self {
            small_objects_size: 90,
            out_of_scan_tolerance: 25,
            edge_tolerance: 20,
            oos_color: Color::RED,
            ooe_color: Color::ORANGE,
        }
    }
}

/// Which per-slice artifacts to write, and how
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    /// Two-panel image: original and contour outline
    pub thumbs: bool,
    /// Multi-panel image with every pipeline step
    pub detail: bool,
    /// Truncation overlay image
    pub trunk: bool,
    /// One-row CSV with metrics and flags
    pub csv: bool,
    /// Compressed mask archive
    pub npz: bool,
    /// Merge per-directory images after the batch
    pub merge_images: bool,
    /// Merge per-directory CSVs after the batch
    pub merge_csv: bool,
    /// Upper bound on images per merged file
    pub chunk_size: usize,
    /// Outline colour of the contour in thumbnails
    pub contour_color: Color,
    pub thumbs_stem: String,
    pub detail_stem: String,
    pub trunk_stem: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            thumbs: false,
            detail: false,
            trunk: false,
            csv: false,
            npz: false,
            merge_images: false,
            merge_csv: false,
            chunk_size: 500,
            contour_color: Color::WHITE,
            thumbs_stem: "_thumbs".to_string(),
            detail_stem: "_detail".to_string(),
            trunk_stem: "_trunk".to_string(),
        }
    }
}

impl OutputConfig {
    /// Whether any artifact is requested at all
    pub fn writes_anything(&self) -> bool {
        self.thumbs || self.detail || self.trunk || self.csv || self.npz
    }

    /// Checks every parameter once
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(CtContourError::InvalidConfig(
                "merge chunk size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
