use std::fmt;

/// DICOM ImageType field decomposed into its components
///
/// For CT the field reads e.g. `ORIGINAL\PRIMARY\AXIAL`:
/// - `pixels`: First element (e.g., "ORIGINAL", "DERIVED")
/// - `exam`: Second element (e.g., "PRIMARY", "SECONDARY")
/// - `flavor`: Third element, the image orientation class (e.g., "AXIAL", "LOCALIZER")
/// - `extras`: Additional elements beyond the first three
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ImageType {
    pub pixels: String,
    pub exam: String,
    pub flavor: Option<String>,
    pub extras: Option<Vec<String>>,
}

impl ImageType {
    /// Creates a new ImageType
    pub fn new(
        pixels: String,
        exam: String,
        flavor: Option<String>,
        extras: Option<Vec<String>>,
    ) -> Self {
        Self {
            pixels,
            exam,
            flavor,
            extras,
        }
    }

    /// Builds an ImageType from the raw multi-valued attribute
    pub fn from_values(values: &[String]) -> Self {
        let pixels = values.first().cloned().unwrap_or_default();
        let exam = values.get(1).cloned().unwrap_or_default();
        let flavor = values.get(2).cloned();
        let extras = if values.len() > 3 {
            Some(values[3..].to_vec())
        } else {
            None
        };
        Self::new(pixels, exam, flavor, extras)
    }

    /// Returns all present components in attribute order
    pub fn values(&self) -> Vec<String> {
        let mut parts = vec![self.pixels.clone(), self.exam.clone()];
        if let Some(ref flavor) = self.flavor {
            parts.push(flavor.clone());
        }
        if let Some(ref extras) = self.extras {
            parts.extend(extras.iter().cloned());
        }
        parts
    }

    /// Checks if the image type contains a specific value
    pub fn contains(&self, val: &str) -> bool {
        self.pixels == val
            || self.exam == val
            || self.flavor.as_ref().is_some_and(|f| f == val)
            || self
                .extras
                .as_ref()
                .is_some_and(|e| e.iter().any(|x| x == val))
    }

    /// Whether any component declares an axial slice
    pub fn is_axial(&self) -> bool {
        self.contains("AXIAL")
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.values().join("\\"))
    }
}
