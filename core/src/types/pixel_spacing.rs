use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Pixel spacing in millimeters (row, column)
///
/// Physical distance between the centres of adjacent pixels,
/// as stored in the PixelSpacing attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct PixelSpacing {
    pub row: f64,
    pub col: f64,
}

impl PixelSpacing {
    /// Creates a new PixelSpacing
    pub fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }

    /// Builds spacing from the decoded multi-valued attribute
    ///
    /// Returns `None` unless at least two values are present.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        match values {
            [row, col, ..] => Some(Self::new(*row, *col)),
            _ => None,
        }
    }

    /// Parses pixel spacing from string
    ///
    /// Accepts formats like:
    /// - "0.976562\\0.976562"
    /// - "0.7 0.7"
    /// - "[0.7, 0.7]"
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed
    pub fn parse(s: &str) -> Result<Self, String> {
        static REGEX: OnceLock<Regex> = OnceLock::new();
        let re = REGEX.get_or_init(|| {
            Regex::new(r"[-+]?\d*\.?\d+(?:[eE][-+]?\d+)?").expect("Failed to compile regex")
        });

        let values = re
            .find_iter(s)
            .map(|m| {
                m.as_str()
                    .parse::<f64>()
                    .map_err(|e| format!("Failed to parse spacing value: {}", e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_values(&values)
            .ok_or_else(|| format!("Failed to parse PixelSpacing from '{}'", s))
    }

    /// Area covered by a single pixel in mm²
    pub fn pixel_area_mm2(&self) -> f64 {
        self.row * self.col
    }
}

impl fmt::Display for PixelSpacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} mm", self.row, self.col)
    }
}
