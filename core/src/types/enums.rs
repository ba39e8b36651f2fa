use std::fmt;

/// CTDI dosimetry phantom used to report CTDIvol
///
/// Selects the AAPM Report 220 conversion coefficients used to turn a
/// reference dose index into a size-specific dose estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum Phantom {
    /// 32 cm body phantom
    Body,
    /// 16 cm head phantom
    Head,
}

impl Phantom {
    /// Code meaning of the 32 cm phantom in CTDIPhantomTypeCodeSequence
    pub const BODY_LABEL: &'static str = "IEC Body Dosimetry Phantom";

    /// Code meaning of the 16 cm phantom in CTDIPhantomTypeCodeSequence
    pub const HEAD_LABEL: &'static str = "IEC Head Dosimetry Phantom";

    /// Matches a phantom code meaning exactly
    ///
    /// Any other label (including case or whitespace variants) is not
    /// recognised and yields `None`.
    pub fn from_code_meaning(label: &str) -> Option<Self> {
        match label {
            Self::BODY_LABEL => Some(Phantom::Body),
            Self::HEAD_LABEL => Some(Phantom::Head),
            _ => None,
        }
    }

    /// Returns the code meaning for this phantom
    pub fn label(&self) -> &'static str {
        match self {
            Phantom::Body => Self::BODY_LABEL,
            Phantom::Head => Self::HEAD_LABEL,
        }
    }

    /// Exponential fit `(a, b)` for `f = a * exp(-b * wed_cm)`
    pub fn conversion_coefficients(&self) -> (f64, f64) {
        match self {
            Phantom::Body => (3.704369, 0.03671937),
            Phantom::Head => (1.874799, 0.03871313),
        }
    }
}

impl fmt::Display for Phantom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Photometric interpretation of the stored pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub enum PhotometricInterpretation {
    Unknown,
    Monochrome1,
    Monochrome2,
    PaletteColor,
    Rgb,
    YbrFull,
}

impl PhotometricInterpretation {
    /// Returns whether this is a monochrome interpretation
    pub fn is_monochrome(&self) -> bool {
        matches!(
            self,
            PhotometricInterpretation::Monochrome1 | PhotometricInterpretation::Monochrome2
        )
    }

    /// Parses photometric interpretation from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "MONOCHROME1" => PhotometricInterpretation::Monochrome1,
            "MONOCHROME2" => PhotometricInterpretation::Monochrome2,
            "PALETTE COLOR" => PhotometricInterpretation::PaletteColor,
            "RGB" => PhotometricInterpretation::Rgb,
            "YBR_FULL" => PhotometricInterpretation::YbrFull,
            _ => PhotometricInterpretation::Unknown,
        }
    }
}

impl fmt::Display for PhotometricInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhotometricInterpretation::Unknown => "UNKNOWN",
            PhotometricInterpretation::Monochrome1 => "MONOCHROME1",
            PhotometricInterpretation::Monochrome2 => "MONOCHROME2",
            PhotometricInterpretation::PaletteColor => "PALETTE COLOR",
            PhotometricInterpretation::Rgb => "RGB",
            PhotometricInterpretation::YbrFull => "YBR_FULL",
        };
        write!(f, "{}", name)
    }
}

/// Neighbourhood used when labelling connected regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Connectivity {
    /// Edge-sharing neighbours only
    Four,
    /// Edge- and corner-sharing neighbours
    #[default]
    Eight,
}

impl Connectivity {
    /// Neighbour offsets `(drow, dcol)` for this policy
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        const N4: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
        const N8: [(isize, isize); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];
        match self {
            Connectivity::Four => &N4,
            Connectivity::Eight => &N8,
        }
    }
}
