//! Core type definitions for CT slice contouring
//!
//! This module provides the fundamental types used throughout the ctcontour library:
//! - [`ImageType`]: Decomposed DICOM ImageType field (axial check)
//! - [`PixelSpacing`]: Physical pixel size in mm
//! - [`Phantom`]: CTDI dosimetry phantom and its SSDE coefficients
//! - [`Connectivity`]: Neighbourhood used by connected-component labelling
//! - [`MorphologyConfig`], [`TruncationConfig`], [`OutputConfig`]: Typed pipeline parameters

mod config;
mod enums;
mod image_type;
mod pixel_spacing;

pub use config::{Color, MorphologyConfig, OutputConfig, TruncationConfig};
pub use enums::{Connectivity, Phantom, PhotometricInterpretation};
pub use image_type::ImageType;
pub use pixel_spacing::PixelSpacing;
