pub mod report;

use crate::types::{Color, Connectivity, MorphologyConfig, OutputConfig, TruncationConfig};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for ctcontour
#[derive(Parser, Debug)]
#[command(name = "ctcontour")]
#[command(about = "Body contouring, WED/SSDE and truncation detection for axial CT DICOM slices")]
#[command(version)]
pub struct Cli {
    /// DICOM file or directory of DICOM files
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory receiving the artifacts, mirroring the source tree
    #[arg(value_name = "DESTINATION")]
    pub destination: PathBuf,

    /// Write original/contour thumbnails
    #[arg(long)]
    pub thumbs: bool,

    /// Write a figure of every pipeline step
    #[arg(long)]
    pub detail: bool,

    /// Write the truncation overlay
    #[arg(long)]
    pub trunk: bool,

    /// Write the mask as a compressed .npz archive
    #[arg(long)]
    pub npz: bool,

    /// Write metrics and flags as a one-row CSV
    #[arg(long)]
    pub csv: bool,

    /// Process slices one at a time on the main thread
    #[arg(long)]
    pub single: bool,

    /// Descend into subdirectories of the source
    #[arg(short, long)]
    pub recursive: bool,

    /// Merge images per directory into <dir><stem>_<n>.png
    #[arg(long)]
    pub merge_images: bool,

    /// Merge CSV rows per directory into <dir>.csv
    #[arg(long)]
    pub merge_csv: bool,

    /// Maximum images per merged file
    #[arg(long, default_value_t = 500)]
    pub chunk_size: usize,

    /// Foreground threshold (HU)
    #[arg(long, default_value_t = -260, allow_negative_numbers = true)]
    pub threshold: i16,

    /// Number of largest regions kept
    #[arg(long, default_value_t = 4)]
    pub areas: usize,

    /// Side of the erosion square (px)
    #[arg(long, default_value_t = 4)]
    pub erosion_diam: usize,

    /// Side of the dilation square (px)
    #[arg(long, default_value_t = 4)]
    pub dilation_diam: usize,

    /// Despeckle floor (px)
    #[arg(long, default_value_t = 300)]
    pub small_objects_size: usize,

    /// Radius of the closing disk (px)
    #[arg(long, default_value_t = 2)]
    pub close_radius: usize,

    /// Regions at or above this eccentricity are dropped
    #[arg(long, default_value_t = 0.99)]
    pub eccentricity: f64,

    /// Label regions with edge-sharing neighbours only
    #[arg(long)]
    pub four_connected: bool,

    /// Outline colour in thumbnails (name or #rrggbb)
    #[arg(long, default_value = "white", value_parser = parse_color)]
    pub contour_color: Color,

    /// Report format for a single-file source
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

fn parse_color(s: &str) -> Result<Color, String> {
    Color::parse(s).ok_or_else(|| format!("unknown colour '{}'", s))
}

impl Cli {
    pub fn morphology_config(&self) -> MorphologyConfig {
        let connectivity = if self.four_connected {
            Connectivity::Four
        } else {
            Connectivity::Eight
        };
        MorphologyConfig::default()
            .with_threshold(self.threshold)
            .with_erosion_dilation(self.erosion_diam, self.dilation_diam)
            .with_small_objects_size(self.small_objects_size)
            .with_close_radius(self.close_radius)
            .with_eccentricity(self.eccentricity)
            .with_areas(self.areas)
            .with_connectivity(connectivity)
    }

    pub fn truncation_config(&self) -> TruncationConfig {
        TruncationConfig::default()
    }

    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            thumbs: self.thumbs,
            detail: self.detail,
            trunk: self.trunk,
            csv: self.csv,
            npz: self.npz,
            merge_images: self.merge_images,
            merge_csv: self.merge_csv,
            chunk_size: self.chunk_size,
            contour_color: self.contour_color,
            ..OutputConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_parameters() {
        let cli = Cli::parse_from(["ctcontour", "in", "out"]);
        assert_eq!(cli.morphology_config(), MorphologyConfig::default());
        assert_eq!(cli.output_config(), OutputConfig::default());
        assert!(!cli.single);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "ctcontour",
            "in",
            "out",
            "--threshold",
            "-300",
            "--areas",
            "1",
            "--csv",
            "--merge-csv",
            "--chunk-size",
            "10",
            "--contour-color",
            "#ff0000",
            "--four-connected",
        ]);
        let morphology = cli.morphology_config();
        assert_eq!(morphology.threshold, -300);
        assert_eq!(morphology.areas, 1);
        assert_eq!(morphology.connectivity, Connectivity::Four);

        let output = cli.output_config();
        assert!(output.csv && output.merge_csv);
        assert_eq!(output.chunk_size, 10);
        assert_eq!(output.contour_color, Color::RED);
    }

    #[test]
    fn test_rejects_unknown_colour() {
        let result = Cli::try_parse_from(["ctcontour", "in", "out", "--contour-color", "mauve"]);
        assert!(result.is_err());
    }
}
