pub mod csv_record;
pub mod merge;
pub mod npz;
pub mod paths;
pub mod render;

pub use csv_record::{write_csv, SliceRow};
pub use merge::merge_outputs;
pub use npz::{write_npz, MASK_KEY};
pub use paths::{delete_file, ensure_dir, target_path, OutputDescriptor, OutputKind};

use crate::error::Result;
use crate::slice::FinalizedSlice;
use crate::types::{OutputConfig, TruncationConfig};
use log::info;
use std::path::{Path, PathBuf};

/// Writes the requested artifacts of finalized slices
///
/// Destination paths mirror each source under `dst_root`.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    src_root: PathBuf,
    dst_root: PathBuf,
    output: OutputConfig,
    truncation: TruncationConfig,
}

impl ArtifactWriter {
    pub fn new(
        src_root: impl Into<PathBuf>,
        dst_root: impl Into<PathBuf>,
        output: OutputConfig,
        truncation: TruncationConfig,
    ) -> Self {
        Self {
            src_root: src_root.into(),
            dst_root: dst_root.into(),
            output,
            truncation,
        }
    }

    pub fn output_config(&self) -> &OutputConfig {
        &self.output
    }

    fn target(&self, src: &Path, kind: OutputKind) -> Result<OutputDescriptor> {
        let stem = match kind {
            OutputKind::Thumbs => self.output.thumbs_stem.as_str(),
            OutputKind::Detail => self.output.detail_stem.as_str(),
            OutputKind::Trunk => self.output.trunk_stem.as_str(),
            OutputKind::Csv | OutputKind::Npz => "",
        };
        let path = target_path(&self.src_root, &self.dst_root, src, stem, kind.extension())?;
        Ok(OutputDescriptor::new(kind, path))
    }

    /// Writes every enabled artifact of one slice
    ///
    /// # Errors
    ///
    /// The first failing write aborts the slice; artifacts already written
    /// stay on disk.
    pub fn write(&self, slice: &FinalizedSlice) -> Result<Vec<OutputDescriptor>> {
        let src = slice.file_path();
        let mut written = Vec::new();

        if self.output.thumbs {
            let out = self.target(src, OutputKind::Thumbs)?;
            info!("Writing: {}", out.path.display());
            render::render_thumbs(slice, self.output.contour_color).save(&out.path)?;
            written.push(out);
        }
        if self.output.detail {
            let out = self.target(src, OutputKind::Detail)?;
            info!("Writing: {}", out.path.display());
            render::render_detail(slice)?.save(&out.path)?;
            written.push(out);
        }
        if self.output.trunk {
            let out = self.target(src, OutputKind::Trunk)?;
            info!("Writing: {}", out.path.display());
            render::render_truncation(slice, &self.truncation).save(&out.path)?;
            written.push(out);
        }
        if self.output.npz {
            let out = self.target(src, OutputKind::Npz)?;
            info!("Writing: {}", out.path.display());
            write_npz(slice.contour().mask(), &out.path)?;
            written.push(out);
        }
        if self.output.csv {
            let out = self.target(src, OutputKind::Csv)?;
            info!("Writing: {}", out.path.display());
            write_csv(slice, &out.path)?;
            written.push(out);
        }

        Ok(written)
    }
}
