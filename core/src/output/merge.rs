//! Per-directory merging of slice artifacts
//!
//! Runs once after every slice has been written. Inputs are exactly the
//! descriptors returned by the slice tasks, grouped by directory and kind.

use super::paths::{delete_file, OutputDescriptor, OutputKind};
use crate::error::{CtContourError, Result};
use crate::types::OutputConfig;
use image::{imageops, RgbImage};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Merges the artifacts of a batch as requested by `config`
///
/// Returns the paths of the merged files written.
pub fn merge_outputs(
    descriptors: &[OutputDescriptor],
    config: &OutputConfig,
) -> Result<Vec<PathBuf>> {
    let mut groups: BTreeMap<(PathBuf, OutputKind), Vec<PathBuf>> = BTreeMap::new();
    for descriptor in descriptors {
        groups
            .entry((descriptor.directory().to_path_buf(), descriptor.kind))
            .or_default()
            .push(descriptor.path.clone());
    }

    let mut written = Vec::new();
    for ((dir, kind), mut inputs) in groups {
        inputs.sort();
        inputs.dedup();
        let dirname = directory_name(&dir);
        match kind {
            OutputKind::Csv if config.merge_csv => {
                let target = dir.join(format!("{}.csv", dirname));
                if merge_csv_files(&inputs, &target)? {
                    written.push(target);
                }
            }
            kind if kind.is_image() && config.merge_images => {
                let prefix = format!("{}{}", dirname, image_stem(kind, config));
                written.extend(merge_image_files(&inputs, &dir, &prefix, config.chunk_size)?);
            }
            _ => debug!("Not merging {} outputs in {}", kind, dir.display()),
        }
    }
    Ok(written)
}

fn directory_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "merged".to_string())
}

fn image_stem(kind: OutputKind, config: &OutputConfig) -> &str {
    match kind {
        OutputKind::Detail => &config.detail_stem,
        OutputKind::Trunk => &config.trunk_stem,
        _ => &config.thumbs_stem,
    }
}

fn read_csv(path: &Path) -> Result<(csv::StringRecord, Vec<csv::StringRecord>)> {
    let unreadable = |e: csv::Error| CtContourError::MergeReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let mut reader = csv::Reader::from_path(path).map_err(unreadable)?;
    let headers = reader.headers().map_err(unreadable)?.clone();
    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(unreadable)?;
    Ok((headers, rows))
}

/// Concatenates CSV rows under the header of the first readable input
///
/// The target is never read as an input. Returns whether anything was
/// written; inputs are deleted only after the target is complete.
pub fn merge_csv_files(inputs: &[PathBuf], target: &Path) -> Result<bool> {
    let mut header = None;
    let mut rows = Vec::new();
    let mut merged = Vec::new();

    for path in inputs.iter().filter(|p| p.as_path() != target) {
        match read_csv(path) {
            Ok((h, r)) => {
                header.get_or_insert(h);
                rows.extend(r);
                merged.push(path);
            }
            Err(e) => warn!("Skipping: {}", e),
        }
    }

    let Some(header) = header else {
        return Ok(false);
    };

    let mut writer = csv::Writer::from_path(target)?;
    writer.write_record(&header)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    info!("Merged {} CSV files into {}", merged.len(), target.display());

    for path in merged {
        delete_file(path);
    }
    Ok(true)
}

/// Whether `path` is a merged image named `<prefix>_<n>.png`
fn is_merged_image(path: &Path, prefix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix(prefix))
        .and_then(|n| n.strip_prefix('_'))
        .and_then(|n| n.strip_suffix(".png"))
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

fn read_image(path: &Path) -> Result<RgbImage> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|e| CtContourError::MergeReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Stacks images top to bottom, left-aligned on a black canvas as wide as
/// the widest input
pub fn stack_vertically(images: &[RgbImage]) -> RgbImage {
    let width = images.iter().map(RgbImage::width).max().unwrap_or(0);
    let height = images.iter().map(RgbImage::height).sum();
    let mut canvas = RgbImage::new(width, height);
    let mut y = 0_i64;
    for img in images {
        imageops::replace(&mut canvas, img, 0, y);
        y += img.height() as i64;
    }
    canvas
}

/// Writes `<dir>/<prefix>_<n>.png` for each chunk of at most `chunk_size`
/// inputs, numbered from 0
///
/// Previously merged files matching the naming scheme are not inputs.
pub fn merge_image_files(
    inputs: &[PathBuf],
    dir: &Path,
    prefix: &str,
    chunk_size: usize,
) -> Result<Vec<PathBuf>> {
    let inputs: Vec<&PathBuf> = inputs
        .iter()
        .filter(|p| !is_merged_image(p, prefix))
        .collect();

    let mut written = Vec::new();
    let mut merged = Vec::new();
    for (chunk_num, chunk) in inputs.chunks(chunk_size.max(1)).enumerate() {
        let mut images = Vec::with_capacity(chunk.len());
        for path in chunk {
            match read_image(path) {
                Ok(img) => {
                    images.push(img);
                    merged.push(*path);
                }
                Err(e) => warn!("Skipping: {}", e),
            }
        }
        if images.is_empty() {
            continue;
        }

        let target = dir.join(format!("{}_{}.png", prefix, chunk_num));
        stack_vertically(&images).save(&target)?;
        info!("Merged {} images into {}", images.len(), target.display());
        written.push(target);
    }

    for path in merged {
        delete_file(path);
    }
    Ok(written)
}
