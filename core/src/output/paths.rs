use crate::error::{CtContourError, Result};
use log::{debug, warn};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Kind of per-slice artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputKind {
    Detail,
    Thumbs,
    Trunk,
    Csv,
    Npz,
}

impl OutputKind {
    /// Whether the artifact is a figure
    pub fn is_image(&self) -> bool {
        matches!(self, OutputKind::Detail | OutputKind::Thumbs | OutputKind::Trunk)
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputKind::Detail | OutputKind::Thumbs | OutputKind::Trunk => "png",
            OutputKind::Csv => "csv",
            OutputKind::Npz => "npz",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputKind::Detail => "detail",
            OutputKind::Thumbs => "thumbs",
            OutputKind::Trunk => "trunk",
            OutputKind::Csv => "csv",
            OutputKind::Npz => "npz",
        };
        write!(f, "{}", name)
    }
}

/// An artifact written for one slice
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputDescriptor {
    pub kind: OutputKind,
    pub path: PathBuf,
}

impl OutputDescriptor {
    pub fn new(kind: OutputKind, path: PathBuf) -> Self {
        Self { kind, path }
    }

    /// Directory holding the artifact
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Builds the destination path of an artifact and creates its directory
///
/// The source path relative to `src_root` is mirrored under `dst_root`, the
/// stem gets `stem_suffix` appended and the extension becomes `extension`.
/// When `src_root` is a file its parent directory is used as the root.
///
/// # Arguments
///
/// * `src_root` - Top-level source (file or directory)
/// * `dst_root` - Top-level destination directory
/// * `src` - Source file being processed
/// * `stem_suffix` - Text appended to the file stem, like `_thumbs`
/// * `extension` - New extension without the dot
///
/// # Errors
///
/// Returns `OutputPathError` if the destination directory cannot be created.
pub fn target_path(
    src_root: &Path,
    dst_root: &Path,
    src: &Path,
    stem_suffix: &str,
    extension: &str,
) -> Result<PathBuf> {
    let root = if src_root.is_file() {
        src_root.parent().unwrap_or_else(|| Path::new(""))
    } else {
        src_root
    };

    let relative = src
        .strip_prefix(root)
        .ok()
        .filter(|rel| rel.file_name().is_some())
        .map(Path::to_path_buf)
        .or_else(|| src.file_name().map(PathBuf::from))
        .ok_or_else(|| CtContourError::OutputPathError {
            path: src.to_path_buf(),
            reason: "source has no file name".to_string(),
        })?;

    let mirrored = dst_root.join(relative);
    let stem = mirrored
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let target = mirrored.with_file_name(format!("{}{}.{}", stem, stem_suffix, extension));

    if let Some(parent) = target.parent() {
        ensure_dir(parent)?;
    }
    Ok(target)
}

/// Creates a directory and its parents; an existing directory is fine
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| CtContourError::OutputPathError {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!("Created directory {}", dir.display());
    Ok(())
}

/// Deletes a file; a missing file is logged and ignored
pub fn delete_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{} does not exist", path.display());
        }
        Err(e) => warn!("Could not delete {}: {}", path.display(), e),
    }
}
