use crate::error::Result;
use ndarray::ArrayView2;
use ndarray_npy::NpzWriter;
use std::fs::File;
use std::path::Path;

/// Array name of the body mask inside the archive
pub const MASK_KEY: &str = "mask";

/// Writes the mask to a compressed `.npz` archive under [`MASK_KEY`]
pub fn write_npz(mask: ArrayView2<bool>, path: &Path) -> Result<()> {
    let mut npz = NpzWriter::new_compressed(File::create(path)?);
    npz.add_array(MASK_KEY, &mask)?;
    npz.finish()?;
    Ok(())
}
