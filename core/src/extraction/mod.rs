pub mod image_type;
pub mod phantom;
pub mod pixel_data;
pub mod tags;

pub use image_type::{extract_image_type, require_axial};
pub use phantom::extract_phantom_label;
pub use pixel_data::{extract_raw_pixels, PixelLayout};
pub use tags::*;
