pub mod binary;
pub mod label;

pub use binary::{close, count, dilate, erode, fill_holes, threshold_above, StructuringElement};
pub use label::{
    remove_small_objects, BoundingBox, ComponentSelector, Labels, RegionProps,
    SelectedComponents, Selection, ShapeMetric, DESPECKLE_CONNECTIVITY,
};
