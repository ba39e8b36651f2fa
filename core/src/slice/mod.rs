pub mod record;

pub use record::{ContouredSlice, FinalizedSlice, ProcessingStage, SliceRecord};
