mod box_format;
mod box_set;
mod bvr_box;
mod bvr_detection;

pub use box_format::*;
pub use box_set::*;
pub use bvr_box::*;
pub use bvr_detection::*;
