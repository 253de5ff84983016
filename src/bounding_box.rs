mod convert;
mod iou;

pub use convert::*;
pub use iou::*;
