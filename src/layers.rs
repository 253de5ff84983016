mod anchor_generator;
mod multi_class_nms;
pub mod nms;

pub use anchor_generator::*;
pub use multi_class_nms::*;
