mod base;
mod random_brightness;
mod random_flip;
mod registry;

pub use base::*;
pub use random_brightness::*;
pub use random_flip::*;
pub use registry::*;
