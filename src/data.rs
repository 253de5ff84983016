mod decoder_config;
mod detection_set;
mod ragged;

pub use decoder_config::DecoderConfig;
pub use detection_set::*;
pub use ragged::Ragged;
