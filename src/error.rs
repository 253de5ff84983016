use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BvrError {
    #[error("Invalid bounding box encoding: {0}")]
    InvalidEncoding(String),
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Missing input: {0}")]
    MissingInput(&'static str),
    #[error("Unknown augmentation: {0}")]
    UnknownAugmentation(String),
}
