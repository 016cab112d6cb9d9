use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SittingError {
    /// The detector returned no result structure for a still image.
    #[error("detector returned no result for the image")]
    NoDetections,
    #[error("invalid sitting configuration: {0}")]
    InvalidConfig(String),
}
