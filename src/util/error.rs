//! Error types for tiledet.

use thiserror::Error;

/// Result alias for tiledet operations.
pub type Result<T> = std::result::Result<T, TileDetError>;

/// Failure reported by an inference engine for a single call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct EngineError {
    /// Human-readable failure description from the engine.
    pub reason: String,
}

impl EngineError {
    /// Creates an engine error from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur when running tiled detection.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TileDetError {
    /// Image or buffer dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than a row of pixels.
    #[error("invalid stride: row needs {row_len} elements, stride is {stride}")]
    InvalidStride { row_len: usize, stride: usize },
    /// Backing buffer is shorter than the described image or tensor.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A requested region does not fit inside the image.
    #[error(
        "roi out of bounds: ({x}, {y}) {width}x{height} in {img_width}x{img_height} image"
    )]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// A raw output buffer does not match the declared tensor shape.
    #[error("tensor shape mismatch: expected {expected} values, got {got}")]
    TensorShapeMismatch { expected: usize, got: usize },
    /// Model metadata does not describe a supported detector.
    #[error("invalid model shape: {reason}")]
    InvalidModelShape { reason: String },
    /// Detection parameters are out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// The engine failed while running one tile.
    #[error("inference failed on tile {tile}: {source}")]
    Inference {
        tile: usize,
        #[source]
        source: EngineError,
    },
    /// Image loading failed.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
    /// Label file loading failed.
    #[error("label io error: {reason}")]
    LabelIo { reason: String },
}
