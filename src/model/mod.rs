//! Inference engine boundary and model metadata.
//!
//! The detector network is a black box behind [`InferenceEngine`]. Its tensor
//! shapes are read once into a [`ModelInfo`] and stay fixed for the lifetime
//! of the engine.

use crate::util::{EngineError, TileDetError, TileDetResult};

pub mod labels;

pub use labels::LabelMap;

/// Number of geometry channels (`cx, cy, w, h`) ahead of the class scores.
pub const GEOMETRY_CHANNELS: usize = 4;

/// Network input shape `[1, height, width, 3]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputShape {
    /// Input height in pixels.
    pub height: usize,
    /// Input width in pixels.
    pub width: usize,
}

impl InputShape {
    /// Number of f32 values in one input tensor, `None` on overflow.
    pub fn checked_len(&self) -> Option<usize> {
        self.height.checked_mul(self.width)?.checked_mul(3)
    }

    /// Number of f32 values in one input tensor.
    ///
    /// Saturates for shapes that [`ModelInfo`] would reject as too large.
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    /// Returns true when the shape holds no values.
    pub fn is_empty(&self) -> bool {
        self.checked_len() == Some(0)
    }
}

/// Network output shape `[1, num_channels, num_elements]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputShape {
    /// Geometry channels plus one score channel per class.
    pub num_channels: usize,
    /// Number of anchor positions.
    pub num_elements: usize,
}

impl OutputShape {
    /// Number of f32 values in one output tensor, `None` on overflow.
    pub fn checked_len(&self) -> Option<usize> {
        self.num_channels.checked_mul(self.num_elements)
    }

    /// Number of f32 values in one output tensor.
    ///
    /// Saturates for shapes that [`ModelInfo`] would reject as too large.
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    /// Returns true when the shape holds no values.
    pub fn is_empty(&self) -> bool {
        self.checked_len() == Some(0)
    }

    /// Number of class score channels.
    pub fn num_classes(&self) -> usize {
        self.num_channels.saturating_sub(GEOMETRY_CHANNELS)
    }
}

/// Validated tensor shapes of a single-input, single-output detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelInfo {
    input: InputShape,
    output: OutputShape,
}

impl ModelInfo {
    /// Builds metadata from already-split dimensions.
    pub fn new(input: InputShape, output: OutputShape) -> TileDetResult<Self> {
        if input.checked_len().is_none() {
            return Err(invalid_shape(format!(
                "input {}x{} is too large",
                input.width, input.height
            )));
        }
        if output.checked_len().is_none() {
            return Err(invalid_shape(format!(
                "output {}x{} is too large",
                output.num_channels, output.num_elements
            )));
        }
        if input.is_empty() {
            return Err(invalid_shape(format!(
                "input must be non-empty, got {}x{}",
                input.width, input.height
            )));
        }
        if output.num_elements == 0 {
            return Err(invalid_shape("output must have at least one anchor".into()));
        }
        if output.num_channels <= GEOMETRY_CHANNELS {
            return Err(invalid_shape(format!(
                "output needs more than {GEOMETRY_CHANNELS} channels, got {}",
                output.num_channels
            )));
        }
        Ok(Self { input, output })
    }

    /// Builds metadata from raw tensor dimensions as reported by an engine.
    ///
    /// `input_dims` must be `[1, height, width, 3]` and `output_dims` must be
    /// `[1, num_channels, num_elements]`.
    pub fn from_dims(input_dims: &[usize], output_dims: &[usize]) -> TileDetResult<Self> {
        let &[in_batch, height, width, in_channels] = input_dims else {
            return Err(invalid_shape(format!(
                "input rank must be 4, got {}",
                input_dims.len()
            )));
        };
        let &[out_batch, num_channels, num_elements] = output_dims else {
            return Err(invalid_shape(format!(
                "output rank must be 3, got {}",
                output_dims.len()
            )));
        };
        if in_batch != 1 || out_batch != 1 {
            return Err(invalid_shape(format!(
                "batch size must be 1, got input {in_batch} output {out_batch}"
            )));
        }
        if in_channels != 3 {
            return Err(invalid_shape(format!(
                "input must have 3 color channels, got {in_channels}"
            )));
        }
        Self::new(
            InputShape { height, width },
            OutputShape {
                num_channels,
                num_elements,
            },
        )
    }

    /// Returns the input tensor shape.
    pub fn input(&self) -> InputShape {
        self.input
    }

    /// Returns the output tensor shape.
    pub fn output(&self) -> OutputShape {
        self.output
    }
}

fn invalid_shape(reason: String) -> TileDetError {
    TileDetError::InvalidModelShape { reason }
}

/// A fixed-shape detector network.
///
/// `infer` receives one preprocessed `[1, H, W, 3]` tensor and fills `output`
/// with the raw `[1, C, E]` result. Each call is independent; engines are
/// shared across tile workers, hence `Send + Sync`.
pub trait InferenceEngine: Send + Sync {
    /// Tensor shapes this engine was loaded with.
    fn model_info(&self) -> &ModelInfo;

    /// Runs the network on one input tensor.
    fn infer(&self, input: &[f32], output: &mut [f32]) -> Result<(), EngineError>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for &E {
    fn model_info(&self) -> &ModelInfo {
        (**self).model_info()
    }

    fn infer(&self, input: &[f32], output: &mut [f32]) -> Result<(), EngineError> {
        (**self).infer(input, output)
    }
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    fn model_info(&self) -> &ModelInfo {
        (**self).model_info()
    }

    fn infer(&self, input: &[f32], output: &mut [f32]) -> Result<(), EngineError> {
        (**self).infer(input, output)
    }
}

/// Engine backed by a closure, for host runtimes and test stubs.
pub struct FnEngine<F> {
    info: ModelInfo,
    infer_fn: F,
}

impl<F> FnEngine<F>
where
    F: Fn(&[f32], &mut [f32]) -> Result<(), EngineError> + Send + Sync,
{
    /// Wraps `infer_fn` with the given tensor shapes.
    pub fn new(info: ModelInfo, infer_fn: F) -> Self {
        Self { info, infer_fn }
    }
}

impl<F> InferenceEngine for FnEngine<F>
where
    F: Fn(&[f32], &mut [f32]) -> Result<(), EngineError> + Send + Sync,
{
    fn model_info(&self) -> &ModelInfo {
        &self.info
    }

    fn infer(&self, input: &[f32], output: &mut [f32]) -> Result<(), EngineError> {
        (self.infer_fn)(input, output)
    }
}
