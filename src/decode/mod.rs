//! Decoding raw detector output into candidate boxes.
//!
//! The output tensor has logical shape `[1, num_channels, num_elements]` and
//! is stored channel-major: value `(channel, anchor)` lives at
//! `anchor + channel * num_elements`. Channels `0..4` hold `cx, cy, w, h` and
//! the remaining channels hold one score per class.

use crate::candidate::bbox::BoundingBox;
use crate::model::{LabelMap, OutputShape, GEOMETRY_CHANNELS};
use crate::util::{TileDetError, TileDetResult};

/// Borrowed, shape-checked raw output tensor.
#[derive(Clone, Copy, Debug)]
pub struct OutputTensor<'a> {
    data: &'a [f32],
    shape: OutputShape,
}

impl<'a> OutputTensor<'a> {
    /// Wraps `data`, which must hold exactly `num_channels * num_elements`
    /// values with at least one class channel.
    pub fn new(data: &'a [f32], num_channels: usize, num_elements: usize) -> TileDetResult<Self> {
        Self::with_shape(
            data,
            OutputShape {
                num_channels,
                num_elements,
            },
        )
    }

    /// Wraps `data` using a shape from model metadata.
    pub fn with_shape(data: &'a [f32], shape: OutputShape) -> TileDetResult<Self> {
        if shape.num_channels <= GEOMETRY_CHANNELS {
            return Err(TileDetError::InvalidModelShape {
                reason: format!(
                    "output needs more than {GEOMETRY_CHANNELS} channels, got {}",
                    shape.num_channels
                ),
            });
        }
        let expected = shape
            .num_channels
            .checked_mul(shape.num_elements)
            .ok_or(TileDetError::InvalidDimensions {
                width: shape.num_elements,
                height: shape.num_channels,
            })?;
        if data.len() != expected {
            return Err(TileDetError::TensorShapeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self { data, shape })
    }

    /// Returns the tensor shape.
    pub fn shape(&self) -> OutputShape {
        self.shape
    }

    #[inline]
    fn at(&self, channel: usize, anchor: usize) -> f32 {
        self.data[anchor + channel * self.shape.num_elements]
    }

    /// Returns `(max_score, class_index)` for one anchor; the first maximum wins.
    fn best_class(&self, anchor: usize) -> (f32, usize) {
        let mut best = (f32::NEG_INFINITY, 0usize);
        for channel in GEOMETRY_CHANNELS..self.shape.num_channels {
            let score = self.at(channel, anchor);
            if score > best.0 {
                best = (score, channel - GEOMETRY_CHANNELS);
            }
        }
        best
    }
}

#[inline]
fn in_unit_range(v: f32) -> bool {
    (0.0..=1.0).contains(&v)
}

/// Decodes every anchor of `tensor` into tile-local boxes.
///
/// An anchor is emitted only if its best class score is strictly greater than
/// `confidence_threshold` and all four corners lie in `[0, 1]`. Anchors that
/// fail either test are dropped, never clamped. No survivors yields an empty
/// vector.
pub fn decode_boxes(
    tensor: &OutputTensor<'_>,
    confidence_threshold: f32,
    labels: &LabelMap,
) -> Vec<BoundingBox> {
    let mut boxes = Vec::new();
    for anchor in 0..tensor.shape.num_elements {
        let (confidence, class_index) = tensor.best_class(anchor);
        if confidence <= confidence_threshold || !confidence.is_finite() {
            continue;
        }

        let cx = tensor.at(0, anchor);
        let cy = tensor.at(1, anchor);
        let w = tensor.at(2, anchor);
        let h = tensor.at(3, anchor);
        let corners = [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0];
        if !corners.iter().all(|&v| in_unit_range(v)) {
            continue;
        }
        boxes.push(BoundingBox::from_center(
            cx,
            cy,
            w,
            h,
            confidence,
            class_index,
            labels.resolve(class_index),
        ));
    }
    boxes
}

/// Convenience wrapper over raw parts: validates the shape, then decodes.
pub fn decode(
    data: &[f32],
    confidence_threshold: f32,
    num_channels: usize,
    num_elements: usize,
    labels: &LabelMap,
) -> TileDetResult<Vec<BoundingBox>> {
    let tensor = OutputTensor::new(data, num_channels, num_elements)?;
    Ok(decode_boxes(&tensor, confidence_threshold, labels))
}
