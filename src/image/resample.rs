//! Tile preprocessing into network input tensors.
//!
//! A tile is resized to the network input resolution with unfiltered
//! nearest-neighbour sampling and written as `[1, height, width, 3]` f32 in
//! NHWC order. Each channel is rescaled as `(value - mean) / std`.

use crate::image::ImageView;
use crate::util::{TileDetError, TileDetResult};

/// Per-channel linear rescaling applied to every pixel value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalization {
    /// Value subtracted from each channel.
    pub mean: f32,
    /// Divisor applied after subtracting the mean.
    pub std: f32,
}

impl Default for Normalization {
    /// Maps 8-bit channels to `[0, 1]`.
    fn default() -> Self {
        Self {
            mean: 0.0,
            std: 255.0,
        }
    }
}

impl Normalization {
    pub(crate) fn validate(&self) -> TileDetResult<()> {
        if !self.mean.is_finite() || !self.std.is_finite() || self.std == 0.0 {
            return Err(TileDetError::InvalidConfig(
                "normalization mean and std must be finite with std != 0",
            ));
        }
        Ok(())
    }

    #[inline]
    fn apply(&self, value: u8) -> f32 {
        (f32::from(value) - self.mean) / self.std
    }
}

/// Maps destination index `dst` to a source index with center sampling.
#[inline]
fn nearest_index(dst: usize, src_len: usize, dst_len: usize) -> usize {
    // Widened so `(2 * dst + 1) * src_len` cannot overflow.
    let idx = (2 * dst as u128 + 1) * src_len as u128 / (2 * dst_len as u128);
    (idx as usize).min(src_len - 1)
}

/// Number of f32 values in a `width x height` RGB tensor.
fn tensor_len(width: usize, height: usize) -> TileDetResult<usize> {
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(3))
        .ok_or(TileDetError::InvalidDimensions { width, height })
}

/// Resizes `tile` to `dst_width x dst_height` and writes the normalized RGB
/// values into `out` in NHWC order.
///
/// `out` must hold exactly `dst_width * dst_height * 3` values.
pub fn resize_normalize_into(
    tile: ImageView<'_>,
    dst_width: usize,
    dst_height: usize,
    norm: Normalization,
    out: &mut [f32],
) -> TileDetResult<()> {
    if dst_width == 0 || dst_height == 0 {
        return Err(TileDetError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }
    let expected = tensor_len(dst_width, dst_height)?;
    if out.len() != expected {
        return Err(TileDetError::TensorShapeMismatch {
            expected,
            got: out.len(),
        });
    }

    let channels = tile.format().channels();
    let src_width = tile.width();
    let src_height = tile.height();
    let x_map: Vec<usize> = (0..dst_width)
        .map(|dx| nearest_index(dx, src_width, dst_width) * channels)
        .collect();

    for (dy, out_row) in out.chunks_exact_mut(dst_width * 3).enumerate() {
        let sy = nearest_index(dy, src_height, dst_height);
        let row = tile.row(sy).ok_or(TileDetError::BufferTooSmall {
            needed: sy * tile.stride() + src_width * channels,
            got: tile.as_slice().len(),
        })?;
        for (px, &sx) in out_row.chunks_exact_mut(3).zip(x_map.iter()) {
            px[0] = norm.apply(row[sx]);
            px[1] = norm.apply(row[sx + 1]);
            px[2] = norm.apply(row[sx + 2]);
        }
    }
    Ok(())
}

/// Allocating variant of [`resize_normalize_into`].
pub fn resize_normalize(
    tile: ImageView<'_>,
    dst_width: usize,
    dst_height: usize,
    norm: Normalization,
) -> TileDetResult<Vec<f32>> {
    let mut out = vec![0.0f32; tensor_len(dst_width, dst_height)?];
    resize_normalize_into(tile, dst_width, dst_height, norm, &mut out)?;
    Ok(out)
}
