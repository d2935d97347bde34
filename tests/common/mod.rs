#![allow(dead_code)]

use tiledet::{EngineError, FnEngine, InferenceEngine, ModelInfo, OwnedImage};

/// Tensor shapes used by the stub engines: 32x32 input, 1 class, 4 anchors.
pub const INPUT_SIZE: usize = 32;
pub const NUM_CHANNELS: usize = 5;
pub const NUM_ELEMENTS: usize = 4;

pub fn model_info() -> ModelInfo {
    ModelInfo::from_dims(
        &[1, INPUT_SIZE, INPUT_SIZE, 3],
        &[1, NUM_CHANNELS, NUM_ELEMENTS],
    )
    .unwrap()
}

/// Writes one anchor into a channel-major `[1, NUM_CHANNELS, NUM_ELEMENTS]` buffer.
pub fn write_anchor(
    output: &mut [f32],
    anchor: usize,
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
    score: f32,
) {
    output[anchor] = cx;
    output[anchor + NUM_ELEMENTS] = cy;
    output[anchor + 2 * NUM_ELEMENTS] = w;
    output[anchor + 3 * NUM_ELEMENTS] = h;
    output[anchor + 4 * NUM_ELEMENTS] = score;
}

/// Engine that always reports one confident box centered in its input.
pub fn centered_engine(
    score: f32,
) -> impl InferenceEngine {
    FnEngine::new(model_info(), move |_input: &[f32], output: &mut [f32]| {
        write_anchor(output, 0, 0.5, 0.5, 0.2, 0.2, score);
        Ok(())
    })
}

/// Engine that finds bright pixels (red channel > 0.5) in its input and
/// reports their bounding rectangle. Confidence grows with the blob's
/// horizontal position so duplicates from different tiles are distinguishable.
pub fn blob_engine() -> impl InferenceEngine {
    FnEngine::new(model_info(), |input: &[f32], output: &mut [f32]| {
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0usize;
        let mut max_y = 0usize;
        for y in 0..INPUT_SIZE {
            for x in 0..INPUT_SIZE {
                if input[(y * INPUT_SIZE + x) * 3] > 0.5 {
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }
        if min_x == usize::MAX {
            return Ok(());
        }
        let size = INPUT_SIZE as f32;
        let x1 = min_x as f32 / size;
        let y1 = min_y as f32 / size;
        let x2 = (max_x + 1) as f32 / size;
        let y2 = (max_y + 1) as f32 / size;
        let cx = (x1 + x2) / 2.0;
        let cy = (y1 + y2) / 2.0;
        write_anchor(output, 0, cx, cy, x2 - x1, y2 - y1, 0.5 + 0.4 * cx);
        Ok(())
    })
}

/// Engine that fails on every call.
pub fn failing_engine() -> impl InferenceEngine {
    FnEngine::new(model_info(), |_input: &[f32], _output: &mut [f32]| {
        Err(EngineError::new("device lost"))
    })
}

/// Black RGB image with white rectangles `(x, y, w, h)` painted on it.
pub fn image_with_blobs(width: usize, height: usize, blobs: &[(usize, usize, usize, usize)]) -> OwnedImage {
    let mut img = OwnedImage::filled_rgb(width, height, [0, 0, 0]).unwrap();
    let data = img.data_mut();
    for &(bx, by, bw, bh) in blobs {
        for y in by..by + bh {
            for x in bx..bx + bw {
                let idx = (y * width + x) * 3;
                data[idx..idx + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
    }
    img
}
