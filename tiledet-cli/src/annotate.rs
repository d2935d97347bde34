//! Box overlays for the annotated output image.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tiledet::BoundingBox;

/// Outline colour for detections.
pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Default outline thickness in pixels.
pub const DEFAULT_STROKE_WIDTH: u32 = 8;

/// Draws a `stroke_width` pixel red outline around every box.
///
/// The stroke grows inward from the box edge, so outlines never leave the
/// image and small boxes end up filled.
pub fn draw_boxes(img: &mut RgbImage, boxes: &[BoundingBox], stroke_width: u32) {
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return;
    }
    let clamp = |v: f32, len: u32| v.round().clamp(0.0, (len - 1) as f32) as i32;
    for b in boxes {
        let rect = b.to_pixels(width as usize, height as usize);
        let (left, right) = (clamp(rect.left, width), clamp(rect.right, width));
        let (top, bottom) = (clamp(rect.top, height), clamp(rect.bottom, height));
        for inset in 0..stroke_width.max(1) as i32 {
            let (l, t, r, btm) = (left + inset, top + inset, right - inset, bottom - inset);
            if l > r || t > btm {
                break;
            }
            let outline = Rect::at(l, t).of_size((r - l + 1) as u32, (btm - t + 1) as u32);
            draw_hollow_rect_mut(img, outline, BOX_COLOR);
        }
    }
}
