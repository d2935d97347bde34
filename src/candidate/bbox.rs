//! Normalized detection boxes and overlap measures.

/// A detection in normalized `[0, 1]` coordinates.
///
/// The coordinate space is whatever the box currently lives in: tile-local
/// right after decoding, image-global after [`BoundingBox::remap`]. Center and
/// size always describe the same space as the corners.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
    /// Horizontal center.
    pub cx: f32,
    /// Vertical center.
    pub cy: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
    /// Highest class score for the anchor.
    pub confidence: f32,
    /// Arg-max class channel.
    pub class_index: usize,
    /// Resolved label for `class_index`.
    pub class_name: String,
}

/// Pixel-space rectangle for rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRect {
    /// Left edge, `x1 * width`.
    pub left: f32,
    /// Top edge, `y1 * height`.
    pub top: f32,
    /// Right edge, `x2 * width`.
    pub right: f32,
    /// Bottom edge, `y2 * height`.
    pub bottom: f32,
}

impl BoundingBox {
    /// Builds a box from its center and size.
    pub fn from_center(
        cx: f32,
        cy: f32,
        w: f32,
        h: f32,
        confidence: f32,
        class_index: usize,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
            cx,
            cy,
            w,
            h,
            confidence,
            class_index,
            class_name: class_name.into(),
        }
    }

    /// Builds a box from its corners.
    pub fn from_corners(
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        confidence: f32,
        class_index: usize,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            cx: (x1 + x2) / 2.0,
            cy: (y1 + y2) / 2.0,
            w: x2 - x1,
            h: y2 - y1,
            confidence,
            class_index,
            class_name: class_name.into(),
        }
    }

    /// Area computed from the current corners.
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    /// Maps a tile-local box into image-global normalized coordinates.
    ///
    /// The tile sits at pixel offset `(tile_x, tile_y)` with actual size
    /// `tile_width x tile_height` inside an `image_width x image_height` image.
    /// Each corner follows `x' = (x * tile_width + tile_x) / image_width`.
    pub fn remap(
        &self,
        tile_x: usize,
        tile_y: usize,
        tile_width: usize,
        tile_height: usize,
        image_width: usize,
        image_height: usize,
    ) -> Self {
        let (tx, ty) = (tile_x as f32, tile_y as f32);
        let (tw, th) = (tile_width as f32, tile_height as f32);
        let (iw, ih) = (image_width as f32, image_height as f32);
        Self::from_corners(
            (self.x1 * tw + tx) / iw,
            (self.y1 * th + ty) / ih,
            (self.x2 * tw + tx) / iw,
            (self.y2 * th + ty) / ih,
            self.confidence,
            self.class_index,
            self.class_name.clone(),
        )
    }

    /// Scales the normalized corners to a `width x height` pixel canvas.
    pub fn to_pixels(&self, width: usize, height: usize) -> PixelRect {
        let (w, h) = (width as f32, height as f32);
        PixelRect {
            left: self.x1 * w,
            top: self.y1 * h,
            right: self.x2 * w,
            bottom: self.y2 * h,
        }
    }
}

/// Intersection over union of two boxes.
///
/// Areas come from the current corners. Returns 0 when the union is not
/// strictly positive, so degenerate boxes never suppress anything.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);
    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    let union = a.area() + b.area() - inter;
    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}
