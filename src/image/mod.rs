//! Pixel grid views and tile preprocessing.
//!
//! `ImageView` is a borrowed view over interleaved 8-bit RGB or RGBA pixels
//! with an explicit row stride in bytes. ROI slices are zero-copy views into
//! the same backing slice and keep the original stride, which is how tiles are
//! cropped out of the source image.

use crate::util::{TileDetError, TileDetResult};

#[cfg(feature = "image-io")]
pub mod io;
pub mod resample;

/// Interleaved pixel layout of an image buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Three bytes per pixel: red, green, blue.
    Rgb8,
    /// Four bytes per pixel: red, green, blue, alpha.
    Rgba8,
}

impl PixelFormat {
    /// Returns the number of bytes per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Borrowed interleaved pixel grid with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
    format: PixelFormat,
}

impl<'a> ImageView<'a> {
    /// Creates a tightly packed view (`stride == width * channels`).
    pub fn from_slice(
        data: &'a [u8],
        width: usize,
        height: usize,
        format: PixelFormat,
    ) -> TileDetResult<Self> {
        let stride = width
            .checked_mul(format.channels())
            .ok_or(TileDetError::InvalidDimensions { width, height })?;
        Self::new(data, width, height, stride, format)
    }

    /// Creates a view with an explicit row stride in bytes.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
    ) -> TileDetResult<Self> {
        let needed = required_len(width, height, stride, format)?;
        if data.len() < needed {
            return Err(TileDetError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            format,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in bytes between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the pixel layout.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the RGB components at `(x, y)`; alpha is ignored.
    pub fn rgb(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y
            .checked_mul(self.stride)?
            .checked_add(x.checked_mul(self.format.channels())?)?;
        let px = self.data.get(idx..idx + 3)?;
        Some([px[0], px[1], px[2]])
    }

    /// Returns the bytes of row `y` covering `width` pixels.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * self.format.channels())?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(&self, x: usize, y: usize, width: usize, height: usize) -> TileDetResult<Self> {
        if width == 0 || height == 0 {
            return Err(TileDetError::InvalidDimensions { width, height });
        }

        let out_of_bounds = TileDetError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| out_of_bounds.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| out_of_bounds.clone())?;
        if end_x > self.width || end_y > self.height {
            return Err(out_of_bounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x * self.format.channels()))
            .ok_or(TileDetError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        let data = self
            .data
            .get(start..)
            .ok_or(TileDetError::BufferTooSmall {
                needed: start.saturating_add(1),
                got: self.data.len(),
            })?;

        ImageView::new(data, width, height, self.stride, self.format)
    }
}

/// Owned, tightly packed pixel buffer.
#[derive(Clone, Debug)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
    format: PixelFormat,
}

impl OwnedImage {
    /// Wraps a packed buffer, checking that its length matches the dimensions.
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        format: PixelFormat,
    ) -> TileDetResult<Self> {
        let stride = width
            .checked_mul(format.channels())
            .ok_or(TileDetError::InvalidDimensions { width, height })?;
        let needed = required_len(width, height, stride, format)?;
        if data.len() < needed {
            return Err(TileDetError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(TileDetError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    /// Creates an image filled with a single RGB color.
    pub fn filled_rgb(width: usize, height: usize, color: [u8; 3]) -> TileDetResult<Self> {
        let len = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(3))
            .ok_or(TileDetError::InvalidDimensions { width, height })?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len / 3 {
            data.extend_from_slice(&color);
        }
        Self::new(data, width, height, PixelFormat::Rgb8)
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the packed pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the packed pixel bytes for in-place edits.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width * self.format.channels(),
            format: self.format,
        }
    }
}

fn required_len(
    width: usize,
    height: usize,
    stride: usize,
    format: PixelFormat,
) -> TileDetResult<usize> {
    if width == 0 || height == 0 {
        return Err(TileDetError::InvalidDimensions { width, height });
    }
    let row_len = width
        .checked_mul(format.channels())
        .ok_or(TileDetError::InvalidDimensions { width, height })?;
    if stride < row_len {
        return Err(TileDetError::InvalidStride { row_len, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_len))
        .ok_or(TileDetError::InvalidDimensions { width, height })?;
    Ok(needed)
}
