//! tiledet runs a fixed-input-size object detector over arbitrarily large
//! images.
//!
//! The image is split into a grid of tiles, each tile is resized and run
//! through an [`InferenceEngine`], the raw output is decoded into boxes, the
//! boxes are remapped into image-global normalized coordinates and a single
//! non-maximum suppression pass removes duplicates across tile seams.
//! Tiles can optionally be processed in parallel via the `rayon` feature.

pub mod candidate;
pub mod decode;
pub mod detect;
pub mod image;
pub mod lowlevel;
pub mod model;
pub mod tile;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use crate::image::io;

pub use candidate::bbox::{BoundingBox, PixelRect};
pub use candidate::nms::{suppress, NmsMode};
pub use detect::{detect, DetectConfig, Detector, TileErrorPolicy};
pub use crate::image::resample::Normalization;
pub use crate::image::{ImageView, OwnedImage, PixelFormat};
pub use model::labels::load_labels;
pub use model::{FnEngine, InferenceEngine, InputShape, LabelMap, ModelInfo, OutputShape};
pub use tile::{Tile, TileGrid};
pub use util::{EngineError, TileDetError, TileDetResult};
