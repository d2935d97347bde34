//! Low-level building blocks for custom detection pipelines.
//!
//! These expose the decoder, suppression, preprocessing and scheduling stages
//! separately, for callers that batch tiles themselves or run NMS over
//! detections from several images. Most users should prefer [`Detector`].
//!
//! [`Detector`]: crate::Detector

pub use crate::candidate::bbox::iou;
pub use crate::candidate::nms::suppress_with_mode;
pub use crate::decode::{decode, decode_boxes, OutputTensor};
pub use crate::image::resample::{resize_normalize, resize_normalize_into};
pub use crate::model::GEOMETRY_CHANNELS;
pub use crate::tile::TileScheduler;
