//! Detection boxes, confidence ordering and non-maximum suppression.

pub mod bbox;
pub mod nms;
pub(crate) mod order;
