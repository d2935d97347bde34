//! Shared utility helpers.

pub mod error;

pub use error::{EngineError, Result as TileDetResult, TileDetError};
