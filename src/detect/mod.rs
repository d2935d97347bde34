//! Tiled detection entry point.
//!
//! [`Detector`] owns one inference engine and runs the full pipeline:
//! tile the image, decode each tile, remap to image coordinates, then a single
//! global NMS pass over the concatenated boxes.

use crate::candidate::bbox::BoundingBox;
use crate::candidate::nms::{suppress_with_mode, NmsMode};
use crate::candidate::order::truncate_top;
use crate::image::resample::Normalization;
use crate::image::ImageView;
use crate::model::{InferenceEngine, LabelMap, ModelInfo};
use crate::tile::{TileGrid, TileScheduler};
use crate::trace::{trace_event, trace_span};
use crate::util::{TileDetError, TileDetResult};

/// What to do when the engine fails on one tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TileErrorPolicy {
    /// Stop at the first failing tile and return its error.
    #[default]
    Abort,
    /// Emit a warning, drop the tile's detections and continue.
    Skip,
}

/// Detection parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectConfig {
    /// Nominal tile width in pixels.
    pub tile_width: usize,
    /// Nominal tile height in pixels.
    pub tile_height: usize,
    /// Pixels shared by horizontally adjacent tiles.
    pub tile_overlap_x: usize,
    /// Pixels shared by vertically adjacent tiles.
    pub tile_overlap_y: usize,
    /// Anchors must score strictly above this to be kept.
    pub confidence_threshold: f32,
    /// Boxes overlapping a better box by at least this IoU are dropped.
    pub iou_threshold: f32,
    /// Pixel normalization applied before inference.
    pub normalization: Normalization,
    /// Class handling during NMS.
    pub nms_mode: NmsMode,
    /// Cap on the number of returned boxes.
    pub max_detections: Option<usize>,
    /// Process tiles in parallel (requires the `rayon` feature).
    ///
    /// Results and errors match the sequential run. Under
    /// [`TileErrorPolicy::Abort`] tiles after a failed one are not started,
    /// but tiles already in flight finish before the error is returned.
    pub parallel: bool,
    /// Behaviour when inference fails on a tile.
    pub on_tile_error: TileErrorPolicy,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            tile_width: 960,
            tile_height: 540,
            tile_overlap_x: 0,
            tile_overlap_y: 0,
            confidence_threshold: 0.3,
            iou_threshold: 0.5,
            normalization: Normalization::default(),
            nms_mode: NmsMode::ClassAgnostic,
            max_detections: None,
            parallel: false,
            on_tile_error: TileErrorPolicy::Abort,
        }
    }
}

impl DetectConfig {
    /// Checks parameter ranges.
    pub fn validate(&self) -> TileDetResult<()> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(TileDetError::InvalidConfig("tile size must be non-zero"));
        }
        if self.tile_overlap_x >= self.tile_width || self.tile_overlap_y >= self.tile_height {
            return Err(TileDetError::InvalidConfig(
                "tile overlap must be smaller than the tile size",
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(TileDetError::InvalidConfig(
                "confidence_threshold must be within [0, 1]",
            ));
        }
        if !(self.iou_threshold > 0.0 && self.iou_threshold <= 1.0) {
            return Err(TileDetError::InvalidConfig(
                "iou_threshold must be within (0, 1]",
            ));
        }
        self.normalization.validate()
    }

    /// Plans the tile grid for an image of the given size.
    pub fn tile_grid(&self, image_width: usize, image_height: usize) -> TileDetResult<TileGrid> {
        TileGrid::with_overlap(
            image_width,
            image_height,
            self.tile_width,
            self.tile_height,
            self.tile_overlap_x,
            self.tile_overlap_y,
        )
    }
}

/// Tiled detector owning a single inference engine.
pub struct Detector<E> {
    engine: E,
    cfg: DetectConfig,
    labels: LabelMap,
}

impl<E: InferenceEngine> Detector<E> {
    /// Creates a detector with default parameters and a placeholder label.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            cfg: DetectConfig::default(),
            labels: LabelMap::placeholder(),
        }
    }

    /// Replaces the detection parameters.
    pub fn with_config(mut self, cfg: DetectConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Replaces the class label lookup.
    pub fn with_labels(mut self, labels: LabelMap) -> Self {
        self.labels = labels;
        self
    }

    /// Returns the active parameters.
    pub fn config(&self) -> &DetectConfig {
        &self.cfg
    }

    /// Returns the class label lookup.
    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Returns the engine's tensor shapes.
    pub fn model_info(&self) -> &ModelInfo {
        self.engine.model_info()
    }

    /// Returns the owned engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Runs every tile and returns the remapped boxes before NMS, in
    /// row-major tile order.
    pub fn detect_tiles(&self, image: ImageView<'_>) -> TileDetResult<Vec<BoundingBox>> {
        self.cfg.validate()?;
        let grid = self.cfg.tile_grid(image.width(), image.height())?;
        TileScheduler::new(&self.engine, &self.cfg, &self.labels).run(image, &grid)
    }

    /// Runs the full pipeline and returns the final boxes in image-global
    /// normalized coordinates, sorted by descending confidence.
    pub fn detect(&self, image: ImageView<'_>) -> TileDetResult<Vec<BoundingBox>> {
        let _span = trace_span!("detect", width = image.width(), height = image.height()).entered();
        let candidates = self.detect_tiles(image)?;
        let mut kept = suppress_with_mode(&candidates, self.cfg.iou_threshold, self.cfg.nms_mode);
        truncate_top(&mut kept, self.cfg.max_detections);
        trace_event!("detections", candidates = candidates.len(), kept = kept.len());
        Ok(kept)
    }
}

/// One-shot tiled detection with explicit parameters.
///
/// Equivalent to `suppress(run_tiles(...), iou_threshold)` with the default
/// normalization and a placeholder label.
pub fn detect<E: InferenceEngine>(
    image: ImageView<'_>,
    tile_width: usize,
    tile_height: usize,
    confidence_threshold: f32,
    iou_threshold: f32,
    engine: &E,
) -> TileDetResult<Vec<BoundingBox>> {
    Detector::new(engine)
        .with_config(DetectConfig {
            tile_width,
            tile_height,
            confidence_threshold,
            iou_threshold,
            ..DetectConfig::default()
        })
        .detect(image)
}
