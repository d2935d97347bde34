//! Per-tile crop, preprocess, inference, decode and remap.
//!
//! Each tile is an independent computation that yields its own `Vec` of
//! boxes. Results are concatenated in row-major tile order, so the parallel
//! path (feature `rayon`) produces exactly the sequential output.

use crate::candidate::bbox::BoundingBox;
use crate::decode::{decode_boxes, OutputTensor};
use crate::detect::{DetectConfig, TileErrorPolicy};
use crate::image::resample::resize_normalize_into;
use crate::image::ImageView;
use crate::model::{InferenceEngine, LabelMap};
use crate::tile::{Tile, TileGrid};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{TileDetError, TileDetResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "rayon")]
use std::sync::atomic::{AtomicUsize, Ordering};

/// Drives one engine over every tile of a grid.
pub struct TileScheduler<'a, E> {
    engine: &'a E,
    cfg: &'a DetectConfig,
    labels: &'a LabelMap,
}

/// Reusable input/output tensors for one worker.
struct TileBuffers {
    input: Vec<f32>,
    output: Vec<f32>,
}

impl<'a, E: InferenceEngine> TileScheduler<'a, E> {
    /// Creates a scheduler borrowing the engine, parameters and labels.
    pub fn new(engine: &'a E, cfg: &'a DetectConfig, labels: &'a LabelMap) -> Self {
        Self {
            engine,
            cfg,
            labels,
        }
    }

    fn buffers(&self) -> TileBuffers {
        let info = self.engine.model_info();
        TileBuffers {
            input: vec![0.0; info.input().len()],
            output: vec![0.0; info.output().len()],
        }
    }

    /// Runs every tile of `grid` over `image` and returns the concatenated
    /// image-global boxes, still containing cross-tile duplicates.
    pub fn run(&self, image: ImageView<'_>, grid: &TileGrid) -> TileDetResult<Vec<BoundingBox>> {
        if grid.image_width() != image.width() || grid.image_height() != image.height() {
            return Err(TileDetError::InvalidDimensions {
                width: grid.image_width(),
                height: grid.image_height(),
            });
        }
        let _span = trace_span!("tile_run", tiles = grid.len()).entered();

        #[cfg(feature = "rayon")]
        if self.cfg.parallel {
            return self.run_parallel(image, grid);
        }

        let mut buffers = self.buffers();
        let mut all = Vec::new();
        for tile in grid.tiles() {
            let result = self.process_tile(image, tile, &mut buffers);
            if let Some(boxes) = self.apply_policy(result)? {
                all.extend(boxes);
            }
        }
        trace_event!("tile_candidates", count = all.len());
        Ok(all)
    }

    #[cfg(feature = "rayon")]
    fn run_parallel(
        &self,
        image: ImageView<'_>,
        grid: &TileGrid,
    ) -> TileDetResult<Vec<BoundingBox>> {
        // Lowest failed tile index. Under `Abort`, later tiles are not started.
        let first_failure = AtomicUsize::new(usize::MAX);
        let abort = self.cfg.on_tile_error == TileErrorPolicy::Abort;
        let per_tile: Vec<TileDetResult<Vec<BoundingBox>>> = grid
            .tiles()
            .par_iter()
            .map_init(
                || self.buffers(),
                |buffers, tile| {
                    if abort && tile.index > first_failure.load(Ordering::Relaxed) {
                        return Ok(Vec::new());
                    }
                    let result = self.process_tile(image, tile, buffers);
                    if abort && result.is_err() {
                        first_failure.fetch_min(tile.index, Ordering::Relaxed);
                    }
                    result
                },
            )
            .collect();

        let mut all = Vec::new();
        for result in per_tile {
            if let Some(boxes) = self.apply_policy(result)? {
                all.extend(boxes);
            }
        }
        trace_event!("tile_candidates", count = all.len());
        Ok(all)
    }

    /// Turns a skipped inference failure into `None`; other errors propagate.
    fn apply_policy(
        &self,
        result: TileDetResult<Vec<BoundingBox>>,
    ) -> TileDetResult<Option<Vec<BoundingBox>>> {
        match result {
            Ok(boxes) => Ok(Some(boxes)),
            Err(TileDetError::Inference { tile, source })
                if self.cfg.on_tile_error == TileErrorPolicy::Skip =>
            {
                trace_warn!("tile_skipped", tile = tile, reason = source.reason.as_str());
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn process_tile(
        &self,
        image: ImageView<'_>,
        tile: &Tile,
        buffers: &mut TileBuffers,
    ) -> TileDetResult<Vec<BoundingBox>> {
        let _span = trace_span!("tile", index = tile.index, x = tile.x, y = tile.y).entered();
        let info = self.engine.model_info();

        let view = image.roi(tile.x, tile.y, tile.width, tile.height)?;
        resize_normalize_into(
            view,
            info.input().width,
            info.input().height,
            self.cfg.normalization,
            &mut buffers.input,
        )?;

        buffers.output.fill(0.0);
        self.engine
            .infer(&buffers.input, &mut buffers.output)
            .map_err(|source| TileDetError::Inference {
                tile: tile.index,
                source,
            })?;

        let tensor = OutputTensor::with_shape(&buffers.output, info.output())?;
        let boxes: Vec<BoundingBox> = decode_boxes(&tensor, self.cfg.confidence_threshold, self.labels)
            .iter()
            .map(|local| tile.remap(local, image.width(), image.height()))
            .collect();

        trace_event!("tile_boxes", tile = tile.index, count = boxes.len());
        Ok(boxes)
    }
}
