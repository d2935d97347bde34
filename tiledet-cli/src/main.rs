mod annotate;

use annotate::{draw_boxes, DEFAULT_STROKE_WIDTH};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tiledet::io::{load_rgb_image, view_from_rgb_image};
use tiledet::{
    load_labels, BoundingBox, DetectConfig, Detector, EngineError, InferenceEngine, LabelMap,
    ModelInfo, NmsMode, Normalization, TileErrorPolicy,
};
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Tiled detection CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the tile grid for the configured image and exit.
    #[arg(long)]
    plan: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum NmsModeConfig {
    ClassAgnostic,
    PerClass,
}

impl From<NmsModeConfig> for NmsMode {
    fn from(value: NmsModeConfig) -> Self {
        match value {
            NmsModeConfig::ClassAgnostic => NmsMode::ClassAgnostic,
            NmsModeConfig::PerClass => NmsMode::PerClass,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TileErrorConfig {
    Abort,
    Skip,
}

impl From<TileErrorConfig> for TileErrorPolicy {
    fn from(value: TileErrorConfig) -> Self {
        match value {
            TileErrorConfig::Abort => TileErrorPolicy::Abort,
            TileErrorConfig::Skip => TileErrorPolicy::Skip,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectConfigJson {
    tile_width: usize,
    tile_height: usize,
    tile_overlap_x: usize,
    tile_overlap_y: usize,
    confidence_threshold: f32,
    iou_threshold: f32,
    mean: f32,
    std: f32,
    nms_mode: NmsModeConfig,
    max_detections: Option<usize>,
    on_tile_error: TileErrorConfig,
}

impl Default for DetectConfigJson {
    fn default() -> Self {
        let cfg = DetectConfig::default();
        Self {
            tile_width: cfg.tile_width,
            tile_height: cfg.tile_height,
            tile_overlap_x: cfg.tile_overlap_x,
            tile_overlap_y: cfg.tile_overlap_y,
            confidence_threshold: cfg.confidence_threshold,
            iou_threshold: cfg.iou_threshold,
            mean: cfg.normalization.mean,
            std: cfg.normalization.std,
            nms_mode: NmsModeConfig::ClassAgnostic,
            max_detections: cfg.max_detections,
            on_tile_error: TileErrorConfig::Abort,
        }
    }
}

impl From<DetectConfigJson> for DetectConfig {
    fn from(value: DetectConfigJson) -> Self {
        Self {
            tile_width: value.tile_width,
            tile_height: value.tile_height,
            tile_overlap_x: value.tile_overlap_x,
            tile_overlap_y: value.tile_overlap_y,
            confidence_threshold: value.confidence_threshold,
            iou_threshold: value.iou_threshold,
            normalization: Normalization {
                mean: value.mean,
                std: value.std,
            },
            nms_mode: value.nms_mode.into(),
            max_detections: value.max_detections,
            // Replayed outputs are consumed in call order.
            parallel: false,
            on_tile_error: value.on_tile_error.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    recording_path: String,
    labels_path: Option<String>,
    output_path: Option<String>,
    annotated_path: Option<String>,
    stroke_width: u32,
    detect: DetectConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: String::new(),
            recording_path: String::new(),
            labels_path: None,
            output_path: None,
            annotated_path: None,
            stroke_width: DEFAULT_STROKE_WIDTH,
            detect: DetectConfigJson::default(),
        }
    }
}

/// Raw per-tile model outputs captured from an inference run.
#[derive(Debug, Deserialize)]
struct Recording {
    input_dims: Vec<usize>,
    output_dims: Vec<usize>,
    tiles: Vec<Vec<f32>>,
}

/// Engine that hands back recorded outputs, one tile per call.
struct ReplayEngine {
    info: ModelInfo,
    tiles: Vec<Vec<f32>>,
    cursor: Mutex<usize>,
}

impl ReplayEngine {
    fn new(recording: Recording) -> Result<Self, tiledet::TileDetError> {
        Ok(Self {
            info: ModelInfo::from_dims(&recording.input_dims, &recording.output_dims)?,
            tiles: recording.tiles,
            cursor: Mutex::new(0),
        })
    }
}

impl InferenceEngine for ReplayEngine {
    fn model_info(&self) -> &ModelInfo {
        &self.info
    }

    fn infer(&self, _input: &[f32], output: &mut [f32]) -> Result<(), EngineError> {
        let mut cursor = self
            .cursor
            .lock()
            .map_err(|_| EngineError::new("replay cursor poisoned"))?;
        let idx = *cursor;
        *cursor += 1;
        let recorded = self
            .tiles
            .get(idx)
            .ok_or_else(|| EngineError::new(format!("recording has no output for call {idx}")))?;
        if recorded.len() != output.len() {
            return Err(EngineError::new(format!(
                "recorded output {idx} has {} values, expected {}",
                recorded.len(),
                output.len()
            )));
        }
        output.copy_from_slice(recorded);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct TileRecord {
    index: usize,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

#[derive(Debug, Serialize)]
struct Plan {
    cols: usize,
    rows: usize,
    tiles: Vec<TileRecord>,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    label: String,
    class_index: usize,
    confidence: f32,
    /// Normalized `[x1, y1, x2, y2]`.
    bbox: [f32; 4],
    /// Pixel `[left, top, right, bottom]`.
    pixels: [f32; 4],
}

impl DetectionRecord {
    fn new(b: &BoundingBox, width: usize, height: usize) -> Self {
        let rect = b.to_pixels(width, height);
        Self {
            label: b.class_name.clone(),
            class_index: b.class_index,
            confidence: b.confidence,
            bbox: [b.x1, b.y1, b.x2, b.y2],
            pixels: [rect.left, rect.top, rect.right, rect.bottom],
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    image_width: usize,
    image_height: usize,
    detections: Vec<DetectionRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("tiledet=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() {
        return Err("image_path must be set in the config".into());
    }
    let detect_cfg = DetectConfig::from(config.detect);
    detect_cfg.validate()?;

    if cli.plan {
        let image = load_rgb_image(&config.image_path)?;
        let grid = detect_cfg.tile_grid(image.width(), image.height())?;
        let plan = Plan {
            cols: grid.cols(),
            rows: grid.rows(),
            tiles: grid
                .tiles()
                .iter()
                .map(|t| TileRecord {
                    index: t.index,
                    x: t.x,
                    y: t.y,
                    width: t.width,
                    height: t.height,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    if config.recording_path.is_empty() {
        return Err("recording_path must be set in the config".into());
    }
    let recording: Recording = serde_json::from_str(&fs::read_to_string(&config.recording_path)?)?;
    let engine = ReplayEngine::new(recording)?;
    let labels = match &config.labels_path {
        Some(path) => load_labels(path)?,
        None => LabelMap::placeholder(),
    };

    let mut rgb = image::open(&config.image_path)?.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    let detector = Detector::new(engine)
        .with_config(detect_cfg)
        .with_labels(labels);
    let boxes = detector.detect(view_from_rgb_image(&rgb)?)?;
    tracing::info!(detections = boxes.len(), "detection finished");

    let output = Output {
        image_width: width,
        image_height: height,
        detections: boxes
            .iter()
            .map(|b| DetectionRecord::new(b, width, height))
            .collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;
    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    if let Some(path) = config.annotated_path {
        draw_boxes(&mut rgb, &boxes, config.stroke_width);
        rgb.save(path)?;
    }

    Ok(())
}
