use std::{fs, io, path::Path, path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub signals: SignalConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default)]
    pub index: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { index: 0 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectorConfig {
    /// ONNX export of a YOLOv8 pose model.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// Where to fetch the model from when `model_path` does not exist yet.
    #[serde(default)]
    pub model_url: Option<String>,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    #[serde(default = "default_nms_threshold")]
    pub nms_threshold: f32,
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models").join("yolov8n-pose.onnx")
}
fn default_input_size() -> u32 { 640 }
fn default_score_threshold() -> f32 { 0.25 }
fn default_nms_threshold() -> f32 { 0.45 }
fn default_intra_threads() -> usize { 2 }

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            model_url: None,
            input_size: default_input_size(),
            score_threshold: default_score_threshold(),
            nms_threshold: default_nms_threshold(),
            intra_threads: default_intra_threads(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SignalConfig {
    /// Keypoints must be strictly above this confidence to be used.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

fn default_confidence_threshold() -> f32 { 0.5 }

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MappingConfig {
    /// Hip sway (pixels) that maps to the full lateral head travel.
    #[serde(default = "default_sway_pixel_max")]
    pub sway_pixel_max: f32,
    /// Lateral head travel limit in millimetres, both directions.
    #[serde(default = "default_head_lateral_max_mm")]
    pub head_lateral_max_mm: f32,
}

fn default_sway_pixel_max() -> f32 { 80.0 }
fn default_head_lateral_max_mm() -> f32 { 35.0 }

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            sway_pixel_max: default_sway_pixel_max(),
            head_lateral_max_mm: default_head_lateral_max_mm(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_frame_queue_capacity")]
    pub frame_queue_capacity: usize,
    #[serde(default = "default_signal_queue_capacity")]
    pub signal_queue_capacity: usize,
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
}

fn default_frame_queue_capacity() -> usize { 2 }
fn default_signal_queue_capacity() -> usize { 10 }
fn default_poll_timeout_ms() -> u64 { 100 }

impl PipelineConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_queue_capacity: default_frame_queue_capacity(),
            signal_queue_capacity: default_signal_queue_capacity(),
            poll_timeout_ms: default_poll_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RobotConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Duration of the blocking moves at startup and shutdown.
    #[serde(default = "default_goto_duration_secs")]
    pub goto_duration_secs: f32,
}

fn default_base_url() -> String { "http://localhost:8000".to_string() }
fn default_request_timeout_ms() -> u64 { 500 }
fn default_goto_duration_secs() -> f32 { 1.0 }

impl RobotConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn goto_duration(&self) -> Duration {
        Duration::from_secs_f32(self.goto_duration_secs.max(0.0))
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            goto_duration_secs: default_goto_duration_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String { "Pose Mirror".to_string() }

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Missing file means defaults; an unreadable or malformed file is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match Self::load(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.frame_queue_capacity == 0 || self.pipeline.signal_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue capacities must be at least 1".to_string(),
            ));
        }
        if self.pipeline.poll_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.poll_timeout_ms must be positive".to_string(),
            ));
        }
        if self.mapping.sway_pixel_max <= 0.0 || self.mapping.head_lateral_max_mm <= 0.0 {
            return Err(ConfigError::Invalid(
                "mapping ranges must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("signals.confidence_threshold", self.signals.confidence_threshold),
            ("detector.score_threshold", self.detector.score_threshold),
            ("detector.nms_threshold", self.detector.nms_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.detector.input_size < 32 {
            return Err(ConfigError::Invalid(format!(
                "detector.input_size too small: {}",
                self.detector.input_size
            )));
        }
        Ok(())
    }
}
