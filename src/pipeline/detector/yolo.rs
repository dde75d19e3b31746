use std::{cmp::Ordering, path::Path};

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::{NUM_KEYPOINTS, PoseDetector, common::{LetterboxInfo, prepare_letterboxed}};
use crate::{
    config::DetectorConfig,
    types::{Frame, Keypoint, Subject},
};

// cx, cy, w, h, person score, then (x, y, conf) per keypoint.
const BOX_FEATURES: usize = 5;
const FEATURES: usize = BOX_FEATURES + NUM_KEYPOINTS * 3;

#[derive(Clone, Debug)]
pub struct YoloPoseConfig {
    pub input_size: u32,
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub top_k: usize,
}

impl Default for YoloPoseConfig {
    fn default() -> Self {
        Self {
            input_size: 640,
            score_threshold: 0.25,
            nms_threshold: 0.45,
            top_k: 16,
        }
    }
}

impl From<&DetectorConfig> for YoloPoseConfig {
    fn from(cfg: &DetectorConfig) -> Self {
        Self {
            input_size: cfg.input_size,
            score_threshold: cfg.score_threshold,
            nms_threshold: cfg.nms_threshold,
            ..Self::default()
        }
    }
}

/// YOLOv8-pose exported to ONNX, run through onnxruntime.
pub struct YoloPoseDetector {
    session: Session,
    cfg: YoloPoseConfig,
}

impl YoloPoseDetector {
    pub fn new(model_path: &Path, intra_threads: usize, cfg: YoloPoseConfig) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads.max(1))?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("failed to load pose model from {}", model_path.display())
            })?;

        log::info!(
            "pose detector ready using {} (input {}px)",
            model_path.display(),
            cfg.input_size
        );

        Ok(Self { session, cfg })
    }
}

impl PoseDetector for YoloPoseDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Subject>> {
        let (input, letterbox) = prepare_letterboxed(frame, self.cfg.input_size)?;
        let tensor = Tensor::from_array(input)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run pose model")?;

        if outputs.len() < 1 {
            return Err(anyhow!("pose model returned no outputs"));
        }

        let predictions = outputs[0].try_extract_array::<f32>()?;
        let shape = predictions.shape().to_vec();
        let flat: Vec<f32> = match predictions.as_slice() {
            Some(slice) => slice.to_vec(),
            None => predictions.iter().copied().collect(),
        };

        decode_yolo_pose(&flat, &shape, &letterbox, &self.cfg)
    }
}

/// Decodes raw YOLOv8-pose predictions into subjects in source-frame pixels.
///
/// Accepts both the exported `[1, 56, N]` layout and the transposed
/// `[1, N, 56]` one. Results are sorted by descending score.
pub fn decode_yolo_pose(
    predictions: &[f32],
    shape: &[usize],
    letterbox: &LetterboxInfo,
    cfg: &YoloPoseConfig,
) -> Result<Vec<Subject>> {
    if shape.len() != 3 {
        return Err(anyhow!(
            "unexpected pose output shape {:?}, need [batch, features, anchors]",
            shape
        ));
    }

    // (anchor count, stride between features, stride between anchors)
    let (anchors, feature_stride, anchor_stride) = if shape[1] == FEATURES {
        (shape[2], shape[2], 1)
    } else if shape[2] == FEATURES {
        (shape[1], 1, shape[2])
    } else {
        return Err(anyhow!(
            "pose output shape {:?} has no {FEATURES}-wide feature axis",
            shape
        ));
    };

    let needed = anchors * FEATURES;
    if predictions.len() < needed {
        return Err(anyhow!(
            "pose output too short: got {}, need {}",
            predictions.len(),
            needed
        ));
    }

    let value = |anchor: usize, feature: usize| -> f32 {
        predictions[anchor * anchor_stride + feature * feature_stride]
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let score = value(anchor, 4);
        if !(score >= cfg.score_threshold) {
            continue;
        }

        let cx = value(anchor, 0);
        let cy = value(anchor, 1);
        let hw = value(anchor, 2) / 2.0;
        let hh = value(anchor, 3) / 2.0;
        let (x1, y1) = letterbox.project(cx - hw, cy - hh);
        let (x2, y2) = letterbox.project(cx + hw, cy + hh);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        let keypoints = (0..NUM_KEYPOINTS)
            .map(|k| {
                let base = BOX_FEATURES + k * 3;
                let (x, y) = letterbox.project(value(anchor, base), value(anchor, base + 1));
                let confidence = value(anchor, base + 2);
                let confidence = if confidence.is_finite() {
                    confidence.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                Keypoint::new(x, y, confidence)
            })
            .collect();

        candidates.push(Subject {
            keypoints,
            bbox: [x1, y1, x2, y2],
            score,
        });
    }

    let kept = nms(&candidates, cfg.nms_threshold, cfg.top_k);
    let mut subjects = Vec::with_capacity(kept.len());
    for idx in kept {
        if let Some(candidate) = candidates.get(idx) {
            subjects.push(candidate.clone());
        }
    }
    Ok(subjects)
}

fn nms(candidates: &[Subject], threshold: f32, top_k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|a, b| {
        candidates[*b]
            .score
            .partial_cmp(&candidates[*a].score)
            .unwrap_or(Ordering::Equal)
    });

    let mut keep: Vec<usize> = Vec::new();
    'outer: for &idx in &order {
        for &k in &keep {
            if iou(&candidates[idx].bbox, &candidates[k].bbox) >= threshold {
                continue 'outer;
            }
        }
        keep.push(idx);
        if keep.len() >= top_k {
            break;
        }
    }
    keep
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter <= 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}
