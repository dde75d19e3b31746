mod common;
mod yolo;

use crate::types::{Frame, Subject};

pub use common::{LetterboxInfo, prepare_letterboxed};
pub use yolo::{YoloPoseConfig, YoloPoseDetector, decode_yolo_pose};

/// COCO 17-point body layout.
pub const NUM_KEYPOINTS: usize = 17;
pub const LEFT_SHOULDER: usize = 5;
pub const RIGHT_SHOULDER: usize = 6;
pub const LEFT_ELBOW: usize = 7;
pub const RIGHT_ELBOW: usize = 8;
pub const LEFT_HIP: usize = 11;
pub const RIGHT_HIP: usize = 12;

/// Opaque keypoint detector: a frame in, zero or more people out.
///
/// Implementations order subjects by descending detection score, so index 0
/// is the person the pipeline follows.
pub trait PoseDetector: Send + 'static {
    fn detect(&mut self, frame: &Frame) -> anyhow::Result<Vec<Subject>>;
}

impl<F> PoseDetector for F
where
    F: FnMut(&Frame) -> anyhow::Result<Vec<Subject>> + Send + 'static,
{
    fn detect(&mut self, frame: &Frame) -> anyhow::Result<Vec<Subject>> {
        self(frame)
    }
}
