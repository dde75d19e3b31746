use std::time::Instant;

use crate::pipeline::detector::NUM_KEYPOINTS;

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            rgba,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// Solid opaque frame, mostly useful for fakes and tests.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            rgba.extend_from_slice(&color);
        }
        Self::new(rgba, width, height)
    }
}

/// A single landmark in source-frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// Strictly above the threshold; a keypoint sitting exactly on it is rejected.
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }

    pub fn position(&self) -> [f32; 2] {
        [self.x, self.y]
    }
}

/// One detected person. Keypoints follow the 17-point COCO layout.
#[derive(Clone, Debug, Default)]
pub struct Subject {
    pub keypoints: Vec<Keypoint>,
    pub bbox: [f32; 4],
    pub score: f32,
}

impl Subject {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self {
            keypoints,
            bbox: [0.0; 4],
            score: 1.0,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Keypoint> {
        self.keypoints.get(index)
    }

    pub fn is_complete(&self) -> bool {
        self.keypoints.len() >= NUM_KEYPOINTS
    }
}

/// Per-frame control scalars. `None` means the keypoints were missing or not
/// confident enough this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SignalBundle {
    /// Radians.
    pub left_arm: Option<f32>,
    /// Radians.
    pub right_arm: Option<f32>,
    /// Pixels, calibration offset already subtracted.
    pub hip_sway: Option<f32>,
}

impl SignalBundle {
    pub fn is_empty(&self) -> bool {
        self.left_arm.is_none() && self.right_arm.is_none() && self.hip_sway.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct AnnotatedFrame {
    pub frame: Frame,
    pub signals: SignalBundle,
}

/// Full head pose as the robot daemon expects it. Positions are millimetres,
/// rotations radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeadPose {
    pub x_mm: f32,
    pub y_mm: f32,
    pub z_mm: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

/// Commanded head and antenna position. Only the lateral head axis is driven;
/// the remaining head axes stay at their defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JointTarget {
    pub head_lateral_mm: f32,
    pub antenna_left_rad: f32,
    pub antenna_right_rad: f32,
}

impl JointTarget {
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn head_pose(&self) -> HeadPose {
        HeadPose {
            y_mm: self.head_lateral_mm,
            ..HeadPose::default()
        }
    }

    pub fn antennas(&self) -> [f32; 2] {
        [self.antenna_left_rad, self.antenna_right_rad]
    }
}
