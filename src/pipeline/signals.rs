use crate::{
    calibration::{CalibrationStore, RecalibrateTrigger, SwaySignal},
    error::SignalError,
    geometry::angle_at_vertex,
    types::{Keypoint, SignalBundle, Subject},
};

use super::detector::{
    LEFT_ELBOW, LEFT_HIP, LEFT_SHOULDER, NUM_KEYPOINTS, RIGHT_ELBOW, RIGHT_HIP, RIGHT_SHOULDER,
};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Turns the first detected person into control signals.
///
/// Owns the calibration store; the recalibrate trigger is shared with the UI.
pub struct SignalExtractor {
    calibration: CalibrationStore,
    trigger: RecalibrateTrigger,
    confidence_threshold: f32,
}

impl SignalExtractor {
    pub fn new(
        calibration: CalibrationStore,
        trigger: RecalibrateTrigger,
        confidence_threshold: f32,
    ) -> Self {
        Self {
            calibration,
            trigger,
            confidence_threshold,
        }
    }

    pub fn calibration(&self) -> &CalibrationStore {
        &self.calibration
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Signals for one frame. Only `subjects[0]` is considered; no subjects
    /// yields an empty bundle.
    pub fn extract(&mut self, subjects: &[Subject]) -> Result<SignalBundle, SignalError> {
        let Some(subject) = subjects.first() else {
            return Ok(SignalBundle::default());
        };
        if !subject.is_complete() {
            return Err(SignalError::MalformedSubject {
                found: subject.keypoints.len(),
                expected: NUM_KEYPOINTS,
            });
        }

        let kp = |index: usize| subject.keypoints[index];
        let left_hip = kp(LEFT_HIP);
        let right_hip = kp(RIGHT_HIP);
        let left_shoulder = kp(LEFT_SHOULDER);
        let right_shoulder = kp(RIGHT_SHOULDER);

        let left_arm = self.arm_angle(left_hip, left_shoulder, kp(LEFT_ELBOW));
        let right_arm = self.arm_angle(right_hip, right_shoulder, kp(RIGHT_ELBOW));
        let hip_sway = self.hip_sway(left_hip, right_hip, left_shoulder, right_shoulder);

        Ok(SignalBundle {
            left_arm,
            right_arm,
            hip_sway,
        })
    }

    fn confident(&self, keypoints: &[Keypoint]) -> bool {
        keypoints
            .iter()
            .all(|k| k.is_confident(self.confidence_threshold))
    }

    /// Angle at the shoulder between the torso (towards the hip) and the upper arm.
    fn arm_angle(&self, hip: Keypoint, shoulder: Keypoint, elbow: Keypoint) -> Option<f32> {
        if !self.confident(&[hip, shoulder, elbow]) {
            return None;
        }
        let angle = angle_at_vertex(hip.position(), shoulder.position(), elbow.position());
        angle.is_finite().then_some(angle)
    }

    fn hip_sway(
        &mut self,
        left_hip: Keypoint,
        right_hip: Keypoint,
        left_shoulder: Keypoint,
        right_shoulder: Keypoint,
    ) -> Option<f32> {
        if !self.confident(&[left_hip, right_hip, left_shoulder, right_shoulder]) {
            return None;
        }

        let hip_center_x = (left_hip.x + right_hip.x) / 2.0;
        let shoulder_center_x = (left_shoulder.x + right_shoulder.x) / 2.0;
        let raw = hip_center_x - shoulder_center_x;
        if !raw.is_finite() {
            return None;
        }

        // The trigger stays pending until a frame can actually measure sway.
        if self.trigger.take() {
            self.calibration.set_zero(SwaySignal::HipSway, raw);
            log::info!(
                "{} calibrated: zero set to {raw:.1} pixels",
                SwaySignal::HipSway.name()
            );
        }

        Some(self.calibration.relative(SwaySignal::HipSway, raw))
    }
}
