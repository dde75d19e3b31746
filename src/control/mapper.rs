use std::f32::consts::PI;

use crate::{
    config::MappingConfig,
    types::{JointTarget, SignalBundle},
};

/// Linear map from `[in_lo, in_hi]` onto `[out_lo, out_hi]`, holding the end
/// values outside the input range. The output range may be reversed.
pub fn interpolate(value: f32, (in_lo, in_hi): (f32, f32), (out_lo, out_hi): (f32, f32)) -> f32 {
    if in_hi == in_lo {
        return out_lo;
    }
    let t = ((value - in_lo) / (in_hi - in_lo)).clamp(0.0, 1.0);
    out_lo + (out_hi - out_lo) * t
}

/// Maps signal bundles to joint targets.
///
/// Head position and antennas are tracked separately: a bundle missing one
/// of them leaves that part of the previous command in place.
#[derive(Clone, Debug)]
pub struct ActuatorMapper {
    sway_pixel_max: f32,
    head_lateral_max_mm: f32,
    last_lateral_mm: f32,
    last_antennas: [f32; 2],
}

impl ActuatorMapper {
    pub fn new(cfg: &MappingConfig) -> Self {
        Self {
            sway_pixel_max: cfg.sway_pixel_max,
            head_lateral_max_mm: cfg.head_lateral_max_mm,
            last_lateral_mm: 0.0,
            last_antennas: [0.0, 0.0],
        }
    }

    /// Sway to the right (positive pixels) moves the head to the robot's
    /// left (negative millimetres), mirroring the operator.
    pub fn lateral_mm(&self, hip_sway: f32) -> f32 {
        let max = self.head_lateral_max_mm;
        interpolate(
            hip_sway,
            (-self.sway_pixel_max, self.sway_pixel_max),
            (max, -max),
        )
        .clamp(-max, max)
    }

    /// `[left, right]` antenna angles. A lowered arm (angle near 0) gives full
    /// deflection, a raised arm (angle near π) keeps the antenna upright; the
    /// left antenna turns the opposite way to the right.
    pub fn antennas(left_arm: f32, right_arm: f32) -> [f32; 2] {
        [-(PI - left_arm), PI - right_arm]
    }

    pub fn current(&self) -> JointTarget {
        JointTarget {
            head_lateral_mm: self.last_lateral_mm,
            antenna_left_rad: self.last_antennas[0],
            antenna_right_rad: self.last_antennas[1],
        }
    }

    pub fn map(&mut self, signals: &SignalBundle) -> JointTarget {
        if let Some(sway) = signals.hip_sway.filter(|v| v.is_finite()) {
            self.last_lateral_mm = self.lateral_mm(sway);
        }

        if let (Some(left), Some(right)) = (signals.left_arm, signals.right_arm) {
            if left.is_finite() && right.is_finite() {
                self.last_antennas = Self::antennas(left, right);
            }
        }

        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn mapper() -> ActuatorMapper {
        ActuatorMapper::new(&MappingConfig::default())
    }

    fn sway(value: f32) -> SignalBundle {
        SignalBundle {
            hip_sway: Some(value),
            ..SignalBundle::default()
        }
    }

    #[test]
    fn interpolate_handles_reversed_output() {
        assert_eq!(interpolate(0.0, (-80.0, 80.0), (35.0, -35.0)), 0.0);
        assert_eq!(interpolate(-80.0, (-80.0, 80.0), (35.0, -35.0)), 35.0);
        assert_eq!(interpolate(80.0, (-80.0, 80.0), (35.0, -35.0)), -35.0);
        assert_eq!(interpolate(500.0, (-80.0, 80.0), (35.0, -35.0)), -35.0);
        assert_eq!(interpolate(1.0, (2.0, 2.0), (7.0, 9.0)), 7.0);
    }

    #[test]
    fn sway_maps_to_mirrored_lateral() {
        let m = mapper();
        assert_eq!(m.lateral_mm(0.0), 0.0);
        assert_eq!(m.lateral_mm(80.0), -35.0);
        assert_eq!(m.lateral_mm(-80.0), 35.0);
        assert!((m.lateral_mm(40.0) + 17.5).abs() < EPS);
    }

    #[test]
    fn sway_beyond_range_is_clamped() {
        let m = mapper();
        for value in [81.0, 200.0, 1e9, -81.0, -1e9] {
            let out = m.lateral_mm(value);
            assert!(out.abs() <= 35.0, "{value} -> {out}");
        }
        assert_eq!(m.lateral_mm(1e9), -35.0);
        assert_eq!(m.lateral_mm(-1e9), 35.0);
    }

    #[test]
    fn antenna_magnitudes_and_signs() {
        let raised = ActuatorMapper::antennas(0.0, 0.0);
        assert!((raised[0].abs() - PI).abs() < EPS);
        assert!((raised[1].abs() - PI).abs() < EPS);
        assert!(raised[0] < 0.0 && raised[1] > 0.0);

        let lowered = ActuatorMapper::antennas(PI, PI);
        assert!(lowered[0].abs() < EPS);
        assert!(lowered[1].abs() < EPS);

        let half = ActuatorMapper::antennas(1.0, 1.0);
        assert!((half[0] + half[1]).abs() < EPS);
    }

    #[test]
    fn starts_neutral() {
        assert_eq!(mapper().current(), JointTarget::neutral());
    }

    #[test]
    fn missing_sway_holds_lateral_while_antennas_update() {
        let mut m = mapper();
        let first = m.map(&SignalBundle {
            left_arm: Some(PI),
            right_arm: Some(PI),
            hip_sway: Some(-40.0),
        });
        assert!((first.head_lateral_mm - 17.5).abs() < EPS);

        let second = m.map(&SignalBundle {
            left_arm: Some(0.5),
            right_arm: Some(1.5),
            hip_sway: None,
        });
        assert_eq!(second.head_lateral_mm, first.head_lateral_mm);
        assert!((second.antenna_left_rad + (PI - 0.5)).abs() < EPS);
        assert!((second.antenna_right_rad - (PI - 1.5)).abs() < EPS);
    }

    #[test]
    fn one_missing_arm_holds_both_antennas() {
        let mut m = mapper();
        let first = m.map(&SignalBundle {
            left_arm: Some(1.0),
            right_arm: Some(2.0),
            hip_sway: None,
        });
        let second = m.map(&SignalBundle {
            left_arm: None,
            right_arm: Some(0.1),
            hip_sway: Some(80.0),
        });
        assert_eq!(second.antennas(), first.antennas());
        assert_eq!(second.head_lateral_mm, -35.0);
    }

    #[test]
    fn empty_bundle_repeats_previous_target() {
        let mut m = mapper();
        let first = m.map(&sway(20.0));
        let again = m.map(&SignalBundle::default());
        assert_eq!(first, again);
    }

    #[test]
    fn end_to_end_scenario() {
        let mut m = mapper();
        let target = m.map(&SignalBundle {
            left_arm: Some(0.0),
            right_arm: Some(PI),
            hip_sway: Some(40.0),
        });
        assert!((target.head_lateral_mm + 17.5).abs() < EPS);
        assert!((target.antenna_left_rad + PI).abs() < EPS);
        assert!(target.antenna_right_rad.abs() < EPS);
    }
}
