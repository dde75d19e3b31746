/// Angle at vertex `b` between the vectors `a - b` and `c - b`, in radians.
///
/// Works for any dimension, so 2D image points and 3D points go through the
/// same code. Returns `0.0` when either vector has zero length instead of
/// producing NaN.
pub fn angle_at_vertex<const N: usize>(a: [f32; N], b: [f32; N], c: [f32; N]) -> f32 {
    let mut dot = 0.0_f32;
    let mut norm_ba = 0.0_f32;
    let mut norm_bc = 0.0_f32;
    for i in 0..N {
        let ba = a[i] - b[i];
        let bc = c[i] - b[i];
        dot += ba * bc;
        norm_ba += ba * ba;
        norm_bc += bc * bc;
    }

    let norm_ba = norm_ba.sqrt();
    let norm_bc = norm_bc.sqrt();
    if norm_ba == 0.0 || norm_bc == 0.0 {
        return 0.0;
    }

    // Rounding can push the cosine slightly outside [-1, 1].
    let cosine = (dot / (norm_ba * norm_bc)).clamp(-1.0, 1.0);
    cosine.acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-6;

    #[test]
    fn right_angle_2d() {
        let angle = angle_at_vertex([1.0, 0.0], [0.0, 0.0], [0.0, 1.0]);
        assert!((angle - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn straight_angle_2d() {
        let angle = angle_at_vertex([1.0, 0.0], [0.0, 0.0], [-1.0, 0.0]);
        assert!((angle - PI).abs() < EPS);
    }

    #[test]
    fn zero_angle_2d() {
        assert_eq!(angle_at_vertex([1.0, 0.0], [0.0, 0.0], [1.0, 0.0]), 0.0);
    }

    #[test]
    fn same_results_embedded_in_3d() {
        let right = angle_at_vertex([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let straight = angle_at_vertex([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [-1.0, 0.0, 0.0]);
        let zero = angle_at_vertex([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        assert!((right - FRAC_PI_2).abs() < EPS);
        assert!((straight - PI).abs() < EPS);
        assert_eq!(zero, 0.0);
    }

    #[test]
    fn zero_length_vectors_yield_zero() {
        assert_eq!(angle_at_vertex([0.0, 0.0], [0.0, 0.0], [1.0, 1.0]), 0.0);
        assert_eq!(angle_at_vertex([3.0, 4.0], [2.0, 2.0], [2.0, 2.0]), 0.0);
        assert_eq!(
            angle_at_vertex([5.0, 5.0, 5.0], [5.0, 5.0, 5.0], [5.0, 5.0, 5.0]),
            0.0
        );
    }

    #[test]
    fn symmetric_in_outer_points() {
        let triples = [
            ([3.0, 7.0], [1.0, 2.0], [-4.0, 0.5]),
            ([120.0, 300.0], [140.0, 180.0], [200.0, 90.0]),
            ([0.1, -0.2], [0.0, 0.0], [-0.3, -0.3]),
        ];
        for (a, b, c) in triples {
            let forward = angle_at_vertex(a, b, c);
            let backward = angle_at_vertex(c, b, a);
            assert!((forward - backward).abs() < EPS, "{a:?} {b:?} {c:?}");
        }
    }

    #[test]
    fn nearly_parallel_vectors_stay_finite() {
        let angle = angle_at_vertex([1e6, 1.0], [0.0, 0.0], [1e6, 1.0 + 1e-3]);
        assert!(angle.is_finite());
        assert!(angle >= 0.0);
    }
}
