//! Oriented grasp rectangles built from three operator clicks.

/// A 2-D point in image pixel coordinates.
pub type Point2 = (f64, f64);

/// A grasp rectangle defined by three clicks.
///
/// `clicks[0] -> clicks[1]` is the long (jaw-opening) edge and
/// `clicks[1] -> clicks[2]` the adjacent short edge, entered clockwise.
/// Everything else is derived; the fourth corner is never clicked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraspRect {
    pub clicks: [Point2; 3],
    pub width: f64,
    pub height: f64,
    pub orientation_deg: f64,
    pub center: Point2,
    pub jacquard_angle: f64,
}

impl GraspRect {
    pub fn from_clicks(p0: Point2, p1: Point2, p2: Point2) -> Self {
        let width = distance(p0, p1);
        let height = distance(p1, p2);

        let mut orientation_deg = (p1.1 - p0.1).atan2(p1.0 - p0.0).to_degrees();
        // atan2 can land on -180 exactly; keep the range half-open at the bottom.
        if orientation_deg <= -180.0 {
            orientation_deg += 360.0;
        }

        let rad = orientation_deg.to_radians();
        let center = (
            p0.0 + rad.cos() * (width / 2.0),
            p0.1 + rad.sin() * (width / 2.0),
        );

        Self {
            clicks: [p0, p1, p2],
            width,
            height,
            orientation_deg,
            center,
            jacquard_angle: jacquard_angle(orientation_deg),
        }
    }

    /// The four corners in rotation order, starting at the first click.
    pub fn corners(&self) -> [Point2; 4] {
        rotated_box(self.clicks[0], self.width, self.height, self.orientation_deg)
    }

    /// Deviation of the angle at the middle click from a right angle, in degrees.
    ///
    /// Zero-length edges report 0.
    pub fn corner_skew_deg(&self) -> f64 {
        let [p0, p1, p2] = self.clicks;
        let a = (p0.0 - p1.0, p0.1 - p1.1);
        let b = (p2.0 - p1.0, p2.1 - p1.1);
        let norm = (a.0.hypot(a.1)) * (b.0.hypot(b.1));
        if norm <= f64::EPSILON {
            return 0.0;
        }
        let cos = ((a.0 * b.0 + a.1 * b.1) / norm).clamp(-1.0, 1.0);
        (cos.acos().to_degrees() - 90.0).abs()
    }
}

/// Maps an orientation in `(-180, 180]` onto the Jacquard long-edge convention `[0, 180)`.
pub fn jacquard_angle(orientation_deg: f64) -> f64 {
    // `0.0 - x` rather than `-x` so a zero orientation never yields -0.
    let angle = if orientation_deg <= 0.0 {
        0.0 - orientation_deg
    } else {
        180.0 - orientation_deg
    };
    if angle >= 180.0 { angle - 180.0 } else { angle }
}

/// Rotates the box `(0,0)-(w,0)-(w,h)-(0,h)` by `angle_deg` about the origin,
/// then translates it to `origin`.
pub fn rotated_box(origin: Point2, width: f64, height: f64, angle_deg: f64) -> [Point2; 4] {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let canonical = [(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)];
    canonical.map(|(x, y)| (cos * x - sin * y + origin.0, sin * x + cos * y + origin.1))
}

fn distance(a: Point2, b: Point2) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_point(actual: Point2, expected: Point2) {
        assert_abs_diff_eq!(actual.0, expected.0, epsilon = 1e-9);
        assert_abs_diff_eq!(actual.1, expected.1, epsilon = 1e-9);
    }

    #[test]
    fn axis_aligned_clicks() {
        let rect = GraspRect::from_clicks((0.0, 0.0), (100.0, 0.0), (100.0, 50.0));
        assert_abs_diff_eq!(rect.width, 100.0);
        assert_abs_diff_eq!(rect.height, 50.0);
        assert_abs_diff_eq!(rect.orientation_deg, 0.0);
        assert_abs_diff_eq!(rect.jacquard_angle, 0.0);
        assert_point(rect.center, (50.0, 0.0));

        let corners = rect.corners();
        assert_point(corners[0], (0.0, 0.0));
        assert_point(corners[1], (100.0, 0.0));
        assert_point(corners[2], (100.0, 50.0));
        assert_point(corners[3], (0.0, 50.0));
    }

    #[test]
    fn vertical_long_edge() {
        let rect = GraspRect::from_clicks((0.0, 0.0), (0.0, 100.0), (-50.0, 100.0));
        assert_abs_diff_eq!(rect.orientation_deg, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rect.jacquard_angle, 90.0, epsilon = 1e-9);
        assert_point(rect.center, (0.0, 50.0));

        let corners = rect.corners();
        assert_point(corners[2], (-50.0, 100.0));
        assert_point(corners[3], (-50.0, 0.0));
    }

    #[test]
    fn negative_orientation_maps_to_its_magnitude() {
        let rect = GraspRect::from_clicks((0.0, 0.0), (10.0, -10.0), (20.0, 0.0));
        assert_abs_diff_eq!(rect.orientation_deg, -45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rect.jacquard_angle, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn leftward_edge_is_plus_180() {
        let rect = GraspRect::from_clicks((10.0, 0.0), (0.0, -0.0), (0.0, -5.0));
        assert_abs_diff_eq!(rect.orientation_deg, 180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rect.jacquard_angle, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn jacquard_angle_stays_in_range() {
        let mut deg = -179.75;
        while deg <= 180.0 {
            let a = jacquard_angle(deg);
            assert!((0.0..180.0).contains(&a), "{deg} -> {a}");
            deg += 0.25;
        }
        assert!((0.0..180.0).contains(&jacquard_angle(-180.0)));
    }

    #[test]
    fn right_angle_clicks_give_parallel_equal_sides() {
        let p0 = (37.5, 12.0);
        let dir = (30.0_f64.to_radians().cos(), 30.0_f64.to_radians().sin());
        let p1 = (p0.0 + 80.0 * dir.0, p0.1 + 80.0 * dir.1);
        let p2 = (p1.0 - 25.0 * dir.1, p1.1 + 25.0 * dir.0);
        let rect = GraspRect::from_clicks(p0, p1, p2);
        let c = rect.corners();

        assert_point(c[1], p1);
        assert_point(c[2], p2);

        let side = |a: Point2, b: Point2| (b.0 - a.0, b.1 - a.1);
        let (s01, s32) = (side(c[0], c[1]), side(c[3], c[2]));
        let (s12, s03) = (side(c[1], c[2]), side(c[0], c[3]));
        assert_abs_diff_eq!(s01.0, s32.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s01.1, s32.1, epsilon = 1e-9);
        assert_abs_diff_eq!(s12.0, s03.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s12.1, s03.1, epsilon = 1e-9);
        assert_abs_diff_eq!(rect.corner_skew_deg(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn degenerate_clicks_do_not_fail() {
        let rect = GraspRect::from_clicks((5.0, 5.0), (5.0, 5.0), (5.0, 5.0));
        assert_eq!(rect.width, 0.0);
        assert_eq!(rect.height, 0.0);
        assert_eq!(rect.corner_skew_deg(), 0.0);
        for corner in rect.corners() {
            assert_point(corner, (5.0, 5.0));
        }
    }

    #[test]
    fn skewed_clicks_report_skew() {
        let rect = GraspRect::from_clicks((0.0, 0.0), (100.0, 0.0), (150.0, 50.0));
        assert_abs_diff_eq!(rect.corner_skew_deg(), 45.0, epsilon = 1e-9);
    }
}
