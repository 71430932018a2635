//! Segment/circle geometry used by crossing detection and report annotations.
//!
//! Degenerate inputs (zero-length segments, near-zero vectors) are valid
//! "no result" outcomes, never errors.

use crate::point::Point;

/// Below this squared length a motion segment counts as zero-length.
const DEGENERATE_SEGMENT_EPS: f64 = 1e-12;

/// Below this norm a vector has no usable direction.
const MIN_VECTOR_NORM: f64 = 1e-10;

/// First intersection of the segment `[p0, p1]` with the circle, walking
/// from `p0`.
///
/// Solves the quadratic parametrization of the segment and returns the
/// solution with the smallest parameter `t` in `[0, 1]`, or `None` when the
/// segment misses the circle entirely.
pub fn segment_circle_intersection(
    p0: Point,
    p1: Point,
    center: Point,
    radius: f64,
) -> Option<Point> {
    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;
    let ex = p0.x - center.x;
    let ey = p0.y - center.y;

    let a = dx * dx + dy * dy;
    if a < DEGENERATE_SEGMENT_EPS {
        return None;
    }
    let b = 2.0 * (ex * dx + ey * dy);
    let c = ex * ex + ey * ey - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);

    let (near, far) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
    for t in [near, far] {
        if (0.0..=1.0).contains(&t) {
            return Some(Point::new(p0.x + t * dx, p0.y + t * dy));
        }
    }
    None
}

/// First point where a polyline crosses the circle, scanning consecutive
/// segments from the start of the path.
pub fn path_circle_intersection(path: &[Point], center: Point, radius: f64) -> Option<Point> {
    if path.len() < 2 {
        return None;
    }
    path.windows(2)
        .find_map(|pair| segment_circle_intersection(pair[0], pair[1], center, radius))
}

/// Euclidean containment test, boundary inclusive.
pub fn point_in_circle(point: Point, center: Point, radius: f64) -> bool {
    point.distance_to(center) <= radius
}

/// Angle in degrees between the vectors `center -> p1` and `center -> p2`,
/// in `[0, 180]`. `None` when either vector has near-zero magnitude.
pub fn angle_between_deg(center: Point, p1: Point, p2: Point) -> Option<f64> {
    let ux = p1.x - center.x;
    let uy = p1.y - center.y;
    let vx = p2.x - center.x;
    let vy = p2.y - center.y;

    let norm_u = ux.hypot(uy);
    let norm_v = vx.hypot(vy);
    if norm_u < MIN_VECTOR_NORM || norm_v < MIN_VECTOR_NORM {
        return None;
    }

    let cos = ((ux * vx + uy * vy) / (norm_u * norm_v)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}
