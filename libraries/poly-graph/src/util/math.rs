//! Exact predicates on the integer coordinate space.
//!
//! Integer coordinates stay within a few billion, so every product below fits comfortably in `i128` and the
//! predicates never round.

use glam::{DVec2, I64Vec2};
use std::f64::consts::TAU;

#[inline]
pub(crate) fn cross(a: I64Vec2, b: I64Vec2) -> i128 {
	a.x as i128 * b.y as i128 - a.y as i128 * b.x as i128
}

#[inline]
pub(crate) fn dot(a: I64Vec2, b: I64Vec2) -> i128 {
	a.x as i128 * b.x as i128 + a.y as i128 * b.y as i128
}

/// Twice the signed area of the triangle `a`, `b`, `c`. Positive when the turn is counter-clockwise.
#[inline]
pub(crate) fn orientation(a: I64Vec2, b: I64Vec2, c: I64Vec2) -> i128 {
	cross(b - a, c - a)
}

#[inline]
pub(crate) fn distance_squared(a: I64Vec2, b: I64Vec2) -> i128 {
	let d = b - a;
	dot(d, d)
}

#[inline]
pub(crate) fn swap_axes(point: I64Vec2) -> I64Vec2 {
	I64Vec2::new(point.y, point.x)
}

/// Integer division rounded to the nearest value, halves away from negative infinity.
pub(crate) fn div_round(numerator: i128, denominator: i128) -> i128 {
	debug_assert!(denominator != 0);
	let (numerator, denominator) = if denominator < 0 { (-numerator, -denominator) } else { (numerator, denominator) };
	(2 * numerator + denominator).div_euclid(2 * denominator)
}

/// Whether `point` is within `graze` of the open segment `start`-`end`, measured perpendicular to the segment.
/// Points whose projection falls on or beyond either endpoint never count.
pub(crate) fn grazes_segment_interior(point: I64Vec2, start: I64Vec2, end: I64Vec2, graze: i64) -> bool {
	let direction = end - start;
	let length_squared = dot(direction, direction);
	if length_squared == 0 {
		return false;
	}
	let along = dot(point - start, direction);
	if along <= 0 || along >= length_squared {
		return false;
	}
	let offset = cross(direction, point - start);
	let graze = graze as i128;
	offset * offset <= graze * graze * length_squared
}

/// The interior crossing point of two segments, rounded to the integer grid.
/// Returns `None` unless each segment strictly straddles the other's supporting line.
pub(crate) fn proper_crossing(a0: I64Vec2, a1: I64Vec2, b0: I64Vec2, b1: I64Vec2) -> Option<I64Vec2> {
	let o1 = orientation(a0, a1, b0).signum();
	let o2 = orientation(a0, a1, b1).signum();
	if o1 == 0 || o2 == 0 || o1 == o2 {
		return None;
	}

	let o3 = orientation(b0, b1, a0);
	let o4 = orientation(b0, b1, a1);
	if o3.signum() == 0 || o4.signum() == 0 || o3.signum() == o4.signum() {
		return None;
	}

	let denominator = o3 - o4;
	let x = a0.x as i128 + div_round((a1.x - a0.x) as i128 * o3, denominator);
	let y = a0.y as i128 + div_round((a1.y - a0.y) as i128 * o3, denominator);
	Some(I64Vec2::new(x as i64, y as i64))
}

/// Decides whether the edge `a`-`b` crosses the ray leaving `point` toward negative x.
///
/// Uses the half open rule on y so that rays through shared vertices count once. Returns `None` when `point` lies
/// on the edge itself, which callers treat as a degenerate configuration.
pub(crate) fn crosses_negative_x_ray(a: I64Vec2, b: I64Vec2, point: I64Vec2) -> Option<bool> {
	if (a.y > point.y) == (b.y > point.y) {
		return Some(false);
	}
	let dy = (b.y - a.y) as i128;
	let side = (a.x - point.x) as i128 * dy + (point.y - a.y) as i128 * (b.x - a.x) as i128;
	if side == 0 {
		return None;
	}
	Some((side < 0) == (dy > 0))
}

/// Twice the signed area of a ring given without a repeated closing vertex.
pub(crate) fn doubled_signed_area(ring: &[I64Vec2]) -> i128 {
	if ring.len() < 3 {
		return 0;
	}
	let origin = ring[0];
	ring.windows(2).map(|pair| cross(pair[0] - origin, pair[1] - origin)).sum()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Containment {
	Inside,
	Outside,
	Boundary,
}

/// Even-odd containment of a point given in doubled coordinates (so that edge midpoints stay integral) against a
/// ring given in regular coordinates without a repeated closing vertex.
pub(crate) fn ring_containment(ring: &[I64Vec2], doubled_point: I64Vec2) -> Containment {
	let mut inside = false;
	for (index, &start) in ring.iter().enumerate() {
		let a = start * 2;
		let b = ring[(index + 1) % ring.len()] * 2;
		if a == b {
			continue;
		}
		if orientation(a, b, doubled_point) == 0 && a.min(b).cmple(doubled_point).all() && doubled_point.cmple(a.max(b)).all() {
			return Containment::Boundary;
		}
		match crosses_negative_x_ray(a, b, doubled_point) {
			Some(true) => inside = !inside,
			Some(false) => {}
			None => return Containment::Boundary,
		}
	}
	if inside { Containment::Inside } else { Containment::Outside }
}

/// Clockwise angle from `reference` to `candidate` in `(0, TAU]`.
/// A candidate pointing the same way as the reference gets the full turn so it sorts last.
pub(crate) fn clockwise_angle(reference: I64Vec2, candidate: I64Vec2) -> f64 {
	let sin = cross(reference, candidate) as f64;
	let cos = dot(reference, candidate) as f64;
	let counter_clockwise = sin.atan2(cos);
	let clockwise = (-counter_clockwise).rem_euclid(TAU);
	if clockwise == 0. { TAU } else { clockwise }
}

/// Direction angle of an integer vector in `[0, TAU)`, used to order node adjacency.
pub(crate) fn direction_angle(direction: I64Vec2) -> f64 {
	let angle = DVec2::new(direction.x as f64, direction.y as f64).to_angle();
	angle.rem_euclid(TAU)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn v(x: i64, y: i64) -> I64Vec2 {
		I64Vec2::new(x, y)
	}

	#[test]
	fn rounding_division() {
		assert_eq!(div_round(7, 2), 4);
		assert_eq!(div_round(-7, 2), -3);
		assert_eq!(div_round(5, -2), -2);
		assert_eq!(div_round(9, 3), 3);
	}

	#[test]
	fn crossing_point_is_exact_for_axis_aligned_segments() {
		assert_eq!(proper_crossing(v(0, -10), v(0, 10), v(-10, 4), v(10, 4)), Some(v(0, 4)));
		// Touching at an endpoint is not a proper crossing
		assert_eq!(proper_crossing(v(0, 0), v(0, 10), v(0, 10), v(10, 10)), None);
		// Collinear overlap is not a proper crossing
		assert_eq!(proper_crossing(v(0, 0), v(10, 0), v(5, 0), v(15, 0)), None);
	}

	#[test]
	fn graze_only_counts_interior_projection() {
		assert!(grazes_segment_interior(v(50, 3), v(0, 0), v(100, 0), 5));
		assert!(!grazes_segment_interior(v(50, 6), v(0, 0), v(100, 0), 5));
		assert!(!grazes_segment_interior(v(100, 1), v(0, 0), v(100, 0), 5));
		assert!(!grazes_segment_interior(v(-1, 0), v(0, 0), v(100, 0), 5));
	}

	#[test]
	fn area_sign_follows_orientation() {
		let ccw = [v(0, 0), v(10, 0), v(10, 10), v(0, 10)];
		assert_eq!(doubled_signed_area(&ccw), 200);
		let cw: Vec<_> = ccw.iter().rev().copied().collect();
		assert_eq!(doubled_signed_area(&cw), -200);
	}

	#[test]
	fn containment_reports_boundary() {
		let square = [v(0, 0), v(10, 0), v(10, 10), v(0, 10)];
		assert_eq!(ring_containment(&square, v(10, 10)), Containment::Inside);
		assert_eq!(ring_containment(&square, v(20, 10)), Containment::Boundary);
		assert_eq!(ring_containment(&square, v(0, 0)), Containment::Boundary);
		assert_eq!(ring_containment(&square, v(30, 10)), Containment::Outside);
		assert_eq!(ring_containment(&square, v(-2, 10)), Containment::Outside);
	}

	#[test]
	fn sharpest_left_turn_has_smallest_clockwise_angle() {
		// Arriving upward, the reversed incoming direction points down
		let reversed = v(0, -1);
		let left = clockwise_angle(reversed, v(-1, 0));
		let straight = clockwise_angle(reversed, v(0, 1));
		let right = clockwise_angle(reversed, v(1, 0));
		assert!(left < straight && straight < right);
		assert_eq!(clockwise_angle(reversed, reversed), TAU);
	}
}
