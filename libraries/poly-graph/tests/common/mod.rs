#![allow(dead_code)]

use glam::DVec2;
use poly_graph::PolygonSet;

pub fn init_logger() {
	let _ = env_logger::builder().is_test(true).try_init();
}

pub fn points(coordinates: &[(f64, f64)]) -> Vec<DVec2> {
	coordinates.iter().map(|&(x, y)| DVec2::new(x, y)).collect()
}

pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Vec<DVec2> {
	points(&[(x, y), (x + width, y), (x + width, y + height), (x, y + height)])
}

pub fn set_of(rings: &[Vec<DVec2>]) -> PolygonSet {
	let mut set = PolygonSet::new();
	for ring in rings {
		set.push_polygon(ring);
	}
	set
}

/// Vertices of a ring rounded to a micro grid, without the closing vertex, sorted so that start point and
/// orientation do not matter.
pub fn vertex_set(points: &[DVec2]) -> Vec<(i64, i64)> {
	let open = match points {
		[first, rest @ .., last] if first == last && !rest.is_empty() => &points[..points.len() - 1],
		_ => points,
	};
	let mut rounded: Vec<(i64, i64)> = open.iter().map(|point| ((point.x * 1e6).round() as i64, (point.y * 1e6).round() as i64)).collect();
	rounded.sort_unstable();
	rounded
}

/// Rounded vertex sets of every ring in storage order.
pub fn ring_vertex_sets(set: &PolygonSet) -> Vec<Vec<(i64, i64)>> {
	let mut rings: Vec<_> = set.rings().map(|ring| vertex_set(ring.points)).collect();
	rings.sort();
	rings
}

pub fn micro(coordinates: &[(f64, f64)]) -> Vec<(i64, i64)> {
	vertex_set(&points(coordinates))
}

pub fn assert_area(set: &PolygonSet, expected: f64) {
	let area = set.signed_area();
	assert!((area - expected).abs() < 1e-6, "expected area {expected}, got {area}");
}

/// Every ring repeats its first vertex and has no two identical consecutive vertices.
pub fn assert_closed_rings(set: &PolygonSet) {
	for ring in set.rings() {
		assert!(ring.points.len() >= 4, "ring too short: {:?}", ring.points);
		assert_eq!(ring.points.first(), ring.points.last());
		assert!(ring.points.windows(2).all(|pair| pair[0] != pair[1]), "repeated vertex in {:?}", ring.points);
	}
}

/// Even-odd containment of a point in a closed ring, in plain double precision.
pub fn point_in_ring(ring: &[DVec2], point: DVec2) -> bool {
	let mut inside = false;
	for pair in ring.windows(2) {
		let (a, b) = (pair[0], pair[1]);
		if (a.y > point.y) != (b.y > point.y) {
			let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
			if x < point.x {
				inside = !inside;
			}
		}
	}
	inside
}
