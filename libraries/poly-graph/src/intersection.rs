use crate::config::PolyGraphConfig;
use crate::error::{CapacityError, PolyGraphError};
use crate::raw_edges::RawEdge;
use crate::util::aabb::{bounding_boxes_overlap, expand_bounding_box};
use crate::util::grid::{BitVec, Grid};
use crate::util::math::{dot, grazes_segment_interior, proper_crossing};
use glam::I64Vec2;
use smallvec::SmallVec;

pub(crate) type SplitPoints = SmallVec<[I64Vec2; 2]>;

/// Finds, for every raw edge, the interior points where it has to be split.
///
/// An endpoint of one edge lying within graze of the interior of another splits that other edge at the endpoint
/// itself, which also covers collinear overlaps. Otherwise a proper crossing splits both edges at the rounded
/// crossing point. Endpoint to endpoint contact is left to node merging.
///
/// The returned split points of each edge are ordered from its start to its end and deduplicated.
pub(crate) fn find_split_points(edges: &[RawEdge], grid: &Grid, config: &PolyGraphConfig) -> Result<Vec<SplitPoints>, PolyGraphError> {
	let mut splits: Vec<SplitPoints> = Vec::new();
	splits.try_reserve_exact(edges.len())?;
	splits.resize_with(edges.len(), SmallVec::new);

	let graze = config.graze;
	let mut candidate_bits = BitVec::new(edges.len());
	let mut candidates = Vec::new();
	let mut split_count = 0;
	let mut crossing_count = 0;

	for (i, edge) in edges.iter().enumerate() {
		let reach = expand_bounding_box(&edge.bounding_box(), graze);
		grid.query(&reach, &mut candidate_bits);
		candidate_bits.drain_into(&mut candidates);

		let (a0, a1) = (edge.start.position, edge.end.position);
		for &j in candidates.iter().filter(|&&j| j > i) {
			if !bounding_boxes_overlap(&reach, &edges[j].bounding_box()) {
				continue;
			}
			let (b0, b1) = (edges[j].start.position, edges[j].end.position);

			let mut touched = false;
			for point in [b0, b1] {
				if grazes_segment_interior(point, a0, a1, graze) {
					splits[i].push(point);
					split_count += 1;
					touched = true;
				}
			}
			for point in [a0, a1] {
				if grazes_segment_interior(point, b0, b1, graze) {
					splits[j].push(point);
					split_count += 1;
					touched = true;
				}
			}
			if touched {
				continue;
			}

			if let Some(crossing) = proper_crossing(a0, a1, b0, b1) {
				log::trace!("Edges {i} and {j} cross at {crossing}");
				splits[i].push(crossing);
				splits[j].push(crossing);
				split_count += 2;
				crossing_count += 1;
			}
		}

		if split_count > config.max_graph_nodes {
			return Err(CapacityError::GraphNodes { limit: config.max_graph_nodes }.into());
		}
	}

	for (edge, points) in edges.iter().zip(&mut splits) {
		order_along_edge(points, edge.start.position, edge.end.position);
	}

	log::debug!("Found {crossing_count} crossings and {split_count} split points on {} edges", edges.len());
	Ok(splits)
}

fn order_along_edge(points: &mut SplitPoints, start: I64Vec2, end: I64Vec2) {
	if points.len() < 2 {
		return;
	}
	let direction = end - start;
	points.sort_unstable_by_key(|&point| (dot(point - start, direction), point.x, point.y));
	points.dedup();
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::raw_edges::{RawVertex, build_edge_grid};
	use glam::DVec2;

	fn edge(a: (i64, i64), b: (i64, i64), set: usize) -> RawEdge {
		let vertex = |(x, y): (i64, i64)| RawVertex {
			position: I64Vec2::new(x, y),
			original: DVec2::new(x as f64, y as f64),
			tag: None,
		};
		RawEdge {
			start: vertex(a),
			end: vertex(b),
			set,
			ring: 0,
			polygon: 0,
		}
	}

	fn split(edges: &[RawEdge]) -> Vec<SplitPoints> {
		let config = PolyGraphConfig::default();
		let grid = build_edge_grid(edges, &config).unwrap();
		find_split_points(edges, &grid, &config).unwrap()
	}

	#[test]
	fn crossing_splits_both_edges() {
		let splits = split(&[edge((0, 0), (1000, 1000), 0), edge((0, 1000), (1000, 0), 1)]);
		assert_eq!(splits[0].as_slice(), &[I64Vec2::new(500, 500)]);
		assert_eq!(splits[1].as_slice(), &[I64Vec2::new(500, 500)]);
	}

	#[test]
	fn touching_endpoint_splits_the_other_edge() {
		let splits = split(&[edge((0, 0), (1000, 0), 0), edge((400, 10), (400, 800), 1)]);
		assert_eq!(splits[0].as_slice(), &[I64Vec2::new(400, 10)]);
		assert!(splits[1].is_empty());
	}

	#[test]
	fn collinear_overlap_splits_at_overlap_ends() {
		let splits = split(&[edge((0, 0), (1000, 0), 0), edge((300, 0), (1500, 0), 1)]);
		assert_eq!(splits[0].as_slice(), &[I64Vec2::new(300, 0)]);
		assert_eq!(splits[1].as_slice(), &[I64Vec2::new(1000, 0)]);
	}

	#[test]
	fn split_points_are_ordered_along_the_edge() {
		let splits = split(&[
			edge((1000, 0), (0, 0), 0),
			edge((200, -100), (200, 100), 1),
			edge((700, -100), (700, 100), 1),
			edge((500, -100), (500, 100), 1),
		]);
		assert_eq!(splits[0].as_slice(), &[I64Vec2::new(700, 0), I64Vec2::new(500, 0), I64Vec2::new(200, 0)]);
	}

	#[test]
	fn shared_endpoints_do_not_split() {
		let splits = split(&[edge((0, 0), (1000, 0), 0), edge((1000, 0), (1000, 1000), 0)]);
		assert!(splits.iter().all(SmallVec::is_empty));
	}
}
