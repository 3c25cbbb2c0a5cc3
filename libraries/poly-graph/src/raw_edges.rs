use crate::config::PolyGraphConfig;
use crate::error::PolyGraphError;
use crate::polygon_set::{PolygonSet, Tag};
use crate::transform::IntegerTransform;
use crate::util::aabb::{Aabb, merge_bounding_boxes};
use crate::util::grid::Grid;
use crate::util::math::distance_squared;
use glam::{DVec2, I64Vec2};

/// A vertex after conversion, remembering where it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RawVertex {
	pub(crate) position: I64Vec2,
	pub(crate) original: DVec2,
	pub(crate) tag: Option<Tag>,
}

/// One input edge in integer coordinates, before any splitting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RawEdge {
	pub(crate) start: RawVertex,
	pub(crate) end: RawVertex,
	pub(crate) set: usize,
	pub(crate) ring: u32,
	pub(crate) polygon: u32,
}

impl RawEdge {
	pub(crate) fn bounding_box(&self) -> Aabb {
		Aabb::from_segment(self.start.position, self.end.position)
	}
}

/// Converts every ring of `set` into raw edges appended to `edges`.
///
/// Consecutive vertices closer than `too_close` collapse into the first of them. Closed rings that end up with fewer
/// than three edges are dropped; open lines keep any edge they have.
pub(crate) fn append_raw_edges(edges: &mut Vec<RawEdge>, set_index: usize, set: &PolygonSet, transform: &IntegerTransform, config: &PolyGraphConfig, closed: bool) -> Result<(), PolyGraphError> {
	edges.try_reserve(set.point_count())?;

	let too_close = config.too_close as i128 * config.too_close as i128;
	let mut vertices: Vec<RawVertex> = Vec::new();
	let mut dropped_rings = 0;

	for (ring_index, ring) in set.rings().enumerate() {
		vertices.clear();
		for (index, &original) in ring.points.iter().enumerate() {
			let vertex = RawVertex {
				position: transform.to_integer(original),
				original,
				tag: ring.tags.and_then(|tags| tags.get(index).copied().flatten()),
			};
			match vertices.last() {
				Some(last) if distance_squared(last.position, vertex.position) < too_close => {}
				_ => vertices.push(vertex),
			}
		}
		if closed {
			while vertices.len() > 1 && distance_squared(vertices[0].position, vertices[vertices.len() - 1].position) < too_close {
				vertices.pop();
			}
		}

		let edge_count = if closed { vertices.len() } else { vertices.len().saturating_sub(1) };
		let minimum = if closed { 3 } else { 1 };
		if edge_count < minimum {
			dropped_rings += 1;
			continue;
		}

		for index in 0..edge_count {
			edges.push(RawEdge {
				start: vertices[index],
				end: vertices[(index + 1) % vertices.len()],
				set: set_index,
				ring: ring_index as u32,
				polygon: ring.component as u32,
			});
		}
	}

	if dropped_rings > 0 {
		log::debug!("Set {set_index}: {dropped_rings} rings collapsed during conversion and were dropped");
	}
	Ok(())
}

/// Registers every edge in a uniform grid over their combined bounds.
pub(crate) fn build_edge_grid(edges: &[RawEdge], config: &PolyGraphConfig) -> Result<Grid, PolyGraphError> {
	let bounds = edges.iter().map(RawEdge::bounding_box).reduce(|a, b| merge_bounding_boxes(&a, &b)).unwrap_or(Aabb::new(0, 0, 0, 0));
	let mut grid = Grid::new(&bounds, edges.len(), &config.grid)?;
	for (index, edge) in edges.iter().enumerate() {
		grid.insert(&edge.bounding_box(), index as u32);
	}
	Ok(grid)
}
