use crate::config::PolyGraphConfig;
use crate::error::PolyGraphError;
use crate::graph::{SegmentFlags, SegmentGraph};
use crate::util::aabb::Aabb;
use crate::util::grid::Grid;
use crate::util::math::{crosses_negative_x_ray, swap_axes};
use glam::I64Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BooleanOperation {
	/// Area covered by both sets.
	Intersection,
	/// Area covered by either set.
	Union,
	/// Area covered by exactly one set.
	Xor,
	/// Every bounded face formed by the boundaries of both sets.
	Fragment,
}

impl BooleanOperation {
	fn combine(self, a: bool, b: bool) -> bool {
		match self {
			BooleanOperation::Intersection => a && b,
			BooleanOperation::Union => a || b,
			BooleanOperation::Xor => a ^ b,
			BooleanOperation::Fragment => true,
		}
	}
}

/// Marks each live segment as discarded or valid in the one direction that has the result interior on its left.
///
/// For fragmentation every segment that survives dangling chain pruning is valid both ways.
pub(crate) fn classify_segments(graph: &mut SegmentGraph, operation: BooleanOperation, config: &PolyGraphConfig) -> Result<(), PolyGraphError> {
	if operation == BooleanOperation::Fragment {
		graph.prune_dangling();
		for segment in graph.segments.iter_mut().filter(|segment| segment.is_live()) {
			segment.flags.insert(SegmentFlags::FORWARD_VALID | SegmentFlags::REVERSE_VALID);
		}
		return Ok(());
	}

	let grid = build_segment_grid(graph, config)?;

	// Every ray cast has to see the boundaries as they were before any segment got discarded
	let unclassified: &SegmentGraph = graph;
	let sides: Vec<Option<[[bool; 2]; 2]>> = (0..unclassified.segments.len())
		.map(|index| unclassified.segments[index].is_live().then(|| side_status(unclassified, &grid, index)))
		.collect();

	let mut discarded = 0;
	for (index, sides) in sides.into_iter().enumerate() {
		let Some([left, right]) = sides else { continue };
		let left = operation.combine(left[0], left[1]);
		let right = operation.combine(right[0], right[1]);

		let flags = match (left, right) {
			(true, false) => SegmentFlags::FORWARD_VALID,
			(false, true) => SegmentFlags::REVERSE_VALID,
			_ => {
				let segment = &graph.segments[index];
				log::trace!("Discarding segment {index} from polygon {} ring {}", segment.polygon, segment.ring);
				discarded += 1;
				SegmentFlags::DISCARDED
			}
		};
		graph.segments[index].flags.insert(flags);
	}
	log::debug!("Classified {} segments for {operation:?}, {discarded} discarded", graph.segments.len());

	let pruned = graph.prune_dangling();
	if pruned > 0 {
		log::warn!("{pruned} valid segments were left dangling after classification and have been removed");
	}
	log::debug!("{} segments remain for the walk", graph.live_segment_count());
	Ok(())
}

fn build_segment_grid(graph: &SegmentGraph, config: &PolyGraphConfig) -> Result<Grid, PolyGraphError> {
	let bounds = Aabb::from_points(graph.nodes.iter().map(|node| node.position));
	let bounds = if bounds.is_empty() { Aabb::new(0, 0, 0, 0) } else { bounds };
	let mut grid = Grid::new(&bounds, graph.segments.len(), &config.grid)?;
	for (index, segment) in graph.segments.iter().enumerate().filter(|(_, segment)| segment.is_live()) {
		grid.insert(&graph.segment_bounds(segment), index as u32);
	}
	Ok(grid)
}

/// Even-odd inside status of both input sets immediately left and right of a segment, as `[left, right]`.
///
/// A ray from the segment midpoint toward negative x counts crossings with every other segment that is a boundary of
/// the set. Horizontal segments cast toward negative y instead. Coordinates are doubled so the midpoint is integral.
fn side_status(graph: &SegmentGraph, grid: &Grid, index: usize) -> [[bool; 2]; 2] {
	let segment = &graph.segments[index];
	let start = graph.position(segment.node1);
	let end = graph.position(segment.node2);
	let direction = end - start;
	let midpoint = start + end;

	let vertical_ray = direction.y == 0;
	let (candidates, project): (&[u32], fn(I64Vec2) -> I64Vec2) = if vertical_ray {
		(grid.column_band(midpoint.x.div_euclid(2)), swap_axes)
	} else {
		(grid.row_band(midpoint.y.div_euclid(2)), |point| point)
	};
	let ray_origin = project(midpoint);

	let mut ray_side = [false; 2];
	for &candidate in candidates {
		if candidate as usize == index {
			continue;
		}
		let other = &graph.segments[candidate as usize];
		if !other.is_live() || (!other.in_set(0) && !other.in_set(1)) {
			continue;
		}
		let a = project(graph.position(other.node1) * 2);
		let b = project(graph.position(other.node2) * 2);
		if crosses_negative_x_ray(a, b, ray_origin) == Some(true) {
			for (set, inside) in ray_side.iter_mut().enumerate() {
				if other.in_set(set) {
					*inside = !*inside;
				}
			}
		}
	}

	let far_side = [ray_side[0] ^ segment.in_set(0), ray_side[1] ^ segment.in_set(1)];
	let ray_side_is_left = if vertical_ray { direction.x < 0 } else { direction.y > 0 };
	if ray_side_is_left { [ray_side, far_side] } else { [far_side, ray_side] }
}
