use crate::error::PolyGraphError;
use crate::graph::{SegmentFlags, SegmentGraph};
use crate::nesting::RingShape;
use crate::transform::IntegerTransform;
use crate::util::math::{clockwise_angle, orientation};
use glam::I64Vec2;

/// A closed walk through the graph. Positive area means counter-clockwise.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Loop {
	pub(crate) nodes: Vec<u32>,
	pub(crate) shape: RingShape,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Resolved {
	pub(crate) loops: Vec<Loop>,
	/// Nodes where a walk had to be abandoned.
	pub(crate) bug_locations: Vec<I64Vec2>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Direction {
	segment: u32,
	forward: bool,
}

impl Direction {
	fn valid_flag(self) -> SegmentFlags {
		if self.forward { SegmentFlags::FORWARD_VALID } else { SegmentFlags::REVERSE_VALID }
	}

	fn used_flag(self) -> SegmentFlags {
		if self.forward { SegmentFlags::FORWARD_USED } else { SegmentFlags::REVERSE_USED }
	}
}

struct Walker<'a> {
	graph: &'a mut SegmentGraph,
	transform: &'a IntegerTransform,
	simplify_collinear: bool,
	step_limit: usize,
	resolved: Resolved,
}

/// Walks every valid segment direction into closed loops, turning as sharply left as possible at each node.
pub(crate) fn resolve_loops(graph: &mut SegmentGraph, transform: &IntegerTransform, simplify_collinear: bool) -> Result<Resolved, PolyGraphError> {
	let step_limit = graph
		.segments
		.iter()
		.filter(|segment| segment.is_live())
		.map(|segment| segment.flags.intersection(SegmentFlags::FORWARD_VALID | SegmentFlags::REVERSE_VALID).bits().count_ones() as usize)
		.sum();

	let mut walker = Walker {
		graph,
		transform,
		simplify_collinear,
		step_limit,
		resolved: Resolved::default(),
	};

	for segment in 0..walker.graph.segments.len() as u32 {
		for forward in [true, false] {
			let seed = Direction { segment, forward };
			if walker.is_available(seed) {
				walker.walk(seed)?;
			}
		}
	}

	let Resolved { loops, bug_locations } = &walker.resolved;
	log::debug!("Resolved {} loops, {} walks abandoned", loops.len(), bug_locations.len());
	Ok(walker.resolved)
}

impl Walker<'_> {
	fn is_valid(&self, direction: Direction) -> bool {
		let segment = &self.graph.segments[direction.segment as usize];
		segment.is_live() && segment.flags.contains(direction.valid_flag())
	}

	fn is_available(&self, direction: Direction) -> bool {
		self.is_valid(direction) && !self.graph.segments[direction.segment as usize].flags.contains(direction.used_flag())
	}

	fn endpoints(&self, direction: Direction) -> (u32, u32) {
		let segment = &self.graph.segments[direction.segment as usize];
		if direction.forward { (segment.node1, segment.node2) } else { (segment.node2, segment.node1) }
	}

	fn topology_error(&self, node: u32, reason: &'static str) -> PolyGraphError {
		let location = self.transform.to_float(self.graph.position(node));
		log::error!("Topology failure at {location}: {reason}");
		PolyGraphError::Topology { x: location.x, y: location.y, reason }
	}

	fn walk(&mut self, seed: Direction) -> Result<(), PolyGraphError> {
		let (start, _) = self.endpoints(seed);
		let mut nodes = vec![start];
		let mut direction = seed;

		loop {
			let (from, to) = self.endpoints(direction);
			let flags = &mut self.graph.segments[direction.segment as usize].flags;
			if flags.contains(direction.used_flag()) {
				return Err(self.topology_error(from, "segment direction used twice"));
			}
			flags.insert(direction.used_flag());

			if to == start {
				self.finish_loop(nodes);
				return Ok(());
			}
			if nodes.len() > self.step_limit {
				return Err(self.topology_error(to, "walk does not close"));
			}
			nodes.push(to);

			match self.choose_exit(from, to, direction.segment) {
				Exit::Found(next) => direction = next,
				Exit::AllUsed => {
					log::warn!("Abandoning walk at {}: every valid exit is already used", self.transform.to_float(self.graph.position(to)));
					self.resolved.bug_locations.push(self.graph.position(to));
					return Ok(());
				}
				Exit::None => return Err(self.topology_error(to, "no valid exit from node")),
			}
		}
	}

	/// Picks the unused valid exit at `node` with the smallest clockwise angle from the reversed incoming direction.
	fn choose_exit(&self, previous: u32, node: u32, incoming: u32) -> Exit {
		let origin = self.graph.position(node);
		let reference = self.graph.position(previous) - origin;

		let mut any_valid = false;
		let mut best: Option<(f64, Direction)> = None;
		for &segment_index in &self.graph.nodes[node as usize].segments {
			let segment = &self.graph.segments[segment_index as usize];
			let direction = Direction {
				segment: segment_index,
				forward: segment.node1 == node,
			};
			if !self.is_valid(direction) {
				continue;
			}
			any_valid = true;
			if !self.is_available(direction) {
				continue;
			}

			let candidate = self.graph.position(segment.other_node(node)) - origin;
			let mut angle = clockwise_angle(reference, candidate);
			// Only turn back along the same segment when nothing else is left
			if segment_index == incoming {
				angle = f64::INFINITY;
			}
			if best.is_none_or(|(best_angle, _)| angle < best_angle) {
				best = Some((angle, direction));
			}
		}

		match best {
			Some((_, direction)) => Exit::Found(direction),
			None if any_valid => Exit::AllUsed,
			None => Exit::None,
		}
	}

	fn finish_loop(&mut self, mut nodes: Vec<u32>) {
		if self.simplify_collinear {
			nodes = remove_collinear(nodes, self.graph);
		}
		if nodes.len() < 3 {
			return;
		}
		let shape = RingShape::new(nodes.iter().map(|&node| self.graph.position(node)).collect());
		if shape.doubled_area == 0 {
			return;
		}
		self.resolved.loops.push(Loop { nodes, shape });
	}
}

enum Exit {
	Found(Direction),
	AllUsed,
	None,
}

fn remove_collinear(nodes: Vec<u32>, graph: &SegmentGraph) -> Vec<u32> {
	let collinear = |a: u32, b: u32, c: u32| orientation(graph.position(a), graph.position(b), graph.position(c)) == 0;

	let mut kept: Vec<u32> = Vec::with_capacity(nodes.len());
	for node in nodes {
		kept.push(node);
		while kept.len() >= 3 && collinear(kept[kept.len() - 3], kept[kept.len() - 2], kept[kept.len() - 1]) {
			kept.remove(kept.len() - 2);
		}
	}

	// The seam between the last and first vertex
	loop {
		let n = kept.len();
		if n < 3 {
			break;
		}
		if collinear(kept[n - 2], kept[n - 1], kept[0]) {
			kept.pop();
		} else if collinear(kept[n - 1], kept[0], kept[1]) {
			kept.remove(0);
		} else {
			break;
		}
	}
	kept
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::classify::{BooleanOperation, classify_segments};
	use crate::config::PolyGraphConfig;
	use crate::intersection::find_split_points;
	use crate::raw_edges::{RawEdge, RawVertex, build_edge_grid};
	use glam::DVec2;

	fn ring_edges(corners: &[(i64, i64)], set: usize) -> Vec<RawEdge> {
		let vertex = |(x, y): (i64, i64)| RawVertex {
			position: I64Vec2::new(x, y),
			original: DVec2::new(x as f64, y as f64),
			tag: None,
		};
		(0..corners.len())
			.map(|i| RawEdge {
				start: vertex(corners[i]),
				end: vertex(corners[(i + 1) % corners.len()]),
				set,
				ring: 0,
				polygon: 0,
			})
			.collect()
	}

	fn resolve(edges: &[RawEdge], operation: BooleanOperation) -> (SegmentGraph, Resolved) {
		let config = PolyGraphConfig::default();
		let transform = IntegerTransform::from_bounds(DVec2::ZERO, DVec2::ONE, &config).unwrap();
		let grid = build_edge_grid(edges, &config).unwrap();
		let splits = find_split_points(edges, &grid, &config).unwrap();
		let mut graph = SegmentGraph::build(edges, &splits, &config).unwrap();
		classify_segments(&mut graph, operation, &config).unwrap();
		let resolved = resolve_loops(&mut graph, &transform, true).unwrap();
		(graph, resolved)
	}

	#[test]
	fn union_of_overlapping_squares_is_one_octagon_shaped_loop() {
		let mut edges = ring_edges(&[(0, 0), (1000, 0), (1000, 1000), (0, 1000)], 0);
		edges.extend(ring_edges(&[(500, 500), (1500, 500), (1500, 1500), (500, 1500)], 1));
		let (_, resolved) = resolve(&edges, BooleanOperation::Union);
		assert_eq!(resolved.loops.len(), 1);
		assert_eq!(resolved.loops[0].nodes.len(), 8);
		assert_eq!(resolved.loops[0].shape.doubled_area, 2 * 1_750_000);
		assert!(resolved.bug_locations.is_empty());
	}

	#[test]
	fn squares_touching_at_a_corner_stay_separate() {
		let mut edges = ring_edges(&[(0, 0), (1000, 0), (1000, 1000), (0, 1000)], 0);
		edges.extend(ring_edges(&[(1000, 1000), (2000, 1000), (2000, 2000), (1000, 2000)], 1));
		let (_, resolved) = resolve(&edges, BooleanOperation::Union);
		assert_eq!(resolved.loops.len(), 2);
		assert!(resolved.loops.iter().all(|ring| ring.nodes.len() == 4 && ring.shape.doubled_area > 0));
	}

	#[test]
	fn collinear_vertices_are_removed() {
		let edges = ring_edges(&[(0, 0), (500, 0), (1000, 0), (1000, 1000), (0, 1000), (0, 500)], 0);
		let (_, resolved) = resolve(&edges, BooleanOperation::Union);
		assert_eq!(resolved.loops.len(), 1);
		let corners = &resolved.loops[0].shape.points;
		assert_eq!(corners.len(), 4);
		assert!(!corners.contains(&I64Vec2::new(500, 0)));
		assert!(!corners.contains(&I64Vec2::new(0, 500)));
	}

	#[test]
	fn hole_loops_run_clockwise() {
		let mut edges = ring_edges(&[(0, 0), (3000, 0), (3000, 3000), (0, 3000)], 0);
		edges.extend(ring_edges(&[(1000, 1000), (2000, 1000), (2000, 2000), (1000, 2000)], 1));
		let (_, resolved) = resolve(&edges, BooleanOperation::Xor);
		assert_eq!(resolved.loops.len(), 2);
		assert_eq!(resolved.loops.iter().filter(|ring| ring.shape.doubled_area > 0).count(), 1);
		let hole = resolved.loops.iter().find(|ring| ring.shape.doubled_area < 0).unwrap();
		assert_eq!(hole.shape.doubled_area, -2 * 1_000_000);
	}
}
