use crate::config::PolyGraphConfig;
use crate::error::{CapacityError, PolyGraphError};
use crate::intersection::SplitPoints;
use crate::polygon_set::Tag;
use crate::raw_edges::{RawEdge, RawVertex};
use crate::util::aabb::Aabb;
use crate::util::grid::NodeIndex;
use crate::util::math::direction_angle;
use bitflags::bitflags;
use glam::{DVec2, I64Vec2};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

bitflags! {
	#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
	pub(crate) struct SegmentFlags: u8 {
		const DISCARDED = 1;
		/// The result interior lies left of `node1 -> node2`.
		const FORWARD_VALID = 1 << 1;
		/// The result interior lies left of `node2 -> node1`.
		const REVERSE_VALID = 1 << 2;
		const FORWARD_USED = 1 << 3;
		const REVERSE_USED = 1 << 4;
	}
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GraphNode {
	pub(crate) position: I64Vec2,
	/// Input coordinate of the vertex this node was created from, if any.
	pub(crate) original: Option<DVec2>,
	pub(crate) tag: Option<Tag>,
	/// Incident segments ordered by outgoing angle, then by segment id.
	pub(crate) segments: SmallVec<[u32; 4]>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Segment {
	pub(crate) node1: u32,
	pub(crate) node2: u32,
	pub(crate) polygon: u32,
	pub(crate) ring: u32,
	/// How many input edges of each set cover this segment.
	pub(crate) count: [u16; 2],
	pub(crate) flags: SegmentFlags,
}

impl Segment {
	#[inline]
	pub(crate) fn is_live(&self) -> bool {
		!self.flags.contains(SegmentFlags::DISCARDED)
	}

	#[inline]
	pub(crate) fn other_node(&self, node: u32) -> u32 {
		if node == self.node1 { self.node2 } else { self.node1 }
	}

	/// Whether the segment counts as a boundary of `set` under the even-odd rule.
	#[inline]
	pub(crate) fn in_set(&self, set: usize) -> bool {
		self.count[set] % 2 == 1
	}
}

/// Planar graph of the split, merged and deduplicated input edges.
#[derive(Clone, Debug, Default)]
pub(crate) struct SegmentGraph {
	pub(crate) nodes: Vec<GraphNode>,
	pub(crate) segments: Vec<Segment>,
}

impl SegmentGraph {
	/// Builds the graph from raw edges and their ordered split points.
	///
	/// Endpoint nodes are created before intersection nodes, so a node that merges both keeps the input coordinate
	/// and tag of the endpoint.
	pub(crate) fn build(edges: &[RawEdge], splits: &[SplitPoints], config: &PolyGraphConfig) -> Result<Self, PolyGraphError> {
		let mut graph = SegmentGraph::default();
		graph.nodes.try_reserve(edges.len() * 2)?;
		let mut index = NodeIndex::new(config.graze, edges.len() * 2);

		let mut endpoints = Vec::new();
		endpoints.try_reserve_exact(edges.len())?;
		for edge in edges {
			let start = graph.find_or_create_node(&mut index, config, edge.start.position, Some(edge.start))?;
			let end = graph.find_or_create_node(&mut index, config, edge.end.position, Some(edge.end))?;
			endpoints.push((start, end));
		}

		let mut chain: SmallVec<[u32; 8]> = SmallVec::new();
		let mut pair_to_segment: FxHashMap<(u32, u32), u32> = FxHashMap::default();
		pair_to_segment.try_reserve(edges.len())?;
		graph.segments.try_reserve(edges.len())?;

		for ((edge, points), &(start, end)) in edges.iter().zip(splits).zip(&endpoints) {
			chain.clear();
			chain.push(start);
			for &point in points {
				let node = graph.find_or_create_node(&mut index, config, point, None)?;
				if chain.last() != Some(&node) {
					chain.push(node);
				}
			}
			if chain.last() != Some(&end) {
				chain.push(end);
			}

			for pair in chain.windows(2) {
				let (node1, node2) = (pair[0], pair[1]);
				let key = (node1.min(node2), node1.max(node2));
				if let Some(&existing) = pair_to_segment.get(&key) {
					let count = &mut graph.segments[existing as usize].count[edge.set];
					*count = count.saturating_add(1);
					continue;
				}

				if graph.segments.len() >= config.max_graph_segments {
					return Err(CapacityError::GraphSegments { limit: config.max_graph_segments }.into());
				}
				let mut count = [0; 2];
				count[edge.set] = 1;
				pair_to_segment.insert(key, graph.segments.len() as u32);
				graph.segments.push(Segment {
					node1,
					node2,
					polygon: edge.polygon,
					ring: edge.ring,
					count,
					flags: SegmentFlags::empty(),
				});
			}
		}

		for (segment_index, segment) in graph.segments.iter().enumerate() {
			graph.nodes[segment.node1 as usize].segments.push(segment_index as u32);
			graph.nodes[segment.node2 as usize].segments.push(segment_index as u32);
		}
		graph.sort_adjacency();

		log::debug!("Built graph with {} nodes and {} segments from {} edges", graph.nodes.len(), graph.segments.len(), edges.len());
		Ok(graph)
	}

	fn find_or_create_node(&mut self, index: &mut NodeIndex, config: &PolyGraphConfig, position: I64Vec2, vertex: Option<RawVertex>) -> Result<u32, PolyGraphError> {
		if let Some(existing) = index.find_within(position, config.graze, |node| self.nodes[node as usize].position) {
			return Ok(existing);
		}
		if self.nodes.len() >= config.max_graph_nodes {
			return Err(CapacityError::GraphNodes { limit: config.max_graph_nodes }.into());
		}
		self.nodes.try_reserve(1)?;

		let node = self.nodes.len() as u32;
		self.nodes.push(GraphNode {
			position,
			original: vertex.map(|vertex| vertex.original),
			tag: vertex.and_then(|vertex| vertex.tag),
			segments: SmallVec::new(),
		});
		index.insert(position, node);
		Ok(node)
	}

	fn sort_adjacency(&mut self) {
		let SegmentGraph { nodes, segments } = self;
		let positions: Vec<I64Vec2> = nodes.iter().map(|node| node.position).collect();
		for (node_index, node) in nodes.iter_mut().enumerate() {
			let origin = positions[node_index];
			let angle = |segment: u32| {
				let other = segments[segment as usize].other_node(node_index as u32);
				direction_angle(positions[other as usize] - origin)
			};
			node.segments.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)).then(a.cmp(&b)));
		}
	}

	#[inline]
	pub(crate) fn position(&self, node: u32) -> I64Vec2 {
		self.nodes[node as usize].position
	}

	pub(crate) fn segment_bounds(&self, segment: &Segment) -> Aabb {
		Aabb::from_segment(self.position(segment.node1), self.position(segment.node2))
	}

	pub(crate) fn live_segment_count(&self) -> usize {
		self.segments.iter().filter(|segment| segment.is_live()).count()
	}

	/// Repeatedly discards live segments hanging off a node that has no other live segment.
	/// Returns the number of segments discarded.
	pub(crate) fn prune_dangling(&mut self) -> usize {
		let mut degree = vec![0u32; self.nodes.len()];
		for segment in self.segments.iter().filter(|segment| segment.is_live()) {
			degree[segment.node1 as usize] += 1;
			degree[segment.node2 as usize] += 1;
		}

		let mut stack: Vec<u32> = (0..self.nodes.len() as u32).filter(|&node| degree[node as usize] == 1).collect();
		let mut pruned = 0;
		while let Some(node) = stack.pop() {
			if degree[node as usize] != 1 {
				continue;
			}
			let Some(&segment_index) = self.nodes[node as usize].segments.iter().find(|&&segment| self.segments[segment as usize].is_live()) else {
				continue;
			};
			let segment = &mut self.segments[segment_index as usize];
			segment.flags.insert(SegmentFlags::DISCARDED);
			let other = segment.other_node(node);
			degree[node as usize] -= 1;
			degree[other as usize] -= 1;
			if degree[other as usize] == 1 {
				stack.push(other);
			}
			pruned += 1;
		}

		if pruned > 0 {
			log::debug!("Pruned {pruned} dangling segments");
		}
		pruned
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::intersection::find_split_points;
	use crate::raw_edges::build_edge_grid;

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

	fn graph(edges: &[RawEdge]) -> SegmentGraph {
		let config = PolyGraphConfig::default();
		let grid = build_edge_grid(edges, &config).unwrap();
		let splits = find_split_points(edges, &grid, &config).unwrap();
		SegmentGraph::build(edges, &splits, &config).unwrap()
	}

	#[test]
	fn crossing_edges_share_a_node() {
		let graph = graph(&[edge((0, 0), (1000, 1000), 0), edge((0, 1000), (1000, 0), 1)]);
		assert_eq!(graph.nodes.len(), 5);
		assert_eq!(graph.segments.len(), 4);
		let center = graph.nodes.iter().position(|node| node.position == I64Vec2::new(500, 500)).unwrap();
		assert_eq!(graph.nodes[center].segments.len(), 4);
		assert_eq!(graph.nodes[center].original, None);
		assert!(graph.nodes[0].original.is_some());
	}

	#[test]
	fn duplicate_edges_merge_with_multiplicity() {
		let graph = graph(&[edge((0, 0), (1000, 0), 0), edge((1000, 0), (0, 0), 1), edge((0, 10), (1000, 10), 0)]);
		assert_eq!(graph.segments.len(), 1);
		assert_eq!(graph.segments[0].count, [2, 1]);
		assert!(!graph.segments[0].in_set(0));
		assert!(graph.segments[0].in_set(1));
	}

	#[test]
	fn adjacency_is_sorted_by_angle() {
		let graph = graph(&[edge((0, 0), (0, 1000), 0), edge((0, 0), (-1000, 0), 0), edge((0, 0), (1000, 0), 0)]);
		let center = &graph.nodes[0];
		let others: Vec<I64Vec2> = center.segments.iter().map(|&segment| graph.position(graph.segments[segment as usize].other_node(0))).collect();
		assert_eq!(others, vec![I64Vec2::new(1000, 0), I64Vec2::new(0, 1000), I64Vec2::new(-1000, 0)]);
	}

	#[test]
	fn dangling_chains_are_pruned() {
		let mut graph = graph(&[
			edge((0, 0), (1000, 0), 0),
			edge((1000, 0), (1000, 1000), 0),
			edge((1000, 1000), (0, 0), 0),
			edge((1000, 1000), (2000, 2000), 0),
			edge((2000, 2000), (3000, 2000), 0),
		]);
		assert_eq!(graph.prune_dangling(), 2);
		assert_eq!(graph.live_segment_count(), 3);
	}
}
