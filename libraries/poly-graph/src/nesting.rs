use crate::config::PolyGraphConfig;
use crate::error::PolyGraphError;
use crate::util::aabb::{Aabb, merge_bounding_boxes};
use crate::util::grid::{BitVec, Grid};
use crate::util::math::{Containment, doubled_signed_area, ring_containment};
use glam::I64Vec2;

/// How [`crate::PolyGraph::nest_holes`] tells holes from outer boundaries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NestingRule {
	/// Counter-clockwise rings are outer boundaries and clockwise rings are holes.
	#[default]
	Orientation,
	/// Rings inside an odd number of other rings are holes, whatever their orientation.
	Containment,
}

/// What to do with a hole that no outer ring contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OrphanPolicy {
	Standalone,
	Drop,
}

/// A closed ring in integer coordinates without a repeated closing vertex.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RingShape {
	pub(crate) points: Vec<I64Vec2>,
	pub(crate) doubled_area: i128,
	pub(crate) bounds: Aabb,
}

impl RingShape {
	pub(crate) fn new(points: Vec<I64Vec2>) -> Self {
		RingShape {
			doubled_area: doubled_signed_area(&points),
			bounds: Aabb::from_points(points.iter().copied()),
			points,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct NestedComponent {
	pub(crate) outer: usize,
	pub(crate) holes: Vec<usize>,
}

/// Whether `inner` lies inside `outer`, judged by the first vertex or edge midpoint of `inner` that is not on the
/// boundary of `outer`.
fn contains_ring(outer: &RingShape, inner: &RingShape) -> bool {
	let vertices = inner.points.iter().map(|&point| point * 2);
	let midpoints = inner.points.iter().zip(inner.points.iter().cycle().skip(1)).map(|(&a, &b)| a + b);
	for sample in vertices.chain(midpoints) {
		match ring_containment(&outer.points, sample) {
			Containment::Inside => return true,
			Containment::Outside => return false,
			Containment::Boundary => {}
		}
	}
	false
}

/// Candidate lookup over the bounding boxes of a subset of rings.
///
/// Small subsets are scanned linearly, large ones through a grid. Both visit candidates in ascending order of their
/// position in the subset, so the results do not depend on which one is used.
enum CandidateIndex {
	Linear,
	Indexed { grid: Grid, bits: BitVec, found: Vec<usize> },
}

impl CandidateIndex {
	fn new(rings: &[RingShape], members: &[usize], config: &PolyGraphConfig) -> Result<Self, PolyGraphError> {
		if members.len() <= config.indexed_nesting_threshold {
			return Ok(CandidateIndex::Linear);
		}
		let bounds = members.iter().map(|&ring| rings[ring].bounds).reduce(|a, b| merge_bounding_boxes(&a, &b)).unwrap_or_default();
		let mut grid = Grid::new(&bounds, members.len(), &config.grid)?;
		for (position, &ring) in members.iter().enumerate() {
			grid.insert(&rings[ring].bounds, position as u32);
		}
		Ok(CandidateIndex::Indexed {
			grid,
			bits: BitVec::new(members.len()),
			found: Vec::new(),
		})
	}

	fn for_each_candidate(&mut self, bounds: &Aabb, member_count: usize, mut visit: impl FnMut(usize)) {
		match self {
			CandidateIndex::Linear => (0..member_count).for_each(visit),
			CandidateIndex::Indexed { grid, bits, found } => {
				grid.query(bounds, bits);
				bits.drain_into(found);
				for &position in found.iter() {
					visit(position);
				}
			}
		}
	}
}

/// Positive rings become outer boundaries and each negative ring joins the smallest outer that contains it.
pub(crate) fn nest_by_orientation(rings: &[RingShape], config: &PolyGraphConfig, orphans: OrphanPolicy) -> Result<Vec<NestedComponent>, PolyGraphError> {
	let outers: Vec<usize> = (0..rings.len()).filter(|&ring| rings[ring].doubled_area > 0).collect();
	let mut components: Vec<NestedComponent> = outers.iter().map(|&outer| NestedComponent { outer, holes: Vec::new() }).collect();
	let mut index = CandidateIndex::new(rings, &outers, config)?;
	let mut orphan_count = 0;

	for (hole_index, hole) in rings.iter().enumerate().filter(|(_, ring)| ring.doubled_area < 0) {
		let mut best: Option<usize> = None;
		index.for_each_candidate(&hole.bounds, outers.len(), |position| {
			let outer = &rings[outers[position]];
			if outer.doubled_area < -hole.doubled_area || !outer.bounds.contains_box(&hole.bounds) {
				return;
			}
			if best.is_some_and(|best| rings[outers[best]].doubled_area <= outer.doubled_area) {
				return;
			}
			if contains_ring(outer, hole) {
				best = Some(position);
			}
		});

		match (best, orphans) {
			(Some(position), _) => components[position].holes.push(hole_index),
			(None, OrphanPolicy::Standalone) => {
				orphan_count += 1;
				components.push(NestedComponent {
					outer: hole_index,
					holes: Vec::new(),
				});
			}
			(None, OrphanPolicy::Drop) => orphan_count += 1,
		}
	}

	if orphan_count > 0 {
		match orphans {
			OrphanPolicy::Standalone => log::warn!("{orphan_count} holes have no enclosing outer ring and are emitted on their own"),
			OrphanPolicy::Drop => log::debug!("Dropped {orphan_count} rings bounding the unbounded face"),
		}
	}
	log::debug!("Nested {} rings into {} components", rings.len(), components.len());
	Ok(components)
}

/// Rings at even containment depth become outer boundaries and rings at odd depth join their immediate container.
pub(crate) fn nest_by_containment(rings: &[RingShape], config: &PolyGraphConfig) -> Result<Vec<NestedComponent>, PolyGraphError> {
	let members: Vec<usize> = (0..rings.len()).filter(|&ring| rings[ring].doubled_area != 0).collect();
	let mut index = CandidateIndex::new(rings, &members, config)?;

	let mut depth = vec![0usize; rings.len()];
	let mut parent: Vec<Option<usize>> = vec![None; rings.len()];
	for &ring_index in &members {
		let ring = &rings[ring_index];
		let area = ring.doubled_area.abs();
		let mut container: Option<usize> = None;
		let mut count = 0;
		index.for_each_candidate(&ring.bounds, members.len(), |position| {
			let other_index = members[position];
			let other = &rings[other_index];
			if other_index == ring_index || other.doubled_area.abs() < area || !other.bounds.contains_box(&ring.bounds) {
				return;
			}
			if contains_ring(other, ring) {
				count += 1;
				if container.is_none_or(|container| rings[container].doubled_area.abs() > other.doubled_area.abs()) {
					container = Some(other_index);
				}
			}
		});
		depth[ring_index] = count;
		parent[ring_index] = container;
	}

	let mut component_of: Vec<Option<usize>> = vec![None; rings.len()];
	let mut components = Vec::new();
	for &ring in members.iter().filter(|&&ring| depth[ring] % 2 == 0) {
		component_of[ring] = Some(components.len());
		components.push(NestedComponent { outer: ring, holes: Vec::new() });
	}
	for &ring in members.iter().filter(|&&ring| depth[ring] % 2 == 1) {
		match parent[ring].and_then(|parent| component_of[parent]) {
			Some(component) => components[component].holes.push(ring),
			None => {
				log::warn!("Ring {ring} sits inside another hole and is emitted on its own");
				components.push(NestedComponent { outer: ring, holes: Vec::new() });
			}
		}
	}

	log::debug!("Nested {} rings into {} components by containment depth", rings.len(), components.len());
	Ok(components)
}
