use crate::classify::{BooleanOperation, classify_segments};
use crate::config::{Capacity, PolyGraphConfig};
use crate::error::{InputError, PolyGraphError};
use crate::graph::SegmentGraph;
use crate::intersection::find_split_points;
use crate::nesting::{NestedComponent, NestingRule, OrphanPolicy, RingShape, nest_by_containment, nest_by_orientation};
use crate::output::{OutputVertex, build_output, check_capacity};
use crate::polygon_set::{Component, PolygonSet, Tag};
use crate::raw_edges::{RawEdge, append_raw_edges, build_edge_grid};
use crate::resolver::resolve_loops;
use crate::transform::IntegerTransform;
use glam::DVec2;

/// Polygon boolean engine.
///
/// A value holds only configuration and the diagnostics of its last call. Every call builds its working state from
/// scratch and drops it before returning, so one value can serve any number of calls and separate threads simply use
/// separate values.
#[derive(Clone, Debug, Default)]
pub struct PolyGraph {
	config: PolyGraphConfig,
	bug_locations: Vec<DVec2>,
}

/// Everything a single call builds. Dropped on every exit path.
struct Session<'a> {
	config: &'a PolyGraphConfig,
	transform: IntegerTransform,
	bug_locations: Vec<DVec2>,
}

/// Rings produced by a session together with their grouping into components.
#[derive(Default)]
struct Nested {
	components: Vec<NestedComponent>,
	rings: Vec<Vec<OutputVertex>>,
}

impl PolyGraph {
	pub fn new(config: PolyGraphConfig) -> Self {
		PolyGraph { config, bug_locations: Vec::new() }
	}

	pub fn config(&self) -> &PolyGraphConfig {
		&self.config
	}

	/// Locations, in input coordinates, where the last call had to abandon a walk through the segment graph.
	/// A non-empty list means the result may be missing a small piece near each location.
	pub fn bug_locations(&self) -> &[DVec2] {
		&self.bug_locations
	}

	/// Computes `operation` between the polygon sets `a` and `b`.
	///
	/// Outer rings come out counter-clockwise and holes clockwise, each ring closed by repeating its first vertex.
	/// For [`BooleanOperation::Fragment`] the rings of both sets may be open lines and the result holds every bounded
	/// face their union encloses.
	pub fn boolean(&mut self, a: &PolygonSet, b: &PolygonSet, operation: BooleanOperation, capacity: Capacity) -> Result<PolygonSet, PolyGraphError> {
		self.bug_locations.clear();
		self.boolean_pass(a, b, operation, capacity)
	}

	fn boolean_pass(&mut self, a: &PolygonSet, b: &PolygonSet, operation: BooleanOperation, capacity: Capacity) -> Result<PolygonSet, PolyGraphError> {
		let fragment = operation == BooleanOperation::Fragment;
		let minimum_ring_points = if fragment { 2 } else { 3 };
		a.check(0, minimum_ring_points)?;
		b.check(1, minimum_ring_points)?;

		let (min, max) = combined_bounds(&[a, b]);
		let mut session = Session::new(&self.config, min, max)?;

		let nested = if !fragment && a == b {
			log::debug!("Inputs are identical, skipping the intersection pass for {operation:?}");
			match operation {
				BooleanOperation::Xor => Nested::default(),
				_ => session.resolve(&[a], BooleanOperation::Union)?,
			}
		} else {
			session.resolve(&[a, b], operation)?
		};

		let with_tags = a.tags.is_some() || b.tags.is_some();
		let output = build_output(&nested.components, &nested.rings, &session.transform, with_tags, capacity)?;
		self.bug_locations.append(&mut session.bug_locations);
		Ok(output)
	}

	/// Groups the rings of `set` into outer boundaries and holes without changing their geometry.
	///
	/// The component structure of the input is ignored and rings without area are dropped. Output outers run
	/// counter-clockwise and holes clockwise, so a clockwise ring that no outer contains comes out reversed.
	pub fn nest_holes(&mut self, set: &PolygonSet, rule: NestingRule, capacity: Capacity) -> Result<PolygonSet, PolyGraphError> {
		self.bug_locations.clear();
		set.check(0, 3)?;
		let (min, max) = combined_bounds(&[set]);
		let session = Session::new(&self.config, min, max)?;

		let mut shapes = Vec::with_capacity(set.ring_count());
		let mut rings = Vec::with_capacity(set.ring_count());
		for ring in set.rings() {
			let mut points = ring.points;
			if points.len() > 1 && points.first() == points.last() {
				points = &points[..points.len() - 1];
			}
			let vertices: Vec<OutputVertex> = points
				.iter()
				.enumerate()
				.map(|(index, &original)| OutputVertex {
					position: session.transform.to_integer(original),
					original: Some(original),
					tag: ring.tags.and_then(|tags| tags.get(index).copied().flatten()),
				})
				.collect();
			shapes.push(RingShape::new(vertices.iter().map(|vertex| vertex.position).collect()));
			rings.push(vertices);
		}

		let degenerate = shapes.iter().filter(|shape| shape.doubled_area == 0).count();
		if degenerate > 0 {
			log::debug!("Dropping {degenerate} rings without area");
		}

		let components = match rule {
			NestingRule::Orientation => nest_by_orientation(&shapes, &self.config, OrphanPolicy::Standalone)?,
			NestingRule::Containment => nest_by_containment(&shapes, &self.config)?,
		};
		orient_rings(&components, &shapes, &mut rings);

		build_output(&components, &rings, &session.transform, set.tags.is_some(), capacity)
	}

	/// Merges the overlapping components of `set` into disjoint components.
	pub fn union_components(&mut self, set: &PolygonSet, capacity: Capacity) -> Result<PolygonSet, PolyGraphError> {
		self.bug_locations.clear();
		set.check(0, 3)?;

		let mut components = set.components().into_iter().map(|component| component_set(&component));
		let Some(first) = components.next() else { return Ok(PolygonSet::new()) };
		// Uniting a component with itself resolves its self overlaps
		let mut result = self.boolean_pass(&first, &first, BooleanOperation::Union, Capacity::UNLIMITED)?;

		for component in components {
			if result.is_empty() {
				result = component;
				continue;
			}
			result = self.boolean_pass(&result, &component, BooleanOperation::Union, Capacity::UNLIMITED)?;
		}

		check_capacity(result.point_count(), result.component_count(), capacity)?;
		log::debug!("Merged {} components into {}", set.component_count(), result.component_count());
		Ok(result)
	}

	/// Builds the bounded faces enclosed by a network of lines. Every ring of `lines` is treated as one open line,
	/// lines hanging off the network are ignored.
	pub fn build_polygons_from_lines(&mut self, lines: &PolygonSet, capacity: Capacity) -> Result<PolygonSet, PolyGraphError> {
		self.bug_locations.clear();
		if lines.ring_count() < 2 {
			return Err(InputError::TooFewLines { minimum: 2, actual: lines.ring_count() }.into());
		}
		lines.check(0, 2)?;

		let mut rings = lines.rings();
		let mut first = PolygonSet::new();
		let mut rest = PolygonSet::new();
		if let Some(line) = rings.next() {
			push_ring_as_component(&mut first, line.points, line.tags);
		}
		for line in rings {
			push_ring_as_component(&mut rest, line.points, line.tags);
		}

		self.boolean_pass(&first, &rest, BooleanOperation::Fragment, capacity)
	}
}

impl<'a> Session<'a> {
	fn new(config: &'a PolyGraphConfig, min: DVec2, max: DVec2) -> Result<Self, PolyGraphError> {
		let transform = IntegerTransform::from_bounds(min, max, config)?;
		log::trace!("Integer transform with scale {}", transform.scale());
		Ok(Session {
			config,
			transform,
			bug_locations: Vec::new(),
		})
	}

	/// Runs the graph pipeline over `sets` and nests the resulting loops.
	fn resolve(&mut self, sets: &[&PolygonSet], operation: BooleanOperation) -> Result<Nested, PolyGraphError> {
		let fragment = operation == BooleanOperation::Fragment;

		let mut edges: Vec<RawEdge> = Vec::new();
		for (set_index, set) in sets.iter().enumerate() {
			append_raw_edges(&mut edges, set_index, set, &self.transform, self.config, !fragment)?;
		}
		if edges.is_empty() {
			return Ok(Nested::default());
		}

		let mut graph = {
			let grid = build_edge_grid(&edges, self.config)?;
			let splits = find_split_points(&edges, &grid, self.config)?;
			SegmentGraph::build(&edges, &splits, self.config)?
		};
		drop(edges);

		classify_segments(&mut graph, operation, self.config)?;
		let resolved = resolve_loops(&mut graph, &self.transform, self.config.simplify_collinear)?;
		self.bug_locations.extend(resolved.bug_locations.iter().map(|&location| self.transform.to_float(location)));

		let orphans = if fragment { OrphanPolicy::Drop } else { OrphanPolicy::Standalone };
		let mut shapes = Vec::new();
		shapes.try_reserve_exact(resolved.loops.len())?;
		let mut rings: Vec<Vec<OutputVertex>> = Vec::new();
		rings.try_reserve_exact(resolved.loops.len())?;
		for ring in resolved.loops {
			rings.push(
				ring.nodes
					.iter()
					.map(|&node| {
						let node = &graph.nodes[node as usize];
						OutputVertex {
							position: node.position,
							original: node.original,
							tag: node.tag,
						}
					})
					.collect(),
			);
			shapes.push(ring.shape);
		}

		let components = nest_by_orientation(&shapes, self.config, orphans)?;
		orient_rings(&components, &shapes, &mut rings);
		Ok(Nested { components, rings })
	}
}

fn combined_bounds(sets: &[&PolygonSet]) -> (DVec2, DVec2) {
	sets.iter()
		.filter_map(|set| set.bounds())
		.reduce(|(min_a, max_a), (min_b, max_b)| (min_a.min(min_b), max_a.max(max_b)))
		.unwrap_or((DVec2::ZERO, DVec2::ZERO))
}

/// Reverses outer rings that run clockwise and holes that run counter-clockwise.
fn orient_rings(components: &[NestedComponent], shapes: &[RingShape], rings: &mut [Vec<OutputVertex>]) {
	for component in components {
		if shapes[component.outer].doubled_area < 0 {
			rings[component.outer].reverse();
		}
		for &hole in component.holes.iter().filter(|&&hole| shapes[hole].doubled_area > 0) {
			rings[hole].reverse();
		}
	}
}

fn push_ring_as_component(set: &mut PolygonSet, points: &[DVec2], tags: Option<&[Option<Tag>]>) {
	match tags {
		Some(tags) => set.push_tagged_polygon(points, tags),
		None => set.push_polygon(points),
	}
}

fn component_set(component: &Component<'_>) -> PolygonSet {
	let mut set = PolygonSet::new();
	push_ring_as_component(&mut set, component.outer.points, component.outer.tags);
	for hole in &component.holes {
		set.push_ring(hole.points);
		if let (Some(tags), Some(hole_tags)) = (&mut set.tags, hole.tags) {
			let start = tags.len() - hole.points.len();
			tags[start..].copy_from_slice(hole_tags);
		}
	}
	set
}

#[cfg(test)]
mod tests {
	use super::*;

	fn square(x: f64, y: f64, size: f64) -> Vec<DVec2> {
		vec![DVec2::new(x, y), DVec2::new(x + size, y), DVec2::new(x + size, y + size), DVec2::new(x, y + size)]
	}

	fn set_of(rings: &[Vec<DVec2>]) -> PolygonSet {
		let mut set = PolygonSet::new();
		for ring in rings {
			set.push_polygon(ring);
		}
		set
	}

	#[test]
	fn identical_xor_is_empty_and_union_is_the_input() {
		let a = set_of(&[square(0., 0., 10.)]);
		let mut engine = PolyGraph::default();
		assert!(engine.boolean(&a, &a, BooleanOperation::Xor, Capacity::UNLIMITED).unwrap().is_empty());
		let union = engine.boolean(&a, &a, BooleanOperation::Union, Capacity::UNLIMITED).unwrap();
		assert_eq!(union.points_per_ring, vec![5]);
		assert_eq!(union.signed_area(), 100.);
	}

	#[test]
	fn component_sets_keep_hole_tags() {
		let mut set = PolygonSet::new();
		set.push_tagged_polygon(&square(0., 0., 10.), &[Some(Tag(1)); 4]);
		set.push_ring(&square(2., 2., 2.));
		set.tags.as_mut().unwrap()[5] = Some(Tag(9));
		let components = set.components();
		let single = component_set(&components[0]);
		assert_eq!(single, set);
	}
}
