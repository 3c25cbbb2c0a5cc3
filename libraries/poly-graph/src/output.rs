use crate::config::Capacity;
use crate::error::{CapacityError, PolyGraphError};
use crate::nesting::NestedComponent;
use crate::polygon_set::{PolygonSet, Tag};
use crate::transform::IntegerTransform;
use glam::{DVec2, I64Vec2};

/// A vertex ready to be written, in integer space plus whatever the input said about it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct OutputVertex {
	pub(crate) position: I64Vec2,
	pub(crate) original: Option<DVec2>,
	pub(crate) tag: Option<Tag>,
}

/// Fails with the matching capacity error when a result of this size does not fit.
pub(crate) fn check_capacity(points: usize, components: usize, capacity: Capacity) -> Result<(), PolyGraphError> {
	if points > capacity.max_points {
		return Err(CapacityError::OutputPoints {
			required: points,
			available: capacity.max_points,
		}
		.into());
	}
	if components > capacity.max_components {
		return Err(CapacityError::OutputComponents {
			required: components,
			available: capacity.max_components,
		}
		.into());
	}
	Ok(())
}

/// Writes each component as its outer ring followed by its holes, every ring closed by repeating its first vertex.
///
/// Sizes are checked against `capacity` before anything is written.
pub(crate) fn build_output(components: &[NestedComponent], rings: &[Vec<OutputVertex>], transform: &IntegerTransform, with_tags: bool, capacity: Capacity) -> Result<PolygonSet, PolyGraphError> {
	let ring_indices = || components.iter().flat_map(|component| std::iter::once(component.outer).chain(component.holes.iter().copied()));
	let point_count: usize = ring_indices().map(|ring| rings[ring].len() + 1).sum();
	check_capacity(point_count, components.len(), capacity)?;

	let mut output = PolygonSet::new();
	output.points.try_reserve_exact(point_count)?;
	output.points_per_ring.try_reserve_exact(ring_indices().count())?;
	output.rings_per_component.try_reserve_exact(components.len())?;
	let mut tags = Vec::new();
	if with_tags {
		tags.try_reserve_exact(point_count)?;
	}

	for component in components {
		output.rings_per_component.push(1 + component.holes.len());
	}
	for ring in ring_indices() {
		let vertices = &rings[ring];
		output.points_per_ring.push(vertices.len() + 1);
		for vertex in vertices.iter().chain(vertices.first()) {
			output.points.push(vertex.original.unwrap_or_else(|| transform.to_float(vertex.position)));
			if with_tags {
				tags.push(vertex.tag);
			}
		}
	}
	if with_tags {
		output.tags = Some(tags);
	}

	log::debug!("Wrote {} components with {} rings and {point_count} points", components.len(), output.points_per_ring.len());
	Ok(output)
}
