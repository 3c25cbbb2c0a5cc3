//! Boolean operations on sets of polygons with holes.
//!
//! Input coordinates are snapped into a bounded integer space where every geometric decision is exact. Edges are
//! split at their intersections, merged into a planar segment graph, classified against both inputs and walked back
//! into rings that are finally nested into outer boundaries with holes.

mod classify;
mod config;
mod engine;
mod error;
mod graph;
mod intersection;
mod nesting;
mod output;
mod polygon_set;
mod raw_edges;
mod resolver;
mod transform;
mod util;

pub use classify::BooleanOperation;
pub use config::{Capacity, GridConfig, PolyGraphConfig};
pub use engine::PolyGraph;
pub use error::{CapacityError, InputError, PolyGraphError};
pub use nesting::NestingRule;
pub use polygon_set::{Component, PolygonSet, Ring, Tag};

/// Computes `operation` between `a` and `b` with the default configuration.
pub fn boolean(a: &PolygonSet, b: &PolygonSet, operation: BooleanOperation, capacity: Capacity) -> Result<PolygonSet, PolyGraphError> {
	PolyGraph::default().boolean(a, b, operation, capacity)
}
