use std::collections::TryReserveError;
use thiserror::Error;

/// The error type returned by every entry point of the engine.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PolyGraphError {
	#[error("Invalid input:\n{0}")]
	Input(#[from] InputError),

	#[error("Capacity exceeded:\n{0}")]
	Capacity(#[from] CapacityError),

	#[error("Inconsistent segment graph near ({x}, {y}): {reason}")]
	Topology { x: f64, y: f64, reason: &'static str },

	#[error("Failed to allocate working memory")]
	Memory,
}

impl PolyGraphError {
	/// Integer status for callers that report failures as codes.
	pub fn code(&self) -> i32 {
		match self {
			PolyGraphError::Input(_) => -1,
			PolyGraphError::Capacity(CapacityError::OutputPoints { .. }) => -2,
			PolyGraphError::Capacity(CapacityError::OutputComponents { .. }) => -3,
			PolyGraphError::Capacity(_) => -4,
			PolyGraphError::Topology { .. } => -5,
			PolyGraphError::Memory => -6,
		}
	}
}

impl From<TryReserveError> for PolyGraphError {
	fn from(_: TryReserveError) -> Self {
		PolyGraphError::Memory
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InputError {
	#[error("Polygon set {set} is empty")]
	EmptySet { set: usize },

	#[error("Polygon set {set}: the ring table lists {listed} rings but the component table accounts for {expected}")]
	RingTableMismatch { set: usize, listed: usize, expected: usize },

	#[error("Polygon set {set}: the ring table accounts for {expected} points but {actual} were given")]
	PointCountMismatch { set: usize, expected: usize, actual: usize },

	#[error("Polygon set {set}: {tags} tags were given for {points} points")]
	TagCountMismatch { set: usize, tags: usize, points: usize },

	#[error("Polygon set {set}: ring {ring} has {points} points, at least {minimum} are required")]
	RingTooShort { set: usize, ring: usize, points: usize, minimum: usize },

	#[error("Polygon set {set}: component {component} has no rings")]
	EmptyComponent { set: usize, component: usize },

	#[error("Polygon set {set}: point {point} has a non finite coordinate")]
	NonFiniteCoordinate { set: usize, point: usize },

	#[error("The x and y coordinate arrays differ in length")]
	CoordinateLengthMismatch,

	#[error("The bounding box of the input has no extent")]
	DegenerateBounds,

	#[error("At least {minimum} lines are required, {actual} were given")]
	TooFewLines { minimum: usize, actual: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CapacityError {
	#[error("The result needs {required} points but only {available} fit")]
	OutputPoints { required: usize, available: usize },

	#[error("The result needs {required} components but only {available} fit")]
	OutputComponents { required: usize, available: usize },

	#[error("The segment graph exceeded {limit} nodes")]
	GraphNodes { limit: usize },

	#[error("The segment graph exceeded {limit} segments")]
	GraphSegments { limit: usize },
}
