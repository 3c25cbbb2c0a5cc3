/// Tunables of the engine. The defaults reproduce the reference behavior; they only need changing for unusual data.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PolyGraphConfig {
	/// Half the extent of the integer coordinate space along the longer axis of the padded input bounds.
	pub integer_range: i64,
	/// Every integer coordinate is snapped to a multiple of this step.
	pub snap_step: i64,
	/// Consecutive input vertices closer than this (in integer units) are merged.
	pub too_close: i64,
	/// Distance (in integer units) within which nodes merge and endpoints split edges they touch.
	pub graze: i64,
	/// Remove vertices that lie exactly on the line through their neighbors from output rings.
	pub simplify_collinear: bool,
	/// Above this many outer rings, hole nesting looks up candidates through a grid instead of a linear scan.
	pub indexed_nesting_threshold: usize,
	pub max_graph_nodes: usize,
	pub max_graph_segments: usize,
	pub grid: GridConfig,
}

impl Default for PolyGraphConfig {
	fn default() -> Self {
		PolyGraphConfig {
			integer_range: 1_000_000_000,
			snap_step: 20,
			too_close: 100,
			graze: 40,
			simplify_collinear: true,
			indexed_nesting_threshold: 20,
			max_graph_nodes: 10_000_000,
			max_graph_segments: 20_000_000,
			grid: GridConfig::default(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GridConfig {
	pub items_per_cell: usize,
	pub max_cells_per_axis: usize,
	pub max_cells: usize,
}

impl Default for GridConfig {
	fn default() -> Self {
		GridConfig {
			items_per_cell: 4,
			max_cells_per_axis: 20_000,
			max_cells: 1 << 18,
		}
	}
}

/// Upper bounds on the size of a result, checked before anything is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Capacity {
	pub max_points: usize,
	pub max_components: usize,
}

impl Capacity {
	pub const UNLIMITED: Capacity = Capacity {
		max_points: usize::MAX,
		max_components: usize::MAX,
	};

	pub fn new(max_points: usize, max_components: usize) -> Self {
		Capacity { max_points, max_components }
	}
}

impl Default for Capacity {
	fn default() -> Self {
		Capacity::UNLIMITED
	}
}
