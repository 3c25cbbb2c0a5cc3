use crate::config::GridConfig;
use crate::util::aabb::Aabb;
use crate::util::math::distance_squared;
use glam::I64Vec2;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::TryReserveError;

/// Uniform bucket grid over the integer plane.
///
/// Every item lands in each cell its bounding box overlaps, and additionally in the row bands and column bands the
/// box spans. The bands are the crossing markers used for ray casting: everything that can cross a horizontal line
/// inside a row is listed in that row's band.
pub(crate) struct Grid {
	origin: I64Vec2,
	cell_size: i64,
	columns: usize,
	rows: usize,
	cells: Vec<SmallVec<[u32; 6]>>,
	row_bands: Vec<Vec<u32>>,
	column_bands: Vec<Vec<u32>>,
}

impl Grid {
	pub(crate) fn new(bounds: &Aabb, item_count: usize, config: &GridConfig) -> Result<Self, TryReserveError> {
		let width = bounds.width().max(1);
		let height = bounds.height().max(1);
		let target_cells = (item_count / config.items_per_cell.max(1)).max(1) as f64;

		let mut cell_size = ((width as f64 * height as f64 / target_cells).sqrt().ceil() as i64).max(1);
		let (columns, rows) = loop {
			let columns = (width / cell_size + 1) as usize;
			let rows = (height / cell_size + 1) as usize;
			if columns <= config.max_cells_per_axis && rows <= config.max_cells_per_axis && columns * rows <= config.max_cells {
				break (columns, rows);
			}
			log::trace!("Grid of {columns}x{rows} cells exceeds the limits, coarsening cell size {cell_size}");
			cell_size *= 2;
		};

		let mut cells = Vec::new();
		cells.try_reserve_exact(columns * rows)?;
		cells.resize_with(columns * rows, SmallVec::new);
		let mut row_bands = Vec::new();
		row_bands.try_reserve_exact(rows)?;
		row_bands.resize_with(rows, Vec::new);
		let mut column_bands = Vec::new();
		column_bands.try_reserve_exact(columns)?;
		column_bands.resize_with(columns, Vec::new);

		log::trace!("Grid with {columns}x{rows} cells of size {cell_size} for {item_count} items");

		Ok(Grid {
			origin: bounds.min(),
			cell_size,
			columns,
			rows,
			cells,
			row_bands,
			column_bands,
		})
	}

	pub(crate) fn insert(&mut self, bbox: &Aabb, index: u32) {
		let (min_column, min_row) = self.point_to_cell(bbox.min());
		let (max_column, max_row) = self.point_to_cell(bbox.max());

		for row in min_row..=max_row {
			for column in min_column..=max_column {
				self.cells[row * self.columns + column].push(index);
			}
			self.row_bands[row].push(index);
		}
		for column in min_column..=max_column {
			self.column_bands[column].push(index);
		}
	}

	pub(crate) fn query(&self, bbox: &Aabb, result: &mut BitVec) {
		let (min_column, min_row) = self.point_to_cell(bbox.min());
		let (max_column, max_row) = self.point_to_cell(bbox.max());

		for row in min_row..=max_row {
			for column in min_column..=max_column {
				for &index in &self.cells[row * self.columns + column] {
					result.set(index as usize);
				}
			}
		}
	}

	/// Items whose vertical extent reaches the row holding `y`.
	pub(crate) fn row_band(&self, y: i64) -> &[u32] {
		let (_, row) = self.point_to_cell(I64Vec2::new(self.origin.x, y));
		&self.row_bands[row]
	}

	/// Items whose horizontal extent reaches the column holding `x`.
	pub(crate) fn column_band(&self, x: i64) -> &[u32] {
		let (column, _) = self.point_to_cell(I64Vec2::new(x, self.origin.y));
		&self.column_bands[column]
	}

	fn point_to_cell(&self, point: I64Vec2) -> (usize, usize) {
		let cell = (point - self.origin).div_euclid(I64Vec2::splat(self.cell_size));
		let column = cell.x.clamp(0, self.columns as i64 - 1) as usize;
		let row = cell.y.clamp(0, self.rows as i64 - 1) as usize;
		(column, row)
	}
}

/// Hash grid keyed on small cells, used to find an existing node within the graze distance of a point.
pub(crate) struct NodeIndex {
	cell_size: i64,
	cells: FxHashMap<I64Vec2, SmallVec<[u32; 4]>>,
}

impl NodeIndex {
	pub(crate) fn new(radius: i64, expected_nodes: usize) -> Self {
		NodeIndex {
			cell_size: (radius * 2).max(1),
			cells: FxHashMap::with_capacity_and_hasher(expected_nodes, Default::default()),
		}
	}

	pub(crate) fn insert(&mut self, point: I64Vec2, index: u32) {
		self.cells.entry(self.point_to_cell(point)).or_default().push(index);
	}

	/// The closest indexed point within `radius` of `point`, lowest index first on equal distance.
	pub(crate) fn find_within(&self, point: I64Vec2, radius: i64, position_of: impl Fn(u32) -> I64Vec2) -> Option<u32> {
		let center = self.point_to_cell(point);
		let radius_squared = radius as i128 * radius as i128;
		let mut best: Option<(i128, u32)> = None;

		for dx in -1..=1 {
			for dy in -1..=1 {
				let Some(indices) = self.cells.get(&(center + I64Vec2::new(dx, dy))) else { continue };
				for &index in indices {
					let distance = distance_squared(point, position_of(index));
					if distance > radius_squared {
						continue;
					}
					if best.is_none_or(|(best_distance, best_index)| (distance, index) < (best_distance, best_index)) {
						best = Some((distance, index));
					}
				}
			}
		}

		best.map(|(_, index)| index)
	}

	fn point_to_cell(&self, point: I64Vec2) -> I64Vec2 {
		point.div_euclid(I64Vec2::splat(self.cell_size))
	}
}

/// Fixed size bit set that remembers which words it touched, so draining it costs only what was set.
pub(crate) struct BitVec {
	data: Vec<u64>,
	touched: Vec<u32>,
}

impl BitVec {
	pub(crate) fn new(capacity: usize) -> Self {
		let num_words = capacity.div_ceil(64);
		BitVec {
			data: vec![0; num_words],
			touched: Vec::new(),
		}
	}

	pub(crate) fn set(&mut self, index: usize) {
		let word_index = index / 64;
		let bit_index = index % 64;
		if self.data[word_index] == 0 {
			self.touched.push(word_index as u32);
		}
		self.data[word_index] |= 1u64 << bit_index;
	}

	/// Moves the set bits into `result` in ascending order and clears them.
	pub(crate) fn drain_into(&mut self, result: &mut Vec<usize>) {
		result.clear();
		self.touched.sort_unstable();
		for &word_index in &self.touched {
			let mut word = std::mem::take(&mut self.data[word_index as usize]);
			while word != 0 {
				let tz = word.trailing_zeros() as usize;
				word ^= 1 << tz;
				result.push(word_index as usize * 64 + tz);
			}
		}
		self.touched.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn drained_bits_come_out_sorted_and_cleared() {
		let mut bits = BitVec::new(200);
		bits.set(199);
		bits.set(5);
		bits.set(64);
		bits.set(128);
		bits.set(5);

		let mut set_bits = Vec::new();
		bits.drain_into(&mut set_bits);
		assert_eq!(set_bits, vec![5, 64, 128, 199]);

		bits.drain_into(&mut set_bits);
		assert!(set_bits.is_empty());
	}

	#[test]
	fn grid_queries_overlapping_cells_only() {
		let bounds = Aabb::new(0, 0, 1000, 1000);
		let mut grid = Grid::new(&bounds, 100, &GridConfig::default()).unwrap();
		grid.insert(&Aabb::new(0, 0, 10, 10), 0);
		grid.insert(&Aabb::new(900, 900, 1000, 1000), 1);
		grid.insert(&Aabb::new(0, 500, 1000, 510), 2);

		let mut bits = BitVec::new(3);
		let mut found = Vec::new();
		grid.query(&Aabb::new(0, 0, 20, 20), &mut bits);
		bits.drain_into(&mut found);
		assert_eq!(found, vec![0]);

		grid.query(&Aabb::new(950, 505, 960, 506), &mut bits);
		bits.drain_into(&mut found);
		assert_eq!(found, vec![2]);

		assert!(grid.row_band(505).contains(&2));
		assert!(!grid.row_band(505).contains(&0));
		assert!(grid.column_band(5).contains(&0));
	}

	#[test]
	fn grid_coarsens_instead_of_failing() {
		let config = GridConfig {
			items_per_cell: 1,
			max_cells_per_axis: 8,
			max_cells: 16,
		};
		let grid = Grid::new(&Aabb::new(0, 0, 1_000_000, 1_000_000), 1_000_000, &config).unwrap();
		assert!(grid.columns <= 8 && grid.rows <= 8 && grid.columns * grid.rows <= 16);
	}

	#[test]
	fn node_index_finds_closest_within_radius() {
		let points = [I64Vec2::new(0, 0), I64Vec2::new(30, 0), I64Vec2::new(12, 0)];
		let mut index = NodeIndex::new(20, points.len());
		for (i, &point) in points.iter().enumerate() {
			index.insert(point, i as u32);
		}
		let position_of = |i: u32| points[i as usize];
		assert_eq!(index.find_within(I64Vec2::new(10, 1), 20, position_of), Some(2));
		assert_eq!(index.find_within(I64Vec2::new(100, 0), 20, position_of), None);
		assert_eq!(index.find_within(I64Vec2::new(-15, 0), 20, position_of), Some(0));
	}
}
