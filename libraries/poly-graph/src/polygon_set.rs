use crate::error::InputError;
use glam::DVec2;

/// Opaque value attached to an input vertex and copied to the output vertices that came from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag(pub usize);

/// A set of polygons with holes in flat array form.
///
/// Component `i` owns `rings_per_component[i]` consecutive rings. The first is the outer boundary and the rest are
/// its holes. Ring `j` owns `points_per_ring[j]` consecutive points. Rings produced by the engine repeat their first
/// vertex at the end; input rings may or may not.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolygonSet {
	pub points: Vec<DVec2>,
	pub tags: Option<Vec<Option<Tag>>>,
	pub rings_per_component: Vec<usize>,
	pub points_per_ring: Vec<usize>,
}

/// A borrowed ring of a [`PolygonSet`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ring<'a> {
	pub component: usize,
	pub points: &'a [DVec2],
	pub tags: Option<&'a [Option<Tag>]>,
}

impl Ring<'_> {
	/// Shoelace area, positive for counter-clockwise rings. A repeated closing vertex contributes nothing.
	pub fn signed_area(&self) -> f64 {
		let Some(&origin) = self.points.first() else { return 0. };
		let n = self.points.len();
		(0..n).map(|i| (self.points[i] - origin).perp_dot(self.points[(i + 1) % n] - origin)).sum::<f64>() / 2.
	}
}

/// A borrowed component of a [`PolygonSet`]: an outer ring and its holes.
#[derive(Clone, Debug, PartialEq)]
pub struct Component<'a> {
	pub outer: Ring<'a>,
	pub holes: Vec<Ring<'a>>,
}

impl PolygonSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a set from separate coordinate arrays.
	pub fn from_xy(x: &[f64], y: &[f64], rings_per_component: &[usize], points_per_ring: &[usize]) -> Result<Self, InputError> {
		if x.len() != y.len() {
			return Err(InputError::CoordinateLengthMismatch);
		}
		Ok(PolygonSet {
			points: x.iter().zip(y).map(|(&x, &y)| DVec2::new(x, y)).collect(),
			tags: None,
			rings_per_component: rings_per_component.to_vec(),
			points_per_ring: points_per_ring.to_vec(),
		})
	}

	pub fn to_xy(&self) -> (Vec<f64>, Vec<f64>) {
		self.points.iter().map(|point| (point.x, point.y)).unzip()
	}

	/// Starts a new component with `outer` as its boundary.
	pub fn push_polygon(&mut self, outer: &[DVec2]) {
		self.rings_per_component.push(0);
		self.push_ring(outer);
	}

	/// Like [`PolygonSet::push_polygon`], with one tag per vertex.
	pub fn push_tagged_polygon(&mut self, outer: &[DVec2], tags: &[Option<Tag>]) {
		self.push_polygon(outer);
		let point_count = self.points.len();
		let all_tags = self.tags.get_or_insert_with(Vec::new);
		all_tags.resize(point_count - outer.len(), None);
		all_tags.extend(tags.iter().copied().chain(std::iter::repeat(None)).take(outer.len()));
	}

	/// Adds a hole to the last component, or starts a component if there is none.
	pub fn push_ring(&mut self, ring: &[DVec2]) {
		match self.rings_per_component.last_mut() {
			Some(rings) => *rings += 1,
			None => self.rings_per_component.push(1),
		}
		self.points_per_ring.push(ring.len());
		self.points.extend_from_slice(ring);
		if let Some(tags) = &mut self.tags {
			tags.resize(self.points.len(), None);
		}
	}

	pub fn is_empty(&self) -> bool {
		self.rings_per_component.is_empty()
	}

	pub fn component_count(&self) -> usize {
		self.rings_per_component.len()
	}

	pub fn ring_count(&self) -> usize {
		self.points_per_ring.len()
	}

	pub fn point_count(&self) -> usize {
		self.points.len()
	}

	pub fn hole_count(&self, component: usize) -> usize {
		self.rings_per_component.get(component).map_or(0, |rings| rings.saturating_sub(1))
	}

	/// All rings in storage order. Assumes the tables are consistent, see [`PolygonSet::validate`].
	pub fn rings(&self) -> impl Iterator<Item = Ring<'_>> + '_ {
		let components = self.rings_per_component.iter().enumerate().flat_map(|(component, &count)| std::iter::repeat_n(component, count));
		let mut start = 0;
		components.zip(&self.points_per_ring).map(move |(component, &count)| {
			let range = start..(start + count).min(self.points.len());
			start += count;
			Ring {
				component,
				points: &self.points[range.clone()],
				tags: self.tags.as_ref().map(|tags| &tags[range.start.min(tags.len())..range.end.min(tags.len())]),
			}
		})
	}

	pub fn components(&self) -> Vec<Component<'_>> {
		let mut components: Vec<Component<'_>> = Vec::with_capacity(self.component_count());
		for ring in self.rings() {
			match components.last_mut() {
				Some(component) if component.outer.component == ring.component => component.holes.push(ring),
				_ => components.push(Component { outer: ring, holes: Vec::new() }),
			}
		}
		components
	}

	/// Sum of the signed ring areas. For engine output, where holes run clockwise, this is the covered area.
	pub fn signed_area(&self) -> f64 {
		self.rings().map(|ring| ring.signed_area()).sum()
	}

	/// Checks the tables against each other and requires at least three finite points per ring.
	pub fn validate(&self) -> Result<(), InputError> {
		self.check(0, 3)
	}

	pub(crate) fn check(&self, set: usize, minimum_ring_points: usize) -> Result<(), InputError> {
		if self.rings_per_component.is_empty() {
			return Err(InputError::EmptySet { set });
		}
		if let Some(component) = self.rings_per_component.iter().position(|&rings| rings == 0) {
			return Err(InputError::EmptyComponent { set, component });
		}
		let expected = self.rings_per_component.iter().sum::<usize>();
		if expected != self.points_per_ring.len() {
			return Err(InputError::RingTableMismatch {
				set,
				listed: self.points_per_ring.len(),
				expected,
			});
		}
		let expected = self.points_per_ring.iter().sum::<usize>();
		if expected != self.points.len() {
			return Err(InputError::PointCountMismatch {
				set,
				expected,
				actual: self.points.len(),
			});
		}
		if let Some(tags) = &self.tags {
			if tags.len() != self.points.len() {
				return Err(InputError::TagCountMismatch {
					set,
					tags: tags.len(),
					points: self.points.len(),
				});
			}
		}
		if let Some((ring, &points)) = self.points_per_ring.iter().enumerate().find(|&(_, &points)| points < minimum_ring_points) {
			return Err(InputError::RingTooShort {
				set,
				ring,
				points,
				minimum: minimum_ring_points,
			});
		}
		if let Some(point) = self.points.iter().position(|point| !point.is_finite()) {
			return Err(InputError::NonFiniteCoordinate { set, point });
		}
		Ok(())
	}

	/// Bounding box of all points, `None` for an empty set.
	pub(crate) fn bounds(&self) -> Option<(DVec2, DVec2)> {
		let first = *self.points.first()?;
		Some(self.points.iter().fold((first, first), |(min, max), &point| (min.min(point), max.max(point))))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn square(x: f64, y: f64, size: f64) -> Vec<DVec2> {
		vec![DVec2::new(x, y), DVec2::new(x + size, y), DVec2::new(x + size, y + size), DVec2::new(x, y + size)]
	}

	#[test]
	fn builder_keeps_tables_consistent() {
		let mut set = PolygonSet::new();
		set.push_polygon(&square(0., 0., 10.));
		set.push_ring(&square(2., 2., 2.));
		set.push_polygon(&square(20., 0., 5.));

		assert_eq!(set.rings_per_component, vec![2, 1]);
		assert_eq!(set.points_per_ring, vec![4, 4, 4]);
		assert_eq!(set.hole_count(0), 1);
		assert_eq!(set.hole_count(1), 0);
		assert!(set.validate().is_ok());

		let components = set.components();
		assert_eq!(components.len(), 2);
		assert_eq!(components[0].holes.len(), 1);
		assert_eq!(components[1].outer.points, square(20., 0., 5.).as_slice());
	}

	#[test]
	fn tags_are_backfilled() {
		let mut set = PolygonSet::new();
		set.push_polygon(&square(0., 0., 1.));
		set.push_tagged_polygon(&square(5., 5., 1.), &[Some(Tag(7)), None, Some(Tag(9)), None]);
		let tags = set.tags.as_ref().unwrap();
		assert_eq!(tags.len(), 8);
		assert_eq!(tags[3], None);
		assert_eq!(tags[4], Some(Tag(7)));
		assert_eq!(tags[6], Some(Tag(9)));
		assert!(set.validate().is_ok());
	}

	#[test]
	fn validation_reports_the_first_problem() {
		let mut set = PolygonSet::new();
		assert_eq!(set.validate(), Err(InputError::EmptySet { set: 0 }));

		set.push_polygon(&[DVec2::ZERO, DVec2::X]);
		assert_eq!(
			set.validate(),
			Err(InputError::RingTooShort {
				set: 0,
				ring: 0,
				points: 2,
				minimum: 3
			})
		);

		let mut set = PolygonSet::new();
		set.push_polygon(&[DVec2::ZERO, DVec2::X, DVec2::new(0., f64::NAN)]);
		assert_eq!(set.validate(), Err(InputError::NonFiniteCoordinate { set: 0, point: 2 }));

		set.points.pop();
		assert_eq!(
			set.validate(),
			Err(InputError::PointCountMismatch {
				set: 0,
				expected: 3,
				actual: 2
			})
		);
	}

	#[test]
	fn xy_arrays_round_trip() {
		let set = PolygonSet::from_xy(&[0., 1., 1.], &[0., 0., 1.], &[1], &[3]).unwrap();
		assert_eq!(set.to_xy(), (vec![0., 1., 1.], vec![0., 0., 1.]));
		assert_eq!(PolygonSet::from_xy(&[0.], &[], &[1], &[1]), Err(InputError::CoordinateLengthMismatch));
	}

	#[test]
	fn signed_area_follows_orientation() {
		let mut set = PolygonSet::new();
		set.push_polygon(&square(0., 0., 10.));
		let mut hole = square(2., 2., 2.);
		hole.reverse();
		set.push_ring(&hole);
		assert_eq!(set.signed_area(), 96.);
	}
}
