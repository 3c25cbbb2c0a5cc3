use glam::{BVec2, I64Vec2};

/// Axis aligned box in the engine's integer coordinate space. Both corners are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Aabb {
	min: I64Vec2,
	max: I64Vec2,
}

impl Default for Aabb {
	fn default() -> Self {
		Self {
			min: I64Vec2::MAX,
			max: I64Vec2::MIN,
		}
	}
}

impl Aabb {
	#[inline]
	pub(crate) fn min(&self) -> I64Vec2 {
		self.min
	}
	#[inline]
	pub(crate) fn max(&self) -> I64Vec2 {
		self.max
	}

	pub(crate) const fn new(left: i64, bottom: i64, right: i64, top: i64) -> Self {
		Aabb {
			min: I64Vec2::new(left, bottom),
			max: I64Vec2::new(right, top),
		}
	}

	pub(crate) fn from_segment(a: I64Vec2, b: I64Vec2) -> Self {
		Aabb { min: a.min(b), max: a.max(b) }
	}

	pub(crate) fn from_points(points: impl IntoIterator<Item = I64Vec2>) -> Self {
		points.into_iter().fold(Aabb::default(), |bounds, point| extend_bounding_box(Some(bounds), point))
	}

	/// True for the default box that no point has been added to yet.
	#[inline]
	pub(crate) fn is_empty(&self) -> bool {
		self.min.x > self.max.x || self.min.y > self.max.y
	}

	#[inline]
	pub(crate) fn width(&self) -> i64 {
		self.max.x - self.min.x
	}
	#[inline]
	pub(crate) fn height(&self) -> i64 {
		self.max.y - self.min.y
	}

	pub(crate) fn contains_point(&self, point: I64Vec2) -> bool {
		(self.min.cmple(point) & point.cmple(self.max)) == BVec2::TRUE
	}

	pub(crate) fn contains_box(&self, other: &Aabb) -> bool {
		self.contains_point(other.min) && self.contains_point(other.max)
	}
}

#[inline]
pub(crate) fn bounding_boxes_overlap(a: &Aabb, b: &Aabb) -> bool {
	(a.min.cmple(b.max) & b.min.cmple(a.max)) == BVec2::TRUE
}

#[inline]
pub(crate) fn merge_bounding_boxes(a: &Aabb, b: &Aabb) -> Aabb {
	Aabb {
		min: a.min.min(b.min),
		max: a.max.max(b.max),
	}
}

#[inline]
pub(crate) fn extend_bounding_box(bounding_box: Option<Aabb>, point: I64Vec2) -> Aabb {
	match bounding_box {
		Some(bb) => Aabb {
			min: bb.min.min(point),
			max: bb.max.max(point),
		},
		None => Aabb { min: point, max: point },
	}
}

pub(crate) fn expand_bounding_box(bounding_box: &Aabb, padding: i64) -> Aabb {
	Aabb {
		min: bounding_box.min - I64Vec2::splat(padding),
		max: bounding_box.max + I64Vec2::splat(padding),
	}
}
