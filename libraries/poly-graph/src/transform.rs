use crate::config::PolyGraphConfig;
use crate::error::InputError;
use crate::util::math::div_round;
use glam::{DVec2, I64Vec2};

/// Affine map between input coordinates and the engine's bounded integer space.
///
/// The padded input bounds map onto `[-integer_range, integer_range]` along their longer axis, and every integer
/// coordinate is a multiple of `snap_step`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct IntegerTransform {
	origin: DVec2,
	scale: f64,
	range: i64,
	snap_step: i64,
}

impl IntegerTransform {
	pub(crate) fn from_bounds(min: DVec2, max: DVec2, config: &PolyGraphConfig) -> Result<Self, InputError> {
		if !min.is_finite() || !max.is_finite() {
			return Err(InputError::DegenerateBounds);
		}
		let span = max - min;
		if span.x <= 0. && span.y <= 0. {
			return Err(InputError::DegenerateBounds);
		}

		let padding = DVec2::splat((span.x + span.y) / 100.);
		let origin = min - padding;
		let max_span = (span + padding * 2.).max_element();
		let range = config.integer_range.max(1);

		Ok(IntegerTransform {
			origin,
			scale: max_span / (2 * range) as f64,
			range,
			snap_step: config.snap_step.max(1),
		})
	}

	pub(crate) fn to_integer(&self, point: DVec2) -> I64Vec2 {
		let offset = ((point - self.origin) / self.scale).round();
		let raw = I64Vec2::new(offset.x as i64, offset.y as i64) - I64Vec2::splat(self.range);
		let step = self.snap_step as i128;
		I64Vec2::new((div_round(raw.x as i128, step) * step) as i64, (div_round(raw.y as i128, step) * step) as i64)
	}

	pub(crate) fn to_float(&self, point: I64Vec2) -> DVec2 {
		let offset = point + I64Vec2::splat(self.range);
		self.origin + DVec2::new(offset.x as f64, offset.y as f64) * self.scale
	}

	/// Size of one integer unit in input coordinates.
	pub(crate) fn scale(&self) -> f64 {
		self.scale
	}
}
