//! The contract every simulated object implements, plus shared kinematic helpers.

use std::collections::VecDeque;

use super::rng::EffectRng;
use super::surface::{Bounds, Surface};

/// Surface-local position in logical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}

/// What happens to an entity when it leaves the visible area or fades out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgePolicy {
	/// Removed from the pool once dead (and its trail drained).
	Destroy,
	/// Re-enters from the opposite edge; population stays fixed.
	Wrap,
	/// Reset in place to a fresh random state; population stays fixed.
	Recycle,
}

impl EdgePolicy {
	pub fn removes_dead(self) -> bool {
		matches!(self, EdgePolicy::Destroy)
	}
}

/// Per-tick environment handed to [`Entity::advance`].
pub struct StepContext<'a> {
	pub bounds: Bounds,
	pub rng: &'a mut EffectRng,
	/// Pointer in surface-local space, `None` once it has left the surface.
	pub pointer: Option<Point>,
}

/// A single simulated visual object.
///
/// `Params` carries the effect-wide settings an entity reads each tick, so
/// live configuration changes reach existing entities without copying.
pub trait Entity {
	type Params;

	const EDGE_POLICY: EdgePolicy;

	/// Advances the entity by `dt` (in the owning effect's time base) and
	/// reports whether it is still alive.
	fn advance(&mut self, dt: f64, params: &Self::Params, cx: &mut StepContext<'_>) -> bool;

	/// Pure function of the current state.
	fn is_alive(&self) -> bool;

	/// Dead and with nothing left to draw. Entities with trails override this
	/// so a trail can outlive its head.
	fn is_drained(&self) -> bool {
		!self.is_alive()
	}

	fn render(&self, surface: &mut dyn Surface, params: &Self::Params);

	fn position(&self) -> Point;

	/// Radius a click must fall inside to select this entity.
	fn hit_radius(&self) -> f64;

	/// Maps the entity onto a resized surface.
	fn rescale(&mut self, sx: f64, sy: f64);
}

/// Soft-edged wrap along one axis: once a coordinate travels `margin`
/// beyond either edge it re-enters `margin` outside the opposite one.
pub fn wrap_axis(value: f64, extent: f64, margin: f64) -> f64 {
	if value < -margin {
		extent + margin
	} else if value > extent + margin {
		-margin
	} else {
		value
	}
}

/// One remembered position of a trail-bearing entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
	pub position: Point,
	pub alpha: f64,
}

/// Bounded history of past positions, newest first.
#[derive(Clone, Debug)]
pub struct Trail {
	points: VecDeque<TrailPoint>,
	capacity: usize,
}

impl Trail {
	/// A zero capacity is raised to one.
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			points: VecDeque::new(),
			capacity,
		}
	}

	pub fn push_front(&mut self, point: TrailPoint) {
		self.points.push_front(point);
		while self.points.len() > self.capacity {
			self.points.pop_back();
		}
	}

	/// Drops the oldest point.
	pub fn drain_one(&mut self) {
		self.points.pop_back();
	}

	pub fn len(&self) -> usize {
		self.points.len()
	}

	pub fn is_empty(&self) -> bool {
		self.points.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn iter(&self) -> impl Iterator<Item = &TrailPoint> {
		self.points.iter()
	}

	/// Linear attenuation for the point at `index`: `1 - index / capacity`.
	pub fn falloff(&self, index: usize) -> f64 {
		1.0 - index as f64 / self.capacity as f64
	}
}
