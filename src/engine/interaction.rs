//! Pointer input, converted once to surface-local space.

use super::entity::Point;
use super::surface::Bounds;

/// Layout box of the drawing surface itself, in viewport (client)
/// coordinates. Sizing and pointer mapping both read this one box, so a
/// padded or bordered container never skews either.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceRect {
	pub left: f64,
	pub top: f64,
	pub width: f64,
	pub height: f64,
}

impl SurfaceRect {
	pub fn bounds(self) -> Bounds {
		Bounds::new(self.width, self.height)
	}

	/// Maps a client coordinate into surface-local space.
	pub fn to_local(self, client: Point) -> Point {
		Point::new(client.x - self.left, client.y - self.top)
	}
}

/// Tracks where the pointer is over one surface.
#[derive(Clone, Copy, Debug, Default)]
pub struct InteractionBridge {
	pointer: Option<Point>,
}

impl InteractionBridge {
	pub fn pointer_move(&mut self, local: Point) {
		self.pointer = Some(local);
	}

	pub fn pointer_leave(&mut self) {
		self.pointer = None;
	}

	pub fn pointer(&self) -> Option<Point> {
		self.pointer
	}
}

/// Velocity increment pulling `from` toward the pointer.
///
/// Magnitude is `gain / distance` along the unit vector to the pointer.
/// Zero beyond `radius`, at the pointer itself, or with no pointer.
pub fn attraction(from: Point, pointer: Option<Point>, radius: f64, gain: f64) -> (f64, f64) {
	let Some(target) = pointer else {
		return (0.0, 0.0);
	};
	let dx = target.x - from.x;
	let dy = target.y - from.y;
	let distance = dx.hypot(dy);
	if distance <= 0.0 || distance >= radius {
		return (0.0, 0.0);
	}
	let force = gain / distance;
	(dx / distance * force, dy / distance * force)
}
