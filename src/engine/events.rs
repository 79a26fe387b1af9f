//! Lifecycle notifications out of a running effect and commands into it.

use super::color::{Color, Palette};
use super::entity::Point;

/// Public state of an entity the user clicked on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Selection {
	pub color: Color,
	pub position: Point,
	pub size: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EffectEvent {
	/// The surface reached a positive size and the population was built.
	Ready,
	Started,
	Paused,
	Resumed,
	Stopped,
	/// A finite effect ran out of time or entities.
	Completed,
	/// A one-shot effect fired.
	Triggered { origin: Point },
	/// A spawner produced a new entity.
	Spawned { color: Color, position: Point },
	/// A spawned entity's head faded out (its trail may still be draining).
	Faded,
	Selected(Selection),
}

/// Operations a host can ask of a mounted effect. Effects ignore the ones
/// that make no sense for them.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectCommand {
	Pause,
	Resume,
	Toggle,
	/// Rebuild the initial population.
	Reset,
	/// Fire a one-shot at the given surface-local point, or the default one.
	Trigger(Option<Point>),
	Add(usize),
	Remove(usize),
	SetPalette(Palette),
	SetCharacters(String),
	/// Drop every entity and wipe the surface.
	Clear,
}
