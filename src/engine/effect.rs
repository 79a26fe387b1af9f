//! The seam between the generic loop controller and one effect family.

use serde::Deserialize;

use super::color::Palette;
use super::entity::Point;
use super::events::EffectEvent;
use super::rng::EffectRng;
use super::spawn::SpawnSchedule;
use super::surface::{Bounds, ClearMode, Surface};

/// Length of the 60 fps reference tick, in milliseconds.
pub const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;

/// Unit in which an effect's `dt` is expressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeBase {
	/// Wall-clock seconds.
	Seconds,
	/// Multiples of the 1/60 s reference tick. A 60 fps display yields
	/// `dt ≈ 1.0`; a 30 fps display yields `dt ≈ 2.0`.
	Frames,
}

impl TimeBase {
	pub fn delta(self, elapsed_ms: f64) -> f64 {
		match self {
			TimeBase::Seconds => elapsed_ms / 1000.0,
			TimeBase::Frames => elapsed_ms / REFERENCE_FRAME_MS,
		}
	}
}

/// Playback options shared by every effect configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Playback {
	/// Mount without animating; `Resume` starts it.
	pub paused: bool,
	/// Overrides the host's reduced-motion preference when set.
	pub reduced_motion: Option<bool>,
}

/// What the loop sees of the world on each call into an effect.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Scene {
	pub bounds: Bounds,
	/// Pointer in surface-local space, `None` when outside the surface.
	pub pointer: Option<Point>,
}

/// How an effect answered a click.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClickResponse {
	Ignored,
	/// The effect consumed the click itself (e.g. selected an entity).
	Handled,
	/// The loop should run a one-shot trigger.
	Trigger(Option<Point>),
}

/// One effect family: its pool, its configuration and its entity factory.
///
/// The [`AnimationLoop`](super::animation::AnimationLoop) owns scheduling,
/// timing and the surface; an `Effect` only simulates and draws.
pub trait Effect {
	fn time_base(&self) -> TimeBase;

	fn clear_mode(&self) -> ClearMode {
		ClearMode::Hard
	}

	fn playback(&self) -> Playback;

	/// Total run time of a one-shot effect. `None` for ambient effects.
	fn duration_ms(&self) -> Option<f64> {
		None
	}

	/// One-shot effects only run when triggered, never on start.
	fn is_one_shot(&self) -> bool {
		self.duration_ms().is_some()
	}

	/// Whether a trigger must tear down the previous run first.
	fn restarts_on_trigger(&self) -> bool {
		false
	}

	fn rng(&mut self) -> &mut EffectRng;

	/// Builds the initial population for `bounds`.
	fn reset(&mut self, bounds: Bounds);

	/// Adapts existing entities after the surface changed size.
	fn resize(&mut self, previous: Bounds, next: Bounds);

	fn advance(&mut self, dt: f64, scene: Scene, events: &mut Vec<EffectEvent>);

	fn render(&self, surface: &mut dyn Surface, scene: Scene);

	/// Drawn after [`Effect::render`] in the same frame.
	fn render_links(&self, _surface: &mut dyn Surface, _scene: Scene) {}

	/// Single representative frame shown under reduced motion.
	fn render_static(&self, surface: &mut dyn Surface, scene: Scene) {
		self.render(surface, scene);
		self.render_links(surface, scene);
	}

	/// A one-shot run has nothing left to show.
	fn is_finished(&self) -> bool {
		false
	}

	/// Drops whatever a finished or interrupted run left behind.
	fn halt(&mut self) {}

	fn population(&self) -> usize;

	/// Interval spawning, for effects that grow their pool over time.
	fn spawn_schedule(&self) -> Option<SpawnSchedule> {
		None
	}

	fn spawn_one(&mut self, _scene: Scene, _events: &mut Vec<EffectEvent>) {}

	/// Fires a one-shot. Returns whether anything happened.
	fn trigger(&mut self, _at: Option<Point>, _scene: Scene, _events: &mut Vec<EffectEvent>) -> bool {
		false
	}

	fn clicked(&mut self, _at: Point, _scene: Scene, _events: &mut Vec<EffectEvent>) -> ClickResponse {
		ClickResponse::Ignored
	}

	fn add_entities(&mut self, _count: usize, _bounds: Bounds) {}

	fn remove_entities(&mut self, _count: usize) {}

	fn set_palette(&mut self, _palette: Palette) {}

	fn set_characters(&mut self, _characters: &str, _bounds: Bounds) {}

	fn clear_entities(&mut self) {}
}
