//! One-shot particle burst.
//!
//! Sparks fly out of an origin within a spread cone centred on "up", fall
//! under constant gravity and fade linearly. The run ends when every spark
//! has faded or the configured duration has elapsed, whichever comes first.
//! Time base: reference frames (1/60 s).

use std::f64::consts::{FRAC_PI_2, TAU};

use serde::Deserialize;

use crate::engine::color::{Color, Palette};
use crate::engine::effect::{ClickResponse, Effect, Playback, Scene, TimeBase};
use crate::engine::entity::{EdgePolicy, Entity, Point, StepContext};
use crate::engine::events::EffectEvent;
use crate::engine::pool::EntityPool;
use crate::engine::rng::EffectRng;
use crate::engine::surface::{Bounds, Surface};

use super::{MAX_POPULATION, at_least, lenient_count};

const SPEED_MIN: f64 = 4.0;
const SPEED_MAX: f64 = 12.0;
const DECAY_MIN: f64 = 0.01;
const DECAY_MAX: f64 = 0.03;
const SIZE_MIN: f64 = 2.0;
const SIZE_MAX: f64 = 6.0;
/// Radius of the ring drawn instead of the animation under reduced motion.
const STATIC_RING_RADIUS: f64 = 30.0;
const STATIC_DOT_RADIUS: f64 = 8.0;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExplosionConfig {
	#[serde(deserialize_with = "lenient_count")]
	pub particle_count: usize,
	pub colors: Palette,
	/// Milliseconds.
	pub duration: f64,
	/// Added to vertical velocity every reference frame.
	pub gravity: f64,
	/// Degrees, centred on straight up. 360 fires in every direction.
	pub spread: f64,
	pub trigger_on_click: bool,
	#[serde(flatten)]
	pub playback: Playback,
}

impl Default for ExplosionConfig {
	fn default() -> Self {
		Self {
			particle_count: 30,
			colors: Palette::from_css(&["#ff6b6b", "#4ecdc4", "#45b7d1", "#96ceb4", "#ffeaa7"]),
			duration: 1500.0,
			gravity: 0.1,
			spread: 360.0,
			trigger_on_click: true,
			playback: Playback::default(),
		}
	}
}

impl ExplosionConfig {
	pub fn normalized(self) -> Self {
		let defaults = Self::default();
		Self {
			duration: at_least(self.duration, 0.0, defaults.duration),
			gravity: if self.gravity.is_finite() {
				self.gravity
			} else {
				defaults.gravity
			},
			spread: at_least(self.spread, 0.0, defaults.spread).min(360.0),
			particle_count: self.particle_count.min(MAX_POPULATION),
			..self
		}
	}
}

pub struct SparkParams {
	pub gravity: f64,
}

/// One burst particle under gravity, fading at its own rate.
#[derive(Clone, Debug)]
pub struct Spark {
	pub position: Point,
	pub vx: f64,
	pub vy: f64,
	pub color: Color,
	pub alpha: f64,
	pub decay: f64,
	pub size: f64,
}

impl Spark {
	/// Random spark leaving `origin` within `spread` degrees of straight up.
	pub fn new(origin: Point, color: Color, spread: f64, rng: &mut EffectRng) -> Self {
		let angle = rng.jitter(spread / 2.0).to_radians() - FRAC_PI_2;
		let speed = rng.range(SPEED_MIN, SPEED_MAX);
		Self {
			position: origin,
			vx: angle.cos() * speed,
			vy: angle.sin() * speed,
			color,
			alpha: 1.0,
			decay: rng.range(DECAY_MIN, DECAY_MAX),
			size: rng.range(SIZE_MIN, SIZE_MAX),
		}
	}
}

impl Entity for Spark {
	type Params = SparkParams;
	const EDGE_POLICY: EdgePolicy = EdgePolicy::Destroy;

	fn advance(&mut self, dt: f64, params: &SparkParams, _cx: &mut StepContext<'_>) -> bool {
		// Exact constant-acceleration step, so the path is the same whatever
		// the frame rate.
		self.position.x += self.vx * dt;
		self.position.y += self.vy * dt + 0.5 * params.gravity * dt * dt;
		self.vy += params.gravity * dt;
		self.alpha = (self.alpha - self.decay * dt).max(0.0);
		self.is_alive()
	}

	fn is_alive(&self) -> bool {
		self.alpha > 0.0
	}

	fn render(&self, surface: &mut dyn Surface, _params: &SparkParams) {
		surface.fill_circle(self.position, self.size, self.color.with_alpha(self.alpha));
	}

	fn position(&self) -> Point {
		self.position
	}

	fn hit_radius(&self) -> f64 {
		self.size
	}

	fn rescale(&mut self, sx: f64, sy: f64) {
		self.position = Point::new(self.position.x * sx, self.position.y * sy);
	}
}

pub struct Explosion {
	config: ExplosionConfig,
	pool: EntityPool<Spark>,
	rng: EffectRng,
	origin: Option<Point>,
}

impl Explosion {
	pub fn new(config: ExplosionConfig, seed: u64) -> Self {
		let config = config.normalized();
		Self {
			pool: EntityPool::bounded(config.particle_count),
			config,
			rng: EffectRng::seeded(seed),
			origin: None,
		}
	}

	pub fn config(&self) -> &ExplosionConfig {
		&self.config
	}

	pub fn sparks(&self) -> &EntityPool<Spark> {
		&self.pool
	}

	fn params(&self) -> SparkParams {
		SparkParams {
			gravity: self.config.gravity,
		}
	}
}

impl Effect for Explosion {
	fn time_base(&self) -> TimeBase {
		TimeBase::Frames
	}

	fn playback(&self) -> Playback {
		self.config.playback
	}

	fn duration_ms(&self) -> Option<f64> {
		Some(self.config.duration)
	}

	fn restarts_on_trigger(&self) -> bool {
		true
	}

	fn rng(&mut self) -> &mut EffectRng {
		&mut self.rng
	}

	fn reset(&mut self, _bounds: Bounds) {
		self.pool.clear();
	}

	/// Sparks already in flight keep their coordinates; only the default
	/// origin of the next burst follows the new size.
	fn resize(&mut self, _previous: Bounds, _next: Bounds) {}

	fn advance(&mut self, dt: f64, scene: Scene, _events: &mut Vec<EffectEvent>) {
		let params = self.params();
		let mut cx = StepContext {
			bounds: scene.bounds,
			rng: &mut self.rng,
			pointer: scene.pointer,
		};
		self.pool.advance(dt, &params, &mut cx);
	}

	fn render(&self, surface: &mut dyn Surface, _scene: Scene) {
		self.pool.render(surface, &self.params());
	}

	/// Palette colours evenly spaced on a ring around the origin.
	fn render_static(&self, surface: &mut dyn Surface, scene: Scene) {
		let origin = self.origin.unwrap_or_else(|| scene.bounds.center());
		let colors = self.config.colors.colors();
		for (i, color) in colors.iter().enumerate() {
			let angle = i as f64 / colors.len() as f64 * TAU;
			let center = Point::new(
				origin.x + angle.cos() * STATIC_RING_RADIUS,
				origin.y + angle.sin() * STATIC_RING_RADIUS,
			);
			surface.fill_circle(center, STATIC_DOT_RADIUS, *color);
		}
	}

	fn is_finished(&self) -> bool {
		self.pool.is_empty()
	}

	fn halt(&mut self) {
		self.pool.clear();
	}

	fn population(&self) -> usize {
		self.pool.len()
	}

	fn trigger(&mut self, at: Option<Point>, scene: Scene, events: &mut Vec<EffectEvent>) -> bool {
		let origin = at.unwrap_or_else(|| scene.bounds.center());
		self.origin = Some(origin);
		let spread = self.config.spread;
		let colors = &self.config.colors;
		let rng = &mut self.rng;
		self.pool.populate(self.config.particle_count, |_| {
			let color = colors.pick(rng);
			Spark::new(origin, color, spread, rng)
		});
		events.push(EffectEvent::Triggered { origin });
		true
	}

	fn clicked(&mut self, at: Point, _scene: Scene, _events: &mut Vec<EffectEvent>) -> ClickResponse {
		if self.config.trigger_on_click {
			ClickResponse::Trigger(Some(at))
		} else {
			ClickResponse::Ignored
		}
	}

	fn set_palette(&mut self, palette: Palette) {
		self.config.colors = palette;
	}

	fn clear_entities(&mut self) {
		self.pool.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::animation::{AnimationLoop, LoopState};
	use crate::engine::testing::{DrawOp, ManualScheduler, RecordingSurface};

	fn still_spark(decay: f64) -> Spark {
		Spark {
			position: Point::new(50.0, 50.0),
			vx: 0.0,
			vy: 0.0,
			color: Color::WHITE,
			alpha: 1.0,
			decay,
			size: 3.0,
		}
	}

	fn step(pool: &mut EntityPool<Spark>, dt: f64, gravity: f64) {
		let mut rng = EffectRng::seeded(0);
		let mut cx = StepContext {
			bounds: Bounds::new(100.0, 100.0),
			rng: &mut rng,
			pointer: None,
		};
		pool.advance(dt, &SparkParams { gravity }, &mut cx);
	}

	#[test]
	fn half_decay_spark_is_gone_after_two_ticks() {
		let mut pool = EntityPool::bounded(1);
		pool.populate(1, |_| still_spark(0.5));

		step(&mut pool, 1.0, 0.0);
		assert_eq!(pool.len(), 1);
		assert!((pool.get(0).unwrap().alpha - 0.5).abs() < 1e-12);

		step(&mut pool, 1.0, 0.0);
		assert!(pool.is_empty());
	}

	#[test]
	fn motion_is_frame_rate_independent() {
		let launch = |spark: &mut Spark| {
			spark.vx = 3.0;
			spark.vy = -8.0;
		};
		let mut fine = EntityPool::unbounded();
		fine.populate(1, |_| still_spark(0.01));
		fine.iter_mut().for_each(launch);
		let mut coarse = EntityPool::unbounded();
		coarse.populate(1, |_| still_spark(0.01));
		coarse.iter_mut().for_each(launch);

		for _ in 0..40 {
			step(&mut fine, 0.25, 0.1);
		}
		for _ in 0..5 {
			step(&mut coarse, 2.0, 0.1);
		}
		let (a, b) = (fine.get(0).unwrap(), coarse.get(0).unwrap());
		assert!((a.position.x - b.position.x).abs() < 1e-9);
		assert!((a.position.y - b.position.y).abs() < 1e-9);
		assert!((a.alpha - b.alpha).abs() < 1e-9);
	}

	#[test]
	fn alpha_never_goes_negative() {
		let mut spark = still_spark(0.7);
		let mut rng = EffectRng::seeded(0);
		let mut cx = StepContext {
			bounds: Bounds::new(10.0, 10.0),
			rng: &mut rng,
			pointer: None,
		};
		spark.advance(2.0, &SparkParams { gravity: 0.0 }, &mut cx);
		assert_eq!(spark.alpha, 0.0);
		assert!(!spark.is_alive());
	}

	#[test]
	fn zero_spread_fires_straight_up() {
		let mut rng = EffectRng::seeded(5);
		for _ in 0..20 {
			let spark = Spark::new(Point::default(), Color::WHITE, 0.0, &mut rng);
			assert!(spark.vx.abs() < 1e-9);
			assert!(spark.vy < 0.0);
			assert!((SPEED_MIN..SPEED_MAX).contains(&-spark.vy));
		}
	}

	#[test]
	fn trigger_defaults_to_the_centre() {
		let mut explosion = Explosion::new(ExplosionConfig::default(), 9);
		let scene = Scene {
			bounds: Bounds::new(400.0, 200.0),
			pointer: None,
		};
		let mut events = Vec::new();
		assert!(explosion.trigger(None, scene, &mut events));
		assert_eq!(explosion.population(), 30);
		assert!(explosion.sparks().iter().all(|s| s.position == Point::new(200.0, 100.0)));
		assert_eq!(
			events,
			vec![EffectEvent::Triggered {
				origin: Point::new(200.0, 100.0)
			}]
		);
	}

	#[test]
	fn click_triggers_at_the_click_point() {
		let mut scheduler = ManualScheduler::default();
		let mut lp = AnimationLoop::new(Explosion::new(ExplosionConfig::default(), 2));
		lp.surface_mut().attach(RecordingSurface::default());
		lp.mount(false, &mut scheduler);
		lp.resize(Bounds::new(300.0, 300.0), 1.0, &mut scheduler);
		lp.take_events();

		lp.click(Point::new(10.0, 20.0), &mut scheduler);
		assert_eq!(lp.state(), LoopState::Running);
		assert_eq!(
			lp.take_events(),
			vec![
				EffectEvent::Triggered {
					origin: Point::new(10.0, 20.0)
				},
				EffectEvent::Started,
			]
		);
	}

	#[test]
	fn burst_completes_once_every_spark_fades() {
		let mut scheduler = ManualScheduler::default();
		let config = ExplosionConfig {
			duration: 60_000.0,
			..ExplosionConfig::default()
		};
		let mut lp = AnimationLoop::new(Explosion::new(config, 4));
		lp.surface_mut().attach(RecordingSurface::default());
		lp.mount(false, &mut scheduler);
		lp.resize(Bounds::new(300.0, 300.0), 1.0, &mut scheduler);
		lp.trigger(None, &mut scheduler);

		// Slowest decay is 0.01 per frame: gone within 100 frames.
		let mut ticks = 0;
		while lp.state() == LoopState::Running && ticks < 200 {
			scheduler.fire_frame();
			scheduler.advance_clock(1000.0 / 60.0);
			lp.tick(&mut scheduler);
			ticks += 1;
		}
		assert_eq!(lp.state(), LoopState::Idle);
		assert!(ticks <= 101);
		assert_eq!(lp.effect().population(), 0);
		assert!(lp.take_events().contains(&EffectEvent::Completed));
	}

	#[test]
	fn reduced_motion_draws_the_ring_and_completes() {
		let mut scheduler = ManualScheduler::default();
		let mut lp = AnimationLoop::new(Explosion::new(ExplosionConfig::default(), 4));
		lp.surface_mut().attach(RecordingSurface::default());
		lp.mount(true, &mut scheduler);
		lp.resize(Bounds::new(300.0, 300.0), 1.0, &mut scheduler);
		lp.take_events();

		lp.trigger(None, &mut scheduler);
		assert_eq!(scheduler.pending_frames(), 0);
		let events = lp.take_events();
		assert_eq!(events.last(), Some(&EffectEvent::Completed));

		let ops = &lp.surface_mut().draw_context().unwrap().ops;
		let dots = ops
			.iter()
			.filter(|op| matches!(op, DrawOp::Circle { radius, .. } if *radius == STATIC_DOT_RADIUS))
			.count();
		assert_eq!(dots, 5);
	}

	#[test]
	fn normalization_bounds_spread_and_duration() {
		let config = ExplosionConfig {
			spread: 720.0,
			duration: -1.0,
			gravity: f64::NAN,
			..ExplosionConfig::default()
		}
		.normalized();
		assert_eq!(config.spread, 360.0);
		assert_eq!(config.duration, 1500.0);
		assert_eq!(config.gravity, 0.1);
	}
}
