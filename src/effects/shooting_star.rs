//! Shooting stars streaking down-left across the sky, leaving glowing trails.
//!
//! Stars are produced on an interval (gated by a probability) up to a
//! population ceiling, or on demand. A star's head dies when it fades out or
//! leaves the sky; its trail then drains one point per frame and the star is
//! removed once nothing is left to draw. Time base: reference frames; the
//! trail samples the head once per reference frame whatever the refresh
//! rate.

use serde::Deserialize;

use crate::engine::color::{Color, Palette, clamp_unit};
use crate::engine::effect::{ClickResponse, Effect, Playback, Scene, TimeBase};
use crate::engine::entity::{EdgePolicy, Entity, Point, StepContext, Trail, TrailPoint};
use crate::engine::events::EffectEvent;
use crate::engine::pool::EntityPool;
use crate::engine::rng::EffectRng;
use crate::engine::spawn::{SpawnSchedule, admit};
use crate::engine::surface::{Bounds, Surface};

use super::{MAX_POPULATION, MAX_TRAIL, at_least, lenient_count};

const FADE_PER_FRAME: f64 = 0.008;
const EXIT_MARGIN: f64 = 50.0;
const ENTRY_OFFSET: f64 = 20.0;
const HEADING_MIN_DEG: f64 = 200.0;
const HEADING_MAX_DEG: f64 = 250.0;
const SPEED_JITTER: f64 = 2.0;
const TRAIL_OPACITY: f64 = 0.6;
const BACKGROUND_OPACITY: f64 = 0.6;

/// Fixed backdrop stars: fractional position, radius in pixels, opacity.
const BACKGROUND_STARS: [(f64, f64, f64, f64); 18] = [
	(0.10, 0.20, 0.5, 1.0),
	(0.20, 0.50, 0.5, 0.8),
	(0.30, 0.30, 0.5, 1.0),
	(0.40, 0.70, 0.5, 0.6),
	(0.50, 0.10, 0.5, 1.0),
	(0.60, 0.80, 0.5, 0.7),
	(0.70, 0.40, 0.5, 1.0),
	(0.80, 0.60, 0.5, 0.8),
	(0.90, 0.25, 0.5, 1.0),
	(0.15, 0.85, 0.75, 1.0),
	(0.25, 0.15, 0.75, 0.9),
	(0.35, 0.65, 0.75, 1.0),
	(0.45, 0.35, 0.75, 0.8),
	(0.55, 0.95, 0.75, 1.0),
	(0.65, 0.05, 0.75, 0.7),
	(0.75, 0.75, 0.75, 1.0),
	(0.85, 0.45, 0.75, 0.9),
	(0.95, 0.55, 0.75, 1.0),
];

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ShootingStarsConfig {
	/// Spawn interval in milliseconds.
	pub frequency: f64,
	pub spawn_probability: f64,
	/// Pixels per reference frame.
	pub speed: f64,
	#[serde(deserialize_with = "lenient_count")]
	pub trail_length: usize,
	pub colors: Palette,
	#[serde(deserialize_with = "lenient_count")]
	pub max_stars: usize,
	/// Paints a fixed field of dim stars behind the shooting ones.
	pub show_background_stars: bool,
	pub trigger_on_click: bool,
	#[serde(flatten)]
	pub playback: Playback,
}

impl Default for ShootingStarsConfig {
	fn default() -> Self {
		Self {
			frequency: 2000.0,
			spawn_probability: 0.7,
			speed: 10.0,
			trail_length: 25,
			colors: Palette::from_css(&["#ffffff", "#fffacd", "#e6e6fa", "#add8e6", "#ffdab9"]),
			max_stars: 5,
			show_background_stars: true,
			trigger_on_click: false,
			playback: Playback::default(),
		}
	}
}

impl ShootingStarsConfig {
	pub fn normalized(self) -> Self {
		let defaults = Self::default();
		Self {
			frequency: at_least(self.frequency, 1.0, defaults.frequency),
			spawn_probability: clamp_unit(self.spawn_probability),
			speed: at_least(self.speed, 0.0, defaults.speed),
			trail_length: self.trail_length.clamp(1, MAX_TRAIL),
			max_stars: self.max_stars.min(MAX_POPULATION),
			..self
		}
	}
}

/// A streak with a glowing head and a fading trail.
///
/// The head fades at a fixed rate per reference frame and dies on leaving
/// the sky. The trail records one head sample per reference frame while the
/// head lives, then loses one point per reference frame.
#[derive(Clone, Debug)]
pub struct ShootingStar {
	pub position: Point,
	pub vx: f64,
	pub vy: f64,
	pub alpha: f64,
	pub size: f64,
	pub color: Color,
	trail: Trail,
	/// Reference frames until the next trail sample (or drain, once dead).
	trail_clock: f64,
	active: bool,
}

impl ShootingStar {
	/// Enters from just above the top edge or just right of the right edge.
	pub fn new(bounds: Bounds, speed: f64, trail_length: usize, color: Color, rng: &mut EffectRng) -> Self {
		let position = if rng.chance(0.5) {
			Point::new(rng.range(0.0, bounds.width), -ENTRY_OFFSET)
		} else {
			Point::new(bounds.width + ENTRY_OFFSET, rng.range(0.0, bounds.height * 0.5))
		};
		let heading = rng.range(HEADING_MIN_DEG, HEADING_MAX_DEG).to_radians();
		Self {
			position,
			vx: heading.cos() * speed,
			vy: -heading.sin() * speed,
			alpha: 1.0,
			size: rng.range(1.0, 3.0),
			color,
			trail: Trail::new(trail_length),
			trail_clock: 0.0,
			active: true,
		}
	}

	pub fn trail(&self) -> &Trail {
		&self.trail
	}

	fn fly(&mut self, dt: f64, bounds: Bounds) {
		self.position.x += self.vx * dt;
		self.position.y += self.vy * dt;
		self.alpha = (self.alpha - FADE_PER_FRAME * dt).max(0.0);
		let gone = self.position.x < -EXIT_MARGIN
			|| self.position.y > bounds.height + EXIT_MARGIN
			|| self.alpha <= 0.0;
		if gone {
			self.active = false;
		}
	}
}

impl Entity for ShootingStar {
	type Params = ();
	const EDGE_POLICY: EdgePolicy = EdgePolicy::Destroy;

	/// Splits `dt` at trail sample boundaries so the trail holds the same
	/// points at any refresh rate.
	fn advance(&mut self, dt: f64, _params: &(), cx: &mut StepContext<'_>) -> bool {
		let mut remaining = dt;
		while remaining > 0.0 && !self.is_drained() {
			if self.trail_clock <= 0.0 {
				if self.active {
					self.trail.push_front(TrailPoint {
						position: self.position,
						alpha: self.alpha,
					});
				} else {
					self.trail.drain_one();
				}
				self.trail_clock += 1.0;
			}
			let step = remaining.min(self.trail_clock);
			if self.active {
				self.fly(step, cx.bounds);
			}
			self.trail_clock -= step;
			remaining -= step;
		}
		self.active
	}

	/// Latched on the tick the head fades or leaves; the head is frozen from
	/// then on, so the flag never needs to flip back.
	fn is_alive(&self) -> bool {
		self.active
	}

	fn is_drained(&self) -> bool {
		!self.active && self.trail.is_empty()
	}

	fn render(&self, surface: &mut dyn Surface, _params: &()) {
		for (i, point) in self.trail.iter().enumerate() {
			let falloff = self.trail.falloff(i);
			let alpha = point.alpha * falloff * TRAIL_OPACITY;
			let radius = self.size * falloff * 3.0;
			surface.fill_glow(
				point.position,
				radius,
				&[
					(0.0, self.color.with_alpha(alpha)),
					(1.0, self.color.with_alpha(0.0)),
				],
			);
		}
		if !self.active {
			return;
		}
		surface.fill_glow(
			self.position,
			self.size * 4.0,
			&[
				(0.0, Color::WHITE.with_alpha(self.alpha)),
				(0.2, self.color.with_alpha(self.alpha)),
				(1.0, self.color.with_alpha(0.0)),
			],
		);
		surface.fill_circle(self.position, self.size, Color::WHITE.with_alpha(self.alpha));
	}

	fn position(&self) -> Point {
		self.position
	}

	fn hit_radius(&self) -> f64 {
		self.size * 4.0
	}

	fn rescale(&mut self, sx: f64, sy: f64) {
		self.position = Point::new(self.position.x * sx, self.position.y * sy);
	}
}

pub struct ShootingStars {
	config: ShootingStarsConfig,
	pool: EntityPool<ShootingStar>,
	rng: EffectRng,
}

impl ShootingStars {
	pub fn new(config: ShootingStarsConfig, seed: u64) -> Self {
		let config = config.normalized();
		Self {
			pool: EntityPool::bounded(config.max_stars),
			config,
			rng: EffectRng::seeded(seed),
		}
	}

	pub fn config(&self) -> &ShootingStarsConfig {
		&self.config
	}

	pub fn stars(&self) -> &EntityPool<ShootingStar> {
		&self.pool
	}

	fn render_background(&self, surface: &mut dyn Surface, bounds: Bounds) {
		if !self.config.show_background_stars {
			return;
		}
		for &(fx, fy, radius, alpha) in &BACKGROUND_STARS {
			let at = Point::new(fx * bounds.width, fy * bounds.height);
			surface.fill_circle(at, radius, Color::WHITE.with_alpha(alpha * BACKGROUND_OPACITY));
		}
	}
}

impl Effect for ShootingStars {
	fn time_base(&self) -> TimeBase {
		TimeBase::Frames
	}

	fn playback(&self) -> Playback {
		self.config.playback
	}

	fn rng(&mut self) -> &mut EffectRng {
		&mut self.rng
	}

	fn reset(&mut self, _bounds: Bounds) {
		self.pool.clear();
	}

	/// In-flight stars keep their paths; exits are tested against the
	/// current size every tick.
	fn resize(&mut self, _previous: Bounds, _next: Bounds) {}

	fn advance(&mut self, dt: f64, scene: Scene, events: &mut Vec<EffectEvent>) {
		let mut cx = StepContext {
			bounds: scene.bounds,
			rng: &mut self.rng,
			pointer: scene.pointer,
		};
		let report = self.pool.advance(dt, &(), &mut cx);
		events.extend(std::iter::repeat_n(EffectEvent::Faded, report.died));
	}

	fn render(&self, surface: &mut dyn Surface, scene: Scene) {
		self.render_background(surface, scene.bounds);
		self.pool.render(surface, &());
	}

	fn population(&self) -> usize {
		self.pool.len()
	}

	fn spawn_schedule(&self) -> Option<SpawnSchedule> {
		Some(SpawnSchedule {
			interval_ms: self.config.frequency.round() as u32,
			probability: self.config.spawn_probability,
		})
	}

	fn spawn_one(&mut self, scene: Scene, events: &mut Vec<EffectEvent>) {
		if !scene.bounds.is_ready() {
			return;
		}
		let color = self.config.colors.pick(&mut self.rng);
		let speed = self.config.speed + self.rng.jitter(SPEED_JITTER);
		let star = ShootingStar::new(scene.bounds, speed, self.config.trail_length, color, &mut self.rng);
		let position = star.position;
		if admit(&mut self.pool, star).spawned() {
			events.push(EffectEvent::Spawned { color, position });
		}
	}

	fn trigger(&mut self, _at: Option<Point>, scene: Scene, events: &mut Vec<EffectEvent>) -> bool {
		let before = events.len();
		self.spawn_one(scene, events);
		events.len() > before
	}

	fn clicked(&mut self, _at: Point, _scene: Scene, _events: &mut Vec<EffectEvent>) -> ClickResponse {
		if self.config.trigger_on_click {
			ClickResponse::Trigger(None)
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
	use crate::engine::animation::AnimationLoop;
	use crate::engine::events::EffectCommand;
	use crate::engine::testing::{DrawOp, ManualScheduler, RecordingSurface};

	fn sky() -> Scene {
		Scene {
			bounds: Bounds::new(800.0, 600.0),
			pointer: None,
		}
	}

	fn running(config: ShootingStarsConfig) -> (AnimationLoop<ShootingStars, RecordingSurface>, ManualScheduler) {
		let mut scheduler = ManualScheduler::default();
		let mut lp = AnimationLoop::new(ShootingStars::new(config, 8));
		lp.surface_mut().attach(RecordingSurface::default());
		lp.mount(false, &mut scheduler);
		lp.resize(Bounds::new(800.0, 600.0), 1.0, &mut scheduler);
		(lp, scheduler)
	}

	#[test]
	fn stars_head_down_and_left() {
		let mut rng = EffectRng::seeded(4);
		for _ in 0..50 {
			let star = ShootingStar::new(Bounds::new(800.0, 600.0), 10.0, 25, Color::WHITE, &mut rng);
			assert!(star.vx < 0.0);
			assert!(star.vy > 0.0);
			let from_top = star.position.y == -ENTRY_OFFSET;
			let from_right = star.position.x == 800.0 + ENTRY_OFFSET;
			assert!(from_top || from_right);
		}
	}

	#[test]
	fn trail_is_bounded_and_drains_after_death() {
		let mut star = ShootingStar::new(Bounds::new(800.0, 600.0), 10.0, 3, Color::WHITE, &mut EffectRng::seeded(1));
		star.position = Point::new(400.0, 300.0);
		star.vx = -5.0;
		star.vy = 5.0;
		let mut rng = EffectRng::seeded(2);
		let mut cx = StepContext {
			bounds: Bounds::new(800.0, 600.0),
			rng: &mut rng,
			pointer: None,
		};
		for _ in 0..5 {
			star.advance(1.0, &(), &mut cx);
		}
		assert_eq!(star.trail().len(), 3);

		star.alpha = 0.001;
		assert!(!star.advance(1.0, &(), &mut cx));
		assert!(!star.is_alive());
		assert!(!star.is_drained());
		let frozen = star.position;

		for remaining in (0..3).rev() {
			star.advance(1.0, &(), &mut cx);
			assert_eq!(star.trail().len(), remaining);
			assert_eq!(star.position, frozen);
		}
		assert!(star.is_drained());
	}

	fn streak(trail_length: usize) -> ShootingStar {
		let mut star = ShootingStar::new(
			Bounds::new(800.0, 600.0),
			10.0,
			trail_length,
			Color::WHITE,
			&mut EffectRng::seeded(1),
		);
		star.position = Point::new(400.0, 300.0);
		star.vx = -5.0;
		star.vy = 5.0;
		star
	}

	fn fly_for(star: &mut ShootingStar, ticks: usize, dt: f64) {
		let mut rng = EffectRng::seeded(2);
		let mut cx = StepContext {
			bounds: Bounds::new(800.0, 600.0),
			rng: &mut rng,
			pointer: None,
		};
		for _ in 0..ticks {
			star.advance(dt, &(), &mut cx);
		}
	}

	#[test]
	fn trail_matches_at_sixty_and_one_twenty_hertz() {
		let (mut slow, mut fast) = (streak(25), streak(25));
		fly_for(&mut slow, 20, 1.0);
		fly_for(&mut fast, 40, 0.5);

		assert!(slow.position.distance(fast.position) < 1e-9);
		assert!((slow.alpha - fast.alpha).abs() < 1e-9);
		assert_eq!(slow.trail().len(), 20);
		assert_eq!(fast.trail().len(), slow.trail().len());
		for (a, b) in slow.trail().iter().zip(fast.trail().iter()) {
			assert!(a.position.distance(b.position) < 1e-9);
			assert!((a.alpha - b.alpha).abs() < 1e-9);
		}
	}

	#[test]
	fn trail_drains_at_the_same_pace_at_any_refresh_rate() {
		let (mut slow, mut fast) = (streak(10), streak(10));
		fly_for(&mut slow, 12, 1.0);
		fly_for(&mut fast, 24, 0.5);
		slow.alpha = 0.0;
		fast.alpha = 0.0;
		slow.active = false;
		fast.active = false;

		fly_for(&mut slow, 4, 1.0);
		fly_for(&mut fast, 8, 0.5);
		assert_eq!(slow.trail().len(), 6);
		assert_eq!(fast.trail().len(), 6);

		fly_for(&mut slow, 6, 1.0);
		fly_for(&mut fast, 12, 0.5);
		assert!(slow.is_drained());
		assert!(fast.is_drained());
	}

	#[test]
	fn background_layer_follows_the_flag_and_the_surface_size() {
		let lit = ShootingStars::new(ShootingStarsConfig::default(), 1);
		let mut surface = RecordingSurface::default();
		lit.render(&mut surface, sky());
		let circles: Vec<Point> = surface
			.ops
			.iter()
			.filter_map(|op| match op {
				DrawOp::Circle { center, .. } => Some(*center),
				_ => None,
			})
			.collect();
		assert_eq!(circles.len(), BACKGROUND_STARS.len());
		assert!(circles[0].distance(Point::new(80.0, 120.0)) < 1e-9);
		assert!(circles.iter().all(|c| c.x <= 800.0 && c.y <= 600.0));

		let dark = ShootingStars::new(
			ShootingStarsConfig {
				show_background_stars: false,
				..ShootingStarsConfig::default()
			},
			1,
		);
		let mut surface = RecordingSurface::default();
		dark.render(&mut surface, sky());
		assert!(surface.ops.is_empty());
	}

	#[test]
	fn background_stars_show_in_the_reduced_motion_frame() {
		let stars = ShootingStars::new(ShootingStarsConfig::default(), 1);
		let mut surface = RecordingSurface::default();
		stars.render_static(&mut surface, sky());
		assert_eq!(
			surface.count(|op| matches!(op, DrawOp::Circle { .. })),
			BACKGROUND_STARS.len()
		);
	}

	#[test]
	fn starting_spawns_one_star_and_an_interval() {
		let (mut lp, scheduler) = running(ShootingStarsConfig::default());
		assert_eq!(lp.effect().population(), 1);
		assert_eq!(scheduler.active_intervals(), 1);
		assert_eq!(scheduler.intervals[0].1, 2000);
		let events = lp.take_events();
		assert!(matches!(events.last(), Some(EffectEvent::Spawned { .. })));
	}

	#[test]
	fn population_never_exceeds_the_ceiling() {
		let config = ShootingStarsConfig {
			spawn_probability: 1.0,
			max_stars: 3,
			..ShootingStarsConfig::default()
		};
		let (mut lp, mut scheduler) = running(config);
		for _ in 0..20 {
			lp.on_interval(&mut scheduler);
			assert!(lp.effect().population() <= 3);
		}
		assert_eq!(lp.effect().population(), 3);
	}

	#[test]
	fn faded_stars_are_reported_once_and_eventually_removed() {
		let (mut lp, mut scheduler) = running(ShootingStarsConfig::default());
		lp.take_events();
		let mut faded = 0;
		for _ in 0..400 {
			scheduler.fire_frame();
			scheduler.advance_clock(1000.0 / 60.0);
			lp.tick(&mut scheduler);
			faded += lp
				.take_events()
				.iter()
				.filter(|e| **e == EffectEvent::Faded)
				.count();
		}
		assert_eq!(faded, 1);
		assert_eq!(lp.effect().population(), 0);
	}

	#[test]
	fn trigger_is_suppressed_under_reduced_motion() {
		let (mut lp, mut scheduler) = running(ShootingStarsConfig::default());
		lp.apply(EffectCommand::Clear, &mut scheduler);
		assert_eq!(lp.effect().population(), 0);

		lp.set_reduced_motion(true, &mut scheduler);
		lp.apply(EffectCommand::Trigger(None), &mut scheduler);
		assert_eq!(lp.effect().population(), 0);

		lp.set_reduced_motion(false, &mut scheduler);
		lp.apply(EffectCommand::Clear, &mut scheduler);
		lp.apply(EffectCommand::Trigger(None), &mut scheduler);
		assert_eq!(lp.effect().population(), 1);
	}

	#[test]
	fn click_triggers_only_when_enabled() {
		let mut stars = ShootingStars::new(ShootingStarsConfig::default(), 1);
		let mut events = Vec::new();
		assert_eq!(stars.clicked(Point::default(), sky(), &mut events), ClickResponse::Ignored);

		let mut stars = ShootingStars::new(
			ShootingStarsConfig {
				trigger_on_click: true,
				..ShootingStarsConfig::default()
			},
			1,
		);
		assert_eq!(
			stars.clicked(Point::default(), sky(), &mut events),
			ClickResponse::Trigger(None)
		);
	}

	#[test]
	fn zero_trail_length_is_raised() {
		let config: ShootingStarsConfig = serde_json::from_str(r#"{"trail-length": 0}"#).unwrap();
		assert_eq!(config.normalized().trail_length, 1);
	}
}
