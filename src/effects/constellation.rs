//! Slowly drifting, twinkling stars joined by faint lines when close, and to
//! the pointer when interactive.
//!
//! Fixed population, hard edge wrap. Time base: reference frames.

use serde::Deserialize;

use crate::engine::color::Color;
use crate::engine::effect::{Effect, Playback, Scene, TimeBase};
use crate::engine::entity::{EdgePolicy, Entity, Point, StepContext, wrap_axis};
use crate::engine::events::EffectEvent;
use crate::engine::linker::{compute_links, pointer_links};
use crate::engine::pool::EntityPool;
use crate::engine::rng::EffectRng;
use crate::engine::surface::{Bounds, Surface};

use super::{MAX_POPULATION, at_least, headroom, lenient_count};

const TWINKLE_FLOOR: f64 = 0.3;
const TWINKLE_CEILING: f64 = 1.0;
const LINK_OPACITY: f64 = 0.3;
const LINK_WIDTH: f64 = 1.0;
const POINTER_REACH: f64 = 1.5;
const POINTER_LINK_OPACITY: f64 = 0.5;
const POINTER_LINK_WIDTH: f64 = 1.5;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConstellationConfig {
	#[serde(deserialize_with = "lenient_count")]
	pub star_count: usize,
	/// Stars closer than this are linked.
	pub line_distance: f64,
	pub speed: f64,
	pub star_color: Color,
	pub line_color: Color,
	/// Draws every link; with it off, the pointer gets none either.
	pub show_lines: bool,
	pub twinkle: bool,
	/// Links stars to the pointer while it is over the sky and lines are
	/// shown.
	pub interactive: bool,
	#[serde(flatten)]
	pub playback: Playback,
}

impl Default for ConstellationConfig {
	fn default() -> Self {
		Self {
			star_count: 80,
			line_distance: 120.0,
			speed: 0.3,
			star_color: Color::WHITE,
			line_color: Color::WHITE,
			show_lines: true,
			twinkle: true,
			interactive: true,
			playback: Playback::default(),
		}
	}
}

impl ConstellationConfig {
	pub fn normalized(self) -> Self {
		let defaults = Self::default();
		Self {
			line_distance: at_least(self.line_distance, 0.0, defaults.line_distance),
			speed: at_least(self.speed, 0.0, defaults.speed),
			star_count: self.star_count.min(MAX_POPULATION),
			..self
		}
	}
}

pub struct SkyParams {
	pub twinkle: bool,
	pub color: Color,
}

/// A slowly drifting star that wraps at the edges and, when twinkling,
/// bounces its opacity between a floor and a ceiling.
#[derive(Clone, Debug)]
pub struct SkyStar {
	pub position: Point,
	pub vx: f64,
	pub vy: f64,
	pub radius: f64,
	pub opacity: f64,
	twinkle_speed: f64,
	rising: bool,
}

impl SkyStar {
	pub fn new(bounds: Bounds, speed: f64, rng: &mut EffectRng) -> Self {
		Self {
			position: Point::new(rng.range(0.0, bounds.width), rng.range(0.0, bounds.height)),
			vx: rng.jitter(speed / 2.0),
			vy: rng.jitter(speed / 2.0),
			radius: rng.range(1.0, 3.0),
			opacity: rng.range(0.5, 1.0),
			twinkle_speed: rng.range(0.01, 0.03),
			rising: true,
		}
	}

	/// Bounces opacity between the floor and the ceiling.
	fn twinkle(&mut self, dt: f64) {
		let step = self.twinkle_speed * dt;
		if self.rising {
			self.opacity += step;
			if self.opacity >= TWINKLE_CEILING {
				self.opacity = TWINKLE_CEILING;
				self.rising = false;
			}
		} else {
			self.opacity -= step;
			if self.opacity <= TWINKLE_FLOOR {
				self.opacity = TWINKLE_FLOOR;
				self.rising = true;
			}
		}
	}
}

impl Entity for SkyStar {
	type Params = SkyParams;
	const EDGE_POLICY: EdgePolicy = EdgePolicy::Wrap;

	fn advance(&mut self, dt: f64, params: &SkyParams, cx: &mut StepContext<'_>) -> bool {
		self.position.x = wrap_axis(self.position.x + self.vx * dt, cx.bounds.width, 0.0);
		self.position.y = wrap_axis(self.position.y + self.vy * dt, cx.bounds.height, 0.0);
		if params.twinkle {
			self.twinkle(dt);
		}
		true
	}

	fn is_alive(&self) -> bool {
		true
	}

	fn render(&self, surface: &mut dyn Surface, params: &SkyParams) {
		surface.fill_circle(self.position, self.radius, params.color.with_alpha(self.opacity));
	}

	fn position(&self) -> Point {
		self.position
	}

	fn hit_radius(&self) -> f64 {
		self.radius
	}

	fn rescale(&mut self, sx: f64, sy: f64) {
		self.position = Point::new(self.position.x * sx, self.position.y * sy);
	}
}

pub struct Constellation {
	config: ConstellationConfig,
	pool: EntityPool<SkyStar>,
	rng: EffectRng,
}

impl Constellation {
	pub fn new(config: ConstellationConfig, seed: u64) -> Self {
		Self {
			config: config.normalized(),
			pool: EntityPool::unbounded(),
			rng: EffectRng::seeded(seed),
		}
	}

	pub fn config(&self) -> &ConstellationConfig {
		&self.config
	}

	pub fn stars(&self) -> &EntityPool<SkyStar> {
		&self.pool
	}

	fn params(&self) -> SkyParams {
		SkyParams {
			twinkle: self.config.twinkle,
			color: self.config.star_color,
		}
	}
}

impl Effect for Constellation {
	fn time_base(&self) -> TimeBase {
		TimeBase::Frames
	}

	fn playback(&self) -> Playback {
		self.config.playback
	}

	fn rng(&mut self) -> &mut EffectRng {
		&mut self.rng
	}

	fn reset(&mut self, bounds: Bounds) {
		let speed = self.config.speed;
		let rng = &mut self.rng;
		self.pool
			.populate(self.config.star_count, |_| SkyStar::new(bounds, speed, rng));
	}

	fn resize(&mut self, previous: Bounds, next: Bounds) {
		if let Some((sx, sy)) = previous.scale_to(next) {
			self.pool.rescale(sx, sy);
		}
	}

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

	fn render_links(&self, surface: &mut dyn Surface, scene: Scene) {
		if !self.config.show_lines {
			return;
		}
		let points = self.pool.positions();
		let color = self.config.line_color;
		for link in compute_links(&points, self.config.line_distance, LINK_OPACITY) {
			surface.stroke_line(points[link.a], points[link.b], LINK_WIDTH, color.with_alpha(link.strength));
		}
		let Some(pointer) = scene.pointer.filter(|_| self.config.interactive) else {
			return;
		};
		let reach = self.config.line_distance * POINTER_REACH;
		for link in pointer_links(&points, pointer, reach, POINTER_LINK_OPACITY) {
			surface.stroke_line(
				points[link.index],
				pointer,
				POINTER_LINK_WIDTH,
				color.with_alpha(link.strength),
			);
		}
	}

	fn population(&self) -> usize {
		self.pool.len()
	}

	fn add_entities(&mut self, count: usize, bounds: Bounds) {
		let speed = self.config.speed;
		let rng = &mut self.rng;
		self.pool.extend(headroom(self.pool.len(), count), |_| SkyStar::new(bounds, speed, rng));
		self.config.star_count = self.pool.len();
	}

	fn remove_entities(&mut self, count: usize) {
		self.pool.remove_front(count);
		self.config.star_count = self.pool.len();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::animation::{AnimationLoop, LoopState};
	use crate::engine::events::EffectCommand;
	use crate::engine::testing::{DrawOp, ManualScheduler, RecordingSurface};

	fn sky(points: &[Point], config: ConstellationConfig) -> Constellation {
		let mut sky = Constellation::new(
			ConstellationConfig {
				star_count: points.len(),
				..config
			},
			5,
		);
		sky.reset(Bounds::new(800.0, 600.0));
		for (star, at) in sky.pool.iter_mut().zip(points) {
			star.position = *at;
		}
		sky
	}

	fn lines(sky: &Constellation, pointer: Option<Point>) -> Vec<DrawOp> {
		let mut surface = RecordingSurface::default();
		sky.render_links(
			&mut surface,
			Scene {
				bounds: Bounds::new(800.0, 600.0),
				pointer,
			},
		);
		surface.ops
	}

	#[test]
	fn distant_stars_are_not_linked() {
		let sky = sky(&[Point::new(100.0, 100.0), Point::new(250.0, 100.0)], ConstellationConfig::default());
		assert!(lines(&sky, None).is_empty());
	}

	#[test]
	fn link_fades_with_distance() {
		let sky = sky(&[Point::new(100.0, 100.0), Point::new(160.0, 100.0)], ConstellationConfig::default());
		let ops = lines(&sky, None);
		assert_eq!(ops.len(), 1);
		match ops[0] {
			DrawOp::Line { alpha, .. } => assert!((alpha - 0.5 * LINK_OPACITY).abs() < 1e-9),
			ref other => panic!("expected a line, got {other:?}"),
		}
	}

	#[test]
	fn pointer_links_reach_further() {
		// 150 px: beyond the star range of 120 but within 1.5 × 120.
		let sky = sky(&[Point::new(100.0, 100.0)], ConstellationConfig::default());
		let ops = lines(&sky, Some(Point::new(250.0, 100.0)));
		assert_eq!(ops.len(), 1);
		match ops[0] {
			DrawOp::Line { from, to, alpha } => {
				assert_eq!(from, Point::new(100.0, 100.0));
				assert_eq!(to, Point::new(250.0, 100.0));
				assert!((alpha - (1.0 - 150.0 / 180.0) * POINTER_LINK_OPACITY).abs() < 1e-9);
			}
			ref other => panic!("expected a line, got {other:?}"),
		}

		let passive = sky_with_pointer_disabled();
		assert!(lines(&passive, Some(Point::new(250.0, 100.0))).is_empty());
	}

	fn sky_with_pointer_disabled() -> Constellation {
		sky(
			&[Point::new(100.0, 100.0)],
			ConstellationConfig {
				interactive: false,
				..ConstellationConfig::default()
			},
		)
	}

	#[test]
	fn hidden_lines_hide_pointer_links_too() {
		let sky = sky(
			&[Point::new(100.0, 100.0), Point::new(110.0, 100.0)],
			ConstellationConfig {
				show_lines: false,
				..ConstellationConfig::default()
			},
		);
		assert!(lines(&sky, None).is_empty());
		assert!(lines(&sky, Some(Point::new(105.0, 100.0))).is_empty());
	}

	#[test]
	fn population_and_bounds_hold_while_running() {
		let mut sky = Constellation::new(ConstellationConfig::default(), 9);
		sky.reset(Bounds::new(800.0, 600.0));
		let scene = Scene {
			bounds: Bounds::new(800.0, 600.0),
			pointer: None,
		};
		let mut events = Vec::new();
		for _ in 0..1000 {
			sky.advance(1.0, scene, &mut events);
		}
		assert_eq!(sky.population(), 80);
		for star in sky.stars().iter() {
			assert!((0.0..=800.0).contains(&star.position.x));
			assert!((0.0..=600.0).contains(&star.position.y));
			assert!((TWINKLE_FLOOR..=TWINKLE_CEILING).contains(&star.opacity));
		}
		assert!(events.is_empty());
	}

	#[test]
	fn twinkle_bounces_between_floor_and_ceiling() {
		let mut star = SkyStar::new(Bounds::new(100.0, 100.0), 0.0, &mut EffectRng::seeded(2));
		star.opacity = 0.99;
		star.twinkle_speed = 0.02;
		star.twinkle(1.0);
		assert_eq!(star.opacity, TWINKLE_CEILING);
		star.twinkle(1.0);
		assert!(star.opacity < TWINKLE_CEILING);

		star.opacity = 0.31;
		star.twinkle(1.0);
		assert_eq!(star.opacity, TWINKLE_FLOOR);
		star.twinkle(1.0);
		assert!(star.opacity > TWINKLE_FLOOR);
	}

	#[test]
	fn steady_stars_keep_their_opacity() {
		let mut sky = Constellation::new(
			ConstellationConfig {
				twinkle: false,
				..ConstellationConfig::default()
			},
			4,
		);
		sky.reset(Bounds::new(800.0, 600.0));
		let before: Vec<f64> = sky.stars().iter().map(|s| s.opacity).collect();
		let scene = Scene {
			bounds: Bounds::new(800.0, 600.0),
			pointer: None,
		};
		sky.advance(1.0, scene, &mut Vec::new());
		let after: Vec<f64> = sky.stars().iter().map(|s| s.opacity).collect();
		assert_eq!(before, after);
	}

	#[test]
	fn paused_sky_repaints_after_add_and_remove() {
		let mut scheduler = ManualScheduler::default();
		let config = ConstellationConfig {
			playback: Playback {
				paused: true,
				reduced_motion: None,
			},
			..ConstellationConfig::default()
		};
		let mut lp = AnimationLoop::new(Constellation::new(config, 1));
		lp.surface_mut().attach(RecordingSurface::default());
		lp.mount(false, &mut scheduler);
		lp.resize(Bounds::new(800.0, 600.0), 1.0, &mut scheduler);
		assert_eq!(lp.state(), LoopState::Paused);

		let circles = |lp: &mut AnimationLoop<Constellation, RecordingSurface>| {
			let surface = lp.surface_mut().draw_context().unwrap();
			let n = surface
				.ops
				.iter()
				.filter(|op| matches!(op, DrawOp::Circle { .. }))
				.count();
			surface.ops.clear();
			n
		};
		circles(&mut lp);

		lp.apply(EffectCommand::Add(20), &mut scheduler);
		assert_eq!(lp.effect().config().star_count, 100);
		assert_eq!(circles(&mut lp), 100);

		lp.apply(EffectCommand::Remove(30), &mut scheduler);
		assert_eq!(lp.effect().population(), 70);
		assert_eq!(circles(&mut lp), 70);
		assert_eq!(scheduler.pending_frames(), 0);
	}
}
