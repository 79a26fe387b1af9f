//! Ambient fireflies drifting, pulsing and optionally drawn to the pointer.
//!
//! Fixed population with soft-edged wrap. Time base: seconds, with the
//! per-frame drag and motion constants rescaled to a 60 fps reference so
//! the look does not depend on the display's refresh rate.

use std::f64::consts::TAU;

use serde::Deserialize;

use crate::engine::color::{Color, Palette, clamp_unit};
use crate::engine::effect::{ClickResponse, Effect, Playback, Scene, TimeBase};
use crate::engine::entity::{EdgePolicy, Entity, Point, StepContext, wrap_axis};
use crate::engine::events::{EffectEvent, Selection};
use crate::engine::interaction::attraction;
use crate::engine::pool::EntityPool;
use crate::engine::rng::EffectRng;
use crate::engine::surface::{Bounds, Surface};

use super::{MAX_POPULATION, at_least, headroom, lenient_count};

const WANDER_FORCE: f64 = 0.1;
const WANDER_TURN: f64 = 0.25;
const DRAG_PER_FRAME: f64 = 0.98;
const MAX_SPEED: f64 = 50.0;
const ATTRACTION_RADIUS: f64 = 150.0;
const ATTRACTION_GAIN: f64 = 50.0;
const RETARGET_PER_FRAME: f64 = 0.01;
const BRIGHTNESS_EASE: f64 = 2.0;
const STATIC_BRIGHTNESS: f64 = 0.5;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FirefliesConfig {
	#[serde(deserialize_with = "lenient_count")]
	pub count: usize,
	/// Glow radius of the largest firefly; smaller ones scale down.
	pub glow_size: f64,
	pub speed: f64,
	pub colors: Palette,
	pub min_size: f64,
	pub max_size: f64,
	pub blink_speed: f64,
	/// Enables pointer attraction and click selection.
	pub interactive: bool,
	pub mouse_attraction: f64,
	#[serde(flatten)]
	pub playback: Playback,
}

impl Default for FirefliesConfig {
	fn default() -> Self {
		Self {
			count: 50,
			glow_size: 20.0,
			speed: 1.0,
			colors: Palette::from_css(&["#ffff00", "#ffee00", "#ffdd00", "#ffe066", "#fff59d"]),
			min_size: 2.0,
			max_size: 5.0,
			blink_speed: 1.0,
			interactive: false,
			mouse_attraction: 0.5,
			playback: Playback::default(),
		}
	}
}

impl FirefliesConfig {
	pub fn normalized(self) -> Self {
		let defaults = Self::default();
		let min_size = at_least(self.min_size, 0.0, defaults.min_size);
		let max_size = at_least(self.max_size, min_size, min_size.max(defaults.max_size));
		Self {
			glow_size: at_least(self.glow_size, 0.0, defaults.glow_size),
			speed: at_least(self.speed, 0.0, defaults.speed),
			count: self.count.min(MAX_POPULATION),
			min_size,
			max_size,
			blink_speed: at_least(self.blink_speed, 0.0, defaults.blink_speed),
			mouse_attraction: if self.mouse_attraction.is_finite() {
				self.mouse_attraction
			} else {
				defaults.mouse_attraction
			},
			..self
		}
	}
}

pub struct FireflyParams {
	/// Wander acceleration, in pixels per frame per second.
	pub wander: f64,
	/// Speed limit, in pixels per frame.
	pub ceiling: f64,
	pub blink_speed: f64,
	/// Attraction strength toward the pointer, when interactive.
	pub attraction: Option<f64>,
}

/// A glowing mote that wanders, pulses and wraps softly at the edges.
///
/// Velocity is in pixels per reference frame and decays by a fixed factor
/// per frame; the distance covered over a tick is the exact integral of
/// that decay, so positions agree at any refresh rate.
#[derive(Clone, Debug)]
pub struct Firefly {
	pub position: Point,
	pub vx: f64,
	pub vy: f64,
	pub size: f64,
	pub glow: f64,
	pub color: Color,
	phase: f64,
	pulse_speed: f64,
	brightness: f64,
	target_brightness: f64,
	wander_angle: f64,
	current_brightness: f64,
}

impl Firefly {
	pub fn new(bounds: Bounds, config: &FirefliesConfig, rng: &mut EffectRng) -> Self {
		let size = rng.range(config.min_size, config.max_size);
		let glow = if config.max_size > 0.0 {
			config.glow_size * size / config.max_size
		} else {
			config.glow_size
		};
		let brightness = rng.unit();
		Self {
			position: Point::new(rng.range(0.0, bounds.width), rng.range(0.0, bounds.height)),
			vx: rng.jitter(config.speed),
			vy: rng.jitter(config.speed),
			size,
			glow,
			color: config.colors.pick(rng),
			phase: rng.angle(),
			pulse_speed: rng.range(0.5, 2.0),
			brightness,
			target_brightness: rng.unit(),
			wander_angle: rng.range(0.0, TAU),
			current_brightness: brightness,
		}
	}

	/// Brightness after the pulse is applied, in [0, 1].
	pub fn brightness(&self) -> f64 {
		clamp_unit(self.current_brightness)
	}

	pub fn speed(&self) -> f64 {
		self.vx.hypot(self.vy)
	}

	fn draw(&self, surface: &mut dyn Surface, brightness: f64) {
		let glow = self.glow * brightness;
		surface.fill_glow(
			self.position,
			glow,
			&[
				(0.0, self.color.with_alpha(brightness)),
				(0.3, self.color.with_alpha(brightness * 0.5)),
				(1.0, self.color.with_alpha(0.0)),
			],
		);
		surface.fill_circle(
			self.position,
			self.size * brightness,
			Color::WHITE.with_alpha(brightness),
		);
	}
}

impl Entity for Firefly {
	type Params = FireflyParams;
	const EDGE_POLICY: EdgePolicy = EdgePolicy::Wrap;

	fn advance(&mut self, dt: f64, params: &FireflyParams, cx: &mut StepContext<'_>) -> bool {
		let frames = dt * 60.0;

		self.wander_angle += cx.rng.jitter(WANDER_TURN) * dt;
		self.vx += self.wander_angle.cos() * params.wander * dt;
		self.vy += self.wander_angle.sin() * params.wander * dt;

		if let Some(strength) = params.attraction {
			let (ax, ay) = attraction(
				self.position,
				cx.pointer,
				ATTRACTION_RADIUS,
				strength * ATTRACTION_GAIN,
			);
			self.vx += ax * dt;
			self.vy += ay * dt;
		}

		let speed = self.speed();
		if speed > params.ceiling {
			let k = if speed > 0.0 { params.ceiling / speed } else { 0.0 };
			self.vx *= k;
			self.vy *= k;
		}

		let drag = DRAG_PER_FRAME.powf(frames);
		let travel = (1.0 - drag) / -DRAG_PER_FRAME.ln();
		self.position.x = wrap_axis(self.position.x + self.vx * travel, cx.bounds.width, self.glow);
		self.position.y = wrap_axis(self.position.y + self.vy * travel, cx.bounds.height, self.glow);
		self.vx *= drag;
		self.vy *= drag;

		self.phase += dt * self.pulse_speed * params.blink_speed;
		if cx.rng.chance(RETARGET_PER_FRAME * frames) {
			self.target_brightness = cx.rng.range(0.3, 1.0);
		}
		let ease = 1.0 - (-dt * BRIGHTNESS_EASE).exp();
		self.brightness += (self.target_brightness - self.brightness) * ease;
		let pulse = 0.3 + 0.7 * ((self.phase.sin() + 1.0) / 2.0);
		self.current_brightness = clamp_unit(self.brightness * pulse);
		true
	}

	fn is_alive(&self) -> bool {
		true
	}

	fn render(&self, surface: &mut dyn Surface, _params: &FireflyParams) {
		self.draw(surface, self.brightness());
	}

	fn position(&self) -> Point {
		self.position
	}

	fn hit_radius(&self) -> f64 {
		self.glow
	}

	fn rescale(&mut self, sx: f64, sy: f64) {
		self.position = Point::new(self.position.x * sx, self.position.y * sy);
	}
}

pub struct Fireflies {
	config: FirefliesConfig,
	pool: EntityPool<Firefly>,
	rng: EffectRng,
}

impl Fireflies {
	pub fn new(config: FirefliesConfig, seed: u64) -> Self {
		Self {
			config: config.normalized(),
			pool: EntityPool::unbounded(),
			rng: EffectRng::seeded(seed),
		}
	}

	pub fn config(&self) -> &FirefliesConfig {
		&self.config
	}

	pub fn fireflies(&self) -> &EntityPool<Firefly> {
		&self.pool
	}

	fn params(&self) -> FireflyParams {
		FireflyParams {
			wander: WANDER_FORCE * self.config.speed,
			ceiling: MAX_SPEED * self.config.speed,
			blink_speed: self.config.blink_speed,
			attraction: self
				.config
				.interactive
				.then_some(self.config.mouse_attraction),
		}
	}
}

impl Effect for Fireflies {
	fn time_base(&self) -> TimeBase {
		TimeBase::Seconds
	}

	fn playback(&self) -> Playback {
		self.config.playback
	}

	fn rng(&mut self) -> &mut EffectRng {
		&mut self.rng
	}

	fn reset(&mut self, bounds: Bounds) {
		let config = &self.config;
		let rng = &mut self.rng;
		self.pool
			.populate(config.count, |_| Firefly::new(bounds, config, rng));
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

	fn render_static(&self, surface: &mut dyn Surface, _scene: Scene) {
		for firefly in self.pool.iter() {
			firefly.draw(surface, STATIC_BRIGHTNESS);
		}
	}

	fn population(&self) -> usize {
		self.pool.len()
	}

	fn clicked(&mut self, at: Point, _scene: Scene, events: &mut Vec<EffectEvent>) -> ClickResponse {
		if !self.config.interactive {
			return ClickResponse::Ignored;
		}
		match self.pool.hit_test(at).and_then(|i| self.pool.get(i)) {
			Some(firefly) => {
				events.push(EffectEvent::Selected(Selection {
					color: firefly.color,
					position: firefly.position,
					size: firefly.size,
				}));
				ClickResponse::Handled
			}
			None => ClickResponse::Ignored,
		}
	}

	fn add_entities(&mut self, count: usize, bounds: Bounds) {
		let config = &self.config;
		let rng = &mut self.rng;
		self.pool.extend(headroom(self.pool.len(), count), |_| Firefly::new(bounds, config, rng));
		self.config.count = self.pool.len();
	}

	fn remove_entities(&mut self, count: usize) {
		self.pool.remove_front(count);
		self.config.count = self.pool.len();
	}

	/// Recolours every existing firefly from the new palette.
	fn set_palette(&mut self, palette: Palette) {
		self.config.colors = palette;
		for firefly in self.pool.iter_mut() {
			firefly.color = self.config.colors.pick(&mut self.rng);
		}
	}
}
