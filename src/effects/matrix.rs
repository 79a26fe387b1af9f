//! Digital rain: columns of glyphs falling over a fading backdrop.
//!
//! Columns are recycled above the top edge once their trail clears the
//! bottom, so the population only changes with the surface width. Time
//! base: reference frames (1/60 s).

use std::rc::Rc;

use log::warn;
use serde::Deserialize;

use crate::engine::color::Color;
use crate::engine::effect::{Effect, Playback, Scene, TimeBase};
use crate::engine::entity::{EdgePolicy, Entity, Point, StepContext};
use crate::engine::events::EffectEvent;
use crate::engine::pool::EntityPool;
use crate::engine::rng::EffectRng;
use crate::engine::surface::{Bounds, ClearMode, Surface};

use super::{MAX_POPULATION, MAX_TRAIL, at_least, lenient_count};

pub const DEFAULT_CHARACTERS: &str = "アイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワヲン0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

const MUTATION_PER_FRAME: f64 = 0.02;
const HEAD_GLOW: f64 = 10.0;
const STATIC_ALPHA: f64 = 0.3;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MatrixConfig {
	pub font_size: f64,
	pub speed: f64,
	pub color: Color,
	pub highlight_color: Color,
	pub characters: String,
	/// Columns per font-width cell.
	pub density: f64,
	/// Opacity of the black overlay painted each frame.
	pub fade_opacity: f64,
	#[serde(deserialize_with = "lenient_count")]
	pub trail_length: usize,
	#[serde(flatten)]
	pub playback: Playback,
}

impl Default for MatrixConfig {
	fn default() -> Self {
		Self {
			font_size: 14.0,
			speed: 1.0,
			color: Color::rgb(0, 255, 0),
			highlight_color: Color::WHITE,
			characters: DEFAULT_CHARACTERS.to_string(),
			density: 1.0,
			fade_opacity: 0.05,
			trail_length: 20,
			playback: Playback::default(),
		}
	}
}

impl MatrixConfig {
	pub fn normalized(self) -> Self {
		let defaults = Self::default();
		let characters = if self.characters.trim().is_empty() {
			defaults.characters
		} else {
			self.characters
		};
		let density = if self.density.is_finite() && self.density > 0.0 {
			self.density
		} else {
			defaults.density
		};
		Self {
			font_size: at_least(self.font_size, 1.0, defaults.font_size),
			speed: at_least(self.speed, 0.0, defaults.speed),
			characters,
			density,
			fade_opacity: at_least(self.fade_opacity, 0.0, defaults.fade_opacity).min(1.0),
			trail_length: self.trail_length.clamp(1, MAX_TRAIL),
			..self
		}
	}

	/// `floor(width / font) × density`, rounded up and capped at
	/// [`MAX_POPULATION`].
	pub fn column_count(&self, width: f64) -> usize {
		let columns = ((width / self.font_size).floor() * self.density).ceil().max(0.0) as usize;
		columns.min(MAX_POPULATION)
	}

	/// Glyphs each column keeps: enough to fill the height plus a trail.
	pub fn glyphs_per_column(&self, height: f64) -> usize {
		((height / self.font_size).ceil().max(0.0) as usize).saturating_add(self.trail_length)
	}

	fn column_x(&self, index: usize) -> f64 {
		index as f64 / self.density * self.font_size
	}
}

pub struct RainParams {
	pub font_size: f64,
	pub speed: f64,
	pub trail_length: usize,
	pub height: f64,
	pub color: Color,
	pub highlight: Color,
	/// Shared with the effect; cloning is a reference bump.
	pub glyphs: Rc<[char]>,
}

impl RainParams {
	fn random_glyph(&self, rng: &mut EffectRng) -> char {
		self.glyphs.get(rng.index(self.glyphs.len())).copied().unwrap_or(' ')
	}
}

/// A falling column with its own glyph buffer; recycled above the top
/// edge once its trail has cleared the bottom.
#[derive(Clone, Debug)]
pub struct RainColumn {
	pub x: f64,
	/// Head position; negative while still above the surface.
	pub y: f64,
	pub speed: f64,
	glyphs: Vec<char>,
}

impl RainColumn {
	pub fn new(x: f64, height: f64, len: usize, params: &RainParams, rng: &mut EffectRng) -> Self {
		Self {
			x,
			y: -rng.range(0.0, height),
			speed: rng.range(0.5, 1.0) * params.speed,
			glyphs: (0..len.max(1)).map(|_| params.random_glyph(rng)).collect(),
		}
	}

	pub fn glyphs(&self) -> &[char] {
		&self.glyphs
	}

	/// Glyph shown on `row`; any row, including negative ones, maps into the
	/// buffer.
	pub fn glyph_at(&self, row: i64) -> char {
		let len = self.glyphs.len().max(1) as i64;
		self.glyphs
			.get(row.rem_euclid(len) as usize)
			.copied()
			.unwrap_or(' ')
	}

	/// Grows or shrinks the glyph buffer to `len`, keeping existing glyphs.
	fn fit(&mut self, len: usize, params: &RainParams, rng: &mut EffectRng) {
		let len = len.max(1);
		self.glyphs.truncate(len);
		while self.glyphs.len() < len {
			self.glyphs.push(params.random_glyph(rng));
		}
	}
}

impl Entity for RainColumn {
	type Params = RainParams;
	const EDGE_POLICY: EdgePolicy = EdgePolicy::Recycle;

	fn advance(&mut self, dt: f64, params: &RainParams, cx: &mut StepContext<'_>) -> bool {
		self.y += self.speed * params.font_size * dt * 0.5;

		if cx.rng.chance(MUTATION_PER_FRAME * dt) {
			let index = cx.rng.index(self.glyphs.len());
			if let Some(slot) = self.glyphs.get_mut(index) {
				*slot = params.random_glyph(cx.rng);
			}
		}

		let trail_px = params.trail_length as f64 * params.font_size;
		if self.y > cx.bounds.height + trail_px {
			self.y = -cx.rng.range(0.0, trail_px);
			self.speed = cx.rng.range(0.5, 1.0) * params.speed;
		}
		true
	}

	fn is_alive(&self) -> bool {
		true
	}

	fn render(&self, surface: &mut dyn Surface, params: &RainParams) {
		let font = params.font_size;
		let head_row = (self.y / font).floor() as i64;
		let trail = params.trail_length;
		for i in 0..trail {
			let row = head_row - i as i64;
			let y = row as f64 * font;
			if y < -font || y > params.height + font {
				continue;
			}
			let glyph = self.glyph_at(row);
			let at = Point::new(self.x, y);
			if i == 0 {
				surface.fill_glyph(glyph, at, font, params.highlight, HEAD_GLOW);
			} else {
				let alpha = 1.0 - i as f64 / trail as f64;
				surface.fill_glyph(glyph, at, font, params.color.with_alpha(alpha), 0.0);
			}
		}
	}

	fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}

	fn hit_radius(&self) -> f64 {
		0.0
	}

	/// Columns stay on their grid; only the fall progress scales.
	fn rescale(&mut self, _sx: f64, sy: f64) {
		self.y *= sy;
	}
}

pub struct MatrixRain {
	config: MatrixConfig,
	character_set: Rc<[char]>,
	pool: EntityPool<RainColumn>,
	rng: EffectRng,
}

impl MatrixRain {
	pub fn new(config: MatrixConfig, seed: u64) -> Self {
		let config = config.normalized();
		Self {
			character_set: config.characters.chars().collect(),
			config,
			pool: EntityPool::unbounded(),
			rng: EffectRng::seeded(seed),
		}
	}

	pub fn config(&self) -> &MatrixConfig {
		&self.config
	}

	pub fn columns(&self) -> &EntityPool<RainColumn> {
		&self.pool
	}

	fn params(&self, bounds: Bounds) -> RainParams {
		RainParams {
			font_size: self.config.font_size,
			speed: self.config.speed,
			trail_length: self.config.trail_length,
			height: bounds.height,
			color: self.config.color,
			highlight: self.config.highlight_color,
			glyphs: Rc::clone(&self.character_set),
		}
	}
}

impl Effect for MatrixRain {
	fn time_base(&self) -> TimeBase {
		TimeBase::Frames
	}

	fn clear_mode(&self) -> ClearMode {
		ClearMode::Fade {
			color: Color::BLACK,
			alpha: self.config.fade_opacity,
		}
	}

	fn playback(&self) -> Playback {
		self.config.playback
	}

	fn rng(&mut self) -> &mut EffectRng {
		&mut self.rng
	}

	fn reset(&mut self, bounds: Bounds) {
		let params = self.params(bounds);
		let count = self.config.column_count(bounds.width);
		let len = self.config.glyphs_per_column(bounds.height);
		let config = &self.config;
		let rng = &mut self.rng;
		self.pool.populate(count, |i| {
			RainColumn::new(config.column_x(i), bounds.height, len, &params, rng)
		});
	}

	/// Keeps the columns that still fit and adds new ones for extra width.
	fn resize(&mut self, previous: Bounds, next: Bounds) {
		if let Some((sx, sy)) = previous.scale_to(next) {
			self.pool.rescale(sx, sy);
		}
		let params = self.params(next);
		let count = self.config.column_count(next.width);
		let len = self.config.glyphs_per_column(next.height);
		self.pool.truncate(count);
		let config = &self.config;
		let rng = &mut self.rng;
		for column in self.pool.iter_mut() {
			column.fit(len, &params, rng);
		}
		let missing = count.saturating_sub(self.pool.len());
		self.pool.extend(missing, |i| {
			RainColumn::new(config.column_x(i), next.height, len, &params, rng)
		});
	}

	fn advance(&mut self, dt: f64, scene: Scene, _events: &mut Vec<EffectEvent>) {
		let params = self.params(scene.bounds);
		let mut cx = StepContext {
			bounds: scene.bounds,
			rng: &mut self.rng,
			pointer: scene.pointer,
		};
		self.pool.advance(dt, &params, &mut cx);
	}

	fn render(&self, surface: &mut dyn Surface, scene: Scene) {
		self.pool.render(surface, &self.params(scene.bounds));
	}

	/// Dim, motionless glyph grid on black.
	fn render_static(&self, surface: &mut dyn Surface, scene: Scene) {
		let bounds = scene.bounds;
		surface.fill_rect(Point::default(), bounds.width, bounds.height, Color::BLACK);
		let font = self.config.font_size;
		let rows = (bounds.height / font).ceil().max(0.0) as usize;
		let color = self.config.color.with_alpha(STATIC_ALPHA);
		for column in self.pool.iter() {
			for row in 0..rows {
				let glyph = column.glyph_at(row as i64);
				surface.fill_glyph(glyph, Point::new(column.x, row as f64 * font), font, color, 0.0);
			}
		}
	}

	fn population(&self) -> usize {
		self.pool.len()
	}

	fn set_characters(&mut self, characters: &str, bounds: Bounds) {
		if characters.trim().is_empty() {
			warn!("lumen-fx: ignoring empty matrix character set");
			return;
		}
		self.config.characters = characters.to_string();
		self.character_set = characters.chars().collect();
		if bounds.is_ready() {
			self.reset(bounds);
		}
	}
}
