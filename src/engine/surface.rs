//! Drawing surface abstraction and its size/pixel-ratio manager.
//!
//! Effects draw through the [`Surface`] trait in logical pixels. The
//! [`SurfaceManager`] owns the backend, keeps the logical size and the
//! device pixel ratio, and applies the per-effect [`ClearMode`] between
//! frames. A manager without a backend (context unavailable) or without a
//! positive size (container not laid out yet) turns every draw into a no-op.

use super::color::{Color, clamp_unit};
use super::entity::Point;

/// Logical (CSS pixel) size of a drawing surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
	pub width: f64,
	pub height: f64,
}

impl Bounds {
	/// Creates bounds, mapping negative or non-finite extents to zero.
	pub fn new(width: f64, height: f64) -> Self {
		let sane = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
		Self {
			width: sane(width),
			height: sane(height),
		}
	}

	/// A surface is usable only once both extents are positive.
	pub fn is_ready(&self) -> bool {
		self.width > 0.0 && self.height > 0.0
	}

	pub fn center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}

	/// Per-axis ratio that maps coordinates in `self` onto `next`.
	/// `None` unless both sizes are ready.
	pub fn scale_to(&self, next: Bounds) -> Option<(f64, f64)> {
		(self.is_ready() && next.is_ready())
			.then(|| (next.width / self.width, next.height / self.height))
	}
}

/// How the surface is prepared before each frame is rendered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClearMode {
	/// Wipe to fully transparent.
	Hard,
	/// Paint a translucent overlay so the previous frame lingers as a trail.
	Fade { color: Color, alpha: f64 },
}

/// Immediate-mode 2D drawing primitives, in logical pixels.
pub trait Surface {
	/// Called after every resize with the backing-store size and the scale
	/// that maps logical pixels onto it.
	fn configure(&mut self, backing_width: u32, backing_height: u32, pixel_ratio: f64);
	fn clear(&mut self, bounds: Bounds);
	fn fill_rect(&mut self, origin: Point, width: f64, height: f64, color: Color);
	fn fill_circle(&mut self, center: Point, radius: f64, color: Color);
	/// Radial gradient disc; `stops` are `(offset in [0,1], color)` pairs.
	fn fill_glow(&mut self, center: Point, radius: f64, stops: &[(f64, Color)]);
	fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Color);
	/// Single glyph in a monospace font, with an optional shadow blur glow.
	fn fill_glyph(&mut self, glyph: char, at: Point, font_px: f64, color: Color, glow: f64);
}

/// Owns one effect's drawing surface and its dimensions.
pub struct SurfaceManager<S> {
	backend: Option<S>,
	bounds: Bounds,
	pixel_ratio: f64,
	clear_mode: ClearMode,
}

impl<S: Surface> SurfaceManager<S> {
	pub fn new(clear_mode: ClearMode) -> Self {
		Self {
			backend: None,
			bounds: Bounds::default(),
			pixel_ratio: 1.0,
			clear_mode,
		}
	}

	/// Installs the drawing backend, configuring it for the current size.
	pub fn attach(&mut self, mut backend: S) {
		if self.bounds.is_ready() {
			let (w, h) = self.backing_size();
			backend.configure(w, h, self.pixel_ratio);
		}
		self.backend = Some(backend);
	}

	pub fn detach(&mut self) -> Option<S> {
		self.backend.take()
	}

	pub fn is_attached(&self) -> bool {
		self.backend.is_some()
	}

	/// Rescales the backing store to `logical × pixel_ratio` and resets the
	/// drawing transform so callers keep working in logical pixels.
	pub fn resize(&mut self, logical: Bounds, pixel_ratio: f64) {
		self.bounds = Bounds::new(logical.width, logical.height);
		self.pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
			pixel_ratio
		} else {
			1.0
		};
		let (w, h) = self.backing_size();
		let ratio = self.pixel_ratio;
		if let Some(backend) = self.backend.as_mut() {
			backend.configure(w, h, ratio);
		}
	}

	pub fn bounds(&self) -> Bounds {
		self.bounds
	}

	pub fn pixel_ratio(&self) -> f64 {
		self.pixel_ratio
	}

	pub fn clear_mode(&self) -> ClearMode {
		self.clear_mode
	}

	/// Device-pixel size of the backing store.
	pub fn backing_size(&self) -> (u32, u32) {
		(
			(self.bounds.width * self.pixel_ratio).round() as u32,
			(self.bounds.height * self.pixel_ratio).round() as u32,
		)
	}

	/// Prepares the next frame according to the configured [`ClearMode`].
	pub fn clear(&mut self) {
		let bounds = self.bounds;
		let mode = self.clear_mode;
		let Some(ctx) = self.draw_context() else {
			return;
		};
		match mode {
			ClearMode::Hard => ctx.clear(bounds),
			ClearMode::Fade { color, alpha } => ctx.fill_rect(
				Point::default(),
				bounds.width,
				bounds.height,
				color.with_alpha(clamp_unit(alpha)),
			),
		}
	}

	/// Wipes the surface regardless of the clear mode.
	pub fn wipe(&mut self) {
		let bounds = self.bounds;
		if let Some(ctx) = self.draw_context() {
			ctx.clear(bounds);
		}
	}

	/// The backend, when one is attached and the size is positive.
	pub fn draw_context(&mut self) -> Option<&mut S> {
		if !self.bounds.is_ready() {
			return None;
		}
		self.backend.as_mut()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::testing::{DrawOp, RecordingSurface};

	#[test]
	fn backing_store_follows_pixel_ratio() {
		let mut surface = SurfaceManager::new(ClearMode::Hard);
		surface.attach(RecordingSurface::default());
		surface.resize(Bounds::new(400.0, 300.0), 2.0);

		assert_eq!(surface.backing_size(), (800, 600));
		let ops = &surface.draw_context().unwrap().ops;
		assert_eq!(ops.last(), Some(&DrawOp::Configure(800, 600, 2.0)));
	}

	#[test]
	fn bad_pixel_ratio_falls_back_to_one() {
		let mut surface = SurfaceManager::<RecordingSurface>::new(ClearMode::Hard);
		surface.resize(Bounds::new(10.0, 10.0), f64::NAN);
		assert_eq!(surface.pixel_ratio(), 1.0);
		surface.resize(Bounds::new(10.0, 10.0), 0.0);
		assert_eq!(surface.pixel_ratio(), 1.0);
	}

	#[test]
	fn zero_size_is_not_ready_and_draws_nothing() {
		let mut surface = SurfaceManager::new(ClearMode::Hard);
		surface.attach(RecordingSurface::default());
		surface.resize(Bounds::new(0.0, 300.0), 1.0);

		assert!(!surface.bounds().is_ready());
		surface.clear();
		assert!(surface.draw_context().is_none());
		let backend = surface.detach().unwrap();
		assert!(!backend.ops.iter().any(|op| matches!(op, DrawOp::Clear)));
	}

	#[test]
	fn fade_mode_paints_an_overlay_instead_of_clearing() {
		let mut surface = SurfaceManager::new(ClearMode::Fade {
			color: Color::BLACK,
			alpha: 0.05,
		});
		surface.attach(RecordingSurface::default());
		surface.resize(Bounds::new(100.0, 50.0), 1.0);
		surface.clear();

		let backend = surface.detach().unwrap();
		assert!(!backend.ops.contains(&DrawOp::Clear));
		assert!(backend.ops.iter().any(|op| matches!(
			op,
			DrawOp::Rect { width, height, alpha } if *width == 100.0 && *height == 50.0 && (*alpha - 0.05).abs() < 1e-9
		)));
	}

	#[test]
	fn negative_bounds_are_sanitized() {
		let bounds = Bounds::new(-5.0, f64::INFINITY);
		assert_eq!(bounds, Bounds::default());
		assert!(Bounds::new(800.0, 600.0).scale_to(bounds).is_none());
		assert_eq!(
			Bounds::new(800.0, 600.0).scale_to(Bounds::new(400.0, 300.0)),
			Some((0.5, 0.5))
		);
	}
}
