//! [`Surface`] backed by an HTML canvas 2D context.

use std::f64::consts::TAU;

use thiserror::Error;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::engine::{Bounds, Color, Point, Surface};

#[derive(Debug, Error)]
pub enum SurfaceError {
	#[error("no browser window")]
	NoWindow,
	#[error("2d context unavailable")]
	NoContext,
	#[error("canvas context request failed: {0}")]
	Js(String),
}

pub struct CanvasSurface {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
	pub fn new(canvas: HtmlCanvasElement) -> Result<Self, SurfaceError> {
		let ctx = canvas
			.get_context("2d")
			.map_err(|e| SurfaceError::Js(format!("{e:?}")))?
			.ok_or(SurfaceError::NoContext)?
			.dyn_into::<CanvasRenderingContext2d>()
			.map_err(|_| SurfaceError::NoContext)?;
		Ok(Self { canvas, ctx })
	}
}

impl Surface for CanvasSurface {
	fn configure(&mut self, backing_width: u32, backing_height: u32, pixel_ratio: f64) {
		// Resizing the backing store also resets the transform.
		self.canvas.set_width(backing_width);
		self.canvas.set_height(backing_height);
		let _ = self
			.ctx
			.set_transform(pixel_ratio, 0.0, 0.0, pixel_ratio, 0.0, 0.0);
	}

	fn clear(&mut self, bounds: Bounds) {
		self.ctx.clear_rect(0.0, 0.0, bounds.width, bounds.height);
	}

	fn fill_rect(&mut self, origin: Point, width: f64, height: f64, color: Color) {
		self.ctx.set_fill_style_str(&color.to_css());
		self.ctx.fill_rect(origin.x, origin.y, width, height);
	}

	fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
		if radius <= 0.0 {
			return;
		}
		self.ctx.set_fill_style_str(&color.to_css());
		self.ctx.begin_path();
		let _ = self.ctx.arc(center.x, center.y, radius, 0.0, TAU);
		self.ctx.fill();
	}

	fn fill_glow(&mut self, center: Point, radius: f64, stops: &[(f64, Color)]) {
		if radius <= 0.0 {
			return;
		}
		let Ok(gradient) = self
			.ctx
			.create_radial_gradient(center.x, center.y, 0.0, center.x, center.y, radius)
		else {
			return;
		};
		for (offset, color) in stops {
			let _ = gradient.add_color_stop(offset.clamp(0.0, 1.0) as f32, &color.to_css());
		}
		#[allow(deprecated)]
		self.ctx.set_fill_style(&gradient);
		self.ctx.begin_path();
		let _ = self.ctx.arc(center.x, center.y, radius, 0.0, TAU);
		self.ctx.fill();
	}

	fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Color) {
		self.ctx.set_stroke_style_str(&color.to_css());
		self.ctx.set_line_width(width);
		self.ctx.begin_path();
		self.ctx.move_to(from.x, from.y);
		self.ctx.line_to(to.x, to.y);
		self.ctx.stroke();
	}

	fn fill_glyph(&mut self, glyph: char, at: Point, font_px: f64, color: Color, glow: f64) {
		let css = color.to_css();
		self.ctx.set_font(&format!("{font_px}px monospace"));
		self.ctx.set_fill_style_str(&css);
		if glow > 0.0 {
			self.ctx.set_shadow_color(&css);
			self.ctx.set_shadow_blur(glow);
		}
		let mut buf = [0u8; 4];
		let _ = self.ctx.fill_text(glyph.encode_utf8(&mut buf), at.x, at.y);
		if glow > 0.0 {
			self.ctx.set_shadow_blur(0.0);
		}
	}
}
