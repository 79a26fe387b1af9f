//! Test doubles: a surface that records draw calls and a hand-cranked scheduler.

use super::color::Color;
use super::entity::Point;
use super::schedule::{FrameHandle, Scheduler, TimerHandle};
use super::surface::{Bounds, Surface};

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
	Configure(u32, u32, f64),
	Clear,
	Rect { width: f64, height: f64, alpha: f64 },
	Circle { center: Point, radius: f64, alpha: f64 },
	Glow { center: Point, radius: f64 },
	Line { from: Point, to: Point, alpha: f64 },
	Glyph { glyph: char, at: Point, alpha: f64 },
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
	pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
	pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
		self.ops.iter().filter(|op| pred(op)).count()
	}
}

impl Surface for RecordingSurface {
	fn configure(&mut self, backing_width: u32, backing_height: u32, pixel_ratio: f64) {
		self.ops
			.push(DrawOp::Configure(backing_width, backing_height, pixel_ratio));
	}

	fn clear(&mut self, _bounds: Bounds) {
		self.ops.push(DrawOp::Clear);
	}

	fn fill_rect(&mut self, _origin: Point, width: f64, height: f64, color: Color) {
		self.ops.push(DrawOp::Rect {
			width,
			height,
			alpha: color.a,
		});
	}

	fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
		self.ops.push(DrawOp::Circle {
			center,
			radius,
			alpha: color.a,
		});
	}

	fn fill_glow(&mut self, center: Point, radius: f64, _stops: &[(f64, Color)]) {
		self.ops.push(DrawOp::Glow { center, radius });
	}

	fn stroke_line(&mut self, from: Point, to: Point, _width: f64, color: Color) {
		self.ops.push(DrawOp::Line {
			from,
			to,
			alpha: color.a,
		});
	}

	fn fill_glyph(&mut self, glyph: char, at: Point, _font_px: f64, color: Color, _glow: f64) {
		self.ops.push(DrawOp::Glyph {
			glyph,
			at,
			alpha: color.a,
		});
	}
}

/// Scheduler whose frames and intervals fire only when a test says so.
#[derive(Debug, Default)]
pub struct ManualScheduler {
	next_id: i32,
	pub now: f64,
	pub frames: Vec<FrameHandle>,
	pub intervals: Vec<(TimerHandle, u32)>,
	pub cancelled_frames: usize,
	pub cancelled_intervals: usize,
}

impl ManualScheduler {
	pub fn pending_frames(&self) -> usize {
		self.frames.len()
	}

	pub fn active_intervals(&self) -> usize {
		self.intervals.len()
	}

	pub fn advance_clock(&mut self, ms: f64) {
		self.now += ms;
	}

	/// Consumes the oldest pending frame, as the host would when it fires.
	pub fn fire_frame(&mut self) -> bool {
		if self.frames.is_empty() {
			false
		} else {
			self.frames.remove(0);
			true
		}
	}

	fn next(&mut self) -> i32 {
		self.next_id += 1;
		self.next_id
	}
}

impl Scheduler for ManualScheduler {
	fn now(&self) -> f64 {
		self.now
	}

	fn request_frame(&mut self) -> Option<FrameHandle> {
		let handle = FrameHandle(self.next());
		self.frames.push(handle);
		Some(handle)
	}

	fn cancel_frame(&mut self, handle: FrameHandle) {
		self.frames.retain(|h| *h != handle);
		self.cancelled_frames += 1;
	}

	fn start_interval(&mut self, period_ms: u32) -> Option<TimerHandle> {
		let handle = TimerHandle(self.next());
		self.intervals.push((handle, period_ms));
		Some(handle)
	}

	fn cancel_interval(&mut self, handle: TimerHandle) {
		self.intervals.retain(|(h, _)| *h != handle);
		self.cancelled_intervals += 1;
	}
}
