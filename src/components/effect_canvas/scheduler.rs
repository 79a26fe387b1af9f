//! `requestAnimationFrame` / `setInterval` backed [`Scheduler`].

use log::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Performance, Window};

use crate::engine::{FrameHandle, Scheduler, TimerHandle};

/// Owns the two JS callbacks the browser invokes. They stay alive for as long
/// as the scheduler does, so every handle it returns is safe to fire.
pub struct BrowserScheduler {
	window: Window,
	performance: Option<Performance>,
	on_frame: Closure<dyn FnMut(f64)>,
	on_interval: Closure<dyn FnMut()>,
}

impl BrowserScheduler {
	pub fn new(
		window: Window,
		on_frame: impl FnMut(f64) + 'static,
		on_interval: impl FnMut() + 'static,
	) -> Self {
		Self {
			performance: window.performance(),
			window,
			on_frame: Closure::new(on_frame),
			on_interval: Closure::new(on_interval),
		}
	}
}

impl Scheduler for BrowserScheduler {
	fn now(&self) -> f64 {
		match &self.performance {
			Some(performance) => performance.now(),
			None => js_sys::Date::now(),
		}
	}

	fn request_frame(&mut self) -> Option<FrameHandle> {
		match self
			.window
			.request_animation_frame(self.on_frame.as_ref().unchecked_ref())
		{
			Ok(id) => Some(FrameHandle(id)),
			Err(e) => {
				warn!("lumen-fx: requestAnimationFrame failed: {e:?}");
				None
			}
		}
	}

	fn cancel_frame(&mut self, handle: FrameHandle) {
		let _ = self.window.cancel_animation_frame(handle.0);
	}

	fn start_interval(&mut self, period_ms: u32) -> Option<TimerHandle> {
		let period = i32::try_from(period_ms).unwrap_or(i32::MAX);
		match self
			.window
			.set_interval_with_callback_and_timeout_and_arguments_0(
				self.on_interval.as_ref().unchecked_ref(),
				period,
			) {
			Ok(id) => Some(TimerHandle(id)),
			Err(e) => {
				warn!("lumen-fx: setInterval failed: {e:?}");
				None
			}
		}
	}

	fn cancel_interval(&mut self, handle: TimerHandle) {
		self.window.clear_interval_with_handle(handle.0);
	}
}
