//! Host scheduling capability.
//!
//! The loop never reaches for a global timer API. Whoever drives it passes a
//! [`Scheduler`] into each call, and every handle it returns is owned by the
//! caller until it is cancelled or fires. The scheduler is also the loop's
//! only clock.

/// Pending display-refresh callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHandle(pub i32);

/// Repeating timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerHandle(pub i32);

pub trait Scheduler {
	/// Monotonic clock in milliseconds, on the same timeline as frame callbacks.
	fn now(&self) -> f64;
	/// Asks for one callback on the next display refresh.
	/// `None` when the host refused.
	fn request_frame(&mut self) -> Option<FrameHandle>;
	fn cancel_frame(&mut self, handle: FrameHandle);
	/// Starts a repeating timer with the given period.
	fn start_interval(&mut self, period_ms: u32) -> Option<TimerHandle>;
	fn cancel_interval(&mut self, handle: TimerHandle);
}
