//! Frame-driven loop controller for one effect instance.
//!
//! Single-threaded and cooperative: the host calls [`AnimationLoop::tick`]
//! when a requested frame fires and [`AnimationLoop::on_interval`] when the
//! spawn timer fires. Every frame or timer handle the loop acquires is
//! released on pause, stop, completion, reduced-motion engagement and
//! teardown.

use log::debug;

use super::effect::{ClickResponse, Effect, Scene};
use super::entity::Point;
use super::events::{EffectCommand, EffectEvent};
use super::interaction::InteractionBridge;
use super::schedule::{FrameHandle, Scheduler};
use super::spawn::SpawnController;
use super::surface::{Bounds, Surface, SurfaceManager};

/// Longest wall-clock gap a single tick will simulate. Longer gaps (a
/// throttled background tab) are clamped to this.
pub const MAX_FRAME_GAP_MS: f64 = 250.0;

/// Where a loop is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
	Idle,
	Running,
	Paused,
	/// Reduced motion: one representative frame is on screen, nothing is
	/// scheduled.
	Static,
}

/// Drives one effect on one surface.
///
/// The loop owns the effect, the surface manager and the pointer bridge,
/// and holds at most one pending frame and one spawn timer. Lifecycle
/// events are queued and handed out by [`AnimationLoop::take_events`] so a
/// host can notify listeners after the loop is no longer borrowed.
pub struct AnimationLoop<E, S> {
	effect: E,
	surface: SurfaceManager<S>,
	bridge: InteractionBridge,
	state: LoopState,
	reduced_motion: bool,
	frame: Option<FrameHandle>,
	spawner: Option<SpawnController>,
	last_tick_ms: f64,
	elapsed_ms: f64,
	ready: bool,
	start_when_ready: bool,
	events: Vec<EffectEvent>,
}

impl<E: Effect, S: Surface> AnimationLoop<E, S> {
	pub fn new(effect: E) -> Self {
		let surface = SurfaceManager::new(effect.clear_mode());
		Self {
			effect,
			surface,
			bridge: InteractionBridge::default(),
			state: LoopState::Idle,
			reduced_motion: false,
			frame: None,
			spawner: None,
			last_tick_ms: 0.0,
			elapsed_ms: 0.0,
			ready: false,
			start_when_ready: false,
			events: Vec::new(),
		}
	}

	pub fn state(&self) -> LoopState {
		self.state
	}

	pub fn effect(&self) -> &E {
		&self.effect
	}

	pub fn effect_mut(&mut self) -> &mut E {
		&mut self.effect
	}

	pub fn surface(&self) -> &SurfaceManager<S> {
		&self.surface
	}

	pub fn surface_mut(&mut self) -> &mut SurfaceManager<S> {
		&mut self.surface
	}

	pub fn is_reduced_motion(&self) -> bool {
		self.reduced_motion
	}

	pub fn has_pending_frame(&self) -> bool {
		self.frame.is_some()
	}

	pub fn is_spawning(&self) -> bool {
		self.spawner.as_ref().is_some_and(SpawnController::is_running)
	}

	/// Events queued since the last call.
	pub fn take_events(&mut self) -> Vec<EffectEvent> {
		std::mem::take(&mut self.events)
	}

	fn scene(&self) -> Scene {
		Scene {
			bounds: self.surface.bounds(),
			pointer: self.bridge.pointer(),
		}
	}

	/// Attaches the effect to its host. `prefers_reduced_motion` is the host
	/// preference; the effect's own playback override wins over it.
	///
	/// Ambient effects start as soon as the surface has a positive size,
	/// unless configured paused. One-shot effects wait for a trigger.
	pub fn mount(&mut self, prefers_reduced_motion: bool, scheduler: &mut dyn Scheduler) {
		let playback = self.effect.playback();
		self.reduced_motion = playback.reduced_motion.unwrap_or(prefers_reduced_motion);
		if self.effect.is_one_shot() {
			return;
		}
		if playback.paused {
			self.state = LoopState::Paused;
			self.repaint();
			return;
		}
		self.start_when_ready = true;
		if self.ready {
			self.start(scheduler);
		}
	}

	/// Starts animating. A no-op unless idle.
	pub fn start(&mut self, scheduler: &mut dyn Scheduler) {
		if self.state != LoopState::Idle || self.effect.is_one_shot() {
			return;
		}
		if !self.ready {
			self.start_when_ready = true;
			return;
		}
		if self.reduced_motion {
			self.enter_static();
			return;
		}
		self.events.push(EffectEvent::Started);
		self.run(scheduler, true);
	}

	pub fn pause(&mut self, scheduler: &mut dyn Scheduler) {
		match self.state {
			LoopState::Running => {
				self.halt_schedule(scheduler);
				self.state = LoopState::Paused;
				self.events.push(EffectEvent::Paused);
			}
			LoopState::Static => {
				self.state = LoopState::Paused;
				self.events.push(EffectEvent::Paused);
			}
			LoopState::Idle | LoopState::Paused => {}
		}
	}

	pub fn resume(&mut self, scheduler: &mut dyn Scheduler) {
		if self.state != LoopState::Paused {
			return;
		}
		if !self.ready {
			self.state = LoopState::Idle;
			self.start_when_ready = true;
			return;
		}
		self.events.push(EffectEvent::Resumed);
		if self.reduced_motion {
			self.enter_static();
		} else {
			self.run(scheduler, false);
		}
	}

	pub fn toggle(&mut self, scheduler: &mut dyn Scheduler) {
		match self.state {
			LoopState::Running | LoopState::Static => self.pause(scheduler),
			LoopState::Paused => self.resume(scheduler),
			LoopState::Idle => self.start(scheduler),
		}
	}

	/// Stops a running loop. Stopping an idle or paused loop does nothing.
	pub fn stop(&mut self, scheduler: &mut dyn Scheduler) {
		if self.state != LoopState::Running {
			return;
		}
		self.halt_schedule(scheduler);
		self.state = LoopState::Idle;
		self.start_when_ready = false;
		self.events.push(EffectEvent::Stopped);
	}

	/// Releases every handle and returns to idle without notifying anyone.
	pub fn teardown(&mut self, scheduler: &mut dyn Scheduler) {
		self.halt_schedule(scheduler);
		self.state = LoopState::Idle;
		self.start_when_ready = false;
		self.bridge.pointer_leave();
		self.events.clear();
	}

	pub fn set_reduced_motion(&mut self, reduced: bool, scheduler: &mut dyn Scheduler) {
		if self.reduced_motion == reduced {
			return;
		}
		self.reduced_motion = reduced;
		match (reduced, self.state) {
			(true, LoopState::Running) => {
				self.halt_schedule(scheduler);
				if self.effect.is_one_shot() {
					self.paint_static();
					self.effect.halt();
					self.state = LoopState::Idle;
					self.events.push(EffectEvent::Completed);
				} else {
					self.enter_static();
				}
			}
			(false, LoopState::Static) => {
				self.events.push(EffectEvent::Resumed);
				self.run(scheduler, true);
			}
			_ => {}
		}
	}

	/// New container size, in logical pixels, and device pixel ratio.
	pub fn resize(&mut self, logical: Bounds, pixel_ratio: f64, scheduler: &mut dyn Scheduler) {
		let previous = self.surface.bounds();
		self.surface.resize(logical, pixel_ratio);
		let next = self.surface.bounds();
		if !next.is_ready() {
			debug!("lumen-fx: surface not ready ({}x{})", next.width, next.height);
			return;
		}
		if !self.ready {
			self.ready = true;
			self.effect.reset(next);
			self.events.push(EffectEvent::Ready);
			if self.start_when_ready {
				self.start_when_ready = false;
				self.start(scheduler);
			}
		} else {
			self.effect.resize(previous, next);
		}
		self.repaint();
	}

	/// Runs one frame. Call when the frame requested by this loop fires.
	pub fn tick(&mut self, scheduler: &mut dyn Scheduler) {
		self.frame = None;
		if self.state != LoopState::Running {
			return;
		}
		let now = scheduler.now();
		let gap = (now - self.last_tick_ms).clamp(0.0, MAX_FRAME_GAP_MS);
		self.last_tick_ms = now;
		self.elapsed_ms += gap;

		let scene = self.scene();
		if scene.bounds.is_ready() {
			let dt = self.effect.time_base().delta(gap);
			self.effect.advance(dt, scene, &mut self.events);
			self.surface.clear();
			if let Some(ctx) = self.surface.draw_context() {
				self.effect.render(ctx, scene);
				self.effect.render_links(ctx, scene);
			}
		}

		let out_of_time = self
			.effect
			.duration_ms()
			.is_some_and(|duration| self.elapsed_ms >= duration);
		if out_of_time || self.effect.is_finished() {
			self.complete(scheduler);
		} else {
			self.request_frame(scheduler);
		}
	}

	/// Call when the spawn interval fires.
	pub fn on_interval(&mut self, _scheduler: &mut dyn Scheduler) {
		if self.state != LoopState::Running {
			return;
		}
		let Some(spawner) = self.spawner.as_ref() else {
			return;
		};
		if spawner.gate(self.effect.rng()) {
			let scene = self.scene();
			self.effect.spawn_one(scene, &mut self.events);
		}
	}

	/// Fires a one-shot at `at` (surface-local), or at the effect's default.
	pub fn trigger(&mut self, at: Option<Point>, scheduler: &mut dyn Scheduler) {
		let scene = self.scene();
		if !scene.bounds.is_ready() {
			debug!("lumen-fx: trigger ignored, surface not ready");
			return;
		}
		if !self.effect.restarts_on_trigger() {
			if self.reduced_motion {
				return;
			}
			self.effect.trigger(at, scene, &mut self.events);
			return;
		}

		self.halt_schedule(scheduler);
		self.surface.wipe();
		self.effect.halt();
		let was_running = self.state == LoopState::Running;
		self.state = LoopState::Idle;
		if !self.effect.trigger(at, scene, &mut self.events) {
			return;
		}
		if self.reduced_motion {
			self.paint_static();
			self.effect.halt();
			self.events.push(EffectEvent::Completed);
			return;
		}
		self.run(scheduler, true);
		if !was_running {
			self.events.push(EffectEvent::Started);
		}
	}

	pub fn pointer_move(&mut self, local: Point) {
		self.bridge.pointer_move(local);
	}

	pub fn pointer_leave(&mut self) {
		self.bridge.pointer_leave();
	}

	/// Click at a surface-local point.
	pub fn click(&mut self, local: Point, scheduler: &mut dyn Scheduler) {
		let scene = self.scene();
		if let ClickResponse::Trigger(at) = self.effect.clicked(local, scene, &mut self.events) {
			self.trigger(at, scheduler);
		}
	}

	pub fn apply(&mut self, command: EffectCommand, scheduler: &mut dyn Scheduler) {
		let bounds = self.surface.bounds();
		match command {
			EffectCommand::Pause => self.pause(scheduler),
			EffectCommand::Resume => self.resume(scheduler),
			EffectCommand::Toggle => self.toggle(scheduler),
			EffectCommand::Trigger(at) => self.trigger(at, scheduler),
			EffectCommand::Reset => {
				if self.effect.is_one_shot() {
					let was_running = self.state == LoopState::Running;
					self.halt_schedule(scheduler);
					self.effect.halt();
					self.surface.wipe();
					self.state = LoopState::Idle;
					if was_running {
						self.events.push(EffectEvent::Stopped);
					}
				} else if bounds.is_ready() {
					self.effect.reset(bounds);
					self.repaint();
				}
			}
			EffectCommand::Add(count) => {
				if bounds.is_ready() {
					self.effect.add_entities(count, bounds);
					self.repaint();
				}
			}
			EffectCommand::Remove(count) => {
				self.effect.remove_entities(count);
				self.repaint();
			}
			EffectCommand::SetPalette(palette) => {
				self.effect.set_palette(palette);
				self.repaint();
			}
			EffectCommand::SetCharacters(characters) => {
				self.effect.set_characters(&characters, bounds);
				self.repaint();
			}
			EffectCommand::Clear => {
				self.effect.clear_entities();
				self.surface.wipe();
			}
		}
	}

	/// Enters `Running`. A fresh run restarts the duration clock and spawns
	/// its first entity at once; a resumed one carries on where it paused.
	fn run(&mut self, scheduler: &mut dyn Scheduler, fresh: bool) {
		self.state = LoopState::Running;
		self.last_tick_ms = scheduler.now();
		if fresh {
			self.elapsed_ms = 0.0;
		}
		self.request_frame(scheduler);
		self.start_spawner(scheduler, fresh);
	}

	fn request_frame(&mut self, scheduler: &mut dyn Scheduler) {
		if self.frame.is_some() {
			return;
		}
		self.frame = scheduler.request_frame();
		if self.frame.is_none() {
			debug!("lumen-fx: host refused an animation frame");
		}
	}

	fn start_spawner(&mut self, scheduler: &mut dyn Scheduler, spawn_now: bool) {
		if self.is_spawning() {
			return;
		}
		let Some(schedule) = self.effect.spawn_schedule() else {
			return;
		};
		let mut spawner = SpawnController::new(schedule);
		spawner.start(scheduler);
		self.spawner = Some(spawner);
		if spawn_now {
			let scene = self.scene();
			self.effect.spawn_one(scene, &mut self.events);
		}
	}

	/// Cancels the pending frame and the spawn timer. Safe to call repeatedly.
	fn halt_schedule(&mut self, scheduler: &mut dyn Scheduler) {
		if let Some(frame) = self.frame.take() {
			scheduler.cancel_frame(frame);
		}
		if let Some(mut spawner) = self.spawner.take() {
			spawner.stop(scheduler);
		}
	}

	fn complete(&mut self, scheduler: &mut dyn Scheduler) {
		self.halt_schedule(scheduler);
		self.effect.halt();
		self.surface.wipe();
		self.state = LoopState::Idle;
		self.events.push(EffectEvent::Completed);
	}

	fn enter_static(&mut self) {
		self.state = LoopState::Static;
		self.paint_static();
	}

	fn paint_static(&mut self) {
		let scene = self.scene();
		self.surface.wipe();
		if let Some(ctx) = self.surface.draw_context() {
			self.effect.render_static(ctx, scene);
		}
	}

	/// Redraws the current frame when nothing else will.
	fn repaint(&mut self) {
		match self.state {
			LoopState::Static => self.paint_static(),
			LoopState::Paused => {
				let scene = self.scene();
				self.surface.wipe();
				if let Some(ctx) = self.surface.draw_context() {
					self.effect.render(ctx, scene);
					self.effect.render_links(ctx, scene);
				}
			}
			LoopState::Idle | LoopState::Running => {}
		}
	}
}
