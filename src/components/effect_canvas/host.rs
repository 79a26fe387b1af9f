//! Binds one [`AnimationLoop`] to a canvas element and the browser's timers
//! and observers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use leptos::prelude::*;
use log::{info, warn};
use web_sys::{HtmlCanvasElement, Window};

use super::canvas::{CanvasSurface, SurfaceError};
use super::scheduler::BrowserScheduler;
use super::watch::{ReducedMotionWatcher, SizeWatcher, measure};
use crate::engine::{AnimationLoop, Effect, EffectCommand, EffectEvent, Point};

static NEXT_HOST_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
	// Cleanup callbacks must be Send, hosts are not, so cleanup goes by id.
	static HOSTS: RefCell<HashMap<u64, Rc<dyn Release>>> = RefCell::new(HashMap::new());
}

trait Release {
	fn release(&self);
}

/// Tears down the host registered under `id`, if it is still mounted.
pub fn release(id: u64) {
	let host = HOSTS.with(|hosts| hosts.borrow_mut().remove(&id));
	if let Some(host) = host {
		host.release();
	}
}

struct Driven<E> {
	looper: AnimationLoop<E, CanvasSurface>,
	scheduler: BrowserScheduler,
}

pub struct EffectHost<E> {
	id: u64,
	name: &'static str,
	window: Window,
	canvas: HtmlCanvasElement,
	driven: RefCell<Driven<E>>,
	motion: RefCell<Option<ReducedMotionWatcher>>,
	size: RefCell<Option<SizeWatcher>>,
	on_event: Option<Callback<EffectEvent>>,
}

impl<E: Effect + 'static> EffectHost<E> {
	/// Attaches `effect` to `canvas`, sized by the canvas' own layout box,
	/// and starts it according to its playback settings.
	pub fn mount(
		name: &'static str,
		canvas: HtmlCanvasElement,
		effect: E,
		on_event: Option<Callback<EffectEvent>>,
	) -> Result<Rc<Self>, SurfaceError> {
		let window = web_sys::window().ok_or(SurfaceError::NoWindow)?;
		let surface = CanvasSurface::new(canvas.clone())?;

		let host = Rc::new_cyclic(|weak: &Weak<Self>| {
			let (frame, interval) = (weak.clone(), weak.clone());
			let scheduler = BrowserScheduler::new(
				window.clone(),
				move |_| {
					if let Some(host) = frame.upgrade() {
						host.drive(|looper, scheduler| looper.tick(scheduler));
					}
				},
				move || {
					if let Some(host) = interval.upgrade() {
						host.drive(|looper, scheduler| looper.on_interval(scheduler));
					}
				},
			);
			let mut looper = AnimationLoop::new(effect);
			looper.surface_mut().attach(surface);
			Self {
				id: NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed),
				name,
				window: window.clone(),
				canvas,
				driven: RefCell::new(Driven { looper, scheduler }),
				motion: RefCell::new(None),
				size: RefCell::new(None),
				on_event,
			}
		});

		let weak = Rc::downgrade(&host);
		let motion = ReducedMotionWatcher::new(&host.window, move |reduced| {
			if let Some(host) = weak.upgrade() {
				host.drive(|looper, scheduler| looper.set_reduced_motion(reduced, scheduler));
			}
		});
		let prefers_reduced = motion.as_ref().is_some_and(ReducedMotionWatcher::matches);
		*host.motion.borrow_mut() = motion;

		host.drive(|looper, scheduler| looper.mount(prefers_reduced, scheduler));
		host.measure();

		let weak = Rc::downgrade(&host);
		*host.size.borrow_mut() = SizeWatcher::new(&host.canvas, move || {
			if let Some(host) = weak.upgrade() {
				host.measure();
			}
		});

		HOSTS.with(|hosts| {
			hosts
				.borrow_mut()
				.insert(host.id, host.clone() as Rc<dyn Release>)
		});
		info!("lumen-fx: mounted {} (host {})", host.name, host.id);
		Ok(host)
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	/// Runs `f` against the loop, then hands queued events to the listener
	/// once the loop is no longer borrowed.
	fn drive(&self, f: impl FnOnce(&mut AnimationLoop<E, CanvasSurface>, &mut BrowserScheduler)) {
		let events = {
			let Ok(mut driven) = self.driven.try_borrow_mut() else {
				warn!("lumen-fx: {} re-entered while busy, call dropped", self.name);
				return;
			};
			let Driven { looper, scheduler } = &mut *driven;
			f(looper, scheduler);
			looper.take_events()
		};
		if let Some(on_event) = self.on_event {
			for event in events {
				on_event.run(event);
			}
		}
	}

	fn measure(&self) {
		let bounds = measure(&self.canvas).bounds();
		let ratio = self.window.device_pixel_ratio();
		self.drive(|looper, scheduler| looper.resize(bounds, ratio, scheduler));
	}

	fn local(&self, client_x: f64, client_y: f64) -> Point {
		measure(&self.canvas).to_local(Point::new(client_x, client_y))
	}

	pub fn pointer_move(&self, client_x: f64, client_y: f64) {
		let at = self.local(client_x, client_y);
		self.drive(|looper, _| looper.pointer_move(at));
	}

	pub fn pointer_leave(&self) {
		self.drive(|looper, _| looper.pointer_leave());
	}

	pub fn click(&self, client_x: f64, client_y: f64) {
		let at = self.local(client_x, client_y);
		self.drive(|looper, scheduler| looper.click(at, scheduler));
	}

	pub fn apply(&self, command: EffectCommand) {
		self.drive(|looper, scheduler| looper.apply(command, scheduler));
	}
}

impl<E: Effect + 'static> Release for EffectHost<E> {
	fn release(&self) {
		self.size.borrow_mut().take();
		self.motion.borrow_mut().take();
		match self.driven.try_borrow_mut() {
			Ok(mut driven) => {
				let Driven { looper, scheduler } = &mut *driven;
				looper.teardown(scheduler);
				looper.surface_mut().detach();
			}
			Err(_) => warn!("lumen-fx: {} busy during teardown", self.name),
		}
		info!("lumen-fx: released {} (host {})", self.name, self.id);
	}
}
