//! Browser observers feeding host state into a mounted effect. Each one
//! detaches its listener when dropped.

use log::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, MediaQueryList, ResizeObserver, Window};

use crate::engine::interaction::SurfaceRect;

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Follows the `prefers-reduced-motion` media query.
pub struct ReducedMotionWatcher {
	query: MediaQueryList,
	listener: Closure<dyn FnMut(Event)>,
}

impl ReducedMotionWatcher {
	/// `None` when the browser does not support the query.
	pub fn new(window: &Window, mut on_change: impl FnMut(bool) + 'static) -> Option<Self> {
		let query = window.match_media(REDUCED_MOTION_QUERY).ok().flatten()?;
		let observed = query.clone();
		let listener = Closure::<dyn FnMut(Event)>::new(move |_: Event| on_change(observed.matches()));
		if let Err(e) =
			query.add_event_listener_with_callback("change", listener.as_ref().unchecked_ref())
		{
			warn!("lumen-fx: cannot watch reduced-motion preference: {e:?}");
		}
		Some(Self { query, listener })
	}

	pub fn matches(&self) -> bool {
		self.query.matches()
	}
}

impl Drop for ReducedMotionWatcher {
	fn drop(&mut self) {
		let _ = self
			.query
			.remove_event_listener_with_callback("change", self.listener.as_ref().unchecked_ref());
	}
}

/// Reports the logical size of an element whenever it changes.
pub struct SizeWatcher {
	observer: ResizeObserver,
	_callback: Closure<dyn FnMut()>,
}

impl SizeWatcher {
	pub fn new(target: &Element, on_resize: impl FnMut() + 'static) -> Option<Self> {
		let callback = Closure::<dyn FnMut()>::new(on_resize);
		let observer = match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
			Ok(observer) => observer,
			Err(e) => {
				warn!("lumen-fx: ResizeObserver unavailable: {e:?}");
				return None;
			}
		};
		observer.observe(target);
		Some(Self {
			observer,
			_callback: callback,
		})
	}
}

impl Drop for SizeWatcher {
	fn drop(&mut self) {
		self.observer.disconnect();
	}
}

/// Layout box of `element` in CSS pixels. Pass the canvas, not its
/// container: the container's box includes its padding and border.
pub fn measure(element: &Element) -> SurfaceRect {
	let rect = element.get_bounding_client_rect();
	SurfaceRect {
		left: rect.left(),
		top: rect.top(),
		width: rect.width(),
		height: rect.height(),
	}
}
