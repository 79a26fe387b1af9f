//! Leptos components hosting each effect on its own canvas.
//!
//! Every component renders a block canvas filling its parent, which must
//! have a size. The effect is built and mounted once the canvas exists, and
//! torn down with every browser handle it holds when the component unmounts.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use leptos::prelude::*;
use log::warn;
use web_sys::{HtmlCanvasElement, MouseEvent};

use super::control::EffectControl;
use super::host::{EffectHost, release};
use crate::effects::{
	self, ConstellationConfig, ExplosionConfig, FirefliesConfig, MatrixConfig, ShootingStarsConfig,
};
use crate::engine::{Effect as VisualEffect, EffectEvent};

const CANVAS_STYLE: &str = "display: block; width: 100%; height: 100%;";

/// Fresh seed per mounted effect.
fn seed() -> u64 {
	(js_sys::Math::random() * 9_007_199_254_740_992.0) as u64
}

fn effect_canvas<E: VisualEffect + 'static>(
	name: &'static str,
	build: impl FnOnce(u64) -> E + 'static,
	control: Option<EffectControl>,
	on_event: Option<Callback<EffectEvent>>,
	class: &'static str,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let host: Rc<RefCell<Option<Rc<EffectHost<E>>>>> = Rc::new(RefCell::new(None));
	// Zero until mounted; ids start at one.
	let host_id = Arc::new(AtomicU64::new(0));
	let mut build = Some(build);

	let (host_init, id_init) = (host.clone(), host_id.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(build) = build.take() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		match EffectHost::mount(name, canvas, build(seed()), on_event) {
			Ok(mounted) => {
				id_init.store(mounted.id(), Ordering::Relaxed);
				if let Some(control) = control {
					for command in control.take() {
						mounted.apply(command);
					}
				}
				*host_init.borrow_mut() = Some(mounted);
			}
			Err(e) => warn!("lumen-fx: {name} not mounted: {e}"),
		}
	});
	on_cleanup(move || release(host_id.load(Ordering::Relaxed)));

	if let Some(control) = control {
		let host_cmd = host.clone();
		Effect::new(move |_| {
			control.track();
			// Commands sent before mounting wait in the queue.
			let Some(mounted) = host_cmd.borrow().clone() else {
				return;
			};
			for command in control.take() {
				mounted.apply(command);
			}
		});
	}

	let host_mm = host.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(h) = host_mm.borrow().as_ref() {
			h.pointer_move(ev.client_x() as f64, ev.client_y() as f64);
		}
	};

	let host_ml = host.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(h) = host_ml.borrow().as_ref() {
			h.pointer_leave();
		}
	};

	let host_click = host;
	let on_click = move |ev: MouseEvent| {
		let mounted = host_click.borrow().clone();
		if let Some(h) = mounted {
			h.click(ev.client_x() as f64, ev.client_y() as f64);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class=class
			on:mousemove=on_mousemove
			on:mouseleave=on_mouseleave
			on:click=on_click
			style=CANVAS_STYLE
		/>
	}
}

/// A one-shot particle burst. Fires on click (unless disabled) or on
/// [`EffectControl::trigger`].
#[component]
pub fn Explosion(
	#[prop(optional)] config: ExplosionConfig,
	#[prop(optional)] control: Option<EffectControl>,
	#[prop(optional, into)] on_event: Option<Callback<EffectEvent>>,
) -> impl IntoView {
	effect_canvas(
		"explosion",
		move |seed| effects::Explosion::new(config, seed),
		control,
		on_event,
		"lumen-explosion",
	)
}

/// Ambient fireflies. Interactive ones drift toward the pointer and report
/// clicks as [`EffectEvent::Selected`].
#[component]
pub fn Fireflies(
	#[prop(optional)] config: FirefliesConfig,
	#[prop(optional)] control: Option<EffectControl>,
	#[prop(optional, into)] on_event: Option<Callback<EffectEvent>>,
) -> impl IntoView {
	effect_canvas(
		"fireflies",
		move |seed| effects::Fireflies::new(config, seed),
		control,
		on_event,
		"lumen-fireflies",
	)
}

/// Falling glyph columns over a fading black backdrop.
#[component]
pub fn MatrixRain(
	#[prop(optional)] config: MatrixConfig,
	#[prop(optional)] control: Option<EffectControl>,
	#[prop(optional, into)] on_event: Option<Callback<EffectEvent>>,
) -> impl IntoView {
	effect_canvas(
		"matrix-rain",
		move |seed| effects::MatrixRain::new(config, seed),
		control,
		on_event,
		"lumen-matrix-rain",
	)
}

/// Shooting stars spawned on an interval, optionally over a field of
/// background stars.
#[component]
pub fn ShootingStars(
	#[prop(optional)] config: ShootingStarsConfig,
	#[prop(optional)] control: Option<EffectControl>,
	#[prop(optional, into)] on_event: Option<Callback<EffectEvent>>,
) -> impl IntoView {
	effect_canvas(
		"shooting-stars",
		move |seed| effects::ShootingStars::new(config, seed),
		control,
		on_event,
		"lumen-shooting-stars",
	)
}

/// Drifting stars linked by proximity, and to the pointer when interactive.
#[component]
pub fn Constellation(
	#[prop(optional)] config: ConstellationConfig,
	#[prop(optional)] control: Option<EffectControl>,
	#[prop(optional, into)] on_event: Option<Callback<EffectEvent>>,
) -> impl IntoView {
	effect_canvas(
		"constellation",
		move |seed| effects::Constellation::new(config, seed),
		control,
		on_event,
		"lumen-constellation",
	)
}
