//! lumen-fx: canvas particle effects for Leptos.
//!
//! The [`engine`] simulates and renders populations of particles against an
//! abstract surface and scheduler; [`effects`] defines the five effect
//! families; [`components`] hosts them on HTML canvases in the browser.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;
pub mod effects;
pub mod engine;

pub use components::effect_canvas::{
	Constellation, EffectControl, Explosion, Fireflies, MatrixRain, ShootingStars,
};
pub use effects::{
	ConstellationConfig, EffectSettings, ExplosionConfig, FirefliesConfig, MatrixConfig,
	ShootingStarsConfig,
};
pub use engine::{EffectCommand, EffectEvent, Point};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("lumen-fx: logging initialized");
}

const EVENT_LOG_LEN: usize = 8;

const GALLERY_CSS: &str = "
body { margin: 0; background: #05050f; color: #ddd; font-family: sans-serif; }
.gallery { display: grid; grid-template-columns: repeat(auto-fill, minmax(360px, 1fr)); gap: 1rem; padding: 1rem; }
.stage { position: relative; height: 260px; background: #000; border-radius: 6px; overflow: hidden; }
.event-log { grid-column: 1 / -1; font-family: monospace; font-size: 0.8rem; }
";

/// Load effect settings from a script element with id="effect-config".
/// Sections that are absent fall back to defaults.
fn load_settings() -> Option<EffectSettings> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("effect-config")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match EffectSettings::from_json(&json_text) {
		Ok(settings) => {
			info!("lumen-fx: loaded effect settings");
			Some(settings)
		}
		Err(e) => {
			warn!("lumen-fx: failed to parse effect settings: {}", e);
			None
		}
	}
}

/// Demo gallery: every effect in its own panel, with a few controls and a
/// log of the lifecycle events they report.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let settings = load_settings().unwrap_or_default();
	let log = RwSignal::new(Vec::<String>::new());
	let record = move |source: &'static str| {
		Callback::new(move |event: EffectEvent| {
			log.update(|entries| {
				entries.insert(0, format!("{source}: {event:?}"));
				entries.truncate(EVENT_LOG_LEN);
			});
		})
	};

	let burst = EffectControl::new();
	let swarm = EffectControl::new();
	let rain = EffectControl::new();
	let sky = EffectControl::new();
	let night = EffectControl::new();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="lumen-fx" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />
		<Style>{GALLERY_CSS}</Style>

		<main class="gallery">
			<section class="panel">
				<h2>"Explosion"</h2>
				<div class="stage">
					<Explosion config=settings.explosion control=burst on_event=record("explosion") />
				</div>
				<button on:click=move |_| burst.trigger(None)>"Burst"</button>
			</section>

			<section class="panel">
				<h2>"Fireflies"</h2>
				<div class="stage">
					<Fireflies config=settings.fireflies control=swarm on_event=record("fireflies") />
				</div>
				<button on:click=move |_| swarm.toggle()>"Pause / resume"</button>
				<button on:click=move |_| swarm.add(10)>"+10"</button>
				<button on:click=move |_| swarm.remove(10)>"-10"</button>
			</section>

			<section class="panel">
				<h2>"Matrix rain"</h2>
				<div class="stage">
					<MatrixRain config=settings.matrix control=rain on_event=record("matrix") />
				</div>
				<button on:click=move |_| rain.toggle()>"Pause / resume"</button>
				<button on:click=move |_| rain.set_characters("01")>"Binary"</button>
			</section>

			<section class="panel">
				<h2>"Shooting stars"</h2>
				<div class="stage">
					<ShootingStars config=settings.shooting_stars control=night on_event=record("shooting-stars") />
				</div>
				<button on:click=move |_| night.trigger(None)>"Launch"</button>
				<button on:click=move |_| night.clear()>"Clear"</button>
			</section>

			<section class="panel">
				<h2>"Constellation"</h2>
				<div class="stage">
					<Constellation config=settings.constellation control=sky on_event=record("constellation") />
				</div>
				<button on:click=move |_| sky.toggle()>"Pause / resume"</button>
				<button on:click=move |_| sky.reset()>"Reset"</button>
			</section>

			<ol class="event-log">
				<For
					each=move || log.get().into_iter().enumerate()
					key=|(i, entry)| (*i, entry.clone())
					children=move |(_, entry)| view! { <li>{entry}</li> }
				/>
			</ol>
		</main>
	}
}
