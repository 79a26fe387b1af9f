//! Browser glue: canvas surface, timers, observers and the Leptos components
//! that host each effect.
//!
//! # Example
//!
//! ```ignore
//! use lumen_fx::{EffectControl, Fireflies, FirefliesConfig};
//!
//! let control = EffectControl::new();
//! view! {
//!     <div style="height: 400px">
//!         <Fireflies config=FirefliesConfig { interactive: true, ..Default::default() } control=control />
//!     </div>
//!     <button on:click=move |_| control.toggle()>"Pause"</button>
//! }
//! ```

mod canvas;
mod component;
mod control;
mod host;
mod scheduler;
mod watch;

pub use canvas::{CanvasSurface, SurfaceError};
pub use component::{Constellation, Explosion, Fireflies, MatrixRain, ShootingStars};
pub use control::EffectControl;
