//! Browser-independent particle engine.
//!
//! Entities live in an [`EntityPool`](pool::EntityPool) owned by an
//! [`Effect`](effect::Effect). An [`AnimationLoop`](animation::AnimationLoop)
//! drives one effect against a [`SurfaceManager`](surface::SurfaceManager),
//! using whatever [`Scheduler`](schedule::Scheduler) the host hands it.

pub mod animation;
pub mod color;
pub mod effect;
pub mod entity;
pub mod events;
pub mod interaction;
pub mod linker;
pub mod pool;
pub mod rng;
pub mod schedule;
pub mod spawn;
pub mod surface;

#[cfg(test)]
pub(crate) mod testing;

pub use animation::{AnimationLoop, LoopState};
pub use color::{Color, ColorError, Palette};
pub use effect::{Effect, Playback, Scene, TimeBase};
pub use entity::{Entity, Point};
pub use events::{EffectCommand, EffectEvent, Selection};
pub use schedule::{FrameHandle, Scheduler, TimerHandle};
pub use surface::{Bounds, ClearMode, Surface};
