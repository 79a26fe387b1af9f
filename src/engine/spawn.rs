//! Rate-limited entity production.
//!
//! The controller owns the repeating timer; the pool decides whether a new
//! entity fits. Backpressure is lossy: a spawn that finds the pool full and
//! nothing reclaimable is dropped, never queued.

use log::debug;

use super::entity::Entity;
use super::pool::EntityPool;
use super::rng::EffectRng;
use super::schedule::{Scheduler, TimerHandle};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnSchedule {
	pub interval_ms: u32,
	/// Chance that any single interval produces an entity.
	pub probability: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnOutcome {
	Inserted,
	/// A dead slot was freed to make room.
	Reclaimed,
	Dropped,
}

impl SpawnOutcome {
	pub fn spawned(self) -> bool {
		!matches!(self, SpawnOutcome::Dropped)
	}
}

/// Owns the spawn interval of a running loop. Starting twice keeps one
/// timer; stopping releases it.
pub struct SpawnController {
	schedule: SpawnSchedule,
	handle: Option<TimerHandle>,
}

impl SpawnController {
	pub fn new(schedule: SpawnSchedule) -> Self {
		Self {
			schedule,
			handle: None,
		}
	}

	pub fn is_running(&self) -> bool {
		self.handle.is_some()
	}

	/// Starts the interval timer. A second call while running is a no-op.
	pub fn start(&mut self, scheduler: &mut dyn Scheduler) -> bool {
		if self.handle.is_some() {
			return false;
		}
		self.handle = scheduler.start_interval(self.schedule.interval_ms.max(1));
		if self.handle.is_none() {
			debug!("lumen-fx: host refused a spawn interval");
		}
		self.handle.is_some()
	}

	pub fn stop(&mut self, scheduler: &mut dyn Scheduler) {
		if let Some(handle) = self.handle.take() {
			scheduler.cancel_interval(handle);
		}
	}

	/// Per-interval random gate.
	pub fn gate(&self, rng: &mut EffectRng) -> bool {
		rng.chance(self.schedule.probability)
	}
}

/// Places `entity` in the pool, reclaiming a dead slot when full.
pub fn admit<E: Entity>(pool: &mut EntityPool<E>, entity: E) -> SpawnOutcome {
	if !pool.is_full() {
		return match pool.insert(entity) {
			Ok(_) => SpawnOutcome::Inserted,
			Err(_) => SpawnOutcome::Dropped,
		};
	}
	if !pool.reclaim() {
		debug!("lumen-fx: pool full ({}), spawn dropped", pool.len());
		return SpawnOutcome::Dropped;
	}
	match pool.insert(entity) {
		Ok(_) => SpawnOutcome::Reclaimed,
		Err(_) => SpawnOutcome::Dropped,
	}
}
