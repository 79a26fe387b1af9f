//! Ordered, exclusively-owned collection of entities for one effect instance.

use super::entity::{Entity, Point, StepContext};
use super::surface::Surface;

/// Outcome of one bulk advance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdvanceReport {
	/// Entities that crossed from alive to dead during this pass.
	pub died: usize,
	/// Entities dropped from the pool during this pass.
	pub removed: usize,
}

/// Ordered population of one entity type.
///
/// Pool order is creation order: rendering, hit testing and reclaiming all
/// walk it front to back. A bounded pool treats its capacity as a ceiling on
/// the population and only allocates for entities actually inserted.
pub struct EntityPool<E> {
	entities: Vec<E>,
	capacity: Option<usize>,
}

impl<E: Entity> EntityPool<E> {
	/// Pool with no population ceiling (fixed-population effects).
	pub fn unbounded() -> Self {
		Self {
			entities: Vec::new(),
			capacity: None,
		}
	}

	/// Pool that never holds more than `capacity` entities.
	pub fn bounded(capacity: usize) -> Self {
		Self {
			entities: Vec::new(),
			capacity: Some(capacity),
		}
	}

	pub fn len(&self) -> usize {
		self.entities.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}

	pub fn is_full(&self) -> bool {
		self.capacity.is_some_and(|max| self.entities.len() >= max)
	}

	pub fn iter(&self) -> impl Iterator<Item = &E> {
		self.entities.iter()
	}

	pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut E> {
		self.entities.iter_mut()
	}

	pub fn get(&self, index: usize) -> Option<&E> {
		self.entities.get(index)
	}

	pub fn clear(&mut self) {
		self.entities.clear();
	}

	/// Replaces the population with `count` fresh entities (capped).
	pub fn populate(&mut self, count: usize, factory: impl FnMut(usize) -> E) {
		self.entities.clear();
		self.extend(count, factory);
	}

	/// Appends up to `count` entities, stopping at the ceiling.
	/// Returns how many were added.
	pub fn extend(&mut self, count: usize, mut factory: impl FnMut(usize) -> E) -> usize {
		let room = self
			.capacity
			.map_or(count, |max| max.saturating_sub(self.entities.len()).min(count));
		let start = self.entities.len();
		self.entities.extend((start..start.saturating_add(room)).map(&mut factory));
		room
	}

	/// Inserts one entity, handing it back when the pool is full.
	pub fn insert(&mut self, entity: E) -> Result<usize, E> {
		if self.is_full() {
			return Err(entity);
		}
		self.entities.push(entity);
		Ok(self.entities.len() - 1)
	}

	/// Removes up to `count` of the oldest entities. Returns how many went.
	pub fn remove_front(&mut self, count: usize) -> usize {
		let n = count.min(self.entities.len());
		self.entities.drain(..n);
		n
	}

	/// Keeps the first `len` entities.
	pub fn truncate(&mut self, len: usize) {
		self.entities.truncate(len);
	}

	/// Frees the first dead slot (in pool order), even if its trail is still
	/// rendering. Returns whether a slot was freed.
	pub fn reclaim(&mut self) -> bool {
		match self.entities.iter().position(|e| !e.is_alive()) {
			Some(index) => {
				self.entities.remove(index);
				true
			}
			None => false,
		}
	}

	/// Advances every entity, then filters out drained ones when the entity
	/// type's edge policy destroys the dead.
	pub fn advance(
		&mut self,
		dt: f64,
		params: &E::Params,
		cx: &mut StepContext<'_>,
	) -> AdvanceReport {
		let mut report = AdvanceReport::default();
		for entity in &mut self.entities {
			let was_alive = entity.is_alive();
			let alive = entity.advance(dt, params, cx);
			if was_alive && !alive {
				report.died += 1;
			}
		}
		if E::EDGE_POLICY.removes_dead() {
			let before = self.entities.len();
			self.entities.retain(|e| !e.is_drained());
			report.removed = before - self.entities.len();
		}
		report
	}

	pub fn render(&self, surface: &mut dyn Surface, params: &E::Params) {
		for entity in &self.entities {
			entity.render(surface, params);
		}
	}

	/// Maps every entity onto a resized surface; identity is preserved.
	pub fn rescale(&mut self, sx: f64, sy: f64) {
		for entity in &mut self.entities {
			entity.rescale(sx, sy);
		}
	}

	/// First entity in pool order whose hit radius contains `at`.
	pub fn hit_test(&self, at: Point) -> Option<usize> {
		self.entities
			.iter()
			.position(|e| e.position().distance(at) < e.hit_radius())
	}

	pub fn positions(&self) -> Vec<Point> {
		self.entities.iter().map(Entity::position).collect()
	}
}
