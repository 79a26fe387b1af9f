use leptos::prelude::*;

use crate::engine::{EffectCommand, Palette, Point};

/// Remote control for a mounted effect component.
///
/// Create one in the parent, pass it as the `control` prop and keep a copy
/// to send commands. Commands sent before the canvas mounts are applied once
/// it does.
#[derive(Clone, Copy)]
pub struct EffectControl {
	queue: RwSignal<Vec<EffectCommand>>,
}

impl Default for EffectControl {
	fn default() -> Self {
		Self::new()
	}
}

impl EffectControl {
	pub fn new() -> Self {
		Self {
			queue: RwSignal::new(Vec::new()),
		}
	}

	pub fn send(&self, command: EffectCommand) {
		self.queue.update(|queue| queue.push(command));
	}

	/// Subscribes the running reactive context to new commands.
	pub(crate) fn track(&self) {
		self.queue.track();
	}

	/// Everything queued since the last call, without notifying subscribers.
	pub(crate) fn take(&self) -> Vec<EffectCommand> {
		self.queue
			.try_update_untracked(std::mem::take)
			.unwrap_or_default()
	}

	pub fn pause(&self) {
		self.send(EffectCommand::Pause);
	}

	pub fn resume(&self) {
		self.send(EffectCommand::Resume);
	}

	pub fn toggle(&self) {
		self.send(EffectCommand::Toggle);
	}

	pub fn reset(&self) {
		self.send(EffectCommand::Reset);
	}

	/// Fires at a surface-local point, or the effect's default origin.
	pub fn trigger(&self, at: Option<Point>) {
		self.send(EffectCommand::Trigger(at));
	}

	pub fn add(&self, count: usize) {
		self.send(EffectCommand::Add(count));
	}

	pub fn remove(&self, count: usize) {
		self.send(EffectCommand::Remove(count));
	}

	pub fn set_palette(&self, palette: Palette) {
		self.send(EffectCommand::SetPalette(palette));
	}

	pub fn set_characters(&self, characters: impl Into<String>) {
		self.send(EffectCommand::SetCharacters(characters.into()));
	}

	pub fn clear(&self) {
		self.send(EffectCommand::Clear);
	}
}
