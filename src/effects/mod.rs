//! The particle-style effect families and their configuration.
//!
//! Each module pairs a strongly typed entity with an [`Effect`](crate::engine::Effect)
//! implementation and a kebab-case serde configuration record whose
//! defaults match the stock widget.

pub mod constellation;
pub mod explosion;
pub mod fireflies;
pub mod matrix;
pub mod shooting_star;

pub use constellation::{Constellation, ConstellationConfig};
pub use explosion::{Explosion, ExplosionConfig};
pub use fireflies::{Fireflies, FirefliesConfig};
pub use matrix::{MatrixConfig, MatrixRain};
pub use shooting_star::{ShootingStars, ShootingStarsConfig};

use serde::{Deserialize, Deserializer};

/// Configuration for every effect on a page, as read from one JSON document.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EffectSettings {
	pub explosion: ExplosionConfig,
	pub fireflies: FirefliesConfig,
	pub matrix: MatrixConfig,
	pub shooting_stars: ShootingStarsConfig,
	pub constellation: ConstellationConfig,
}

impl EffectSettings {
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str::<Self>(text).map(Self::normalized)
	}

	pub fn normalized(self) -> Self {
		Self {
			explosion: self.explosion.normalized(),
			fireflies: self.fireflies.normalized(),
			matrix: self.matrix.normalized(),
			shooting_stars: self.shooting_stars.normalized(),
			constellation: self.constellation.normalized(),
		}
	}
}

/// Most entities any effect holds at once.
pub const MAX_POPULATION: usize = 10_000;

/// Longest trail, in points or glyphs.
pub const MAX_TRAIL: usize = 500;

/// How many of `count` requested entities fit next to `len` existing ones.
pub(crate) fn headroom(len: usize, count: usize) -> usize {
	MAX_POPULATION.saturating_sub(len).min(count)
}

/// Accepts any JSON number as a population count: fractions are floored,
/// negatives and non-finite values become zero.
pub(crate) fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
	let raw = f64::deserialize(deserializer)?;
	Ok(if raw.is_finite() && raw > 0.0 {
		raw.floor() as usize
	} else {
		0
	})
}

/// `value` if finite and at least `min`, else `fallback`.
pub(crate) fn at_least(value: f64, min: f64, fallback: f64) -> f64 {
	if value.is_finite() && value >= min {
		value
	} else {
		fallback
	}
}
