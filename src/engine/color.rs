//! Colors and palettes shared by every effect.
//!
//! Configuration carries colors as CSS strings; they are parsed once into
//! [`Color`] so that per-tick drawing only formats, never parses.

use log::warn;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use super::rng::EffectRng;

/// Reasons a CSS color string could not be understood.
#[derive(Debug, Error, PartialEq)]
pub enum ColorError {
	#[error("unrecognized color syntax `{0}`")]
	Syntax(String),
	#[error("color component out of range in `{0}`")]
	Component(String),
}

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const WHITE: Color = Color::rgb(255, 255, 255);
	pub const BLACK: Color = Color::rgb(0, 0, 0);
	pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Replaces the alpha channel, clamped to [0, 1].
	pub fn with_alpha(self, a: f64) -> Self {
		Self {
			a: clamp_unit(a),
			..self
		}
	}

	/// Parses `#rgb`, `#rrggbb`, `rgb(r, g, b)`, `rgba(r, g, b, a)` or `transparent`.
	pub fn parse(input: &str) -> Result<Self, ColorError> {
		let text = input.trim();
		if text.eq_ignore_ascii_case("transparent") {
			return Ok(Self::TRANSPARENT);
		}
		if let Some(hex) = text.strip_prefix('#') {
			return parse_hex(hex).ok_or_else(|| ColorError::Syntax(input.to_string()));
		}
		let lower = text.to_ascii_lowercase();
		let body = lower
			.strip_prefix("rgba(")
			.or_else(|| lower.strip_prefix("rgb("))
			.and_then(|rest| rest.strip_suffix(')'))
			.ok_or_else(|| ColorError::Syntax(input.to_string()))?;

		let parts: Vec<&str> = body.split(',').map(str::trim).collect();
		if parts.len() != 3 && parts.len() != 4 {
			return Err(ColorError::Syntax(input.to_string()));
		}
		let channel = |s: &str| -> Result<u8, ColorError> {
			s.parse::<u8>()
				.map_err(|_| ColorError::Component(input.to_string()))
		};
		let alpha = match parts.get(3) {
			Some(s) => s
				.parse::<f64>()
				.ok()
				.filter(|a| (0.0..=1.0).contains(a))
				.ok_or_else(|| ColorError::Component(input.to_string()))?,
			None => 1.0,
		};
		Ok(Self::rgba(
			channel(parts[0])?,
			channel(parts[1])?,
			channel(parts[2])?,
			alpha,
		))
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

fn parse_hex(hex: &str) -> Option<Color> {
	if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
		return None;
	}
	match hex.len() {
		3 => {
			let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
			Some(Color::rgb(digit(0)?, digit(1)?, digit(2)?))
		}
		6 => {
			let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
			Some(Color::rgb(pair(0)?, pair(2)?, pair(4)?))
		}
		_ => None,
	}
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
	if value.is_nan() {
		0.0
	} else {
		value.clamp(0.0, 1.0)
	}
}

impl<'de> Deserialize<'de> for Color {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		Color::parse(&raw).map_err(serde::de::Error::custom)
	}
}

/// An ordered set of colors that entities draw from at creation time.
///
/// Never empty: constructors fall back to white when given nothing usable.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
	colors: Vec<Color>,
}

impl Palette {
	pub fn new(colors: Vec<Color>) -> Self {
		if colors.is_empty() {
			Self {
				colors: vec![Color::WHITE],
			}
		} else {
			Self { colors }
		}
	}

	/// Parses CSS color strings, skipping (and logging) the ones that fail.
	pub fn from_css<S: AsRef<str>>(entries: &[S]) -> Self {
		let colors = entries
			.iter()
			.filter_map(|entry| match Color::parse(entry.as_ref()) {
				Ok(color) => Some(color),
				Err(err) => {
					warn!("lumen-fx: skipping palette entry: {err}");
					None
				}
			})
			.collect();
		Self::new(colors)
	}

	pub fn colors(&self) -> &[Color] {
		&self.colors
	}

	pub fn len(&self) -> usize {
		self.colors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.colors.is_empty()
	}

	/// Uniformly random member of the palette.
	pub fn pick(&self, rng: &mut EffectRng) -> Color {
		self.colors[rng.index(self.colors.len())]
	}
}

impl<'de> Deserialize<'de> for Palette {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = Vec::<String>::deserialize(deserializer)?;
		Ok(Palette::from_css(&raw))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_hex_forms() {
		assert_eq!(Color::parse("#ff6b6b"), Ok(Color::rgb(255, 107, 107)));
		assert_eq!(Color::parse("#0f0"), Ok(Color::rgb(0, 255, 0)));
		assert!(Color::parse("#12345").is_err());
		assert!(Color::parse("#gg0000").is_err());
	}

	#[test]
	fn parses_functional_notation() {
		assert_eq!(Color::parse("rgb(1, 2, 3)"), Ok(Color::rgb(1, 2, 3)));
		assert_eq!(
			Color::parse("rgba(10, 20, 30, 0.5)"),
			Ok(Color::rgba(10, 20, 30, 0.5))
		);
		assert!(matches!(
			Color::parse("rgb(300, 0, 0)"),
			Err(ColorError::Component(_))
		));
		assert!(matches!(Color::parse("hsl(1, 2, 3)"), Err(ColorError::Syntax(_))));
	}

	#[test]
	fn css_output_drops_alpha_when_opaque() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(
			Color::rgb(255, 0, 16).with_alpha(0.25).to_css(),
			"rgba(255, 0, 16, 0.25)"
		);
	}

	#[test]
	fn alpha_is_clamped() {
		assert_eq!(Color::WHITE.with_alpha(3.0).a, 1.0);
		assert_eq!(Color::WHITE.with_alpha(-1.0).a, 0.0);
		assert_eq!(Color::WHITE.with_alpha(f64::NAN).a, 0.0);
	}

	#[test]
	fn palette_skips_invalid_entries_and_never_empties() {
		let palette = Palette::from_css(&["#ffffff", "nope", "#000"]);
		assert_eq!(palette.len(), 2);

		let fallback = Palette::from_css::<&str>(&[]);
		assert_eq!(fallback.colors(), &[Color::WHITE]);
	}

	#[test]
	fn palette_deserializes_leniently() {
		let palette: Palette = serde_json::from_str(r##"["#ff0000", "bad"]"##).unwrap();
		assert_eq!(palette.colors(), &[Color::rgb(255, 0, 0)]);
	}
}
