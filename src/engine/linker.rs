//! Faded connective lines between nearby entities.
//!
//! Pairwise and O(n²); fine for the populations these effects use (tens to
//! low hundreds of points).

use super::entity::Point;

/// Two pool indices close enough to connect, `a < b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
	pub a: usize,
	pub b: usize,
	/// `(1 - distance / max_distance) × base_opacity`
	pub strength: f64,
}

fn strength(distance: f64, max_distance: f64, base_opacity: f64) -> Option<f64> {
	(distance < max_distance).then(|| (1.0 - distance / max_distance) * base_opacity)
}

/// Links every pair closer than `max_distance`. Pairs at or beyond it are
/// absent from the result.
pub fn compute_links(points: &[Point], max_distance: f64, base_opacity: f64) -> Vec<Link> {
	let mut links = Vec::new();
	if max_distance <= 0.0 {
		return links;
	}
	for (a, pa) in points.iter().enumerate() {
		for (offset, pb) in points[a + 1..].iter().enumerate() {
			if let Some(strength) = strength(pa.distance(*pb), max_distance, base_opacity) {
				links.push(Link {
					a,
					b: a + 1 + offset,
					strength,
				});
			}
		}
	}
	links
}

/// Link from one entity to the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerLink {
	pub index: usize,
	pub strength: f64,
}

pub fn pointer_links(
	points: &[Point],
	pointer: Point,
	max_distance: f64,
	base_opacity: f64,
) -> Vec<PointerLink> {
	if max_distance <= 0.0 {
		return Vec::new();
	}
	points
		.iter()
		.enumerate()
		.filter_map(|(index, p)| {
			strength(p.distance(pointer), max_distance, base_opacity)
				.map(|strength| PointerLink { index, strength })
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn distant_pairs_are_absent() {
		let points = [Point::new(0.0, 0.0), Point::new(150.0, 0.0)];
		assert!(compute_links(&points, 100.0, 0.3).is_empty());
	}

	#[test]
	fn strength_falls_off_linearly() {
		let points = [Point::new(0.0, 0.0), Point::new(30.0, 40.0)];
		let links = compute_links(&points, 100.0, 0.3);
		assert_eq!(links.len(), 1);
		assert_eq!((links[0].a, links[0].b), (0, 1));
		assert!((links[0].strength - 0.15).abs() < 1e-12);
	}

	#[test]
	fn exactly_max_distance_is_not_linked() {
		let points = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
		assert!(compute_links(&points, 100.0, 1.0).is_empty());
	}

	#[test]
	fn each_pair_appears_once() {
		let points = [
			Point::new(0.0, 0.0),
			Point::new(10.0, 0.0),
			Point::new(20.0, 0.0),
		];
		let links = compute_links(&points, 100.0, 1.0);
		let pairs: Vec<(usize, usize)> = links.iter().map(|l| (l.a, l.b)).collect();
		assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
	}

	#[test]
	fn pointer_links_use_their_own_range() {
		let points = [Point::new(0.0, 0.0), Point::new(500.0, 0.0)];
		let links = pointer_links(&points, Point::new(90.0, 0.0), 180.0, 0.5);
		assert_eq!(links.len(), 1);
		assert_eq!(links[0].index, 0);
		assert!((links[0].strength - 0.25).abs() < 1e-12);
	}
}
