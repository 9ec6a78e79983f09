//! Geometry of the vibrating strings and impulse rings. No drawing here;
//! `render` turns these shapes into canvas calls.

use std::collections::HashMap;
use std::f64::consts::PI;

use super::wave::Oscillator;

pub const MIN_SEGMENTS: usize = 12;
pub const MAX_SEGMENTS: usize = 26;
pub const MOTION_BOOST_CAP: f64 = 7.0;
const MOTION_GAIN: f64 = 140.0;
const SEGMENT_LENGTH: f64 = 18.0;
const MIN_STRING_LENGTH: f64 = 2.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		(other.x - self.x).hypot(other.y - self.y)
	}
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
	a + (b - a) * t
}

/// Frame-to-frame node speed (px/ms), used to bow strings whose endpoints
/// are being dragged or are still settling.
#[derive(Clone, Debug, Default)]
pub struct NodeMotion {
	previous: HashMap<String, Point>,
	speed: HashMap<String, f64>,
	last_sample: Option<f64>,
}

impl NodeMotion {
	pub fn sample<'a>(&mut self, positions: impl IntoIterator<Item = (&'a str, Point)>, ts: f64) {
		let dt = self
			.last_sample
			.map(|last| (ts - last).clamp(8.0, 40.0))
			.unwrap_or(16.0);
		self.last_sample = Some(ts);
		self.speed.clear();
		for (id, pos) in positions {
			let speed = self
				.previous
				.get(id)
				.map(|prev| prev.distance(pos) / dt)
				.unwrap_or(0.0);
			self.speed.insert(id.to_string(), speed);
			self.previous.insert(id.to_string(), pos);
		}
	}

	pub fn speed(&self, id: &str) -> f64 {
		self.speed.get(id).copied().unwrap_or(0.0)
	}

	/// Combined endpoint motion mapped to a bounded boost.
	pub fn boost(&self, from: &str, to: &str) -> f64 {
		((self.speed(from) + self.speed(to)) * MOTION_GAIN).min(MOTION_BOOST_CAP)
	}
}

/// One edge drawn as a bowed, oscillating polyline between the rims of its
/// endpoint nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct StringShape {
	pub start: Point,
	pub end: Point,
	pub normal: Point,
	pub length: f64,
	pub segments: usize,
	pub bow: f64,
	pub wave: f64,
	pub phase: f64,
}

impl StringShape {
	/// `None` when the endpoints overlap too closely to draw anything.
	pub fn new(
		from: Point,
		to: Point,
		from_radius: f64,
		to_radius: f64,
		motion_boost: f64,
		osc: Oscillator,
	) -> Option<Self> {
		let (dx, dy) = (to.x - from.x, to.y - from.y);
		let raw = dx.hypot(dy);
		if !raw.is_finite() || raw < MIN_STRING_LENGTH {
			return None;
		}
		let (ux, uy) = (dx / raw, dy / raw);
		let start = Point::new(from.x + ux * from_radius, from.y + uy * from_radius);
		let end = Point::new(to.x - ux * to_radius, to.y - uy * to_radius);
		let length = start.distance(end);
		if length < MIN_STRING_LENGTH {
			return None;
		}

		let boost = motion_boost.clamp(0.0, MOTION_BOOST_CAP);
		Some(Self {
			start,
			end,
			normal: Point::new(-uy, ux),
			length,
			segments: ((length / SEGMENT_LENGTH).round() as usize).clamp(MIN_SEGMENTS, MAX_SEGMENTS),
			bow: (length * 0.012 + boost * 0.45).clamp(2.2, 13.0),
			wave: osc.amplitude * 7.5 + boost * 0.22,
			phase: osc.phase,
		})
	}

	/// Perpendicular displacement at `t` in `[0, 1]`; zero at both ends.
	pub fn offset_at(&self, t: f64) -> f64 {
		let envelope = (PI * t).sin();
		self.bow * envelope + (t * PI * 2.2 + self.phase).sin() * self.wave * envelope
	}

	pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
		(0..=self.segments).map(move |i| {
			let t = i as f64 / self.segments as f64;
			let offset = self.offset_at(t);
			Point::new(
				lerp(self.start.x, self.end.x, t) + self.normal.x * offset,
				lerp(self.start.y, self.end.y, t) + self.normal.y * offset,
			)
		})
	}
}

/// Two concentric halos around a ringing node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImpulseRings {
	pub inner_radius: f64,
	pub outer_radius: f64,
	pub inner_alpha: f64,
	pub outer_alpha: f64,
}

impl ImpulseRings {
	pub fn new(base_radius: f64, osc: Oscillator) -> Self {
		let amp = osc.amplitude;
		let wobble = osc.phase.sin() * (0.8 + amp * 0.4);
		Self {
			inner_radius: base_radius + 2.2 + amp * 2.3 + wobble,
			outer_radius: base_radius + 6.2 + amp * 3.6 + wobble * 1.1,
			inner_alpha: (0.34 + amp * 0.18).clamp(0.2, 0.72),
			outer_alpha: (0.16 + amp * 0.1).clamp(0.08, 0.42),
		}
	}
}

/// Shortest distance from `p` to the segment `a`–`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len_sq = dx * dx + dy * dy;
	if len_sq < f64::EPSILON {
		return p.distance(a);
	}
	let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
	p.distance(Point::new(a.x + dx * t, a.y + dy * t))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn still() -> Oscillator {
		Oscillator::default()
	}

	#[test]
	fn string_is_shrunk_by_node_radii() {
		let shape =
			StringShape::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 10.0, 5.0, 0.0, still())
				.unwrap();
		assert_eq!(shape.start, Point::new(10.0, 0.0));
		assert_eq!(shape.end, Point::new(95.0, 0.0));
		assert_eq!(shape.normal, Point::new(-0.0, 1.0));
		assert_eq!(shape.segments, MIN_SEGMENTS);
	}

	#[test]
	fn ends_are_pinned_and_middle_bows() {
		let osc = Oscillator {
			amplitude: 2.0,
			phase: 0.7,
		};
		let shape =
			StringShape::new(Point::new(0.0, 0.0), Point::new(600.0, 0.0), 0.0, 0.0, 3.0, osc)
				.unwrap();
		assert!(shape.offset_at(0.0).abs() < 1e-9);
		assert!(shape.offset_at(1.0).abs() < 1e-9);
		assert_eq!(shape.segments, MAX_SEGMENTS);
		let points: Vec<_> = shape.points().collect();
		assert_eq!(points.len(), shape.segments + 1);
		assert!((points[0].y).abs() < 1e-9);
		assert!((points[shape.segments].x - 600.0).abs() < 1e-9);
	}

	#[test]
	fn bow_grows_with_motion_and_is_bounded() {
		let (a, b) = (Point::new(0.0, 0.0), Point::new(100.0, 0.0));
		let calm = StringShape::new(a, b, 0.0, 0.0, 0.0, still()).unwrap();
		let moving = StringShape::new(a, b, 0.0, 0.0, 50.0, still()).unwrap();
		assert_eq!(calm.bow, 2.2);
		assert!(moving.bow > calm.bow);
		assert!(moving.bow <= 13.0);
		assert!((moving.wave - MOTION_BOOST_CAP * 0.22).abs() < 1e-9);
	}

	#[test]
	fn overlapping_endpoints_are_skipped() {
		let p = Point::new(5.0, 5.0);
		assert!(StringShape::new(p, Point::new(6.0, 5.0), 0.0, 0.0, 0.0, still()).is_none());
		assert!(StringShape::new(p, Point::new(25.0, 5.0), 10.0, 10.0, 0.0, still()).is_none());
	}

	#[test]
	fn motion_is_capped() {
		let mut motion = NodeMotion::default();
		motion.sample([("a", Point::new(0.0, 0.0)), ("b", Point::new(0.0, 0.0))], 0.0);
		assert_eq!(motion.boost("a", "b"), 0.0);
		motion.sample([("a", Point::new(16.0, 0.0)), ("b", Point::new(0.0, 0.0))], 16.0);
		assert!((motion.speed("a") - 1.0).abs() < 1e-9);
		assert_eq!(motion.boost("a", "b"), MOTION_BOOST_CAP);
		assert_eq!(motion.speed("missing"), 0.0);
	}

	#[test]
	fn rings_scale_with_amplitude() {
		let quiet = ImpulseRings::new(10.0, Oscillator { amplitude: 0.1, phase: 0.0 });
		let loud = ImpulseRings::new(10.0, Oscillator { amplitude: 3.0, phase: 0.0 });
		assert!(loud.inner_radius > quiet.inner_radius);
		assert!(loud.outer_radius > loud.inner_radius);
		assert!(loud.inner_alpha <= 0.72 && loud.outer_alpha <= 0.42);
	}

	#[test]
	fn segment_distance() {
		let (a, b) = (Point::new(0.0, 0.0), Point::new(10.0, 0.0));
		assert_eq!(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
		assert_eq!(distance_to_segment(Point::new(-4.0, 3.0), a, b), 5.0);
		assert_eq!(distance_to_segment(Point::new(1.0, 1.0), a, a), 2f64.sqrt());
	}
}
