use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use rand::Rng;

use crate::config::WaveConfig;

/// Decaying `(amplitude, phase)` pair driving one node or edge.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Oscillator {
	pub amplitude: f64,
	pub phase: f64,
}

impl Oscillator {
	/// Reinforce with a clamped impulse. A louder ring is never replaced by a
	/// softer one. Returns the clamped impulse.
	pub fn excite(&mut self, strength: f64, min: f64, max: f64, jitter: f64) -> f64 {
		let impulse = clamp_strength(strength, min, max);
		self.amplitude = self.amplitude.max(impulse);
		self.phase += jitter;
		impulse
	}

	/// Exponential decay plus phase advance. Inert oscillators stay put.
	pub fn advance(&mut self, dt_ms: f64, damping: f64, speed: f64, inert_epsilon: f64) {
		if self.amplitude > inert_epsilon {
			self.amplitude *= (-dt_ms * damping).exp();
			self.phase += dt_ms * speed;
		}
	}

	pub fn is_ringing(&self, threshold: f64) -> bool {
		self.amplitude > threshold
	}
}

fn clamp_strength(strength: f64, min: f64, max: f64) -> f64 {
	if strength.is_finite() {
		strength.clamp(min, max)
	} else {
		min
	}
}

/// Node and edge ids currently lit by a text marker. Always replaced whole.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightSet {
	pub node_ids: HashSet<String>,
	pub edge_ids: HashSet<String>,
}

impl HighlightSet {
	pub fn is_empty(&self) -> bool {
		self.node_ids.is_empty() && self.edge_ids.is_empty()
	}
}

/// Per-entity oscillators and the highlighted path. Lives as long as one
/// loaded graph; oscillators are created lazily on first impulse.
#[derive(Debug)]
pub struct WaveField<R> {
	config: WaveConfig,
	nodes: HashMap<String, Oscillator>,
	edges: HashMap<String, Oscillator>,
	highlight: HighlightSet,
	rng: R,
}

impl<R: Rng> WaveField<R> {
	pub fn new(config: WaveConfig, rng: R) -> Self {
		Self {
			config,
			nodes: HashMap::new(),
			edges: HashMap::new(),
			highlight: HighlightSet::default(),
			rng,
		}
	}

	pub fn config(&self) -> &WaveConfig {
		&self.config
	}

	fn fresh(rng: &mut R) -> Oscillator {
		Oscillator {
			amplitude: 0.0,
			phase: rng.gen_range(0.0..PI * 2.0),
		}
	}

	/// Returns the clamped impulse actually applied.
	pub fn excite_edge(&mut self, edge_id: &str, strength: f64) -> f64 {
		let jitter = self.rng.gen_range(0.0..PI * 0.8);
		let rng = &mut self.rng;
		let osc = self
			.edges
			.entry(edge_id.to_string())
			.or_insert_with(|| Self::fresh(rng));
		osc.excite(
			strength,
			self.config.edge_min_strength,
			self.config.edge_max_strength,
			jitter,
		)
	}

	/// Returns the clamped impulse actually applied.
	pub fn excite_node(&mut self, node_id: &str, strength: f64) -> f64 {
		let jitter = self.rng.gen_range(0.0..PI * 1.1);
		let rng = &mut self.rng;
		let osc = self
			.nodes
			.entry(node_id.to_string())
			.or_insert_with(|| Self::fresh(rng));
		osc.excite(
			strength,
			self.config.node_min_strength,
			self.config.node_max_strength,
			jitter,
		)
	}

	/// Advances every oscillator by one frame. Returns whether any is still
	/// audible/visible above the activity threshold.
	pub fn advance(&mut self, dt_ms: f64) -> bool {
		let c = &self.config;
		let mut active = false;
		for osc in self.edges.values_mut() {
			osc.advance(dt_ms, c.edge_damping, c.edge_speed, c.inert_epsilon);
			active |= osc.is_ringing(c.active_threshold);
		}
		for osc in self.nodes.values_mut() {
			osc.advance(dt_ms, c.node_damping, c.node_speed, c.inert_epsilon);
			active |= osc.is_ringing(c.active_threshold);
		}
		active
	}

	pub fn is_active(&self) -> bool {
		let threshold = self.config.active_threshold;
		self.edges
			.values()
			.chain(self.nodes.values())
			.any(|osc| osc.is_ringing(threshold))
	}

	pub fn edge(&self, edge_id: &str) -> Oscillator {
		self.edges.get(edge_id).copied().unwrap_or_default()
	}

	pub fn node(&self, node_id: &str) -> Oscillator {
		self.nodes.get(node_id).copied().unwrap_or_default()
	}

	/// Nodes ringing above the activity threshold.
	pub fn ringing_nodes(&self) -> impl Iterator<Item = (&str, Oscillator)> {
		let threshold = self.config.active_threshold;
		self.nodes
			.iter()
			.filter(move |(_, osc)| osc.is_ringing(threshold))
			.map(|(id, osc)| (id.as_str(), *osc))
	}

	pub fn set_highlight<I, J>(&mut self, edge_ids: I, node_ids: J)
	where
		I: IntoIterator<Item = String>,
		J: IntoIterator<Item = String>,
	{
		self.highlight = HighlightSet {
			edge_ids: edge_ids.into_iter().collect(),
			node_ids: node_ids.into_iter().collect(),
		};
	}

	pub fn clear_highlight(&mut self) {
		self.highlight = HighlightSet::default();
	}

	pub fn highlight(&self) -> &HighlightSet {
		&self.highlight
	}
}

/// Exponentially smoothed pointer speed in px/ms.
#[derive(Clone, Debug, Default)]
pub struct PointerSpeed {
	speed: f64,
	last: Option<(f64, f64, f64)>,
}

impl PointerSpeed {
	pub fn down(&mut self, x: f64, y: f64, now_ms: f64) {
		self.last = Some((x, y, now_ms));
		self.speed = 0.0;
	}

	pub fn moved(&mut self, x: f64, y: f64, now_ms: f64, config: &WaveConfig) {
		if let Some((lx, ly, at)) = self.last {
			let dt = (now_ms - at).max(config.min_frame_ms);
			let instant = (x - lx).hypot(y - ly) / dt;
			self.speed =
				self.speed * (1.0 - config.pointer_blend) + instant * config.pointer_blend;
		}
		self.last = Some((x, y, now_ms));
	}

	pub fn left(&mut self, config: &WaveConfig) {
		self.speed *= config.pointer_leave_decay;
	}

	pub fn speed(&self) -> f64 {
		self.speed
	}

	pub fn impulse_strength(&self, config: &WaveConfig) -> f64 {
		(config.pointer_base + self.speed * config.pointer_gain)
			.clamp(config.pointer_min_strength, config.pointer_max_strength)
	}
}
