use std::collections::HashMap;

use log::debug;

use super::{AudioSink, SizeRange};
use crate::config::AudioConfig;

/// Global enable flag, per-primitive spacing and the post-resume mute window.
///
/// All decisions use wall-clock timestamps in milliseconds, so a burst of
/// calls inside one frame is throttled the same way regardless of order.
#[derive(Clone, Debug, Default)]
pub struct AudioGate {
	enabled: bool,
	hidden: bool,
	muted_until: f64,
	last_pluck: Option<f64>,
	last_sine: Option<f64>,
	last_edge_sine: HashMap<String, f64>,
}

impl AudioGate {
	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	fn open(&self, now: f64) -> bool {
		self.enabled && !self.hidden && now >= self.muted_until
	}

	fn spaced(last: Option<f64>, now: f64, interval: f64) -> bool {
		last.is_none_or(|at| now - at >= interval)
	}

	pub fn allow_pluck(&mut self, now: f64, config: &AudioConfig) -> bool {
		if !self.open(now) || !Self::spaced(self.last_pluck, now, config.pluck_interval_ms) {
			return false;
		}
		self.last_pluck = Some(now);
		true
	}

	/// The per-edge cooldown is charged even when the global gate then
	/// drops the tone, so a hovered edge cannot queue up retries.
	pub fn allow_edge_sine(&mut self, edge_id: &str, now: f64, config: &AudioConfig) -> bool {
		let last = self.last_edge_sine.get(edge_id).copied();
		if !Self::spaced(last, now, config.edge_cooldown_ms) {
			return false;
		}
		self.last_edge_sine.insert(edge_id.to_string(), now);
		self.allow_sine(now, config)
	}

	pub fn allow_sine(&mut self, now: f64, config: &AudioConfig) -> bool {
		if !self.open(now) || !Self::spaced(self.last_sine, now, config.sine_interval_ms) {
			return false;
		}
		self.last_sine = Some(now);
		true
	}

	fn resumed(&mut self, now: f64, config: &AudioConfig) {
		self.muted_until = now + config.resume_mute_ms;
	}
}

/// The simulation's only way to make noise.
pub struct SoundBoard {
	config: AudioConfig,
	gate: AudioGate,
	sink: Box<dyn AudioSink>,
}

impl SoundBoard {
	pub fn new(config: AudioConfig, sink: Box<dyn AudioSink>) -> Self {
		Self {
			config,
			gate: AudioGate::default(),
			sink,
		}
	}

	pub fn config(&self) -> &AudioConfig {
		&self.config
	}

	pub fn is_enabled(&self) -> bool {
		self.gate.is_enabled()
	}

	/// Turns sound on after a user gesture. Opens the mute window.
	pub fn enable(&mut self, now: f64) {
		if self.gate.enabled {
			return;
		}
		if self.sink.resume() {
			self.gate.enabled = true;
			self.gate.resumed(now, &self.config);
			debug!("sound enabled");
		}
	}

	/// Page visibility changed. Output only comes back if sound was enabled.
	pub fn set_hidden(&mut self, hidden: bool, now: f64) {
		if self.gate.hidden == hidden {
			return;
		}
		self.gate.hidden = hidden;
		if !self.gate.enabled {
			return;
		}
		if hidden {
			self.sink.suspend();
		} else if self.sink.resume() {
			self.gate.resumed(now, &self.config);
		}
	}

	pub fn pluck(&mut self, size: f64, range: SizeRange, now: f64) -> bool {
		if !self.gate.allow_pluck(now, &self.config) {
			return false;
		}
		self.sink.play_pluck(size, range);
		true
	}

	pub fn edge_sine(&mut self, edge_id: &str, frequency_hz: f64, now: f64) -> bool {
		if !self.gate.allow_edge_sine(edge_id, now, &self.config) {
			return false;
		}
		self.sink.play_sine(frequency_hz);
		true
	}
}
