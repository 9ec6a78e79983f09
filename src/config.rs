//! Tunable constants for the simulation, audio and anchoring subsystems.
//!
//! Every group deserializes with `#[serde(default)]`, so a graph
//! configuration may override any subset under its `tuning` key.

use serde::Deserialize;

/// All tunables, grouped by subsystem.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Tuning {
	/// Wave/impulse simulator.
	pub wave: WaveConfig,
	/// Pluck and sine synthesis plus rate limiting.
	pub audio: AudioConfig,
	/// Scroll/context anchoring.
	pub anchor: AnchorConfig,
}

/// Oscillator decay and pointer mapping. Time units are milliseconds.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WaveConfig {
	/// Exponential amplitude decay rate of an edge oscillator, per millisecond.
	pub edge_damping: f64,
	/// Exponential amplitude decay rate of a node oscillator, per millisecond.
	pub node_damping: f64,
	/// Phase advance of an edge oscillator per millisecond.
	pub edge_speed: f64,
	/// Phase advance of a node oscillator per millisecond.
	pub node_speed: f64,
	/// Weakest impulse an edge accepts.
	pub edge_min_strength: f64,
	/// Strongest impulse an edge accepts.
	pub edge_max_strength: f64,
	/// Weakest impulse a node accepts.
	pub node_min_strength: f64,
	/// Strongest impulse a node accepts.
	pub node_max_strength: f64,
	/// Factor applied to a node impulse when it propagates to incident edges.
	pub chain_factor: f64,
	/// Below this an oscillator is inert and no longer advanced.
	pub inert_epsilon: f64,
	/// Above this an oscillator keeps the frame loop alive.
	pub active_threshold: f64,
	/// Shortest frame duration fed to the simulation.
	pub min_frame_ms: f64,
	/// Longest frame duration fed to the simulation.
	pub max_frame_ms: f64,
	/// Duration assumed for the first frame.
	pub default_frame_ms: f64,
	/// Weight of the newest pointer sample in the smoothed speed.
	pub pointer_blend: f64,
	/// Smoothed speed kept when the pointer leaves the map.
	pub pointer_leave_decay: f64,
	/// Impulse strength of a motionless pointer.
	pub pointer_base: f64,
	/// Impulse strength added per unit of pointer speed.
	pub pointer_gain: f64,
	/// Lower clamp of pointer impulse strength.
	pub pointer_min_strength: f64,
	/// Upper clamp of pointer impulse strength.
	pub pointer_max_strength: f64,
	/// Hovering the same node again within this window is ignored.
	pub node_hover_dedupe_ms: f64,
	/// Factor applied to pointer strength when an edge is hovered.
	pub edge_hover_factor: f64,
}

impl Default for WaveConfig {
	fn default() -> Self {
		Self {
			edge_damping: 0.0105,
			node_damping: 0.009,
			edge_speed: 0.018,
			node_speed: 0.02,
			edge_min_strength: 0.18,
			edge_max_strength: 3.2,
			node_min_strength: 0.2,
			node_max_strength: 3.4,
			chain_factor: 0.95,
			inert_epsilon: 0.001,
			active_threshold: 0.03,
			min_frame_ms: 8.0,
			max_frame_ms: 40.0,
			default_frame_ms: 16.0,
			pointer_blend: 0.38,
			pointer_leave_decay: 0.35,
			pointer_base: 0.28,
			pointer_gain: 5.4,
			pointer_min_strength: 0.25,
			pointer_max_strength: 3.4,
			node_hover_dedupe_ms: 120.0,
			edge_hover_factor: 0.85,
		}
	}
}

/// Synthesis shapes and anti-spam windows.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
	/// Length of a pluck buffer in samples.
	pub pluck_samples: usize,
	/// Fade-in length of a pluck in samples.
	pub pluck_attack_samples: usize,
	/// Shortest fade-out of a pluck in samples.
	pub pluck_min_release_samples: usize,
	/// Gain of a pluck before the mix.
	pub pluck_output_gain: f64,
	/// Length of the generated reverb impulse response.
	pub reverb_duration_sec: f64,
	/// Exponent of the reverb tail's decay.
	pub reverb_decay: f64,
	/// Share of the unprocessed signal in the output.
	pub dry_mix: f64,
	/// Share of the reverberated signal in the output.
	pub wet_mix: f64,
	/// Output gain after the mix.
	pub master_gain: f64,
	/// Lowest edge tone frequency.
	pub sine_min_hz: f64,
	/// Highest edge tone frequency.
	pub sine_max_hz: f64,
	/// Ramp-up time of an edge tone.
	pub sine_attack_sec: f64,
	/// Ramp-down time of an edge tone.
	pub sine_release_sec: f64,
	/// Peak gain of an edge tone.
	pub sine_gain: f64,
	/// Minimum spacing between any two plucks.
	pub pluck_interval_ms: f64,
	/// Minimum spacing between any two sine tones.
	pub sine_interval_ms: f64,
	/// Minimum spacing between two sine tones from the same edge.
	pub edge_cooldown_ms: f64,
	/// Silence after the context (re)starts.
	pub resume_mute_ms: f64,
	/// Maximum size boost added to a node's size when it plucks.
	pub pluck_size_boost: f64,
}

impl Default for AudioConfig {
	fn default() -> Self {
		Self {
			pluck_samples: 4096,
			pluck_attack_samples: 24,
			pluck_min_release_samples: 420,
			pluck_output_gain: 0.1,
			reverb_duration_sec: 3.8,
			reverb_decay: 1.3,
			dry_mix: 0.77,
			wet_mix: 0.23,
			master_gain: 0.9,
			sine_min_hz: 160.0,
			sine_max_hz: 880.0,
			sine_attack_sec: 0.01,
			sine_release_sec: 0.22,
			sine_gain: 0.022,
			pluck_interval_ms: 24.0,
			sine_interval_ms: 18.0,
			edge_cooldown_ms: 82.0,
			resume_mute_ms: 180.0,
			pluck_size_boost: 4.0,
		}
	}
}

/// Anchoring passes, epsilons and device-width limits. Lengths are pixels.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnchorConfig {
	/// Residual under which a marker counts as aligned.
	pub epsilon_px: f64,
	/// Outer settle passes, one per frame, before a jump gives up.
	pub max_settle_passes: u32,
	/// Correction rounds inside one alignment call.
	pub internal_passes: u32,
	/// Upper bound of either spacer.
	pub max_spacer_px: f64,
	/// Scroll range reserved while a desktop jump settles.
	pub virtual_scroll_min_px: f64,
	/// Inset that keeps shifted blocks off the pane edges.
	pub pane_padding_px: f64,
	/// Shifts smaller than this snap back to zero.
	pub snap_px: f64,
	/// Scroll corrections smaller than this are skipped.
	pub min_scroll_delta_px: f64,
	/// Viewport width below which mobile shift limits apply.
	pub mobile_width_px: f64,
	/// Viewport width below which tablet shift limits apply.
	pub tablet_width_px: f64,
	/// Viewport width from which the context preview is shown.
	pub desktop_preview_width_px: f64,
}

impl Default for AnchorConfig {
	fn default() -> Self {
		Self {
			epsilon_px: 0.26,
			max_settle_passes: 10,
			internal_passes: 3,
			max_spacer_px: 6000.0,
			virtual_scroll_min_px: 260.0,
			pane_padding_px: 6.0,
			snap_px: 0.35,
			min_scroll_delta_px: 0.2,
			mobile_width_px: 680.0,
			tablet_width_px: 960.0,
			desktop_preview_width_px: 1200.0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_tuning_keeps_defaults() {
		let tuning: Tuning =
			serde_json::from_str(r#"{ "wave": { "edge_damping": 0.02 } }"#).unwrap();
		assert_eq!(tuning.wave.edge_damping, 0.02);
		assert_eq!(tuning.wave.node_damping, WaveConfig::default().node_damping);
		assert_eq!(tuning.audio, AudioConfig::default());
		assert_eq!(tuning.anchor.max_settle_passes, 10);
	}
}
