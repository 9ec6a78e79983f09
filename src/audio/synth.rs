//! Sample-level synthesis shared by the Web Audio backend.

use std::f64::consts::PI;

use rand::Rng;

use super::SizeRange;
use crate::config::AudioConfig;

/// Position of `size` inside `range`, clamped to `[0, 1]`.
pub fn size_to_unit(size: f64, range: SizeRange) -> f64 {
	if !size.is_finite() {
		return 0.0;
	}
	let span = (range.max - range.min).max(0.001);
	((size - range.min) / span).clamp(0.0, 1.0)
}

/// Loudness, release and pitch of one pluck. Bigger sources ring longer,
/// louder and lower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PluckVoice {
	pub release_samples: usize,
	pub gain: f64,
	pub frequency: f64,
}

impl PluckVoice {
	pub fn new(config: &AudioConfig, size: f64, range: SizeRange) -> Self {
		let amount = size_to_unit(size, range);
		let release_max = config
			.pluck_samples
			.saturating_sub(config.pluck_attack_samples)
			.max(config.pluck_min_release_samples);
		let min = config.pluck_min_release_samples as f64;
		Self {
			release_samples: (min + (release_max as f64 - min) * amount).round() as usize,
			gain: (0.06 + 0.18 * amount) * config.pluck_output_gain,
			frequency: 170.0 + 330.0 * (1.0 - amount),
		}
	}

	/// Damped sine carrier blended with fast-decaying noise, shaped by a
	/// linear attack and linear release.
	pub fn render<R: Rng>(&self, config: &AudioConfig, sample_rate: f64, rng: &mut R) -> Vec<f32> {
		let attack = config.pluck_attack_samples.max(1);
		let release = self.release_samples.max(1) as f64;
		let two_pi_f = PI * 2.0 * self.frequency;

		(0..config.pluck_samples)
			.map(|i| {
				let t = i as f64 / sample_rate;
				let carrier = (two_pi_f * t).sin() * (-(i as f64) / 1900.0).exp();
				let noise = rng.gen_range(-1.0..1.0) * (-(i as f64) / 320.0).exp();
				let body = carrier * 0.76 + noise * 0.28;
				let env = if i < attack {
					i as f64 / attack as f64
				} else {
					(1.0 - (i - attack) as f64 / release).max(0.0)
				};
				(body * env) as f32
			})
			.collect()
	}
}

/// One channel of the reverb's noise impulse response.
pub fn impulse_response<R: Rng>(config: &AudioConfig, sample_rate: f64, rng: &mut R) -> Vec<f32> {
	let length = ((sample_rate * config.reverb_duration_sec).floor() as usize).max(1);
	(0..length)
		.map(|i| {
			let t = i as f64 / length as f64;
			(rng.gen_range(-1.0..1.0) * (1.0 - t).powf(config.reverb_decay)) as f32
		})
		.collect()
}

/// Clamps a requested tone into the audible band; garbage becomes A4.
pub fn clamp_sine_hz(config: &AudioConfig, hz: f64) -> f64 {
	let hz = if hz.is_finite() { hz } else { 440.0 };
	hz.clamp(config.sine_min_hz, config.sine_max_hz)
}

/// Longer strings sound lower. Stronger impulses bend the pitch slightly up.
pub fn edge_length_to_hz(length_px: f64, strength: f64) -> f64 {
	let normalized = ((length_px - 60.0) / 520.0).clamp(0.0, 1.0);
	let base = 860.0 + (190.0 - 860.0) * normalized;
	base * (1.0 + ((strength - 1.0) * 0.045).clamp(-0.1, 0.14))
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;

	const RANGE: SizeRange = SizeRange {
		min: 10.0,
		max: 24.0,
	};

	#[test]
	fn bigger_plucks_are_louder_longer_lower() {
		let config = AudioConfig::default();
		let small = PluckVoice::new(&config, 10.0, RANGE);
		let big = PluckVoice::new(&config, 24.0, RANGE);
		assert_eq!(small.release_samples, 420);
		assert_eq!(big.release_samples, 4096 - 24);
		assert!(big.gain > small.gain);
		assert!(big.frequency < small.frequency);
		assert_eq!(PluckVoice::new(&config, f64::NAN, RANGE), small);
	}

	#[test]
	fn pluck_envelope_starts_silent_and_stays_bounded() {
		let config = AudioConfig::default();
		let voice = PluckVoice::new(&config, 12.0, RANGE);
		let samples = voice.render(&config, 48_000.0, &mut StdRng::seed_from_u64(3));
		assert_eq!(samples.len(), 4096);
		assert_eq!(samples[0], 0.0);
		assert!(samples.iter().all(|s| s.abs() <= 1.04));
		assert!(samples[voice.release_samples + 24..].iter().all(|s| *s == 0.0));
	}

	#[test]
	fn reverb_tail_fades_out() {
		let config = AudioConfig::default();
		let ir = impulse_response(&config, 1000.0, &mut StdRng::seed_from_u64(1));
		assert!((ir.len() as i64 - 3800).abs() <= 1);
		let head: f32 = ir[..100].iter().map(|s| s.abs()).sum();
		let tail: f32 = ir[ir.len() - 100..].iter().map(|s| s.abs()).sum();
		assert!(tail < head);
	}

	#[test]
	fn edge_pitch_mapping() {
		assert_eq!(edge_length_to_hz(10.0, 1.0), 860.0);
		assert_eq!(edge_length_to_hz(1000.0, 1.0), 190.0);
		assert!(edge_length_to_hz(200.0, 3.0) > edge_length_to_hz(200.0, 1.0));
		let config = AudioConfig::default();
		assert_eq!(clamp_sine_hz(&config, edge_length_to_hz(10.0, 9.0)), 880.0);
		assert_eq!(clamp_sine_hz(&config, f64::INFINITY), 440.0);
		assert_eq!(clamp_sine_hz(&config, 20.0), 160.0);
	}
}
