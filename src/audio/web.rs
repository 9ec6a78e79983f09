//! Web Audio backend: buffer-source plucks and oscillator tones routed
//! through a dry/wet convolution reverb, a compressor acting as a safety
//! limiter, and a master gain.

use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::JsValue;
use web_sys::{
	AudioContext, AudioContextState, AudioNode, DynamicsCompressorNode, GainNode, OscillatorType,
};

use super::synth::{PluckVoice, clamp_sine_hz, impulse_response};
use super::{AudioSink, SizeRange};
use crate::config::AudioConfig;

/// Entry point of the shared effect bus.
struct Bus {
	input: GainNode,
	_limiter: DynamicsCompressorNode,
	_master: GainNode,
}

pub struct WebAudio {
	config: AudioConfig,
	context: Option<AudioContext>,
	bus: Option<Bus>,
	rng: StdRng,
}

impl WebAudio {
	pub fn new(config: AudioConfig, seed: u64) -> Self {
		Self {
			config,
			context: None,
			bus: None,
			rng: StdRng::seed_from_u64(seed),
		}
	}

	fn context(&mut self) -> Option<AudioContext> {
		if self.context.is_none() {
			match AudioContext::new() {
				Ok(ctx) => {
					info!("audio context created at {} Hz", ctx.sample_rate());
					self.context = Some(ctx);
				}
				Err(err) => {
					warn!("audio unavailable: {err:?}");
					return None;
				}
			}
		}
		self.context.clone()
	}

	fn running(&self) -> Option<AudioContext> {
		self.context
			.clone()
			.filter(|ctx| ctx.state() == AudioContextState::Running)
	}

	fn bus_input(&mut self, ctx: &AudioContext) -> Option<GainNode> {
		if self.bus.is_none() {
			match self.build_bus(ctx) {
				Ok(bus) => self.bus = Some(bus),
				Err(err) => {
					warn!("audio bus setup failed: {err:?}");
					return None;
				}
			}
		}
		self.bus.as_ref().map(|bus| bus.input.clone())
	}

	fn build_bus(&mut self, ctx: &AudioContext) -> Result<Bus, JsValue> {
		let c = &self.config;
		let input = ctx.create_gain()?;
		let dry = ctx.create_gain()?;
		let wet = ctx.create_gain()?;
		let convolver = ctx.create_convolver()?;
		let limiter = ctx.create_dynamics_compressor()?;
		let master = ctx.create_gain()?;

		let rate = ctx.sample_rate();
		let mut left = impulse_response(c, rate as f64, &mut self.rng);
		let mut right = impulse_response(c, rate as f64, &mut self.rng);
		let ir = ctx.create_buffer(2, left.len() as u32, rate)?;
		ir.copy_to_channel(&mut left, 0)?;
		ir.copy_to_channel(&mut right, 1)?;
		convolver.set_buffer(Some(&ir));

		dry.gain().set_value(c.dry_mix as f32);
		wet.gain().set_value(c.wet_mix as f32);
		limiter.threshold().set_value(-10.0);
		limiter.knee().set_value(6.0);
		limiter.ratio().set_value(12.0);
		limiter.attack().set_value(0.003);
		limiter.release().set_value(0.25);
		master.gain().set_value(c.master_gain as f32);

		let limiter_node: &AudioNode = &limiter;
		input.connect_with_audio_node(&dry)?;
		input.connect_with_audio_node(&convolver)?;
		convolver.connect_with_audio_node(&wet)?;
		dry.connect_with_audio_node(limiter_node)?;
		wet.connect_with_audio_node(limiter_node)?;
		limiter.connect_with_audio_node(&master)?;
		master.connect_with_audio_node(&ctx.destination())?;

		Ok(Bus {
			input,
			_limiter: limiter,
			_master: master,
		})
	}

	fn schedule_pluck(&mut self, ctx: &AudioContext, size: f64, range: SizeRange) -> Result<(), JsValue> {
		let Some(input) = self.bus_input(ctx) else {
			return Ok(());
		};
		let voice = PluckVoice::new(&self.config, size, range);
		let rate = ctx.sample_rate();
		let mut samples = voice.render(&self.config, rate as f64, &mut self.rng);

		let buffer = ctx.create_buffer(1, samples.len() as u32, rate)?;
		buffer.copy_to_channel(&mut samples, 0)?;
		let source = ctx.create_buffer_source()?;
		let gain = ctx.create_gain()?;
		gain.gain().set_value(voice.gain as f32);
		source.set_buffer(Some(&buffer));
		source.connect_with_audio_node(&gain)?;
		gain.connect_with_audio_node(&input)?;
		source.start()
	}

	fn schedule_sine(&mut self, ctx: &AudioContext, frequency_hz: f64) -> Result<(), JsValue> {
		let Some(input) = self.bus_input(ctx) else {
			return Ok(());
		};
		let c = &self.config;
		let hz = clamp_sine_hz(c, frequency_hz);
		let now = ctx.current_time();
		let peak_at = now + c.sine_attack_sec;
		let end_at = peak_at + c.sine_release_sec;

		let osc = ctx.create_oscillator()?;
		let gain = ctx.create_gain()?;
		osc.set_type(OscillatorType::Sine);
		osc.frequency().set_value_at_time(hz as f32, now)?;
		let envelope = gain.gain();
		envelope.set_value_at_time(0.0001, now)?;
		envelope.linear_ramp_to_value_at_time(c.sine_gain as f32, peak_at)?;
		envelope.exponential_ramp_to_value_at_time(0.0001, end_at)?;

		osc.connect_with_audio_node(&gain)?;
		gain.connect_with_audio_node(&input)?;
		osc.start_with_when(now)?;
		osc.stop_with_when(end_at + 0.02)
	}
}

impl AudioSink for WebAudio {
	fn play_pluck(&mut self, size: f64, range: SizeRange) {
		let Some(ctx) = self.running() else {
			return;
		};
		let _ = self.schedule_pluck(&ctx, size, range);
	}

	fn play_sine(&mut self, frequency_hz: f64) {
		let Some(ctx) = self.running() else {
			return;
		};
		let _ = self.schedule_sine(&ctx, frequency_hz);
	}

	fn resume(&mut self) -> bool {
		let Some(ctx) = self.context() else {
			return false;
		};
		if ctx.state() == AudioContextState::Suspended {
			let _ = ctx.resume();
		}
		ctx.state() != AudioContextState::Closed
	}

	fn suspend(&mut self) {
		if let Some(ctx) = self.running() {
			let _ = ctx.suspend();
			info!("audio suspended");
		}
	}
}
