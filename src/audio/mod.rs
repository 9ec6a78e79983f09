//! Procedural plucks and sine tones behind a rate-limited gate.
//!
//! The simulation only ever talks to [`SoundBoard`]; the browser backend
//! lives in [`web`] and is swapped for a recording sink in tests.

mod gate;
pub mod synth;
pub mod web;

pub use gate::{AudioGate, SoundBoard};

/// Expected range of node sizes, used to normalise pluck loudness.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeRange {
	pub min: f64,
	pub max: f64,
}

/// Raw synthesis capability. Implementations must treat every call as
/// best-effort and never panic when the output device is unavailable.
pub trait AudioSink {
	fn play_pluck(&mut self, size: f64, range: SizeRange);
	fn play_sine(&mut self, frequency_hz: f64);

	/// Starts or restarts output. Returns whether the sink can make sound.
	fn resume(&mut self) -> bool {
		true
	}

	fn suspend(&mut self) {}
}

#[cfg(test)]
pub(crate) mod testing {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::{AudioSink, SizeRange};

	#[derive(Clone, Debug, PartialEq)]
	pub enum Played {
		Pluck { size: f64, range: SizeRange },
		Sine { hz: f64 },
	}

	/// Records every call that makes it past the gate.
	#[derive(Clone, Default)]
	pub struct RecordingSink {
		pub played: Rc<RefCell<Vec<Played>>>,
	}

	impl RecordingSink {
		pub fn plucks(&self) -> Vec<(f64, SizeRange)> {
			self.played
				.borrow()
				.iter()
				.filter_map(|p| match p {
					Played::Pluck { size, range } => Some((*size, *range)),
					_ => None,
				})
				.collect()
		}

		pub fn sines(&self) -> Vec<f64> {
			self.played
				.borrow()
				.iter()
				.filter_map(|p| match p {
					Played::Sine { hz } => Some(*hz),
					_ => None,
				})
				.collect()
		}
	}

	impl AudioSink for RecordingSink {
		fn play_pluck(&mut self, size: f64, range: SizeRange) {
			self.played.borrow_mut().push(Played::Pluck { size, range });
		}

		fn play_sine(&mut self, frequency_hz: f64) {
			self.played
				.borrow_mut()
				.push(Played::Sine { hz: frequency_hz });
		}
	}
}
