/// Cooperative animation-frame scheduler.
///
/// At most one frame callback is outstanding. `request` reports whether the
/// caller must actually enqueue one; the frame itself decides via
/// `finish_frame` whether to keep going.
#[derive(Clone, Debug)]
pub struct FrameScheduler {
	pending: bool,
	last_tick: Option<f64>,
	min_dt: f64,
	max_dt: f64,
	default_dt: f64,
}

impl FrameScheduler {
	pub fn new(min_dt: f64, max_dt: f64, default_dt: f64) -> Self {
		Self {
			pending: false,
			last_tick: None,
			min_dt,
			max_dt,
			default_dt,
		}
	}

	/// Idempotent: `true` only for the first request since the last frame.
	pub fn request(&mut self) -> bool {
		!std::mem::replace(&mut self.pending, true)
	}

	/// Cancels an outstanding request that could not be enqueued.
	pub fn abandon(&mut self) {
		self.pending = false;
	}

	pub fn is_pending(&self) -> bool {
		self.pending
	}

	/// Marks the outstanding frame as running and returns its clamped
	/// duration in milliseconds.
	pub fn begin_frame(&mut self, ts: f64) -> f64 {
		self.pending = false;
		let dt = match self.last_tick {
			Some(last) => (ts - last).clamp(self.min_dt, self.max_dt),
			None => self.default_dt,
		};
		self.last_tick = Some(ts);
		dt
	}

	/// Returns whether a follow-up frame must be enqueued.
	pub fn finish_frame(&mut self, keep_going: bool) -> bool {
		keep_going && self.request()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn request_is_idempotent_until_frame_runs() {
		let mut frames = FrameScheduler::new(8.0, 40.0, 16.0);
		assert!(frames.request());
		assert!(!frames.request());
		frames.begin_frame(0.0);
		assert!(frames.request());
	}

	#[test]
	fn frame_duration_is_clamped() {
		let mut frames = FrameScheduler::new(8.0, 40.0, 16.0);
		assert_eq!(frames.begin_frame(1000.0), 16.0);
		assert_eq!(frames.begin_frame(1002.0), 8.0);
		assert_eq!(frames.begin_frame(1022.0), 20.0);
		assert_eq!(frames.begin_frame(9000.0), 40.0);
	}

	#[test]
	fn loop_stops_when_predicate_fails() {
		let mut frames = FrameScheduler::new(8.0, 40.0, 16.0);
		frames.request();
		frames.begin_frame(0.0);
		assert!(frames.finish_frame(true));
		frames.begin_frame(16.0);
		assert!(!frames.finish_frame(false));
		assert!(!frames.is_pending());
		// a new trigger re-arms the loop
		assert!(frames.request());
	}

	#[test]
	fn input_during_frame_does_not_double_enqueue() {
		let mut frames = FrameScheduler::new(8.0, 40.0, 16.0);
		frames.request();
		frames.begin_frame(0.0);
		assert!(frames.request());
		assert!(!frames.finish_frame(true));
	}
}
