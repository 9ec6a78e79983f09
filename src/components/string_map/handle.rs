use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

use super::render::{self, Theme};
use super::scheduler::FrameScheduler;
use super::state::StringMapState;
use super::types::GraphConfig;
use crate::audio::web::WebAudio;

/// Milliseconds on the clock `requestAnimationFrame` timestamps use.
pub fn now_ms() -> f64 {
	web_sys::window()
		.and_then(|w| w.performance())
		.map(|p| p.now())
		.unwrap_or_else(js_sys::Date::now)
}

struct FrameDriver {
	scheduler: FrameScheduler,
	context: Option<CanvasRenderingContext2d>,
	callback: Option<Closure<dyn FnMut(f64)>>,
	pulse_callback: Option<Closure<dyn FnMut(f64)>>,
	/// Outstanding pulse frame, cancelled when the selection goes away.
	pulse_frame: Option<i32>,
}

/// Shared access to the map state plus its animation loop. Cloning is cheap.
#[derive(Clone)]
pub struct MapHandle {
	state: Rc<RefCell<StringMapState>>,
	driver: Rc<RefCell<FrameDriver>>,
	theme: Theme,
}

impl MapHandle {
	pub fn new(config: &GraphConfig, seed: u64) -> Self {
		let wave = &config.tuning.wave;
		let scheduler =
			FrameScheduler::new(wave.min_frame_ms, wave.max_frame_ms, wave.default_frame_ms);
		let sink = Box::new(WebAudio::new(config.tuning.audio.clone(), seed.rotate_left(17)));
		Self {
			state: Rc::new(RefCell::new(StringMapState::new(config, sink, seed, 800.0, 600.0))),
			driver: Rc::new(RefCell::new(FrameDriver {
				scheduler,
				context: None,
				callback: None,
				pulse_callback: None,
				pulse_frame: None,
			})),
			theme: Theme::default(),
		}
	}

	/// Mutates the state, then makes sure a frame is coming to show it.
	pub fn with<R>(&self, f: impl FnOnce(&mut StringMapState) -> R) -> R {
		let out = f(&mut self.state.borrow_mut());
		self.request_tick();
		self.sync_pulse();
		out
	}

	pub fn read<R>(&self, f: impl FnOnce(&StringMapState) -> R) -> R {
		f(&self.state.borrow())
	}

	/// Binds the loop to a canvas. Until then requests are ignored.
	pub fn attach(&self, context: CanvasRenderingContext2d, width: f64, height: f64) {
		{
			let mut state = self.state.borrow_mut();
			state.resize(width, height);
			state.fit_view();
		}
		let (handle, pulse_handle) = (self.clone(), self.clone());
		let mut driver = self.driver.borrow_mut();
		driver.context = Some(context);
		driver.callback = Some(Closure::new(move |ts: f64| handle.frame(ts)));
		driver.pulse_callback = Some(Closure::new(move |_ts: f64| pulse_handle.pulse_frame()));
		drop(driver);
		self.redraw();
		self.request_tick();
		self.sync_pulse();
	}

	pub fn resize(&self, width: f64, height: f64) {
		self.state.borrow_mut().resize(width, height);
		self.redraw();
	}

	/// Idempotent: enqueues one animation frame unless one is pending.
	pub fn request_tick(&self) {
		let mut driver = self.driver.borrow_mut();
		if driver.callback.is_none() || !driver.scheduler.request() {
			return;
		}
		drop(driver);
		self.enqueue();
	}

	fn enqueue(&self) {
		let driver = self.driver.borrow();
		let queued = match (web_sys::window(), driver.callback.as_ref()) {
			(Some(window), Some(cb)) => window
				.request_animation_frame(cb.as_ref().unchecked_ref())
				.is_ok(),
			_ => false,
		};
		drop(driver);
		if !queued {
			self.driver.borrow_mut().scheduler.abandon();
		}
	}

	/// Starts the pulse frames while a node is selected and cancels the
	/// outstanding one once nothing is.
	fn sync_pulse(&self) {
		let pulsing = self.state.borrow().is_pulsing();
		let mut guard = self.driver.borrow_mut();
		let driver = &mut *guard;
		let Some(window) = web_sys::window() else {
			return;
		};
		match (pulsing, driver.pulse_frame) {
			(true, None) => {
				let Some(cb) = driver.pulse_callback.as_ref() else {
					return;
				};
				driver.pulse_frame = window.request_animation_frame(cb.as_ref().unchecked_ref()).ok();
			}
			(false, Some(id)) => {
				let _ = window.cancel_animation_frame(id);
				driver.pulse_frame = None;
			}
			_ => {}
		}
	}

	/// Pulse-only frame. Draws only when the wave loop is idle; a running
	/// wave loop draws the pulse itself.
	fn pulse_frame(&self) {
		self.driver.borrow_mut().pulse_frame = None;
		if !self.state.borrow_mut().advance_pulse() {
			return;
		}
		if !self.driver.borrow().scheduler.is_pending() {
			self.redraw();
		}
		self.sync_pulse();
	}

	/// Draws the current state without advancing it.
	pub fn redraw(&self) {
		let Some(context) = self.driver.borrow().context.clone() else {
			return;
		};
		render::render(&self.state.borrow(), &context, &self.theme);
	}

	fn frame(&self, ts: f64) {
		let (dt, context) = {
			let mut driver = self.driver.borrow_mut();
			(driver.scheduler.begin_frame(ts), driver.context.clone())
		};
		let keep_going = {
			let mut state = self.state.borrow_mut();
			state.tick(dt);
			state.sample_motion(ts);
			if let Some(context) = &context {
				render::render(&state, context, &self.theme);
			}
			state.wants_frame(ts)
		};
		if self.driver.borrow_mut().scheduler.finish_frame(keep_going) {
			self.enqueue();
		}
	}
}
