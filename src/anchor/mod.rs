//! Keeps a text marker pinned under a target pane coordinate.
//!
//! [`AnchorEngine`] owns the spacer lengths and the anchoring phase; all
//! measuring and mutation of the page goes through [`AnchorSurface`], so the
//! convergence loop runs the same against the DOM ([`dom::DomSurface`]) and
//! against a simulated pane in tests.

pub mod dom;

use log::{debug, info};

use crate::config::AnchorConfig;

/// A pane-relative position or a block translation, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offset {
	pub x: f64,
	pub y: f64,
}

impl Offset {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Measurements and mutations the anchoring algorithm needs from the page.
/// The marker and its enclosing block are fixed when the surface is built.
pub trait AnchorSurface {
	/// Marker's top-left corner relative to the pane. `None` once detached.
	fn marker_point(&self) -> Option<Offset>;
	fn block_shift(&self) -> Offset;
	fn apply_block_shift(&mut self, shift: Offset);
	/// Horizontal shift range that keeps the block's unshifted edges inside
	/// the pane, inset by `padding`. `None` when either box has no width.
	fn block_bounds(&self, padding: f64) -> Option<(f64, f64)>;
	/// Whether the marker sits in the section currently shown. Hidden
	/// sections have no layout worth aligning against.
	fn marker_in_selection(&self) -> bool {
		true
	}
	/// Marks the block as the single draggable one.
	fn activate_block(&mut self) {}
	/// Drops every block translation and active mark in the content.
	fn reset_blocks(&mut self);

	fn scroll_top(&self) -> f64;
	/// `scrollHeight - clientHeight`, never negative.
	fn scroll_range(&self) -> f64;
	fn client_height(&self) -> f64;
	fn set_scroll_top(&mut self, top: f64);
	fn set_spacers(&mut self, top: f64, bottom: f64);
	/// Forces the browser to apply pending style changes before measuring.
	fn flush_layout(&mut self) {}
	fn viewport_width(&self) -> f64;
}

/// Anchoring state machine. Settling runs one pass per animation frame;
/// dragging and section changes abort it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnchorPhase {
	Idle,
	Settling { pass: u32 },
	Dragging { start: Offset, origin: Offset },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleOutcome {
	Converged,
	/// Another pass is due on the next frame.
	Pending,
	GaveUp,
	/// The jump was superseded (drag or reset) before this pass ran.
	Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitMode {
	Drag,
	Align,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShiftLimits {
	pub min_x: f64,
	pub max_x: f64,
	pub y: f64,
}

/// Base drag limits and alignment overshoot per device width tier.
struct DeviceLimits {
	base_x: f64,
	base_y: f64,
	overshoot_x: f64,
}

const MOBILE: DeviceLimits = DeviceLimits {
	base_x: 72.0,
	base_y: 24.0,
	overshoot_x: 84.0,
};
const TABLET: DeviceLimits = DeviceLimits {
	base_x: 180.0,
	base_y: 64.0,
	overshoot_x: 220.0,
};
const DESKTOP: DeviceLimits = DeviceLimits {
	base_x: 420.0,
	base_y: 120.0,
	overshoot_x: 460.0,
};

const SCROLL_NOISE_PX: f64 = 0.15;
const SPACER_FLOOR_PX: f64 = 0.5;

#[derive(Clone, Debug)]
pub struct AnchorEngine {
	config: AnchorConfig,
	phase: AnchorPhase,
	spacer_top: f64,
	spacer_bottom: f64,
	last_scroll_top: f64,
	programmatic_scroll: bool,
}

fn finite(value: Option<f64>) -> Option<f64> {
	value.filter(|v| v.is_finite())
}

impl AnchorEngine {
	pub fn new(config: AnchorConfig) -> Self {
		Self {
			config,
			phase: AnchorPhase::Idle,
			spacer_top: 0.0,
			spacer_bottom: 0.0,
			last_scroll_top: 0.0,
			programmatic_scroll: false,
		}
	}

	pub fn phase(&self) -> AnchorPhase {
		self.phase
	}

	pub fn spacers(&self) -> (f64, f64) {
		(self.spacer_top, self.spacer_bottom)
	}

	pub fn is_aligning(&self) -> bool {
		matches!(self.phase, AnchorPhase::Settling { .. })
	}

	fn device(&self, surface: &impl AnchorSurface) -> DeviceLimits {
		let width = surface.viewport_width();
		if width < self.config.mobile_width_px {
			MOBILE
		} else if width < self.config.tablet_width_px {
			TABLET
		} else {
			DESKTOP
		}
	}

	fn is_desktop_preview(&self, surface: &impl AnchorSurface) -> bool {
		surface.viewport_width() >= self.config.desktop_preview_width_px
	}

	pub fn shift_limits(&self, surface: &impl AnchorSurface, mode: LimitMode) -> ShiftLimits {
		let device = self.device(surface);
		let (mut min_x, mut max_x) = (-device.base_x, device.base_x);
		if let Some((geo_min, geo_max)) = surface.block_bounds(self.config.pane_padding_px) {
			match mode {
				LimitMode::Align => {
					min_x = geo_min - device.overshoot_x;
					max_x = geo_max + device.overshoot_x;
				}
				LimitMode::Drag => {
					min_x = min_x.max(geo_min);
					max_x = max_x.min(geo_max);
				}
			}
		}
		if max_x < min_x {
			let pivot = (min_x + max_x) / 2.0;
			(min_x, max_x) = (pivot, pivot);
		}
		ShiftLimits {
			min_x,
			max_x,
			y: device.base_y,
		}
	}

	fn apply_shift(&self, surface: &mut impl AnchorSurface, x: f64, y: f64) {
		let snap = |v: f64| if v.abs() < self.config.snap_px { 0.0 } else { v };
		surface.apply_block_shift(Offset::new(snap(x), snap(y)));
	}

	// --- spacers ---

	pub fn set_spacers(&mut self, surface: &mut impl AnchorSurface, top: f64, bottom: f64) {
		let clamp = |v: f64| {
			if v.is_finite() {
				v.clamp(0.0, self.config.max_spacer_px)
			} else {
				0.0
			}
		};
		self.spacer_top = clamp(top);
		self.spacer_bottom = clamp(bottom);
		surface.set_spacers(self.spacer_top, self.spacer_bottom);
	}

	pub fn clear_spacers(&mut self, surface: &mut impl AnchorSurface) {
		self.set_spacers(surface, 0.0, 0.0);
	}

	/// Grows both spacers until the pane can scroll by at least `min_range`.
	/// Returns whether anything changed.
	pub fn ensure_virtual_scroll_range(
		&mut self,
		surface: &mut impl AnchorSurface,
		min_range: f64,
	) -> bool {
		let current = surface.scroll_range();
		let target = if min_range.is_finite() { min_range.max(0.0) } else { 0.0 };
		if current >= target - SPACER_FLOOR_PX {
			return false;
		}
		let half = (target - current) * 0.5;
		let (top, bottom) = (self.spacer_top + half, self.spacer_bottom + half);
		self.set_spacers(surface, top, bottom);
		surface.flush_layout();
		true
	}

	fn apply_scroll_delta(&mut self, surface: &mut impl AnchorSurface, delta: f64) {
		if !delta.is_finite() || delta.abs() < self.config.min_scroll_delta_px {
			return;
		}
		let mut max = surface.scroll_range();
		if max < SPACER_FLOOR_PX && self.is_aligning() && self.is_desktop_preview(surface) {
			let wanted = self
				.config
				.virtual_scroll_min_px
				.max(delta.abs() + surface.client_height() * 0.25);
			if self.ensure_virtual_scroll_range(surface, wanted) {
				max = surface.scroll_range();
			}
		}
		let before = surface.scroll_top();
		let target = (before + delta).clamp(0.0, max);
		surface.set_scroll_top(target);
		// a write that lands where the pane already was fires no scroll event
		if (surface.scroll_top() - before).abs() >= SCROLL_NOISE_PX {
			self.programmatic_scroll = true;
		}
	}

	/// Forgets a programmatic scroll whose event never arrived and takes the
	/// pane's current offset as the baseline for reader scrolling. Runs one
	/// frame after the write.
	pub fn clear_programmatic_scroll(&mut self, surface: &impl AnchorSurface) {
		self.programmatic_scroll = false;
		self.last_scroll_top = surface.scroll_top();
	}

	/// Grows the spacer on the side that lacks scroll range by `residual`,
	/// then re-scrolls onto `row`.
	fn grow_spacer(&mut self, surface: &mut impl AnchorSurface, residual: f64, row: f64) {
		let (top, bottom) = if residual > 0.0 {
			(self.spacer_top + residual, self.spacer_bottom)
		} else {
			(self.spacer_top, self.spacer_bottom + residual.abs())
		};
		self.set_spacers(surface, top, bottom);
		surface.flush_layout();
		if let Some(point) = surface.marker_point() {
			self.apply_scroll_delta(surface, point.y - row);
		}
	}

	fn within_epsilon(&self, point: Offset, row: Option<f64>, col: Option<f64>) -> bool {
		let dx = col.map_or(0.0, |c| c - point.x);
		let dy = row.map_or(0.0, |r| r - point.y);
		dx.abs() <= self.config.epsilon_px && dy.abs() <= self.config.epsilon_px
	}

	// --- alignment ---

	/// Moves the marker towards `(col, row)` in pane coordinates: shifts its
	/// block horizontally, scrolls the pane, and manufactures scroll range
	/// with the spacers when the document runs out. Returns whether both
	/// residuals ended within epsilon. Bounded by the internal pass count.
	pub fn align_marker(
		&mut self,
		surface: &mut impl AnchorSurface,
		row: Option<f64>,
		col: Option<f64>,
	) -> bool {
		let (row, col) = (finite(row), finite(col));
		if surface.marker_point().is_none() || !surface.marker_in_selection() {
			return false;
		}
		surface.activate_block();

		let limits = self.shift_limits(surface, LimitMode::Align);
		if self.is_aligning() && self.is_desktop_preview(surface) {
			let wanted = self
				.config
				.virtual_scroll_min_px
				.max(surface.client_height() * 0.4);
			self.ensure_virtual_scroll_range(surface, wanted);
		}

		for _ in 0..self.config.internal_passes {
			let Some(point) = surface.marker_point() else {
				return false;
			};
			if let Some(col) = col {
				let shift = surface.block_shift();
				let next = (shift.x + col - point.x).clamp(limits.min_x, limits.max_x);
				self.apply_shift(surface, next, 0.0);
			}

			let Some(point) = surface.marker_point() else {
				return false;
			};
			if let Some(row) = row {
				self.apply_scroll_delta(surface, point.y - row);
			}

			let Some(point) = surface.marker_point() else {
				return false;
			};
			if let Some(row) = row {
				let residual = row - point.y;
				if residual.abs() > self.config.epsilon_px {
					self.grow_spacer(surface, residual, row);
				}
			}

			let Some(point) = surface.marker_point() else {
				return false;
			};
			if self.within_epsilon(point, row, col) {
				return true;
			}
		}

		surface
			.marker_point()
			.is_some_and(|point| self.within_epsilon(point, row, col))
	}

	// --- thread jumps ---

	pub fn begin_jump(&mut self) {
		self.phase = AnchorPhase::Settling { pass: 0 };
	}

	/// One outer settle pass; call once per animation frame until it stops
	/// answering [`SettleOutcome::Pending`].
	pub fn settle_pass(
		&mut self,
		surface: &mut impl AnchorSurface,
		row: Option<f64>,
		col: Option<f64>,
	) -> SettleOutcome {
		let AnchorPhase::Settling { pass } = self.phase else {
			return SettleOutcome::Cancelled;
		};
		self.clear_programmatic_scroll(&*surface);
		if self.align_marker(surface, row, col) {
			debug!("marker aligned after {} passes", pass + 1);
			return SettleOutcome::Converged;
		}
		let next = pass + 1;
		if next >= self.config.max_settle_passes {
			info!("marker alignment gave up after {next} passes");
			return SettleOutcome::GaveUp;
		}
		self.phase = AnchorPhase::Settling { pass: next };
		SettleOutcome::Pending
	}

	/// Leaves the settling phase; call a frame after the last pass so its
	/// scroll event is not mistaken for the reader's.
	pub fn finish_jump(&mut self, surface: &impl AnchorSurface) {
		if self.is_aligning() {
			self.phase = AnchorPhase::Idle;
		}
		self.clear_programmatic_scroll(surface);
	}

	// --- reader input ---

	/// Manual scrolling gradually eats the spacers instead of dropping them.
	pub fn on_pane_scroll(&mut self, surface: &mut impl AnchorSurface) {
		let current = surface.scroll_top();
		let delta = current - self.last_scroll_top;
		self.last_scroll_top = current;

		if std::mem::take(&mut self.programmatic_scroll) || self.is_aligning() {
			return;
		}
		if delta.abs() < SCROLL_NOISE_PX {
			return;
		}
		if self.spacer_top > SPACER_FLOOR_PX || self.spacer_bottom > SPACER_FLOOR_PX {
			self.consume_spacers(surface, delta);
		}
	}

	fn consume_spacers(&mut self, surface: &mut impl AnchorSurface, delta: f64) {
		let magnitude = delta.abs().max(0.3);
		let (mut top, mut bottom) = (self.spacer_top, self.spacer_bottom);
		let has_top = top > SPACER_FLOOR_PX;
		let has_bottom = bottom > SPACER_FLOOR_PX;

		if has_top && !has_bottom {
			let factor = if delta > 0.0 { 0.55 } else { 0.28 };
			top = (top - magnitude * factor).max(0.0);
		} else if has_bottom && !has_top {
			let factor = if delta < 0.0 { 0.55 } else { 0.28 };
			bottom = (bottom - magnitude * factor).max(0.0);
		} else {
			let decay = magnitude * 0.42;
			top = (top - decay).max(0.0);
			bottom = (bottom - decay).max(0.0);
		}

		if top <= SPACER_FLOOR_PX && bottom <= SPACER_FLOOR_PX {
			self.clear_spacers(surface);
		} else {
			self.set_spacers(surface, top, bottom);
		}
	}

	/// Starts dragging the surface's block. Any settling jump is abandoned.
	pub fn begin_drag(&mut self, surface: &impl AnchorSurface, client_x: f64, client_y: f64) {
		self.phase = AnchorPhase::Dragging {
			start: Offset::new(client_x, client_y),
			origin: surface.block_shift(),
		};
	}

	pub fn drag_to(&mut self, surface: &mut impl AnchorSurface, client_x: f64, client_y: f64) {
		let AnchorPhase::Dragging { start, origin } = self.phase else {
			return;
		};
		let limits = self.shift_limits(surface, LimitMode::Drag);
		let x = (origin.x + client_x - start.x).clamp(limits.min_x, limits.max_x);
		let y = (origin.y + client_y - start.y).clamp(-limits.y, limits.y);
		self.apply_shift(surface, x, y);
	}

	pub fn end_drag(&mut self) {
		if matches!(self.phase, AnchorPhase::Dragging { .. }) {
			self.phase = AnchorPhase::Idle;
		}
	}

	pub fn is_dragging(&self) -> bool {
		matches!(self.phase, AnchorPhase::Dragging { .. })
	}

	/// Section changed: every shift, spacer and pending jump goes.
	pub fn reset(&mut self, surface: &mut impl AnchorSurface) {
		self.phase = AnchorPhase::Idle;
		self.programmatic_scroll = false;
		surface.reset_blocks();
		self.clear_spacers(surface);
		self.last_scroll_top = surface.scroll_top();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// A pane whose content is `content_height` tall, holding one block and
	/// one marker at a fixed natural position.
	#[derive(Clone, Debug)]
	struct SimPane {
		viewport_width: f64,
		pane_width: f64,
		client_height: f64,
		content_height: f64,
		scroll_top: f64,
		spacers: (f64, f64),
		marker: Offset,
		block: (f64, f64),
		shift: Offset,
		scroll_writes: usize,
		resets: usize,
		selected: bool,
	}

	impl SimPane {
		fn new(marker: Offset) -> Self {
			Self {
				viewport_width: 1300.0,
				pane_width: 800.0,
				client_height: 500.0,
				content_height: 2000.0,
				scroll_top: 0.0,
				spacers: (0.0, 0.0),
				marker,
				block: (20.0, 620.0),
				shift: Offset::default(),
				scroll_writes: 0,
				resets: 0,
				selected: true,
			}
		}
	}

	impl AnchorSurface for SimPane {
		fn marker_point(&self) -> Option<Offset> {
			Some(Offset::new(
				self.marker.x + self.shift.x,
				self.marker.y + self.spacers.0 - self.scroll_top + self.shift.y,
			))
		}

		fn marker_in_selection(&self) -> bool {
			self.selected
		}

		fn block_shift(&self) -> Offset {
			self.shift
		}

		fn apply_block_shift(&mut self, shift: Offset) {
			self.shift = shift;
		}

		fn block_bounds(&self, padding: f64) -> Option<(f64, f64)> {
			Some((padding - self.block.0, self.pane_width - padding - self.block.1))
		}

		fn reset_blocks(&mut self) {
			self.shift = Offset::default();
			self.resets += 1;
		}

		fn scroll_top(&self) -> f64 {
			self.scroll_top
		}

		fn scroll_range(&self) -> f64 {
			(self.content_height + self.spacers.0 + self.spacers.1 - self.client_height).max(0.0)
		}

		fn client_height(&self) -> f64 {
			self.client_height
		}

		fn set_scroll_top(&mut self, top: f64) {
			self.scroll_top = top.clamp(0.0, self.scroll_range());
			self.scroll_writes += 1;
		}

		fn set_spacers(&mut self, top: f64, bottom: f64) {
			self.spacers = (top, bottom);
		}

		fn viewport_width(&self) -> f64 {
			self.viewport_width
		}
	}

	fn engine() -> AnchorEngine {
		AnchorEngine::new(AnchorConfig::default())
	}

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-6
	}

	#[test]
	fn aligned_marker_succeeds_without_side_effects() {
		let mut pane = SimPane::new(Offset::new(40.0, 300.0));
		let mut anchor = engine();
		assert!(anchor.align_marker(&mut pane, Some(300.1), Some(40.0)));
		assert_eq!(anchor.spacers(), (0.0, 0.0));
		assert_eq!(pane.spacers, (0.0, 0.0));
		assert_eq!(pane.scroll_writes, 0);
		assert_eq!(pane.shift, Offset::default());
	}

	#[test]
	fn scrolls_when_range_allows() {
		let mut pane = SimPane::new(Offset::new(40.0, 1200.0));
		let mut anchor = engine();
		assert!(anchor.align_marker(&mut pane, Some(300.0), None));
		assert!(close(pane.scroll_top, 900.0));
		assert_eq!(anchor.spacers(), (0.0, 0.0));
	}

	#[test]
	fn top_spacer_manufactures_missing_range() {
		let mut pane = SimPane::new(Offset::new(40.0, 50.0));
		let mut anchor = engine();
		assert!(anchor.align_marker(&mut pane, Some(300.0), None));
		let (top, bottom) = anchor.spacers();
		assert!(close(top, 250.0));
		assert_eq!(bottom, 0.0);
		assert!(close(pane.marker_point().unwrap().y, 300.0));
	}

	#[test]
	fn spacers_are_capped() {
		let mut pane = SimPane::new(Offset::new(40.0, 50.0));
		let mut anchor = engine();
		assert!(!anchor.align_marker(&mut pane, Some(9000.0), None));
		assert_eq!(anchor.spacers().0, 6000.0);
	}

	#[test]
	fn horizontal_correction_shifts_the_block() {
		let mut pane = SimPane::new(Offset::new(40.0, 300.0));
		let mut anchor = engine();
		assert!(anchor.align_marker(&mut pane, None, Some(100.0)));
		assert!(close(pane.shift.x, 60.0));
		assert_eq!(pane.shift.y, 0.0);
	}

	#[test]
	fn horizontal_shift_is_clamped_and_reports_failure() {
		let mut pane = SimPane::new(Offset::new(40.0, 300.0));
		let mut anchor = engine();
		assert!(!anchor.align_marker(&mut pane, None, Some(2000.0)));
		// geometry bound 174 plus the desktop overshoot
		assert!(close(pane.shift.x, 634.0));
	}

	#[test]
	fn desktop_jump_reserves_virtual_range() {
		let mut pane = SimPane::new(Offset::new(40.0, 350.0));
		pane.content_height = 400.0;
		let mut anchor = engine();
		anchor.begin_jump();
		assert!(anchor.align_marker(&mut pane, Some(300.0), None));
		let (top, bottom) = anchor.spacers();
		assert!(close(top, 130.0));
		assert!(close(bottom, 150.0));
	}

	#[test]
	fn settle_passes_are_bounded() {
		let mut pane = SimPane::new(Offset::new(40.0, 300.0));
		let mut anchor = engine();
		anchor.begin_jump();
		let mut outcomes = Vec::new();
		loop {
			let outcome = anchor.settle_pass(&mut pane, None, Some(5000.0));
			outcomes.push(outcome);
			if outcome != SettleOutcome::Pending {
				break;
			}
		}
		assert_eq!(outcomes.len(), 10);
		assert_eq!(outcomes.last(), Some(&SettleOutcome::GaveUp));
		anchor.finish_jump(&pane);
		assert_eq!(anchor.phase(), AnchorPhase::Idle);
	}

	#[test]
	fn settle_converges_and_drag_cancels() {
		let mut pane = SimPane::new(Offset::new(40.0, 800.0));
		let mut anchor = engine();
		anchor.begin_jump();
		assert_eq!(
			anchor.settle_pass(&mut pane, Some(200.0), Some(60.0)),
			SettleOutcome::Converged
		);

		anchor.begin_jump();
		anchor.begin_drag(&pane, 0.0, 0.0);
		assert_eq!(
			anchor.settle_pass(&mut pane, Some(200.0), Some(60.0)),
			SettleOutcome::Cancelled
		);
	}

	#[test]
	fn reader_scroll_consumes_spacers() {
		let mut pane = SimPane::new(Offset::new(40.0, 300.0));
		let mut anchor = engine();
		anchor.set_spacers(&mut pane, 100.0, 0.0);

		pane.scroll_top = 10.0;
		anchor.on_pane_scroll(&mut pane);
		assert!(close(anchor.spacers().0, 94.5));

		pane.scroll_top = 0.0;
		anchor.on_pane_scroll(&mut pane);
		assert!(close(anchor.spacers().0, 91.7));

		anchor.set_spacers(&mut pane, 10.0, 10.0);
		pane.scroll_top = 10.0;
		anchor.on_pane_scroll(&mut pane);
		assert!(close(anchor.spacers().0, 5.8) && close(anchor.spacers().1, 5.8));

		anchor.set_spacers(&mut pane, 0.6, 0.6);
		pane.scroll_top = 11.0;
		anchor.on_pane_scroll(&mut pane);
		assert_eq!(anchor.spacers(), (0.0, 0.0));
		assert_eq!(pane.spacers, (0.0, 0.0));
	}

	#[test]
	fn programmatic_scroll_is_not_consumed() {
		let mut pane = SimPane::new(Offset::new(40.0, 1200.0));
		let mut anchor = engine();
		anchor.set_spacers(&mut pane, 100.0, 0.0);
		assert!(anchor.align_marker(&mut pane, Some(300.0), None));
		anchor.on_pane_scroll(&mut pane);
		assert_eq!(anchor.spacers(), (100.0, 0.0));
	}

	#[test]
	fn clamped_scroll_write_does_not_mask_reader_scroll() {
		let mut pane = SimPane::new(Offset::new(40.0, 100.0));
		let mut anchor = engine();
		assert!(anchor.align_marker(&mut pane, Some(300.0), None));
		assert!(close(anchor.spacers().0, 200.0));
		assert_eq!(pane.scroll_top, 0.0);

		pane.scroll_top = 10.0;
		anchor.on_pane_scroll(&mut pane);
		assert!(close(anchor.spacers().0, 194.5));
	}

	#[test]
	fn unanswered_programmatic_scroll_expires() {
		let mut pane = SimPane::new(Offset::new(40.0, 1200.0));
		let mut anchor = engine();
		anchor.set_spacers(&mut pane, 100.0, 0.0);
		assert!(anchor.align_marker(&mut pane, Some(300.0), None));
		anchor.clear_programmatic_scroll(&pane);

		pane.scroll_top += 10.0;
		anchor.on_pane_scroll(&mut pane);
		assert!(close(anchor.spacers().0, 94.5));
	}

	#[test]
	fn marker_outside_the_selected_section_is_left_alone() {
		let mut pane = SimPane::new(Offset::new(40.0, 800.0));
		pane.selected = false;
		let mut anchor = engine();
		assert!(!anchor.align_marker(&mut pane, Some(200.0), Some(60.0)));
		assert_eq!(pane.scroll_writes, 0);
		assert_eq!(pane.shift, Offset::default());
		assert_eq!(anchor.spacers(), (0.0, 0.0));
	}

	#[test]
	fn drag_respects_device_limits_and_snaps() {
		let mut pane = SimPane::new(Offset::new(40.0, 300.0));
		pane.block = (300.0, 400.0);
		let mut anchor = engine();
		anchor.begin_drag(&pane, 0.0, 0.0);
		anchor.drag_to(&mut pane, 1000.0, 500.0);
		assert_eq!(pane.shift, Offset::new(394.0, 120.0));
		anchor.drag_to(&mut pane, -1000.0, -500.0);
		assert_eq!(pane.shift, Offset::new(-294.0, -120.0));
		anchor.drag_to(&mut pane, 0.2, 0.1);
		assert_eq!(pane.shift, Offset::default());
		anchor.end_drag();
		assert!(!anchor.is_dragging());

		pane.viewport_width = 500.0;
		anchor.begin_drag(&pane, 0.0, 0.0);
		anchor.drag_to(&mut pane, 1000.0, 500.0);
		assert_eq!(pane.shift, Offset::new(72.0, 24.0));
	}

	#[test]
	fn impossible_geometry_collapses_to_pivot() {
		let mut pane = SimPane::new(Offset::new(40.0, 300.0));
		pane.block = (0.0, 2000.0);
		let limits = engine().shift_limits(&pane, LimitMode::Drag);
		assert_eq!(limits.min_x, limits.max_x);
	}

	#[test]
	fn reset_clears_everything() {
		let mut pane = SimPane::new(Offset::new(40.0, 300.0));
		let mut anchor = engine();
		anchor.set_spacers(&mut pane, 40.0, 80.0);
		anchor.begin_jump();
		anchor.reset(&mut pane);
		assert_eq!(anchor.phase(), AnchorPhase::Idle);
		assert_eq!(pane.spacers, (0.0, 0.0));
		assert_eq!(pane.resets, 1);
	}
}
