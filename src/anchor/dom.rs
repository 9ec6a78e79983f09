use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

use super::{AnchorSurface, Offset};

const BLOCK_SELECTOR: &str = "p, ul, ol, blockquote";
const ACTIVE_CLASS: &str = "context-shift-active";
const SHIFTED_CLASS: &str = "context-shifted";
const SPACER_TOP: &str = "--context-anchor-spacer-top";
const SPACER_BOTTOM: &str = "--context-anchor-spacer-bottom";

/// The reading pane, its scrolled content and optionally one marker with its
/// enclosing block. Cheap to build per event; element handles are refcounted.
pub struct DomSurface {
	pane: HtmlElement,
	content: HtmlElement,
	block: Option<HtmlElement>,
	marker: Option<Element>,
	selected_section: Option<String>,
}

impl DomSurface {
	pub fn new(pane: HtmlElement, content: HtmlElement) -> Self {
		Self {
			pane,
			content,
			block: None,
			marker: None,
			selected_section: None,
		}
	}

	/// Binds a marker; its block is the closest paragraph, list or quote.
	pub fn with_marker(mut self, marker: Element) -> Self {
		self.block = enclosing_block(&marker);
		self.marker = Some(marker);
		self
	}

	pub fn with_block(mut self, block: HtmlElement) -> Self {
		self.block = Some(block);
		self
	}

	/// Only markers inside this section are aligned.
	pub fn with_selected_section(mut self, section: Option<String>) -> Self {
		self.selected_section = section;
		self
	}
}

pub fn enclosing_block(element: &Element) -> Option<HtmlElement> {
	element
		.closest(BLOCK_SELECTOR)
		.ok()
		.flatten()
		.and_then(|block| block.dyn_into::<HtmlElement>().ok())
}

fn read_px(block: &HtmlElement, key: &str) -> f64 {
	block
		.dataset()
		.get(key)
		.and_then(|v| v.parse::<f64>().ok())
		.filter(|v| v.is_finite())
		.unwrap_or(0.0)
}

fn clear_shift(block: &HtmlElement) {
	let _ = block.class_list().remove_2(ACTIVE_CLASS, SHIFTED_CLASS);
	let _ = block.style().remove_property("transform");
	let dataset = block.dataset();
	dataset.delete("contextShiftX");
	dataset.delete("contextShiftY");
}

impl AnchorSurface for DomSurface {
	fn marker_point(&self) -> Option<Offset> {
		let marker = self.marker.as_ref().filter(|m| m.is_connected())?;
		let pane = self.pane.get_bounding_client_rect();
		let rect = marker.get_bounding_client_rect();
		Some(Offset::new(rect.left() - pane.left(), rect.top() - pane.top()))
	}

	fn marker_in_selection(&self) -> bool {
		let section = self
			.marker
			.as_ref()
			.and_then(|m| m.closest("section[id]").ok().flatten())
			.map(|section| section.id());
		section.is_some() && section == self.selected_section
	}

	fn block_shift(&self) -> Offset {
		self.block.as_ref().map_or_else(Offset::default, |block| {
			Offset::new(read_px(block, "contextShiftX"), read_px(block, "contextShiftY"))
		})
	}

	fn apply_block_shift(&mut self, shift: Offset) {
		let Some(block) = &self.block else {
			return;
		};
		let dataset = block.dataset();
		if shift == Offset::default() {
			let _ = block.style().remove_property("transform");
			let _ = block.class_list().remove_1(SHIFTED_CLASS);
			dataset.delete("contextShiftX");
			dataset.delete("contextShiftY");
			return;
		}
		let _ = block.style().set_property(
			"transform",
			&format!("translate3d({:.3}px, {:.3}px, 0)", shift.x, shift.y),
		);
		let _ = block.class_list().add_1(SHIFTED_CLASS);
		let _ = dataset.set("contextShiftX", &format!("{:.3}", shift.x));
		let _ = dataset.set("contextShiftY", &format!("{:.3}", shift.y));
	}

	fn block_bounds(&self, padding: f64) -> Option<(f64, f64)> {
		let block = self.block.as_ref()?;
		let pane = self.pane.get_bounding_client_rect();
		let rect = block.get_bounding_client_rect();
		if pane.width() <= 0.0 || rect.width() <= 0.0 {
			return None;
		}
		let shift = self.block_shift();
		let left = rect.left() - shift.x;
		let right = rect.right() - shift.x;
		Some((
			pane.left() + padding - left,
			pane.right() - padding - right,
		))
	}

	fn activate_block(&mut self) {
		let Some(block) = &self.block else {
			return;
		};
		if let Ok(active) = self.content.query_selector_all(&format!(".{ACTIVE_CLASS}")) {
			for i in 0..active.length() {
				let Some(other) = active.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok())
				else {
					continue;
				};
				if &other != block {
					let _ = other.class_list().remove_1(ACTIVE_CLASS);
				}
			}
		}
		let _ = block.class_list().add_1(ACTIVE_CLASS);
	}

	fn reset_blocks(&mut self) {
		let selector = format!(".{ACTIVE_CLASS}, .{SHIFTED_CLASS}");
		let Ok(blocks) = self.content.query_selector_all(&selector) else {
			return;
		};
		for i in 0..blocks.length() {
			if let Some(block) = blocks.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) {
				clear_shift(&block);
			}
		}
	}

	fn scroll_top(&self) -> f64 {
		self.pane.scroll_top() as f64
	}

	fn scroll_range(&self) -> f64 {
		(self.pane.scroll_height() - self.pane.client_height()).max(0) as f64
	}

	fn client_height(&self) -> f64 {
		self.pane.client_height() as f64
	}

	fn set_scroll_top(&mut self, top: f64) {
		self.pane.set_scroll_top(top.round() as i32);
	}

	fn set_spacers(&mut self, top: f64, bottom: f64) {
		let style = self.content.style();
		let _ = style.set_property(SPACER_TOP, &format!("{top:.3}px"));
		let _ = style.set_property(SPACER_BOTTOM, &format!("{bottom:.3}px"));
	}

	fn flush_layout(&mut self) {
		let _ = self.pane.offset_height();
	}

	fn viewport_width(&self) -> f64 {
		web_sys::window()
			.and_then(|w| w.inner_width().ok())
			.and_then(|w| w.as_f64())
			.unwrap_or(0.0)
	}
}
