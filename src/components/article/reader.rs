use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use log::{debug, info};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, EventTarget, HtmlElement, KeyboardEvent, MouseEvent};

use super::preview::{PreviewPane, PreviewSource, focus_text, resolve_preview_target};
use super::threads::{
	MENTION_SELECTOR, MarkerAttrs, ThreadMention, Threads, marker_ids, thread_auto_paths,
};
use crate::anchor::dom::DomSurface;
use crate::anchor::{AnchorEngine, AnchorSurface, Offset, SettleOutcome};
use crate::components::string_map::paths::PathIds;
use crate::components::string_map::{MapHandle, now_ms};
use crate::config::AnchorConfig;

const ACTIVE_SECTION: &str = "active";
const DRAG_IGNORE: &str = ".graph-thread, a, button, input, textarea, select";

type Listener = Closure<dyn FnMut(Event)>;

struct Inner {
	pane: HtmlElement,
	content: HtmlElement,
	map: MapHandle,
	sections: Vec<HtmlElement>,
	selected: RefCell<Option<String>>,
	anchor: RefCell<AnchorEngine>,
	threads: RefCell<Threads<Element>>,
	preview: Option<PreviewPane>,
	drag_block: RefCell<Option<HtmlElement>>,
	jump_seq: Cell<u32>,
	listeners: RefCell<Vec<Listener>>,
	window_listeners: RefCell<Vec<(&'static str, Listener)>>,
}

impl Drop for Inner {
	fn drop(&mut self) {
		let Some(window) = web_sys::window() else {
			return;
		};
		for (kind, listener) in self.window_listeners.get_mut().drain(..) {
			let _ =
				window.remove_event_listener_with_callback(kind, listener.as_ref().unchecked_ref());
		}
	}
}

/// Drives the loaded article: one visible section at a time, mentions that
/// light up the map, threads that jump between sections while keeping the
/// clicked line in place, and draggable context blocks.
#[derive(Clone)]
pub struct ArticleReader(Rc<Inner>);

fn query_all(root: &Element, selector: &str) -> Vec<Element> {
	let Ok(list) = root.query_selector_all(selector) else {
		return Vec::new();
	};
	(0..list.length())
		.filter_map(|i| list.item(i))
		.filter_map(|node| node.dyn_into::<Element>().ok())
		.collect()
}

fn attr(element: &Element, name: &str) -> Option<String> {
	element
		.get_attribute(name)
		.map(|v| v.trim().to_string())
		.filter(|v| !v.is_empty())
}

fn section_of(element: &Element) -> Option<String> {
	element
		.closest("section[id]")
		.ok()
		.flatten()
		.map(|section| section.id())
		.filter(|id| !id.is_empty())
}

fn marker_attrs(marker: &Element) -> MarkerAttrs {
	MarkerAttrs {
		path: marker.get_attribute("data-graph-path"),
		thread: marker.get_attribute("data-thread"),
		thread_source: marker.get_attribute("data-thread-source"),
		thread_placeholder: marker.get_attribute("data-thread-placeholder"),
		section: section_of(marker),
	}
}

fn naturally_focusable(element: &Element) -> bool {
	match element.tag_name().to_ascii_lowercase().as_str() {
		"a" => element.has_attribute("href"),
		"button" | "input" | "select" | "textarea" => true,
		_ => false,
	}
}

/// Copies each thread source's markup into its placeholders; both end up
/// carrying `data-thread`.
fn hydrate_thread_placeholders(content: &Element) {
	let mut markup: HashMap<String, String> = HashMap::new();
	for source in query_all(content, "[data-thread-source]") {
		let Some(thread_id) = attr(&source, "data-thread-source") else {
			continue;
		};
		if markup.contains_key(&thread_id) {
			continue;
		}
		markup.insert(thread_id.clone(), source.inner_html());
		if attr(&source, "data-thread").is_none() {
			let _ = source.set_attribute("data-thread", &thread_id);
		}
	}

	for placeholder in query_all(content, "[data-thread-placeholder]") {
		let Some(thread_id) = attr(&placeholder, "data-thread-placeholder") else {
			continue;
		};
		let Some(html) = markup.get(&thread_id) else {
			continue;
		};
		placeholder.set_inner_html(html);
		if attr(&placeholder, "data-thread").is_none() {
			let _ = placeholder.set_attribute("data-thread", &thread_id);
		}
	}
}

fn next_frame(f: impl FnOnce() + 'static) {
	let Some(window) = web_sys::window() else {
		return;
	};
	let callback = Closure::once_into_js(move |_ts: f64| f());
	let _ = window.request_animation_frame(callback.unchecked_ref());
}

impl ArticleReader {
	/// Wires up freshly rendered article markup inside `content`, then
	/// selects the section named by the URL hash.
	pub fn install(
		pane: HtmlElement,
		content: HtmlElement,
		preview: Option<HtmlElement>,
		map: MapHandle,
		config: AnchorConfig,
	) -> Self {
		hydrate_thread_placeholders(&content);
		let sections: Vec<HtmlElement> = query_all(&content, "section[id]")
			.into_iter()
			.filter_map(|s| s.dyn_into::<HtmlElement>().ok())
			.collect();
		for section in &sections {
			let _ = section.class_list().add_1("article-section");
		}

		let preview =
			preview.and_then(|root| PreviewPane::new(&root, config.desktop_preview_width_px));
		let reader = Self(Rc::new(Inner {
			pane,
			content,
			map,
			sections,
			selected: RefCell::new(None),
			anchor: RefCell::new(AnchorEngine::new(config)),
			threads: RefCell::new(Threads::default()),
			preview,
			drag_block: RefCell::new(None),
			jump_seq: Cell::new(0),
			listeners: RefCell::new(Vec::new()),
			window_listeners: RefCell::new(Vec::new()),
		}));

		reader.install_context_shift();
		reader.install_mentions();
		reader.listen_window("resize", |reader, _| {
			if let Some(preview) = reader.0.preview.as_ref().filter(|p| !p.is_enabled()) {
				preview.clear_all();
			}
		});
		reader.restore_hash();
		info!(
			"article reader installed: {} sections, {} threads",
			reader.0.sections.len(),
			reader.0.threads.borrow().len()
		);
		reader
	}

	fn surface(&self) -> DomSurface {
		DomSurface::new(self.0.pane.clone(), self.0.content.clone())
			.with_selected_section(self.selected_section())
	}

	fn section(&self, section_id: &str) -> Option<&HtmlElement> {
		self.0.sections.iter().find(|s| s.id() == section_id)
	}

	fn callback(&self, mut f: impl FnMut(&ArticleReader, Event) + 'static) -> Listener {
		let weak: Weak<Inner> = Rc::downgrade(&self.0);
		Closure::new(move |event: Event| {
			if let Some(inner) = weak.upgrade() {
				f(&ArticleReader(inner), event);
			}
		})
	}

	fn listen(
		&self,
		target: &EventTarget,
		kind: &str,
		f: impl FnMut(&ArticleReader, Event) + 'static,
	) {
		let listener = self.callback(f);
		let _ = target.add_event_listener_with_callback(kind, listener.as_ref().unchecked_ref());
		self.0.listeners.borrow_mut().push(listener);
	}

	fn listen_window(&self, kind: &'static str, f: impl FnMut(&ArticleReader, Event) + 'static) {
		let Some(window) = web_sys::window() else {
			return;
		};
		let listener = self.callback(f);
		let _ = window.add_event_listener_with_callback(kind, listener.as_ref().unchecked_ref());
		self.0.window_listeners.borrow_mut().push((kind, listener));
	}

	pub fn selected_section(&self) -> Option<String> {
		self.0.selected.borrow().clone()
	}

	// --- sections ---

	/// Shows exactly one section and drops all context shift state.
	fn select_section(&self, section_id: &str) -> bool {
		if !self.0.sections.iter().any(|s| s.id() == section_id) {
			return false;
		}
		*self.0.selected.borrow_mut() = Some(section_id.to_string());
		for section in &self.0.sections {
			let active = section.id() == section_id;
			let classes = section.class_list();
			let _ = classes.toggle_with_force(ACTIVE_SECTION, active);
			let _ = classes.toggle_with_force("is-hidden", !active);
			section.set_hidden(!active);
		}
		self.0.drag_block.borrow_mut().take();
		self.0.anchor.borrow_mut().reset(&mut self.surface());
		true
	}

	fn sync_map(&self, section_id: &str, focus: bool) {
		self.0
			.map
			.with(|s| s.select_section(section_id, focus, now_ms()));
	}

	/// Selects a section, scrolls the pane to its top and records it in the
	/// URL hash.
	pub fn scroll_to_section(&self, section_id: &str, focus: bool) {
		if !self.select_section(section_id) {
			debug!("no section named {section_id}");
			return;
		}
		self.sync_map(section_id, focus);
		self.0.pane.set_scroll_top(0);
		if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
			let _ = history.replace_state_with_url(
				&JsValue::NULL,
				"",
				Some(&format!("#{section_id}")),
			);
		}
	}

	fn restore_hash(&self) {
		let hash = web_sys::window()
			.and_then(|w| w.location().hash().ok())
			.unwrap_or_default();
		let hash = hash.trim_start_matches('#');
		let hash = js_sys::decode_uri_component(hash)
			.map(String::from)
			.unwrap_or_else(|_| hash.to_string());
		let hash = hash.trim();

		if !hash.is_empty() && self.0.sections.iter().any(|s| s.id() == hash) {
			self.scroll_to_section(hash, false);
			return;
		}
		if let Some(first) = self.0.sections.first().map(|s| s.id()) {
			self.select_section(&first);
			self.sync_map(&first, false);
		}
	}

	// --- mentions ---

	fn install_mentions(&self) {
		let markers: Vec<(Element, MarkerAttrs)> = query_all(&self.0.content, MENTION_SELECTOR)
			.into_iter()
			.map(|marker| {
				let attrs = marker_attrs(&marker);
				(marker, attrs)
			})
			.collect();

		let resolved: Vec<(Element, MarkerAttrs, PathIds, bool)> = self.0.map.read(|state| {
			let model = state.model();
			let auto = thread_auto_paths(model, markers.iter().map(|(_, attrs)| attrs));
			let mut threads = self.0.threads.borrow_mut();
			markers
				.into_iter()
				.map(|(marker, attrs)| {
					let ids = marker_ids(model, &attrs, &auto);
					let joined = threads.add(model, marker.clone(), &attrs, ids.clone());
					(marker, attrs, ids, joined)
				})
				.collect()
		});

		for (marker, attrs, ids, joined) in resolved {
			let _ = marker.class_list().add_1("graph-mention");
			if !ids.is_empty() {
				self.install_mention_hover(&marker, &attrs, ids);
			}
			if let (true, Some(thread_id)) = (joined, attrs.thread.as_deref()) {
				let _ = marker.class_list().add_1("graph-thread");
				self.install_thread_link(&marker, thread_id.trim().to_string());
			}
		}
	}

	fn install_mention_hover(&self, marker: &Element, attrs: &MarkerAttrs, ids: PathIds) {
		let ids = Rc::new(ids);
		let thread_id: Option<Rc<str>> = attrs.thread_id().map(Rc::from);
		let section_id: Option<Rc<str>> = attrs.section_id().map(Rc::from);
		for kind in ["mouseenter", "focus"] {
			let (marker_enter, ids) = (marker.clone(), ids.clone());
			let (thread_id, section_id) = (thread_id.clone(), section_id.clone());
			self.listen(marker, kind, move |reader, _| {
				let _ = marker_enter.class_list().add_1("is-active");
				reader.center_on(&ids);
				reader.preview_mention(
					&marker_enter,
					thread_id.as_deref(),
					section_id.as_deref(),
					&ids.node_ids,
				);
			});
		}
		for kind in ["mouseleave", "blur"] {
			let marker_leave = marker.clone();
			self.listen(marker, kind, move |reader, _| {
				let _ = marker_leave.class_list().remove_1("is-active");
				reader.0.map.with(|s| s.clear_highlighted_path());
				if let Some(preview) = &reader.0.preview {
					preview.clear(PreviewSource::Text);
				}
			});
		}
	}

	fn center_on(&self, ids: &PathIds) {
		let now = now_ms();
		self.0.map.with(|s| {
			s.set_highlighted_path(&ids.edge_ids, &ids.node_ids);
			s.focus_nodes(&ids.node_ids, now);
		});
	}

	// --- preview ---

	fn preview_mention(
		&self,
		marker: &Element,
		thread_id: Option<&str>,
		section_id: Option<&str>,
		node_ids: &[String],
	) {
		let Some(preview) = self.0.preview.as_ref().filter(|p| p.is_enabled()) else {
			return;
		};
		let target = self.0.map.read(|state| {
			let threads = self.0.threads.borrow();
			let target =
				resolve_preview_target(&threads, state.model(), marker, thread_id, section_id, node_ids)
					.map(|target| (target.section_id, target.focus.map(focus_text)));
			target
		});
		let Some((target_section, focus)) = target else {
			return;
		};
		if let Some(section) = self.section(&target_section) {
			preview.show(section, None, focus.as_deref().unwrap_or(""), PreviewSource::Text);
		}
	}

	/// Map hover: previews the hovered node's section under the node's label,
	/// or clears a map preview when the pointer leaves the node.
	pub fn preview_node(&self, node_id: Option<&str>) {
		let Some(preview) = &self.0.preview else {
			return;
		};
		let Some(node_id) = node_id else {
			preview.clear(PreviewSource::Graph);
			return;
		};
		let found = self.0.map.read(|state| {
			let model = state.model();
			let section = model.section_for_node(node_id)?.to_string();
			let label = model.node(node_id).and_then(|n| n.label.clone());
			Some((section, label))
		});
		let Some((section_id, label)) = found else {
			return;
		};
		if let Some(section) = self.section(&section_id) {
			preview.show(section, label, "", PreviewSource::Graph);
		}
	}

	// --- threads ---

	fn install_thread_link(&self, marker: &Element, thread_id: String) {
		if !naturally_focusable(marker) && !marker.has_attribute("tabindex") {
			let _ = marker.set_attribute("tabindex", "0");
		}

		let (click_marker, click_thread) = (marker.clone(), thread_id.clone());
		self.listen(marker, "click", move |reader, event| {
			event.prevent_default();
			reader.cycle_thread(&click_thread, &click_marker);
		});

		let key_marker = marker.clone();
		self.listen(marker, "keydown", move |reader, event| {
			let Some(key) = event.dyn_ref::<KeyboardEvent>().map(|k| k.key()) else {
				return;
			};
			if key == "Enter" || key == " " {
				event.prevent_default();
				reader.cycle_thread(&thread_id, &key_marker);
			}
		});
	}

	/// Jumps to the thread's next mention, keeping the activated marker's
	/// on-screen spot as the landing point.
	pub fn cycle_thread(&self, thread_id: &str, marker: &Element) {
		let target = self.0.threads.borrow().next_after(thread_id, marker).cloned();
		let Some(target) = target else {
			return;
		};
		let desired = self.surface().with_marker(marker.clone()).marker_point();
		self.jump_to(target, desired);
	}

	fn jump_to(&self, target: ThreadMention<Element>, desired: Option<Offset>) {
		self.scroll_to_section(&target.section_id, false);
		self.0.anchor.borrow_mut().begin_jump();
		let seq = self.0.jump_seq.get().wrapping_add(1);
		self.0.jump_seq.set(seq);

		let reader = self.clone();
		next_frame(move || {
			if reader.0.jump_seq.get() != seq {
				return;
			}
			reader.center_on(&target.ids);
			reader.activate_thread_mention(&target);
			reader.settle(target.marker, desired, seq);
		});
	}

	fn activate_thread_mention(&self, target: &ThreadMention<Element>) {
		for mention in self.0.threads.borrow().mentions(&target.thread_id) {
			let _ = mention.marker.class_list().remove_1("is-thread-active");
		}
		let _ = target.marker.class_list().add_1("is-thread-active");
	}

	/// One settle pass per frame until the anchor converges or gives up.
	/// A newer jump, a drag or a section change stops the chain.
	fn settle(&self, marker: Element, desired: Option<Offset>, seq: u32) {
		if self.0.jump_seq.get() != seq {
			return;
		}
		let mut surface = self.surface().with_marker(marker.clone());
		let outcome = self.0.anchor.borrow_mut().settle_pass(
			&mut surface,
			desired.map(|d| d.y),
			desired.map(|d| d.x),
		);
		let reader = self.clone();
		match outcome {
			SettleOutcome::Pending => next_frame(move || reader.settle(marker, desired, seq)),
			SettleOutcome::Converged | SettleOutcome::GaveUp => next_frame(move || {
				if reader.0.jump_seq.get() == seq {
					reader.0.anchor.borrow_mut().finish_jump(&reader.surface());
				}
			}),
			SettleOutcome::Cancelled => {}
		}
	}

	// --- context shift ---

	fn install_context_shift(&self) {
		let pane = &self.0.pane;
		self.listen(pane, "mousedown", |reader, event| {
			let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
				return;
			};
			reader.begin_block_drag(mouse);
		});
		self.listen(pane, "scroll", |reader, _| {
			let mut surface = reader.surface();
			reader.0.anchor.borrow_mut().on_pane_scroll(&mut surface);
		});

		self.listen_window("mousemove", |reader, event| {
			let Some(block) = reader.0.drag_block.borrow().clone() else {
				return;
			};
			let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
				return;
			};
			mouse.prevent_default();
			let mut surface = reader.surface().with_block(block);
			reader.0.anchor.borrow_mut().drag_to(
				&mut surface,
				mouse.client_x() as f64,
				mouse.client_y() as f64,
			);
		});
		self.listen_window("mouseup", |reader, _| {
			if reader.0.drag_block.borrow_mut().take().is_some() {
				reader.0.anchor.borrow_mut().end_drag();
			}
		});
	}

	fn begin_block_drag(&self, mouse: &MouseEvent) {
		if mouse.button() != 0 {
			return;
		}
		let Some(target) = mouse.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
			return;
		};
		if target.closest(DRAG_IGNORE).ok().flatten().is_some() {
			return;
		}
		let Some(block) = target
			.closest(".context-shift-active")
			.ok()
			.flatten()
			.and_then(|b| b.dyn_into::<HtmlElement>().ok())
		else {
			return;
		};
		if section_of(&block) != self.selected_section() {
			return;
		}

		let surface = self.surface().with_block(block.clone());
		self.0.anchor.borrow_mut().begin_drag(
			&surface,
			mouse.client_x() as f64,
			mouse.client_y() as f64,
		);
		*self.0.drag_block.borrow_mut() = Some(block);
	}
}
