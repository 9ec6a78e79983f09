//! Context preview: on wide screens, hovering a mention or a map node shows
//! a short excerpt of the section it leads to in a side panel.

use std::cell::Cell;

use web_sys::{Document, Element, HtmlElement};

use super::threads::Threads;
use crate::components::string_map::model::GraphModel;

/// Longest excerpt taken from one paragraph.
pub const PARAGRAPH_CHARS: usize = 220;
/// Longest excerpt taken from a mention's own text.
pub const FOCUS_CHARS: usize = 180;
const MAX_PARAGRAPHS: usize = 3;
const PARAGRAPH_SELECTOR: &str = "p, li, blockquote";
const EMPTY_TEXT: &str = "No preview text available.";

/// What put the current preview up. A leave event only clears its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewSource {
	Graph,
	Text,
}

/// Collapses whitespace and cuts to `max_chars`, marking the cut with `...`.
pub fn trim_preview_text(value: &str, max_chars: usize) -> String {
	let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
	if normalized.chars().count() <= max_chars {
		return normalized;
	}
	let cut: String = normalized.chars().take(max_chars.saturating_sub(1)).collect();
	format!("{}...", cut.trim_end())
}

/// Section a hovered mention previews, plus the mention whose text is shown
/// in bold (the thread's next stop).
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewTarget<'a, M> {
	pub section_id: String,
	pub focus: Option<&'a M>,
}

/// Picks what to preview for a mention: its thread's next stop, else the
/// first highlighted node living in another section, else its own section.
pub fn resolve_preview_target<'a, M: PartialEq>(
	threads: &'a Threads<M>,
	model: &GraphModel,
	marker: &M,
	thread_id: Option<&str>,
	section_id: Option<&str>,
	node_ids: &[String],
) -> Option<PreviewTarget<'a, M>> {
	if let Some(next) = thread_id.and_then(|id| threads.next_after(id, marker)) {
		return Some(PreviewTarget {
			section_id: next.section_id.clone(),
			focus: Some(&next.marker),
		});
	}

	let candidates: Vec<&str> = node_ids
		.iter()
		.filter_map(|id| model.section_for_node(id))
		.collect();
	let other = candidates.iter().find(|&&c| Some(c) != section_id);
	if let Some(&target) = other.or(candidates.first()) {
		return Some(PreviewTarget {
			section_id: target.to_string(),
			focus: None,
		});
	}

	section_id.map(|id| PreviewTarget {
		section_id: id.to_string(),
		focus: None,
	})
}

/// Whether a leave from `source` may clear what is currently shown.
pub fn may_clear(active: Option<PreviewSource>, source: PreviewSource) -> bool {
	!matches!(active, Some(active) if active != source)
}

/// Heading text of a section, or its id when it has none.
pub fn section_heading(section: &Element) -> String {
	section
		.query_selector("h2")
		.ok()
		.flatten()
		.and_then(|h| h.text_content())
		.map(|t| t.trim().to_string())
		.filter(|t| !t.is_empty())
		.unwrap_or_else(|| section.id())
}

fn section_paragraphs(section: &Element) -> Vec<String> {
	let Ok(blocks) = section.query_selector_all(PARAGRAPH_SELECTOR) else {
		return Vec::new();
	};
	(0..blocks.length())
		.filter_map(|i| blocks.item(i))
		.filter_map(|node| node.text_content())
		.map(|text| trim_preview_text(&text, PARAGRAPH_CHARS))
		.filter(|text| !text.is_empty())
		.take(MAX_PARAGRAPHS)
		.collect()
}

/// The side panel. Does nothing below the desktop breakpoint.
pub struct PreviewPane {
	title: Element,
	meta: Element,
	body: Element,
	min_width: f64,
	active: Cell<Option<PreviewSource>>,
}

impl PreviewPane {
	/// Finds the title, meta and body slots inside `root`.
	pub fn new(root: &HtmlElement, min_width: f64) -> Option<Self> {
		let slot = |class: &str| root.query_selector(&format!(".{class}")).ok().flatten();
		Some(Self {
			title: slot("context-preview-title")?,
			meta: slot("context-preview-meta")?,
			body: slot("context-preview-body")?,
			min_width,
			active: Cell::new(None),
		})
	}

	pub fn is_enabled(&self) -> bool {
		web_sys::window()
			.and_then(|w| w.inner_width().ok())
			.and_then(|w| w.as_f64())
			.is_some_and(|w| w >= self.min_width)
	}

	/// Shows up to three paragraphs of `section`, led by `focus_text` in bold.
	pub fn show(
		&self,
		section: &Element,
		title: Option<String>,
		focus_text: &str,
		source: PreviewSource,
	) {
		if !self.is_enabled() {
			return;
		}
		let Some(document) = section.owner_document() else {
			return;
		};
		let title = title
			.filter(|t| !t.is_empty())
			.unwrap_or_else(|| section_heading(section));
		self.title
			.set_text_content(Some(if title.is_empty() { "Context" } else { title.as_str() }));
		self.meta.set_text_content(Some(""));
		self.body.set_inner_html("");

		let focus = trim_preview_text(focus_text, PARAGRAPH_CHARS);
		let paragraphs = section_paragraphs(section);
		if focus.is_empty() && paragraphs.is_empty() {
			self.append_paragraph(&document, EMPTY_TEXT, false);
		} else {
			if !focus.is_empty() {
				self.append_paragraph(&document, &focus, true);
			}
			for paragraph in &paragraphs {
				self.append_paragraph(&document, paragraph, false);
			}
		}
		self.active.set(Some(source));
	}

	fn append_paragraph(&self, document: &Document, text: &str, strong: bool) {
		let Ok(p) = document.create_element("p") else {
			return;
		};
		if strong {
			let Ok(bold) = document.create_element("strong") else {
				return;
			};
			bold.set_text_content(Some(text));
			let _ = p.append_child(&bold);
		} else {
			p.set_text_content(Some(text));
		}
		let _ = self.body.append_child(&p);
	}

	/// Empties the panel unless another source put the preview up.
	pub fn clear(&self, source: PreviewSource) {
		if !may_clear(self.active.get(), source) {
			return;
		}
		self.clear_all();
	}

	pub fn clear_all(&self) {
		self.active.set(None);
		for slot in [&self.title, &self.meta, &self.body] {
			slot.set_text_content(Some(""));
		}
	}
}

/// Text of a mention as shown at the head of a preview.
pub fn focus_text(marker: &Element) -> String {
	marker
		.text_content()
		.map(|t| trim_preview_text(&t, FOCUS_CHARS))
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::article::threads::{MarkerAttrs, ThreadMention, find_next_thread_index};
	use crate::components::string_map::paths::PathIds;
	use crate::components::string_map::types::{GraphConfig, GraphNode};

	fn model() -> GraphModel {
		let node = |id: &str, section: &str| GraphNode {
			id: id.into(),
			section: Some(section.into()),
			..Default::default()
		};
		GraphModel::new(&GraphConfig {
			nodes: vec![node("a", "intro"), node("b", "mid"), node("c", "outro")],
			..Default::default()
		})
	}

	fn thread_marker(section: &str) -> MarkerAttrs {
		MarkerAttrs {
			thread: Some("t".into()),
			section: Some(section.into()),
			..Default::default()
		}
	}

	#[test]
	fn trims_whitespace_and_long_text() {
		assert_eq!(trim_preview_text("  a \n\t b  ", 10), "a b");
		assert_eq!(trim_preview_text("", 10), "");
		assert_eq!(trim_preview_text("abcdef", 6), "abcdef");
		assert_eq!(trim_preview_text("abc defgh", 5), "abc...");
		assert_eq!(trim_preview_text("ééééé", 3), "éé...");
	}

	#[test]
	fn thread_mention_previews_the_next_stop() {
		let model = model();
		let mut threads = Threads::default();
		for (marker, section) in [(1, "intro"), (2, "intro"), (3, "outro")] {
			threads.add(&model, marker, &thread_marker(section), PathIds::default());
		}
		let target = resolve_preview_target(&threads, &model, &1, Some("t"), Some("intro"), &[]);
		assert_eq!(
			target,
			Some(PreviewTarget {
				section_id: "outro".into(),
				focus: Some(&3),
			})
		);
		let mentions: Vec<ThreadMention<u32>> = threads.mentions("t").to_vec();
		assert_eq!(find_next_thread_index(&mentions, 0), Some(2));
	}

	#[test]
	fn path_mention_prefers_another_section() {
		let model = model();
		let threads = Threads::<u32>::default();
		let ids = ["a".to_string(), "c".to_string()];
		let target = resolve_preview_target(&threads, &model, &1, None, Some("intro"), &ids);
		assert_eq!(target.map(|t| t.section_id), Some("outro".to_string()));

		let own = ["a".to_string()];
		let target = resolve_preview_target(&threads, &model, &1, None, Some("intro"), &own);
		assert_eq!(target.map(|t| t.section_id), Some("intro".to_string()));
	}

	#[test]
	fn falls_back_to_own_section_or_nothing() {
		let model = model();
		let threads = Threads::<u32>::default();
		let lone = resolve_preview_target(&threads, &model, &1, Some("t"), Some("mid"), &[]);
		assert_eq!(lone.map(|t| t.section_id), Some("mid".to_string()));
		assert_eq!(resolve_preview_target(&threads, &model, &1, None, None, &[]), None);
	}

	#[test]
	fn leave_only_clears_its_own_preview() {
		assert!(may_clear(None, PreviewSource::Text));
		assert!(may_clear(Some(PreviewSource::Graph), PreviewSource::Graph));
		assert!(!may_clear(Some(PreviewSource::Graph), PreviewSource::Text));
	}
}
