//! Mentions in the article text and the threads that link them.
//!
//! Everything here works on plain attribute values so it can be tested
//! without a document; `reader` reads the attributes off the DOM.

use std::collections::{BTreeMap, HashMap};

use crate::components::string_map::model::GraphModel;
use crate::components::string_map::paths::{PathIds, resolve_path, thread_auto_path};

/// Elements carrying any of these attributes are mentions.
pub const MENTION_SELECTOR: &str =
	"[data-graph-path], [data-thread], [data-thread-source], [data-thread-placeholder]";

/// Data attributes of one mention element plus its enclosing section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkerAttrs {
	pub path: Option<String>,
	pub thread: Option<String>,
	pub thread_source: Option<String>,
	pub thread_placeholder: Option<String>,
	pub section: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
	value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl MarkerAttrs {
	/// First non-empty of the three thread attributes.
	pub fn thread_id(&self) -> Option<&str> {
		non_empty(&self.thread)
			.or_else(|| non_empty(&self.thread_source))
			.or_else(|| non_empty(&self.thread_placeholder))
	}

	pub fn path_spec(&self) -> Option<&str> {
		non_empty(&self.path)
	}

	pub fn section_id(&self) -> Option<&str> {
		non_empty(&self.section)
	}
}

/// Automatic path per thread id, through the sections its mentions sit in
/// (document order).
pub fn thread_auto_paths<'a>(
	model: &GraphModel,
	markers: impl IntoIterator<Item = &'a MarkerAttrs>,
) -> HashMap<String, PathIds> {
	let mut sections_by_thread: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
	for marker in markers {
		let Some(thread_id) = marker.thread_id() else {
			continue;
		};
		let sections = sections_by_thread.entry(thread_id).or_default();
		if let Some(section) = marker.section_id() {
			sections.push(section);
		}
	}
	sections_by_thread
		.into_iter()
		.map(|(thread_id, sections)| {
			(thread_id.to_string(), thread_auto_path(model, sections))
		})
		.collect()
}

/// Ids a mention lights up: its path spec, else its thread's automatic path,
/// else its section's node.
pub fn marker_ids(
	model: &GraphModel,
	marker: &MarkerAttrs,
	auto_paths: &HashMap<String, PathIds>,
) -> PathIds {
	if let Some(spec) = marker.path_spec() {
		return resolve_path(model, spec);
	}
	if let Some(auto) = marker.thread_id().and_then(|id| auto_paths.get(id)) {
		return auto.clone();
	}
	PathIds {
		node_ids: marker
			.section_id()
			.map(|section| model.section_node_ids(section))
			.unwrap_or_default(),
		edge_ids: Vec::new(),
	}
}

/// One stop of a thread. `M` is whatever identifies the marker element.
#[derive(Clone, Debug, PartialEq)]
pub struct ThreadMention<M> {
	pub marker: M,
	pub thread_id: String,
	pub section_id: String,
	pub ids: PathIds,
}

/// First later mention (wrapping) in another section; if every mention
/// shares a section, simply the next one.
pub fn find_next_thread_index<M>(mentions: &[ThreadMention<M>], current: usize) -> Option<usize> {
	if mentions.is_empty() {
		return None;
	}
	let len = mentions.len();
	let section = mentions.get(current).map(|m| m.section_id.as_str());
	(1..len)
		.map(|offset| (current + offset) % len)
		.find(|&index| Some(mentions[index].section_id.as_str()) != section)
		.or(Some((current + 1) % len))
}

/// Mentions grouped by thread id, in document order.
#[derive(Clone, Debug)]
pub struct Threads<M> {
	by_id: BTreeMap<String, Vec<ThreadMention<M>>>,
}

impl<M> Default for Threads<M> {
	fn default() -> Self {
		Self {
			by_id: BTreeMap::new(),
		}
	}
}

impl<M: PartialEq> Threads<M> {
	/// Registers a `[data-thread]` marker. Markers outside a section, or
	/// without a thread id, do not join. Returns whether it joined.
	pub fn add(
		&mut self,
		model: &GraphModel,
		marker: M,
		attrs: &MarkerAttrs,
		ids: PathIds,
	) -> bool {
		let (Some(thread_id), Some(section_id)) = (non_empty(&attrs.thread), attrs.section_id())
		else {
			return false;
		};
		let ids = if ids.node_ids.is_empty() {
			PathIds {
				node_ids: model.section_node_ids(section_id),
				edge_ids: ids.edge_ids,
			}
		} else {
			ids
		};
		self.by_id
			.entry(thread_id.to_string())
			.or_default()
			.push(ThreadMention {
				marker,
				thread_id: thread_id.to_string(),
				section_id: section_id.to_string(),
				ids,
			});
		true
	}

	pub fn mentions(&self, thread_id: &str) -> &[ThreadMention<M>] {
		self.by_id.get(thread_id).map_or(&[], Vec::as_slice)
	}

	/// Where activating `marker` jumps to. Needs at least two mentions and
	/// never answers the marker itself.
	pub fn next_after(&self, thread_id: &str, marker: &M) -> Option<&ThreadMention<M>> {
		let mentions = self.mentions(thread_id);
		if mentions.len() < 2 {
			return None;
		}
		let current = mentions.iter().position(|m| &m.marker == marker)?;
		let next = find_next_thread_index(mentions, current)?;
		(next != current).then(|| &mentions[next])
	}

	pub fn len(&self) -> usize {
		self.by_id.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_id.is_empty()
	}
}
