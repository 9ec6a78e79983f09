use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::types::{GraphConfig, GraphEdge, GraphNode};
use crate::audio::SizeRange;

pub const DEFAULT_NODE_SIZE: f64 = 17.0;
pub const MIN_NODE_SIZE: f64 = 6.0;
pub const DEFAULT_IMPORTANCE: u32 = 3;
pub const DEFAULT_SIZE_RANGE: SizeRange = SizeRange {
	min: 10.0,
	max: 24.0,
};

/// Which palette entry a node is painted with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeTone {
	Accent,
	Neutral,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	pub tone: NodeTone,
	pub alpha: f64,
	pub highlight_alpha: f64,
	pub border_width: f64,
	/// Explicit color from the configuration, overriding the tone.
	pub color: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ModelNode {
	pub id: String,
	pub section: String,
	pub label: Option<String>,
	pub level: u32,
	pub base_size: f64,
	pub font_size: f64,
	pub style: NodeStyle,
}

#[derive(Clone, Debug)]
pub struct ModelEdge {
	pub id: String,
	pub from: String,
	pub to: String,
	pub width: f64,
}

/// Adjacency keyed by node id. Ordered sets give BFS a lowest-id tie-break.
pub type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Nodes, edges and the lookup tables derived from them.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	nodes: Vec<ModelNode>,
	node_index: HashMap<String, usize>,
	edges: Vec<ModelEdge>,
	edge_index: HashMap<String, usize>,
	section_by_node: HashMap<String, String>,
	node_by_section: HashMap<String, String>,
	edge_by_pair: HashMap<String, String>,
	edges_by_node: HashMap<String, Vec<String>>,
	adjacency: Adjacency,
	size_range: Option<SizeRange>,
}

pub fn pair_key(from: &str, to: &str) -> String {
	format!("{from}->{to}")
}

/// `important: true` wins, then a numeric `importance >= 1`, else the default.
pub fn importance_level(node: &GraphNode) -> u32 {
	if node.important == Some(true) {
		return 1;
	}
	match node.importance {
		Some(value) if value.is_finite() && value >= 1.0 => value.round() as u32,
		_ => DEFAULT_IMPORTANCE,
	}
}

pub fn max_importance_level(nodes: &[GraphNode]) -> u32 {
	nodes
		.iter()
		.map(importance_level)
		.fold(DEFAULT_IMPORTANCE, u32::max)
}

/// Style attributes derived from how important a node is relative to the
/// least important node in the graph. Level 1 is the most important.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImportanceStyle {
	pub alpha: f64,
	pub highlight_alpha: f64,
	pub size_delta: f64,
	pub border_width: f64,
	pub tone: NodeTone,
}

pub fn importance_style(level: u32, max_level: u32) -> ImportanceStyle {
	let span = max_level.saturating_sub(1).max(1) as f64;
	let t = ((level as f64 - 1.0) / span).clamp(0.0, 1.0);
	let emphasis = 1.0 - t;
	let alpha = 0.22 + emphasis * 0.78;
	let accent = level <= 2;
	ImportanceStyle {
		alpha,
		highlight_alpha: (alpha + 0.15).min(1.0),
		size_delta: ((emphasis - 0.5) * 8.0).round(),
		border_width: if accent { 2.0 } else { 1.0 },
		tone: if accent {
			NodeTone::Accent
		} else {
			NodeTone::Neutral
		},
	}
}

impl GraphModel {
	pub fn new(config: &GraphConfig) -> Self {
		let mut model = Self::default();
		let max_level = max_importance_level(&config.nodes);

		for node in &config.nodes {
			let section = node.section.clone().unwrap_or_default();
			let level = importance_level(node);
			let style = importance_style(level, max_level);
			let base_size = (node.size.unwrap_or(DEFAULT_NODE_SIZE) + style.size_delta).max(MIN_NODE_SIZE);

			model
				.section_by_node
				.insert(node.id.clone(), section.clone());
			model
				.node_by_section
				.insert(section.clone(), node.id.clone());
			model.node_index.insert(node.id.clone(), model.nodes.len());
			model.nodes.push(ModelNode {
				id: node.id.clone(),
				section,
				label: node.label.clone(),
				level,
				base_size,
				font_size: node.font_size.unwrap_or(18.0),
				style: NodeStyle {
					tone: style.tone,
					alpha: style.alpha,
					highlight_alpha: style.highlight_alpha,
					border_width: node.border_width.unwrap_or(style.border_width),
					color: node.color.clone(),
				},
			});
		}

		for (index, edge) in config.edges.iter().enumerate() {
			model.add_edge(index, edge);
		}

		model.size_range = model
			.nodes
			.iter()
			.map(|n| n.base_size)
			.filter(|s| s.is_finite())
			.fold(None, |range: Option<SizeRange>, size| {
				Some(match range {
					Some(r) => SizeRange {
						min: r.min.min(size),
						max: r.max.max(size),
					},
					None => SizeRange {
						min: size,
						max: size,
					},
				})
			});
		model
	}

	fn add_edge(&mut self, index: usize, edge: &GraphEdge) {
		let id = edge
			.id
			.clone()
			.filter(|id| !id.is_empty())
			.unwrap_or_else(|| format!("edge-{index}-{}-{}", edge.from, edge.to));
		let (from, to) = (edge.from.clone(), edge.to.clone());

		self.edge_by_pair.insert(pair_key(&from, &to), id.clone());
		self.edge_by_pair.insert(pair_key(&to, &from), id.clone());
		self.edges_by_node
			.entry(from.clone())
			.or_default()
			.push(id.clone());
		if to != from {
			self.edges_by_node
				.entry(to.clone())
				.or_default()
				.push(id.clone());
		}
		self.adjacency
			.entry(from.clone())
			.or_default()
			.insert(to.clone());
		self.adjacency
			.entry(to.clone())
			.or_default()
			.insert(from.clone());

		self.edge_index.insert(id.clone(), self.edges.len());
		self.edges.push(ModelEdge {
			id,
			from,
			to,
			width: edge.width.filter(|w| *w > 0.0).unwrap_or(1.25),
		});
	}

	pub fn nodes(&self) -> &[ModelNode] {
		&self.nodes
	}

	pub fn edges(&self) -> &[ModelEdge] {
		&self.edges
	}

	pub fn node(&self, id: &str) -> Option<&ModelNode> {
		self.node_index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn edge(&self, id: &str) -> Option<&ModelEdge> {
		self.edge_index.get(id).map(|&i| &self.edges[i])
	}

	pub fn section_for_node(&self, node_id: &str) -> Option<&str> {
		self.section_by_node
			.get(node_id)
			.map(String::as_str)
			.filter(|s| !s.is_empty())
	}

	/// The node registered last for `section` (later nodes win).
	pub fn node_for_section(&self, section_id: &str) -> Option<&str> {
		self.node_by_section.get(section_id).map(String::as_str)
	}

	pub fn section_node_ids(&self, section_id: &str) -> Vec<String> {
		self.node_for_section(section_id)
			.map(|id| vec![id.to_string()])
			.unwrap_or_default()
	}

	/// Undirected lookup: `a->b` and `b->a` resolve to the same edge.
	pub fn edge_between(&self, from: &str, to: &str) -> Option<&str> {
		self.edge_by_pair.get(&pair_key(from, to)).map(String::as_str)
	}

	pub fn incident_edges(&self, node_id: &str) -> &[String] {
		self.edges_by_node
			.get(node_id)
			.map(Vec::as_slice)
			.unwrap_or(&[])
	}

	pub fn adjacency(&self) -> &Adjacency {
		&self.adjacency
	}

	pub fn base_size(&self, node_id: &str) -> Option<f64> {
		self.node(node_id).map(|n| n.base_size)
	}

	pub fn size_range(&self) -> SizeRange {
		self.size_range.unwrap_or(DEFAULT_SIZE_RANGE)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(id: &str, section: &str) -> GraphNode {
		GraphNode {
			id: id.into(),
			section: Some(section.into()),
			..Default::default()
		}
	}

	fn edge(from: &str, to: &str) -> GraphEdge {
		GraphEdge {
			from: from.into(),
			to: to.into(),
			..Default::default()
		}
	}

	#[test]
	fn pair_index_is_undirected() {
		let model = GraphModel::new(&GraphConfig {
			nodes: vec![node("a", "s1"), node("b", "s2")],
			edges: vec![edge("a", "b")],
			..Default::default()
		});
		assert_eq!(model.edge_between("a", "b"), Some("edge-0-a-b"));
		assert_eq!(model.edge_between("b", "a"), Some("edge-0-a-b"));
		assert_eq!(model.incident_edges("a"), ["edge-0-a-b".to_string()]);
		assert_eq!(model.incident_edges("b"), ["edge-0-a-b".to_string()]);
		assert!(model.incident_edges("zzz").is_empty());
	}

	#[test]
	fn explicit_edge_id_is_kept() {
		let mut e = edge("a", "b");
		e.id = Some("ab".into());
		let model = GraphModel::new(&GraphConfig {
			nodes: vec![node("a", "s1"), node("b", "s2")],
			edges: vec![e],
			..Default::default()
		});
		assert_eq!(model.edge_between("a", "b"), Some("ab"));
		assert!(model.edge("ab").is_some());
	}

	#[test]
	fn duplicate_sections_last_write_wins() {
		let model = GraphModel::new(&GraphConfig {
			nodes: vec![node("a", "intro"), node("b", "intro")],
			..Default::default()
		});
		assert_eq!(model.node_for_section("intro"), Some("b"));
		assert_eq!(model.section_for_node("a"), Some("intro"));
		assert_eq!(model.section_node_ids("intro"), vec!["b".to_string()]);
		assert!(model.section_node_ids("missing").is_empty());
	}

	#[test]
	fn importance_maps_to_style_bounds() {
		let top = importance_style(1, 5);
		let bottom = importance_style(5, 5);
		assert!((top.alpha - 1.0).abs() < 1e-9);
		assert!((bottom.alpha - 0.22).abs() < 1e-9);
		assert_eq!(top.size_delta, 4.0);
		assert_eq!(bottom.size_delta, -4.0);
		assert_eq!(top.tone, NodeTone::Accent);
		assert_eq!(importance_style(2, 5).border_width, 2.0);
		assert_eq!(importance_style(3, 5).tone, NodeTone::Neutral);
	}

	#[test]
	fn level_resolution_and_base_size() {
		let mut important = node("a", "s1");
		important.important = Some(true);
		let mut minor = node("b", "s2");
		minor.importance = Some(4.4);
		minor.size = Some(4.0);
		assert_eq!(importance_level(&important), 1);
		assert_eq!(importance_level(&minor), 4);
		assert_eq!(importance_level(&node("c", "s3")), DEFAULT_IMPORTANCE);

		let model = GraphModel::new(&GraphConfig {
			nodes: vec![important, minor],
			..Default::default()
		});
		assert_eq!(model.base_size("a"), Some(21.0));
		assert_eq!(model.base_size("b"), Some(MIN_NODE_SIZE));
		let range = model.size_range();
		assert_eq!((range.min, range.max), (MIN_NODE_SIZE, 21.0));
	}

	#[test]
	fn empty_graph_uses_default_size_range() {
		let model = GraphModel::new(&GraphConfig::default());
		assert_eq!(model.size_range(), DEFAULT_SIZE_RANGE);
	}
}
