//! Hop-chain path specs (`"a->b->c; d>e"`) and automatic thread paths.
//!
//! Resolution is best-effort: malformed fragments and unknown tokens are
//! dropped, never reported.

use std::collections::{HashMap, HashSet, VecDeque};

use super::model::{Adjacency, GraphModel};

/// Node and edge ids a marker lights up, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathIds {
	pub node_ids: Vec<String>,
	pub edge_ids: Vec<String>,
}

impl PathIds {
	pub fn is_empty(&self) -> bool {
		self.node_ids.is_empty() && self.edge_ids.is_empty()
	}
}

/// Splits a spec into chains of node tokens. Fragments are separated by `;`
/// or `,`, hops by `->` or `>`.
pub fn parse_path_spec(spec: &str) -> Vec<Vec<&str>> {
	spec.split([';', ','])
		.map(str::trim)
		.filter(|fragment| !fragment.is_empty())
		.map(|fragment| {
			fragment
				.split('>')
				.map(|token| token.strip_suffix('-').unwrap_or(token).trim())
				.filter(|token| !token.is_empty())
				.collect()
		})
		.collect()
}

fn push_unique(out: &mut Vec<String>, seen: &mut HashSet<String>, id: &str) {
	if seen.insert(id.to_string()) {
		out.push(id.to_string());
	}
}

/// Edge ids for every consecutive hop that has an edge in the graph.
pub fn resolve_edge_ids(model: &GraphModel, spec: &str) -> Vec<String> {
	let (mut ids, mut seen) = (Vec::new(), HashSet::new());
	for chain in parse_path_spec(spec) {
		for hop in chain.windows(2) {
			if let Some(edge_id) = model.edge_between(hop[0], hop[1]) {
				push_unique(&mut ids, &mut seen, edge_id);
			}
		}
	}
	ids
}

/// Every token mentioned in the spec, verbatim.
pub fn resolve_node_ids(spec: &str) -> Vec<String> {
	let (mut ids, mut seen) = (Vec::new(), HashSet::new());
	for chain in parse_path_spec(spec) {
		for token in chain {
			push_unique(&mut ids, &mut seen, token);
		}
	}
	ids
}

pub fn resolve_path(model: &GraphModel, spec: &str) -> PathIds {
	PathIds {
		node_ids: resolve_node_ids(spec),
		edge_ids: resolve_edge_ids(model, spec),
	}
}

/// Unweighted shortest path. Neighbours are visited in ascending id order.
///
/// Endpoints missing from the adjacency or disconnected from each other
/// degrade to the direct pair `[from, to]`.
pub fn find_node_path_bfs(from: &str, to: &str, adjacency: &Adjacency) -> Vec<String> {
	if from.is_empty() || to.is_empty() {
		return Vec::new();
	}
	if from == to {
		return vec![from.to_string()];
	}
	let direct = || vec![from.to_string(), to.to_string()];
	if !adjacency.contains_key(from) || !adjacency.contains_key(to) {
		return direct();
	}

	let mut queue = VecDeque::from([from]);
	let mut visited = HashSet::from([from]);
	let mut parent: HashMap<&str, &str> = HashMap::new();

	'search: while let Some(current) = queue.pop_front() {
		let Some(neighbors) = adjacency.get(current) else {
			continue;
		};
		for next in neighbors {
			let next = next.as_str();
			if !visited.insert(next) {
				continue;
			}
			parent.insert(next, current);
			if next == to {
				break 'search;
			}
			queue.push_back(next);
		}
	}

	if !parent.contains_key(to) {
		return direct();
	}

	let mut chain = vec![to.to_string()];
	let mut cursor = to;
	while cursor != from {
		match parent.get(cursor) {
			Some(&prev) => {
				chain.push(prev.to_string());
				cursor = prev;
			}
			None => return direct(),
		}
	}
	chain.reverse();
	chain
}

/// Connects the first node of each member's section, in document order,
/// through BFS chains. Consecutive members in the same section collapse.
pub fn thread_auto_path<'a>(
	model: &GraphModel,
	member_sections: impl IntoIterator<Item = &'a str>,
) -> PathIds {
	let mut stops: Vec<String> = Vec::new();
	for section in member_sections {
		let Some(node_id) = model.section_node_ids(section).into_iter().next() else {
			continue;
		};
		if stops.last() != Some(&node_id) {
			stops.push(node_id);
		}
	}

	let mut ids = PathIds::default();
	let (mut seen_nodes, mut seen_edges) = (HashSet::new(), HashSet::new());
	for stop in &stops {
		push_unique(&mut ids.node_ids, &mut seen_nodes, stop);
	}

	for pair in stops.windows(2) {
		let chain = find_node_path_bfs(&pair[0], &pair[1], model.adjacency());
		if chain.len() < 2 {
			continue;
		}
		for node_id in &chain {
			push_unique(&mut ids.node_ids, &mut seen_nodes, node_id);
		}
		for hop in chain.windows(2) {
			if let Some(edge_id) = model.edge_between(&hop[0], &hop[1]) {
				push_unique(&mut ids.edge_ids, &mut seen_edges, edge_id);
			}
		}
	}
	ids
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use super::*;
	use crate::components::string_map::types::{GraphConfig, GraphEdge, GraphNode};

	fn id_set(ids: &[String]) -> BTreeSet<&str> {
		ids.iter().map(String::as_str).collect()
	}

	fn model(nodes: &[(&str, &str)], edges: &[(&str, &str)]) -> GraphModel {
		GraphModel::new(&GraphConfig {
			nodes: nodes
				.iter()
				.map(|(id, section)| GraphNode {
					id: id.to_string(),
					section: Some(section.to_string()),
					..Default::default()
				})
				.collect(),
			edges: edges
				.iter()
				.map(|(from, to)| GraphEdge {
					id: Some(format!("{from}{to}")),
					from: from.to_string(),
					to: to.to_string(),
					width: None,
				})
				.collect(),
			..Default::default()
		})
	}

	#[test]
	fn parses_mixed_separators() {
		assert_eq!(
			parse_path_spec(" a->b -> c; d>e ,, f "),
			vec![vec!["a", "b", "c"], vec!["d", "e"], vec!["f"]]
		);
		assert!(parse_path_spec("  ;, ").is_empty());
	}

	#[test]
	fn resolves_edges_along_chain() {
		let m = model(&[("a", "1"), ("b", "2"), ("c", "3")], &[("a", "b"), ("b", "c")]);
		let edges = resolve_edge_ids(&m, "a->b->c");
		assert_eq!(id_set(&edges), BTreeSet::from(["ab", "bc"]));
		assert!(resolve_edge_ids(&m, "a->z").is_empty());
		assert_eq!(resolve_edge_ids(&m, "c>b"), vec!["bc".to_string()]);
	}

	#[test]
	fn node_ids_are_verbatim_tokens() {
		let nodes = resolve_node_ids("a->b;c>d");
		assert_eq!(id_set(&nodes), BTreeSet::from(["a", "b", "c", "d"]));
		assert!(resolve_node_ids("").is_empty());
		assert!(resolve_path(&GraphModel::default(), "->").is_empty());
	}

	#[test]
	fn bfs_direct_edge_is_two_nodes() {
		let m = model(&[("a", "1"), ("b", "2")], &[("a", "b")]);
		assert_eq!(find_node_path_bfs("a", "b", m.adjacency()), vec!["a", "b"]);
		assert_eq!(find_node_path_bfs("a", "a", m.adjacency()), vec!["a"]);
	}

	#[test]
	fn bfs_disconnected_degrades_to_pair() {
		let m = model(
			&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")],
			&[("a", "b"), ("c", "d")],
		);
		assert_eq!(find_node_path_bfs("a", "d", m.adjacency()), vec!["a", "d"]);
		assert_eq!(find_node_path_bfs("a", "nope", m.adjacency()), vec!["a", "nope"]);
		assert!(find_node_path_bfs("", "a", m.adjacency()).is_empty());
	}

	#[test]
	fn bfs_prefers_lowest_id_on_ties() {
		let m = model(
			&[("a", "1"), ("m", "2"), ("c", "3"), ("z", "4")],
			&[("a", "z"), ("z", "c"), ("a", "m"), ("m", "c")],
		);
		assert_eq!(find_node_path_bfs("a", "c", m.adjacency()), vec!["a", "m", "c"]);
	}

	#[test]
	fn thread_path_walks_sections_in_order() {
		let m = model(
			&[("a", "s1"), ("b", "s2"), ("c", "s3")],
			&[("a", "b"), ("b", "c")],
		);
		let ids = thread_auto_path(&m, ["s1", "s1", "s3"]);
		assert_eq!(ids.node_ids, vec!["a", "c", "b"]);
		assert_eq!(id_set(&ids.edge_ids), BTreeSet::from(["ab", "bc"]));

		let lone = thread_auto_path(&m, ["s2", "s2", "unknown"]);
		assert_eq!(lone.node_ids, vec!["b"]);
		assert!(lone.edge_ids.is_empty());
	}
}
