use serde::{Deserialize, Deserializer};

use crate::config::Tuning;

/// Article map as loaded from `content/<article>.map.json`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct GraphConfig {
	#[serde(default)]
	pub meta: GraphMeta,
	#[serde(default)]
	pub nodes: Vec<GraphNode>,
	#[serde(default)]
	pub edges: Vec<GraphEdge>,
	#[serde(default)]
	pub tuning: Tuning,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphMeta {
	pub title: Option<String>,
	pub subtitle: Option<String>,
	pub author: Option<String>,
	pub updated: Option<String>,
}

impl GraphMeta {
	pub fn title(&self) -> String {
		self.title
			.clone()
			.filter(|t| !t.is_empty())
			.unwrap_or_else(|| "Untitled Listening Notes".into())
	}

	/// `subtitle / author / updated`, skipping empty parts.
	pub fn byline(&self) -> String {
		[&self.subtitle, &self.author, &self.updated]
			.into_iter()
			.filter_map(|part| part.as_deref())
			.filter(|part| !part.is_empty())
			.collect::<Vec<_>>()
			.join(" / ")
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
	#[serde(deserialize_with = "string_or_number")]
	pub id: String,
	#[serde(default, deserialize_with = "opt_string_or_number")]
	pub section: Option<String>,
	#[serde(default)]
	pub label: Option<String>,
	#[serde(default)]
	pub importance: Option<f64>,
	#[serde(default)]
	pub important: Option<bool>,
	#[serde(default)]
	pub size: Option<f64>,
	#[serde(default)]
	pub font_size: Option<f64>,
	#[serde(default)]
	pub color: Option<String>,
	#[serde(default)]
	pub border_width: Option<f64>,
	#[serde(default)]
	pub shape: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct GraphEdge {
	#[serde(default, deserialize_with = "opt_string_or_number")]
	pub id: Option<String>,
	#[serde(deserialize_with = "string_or_number")]
	pub from: String,
	#[serde(deserialize_with = "string_or_number")]
	pub to: String,
	#[serde(default)]
	pub width: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
	Text(String),
	Number(serde_json::Number),
}

impl From<RawId> for String {
	fn from(raw: RawId) -> Self {
		match raw {
			RawId::Text(text) => text,
			RawId::Number(number) => number.to_string(),
		}
	}
}

fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
	RawId::deserialize(de).map(String::from)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
	Ok(Option::<RawId>::deserialize(de)?.map(String::from))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn numeric_ids_become_strings() {
		let config: GraphConfig = serde_json::from_str(
			r#"{
				"nodes": [{ "id": 1, "section": "intro", "important": true }, { "id": "b", "section": "mid", "fontSize": 14 }],
				"edges": [{ "from": 1, "to": "b", "width": 2 }]
			}"#,
		)
		.unwrap();
		assert_eq!(config.nodes[0].id, "1");
		assert_eq!(config.nodes[0].important, Some(true));
		assert_eq!(config.nodes[1].font_size, Some(14.0));
		assert_eq!(config.edges[0].from, "1");
		assert_eq!(config.edges[0].id, None);
	}

	#[test]
	fn byline_skips_missing_parts() {
		let meta = GraphMeta {
			subtitle: Some("Notes".into()),
			updated: Some("2024".into()),
			..Default::default()
		};
		assert_eq!(meta.byline(), "Notes / 2024");
		assert_eq!(meta.title(), "Untitled Listening Notes");
	}
}
