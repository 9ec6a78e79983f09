//! Fetches an article's map configuration and body.

use log::info;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::components::string_map::GraphConfig;
use crate::error::{LoadError, LoadResult};

/// Article shown when the URL names none.
pub const DEFAULT_ARTICLE: &str = "czech-scene-sound";

#[derive(Clone, Debug, PartialEq)]
pub struct Article {
	pub key: String,
	pub config: GraphConfig,
	pub html: String,
}

/// Article keys name files under `content/`: letters, digits, `-`, `_` and
/// single dots only, so a key can never leave that directory.
pub fn validate_key(key: &str) -> LoadResult<&str> {
	let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
	if key.is_empty() || key.starts_with('.') || key.contains("..") || !key.chars().all(allowed) {
		return Err(LoadError::InvalidKey(key.into()));
	}
	Ok(key)
}

pub fn map_path(key: &str) -> String {
	format!("content/{key}.map.json")
}

pub fn body_path(key: &str) -> String {
	format!("content/{key}.html")
}

/// Parses the map configuration; a map without nodes is useless.
pub fn parse_config(json: &str) -> LoadResult<GraphConfig> {
	let config: GraphConfig = serde_json::from_str(json)?;
	if config.nodes.is_empty() {
		return Err(LoadError::NoNodes);
	}
	Ok(config)
}

fn start_fetch(path: &str) -> LoadResult<JsFuture> {
	let window = web_sys::window()
		.ok_or_else(|| LoadError::fetch(path, JsValue::from_str("no window")))?;
	Ok(JsFuture::from(window.fetch_with_str(path)))
}

async fn read_text(path: &str, request: JsFuture) -> LoadResult<String> {
	let response: Response = request
		.await
		.and_then(|r| r.dyn_into())
		.map_err(|e| LoadError::fetch(path, e))?;
	if !response.ok() {
		return Err(LoadError::Status {
			path: path.into(),
			status: response.status(),
		});
	}
	let text = response.text().map_err(|e| LoadError::fetch(path, e))?;
	let text = JsFuture::from(text)
		.await
		.map_err(|e| LoadError::fetch(path, e))?;
	Ok(text.as_string().unwrap_or_default())
}

/// Loads both files; the requests run concurrently.
pub async fn load_article(key: String) -> LoadResult<Article> {
	validate_key(&key)?;
	let (map, body) = (map_path(&key), body_path(&key));
	let (map_request, body_request) = (start_fetch(&map)?, start_fetch(&body)?);

	let config = parse_config(&read_text(&map, map_request).await?)?;
	let html = read_text(&body, body_request).await?;
	info!(
		"loaded article {key}: {} nodes, {} edges",
		config.nodes.len(),
		config.edges.len()
	);
	Ok(Article { key, config, html })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn paths_follow_the_article_key() {
		assert_eq!(map_path("a"), "content/a.map.json");
		assert_eq!(body_path("a"), "content/a.html");
	}

	#[test]
	fn keys_stay_inside_the_content_directory() {
		assert_eq!(validate_key("czech-scene-sound").ok(), Some("czech-scene-sound"));
		assert!(validate_key("notes_v2.1").is_ok());
		for key in ["", "../secret", "a/b", "a\\b", "%2e%2e", "a..b", ".hidden", "a b"] {
			assert!(
				matches!(validate_key(key), Err(LoadError::InvalidKey(k)) if k == key),
				"{key:?} accepted"
			);
		}
	}

	#[test]
	fn empty_maps_are_rejected() {
		assert!(matches!(parse_config(r#"{"nodes": []}"#), Err(LoadError::NoNodes)));
		assert!(matches!(parse_config("{"), Err(LoadError::Parse(_))));
		let config = parse_config(r#"{"nodes": [{"id": 1, "section": "intro"}]}"#).unwrap();
		assert_eq!(config.nodes[0].id, "1");
	}
}
