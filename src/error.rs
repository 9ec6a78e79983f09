use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failure to load the article: the only error that reaches the reader.
#[derive(Error, Debug)]
pub enum LoadError {
	#[error("request for {path} failed: {message}")]
	Fetch { path: String, message: String },

	#[error("{path} answered with HTTP {status}")]
	Status { path: String, status: u16 },

	#[error("map configuration is malformed: {0}")]
	Parse(#[from] serde_json::Error),

	#[error("map configuration has no nodes")]
	NoNodes,

	#[error("\"{0}\" is not an article name")]
	InvalidKey(String),
}

impl LoadError {
	pub(crate) fn fetch(path: &str, value: JsValue) -> Self {
		let message = value
			.as_string()
			.or_else(|| {
				js_sys::Reflect::get(&value, &JsValue::from_str("message"))
					.ok()
					.and_then(|m| m.as_string())
			})
			.unwrap_or_else(|| "network error".into());
		Self::Fetch {
			path: path.into(),
			message,
		}
	}
}

pub type LoadResult<T> = Result<T, LoadError>;
