//! Force-directed concept map whose edges are drawn as plucked strings.

mod component;
mod handle;
pub mod model;
pub mod paths;
mod render;
pub mod scheduler;
pub mod state;
pub mod strings;
pub mod types;
pub mod wave;

pub use component::StringMapCanvas;
pub use handle::{MapHandle, now_ms};
pub use types::GraphConfig;
