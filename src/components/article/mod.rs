//! The reading pane: sections, mentions, threads and context shifting.

mod component;
pub mod preview;
mod reader;
pub mod threads;

pub use component::ArticlePage;
pub use reader::ArticleReader;
