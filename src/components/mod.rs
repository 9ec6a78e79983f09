pub mod article;
pub mod string_map;
