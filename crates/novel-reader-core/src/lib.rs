pub mod cache;
pub mod chapters;
pub mod config;
pub mod error;
pub mod generation;
pub mod loader;
pub mod navigation;
pub mod pagination;
pub mod phrase;
pub mod playback;
pub mod reader;
pub mod session;
pub mod speech;
pub mod text_utils;
pub mod word_index;
