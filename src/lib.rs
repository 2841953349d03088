pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod image;
pub mod output;
pub mod pipeline;
pub mod pixabay;
pub mod relabel;
