//! Analyze pass: similarity scoring and suggestion generation.

pub mod handlers;
pub mod keywords;
pub mod pipeline;
pub mod prompts;
pub mod repository;
pub mod similarity;
pub mod suggestions;
