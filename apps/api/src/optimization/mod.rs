//! Optimize pass: rule-based rewriting and re-rendering.

pub mod applier;
pub mod handlers;
pub mod pipeline;
