//! Stepwise Tools - Developer utilities for working with stepwise grammars
//!
//! This crate provides the `stepwise-cli` binary plus the rendering and
//! reporting helpers behind it.

pub mod cli;
pub mod report;
pub mod visualize;

pub use report::{CheckReport, GrammarReport};
pub use visualize::{DotOptions, annotated_text, generate_dot, generate_dot_with};
