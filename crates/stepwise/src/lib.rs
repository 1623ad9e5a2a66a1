//! # Stepwise
//!
//! Canonical left-factoring of grammars for fluent builder APIs.
//!
//! ## Overview
//!
//! A fluent builder API (`ast.x().y().build()`) can be generated from a
//! grammar once every rule starts with at most one terminal and no two
//! alternatives of a selection start with the same one. Stepwise rewrites an
//! arbitrary recursion-free grammar into that shape and keeps, for every
//! variable, a [`ParserInfo`] saying which AST node its builder method
//! produces, which components were already parsed, and which empty rules it
//! builds implicitly.
//!
//! - **Grammar model**: derivations `A ::= x B C` and selections `A ::= B | C`
//! - **Text format**: a small BNF-like notation, see [`grammar::text`]
//! - **Canonicalization**: terminal normalization, left factoring, and
//!   empty-production folding, run to a fixpoint
//!
//! ## Quick Start
//!
//! ```rust
//! use stepwise::grammar::{canonical_violations, parse_grammar};
//!
//! let grammar = parse_grammar(
//!     "Expr ::= Call | Index
//!      Call ::= name(String id) lparen
//!      Index ::= name(String id) lbracket",
//! )
//! .unwrap();
//!
//! let canonical = stepwise::canonicalize(&grammar).unwrap();
//! assert!(canonical_violations(&canonical.grammar).is_empty());
//! ```
//!
//! ## Modules
//!
//! - [`grammar`] - Grammar model, text format, and validation
//! - [`info`] - Parser info attached to each variable
//! - [`transform`] - The canonicalization passes and driver
//! - [`error`] - Error types
//! - [`intern`] - Fresh-name generation
//! - [`testing`] - Random grammars and language enumeration for tests

pub mod error;
pub mod grammar;
pub mod info;
pub mod intern;
pub mod testing;
pub mod transform;

// Re-export commonly used types
pub use error::{CanonError, CanonResult, UnsupportedShape};
pub use grammar::{Grammar, GrammarBuilder, GrammarError, Rule, Symbol, Terminal, Variable};
pub use info::{AstNode, ParserInfo, ParserInfos};
pub use transform::{Canonical, CanonicalStats, CanonicalizeConfig, Canonicalizer};

/// Canonicalize `grammar` with default settings, giving every variable a
/// full parser info named after itself.
///
/// # Errors
///
/// See [`Canonicalizer::canonicalize`].
pub fn canonicalize(grammar: &Grammar) -> CanonResult<Canonical> {
    Canonicalizer::default().canonicalize(grammar, &ParserInfos::full_for(grammar))
}
