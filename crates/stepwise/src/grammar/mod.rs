//! # Grammar Module
//!
//! The restricted grammar model that canonicalization works on.
//!
//! ## Overview
//!
//! A grammar has two kinds of rules:
//!
//! - **Derivations** map a variable to a sequence of terminals and variables.
//! - **Selections** map a variable to one of at least two other variables.
//!
//! Grammars are validated on construction: one rule per variable, a rule for
//! every referenced variable, well-formed selections, and no recursion.
//!
//! ## Usage
//!
//! ```rust
//! use stepwise::grammar::parse_grammar;
//!
//! let grammar = parse_grammar(
//!     "start Expr
//!      Expr ::= Add | Lit
//!      Add  ::= num(int value) plus Lit
//!      Lit  ::= num(int value)",
//! )
//! .expect("valid grammar");
//!
//! assert_eq!(grammar.len(), 3);
//! ```

pub mod analysis;
pub mod builder;
pub mod rule;
pub mod symbol;
pub mod text;
pub mod validate;

pub use analysis::{GrammarMetrics, Violation, canonical_violations, grammar_summary};
pub use builder::{Grammar, GrammarBuilder, GrammarError};
pub use rule::{Rule, RuleShape};
pub use symbol::{Parameter, Symbol, Terminal, Variable, VariableSource};
pub use text::{TextError, parse_grammar, parse_grammar_with};
pub use validate::validate_grammar;
