//! # Error Types
//!
//! Errors raised while canonicalizing a grammar.
//!
//! ## Overview
//!
//! - [`GrammarError`]: the input (or an intermediate grammar) breaks a
//!   grammar invariant. Defined next to the grammar container.
//! - [`TextError`]: the text format could not be read.
//! - [`CanonError`]: anything that aborts a canonicalization run.
//!
//! Every error names the offending variable. No partial result is ever
//! returned alongside an error.
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, every error type derives
//! [`miette::Diagnostic`] with a stable error code.

pub use crate::grammar::builder::GrammarError;
pub use crate::grammar::text::TextError;

use crate::grammar::symbol::Variable;
use std::fmt;
use thiserror::Error;

/// Grammar shapes whose canonical form cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedShape {
    /// Two branches of `selection` derive identical strings.
    IdenticalAlternatives {
        selection: Variable,
        first: Vec<Variable>,
        second: Vec<Variable>,
    },
    /// Several branches of `selection` reconverge on the empty production
    /// `terminus` with nothing to tell them apart.
    ConvergingEmpty {
        selection: Variable,
        terminus: Variable,
    },
}

impl fmt::Display for UnsupportedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdenticalAlternatives {
                selection,
                first,
                second,
            } => write!(
                f,
                "alternatives of {selection} derive identical strings via [{}] and [{}]",
                join(first),
                join(second)
            ),
            Self::ConvergingEmpty {
                selection,
                terminus,
            } => write!(
                f,
                "several alternatives of {selection} reconverge on the empty production {terminus}"
            ),
        }
    }
}

fn join(vars: &[Variable]) -> String {
    vars.iter()
        .map(Variable::name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(miette::Diagnostic))]
pub enum CanonError {
    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Grammar(#[from] GrammarError),

    #[error("No parser info for variable {0}")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(stepwise::canon::missing_parser_info),
            help("every variable of the input grammar needs a parser info entry")
        )
    )]
    MissingParserInfo(Variable),

    #[error("Unsupported grammar shape: {0}")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(stepwise::canon::unsupported),
            help("the grammar is ambiguous at this point; merge the offending alternatives")
        )
    )]
    Unsupported(UnsupportedShape),

    #[error("Unexpected state: {context}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(stepwise::canon::unexpected_state)))]
    UnexpectedState { context: String },

    #[error("Canonicalization did not converge within {0} iterations")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(stepwise::canon::iteration_limit)))]
    IterationLimit(usize),
}

impl CanonError {
    pub(crate) fn unexpected(context: impl Into<String>) -> Self {
        Self::UnexpectedState {
            context: context.into(),
        }
    }
}

pub type CanonResult<T> = Result<T, CanonError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::symbol::VariableSource;

    #[test]
    fn test_messages_name_the_variable() {
        let mut vars = VariableSource::new();
        let a = vars.fresh("Expr");
        let b = vars.fresh("Lit");

        let missing = CanonError::MissingParserInfo(a.clone());
        assert_eq!(missing.to_string(), "No parser info for variable Expr");

        let shape = CanonError::Unsupported(UnsupportedShape::ConvergingEmpty {
            selection: a,
            terminus: b,
        });
        assert!(shape.to_string().contains("Expr"));
        assert!(shape.to_string().contains("Lit"));
    }

    #[test]
    fn test_grammar_error_converts() {
        let err: CanonError = GrammarError::MissingStart.into();
        assert_eq!(err.to_string(), "Missing start variable");
    }
}
