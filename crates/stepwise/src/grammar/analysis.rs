//! # Grammar Analysis
//!
//! Metrics about a grammar's shape, plus the checks that tell whether a
//! grammar is already in canonical form.

use crate::grammar::builder::Grammar;
use crate::grammar::rule::Rule;
use crate::grammar::symbol::{Symbol, Variable};
use hashbrown::HashMap;
use std::fmt;

/// Metrics about a grammar's size and shape
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarMetrics {
    /// Total number of rules in the grammar
    pub rule_count: usize,
    pub derivation_count: usize,
    pub selection_count: usize,
    /// Distinct terminals, parameters included
    pub terminal_count: usize,
    /// Derivations with an empty right-hand side
    pub empty_count: usize,
    /// Longest reference path from the start variable
    pub max_depth: usize,
    /// Average number of alternatives per selection
    pub avg_alternatives: f64,
}

impl GrammarMetrics {
    /// Compute metrics for a grammar
    #[must_use]
    pub fn compute(grammar: &Grammar) -> Self {
        let mut derivation_count = 0;
        let mut selection_count = 0;
        let mut empty_count = 0;
        let mut total_alternatives = 0;

        for rule in grammar.rules() {
            match rule {
                Rule::Derivation { rhs, .. } => {
                    derivation_count += 1;
                    if rhs.is_empty() {
                        empty_count += 1;
                    }
                }
                Rule::Selection { alternatives, .. } => {
                    selection_count += 1;
                    total_alternatives += alternatives.len();
                }
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let avg_alternatives = if selection_count == 0 {
            0.0
        } else {
            total_alternatives as f64 / selection_count as f64
        };

        let mut depths = HashMap::default();
        let max_depth = depth(grammar, grammar.start(), &mut depths);

        Self {
            rule_count: grammar.len(),
            derivation_count,
            selection_count,
            terminal_count: grammar.terminals().len(),
            empty_count,
            max_depth,
            avg_alternatives,
        }
    }
}

// Grammars are acyclic, so plain memoized recursion terminates.
fn depth(
    grammar: &Grammar,
    var: &Variable,
    memo: &mut HashMap<Variable, usize, ahash::RandomState>,
) -> usize {
    if let Some(&d) = memo.get(var) {
        return d;
    }
    let d = grammar.get_rule(var).map_or(0, |rule| {
        rule.references()
            .into_iter()
            .map(|child| depth(grammar, child, memo) + 1)
            .max()
            .unwrap_or(0)
    });
    memo.insert(var.clone(), d);
    d
}

/// A way in which a grammar falls short of canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A terminal appears after the first position of a derivation.
    NonLeadingTerminal { rule: Variable, position: usize },
    /// A derivation has nothing on its right-hand side.
    EmptyDerivation(Variable),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonLeadingTerminal { rule, position } => {
                write!(f, "{rule}: terminal at position {position}")
            }
            Self::EmptyDerivation(rule) => write!(f, "{rule}: empty right-hand side"),
        }
    }
}

/// Structural canonical-form violations, in rule order.
///
/// This does not look for shared prefixes; an empty result together with
/// no discovery candidate means the grammar is canonical.
#[must_use]
pub fn canonical_violations(grammar: &Grammar) -> Vec<Violation> {
    let mut violations = Vec::new();
    for rule in grammar.rules_sorted() {
        let Rule::Derivation { lhs, rhs } = rule else {
            continue;
        };
        if rhs.is_empty() {
            violations.push(Violation::EmptyDerivation(lhs.clone()));
        }
        for (position, symbol) in rhs.iter().enumerate().skip(1) {
            if matches!(symbol, Symbol::Terminal(_)) {
                violations.push(Violation::NonLeadingTerminal {
                    rule: lhs.clone(),
                    position,
                });
            }
        }
    }
    violations
}

/// Get a summary of grammar characteristics
#[must_use]
pub fn grammar_summary(grammar: &Grammar) -> String {
    let metrics = GrammarMetrics::compute(grammar);
    format!(
        "Grammar summary: {} rules ({} derivations, {} selections), {} terminals, max depth {}, {:.1} avg alternatives, {} empty",
        metrics.rule_count,
        metrics.derivation_count,
        metrics.selection_count,
        metrics.terminal_count,
        metrics.max_depth,
        metrics.avg_alternatives,
        metrics.empty_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::symbol::{Terminal, VariableSource};
    use crate::grammar::GrammarBuilder;

    fn sample() -> (Grammar, Variable, Variable) {
        let mut vars = VariableSource::new();
        let a = vars.fresh("A");
        let b = vars.fresh("B");
        let c = vars.fresh("C");
        let grammar = GrammarBuilder::new()
            .start(a.clone())
            .selection(a, [b.clone(), c.clone()])
            .derivation(
                b.clone(),
                [Terminal::new("x").into(), Terminal::new("y").into()],
            )
            .derivation(c.clone(), [])
            .build()
            .unwrap();
        (grammar, b, c)
    }

    #[test]
    fn test_metrics() {
        let (grammar, _, _) = sample();
        let metrics = GrammarMetrics::compute(&grammar);
        assert_eq!(metrics.rule_count, 3);
        assert_eq!(metrics.derivation_count, 2);
        assert_eq!(metrics.selection_count, 1);
        assert_eq!(metrics.terminal_count, 2);
        assert_eq!(metrics.empty_count, 1);
        assert_eq!(metrics.max_depth, 1);
        assert!((metrics.avg_alternatives - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_canonical_violations() {
        let (grammar, b, c) = sample();
        assert_eq!(
            canonical_violations(&grammar),
            vec![
                Violation::NonLeadingTerminal { rule: b, position: 1 },
                Violation::EmptyDerivation(c),
            ]
        );
    }

    #[test]
    fn test_summary_mentions_counts() {
        let (grammar, _, _) = sample();
        let summary = grammar_summary(&grammar);
        assert!(summary.contains("3 rules"));
        assert!(summary.contains("1 empty"));
    }
}
