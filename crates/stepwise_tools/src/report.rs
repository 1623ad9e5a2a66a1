//! JSON documents for tool output

use serde::Serialize;
use stepwise::grammar::{Grammar, GrammarMetrics, Rule, Variable};
use stepwise::info::{ParserInfo, ParserInfos};
use stepwise::transform::{Canonical, CanonicalStats};

/// One variable's rule together with its parser info.
#[derive(Debug, Serialize)]
pub struct RuleEntry<'a> {
    pub variable: &'a Variable,
    pub rule: &'a Rule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<&'a ParserInfo>,
}

#[derive(Debug, Serialize)]
pub struct GrammarReport<'a> {
    pub start: &'a Variable,
    pub rules: Vec<RuleEntry<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<&'a CanonicalStats>,
}

impl<'a> GrammarReport<'a> {
    /// Rules in text-format order: start first, then sorted.
    #[must_use]
    pub fn new(grammar: &'a Grammar, infos: Option<&'a ParserInfos>) -> Self {
        let mut rules: Vec<&Rule> = grammar.rules_sorted();
        rules.sort_by_key(|rule| rule.lhs() != grammar.start());
        let rules = rules
            .into_iter()
            .map(|rule| RuleEntry {
                variable: rule.lhs(),
                rule,
                info: infos.and_then(|infos| infos.get(rule.lhs())),
            })
            .collect();
        Self {
            start: grammar.start(),
            rules,
            stats: None,
        }
    }

    #[must_use]
    pub fn canonical(canonical: &'a Canonical) -> Self {
        Self {
            stats: Some(&canonical.stats),
            ..Self::new(&canonical.grammar, Some(&canonical.infos))
        }
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error; none is expected for these types.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Summary printed by `check`.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub rules: usize,
    pub derivations: usize,
    pub selections: usize,
    pub terminals: usize,
    pub empty: usize,
    pub max_depth: usize,
    pub violations: Vec<String>,
    /// Selection and terminal of the first shared prefix, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_prefix: Option<(String, String)>,
}

impl CheckReport {
    #[must_use]
    pub fn new(grammar: &Grammar) -> Self {
        let metrics = GrammarMetrics::compute(grammar);
        let shared_prefix = stepwise::transform::discover(grammar, false)
            .ok()
            .flatten()
            .map(|prefix| (prefix.root.to_string(), prefix.symbol.to_string()));
        Self {
            rules: metrics.rule_count,
            derivations: metrics.derivation_count,
            selections: metrics.selection_count,
            terminals: metrics.terminal_count,
            empty: metrics.empty_count,
            max_depth: metrics.max_depth,
            violations: stepwise::grammar::canonical_violations(grammar)
                .iter()
                .map(ToString::to_string)
                .collect(),
            shared_prefix,
        }
    }

    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.violations.is_empty() && self.shared_prefix.is_none()
    }
}
