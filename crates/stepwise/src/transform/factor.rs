//! Left-factoring rewrite.
//!
//! Given a [`CommonPrefix`] under a selection `S`, every variable on the
//! group's chains is split into two reconstructions:
//!
//! - a **full** variable deriving everything the original does except the
//!   strings that go through the shared terminal, and
//! - a **partial** variable deriving what follows the shared terminal.
//!
//! `S` then gets one new alternative `PREF ::= symbol PREF_K`, where
//! `PREF_K` selects among the partials of `S`'s participating alternatives.

use crate::error::{CanonError, CanonResult};
use crate::grammar::{Grammar, Rule, RuleShape, Symbol, Terminal, Variable};
use crate::info::{ParserInfo, ParserInfos};
use crate::transform::chain::CommonPrefix;
use crate::transform::Session;
use hashbrown::HashMap;

/// Result of rewriting one variable.
#[derive(Debug, Clone)]
struct Split {
    full: Option<Variable>,
    partial: Variable,
}

struct Rewriter<'a> {
    grammar: &'a Grammar,
    infos: &'a ParserInfos,
    symbol: &'a Terminal,
    /// For each chain variable, the variables that follow it on some chain.
    successors: HashMap<Variable, Vec<Variable>, ahash::RandomState>,
    memo: HashMap<Variable, Split, ahash::RandomState>,
    rules: Vec<Rule>,
    new_infos: Vec<(Variable, ParserInfo)>,
    session: &'a mut Session,
}

fn push_unique(list: &mut Vec<Variable>, var: Variable) {
    if !list.contains(&var) {
        list.push(var);
    }
}

fn prepend(lead: Variable, tail: &[Symbol]) -> Vec<Symbol> {
    std::iter::once(Symbol::Variable(lead))
        .chain(tail.iter().cloned())
        .collect()
}

impl<'a> Rewriter<'a> {
    fn new(
        grammar: &'a Grammar,
        infos: &'a ParserInfos,
        prefix: &'a CommonPrefix,
        session: &'a mut Session,
    ) -> Self {
        let mut successors: HashMap<Variable, Vec<Variable>, ahash::RandomState> =
            HashMap::default();
        for chain in &prefix.chains {
            for pair in chain.variables().windows(2) {
                push_unique(successors.entry(pair[0].clone()).or_default(), pair[1].clone());
            }
        }
        Self {
            grammar,
            infos,
            symbol: &prefix.symbol,
            successors,
            memo: HashMap::default(),
            rules: Vec::new(),
            new_infos: Vec::new(),
            session,
        }
    }

    fn participating(&self, var: &Variable) -> Vec<Variable> {
        self.successors.get(var).cloned().unwrap_or_default()
    }

    fn rewrite(&mut self, var: &Variable) -> CanonResult<Split> {
        if let Some(split) = self.memo.get(var) {
            return Ok(split.clone());
        }
        let (grammar, infos) = (self.grammar, self.infos);
        let info = infos.require(var)?;
        let split = match grammar.rule(var)? {
            Rule::Derivation { lhs, rhs } => self.rewrite_derivation(lhs, rhs, info)?,
            Rule::Selection { lhs, alternatives } => {
                self.rewrite_selection(lhs, alternatives, info)?
            }
        };
        self.memo.insert(var.clone(), split.clone());
        Ok(split)
    }

    fn rewrite_derivation(
        &mut self,
        lhs: &Variable,
        rhs: &[Symbol],
        info: &ParserInfo,
    ) -> CanonResult<Split> {
        let symbol = self.symbol;
        let partial_info = info.with_components(symbol.params(), RuleShape::Derivation)?;
        match rhs.first() {
            Some(Symbol::Terminal(lead)) if lead == symbol => {
                let partial = self.derive(&format!("Partial_{lhs}"), rhs[1..].to_vec(), partial_info);
                Ok(Split {
                    full: None,
                    partial,
                })
            }
            Some(Symbol::Variable(lead)) => {
                let child = self.rewrite(lead)?;
                let tail = &rhs[1..];
                let partial = self.derive(
                    &format!("Partial_{lhs}"),
                    prepend(child.partial, tail),
                    partial_info,
                );
                let full = match child.full {
                    Some(full) => Some(self.derive(
                        &format!("Full_{lhs}"),
                        prepend(full, tail),
                        info.clone(),
                    )),
                    None => None,
                };
                Ok(Split { full, partial })
            }
            _ => Err(CanonError::unexpected(format!(
                "{lhs} is on a chain for {symbol} but does not lead to it"
            ))),
        }
    }

    fn rewrite_selection(
        &mut self,
        lhs: &Variable,
        alternatives: &[Variable],
        info: &ParserInfo,
    ) -> CanonResult<Split> {
        let participating = self.participating(lhs);
        let mut partials = Vec::new();
        let mut fulls = Vec::new();
        for alt in alternatives {
            if participating.contains(alt) {
                let split = self.rewrite(alt)?;
                push_unique(&mut partials, split.partial);
                if let Some(full) = split.full {
                    push_unique(&mut fulls, full);
                }
            } else {
                push_unique(&mut fulls, alt.clone());
            }
        }
        if partials.is_empty() {
            return Err(CanonError::unexpected(format!(
                "selection {lhs} is on a chain but none of its alternatives are"
            )));
        }

        let partial_info = info.with_components(self.symbol.params(), RuleShape::Selection)?;
        let partial = self.select(&format!("Partial_{lhs}"), partials, partial_info);
        let full = if fulls.is_empty() {
            None
        } else {
            Some(self.select(&format!("Full_{lhs}"), fulls, info.clone()))
        };
        Ok(Split { full, partial })
    }

    fn derive(&mut self, seed: &str, rhs: Vec<Symbol>, info: ParserInfo) -> Variable {
        let var = self.session.fresh_variable(seed);
        let rule = Rule::derivation(var.clone(), rhs);
        tracing::trace!(%rule, info = %info, "synthesized derivation");
        self.rules.push(rule);
        self.new_infos.push((var.clone(), info));
        self.session.stats.synthesized += 1;
        var
    }

    /// A selection over `alternatives`, or the alternative itself when
    /// there is only one.
    fn select(&mut self, seed: &str, alternatives: Vec<Variable>, info: ParserInfo) -> Variable {
        if let [only] = alternatives.as_slice() {
            return only.clone();
        }
        let var = self.session.fresh_variable(seed);
        let rule = Rule::selection(var.clone(), alternatives);
        tracing::trace!(%rule, info = %info, "synthesized selection");
        self.rules.push(rule);
        self.new_infos.push((var.clone(), info));
        self.session.stats.synthesized += 1;
        var
    }
}

/// Factor `prefix.symbol` out of the selection `prefix.root`.
///
/// The result still has to go through garbage collection and empty-rule
/// elimination; rules that are no longer referenced are left in place.
///
/// # Errors
///
/// Returns [`CanonError::MissingParserInfo`] if a rewritten variable has no
/// info, [`CanonError::UnexpectedState`] if the prefix does not match the
/// grammar, or a grammar error if the rewritten rule set is invalid.
pub fn left_factor(
    grammar: &Grammar,
    infos: &ParserInfos,
    prefix: &CommonPrefix,
    session: &mut Session,
) -> CanonResult<(Grammar, ParserInfos)> {
    let root = &prefix.root;
    let Rule::Selection { alternatives, .. } = grammar.rule(root)? else {
        return Err(CanonError::unexpected(format!(
            "common prefix root {root} is not a selection"
        )));
    };
    let root_info = infos.require(root)?;
    let symbol = &prefix.symbol;
    let mut rw = Rewriter::new(grammar, infos, prefix, session);

    let participating = rw.participating(root);
    let mut partials = Vec::new();
    for alt in alternatives.iter().filter(|alt| participating.contains(alt)) {
        let split = rw.rewrite(alt)?;
        push_unique(&mut partials, split.partial);
    }

    let seed = format!("{root}_{}", symbol.name());
    let k_info = root_info.with_components(symbol.params(), RuleShape::Selection)?;
    let pref_k = rw.select(&format!("{seed}_K"), partials, k_info);

    let mut remaining = Vec::new();
    for alt in alternatives {
        if participating.contains(alt) {
            if let Some(full) = rw.memo.get(alt).and_then(|split| split.full.clone()) {
                push_unique(&mut remaining, full);
            }
        } else {
            push_unique(&mut remaining, alt.clone());
        }
    }

    let lead = vec![Symbol::Terminal(symbol.clone()), Symbol::Variable(pref_k)];
    let pref_info = root_info.reshaped(RuleShape::Derivation)?;
    if remaining.is_empty() {
        tracing::trace!(selection = %root, "every alternative shares the prefix");
        rw.rules.push(Rule::derivation(root.clone(), lead));
        rw.new_infos.push((root.clone(), pref_info));
    } else {
        let pref = rw.derive(&seed, lead, pref_info);
        let alternatives = std::iter::once(pref).chain(remaining);
        rw.rules.push(Rule::selection(root.clone(), alternatives));
    }

    let Rewriter {
        rules: new_rules,
        new_infos,
        ..
    } = rw;

    let rules = grammar
        .rules()
        .filter(|rule| rule.lhs() != root)
        .cloned()
        .chain(new_rules);
    let grammar = Grammar::new(grammar.start().clone(), rules)?;
    let mut infos = infos.clone();
    infos.extend(new_infos);
    Ok((grammar, infos))
}
