//! Empty-production elimination.
//!
//! An empty derivation `D ::= ε` has no builder method of its own to call,
//! so every derivation that starts with `D` drops it and builds `D`'s node
//! implicitly instead. `D` itself becomes `D ::= <empty>` so selections that
//! still offer it keep a rule to point at.

use crate::error::CanonResult;
use crate::grammar::{Grammar, Rule, Symbol, Terminal, Variable};
use crate::info::ParserInfos;
use crate::transform::Session;
use hashbrown::HashSet;

/// Fold every empty derivation, repeating until none are left.
///
/// A derivation that becomes empty because of folding is handled in the
/// next round.
///
/// # Errors
///
/// Returns a state error when a folding target carries a selection or
/// bridge info, or a grammar error if a rewritten rule set is invalid.
pub fn eliminate_empty(
    grammar: &Grammar,
    infos: &ParserInfos,
    session: &mut Session,
) -> CanonResult<(Grammar, ParserInfos)> {
    let mut grammar = grammar.clone();
    let mut infos = infos.clone();

    loop {
        let empties: HashSet<Variable, ahash::RandomState> = grammar
            .rules()
            .filter(|r| r.is_empty_derivation())
            .map(|r| r.lhs().clone())
            .collect();
        if empties.is_empty() {
            return Ok((grammar, infos));
        }

        let mut rules = Vec::with_capacity(grammar.len());
        for rule in grammar.rules_sorted() {
            match rule {
                Rule::Derivation { lhs, .. } if empties.contains(lhs) => {
                    rules.push(Rule::derivation(
                        lhs.clone(),
                        [Symbol::Terminal(Terminal::empty())],
                    ));
                }
                Rule::Derivation { lhs, rhs } => {
                    let mut rhs = rhs.clone();
                    while let Some(Symbol::Variable(lead)) = rhs.first() {
                        if !empties.contains(lead) {
                            break;
                        }
                        let folded = lead.clone();
                        rhs.remove(0);
                        let info = infos.require(lhs)?.with_implicit(folded.clone())?;
                        tracing::trace!(rule = %lhs, folded = %folded, "folded empty production");
                        infos.insert(lhs.clone(), info);
                        session.stats.folded += 1;
                    }
                    rules.push(Rule::derivation(lhs.clone(), rhs));
                }
                Rule::Selection { .. } => rules.push(rule.clone()),
            }
        }
        grammar = Grammar::new(grammar.start().clone(), rules)?;
    }
}
