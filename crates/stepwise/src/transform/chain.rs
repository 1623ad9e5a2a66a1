//! Chains and common-prefix discovery.
//!
//! A chain follows leading positions down from a selection: into every
//! alternative of a selection, into the leading variable of a derivation,
//! until it reaches a derivation that starts with a terminal or is empty.
//! Two chains whose termini start with the same terminal describe
//! alternatives that cannot be told apart by their first token.

use crate::error::{CanonError, CanonResult, UnsupportedShape};
use crate::grammar::{Grammar, Rule, Symbol, Terminal, Variable};
use std::fmt;

/// Variables visited from a root down to a terminus, root first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chain(Vec<Variable>);

impl Chain {
    #[must_use]
    pub fn root(&self) -> &Variable {
        &self.0[0]
    }

    #[must_use]
    pub fn terminus(&self) -> &Variable {
        &self.0[self.0.len() - 1]
    }

    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.0
    }

    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The variable after `var`, if `var` is on this chain and not its terminus.
    #[must_use]
    pub fn successor(&self, var: &Variable) -> Option<&Variable> {
        self.0
            .iter()
            .position(|v| v == var)
            .and_then(|i| self.0.get(i + 1))
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, var) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{var}")?;
        }
        Ok(())
    }
}

/// A group of chains under `root` whose termini all start with `symbol`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonPrefix {
    pub symbol: Terminal,
    pub root: Variable,
    pub chains: Vec<Chain>,
}

/// What a chain's terminus starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Head<'g> {
    Empty,
    Sentinel,
    Terminal(&'g Terminal),
}

/// All chains starting at `root`, depth-first in alternative order.
///
/// # Errors
///
/// Returns [`GrammarError::UndefinedRule`](crate::error::GrammarError::UndefinedRule)
/// if a chain reaches a variable without a rule.
pub fn chains(grammar: &Grammar, root: &Variable) -> CanonResult<Vec<Chain>> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    walk(grammar, root, &mut path, &mut out)?;
    Ok(out)
}

fn walk(
    grammar: &Grammar,
    var: &Variable,
    path: &mut Vec<Variable>,
    out: &mut Vec<Chain>,
) -> CanonResult<()> {
    path.push(var.clone());
    match grammar.rule(var)? {
        Rule::Derivation { rhs, .. } => match rhs.first() {
            Some(Symbol::Variable(next)) => walk(grammar, next, path, out)?,
            _ => out.push(Chain(path.clone())),
        },
        Rule::Selection { alternatives, .. } => {
            for alt in alternatives {
                walk(grammar, alt, path, out)?;
            }
        }
    }
    path.pop();
    Ok(())
}

fn head<'g>(grammar: &'g Grammar, chain: &Chain) -> CanonResult<Head<'g>> {
    match grammar.rule(chain.terminus())? {
        Rule::Derivation { rhs, .. } => match rhs.first() {
            None => Ok(Head::Empty),
            Some(Symbol::Terminal(t)) if t.is_empty_sentinel() => Ok(Head::Sentinel),
            Some(Symbol::Terminal(t)) => Ok(Head::Terminal(t)),
            Some(Symbol::Variable(_)) => Err(CanonError::unexpected(format!(
                "chain {chain} ends at a derivation led by a variable"
            ))),
        },
        Rule::Selection { .. } => Err(CanonError::unexpected(format!(
            "chain {chain} ends at a selection"
        ))),
    }
}

/// Non-leading symbols along `chain`, in the order they are derived.
fn trailing<'g>(grammar: &'g Grammar, chain: &Chain) -> CanonResult<Vec<&'g Symbol>> {
    let mut symbols = Vec::new();
    for var in chain.variables().iter().rev() {
        if let Rule::Derivation { rhs, .. } = grammar.rule(var)? {
            symbols.extend(rhs.iter().skip(1));
        }
    }
    Ok(symbols)
}

/// Find the first reachable selection, in sorted order, with alternatives
/// that share a leading terminal.
///
/// With `detect_unsupported`, selections are first checked for shapes that
/// have no canonical form.
///
/// # Errors
///
/// Returns [`CanonError::Unsupported`] for such shapes, or a state error if
/// the grammar does not have the structure chains expect.
pub fn discover(grammar: &Grammar, detect_unsupported: bool) -> CanonResult<Option<CommonPrefix>> {
    let reachable = grammar.reachable();
    for rule in grammar.rules_sorted() {
        let Rule::Selection { lhs, .. } = rule else {
            continue;
        };
        if !reachable.contains(lhs) {
            continue;
        }
        let found = chains(grammar, lhs)?;
        let heads = found
            .iter()
            .map(|chain| head(grammar, chain))
            .collect::<CanonResult<Vec<_>>>()?;

        if detect_unsupported {
            check_supported(grammar, lhs, &found, &heads)?;
        }

        if let Some(prefix) = group(lhs, &found, &heads) {
            return narrow(grammar, prefix).map(Some);
        }
    }
    Ok(None)
}

/// Two chains are indistinguishable when they end at the same terminus and
/// carry the same trailing symbols: both derive the same strings.
fn check_supported(
    grammar: &Grammar,
    selection: &Variable,
    chains: &[Chain],
    heads: &[Head<'_>],
) -> CanonResult<()> {
    for (i, first) in chains.iter().enumerate() {
        for second in &chains[i + 1..] {
            if first.terminus() != second.terminus()
                || trailing(grammar, first)? != trailing(grammar, second)?
            {
                continue;
            }
            let shape = if matches!(heads[i], Head::Empty | Head::Sentinel) {
                UnsupportedShape::ConvergingEmpty {
                    selection: selection.clone(),
                    terminus: first.terminus().clone(),
                }
            } else {
                UnsupportedShape::IdenticalAlternatives {
                    selection: selection.clone(),
                    first: first.variables().to_vec(),
                    second: second.variables().to_vec(),
                }
            };
            return Err(CanonError::Unsupported(shape));
        }
    }
    Ok(())
}

/// Pick the terminal of the first colliding pair and gather every chain led by it.
fn group(root: &Variable, chains: &[Chain], heads: &[Head<'_>]) -> Option<CommonPrefix> {
    let symbol = heads.iter().enumerate().find_map(|(i, a)| match a {
        Head::Terminal(t) => heads[i + 1..]
            .iter()
            .any(|b| b == a)
            .then_some(*t),
        Head::Empty | Head::Sentinel => None,
    })?;

    let chains = chains
        .iter()
        .zip(heads)
        .filter(|(_, h)| matches!(h, Head::Terminal(t) if *t == symbol))
        .map(|(c, _)| c.clone())
        .collect();
    Some(CommonPrefix {
        symbol: symbol.clone(),
        root: root.clone(),
        chains,
    })
}

/// Move the root down to the last variable every chain shares.
fn narrow(grammar: &Grammar, prefix: CommonPrefix) -> CanonResult<CommonPrefix> {
    let Some((first, rest)) = prefix.chains.split_first() else {
        return Ok(prefix);
    };
    let shared = rest.iter().fold(first.len(), |len, chain| {
        first
            .variables()
            .iter()
            .zip(chain.variables())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count()
    });
    if shared < 2 {
        return Ok(prefix);
    }

    let pivot = first.variables()[shared - 1].clone();
    if !grammar.rule(&pivot)?.is_selection() {
        return Err(CanonError::unexpected(format!(
            "chains diverge below {pivot}, which is not a selection"
        )));
    }
    tracing::trace!(from = %prefix.root, to = %pivot, "narrowed common prefix");

    let chains = prefix
        .chains
        .iter()
        .map(|chain| Chain(chain.variables()[shared - 1..].to_vec()))
        .collect();
    Ok(CommonPrefix {
        symbol: prefix.symbol,
        root: pivot,
        chains,
    })
}
