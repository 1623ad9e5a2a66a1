//! Bounded language enumeration.
//!
//! Recursion-free grammars derive finite languages, so comparing the full
//! set of terminal strings before and after a rewrite is a direct check
//! that the rewrite preserved meaning. Bridge rules need no special case
//! and the empty sentinel counts as the empty string.

use crate::grammar::{Grammar, Rule, Symbol, Terminal, Variable};
use hashbrown::HashMap;
use std::collections::{BTreeMap, BTreeSet};

/// One terminal string.
pub type Word = Vec<Terminal>;

/// Every string `grammar` derives from its start variable, or `None` if any
/// variable's language exceeds `limit` strings.
#[must_use]
pub fn language(grammar: &Grammar, limit: usize) -> Option<BTreeSet<Word>> {
    let mut memo = HashMap::default();
    words(grammar, grammar.start(), limit, &mut memo)
}

fn words(
    grammar: &Grammar,
    var: &Variable,
    limit: usize,
    memo: &mut HashMap<Variable, BTreeSet<Word>, ahash::RandomState>,
) -> Option<BTreeSet<Word>> {
    if let Some(known) = memo.get(var) {
        return Some(known.clone());
    }
    let result = match grammar.get_rule(var)? {
        Rule::Derivation { rhs, .. } => {
            let mut acc: BTreeSet<Word> = BTreeSet::from([Vec::new()]);
            for symbol in rhs {
                acc = match symbol {
                    Symbol::Terminal(t) if t.is_empty_sentinel() => acc,
                    Symbol::Terminal(t) => acc
                        .into_iter()
                        .map(|mut w| {
                            w.push(t.clone());
                            w
                        })
                        .collect(),
                    Symbol::Variable(v) => {
                        let tails = words(grammar, v, limit, memo)?;
                        if acc.len().saturating_mul(tails.len()) > limit {
                            return None;
                        }
                        acc.iter()
                            .flat_map(|head| {
                                tails.iter().map(move |tail| {
                                    let mut w = head.clone();
                                    w.extend(tail.iter().cloned());
                                    w
                                })
                            })
                            .collect()
                    }
                };
            }
            acc
        }
        Rule::Selection { alternatives, .. } => {
            let mut acc = BTreeSet::new();
            for alt in alternatives {
                acc.extend(words(grammar, alt, limit, memo)?);
                if acc.len() > limit {
                    return None;
                }
            }
            acc
        }
    };
    memo.insert(var.clone(), result.clone());
    Some(result)
}

/// Number of distinct derivation trees behind every string `grammar`
/// derives from its start variable, or `None` past `limit` strings.
///
/// Counts saturate at `u64::MAX`.
#[must_use]
pub fn derivation_counts(grammar: &Grammar, limit: usize) -> Option<BTreeMap<Word, u64>> {
    let mut memo = HashMap::default();
    counts(grammar, grammar.start(), limit, &mut memo)
}

/// Whether some string has more than one derivation. `None` past `limit`.
#[must_use]
pub fn is_ambiguous(grammar: &Grammar, limit: usize) -> Option<bool> {
    derivation_counts(grammar, limit).map(|counts| counts.values().any(|&n| n > 1))
}

fn counts(
    grammar: &Grammar,
    var: &Variable,
    limit: usize,
    memo: &mut HashMap<Variable, BTreeMap<Word, u64>, ahash::RandomState>,
) -> Option<BTreeMap<Word, u64>> {
    if let Some(known) = memo.get(var) {
        return Some(known.clone());
    }
    let result = match grammar.get_rule(var)? {
        Rule::Derivation { rhs, .. } => {
            let mut acc: BTreeMap<Word, u64> = BTreeMap::from([(Vec::new(), 1)]);
            for symbol in rhs {
                acc = match symbol {
                    Symbol::Terminal(t) if t.is_empty_sentinel() => acc,
                    Symbol::Terminal(t) => acc
                        .into_iter()
                        .map(|(mut w, n)| {
                            w.push(t.clone());
                            (w, n)
                        })
                        .collect(),
                    Symbol::Variable(v) => {
                        let tails = counts(grammar, v, limit, memo)?;
                        if acc.len().saturating_mul(tails.len()) > limit {
                            return None;
                        }
                        let mut joined = BTreeMap::new();
                        for (head, n) in &acc {
                            for (tail, m) in &tails {
                                let mut w = head.clone();
                                w.extend(tail.iter().cloned());
                                let entry = joined.entry(w).or_insert(0u64);
                                *entry = entry.saturating_add(n.saturating_mul(*m));
                            }
                        }
                        joined
                    }
                };
            }
            acc
        }
        Rule::Selection { alternatives, .. } => {
            let mut acc: BTreeMap<Word, u64> = BTreeMap::new();
            for alt in alternatives {
                for (w, n) in counts(grammar, alt, limit, memo)? {
                    let entry = acc.entry(w).or_insert(0);
                    *entry = entry.saturating_add(n);
                }
                if acc.len() > limit {
                    return None;
                }
            }
            acc
        }
    };
    memo.insert(var.clone(), result.clone());
    Some(result)
}

/// Render a word as space-separated terminal names.
#[must_use]
pub fn render(word: &[Terminal]) -> String {
    word.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parse_grammar;

    fn rendered(src: &str) -> Vec<String> {
        let grammar = parse_grammar(src).unwrap();
        language(&grammar, 100)
            .unwrap()
            .iter()
            .map(|w| render(w))
            .collect()
    }

    #[test]
    fn test_selection_and_concatenation() {
        assert_eq!(
            rendered("A ::= B | C\nB ::= x Y\nC ::= z\nY ::= y\n"),
            vec!["x y", "z"]
        );
    }

    #[test]
    fn test_empty_derivation_is_epsilon() {
        assert_eq!(rendered("A ::= x B\nB ::=\n"), vec!["x"]);
    }

    #[test]
    fn test_ambiguity() {
        let ambiguous = parse_grammar("A ::= B | C\nB ::= D\nC ::= D\nD ::= x\n").unwrap();
        assert_eq!(is_ambiguous(&ambiguous, 100), Some(true));
        let counts = derivation_counts(&ambiguous, 100).unwrap();
        assert_eq!(counts.values().copied().collect::<Vec<_>>(), vec![2]);

        let plain = parse_grammar("A ::= B | C\nB ::= x\nC ::= x Y\nY ::= y\n").unwrap();
        assert_eq!(is_ambiguous(&plain, 100), Some(false));
    }

    #[test]
    fn test_empty_ambiguity_needs_matching_tails() {
        let grammar = parse_grammar(
            "A ::= B C\n\
             B ::= E | F\n\
             C ::= E | F\n\
             E ::=\n\
             F ::= f\n",
        )
        .unwrap();
        // `f` comes from either B or C.
        assert_eq!(is_ambiguous(&grammar, 100), Some(true));
        let lone = parse_grammar("A ::= B x\nB ::= E | F\nE ::=\nF ::= f\n").unwrap();
        assert_eq!(is_ambiguous(&lone, 100), Some(false));
    }

    #[test]
    fn test_limit() {
        let grammar = parse_grammar(
            "A ::= B C\n\
             B ::= P | Q\n\
             C ::= P | Q\n\
             P ::= p\n\
             Q ::= q\n",
        )
        .unwrap();
        assert_eq!(language(&grammar, 4).map(|l| l.len()), Some(4));
        assert_eq!(language(&grammar, 3), None);
    }
}
