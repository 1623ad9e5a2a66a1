//! Terminal normalization.
//!
//! After this pass a terminal only ever appears first in a derivation. Each
//! later occurrence is moved into a fresh bridge rule `X ::= t`, one bridge
//! per occurrence, named after the terminal in upper case.

use crate::error::CanonResult;
use crate::grammar::{Grammar, Rule, Symbol, Terminal};
use crate::info::{ParserInfo, ParserInfos};
use crate::transform::Session;

/// Replace every non-leading terminal with a reference to a bridge rule.
///
/// Already-normalized grammars come back unchanged.
///
/// # Errors
///
/// Returns a grammar error if the rewritten rule set fails validation.
pub fn normalize_terminals(
    grammar: &Grammar,
    infos: &ParserInfos,
    session: &mut Session,
) -> CanonResult<(Grammar, ParserInfos)> {
    let mut infos = infos.clone();
    let mut rules = Vec::with_capacity(grammar.len());
    let mut bridges = 0;

    for rule in grammar.rules_sorted() {
        let Rule::Derivation { lhs, rhs } = rule else {
            rules.push(rule.clone());
            continue;
        };
        let mut normalized = Vec::with_capacity(rhs.len());
        for (position, symbol) in rhs.iter().enumerate() {
            match symbol {
                Symbol::Terminal(terminal) if position > 0 => {
                    let bridge = session.fresh_variable(&bridge_seed(terminal));
                    tracing::trace!(rule = %lhs, %terminal, bridge = %bridge, "bridged terminal");
                    rules.push(Rule::derivation(bridge.clone(), [symbol.clone()]));
                    infos.insert(bridge.clone(), ParserInfo::Bridge);
                    normalized.push(Symbol::Variable(bridge));
                    bridges += 1;
                }
                _ => normalized.push(symbol.clone()),
            }
        }
        rules.push(Rule::derivation(lhs.clone(), normalized));
    }

    if bridges == 0 {
        return Ok((grammar.clone(), infos));
    }
    session.stats.bridges += bridges;
    Ok((Grammar::new(grammar.start().clone(), rules)?, infos))
}

/// Upper-cased terminal name, kept to identifier characters and led by an
/// upper-case letter so the bridge reads back as a variable.
fn bridge_seed(terminal: &Terminal) -> String {
    let upper: String = terminal
        .name()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_uppercase)
        .collect();
    if upper.starts_with(char::is_uppercase) {
        upper
    } else {
        format!("T{upper}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{canonical_violations, parse_grammar};

    #[test]
    fn test_bridges_every_later_terminal() {
        let grammar = parse_grammar("D ::= x mul y\n").unwrap();
        let infos = ParserInfos::full_for(&grammar);
        let mut session = Session::for_grammar(&grammar);
        let (normalized, infos) = normalize_terminals(&grammar, &infos, &mut session).unwrap();

        assert!(canonical_violations(&normalized).is_empty());
        assert_eq!(normalized.len(), 3);
        assert_eq!(session.stats().bridges, 2);
        assert_eq!(normalized.to_string(), "start D\nD ::= x MUL Y\nMUL ::= mul\nY ::= y\n");

        let bridge = normalized
            .rules()
            .find(|r| r.lhs().name() == "MUL")
            .unwrap();
        assert_eq!(infos.get(bridge.lhs()), Some(&ParserInfo::Bridge));
        assert_eq!(bridge.leading_terminal(), Some(&Terminal::new("mul")));
    }

    #[test]
    fn test_one_bridge_per_occurrence() {
        let grammar = parse_grammar("A ::= x y y\n").unwrap();
        let infos = ParserInfos::full_for(&grammar);
        let mut session = Session::for_grammar(&grammar);
        let (normalized, _) = normalize_terminals(&grammar, &infos, &mut session).unwrap();
        assert_eq!(normalized.to_string(), "start A\nA ::= x Y Y0\nY ::= y\nY0 ::= y\n");
    }

    #[test]
    fn test_bridge_names_read_back_as_variables() {
        let grammar = parse_grammar("A ::= x _y\n").unwrap();
        let infos = ParserInfos::full_for(&grammar);
        let mut session = Session::for_grammar(&grammar);
        let (normalized, _) = normalize_terminals(&grammar, &infos, &mut session).unwrap();
        let text = normalized.to_string();
        assert_eq!(text, "start A\nA ::= x T_Y\nT_Y ::= _y\n");
        assert_eq!(parse_grammar(&text).unwrap().to_string(), text);

        assert_eq!(bridge_seed(&Terminal::new("+")), "T");
        assert_eq!(bridge_seed(&Terminal::new("mul")), "MUL");
    }

    #[test]
    fn test_idempotent() {
        let grammar = parse_grammar("A ::= x B\nB ::= y\n").unwrap();
        let infos = ParserInfos::full_for(&grammar);
        let mut session = Session::for_grammar(&grammar);
        let (again, again_infos) = normalize_terminals(&grammar, &infos, &mut session).unwrap();
        assert_eq!(again, grammar);
        assert_eq!(again_infos, infos);
        assert_eq!(session.stats().bridges, 0);
    }
}
