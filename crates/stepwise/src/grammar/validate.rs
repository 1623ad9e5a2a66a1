use crate::grammar::builder::GrammarError;
use crate::grammar::rule::Rule;
use crate::grammar::symbol::Variable;
use hashbrown::{HashMap, HashSet};

/// Validate a rule set against the grammar invariants.
///
/// Checks run in a fixed order (duplicates, start rule, selection shape,
/// undefined references, recursion) over rules sorted by left-hand side, so
/// the same input always reports the same error.
///
/// # Errors
///
/// Returns the first [`GrammarError`] found.
pub fn validate_grammar(start: &Variable, rules: &[Rule]) -> Result<(), GrammarError> {
    let mut sorted: Vec<&Rule> = rules.iter().collect();
    sorted.sort_by(|a, b| a.lhs().cmp(b.lhs()));

    let mut by_lhs: HashMap<&Variable, &Rule, ahash::RandomState> = HashMap::default();
    for rule in &sorted {
        if by_lhs.insert(rule.lhs(), rule).is_some() {
            return Err(GrammarError::DuplicateRule(rule.lhs().clone()));
        }
    }

    if !by_lhs.contains_key(start) {
        return Err(GrammarError::MissingStartRule(start.clone()));
    }

    for rule in &sorted {
        check_selection(rule)?;
    }

    for rule in &sorted {
        if let Some(missing) = rule.references().into_iter().find(|v| !by_lhs.contains_key(*v)) {
            return Err(GrammarError::UndefinedRule(missing.clone()));
        }
    }

    if let Some(cycle) = find_cycle(&sorted, &by_lhs) {
        return Err(GrammarError::Recursive(cycle));
    }

    Ok(())
}

fn check_selection(rule: &Rule) -> Result<(), GrammarError> {
    let Rule::Selection { lhs, alternatives } = rule else {
        return Ok(());
    };
    let distinct: HashSet<&Variable, ahash::RandomState> = alternatives.iter().collect();
    if alternatives.len() < 2 || distinct.len() != alternatives.len() {
        return Err(GrammarError::MalformedSelection { lhs: lhs.clone() });
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

/// Depth-first search for a reference cycle. Returns the cycle with its
/// first variable repeated at the end.
fn find_cycle(
    sorted: &[&Rule],
    by_lhs: &HashMap<&Variable, &Rule, ahash::RandomState>,
) -> Option<Vec<Variable>> {
    let mut marks: HashMap<&Variable, Mark, ahash::RandomState> = HashMap::default();

    for root in sorted.iter().map(|r| r.lhs()) {
        if marks.contains_key(root) {
            continue;
        }
        // Frames are (variable, index of the next reference to visit).
        let mut path: Vec<(&Variable, usize)> = vec![(root, 0)];
        marks.insert(root, Mark::Active);

        while let Some(&(var, next)) = path.last() {
            let refs = by_lhs.get(var).map(|r| r.references()).unwrap_or_default();
            if let Some(child) = refs.get(next).copied() {
                if let Some(frame) = path.last_mut() {
                    frame.1 += 1;
                }
                match marks.get(child) {
                    Some(Mark::Active) => {
                        let from = path.iter().position(|(v, _)| *v == child).unwrap_or(0);
                        let mut cycle: Vec<Variable> =
                            path[from..].iter().map(|(v, _)| (*v).clone()).collect();
                        cycle.push(child.clone());
                        return Some(cycle);
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(child, Mark::Active);
                        path.push((child, 0));
                    }
                }
            } else {
                marks.insert(var, Mark::Done);
                path.pop();
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::symbol::{Symbol, Terminal, VariableSource};

    fn t(name: &str) -> Symbol {
        Terminal::new(name).into()
    }

    #[test]
    fn test_duplicate_rule() {
        let mut vars = VariableSource::new();
        let a = vars.fresh("A");
        let rules = [
            Rule::derivation(a.clone(), [t("x")]),
            Rule::derivation(a.clone(), [t("y")]),
        ];
        assert_eq!(validate_grammar(&a, &rules), Err(GrammarError::DuplicateRule(a)));
    }

    #[test]
    fn test_missing_start_rule() {
        let mut vars = VariableSource::new();
        let a = vars.fresh("A");
        let b = vars.fresh("B");
        let rules = [Rule::derivation(b, [t("x")])];
        assert_eq!(
            validate_grammar(&a, &rules),
            Err(GrammarError::MissingStartRule(a))
        );
    }

    #[test]
    fn test_undefined_reference() {
        let mut vars = VariableSource::new();
        let a = vars.fresh("A");
        let b = vars.fresh("B");
        let rules = [Rule::derivation(a.clone(), [t("x"), b.clone().into()])];
        assert_eq!(validate_grammar(&a, &rules), Err(GrammarError::UndefinedRule(b)));
    }

    #[test]
    fn test_malformed_selection() {
        let mut vars = VariableSource::new();
        let a = vars.fresh("A");
        let b = vars.fresh("B");
        let single = [
            Rule::selection(a.clone(), [b.clone()]),
            Rule::derivation(b.clone(), [t("x")]),
        ];
        assert_eq!(
            validate_grammar(&a, &single),
            Err(GrammarError::MalformedSelection { lhs: a.clone() })
        );

        let repeated = [
            Rule::selection(a.clone(), [b.clone(), b.clone()]),
            Rule::derivation(b, [t("x")]),
        ];
        assert_eq!(
            validate_grammar(&a, &repeated),
            Err(GrammarError::MalformedSelection { lhs: a })
        );
    }

    #[test]
    fn test_recursion_through_non_leading_position() {
        let mut vars = VariableSource::new();
        let a = vars.fresh("A");
        let b = vars.fresh("B");
        let c = vars.fresh("C");
        let rules = [
            Rule::selection(a.clone(), [b.clone(), c.clone()]),
            Rule::derivation(b.clone(), [t("x"), a.clone().into()]),
            Rule::derivation(c, [t("y")]),
        ];
        match validate_grammar(&a, &rules) {
            Err(GrammarError::Recursive(cycle)) => {
                assert_eq!(cycle.first(), cycle.last());
                assert!(cycle.contains(&a) && cycle.contains(&b));
            }
            other => panic!("expected recursion error, got {other:?}"),
        }
    }

    #[test]
    fn test_shared_subrule_is_not_a_cycle() {
        let mut vars = VariableSource::new();
        let a = vars.fresh("A");
        let b = vars.fresh("B");
        let c = vars.fresh("C");
        let d = vars.fresh("D");
        let rules = [
            Rule::selection(a.clone(), [b.clone(), c.clone()]),
            Rule::derivation(b, [d.clone().into(), t("x")]),
            Rule::derivation(c, [d.clone().into(), t("y")]),
            Rule::derivation(d, [t("z")]),
        ];
        assert_eq!(validate_grammar(&a, &rules), Ok(()));
    }
}
