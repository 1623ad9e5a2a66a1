//! Tests for grammar builder and validation

use stepwise::grammar::{
    canonical_violations, grammar_summary, Grammar, GrammarBuilder, GrammarError, GrammarMetrics,
    Rule, Symbol, Terminal, Variable, VariableSource, Violation,
};

fn t(name: &str) -> Symbol {
    Symbol::Terminal(Terminal::new(name))
}

fn v(var: &Variable) -> Symbol {
    Symbol::Variable(var.clone())
}

struct Vars {
    expr: Variable,
    add: Variable,
    lit: Variable,
    plus: Variable,
}

fn vars() -> Vars {
    let mut source = VariableSource::new();
    Vars {
        expr: source.fresh("Expr"),
        add: source.fresh("Add"),
        lit: source.fresh("Lit"),
        plus: source.fresh("Plus"),
    }
}

fn expression_grammar(vars: &Vars) -> Result<Grammar, GrammarError> {
    GrammarBuilder::new()
        .start(vars.expr.clone())
        .selection(vars.expr.clone(), [vars.add.clone(), vars.lit.clone()])
        .derivation(vars.add.clone(), [t("num"), v(&vars.plus)])
        .derivation(vars.lit.clone(), [t("num")])
        .derivation(vars.plus.clone(), [t("plus")])
        .build()
}

#[test]
fn test_grammar_builder_simple() {
    let vars = vars();
    let grammar = expression_grammar(&vars).unwrap();
    assert_eq!(grammar.start(), &vars.expr);
    assert_eq!(grammar.len(), 4);
    assert!(grammar.rule(&vars.expr).unwrap().is_selection());
    assert_eq!(
        grammar.to_string(),
        "start Expr\nExpr ::= Add | Lit\nAdd ::= num Plus\nLit ::= num\nPlus ::= plus\n"
    );
}

#[test]
fn test_grammar_builder_missing_start() {
    let vars = vars();
    let result = GrammarBuilder::new()
        .derivation(vars.lit.clone(), [t("num")])
        .build();
    assert_eq!(result, Err(GrammarError::MissingStart));
}

#[test]
fn test_start_without_rule() {
    let vars = vars();
    let result = GrammarBuilder::new()
        .start(vars.expr.clone())
        .derivation(vars.lit.clone(), [t("num")])
        .build();
    assert_eq!(result, Err(GrammarError::MissingStartRule(vars.expr)));
}

#[test]
fn test_undefined_reference() {
    let vars = vars();
    let result = GrammarBuilder::new()
        .start(vars.add.clone())
        .derivation(vars.add.clone(), [t("num"), v(&vars.plus)])
        .build();
    assert_eq!(result, Err(GrammarError::UndefinedRule(vars.plus)));
}

#[test]
fn test_selection_needs_two_distinct_alternatives() {
    let vars = vars();
    let single = GrammarBuilder::new()
        .start(vars.expr.clone())
        .selection(vars.expr.clone(), [vars.lit.clone()])
        .derivation(vars.lit.clone(), [t("num")])
        .build();
    assert_eq!(
        single,
        Err(GrammarError::MalformedSelection {
            lhs: vars.expr.clone()
        })
    );

    let repeated = GrammarBuilder::new()
        .start(vars.expr.clone())
        .selection(vars.expr.clone(), [vars.lit.clone(), vars.lit.clone()])
        .derivation(vars.lit.clone(), [t("num")])
        .build();
    assert!(matches!(repeated, Err(GrammarError::MalformedSelection { .. })));
}

#[test]
fn test_recursion_rejected() {
    let vars = vars();
    let result = GrammarBuilder::new()
        .start(vars.expr.clone())
        .selection(vars.expr.clone(), [vars.add.clone(), vars.lit.clone()])
        .derivation(vars.add.clone(), [t("num"), v(&vars.plus), v(&vars.expr)])
        .derivation(vars.lit.clone(), [t("num")])
        .derivation(vars.plus.clone(), [t("plus")])
        .build();
    let Err(GrammarError::Recursive(cycle)) = result else {
        panic!("expected recursion error, got {result:?}");
    };
    assert!(cycle.contains(&vars.expr));
    assert!(cycle.contains(&vars.add));
}

#[test]
fn test_same_name_different_variables() {
    let mut source = VariableSource::new();
    let a = source.fresh("A");
    let other_a = source.fresh("A");
    assert_ne!(a, other_a);

    let grammar = GrammarBuilder::new()
        .start(a.clone())
        .derivation(a.clone(), [t("x"), v(&other_a)])
        .derivation(other_a.clone(), [t("y")])
        .build()
        .unwrap();
    assert_eq!(grammar.len(), 2);
}

#[test]
fn test_with_rule_replaces_and_revalidates() {
    let vars = vars();
    let grammar = expression_grammar(&vars).unwrap();

    let replaced = grammar
        .with_rule(Rule::derivation(vars.lit.clone(), [t("str")]))
        .unwrap();
    assert_eq!(
        replaced.rule(&vars.lit).unwrap().leading_terminal(),
        Some(&Terminal::new("str"))
    );
    // The original is untouched.
    assert_eq!(
        grammar.rule(&vars.lit).unwrap().leading_terminal(),
        Some(&Terminal::new("num"))
    );

    let cyclic = grammar.with_rule(Rule::derivation(vars.plus.clone(), [v(&vars.expr)]));
    assert!(matches!(cyclic, Err(GrammarError::Recursive(_))));
}

#[test]
fn test_prune_unreachable() {
    let vars = vars();
    let grammar = GrammarBuilder::new()
        .start(vars.lit.clone())
        .derivation(vars.lit.clone(), [t("num")])
        .derivation(vars.plus.clone(), [t("plus")])
        .build()
        .unwrap();

    let (pruned, removed) = grammar.prune_unreachable(|_| Vec::new());
    assert_eq!(removed, vec![vars.plus.clone()]);
    assert_eq!(pruned.len(), 1);

    let lit = vars.lit.clone();
    let plus = vars.plus.clone();
    let (kept, removed) =
        grammar.prune_unreachable(|var| if *var == lit { vec![plus.clone()] } else { Vec::new() });
    assert!(removed.is_empty());
    assert_eq!(kept, grammar);
}

#[test]
fn test_metrics_and_violations() {
    let vars = vars();
    let grammar = expression_grammar(&vars).unwrap();
    let metrics = GrammarMetrics::compute(&grammar);
    assert_eq!(metrics.rule_count, 4);
    assert_eq!(metrics.selection_count, 1);
    assert_eq!(metrics.derivation_count, 3);
    assert_eq!(metrics.terminal_count, 2);
    assert_eq!(metrics.max_depth, 2);
    assert!(canonical_violations(&grammar).is_empty());
    assert!(grammar_summary(&grammar).contains("4 rules"));

    let raw = GrammarBuilder::new()
        .start(vars.add.clone())
        .derivation(vars.add.clone(), [t("num"), t("plus"), v(&vars.lit)])
        .derivation(vars.lit.clone(), [])
        .build()
        .unwrap();
    assert_eq!(
        canonical_violations(&raw),
        vec![
            Violation::NonLeadingTerminal {
                rule: vars.add.clone(),
                position: 1
            },
            Violation::EmptyDerivation(vars.lit.clone()),
        ]
    );
}
