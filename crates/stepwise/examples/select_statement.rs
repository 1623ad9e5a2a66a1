//! Example: SELECT statement builder
//!
//! Builds a small SQL-like grammar with the fluent `GrammarBuilder`, then
//! canonicalizes it and prints the rules a builder API would be generated
//! from, each with its parser info.

use stepwise::grammar::{
    GrammarBuilder, GrammarMetrics, Parameter, Symbol, Terminal, VariableSource,
};
use stepwise::info::ParserInfos;
use stepwise::transform::{CanonicalizeConfig, Canonicalizer};

fn t(name: &str) -> Symbol {
    Symbol::Terminal(Terminal::new(name))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut vars = VariableSource::new();
    let query = vars.fresh("Query");
    let select_all = vars.fresh("SelectAll");
    let select_cols = vars.fresh("SelectColumns");
    let select_where = vars.fresh("SelectWhere");
    let columns = vars.fresh("Columns");
    let table = vars.fresh("Table");
    let filter = vars.fresh("Filter");

    let ident = |name: &str| {
        Symbol::Terminal(Terminal::with_params(
            "ident",
            vec![Parameter::new("String", name)],
        ))
    };

    // Three statements that all start with `select`.
    let grammar = GrammarBuilder::new()
        .start(query.clone())
        .selection(
            query.clone(),
            [select_all.clone(), select_cols.clone(), select_where.clone()],
        )
        .derivation(
            select_all.clone(),
            [t("select"), t("star"), Symbol::Variable(table.clone())],
        )
        .derivation(
            select_cols.clone(),
            [
                t("select"),
                Symbol::Variable(columns.clone()),
                Symbol::Variable(table.clone()),
            ],
        )
        .derivation(
            select_where.clone(),
            [
                t("select"),
                t("star"),
                Symbol::Variable(table.clone()),
                Symbol::Variable(filter.clone()),
            ],
        )
        .derivation(columns, [ident("column")])
        .derivation(table, [t("from"), ident("table")])
        .derivation(filter, [t("where"), ident("condition")])
        .build()?;

    println!("Input grammar:\n{grammar}");
    println!("{}\n", stepwise::grammar::grammar_summary(&grammar));

    let infos = ParserInfos::full_for(&grammar);
    let canonical = Canonicalizer::new(CanonicalizeConfig::default())
        .canonicalize(&grammar, &infos)?;

    println!("Canonical grammar:");
    for rule in canonical.grammar.rules_sorted() {
        let info = canonical.infos.require(rule.lhs())?;
        println!("  {:<45} # {info}", rule.to_string());
    }

    let metrics = GrammarMetrics::compute(&canonical.grammar);
    println!(
        "\n{} rules after {} factoring rounds ({} synthesized, {} folded)",
        metrics.rule_count,
        canonical.stats.iterations,
        canonical.stats.synthesized,
        canonical.stats.folded
    );
    Ok(())
}
