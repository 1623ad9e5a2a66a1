//! Grammar visualization utilities
//!
//! This module renders grammars as DOT/Graphviz graphs. Variables become
//! ellipses (diamonds for selections), terminals become blue boxes, and
//! derivation edges are labelled with the symbol position.

use hashbrown::HashSet;
use std::fmt;
use stepwise::grammar::{Grammar, Rule, Symbol, Terminal, Variable};
use stepwise::info::{ParserInfo, ParserInfos};

/// Rendering options for [`generate_dot_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DotOptions<'a> {
    /// Colour variables by parser-info kind
    pub infos: Option<&'a ParserInfos>,
    /// Highlight selections whose alternatives share a leading terminal
    pub show_conflicts: bool,
}

/// Generate a DOT/Graphviz representation of a grammar
///
/// # Example
///
/// ```rust
/// use stepwise::grammar::parse_grammar;
/// use stepwise_tools::visualize::generate_dot;
///
/// let grammar = parse_grammar("A ::= x B\nB ::= y\n").unwrap();
/// let dot = generate_dot(&grammar);
/// assert!(dot.starts_with("digraph Grammar {"));
/// ```
#[must_use]
pub fn generate_dot(grammar: &Grammar) -> String {
    generate_dot_with(grammar, DotOptions::default())
}

#[must_use]
pub fn generate_dot_with(grammar: &Grammar, options: DotOptions<'_>) -> String {
    Dot { grammar, options }.to_string()
}

struct Dot<'a> {
    grammar: &'a Grammar,
    options: DotOptions<'a>,
}

fn node_id(var: &Variable) -> String {
    format!("v{}", var.id())
}

fn terminal_id(terminal: &Terminal) -> String {
    format!("t_{terminal}")
}

fn info_style(info: Option<&ParserInfo>) -> &'static str {
    match info {
        Some(ParserInfo::PartialSelection { .. } | ParserInfo::PartialDerivation { .. }) => {
            ", style=filled, fillcolor=lightyellow"
        }
        Some(ParserInfo::Bridge) => ", style=filled, fillcolor=lightgray",
        Some(ParserInfo::Full { .. }) | None => "",
    }
}

impl Dot<'_> {
    /// Selections with two chains led by the same terminal.
    fn conflicts(&self) -> HashSet<Variable, ahash::RandomState> {
        let mut found = HashSet::default();
        if !self.options.show_conflicts {
            return found;
        }
        for rule in self.grammar.rules_sorted() {
            let Rule::Selection { lhs, .. } = rule else {
                continue;
            };
            let Ok(chains) = stepwise::transform::chains(self.grammar, lhs) else {
                continue;
            };
            let mut heads: HashSet<&Terminal, ahash::RandomState> = HashSet::default();
            for chain in &chains {
                let lead = self
                    .grammar
                    .get_rule(chain.terminus())
                    .and_then(Rule::leading_terminal);
                if let Some(terminal) = lead {
                    if !terminal.is_empty_sentinel() && !heads.insert(terminal) {
                        found.insert(lhs.clone());
                        break;
                    }
                }
            }
        }
        found
    }
}

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conflicts = self.conflicts();

        writeln!(f, "digraph Grammar {{")?;
        writeln!(f, "  rankdir=LR;")?;
        writeln!(f, "  node [shape=box];")?;
        writeln!(f)?;

        let rules = self.grammar.rules_sorted();
        for rule in &rules {
            let var = rule.lhs();
            let shape = if rule.is_selection() { "diamond" } else { "ellipse" };
            let mut style = String::from(info_style(
                self.options.infos.and_then(|infos| infos.get(var)),
            ));
            if conflicts.contains(var) {
                style = String::from(", style=filled, fillcolor=orange");
            }
            let peripheries = if var == self.grammar.start() { ", peripheries=2" } else { "" };
            writeln!(
                f,
                "  {} [label=\"{}\", shape={shape}{style}{peripheries}];",
                node_id(var),
                var.name()
            )?;
        }

        writeln!(f)?;
        let mut terminals: Vec<&Terminal> = self.grammar.terminals().into_iter().collect();
        terminals.sort();
        writeln!(f, "  // Terminals")?;
        for terminal in &terminals {
            writeln!(
                f,
                "  \"{}\" [label=\"{terminal}\", shape=box, style=filled, fillcolor=lightblue];",
                terminal_id(terminal)
            )?;
        }

        writeln!(f)?;
        for rule in &rules {
            let from = node_id(rule.lhs());
            match rule {
                Rule::Selection { alternatives, .. } => {
                    for alt in alternatives {
                        writeln!(f, "  {from} -> {} [style=dashed];", node_id(alt))?;
                    }
                }
                Rule::Derivation { rhs, .. } => {
                    for (position, symbol) in rhs.iter().enumerate() {
                        let to = match symbol {
                            Symbol::Variable(var) => node_id(var),
                            Symbol::Terminal(terminal) => format!("\"{}\"", terminal_id(terminal)),
                        };
                        writeln!(f, "  {from} -> {to} [label=\"{position}\"];")?;
                    }
                }
            }
        }

        if !conflicts.is_empty() {
            writeln!(f)?;
            writeln!(f, "  // Legend")?;
            writeln!(f, "  subgraph cluster_legend {{")?;
            writeln!(f, "    label=\"Legend\";")?;
            writeln!(f, "    style=dashed;")?;
            writeln!(
                f,
                "    legend_conflict [label=\"Shared prefix\", shape=diamond, style=filled, fillcolor=orange];"
            )?;
            writeln!(f, "  }}")?;
        }
        writeln!(f, "}}")
    }
}

/// Render the text format with each rule's parser info as a trailing comment.
#[must_use]
pub fn annotated_text(grammar: &Grammar, infos: &ParserInfos) -> String {
    let mut out = String::new();
    for line in grammar.to_string().lines() {
        let info = line
            .split_once(" ::=")
            .and_then(|(lhs, _)| grammar.variables().find(|v| v.name() == lhs))
            .and_then(|var| infos.get(var));
        match info {
            Some(info) => out.push_str(&format!("{line:<40} # {info}\n")),
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise::grammar::parse_grammar;

    #[test]
    fn test_dot_contains_nodes_and_edges() {
        let grammar = parse_grammar("A ::= B | C\nB ::= x Y\nC ::= z\nY ::= y\n").unwrap();
        let dot = generate_dot(&grammar);
        let a = node_id(grammar.start());
        assert!(dot.contains(&format!("{a} [label=\"A\", shape=diamond, peripheries=2];")));
        assert!(dot.contains("\"t_x\" [label=\"x\""));
        assert!(dot.contains("[label=\"1\"]"));
        assert!(dot.trim_end().ends_with('}'));
        assert!(!dot.contains("Legend"));
    }

    #[test]
    fn test_conflicts_highlighted() {
        let grammar = parse_grammar("A ::= B | C\nB ::= x\nC ::= x Y\nY ::= y\n").unwrap();
        let dot = generate_dot_with(
            &grammar,
            DotOptions {
                infos: None,
                show_conflicts: true,
            },
        );
        assert!(dot.contains("fillcolor=orange, peripheries=2"));
        assert!(dot.contains("Legend"));
    }

    #[test]
    fn test_annotated_text() {
        let grammar = parse_grammar("A ::= x B\nB ::= y\n").unwrap();
        let infos = ParserInfos::full_for(&grammar);
        let text = annotated_text(&grammar, &infos);
        assert!(text.starts_with("start A\n"));
        assert!(text.contains("# full B"));
    }
}
