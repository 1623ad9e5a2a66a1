//! Plain-text grammar format.
//!
//! ```text
//! # comment
//! start Expr
//! Expr ::= Add | Lit
//! Add  ::= num(int value) plus Expr2
//! Nil  ::= ε
//! ```
//!
//! Identifiers starting with an upper-case letter are variables, all others
//! are terminals. A body containing `|` is a selection and may only name
//! variables. An empty body (or `ε`) is an empty derivation, while
//! `<empty>` is the empty-string terminal that canonical grammars use.
//! Without a `start` line the first rule's variable is the start variable.
//!
//! [`Grammar`]'s `Display` writes the same format back out.

use crate::grammar::builder::{Grammar, GrammarError};
use crate::grammar::rule::Rule;
use crate::grammar::symbol::{Parameter, Symbol, Terminal, Variable, VariableSource};
use hashbrown::HashMap;
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "diagnostics", derive(miette::Diagnostic))]
pub enum TextError {
    #[error("line {line}: {message}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(stepwise::text::syntax)))]
    Syntax { line: usize, message: String },

    #[error("line {line}: selection alternative `{name}` is not a variable")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(stepwise::text::terminal_alternative),
            help("wrap the terminal in its own rule, e.g. `Name ::= {name}`")
        )
    )]
    TerminalAlternative { line: usize, name: String },

    #[error("line {line}: start variable declared twice")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(stepwise::text::duplicate_start)))]
    DuplicateStart { line: usize },

    #[error("grammar text defines no rules")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(stepwise::text::empty)))]
    NoRules,

    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Grammar(#[from] GrammarError),
}

/// Parse a grammar, numbering variables from zero.
///
/// # Errors
///
/// Returns a [`TextError`] for malformed lines or an invalid grammar.
pub fn parse_grammar(src: &str) -> Result<Grammar, TextError> {
    parse_grammar_with(src, &mut VariableSource::new())
}

/// Parse a grammar, taking variables from `vars`.
///
/// # Errors
///
/// Returns a [`TextError`] for malformed lines or an invalid grammar.
pub fn parse_grammar_with(src: &str, vars: &mut VariableSource) -> Result<Grammar, TextError> {
    let mut parser = Parser {
        vars,
        names: HashMap::default(),
    };
    let mut start: Option<Variable> = None;
    let mut rules = Vec::new();

    for (index, raw) in src.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        if let Some(rest) = content.strip_prefix("start") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                if start.is_some() {
                    return Err(TextError::DuplicateStart { line });
                }
                let name = rest.trim();
                start = Some(parser.variable(name, line)?);
                continue;
            }
        }

        let Some((lhs, body)) = content.split_once("::=") else {
            return Err(syntax(line, "expected `Name ::= body` or `start Name`"));
        };
        let lhs = parser.variable(lhs.trim(), line)?;
        rules.push(parser.rule(lhs, body, line)?);
    }

    let start = match start {
        Some(start) => start,
        None => rules
            .first()
            .map(|r: &Rule| r.lhs().clone())
            .ok_or(TextError::NoRules)?,
    };
    Ok(Grammar::new(start, rules)?)
}

fn syntax(line: usize, message: impl Into<String>) -> TextError {
    TextError::Syntax {
        line,
        message: message.into(),
    }
}

fn is_variable_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

enum Item {
    Name {
        name: String,
        params: Option<Vec<Parameter>>,
    },
    Bar,
    Epsilon,
}

struct Parser<'v> {
    vars: &'v mut VariableSource,
    names: HashMap<String, Variable, ahash::RandomState>,
}

impl Parser<'_> {
    fn variable(&mut self, name: &str, line: usize) -> Result<Variable, TextError> {
        if !is_variable_name(name) || !name.chars().all(is_ident_continue) {
            return Err(syntax(line, format!("`{name}` is not a variable name")));
        }
        if let Some(var) = self.names.get(name) {
            return Ok(var.clone());
        }
        let var = self.vars.fresh(name);
        self.names.insert(name.to_owned(), var.clone());
        Ok(var)
    }

    fn rule(&mut self, lhs: Variable, body: &str, line: usize) -> Result<Rule, TextError> {
        let items = tokenize(body, line)?;

        if items.iter().any(|item| matches!(item, Item::Bar)) {
            let mut alternatives = Vec::new();
            for group in items.split(|item| matches!(item, Item::Bar)) {
                match group {
                    [Item::Name { name, params: None }] if is_variable_name(name) => {
                        alternatives.push(self.variable(name, line)?);
                    }
                    [Item::Name { name, .. }] if is_variable_name(name) => {
                        return Err(syntax(
                            line,
                            format!("variable `{name}` cannot take parameters"),
                        ));
                    }
                    [Item::Name { name, .. }] => {
                        return Err(TextError::TerminalAlternative {
                            line,
                            name: name.clone(),
                        });
                    }
                    _ => {
                        return Err(syntax(
                            line,
                            "each selection alternative must be a single variable",
                        ));
                    }
                }
            }
            return Ok(Rule::selection(lhs, alternatives));
        }

        match items.as_slice() {
            [] | [Item::Epsilon] => return Ok(Rule::derivation(lhs, [])),
            _ if items.iter().any(|item| matches!(item, Item::Epsilon)) => {
                return Err(syntax(line, "`ε` must stand alone"));
            }
            _ => {}
        }

        let mut rhs = Vec::with_capacity(items.len());
        for item in items {
            let Item::Name { name, params } = item else {
                continue;
            };
            if is_variable_name(&name) {
                if params.is_some() {
                    return Err(syntax(line, format!("variable `{name}` cannot take parameters")));
                }
                rhs.push(Symbol::Variable(self.variable(&name, line)?));
            } else {
                let terminal = Terminal::with_params(name, params.unwrap_or_default());
                rhs.push(Symbol::Terminal(terminal));
            }
        }
        Ok(Rule::derivation(lhs, rhs))
    }
}

fn tokenize(body: &str, line: usize) -> Result<Vec<Item>, TextError> {
    let mut items = Vec::new();
    let mut chars = body.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '|' {
            chars.next();
            items.push(Item::Bar);
        } else if c == 'ε' {
            chars.next();
            items.push(Item::Epsilon);
        } else if body[start..].starts_with(Terminal::EMPTY) {
            for _ in 0..Terminal::EMPTY.len() {
                chars.next();
            }
            items.push(Item::Name {
                name: Terminal::EMPTY.to_owned(),
                params: None,
            });
        } else if is_ident_start(c) {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if !is_ident_continue(c) {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            let name = body[start..end].to_owned();
            skip_whitespace(&mut chars);
            let params = if chars.peek().is_some_and(|&(_, c)| c == '(') {
                chars.next();
                Some(parameters(body, &mut chars, line)?)
            } else {
                None
            };
            items.push(Item::Name { name, params });
        } else {
            return Err(syntax(line, format!("unexpected character `{c}`")));
        }
    }
    Ok(items)
}

fn skip_whitespace(chars: &mut Peekable<CharIndices<'_>>) {
    while chars.peek().is_some_and(|&(_, c)| c.is_whitespace()) {
        chars.next();
    }
}

/// Reads `Type name, ...)` after an opening parenthesis.
fn parameters(
    body: &str,
    chars: &mut Peekable<CharIndices<'_>>,
    line: usize,
) -> Result<Vec<Parameter>, TextError> {
    let start = chars.peek().map_or(body.len(), |&(i, _)| i);
    let close = loop {
        match chars.next() {
            Some((i, ')')) => break i,
            Some((_, '(')) => return Err(syntax(line, "nested parentheses in parameter list")),
            Some(_) => {}
            None => return Err(syntax(line, "unclosed parameter list")),
        }
    };

    let inner = body[start..close].trim();
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|param| {
            let parts: Vec<&str> = param.split_whitespace().collect();
            match parts.as_slice() {
                [ty, name] => Ok(Parameter::new(*ty, *name)),
                _ => Err(syntax(
                    line,
                    format!("parameter `{}` must be `Type name`", param.trim()),
                )),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection_and_derivations() {
        let grammar = parse_grammar(
            "start A\n\
             A ::= B | C\n\
             B ::= x Y\n\
             C ::= z\n\
             Y ::= y\n",
        )
        .unwrap();
        assert_eq!(grammar.start().name(), "A");
        assert_eq!(grammar.len(), 4);
        assert!(grammar.rule(grammar.start()).unwrap().is_selection());
    }

    #[test]
    fn test_same_name_same_variable() {
        let grammar = parse_grammar("A ::= x B\nB ::= y\n").unwrap();
        let Rule::Derivation { rhs, .. } = grammar.rule(grammar.start()).unwrap() else {
            panic!("expected derivation");
        };
        let b = rhs[1].as_variable().unwrap();
        assert!(grammar.contains(b));
    }

    #[test]
    fn test_parameters() {
        let grammar = parse_grammar("Lit ::= num(int value, String text)\n").unwrap();
        let rule = grammar.rule(grammar.start()).unwrap();
        let terminal = rule.leading_terminal().unwrap();
        assert_eq!(terminal.name(), "num");
        assert_eq!(
            terminal.params(),
            &[Parameter::new("int", "value"), Parameter::new("String", "text")]
        );
    }

    #[test]
    fn test_empty_bodies() {
        let grammar = parse_grammar("A ::= B | C\nB ::=\nC ::= ε # explicit\n").unwrap();
        let empties = grammar
            .rules()
            .filter(|r| r.is_empty_derivation())
            .count();
        assert_eq!(empties, 2);
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        assert_eq!(
            parse_grammar("A ::= B | x\nB ::= y\n"),
            Err(TextError::TerminalAlternative {
                line: 1,
                name: "x".into()
            })
        );
        assert!(matches!(
            parse_grammar("# header\nA ::= x(int)\n"),
            Err(TextError::Syntax { line: 2, .. })
        ));
        assert!(matches!(
            parse_grammar("A ::= x\nnot a rule\n"),
            Err(TextError::Syntax { line: 2, .. })
        ));
        assert_eq!(parse_grammar("# nothing\n"), Err(TextError::NoRules));
    }

    #[test]
    fn test_grammar_errors_pass_through() {
        assert!(matches!(
            parse_grammar("A ::= x\nA ::= y\n"),
            Err(TextError::Grammar(GrammarError::DuplicateRule(_)))
        ));
        assert!(matches!(
            parse_grammar("A ::= x B\n"),
            Err(TextError::Grammar(GrammarError::UndefinedRule(_)))
        ));
    }

    #[test]
    fn test_empty_sentinel() {
        let grammar = parse_grammar("A ::= x B\nB ::= <empty>\n").unwrap();
        let b = grammar.variables().find(|v| v.name() == "B").unwrap();
        let rule = grammar.rule(b).unwrap();
        assert!(rule.leading_terminal().unwrap().is_empty_sentinel());
        assert!(!rule.is_empty_derivation());
        assert_eq!(grammar.to_string(), "start A\nA ::= x B\nB ::= <empty>\n");
    }

    #[test]
    fn test_display_reparses() {
        let src = "start A\nA ::= B | C\nB ::= x(int n) Y\nC ::= ε\nY ::= y\n";
        let grammar = parse_grammar(src).unwrap();
        assert_eq!(grammar.to_string(), src);
        let again = parse_grammar(&grammar.to_string()).unwrap();
        assert_eq!(again.to_string(), src);
    }
}
