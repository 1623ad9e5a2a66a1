use crate::grammar::rule::Rule;
use crate::grammar::symbol::{Symbol, Terminal, Variable};
use crate::grammar::validate::validate_grammar;
use hashbrown::{HashMap, HashSet};
use std::fmt;

/// A restricted context-free grammar.
///
/// A `Grammar` is a start variable plus exactly one rule per variable. It is
/// validated on construction and never changes afterwards: every
/// transformation builds a new grammar.
///
/// # Example
///
/// ```rust
/// use stepwise::grammar::{GrammarBuilder, Rule, Terminal, VariableSource};
///
/// let mut vars = VariableSource::new();
/// let expr = vars.fresh("Expr");
/// let grammar = GrammarBuilder::new()
///     .start(expr.clone())
///     .rule(Rule::derivation(expr, [Terminal::new("num").into()]))
///     .build()
///     .expect("valid grammar");
/// assert_eq!(grammar.len(), 1);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Grammar {
    rules: HashMap<Variable, Rule, ahash::RandomState>,
    start: Variable,
}

impl Grammar {
    /// Build and validate a grammar.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] if a variable has several rules, the start
    /// variable has none, a referenced variable is undefined, a selection is
    /// malformed, or the grammar is recursive.
    pub fn new(start: Variable, rules: impl IntoIterator<Item = Rule>) -> Result<Self, GrammarError> {
        let rules: Vec<Rule> = rules.into_iter().collect();
        validate_grammar(&start, &rules)?;
        Ok(Self {
            rules: rules.into_iter().map(|r| (r.lhs().clone(), r)).collect(),
            start,
        })
    }

    #[must_use]
    pub const fn start(&self) -> &Variable {
        &self.start
    }

    #[must_use]
    pub fn get_rule(&self, lhs: &Variable) -> Option<&Rule> {
        self.rules.get(lhs)
    }

    /// Look up the rule of `lhs`.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UndefinedRule`] when `lhs` has no rule.
    pub fn rule(&self, lhs: &Variable) -> Result<&Rule, GrammarError> {
        self.rules
            .get(lhs)
            .ok_or_else(|| GrammarError::UndefinedRule(lhs.clone()))
    }

    #[must_use]
    pub fn contains(&self, var: &Variable) -> bool {
        self.rules.contains_key(var)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in no particular order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.rules.keys()
    }

    /// Rules ordered by left-hand side. Every pass that needs a stable
    /// order goes through this.
    #[must_use]
    pub fn rules_sorted(&self) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self.rules.values().collect();
        rules.sort_by(|a, b| a.lhs().cmp(b.lhs()));
        rules
    }

    /// Distinct terminals used anywhere in the grammar.
    #[must_use]
    pub fn terminals(&self) -> HashSet<&Terminal, ahash::RandomState> {
        self.rules
            .values()
            .filter_map(|rule| match rule {
                Rule::Derivation { rhs, .. } => Some(rhs),
                Rule::Selection { .. } => None,
            })
            .flatten()
            .filter_map(Symbol::as_terminal)
            .collect()
    }

    /// A copy of this grammar with the rule of `rule.lhs()` replaced.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UndefinedRule`] if the variable has no rule
    /// yet, or any validation error the replacement introduces.
    pub fn with_rule(&self, rule: Rule) -> Result<Self, GrammarError> {
        if !self.contains(rule.lhs()) {
            return Err(GrammarError::UndefinedRule(rule.lhs().clone()));
        }
        let lhs = rule.lhs().clone();
        let rules = self
            .rules
            .values()
            .filter(|r| r.lhs() != &lhs)
            .cloned()
            .chain(std::iter::once(rule))
            .collect::<Vec<_>>();
        Self::new(self.start.clone(), rules)
    }

    /// Variables reachable from the start variable.
    ///
    /// `extra` supplies edges that are not visible in the rules themselves.
    pub fn reachable_with<F>(&self, extra: F) -> HashSet<Variable, ahash::RandomState>
    where
        F: Fn(&Variable) -> Vec<Variable>,
    {
        let mut seen: HashSet<Variable, ahash::RandomState> = HashSet::default();
        let mut stack = vec![self.start.clone()];
        while let Some(var) = stack.pop() {
            if !seen.insert(var.clone()) {
                continue;
            }
            if let Some(rule) = self.rules.get(&var) {
                stack.extend(rule.references().into_iter().cloned());
            }
            stack.extend(extra(&var));
        }
        seen
    }

    #[must_use]
    pub fn reachable(&self) -> HashSet<Variable, ahash::RandomState> {
        self.reachable_with(|_| Vec::new())
    }

    /// Drop the rules of every unreachable variable.
    ///
    /// Returns the pruned grammar and the removed variables in sorted order.
    #[must_use]
    pub fn prune_unreachable<F>(&self, extra: F) -> (Self, Vec<Variable>)
    where
        F: Fn(&Variable) -> Vec<Variable>,
    {
        let reachable = self.reachable_with(extra);
        let mut removed: Vec<Variable> = self
            .rules
            .keys()
            .filter(|v| !reachable.contains(*v))
            .cloned()
            .collect();
        removed.sort();

        // Removing unreachable rules cannot break any grammar invariant.
        let rules = self
            .rules
            .iter()
            .filter(|(v, _)| reachable.contains(*v))
            .map(|(v, r)| (v.clone(), r.clone()))
            .collect();
        (
            Self {
                rules,
                start: self.start.clone(),
            },
            removed,
        )
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("start", &self.start)
            .field("rules", &self.rules_sorted())
            .finish()
    }
}

/// Prints the text format: `start`, the start rule, then the others sorted.
impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start {}", self.start)?;
        if let Some(rule) = self.rules.get(&self.start) {
            writeln!(f, "{rule}")?;
        }
        for rule in self.rules_sorted() {
            if rule.lhs() != &self.start {
                writeln!(f, "{rule}")?;
            }
        }
        Ok(())
    }
}

/// Fluent construction of a [`Grammar`].
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    rules: Vec<Rule>,
    start: Option<Variable>,
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn start(mut self, start: Variable) -> Self {
        self.start = Some(start);
        self
    }

    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn derivation(self, lhs: Variable, rhs: impl IntoIterator<Item = Symbol>) -> Self {
        self.rule(Rule::derivation(lhs, rhs))
    }

    #[must_use]
    pub fn selection(self, lhs: Variable, alternatives: impl IntoIterator<Item = Variable>) -> Self {
        self.rule(Rule::selection(lhs, alternatives))
    }

    /// Build the grammar from the configured rules.
    ///
    /// # Errors
    ///
    /// Returns an error if no start variable was set, or if grammar validation fails.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        let start = self.start.ok_or(GrammarError::MissingStart)?;
        Grammar::new(start, self.rules)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "diagnostics", derive(miette::Diagnostic))]
pub enum GrammarError {
    #[error("Missing start variable")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(stepwise::grammar::missing_start)))]
    MissingStart,

    #[error("Duplicate rules for variable {0}")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(stepwise::grammar::duplicate_rule),
            help("every variable must have exactly one rule")
        )
    )]
    DuplicateRule(Variable),

    #[error("Start variable {0} has no rule")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(stepwise::grammar::missing_start_rule)))]
    MissingStartRule(Variable),

    #[error("Undefined rule: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(stepwise::grammar::undefined_rule)))]
    UndefinedRule(Variable),

    #[error("Selection {lhs} needs at least two distinct alternatives")]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(stepwise::grammar::malformed_selection),
            help("write a single alternative as a derivation instead")
        )
    )]
    MalformedSelection { lhs: Variable },

    #[error("Recursion detected: {}", format_cycle(.0))]
    #[cfg_attr(
        feature = "diagnostics",
        diagnostic(
            code(stepwise::grammar::recursive),
            help("only recursion-free grammars can be canonicalized")
        )
    )]
    Recursive(Vec<Variable>),
}

fn format_cycle(cycle: &[Variable]) -> String {
    cycle
        .iter()
        .map(Variable::name)
        .collect::<Vec<_>>()
        .join(" -> ")
}
