use crate::grammar::symbol::{Symbol, Terminal, Variable};
use smallvec::SmallVec;
use std::fmt;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// The two rule kinds of a restricted grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Rule {
    /// `lhs` derives exactly the concatenation of `rhs`. `rhs` may be empty.
    Derivation { lhs: Variable, rhs: Vec<Symbol> },
    /// `lhs` derives exactly one of `alternatives`.
    Selection {
        lhs: Variable,
        alternatives: Vec<Variable>,
    },
}

/// Shape of a rule without its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum RuleShape {
    Derivation,
    Selection,
}

impl fmt::Display for RuleShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Derivation => f.write_str("derivation"),
            Self::Selection => f.write_str("selection"),
        }
    }
}

impl Rule {
    pub fn derivation(lhs: Variable, rhs: impl IntoIterator<Item = Symbol>) -> Self {
        Self::Derivation {
            lhs,
            rhs: rhs.into_iter().collect(),
        }
    }

    pub fn selection(lhs: Variable, alternatives: impl IntoIterator<Item = Variable>) -> Self {
        Self::Selection {
            lhs,
            alternatives: alternatives.into_iter().collect(),
        }
    }

    #[must_use]
    pub const fn lhs(&self) -> &Variable {
        match self {
            Self::Derivation { lhs, .. } | Self::Selection { lhs, .. } => lhs,
        }
    }

    #[must_use]
    pub const fn shape(&self) -> RuleShape {
        match self {
            Self::Derivation { .. } => RuleShape::Derivation,
            Self::Selection { .. } => RuleShape::Selection,
        }
    }

    #[must_use]
    pub const fn is_selection(&self) -> bool {
        matches!(self, Self::Selection { .. })
    }

    /// True for a derivation with nothing on its right-hand side.
    #[must_use]
    pub fn is_empty_derivation(&self) -> bool {
        matches!(self, Self::Derivation { rhs, .. } if rhs.is_empty())
    }

    /// First right-hand-side symbol of a derivation.
    #[must_use]
    pub fn leading(&self) -> Option<&Symbol> {
        match self {
            Self::Derivation { rhs, .. } => rhs.first(),
            Self::Selection { .. } => None,
        }
    }

    /// Terminal that starts this derivation, if any.
    #[must_use]
    pub fn leading_terminal(&self) -> Option<&Terminal> {
        self.leading().and_then(Symbol::as_terminal)
    }

    /// Every variable mentioned on the right-hand side, in order.
    #[must_use]
    pub fn references(&self) -> SmallVec<[&Variable; 4]> {
        match self {
            Self::Derivation { rhs, .. } => rhs.iter().filter_map(Symbol::as_variable).collect(),
            Self::Selection { alternatives, .. } => alternatives.iter().collect(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Derivation { lhs, rhs } => {
                write!(f, "{lhs} ::=")?;
                if rhs.is_empty() {
                    return f.write_str(" ε");
                }
                for symbol in rhs {
                    write!(f, " {symbol}")?;
                }
                Ok(())
            }
            Self::Selection { lhs, alternatives } => {
                write!(f, "{lhs} ::=")?;
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" |")?;
                    }
                    write!(f, " {alt}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::symbol::VariableSource;

    #[test]
    fn test_display() {
        let mut vars = VariableSource::new();
        let a = vars.fresh("A");
        let b = vars.fresh("B");
        let c = vars.fresh("C");

        let sel = Rule::selection(a.clone(), [b.clone(), c]);
        assert_eq!(sel.to_string(), "A ::= B | C");

        let der = Rule::derivation(a.clone(), [Terminal::new("x").into(), b.into()]);
        assert_eq!(der.to_string(), "A ::= x B");

        let empty = Rule::derivation(a, []);
        assert_eq!(empty.to_string(), "A ::= ε");
        assert!(empty.is_empty_derivation());
    }

    #[test]
    fn test_references_skip_terminals() {
        let mut vars = VariableSource::new();
        let a = vars.fresh("A");
        let b = vars.fresh("B");
        let rule = Rule::derivation(
            a,
            [Terminal::new("x").into(), b.clone().into(), Terminal::new("y").into()],
        );
        assert_eq!(rule.references().as_slice(), &[&b]);
        assert_eq!(rule.leading_terminal(), Some(&Terminal::new("x")));
    }
}
