//! Grammar symbols.
//!
//! Terminals are plain values compared by name and parameter list. Variables
//! are identity handles: two variables are equal only when they were handed
//! out by the same [`VariableSource`] call, no matter what they are named.

use compact_str::CompactString;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// A typed parameter carried by a terminal, e.g. `int value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Parameter {
    pub ty: CompactString,
    pub name: CompactString,
}

impl Parameter {
    #[must_use]
    pub fn new(ty: impl Into<CompactString>, name: impl Into<CompactString>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

/// A leaf symbol. Becomes a builder method name downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Terminal {
    name: CompactString,
    params: Vec<Parameter>,
}

impl Terminal {
    /// Name of the sentinel that replaces an empty right-hand side.
    ///
    /// Not an identifier, so it never collides with a user terminal.
    pub const EMPTY: &'static str = "<empty>";

    #[must_use]
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_params(name: impl Into<CompactString>, params: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// The empty sentinel terminal
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Self::EMPTY)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    #[must_use]
    pub fn is_empty_sentinel(&self) -> bool {
        self.params.is_empty() && self.name == Self::EMPTY
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.params.is_empty() {
            f.write_str("(")?;
            for (i, param) in self.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{param}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// A non-terminal handle.
///
/// Equality and hashing use the numeric id only. Ordering is by `(name, id)`
/// so that sorting variables gives the same order on every run.
#[derive(Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Variable {
    id: u32,
    name: CompactString,
}

impl Variable {
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Hands out variables with fresh identities.
#[derive(Debug, Clone, Default)]
pub struct VariableSource {
    next: u32,
}

impl VariableSource {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// A source whose variables never collide with any of `existing`.
    #[must_use]
    pub fn after<'a>(existing: impl IntoIterator<Item = &'a Variable>) -> Self {
        let next = existing
            .into_iter()
            .map(|v| v.id + 1)
            .max()
            .unwrap_or(0);
        Self { next }
    }

    pub fn fresh(&mut self, name: impl Into<CompactString>) -> Variable {
        let id = self.next;
        self.next += 1;
        Variable {
            id,
            name: name.into(),
        }
    }

    /// Number of variables handed out so far, counting from the seed.
    #[must_use]
    pub const fn issued(&self) -> u32 {
        self.next
    }
}

/// Either kind of grammar symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Symbol {
    Terminal(Terminal),
    Variable(Variable),
}

impl Symbol {
    #[must_use]
    pub const fn as_terminal(&self) -> Option<&Terminal> {
        match self {
            Self::Terminal(t) => Some(t),
            Self::Variable(_) => None,
        }
    }

    #[must_use]
    pub const fn as_variable(&self) -> Option<&Variable> {
        match self {
            Self::Variable(v) => Some(v),
            Self::Terminal(_) => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }
}

impl From<Terminal> for Symbol {
    fn from(t: Terminal) -> Self {
        Self::Terminal(t)
    }
}

impl From<Variable> for Symbol {
    fn from(v: Variable) -> Self {
        Self::Variable(v)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal(t) => fmt::Display::fmt(t, f),
            Self::Variable(v) => fmt::Display::fmt(v, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_compare_by_identity() {
        let mut source = VariableSource::new();
        let a = source.fresh("A");
        let b = source.fresh("A");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a < b, "same name falls back to id order");
    }

    #[test]
    fn test_variables_sort_by_name_first() {
        let mut source = VariableSource::new();
        let z = source.fresh("Z");
        let a = source.fresh("A");
        let mut vars = vec![z.clone(), a.clone()];
        vars.sort();
        assert_eq!(vars, vec![a, z]);
    }

    #[test]
    fn test_source_after_existing() {
        let mut source = VariableSource::new();
        let vars: Vec<_> = (0..5).map(|i| source.fresh(format!("V{i}"))).collect();
        let mut next = VariableSource::after(&vars);
        let fresh = next.fresh("W");
        assert!(vars.iter().all(|v| v != &fresh));
        assert_eq!(fresh.id(), 5);
    }

    #[test]
    fn test_terminal_equality_includes_params() {
        let plain = Terminal::new("num");
        let typed = Terminal::with_params("num", vec![Parameter::new("int", "value")]);
        assert_ne!(plain, typed);
        assert_eq!(typed.to_string(), "num(int value)");
    }

    #[test]
    fn test_empty_sentinel() {
        assert!(Terminal::empty().is_empty_sentinel());
        assert!(!Terminal::new("empty").is_empty_sentinel());
    }
}
