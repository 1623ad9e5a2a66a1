//! # Parser Info
//!
//! Per-variable metadata describing what each rule's builder method does.
//!
//! ## Overview
//!
//! A variable is tagged with one [`ParserInfo`]:
//!
//! - **Full**: the method builds a complete AST node.
//! - **PartialSelection**: the method selects among partial nodes; some
//!   component types are already known to the caller.
//! - **PartialDerivation**: the method finishes a node whose leading
//!   components were parsed earlier. It may also build the nodes of
//!   empty rules that were folded into it.
//! - **Bridge**: the method only forwards a single terminal.
//!
//! Canonicalization splits and re-tags these entries as it rewrites rules,
//! always producing new values.

use crate::error::{CanonError, CanonResult};
use crate::grammar::{Grammar, Parameter, RuleShape, Variable};
use compact_str::CompactString;
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::fmt;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Name of the AST type a builder method produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct AstNode(CompactString);

impl AstNode {
    #[must_use]
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ParserInfo {
    Full {
        node: AstNode,
    },
    /// `required` holds the components already parsed; their types matter.
    PartialSelection {
        node: AstNode,
        required: Vec<Parameter>,
    },
    /// `required` holds the components already parsed; their names matter.
    /// `implicit` lists folded empty rules in folding order.
    PartialDerivation {
        node: AstNode,
        required: Vec<Parameter>,
        implicit: SmallVec<[Variable; 1]>,
    },
    Bridge,
}

impl ParserInfo {
    #[must_use]
    pub fn full(node: impl Into<CompactString>) -> Self {
        Self::Full {
            node: AstNode::new(node),
        }
    }

    #[must_use]
    pub const fn node(&self) -> Option<&AstNode> {
        match self {
            Self::Full { node }
            | Self::PartialSelection { node, .. }
            | Self::PartialDerivation { node, .. } => Some(node),
            Self::Bridge => None,
        }
    }

    #[must_use]
    pub fn required(&self) -> &[Parameter] {
        match self {
            Self::PartialSelection { required, .. } | Self::PartialDerivation { required, .. } => {
                required.as_slice()
            }
            Self::Full { .. } | Self::Bridge => &[],
        }
    }

    /// Variables whose empty rules were folded into this one.
    #[must_use]
    pub fn implicit(&self) -> &[Variable] {
        match self {
            Self::PartialDerivation { implicit, .. } => implicit.as_slice(),
            _ => &[],
        }
    }

    #[must_use]
    pub const fn is_partial(&self) -> bool {
        matches!(
            self,
            Self::PartialSelection { .. } | Self::PartialDerivation { .. }
        )
    }

    /// Kind name used in logs and tool output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Full { .. } => "full",
            Self::PartialSelection { .. } => "partial-selection",
            Self::PartialDerivation { .. } => "partial-derivation",
            Self::Bridge => "bridge",
        }
    }

    /// Record that `params` were consumed before a rule of `shape` runs.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError::UnexpectedState`] when the tag cannot describe a
    /// rule of that shape.
    pub fn with_components(&self, params: &[Parameter], shape: RuleShape) -> CanonResult<Self> {
        match (self, shape) {
            (Self::Full { node }, RuleShape::Derivation) => Ok(Self::PartialDerivation {
                node: node.clone(),
                required: params.to_vec(),
                implicit: SmallVec::new(),
            }),
            (Self::Full { node }, RuleShape::Selection) => Ok(Self::PartialSelection {
                node: node.clone(),
                required: params.to_vec(),
            }),
            (Self::PartialSelection { node, required }, RuleShape::Selection) => {
                Ok(Self::PartialSelection {
                    node: node.clone(),
                    required: concat(required, params),
                })
            }
            (
                Self::PartialDerivation {
                    node,
                    required,
                    implicit,
                },
                RuleShape::Derivation,
            ) => Ok(Self::PartialDerivation {
                node: node.clone(),
                required: concat(required, params),
                implicit: implicit.clone(),
            }),
            (Self::Bridge, RuleShape::Derivation) => Ok(Self::Bridge),
            (info, shape) => Err(CanonError::unexpected(format!(
                "cannot add components to {} info of a {shape}",
                info.kind()
            ))),
        }
    }

    /// Record that the empty rule `var` is now built implicitly by this one.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError::UnexpectedState`] for selection and bridge tags.
    pub fn with_implicit(&self, var: Variable) -> CanonResult<Self> {
        match self {
            Self::Full { node } => Ok(Self::PartialDerivation {
                node: node.clone(),
                required: Vec::new(),
                implicit: smallvec::smallvec![var],
            }),
            Self::PartialDerivation {
                node,
                required,
                implicit,
            } => {
                let mut implicit = implicit.clone();
                implicit.push(var);
                Ok(Self::PartialDerivation {
                    node: node.clone(),
                    required: required.clone(),
                    implicit,
                })
            }
            other => Err(CanonError::unexpected(format!(
                "cannot fold empty rule {var} into {} info",
                other.kind()
            ))),
        }
    }

    /// Re-tag for a rule whose shape changed from selection to derivation
    /// or back, keeping node and components.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError::UnexpectedState`] when the tag has no
    /// counterpart of the requested shape.
    pub fn reshaped(&self, shape: RuleShape) -> CanonResult<Self> {
        match (self, shape) {
            (Self::Full { .. }, _)
            | (Self::PartialSelection { .. }, RuleShape::Selection)
            | (Self::PartialDerivation { .. }, RuleShape::Derivation)
            | (Self::Bridge, RuleShape::Derivation) => Ok(self.clone()),
            (Self::PartialSelection { node, required }, RuleShape::Derivation) => {
                Ok(Self::PartialDerivation {
                    node: node.clone(),
                    required: required.clone(),
                    implicit: SmallVec::new(),
                })
            }
            (info, shape) => Err(CanonError::unexpected(format!(
                "cannot re-tag {} info as a {shape}",
                info.kind()
            ))),
        }
    }
}

fn concat(head: &[Parameter], tail: &[Parameter]) -> Vec<Parameter> {
    head.iter().chain(tail).cloned().collect()
}

impl fmt::Display for ParserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full { node } => write!(f, "full {node}"),
            Self::PartialSelection { node, required } => {
                write!(f, "partial selection {node} [")?;
                write_list(f, required.iter().map(|p| p.ty.as_str()))?;
                f.write_str("]")
            }
            Self::PartialDerivation {
                node,
                required,
                implicit,
            } => {
                write!(f, "partial derivation {node} [")?;
                write_list(f, required.iter().map(|p| p.name.as_str()))?;
                f.write_str("]")?;
                if !implicit.is_empty() {
                    f.write_str(" implicit [")?;
                    write_list(f, implicit.iter().map(Variable::name))?;
                    f.write_str("]")?;
                }
                Ok(())
            }
            Self::Bridge => f.write_str("bridge"),
        }
    }
}

fn write_list<'a>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = &'a str>) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(item)?;
    }
    Ok(())
}

/// Side map from variable to [`ParserInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserInfos {
    map: HashMap<Variable, ParserInfo, ahash::RandomState>,
}

impl ParserInfos {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every variable of `grammar` as a full builder of an AST node
    /// named after the variable.
    #[must_use]
    pub fn full_for(grammar: &Grammar) -> Self {
        grammar
            .variables()
            .map(|v| (v.clone(), ParserInfo::full(v.name())))
            .collect()
    }

    #[must_use]
    pub fn get(&self, var: &Variable) -> Option<&ParserInfo> {
        self.map.get(var)
    }

    /// Look up the info of `var`.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError::MissingParserInfo`] if there is none.
    pub fn require(&self, var: &Variable) -> CanonResult<&ParserInfo> {
        self.map
            .get(var)
            .ok_or_else(|| CanonError::MissingParserInfo(var.clone()))
    }

    pub fn insert(&mut self, var: Variable, info: ParserInfo) -> Option<ParserInfo> {
        self.map.insert(var, info)
    }

    #[must_use]
    pub fn with(mut self, var: Variable, info: ParserInfo) -> Self {
        self.map.insert(var, info);
        self
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Variable) -> bool) {
        self.map.retain(|var, _| keep(var));
    }

    /// Implicit-folding edges leaving `var`.
    #[must_use]
    pub fn implicit_of(&self, var: &Variable) -> Vec<Variable> {
        self.map
            .get(var)
            .map(|info| info.implicit().to_vec())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &ParserInfo)> {
        self.map.iter()
    }

    /// Entries ordered by variable.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&Variable, &ParserInfo)> {
        let mut entries: Vec<_> = self.map.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FromIterator<(Variable, ParserInfo)> for ParserInfos {
    fn from_iter<I: IntoIterator<Item = (Variable, ParserInfo)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

impl Extend<(Variable, ParserInfo)> for ParserInfos {
    fn extend<I: IntoIterator<Item = (Variable, ParserInfo)>>(&mut self, iter: I) {
        self.map.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::VariableSource;

    fn params(names: &[&str]) -> Vec<Parameter> {
        names.iter().map(|n| Parameter::new("int", *n)).collect()
    }

    #[test]
    fn test_with_components_from_full() {
        let full = ParserInfo::full("Expr");
        assert_eq!(
            full.with_components(&params(&["a"]), RuleShape::Derivation).unwrap(),
            ParserInfo::PartialDerivation {
                node: AstNode::new("Expr"),
                required: params(&["a"]),
                implicit: SmallVec::new(),
            }
        );
        assert_eq!(
            full.with_components(&params(&["a"]), RuleShape::Selection).unwrap(),
            ParserInfo::PartialSelection {
                node: AstNode::new("Expr"),
                required: params(&["a"]),
            }
        );
    }

    #[test]
    fn test_with_components_appends() {
        let partial = ParserInfo::full("Expr")
            .with_components(&params(&["a"]), RuleShape::Selection)
            .unwrap()
            .with_components(&params(&["b"]), RuleShape::Selection)
            .unwrap();
        assert_eq!(partial.required(), params(&["a", "b"]).as_slice());
    }

    #[test]
    fn test_with_components_bridge_and_mismatch() {
        assert_eq!(
            ParserInfo::Bridge
                .with_components(&params(&["a"]), RuleShape::Derivation)
                .unwrap(),
            ParserInfo::Bridge
        );
        assert!(matches!(
            ParserInfo::Bridge.with_components(&[], RuleShape::Selection),
            Err(CanonError::UnexpectedState { .. })
        ));
        let sel = ParserInfo::full("X")
            .with_components(&[], RuleShape::Selection)
            .unwrap();
        assert!(matches!(
            sel.with_components(&[], RuleShape::Derivation),
            Err(CanonError::UnexpectedState { .. })
        ));
    }

    #[test]
    fn test_with_implicit() {
        let mut vars = VariableSource::new();
        let d = vars.fresh("D");
        let e = vars.fresh("E");
        let info = ParserInfo::full("U")
            .with_implicit(d.clone())
            .unwrap()
            .with_implicit(e.clone())
            .unwrap();
        assert_eq!(info.implicit(), &[d.clone(), e]);
        assert!(info.required().is_empty());

        assert!(ParserInfo::Bridge.with_implicit(d.clone()).is_err());
        let sel = ParserInfo::full("S")
            .with_components(&[], RuleShape::Selection)
            .unwrap();
        assert!(sel.with_implicit(d).is_err());
    }

    #[test]
    fn test_reshaped_selection_to_derivation() {
        let sel = ParserInfo::full("S")
            .with_components(&params(&["a"]), RuleShape::Selection)
            .unwrap();
        let der = sel.reshaped(RuleShape::Derivation).unwrap();
        assert_eq!(der.kind(), "partial-derivation");
        assert_eq!(der.required(), params(&["a"]).as_slice());
    }

    #[test]
    fn test_display() {
        let info = ParserInfo::full("Expr")
            .with_components(&[Parameter::new("int", "value")], RuleShape::Derivation)
            .unwrap();
        assert_eq!(info.to_string(), "partial derivation Expr [value]");
    }

    #[test]
    fn test_require_missing() {
        let mut vars = VariableSource::new();
        let a = vars.fresh("A");
        let infos = ParserInfos::new();
        assert_eq!(infos.require(&a), Err(CanonError::MissingParserInfo(a.clone())));
    }
}
