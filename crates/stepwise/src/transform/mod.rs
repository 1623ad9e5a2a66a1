//! # Canonicalization
//!
//! Rewrites a grammar and its parser infos into canonical, left-factored form.
//!
//! ## Overview
//!
//! The pipeline runs in this order:
//!
//! 1. [`normalize`]: move every non-leading terminal into its own bridge rule.
//! 2. [`empty`]: fold empty productions already present in the input.
//! 3. Drop rules unreachable from the start variable.
//! 4. Repeat until [`chain::discover`] finds nothing:
//!    [`chain::discover`] picks a shared leading terminal,
//!    [`factor::left_factor`] pulls it out, and [`empty`] folds the empty
//!    rules the rewrite produced.
//!
//! In the result every derivation has at most one terminal, in leading
//! position, no rule has an empty right-hand side, and no selection offers
//! two alternatives that start with the same terminal.
//!
//! ## Usage
//!
//! ```rust
//! use stepwise::grammar::parse_grammar;
//! use stepwise::info::ParserInfos;
//! use stepwise::transform::{Canonicalizer, CanonicalizeConfig};
//!
//! let grammar = parse_grammar(
//!     "A ::= B | C
//!      B ::= x y
//!      C ::= x z",
//! )
//! .unwrap();
//! let infos = ParserInfos::full_for(&grammar);
//! let canonical = Canonicalizer::new(CanonicalizeConfig::default())
//!     .canonicalize(&grammar, &infos)
//!     .unwrap();
//! assert!(stepwise::grammar::canonical_violations(&canonical.grammar).is_empty());
//! ```

pub mod chain;
pub mod empty;
pub mod factor;
pub mod normalize;

use crate::error::CanonResult;
use crate::grammar::{Grammar, Variable, VariableSource};
use crate::info::ParserInfos;
use crate::intern::NameSource;
use compact_str::CompactString;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

pub use chain::{Chain, CommonPrefix, chains, discover};
pub use empty::eliminate_empty;
pub use factor::left_factor;
pub use normalize::normalize_terminals;

/// Configuration for canonicalization
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct CanonicalizeConfig {
    /// Reject ambiguous shapes that have no canonical form
    pub detect_unsupported: bool,
    /// Give up after this many factoring rounds
    pub max_iterations: Option<usize>,
    /// Fold empty productions present in the input before factoring
    pub fold_input_empties: bool,
}

impl Default for CanonicalizeConfig {
    fn default() -> Self {
        Self {
            detect_unsupported: true,
            max_iterations: None,
            fold_input_empties: true,
        }
    }
}

impl CanonicalizeConfig {
    #[must_use]
    pub const fn with_detect_unsupported(mut self, detect: bool) -> Self {
        self.detect_unsupported = detect;
        self
    }

    #[must_use]
    pub const fn with_max_iterations(mut self, max: Option<usize>) -> Self {
        self.max_iterations = max;
        self
    }

    #[must_use]
    pub const fn with_fold_input_empties(mut self, fold: bool) -> Self {
        self.fold_input_empties = fold;
        self
    }
}

/// Counters collected during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct CanonicalStats {
    /// Factoring rounds performed
    pub iterations: usize,
    /// Bridge rules added by terminal normalization
    pub bridges: usize,
    /// Variables synthesized by factoring
    pub synthesized: usize,
    /// Empty rules folded into a referencing derivation
    pub folded: usize,
    /// Variables removed as unreachable
    pub pruned: usize,
}

/// Canonical grammar plus the metadata describing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    pub grammar: Grammar,
    pub infos: ParserInfos,
    pub stats: CanonicalStats,
}

/// State owned by a single canonicalization run: variable ids, names, and
/// counters. Never shared between runs.
#[derive(Debug)]
pub struct Session {
    vars: VariableSource,
    names: NameSource,
    stats: CanonicalStats,
}

impl Session {
    /// A session whose fresh variables and names cannot clash with `grammar`.
    #[must_use]
    pub fn for_grammar(grammar: &Grammar) -> Self {
        Self {
            vars: VariableSource::after(grammar.variables()),
            names: NameSource::reserving(grammar.variables().map(Variable::name)),
            stats: CanonicalStats::default(),
        }
    }

    /// A new variable named after `seed`, or `seed` plus a counter if taken.
    pub fn fresh_variable(&mut self, seed: &str) -> Variable {
        let name: CompactString = self.names.fresh(seed);
        self.vars.fresh(name)
    }

    #[must_use]
    pub const fn stats(&self) -> &CanonicalStats {
        &self.stats
    }
}

/// Remove unreachable variables from both the grammar and the infos.
///
/// Implicit-folding markers count as edges, so a folded empty rule stays
/// alive as long as the rule that folded it does.
pub fn collect_garbage(
    grammar: &Grammar,
    infos: &ParserInfos,
    session: &mut Session,
) -> (Grammar, ParserInfos) {
    let (grammar, removed) = grammar.prune_unreachable(|v| infos.implicit_of(v));
    if !removed.is_empty() {
        tracing::trace!(count = removed.len(), ?removed, "pruned unreachable variables");
    }
    session.stats.pruned += removed.len();

    let mut infos = infos.clone();
    infos.retain(|v| grammar.contains(v));
    (grammar, infos)
}

/// Drives the passes to a fixpoint.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    config: CanonicalizeConfig,
}

impl Canonicalizer {
    #[must_use]
    pub const fn new(config: CanonicalizeConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &CanonicalizeConfig {
        &self.config
    }

    /// Canonicalize `grammar`, rewriting `infos` alongside it.
    ///
    /// # Errors
    ///
    /// - [`CanonError::MissingParserInfo`](crate::error::CanonError::MissingParserInfo)
    ///   if a variable has no info.
    /// - [`CanonError::Unsupported`](crate::error::CanonError::Unsupported)
    ///   for ambiguous shapes, when detection is enabled.
    /// - [`CanonError::IterationLimit`](crate::error::CanonError::IterationLimit)
    ///   when a configured bound is hit.
    /// - Any grammar or state error raised by a pass.
    pub fn canonicalize(&self, grammar: &Grammar, infos: &ParserInfos) -> CanonResult<Canonical> {
        let span = tracing::info_span!("canonicalize", start = %grammar.start(), rules = grammar.len());
        let _guard = span.enter();

        let mut vars: Vec<&Variable> = grammar.variables().collect();
        vars.sort();
        for var in vars {
            infos.require(var)?;
        }

        let mut session = Session::for_grammar(grammar);
        let mut infos = infos.clone();
        infos.retain(|v| grammar.contains(v));

        let (mut grammar, mut infos) = normalize_terminals(grammar, &infos, &mut session)?;
        if self.config.fold_input_empties {
            (grammar, infos) = eliminate_empty(&grammar, &infos, &mut session)?;
        }
        // Unreachable selections must not reach discovery.
        (grammar, infos) = collect_garbage(&grammar, &infos, &mut session);

        while let Some(prefix) = discover(&grammar, self.config.detect_unsupported)? {
            session.stats.iterations += 1;
            if let Some(max) = self.config.max_iterations {
                if session.stats.iterations > max {
                    return Err(crate::error::CanonError::IterationLimit(max));
                }
            }
            tracing::debug!(
                iteration = session.stats.iterations,
                selection = %prefix.root,
                symbol = %prefix.symbol,
                chains = prefix.chains.len(),
                "factoring shared prefix"
            );

            (grammar, infos) = left_factor(&grammar, &infos, &prefix, &mut session)?;
            (grammar, infos) = collect_garbage(&grammar, &infos, &mut session);
            (grammar, infos) = eliminate_empty(&grammar, &infos, &mut session)?;
        }
        (grammar, infos) = collect_garbage(&grammar, &infos, &mut session);

        tracing::debug!(
            iterations = session.stats.iterations,
            rules = grammar.len(),
            "canonical form reached"
        );
        Ok(Canonical {
            grammar,
            infos,
            stats: session.stats,
        })
    }
}
