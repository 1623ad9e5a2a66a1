//! # Random Grammar Generators
//!
//! Seeded generation of random recursion-free grammars for property tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stepwise::testing::{GeneratorConfig, random_grammar};
//! use proptest::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn canonicalize_random(seed in any::<u64>()) {
//!         let grammar = random_grammar(&GeneratorConfig::default().with_seed(seed)).unwrap();
//!         // ...
//!     }
//! }
//! ```

use crate::grammar::{Grammar, GrammarError, Parameter, Rule, Symbol, Terminal, Variable, VariableSource};

/// Configuration for random grammar generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of variables, `V0` (the start) through `Vn-1`
    pub variables: usize,
    /// Number of distinct terminal names (`a`, `b`, ...)
    pub terminals: usize,
    /// Maximum right-hand-side length of a derivation
    pub max_rhs: usize,
    /// Maximum number of alternatives of a selection
    pub max_alternatives: usize,
    /// Probability of a variable getting a selection rule (0.0 to 1.0)
    pub selection_probability: f64,
    /// Probability of a derivation being empty
    pub empty_probability: f64,
    /// Probability of a terminal carrying a parameter
    pub param_probability: f64,
    /// Seed for reproducible generation
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            variables: 7,
            terminals: 3,
            max_rhs: 3,
            max_alternatives: 3,
            selection_probability: 0.4,
            empty_probability: 0.1,
            param_probability: 0.1,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn with_variables(mut self, variables: usize) -> Self {
        self.variables = variables;
        self
    }
}

/// Build a random grammar.
///
/// Variable `Vi` only refers to `Vj` with `j > i`, so the result is always
/// recursion-free. Some variables may be unreachable.
///
/// # Errors
///
/// Only fails if the generated rule set breaks a grammar invariant, which
/// the construction rules out.
pub fn random_grammar(config: &GeneratorConfig) -> Result<Grammar, GrammarError> {
    let mut rng = config.seed.map_or_else(SimpleRng::new, SimpleRng::with_seed);
    let mut source = VariableSource::new();
    let count = config.variables.max(1);
    let vars: Vec<Variable> = (0..count).map(|i| source.fresh(format!("V{i}"))).collect();

    let rules: Vec<Rule> = vars
        .iter()
        .enumerate()
        .map(|(i, lhs)| {
            let higher = &vars[i + 1..];
            if higher.len() >= 2 && rng.next_f64() < config.selection_probability {
                let wanted = 2 + rng.below(config.max_alternatives.max(2) - 1);
                let mut pool: Vec<&Variable> = higher.iter().collect();
                let mut alternatives = Vec::new();
                while alternatives.len() < wanted && !pool.is_empty() {
                    alternatives.push(pool.swap_remove(rng.below(pool.len())).clone());
                }
                Rule::selection(lhs.clone(), alternatives)
            } else if rng.next_f64() < config.empty_probability {
                Rule::derivation(lhs.clone(), [])
            } else {
                let len = 1 + rng.below(config.max_rhs.max(1));
                let rhs = (0..len).map(|_| {
                    if !higher.is_empty() && rng.next_f64() < 0.5 {
                        Symbol::Variable(higher[rng.below(higher.len())].clone())
                    } else {
                        Symbol::Terminal(random_terminal(&mut rng, config))
                    }
                });
                Rule::derivation(lhs.clone(), rhs.collect::<Vec<_>>())
            }
        })
        .collect();

    Grammar::new(vars[0].clone(), rules)
}

fn random_terminal(rng: &mut SimpleRng, config: &GeneratorConfig) -> Terminal {
    let index = rng.below(config.terminals.clamp(1, 26));
    let name = char::from(b'a' + u8::try_from(index).unwrap_or(0)).to_string();
    if rng.next_f64() < config.param_probability {
        Terminal::with_params(name, vec![Parameter::new("int", "v")])
    } else {
        Terminal::new(name)
    }
}

/// Simple xorshift generator for reproducible tests
#[derive(Debug, Clone)]
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    const DEFAULT_STATE: u64 = 0x853c_49e6_748f_ea9b;

    const fn new() -> Self {
        Self {
            state: Self::DEFAULT_STATE,
        }
    }

    const fn with_seed(seed: u64) -> Self {
        // Zero is a fixed point of xorshift.
        Self {
            state: if seed == 0 { Self::DEFAULT_STATE } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    #[allow(clippy::cast_precision_loss)]
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() as f64) / (u64::MAX as f64)
    }

    /// Uniform-ish value in `0..bound`; `bound` must be positive.
    #[allow(clippy::cast_possible_truncation)]
    fn below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound.max(1) as u64) as usize
    }
}
