//! # Name Interning
//!
//! The fresh-name service used when canonicalization synthesizes variables.
//!
//! ## Overview
//!
//! [`NameSource`] remembers every name it has seen in a [`lasso::Rodeo`] and
//! hands out names that are guaranteed not to clash with any of them. A
//! requested seed is returned unchanged the first time; later requests get
//! a numeric suffix from one counter shared by all seeds.
//!
//! ```rust
//! use stepwise::intern::NameSource;
//!
//! let mut names = NameSource::reserving(["G"]);
//! assert_eq!(names.fresh("G"), "G0");
//! assert_eq!(names.fresh("PLUS"), "PLUS");
//! assert_eq!(names.fresh("PLUS"), "PLUS1");
//! ```

use compact_str::{CompactString, format_compact};
use lasso::Rodeo;
use std::fmt;

/// Monotonic, collision-free name generator.
pub struct NameSource {
    rodeo: Rodeo,
    counter: u64,
}

impl NameSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
            counter: 0,
        }
    }

    /// A source that never returns any of `names`.
    #[must_use]
    pub fn reserving<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut source = Self::new();
        for name in names {
            source.reserve(name);
        }
        source
    }

    /// Mark `name` as taken.
    pub fn reserve(&mut self, name: &str) {
        self.rodeo.get_or_intern(name);
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rodeo.contains(name)
    }

    /// Return `seed` if unused, otherwise `seed` followed by the next free
    /// counter value. The returned name is reserved.
    pub fn fresh(&mut self, seed: &str) -> CompactString {
        if !self.rodeo.contains(seed) {
            self.rodeo.get_or_intern(seed);
            return CompactString::from(seed);
        }
        loop {
            let candidate = format_compact!("{seed}{}", self.counter);
            self.counter += 1;
            if !self.rodeo.contains(candidate.as_str()) {
                self.rodeo.get_or_intern(candidate.as_str());
                return candidate;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for NameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameSource")
            .field("len", &self.rodeo.len())
            .field("counter", &self.counter)
            .finish()
    }
}
