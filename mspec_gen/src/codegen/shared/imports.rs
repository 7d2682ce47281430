/* Import sets and compiled fragments
 *
 * Imports are returned by value next to every compiled fragment and merged
 * by the caller, so compiling fields in any order yields the same set.
 */

use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Imports(BTreeSet<String>);

impl Imports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(import: impl Into<String>) -> Self {
        let mut imports = Self::new();
        imports.insert(import);
        imports
    }

    pub fn insert(&mut self, import: impl Into<String>) {
        self.0.insert(import.into());
    }

    pub fn merge(&mut self, other: &Imports) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn union(mut self, other: &Imports) -> Self {
        self.merge(other);
        self
    }

    pub fn contains(&self, import: &str) -> bool {
        self.0.contains(import)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Imports {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Imports(iter.into_iter().map(Into::into).collect())
    }
}

/// A compiled expression or statement block plus what it needs from its surroundings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compiled {
    pub code: String,
    pub imports: Imports,
    /// Set when the code refers to the position recorded at the start of the type.
    pub requires_start_pos: bool,
}

impl Compiled {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            imports: Imports::new(),
            requires_start_pos: false,
        }
    }

    pub fn with_import(mut self, import: impl Into<String>) -> Self {
        self.imports.insert(import);
        self
    }

    pub fn with_start_pos(mut self) -> Self {
        self.requires_start_pos = true;
        self
    }

    /// Rewrites the code, keeping imports and flags.
    pub fn map(self, f: impl FnOnce(String) -> String) -> Self {
        Self {
            code: f(self.code),
            imports: self.imports,
            requires_start_pos: self.requires_start_pos,
        }
    }

    /// Folds another fragment's requirements into this one, returning its code.
    pub fn absorb(&mut self, other: Compiled) -> String {
        self.imports.merge(&other.imports);
        self.requires_start_pos |= other.requires_start_pos;
        other.code
    }

    /// Combines fragments with `render`, unioning their requirements.
    pub fn combine(parts: Vec<Compiled>, render: impl FnOnce(Vec<String>) -> String) -> Self {
        let mut out = Compiled::default();
        let codes = parts.into_iter().map(|part| out.absorb(part)).collect();
        out.code = render(codes);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_order_independent() {
        let a = Imports::from_iter(["math", "time"]);
        let b = Imports::from_iter(["time", "math/big"]);
        assert_eq!(a.clone().union(&b), b.union(&a));
    }

    #[test]
    fn test_combine_unions_requirements() {
        let left = Compiled::new("a").with_import("math");
        let right = Compiled::new("b").with_start_pos();
        let both = Compiled::combine(vec![left, right], |codes| codes.join(" + "));
        assert_eq!(both.code, "a + b");
        assert!(both.imports.contains("math"));
        assert!(both.requires_start_pos);
    }
}
