use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An ordered set of strings stored as a single property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringSet {
    values: BTreeSet<String>,
}

impl StringSet {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add(&mut self, value: &str) -> bool {
        self.values.insert(value.to_string())
    }

    pub fn remove(&mut self, value: &str) -> bool {
        self.values.remove(value)
    }

    pub fn has(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn replace_with<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn values(&self) -> Vec<String> {
        self.values.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values present in exactly one of `self` and `other`
    pub fn diff(&self, other: &[&str]) -> Vec<String> {
        let other: BTreeSet<String> = other.iter().map(|s| s.to_string()).collect();
        self.values.symmetric_difference(&other).cloned().collect()
    }
}

/// An ordered set of integers stored as a single property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntSet {
    values: BTreeSet<i64>,
}

impl IntSet {
    pub fn new<I: IntoIterator<Item = i64>>(values: I) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn add(&mut self, value: i64) -> bool {
        self.values.insert(value)
    }

    pub fn remove(&mut self, value: i64) -> bool {
        self.values.remove(&value)
    }

    pub fn has(&self, value: i64) -> bool {
        self.values.contains(&value)
    }

    pub fn replace_with<I: IntoIterator<Item = i64>>(&mut self, values: I) {
        self.values = values.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn values(&self) -> Vec<i64> {
        self.values.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values present in exactly one of `self` and `other`
    pub fn diff(&self, other: &[i64]) -> Vec<i64> {
        let other: BTreeSet<i64> = other.iter().copied().collect();
        self.values.symmetric_difference(&other).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_set_diff_is_symmetric() {
        let set = StringSet::new(["a", "b", "c"]);
        assert_eq!(set.diff(&["b", "c", "d"]), vec!["a".to_string(), "d".to_string()]);
    }

    #[test]
    fn int_set_replace() {
        let mut set = IntSet::new([1, 2]);
        set.replace_with([5]);
        assert!(set.has(5));
        assert!(!set.has(1));
        assert_eq!(set.len(), 1);
    }
}
