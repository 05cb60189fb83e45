//! Union-find over arbitrary hashable items.
//!
//! Items are interned into a dense index backed by a
//! `QuickUnionUf<UnionBySize>` forest. `find` takes `&mut self` because
//! the forest compresses paths.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use union_find::{QuickUnionUf, UnionBySize, UnionFind};

/// Disjoint-set forest.
pub struct DisjointSet<T> {
    index: HashMap<T, usize>,
    items: Vec<T>,
    forest: QuickUnionUf<UnionBySize>,
}

impl<T> Default for DisjointSet<T> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            items: Vec::new(),
            forest: QuickUnionUf::new(0),
        }
    }
}

impl<T: Hash + Eq + Clone> DisjointSet<T> {
    /// Empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `item` as a singleton class. Returns `false` if already present.
    pub fn add(&mut self, item: T) -> bool {
        if self.index.contains_key(&item) {
            return false;
        }
        let i = self.forest.insert(UnionBySize::default());
        self.index.insert(item.clone(), i);
        self.items.push(item);
        true
    }

    /// Whether `item` has been added.
    pub fn contains(&self, item: &T) -> bool {
        self.index.contains_key(item)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the forest is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Representative of `item`'s class, or `None` if `item` is unknown.
    pub fn find(&mut self, item: &T) -> Option<&T> {
        let i = *self.index.get(item)?;
        let r = self.forest.find(i);
        self.items.get(r)
    }

    /// Merge the classes of `a` and `b`, adding either if missing.
    /// Returns `true` if two distinct classes were merged.
    pub fn union(&mut self, a: &T, b: &T) -> bool {
        self.add(a.clone());
        self.add(b.clone());
        match (self.index.get(a).copied(), self.index.get(b).copied()) {
            (Some(ia), Some(ib)) => self.forest.union(ia, ib),
            _ => false,
        }
    }

    /// Whether `a` and `b` are in the same class (unknown items never are).
    pub fn same(&mut self, a: &T, b: &T) -> bool {
        match (self.index.get(a).copied(), self.index.get(b).copied()) {
            (Some(ia), Some(ib)) => self.forest.find(ia) == self.forest.find(ib),
            _ => false,
        }
    }

    /// All classes, each in insertion order; classes ordered by their
    /// first-inserted member.
    pub fn classes(&mut self) -> Vec<Vec<T>> {
        let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
        let mut classes: Vec<Vec<T>> = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            let r = self.forest.find(i);
            let slot = *slot_of_root.entry(r).or_insert_with(|| {
                classes.push(Vec::new());
                classes.len() - 1
            });
            classes[slot].push(item.clone());
        }
        classes
    }

    /// One representative per class, in the order of [`Self::classes`].
    pub fn representatives(&mut self) -> Vec<T> {
        let mut seen = HashSet::new();
        let mut reps = Vec::new();
        for i in 0..self.items.len() {
            let r = self.forest.find(i);
            if seen.insert(r) {
                reps.push(self.items[r].clone());
            }
        }
        reps
    }

    /// Number of classes.
    pub fn class_count(&mut self) -> usize {
        (0..self.items.len())
            .filter(|&i| self.forest.find(i) == i)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons() {
        let mut ds = DisjointSet::new();
        assert!(ds.add("a"));
        assert!(!ds.add("a"));
        ds.add("b");
        assert_eq!(ds.class_count(), 2);
        assert!(!ds.same(&"a", &"b"));
        assert_eq!(ds.find(&"c"), None);
    }

    #[test]
    fn test_union_is_transitive() {
        let mut ds = DisjointSet::new();
        for x in 0..6 {
            ds.add(x);
        }
        assert!(ds.union(&0, &1));
        assert!(ds.union(&2, &3));
        assert!(ds.union(&1, &3));
        assert!(!ds.union(&0, &2));

        assert!(ds.same(&0, &3));
        assert!(!ds.same(&0, &4));
        assert_eq!(ds.class_count(), 3);
        assert_eq!(ds.classes(), vec![vec![0, 1, 2, 3], vec![4], vec![5]]);
    }

    #[test]
    fn test_union_adds_missing_items() {
        let mut ds = DisjointSet::new();
        ds.union(&"x", &"y");
        assert_eq!(ds.len(), 2);
        let rx = ds.find(&"x").copied();
        let ry = ds.find(&"y").copied();
        assert!(rx.is_some());
        assert_eq!(rx, ry);
        assert_eq!(ds.representatives().len(), 1);
    }

    #[test]
    fn test_chain_of_unions_collapses_to_one_class() {
        let mut ds = DisjointSet::new();
        for x in 0..32 {
            ds.union(&x, &(x + 1));
        }
        assert_eq!(ds.len(), 33);
        assert_eq!(ds.class_count(), 1);
        let root = ds.find(&0).copied();
        assert_eq!(ds.find(&32).copied(), root);
        assert_eq!(ds.classes(), vec![(0..33).collect::<Vec<_>>()]);
    }
}
