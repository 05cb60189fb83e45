//! Leveled sets: the BFS frontier structure of the move-space search.

use std::collections::BTreeSet;

/// A sequence of disjoint levels with a global membership index.
///
/// Level `n` holds the items first reached at BFS depth `n`. An item is
/// stored in exactly one level; inserting an item already present in any
/// level is refused.
#[derive(Debug, Clone)]
pub struct LeveledSet<T> {
    levels: Vec<BTreeSet<T>>,
    seen: BTreeSet<T>,
}

impl<T> Default for LeveledSet<T> {
    fn default() -> Self {
        Self {
            levels: vec![BTreeSet::new()],
            seen: BTreeSet::new(),
        }
    }
}

impl<T: Ord + Clone> LeveledSet<T> {
    /// One empty level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Leveled set whose first level holds `items`.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut set = Self::new();
        for item in items {
            set.insert(item);
        }
        set
    }

    /// Open a new, empty last level.
    pub fn new_level(&mut self) {
        self.levels.push(BTreeSet::new());
    }

    /// Add `item` to the last level. Returns `false` if it is present in
    /// any level.
    pub fn insert(&mut self, item: T) -> bool {
        if !self.seen.insert(item.clone()) {
            return false;
        }
        if let Some(last) = self.levels.last_mut() {
            last.insert(item);
        }
        true
    }

    /// Whether any level holds `item`.
    pub fn contains(&self, item: &T) -> bool {
        self.seen.contains(item)
    }

    /// The newest level.
    pub fn last_level(&self) -> &BTreeSet<T> {
        // `levels` is never empty.
        &self.levels[self.levels.len() - 1]
    }

    /// All levels, oldest first.
    pub fn levels(&self) -> &[BTreeSet<T>] {
        &self.levels
    }

    /// Number of levels.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Every item in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.seen.iter()
    }

    /// Number of items over all levels.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no level holds anything.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Smallest item over all levels.
    pub fn min(&self) -> Option<&T> {
        self.seen.first()
    }

    /// Whether the two sets share an item.
    pub fn intersects(&self, other: &Self) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().any(|item| large.contains(item))
    }
}
