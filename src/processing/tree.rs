//! Ordered deduplicating container keyed on canonical text
//!
//! An unbalanced binary search tree: inserting a key that is already
//! present bumps the stored record's occurrence count instead of adding a
//! node. Keys compare byte-wise, so `"1.50"` and `"1.5"` are different
//! entries. Depth follows insertion order and can reach the record count,
//! so every walk here is iterative.

use std::cmp::Ordering;

use crate::core::MeasurementRecord;

type Link = Option<Box<Node>>;

#[derive(Debug)]
struct Node {
    record: MeasurementRecord,
    left: Link,
    right: Link,
}

impl Node {
    fn new(record: MeasurementRecord) -> Self {
        Self {
            record,
            left: None,
            right: None,
        }
    }
}

/// Result of a successful insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was attached with a count of one
    Created,
    /// An existing record's count was incremented to the carried value
    Merged { occurrence_count: u64 },
}

/// The tree refused to grow past its capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded {
    pub capacity: usize,
}

/// Binary search tree of measurement records with merge-on-equal-key
#[derive(Debug, Default)]
pub struct DedupTree {
    root: Link,
    len: usize,
    capacity: Option<usize>,
}

impl DedupTree {
    /// Create an empty, unbounded tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree holding at most `capacity` distinct records
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            root: None,
            len: 0,
            capacity: Some(capacity),
        }
    }

    /// Number of distinct records
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Maximum number of distinct records, if bounded
    pub fn capacity_limit(&self) -> Option<usize> {
        self.capacity
    }

    /// Whether a new distinct record would be refused
    pub fn is_full(&self) -> bool {
        self.capacity.map_or(false, |limit| self.len >= limit)
    }

    /// Insert a record, or count it against the record with the same key
    ///
    /// On a merge only the stored occurrence count changes; the stored
    /// values are kept even if the incoming ones differ.
    pub fn insert(&mut self, record: MeasurementRecord) -> Result<InsertOutcome, CapacityExceeded> {
        let mut link = &mut self.root;
        while let Some(node) = link {
            match record.key().cmp(node.record.key()) {
                Ordering::Less => link = &mut node.left,
                Ordering::Greater => link = &mut node.right,
                Ordering::Equal => {
                    node.record.occurrence_count += 1;
                    return Ok(InsertOutcome::Merged {
                        occurrence_count: node.record.occurrence_count,
                    });
                }
            }
        }

        if let Some(capacity) = self.capacity {
            if self.len >= capacity {
                return Err(CapacityExceeded { capacity });
            }
        }

        *link = Some(Box::new(Node::new(record)));
        self.len += 1;
        Ok(InsertOutcome::Created)
    }

    /// Look up a record by canonical text
    pub fn get(&self, key: &str) -> Option<&MeasurementRecord> {
        let mut link = &self.root;
        while let Some(node) = link {
            match key.cmp(node.record.key()) {
                Ordering::Less => link = &node.left,
                Ordering::Greater => link = &node.right,
                Ordering::Equal => return Some(&node.record),
            }
        }
        None
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove a record by canonical text
    ///
    /// A node with one child is replaced by that child. A node with two
    /// children is replaced by its left subtree, with its right subtree
    /// hung off the rightmost node of that left subtree.
    pub fn remove(&mut self, key: &str) -> Option<MeasurementRecord> {
        let mut link = &mut self.root;
        loop {
            let ordering = match link.as_deref() {
                Some(node) => key.cmp(node.record.key()),
                None => return None,
            };
            match ordering {
                Ordering::Equal => break,
                Ordering::Less => link = &mut link.as_mut()?.left,
                Ordering::Greater => link = &mut link.as_mut()?.right,
            }
        }

        let mut target = link.take()?;
        *link = match (target.left.take(), target.right.take()) {
            (None, right) => right,
            (left, None) => left,
            (Some(mut left), Some(right)) => {
                let mut anchor = &mut left;
                while anchor.right.is_some() {
                    anchor = anchor.right.as_mut()?;
                }
                anchor.right = Some(right);
                Some(left)
            }
        };

        self.len -= 1;
        Some(target.record)
    }

    /// Drop every record
    pub fn clear(&mut self) {
        let mut stack: Vec<Box<Node>> = self.root.take().into_iter().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
        self.len = 0;
    }

    /// Number of nodes on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&Node, usize)> = self.root.as_deref().map(|n| (n, 1)).into_iter().collect();
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.left.as_deref().map(|n| (n, level + 1)));
            stack.extend(node.right.as_deref().map(|n| (n, level + 1)));
        }
        deepest
    }

    /// Records in ascending key order
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }

    /// Mutable records in ascending key order
    pub(crate) fn iter_mut(&mut self) -> IterMut<'_> {
        let mut iter = IterMut { stack: Vec::new() };
        iter.push_left(self.root.as_deref_mut());
        iter
    }
}

impl Drop for DedupTree {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<'a> IntoIterator for &'a DedupTree {
    type Item = &'a MeasurementRecord;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order traversal over a [`DedupTree`]
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn push_left(&mut self, mut link: Option<&'a Node>) {
        while let Some(node) = link {
            self.stack.push(node);
            link = node.left.as_deref();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a MeasurementRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some(&node.record)
    }
}

/// Mutable in-order traversal, used by the weighting pass
pub(crate) struct IterMut<'a> {
    stack: Vec<(&'a mut MeasurementRecord, Option<&'a mut Node>)>,
}

impl<'a> IterMut<'a> {
    fn push_left(&mut self, mut link: Option<&'a mut Node>) {
        while let Some(node) = link {
            let Node { record, left, right } = node;
            self.stack.push((record, right.as_deref_mut()));
            link = left.as_deref_mut();
        }
    }
}

impl<'a> Iterator for IterMut<'a> {
    type Item = &'a mut MeasurementRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let (record, right) = self.stack.pop()?;
        self.push_left(right);
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str) -> MeasurementRecord {
        MeasurementRecord::new(key.to_string(), 0, 0.0)
    }

    fn keys(tree: &DedupTree) -> Vec<String> {
        tree.iter().map(|r| r.canonical_text.clone()).collect()
    }

    #[test]
    fn test_empty_tree() {
        let tree = DedupTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn test_insert_orders_by_text() {
        let mut tree = DedupTree::new();
        for key in ["m", "c", "x", "a", "e", "10", "9"] {
            assert_eq!(tree.insert(record(key)).unwrap(), InsertOutcome::Created);
        }
        assert_eq!(tree.len(), 7);
        assert_eq!(keys(&tree), vec!["10", "9", "a", "c", "e", "m", "x"]);
    }

    #[test]
    fn test_duplicate_merges_count_only() {
        let mut tree = DedupTree::new();
        tree.insert(MeasurementRecord::new("4807.0380".to_string(), 173_222_280, 48.1173)).unwrap();
        let outcome = tree
            .insert(MeasurementRecord::new("4807.0380".to_string(), 1, 1.0))
            .unwrap();

        assert_eq!(outcome, InsertOutcome::Merged { occurrence_count: 2 });
        assert_eq!(tree.len(), 1);
        let stored = tree.get("4807.0380").unwrap();
        assert_eq!(stored.occurrence_count, 2);
        assert_eq!(stored.fixed_point_value, 173_222_280);
        assert_eq!(stored.natural_value, 48.1173);
    }

    #[test]
    fn test_textually_distinct_keys_stay_distinct() {
        let mut tree = DedupTree::new();
        tree.insert(record("1.5")).unwrap();
        tree.insert(record("1.50")).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.contains("1.5"));
        assert!(tree.contains("1.50"));
        assert!(!tree.contains("1.500"));
    }

    #[test]
    fn test_remove_leaf_and_single_child() {
        let mut tree = DedupTree::new();
        for key in ["m", "c", "a"] {
            tree.insert(record(key)).unwrap();
        }
        // "c" has only a left child
        assert_eq!(tree.remove("c").unwrap().canonical_text, "c");
        assert_eq!(keys(&tree), vec!["a", "m"]);
        assert_eq!(tree.remove("a").unwrap().canonical_text, "a");
        assert_eq!(keys(&tree), vec!["m"]);
        assert!(tree.remove("zz").is_none());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_remove_two_children_splices_right_subtree() {
        let mut tree = DedupTree::new();
        for key in ["m", "f", "t", "c", "h", "p", "w"] {
            tree.insert(record(key)).unwrap();
        }
        assert_eq!(tree.depth(), 3);

        let removed = tree.remove("m").unwrap();
        assert_eq!(removed.canonical_text, "m");
        assert_eq!(tree.len(), 6);
        assert_eq!(keys(&tree), vec!["c", "f", "h", "p", "t", "w"]);

        // Left subtree is promoted, right subtree hangs under "h"
        assert_eq!(tree.root.as_ref().unwrap().record.canonical_text, "f");
        assert_eq!(tree.depth(), 4);
    }

    #[test]
    fn test_remove_root_with_one_child() {
        let mut tree = DedupTree::new();
        tree.insert(record("b")).unwrap();
        tree.insert(record("d")).unwrap();
        tree.remove("b");
        assert_eq!(keys(&tree), vec!["d"]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_capacity_limit() {
        let mut tree = DedupTree::with_capacity_limit(2);
        tree.insert(record("a")).unwrap();
        tree.insert(record("b")).unwrap();
        assert!(tree.is_full());
        assert_eq!(tree.insert(record("c")), Err(CapacityExceeded { capacity: 2 }));
        // Merging needs no room
        assert_eq!(
            tree.insert(record("a")).unwrap(),
            InsertOutcome::Merged { occurrence_count: 2 }
        );
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_sorted_insertion_degenerates_without_overflow() {
        let mut tree = DedupTree::new();
        for i in 0..10_000 {
            tree.insert(record(&format!("{:08}", i))).unwrap();
        }
        assert_eq!(tree.depth(), 10_000);
        assert_eq!(tree.iter().count(), 10_000);
        drop(tree);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let mut tree = DedupTree::new();
        for key in ["b", "a", "c"] {
            tree.insert(record(key)).unwrap();
        }
        let first: Vec<_> = (&tree).into_iter().collect();
        let second: Vec<_> = tree.iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_iter_mut_visits_in_order() {
        let mut tree = DedupTree::new();
        for key in ["b", "a", "c"] {
            tree.insert(record(key)).unwrap();
        }
        for (i, record) in tree.iter_mut().enumerate() {
            record.weighted_contribution = i as f64;
        }
        let weights: Vec<f64> = tree.iter().map(|r| r.weighted_contribution).collect();
        assert_eq!(weights, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_clear() {
        let mut tree = DedupTree::new();
        tree.insert(record("a")).unwrap();
        tree.insert(record("b")).unwrap();
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }
}
