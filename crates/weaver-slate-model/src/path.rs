//! Child-index paths from the editor root to a node.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// An ordered list of child indices from the root to a node.
///
/// The empty path addresses the editor root. Paths are not stable across
/// edits; use [`Path::transform`] to carry one through an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(indices: impl Into<Vec<usize>>) -> Self {
        Self(indices.into())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, index: usize) -> Path {
        let mut inner = Vec::with_capacity(self.0.len() + 1);
        inner.extend_from_slice(&self.0);
        inner.push(index);
        Path(inner)
    }

    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            return None;
        }
        Some(Path(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Index of this node within its parent.
    pub fn index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Path of the next sibling.
    pub fn next(&self) -> Option<Path> {
        let last = *self.0.last()?;
        let mut inner = self.0.clone();
        *inner.last_mut()? = last + 1;
        Some(Path(inner))
    }

    /// Path of the previous sibling.
    pub fn previous(&self) -> Option<Path> {
        let last = *self.0.last()?;
        if last == 0 {
            return None;
        }
        let mut inner = self.0.clone();
        *inner.last_mut()? = last - 1;
        Some(Path(inner))
    }

    /// Strict ancestor check.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    pub fn is_ancestor_or_equal(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    pub fn is_sibling_of(&self, other: &Path) -> bool {
        if self.0.is_empty() || self.0.len() != other.0.len() {
            return false;
        }
        let n = self.0.len() - 1;
        self.0[..n] == other.0[..n] && self.0[n] != other.0[n]
    }

    /// True when this path ends before `other` at this path's depth, so a
    /// change to this path shifts the index of `other` (or its ancestor).
    pub fn ends_before(&self, other: &Path) -> bool {
        let Some(i) = self.0.len().checked_sub(1) else {
            return false;
        };
        if other.0.len() <= i {
            return false;
        }
        self.0[..i] == other.0[..i] && self.0[i] < other.0[i]
    }

    /// Document-order comparison where an ancestor compares equal to its
    /// descendants.
    pub fn compare(&self, other: &Path) -> Ordering {
        let n = self.0.len().min(other.0.len());
        for i in 0..n {
            match self.0[i].cmp(&other.0[i]) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }

    /// Longest shared ancestor path.
    pub fn common(&self, other: &Path) -> Path {
        let shared = self
            .0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| *a)
            .collect::<Vec<_>>();
        Path(shared)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub(crate) fn set(&mut self, depth: usize, value: usize) {
        if let Some(slot) = self.0.get_mut(depth) {
            *slot = value;
        }
    }
}

impl Deref for Path {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for Path {
    fn from(v: Vec<usize>) -> Self {
        Path(v)
    }
}

impl From<&[usize]> for Path {
    fn from(v: &[usize]) -> Self {
        Path(v.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(v: [usize; N]) -> Self {
        Path(v.to_vec())
    }
}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order: document order, ancestors before descendants.
impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{idx}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_arithmetic() {
        let p = Path::from([0, 2]);
        assert_eq!(p.next(), Some(Path::from([0, 3])));
        assert_eq!(p.previous(), Some(Path::from([0, 1])));
        assert_eq!(Path::from([0, 0]).previous(), None);
        assert_eq!(p.parent(), Some(Path::from([0])));
        assert_eq!(Path::root().parent(), None);
    }

    #[test]
    fn ancestry() {
        let a = Path::from([1]);
        let b = Path::from([1, 0, 3]);
        assert!(a.is_ancestor_of(&b));
        assert!(!b.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&a));
        assert!(a.is_ancestor_or_equal(&a));
        assert_eq!(a.compare(&b), Ordering::Equal);
        assert!(Path::from([0, 5]) < Path::from([1]));
    }

    #[test]
    fn ends_before_only_at_own_depth() {
        assert!(Path::from([0]).ends_before(&Path::from([1, 4])));
        assert!(!Path::from([1]).ends_before(&Path::from([1, 4])));
        assert!(Path::from([1, 2]).ends_before(&Path::from([1, 3])));
        assert!(!Path::from([1, 2]).ends_before(&Path::from([2])));
    }

    #[test]
    fn common_ancestor() {
        let a = Path::from([2, 1, 0]);
        let b = Path::from([2, 1, 4, 0]);
        assert_eq!(a.common(&b), Path::from([2, 1]));
        assert_eq!(a.to_string(), "[2,1,0]");
    }
}
