//! Lazy enumeration of all (source, target, metapath) triples
//!
//! The number of triples is the product of the number of sources, targets
//! and metapaths, easily reaching millions. [`Triples`] never materializes
//! them but computes each triple from its position in the cross product.
//!
//! The order is source-list order, then target-list order, then metapath-list
//! order:
//!
//! ```
//! use hetgather::{MetapathId, SourceId, TargetId, Triple, Triples};
//!
//! let sources = [SourceId::from("BP1"), SourceId::from("BP2")];
//! let targets = [TargetId::from("G1")];
//! let metapaths = [MetapathId::from("M1"), MetapathId::from("M2")];
//!
//! let triples: Vec<Triple> = Triples::new(&sources, &targets, &metapaths).collect();
//! assert_eq!(triples, [
//!     Triple::from(("BP1", "G1", "M1")),
//!     Triple::from(("BP1", "G1", "M2")),
//!     Triple::from(("BP2", "G1", "M1")),
//!     Triple::from(("BP2", "G1", "M2")),
//! ]);
//! ```

use crate::{MetapathId, SourceId, TargetId, Triple};

/// Iterator of all triples of the cross product of sources, targets and metapaths
///
/// Cloning the iterator (or creating a new one with the same inputs)
/// restarts the enumeration and yields the identical sequence.
#[derive(Debug, Clone)]
pub struct Triples<'a> {
    sources: &'a [SourceId],
    targets: &'a [TargetId],
    metapaths: &'a [MetapathId],
    idx: usize,
    total: usize,
}

impl<'a> Triples<'a> {
    /// Creates a new iterator, starting at the first triple
    ///
    /// If any of the inputs is empty, the iterator is empty as well.
    pub fn new(
        sources: &'a [SourceId],
        targets: &'a [TargetId],
        metapaths: &'a [MetapathId],
    ) -> Self {
        Self {
            sources,
            targets,
            metapaths,
            idx: 0,
            total: sources
                .len()
                .saturating_mul(targets.len())
                .saturating_mul(metapaths.len()),
        }
    }

    /// The total number of triples, independent of the current position
    pub fn total(&self) -> usize {
        self.total
    }

    /// The position of the next triple in the cross product
    pub fn position(&self) -> usize {
        self.idx
    }

    /// Moves the iterator to `position`, e.g. to resume a cancelled run
    ///
    /// Positions past the end yield an empty iterator.
    #[must_use]
    pub fn starting_at(mut self, position: usize) -> Self {
        self.idx = position.min(self.total);
        self
    }

    /// Returns an iterator of consecutive chunks of at most `chunk_size` triples
    ///
    /// The chunks start at the current position of the iterator.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is 0
    ///
    /// # Examples
    ///
    /// ```
    /// use hetgather::{MetapathId, SourceId, TargetId, Triples};
    ///
    /// let sources = [SourceId::from("BP1")];
    /// let targets: Vec<TargetId> = (0..7).map(|i| TargetId::from(format!("G{i}"))).collect();
    /// let metapaths = [MetapathId::from("M1")];
    ///
    /// let sizes: Vec<usize> = Triples::new(&sources, &targets, &metapaths)
    ///     .chunks(3)
    ///     .map(|chunk| chunk.len())
    ///     .collect();
    /// assert_eq!(sizes, [3, 3, 1]);
    /// ```
    pub fn chunks(self, chunk_size: usize) -> TripleChunks<'a> {
        assert!(chunk_size > 0, "chunk size must be at least 1");
        TripleChunks {
            triples: self,
            chunk_size,
        }
    }

    /// Builds the triple at position `idx` of the cross product
    fn triple_at(&self, idx: usize) -> Triple {
        let per_source = self.targets.len() * self.metapaths.len();
        let source = idx / per_source;
        let rest = idx % per_source;
        let target = rest / self.metapaths.len();
        let metapath = rest % self.metapaths.len();
        Triple::new(
            self.sources[source].clone(),
            self.targets[target].clone(),
            self.metapaths[metapath].clone(),
        )
    }
}

impl Iterator for Triples<'_> {
    type Item = Triple;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.total {
            return None;
        }
        let triple = self.triple_at(self.idx);
        self.idx += 1;
        Some(triple)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.idx;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.idx = self.idx.saturating_add(n).min(self.total);
        self.next()
    }
}

impl ExactSizeIterator for Triples<'_> {}

impl std::iter::FusedIterator for Triples<'_> {}

/// Iterator of consecutive chunks of [`Triples`]
///
/// Created by [`Triples::chunks`]. Each chunk holds `chunk_size` triples,
/// only the last chunk can be shorter. An empty enumeration yields no chunk.
#[derive(Debug, Clone)]
pub struct TripleChunks<'a> {
    triples: Triples<'a>,
    chunk_size: usize,
}

impl Iterator for TripleChunks<'_> {
    type Item = Vec<Triple>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<Triple> = self.triples.by_ref().take(self.chunk_size).collect();
        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.triples.len().div_ceil(self.chunk_size);
        (n, Some(n))
    }
}

impl ExactSizeIterator for TripleChunks<'_> {}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    fn sources(ids: &[&'static str]) -> Vec<SourceId> {
        ids.iter().map(|id| SourceId::from(*id)).collect()
    }

    fn targets(ids: &[&'static str]) -> Vec<TargetId> {
        ids.iter().map(|id| TargetId::from(*id)).collect()
    }

    fn metapaths(ids: &[&'static str]) -> Vec<MetapathId> {
        ids.iter().map(|id| MetapathId::from(*id)).collect()
    }

    #[test]
    fn single_of_each() {
        let (s, t, m) = (sources(&["bio1"]), targets(&["gene1"]), metapaths(&["meta1"]));
        let triples: Vec<Triple> = Triples::new(&s, &t, &m).collect();
        assert_eq!(triples, [Triple::from(("bio1", "gene1", "meta1"))]);
    }

    #[test]
    fn resume_at_position() {
        let (s, t, m) = (
            sources(&["bio1", "bio2"]),
            targets(&["gene1"]),
            metapaths(&["meta1", "meta2"]),
        );
        let mut triples = Triples::new(&s, &t, &m);
        triples.next();
        assert_eq!(triples.position(), 1);

        let resumed: Vec<Triple> = Triples::new(&s, &t, &m).starting_at(3).collect();
        assert_eq!(resumed, [Triple::from(("bio2", "gene1", "meta2"))]);
        assert_eq!(Triples::new(&s, &t, &m).starting_at(10).len(), 0);
    }

    #[test]
    fn input_order_not_value_order() {
        let s = sources(&["bio2", "bio1"]);
        let t = targets(&["gene2", "gene1"]);
        let m = metapaths(&["meta2", "meta1"]);
        let triples: Vec<Triple> = Triples::new(&s, &t, &m).collect();
        let expected: Vec<Triple> = [
            ("bio2", "gene2", "meta2"),
            ("bio2", "gene2", "meta1"),
            ("bio2", "gene1", "meta2"),
            ("bio2", "gene1", "meta1"),
            ("bio1", "gene2", "meta2"),
            ("bio1", "gene2", "meta1"),
            ("bio1", "gene1", "meta2"),
            ("bio1", "gene1", "meta1"),
        ]
        .into_iter()
        .map(Triple::from)
        .collect();
        assert_eq!(triples, expected);
    }

    #[test]
    fn empty_operands() {
        let s = sources(&["bio1"]);
        let t = targets(&["gene1"]);
        let m = metapaths(&["meta1"]);
        assert_eq!(Triples::new(&s, &[], &m).count(), 0);
        assert_eq!(Triples::new(&s, &t, &[]).count(), 0);
        assert_eq!(Triples::new(&[], &t, &m).count(), 0);
        assert_eq!(Triples::new(&s, &[], &[]).count(), 0);
        assert_eq!(Triples::new(&s, &t, &[]).chunks(5).count(), 0);
    }

    #[test]
    fn count_is_product_and_unique() {
        let s = sources(&["bio1", "bio2", "bio3"]);
        let t = targets(&["gene1", "gene2", "gene3", "gene4"]);
        let m = metapaths(&["meta1", "meta2"]);
        let triples = Triples::new(&s, &t, &m);
        assert_eq!(triples.len(), 24);
        assert_eq!(triples.total(), 24);
        let unique: HashSet<Triple> = triples.collect();
        assert_eq!(unique.len(), 24);
    }

    #[test]
    fn restartable() {
        let s = sources(&["bio1", "bio2"]);
        let t = targets(&["gene1", "gene2", "gene3"]);
        let m = metapaths(&["meta1", "meta2"]);
        let first: Vec<Triple> = Triples::new(&s, &t, &m).collect();
        let second: Vec<Triple> = Triples::new(&s, &t, &m).collect();
        assert_eq!(first, second);

        let mut iter = Triples::new(&s, &t, &m);
        iter.next();
        let restarted = iter.clone();
        assert_eq!(iter.collect::<Vec<_>>(), restarted.collect::<Vec<_>>());
    }

    #[test]
    fn exact_size_while_consuming() {
        let s = sources(&["bio1", "bio2"]);
        let t = targets(&["gene1"]);
        let m = metapaths(&["meta1", "meta2"]);
        let mut iter = Triples::new(&s, &t, &m);
        assert_eq!(iter.len(), 4);
        iter.next();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.nth(1), Some(Triple::from(("bio2", "gene1", "meta1"))));
        assert_eq!(iter.len(), 1);
        assert_eq!(iter.nth(5), None);
        assert_eq!(iter.len(), 0);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn chunk_sizes() {
        let s = sources(&["bio1"]);
        let m = metapaths(&["meta1"]);
        for (n, chunk_size, expected) in [
            (5usize, 5usize, vec![5usize]),
            (2, 5, vec![2]),
            (6, 3, vec![3, 3]),
            (7, 3, vec![3, 3, 1]),
            (3, 100, vec![3]),
        ] {
            let t: Vec<TargetId> = (0..n).map(|i| TargetId::from(format!("gene{i}"))).collect();
            let chunks = Triples::new(&s, &t, &m).chunks(chunk_size);
            assert_eq!(chunks.len(), expected.len());
            let sizes: Vec<usize> = chunks.map(|c| c.len()).collect();
            assert_eq!(sizes, expected);
        }
    }

    #[test]
    fn chunks_keep_order() {
        let s = sources(&["bio1", "bio2"]);
        let t = targets(&["gene1", "gene2"]);
        let m = metapaths(&["meta1"]);
        let flat: Vec<Triple> = Triples::new(&s, &t, &m).chunks(3).flatten().collect();
        let all: Vec<Triple> = Triples::new(&s, &t, &m).collect();
        assert_eq!(flat, all);
    }
}
