//! Subset catalog
//!
//! Enumerates every 5-element index combination of a pool of size N, the
//! disjoint pairs among them, and finds violating (equal-sum) disjoint pairs
//! under a concrete assignment. Subsets are pure index sets: the same catalog
//! serves every assignment of the same size.

use crate::{Result, TeamsError};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Number of elements in one team
pub const TEAM_SIZE: usize = 5;

/// Smallest pool that can hold two disjoint teams
pub const MIN_POOL_SIZE: usize = 2 * TEAM_SIZE;

/// Largest supported pool (membership is tracked in a 64-bit mask)
pub const MAX_POOL_SIZE: usize = 64;

/// A set of exactly [`TEAM_SIZE`] distinct indices, kept in ascending order.
///
/// Ordering is lexicographic on the index list.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subset {
    indices: [u8; TEAM_SIZE],
    mask: u64,
}

impl Subset {
    fn from_sorted(indices: [u8; TEAM_SIZE]) -> Self {
        let mask = indices.iter().fold(0u64, |m, &i| m | (1u64 << i));
        Self { indices, mask }
    }

    /// Builds a subset from arbitrary indices
    ///
    /// Fails unless exactly [`TEAM_SIZE`] distinct indices below
    /// [`MAX_POOL_SIZE`] are given.
    pub fn new(indices: &[usize]) -> Result<Self> {
        if indices.len() != TEAM_SIZE {
            return Err(TeamsError::Validation(format!(
                "a subset needs {TEAM_SIZE} indices, got {}",
                indices.len()
            )));
        }
        let mut sorted = [0u8; TEAM_SIZE];
        for (slot, &i) in sorted.iter_mut().zip(indices) {
            if i >= MAX_POOL_SIZE {
                return Err(TeamsError::CatalogTooLarge {
                    size: i + 1,
                    max: MAX_POOL_SIZE,
                });
            }
            *slot = i as u8;
        }
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(TeamsError::Validation(format!(
                "subset indices must be distinct: {indices:?}"
            )));
        }
        Ok(Self::from_sorted(sorted))
    }

    /// Returns the indices in ascending order
    pub fn indices(&self) -> [usize; TEAM_SIZE] {
        self.indices.map(usize::from)
    }

    /// Returns the membership bitmask
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Returns true if the subsets share no index
    pub fn is_disjoint(&self, other: &Subset) -> bool {
        self.mask & other.mask == 0
    }

    /// Sum of the selected values
    ///
    /// None if `values` is too short for the subset or the sum overflows.
    pub fn sum(&self, values: &[i64]) -> Option<i64> {
        self.indices
            .iter()
            .try_fold(0i64, |acc, &i| acc.checked_add(*values.get(i as usize)?))
    }

    /// Selected values, in index order; None if `values` is too short
    pub fn values(&self, values: &[i64]) -> Option<Vec<i64>> {
        self.indices
            .iter()
            .map(|&i| values.get(i as usize).copied())
            .collect()
    }
}

impl fmt::Debug for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subset{:?}", self.indices)
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (k, i) in self.indices.iter().enumerate() {
            if k > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{i}")?;
        }
        f.write_str("}")
    }
}

/// Unordered pair of disjoint subsets, normalized so that `first < second`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisjointPair {
    first: Subset,
    second: Subset,
}

impl DisjointPair {
    /// Pairs two subsets; returns `None` if they overlap
    pub fn new(a: Subset, b: Subset) -> Option<Self> {
        if !a.is_disjoint(&b) {
            return None;
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        Some(Self { first, second })
    }

    /// The lexicographically smaller subset
    pub fn first(&self) -> &Subset {
        &self.first
    }

    /// The lexicographically larger subset
    pub fn second(&self) -> &Subset {
        &self.second
    }

    /// Returns true if both subsets have the same sum under `values`
    ///
    /// False when either sum is undefined (short slice or overflow).
    pub fn is_violated_by(&self, values: &[i64]) -> bool {
        match (self.first.sum(values), self.second.sum(values)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for DisjointPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.first, self.second)
    }
}

/// Lazy, restartable iterator over all [`TEAM_SIZE`]-combinations of
/// `0..n` in lexicographic order
#[derive(Clone, Debug)]
pub struct Combinations {
    n: usize,
    next: Option<[u8; TEAM_SIZE]>,
}

impl Combinations {
    /// Starts the enumeration for a pool of size `n`
    ///
    /// Pools smaller than [`TEAM_SIZE`] yield nothing.
    pub fn new(n: usize) -> Self {
        let next = (n >= TEAM_SIZE && n <= MAX_POOL_SIZE).then(|| {
            let mut first = [0u8; TEAM_SIZE];
            for (i, slot) in first.iter_mut().enumerate() {
                *slot = i as u8;
            }
            first
        });
        Self { n, next }
    }
}

impl Iterator for Combinations {
    type Item = Subset;

    fn next(&mut self) -> Option<Subset> {
        let current = self.next?;

        // Advance to the lexicographic successor
        let mut succ = current;
        let mut pos = TEAM_SIZE;
        while pos > 0 {
            pos -= 1;
            let limit = (self.n - TEAM_SIZE + pos) as u8;
            if succ[pos] < limit {
                succ[pos] += 1;
                for k in pos + 1..TEAM_SIZE {
                    succ[k] = succ[k - 1] + 1;
                }
                self.next = Some(succ);
                return Some(Subset::from_sorted(current));
            }
        }
        self.next = None;
        Some(Subset::from_sorted(current))
    }
}

/// Lazy iterator over every disjoint pair of a catalog
///
/// Pairs come out as `(subsets[i], subsets[j])` with `i < j`, which is also
/// their normalized order. Nothing is materialized.
#[derive(Clone)]
pub struct DisjointPairs<'a> {
    subsets: &'a [Subset],
    i: usize,
    j: usize,
}

impl Iterator for DisjointPairs<'_> {
    type Item = DisjointPair;

    fn next(&mut self) -> Option<DisjointPair> {
        while self.i < self.subsets.len() {
            let a = self.subsets[self.i];
            while self.j < self.subsets.len() {
                let b = self.subsets[self.j];
                self.j += 1;
                if a.is_disjoint(&b) {
                    return Some(DisjointPair { first: a, second: b });
                }
            }
            self.i += 1;
            self.j = self.i + 1;
        }
        None
    }
}

/// All [`TEAM_SIZE`]-subsets of a pool of fixed size, in lexicographic order
#[derive(Debug)]
pub struct SubsetCatalog {
    size: usize,
    subsets: Vec<Subset>,
}

impl SubsetCatalog {
    /// Builds the catalog for a pool of `size` elements
    pub fn new(size: usize) -> Result<Self> {
        if size > MAX_POOL_SIZE {
            return Err(TeamsError::CatalogTooLarge {
                size,
                max: MAX_POOL_SIZE,
            });
        }
        let subsets: Vec<Subset> = Combinations::new(size).collect();
        tracing::debug!(size, subsets = subsets.len(), "built subset catalog");
        Ok(Self { size, subsets })
    }

    /// Pool size N
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of subsets, C(N, 5)
    pub fn len(&self) -> usize {
        self.subsets.len()
    }

    /// Returns true if the pool is too small to hold a single team
    pub fn is_empty(&self) -> bool {
        self.subsets.is_empty()
    }

    /// All subsets in lexicographic order
    pub fn subsets(&self) -> &[Subset] {
        &self.subsets
    }

    /// Lazily enumerates all disjoint pairs
    pub fn disjoint_pairs(&self) -> DisjointPairs<'_> {
        DisjointPairs {
            subsets: &self.subsets,
            i: 0,
            j: 1,
        }
    }

    /// Number of disjoint pairs, C(N,5) * C(N-5,5) / 2
    pub fn disjoint_pair_count(&self) -> u64 {
        if self.size < MIN_POOL_SIZE {
            return 0;
        }
        binomial(self.size, TEAM_SIZE) * binomial(self.size - TEAM_SIZE, TEAM_SIZE) / 2
    }

    /// Finds a violating pair: two disjoint subsets with equal sum under
    /// `values`.
    ///
    /// Subsets are grouped by sum so only same-sum subsets are compared for
    /// disjointness. When several violating pairs exist the lexicographically
    /// smallest one is returned, so repeated calls agree.
    pub fn verify(&self, values: &[i64]) -> Result<Option<DisjointPair>> {
        if values.len() != self.size {
            return Err(TeamsError::LengthMismatch {
                expected: self.size,
                actual: values.len(),
            });
        }

        let mut groups: FxHashMap<i64, Vec<u32>> = FxHashMap::default();
        for (idx, subset) in self.subsets.iter().enumerate() {
            let sum = subset.sum(values).ok_or_else(|| {
                TeamsError::Validation(format!("sum of {subset} overflows"))
            })?;
            groups.entry(sum).or_default().push(idx as u32);
        }

        let mut best: Option<(u32, u32)> = None;
        for members in groups.values().filter(|m| m.len() > 1) {
            if let Some(found) = self.smallest_disjoint(members, best) {
                best = Some(found);
            }
        }

        Ok(best.map(|(a, b)| DisjointPair {
            first: self.subsets[a as usize],
            second: self.subsets[b as usize],
        }))
    }

    /// Smallest disjoint pair within one sum group that beats `bound`.
    /// `members` is ascending, so the first hit for the smallest first
    /// element is the group minimum.
    fn smallest_disjoint(&self, members: &[u32], bound: Option<(u32, u32)>) -> Option<(u32, u32)> {
        for (pos, &a) in members.iter().enumerate() {
            if let Some((best_a, _)) = bound {
                if a > best_a {
                    return None;
                }
            }
            let subset_a = &self.subsets[a as usize];
            let partner = members[pos + 1..]
                .iter()
                .copied()
                .find(|&b| subset_a.is_disjoint(&self.subsets[b as usize]));
            if let Some(b) = partner {
                return match bound {
                    Some(current) if current <= (a, b) => None,
                    _ => Some((a, b)),
                };
            }
        }
        None
    }
}

/// Catalogs keyed by pool size, built on first use
#[derive(Debug, Default)]
pub struct CatalogCache {
    catalogs: FxHashMap<usize, Arc<SubsetCatalog>>,
}

impl CatalogCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the catalog for `size`, building it if needed
    pub fn get(&mut self, size: usize) -> Result<Arc<SubsetCatalog>> {
        if let Some(catalog) = self.catalogs.get(&size) {
            return Ok(Arc::clone(catalog));
        }
        let catalog = Arc::new(SubsetCatalog::new(size)?);
        self.catalogs.insert(size, Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Number of cached catalogs
    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    /// Returns true if nothing has been built yet
    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}

/// Binomial coefficient C(n, k)
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1u64, |acc, i| acc * (n - i) as u64 / (i + 1) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinations_count_and_order() {
        let all: Vec<Subset> = Combinations::new(7).collect();
        assert_eq!(all.len(), 21);
        assert_eq!(all[0].indices(), [0, 1, 2, 3, 4]);
        assert_eq!(all[1].indices(), [0, 1, 2, 3, 5]);
        assert_eq!(all[20].indices(), [2, 3, 4, 5, 6]);
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn combinations_are_restartable() {
        let first = Combinations::new(9);
        let again = first.clone();
        assert_eq!(first.count(), again.count());
        assert_eq!(Combinations::new(9).count(), 126);
    }

    #[test]
    fn small_pools_have_no_pairs() {
        assert_eq!(Combinations::new(4).count(), 0);
        assert_eq!(Combinations::new(5).count(), 1);

        let catalog = SubsetCatalog::new(9).unwrap();
        assert_eq!(catalog.disjoint_pairs().count(), 0);
        assert_eq!(catalog.disjoint_pair_count(), 0);
        assert_eq!(catalog.verify(&[1; 9]).unwrap(), None);
    }

    #[test]
    fn disjoint_pair_count_matches_enumeration() {
        for n in [10, 11, 12] {
            let catalog = SubsetCatalog::new(n).unwrap();
            assert_eq!(catalog.disjoint_pairs().count() as u64, catalog.disjoint_pair_count());
        }
        assert_eq!(SubsetCatalog::new(10).unwrap().disjoint_pair_count(), 126);
    }

    #[test]
    fn disjoint_pairs_are_normalized() {
        let catalog = SubsetCatalog::new(11).unwrap();
        for pair in catalog.disjoint_pairs() {
            assert!(pair.first() < pair.second());
            assert!(pair.first().is_disjoint(pair.second()));
        }
    }

    #[test]
    fn subset_new_sorts_and_validates() {
        let s = Subset::new(&[4, 0, 3, 1, 2]).unwrap();
        assert_eq!(s.indices(), [0, 1, 2, 3, 4]);
        assert_eq!(s.mask(), 0b11111);
        assert!(Subset::new(&[0, 0, 1, 2, 3]).is_err());
        assert!(Subset::new(&[0, 1, 2, 3]).is_err());
        assert!(Subset::new(&[0, 1, 2, 3, 64]).is_err());
    }

    #[test]
    fn identical_values_violate() {
        let catalog = SubsetCatalog::new(10).unwrap();
        let pair = catalog.verify(&[1; 10]).unwrap().expect("pair expected");
        assert_eq!(pair.first().indices(), [0, 1, 2, 3, 4]);
        assert_eq!(pair.second().indices(), [5, 6, 7, 8, 9]);
    }

    #[test]
    fn documented_counterexample_is_clean() {
        let catalog = SubsetCatalog::new(11).unwrap();
        assert_eq!(catalog.verify(&[1, 1, 1, 1, 1, 1, 1, 1, 3, 4, 5]).unwrap(), None);
    }

    #[test]
    fn verify_picks_smallest_pair() {
        // Brute-force the minimum and compare
        let values = [1, 2, 2, 3, 5, 5, 7, 8, 9, 9, 10, 12];
        let catalog = SubsetCatalog::new(values.len()).unwrap();
        let expected = catalog.disjoint_pairs().filter(|p| p.is_violated_by(&values)).min();
        assert!(expected.is_some());
        assert_eq!(catalog.verify(&values).unwrap(), expected);
    }

    #[test]
    fn verify_rejects_wrong_length() {
        let catalog = SubsetCatalog::new(10).unwrap();
        assert_eq!(
            catalog.verify(&[1; 11]),
            Err(TeamsError::LengthMismatch { expected: 10, actual: 11 })
        );
    }

    #[test]
    fn sums_reject_short_slices_and_overflow() {
        let a = Subset::new(&[0, 1, 2, 3, 4]).unwrap();
        let b = Subset::new(&[5, 6, 7, 8, 9]).unwrap();
        let pair = DisjointPair::new(a, b).unwrap();

        assert_eq!(a.sum(&[1, 2, 3, 4, 5]), Some(15));
        assert_eq!(b.sum(&[1; 7]), None);
        assert_eq!(b.values(&[1; 7]), None);
        assert!(!pair.is_violated_by(&[1; 7]));

        let huge = [i64::MAX; 10];
        assert_eq!(a.sum(&huge), None);
        assert!(!pair.is_violated_by(&huge));
        let catalog = SubsetCatalog::new(10).unwrap();
        assert!(matches!(catalog.verify(&huge), Err(TeamsError::Validation(_))));
    }

    #[test]
    fn catalog_too_large() {
        assert!(matches!(
            SubsetCatalog::new(65),
            Err(TeamsError::CatalogTooLarge { size: 65, .. })
        ));
    }

    #[test]
    fn cache_shares_catalogs() {
        let mut cache = CatalogCache::new();
        let a = cache.get(10).unwrap();
        let b = cache.get(10).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn binomial_values() {
        assert_eq!(binomial(10, 5), 252);
        assert_eq!(binomial(17, 5), 6188);
        assert_eq!(binomial(4, 5), 0);
    }
}
