//! Lines of a metric space and their deduplication.
//!
//! The line through `i` and `j` holds both endpoints and every `k` for which
//! one of `i-j-k`, `j-i-k` or `i-k-j` is a betweenness equality.

use crate::distance::DistanceMatrix;
use crate::graph::{all_bits, bit, bits};
use hashbrown::HashSet;
use std::fmt;

/// Largest capacity for which lines are deduplicated with a positional bitmap
/// of `2^capacity` bits (2 MiB at the limit). Larger capacities use a hash set.
pub const BITMAP_DEDUP_MAX_CAPACITY: usize = 24;

// ============================================================================
// Line
// ============================================================================

/// A set of points stored as a bitmask, one bit per point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Line(u64);

impl Line {
    /// The line containing every one of `n` points.
    #[inline(always)]
    pub const fn universal(n: usize) -> Self {
        Self(all_bits(n))
    }

    /// Wraps a raw bitmask.
    #[inline(always)]
    pub const fn from_bits(mask: u64) -> Self {
        Self(mask)
    }

    /// Raw bitmask.
    #[inline(always)]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns `true` if point `k` is on the line.
    #[inline(always)]
    pub const fn contains(self, k: usize) -> bool {
        (self.0 >> k) & 1 != 0
    }

    /// Number of points on the line.
    #[inline(always)]
    pub const fn point_count(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns `true` if this is the universal line of an `n`-point space.
    #[inline(always)]
    pub const fn is_universal(self, n: usize) -> bool {
        self.0 == Self::universal(n).0
    }

    /// Iterates over the points on the line in increasing order.
    pub fn points(self) -> impl Iterator<Item = usize> {
        bits(self.0)
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line{self}")
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, p) in self.points().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{p}")?;
        }
        f.write_str("}")
    }
}

/// Returns the line through the distinct points `i` and `j`.
///
/// Sums are taken in `u64` so that [`crate::distance::UNREACHABLE`] entries
/// never wrap.
pub fn line_through(dist: &DistanceMatrix, i: usize, j: usize) -> Line {
    let n = dist.order();
    debug_assert!(i < n && j < n && i != j);

    let dij = u64::from(dist.get(i, j));
    let mut mask = bit(i) | bit(j);
    for k in 0..n {
        if k == i || k == j {
            continue;
        }
        let dik = u64::from(dist.get(i, k));
        let djk = u64::from(dist.get(j, k));

        // i-j-k, j-i-k, i-k-j
        if dij + djk == dik || dij + dik == djk || dik + djk == dij {
            mask |= bit(k);
        }
    }
    Line(mask)
}

// ============================================================================
// LineCollection
// ============================================================================

/// Set of distinct lines of one space.
///
/// Small capacities index a bitmap by the line's mask; larger ones hash.
#[derive(Clone, Debug)]
pub enum LineCollection {
    /// One bit per possible line value.
    Bitmap {
        /// `2^capacity` bits packed into words.
        words: Vec<u64>,
        /// Number of set bits.
        len: usize,
    },
    /// Hash set of line values.
    Hashed(HashSet<Line>),
}

impl LineCollection {
    /// Creates an empty collection for spaces of at most `capacity` points.
    pub fn for_capacity(capacity: usize) -> Self {
        if capacity <= BITMAP_DEDUP_MAX_CAPACITY {
            let words = (1usize << capacity).div_ceil(64);
            Self::Bitmap {
                words: vec![0u64; words],
                len: 0,
            }
        } else {
            Self::Hashed(HashSet::new())
        }
    }

    /// Adds `line`; returns `true` if it was not present yet.
    ///
    /// # Panics
    /// Panics in bitmap mode if `line` has a bit at or above the capacity.
    pub fn insert(&mut self, line: Line) -> bool {
        match self {
            Self::Bitmap { words, len } => {
                let idx = line.bits() as usize;
                let word = &mut words[idx / 64];
                let mask = 1u64 << (idx % 64);
                if *word & mask != 0 {
                    return false;
                }
                *word |= mask;
                *len += 1;
                true
            }
            Self::Hashed(set) => set.insert(line),
        }
    }

    /// Returns `true` if `line` has been inserted.
    #[cfg(test)]
    pub(crate) fn contains(&self, line: Line) -> bool {
        match self {
            Self::Bitmap { words, .. } => {
                let idx = line.bits() as usize;
                words
                    .get(idx / 64)
                    .is_some_and(|w| (w >> (idx % 64)) & 1 != 0)
            }
            Self::Hashed(set) => set.contains(&line),
        }
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        match self {
            Self::Bitmap { len, .. } => *len,
            Self::Hashed(set) => set.len(),
        }
    }

    /// Returns `true` if no line has been inserted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when backed by the positional bitmap.
    pub fn is_bitmap(&self) -> bool {
        matches!(self, Self::Bitmap { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
