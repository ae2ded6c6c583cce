#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Associative reduction trees.
//!
//! Every "look at the whole table at once" question the circuit asks (is any
//! literal true, how many slots are open, which record is the lowest free
//! variable) is answered by folding a row of same-width values through a
//! balanced tree of two-input merge cells. A tree over `n` inputs is
//! `ceil(log2 n)` cells deep, which is what lets the hardware answer within a
//! single clock cycle.
//!
//! The tree pairs neighbours left to right, `(0, 1), (2, 3), ...`, and an odd
//! element at the end of a level is carried up unchanged. A merge operator must
//! be associative and must break ties the same way whatever the pairing, or the
//! result depends on the tree shape. The operators in this module all satisfy
//! that, and the tests check it against arbitrary shapes.

use itertools::Itertools;

/// A two-input merge cell.
pub trait Merge: Copy {
    /// Combines two partial results. Must be associative.
    #[must_use]
    fn merge(self, other: Self) -> Self;
}

/// Folds `inputs` through a reduction tree built from `op`.
///
/// Returns `None` for an empty input row.
pub fn reduce<T, I, F>(inputs: I, op: F) -> Option<T>
where
    T: Copy,
    I: IntoIterator<Item = T>,
    F: Fn(T, T) -> T,
{
    let mut row = inputs.into_iter().collect_vec();
    let mut len = row.len();
    if len == 0 {
        return None;
    }

    while len > 1 {
        let half = len / 2;
        for i in 0..half {
            row[i] = op(row[2 * i], row[2 * i + 1]);
        }
        if len % 2 == 1 {
            row[half] = row[len - 1];
            len = half + 1;
        } else {
            len = half;
        }
    }

    Some(row[0])
}

/// [`reduce`] using the type's own [`Merge`] cell.
pub fn reduce_merge<T: Merge, I: IntoIterator<Item = T>>(inputs: I) -> Option<T> {
    reduce(inputs, T::merge)
}

/// Number of merge levels a tree over `n` inputs has.
#[must_use]
pub const fn tree_depth(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

/// Count of set flags, saturating at two.
///
/// Encoded in two bits as `00 -> 01 -> 11`, so that merging two counts is a
/// couple of gates rather than an adder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum SaturatingCount {
    /// No flag set.
    #[default]
    Zero,
    /// Exactly one flag set.
    One,
    /// Two or more.
    Many,
}

impl SaturatingCount {
    /// One leaf of a count.
    #[must_use]
    pub const fn from_flag(flag: bool) -> Self {
        if flag { Self::One } else { Self::Zero }
    }

    /// The two-bit wire form.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Zero => 0b00,
            Self::One => 0b01,
            Self::Many => 0b11,
        }
    }

    /// Decodes the two-bit form. `0b10` never appears on a wire and reads as `Many`.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Zero,
            0b01 => Self::One,
            _ => Self::Many,
        }
    }
}

impl Merge for SaturatingCount {
    fn merge(self, other: Self) -> Self {
        Self::from_bits(double_saturate(self.bits(), other.bits()))
    }
}

/// Adds two saturating counts bitwise: `{hi1 | hi2 | (lo1 & lo2), lo1 | lo2}`.
#[must_use]
pub const fn double_saturate(a: u8, b: u8) -> u8 {
    let (hi_a, lo_a) = ((a >> 1) & 1, a & 1);
    let (hi_b, lo_b) = ((b >> 1) & 1, b & 1);
    ((hi_a | hi_b | (lo_a & lo_b)) << 1) | (lo_a | lo_b)
}

/// Something a [`Lowest`] cell can rank.
pub trait Ranked: Copy {
    /// Ordering key.
    type Key: Ord;

    /// Smaller keys win. Keys must be unique among the candidates of one
    /// reduction so that the winner does not depend on pairing order.
    fn rank(&self) -> Self::Key;
}

/// Keeps the candidate with the smallest rank; an empty slot loses to anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lowest<T>(pub Option<T>);

impl<T> Default for Lowest<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> Lowest<T> {
    /// Wraps a candidate, or an empty slot.
    pub const fn new(candidate: Option<T>) -> Self {
        Self(candidate)
    }

    /// The winning candidate.
    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl<T: Ranked> Merge for Lowest<T> {
    fn merge(self, other: Self) -> Self {
        match (self.0, other.0) {
            (Some(a), Some(b)) => {
                if b.rank() < a.rank() {
                    Self(Some(b))
                } else {
                    Self(Some(a))
                }
            }
            (a, b) => Self(a.or(b)),
        }
    }
}
