#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Hardware widths of the circuit.
//!
//! Every memory and register in the design is sized from three numbers: the
//! clause address width `C`, the variable id width `V` and the clause size `K`.
//! There are always exactly `2^C` clause slots and `2^V` variable records,
//! whether or not an instance uses them all.

use crate::circuit::error::ConfigError;
use crate::circuit::reduction::tree_depth;

/// Default clause address width.
pub const CLAUSE_BITS: u32 = 8;
/// Default variable id width.
pub const VAR_BITS: u32 = 8;
/// Default number of literal slots per clause.
pub const CLAUSE_SIZE: usize = 4;

const MAX_ADDRESS_BITS: u32 = 16;
const MAX_CLAUSE_SIZE: u32 = 32;
const MAX_WORD_BITS: u32 = 128;

/// The fixed widths a circuit instance is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CircuitConfig {
    clause_bits: u32,
    var_bits: u32,
    clause_size: usize,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            clause_bits: CLAUSE_BITS,
            var_bits: VAR_BITS,
            clause_size: CLAUSE_SIZE,
        }
    }
}

impl CircuitConfig {
    /// Builds a configuration, checking every width.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a width is zero or too large, or if a
    /// packed clause word would not fit in 128 bits.
    pub fn new(clause_bits: u32, var_bits: u32, clause_size: usize) -> Result<Self, ConfigError> {
        check_range("clause_bits", clause_bits, 1, MAX_ADDRESS_BITS)?;
        check_range("var_bits", var_bits, 1, MAX_ADDRESS_BITS)?;
        let size = u32::try_from(clause_size).unwrap_or(u32::MAX);
        check_range("clause_size", size, 1, MAX_CLAUSE_SIZE)?;

        let bits = size * (var_bits + 1);
        if bits > MAX_WORD_BITS {
            return Err(ConfigError::ClauseWordTooWide { bits });
        }

        Ok(Self {
            clause_bits,
            var_bits,
            clause_size,
        })
    }

    /// Smallest widths able to hold an instance.
    ///
    /// Variable ids run from 1 to `num_vars`, and id 0 is the sentinel, so
    /// `V` must cover `num_vars + 1` records.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the instance is too large for the
    /// simulator.
    pub fn fit(num_vars: usize, num_clauses: usize, max_clause_len: usize) -> Result<Self, ConfigError> {
        Self::new(
            bits_for(num_clauses),
            bits_for(num_vars + 1),
            max_clause_len.max(1),
        )
    }

    /// Clause address width `C`.
    #[must_use]
    pub const fn clause_bits(&self) -> u32 {
        self.clause_bits
    }

    /// Variable id width `V`.
    #[must_use]
    pub const fn var_bits(&self) -> u32 {
        self.var_bits
    }

    /// Literal slots per clause, `K`.
    #[must_use]
    pub const fn clause_size(&self) -> usize {
        self.clause_size
    }

    /// Number of clause addresses, `2^C`.
    #[must_use]
    pub const fn num_clauses(&self) -> usize {
        1 << self.clause_bits
    }

    /// Number of variable records, `2^V`, including the sentinel record 0.
    #[must_use]
    pub const fn num_vars(&self) -> usize {
        1 << self.var_bits
    }

    /// Width of one packed clause word.
    #[must_use]
    pub const fn word_bits(&self) -> u32 {
        self.clause_size as u32 * (self.var_bits + 1)
    }

    /// Largest value the `V+1` bit level register can hold.
    #[must_use]
    pub const fn max_level(&self) -> u32 {
        (1 << (self.var_bits + 1)) - 1
    }
}

const fn check_range(name: &'static str, value: u32, min: u32, max: u32) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::WidthOutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Bits needed to address `n` slots, at least one. An address decoder over
/// `n` slots is as deep as a reduction tree over them.
const fn bits_for(n: usize) -> u32 {
    let depth = tree_depth(n);
    if depth == 0 { 1 } else { depth }
}
