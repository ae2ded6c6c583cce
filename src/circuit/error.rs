//! Error types for building and driving the circuit.
//!
//! The clock path itself cannot fail: once a clause image has been accepted
//! every tick is total. Everything that can go wrong is caught while the
//! configuration is validated or while the clause memory is loaded, because
//! the fixed-width encoding has no way to represent an out-of-range value and
//! silently truncating one would corrupt the search.

use std::io;
use thiserror::Error;

/// Invalid hardware widths.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A width lies outside the range the simulator supports.
    #[error("{name} must be between {min} and {max}, got {value}")]
    WidthOutOfRange {
        /// Which width.
        name: &'static str,
        /// The rejected value.
        value: u32,
        /// Smallest allowed value.
        min: u32,
        /// Largest allowed value.
        max: u32,
    },

    /// `clause_size * (var_bits + 1)` does not fit in a 128 bit clause word.
    #[error("clause word of {bits} bits exceeds the 128 bit limit")]
    ClauseWordTooWide {
        /// Width the word would need.
        bits: u32,
    },
}

/// A load-time precondition violation.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A literal names a variable that has no record in the trail.
    #[error("clause {clause} references variable {variable}, but only ids below {limit} fit in {var_bits} bits")]
    VariableOutOfRange {
        /// Offending clause.
        clause: usize,
        /// The variable id as written.
        variable: u64,
        /// First id that does not fit.
        limit: u64,
        /// Configured variable id width.
        var_bits: u32,
    },

    /// A clause has more literals than there are slots.
    #[error("clause {clause} has {len} literals, but clauses hold at most {clause_size}")]
    ClauseTooLong {
        /// Offending clause.
        clause: usize,
        /// Literals in the clause.
        len: usize,
        /// Configured slots per clause.
        clause_size: usize,
    },

    /// The clause id does not fit in the clause address width.
    #[error("clause id {clause} does not fit in {clause_bits} address bits (limit {limit})")]
    ClauseOutOfRange {
        /// Offending clause id.
        clause: usize,
        /// Number of clause addresses.
        limit: usize,
        /// Configured clause address width.
        clause_bits: u32,
    },

    /// A packed clause word has bits set above the last slot.
    #[error("packed word for clause {clause} has bits set above bit {width}")]
    PackedWordTooWide {
        /// Offending clause.
        clause: usize,
        /// Width of the slots in use.
        width: u32,
    },

    /// An empty clause has no encoding: an all-sentinel word reads as satisfied.
    #[error("clause {clause} is empty")]
    EmptyClause {
        /// Index of the empty clause.
        clause: usize,
    },

    /// A DIMACS line could not be parsed.
    #[error("line {line}: {message}")]
    Syntax {
        /// One-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// The input could not be read.
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    /// The instance needs widths the simulator cannot provide.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failures reported by the run loop rather than the circuit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// The tick budget ran out before `done` was raised.
    #[error("circuit did not terminate within {ticks} ticks")]
    DidNotTerminate {
        /// The budget that was exhausted.
        ticks: u64,
    },
}
