#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The clause memory.
//!
//! `2^C` words of `K` literal slots each, written once before the first tick
//! and only ever read by address afterwards. Unloaded addresses hold
//! all-sentinel clauses, which the resolver treats as satisfied.

use crate::circuit::configs::CircuitConfig;
use crate::circuit::error::LoadError;
use crate::circuit::literal::Literal;
use std::ops::Index;

/// Flat, directly addressed clause memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseStorage {
    config: CircuitConfig,
    slots: Vec<Literal>,
}

impl ClauseStorage {
    /// An empty memory: every address holds the all-sentinel clause.
    #[must_use]
    pub fn new(config: CircuitConfig) -> Self {
        Self {
            config,
            slots: vec![Literal::SENTINEL; config.num_clauses() * config.clause_size()],
        }
    }

    /// The widths the memory was built with.
    #[must_use]
    pub const fn config(&self) -> &CircuitConfig {
        &self.config
    }

    /// Writes `literals` at `clause_id`, padding the remaining slots with the sentinel.
    ///
    /// # Errors
    ///
    /// Fails if the address is out of range, if there are more than `K`
    /// literals, or if a literal names a variable without a record.
    pub fn load(&mut self, clause_id: usize, literals: &[Literal]) -> Result<(), LoadError> {
        self.check_address(clause_id)?;

        let clause_size = self.config.clause_size();
        if literals.len() > clause_size {
            return Err(LoadError::ClauseTooLong {
                clause: clause_id,
                len: literals.len(),
                clause_size,
            });
        }

        let limit = self.config.num_vars() as u64;
        if let Some(lit) = literals
            .iter()
            .find(|lit| u64::from(lit.variable()) >= limit)
        {
            return Err(LoadError::VariableOutOfRange {
                clause: clause_id,
                variable: u64::from(lit.variable()),
                limit,
                var_bits: self.config.var_bits(),
            });
        }

        let start = clause_id * clause_size;
        let word = &mut self.slots[start..start + clause_size];
        word.fill(Literal::SENTINEL);
        word[..literals.len()].copy_from_slice(literals);
        Ok(())
    }

    /// Writes a packed clause word at `clause_id`.
    ///
    /// # Errors
    ///
    /// Fails if the address is out of range or if the word has bits set
    /// above the last slot.
    pub fn load_packed(&mut self, clause_id: usize, word: u128) -> Result<(), LoadError> {
        self.check_address(clause_id)?;

        let width = self.config.word_bits();
        if word.checked_shr(width).unwrap_or(0) != 0 {
            return Err(LoadError::PackedWordTooWide {
                clause: clause_id,
                width,
            });
        }

        let var_bits = self.config.var_bits();
        let slot_bits = var_bits + 1;
        let start = clause_id * self.config.clause_size();
        for (i, slot) in self.slots[start..start + self.config.clause_size()]
            .iter_mut()
            .enumerate()
        {
            #[allow(clippy::cast_possible_truncation)]
            let shift = i as u32 * slot_bits;
            *slot = Literal::unpack(word >> shift, var_bits);
        }
        Ok(())
    }

    /// The `K` literals stored at `clause_id`.
    ///
    /// # Panics
    ///
    /// If `clause_id >= 2^C`. The BCP cursor is `C` bits wide and can never
    /// produce such an address.
    #[must_use]
    pub fn read(&self, clause_id: usize) -> &[Literal] {
        let size = self.config.clause_size();
        let start = clause_id * size;
        &self.slots[start..start + size]
    }

    /// The packed word at `clause_id`.
    #[must_use]
    pub fn packed(&self, clause_id: usize) -> u128 {
        let var_bits = self.config.var_bits();
        self.read(clause_id)
            .iter()
            .rev()
            .fold(0u128, |word, lit| (word << (var_bits + 1)) | lit.pack(var_bits))
    }

    /// Number of addresses, loaded or not.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.config.num_clauses()
    }

    /// Always false; the memory has at least two addresses.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Every clause word in address order.
    pub fn iter(&self) -> impl Iterator<Item = &[Literal]> {
        self.slots.chunks_exact(self.config.clause_size())
    }

    /// Addresses holding at least one real literal.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &[Literal])> {
        self.iter()
            .enumerate()
            .filter(|(_, clause)| clause.iter().any(|lit| !lit.is_sentinel()))
    }

    fn check_address(&self, clause_id: usize) -> Result<(), LoadError> {
        if clause_id >= self.config.num_clauses() {
            return Err(LoadError::ClauseOutOfRange {
                clause: clause_id,
                limit: self.config.num_clauses(),
                clause_bits: self.config.clause_bits(),
            });
        }
        Ok(())
    }
}

impl Index<usize> for ClauseStorage {
    type Output = [Literal];

    fn index(&self, index: usize) -> &Self::Output {
        self.read(index)
    }
}
