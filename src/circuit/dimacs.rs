#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A parser for the DIMACS CNF format, producing the clause memory image.
//!
//! The accepted format:
//! - Comment lines starting with `c` are skipped.
//! - The problem line `p cnf <variables> <clauses>` is checked for shape. Its
//!   counts are advisory; the instance is sized from what is actually found.
//! - Literals are whitespace separated integers and every clause ends at a
//!   `0`. A clause may span several lines, and a final clause missing its
//!   `0` is accepted.
//! - A line starting with `%` ends the data, as in the SATLIB benchmarks.
//!
//! Repeated literals inside a clause are dropped while parsing. Two copies of
//! one open literal would otherwise read as two open slots, and the clause
//! could never become unit.

use crate::circuit::clause_storage::ClauseStorage;
use crate::circuit::configs::CircuitConfig;
use crate::circuit::error::LoadError;
use crate::circuit::literal::Literal;
use bit_vec::BitVec;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::fmt;
use std::io::{self, BufRead};
use std::path::Path;

/// A clause as parsed, before it is padded into a memory word.
pub type Clause = SmallVec<[Literal; 8]>;

/// A parsed CNF instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Instance {
    /// Highest variable id, from the problem line or the clauses, whichever is larger.
    pub num_vars: usize,
    /// Clauses in file order, repeated literals removed.
    pub clauses: Vec<Clause>,
}

impl Instance {
    /// Builds an instance from DIMACS style integer clauses.
    #[must_use]
    pub fn from_clauses<I, C>(clauses: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = i32>,
    {
        let mut instance = Self::default();
        for clause in clauses {
            instance.push(clause.into_iter().map(Literal::from_i32).collect());
        }
        instance
    }

    fn push(&mut self, mut clause: Clause) {
        let mut seen = FxHashSet::default();
        clause.retain(|lit| seen.insert(*lit));
        if let Some(max) = clause.iter().map(|lit| lit.variable() as usize).max() {
            self.num_vars = self.num_vars.max(max);
        }
        self.clauses.push(clause);
    }

    /// Total literal count over all clauses.
    #[must_use]
    pub fn num_literals(&self) -> usize {
        self.clauses.iter().map(SmallVec::len).sum()
    }

    /// Length of the longest clause.
    #[must_use]
    pub fn max_clause_len(&self) -> usize {
        self.clauses.iter().map(SmallVec::len).max().unwrap_or(0)
    }

    /// The smallest widths that hold this instance.
    ///
    /// # Errors
    ///
    /// Fails if the instance is too large for the simulator.
    pub fn fit(&self) -> Result<CircuitConfig, LoadError> {
        Ok(CircuitConfig::fit(
            self.num_vars,
            self.clauses.len(),
            self.max_clause_len(),
        )?)
    }

    /// Lays clause `i` at address `i`. Addresses past the last clause keep
    /// the all-sentinel word.
    ///
    /// # Errors
    ///
    /// Fails on an empty clause, or when a clause, variable or clause count
    /// does not fit `config`.
    pub fn to_clause_storage(&self, config: &CircuitConfig) -> Result<ClauseStorage, LoadError> {
        if let Some(clause) = self.clauses.iter().position(SmallVec::is_empty) {
            return Err(LoadError::EmptyClause { clause });
        }
        if self.clauses.len() > config.num_clauses() {
            return Err(LoadError::ClauseOutOfRange {
                clause: self.clauses.len() - 1,
                limit: config.num_clauses(),
                clause_bits: config.clause_bits(),
            });
        }

        let mut storage = ClauseStorage::new(*config);
        for (id, clause) in self.clauses.iter().enumerate() {
            storage.load(id, clause)?;
        }
        Ok(storage)
    }

    /// Checks `model`, indexed by variable id, against every clause.
    #[must_use]
    pub fn verify(&self, model: &BitVec) -> bool {
        self.clauses.iter().all(|clause| {
            clause.iter().any(|lit| {
                model
                    .get(lit.variable() as usize)
                    .is_some_and(|value| lit.eval(value))
            })
        })
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars, self.clauses.len())?;
        for clause in &self.clauses {
            for lit in clause {
                write!(f, "{} ", lit.to_i32())?;
            }
            writeln!(f, "0")?;
        }
        Ok(())
    }
}

/// Parses DIMACS data from `reader`.
///
/// # Errors
///
/// Returns [`LoadError::Syntax`] for a malformed problem line or a token that
/// is not an `i32`, and [`LoadError::Io`] if reading fails.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Instance, LoadError> {
    let mut instance = Instance::default();
    let mut current = Clause::new();
    let mut seen_header = false;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        let mut tokens = line.split_whitespace().peekable();

        match tokens.peek().copied() {
            None => {}
            Some(token) if token.starts_with('%') => break,
            Some(token) if token.starts_with('c') => {}
            Some("p") => {
                if seen_header {
                    return Err(syntax(number, "duplicate problem line"));
                }
                seen_header = true;
                instance.num_vars = instance.num_vars.max(parse_header(number, tokens)?);
            }
            Some(_) => {
                for token in tokens {
                    let value = token
                        .parse::<i32>()
                        .map_err(|e| syntax(number, format!("bad literal '{token}': {e}")))?;
                    if value == 0 {
                        instance.push(std::mem::take(&mut current));
                    } else {
                        current.push(Literal::from_i32(value));
                    }
                }
            }
        }
    }

    if !current.is_empty() {
        instance.push(current);
    }
    Ok(instance)
}

fn parse_header<'a>(line: usize, mut tokens: impl Iterator<Item = &'a str>) -> Result<usize, LoadError> {
    tokens.next();
    if tokens.next() != Some("cnf") {
        return Err(syntax(line, "expected 'p cnf <variables> <clauses>'"));
    }
    let mut count = |what: &str| {
        tokens
            .next()
            .ok_or_else(|| syntax(line, format!("missing {what} count")))?
            .parse::<usize>()
            .map_err(|e| syntax(line, format!("bad {what} count: {e}")))
    };
    let vars = count("variable")?;
    count("clause")?;
    Ok(vars)
}

fn syntax(line: usize, message: impl Into<String>) -> LoadError {
    LoadError::Syntax {
        line,
        message: message.into(),
    }
}

/// Parses a DIMACS file.
///
/// # Errors
///
/// See [`parse_dimacs`]; also fails if the file cannot be opened.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Instance, LoadError> {
    let file = std::fs::File::open(path)?;
    parse_dimacs(io::BufReader::new(file))
}

/// Parses DIMACS text held in memory, e.g. `"1 -2 0\n2 3 0"`.
///
/// # Errors
///
/// See [`parse_dimacs`].
pub fn parse_str(input: &str) -> Result<Instance, LoadError> {
    parse_dimacs(input.as_bytes())
}
