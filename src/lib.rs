#![deny(missing_docs)]
//! This crate provides a cycle-accurate simulation of a fixed-function DPLL SAT solving circuit.

/// The `circuit` module implements the circuit: reduction trees, the clause memory and resolver,
/// the unit propagation engine, the variable trail and the top level controller, plus the
/// DIMACS loader and clock driver around them.
pub mod circuit;
