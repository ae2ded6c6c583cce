#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
/// Unit propagation engine.
pub mod bcp;
/// Combinational clause classification.
pub mod clause_resolver;
/// Clause memory.
pub mod clause_storage;
/// Hardware widths.
pub mod configs;
/// DIMACS loading.
pub mod dimacs;
/// Top level controller.
pub mod dpll;
/// Error types.
pub mod error;
/// Synthetic instances.
pub mod generators;
/// Literal slots.
pub mod literal;
/// Reduction trees.
pub mod reduction;
/// Clock driver and trace.
pub mod simulation;
/// Variable record table.
pub mod trail;
