#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Clock driver and waveform-style trace.

use crate::circuit::clause_storage::ClauseStorage;
use crate::circuit::configs::CircuitConfig;
use crate::circuit::dimacs::Instance;
use crate::circuit::dpll::{CircuitStats, DpllCircuit, Mode, SolveResult, TickReport};
use crate::circuit::error::{LoadError, SimulationError};
use crate::circuit::trail::VariableRecord;
use bit_vec::BitVec;
use std::fmt::Write as _;
use tracing::info;

/// Default tick budget for [`Simulation::run`] callers that have no better bound.
pub const DEFAULT_MAX_TICKS: u64 = 50_000_000;

/// Observable signals after one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceSample {
    /// Tick number, 1 for the first edge after a start.
    pub tick: u64,
    /// Controller mode during the tick.
    pub mode: Mode,
    /// Decision level during the tick.
    pub level: u32,
    /// Clause address under the engine's cursor.
    pub clause_cursor: usize,
    /// The engine's `active_o`.
    pub bcp_active: bool,
    /// Record committed at the edge.
    pub write: Option<VariableRecord>,
    /// `sat` after the edge.
    pub sat: bool,
    /// `done` after the edge.
    pub done: bool,
}

impl TraceSample {
    fn new(tick: u64, report: &TickReport, circuit: &DpllCircuit) -> Self {
        Self {
            tick,
            mode: report.state.mode,
            level: report.state.decision_level,
            clause_cursor: report.clause_cursor,
            bcp_active: report.bcp_active,
            write: report.write,
            sat: circuit.sat(),
            done: circuit.done(),
        }
    }
}

/// Recorded samples, one per tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trace {
    samples: Vec<TraceSample>,
}

impl Trace {
    /// All samples in tick order.
    #[must_use]
    pub fn samples(&self) -> &[TraceSample] {
        &self.samples
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Renders the trace as a fixed-width table, one row per tick.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>8}  {:<9}  {:>5}  {:>6}  {:>3}  {:<14}  {:>3}  {:>4}",
            "tick", "mode", "level", "cursor", "bcp", "write", "sat", "done"
        );
        for s in &self.samples {
            let write = s.write.map_or_else(
                || String::from("-"),
                |w| {
                    let state = if w.assigned { u8::from(w.value).to_string() } else { "X".into() };
                    let kind = if w.is_decision { 'd' } else { 'i' };
                    format!("x{}={state} {kind}@{}", w.address, w.level)
                },
            );
            let _ = writeln!(
                out,
                "{:>8}  {:<9}  {:>5}  {:>6}  {:>3}  {:<14}  {:>3}  {:>4}",
                s.tick,
                s.mode,
                s.level,
                s.clause_cursor,
                u8::from(s.bcp_active),
                write,
                u8::from(s.sat),
                u8::from(s.done),
            );
        }
        out
    }
}

/// Final state of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Sat or Unsat.
    pub result: SolveResult,
    /// Ticks taken since the last start.
    pub ticks: u64,
    /// The circuit's counters at the end.
    pub stats: CircuitStats,
    /// Values by variable id when the instance is satisfiable.
    pub model: Option<BitVec>,
}

impl Outcome {
    /// Whether a model was found.
    #[must_use]
    pub fn is_sat(&self) -> bool {
        self.result == SolveResult::Sat
    }
}

/// Drives a circuit's clock and optionally records a trace.
#[derive(Debug, Clone)]
pub struct Simulation {
    circuit: DpllCircuit,
    trace: Option<Trace>,
    ticks: u64,
}

impl Simulation {
    /// Drives `circuit` from its current state.
    #[must_use]
    pub const fn new(circuit: DpllCircuit) -> Self {
        Self {
            circuit,
            trace: None,
            ticks: 0,
        }
    }

    /// Loads `instance` into a fresh circuit. Without an explicit `config`
    /// the smallest widths that hold the instance are used.
    ///
    /// # Errors
    ///
    /// Fails if the instance does not fit the widths.
    pub fn from_instance(instance: &Instance, config: Option<CircuitConfig>) -> Result<Self, LoadError> {
        let config = match config {
            Some(config) => config,
            None => instance.fit()?,
        };
        let storage: ClauseStorage = instance.to_clause_storage(&config)?;
        Ok(Self::new(DpllCircuit::new(storage)))
    }

    /// Records a [`TraceSample`] for every following tick.
    #[must_use]
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Trace::default());
        self
    }

    /// Advances one tick.
    pub fn step(&mut self) -> TraceSample {
        self.ticks += 1;
        let report = self.circuit.tick();
        let sample = TraceSample::new(self.ticks, &report, &self.circuit);
        if let Some(trace) = &mut self.trace {
            trace.samples.push(sample);
        }
        sample
    }

    /// Drives the `start` input for one tick, returning the circuit to its
    /// start state. The pulse is sample 0 of the new trace.
    pub fn restart(&mut self) -> TraceSample {
        self.ticks = 0;
        let report = self.circuit.tick_with(true);
        let sample = TraceSample::new(self.ticks, &report, &self.circuit);
        if let Some(trace) = &mut self.trace {
            trace.samples.clear();
            trace.samples.push(sample);
        }
        sample
    }

    /// Ticks until `done`, at most `max_ticks` times.
    ///
    /// # Errors
    ///
    /// [`SimulationError::DidNotTerminate`] if the budget runs out first.
    pub fn run(&mut self, max_ticks: u64) -> Result<Outcome, SimulationError> {
        let mut budget = max_ticks;
        while !self.circuit.done() {
            if budget == 0 {
                return Err(SimulationError::DidNotTerminate { ticks: max_ticks });
            }
            budget -= 1;
            self.step();
        }

        let outcome = Outcome {
            result: self.circuit.result(),
            ticks: self.ticks,
            stats: self.circuit.stats(),
            model: self.circuit.model(),
        };
        info!(result = %outcome.result, ticks = outcome.ticks, "circuit done");
        Ok(outcome)
    }

    /// The circuit being driven.
    #[must_use]
    pub const fn circuit(&self) -> &DpllCircuit {
        &self.circuit
    }

    /// The trace, if recording was enabled.
    #[must_use]
    pub const fn trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    /// Ticks driven since construction or the last restart.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Releases the circuit.
    #[must_use]
    pub fn into_circuit(self) -> DpllCircuit {
        self.circuit
    }
}
