#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The top level controller.
//!
//! A four state machine sequences the trail and the propagation engine:
//!
//! - **Assign** asks the trail what to do next. An exhausted marker means
//!   the search must back up (or, at the root, that the instance is
//!   unsatisfiable); a fully assigned table means a model has been found;
//!   otherwise the lowest free variable is decided `false` and propagation
//!   begins. At level 0 nothing is decided, and the pass only propagates the
//!   clause set itself.
//! - **Propagate** pulses the engine's `start` on entry and waits for it to
//!   drop `active_o`. Success opens the next level, a contradiction moves to
//!   Backtrack at the same level.
//! - **Backtrack** undoes one record per cycle: stale markers from deeper
//!   levels and implications made at this level go first, then the level's
//!   decision is flipped to `true` or, if it already was, marked exhausted.
//!   With nothing left at the level the controller steps down one level.
//! - **Done** latches the result forever.
//!
//! Exactly one unit may write the trail in a cycle, and which one is fixed
//! by the mode: the engine in Propagate, the controller in Assign and
//! Backtrack. Writes land at the end of the cycle and are seen by the next.

use crate::circuit::bcp::{BcpEngine, BcpSignals};
use crate::circuit::clause_storage::ClauseStorage;
use crate::circuit::configs::CircuitConfig;
use crate::circuit::trail::{AssignSignal, CandidateKind, VariableRecord, VariableTrail};
use bit_vec::BitVec;
use std::fmt;
use tracing::{debug, trace};

/// Controller state, with the two bit encoding used on the mode register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(u8)]
pub enum Mode {
    /// Pick the next decision, or finish.
    #[default]
    Assign = 0b00,
    /// Wait for the propagation engine.
    Propagate = 0b01,
    /// Undo the current level one record per cycle.
    Backtrack = 0b10,
    /// Result latched.
    Done = 0b11,
}

impl Mode {
    /// Value of the two-bit mode register.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Assign => "assign",
            Self::Propagate => "propagate",
            Self::Backtrack => "backtrack",
            Self::Done => "done",
        };
        f.pad(name)
    }
}

/// Latched outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SolveResult {
    /// Still running.
    #[default]
    Unknown,
    /// A model was found.
    Sat,
    /// The search space is exhausted.
    Unsat,
}

impl fmt::Display for SolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Sat => write!(f, "SATISFIABLE"),
            Self::Unsat => write!(f, "UNSATISFIABLE"),
        }
    }
}

/// The controller's registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ControllerState {
    /// Current state.
    pub mode: Mode,
    /// Current decision level. Level 0 holds root implications only.
    pub decision_level: u32,
    /// Mode of the previous cycle, used to pulse the engine's `start`.
    pub previous_mode: Mode,
    /// Latched once Done is entered.
    pub result: SolveResult,
}

/// Event counters, updated as each cycle commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CircuitStats {
    /// Clock edges since the last start.
    pub ticks: u64,
    /// Fresh decisions committed in Assign.
    pub decisions: u64,
    /// Decisions flipped from false to true.
    pub flips: u64,
    /// Records written by the propagation engine.
    pub implications: u64,
    /// Propagation runs that ended on an unsat clause.
    pub conflicts: u64,
    /// Complete sweeps over clause memory.
    pub sweeps: u64,
    /// Records cleared in Backtrack.
    pub pops: u64,
    /// Steps down one decision level.
    pub backtracks: u64,
}

/// What happened in one cycle, for traces and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// State the cycle was evaluated in.
    pub state: ControllerState,
    /// Registers after the clock edge.
    pub next: ControllerState,
    /// The engine's cursor during the cycle.
    pub clause_cursor: usize,
    /// `active_o` of the engine during the cycle.
    pub bcp_active: bool,
    /// The record written at the clock edge, if any.
    pub write: Option<VariableRecord>,
}

/// The whole circuit: clause memory, trail, propagation engine and controller.
#[derive(Debug, Clone)]
pub struct DpllCircuit {
    clauses: ClauseStorage,
    trail: VariableTrail,
    bcp: BcpEngine,
    state: ControllerState,
    stats: CircuitStats,
}

impl DpllCircuit {
    /// Powers up the circuit over a loaded clause memory. It is immediately
    /// in the start state.
    #[must_use]
    pub fn new(clauses: ClauseStorage) -> Self {
        Self {
            trail: VariableTrail::new(clauses.config()),
            bcp: BcpEngine::new(&clauses),
            clauses,
            state: ControllerState::default(),
            stats: CircuitStats::default(),
        }
    }

    /// Advances one clock cycle.
    pub fn tick(&mut self) -> TickReport {
        self.tick_with(false)
    }

    /// Advances one clock cycle with the `start` input driven to `start`.
    ///
    /// A start pulse overrides everything else: after the edge the circuit
    /// is back in Assign at level 0 with every record unassigned and the
    /// counters cleared. The clause memory is kept.
    pub fn tick_with(&mut self, start: bool) -> TickReport {
        let state = self.state;
        let cursor = self.bcp.state().clause_cursor;

        if start {
            self.trail.reset();
            self.bcp.reset();
            self.state = ControllerState::default();
            self.stats = CircuitStats::default();
            debug!("start");
            return TickReport {
                state,
                next: self.state,
                clause_cursor: cursor,
                bcp_active: false,
                write: None,
            };
        }

        let level = state.decision_level;
        let bcp_start = state.mode == Mode::Propagate && state.previous_mode != Mode::Propagate;
        let bcp = self.bcp.evaluate(bcp_start, &self.clauses, &self.trail, level);

        let (next, write) = match state.mode {
            Mode::Assign => self.assign(state),
            Mode::Propagate => self.propagate(state, bcp_start, &bcp),
            Mode::Backtrack => self.backtrack(state),
            Mode::Done => (state, None),
        };

        self.stats.ticks += 1;
        if let Some(record) = write {
            self.trail.write(record);
        }
        self.bcp.commit(&bcp);
        self.state = ControllerState {
            previous_mode: state.mode,
            ..next
        };

        if next.mode != state.mode || next.decision_level != level {
            debug!(
                tick = self.stats.ticks,
                from = %state.mode,
                to = %next.mode,
                level = next.decision_level,
                "mode transition"
            );
        }

        TickReport {
            state,
            next: self.state,
            clause_cursor: cursor,
            bcp_active: bcp.active_o,
            write,
        }
    }

    fn assign(&mut self, state: ControllerState) -> (ControllerState, Option<VariableRecord>) {
        let level = state.decision_level;
        match self.trail.evaluate(level).assign() {
            AssignSignal::Unsat => (finish(state, SolveResult::Unsat), None),
            AssignSignal::NeedsBacktrack => (with_mode(state, Mode::Backtrack), None),
            AssignSignal::Sat => (finish(state, SolveResult::Sat), None),
            AssignSignal::ReadyToPropagate { decision } => {
                if let Some(record) = decision {
                    self.stats.decisions += 1;
                    trace!(variable = record.address, level, "decide false");
                }
                (with_mode(state, Mode::Propagate), decision)
            }
        }
    }

    fn propagate(
        &mut self,
        state: ControllerState,
        start: bool,
        bcp: &BcpSignals,
    ) -> (ControllerState, Option<VariableRecord>) {
        if let Some(record) = bcp.write {
            self.stats.implications += 1;
            trace!(
                variable = record.address,
                value = record.value,
                level = record.level,
                clause = self.bcp.state().clause_cursor,
                "implied"
            );
        }
        if bcp.sweep_finished() {
            self.stats.sweeps += 1;
        }

        if start || bcp.active_o {
            (state, bcp.write)
        } else if bcp.status_o {
            self.stats.conflicts += 1;
            (with_mode(state, Mode::Backtrack), None)
        } else {
            // one level per decided record, so the register never wraps
            debug_assert!(state.decision_level < self.config().max_level());
            let next = ControllerState {
                mode: Mode::Assign,
                decision_level: state.decision_level + 1,
                ..state
            };
            (next, None)
        }
    }

    fn backtrack(&mut self, state: ControllerState) -> (ControllerState, Option<VariableRecord>) {
        let level = state.decision_level;
        let Some(candidate) = self.trail.evaluate(level).current_level_record else {
            if level == 0 {
                return (finish(state, SolveResult::Unsat), None);
            }
            self.stats.backtracks += 1;
            let next = ControllerState {
                mode: Mode::Assign,
                decision_level: level - 1,
                ..state
            };
            return (next, None);
        };

        let record = candidate.record;
        match candidate.kind {
            CandidateKind::StaleMarker | CandidateKind::Implied => {
                self.stats.pops += 1;
                trace!(variable = record.address, level = record.level, "pop");
                (state, Some(VariableRecord::fresh(record.address)))
            }
            CandidateKind::Decision if !record.value => {
                self.stats.flips += 1;
                trace!(variable = record.address, level, "flip to true");
                let flipped = VariableRecord {
                    value: true,
                    ..record
                };
                (with_mode(state, Mode::Propagate), Some(flipped))
            }
            CandidateKind::Decision => {
                trace!(variable = record.address, level, "exhausted");
                let marker = VariableRecord::exhausted(record.address, level);
                (with_mode(state, Mode::Assign), Some(marker))
            }
        }
    }

    /// Ticks until `done`, giving up after `max_ticks`.
    ///
    /// Returns the latched result, or `None` if the budget ran out.
    pub fn run_until_done(&mut self, max_ticks: u64) -> Option<SolveResult> {
        for _ in 0..max_ticks {
            if self.done() {
                break;
            }
            self.tick();
        }
        self.done().then_some(self.state.result)
    }

    /// The `sat` output.
    #[must_use]
    pub fn sat(&self) -> bool {
        self.state.mode == Mode::Done && self.state.result == SolveResult::Sat
    }

    /// The `done` output.
    #[must_use]
    pub fn done(&self) -> bool {
        self.state.mode == Mode::Done
    }

    /// The latched result, `Unknown` until done.
    #[must_use]
    pub const fn result(&self) -> SolveResult {
        self.state.result
    }

    /// The controller registers.
    #[must_use]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Current decision level.
    #[must_use]
    pub const fn decision_level(&self) -> u32 {
        self.state.decision_level
    }

    /// Counters since the last start.
    #[must_use]
    pub const fn stats(&self) -> CircuitStats {
        self.stats
    }

    /// The variable record table, for diagnostics.
    #[must_use]
    pub fn records(&self) -> &[VariableRecord] {
        self.trail.records()
    }

    /// The variable trail.
    #[must_use]
    pub const fn trail(&self) -> &VariableTrail {
        &self.trail
    }

    /// The clause memory.
    #[must_use]
    pub const fn clauses(&self) -> &ClauseStorage {
        &self.clauses
    }

    /// The widths the circuit was built with.
    #[must_use]
    pub const fn config(&self) -> &CircuitConfig {
        self.clauses.config()
    }

    /// The propagation engine.
    #[must_use]
    pub const fn bcp(&self) -> &BcpEngine {
        &self.bcp
    }

    /// The satisfying assignment, indexed by variable id, once `sat` is raised.
    #[must_use]
    pub fn model(&self) -> Option<BitVec> {
        self.sat().then(|| self.trail.model())
    }
}

const fn with_mode(state: ControllerState, mode: Mode) -> ControllerState {
    ControllerState { mode, ..state }
}

const fn finish(state: ControllerState, result: SolveResult) -> ControllerState {
    ControllerState {
        mode: Mode::Done,
        result,
        ..state
    }
}
