#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Unit propagation engine.
//!
//! The engine walks a cursor over every clause address, one address per
//! cycle, and writes the literal forced by each unit clause straight into the
//! trail. A sweep that wrote anything is followed immediately by another; the
//! first sweep with no writes ends the run successfully, and the first UNSAT
//! clause ends it with a contradiction.
//!
//! Three registers hold the state: `clause_cursor`, `active` and
//! `progressed_this_pass`. The cursor wraps to 0 whenever a sweep ends, a run
//! starts, or a contradiction is seen. At that moment `active` for the next
//! cycle is computed from the *in-flight* write as well as the accumulated
//! flag, so a write made on the very last address of a sweep still starts the
//! next sweep without an idle cycle in between.
//!
//! With one clause at address `0xAA` in a 256 address memory, a run takes one
//! start cycle, 256 cycles for the sweep that writes, 256 cycles for the sweep
//! that confirms nothing changed, and the controller sees `active_o` low on
//! the cycle after that.

use crate::circuit::clause_resolver::{ClauseStatus, resolve};
use crate::circuit::clause_storage::ClauseStorage;
use crate::circuit::trail::{VariableRecord, VariableTrail};

/// The engine's registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BcpState {
    /// Address of the clause presented to the resolver.
    pub clause_cursor: usize,
    /// The engine is sweeping.
    pub active: bool,
    /// Some clause of the current sweep produced a write.
    pub progressed_this_pass: bool,
}

/// Combinational outputs for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcpSignals {
    /// The engine is still running after this cycle's clause.
    pub active_o: bool,
    /// The clause under the cursor is UNSAT.
    pub status_o: bool,
    /// Classification of the clause under the cursor, if the engine is active.
    pub clause_status: Option<ClauseStatus>,
    /// The implication to commit this cycle.
    pub write: Option<VariableRecord>,
    /// The cursor is on the last address.
    pub iteration_finished: bool,
    /// The registers reload this cycle.
    pub reset: bool,
    /// `active` for the next cycle.
    pub next_active: bool,
}

impl BcpSignals {
    /// True on the cycle that finishes a sweep while running.
    #[must_use]
    pub const fn sweep_finished(&self) -> bool {
        self.iteration_finished && self.clause_status.is_some() && !self.status_o
    }
}

/// Sequential propagation unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BcpEngine {
    state: BcpState,
    last_address: usize,
}

impl BcpEngine {
    /// An idle engine sized for `clauses`.
    #[must_use]
    pub const fn new(clauses: &ClauseStorage) -> Self {
        Self {
            state: BcpState {
                clause_cursor: 0,
                active: false,
                progressed_this_pass: false,
            },
            last_address: clauses.len() - 1,
        }
    }

    /// The registers as of the last clock edge.
    #[must_use]
    pub const fn state(&self) -> BcpState {
        self.state
    }

    /// Returns the registers to their power-up values.
    pub fn reset(&mut self) {
        self.state = BcpState::default();
    }

    /// Computes this cycle's outputs from the current registers.
    ///
    /// `level` is the controller's decision level, stamped on every write.
    #[must_use]
    pub fn evaluate(
        &self,
        start: bool,
        clauses: &ClauseStorage,
        trail: &VariableTrail,
        level: u32,
    ) -> BcpSignals {
        let BcpState {
            clause_cursor,
            active,
            progressed_this_pass,
        } = self.state;

        let clause_status =
            active.then(|| resolve(clauses.read(clause_cursor), |v| trail.slot_value(v)));

        let contradiction = clause_status.is_some_and(ClauseStatus::is_unsat);
        let write = clause_status
            .and_then(ClauseStatus::implied)
            .map(|(variable, value)| VariableRecord::implied(variable, value, level));
        let writing = write.is_some();

        let iteration_finished = clause_cursor == self.last_address;
        let reset = iteration_finished || start || contradiction;
        let next_active = if reset {
            start || ((progressed_this_pass || writing) && !contradiction)
        } else {
            active
        };

        BcpSignals {
            active_o: active && !contradiction,
            status_o: contradiction,
            clause_status,
            write,
            iteration_finished,
            reset,
            next_active,
        }
    }

    /// Clocks the registers with the outputs `evaluate` produced this cycle.
    pub fn commit(&mut self, signals: &BcpSignals) {
        let writing = signals.write.is_some();
        self.state = if signals.reset {
            BcpState {
                clause_cursor: 0,
                active: signals.next_active,
                progressed_this_pass: false,
            }
        } else {
            BcpState {
                clause_cursor: self.state.clause_cursor + usize::from(self.state.active),
                active: signals.next_active,
                progressed_this_pass: self.state.progressed_this_pass || writing,
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::configs::CircuitConfig;
    use crate::circuit::literal::Literal;

    struct Bench {
        clauses: ClauseStorage,
        trail: VariableTrail,
        bcp: BcpEngine,
    }

    impl Bench {
        fn new(config: CircuitConfig, clauses: &[(usize, &[i32])]) -> Self {
            let mut store = ClauseStorage::new(config);
            for (id, lits) in clauses {
                let lits: Vec<Literal> = lits.iter().map(|&l| Literal::from_i32(l)).collect();
                store.load(*id, &lits).unwrap();
            }
            Self {
                bcp: BcpEngine::new(&store),
                trail: VariableTrail::new(&config),
                clauses: store,
            }
        }

        /// One clock edge. Writes land after the evaluation, as in hardware.
        fn tick(&mut self, start: bool) -> BcpSignals {
            let signals = self.bcp.evaluate(start, &self.clauses, &self.trail, 0);
            if let Some(write) = signals.write {
                self.trail.write(write);
            }
            self.bcp.commit(&signals);
            signals
        }
    }

    #[test]
    fn test_single_clause_timing() {
        let config = CircuitConfig::new(8, 8, 4).unwrap();
        let mut bench = Bench::new(config, &[(0xAA, &[0x12])]);

        let first = bench.tick(true);
        assert!(!first.active_o);
        assert!(bench.bcp.state().active);

        for cursor in 0..0xAA {
            let s = bench.tick(false);
            assert!(s.active_o, "cursor {cursor}");
            assert_eq!(s.write, None);
        }

        let s = bench.tick(false);
        assert_eq!(s.write, Some(VariableRecord::implied(0x12, true, 0)));
        assert!(s.active_o);

        for _ in 0xAB..0x100 {
            let s = bench.tick(false);
            assert!(s.active_o);
            assert_eq!(s.write, None);
        }
        // the write carried the engine into a second sweep with no idle cycle
        assert!(bench.bcp.state().active);
        assert_eq!(bench.bcp.state().clause_cursor, 0);

        for _ in 0..0x100 {
            let s = bench.tick(false);
            assert!(s.active_o);
            assert_eq!(s.write, None);
        }

        let done = bench.tick(false);
        assert!(!done.active_o);
        assert!(!done.status_o);
        assert!(bench.trail[0x12].assigned);
    }

    #[test]
    fn test_write_on_last_address_forwards() {
        let config = CircuitConfig::new(2, 3, 2).unwrap();
        let mut bench = Bench::new(config, &[(3, &[-5])]);

        bench.tick(true);
        for _ in 0..3 {
            bench.tick(false);
        }
        let last = bench.tick(false);
        assert!(last.iteration_finished);
        assert!(last.write.is_some());
        assert!(last.next_active);

        for _ in 0..4 {
            assert!(bench.tick(false).active_o);
        }
        assert!(!bench.tick(false).active_o);
        assert!(!bench.trail[5].value);
    }

    #[test]
    fn test_chain_fixpoint() {
        let config = CircuitConfig::new(3, 3, 4).unwrap();
        let mut bench = Bench::new(
            config,
            &[
                (1, &[1]),
                (2, &[2, -1]),
                (3, &[3, -2, -1]),
                (4, &[4, -3, -2, -1]),
            ],
        );

        let mut writes = Vec::new();
        bench.tick(true);
        let mut ticks = 1;
        loop {
            let s = bench.tick(false);
            ticks += 1;
            if let Some(w) = s.write {
                writes.push(w.address);
            }
            if !s.active_o {
                assert!(!s.status_o);
                break;
            }
        }

        assert_eq!(writes, vec![1, 2, 3, 4]);
        // start, a sweep that implies everything, a quiet sweep, then idle
        assert_eq!(ticks, 1 + 8 + 8 + 1);
        for v in 1..=4 {
            assert!(bench.trail[v].assigned && bench.trail[v].value);
            assert!(!bench.trail[v].is_decision);
        }
    }

    #[test]
    fn test_contradiction_stops_sweep() {
        let config = CircuitConfig::new(3, 2, 2).unwrap();
        let mut bench = Bench::new(config, &[(0, &[1]), (2, &[-1]), (5, &[2])]);

        bench.tick(true);
        let s = bench.tick(false);
        assert_eq!(s.write.map(|w| w.address), Some(1));

        assert!(bench.tick(false).active_o);
        let s = bench.tick(false);
        assert_eq!(s.clause_status, Some(ClauseStatus::Unsat));
        assert!(s.status_o);
        assert!(!s.active_o);

        // the clause at address 5 is never reached
        assert!(!bench.tick(false).active_o);
        assert!(!bench.trail[2].assigned);
        assert_eq!(bench.bcp.state(), BcpState::default());
    }

    #[test]
    fn test_idle_engine_does_nothing() {
        let config = CircuitConfig::new(2, 2, 2).unwrap();
        let mut bench = Bench::new(config, &[(0, &[1])]);
        for _ in 0..10 {
            let s = bench.tick(false);
            assert!(!s.active_o);
            assert_eq!(s.write, None);
        }
        assert_eq!(bench.bcp.state(), BcpState::default());
    }
}
