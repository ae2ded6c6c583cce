#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The variable trail.
//!
//! Unlike a software trail this is not a stack: there is exactly one record
//! per variable id, stored at that id, and the search history lives in the
//! `level` and `is_decision` bits of the records themselves. Every question
//! the controller asks ("is anything free?", "has a decision run out of
//! branches?", "what belongs to this level?") is answered by reducing over
//! the whole table in one cycle.
//!
//! Record 0 backs the sentinel literal. It can be read but it is never a
//! candidate in any reduction and is never written.
//!
//! An *exhausted marker* is a record with `assigned = false, value = true`.
//! It is left behind when a decision that was already flipped to true fails
//! again, and tells the next Assign pass that the search must back up past
//! the marker's level.

use crate::circuit::clause_resolver::SlotValue;
use crate::circuit::configs::CircuitConfig;
use crate::circuit::reduction::{Lowest, Merge, Ranked, reduce_merge};
use bit_vec::BitVec;
use std::fmt;
use std::ops::Index;

/// One entry of the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VariableRecord {
    /// The variable holds a value.
    pub assigned: bool,
    /// Its value, or the exhausted flag on an unassigned decision record.
    pub value: bool,
    /// Decision level the record was written at.
    pub level: u32,
    /// The variable id, equal to the record's index.
    pub address: u32,
    /// Written by a decision rather than by propagation.
    pub is_decision: bool,
}

impl VariableRecord {
    /// The power-up state of the record at `address`.
    #[must_use]
    pub const fn fresh(address: u32) -> Self {
        Self {
            assigned: false,
            value: false,
            level: 0,
            address,
            is_decision: false,
        }
    }

    /// A free choice of `false` at `level`.
    #[must_use]
    pub const fn decision(address: u32, level: u32) -> Self {
        Self {
            assigned: true,
            value: false,
            level,
            address,
            is_decision: true,
        }
    }

    /// An assignment forced by propagation.
    #[must_use]
    pub const fn implied(address: u32, value: bool, level: u32) -> Self {
        Self {
            assigned: true,
            value,
            level,
            address,
            is_decision: false,
        }
    }

    /// The decision at `level` after both of its branches have failed.
    #[must_use]
    pub const fn exhausted(address: u32, level: u32) -> Self {
        Self {
            assigned: false,
            value: true,
            level,
            address,
            is_decision: true,
        }
    }

    /// Whether this is an exhausted marker.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        !self.assigned && self.value
    }

    /// The `(assigned, value)` pair the resolver reads.
    #[must_use]
    pub const fn slot_value(&self) -> SlotValue {
        SlotValue {
            assigned: self.assigned,
            value: self.value,
        }
    }

    /// Packs the record into its `2V + 4` bit memory word:
    /// `assigned` at bit 0, `value` at bit 1, the `V + 1` bit level from bit 2,
    /// the `V` bit address above that and `is_decision` on top.
    #[must_use]
    pub const fn pack(&self, var_bits: u32) -> u64 {
        let level_at = 2;
        let address_at = level_at + var_bits + 1;
        let decision_at = address_at + var_bits;
        (self.assigned as u64)
            | ((self.value as u64) << 1)
            | ((self.level as u64) << level_at)
            | ((self.address as u64) << address_at)
            | ((self.is_decision as u64) << decision_at)
    }

    /// Inverse of [`VariableRecord::pack`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn unpack(word: u64, var_bits: u32) -> Self {
        let level_at = 2;
        let address_at = level_at + var_bits + 1;
        let decision_at = address_at + var_bits;
        let level_mask = (1u64 << (var_bits + 1)) - 1;
        let address_mask = (1u64 << var_bits) - 1;
        Self {
            assigned: word & 1 == 1,
            value: (word >> 1) & 1 == 1,
            level: ((word >> level_at) & level_mask) as u32,
            address: ((word >> address_at) & address_mask) as u32,
            is_decision: (word >> decision_at) & 1 == 1,
        }
    }
}

impl Ranked for VariableRecord {
    type Key = u32;

    fn rank(&self) -> u32 {
        self.address
    }
}

impl fmt::Display for VariableRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match (self.assigned, self.value) {
            (true, v) => if v { "1" } else { "0" },
            (false, false) => "-",
            (false, true) => "X",
        };
        let kind = if self.is_decision { "d" } else { " " };
        write!(f, "x{:<4} {state} {kind} @{}", self.address, self.level)
    }
}

/// What a Backtrack step has to do with the record it picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CandidateKind {
    /// An exhausted marker left above the current level. Cleared.
    StaleMarker,
    /// An implication made at the current level. Cleared.
    Implied,
    /// The decision that opened the current level. Flipped or exhausted.
    Decision,
}

/// A record belonging to the current level, as seen by Backtrack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BacktrackCandidate {
    /// What Backtrack does with it.
    pub kind: CandidateKind,
    /// The record itself.
    pub record: VariableRecord,
}

impl BacktrackCandidate {
    /// Classifies `record` relative to `level`.
    #[must_use]
    pub const fn of(record: VariableRecord, level: u32) -> Option<Self> {
        let kind = if record.is_exhausted() && record.level > level {
            CandidateKind::StaleMarker
        } else if record.assigned && record.level == level && !record.is_decision {
            CandidateKind::Implied
        } else if record.assigned && record.level == level && record.is_decision {
            CandidateKind::Decision
        } else {
            return None;
        };
        Some(Self { kind, record })
    }
}

impl Ranked for BacktrackCandidate {
    type Key = (CandidateKind, u32);

    fn rank(&self) -> Self::Key {
        (self.kind, self.record.address)
    }
}

/// The three trail reductions, carried through one tree as a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrailSummary {
    /// Lowest-address exhausted marker.
    pub unassignable: Lowest<VariableRecord>,
    /// Lowest-address unassigned record.
    pub unassigned: Lowest<VariableRecord>,
    /// Highest-priority record belonging to the current level.
    pub current_level: Lowest<BacktrackCandidate>,
}

impl TrailSummary {
    /// Leaf of the tree for one record. The sentinel record contributes nothing.
    #[must_use]
    pub const fn of(record: VariableRecord, level: u32) -> Self {
        if record.address == 0 {
            return Self {
                unassignable: Lowest::new(None),
                unassigned: Lowest::new(None),
                current_level: Lowest::new(None),
            };
        }
        Self {
            unassignable: Lowest::new(if record.is_exhausted() { Some(record) } else { None }),
            unassigned: Lowest::new(if record.assigned { None } else { Some(record) }),
            current_level: Lowest::new(BacktrackCandidate::of(record, level)),
        }
    }
}

impl Merge for TrailSummary {
    fn merge(self, other: Self) -> Self {
        Self {
            unassignable: self.unassignable.merge(other.unassignable),
            unassigned: self.unassigned.merge(other.unassigned),
            current_level: self.current_level.merge(other.current_level),
        }
    }
}

/// Outcome of an Assign pass, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignSignal {
    /// An exhausted marker exists and the level is 0.
    Unsat,
    /// An exhausted marker exists above the root.
    NeedsBacktrack,
    /// Every record is assigned.
    Sat,
    /// Hand over to propagation, committing `decision` first if there is one.
    /// At level 0 there is never a decision.
    ReadyToPropagate {
        /// The fresh decision to write.
        decision: Option<VariableRecord>,
    },
}

/// The trail's combinational outputs for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailSignals {
    /// No record is unassigned.
    pub sat: bool,
    /// An exhausted marker exists at level 0.
    pub unsat: bool,
    /// An exhausted marker exists above level 0.
    pub needs_backtrack: bool,
    /// None of the above.
    pub ready_to_propagate: bool,
    /// The decision Assign would commit.
    pub decision: Option<VariableRecord>,
    /// What Backtrack would act on.
    pub current_level_record: Option<BacktrackCandidate>,
}

impl TrailSignals {
    /// Backtrack still has something to undo at this level.
    #[must_use]
    pub const fn has_record_at_current_level(&self) -> bool {
        self.current_level_record.is_some()
    }

    /// The Assign outputs as one prioritised value.
    #[must_use]
    pub const fn assign(&self) -> AssignSignal {
        if self.unsat {
            AssignSignal::Unsat
        } else if self.needs_backtrack {
            AssignSignal::NeedsBacktrack
        } else if self.sat {
            AssignSignal::Sat
        } else {
            AssignSignal::ReadyToPropagate {
                decision: self.decision,
            }
        }
    }
}

/// One record per variable id, directly indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableTrail {
    var_bits: u32,
    records: Vec<VariableRecord>,
}

impl VariableTrail {
    /// A table of `2^V` fresh records.
    #[must_use]
    pub fn new(config: &CircuitConfig) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let records = (0..config.num_vars())
            .map(|address| VariableRecord::fresh(address as u32))
            .collect();
        Self {
            var_bits: config.var_bits(),
            records,
        }
    }

    /// Returns every record to its power-up state.
    pub fn reset(&mut self) {
        for record in &mut self.records {
            *record = VariableRecord::fresh(record.address);
        }
    }

    /// Read port used by the clause resolver.
    #[must_use]
    pub fn slot_value(&self, variable: u32) -> SlotValue {
        self.records
            .get(variable as usize)
            .map_or(SlotValue::UNASSIGNED, VariableRecord::slot_value)
    }

    /// Commits a write at the address the record carries. Writes to record 0
    /// are dropped.
    pub fn write(&mut self, record: VariableRecord) {
        let address = record.address as usize;
        if address != 0 && address < self.records.len() {
            self.records[address] = record;
        }
    }

    /// Runs the three reductions with `level` as context.
    #[must_use]
    pub fn summarise(&self, level: u32) -> TrailSummary {
        reduce_merge(self.records.iter().map(|&r| TrailSummary::of(r, level))).unwrap_or_default()
    }

    /// The trail outputs for the current cycle.
    #[must_use]
    pub fn evaluate(&self, level: u32) -> TrailSignals {
        let summary = self.summarise(level);
        let exhausted = summary.unassignable.into_inner().is_some();
        let free = summary.unassigned.into_inner();

        let unsat = exhausted && level == 0;
        let needs_backtrack = exhausted && level > 0;
        let sat = !exhausted && free.is_none();
        let ready_to_propagate = !exhausted && free.is_some();
        let decision = free
            .filter(|_| ready_to_propagate && level > 0)
            .map(|record| VariableRecord::decision(record.address, level));

        TrailSignals {
            sat,
            unsat,
            needs_backtrack,
            ready_to_propagate,
            decision,
            current_level_record: summary.current_level.into_inner(),
        }
    }

    /// Variable id width.
    #[must_use]
    pub const fn var_bits(&self) -> u32 {
        self.var_bits
    }

    /// Every record, indexed by variable id.
    #[must_use]
    pub fn records(&self) -> &[VariableRecord] {
        &self.records
    }

    /// The table as packed memory words.
    #[must_use]
    pub fn packed(&self) -> Vec<u64> {
        self.records.iter().map(|r| r.pack(self.var_bits)).collect()
    }

    /// Current values by variable id. Unassigned records read as false.
    #[must_use]
    pub fn model(&self) -> BitVec {
        self.records
            .iter()
            .map(|r| r.assigned && r.value)
            .collect()
    }

    /// Number of records, `2^V`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Never true for a configured trail.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Index<u32> for VariableTrail {
    type Output = VariableRecord;

    fn index(&self, index: u32) -> &Self::Output {
        &self.records[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use proptest::prelude::*;

    fn trail(var_bits: u32) -> VariableTrail {
        VariableTrail::new(&CircuitConfig::new(2, var_bits, 2).unwrap())
    }

    #[test]
    fn test_fresh_trail_is_ready() {
        let t = trail(2);
        assert_eq!(t.len(), 4);

        let root = t.evaluate(0);
        assert!(root.ready_to_propagate);
        assert_eq!(root.decision, None);
        assert_eq!(root.assign(), AssignSignal::ReadyToPropagate { decision: None });

        let first = t.evaluate(1);
        assert_eq!(first.decision, Some(VariableRecord::decision(1, 1)));
        assert!(!first.has_record_at_current_level());
    }

    #[test]
    fn test_sat_when_all_assigned() {
        let mut t = trail(2);
        for address in 1..4 {
            t.write(VariableRecord::implied(address, true, 0));
        }
        let signals = t.evaluate(3);
        assert!(signals.sat);
        assert_eq!(signals.assign(), AssignSignal::Sat);
        assert_eq!(signals.decision, None);
    }

    #[test]
    fn test_sentinel_is_never_written_or_picked() {
        let mut t = trail(1);
        t.write(VariableRecord::implied(0, true, 0));
        assert_eq!(t[0], VariableRecord::fresh(0));

        t.write(VariableRecord::implied(1, false, 0));
        assert!(t.evaluate(1).sat);
    }

    #[test]
    fn test_exhausted_marker_priority() {
        let mut t = trail(3);
        t.write(VariableRecord::exhausted(5, 2));
        t.write(VariableRecord::exhausted(3, 1));

        let summary = t.summarise(1);
        assert_eq!(summary.unassignable.into_inner().map(|r| r.address), Some(3));

        assert_eq!(t.evaluate(0).assign(), AssignSignal::Unsat);
        assert_eq!(t.evaluate(1).assign(), AssignSignal::NeedsBacktrack);
        assert!(!t.evaluate(1).sat);
    }

    #[test]
    fn test_backtrack_candidate_order() {
        let mut t = trail(3);
        t.write(VariableRecord::decision(2, 1));
        t.write(VariableRecord::implied(4, true, 1));
        t.write(VariableRecord::implied(6, false, 1));
        t.write(VariableRecord::exhausted(7, 2));
        t.write(VariableRecord::implied(1, true, 0));

        let pick = |t: &VariableTrail| t.evaluate(1).current_level_record.map(|c| (c.kind, c.record.address));

        assert_eq!(pick(&t), Some((CandidateKind::StaleMarker, 7)));
        t.write(VariableRecord::fresh(7));
        assert_eq!(pick(&t), Some((CandidateKind::Implied, 4)));
        t.write(VariableRecord::fresh(4));
        assert_eq!(pick(&t), Some((CandidateKind::Implied, 6)));
        t.write(VariableRecord::fresh(6));
        assert_eq!(pick(&t), Some((CandidateKind::Decision, 2)));
        t.write(VariableRecord::exhausted(2, 1));
        assert_eq!(pick(&t), None);
    }

    #[test]
    fn test_marker_at_level_is_not_stale() {
        let mut t = trail(2);
        t.write(VariableRecord::exhausted(1, 1));
        assert_eq!(t.evaluate(1).current_level_record, None);
        assert_eq!(
            t.evaluate(0).current_level_record.map(|c| c.kind),
            Some(CandidateKind::StaleMarker)
        );
    }

    #[test]
    fn test_pack_layout() {
        // V = 8: level at [2, 11), address at [11, 19), is_decision at 19
        let record = VariableRecord {
            assigned: true,
            value: false,
            level: 3,
            address: 0x12,
            is_decision: true,
        };
        let word = record.pack(8);
        assert_eq!(word, 1 | (3 << 2) | (0x12 << 11) | (1 << 19));
        assert_eq!(VariableRecord::unpack(word, 8), record);
    }

    #[test]
    fn test_model_and_reset() {
        let mut t = trail(2);
        t.write(VariableRecord::implied(2, true, 0));
        t.write(VariableRecord::exhausted(3, 1));
        let model = t.model();
        assert_eq!(model.iter().collect_vec(), vec![false, false, true, false]);

        t.reset();
        assert!(t.records().iter().enumerate().all(|(i, r)| *r == VariableRecord::fresh(i as u32)));
    }

    fn record_strategy(var_bits: u32) -> impl Strategy<Value = VariableRecord> {
        let addresses = 1u32 << var_bits;
        (any::<bool>(), any::<bool>(), 0u32..6, 0..addresses, any::<bool>()).prop_map(
            |(assigned, value, level, address, is_decision)| VariableRecord {
                assigned,
                value,
                level,
                address,
                is_decision,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_summary_matches_linear_scan(
            writes in prop::collection::vec(record_strategy(4), 0..24),
            level in 0u32..6,
        ) {
            let mut t = trail(4);
            for w in writes {
                t.write(w);
            }
            let real = t.records().iter().skip(1).copied().collect_vec();
            let summary = t.summarise(level);

            prop_assert_eq!(
                summary.unassignable.into_inner(),
                real.iter().find(|r| !r.assigned && r.value).copied()
            );
            prop_assert_eq!(
                summary.unassigned.into_inner(),
                real.iter().find(|r| !r.assigned).copied()
            );

            let expected = real
                .iter()
                .filter_map(|&r| BacktrackCandidate::of(r, level))
                .min_by_key(|c| (c.kind, c.record.address));
            prop_assert_eq!(summary.current_level.into_inner(), expected);
        }

        #[test]
        fn prop_pack_roundtrip(record in record_strategy(5)) {
            prop_assert_eq!(VariableRecord::unpack(record.pack(5), 5), record);
        }
    }
}
