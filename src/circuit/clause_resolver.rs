#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Combinational clause classification.
//!
//! The resolver looks at the `K` slots of one clause together with the current
//! `(assigned, value)` bits of each slot's variable and decides, with no state
//! of its own, whether the clause is satisfied, falsified, undetermined, or
//! forces a single remaining literal.
//!
//! All five per-clause facts are folded in one pass of the reduction tree by
//! merging a [`SlotSummary`] per slot:
//!
//! | field             | merge                          |
//! |-------------------|--------------------------------|
//! | `is_sat`          | OR of the real slot atoms      |
//! | `any_real`        | OR of `variable != 0`          |
//! | `open`            | saturating count of open slots |
//! | `open_variable`   | OR of ids masked by "open"     |
//! | `open_negated`    | OR of flags masked by "open"   |
//!
//! The two masked ORs are only meaningful when exactly one slot is open, in
//! which case they read out that slot unchanged.

use crate::circuit::literal::Literal;
use crate::circuit::reduction::{Merge, SaturatingCount, reduce_merge};
use std::fmt;

/// The `(assigned, value)` bits of one variable record, as seen by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SlotValue {
    /// The record holds a value.
    pub assigned: bool,
    /// The value, meaningful only when `assigned`.
    pub value: bool,
}

impl SlotValue {
    /// A free variable.
    pub const UNASSIGNED: Self = Self {
        assigned: false,
        value: false,
    };

    /// A variable holding `value`.
    #[must_use]
    pub const fn assigned(value: bool) -> Self {
        Self {
            assigned: true,
            value,
        }
    }
}

/// Classification of one clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClauseStatus {
    /// At least two literals are still open.
    #[default]
    Unknown,
    /// Every real literal is assigned and false.
    Unsat,
    /// Some literal is true, or the clause is all padding.
    Sat,
    /// Exactly one literal is open and all others are false.
    Unit {
        /// The open literal's variable.
        variable: u32,
        /// The value that makes the open literal true.
        value: bool,
    },
}

impl ClauseStatus {
    /// The two-bit status code driven onto the status wire.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Unsat => 1,
            Self::Sat => 2,
            Self::Unit { .. } => 3,
        }
    }

    /// The literal a unit clause forces.
    #[must_use]
    pub const fn implied(self) -> Option<(u32, bool)> {
        match self {
            Self::Unit { variable, value } => Some((variable, value)),
            _ => None,
        }
    }

    /// Whether every real literal is false.
    #[must_use]
    pub const fn is_unsat(self) -> bool {
        matches!(self, Self::Unsat)
    }
}

impl fmt::Display for ClauseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Unsat => write!(f, "unsat"),
            Self::Sat => write!(f, "sat"),
            Self::Unit { variable, value } => write!(f, "unit x{variable}={}", u8::from(*value)),
        }
    }
}

/// Per-slot facts, merged across the clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotSummary {
    /// Some real literal is true.
    pub is_sat: bool,
    /// Some slot holds a real literal.
    pub any_real: bool,
    /// Open real slots, saturating at two.
    pub open: SaturatingCount,
    /// Variable of the open slots, OR-ed together.
    pub open_variable: u32,
    /// Negation flags of the open slots, OR-ed together.
    pub open_negated: bool,
}

impl SlotSummary {
    /// The summary of a single slot.
    #[must_use]
    pub const fn of(literal: Literal, slot: SlotValue) -> Self {
        let real = !literal.is_sentinel();
        let atom = slot.assigned && literal.eval(slot.value) && real;
        let open = !slot.assigned && real;
        Self {
            is_sat: atom,
            any_real: real,
            open: SaturatingCount::from_flag(open),
            open_variable: if open { literal.variable() } else { 0 },
            open_negated: open && literal.is_negated(),
        }
    }

    /// Classifies a merged summary.
    #[must_use]
    pub const fn status(self) -> ClauseStatus {
        if self.is_sat || !self.any_real {
            return ClauseStatus::Sat;
        }
        match self.open {
            SaturatingCount::Zero => ClauseStatus::Unsat,
            SaturatingCount::Many => ClauseStatus::Unknown,
            SaturatingCount::One => ClauseStatus::Unit {
                variable: self.open_variable,
                value: !self.open_negated,
            },
        }
    }
}

impl Merge for SlotSummary {
    fn merge(self, other: Self) -> Self {
        Self {
            is_sat: self.is_sat | other.is_sat,
            any_real: self.any_real | other.any_real,
            open: self.open.merge(other.open),
            open_variable: self.open_variable | other.open_variable,
            open_negated: self.open_negated | other.open_negated,
        }
    }
}

/// Classifies `literals` against the current variable values.
///
/// `lookup` plays the part of the trail's read ports: one `(assigned, value)`
/// read per slot, addressed by the slot's variable id. Sentinel slots are
/// still looked up, as in hardware, but their result is ignored.
pub fn resolve<F>(literals: &[Literal], lookup: F) -> ClauseStatus
where
    F: Fn(u32) -> SlotValue,
{
    reduce_merge(
        literals
            .iter()
            .map(|&lit| SlotSummary::of(lit, lookup(lit.variable()))),
    )
    .unwrap_or_default()
    .status()
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use proptest::prelude::*;

    const VARS: [u32; 4] = [0x10, 0x11, 0x12, 0x13];

    /// Resolves a four slot clause over `VARS` given per-slot bits.
    fn resolve_slots(negated: [u8; 4], assigned: [u8; 4], values: [u8; 4]) -> ClauseStatus {
        let lits = VARS
            .iter()
            .zip(negated)
            .map(|(&v, n)| Literal::new(v, n == 1))
            .collect_vec();
        resolve(&lits, |var| {
            let i = VARS.iter().position(|&v| v == var).unwrap();
            SlotValue {
                assigned: assigned[i] == 1,
                value: values[i] == 1,
            }
        })
    }

    #[test]
    fn test_sat_and_unsat() {
        let all = [1, 1, 1, 1];
        assert_eq!(resolve_slots([0, 0, 0, 0], all, [1, 0, 0, 0]), ClauseStatus::Sat);
        assert_eq!(resolve_slots([1, 1, 1, 1], all, [0, 0, 0, 0]), ClauseStatus::Sat);
        assert_eq!(resolve_slots([1, 1, 1, 1], all, [1, 1, 1, 1]), ClauseStatus::Unsat);
        assert_eq!(resolve_slots([0, 1, 0, 1], all, [0, 1, 0, 1]), ClauseStatus::Unsat);
        assert_eq!(resolve_slots([0, 0, 0, 0], all, [0, 0, 0, 0]), ClauseStatus::Unsat);
    }

    #[test]
    fn test_unknown() {
        let status = resolve_slots([0, 1, 0, 1], [0, 0, 0, 0], [1, 0, 0, 0]);
        assert_eq!(status, ClauseStatus::Unknown);
        assert_eq!(status.code(), 0);

        let status = resolve_slots([0, 1, 0, 1], [0, 0, 1, 1], [1, 0, 0, 1]);
        assert_eq!(status, ClauseStatus::Unknown);
    }

    #[test]
    fn test_implied_true() {
        let status = resolve_slots([1, 0, 0, 1], [1, 1, 0, 1], [1, 0, 0, 1]);
        assert_eq!(status, ClauseStatus::Unit { variable: 0x12, value: true });
        assert_eq!(status.code(), 3);
        assert_eq!(status.implied(), Some((0x12, true)));
    }

    #[test]
    fn test_implied_false() {
        let status = resolve_slots([1, 1, 0, 1], [1, 0, 1, 1], [1, 0, 0, 1]);
        assert_eq!(status, ClauseStatus::Unit { variable: 0x11, value: false });
    }

    #[test]
    fn test_sentinel_slots_are_ignored() {
        let lits = [Literal::from_i32(-3), Literal::SENTINEL, Literal::SENTINEL];
        // record 0 reads as unassigned but must not count as open
        let status = resolve(&lits, |_| SlotValue::UNASSIGNED);
        assert_eq!(status, ClauseStatus::Unit { variable: 3, value: false });

        let status = resolve(&lits, |v| if v == 3 { SlotValue::assigned(true) } else { SlotValue::UNASSIGNED });
        assert_eq!(status, ClauseStatus::Unsat);
    }

    #[test]
    fn test_sentinel_ignores_record_zero() {
        let lits = [Literal::from_i32(1), Literal::SENTINEL];
        let status = resolve(&lits, |v| if v == 0 { SlotValue::assigned(true) } else { SlotValue::UNASSIGNED });
        assert_eq!(status, ClauseStatus::Unit { variable: 1, value: true });

        let status = resolve(&lits, |v| SlotValue::assigned(v == 0));
        assert_eq!(status, ClauseStatus::Unsat);
    }

    #[test]
    fn test_implied_with_padding_slot() {
        // ¬x11 ∨ x12 ∨ x13 ∨ _, with x11 true and x13 false
        let lits = [
            Literal::new(0x11, true),
            Literal::new(0x12, false),
            Literal::new(0x13, false),
            Literal::new(0, true),
        ];
        let lookup = |v: u32| match v {
            0x11 => SlotValue::assigned(true),
            0x13 => SlotValue::assigned(false),
            0 => SlotValue::assigned(false),
            _ => SlotValue::UNASSIGNED,
        };
        let status = resolve(&lits, lookup);
        assert_eq!(status, ClauseStatus::Unit { variable: 0x12, value: true });
        assert_eq!(status.implied(), Some((0x12, true)));
    }

    #[test]
    fn test_all_padding_is_sat() {
        let lits = [Literal::SENTINEL; 4];
        assert_eq!(resolve(&lits, |_| SlotValue::UNASSIGNED), ClauseStatus::Sat);
        assert_eq!(resolve(&[], |_| SlotValue::UNASSIGNED), ClauseStatus::Sat);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ClauseStatus::Unknown.code(), 0);
        assert_eq!(ClauseStatus::Unsat.code(), 1);
        assert_eq!(ClauseStatus::Sat.code(), 2);
        assert_eq!(ClauseStatus::Sat.implied(), None);
    }

    fn slot_strategy() -> impl Strategy<Value = (i32, Option<bool>)> {
        (
            prop_oneof![Just(0), -6i32..=6],
            prop_oneof![Just(None), any::<bool>().prop_map(Some)],
        )
    }

    proptest! {
        #[test]
        fn prop_matches_direct_evaluation(
            slots in prop::collection::vec(slot_strategy(), 1..6),
            values in prop::collection::vec(prop_oneof![Just(None), any::<bool>().prop_map(Some)], 7),
        ) {
            // per-variable assignment, shared by every slot naming it
            let lits = slots.iter().map(|&(l, _)| Literal::from_i32(l)).collect_vec();
            let lookup = |v: u32| values[v as usize].map_or(SlotValue::UNASSIGNED, SlotValue::assigned);
            let status = resolve(&lits, lookup);

            let real = lits.iter().filter(|l| !l.is_sentinel()).collect_vec();
            let any_true = real.iter().any(|l| values[l.variable() as usize] == Some(l.polarity()));
            let open = real.iter().filter(|l| values[l.variable() as usize].is_none()).collect_vec();

            if real.is_empty() || any_true {
                prop_assert_eq!(status, ClauseStatus::Sat);
            } else if open.is_empty() {
                prop_assert_eq!(status, ClauseStatus::Unsat);
            } else if open.len() == 1 {
                prop_assert_eq!(
                    status,
                    ClauseStatus::Unit { variable: open[0].variable(), value: open[0].polarity() }
                );
            } else {
                prop_assert_eq!(status, ClauseStatus::Unknown);
            }

            if status == ClauseStatus::Sat {
                prop_assert_eq!(status.implied(), None);
            }
        }
    }
}
