#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! One literal slot of a clause word.
//!
//! A slot is `V + 1` bits wide: the variable id in the low `V` bits and the
//! negation flag above it. Id 0 is reserved as the "no literal here" sentinel
//! used to pad clauses shorter than `K`.

use std::fmt;

/// A variable id with a negation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Literal {
    variable: u32,
    negated: bool,
}

impl Literal {
    /// The padding literal.
    pub const SENTINEL: Self = Self {
        variable: 0,
        negated: false,
    };

    /// A literal over `variable`, negated if `negated` is set.
    #[must_use]
    pub const fn new(variable: u32, negated: bool) -> Self {
        Self { variable, negated }
    }

    /// Builds a literal from its DIMACS form, `-3` meaning "not x3".
    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        Self {
            variable: value.unsigned_abs(),
            negated: value < 0,
        }
    }

    /// The variable id. Zero for the sentinel.
    #[must_use]
    pub const fn variable(self) -> u32 {
        self.variable
    }

    /// Whether the literal reads `¬x`.
    #[must_use]
    pub const fn is_negated(self) -> bool {
        self.negated
    }

    /// The value the variable must take for this literal to be true.
    #[must_use]
    pub const fn polarity(self) -> bool {
        !self.negated
    }

    /// Whether this slot is padding.
    #[must_use]
    pub const fn is_sentinel(self) -> bool {
        self.variable == 0
    }

    /// Truth of the literal when its variable holds `value`.
    #[must_use]
    pub const fn eval(self, value: bool) -> bool {
        value ^ self.negated
    }

    /// The literal's `V + 1` bit slot.
    #[must_use]
    pub const fn pack(self, var_bits: u32) -> u128 {
        (self.variable as u128) | ((self.negated as u128) << var_bits)
    }

    /// Reads a slot back out of its `V + 1` bit form. Bits above the slot are ignored.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn unpack(slot: u128, var_bits: u32) -> Self {
        let mask = (1u128 << var_bits) - 1;
        Self {
            variable: (slot & mask) as u32,
            negated: (slot >> var_bits) & 1 == 1,
        }
    }

    /// DIMACS form. The sentinel maps to 0.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_i32(self) -> i32 {
        let magnitude = self.variable as i32;
        if self.negated { -magnitude } else { magnitude }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentinel() {
            write!(f, "_")
        } else if self.negated {
            write!(f, "¬x{}", self.variable)
        } else {
            write!(f, "x{}", self.variable)
        }
    }
}
