//! Small bitsets of boolean attributes attached to rows and columns.

use std::fmt;
use std::marker::PhantomData;

/// One attribute that can be stored in a `Flags` set.
pub trait Flag: Copy + fmt::Debug + 'static {
    /// Every attribute of the family, in bit order.
    const ALL: &'static [Self];
    fn bit(self) -> u8;
}

/// Attributes of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColFlag {
    /// Lower bound is minus infinity.
    LbInf,
    /// Upper bound is plus infinity.
    UbInf,
    Integral,
    /// Integral in every feasible solution without being declared so.
    ImplInt,
    /// Removed from the problem with its value moved into sides and objective.
    Fixed,
    Inactive,
}

/// Attributes of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowFlag {
    LhsInf,
    RhsInf,
    /// Both sides are finite and equal.
    Equation,
    /// Ignored by every reduction and never written.
    Redundant,
}

impl Flag for ColFlag {
    const ALL: &'static [Self] = &[
        ColFlag::LbInf,
        ColFlag::UbInf,
        ColFlag::Integral,
        ColFlag::ImplInt,
        ColFlag::Fixed,
        ColFlag::Inactive,
    ];
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl Flag for RowFlag {
    const ALL: &'static [Self] = &[
        RowFlag::LhsInf,
        RowFlag::RhsInf,
        RowFlag::Equation,
        RowFlag::Redundant,
    ];
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A set of attributes of the family `F`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Flags<F> {
    bits: u8,
    #[serde(skip)]
    phantom: PhantomData<F>,
}

impl<F> Default for Flags<F> {
    fn default() -> Self {
        Self {
            bits: 0,
            phantom: PhantomData,
        }
    }
}

impl<F: Flag> Flags<F> {
    pub fn new(flags: &[F]) -> Self {
        let mut res = Self::default();
        for &flag in flags {
            res.set(flag)
        }
        res
    }
    pub fn test(&self, flag: F) -> bool {
        self.bits & flag.bit() != 0
    }
    /// True if any of `flags` is set.
    pub fn test_any(&self, flags: &[F]) -> bool {
        flags.iter().any(|&f| self.test(f))
    }
    pub fn set(&mut self, flag: F) {
        self.bits |= flag.bit()
    }
    pub fn unset(&mut self, flag: F) {
        self.bits &= !flag.bit()
    }
    pub fn assign(&mut self, flag: F, value: bool) {
        if value { self.set(flag) } else { self.unset(flag) }
    }
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl<F: Flag> fmt::Debug for Flags<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set()
            .entries(F::ALL.iter().filter(|&&flag| self.test(flag)))
            .finish()
    }
}

pub type ColFlags = Flags<ColFlag>;
pub type RowFlags = Flags<RowFlag>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_bits() {
        let mut flags = ColFlags::new(&[ColFlag::LbInf, ColFlag::Integral]);
        assert!(flags.test(ColFlag::LbInf));
        assert!(flags.test(ColFlag::Integral));
        assert!(!flags.test(ColFlag::UbInf));
        flags.set(ColFlag::Fixed);
        flags.unset(ColFlag::LbInf);
        assert!(!flags.test(ColFlag::LbInf));
        assert!(flags.test_any(&[ColFlag::Inactive, ColFlag::Fixed]));
        assert_eq!(format!("{:?}", flags), "{Integral, Fixed}");
    }

    #[test]
    fn assign_and_empty() {
        let mut flags = RowFlags::default();
        assert!(flags.is_empty());
        flags.assign(RowFlag::Redundant, true);
        assert!(flags.test(RowFlag::Redundant));
        flags.assign(RowFlag::Redundant, false);
        assert!(flags.is_empty());
    }
}
