//! Arithmetic types and tolerance-aware comparisons.

use num::{BigRational, FromPrimitive, Signed, ToPrimitive};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::{Debug, Display};

/// A number type in which problems can be stored and reduced.
///
/// Every algorithm of the crate is written against this trait. It is implemented
/// for `f64` and for the exact `BigRational`.
pub trait Real:
    Clone
    + Debug
    + Display
    + PartialOrd
    + Signed
    + FromPrimitive
    + ToPrimitive
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Largest integer not greater than `self`.
    fn floor(&self) -> Self;
    /// Smallest integer not lower than `self`.
    fn ceil(&self) -> Self;
    /// Nearest integer, half-way cases rounded away from zero.
    fn round(&self) -> Self;
    /// Conversion used when reading numbers from text files.
    fn parse_real(s: &str) -> Option<Self> {
        s.trim().parse::<f64>().ok().and_then(Self::from_f64)
    }
}

impl Real for f64 {
    fn floor(&self) -> Self {
        f64::floor(*self)
    }
    fn ceil(&self) -> Self {
        f64::ceil(*self)
    }
    fn round(&self) -> Self {
        f64::round(*self)
    }
}

impl Real for BigRational {
    fn floor(&self) -> Self {
        BigRational::floor(self)
    }
    fn ceil(&self) -> Self {
        BigRational::ceil(self)
    }
    fn round(&self) -> Self {
        BigRational::round(self)
    }
    // Accepts both "p/q" and decimal literals.
    fn parse_real(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.contains('/') {
            s.parse::<BigRational>().ok()
        } else {
            s.parse::<f64>().ok().and_then(Self::from_f64)
        }
    }
}

/// Numerical tolerances and the comparisons built on them.
///
/// Three thresholds are used:
/// * `epsilon` for plain equality of numbers,
/// * `feastol` for feasibility of activities and bounds,
/// * `zeta`, the coarser tolerance deciding whether an element is admissible
///   for a reduction.
#[derive(Clone, Debug, PartialEq)]
pub struct Num<N> {
    epsilon: N,
    feastol: N,
    zeta: N,
}

impl<N: Real> Default for Num<N> {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_EPSILON,
            Self::DEFAULT_FEASTOL,
            Self::DEFAULT_ZETA,
        )
    }
}

impl<N: Real> Num<N> {
    pub const DEFAULT_EPSILON: f64 = 1e-9;
    pub const DEFAULT_FEASTOL: f64 = 1e-6;
    pub const DEFAULT_ZETA: f64 = 1e-4;

    /// Create the tolerances from their floating point values.
    pub fn new(epsilon: f64, feastol: f64, zeta: f64) -> Self {
        let convert = |x: f64| N::from_f64(x.abs()).unwrap_or_else(N::zero);
        Self {
            epsilon: convert(epsilon),
            feastol: convert(feastol),
            zeta: convert(zeta),
        }
    }
    pub fn epsilon(&self) -> &N {
        &self.epsilon
    }
    pub fn feastol(&self) -> &N {
        &self.feastol
    }
    pub fn zeta(&self) -> &N {
        &self.zeta
    }

    fn within(a: &N, b: &N, tol: &N) -> bool {
        (a.clone() - b.clone()).abs() <= *tol
    }

    pub fn is_eq(&self, a: &N, b: &N) -> bool {
        Self::within(a, b, &self.epsilon)
    }
    pub fn is_zero(&self, a: &N) -> bool {
        a.abs() <= self.epsilon
    }
    pub fn is_ge(&self, a: &N, b: &N) -> bool {
        a.clone() - b.clone() >= -self.epsilon.clone()
    }
    pub fn is_le(&self, a: &N, b: &N) -> bool {
        a.clone() - b.clone() <= self.epsilon
    }
    pub fn is_gt(&self, a: &N, b: &N) -> bool {
        a.clone() - b.clone() > self.epsilon
    }
    pub fn is_lt(&self, a: &N, b: &N) -> bool {
        a.clone() - b.clone() < -self.epsilon.clone()
    }
    pub fn is_integral(&self, a: &N) -> bool {
        self.is_eq(a, &a.round())
    }

    pub fn is_feas_eq(&self, a: &N, b: &N) -> bool {
        Self::within(a, b, &self.feastol)
    }
    pub fn is_feas_ge(&self, a: &N, b: &N) -> bool {
        a.clone() - b.clone() >= -self.feastol.clone()
    }
    pub fn is_feas_le(&self, a: &N, b: &N) -> bool {
        a.clone() - b.clone() <= self.feastol
    }
    /// Floor that does not jump down for values slightly below an integer.
    pub fn feas_floor(&self, a: &N) -> N {
        (a.clone() + self.feastol.clone()).floor()
    }
    /// Ceil that does not jump up for values slightly above an integer.
    pub fn feas_ceil(&self, a: &N) -> N {
        (a.clone() - self.feastol.clone()).ceil()
    }

    pub fn is_zeta_eq(&self, a: &N, b: &N) -> bool {
        Self::within(a, b, &self.zeta)
    }
    pub fn is_zeta_zero(&self, a: &N) -> bool {
        a.abs() <= self.zeta
    }
    pub fn is_zeta_ge(&self, a: &N, b: &N) -> bool {
        a.clone() - b.clone() >= -self.zeta.clone()
    }
    pub fn is_zeta_lt(&self, a: &N, b: &N) -> bool {
        a.clone() - b.clone() < -self.zeta.clone()
    }
    pub fn is_zeta_integral(&self, a: &N) -> bool {
        self.is_zeta_eq(a, &a.round())
    }

    pub fn round(&self, a: &N) -> N {
        a.round()
    }
}

/// Smaller of two partially ordered numbers.
pub(crate) fn min<N: Real>(a: N, b: N) -> N {
    if b < a { b } else { a }
}

/// Larger of two partially ordered numbers.
pub(crate) fn max<N: Real>(a: N, b: N) -> N {
    if b > a { b } else { a }
}
