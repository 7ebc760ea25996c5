//! Uniform sampling primitives shared by every random constructor.
//!
//! All functions take the generator explicitly so that a seeded
//! `StdRng` reproduces the same function tree.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{FunctionError, Result};
use crate::math::Complex;

/// Closed real interval `[min, max]`. Reversed bounds are accepted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub fn new(min: f64, max: f64) -> Self {
        ParamRange { min, max }
    }

    pub fn contains(&self, x: f64) -> bool {
        let (lo, hi) = self.bounds();
        lo <= x && x <= hi
    }

    fn bounds(&self) -> (f64, f64) {
        (self.min.min(self.max), self.min.max(self.max))
    }
}

/// Closed integer interval `[min, max]`. Reversed bounds are accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: u64,
    pub max: u64,
}

impl IntRange {
    pub fn new(min: u64, max: u64) -> Self {
        IntRange { min, max }
    }

    pub fn contains(&self, x: u64) -> bool {
        self.min.min(self.max) <= x && x <= self.min.max(self.max)
    }
}

pub fn random_float<R: Rng + ?Sized>(rng: &mut R, range: ParamRange) -> f64 {
    let (lo, hi) = range.bounds();
    if lo == hi {
        return lo;
    }
    rng.gen_range(lo..=hi)
}

pub fn random_int<R: Rng + ?Sized>(rng: &mut R, range: IntRange) -> u64 {
    rng.gen_range(range.min.min(range.max)..=range.min.max(range.max))
}

/// Picks one element uniformly. `what` names the set in the error.
pub fn random_pick<'a, R: Rng + ?Sized, T>(
    rng: &mut R,
    items: &'a [T],
    what: &'static str,
) -> Result<&'a T> {
    items.choose(rng).ok_or(FunctionError::EmptyChoice(what))
}

/// Complex number with modulus drawn from `modulus` and a uniform argument.
pub fn random_complex<R: Rng + ?Sized>(rng: &mut R, modulus: ParamRange) -> Complex {
    let r = random_float(rng, modulus);
    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    Complex::from_polar(r, angle)
}
