use std::collections::BTreeMap;

use rand::Rng;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coefficient::{Coefficient, CoefficientRanges, CoefficientType};
use crate::error::{FunctionError, Result};
use crate::math::Complex;

/// Highest power of `z` a polynomial may carry.
pub const MAX_DEGREE: u32 = 15;

/// Sparse polynomial in `z` with time-varying coefficients.
///
/// Absent degrees are zero. `update_with_time` samples every coefficient and
/// keeps the result; the array readers only ever see that sample.
#[derive(Clone, Debug, Default)]
pub struct Polynomial {
    terms: BTreeMap<u32, Coefficient>,
    snapshot: Vec<(u32, Complex)>,
    sampled_at: Option<f64>,
}

impl PartialEq for Polynomial {
    fn eq(&self, other: &Self) -> bool {
        self.terms == other.terms
    }
}

fn check_degree(degree: u32) -> Result<()> {
    if degree > MAX_DEGREE {
        return Err(FunctionError::DegreeOutOfRange(degree));
    }
    Ok(())
}

impl Polynomial {
    pub fn new() -> Self {
        Polynomial::default()
    }

    /// The constant polynomial `1`.
    pub fn one() -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(0, Coefficient::Constant(Complex::ONE));
        Polynomial { terms, ..Polynomial::default() }
    }

    /// `z²`, the classic quadratic map.
    pub fn z_squared() -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(2, Coefficient::Constant(Complex::ONE));
        Polynomial { terms, ..Polynomial::default() }
    }

    pub fn from_terms<I>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, Coefficient)>,
    {
        let mut polynomial = Polynomial::new();
        for (degree, coefficient) in terms {
            polynomial.set_coefficient(degree, coefficient)?;
        }
        Ok(polynomial)
    }

    pub fn get_coefficient(&self, degree: u32) -> Option<&Coefficient> {
        self.terms.get(&degree)
    }

    pub fn set_coefficient(&mut self, degree: u32, value: Coefficient) -> Result<()> {
        check_degree(degree)?;
        self.terms.insert(degree, value);
        Ok(())
    }

    pub fn remove_coefficient(&mut self, degree: u32) -> Option<Coefficient> {
        self.terms.remove(&degree)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Used degrees in ascending order.
    pub fn degrees(&self) -> impl Iterator<Item = u32> + '_ {
        self.terms.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Coefficient)> + '_ {
        self.terms.iter().map(|(&degree, c)| (degree, c))
    }

    /// Degrees in `[0, MAX_DEGREE]` that do not have a coefficient yet.
    pub fn get_available_powers(&self) -> Vec<u32> {
        (0..=MAX_DEGREE)
            .filter(|degree| !self.terms.contains_key(degree))
            .collect()
    }

    /// Term-wise derivative: `(n, c)` becomes `(n - 1, n·c)`, constants vanish.
    pub fn get_derivative(&self) -> Polynomial {
        let terms = self
            .terms
            .iter()
            .filter(|&(&degree, _)| degree >= 1)
            .map(|(&degree, c)| (degree - 1, c.multiplied_by(degree as f64)))
            .collect();
        Polynomial { terms, ..Polynomial::default() }
    }

    pub fn update_with_time(&mut self, t: f64) {
        self.snapshot = self
            .terms
            .iter()
            .map(|(&degree, c)| (degree, c.get_at_time(t)))
            .collect();
        self.sampled_at = Some(t);
    }

    /// Time of the last `update_with_time`, if any.
    pub fn sampled_at(&self) -> Option<f64> {
        self.sampled_at
    }

    /// `(degree, value)` pairs from the last `update_with_time`, ascending.
    pub fn get_coefficients_parameters(&self) -> &[(u32, Complex)] {
        &self.snapshot
    }

    /// Flat `[degree, re, im, ...]` layout of the last sample.
    pub fn get_array_representation(&self) -> Vec<f64> {
        self.snapshot
            .iter()
            .flat_map(|&(degree, c)| [degree as f64, c.re, c.im])
            .collect()
    }

    /// Value of the last sampled polynomial at `z`.
    pub fn evaluate(&self, z: Complex) -> Complex {
        self.snapshot
            .iter()
            .fold(Complex::ZERO, |acc, &(degree, c)| acc + c * z.powi(degree))
    }

    pub fn to_math_ml(&self) -> String {
        if self.terms.is_empty() {
            return "<mrow><mn>0</mn></mrow>".to_string();
        }
        let mut out = String::new();
        for (i, (&degree, coefficient)) in self.terms.iter().rev().enumerate() {
            let negative = coefficient.show_minus();
            let shown = if negative {
                coefficient.multiplied_by(-1.0)
            } else {
                coefficient.clone()
            };
            if negative {
                out.push_str("<mo>-</mo>");
            } else if i > 0 {
                out.push_str("<mo>+</mo>");
            }

            let is_one = shown == Coefficient::Constant(Complex::ONE);
            if degree == 0 || !is_one {
                let markup = shown.to_math_ml(Some(degree));
                if degree > 0 && shown.needs_parentheses() {
                    out.push_str(&format!("<mo>(</mo>{}<mo>)</mo>", markup));
                } else {
                    out.push_str(&markup);
                }
            }

            match degree {
                0 => {}
                1 => out.push_str("<mi>z</mi>"),
                n => out.push_str(&format!("<msup><mi>z</mi><mn>{}</mn></msup>", n)),
            }
        }
        format!("<mrow>{}</mrow>", out)
    }

    pub fn from_json(value: &Value) -> Result<Polynomial> {
        let object = value
            .as_object()
            .ok_or_else(|| FunctionError::InvalidDegree(value.to_string()))?;
        let mut polynomial = Polynomial::new();
        for (key, coefficient) in object {
            let degree: u32 = key
                .trim()
                .parse()
                .map_err(|_| FunctionError::InvalidDegree(key.clone()))?;
            if let Some(coefficient) = Coefficient::from_json(coefficient)? {
                polynomial.set_coefficient(degree, coefficient)?;
            }
        }
        Ok(polynomial)
    }

    pub fn to_json(&self) -> Result<Value> {
        let mut object = Map::new();
        for (degree, coefficient) in &self.terms {
            object.insert(degree.to_string(), coefficient.to_json()?);
        }
        Ok(Value::Object(object))
    }

    /// `count` distinct degrees drawn without replacement, each with a
    /// random coefficient.
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        count: usize,
        allowed: &[CoefficientType],
        ranges: &CoefficientRanges,
    ) -> Result<Polynomial> {
        let slots = (MAX_DEGREE + 1) as usize;
        let count = if count > slots {
            log::warn!("polynomial of {} terms requested, clamping to {}", count, slots);
            slots
        } else {
            count
        };
        let mut polynomial = Polynomial::new();
        for degree in rand::seq::index::sample(rng, slots, count).into_iter() {
            let coefficient = Coefficient::random(rng, allowed, ranges)?;
            polynomial.set_coefficient(degree as u32, coefficient)?;
        }
        Ok(polynomial)
    }
}

impl Serialize for Polynomial {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.terms.len()))?;
        for (degree, coefficient) in &self.terms {
            map.serialize_entry(&degree.to_string(), coefficient)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Polynomial {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Polynomial::from_json(&value).map_err(de::Error::custom)
    }
}
