//! Time-varying complex coefficients.
//!
//! A coefficient is a complex number at every instant of the animation. It
//! is either a fixed constant or a point travelling periodically along a
//! circle, a line segment or a rotated ellipse. Products of two
//! coefficients only appear in derived Newton numerators.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FunctionError, Result};
use crate::math::Complex;
use crate::random::{IntRange, ParamRange, random_complex, random_float, random_int, random_pick};

/// Serialization tag of a user-editable coefficient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoefficientType {
    Constant,
    Circle,
    Line,
    Ellipse,
}

impl CoefficientType {
    pub const ALL: [CoefficientType; 4] = [
        CoefficientType::Constant,
        CoefficientType::Circle,
        CoefficientType::Line,
        CoefficientType::Ellipse,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            CoefficientType::Constant => "CONSTANT",
            CoefficientType::Circle => "CIRCLE",
            CoefficientType::Line => "LINE",
            CoefficientType::Ellipse => "ELLIPSE",
        }
    }
}

impl fmt::Display for CoefficientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for CoefficientType {
    type Err = FunctionError;

    fn from_str(s: &str) -> Result<Self> {
        CoefficientType::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| FunctionError::UnknownCoefficientType(s.to_string()))
    }
}

/// Fraction of the current period elapsed at `t`, in `[0, 1)`.
/// A zero duration pins the coefficient to its `t = 0` sample.
fn phase(t: f64, duration: u64) -> f64 {
    if duration == 0 {
        log::warn!("periodic coefficient with zero duration evaluated at t={}", t);
        return 0.0;
    }
    let period = duration as f64;
    t.rem_euclid(period) / period
}

/// Accepts integral or fractional milliseconds; UI code that converts from
/// seconds writes values like `1100.0000000000002`.
fn deserialize_millis<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = f64::deserialize(deserializer)?;
    if !ms.is_finite() || ms < 0.0 {
        return Err(de::Error::custom(format!("invalid duration {}", ms)));
    }
    Ok(ms.round() as u64)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Complex,
    pub radius: f64,
    /// Period in milliseconds.
    #[serde(deserialize_with = "deserialize_millis")]
    pub duration: u64,
}

impl Circle {
    pub fn new(center: Complex, radius: f64, duration: u64) -> Self {
        Circle { center, radius, duration }
    }

    pub fn get_at_time(&self, t: f64) -> Complex {
        let angle = TAU * phase(t, self.duration);
        self.center + Complex::from_polar(self.radius, angle)
    }
}

/// Ping-pong motion: `start` at the beginning of each period, `end` at
/// its middle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Complex,
    pub end: Complex,
    /// Period in milliseconds.
    #[serde(deserialize_with = "deserialize_millis")]
    pub duration: u64,
}

impl Line {
    pub fn new(start: Complex, end: Complex, duration: u64) -> Self {
        Line { start, end, duration }
    }

    pub fn get_at_time(&self, t: f64) -> Complex {
        let p = phase(t, self.duration);
        let s = if p < 0.5 { 2.0 * p } else { 2.0 - 2.0 * p };
        self.start + (self.end - self.start).multiplied_by(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ellipse {
    pub center: Complex,
    pub half_width: f64,
    pub half_height: f64,
    /// Counter-clockwise rotation of the axes, in degrees.
    pub rotation_angle: f64,
    /// Period in milliseconds.
    #[serde(deserialize_with = "deserialize_millis")]
    pub duration: u64,
}

impl Ellipse {
    pub fn new(
        center: Complex,
        half_width: f64,
        half_height: f64,
        rotation_angle: f64,
        duration: u64,
    ) -> Self {
        Ellipse { center, half_width, half_height, rotation_angle, duration }
    }

    pub fn get_at_time(&self, t: f64) -> Complex {
        let angle = TAU * phase(t, self.duration);
        let x = self.half_width * angle.cos();
        let y = self.half_height * angle.sin();
        let (s, c) = self.rotation_angle.to_radians().sin_cos();
        self.center + Complex::new(x * c - y * s, x * s + y * c)
    }
}

/// The UI edits periods in seconds; storage is in milliseconds.
pub trait Periodic {
    fn duration_ms(&self) -> u64;
    fn set_duration_ms(&mut self, duration: u64);

    fn duration_seconds(&self) -> f64 {
        self.duration_ms() as f64 / 1000.0
    }

    fn set_duration_seconds(&mut self, seconds: f64) {
        self.set_duration_ms((seconds * 1000.0).round().max(0.0) as u64);
    }
}

macro_rules! impl_periodic {
    ($($ty:ty),*) => {
        $(impl Periodic for $ty {
            fn duration_ms(&self) -> u64 {
                self.duration
            }

            fn set_duration_ms(&mut self, duration: u64) {
                self.duration = duration;
            }
        })*
    };
}

impl_periodic!(Circle, Line, Ellipse);

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Coefficient {
    Constant(Complex),
    Circle(Circle),
    Line(Line),
    Ellipse(Ellipse),
    /// Product of two coefficients. Only built by the Newton transform and
    /// never persisted.
    #[serde(skip)]
    Multiplication { a: Box<Coefficient>, b: Box<Coefficient> },
}

impl Coefficient {
    pub fn constant(re: f64, im: f64) -> Self {
        Coefficient::Constant(Complex::new(re, im))
    }

    pub fn product(a: Coefficient, b: Coefficient) -> Self {
        Coefficient::Multiplication { a: Box::new(a), b: Box::new(b) }
    }

    /// `None` for derived products.
    pub fn kind(&self) -> Option<CoefficientType> {
        match self {
            Coefficient::Constant(_) => Some(CoefficientType::Constant),
            Coefficient::Circle(_) => Some(CoefficientType::Circle),
            Coefficient::Line(_) => Some(CoefficientType::Line),
            Coefficient::Ellipse(_) => Some(CoefficientType::Ellipse),
            Coefficient::Multiplication { .. } => None,
        }
    }

    pub fn get_at_time(&self, t: f64) -> Complex {
        match self {
            Coefficient::Constant(c) => *c,
            Coefficient::Circle(circle) => circle.get_at_time(t),
            Coefficient::Line(line) => line.get_at_time(t),
            Coefficient::Ellipse(ellipse) => ellipse.get_at_time(t),
            Coefficient::Multiplication { a, b } => {
                a.get_at_time(t).multiplied_by_complex(b.get_at_time(t))
            }
        }
    }

    /// Scales the whole trajectory, so `get_at_time` of the result is
    /// `k` times the original at every instant.
    pub fn multiplied_by(&self, k: f64) -> Coefficient {
        match self {
            Coefficient::Constant(c) => Coefficient::Constant(c.multiplied_by(k)),
            Coefficient::Circle(circle) => Coefficient::Circle(Circle {
                center: circle.center.multiplied_by(k),
                radius: circle.radius * k,
                duration: circle.duration,
            }),
            Coefficient::Line(line) => Coefficient::Line(Line {
                start: line.start.multiplied_by(k),
                end: line.end.multiplied_by(k),
                duration: line.duration,
            }),
            Coefficient::Ellipse(ellipse) => Coefficient::Ellipse(Ellipse {
                center: ellipse.center.multiplied_by(k),
                half_width: ellipse.half_width * k,
                half_height: ellipse.half_height * k,
                rotation_angle: ellipse.rotation_angle,
                duration: ellipse.duration,
            }),
            Coefficient::Multiplication { a, b } => Coefficient::Multiplication {
                a: Box::new(a.multiplied_by(k)),
                b: b.clone(),
            },
        }
    }

    /// Shifts the trajectory by a real scalar. A product cannot absorb a
    /// shift and fails with `DerivedCoefficient`.
    pub fn plus(&self, k: f64) -> Result<Coefficient> {
        let shifted = match self {
            Coefficient::Constant(c) => Coefficient::Constant(c.plus(k)),
            Coefficient::Circle(circle) => Coefficient::Circle(Circle {
                center: circle.center.plus(k),
                ..circle.clone()
            }),
            Coefficient::Line(line) => Coefficient::Line(Line {
                start: line.start.plus(k),
                end: line.end.plus(k),
                duration: line.duration,
            }),
            Coefficient::Ellipse(ellipse) => Coefficient::Ellipse(Ellipse {
                center: ellipse.center.plus(k),
                ..ellipse.clone()
            }),
            Coefficient::Multiplication { .. } => return Err(FunctionError::DerivedCoefficient),
        };
        Ok(shifted)
    }

    /// True when the coefficient is zero at every instant.
    pub fn is_zero(&self) -> bool {
        match self {
            Coefficient::Constant(c) => c.is_zero(),
            Coefficient::Circle(circle) => circle.center.is_zero() && circle.radius == 0.0,
            Coefficient::Line(line) => line.start.is_zero() && line.end.is_zero(),
            Coefficient::Ellipse(ellipse) => {
                ellipse.center.is_zero() && ellipse.half_width == 0.0 && ellipse.half_height == 0.0
            }
            Coefficient::Multiplication { a, b } => a.is_zero() || b.is_zero(),
        }
    }

    /// Only constants pull their sign out in front of a term; moving
    /// coefficients render as a function of `t`.
    pub fn show_minus(&self) -> bool {
        match self {
            Coefficient::Constant(c) => c.show_minus(),
            _ => false,
        }
    }

    pub fn copy(&self) -> Coefficient {
        self.clone()
    }

    /// True when the markup needs parentheses when followed by `z^n`.
    pub(crate) fn needs_parentheses(&self) -> bool {
        match self {
            Coefficient::Constant(c) => c.is_compound(),
            Coefficient::Multiplication { .. } => true,
            _ => false,
        }
    }

    /// `index` becomes the subscript of a moving coefficient, usually its
    /// degree.
    pub fn to_math_ml(&self, index: Option<u32>) -> String {
        let name = |letter: &str| match index {
            Some(i) => format!(
                "<msub><mi>{}</mi><mn>{}</mn></msub><mo>(</mo><mi>t</mi><mo>)</mo>",
                letter, i
            ),
            None => format!("<mi>{}</mi><mo>(</mo><mi>t</mi><mo>)</mo>", letter),
        };
        match self {
            Coefficient::Constant(c) => c.to_math_ml(),
            Coefficient::Circle(_) | Coefficient::Line(_) | Coefficient::Ellipse(_) => name("c"),
            Coefficient::Multiplication { a, b } => format!(
                "<mo>(</mo>{}<mo>)</mo><mo>&#x22C5;</mo><mo>(</mo>{}<mo>)</mo>",
                a.to_math_ml(index),
                b.to_math_ml(index)
            ),
        }
    }

    /// `null` yields `Ok(None)`; any tag other than the four persisted ones
    /// fails with `UnknownCoefficientType`.
    pub fn from_json(value: &Value) -> Result<Option<Coefficient>> {
        if value.is_null() {
            return Ok(None);
        }
        let tag = match value.get("type") {
            Some(Value::String(tag)) => tag.as_str(),
            Some(other) => return Err(FunctionError::UnknownCoefficientType(other.to_string())),
            None => return Err(FunctionError::MissingField("type")),
        };
        let coefficient = match tag.parse::<CoefficientType>()? {
            CoefficientType::Constant => Coefficient::Constant(Complex::deserialize(value)?),
            CoefficientType::Circle => Coefficient::Circle(Circle::deserialize(value)?),
            CoefficientType::Line => Coefficient::Line(Line::deserialize(value)?),
            CoefficientType::Ellipse => Coefficient::Ellipse(Ellipse::deserialize(value)?),
        };
        Ok(Some(coefficient))
    }

    pub fn to_json(&self) -> Result<Value> {
        match self {
            Coefficient::Multiplication { .. } => Err(FunctionError::DerivedCoefficient),
            _ => Ok(serde_json::to_value(self)?),
        }
    }

    /// Picks a type uniformly from `allowed` and draws every field from the
    /// matching range in `ranges`.
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        allowed: &[CoefficientType],
        ranges: &CoefficientRanges,
    ) -> Result<Coefficient> {
        let coefficient = match random_pick(rng, allowed, "coefficient types")? {
            CoefficientType::Constant => {
                Coefficient::Constant(random_complex(rng, ranges.complex_modulus))
            }
            CoefficientType::Circle => Coefficient::Circle(Circle {
                center: random_complex(rng, ranges.center_modulus),
                radius: random_float(rng, ranges.radius),
                duration: random_int(rng, ranges.circle_duration),
            }),
            CoefficientType::Line => Coefficient::Line(Line {
                start: random_complex(rng, ranges.start_end_modulus),
                end: random_complex(rng, ranges.start_end_modulus),
                duration: random_int(rng, ranges.line_duration),
            }),
            CoefficientType::Ellipse => Coefficient::Ellipse(Ellipse {
                center: random_complex(rng, ranges.ellipse_center_modulus),
                half_width: random_float(rng, ranges.half_width),
                half_height: random_float(rng, ranges.half_height),
                rotation_angle: random_float(rng, ranges.rotation_angle),
                duration: random_int(rng, ranges.ellipse_duration),
            }),
        };
        Ok(coefficient)
    }
}

impl From<Complex> for Coefficient {
    fn from(c: Complex) -> Self {
        Coefficient::Constant(c)
    }
}

impl<'de> Deserialize<'de> for Coefficient {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Coefficient::from_json(&value)
            .map_err(de::Error::custom)?
            .ok_or_else(|| de::Error::custom("coefficient must not be null"))
    }
}

/// Bounds for every numeric field a random coefficient can get.
/// Durations are in milliseconds, angles in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoefficientRanges {
    pub complex_modulus: ParamRange,
    pub center_modulus: ParamRange,
    pub radius: ParamRange,
    pub circle_duration: IntRange,
    pub start_end_modulus: ParamRange,
    pub line_duration: IntRange,
    pub ellipse_center_modulus: ParamRange,
    pub half_width: ParamRange,
    pub half_height: ParamRange,
    pub rotation_angle: ParamRange,
    pub ellipse_duration: IntRange,
}

impl Default for CoefficientRanges {
    fn default() -> Self {
        CoefficientRanges {
            complex_modulus: ParamRange::new(0.0, 2.0),
            center_modulus: ParamRange::new(0.0, 1.0),
            radius: ParamRange::new(0.1, 1.0),
            circle_duration: IntRange::new(2_000, 20_000),
            start_end_modulus: ParamRange::new(0.0, 1.5),
            line_duration: IntRange::new(2_000, 20_000),
            ellipse_center_modulus: ParamRange::new(0.0, 1.0),
            half_width: ParamRange::new(0.1, 1.0),
            half_height: ParamRange::new(0.1, 1.0),
            rotation_angle: ParamRange::new(0.0, 360.0),
            ellipse_duration: IntRange::new(2_000, 20_000),
        }
    }
}
