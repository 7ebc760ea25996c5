//! The iterated function `f(z)` of the Julia set.
//!
//! Three families share one representation:
//!
//! * `DEFAULT`:  `f(z) = P(z)`, the denominator is the constant `1`.
//! * `NEWTON`:   `f(z) = z - a·P(z)/P'(z)`. Over the common denominator
//!   `P'(z)` this is `Σ cₙ·(n - a)·zⁿ / P'(z)`, so the renderer still sees
//!   one polynomial fraction. Denominator and transformed numerator are
//!   derived from `P` and `a` on every edit.
//! * `FRACTION`: `f(z) = P(z)/Q(z)` with both polynomials user-edited.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coefficient::{Coefficient, CoefficientRanges, CoefficientType};
use crate::error::{FunctionError, Result};
use crate::math::Complex;
use crate::polynomial::Polynomial;
use crate::random::{IntRange, random_int, random_pick};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionType {
    Default,
    Newton,
    Fraction,
}

impl FunctionType {
    pub const ALL: [FunctionType; 3] =
        [FunctionType::Default, FunctionType::Newton, FunctionType::Fraction];

    pub fn name(&self) -> &'static str {
        match self {
            FunctionType::Default => "DEFAULT",
            FunctionType::Newton => "NEWTON",
            FunctionType::Fraction => "FRACTION",
        }
    }

    /// Whether the denominator can be edited directly.
    pub fn has_free_denominator(&self) -> bool {
        *self == FunctionType::Fraction
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FunctionType {
    type Err = FunctionError;

    fn from_str(s: &str) -> Result<Self> {
        FunctionType::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| FunctionError::InvalidFunctionType(s.to_string()))
    }
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameParameters {
    pub numerator: Vec<f64>,
    pub denominator: Vec<f64>,
    pub is_newton: bool,
}

/// `Σ cₙ·(n - a)·zⁿ` for every term `cₙ·zⁿ` of `numerator`.
fn newton_transform(numerator: &Polynomial, a: &Coefficient) -> Result<Polynomial> {
    let negated = a.multiplied_by(-1.0);
    let mut transformed = Polynomial::new();
    for (degree, c) in numerator.iter() {
        let factor = negated.plus(degree as f64)?;
        transformed.set_coefficient(degree, Coefficient::product(c.clone(), factor))?;
    }
    Ok(transformed)
}

#[derive(Clone, Debug, PartialEq)]
pub struct FractalFunction {
    numerator: Polynomial,
    denominator: Polynomial,
    function_type: FunctionType,
    newton_coefficient: Coefficient,
    /// Only populated under `NEWTON`.
    newton_numerator: Polynomial,
}

impl Default for FractalFunction {
    /// `f(z) = z²`.
    fn default() -> Self {
        FractalFunction::new(Polynomial::z_squared())
    }
}

impl FractalFunction {
    /// A `DEFAULT` function iterating `numerator`.
    pub fn new(numerator: Polynomial) -> Self {
        FractalFunction {
            numerator,
            denominator: Polynomial::one(),
            function_type: FunctionType::Default,
            newton_coefficient: Coefficient::Constant(Complex::ZERO),
            newton_numerator: Polynomial::new(),
        }
    }

    /// Assembles a function and re-derives whatever `function_type` says is
    /// derived. `denominator` is only kept under `FRACTION`.
    pub fn from_parts(
        function_type: FunctionType,
        numerator: Polynomial,
        denominator: Polynomial,
        newton_coefficient: Coefficient,
    ) -> Result<Self> {
        if newton_coefficient.kind().is_none() {
            return Err(FunctionError::DerivedCoefficient);
        }
        let mut function = FractalFunction {
            numerator,
            denominator,
            function_type,
            newton_coefficient,
            newton_numerator: Polynomial::new(),
        };
        function.rederive()?;
        Ok(function)
    }

    /// Rebuilds the derived polynomials. When the numerator has already been
    /// sampled, the rebuilt ones are sampled at the same time so the frame
    /// arrays never go empty between two ticks.
    fn rederive(&mut self) -> Result<()> {
        match self.function_type {
            FunctionType::Default => {
                self.denominator = Polynomial::one();
                self.newton_numerator = Polynomial::new();
            }
            FunctionType::Newton => {
                self.denominator = self.numerator.get_derivative();
                self.newton_numerator = newton_transform(&self.numerator, &self.newton_coefficient)?;
            }
            FunctionType::Fraction => {
                self.newton_numerator = Polynomial::new();
                return Ok(());
            }
        }
        if let Some(t) = self.numerator.sampled_at() {
            self.denominator.update_with_time(t);
            self.newton_numerator.update_with_time(t);
        }
        Ok(())
    }

    pub fn function_type(&self) -> FunctionType {
        self.function_type
    }

    pub fn is_newton(&self) -> bool {
        self.function_type == FunctionType::Newton
    }

    pub fn numerator(&self) -> &Polynomial {
        &self.numerator
    }

    pub fn denominator(&self) -> &Polynomial {
        &self.denominator
    }

    pub fn newton_coefficient(&self) -> &Coefficient {
        &self.newton_coefficient
    }

    /// The transformed numerator, present only under `NEWTON`.
    pub fn newton_numerator(&self) -> Option<&Polynomial> {
        self.is_newton().then_some(&self.newton_numerator)
    }

    pub fn set_function_type(&mut self, target: FunctionType) -> Result<()> {
        if target == self.function_type {
            return Ok(());
        }
        log::debug!("function type {} -> {}", self.function_type, target);
        match target {
            FunctionType::Newton => self.newton_coefficient = Coefficient::Constant(Complex::ONE),
            FunctionType::Default => self.newton_coefficient = Coefficient::Constant(Complex::ZERO),
            FunctionType::Fraction => {}
        }
        self.function_type = target;
        self.rederive()
    }

    /// Same as `set_function_type` for a name coming from the UI. An unknown
    /// name fails with `InvalidFunctionType` and changes nothing.
    pub fn set_function_type_by_name(&mut self, name: &str) -> Result<()> {
        let target = name.parse()?;
        self.set_function_type(target)
    }

    fn check_access(&self, degree: u32, from_numerator: bool) -> Result<()> {
        if !from_numerator && !self.function_type.has_free_denominator() {
            return Err(FunctionError::DeniedEdit { degree, function_type: self.function_type });
        }
        Ok(())
    }

    pub fn get_coefficient(&self, degree: u32, from_numerator: bool) -> Result<Option<&Coefficient>> {
        self.check_access(degree, from_numerator)?;
        let polynomial = if from_numerator { &self.numerator } else { &self.denominator };
        Ok(polynomial.get_coefficient(degree))
    }

    pub fn set_coefficient(
        &mut self,
        degree: u32,
        from_numerator: bool,
        value: Coefficient,
    ) -> Result<()> {
        self.check_access(degree, from_numerator)?;
        log::debug!(
            "set {} degree {} to {:?}",
            if from_numerator { "numerator" } else { "denominator" },
            degree,
            value
        );
        if from_numerator {
            self.numerator.set_coefficient(degree, value)?;
            self.rederive()
        } else {
            self.denominator.set_coefficient(degree, value)
        }
    }

    pub fn remove_coefficient(
        &mut self,
        degree: u32,
        from_numerator: bool,
    ) -> Result<Option<Coefficient>> {
        self.check_access(degree, from_numerator)?;
        log::debug!(
            "remove {} degree {}",
            if from_numerator { "numerator" } else { "denominator" },
            degree
        );
        if from_numerator {
            let removed = self.numerator.remove_coefficient(degree);
            self.rederive()?;
            Ok(removed)
        } else {
            Ok(self.denominator.remove_coefficient(degree))
        }
    }

    /// Replaces the whole numerator.
    pub fn set_numerator(&mut self, numerator: Polynomial) -> Result<()> {
        self.numerator = numerator;
        self.rederive()
    }

    /// Replaces the whole denominator; only allowed under `FRACTION`.
    pub fn set_denominator(&mut self, denominator: Polynomial) -> Result<()> {
        self.check_access(0, false)?;
        self.denominator = denominator;
        Ok(())
    }

    /// Stored under every family; only `NEWTON` reads it.
    pub fn set_newton_coefficient(&mut self, a: Coefficient) -> Result<()> {
        if a.kind().is_none() {
            return Err(FunctionError::DerivedCoefficient);
        }
        self.newton_coefficient = a;
        if self.is_newton() {
            self.rederive()?;
        }
        Ok(())
    }

    pub fn update_with_time(&mut self, t: f64) {
        self.numerator.update_with_time(t);
        self.denominator.update_with_time(t);
        if self.is_newton() {
            self.newton_numerator.update_with_time(t);
        }
    }

    fn active_numerator(&self) -> &Polynomial {
        if self.is_newton() { &self.newton_numerator } else { &self.numerator }
    }

    pub fn get_numerator_array(&self) -> Vec<f64> {
        self.active_numerator().get_array_representation()
    }

    pub fn get_denominator_array(&self) -> Vec<f64> {
        self.denominator.get_array_representation()
    }

    pub fn frame_parameters(&self) -> FrameParameters {
        FrameParameters {
            numerator: self.get_numerator_array(),
            denominator: self.get_denominator_array(),
            is_newton: self.is_newton(),
        }
    }

    /// `f(z)` for the last sampled instant, computed the way the renderer
    /// does: array numerator over array denominator.
    pub fn evaluate(&self, z: Complex) -> Complex {
        self.active_numerator()
            .evaluate(z)
            .divided_by_complex(self.denominator.evaluate(z))
    }

    pub fn to_math_ml(&self) -> String {
        let f_of_z = "<mi>f</mi><mo>(</mo><mi>z</mi><mo>)</mo><mo>=</mo>";
        let named = |name: &str| format!("<mi>{}</mi><mo>(</mo><mi>z</mi><mo>)</mo>", name);
        let block = |body: String| format!("<math display=\"block\"><mrow>{}</mrow></math>", body);
        let definition = |name: &str, polynomial: &Polynomial| {
            block(format!("{}<mo>=</mo>{}", named(name), polynomial.to_math_ml()))
        };

        match self.function_type {
            FunctionType::Default => block(format!("{}{}", f_of_z, self.numerator.to_math_ml())),
            FunctionType::Newton => {
                let a = self.newton_coefficient.to_math_ml(None);
                let a = if self.newton_coefficient.needs_parentheses()
                    || self.newton_coefficient.show_minus()
                {
                    format!("<mo>(</mo>{}<mo>)</mo>", a)
                } else {
                    a
                };
                let derivative =
                    "<msup><mi>P</mi><mo>&#x2032;</mo></msup><mo>(</mo><mi>z</mi><mo>)</mo>";
                let iteration = block(format!(
                    "{}<mi>z</mi><mo>-</mo>{}<mo>&#x22C5;</mo><mfrac><mrow>{}</mrow><mrow>{}</mrow></mfrac>",
                    f_of_z,
                    a,
                    named("P"),
                    derivative
                ));
                format!("{}{}", iteration, definition("P", &self.numerator))
            }
            FunctionType::Fraction => {
                let fraction = block(format!(
                    "{}<mfrac><mrow>{}</mrow><mrow>{}</mrow></mfrac>",
                    f_of_z,
                    named("P"),
                    named("Q")
                ));
                format!(
                    "{}{}{}",
                    fraction,
                    definition("P", &self.numerator),
                    definition("Q", &self.denominator)
                )
            }
        }
    }

    pub fn to_json(&self) -> Result<Value> {
        let mut object = Map::new();
        object.insert("numerator".into(), self.numerator.to_json()?);
        object.insert("denominator".into(), self.denominator.to_json()?);
        object.insert("functionType".into(), Value::String(self.function_type.name().into()));
        object.insert("newtonCoefficient".into(), self.newton_coefficient.to_json()?);
        Ok(Value::Object(object))
    }

    /// The Newton numerator is never read from JSON; it and every other
    /// derived part are rebuilt from the function type.
    pub fn from_json(value: &Value) -> Result<FractalFunction> {
        let field = |name: &'static str| value.get(name).ok_or(FunctionError::MissingField(name));

        let function_type = match field("functionType")? {
            Value::String(name) => name.parse()?,
            other => return Err(FunctionError::InvalidFunctionType(other.to_string())),
        };
        let numerator = Polynomial::from_json(field("numerator")?)?;
        let denominator = match value.get("denominator") {
            Some(denominator) if !denominator.is_null() => Polynomial::from_json(denominator)?,
            _ => Polynomial::one(),
        };
        let newton_coefficient = match value.get("newtonCoefficient") {
            Some(a) => Coefficient::from_json(a)?,
            None => None,
        }
        .unwrap_or(Coefficient::Constant(Complex::ZERO));

        FractalFunction::from_parts(function_type, numerator, denominator, newton_coefficient)
    }

    /// Draws a family from `settings.function_types`, a Newton coefficient,
    /// and a numerator of random size. `FRACTION` also gets an independent
    /// denominator with at most as many terms as the numerator; `NEWTON`
    /// derives it.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, settings: &RandomizationSettings) -> Result<Self> {
        let function_type = *random_pick(rng, &settings.function_types, "function types")?;
        let types = &settings.coefficient_types;
        let ranges = &settings.coefficients;

        let newton_coefficient = Coefficient::random(rng, types, ranges)?;
        let count = random_int(rng, settings.coefficient_count).max(1);
        let numerator = Polynomial::random(rng, count as usize, types, ranges)?;
        let denominator = if function_type == FunctionType::Fraction {
            let count = random_int(rng, IntRange::new(1, count));
            Polynomial::random(rng, count as usize, types, ranges)?
        } else {
            Polynomial::one()
        };

        log::debug!("random {} function with {} numerator terms", function_type, count);
        FractalFunction::from_parts(function_type, numerator, denominator, newton_coefficient)
    }
}

impl Serialize for FractalFunction {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FractalFunction {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        FractalFunction::from_json(&value).map_err(de::Error::custom)
    }
}

/// User-constrained bounds for `FractalFunction::random`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomizationSettings {
    pub function_types: Vec<FunctionType>,
    pub coefficient_types: Vec<CoefficientType>,
    pub coefficient_count: IntRange,
    pub coefficients: CoefficientRanges,
}

impl Default for RandomizationSettings {
    fn default() -> Self {
        RandomizationSettings {
            function_types: FunctionType::ALL.to_vec(),
            coefficient_types: CoefficientType::ALL.to_vec(),
            coefficient_count: IntRange::new(1, 4),
            coefficients: CoefficientRanges::default(),
        }
    }
}
