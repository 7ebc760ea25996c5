pub mod math;
pub mod error;
pub mod random;
pub mod coefficient;
pub mod polynomial;
pub mod fractal;
pub mod config;

pub use math::Complex;
pub use error::{FunctionError, Result};
pub use random::{IntRange, ParamRange};
pub use coefficient::{
    Circle, Coefficient, CoefficientRanges, CoefficientType, Ellipse, Line, Periodic,
};
pub use polynomial::{Polynomial, MAX_DEGREE};
pub use fractal::{FractalFunction, FrameParameters, FunctionType, RandomizationSettings};
pub use config::{AnimationSettings, ColorSettings, Configuration, Viewport};
