use crate::fractal::FunctionType;

pub type Result<T> = std::result::Result<T, FunctionError>;

#[derive(thiserror::Error, Debug)]
pub enum FunctionError {
    #[error("cannot parse complex number from {0:?}")]
    Parse(String),
    #[error("unknown coefficient type {0:?}")]
    UnknownCoefficientType(String),
    #[error("invalid function type {0:?}")]
    InvalidFunctionType(String),
    #[error("denominator degree {degree} is derived under {function_type} and cannot be edited")]
    DeniedEdit { degree: u32, function_type: FunctionType },
    #[error("degree {0} is outside the supported range")]
    DegreeOutOfRange(u32),
    #[error("invalid polynomial degree {0:?}")]
    InvalidDegree(String),
    #[error("a product coefficient is derived state and cannot be used here")]
    DerivedCoefficient,
    #[error("nothing to pick from: no allowed {0}")]
    EmptyChoice(&'static str),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}
