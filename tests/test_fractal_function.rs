use julia_function::{
    Circle, Coefficient, Complex, FractalFunction, FunctionError, FunctionType, IntRange,
    Polynomial, RandomizationSettings,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

fn poly(terms: &[(u32, Coefficient)]) -> Polynomial {
    Polynomial::from_terms(terms.iter().cloned()).unwrap()
}

fn close(a: Complex, b: Complex, eps: f64) -> bool {
    (a.re - b.re).abs() <= eps && (a.im - b.im).abs() <= eps
}

#[test]
fn default_function_is_z_squared() {
    let f = FractalFunction::default();
    assert_eq!(f.function_type(), FunctionType::Default);
    assert_eq!(f.numerator(), &poly(&[(2, Coefficient::constant(1.0, 0.0))]));
    assert_eq!(f.denominator(), &Polynomial::one());
    assert!(f.newton_numerator().is_none());
}

#[test]
fn switching_to_newton_derives_denominator() {
    let c = Coefficient::constant(3.0, -1.0);
    let mut f = FractalFunction::new(poly(&[(2, c.clone())]));
    f.set_function_type(FunctionType::Newton).unwrap();

    assert_eq!(f.denominator(), &poly(&[(1, c.multiplied_by(2.0))]));
    assert_eq!(f.newton_coefficient(), &Coefficient::constant(1.0, 0.0));
    assert!(f.newton_numerator().is_some());

    f.set_function_type(FunctionType::Default).unwrap();
    assert_eq!(f.denominator(), &Polynomial::one());
    assert_eq!(f.newton_coefficient(), &Coefficient::constant(0.0, 0.0));
    assert!(f.newton_numerator().is_none());
}

#[test]
fn newton_numerator_matches_identity() {
    let c0 = Coefficient::constant(-1.0, 0.0);
    let c2 = Coefficient::Circle(Circle::new(Complex::new(1.0, 0.0), 0.5, 3000));
    let a = Coefficient::constant(0.5, 0.25);

    let mut f = FractalFunction::new(poly(&[(0, c0.clone()), (2, c2.clone())]));
    f.set_function_type(FunctionType::Newton).unwrap();
    f.set_newton_coefficient(a.clone()).unwrap();

    let expected = poly(&[
        (0, Coefficient::product(c0, a.multiplied_by(-1.0))),
        (2, Coefficient::product(c2, a.multiplied_by(-1.0).plus(2.0).unwrap())),
    ]);
    assert_eq!(f.newton_numerator(), Some(&expected));
}

#[test]
fn newton_numerator_follows_numerator_edits() {
    let mut f = FractalFunction::default();
    f.set_function_type(FunctionType::Newton).unwrap();
    f.set_coefficient(3, true, Coefficient::constant(1.0, 0.0)).unwrap();
    assert_eq!(f.newton_numerator().unwrap().len(), 2);
    assert_eq!(f.denominator().len(), 2);
    assert_eq!(f.denominator().get_coefficient(2), Some(&Coefficient::constant(3.0, 0.0)));

    f.remove_coefficient(2, true).unwrap();
    assert_eq!(f.newton_numerator().unwrap().degrees().collect::<Vec<_>>(), vec![3]);
    assert_eq!(f.denominator().degrees().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn newton_evaluates_as_relaxed_newton_step() {
    // P(z) = z^3 - 1 with a moving constant term
    let moving = Coefficient::Circle(Circle::new(Complex::new(-1.0, 0.0), 0.3, 5000));
    let mut f = FractalFunction::new(poly(&[(3, Coefficient::constant(1.0, 0.0)), (0, moving.clone())]));
    f.set_function_type(FunctionType::Newton).unwrap();
    f.set_newton_coefficient(Coefficient::constant(0.7, 0.2)).unwrap();

    let t = 1234.0;
    f.update_with_time(t);

    let a = Complex::new(0.7, 0.2);
    let c0 = moving.get_at_time(t);
    for z in [Complex::new(0.3, 0.8), Complex::new(-1.2, 0.4), Complex::new(2.0, -0.5)] {
        let p = z.powi(3) + c0;
        let dp = z.powi(2).multiplied_by(3.0);
        let expected = z - a * p.divided_by_complex(dp);
        assert!(close(f.evaluate(z), expected, 1e-9));
    }
}

#[test]
fn newton_coefficient_change_outside_newton_is_inert() {
    let mut f = FractalFunction::default();
    f.set_newton_coefficient(Coefficient::constant(2.0, 0.0)).unwrap();
    assert_eq!(f.newton_coefficient(), &Coefficient::constant(2.0, 0.0));
    assert!(f.newton_numerator().is_none());
    assert_eq!(f.denominator(), &Polynomial::one());
}

#[test]
fn products_cannot_be_newton_coefficients() {
    let mut f = FractalFunction::default();
    let product = Coefficient::product(Coefficient::constant(1.0, 0.0), Coefficient::constant(1.0, 0.0));
    assert!(matches!(f.set_newton_coefficient(product), Err(FunctionError::DerivedCoefficient)));
}

#[test]
fn denominator_edits_denied_unless_fraction() {
    for kind in [FunctionType::Default, FunctionType::Newton] {
        let mut f = FractalFunction::default();
        f.set_function_type(kind).unwrap();
        let before = f.clone();
        assert!(matches!(
            f.set_coefficient(0, false, Coefficient::constant(2.0, 0.0)),
            Err(FunctionError::DeniedEdit { degree: 0, .. })
        ));
        assert!(matches!(f.remove_coefficient(0, false), Err(FunctionError::DeniedEdit { .. })));
        assert!(matches!(f.get_coefficient(0, false), Err(FunctionError::DeniedEdit { .. })));
        assert!(matches!(f.set_denominator(Polynomial::new()), Err(FunctionError::DeniedEdit { .. })));
        assert_eq!(f, before);
    }

    let mut f = FractalFunction::default();
    f.set_function_type(FunctionType::Fraction).unwrap();
    f.set_coefficient(1, false, Coefficient::constant(2.0, 0.0)).unwrap();
    assert_eq!(f.get_coefficient(1, false).unwrap(), Some(&Coefficient::constant(2.0, 0.0)));
    assert_eq!(f.remove_coefficient(0, false).unwrap(), Some(Coefficient::constant(1.0, 0.0)));
    assert_eq!(f.denominator().degrees().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn fraction_keeps_polynomials_then_rederives_on_exit() {
    let mut f = FractalFunction::new(poly(&[(2, Coefficient::constant(1.0, 0.0))]));
    f.set_function_type(FunctionType::Newton).unwrap();
    f.set_function_type(FunctionType::Fraction).unwrap();
    assert_eq!(f.denominator(), &poly(&[(1, Coefficient::constant(2.0, 0.0))]));
    assert!(f.newton_numerator().is_none());

    f.set_coefficient(0, false, Coefficient::constant(5.0, 0.0)).unwrap();
    f.set_function_type(FunctionType::Default).unwrap();
    assert_eq!(f.denominator(), &Polynomial::one());
}

#[test]
fn invalid_function_type_leaves_state() {
    let mut f = FractalFunction::default();
    let before = f.clone();
    match f.set_function_type_by_name("HALLEY") {
        Err(FunctionError::InvalidFunctionType(name)) => assert_eq!(name, "HALLEY"),
        other => panic!("expected invalid type, got {:?}", other),
    }
    assert_eq!(f, before);
    f.set_function_type_by_name("NEWTON").unwrap();
    assert!(f.is_newton());
}

#[test]
fn arrays_choose_numerator_by_family() {
    let mut f = FractalFunction::default();
    f.update_with_time(0.0);
    assert_eq!(f.get_numerator_array(), vec![2.0, 1.0, 0.0]);
    assert_eq!(f.get_denominator_array(), vec![0.0, 1.0, 0.0]);

    f.set_newton_coefficient(Coefficient::constant(0.5, 0.0)).unwrap();
    f.set_function_type(FunctionType::Newton).unwrap();
    f.set_newton_coefficient(Coefficient::constant(0.5, 0.0)).unwrap();
    f.update_with_time(0.0);
    // 1 * (2 - 0.5)
    assert_eq!(f.get_numerator_array(), vec![2.0, 1.5, 0.0]);
    let frame = f.frame_parameters();
    assert!(frame.is_newton);
    assert_eq!(frame.denominator, vec![1.0, 2.0, 0.0]);
}

#[test]
fn end_to_end_default_to_newton() {
    let mut f = FractalFunction::default();
    f.set_function_type(FunctionType::Newton).unwrap();
    f.update_with_time(1000.0);
    assert_eq!(f.get_denominator_array(), vec![1.0, 2.0, 0.0]);
    assert_eq!(f.get_numerator_array(), vec![2.0, 1.0, 0.0]);
}

#[test]
fn numerator_edit_keeps_frame_arrays_populated() {
    let mut f = FractalFunction::default();
    f.update_with_time(0.0);
    f.set_coefficient(3, true, Coefficient::constant(1.0, 0.0)).unwrap();
    assert_eq!(f.get_numerator_array(), vec![2.0, 1.0, 0.0]);
    assert_eq!(f.get_denominator_array(), vec![0.0, 1.0, 0.0]);

    f.remove_coefficient(3, true).unwrap();
    assert_eq!(f.get_denominator_array(), vec![0.0, 1.0, 0.0]);
}

#[test]
fn newton_edit_resamples_derived_arrays() {
    let mut f = FractalFunction::default();
    f.set_function_type(FunctionType::Newton).unwrap();
    f.update_with_time(0.0);
    assert_eq!(f.get_denominator_array(), vec![1.0, 2.0, 0.0]);

    f.set_coefficient(3, true, Coefficient::constant(1.0, 0.0)).unwrap();
    assert_eq!(f.get_numerator_array(), vec![2.0, 1.0, 0.0, 3.0, 2.0, 0.0]);
    assert_eq!(f.get_denominator_array(), vec![1.0, 2.0, 0.0, 2.0, 3.0, 0.0]);

    f.set_newton_coefficient(Coefficient::constant(2.0, 0.0)).unwrap();
    assert_eq!(f.get_numerator_array(), vec![2.0, 0.0, 0.0, 3.0, 1.0, 0.0]);
}

#[test]
fn unsampled_function_has_empty_arrays_after_edit() {
    let mut f = FractalFunction::default();
    f.set_function_type(FunctionType::Newton).unwrap();
    f.set_coefficient(1, true, Coefficient::constant(1.0, 0.0)).unwrap();
    assert!(f.get_numerator_array().is_empty());
    assert!(f.get_denominator_array().is_empty());
}

#[test]
fn json_round_trip_for_each_family() {
    let numerator = poly(&[
        (0, Coefficient::constant(-1.0, 0.0)),
        (3, Coefficient::Circle(Circle::new(Complex::new(1.0, 0.0), 0.1, 4000))),
    ]);
    for kind in FunctionType::ALL {
        let mut f = FractalFunction::new(numerator.clone());
        f.set_function_type(kind).unwrap();
        if kind == FunctionType::Fraction {
            f.set_coefficient(2, false, Coefficient::constant(0.0, 1.0)).unwrap();
        }
        let value = f.to_json().unwrap();
        assert_eq!(value["functionType"], json!(kind.name()));
        assert!(value.get("newtonNumerator").is_none());
        assert_eq!(FractalFunction::from_json(&value).unwrap(), f);

        let text = serde_json::to_string(&f).unwrap();
        assert_eq!(serde_json::from_str::<FractalFunction>(&text).unwrap(), f);
    }
}

#[test]
fn from_json_rejects_unknown_type() {
    let value = json!({
        "numerator": {"2": {"type": "CONSTANT", "re": 1.0, "im": 0.0}},
        "denominator": {"0": {"type": "CONSTANT", "re": 1.0, "im": 0.0}},
        "functionType": "MANDELBROT",
        "newtonCoefficient": {"type": "CONSTANT", "re": 0.0, "im": 0.0}
    });
    assert!(matches!(
        FractalFunction::from_json(&value),
        Err(FunctionError::InvalidFunctionType(_))
    ));
    assert!(matches!(
        FractalFunction::from_json(&json!({"functionType": "DEFAULT"})),
        Err(FunctionError::MissingField("numerator"))
    ));
}

#[test]
fn from_json_rederives_newton_state() {
    let value = json!({
        "numerator": {"2": {"type": "CONSTANT", "re": 1.0, "im": 0.0}},
        "denominator": {"7": {"type": "CONSTANT", "re": 9.0, "im": 9.0}},
        "functionType": "NEWTON",
        "newtonCoefficient": {"type": "CONSTANT", "re": 1.0, "im": 0.0}
    });
    let f = FractalFunction::from_json(&value).unwrap();
    assert_eq!(f.denominator(), &poly(&[(1, Coefficient::constant(2.0, 0.0))]));
    assert_eq!(f.newton_numerator().unwrap().len(), 1);
}

#[test]
fn math_ml_templates() {
    let mut f = FractalFunction::default();
    let default = f.to_math_ml();
    assert!(default.starts_with("<math"));
    assert!(!default.contains("<mfrac>"));

    f.set_function_type(FunctionType::Newton).unwrap();
    let newton = f.to_math_ml();
    assert!(newton.contains("<mfrac>"));
    assert!(newton.contains("&#x2032;"));
    assert_eq!(newton.matches("<math").count(), 2);

    f.set_function_type(FunctionType::Fraction).unwrap();
    let fraction = f.to_math_ml();
    assert!(fraction.contains("<mi>Q</mi>"));
    assert_eq!(fraction.matches("<math").count(), 3);
}

#[test]
fn random_function_respects_settings() {
    let mut rng = StdRng::seed_from_u64(2024);
    let settings = RandomizationSettings {
        coefficient_count: IntRange::new(2, 5),
        ..RandomizationSettings::default()
    };
    let mut seen = std::collections::HashSet::new();
    for _ in 0..60 {
        let f = FractalFunction::random(&mut rng, &settings).unwrap();
        seen.insert(f.function_type());
        let n = f.numerator().len();
        assert!((2..=5).contains(&n));
        match f.function_type() {
            FunctionType::Default => assert_eq!(f.denominator(), &Polynomial::one()),
            FunctionType::Newton => assert_eq!(f.denominator(), &f.numerator().get_derivative()),
            FunctionType::Fraction => {
                let d = f.denominator().len();
                assert!(d >= 1 && d <= n);
            }
        }
    }
    assert_eq!(seen.len(), 3);
}

#[test]
fn random_function_is_reproducible() {
    let settings = RandomizationSettings::default();
    let a = FractalFunction::random(&mut StdRng::seed_from_u64(1), &settings).unwrap();
    let b = FractalFunction::random(&mut StdRng::seed_from_u64(1), &settings).unwrap();
    assert_eq!(a, b);
}

#[test]
fn random_function_needs_allowed_types() {
    let settings = RandomizationSettings {
        function_types: Vec::new(),
        ..RandomizationSettings::default()
    };
    assert!(matches!(
        FractalFunction::random(&mut StdRng::seed_from_u64(1), &settings),
        Err(FunctionError::EmptyChoice(_))
    ));
}
