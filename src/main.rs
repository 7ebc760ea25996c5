use std::io::{self, Write};

use rand::SeedableRng;
use rand::rngs::StdRng;

use julia_function::{
    Circle, Coefficient, Complex, Configuration, FractalFunction, FunctionError, Periodic,
};

const STATE_FILE: &str = "julia_config.json";

type CommandResult<T> = Result<T, Box<dyn std::error::Error>>;

fn side(token: &str) -> CommandResult<bool> {
    match token {
        "num" | "n" => Ok(true),
        "den" | "d" => Ok(false),
        other => Err(format!("expected num or den, got {:?}", other).into()),
    }
}

fn degree(token: Option<&str>) -> julia_function::Result<u32> {
    let token = token.unwrap_or("");
    token.parse().map_err(|_| FunctionError::InvalidDegree(token.to_string()))
}

fn display_state(config: &Configuration) {
    let function = &config.fractal_function;
    println!("type:        {}", function.function_type());
    println!("numerator:   {}", describe(function.numerator().iter()));
    println!("denominator: {}", describe(function.denominator().iter()));
    if let Some(transformed) = function.newton_numerator() {
        println!("newton a:    {:?}", function.newton_coefficient());
        println!("transformed: {} terms", transformed.len());
    }
    println!("free powers: {:?}", function.numerator().get_available_powers());
    println!("bound 1e{}  iterations {}\n", config.julia_bound, config.iterations);
}

fn describe<'a>(terms: impl Iterator<Item = (u32, &'a Coefficient)>) -> String {
    let parts: Vec<String> = terms
        .map(|(degree, c)| match c {
            Coefficient::Constant(value) => format!("({})z^{}", value, degree),
            other => format!("{}(t)z^{}", other.kind().map(|k| k.tag()).unwrap_or("PRODUCT"), degree),
        })
        .collect();
    if parts.is_empty() { "0".to_string() } else { parts.join(" + ") }
}

/// Runs one command line; errors are reported, never fatal.
fn run_command(config: &mut Configuration, input: &str) -> CommandResult<()> {
    let mut words = input.split_whitespace();
    let command = words.next().unwrap_or("");
    let function = &mut config.fractal_function;

    match command {
        "/state" => display_state(config),
        "/type" => {
            function.set_function_type_by_name(&words.next().unwrap_or("").to_uppercase())?;
            println!("function type is now {}\n", function.function_type());
        }
        "/set" => {
            let from_numerator = side(words.next().unwrap_or(""))?;
            let degree = degree(words.next())?;
            let literal: Vec<&str> = words.collect();
            let value: Complex = literal.join(" ").parse()?;
            function.set_coefficient(degree, from_numerator, Coefficient::Constant(value))?;
        }
        "/circle" => {
            let from_numerator = side(words.next().unwrap_or(""))?;
            let degree = degree(words.next())?;
            let radius: f64 = words.next().and_then(|s| s.parse().ok()).unwrap_or(0.5);
            let seconds: f64 = words.next().and_then(|s| s.parse().ok()).unwrap_or(5.0);
            let literal: Vec<&str> = words.collect();
            let center: Complex = if literal.is_empty() {
                Complex::ZERO
            } else {
                literal.join(" ").parse()?
            };
            let mut circle = Circle::new(center, radius, 0);
            circle.set_duration_seconds(seconds);
            function.set_coefficient(degree, from_numerator, Coefficient::Circle(circle))?;
        }
        "/remove" => {
            let from_numerator = side(words.next().unwrap_or(""))?;
            let degree = degree(words.next())?;
            if function.remove_coefficient(degree, from_numerator)?.is_none() {
                println!("no coefficient at degree {}\n", degree);
            }
        }
        "/newton" => {
            let literal: Vec<&str> = words.collect();
            let a: Complex = literal.join(" ").parse()?;
            function.set_newton_coefficient(Coefficient::Constant(a))?;
        }
        "/tick" => {
            let t: f64 = words.next().and_then(|s| s.parse().ok()).unwrap_or(0.0);
            let frame = config.advance(t);
            println!("{}\n", serde_json::to_string(&frame)?);
        }
        "/random" => {
            let mut rng = match words.next().and_then(|s| s.parse::<u64>().ok()) {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            config.randomize_function(&mut rng)?;
            display_state(config);
        }
        "/mathml" => println!("{}\n", function.to_math_ml()),
        "/json" => println!("{}\n", serde_json::to_string_pretty(&function.to_json()?)?),
        "/reset" => {
            *function = FractalFunction::default();
            println!("function reset to z^2\n");
        }
        "/save" => config.save(STATE_FILE)?,
        _ => println!("unknown command: {}\n", command),
    }
    Ok(())
}

fn main() -> CommandResult<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| STATE_FILE.to_string());
    let mut config = match Configuration::load_or_default(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("cannot load {}, leaving it untouched", path);
            return Err(e.into());
        }
    };

    println!("\n╭──────────────────────────────────────────────╮");
    println!("│          animated julia function editor       │");
    println!("│                                              │");
    println!("│ /state  /mathml  /json  /reset  /save  /quit │");
    println!("│ /type <default|newton|fraction>              │");
    println!("│ /set <num|den> <deg> <complex>               │");
    println!("│ /circle <num|den> <deg> <r> <secs> [center]  │");
    println!("│ /remove <num|den> <deg>                      │");
    println!("│ /newton <complex>   - relaxation coefficient │");
    println!("│ /tick <ms>          - sample frame arrays    │");
    println!("│ /random [seed]      - randomize function     │");
    println!("╰──────────────────────────────────────────────╯\n");

    loop {
        print!("f> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() { continue; }
        if input == "/quit" { break; }

        if let Err(e) = run_command(&mut config, input) {
            println!("error: {}\n", e);
        }
    }

    config.save(&path)?;
    Ok(())
}
