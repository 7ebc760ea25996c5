use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FunctionError, Result};

/// Immutable complex value. Every operation returns a new instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };
    pub const ONE: Complex = Complex { re: 1.0, im: 0.0 };

    pub fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }

    /// `angle` is in radians.
    pub fn from_polar(modulus: f64, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Complex::new(modulus * c, modulus * s)
    }

    pub fn norm_sqr(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    pub fn modulus(&self) -> f64 {
        self.norm_sqr().sqrt()
    }

    pub fn arg(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        self.im.atan2(self.re)
    }

    pub fn multiplied_by(&self, k: f64) -> Complex {
        Complex::new(self.re * k, self.im * k)
    }

    pub fn multiplied_by_complex(&self, other: Complex) -> Complex {
        Complex::new(
            self.re * other.re - self.im * other.im,
            self.re * other.im + self.im * other.re,
        )
    }

    pub fn divided_by_complex(&self, other: Complex) -> Complex {
        let d = other.norm_sqr();
        Complex::new(
            (self.re * other.re + self.im * other.im) / d,
            (self.im * other.re - self.re * other.im) / d,
        )
    }

    /// Adds a real scalar; the imaginary part is untouched.
    pub fn plus(&self, k: f64) -> Complex {
        Complex::new(self.re + k, self.im)
    }

    pub fn powi(&self, n: u32) -> Complex {
        (0..n).fold(Complex::ONE, |acc, _| acc.multiplied_by_complex(*self))
    }

    pub fn is_zero(&self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }

    /// True when exactly one component is non-zero and it is negative, so the
    /// value can be written as `-|c|` after a binary operator.
    pub fn show_minus(&self) -> bool {
        (self.im == 0.0 && self.re < 0.0) || (self.re == 0.0 && self.im < 0.0)
    }

    /// True when both components are non-zero and the value needs
    /// parentheses inside a product.
    pub fn is_compound(&self) -> bool {
        self.re != 0.0 && self.im != 0.0
    }

    pub fn copy(&self) -> Complex {
        *self
    }

    pub fn to_math_ml(&self) -> String {
        match (self.re == 0.0, self.im == 0.0) {
            (true, true) => "<mn>0</mn>".to_string(),
            (false, true) => signed_mn(self.re),
            (true, false) => imaginary_math_ml(self.im),
            (false, false) => {
                let op = if self.im < 0.0 { "-" } else { "+" };
                format!(
                    "{}<mo>{}</mo>{}",
                    signed_mn(self.re),
                    op,
                    imaginary_math_ml(self.im.abs())
                )
            }
        }
    }
}

fn signed_mn(x: f64) -> String {
    if x < 0.0 {
        format!("<mo>-</mo><mn>{}</mn>", -x)
    } else {
        format!("<mn>{}</mn>", x)
    }
}

fn imaginary_math_ml(im: f64) -> String {
    let sign = if im < 0.0 { "<mo>-</mo>" } else { "" };
    let magnitude = im.abs();
    if magnitude == 1.0 {
        format!("{}<mi>i</mi>", sign)
    } else {
        format!("{}<mn>{}</mn><mi>i</mi>", sign, magnitude)
    }
}

fn imaginary_text(im: f64) -> String {
    let sign = if im < 0.0 { "-" } else { "" };
    let magnitude = im.abs();
    if magnitude == 1.0 {
        format!("{}i", sign)
    } else {
        format!("{}{}i", sign, magnitude)
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.re == 0.0, self.im == 0.0) {
            (true, true) => write!(f, "0"),
            (false, true) => write!(f, "{}", self.re),
            (true, false) => write!(f, "{}", imaginary_text(self.im)),
            (false, false) => {
                let op = if self.im < 0.0 { '-' } else { '+' };
                write!(f, "{} {} {}", self.re, op, imaginary_text(self.im.abs()))
            }
        }
    }
}

/// Byte cursor over an ASCII complex literal.
struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Scanner { text, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn done(&self) -> bool {
        self.pos == self.text.len()
    }

    fn sign(&mut self) -> f64 {
        if self.eat(b'-') {
            -1.0
        } else {
            self.eat(b'+');
            1.0
        }
    }

    /// Unsigned decimal literal: `12`, `12.`, `12.5` or `.5`.
    fn number(&mut self) -> Option<f64> {
        let start = self.pos;
        let mut digits = 0;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
            digits += 1;
        }
        if self.eat(b'.') {
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            self.pos = start;
            return None;
        }
        self.text[start..self.pos].parse().ok()
    }
}

impl FromStr for Complex {
    type Err = FunctionError;

    /// Accepts `a`, `bi`, `i`, `-i`, `a + bi`, `a - bi` and `a + i`, with an
    /// optional leading sign and optional spaces around the binary operator.
    fn from_str(s: &str) -> Result<Self> {
        let fail = || FunctionError::Parse(s.to_string());
        let mut scanner = Scanner::new(s.trim());
        if scanner.done() {
            return Err(fail());
        }

        let sign = scanner.sign();
        let first = scanner.number();
        if scanner.eat(b'i') {
            if !scanner.done() {
                return Err(fail());
            }
            return Ok(Complex::new(0.0, sign * first.unwrap_or(1.0)));
        }

        let re = sign * first.ok_or_else(fail)?;
        scanner.skip_spaces();
        if scanner.done() {
            return Ok(Complex::new(re, 0.0));
        }

        let op = match scanner.peek() {
            Some(b'+') => 1.0,
            Some(b'-') => -1.0,
            _ => return Err(fail()),
        };
        scanner.pos += 1;
        scanner.skip_spaces();
        let magnitude = scanner.number().unwrap_or(1.0);
        if !scanner.eat(b'i') || !scanner.done() {
            return Err(fail());
        }
        Ok(Complex::new(re, op * magnitude))
    }
}

impl Complex {
    pub fn from_string(s: &str) -> Result<Complex> {
        s.parse()
    }
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Complex;

    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;

    fn mul(self, rhs: Complex) -> Complex {
        self.multiplied_by_complex(rhs)
    }
}

impl Neg for Complex {
    type Output = Complex;

    fn neg(self) -> Complex {
        self.multiplied_by(-1.0)
    }
}
