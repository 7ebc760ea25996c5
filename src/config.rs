use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{FunctionError, Result};
use crate::fractal::{FractalFunction, FrameParameters, RandomizationSettings};
use crate::math::Complex;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSettings {
    pub playing: bool,
    /// Animation milliseconds per wall-clock millisecond.
    pub speed: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        AnimationSettings { playing: true, speed: 1.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Complex,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport { center: Complex::ZERO, zoom: 1.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorSettings {
    pub palette: Vec<[u8; 3]>,
    pub smooth: bool,
}

impl Default for ColorSettings {
    fn default() -> Self {
        ColorSettings {
            palette: vec![[0, 7, 100], [32, 107, 203], [237, 255, 255], [255, 170, 0], [0, 2, 0]],
            smooth: true,
        }
    }
}

/// Aggregate root edited by the UI and read by the renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub fractal_function: FractalFunction,
    /// Escape bound handed to the shader as a power of ten.
    pub julia_bound: f64,
    pub iterations: u32,
    #[serde(default)]
    pub animation: AnimationSettings,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub colors: ColorSettings,
    #[serde(default)]
    pub randomization: RandomizationSettings,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            fractal_function: FractalFunction::default(),
            julia_bound: -4.0,
            iterations: 20,
            animation: AnimationSettings::default(),
            viewport: Viewport::default(),
            colors: ColorSettings::default(),
            randomization: RandomizationSettings::default(),
        }
    }
}

impl Configuration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        let config: Configuration = serde_json::from_str(&data)?;
        log::info!(
            "loaded {} configuration from {}",
            config.fractal_function.function_type(),
            path.as_ref().display()
        );
        Ok(config)
    }

    /// Like `load`, but a missing file yields the default configuration.
    /// Any other failure is returned so the caller does not overwrite a file
    /// it could not read.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Configuration::load(path.as_ref()) {
            Err(FunctionError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("no configuration at {}, using defaults", path.as_ref().display());
                Ok(Configuration::default())
            }
            other => other,
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), encoded)?;
        log::info!("saved configuration to {}", path.as_ref().display());
        Ok(())
    }

    /// Replaces the fractal function with a random one drawn under
    /// `self.randomization`. On error the current function is kept.
    pub fn randomize_function<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.fractal_function = FractalFunction::random(rng, &self.randomization)?;
        Ok(())
    }

    /// Samples the function at `elapsed_ms` of wall-clock time and returns
    /// the arrays for this frame.
    pub fn advance(&mut self, elapsed_ms: f64) -> FrameParameters {
        self.fractal_function
            .update_with_time(elapsed_ms * self.animation.speed);
        self.fractal_function.frame_parameters()
    }
}
