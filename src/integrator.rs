use crate::error::{Result, SimError};
use crate::models::PhysicsModel;
use crate::params::ParamSnapshot;
use crate::state::StepResult;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationMode {
    /// Explicit Euler on velocity, then position from the new velocity.
    #[default]
    Euler,
    /// Position Verlet; velocity is derived from consecutive positions.
    Verlet,
}

impl IntegrationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            IntegrationMode::Euler => "euler",
            IntegrationMode::Verlet => "verlet",
        }
    }
}

impl fmt::Display for IntegrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euler" => Ok(IntegrationMode::Euler),
            "verlet" => Ok(IntegrationMode::Verlet),
            _ => Err(SimError::UnknownMode(s.to_string())),
        }
    }
}

/// Timing of a single step as seen by a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub dt: f64,
    /// Simulated time at the start of the step.
    pub time: f64,
    pub mode: IntegrationMode,
}

impl Step {
    pub fn new(dt: f64, time: f64, mode: IntegrationMode) -> Self {
        Self { dt, time, mode }
    }

    /// Simulated time at the end of the step.
    pub fn end(&self) -> f64 {
        self.time + self.dt
    }
}

/// Anything that can be integrated: `f64` angles and `Vector3<f64>` positions.
pub trait Kinematic: Copy + Add<Output = Self> + Sub<Output = Self> + Mul<f64, Output = Self> {}

impl<T> Kinematic for T where T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T> {}

/// One explicit Euler step. Returns `(position, velocity)`.
pub fn euler<T: Kinematic>(x: T, v: T, a: T, dt: f64) -> (T, T) {
    let v = v + a * dt;
    (x + v * dt, v)
}

/// One position Verlet step: `x' = 2x - x_prev + a dt²`.
///
/// Returns `(position, velocity)` with velocity `(x' - x) / dt`. The caller
/// keeps `x` as the next `x_prev`.
pub fn verlet<T: Kinematic>(x: T, prev: T, a: T, dt: f64) -> (T, T) {
    let next = x * 2.0 - prev + a * (dt * dt);
    let v = (next - x) * (1.0 / dt);
    (next, v)
}

/// Drives a model forward one dt at a time.
///
/// Owns the integration mode and the random source, so a run is fully
/// determined by its seed.
#[derive(Debug, Clone)]
pub struct Integrator {
    mode: IntegrationMode,
    seed: u64,
    rng: StdRng,
}

impl Integrator {
    pub fn new(mode: IntegrationMode, seed: u64) -> Self {
        Self {
            mode,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn mode(&self) -> IntegrationMode {
        self.mode
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn set_mode<M: PhysicsModel>(&mut self, model: &M, mode: IntegrationMode) -> Result<()> {
        if !model.supports(mode) {
            return Err(SimError::unsupported(model.id(), format!("{} integration", mode)));
        }
        self.mode = mode;
        Ok(())
    }

    /// Rewind the random stream to the start of the seed.
    pub fn reseed(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn advance<M: PhysicsModel>(
        &mut self,
        model: &M,
        state: &M::State,
        params: &ParamSnapshot,
        dt: f64,
        time: f64,
    ) -> Result<StepResult<M::State>> {
        if !(dt.is_finite() && dt > 0.0) {
            return Ok(StepResult::quiet(state.clone()));
        }
        model.step(state, params, Step::new(dt, time, self.mode), &mut self.rng)
    }
}
