//! Image of the unit circle under a complex function.

use crate::error::{Result, SimError};
use crate::integrator::Step;
use crate::models::PhysicsModel;
use crate::params::{ParamSnapshot, ParamSpec};
use crate::state::{Field, Fields, StepResult};
use nalgebra::Complex;
use rand::Rng;
use std::f64::consts::PI;
use std::str::FromStr;

pub const DEFAULT_SAMPLES: f64 = 200.0;

pub fn add(a: Complex<f64>, b: Complex<f64>) -> Complex<f64> {
    Complex::new(a.re + b.re, a.im + b.im)
}

/// `(a+bi)(c+di) = (ac-bd) + (ad+bc)i`
pub fn mul(a: Complex<f64>, b: Complex<f64>) -> Complex<f64> {
    Complex::new(a.re * b.re - a.im * b.im, a.re * b.im + a.im * b.re)
}

pub fn pow(z: Complex<f64>, n: u32) -> Complex<f64> {
    (0..n).fold(Complex::new(1.0, 0.0), |acc, _| mul(acc, z))
}

pub fn div_real(a: Complex<f64>, r: f64) -> Complex<f64> {
    Complex::new(a.re / r, a.im / r)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveFunction {
    /// `f(z) = z`
    Identity,
    /// `f(z) = z + z³/3`
    CubicSeries,
}

impl CurveFunction {
    pub fn id(self) -> &'static str {
        match self {
            CurveFunction::Identity => "complex-z",
            CurveFunction::CubicSeries => "complex-z3",
        }
    }

    pub fn apply(self, z: Complex<f64>) -> Complex<f64> {
        match self {
            CurveFunction::Identity => z,
            CurveFunction::CubicSeries => add(z, div_real(pow(z, 3), 3.0)),
        }
    }
}

impl FromStr for CurveFunction {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "complex-z" | "z" => Ok(CurveFunction::Identity),
            "complex-z3" | "z3" => Ok(CurveFunction::CubicSeries),
            _ => Err(SimError::UnknownModel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurveState {
    /// `(re, im)` of `f(e^{it})` for evenly spaced `t` in `[0, 2pi]`.
    pub trace: Vec<[f64; 2]>,
}

#[derive(Debug, Clone)]
pub struct ComplexCurveModel {
    function: CurveFunction,
}

impl ComplexCurveModel {
    pub fn new(function: CurveFunction) -> Self {
        Self { function }
    }

    pub fn function(&self) -> CurveFunction {
        self.function
    }

    pub fn trace(&self, samples: usize) -> Vec<[f64; 2]> {
        let last = (samples.max(2) - 1) as f64;
        (0..samples)
            .map(|i| {
                let t = 2.0 * PI * i as f64 / last;
                let w = self.function.apply(Complex::new(t.cos(), t.sin()));
                [w.re, w.im]
            })
            .collect()
    }
}

impl PhysicsModel for ComplexCurveModel {
    type State = CurveState;

    fn id(&self) -> &'static str {
        self.function.id()
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new("samples", DEFAULT_SAMPLES).range(2.0, 4096.0).step(1.0)]
    }

    fn initial_state<R: Rng>(&self, params: &ParamSnapshot, _rng: &mut R) -> Result<CurveState> {
        Ok(CurveState {
            trace: self.trace(params.count("samples")?),
        })
    }

    fn step<R: Rng>(
        &self,
        state: &CurveState,
        params: &ParamSnapshot,
        _step: Step,
        _rng: &mut R,
    ) -> Result<StepResult<CurveState>> {
        let samples = params.count("samples")?;
        if state.trace.len() == samples {
            return Ok(StepResult::quiet(state.clone()));
        }
        Ok(StepResult::quiet(CurveState {
            trace: self.trace(samples),
        }))
    }

    fn fields(&self, state: &CurveState) -> Fields {
        let mut f = Fields::new();
        f.insert("trace", Field::Points(state.trace.clone()));
        f
    }
}
