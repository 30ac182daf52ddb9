//! Vibrating string as a pure standing wave `A sin(kx) cos(wt)`.
//!
//! Nothing is integrated: every step re-evaluates the whole string from the
//! current parameters at the step's end time.

use crate::error::{Result, SimError};
use crate::integrator::Step;
use crate::models::PhysicsModel;
use crate::params::{ParamSnapshot, ParamSpec};
use crate::state::{BoundaryEvent, Diagnostics, Field, Fields, StepResult};
use rand::Rng;
use std::f64::consts::PI;
use std::str::FromStr;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub const DEFAULT_LENGTH: f64 = 10.0;
pub const DEFAULT_POINTS: f64 = 200.0;
pub const MAX_AMPLITUDE: f64 = 3.0;
/// `cos` values this small are rounding noise around `wt = pi/2 + n pi`.
const TIME_NODE_EPSILON: f64 = 1.0e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StringPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub amplitude: f64,
    pub frequency: f64,
    pub harmonics: f64,
}

pub const GUITAR_E: StringPreset = StringPreset {
    id: "guitar-e",
    name: "Guitar E String",
    amplitude: 1.0,
    frequency: 1.0,
    harmonics: 1.0,
};

pub const BASS_G: StringPreset = StringPreset {
    id: "bass-g",
    name: "Bass G String",
    amplitude: 1.5,
    frequency: 2.0,
    harmonics: 2.0,
};

pub const VIOLIN_A: StringPreset = StringPreset {
    id: "violin-a",
    name: "Violin A String",
    amplitude: 0.8,
    frequency: 0.5,
    harmonics: 1.0,
};

pub fn string_presets() -> &'static [StringPreset] {
    &[GUITAR_E, BASS_G, VIOLIN_A]
}

impl FromStr for StringPreset {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        string_presets()
            .iter()
            .find(|p| p.id == s)
            .copied()
            .ok_or_else(|| SimError::UnknownPreset(s.to_string()))
    }
}

/// Wave numbers derived from the current parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wave {
    pub amplitude: f64,
    /// `harmonics * pi / length`
    pub k: f64,
    /// `2 pi frequency`
    pub omega: f64,
}

impl Wave {
    pub fn new(amplitude: f64, frequency: f64, harmonics: f64, length: f64) -> Self {
        Self {
            amplitude,
            k: harmonics * PI / length,
            omega: 2.0 * PI * frequency,
        }
    }

    pub fn from_params(params: &ParamSnapshot) -> Result<Self> {
        Ok(Self::new(
            params.non_negative("amplitude")?,
            params.positive("frequency")?,
            params.positive("harmonics")?,
            params.positive("length")?,
        ))
    }

    pub fn displacement(&self, x: f64, t: f64) -> f64 {
        self.amplitude * (self.k * x).sin() * self.time_factor(t)
    }

    /// `cos(wt)`, snapped to exactly zero at the nodes of the time factor.
    pub fn time_factor(&self, t: f64) -> f64 {
        let c = (self.omega * t).cos();
        if c.abs() < TIME_NODE_EPSILON { 0.0 } else { c }
    }

    pub fn sample(&self, length: f64, points: usize, t: f64) -> Vec<f64> {
        let last = (points.max(2) - 1) as f64;
        let wave = *self;
        collect_points(points, move |i| wave.displacement(i as f64 / last * length, t))
    }
}

#[cfg(feature = "parallel")]
fn collect_points<F>(n: usize, f: F) -> Vec<f64>
where
    F: Fn(usize) -> f64 + Sync + Send,
{
    (0..n).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn collect_points<F>(n: usize, f: F) -> Vec<f64>
where
    F: Fn(usize) -> f64,
{
    (0..n).map(f).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaveState {
    pub length: f64,
    pub displacement: Vec<f64>,
    /// Current `|A cos(wt)|`.
    pub envelope: f64,
    pub amplitude: f64,
}

#[derive(Debug, Clone)]
pub struct StandingWaveModel {
    preset: StringPreset,
}

impl StandingWaveModel {
    pub fn new(preset: StringPreset) -> Self {
        Self { preset }
    }

    pub fn preset(&self) -> &StringPreset {
        &self.preset
    }

    fn evaluate(&self, params: &ParamSnapshot, t: f64) -> Result<WaveState> {
        let wave = Wave::from_params(params)?;
        let length = params.positive("length")?;
        let points = params.count("points")?;
        Ok(WaveState {
            length,
            displacement: wave.sample(length, points, t),
            envelope: (wave.amplitude * wave.time_factor(t)).abs(),
            amplitude: wave.amplitude,
        })
    }
}

impl Default for StandingWaveModel {
    fn default() -> Self {
        Self::new(GUITAR_E)
    }
}

impl PhysicsModel for StandingWaveModel {
    type State = WaveState;

    fn id(&self) -> &'static str {
        "standing-wave"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("amplitude", self.preset.amplitude)
                .range(0.0, MAX_AMPLITUDE)
                .step(0.1),
            ParamSpec::new("frequency", self.preset.frequency)
                .range(0.5, 5.0)
                .step(0.1),
            ParamSpec::new("harmonics", self.preset.harmonics)
                .range(1.0, 5.0)
                .step(1.0),
            ParamSpec::new("length", DEFAULT_LENGTH).range(1.0, 50.0),
            ParamSpec::new("points", DEFAULT_POINTS).range(2.0, 2000.0).step(1.0),
        ]
    }

    fn initial_state<R: Rng>(&self, params: &ParamSnapshot, _rng: &mut R) -> Result<WaveState> {
        self.evaluate(params, 0.0)
    }

    fn step<R: Rng>(
        &self,
        _state: &WaveState,
        params: &ParamSnapshot,
        step: Step,
        _rng: &mut R,
    ) -> Result<StepResult<WaveState>> {
        let next = self.evaluate(params, step.end())?;
        let wave = Wave::from_params(params)?;
        let mut diagnostics = Diagnostics::default();
        if wave.time_factor(step.time) * wave.time_factor(step.end()) < 0.0 {
            diagnostics.push(BoundaryEvent::Flat);
        }
        Ok(StepResult::new(next, diagnostics))
    }

    fn metric(&self, state: &WaveState) -> Option<f64> {
        Some(state.envelope)
    }

    fn fields(&self, state: &WaveState) -> Fields {
        let mut f = Fields::new();
        f.insert("displacement", Field::Series(state.displacement.clone()));
        f.insert("length", Field::Scalar(state.length));
        f.insert("envelope", Field::Scalar(state.envelope));
        // 0..1, hosts map it onto a colour ramp
        f.insert("intensity", Field::Scalar((state.amplitude / MAX_AMPLITUDE).min(1.0)));
        f
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::IntegrationMode;
    use crate::params::ParameterStore;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn at_time_zero_profile_is_pure_sine() {
        let wave = Wave::new(1.5, 2.0, 2.0, 10.0);
        for i in 0..=20 {
            let x = i as f64 * 0.5;
            assert_relative_eq!(wave.displacement(x, 0.0), 1.5 * (wave.k * x).sin(), epsilon = 1e-12);
        }
    }

    #[test]
    fn quarter_period_is_flat() {
        let wave = Wave::new(1.0, 1.0, 3.0, 10.0);
        for t in [0.25, 0.75, 1.25] {
            for i in 0..=100 {
                assert_eq!(wave.displacement(i as f64 * 0.1, t), 0.0);
            }
        }
    }

    #[test]
    fn string_ends_are_fixed() {
        let wave = Wave::new(1.0, 1.0, 4.0, 10.0);
        let s = wave.sample(10.0, 200, 0.3);
        assert_eq!(s.len(), 200);
        assert!(s[0].abs() < 1e-12);
        assert!(s[199].abs() < 1e-12);
    }

    #[test]
    fn presets_set_defaults() {
        let model = StandingWaveModel::new("bass-g".parse().unwrap());
        let params = ParameterStore::new(model.parameters()).snapshot();
        assert_eq!(params.get("amplitude").unwrap(), 1.5);
        assert_eq!(params.get("harmonics").unwrap(), 2.0);
        assert!("cello-c".parse::<StringPreset>().is_err());
    }

    #[test]
    fn step_reevaluates_from_parameters_and_reports_flat_crossing() {
        let model = StandingWaveModel::default();
        let mut store = ParameterStore::new(model.parameters());
        store.set("points", 11.0).unwrap();
        let params = store.snapshot();
        let mut rng = StdRng::seed_from_u64(0);
        let s0 = model.initial_state(&params, &mut rng).unwrap();
        assert_eq!(s0.displacement.len(), 11);
        assert_relative_eq!(s0.envelope, 1.0);

        let r = model
            .step(&s0, &params, Step::new(0.02, 0.24, IntegrationMode::Euler), &mut rng)
            .unwrap();
        assert_eq!(r.diagnostics.events, vec![BoundaryEvent::Flat]);
        assert_relative_eq!(r.state.displacement[5], (2.0 * PI * 0.26).cos(), epsilon = 1e-12);
    }

    #[test]
    fn zero_length_or_frequency_is_rejected() {
        let model = StandingWaveModel::default();
        let mut rng = StdRng::seed_from_u64(0);
        let good = ParameterStore::new(model.parameters()).snapshot();
        let state = model.initial_state(&good, &mut rng).unwrap();
        for name in ["length", "frequency"] {
            let mut store = ParameterStore::unclamped(model.parameters());
            store.set(name, 0.0).unwrap();
            let bad = store.snapshot();
            assert!(matches!(
                model.initial_state(&bad, &mut rng),
                Err(SimError::InvalidParameter { .. })
            ));
            let step = Step::new(0.01, 0.0, IntegrationMode::Euler);
            assert!(matches!(
                model.step(&state, &bad, step, &mut rng),
                Err(SimError::InvalidParameter { .. })
            ));
        }
    }
}
