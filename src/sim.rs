use crate::clock::{DEFAULT_MAX_DT, SimulationClock, StepPolicy};
use crate::error::{Result, SimError};
use crate::integrator::{IntegrationMode, Integrator};
use crate::models::PhysicsModel;
use crate::params::{ParamSnapshot, ParamSpec, ParameterStore};
use crate::samples::{DEFAULT_SAMPLE_INTERVAL, Sample, SampleEmitter};
use crate::state::{BoundaryEvent, SimulationState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_SEED: u64 = 0x5EED;

/// Construction-time settings of a simulation.
///
/// Deserializes from the host's config object, e.g.
/// `{ seed: 7, mode: "verlet", parameters: { mass: 2.0 }, fixedDt: 0.01 }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
    pub seed: u64,
    pub mode: IntegrationMode,
    /// Upper bound on a single step, seconds.
    pub max_dt: f64,
    /// Use fixed steps of this size instead of the frame's elapsed time.
    pub fixed_dt: Option<f64>,
    pub sample_interval: f64,
    pub max_samples: Option<usize>,
    /// Overrides applied (with clamping) on top of the model defaults.
    pub parameters: BTreeMap<String, f64>,
    /// Projectile only: `"sphere"` or `"cube"`.
    pub shape: Option<String>,
    /// Projectile only.
    pub air_resistance: Option<bool>,
    /// Standing wave only: string preset id.
    pub preset: Option<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            mode: IntegrationMode::Euler,
            max_dt: DEFAULT_MAX_DT,
            fixed_dt: None,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            max_samples: None,
            parameters: BTreeMap::new(),
            shape: None,
            air_resistance: None,
            preset: None,
        }
    }
}

impl SimConfig {
    pub fn step_policy(&self) -> StepPolicy {
        match self.fixed_dt {
            Some(dt) => StepPolicy::Fixed(dt),
            None => StepPolicy::Variable,
        }
    }
}

/// What one step did, for the event and chart collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub dt: f64,
    /// Simulated time after the step.
    pub time: f64,
    pub events: Vec<BoundaryEvent>,
    /// Whether a chart sample was recorded.
    pub sampled: bool,
    /// Whether a restarting parameter re-created the state first.
    pub restarted: bool,
}

/// One running simulation: the explicit context every operation goes through.
///
/// The UI side writes parameters and commands; the frame loop calls
/// [`frame`](Self::frame) and reads [`current_state`](Self::current_state).
#[derive(Debug, Clone)]
pub struct Simulation<M: PhysicsModel> {
    model: M,
    params: ParameterStore,
    state: M::State,
    time: f64,
    integrator: Integrator,
    clock: SimulationClock,
    samples: SampleEmitter,
    // cold-start copies used by reset(); the integrator is captured after
    // the initial state's random draws
    initial_model: M,
    initial_params: ParamSnapshot,
    initial_state: M::State,
    initial_integrator: Integrator,
}

impl<M: PhysicsModel> Simulation<M> {
    pub fn new(model: M) -> Result<Self> {
        Self::with_config(model, &SimConfig::default())
    }

    pub fn with_config(model: M, config: &SimConfig) -> Result<Self> {
        let mut params = ParameterStore::new(model.parameters());
        for (name, value) in &config.parameters {
            params.set(name, *value)?;
        }
        params.take_dirty();

        let mut integrator = Integrator::new(IntegrationMode::Euler, config.seed);
        integrator.set_mode(&model, config.mode)?;

        let snapshot = params.snapshot();
        let state = model.initial_state(&snapshot, integrator.rng())?;

        let mut sim = Self {
            initial_model: model.clone(),
            initial_params: snapshot,
            initial_state: state.clone(),
            initial_integrator: integrator.clone(),
            model,
            params,
            state,
            time: 0.0,
            integrator,
            clock: SimulationClock::new(config.step_policy(), config.max_dt),
            samples: SampleEmitter::new(config.sample_interval, config.max_samples),
        };
        sim.seed_samples();
        log::info!(
            "simulation '{}' created (seed {}, {} integration)",
            sim.model.id(),
            config.seed,
            config.mode
        );
        Ok(sim)
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn state(&self) -> &M::State {
        &self.state
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn mode(&self) -> IntegrationMode {
        self.integrator.mode()
    }

    pub fn parameter_specs(&self) -> &[ParamSpec] {
        self.params.specs()
    }

    pub fn parameters(&self) -> ParamSnapshot {
        self.params.snapshot()
    }

    pub fn parameter(&self, name: &str) -> Result<f64> {
        self.params.get(name)
    }

    /// Store a parameter value; the next step observes it.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<f64> {
        self.params.set(name, value)
    }

    /// Switch Euler/Verlet and restart from the current parameters.
    ///
    /// If the restart fails the previous mode stays in effect.
    pub fn set_integration_mode(&mut self, mode: IntegrationMode) -> Result<()> {
        let previous = self.integrator.mode();
        self.integrator.set_mode(&self.model, mode)?;
        if let Err(e) = self.restart() {
            self.integrator.set_mode(&self.model, previous)?;
            return Err(e);
        }
        log::debug!("{}: integration mode set to {}", self.model.id(), mode);
        Ok(())
    }

    /// Change model configuration (shape, drag toggle) and restart.
    pub fn reconfigure(&mut self, f: impl FnOnce(&mut M)) -> Result<()> {
        let previous = self.model.clone();
        f(&mut self.model);
        if let Err(e) = self.restart() {
            self.model = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Cold start: construction parameters, mode, model and random stream.
    pub fn reset(&mut self) {
        self.model = self.initial_model.clone();
        self.params.restore(&self.initial_params);
        self.integrator = self.initial_integrator.clone();
        self.state = self.initial_state.clone();
        self.rewind();
        log::info!("{}: reset", self.model.id());
    }

    /// Re-create the state from the current parameters, keeping them.
    ///
    /// On error nothing changes, the random stream included.
    pub fn restart(&mut self) -> Result<()> {
        let snapshot = self.params.snapshot();
        let mut integrator = self.integrator.clone();
        let state = self.model.initial_state(&snapshot, integrator.rng())?;
        self.integrator = integrator;
        self.params.take_dirty();
        self.state = state;
        self.rewind();
        log::info!("{}: restarted", self.model.id());
        Ok(())
    }

    fn rewind(&mut self) {
        self.time = 0.0;
        self.clock.reset();
        self.samples.clear();
        self.seed_samples();
    }

    fn seed_samples(&mut self) {
        if let Some(value) = self.model.metric(&self.state) {
            self.samples.record(0.0, value);
        }
    }

    /// Advance by the wall time elapsed since the previous frame.
    ///
    /// `now` is in seconds. Returns `None` when the clock has no step to give
    /// (first frame, time going backwards, fixed step not yet due).
    pub fn frame(&mut self, now: f64) -> Result<Option<StepReport>> {
        match self.clock.tick(now) {
            Some(dt) => self.step(dt).map(Some),
            None => Ok(None),
        }
    }

    /// Advance by an elapsed interval, passed through the clock.
    pub fn advance(&mut self, elapsed: f64) -> Result<Option<StepReport>> {
        match self.clock.advance(elapsed) {
            Some(dt) => self.step(dt).map(Some),
            None => Ok(None),
        }
    }

    /// Advance by exactly `dt`, bypassing the clock.
    ///
    /// `dt` must be finite and positive. On error nothing is committed: state,
    /// time, samples, pending parameter changes and the random stream are left
    /// as they were.
    pub fn step(&mut self, dt: f64) -> Result<StepReport> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::invalid("dt", dt, "must be finite and positive"));
        }
        let changed = self.params.dirty_names();
        let restart = changed
            .iter()
            .any(|name| self.params.spec(name).is_some_and(|s| s.restarts));

        let snapshot = self.params.snapshot();
        let mut integrator = self.integrator.clone();
        let restarted_state = if restart {
            Some(self.model.initial_state(&snapshot, integrator.rng())?)
        } else {
            None
        };
        let (start, time) = match &restarted_state {
            Some(state) => (state, 0.0),
            None => (&self.state, self.time),
        };
        let result = integrator.advance(&self.model, start, &snapshot, dt, time)?;

        self.params.take_dirty();
        self.integrator = integrator;
        if let Some(state) = restarted_state {
            self.state = state;
            self.rewind();
            log::debug!("{}: restarted after change to {:?}", self.model.id(), changed);
        }
        self.state = result.state;
        self.time += dt;

        let sampled = match self.model.metric(&self.state) {
            Some(value) => self.samples.record(self.time, value),
            None => false,
        };
        Ok(StepReport {
            dt,
            time: self.time,
            events: result.diagnostics.events,
            sampled,
            restarted: restart,
        })
    }

    pub fn current_state(&self) -> SimulationState {
        SimulationState {
            model: self.model.id(),
            time: self.time,
            fields: self.model.fields(&self.state),
        }
    }

    pub fn sample_series(&self) -> &[Sample] {
        self.samples.series()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::models::{DecayModel, PendulumModel, ProjectileModel, Shape, StandingWaveModel};

    #[test]
    fn config_overrides_are_clamped() {
        let mut config = SimConfig::default();
        config.parameters.insert("mass".into(), 100.0);
        let sim = Simulation::with_config(ProjectileModel::default(), &config).unwrap();
        assert_eq!(sim.parameter("mass").unwrap(), 10.0);
    }

    #[test]
    fn unknown_override_fails_construction() {
        let mut config = SimConfig::default();
        config.parameters.insert("colour".into(), 1.0);
        let err = Simulation::with_config(PendulumModel, &config).unwrap_err();
        assert_eq!(err, SimError::UnknownParameter("colour".into()));
    }

    #[test]
    fn pendulum_rejects_verlet() {
        let mut sim = Simulation::new(PendulumModel).unwrap();
        assert!(matches!(
            sim.set_integration_mode(IntegrationMode::Verlet),
            Err(SimError::Unsupported { .. })
        ));
        assert_eq!(sim.mode(), IntegrationMode::Euler);
    }

    #[test]
    fn first_frame_only_sets_baseline() {
        let mut sim = Simulation::new(PendulumModel).unwrap();
        assert_eq!(sim.frame(100.0).unwrap(), None);
        let report = sim.frame(100.02).unwrap().unwrap();
        assert!((report.dt - 0.02).abs() < 1e-9);
        assert!((sim.time() - report.dt).abs() < 1e-15);
    }

    #[test]
    fn parameter_change_is_seen_on_next_step() {
        let mut sim = Simulation::new(PendulumModel).unwrap();
        sim.set_parameter("length", 2.0).unwrap();
        assert_eq!(sim.state().length, 10.0);
        sim.step(0.01).unwrap();
        assert_eq!(sim.state().length, 2.0);
    }

    #[test]
    fn restarting_parameter_recreates_state() {
        let mut sim = Simulation::new(PendulumModel).unwrap();
        for _ in 0..10 {
            sim.step(0.01).unwrap();
        }
        sim.set_parameter("initial_angle", 10.0).unwrap();
        let report = sim.step(0.01).unwrap();
        assert!(report.restarted);
        assert!((sim.time() - 0.01).abs() < 1e-15);
        assert!((sim.state().angle - 10.0_f64.to_radians()).abs() < 1e-3);
    }

    #[test]
    fn decay_chart_starts_with_full_population() {
        let sim = Simulation::new(DecayModel::new()).unwrap();
        let first = sim.sample_series()[0];
        assert_eq!(first.time, 0.0);
        assert_eq!(first.value, 100.0);
    }

    #[test]
    fn reconfigure_restarts_with_new_shape() {
        let mut sim = Simulation::new(ProjectileModel::default()).unwrap();
        sim.step(0.1).unwrap();
        sim.reconfigure(|m| m.shape = Shape::Cube).unwrap();
        assert_eq!(sim.model().shape, Shape::Cube);
        assert_eq!(sim.time(), 0.0);
        sim.reset();
        assert_eq!(sim.model().shape, Shape::Sphere);
    }

    #[test]
    fn failed_step_leaves_state_untouched() {
        let mut sim = Simulation::new(DecayModel::new()).unwrap();
        sim.step(0.016).unwrap();
        let before = sim.state().clone();
        let time = sim.time();
        // bypass the store's clamping to feed the model a bad value
        sim.params = ParameterStore::new(vec![
            ParamSpec::new("decay_constant", -1.0),
            ParamSpec::new("initial_count", 100.0),
        ]);
        assert!(sim.step(0.016).is_err());
        assert_eq!(sim.state(), &before);
        assert_eq!(sim.time(), time);
    }

    #[test]
    fn non_positive_or_non_finite_dt_is_rejected() {
        let mut sim = Simulation::new(StandingWaveModel::default()).unwrap();
        sim.step(0.05).unwrap();
        let before = sim.current_state();
        let samples = sim.sample_series().to_vec();
        for dt in [f64::NAN, f64::INFINITY, -0.01, 0.0] {
            assert!(matches!(sim.step(dt), Err(SimError::InvalidParameter { .. })));
        }
        assert_eq!(sim.current_state(), before);
        assert_eq!(sim.sample_series(), samples.as_slice());
        sim.step(0.05).unwrap();
        assert!((sim.time() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn failed_restart_keeps_the_pending_change() {
        let mut sim = Simulation::new(PendulumModel).unwrap();
        sim.step(0.01).unwrap();
        let before = sim.state().clone();
        sim.params = ParameterStore::unclamped(PendulumModel.parameters());
        sim.set_parameter("length", 0.0).unwrap();
        sim.set_parameter("initial_angle", 10.0).unwrap();
        assert!(sim.step(0.01).is_err());
        assert_eq!(sim.state(), &before);
        assert_eq!(sim.time(), 0.01);
        assert!(sim.params.dirty_names().contains(&"initial_angle"));

        sim.set_parameter("length", 5.0).unwrap();
        let report = sim.step(0.01).unwrap();
        assert!(report.restarted);
        assert_eq!(sim.time(), 0.01);
    }

    #[test]
    fn failed_mode_switch_keeps_the_old_mode() {
        let mut sim = Simulation::new(ProjectileModel::default()).unwrap();
        sim.params = ParameterStore::unclamped(ProjectileModel::default().parameters());
        sim.set_parameter("mass", 0.0).unwrap();
        assert!(matches!(
            sim.set_integration_mode(IntegrationMode::Verlet),
            Err(SimError::InvalidParameter { .. })
        ));
        assert_eq!(sim.mode(), IntegrationMode::Euler);
    }

    #[test]
    fn reset_restores_the_construction_random_stream() {
        let mut fresh = Simulation::new(DecayModel::new()).unwrap();
        let mut replay = fresh.clone();
        for _ in 0..30 {
            replay.step(0.016).unwrap();
        }
        replay.reset();
        for _ in 0..60 {
            fresh.step(0.016).unwrap();
            replay.step(0.016).unwrap();
        }
        assert_eq!(fresh.state(), replay.state());
    }
}
