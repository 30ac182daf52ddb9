use crate::error::{Result, SimError};
use crate::integrator::IntegrationMode;
use crate::models::{
    ComplexCurveModel, CurveFunction, DecayModel, PendulumModel, ProjectileModel, Shape,
    StandingWaveModel, StringPreset,
};
use crate::params::{ParamSnapshot, ParamSpec};
use crate::samples::Sample;
use crate::sim::{SimConfig, Simulation, StepReport};
use crate::state::SimulationState;

pub const MODEL_DECAY: &str = "decay";
pub const MODEL_PROJECTILE: &str = "projectile";
pub const MODEL_PENDULUM: &str = "pendulum";
pub const MODEL_STANDING_WAVE: &str = "standing-wave";
pub const MODEL_COMPLEX_Z: &str = "complex-z";
pub const MODEL_COMPLEX_Z3: &str = "complex-z3";

pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub fn model_catalog() -> &'static [ModelInfo] {
    &[
        ModelInfo {
            id: MODEL_DECAY,
            name: "Radioactive decay",
            description: "Particle cloud decaying with a per-tick probability, fading out.",
        },
        ModelInfo {
            id: MODEL_PROJECTILE,
            name: "Projectile with drag",
            description: "Falling body with quadratic air drag, wind and ground bounces.",
        },
        ModelInfo {
            id: MODEL_PENDULUM,
            name: "Simple pendulum",
            description: "Nonlinear pendulum released from rest.",
        },
        ModelInfo {
            id: MODEL_STANDING_WAVE,
            name: "Standing wave",
            description: "Vibrating string with fixed ends and selectable harmonic.",
        },
        ModelInfo {
            id: MODEL_COMPLEX_Z,
            name: "Complex map f(z) = z",
            description: "Image of the unit circle under the identity.",
        },
        ModelInfo {
            id: MODEL_COMPLEX_Z3,
            name: "Complex map f(z) = z + z^3/3",
            description: "Image of the unit circle under a truncated series.",
        },
    ]
}

enum ModelKind {
    Decay(Simulation<DecayModel>),
    Projectile(Simulation<ProjectileModel>),
    Pendulum(Simulation<PendulumModel>),
    StandingWave(Simulation<StandingWaveModel>),
    ComplexCurve(Simulation<ComplexCurveModel>),
}

macro_rules! each_sim {
    ($model:expr, $sim:ident => $body:expr) => {
        match $model {
            ModelKind::Decay($sim) => $body,
            ModelKind::Projectile($sim) => $body,
            ModelKind::Pendulum($sim) => $body,
            ModelKind::StandingWave($sim) => $body,
            ModelKind::ComplexCurve($sim) => $body,
        }
    };
}

/// A simulation chosen by catalog id, driven through string commands.
pub struct Engine {
    model_id: &'static str,
    model: ModelKind,
}

impl Engine {
    pub fn new_builtin(model_id: &str) -> Result<Self> {
        Self::from_config(model_id, &SimConfig::default())
    }

    pub fn from_config(model_id: &str, config: &SimConfig) -> Result<Self> {
        let model_id = normalize_model_id(model_id)
            .ok_or_else(|| SimError::UnknownModel(model_id.to_string()))?;
        check_config(model_id, config)?;
        let model = build_model(model_id, config)?;
        Ok(Self { model_id, model })
    }

    pub fn model_id(&self) -> &'static str {
        self.model_id
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<f64> {
        each_sim!(&mut self.model, sim => sim.set_parameter(name, value))
    }

    pub fn parameter(&self, name: &str) -> Result<f64> {
        each_sim!(&self.model, sim => sim.parameter(name))
    }

    pub fn parameters(&self) -> ParamSnapshot {
        each_sim!(&self.model, sim => sim.parameters())
    }

    pub fn parameter_specs(&self) -> &[ParamSpec] {
        each_sim!(&self.model, sim => sim.parameter_specs())
    }

    pub fn reset(&mut self) {
        each_sim!(&mut self.model, sim => sim.reset())
    }

    pub fn restart(&mut self) -> Result<()> {
        each_sim!(&mut self.model, sim => sim.restart())
    }

    pub fn mode(&self) -> IntegrationMode {
        each_sim!(&self.model, sim => sim.mode())
    }

    pub fn set_integration_mode(&mut self, mode: IntegrationMode) -> Result<()> {
        each_sim!(&mut self.model, sim => sim.set_integration_mode(mode))
    }

    /// Accepts `"euler"` or `"verlet"`.
    pub fn set_integration_mode_str(&mut self, mode: &str) -> Result<()> {
        self.set_integration_mode(mode.parse()?)
    }

    pub fn set_shape(&mut self, shape: &str) -> Result<()> {
        let shape: Shape = shape.parse()?;
        match &mut self.model {
            ModelKind::Projectile(sim) => sim.reconfigure(|m| m.shape = shape),
            _ => Err(SimError::unsupported(self.model_id, "shapes")),
        }
    }

    pub fn set_air_resistance(&mut self, enabled: bool) -> Result<()> {
        match &mut self.model {
            ModelKind::Projectile(sim) => sim.reconfigure(|m| m.air_resistance = enabled),
            _ => Err(SimError::unsupported(self.model_id, "air resistance")),
        }
    }

    /// Host frame callback; `now` in seconds.
    pub fn frame(&mut self, now: f64) -> Result<Option<StepReport>> {
        each_sim!(&mut self.model, sim => sim.frame(now))
    }

    pub fn step(&mut self, dt: f64) -> Result<StepReport> {
        each_sim!(&mut self.model, sim => sim.step(dt))
    }

    pub fn time(&self) -> f64 {
        each_sim!(&self.model, sim => sim.time())
    }

    pub fn current_state(&self) -> SimulationState {
        each_sim!(&self.model, sim => sim.current_state())
    }

    pub fn sample_series(&self) -> &[Sample] {
        each_sim!(&self.model, sim => sim.sample_series())
    }
}

fn normalize_model_id(id: &str) -> Option<&'static str> {
    match id {
        MODEL_DECAY => Some(MODEL_DECAY),
        MODEL_PROJECTILE => Some(MODEL_PROJECTILE),
        MODEL_PENDULUM => Some(MODEL_PENDULUM),
        MODEL_STANDING_WAVE => Some(MODEL_STANDING_WAVE),
        MODEL_COMPLEX_Z => Some(MODEL_COMPLEX_Z),
        MODEL_COMPLEX_Z3 => Some(MODEL_COMPLEX_Z3),
        _ => None,
    }
}

/// Model-specific config keys are only accepted by the model they belong to.
fn check_config(model_id: &'static str, config: &SimConfig) -> Result<()> {
    if model_id != MODEL_PROJECTILE {
        if config.shape.is_some() {
            return Err(SimError::unsupported(model_id, "shapes"));
        }
        if config.air_resistance.is_some() {
            return Err(SimError::unsupported(model_id, "air resistance"));
        }
    }
    if model_id != MODEL_STANDING_WAVE && config.preset.is_some() {
        return Err(SimError::unsupported(model_id, "string presets"));
    }
    Ok(())
}

fn build_model(model_id: &'static str, config: &SimConfig) -> Result<ModelKind> {
    match model_id {
        MODEL_DECAY => Ok(ModelKind::Decay(Simulation::with_config(
            DecayModel::new(),
            config,
        )?)),
        MODEL_PROJECTILE => {
            let mut model = ProjectileModel::default();
            if let Some(shape) = &config.shape {
                model.shape = shape.parse()?;
            }
            if let Some(enabled) = config.air_resistance {
                model.air_resistance = enabled;
            }
            Ok(ModelKind::Projectile(Simulation::with_config(model, config)?))
        }
        MODEL_PENDULUM => Ok(ModelKind::Pendulum(Simulation::with_config(
            PendulumModel,
            config,
        )?)),
        MODEL_STANDING_WAVE => {
            let model = match &config.preset {
                Some(id) => StandingWaveModel::new(id.parse::<StringPreset>()?),
                None => StandingWaveModel::default(),
            };
            Ok(ModelKind::StandingWave(Simulation::with_config(model, config)?))
        }
        MODEL_COMPLEX_Z | MODEL_COMPLEX_Z3 => {
            let function: CurveFunction = model_id.parse()?;
            Ok(ModelKind::ComplexCurve(Simulation::with_config(
                ComplexCurveModel::new(function),
                config,
            )?))
        }
        _ => Err(SimError::UnknownModel(model_id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_entry_builds() {
        for info in model_catalog() {
            let engine = Engine::new_builtin(info.id).unwrap();
            assert_eq!(engine.model_id(), info.id);
            assert_eq!(engine.current_state().model, info.id);
        }
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert_eq!(
            Engine::new_builtin("double-pendulum").err(),
            Some(SimError::UnknownModel("double-pendulum".into()))
        );
    }

    #[test]
    fn shape_commands_only_apply_to_projectile() {
        let mut engine = Engine::new_builtin(MODEL_PENDULUM).unwrap();
        assert!(matches!(engine.set_shape("cube"), Err(SimError::Unsupported { .. })));
        assert!(engine.set_air_resistance(false).is_err());

        let mut engine = Engine::new_builtin(MODEL_PROJECTILE).unwrap();
        engine.set_shape("cube").unwrap();
        assert_eq!(
            engine.set_shape("cylinder"),
            Err(SimError::UnknownShape("cylinder".into()))
        );
        engine.set_air_resistance(false).unwrap();
    }

    #[test]
    fn mode_strings_are_parsed() {
        let mut engine = Engine::new_builtin(MODEL_PROJECTILE).unwrap();
        engine.set_integration_mode_str("verlet").unwrap();
        assert_eq!(engine.mode(), IntegrationMode::Verlet);
        assert_eq!(
            engine.set_integration_mode_str("leapfrog"),
            Err(SimError::UnknownMode("leapfrog".into()))
        );
        assert_eq!(engine.mode(), IntegrationMode::Verlet);
    }

    #[test]
    fn config_applies_model_options() {
        let config = SimConfig {
            preset: Some("violin-a".into()),
            ..SimConfig::default()
        };
        let engine = Engine::from_config(MODEL_STANDING_WAVE, &config).unwrap();
        assert_eq!(engine.parameter("frequency").unwrap(), 0.5);

        assert!(matches!(
            Engine::from_config(MODEL_DECAY, &config),
            Err(SimError::Unsupported { .. })
        ));
    }

    #[test]
    fn frame_drives_the_selected_model() {
        let mut engine = Engine::new_builtin(MODEL_PENDULUM).unwrap();
        assert!(engine.frame(0.0).unwrap().is_none());
        engine.frame(0.016).unwrap().unwrap();
        assert!(engine.time() > 0.0);
        assert!(engine.current_state().scalar("angle").unwrap() < std::f64::consts::FRAC_PI_4);
    }
}
