//! Physics models. Each is a pure mapping from (state, parameters, dt) to
//! the next state; none of them knows about rendering.

pub mod complex_curve;
pub mod decay;
pub mod pendulum;
pub mod projectile;
pub mod standing_wave;

pub use complex_curve::{ComplexCurveModel, CurveFunction, CurveState};
pub use decay::{DecayModel, DecayParticle, DecayState};
pub use pendulum::{PendulumModel, PendulumState};
pub use projectile::{ProjectileModel, ProjectileState, Shape};
pub use standing_wave::{StandingWaveModel, StringPreset, WaveState};

use crate::error::Result;
use crate::integrator::{IntegrationMode, Step};
use crate::params::{ParamSnapshot, ParamSpec};
use crate::state::{Fields, StepResult};
use rand::Rng;
use std::fmt;

pub const GRAVITY: f64 = 9.81;

pub trait PhysicsModel: Clone + fmt::Debug {
    type State: Clone + PartialEq + fmt::Debug;

    /// Catalog id of the model.
    fn id(&self) -> &'static str;

    /// Parameters this model reads, with their defaults and ranges.
    fn parameters(&self) -> Vec<ParamSpec>;

    fn supports(&self, mode: IntegrationMode) -> bool {
        mode == IntegrationMode::Euler
    }

    fn initial_state<R: Rng>(&self, params: &ParamSnapshot, rng: &mut R) -> Result<Self::State>;

    fn step<R: Rng>(
        &self,
        state: &Self::State,
        params: &ParamSnapshot,
        step: Step,
        rng: &mut R,
    ) -> Result<StepResult<Self::State>>;

    /// Value charted over time, if the model has one.
    fn metric(&self, _state: &Self::State) -> Option<f64> {
        None
    }

    /// Named fields for the renderer.
    fn fields(&self, state: &Self::State) -> Fields;
}
