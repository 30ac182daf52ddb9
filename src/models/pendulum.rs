//! Simple pendulum with the full `sin(theta)` restoring term.

use crate::error::Result;
use crate::integrator::{Step, euler};
use crate::models::{GRAVITY, PhysicsModel};
use crate::params::{ParamSnapshot, ParamSpec};
use crate::state::{BoundaryEvent, Diagnostics, Field, Fields, StepResult};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendulumState {
    /// Angle from the downward vertical, radians.
    pub angle: f64,
    pub angular_velocity: f64,
    pub length: f64,
}

impl PendulumState {
    /// Bob position relative to the pivot.
    pub fn bob(&self) -> [f64; 3] {
        [self.length * self.angle.sin(), -self.length * self.angle.cos(), 0.0]
    }
}

#[derive(Debug, Clone, Default)]
pub struct PendulumModel;

impl PendulumModel {
    pub fn angular_acceleration(gravity: f64, length: f64, angle: f64) -> f64 {
        -(gravity / length) * angle.sin()
    }
}

impl PhysicsModel for PendulumModel {
    type State = PendulumState;

    fn id(&self) -> &'static str {
        "pendulum"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("length", 10.0).range(1.0, 20.0),
            ParamSpec::new("gravity", GRAVITY).range(0.0, 30.0),
            // degrees, like the slider it comes from
            ParamSpec::new("initial_angle", 45.0).range(-180.0, 180.0).restarts(),
        ]
    }

    fn initial_state<R: Rng>(&self, params: &ParamSnapshot, _rng: &mut R) -> Result<PendulumState> {
        Ok(PendulumState {
            angle: params.finite("initial_angle")?.to_radians(),
            angular_velocity: 0.0,
            length: params.positive("length")?,
        })
    }

    fn step<R: Rng>(
        &self,
        state: &PendulumState,
        params: &ParamSnapshot,
        step: Step,
        _rng: &mut R,
    ) -> Result<StepResult<PendulumState>> {
        let length = params.positive("length")?;
        let gravity = params.non_negative("gravity")?;
        let alpha = Self::angular_acceleration(gravity, length, state.angle);
        let (angle, angular_velocity) = euler(state.angle, state.angular_velocity, alpha, step.dt);

        let mut diagnostics = Diagnostics::default();
        if state.angular_velocity * angular_velocity < 0.0 {
            diagnostics.push(BoundaryEvent::TurningPoint { angle });
        }
        Ok(StepResult::new(
            PendulumState {
                angle,
                angular_velocity,
                length,
            },
            diagnostics,
        ))
    }

    fn metric(&self, state: &PendulumState) -> Option<f64> {
        Some(state.angle)
    }

    fn fields(&self, state: &PendulumState) -> Fields {
        let mut f = Fields::new();
        f.insert("angle", Field::Scalar(state.angle));
        f.insert("angular_velocity", Field::Scalar(state.angular_velocity));
        f.insert("length", Field::Scalar(state.length));
        f.insert("bob", Field::Vector(state.bob()));
        f
    }
}
