//! Falling body with gravity, quadratic air drag, constant wind and ground
//! bounce.

use crate::error::{Result, SimError};
use crate::integrator::{IntegrationMode, Step, euler, verlet};
use crate::models::{GRAVITY, PhysicsModel};
use crate::params::{ParamSnapshot, ParamSpec};
use crate::state::{BoundaryEvent, Diagnostics, Field, Fields, StepResult};
use nalgebra::Vector3;
use rand::Rng;
use serde::Deserialize;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

pub const RHO_AIR: f64 = 1.225;
pub const COEFF_RESTITUTION: f64 = 0.7;
pub const BOUNCE_VELOCITY_THRESHOLD: f64 = 0.1;
/// Horizontal velocity kept on every bounce.
pub const GROUND_FRICTION: f64 = 0.9;
/// Below this speed drag is skipped to avoid normalizing a near-zero vector.
pub const DRAG_SPEED_EPSILON: f64 = 1.0e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Sphere,
    Cube,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Sphere => "sphere",
            Shape::Cube => "cube",
        }
    }

    pub fn drag_coefficient(self) -> f64 {
        match self {
            Shape::Sphere => 0.47,
            Shape::Cube => 1.05,
        }
    }

    /// Frontal area; `size` is the radius or half side length.
    pub fn cross_section(self, size: f64) -> f64 {
        match self {
            Shape::Sphere => PI * size * size,
            Shape::Cube => (2.0 * size) * (2.0 * size),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shape {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sphere" => Ok(Shape::Sphere),
            "cube" => Ok(Shape::Cube),
            _ => Err(SimError::UnknownShape(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    /// Position before the last step; only Verlet reads it.
    pub previous: Vector3<f64>,
    /// Resting on the ground with no vertical velocity.
    pub grounded: bool,
}

/// Net force on the body: gravity, optional drag and wind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forces {
    pub mass: f64,
    pub gravity: f64,
    pub air_density: f64,
    pub drag_coefficient: f64,
    pub area: f64,
    pub wind: Vector3<f64>,
    pub air_resistance: bool,
}

impl Forces {
    pub fn drag(&self, velocity: &Vector3<f64>) -> Vector3<f64> {
        if !self.air_resistance {
            return Vector3::zeros();
        }
        let speed = velocity.norm();
        if speed <= DRAG_SPEED_EPSILON {
            return Vector3::zeros();
        }
        let magnitude = 0.5 * self.air_density * speed * speed * self.drag_coefficient * self.area;
        velocity * (-magnitude / speed)
    }

    pub fn acceleration(&self, velocity: &Vector3<f64>) -> Vector3<f64> {
        let weight = Vector3::new(0.0, -self.mass * self.gravity, 0.0);
        (weight + self.drag(velocity) + self.wind) / self.mass
    }
}

/// Resolve ground penetration for a body of the given radius.
///
/// Clamps the height, reflects a downward vertical velocity with restitution,
/// damps horizontal velocity and kills micro-bounces. In Verlet mode the
/// previous position is rebuilt from the corrected velocity so the implicit
/// velocity stays consistent.
pub fn ground_contact(
    state: &mut ProjectileState,
    radius: f64,
    mode: IntegrationMode,
    dt: f64,
) -> Option<BoundaryEvent> {
    if state.position.y >= radius {
        if state.position.y > radius {
            state.grounded = false;
        }
        return None;
    }
    state.position.y = radius;
    if state.velocity.y >= 0.0 {
        return None;
    }

    let impact_speed = -state.velocity.y;
    state.velocity.y *= -COEFF_RESTITUTION;
    state.velocity.x *= GROUND_FRICTION;
    state.velocity.z *= GROUND_FRICTION;

    let settled = state.velocity.y.abs() < BOUNCE_VELOCITY_THRESHOLD;
    if settled {
        state.velocity.y = 0.0;
    }
    if mode == IntegrationMode::Verlet {
        state.previous = state.position - state.velocity * dt;
    }

    if settled {
        let was_grounded = state.grounded;
        state.grounded = true;
        (!was_grounded).then_some(BoundaryEvent::Settled)
    } else {
        state.grounded = false;
        Some(BoundaryEvent::Bounced { impact_speed })
    }
}

#[derive(Debug, Clone)]
pub struct ProjectileModel {
    pub shape: Shape,
    pub air_resistance: bool,
}

impl ProjectileModel {
    pub fn new(shape: Shape, air_resistance: bool) -> Self {
        Self {
            shape,
            air_resistance,
        }
    }

    pub fn forces(&self, params: &ParamSnapshot) -> Result<Forces> {
        let size = params.positive("size")?;
        Ok(Forces {
            mass: params.positive("mass")?,
            gravity: params.non_negative("gravity")?,
            air_density: params.non_negative("air_density")?,
            drag_coefficient: self.shape.drag_coefficient(),
            area: self.shape.cross_section(size),
            wind: Vector3::new(
                params.finite("wind_x")?,
                params.finite("wind_y")?,
                params.finite("wind_z")?,
            ),
            air_resistance: self.air_resistance,
        })
    }
}

impl Default for ProjectileModel {
    fn default() -> Self {
        Self::new(Shape::Sphere, true)
    }
}

impl PhysicsModel for ProjectileModel {
    type State = ProjectileState;

    fn id(&self) -> &'static str {
        "projectile"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("mass", 1.0).range(0.1, 10.0),
            ParamSpec::new("size", 0.5).range(0.1, 2.0),
            ParamSpec::new("initial_height", 5.0).range(0.0, 20.0),
            ParamSpec::new("initial_velocity_x", 0.0).range(-10.0, 10.0),
            ParamSpec::new("initial_velocity_z", 0.0).range(-10.0, 10.0),
            ParamSpec::new("gravity", GRAVITY).range(0.0, 30.0),
            ParamSpec::new("air_density", RHO_AIR).range(0.0, 5.0),
            ParamSpec::new("wind_x", 0.5).range(-5.0, 5.0),
            ParamSpec::new("wind_y", 0.0).range(-5.0, 5.0),
            ParamSpec::new("wind_z", -0.2).range(-5.0, 5.0),
        ]
    }

    fn supports(&self, _mode: IntegrationMode) -> bool {
        true
    }

    fn initial_state<R: Rng>(&self, params: &ParamSnapshot, _rng: &mut R) -> Result<ProjectileState> {
        params.positive("mass")?;
        params.positive("size")?;
        let position = Vector3::new(0.0, params.finite("initial_height")?, 0.0);
        let velocity = Vector3::new(
            params.finite("initial_velocity_x")?,
            0.0,
            params.finite("initial_velocity_z")?,
        );
        Ok(ProjectileState {
            position,
            velocity,
            previous: position,
            grounded: false,
        })
    }

    fn step<R: Rng>(
        &self,
        state: &ProjectileState,
        params: &ParamSnapshot,
        step: Step,
        _rng: &mut R,
    ) -> Result<StepResult<ProjectileState>> {
        let forces = self.forces(params)?;
        let radius = params.positive("size")?;
        let dt = step.dt;
        let a = forces.acceleration(&state.velocity);

        let mut next = state.clone();
        match step.mode {
            IntegrationMode::Euler => {
                (next.position, next.velocity) = euler(state.position, state.velocity, a, dt);
            }
            IntegrationMode::Verlet => {
                // a fresh state has previous == position; seed it from the launch velocity
                let previous = if state.previous == state.position {
                    state.position - state.velocity * dt
                } else {
                    state.previous
                };
                (next.position, next.velocity) = verlet(state.position, previous, a, dt);
                next.previous = state.position;
            }
        }

        let mut diagnostics = Diagnostics::default();
        if let Some(event) = ground_contact(&mut next, radius, step.mode, dt) {
            diagnostics.push(event);
        }
        Ok(StepResult::new(next, diagnostics))
    }

    fn metric(&self, state: &ProjectileState) -> Option<f64> {
        Some(state.position.y)
    }

    fn fields(&self, state: &ProjectileState) -> Fields {
        let v = |v: &Vector3<f64>| [v.x, v.y, v.z];
        let mut f = Fields::new();
        f.insert("position", Field::Vector(v(&state.position)));
        f.insert("velocity", Field::Vector(v(&state.velocity)));
        f.insert("previous_position", Field::Vector(v(&state.previous)));
        f.insert("speed", Field::Scalar(state.velocity.norm()));
        f.insert("grounded", Field::Flags(vec![state.grounded]));
        f
    }
}
