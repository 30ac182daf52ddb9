//! Radioactive decay of a population of independent particles.
//!
//! Each tick every undecayed particle decays with probability
//! `decay_constant * sampling_factor`. This is a per-tick Bernoulli trial, not
//! the closed-form `N0 * exp(-lambda * t)`: the tick count drives the curve and
//! the frame dt does not enter the probability, so the remaining-count curve
//! depends on the frame rate.

use crate::error::{Result, SimError};
use crate::integrator::Step;
use crate::models::PhysicsModel;
use crate::params::{ParamSnapshot, ParamSpec};
use crate::state::{BoundaryEvent, Diagnostics, Field, Fields, StepResult};
use nalgebra::Vector3;
use rand::Rng;

pub const DEFAULT_DECAY_CONSTANT: f64 = 0.2;
pub const DEFAULT_INITIAL_COUNT: f64 = 100.0;
pub const MAX_PARTICLES: f64 = 1000.0;
pub const SAMPLING_FACTOR: f64 = 0.01;
pub const FADE_PER_TICK: f64 = 0.02;
/// Half side of the cube particles are scattered in.
pub const SPREAD: f64 = 2.0;

/// One arena record. Renderers map `id` to their own mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayParticle {
    pub id: usize,
    pub position: Vector3<f64>,
    pub decayed: bool,
    /// 1.0 while alive, fades to 0.0 after decay.
    pub opacity: f64,
}

impl DecayParticle {
    /// Decayed and fully faded; nothing left to update.
    pub fn is_inert(&self) -> bool {
        self.decayed && self.opacity <= 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecayState {
    pub particles: Vec<DecayParticle>,
    pub ticks: u64,
}

impl DecayState {
    pub fn remaining(&self) -> usize {
        self.particles.iter().filter(|p| !p.decayed).count()
    }
}

#[derive(Debug, Clone)]
pub struct DecayModel {
    sampling_factor: f64,
    fade_per_tick: f64,
}

impl DecayModel {
    pub fn new() -> Self {
        Self {
            sampling_factor: SAMPLING_FACTOR,
            fade_per_tick: FADE_PER_TICK,
        }
    }

    /// Per-tick decay probability for a given decay constant.
    pub fn tick_probability(&self, decay_constant: f64) -> f64 {
        decay_constant * self.sampling_factor
    }
}

impl Default for DecayModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsModel for DecayModel {
    type State = DecayState;

    fn id(&self) -> &'static str {
        "decay"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("decay_constant", DEFAULT_DECAY_CONSTANT).range(0.0, 1.0),
            ParamSpec::new("initial_count", DEFAULT_INITIAL_COUNT)
                .range(1.0, MAX_PARTICLES)
                .step(1.0),
        ]
    }

    fn initial_state<R: Rng>(&self, params: &ParamSnapshot, rng: &mut R) -> Result<DecayState> {
        params.non_negative("decay_constant")?;
        let count = params.count("initial_count")?;
        let particles = (0..count)
            .map(|id| DecayParticle {
                id,
                position: Vector3::new(
                    rng.random_range(-SPREAD..SPREAD),
                    rng.random_range(-SPREAD..SPREAD),
                    rng.random_range(-SPREAD..SPREAD),
                ),
                decayed: false,
                opacity: 1.0,
            })
            .collect();
        log::debug!("decay: created {} particles", count);
        Ok(DecayState {
            particles,
            ticks: 0,
        })
    }

    fn step<R: Rng>(
        &self,
        state: &DecayState,
        params: &ParamSnapshot,
        _step: Step,
        rng: &mut R,
    ) -> Result<StepResult<DecayState>> {
        let lambda = params.non_negative("decay_constant")?;
        let p = self.tick_probability(lambda);
        if p > 1.0 {
            return Err(SimError::invalid("decay_constant", lambda, "tick probability exceeds 1"));
        }

        let mut next = state.clone();
        let mut diagnostics = Diagnostics::default();
        let remaining_before = state.remaining();

        for particle in next.particles.iter_mut() {
            if !particle.decayed && rng.random::<f64>() < p {
                particle.decayed = true;
                diagnostics.push(BoundaryEvent::Decayed { id: particle.id });
            }
            if particle.decayed && particle.opacity > 0.0 {
                particle.opacity = (particle.opacity - self.fade_per_tick).max(0.0);
                if particle.opacity <= 0.0 {
                    diagnostics.push(BoundaryEvent::Faded { id: particle.id });
                }
            }
        }
        next.ticks += 1;

        if remaining_before > 0 && next.remaining() == 0 {
            diagnostics.push(BoundaryEvent::FullyDecayed);
        }
        Ok(StepResult::new(next, diagnostics))
    }

    fn metric(&self, state: &DecayState) -> Option<f64> {
        Some(state.remaining() as f64)
    }

    fn fields(&self, state: &DecayState) -> Fields {
        let mut f = Fields::new();
        f.insert("remaining", Field::Scalar(state.remaining() as f64));
        f.insert("total", Field::Scalar(state.particles.len() as f64));
        f.insert("ticks", Field::Scalar(state.ticks as f64));
        f.insert(
            "positions",
            Field::Vectors(state.particles.iter().map(|p| [p.position.x, p.position.y, p.position.z]).collect()),
        );
        f.insert("opacity", Field::Series(state.particles.iter().map(|p| p.opacity).collect()));
        f.insert("decayed", Field::Flags(state.particles.iter().map(|p| p.decayed).collect()));
        f
    }
}
