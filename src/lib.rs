//! Real-time physics simulations for interactive visualisation.
//!
//! Each [`Simulation`] owns a model, its parameters, an integrator and a
//! clock. A host calls [`Simulation::frame`] once per rendered frame and
//! reads [`Simulation::current_state`] back; the [`engine`] picks a model
//! by catalog id, and the `wasm` module exposes the same to JavaScript.

pub mod clock;
pub mod engine;
pub mod error;
pub mod integrator;
pub mod models;
pub mod params;
pub mod samples;
pub mod sim;
pub mod state;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use clock::{SimulationClock, StepPolicy};
pub use engine::{Engine, ModelInfo, model_catalog};
pub use error::{Result, SimError};
pub use integrator::{IntegrationMode, Integrator};
pub use models::PhysicsModel;
pub use params::{ParamSnapshot, ParamSpec, ParameterStore};
pub use samples::{Sample, SampleEmitter};
pub use sim::{SimConfig, Simulation, StepReport};
pub use state::{BoundaryEvent, Field, SimulationState};
