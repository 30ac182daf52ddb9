use serde::Serialize;
use std::collections::BTreeMap;

/// One named value in a [`SimulationState`] snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Scalar(f64),
    Vector([f64; 3]),
    Series(Vec<f64>),
    Vectors(Vec<[f64; 3]>),
    Points(Vec<[f64; 2]>),
    Flags(Vec<bool>),
}

impl Field {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Field::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<[f64; 3]> {
        match self {
            Field::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            Field::Series(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_points(&self) -> Option<&[[f64; 2]]> {
        match self {
            Field::Points(v) => Some(v),
            _ => None,
        }
    }
}

pub type Fields = BTreeMap<&'static str, Field>;

/// Renderer-facing snapshot of a simulation at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationState {
    pub model: &'static str,
    pub time: f64,
    pub fields: Fields,
}

impl SimulationState {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(Field::as_scalar)
    }
}

/// Discrete occurrence detected during a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BoundaryEvent {
    /// Ground contact reversed a downward velocity.
    Bounced { impact_speed: f64 },
    /// Vertical motion died out on the ground.
    Settled,
    /// Particle `id` decayed this tick.
    Decayed { id: usize },
    /// Particle `id` became fully transparent.
    Faded { id: usize },
    /// The last remaining particle decayed.
    FullyDecayed,
    /// Angular velocity changed sign at `angle`.
    TurningPoint { angle: f64 },
    /// The string passed through its rest shape.
    Flat,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub events: Vec<BoundaryEvent>,
}

impl Diagnostics {
    pub fn push(&mut self, event: BoundaryEvent) {
        log::trace!("boundary event: {:?}", event);
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// New state plus what happened while computing it.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult<S> {
    pub state: S,
    pub diagnostics: Diagnostics,
}

impl<S> StepResult<S> {
    pub fn new(state: S, diagnostics: Diagnostics) -> Self {
        Self { state, diagnostics }
    }

    pub fn quiet(state: S) -> Self {
        Self::new(state, Diagnostics::default())
    }
}
