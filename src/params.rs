use crate::error::{Result, SimError};
use serde::Serialize;
use std::collections::BTreeMap;

/// Declaration of one tunable parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: f64,
    /// Inclusive `[min, max]`; values outside are clamped.
    pub range: Option<(f64, f64)>,
    /// Quantization step, measured from `min` (or zero without a range).
    pub step: Option<f64>,
    /// Changing this parameter re-creates the model state on the next step.
    pub restarts: bool,
}

impl ParamSpec {
    pub fn new(name: &'static str, default: f64) -> Self {
        Self {
            name,
            default,
            range: None,
            step: None,
            restarts: false,
        }
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn restarts(mut self) -> Self {
        self.restarts = true;
        self
    }

    /// Snap to the step grid, then clamp into range.
    pub fn clamp(&self, value: f64) -> f64 {
        let mut v = value;
        if let Some(step) = self.step.filter(|s| *s > 0.0) {
            if v.is_finite() {
                let base = self.range.map(|(min, _)| min).unwrap_or(0.0);
                let snapped = base + ((v - base) / step).round() * step;
                // keep values already on the grid bit-exact
                if (snapped - v).abs() > step * 1.0e-9 {
                    v = snapped;
                }
            }
        }
        match self.range {
            Some((min, max)) => v.clamp(min, max),
            None => v,
        }
    }
}

/// Immutable copy of all parameter values, taken once at the start of a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSnapshot {
    values: BTreeMap<&'static str, f64>,
}

impl ParamSnapshot {
    pub fn get(&self, name: &str) -> Result<f64> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownParameter(name.to_string()))
    }

    /// Value that must be finite and strictly positive (mass, length, size).
    pub fn positive(&self, name: &str) -> Result<f64> {
        let v = self.get(name)?;
        if v.is_finite() && v > 0.0 {
            Ok(v)
        } else {
            Err(SimError::invalid(name, v, "must be positive"))
        }
    }

    /// Value that must be finite and not negative (rates, densities).
    pub fn non_negative(&self, name: &str) -> Result<f64> {
        let v = self.get(name)?;
        if v.is_finite() && v >= 0.0 {
            Ok(v)
        } else {
            Err(SimError::invalid(name, v, "must not be negative"))
        }
    }

    /// Finite value of any sign.
    pub fn finite(&self, name: &str) -> Result<f64> {
        let v = self.get(name)?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(SimError::invalid(name, v, "must be finite"))
        }
    }

    /// Positive integer count, rounded from the stored value.
    pub fn count(&self, name: &str) -> Result<usize> {
        let v = self.positive(name)?.round();
        if v < 1.0 {
            return Err(SimError::invalid(name, v, "must be at least 1"));
        }
        Ok(v as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

/// Live, externally mutable parameters of one simulation.
///
/// Only the UI side writes here; the simulation reads a [`ParamSnapshot`]
/// at the start of each step.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    specs: Vec<ParamSpec>,
    values: Vec<f64>,
    dirty: Vec<bool>,
}

impl ParameterStore {
    pub fn new(specs: Vec<ParamSpec>) -> Self {
        let values = specs.iter().map(|s| s.clamp(s.default)).collect();
        let dirty = vec![false; specs.len()];
        Self {
            specs,
            values,
            dirty,
        }
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.specs
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| SimError::UnknownParameter(name.to_string()))
    }

    /// Store `value` (clamped) and mark the parameter dirty.
    ///
    /// Returns the value actually stored. NaN leaves the parameter unchanged.
    pub fn set(&mut self, name: &str, value: f64) -> Result<f64> {
        let i = self.index_of(name)?;
        if value.is_nan() {
            log::warn!("ignoring NaN for parameter '{}'", name);
            return Ok(self.values[i]);
        }
        let stored = self.specs[i].clamp(value);
        if stored != value {
            log::debug!("parameter '{}': {} clamped to {}", name, value, stored);
        }
        self.values[i] = stored;
        self.dirty[i] = true;
        Ok(stored)
    }

    pub fn get(&self, name: &str) -> Result<f64> {
        Ok(self.values[self.index_of(name)?])
    }

    pub fn spec(&self, name: &str) -> Option<&ParamSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            values: self
                .specs
                .iter()
                .zip(&self.values)
                .map(|(s, v)| (s.name, *v))
                .collect(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.iter().any(|d| *d)
    }

    /// Names changed since the last [`take_dirty`](Self::take_dirty).
    pub fn dirty_names(&self) -> Vec<&'static str> {
        self.specs
            .iter()
            .zip(&self.dirty)
            .filter(|(_, dirty)| **dirty)
            .map(|(spec, _)| spec.name)
            .collect()
    }

    /// Names changed since the last call, clearing the dirty marks.
    pub fn take_dirty(&mut self) -> Vec<&'static str> {
        let mut out = Vec::new();
        for (spec, dirty) in self.specs.iter().zip(self.dirty.iter_mut()) {
            if *dirty {
                out.push(spec.name);
                *dirty = false;
            }
        }
        out
    }

    /// Overwrite every value from a snapshot of this store and clear dirty marks.
    pub fn restore(&mut self, snapshot: &ParamSnapshot) {
        for (spec, value) in self.specs.iter().zip(self.values.iter_mut()) {
            if let Some(v) = snapshot.values.get(spec.name) {
                *value = *v;
            }
        }
        self.dirty.iter_mut().for_each(|d| *d = false);
    }

    /// Store without ranges or steps, so tests can hand models bad values.
    #[cfg(test)]
    pub(crate) fn unclamped(specs: Vec<ParamSpec>) -> Self {
        Self::new(
            specs
                .into_iter()
                .map(|s| ParamSpec {
                    range: None,
                    step: None,
                    ..s
                })
                .collect(),
        )
    }
}
