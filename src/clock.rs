pub const DEFAULT_MAX_DT: f64 = 0.1;

/// How elapsed wall time turns into simulation steps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StepPolicy {
    /// One step per frame with the actual elapsed time.
    #[default]
    Variable,
    /// Fixed-size steps; leftover time carries into later frames.
    Fixed(f64),
}

/// Converts host wall-clock readings into step sizes.
///
/// At most one dt is produced per call, matching one step per rendered frame.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    policy: StepPolicy,
    max_dt: f64,
    last_wall: Option<f64>,
    accumulator: f64,
}

impl SimulationClock {
    pub fn new(policy: StepPolicy, max_dt: f64) -> Self {
        let max_dt = if max_dt.is_finite() && max_dt > 0.0 {
            max_dt
        } else {
            DEFAULT_MAX_DT
        };
        Self {
            policy,
            max_dt,
            last_wall: None,
            accumulator: 0.0,
        }
    }

    pub fn policy(&self) -> StepPolicy {
        self.policy
    }

    pub fn max_dt(&self) -> f64 {
        self.max_dt
    }

    /// Feed an absolute wall-clock reading in seconds.
    ///
    /// The first reading after construction or [`reset`](Self::reset) only
    /// establishes the baseline.
    pub fn tick(&mut self, now: f64) -> Option<f64> {
        if !now.is_finite() {
            return None;
        }
        let last = self.last_wall.replace(now)?;
        self.advance(now - last)
    }

    /// Feed an elapsed interval in seconds.
    pub fn advance(&mut self, elapsed: f64) -> Option<f64> {
        if !(elapsed.is_finite() && elapsed > 0.0) {
            return None;
        }
        let elapsed = elapsed.min(self.max_dt);
        match self.policy {
            StepPolicy::Variable => Some(elapsed),
            StepPolicy::Fixed(step) if step > 0.0 => {
                let cap = self.max_dt.max(step);
                self.accumulator = (self.accumulator + elapsed).min(cap);
                if self.accumulator >= step {
                    self.accumulator -= step;
                    Some(step)
                } else {
                    None
                }
            }
            StepPolicy::Fixed(_) => Some(elapsed),
        }
    }

    /// Forget the baseline and any carried time.
    pub fn reset(&mut self) {
        self.last_wall = None;
        self.accumulator = 0.0;
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(StepPolicy::Variable, DEFAULT_MAX_DT)
    }
}
