use serde::Serialize;

pub const DEFAULT_SAMPLE_INTERVAL: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub time: f64,
    pub value: f64,
}

/// Throttled `(time, metric)` recorder for chart display.
#[derive(Debug, Clone)]
pub struct SampleEmitter {
    interval: f64,
    capacity: Option<usize>,
    samples: Vec<Sample>,
}

impl SampleEmitter {
    pub fn new(interval: f64, capacity: Option<usize>) -> Self {
        let interval = if interval.is_finite() && interval >= 0.0 {
            interval
        } else {
            DEFAULT_SAMPLE_INTERVAL
        };
        Self {
            interval,
            capacity: capacity.filter(|c| *c > 0),
            samples: Vec::new(),
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Append a sample if at least `interval` has passed since the last one.
    ///
    /// Returns whether the sample was kept.
    pub fn record(&mut self, time: f64, value: f64) -> bool {
        if !time.is_finite() {
            return false;
        }
        if let Some(last) = self.samples.last() {
            if time <= last.time || time - last.time < self.interval {
                return false;
            }
        }
        self.samples.push(Sample { time, value });
        if let Some(cap) = self.capacity {
            if self.samples.len() > cap {
                let excess = self.samples.len() - cap;
                self.samples.drain(..excess);
            }
        }
        true
    }

    pub fn series(&self) -> &[Sample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for SampleEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_INTERVAL, None)
    }
}
