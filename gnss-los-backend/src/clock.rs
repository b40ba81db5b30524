use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};

/// Simulation time, advanced from wall-clock frame intervals
#[derive(Debug, Clone)]
pub struct SimulationClock {
    current: DateTime<Utc>,
    multiplier: f64,
    animate: bool,
}

impl SimulationClock {
    pub fn new(start: DateTime<Utc>, multiplier: f64) -> Result<Self> {
        Self::check_multiplier(multiplier)?;
        Ok(Self {
            current: start,
            multiplier,
            animate: true,
        })
    }

    fn check_multiplier(multiplier: f64) -> Result<()> {
        if !(multiplier.is_finite() && multiplier >= 0.0) {
            anyhow::bail!("Clock multiplier must be finite and >= 0, got {}", multiplier);
        }
        Ok(())
    }

    pub fn current(&self) -> DateTime<Utc> {
        self.current
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn set_multiplier(&mut self, multiplier: f64) -> Result<()> {
        Self::check_multiplier(multiplier)?;
        self.multiplier = multiplier;
        Ok(())
    }

    pub fn is_animating(&self) -> bool {
        self.animate
    }

    pub fn pause(&mut self) {
        self.animate = false;
    }

    pub fn resume(&mut self) {
        self.animate = true;
    }

    /// Move forward by `real_elapsed × multiplier` unless paused
    pub fn advance(&mut self, real_elapsed: Duration) -> DateTime<Utc> {
        if self.animate {
            let nanos = (real_elapsed.as_secs_f64() * self.multiplier * 1e9).round();
            if nanos > 0.0 {
                let step = TimeDelta::nanoseconds(nanos.min(i64::MAX as f64) as i64);
                self.current = self.current.checked_add_signed(step).unwrap_or(self.current);
            }
        }
        self.current
    }
}
