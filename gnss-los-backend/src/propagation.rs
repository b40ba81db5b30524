///! SGP4 position sampling for catalog bodies.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use gnss_los_core::{Position, PositionSampler};
use sgp4::{Constants, MinutesSinceEpoch};

/// Samples an SGP4 orbit in an Earth-centred inertial frame (TEME), meters.
pub struct Sgp4Sampler {
    name: String,
    constants: Constants,
    epoch_ms: i64,
}

impl Sgp4Sampler {
    pub fn from_elements(elements: &sgp4::Elements) -> Result<Self> {
        let name = elements
            .object_name
            .clone()
            .unwrap_or_else(|| elements.norad_id.to_string());
        let constants = Constants::from_elements(elements)
            .map_err(|e| anyhow!("SGP4 initialisation failed for {}: {}", name, e))?;

        Ok(Self {
            name,
            constants,
            epoch_ms: elements.datetime.and_utc().timestamp_millis(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn epoch(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.epoch_ms)
    }

    pub fn minutes_since_epoch(&self, time: DateTime<Utc>) -> f64 {
        (time.timestamp_millis() - self.epoch_ms) as f64 / 60_000.0
    }
}

impl PositionSampler for Sgp4Sampler {
    fn position_at(&self, time: DateTime<Utc>) -> Option<Position> {
        match self.constants.propagate(MinutesSinceEpoch(self.minutes_since_epoch(time))) {
            Ok(prediction) => {
                let [x, y, z] = prediction.position;
                Some(Position::new(x, y, z) * 1000.0)
            }
            Err(e) => {
                tracing::trace!("No position for {} at {}: {}", self.name, time, e);
                None
            }
        }
    }
}
