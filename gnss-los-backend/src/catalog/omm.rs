///! CCSDS Orbit Mean-Elements Message records (JSON form, as served by
///! CelesTrak `FORMAT=json`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sgp4::chrono::{NaiveDateTime, Timelike};

/// One OMM mean-element set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct OmmRecord {
    pub object_name: String,
    #[serde(default)]
    pub object_id: Option<String>,
    /// UTC, e.g. "2024-05-23T08:20:49.756704"
    pub epoch: String,
    /// Revolutions per day
    pub mean_motion: f64,
    pub eccentricity: f64,
    /// Degrees
    pub inclination: f64,
    /// Degrees
    pub ra_of_asc_node: f64,
    /// Degrees
    pub arg_of_pericenter: f64,
    /// Degrees
    pub mean_anomaly: f64,
    #[serde(default)]
    pub bstar: f64,
    #[serde(default)]
    pub mean_motion_dot: f64,
    #[serde(default)]
    pub mean_motion_ddot: f64,
    pub norad_cat_id: u64,
    #[serde(default)]
    pub element_set_no: u64,
    #[serde(default)]
    pub rev_at_epoch: u64,
}

const EPOCH_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%d %H:%M:%S%.f"];

pub fn parse_epoch(epoch: &str) -> Result<NaiveDateTime> {
    let epoch = epoch.trim();
    EPOCH_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(epoch, fmt).ok())
        .with_context(|| format!("Unrecognised OMM epoch '{}'", epoch))
}

impl OmmRecord {
    pub fn epoch_datetime(&self) -> Result<NaiveDateTime> {
        parse_epoch(&self.epoch)
    }

    /// Convert to SGP4 elements
    pub fn to_elements(&self) -> Result<sgp4::Elements> {
        let datetime = self
            .epoch_datetime()
            .with_context(|| format!("Bad epoch for {}", self.object_name))?;

        Ok(sgp4::Elements {
            object_name: Some(self.object_name.clone()),
            international_designator: self.object_id.clone(),
            norad_id: self.norad_cat_id,
            classification: sgp4::Classification::Unclassified,
            datetime,
            mean_motion_dot: self.mean_motion_dot,
            mean_motion_ddot: self.mean_motion_ddot,
            drag_term: self.bstar,
            element_set_number: self.element_set_no,
            inclination: self.inclination,
            right_ascension: self.ra_of_asc_node,
            eccentricity: self.eccentricity,
            argument_of_perigee: self.arg_of_pericenter,
            mean_anomaly: self.mean_anomaly,
            mean_motion: self.mean_motion,
            revolution_number: self.rev_at_epoch,
            ephemeris_type: 0,
        })
    }

    /// Build a record from parsed SGP4 elements (TLE → OMM)
    pub fn from_elements(elements: &sgp4::Elements) -> Self {
        let dt = elements.datetime;
        let epoch = format!("{}.{:06}", dt.format("%Y-%m-%dT%H:%M:%S"), dt.nanosecond() / 1_000);

        Self {
            object_name: elements.object_name.clone().unwrap_or_else(|| elements.norad_id.to_string()),
            object_id: elements.international_designator.clone(),
            epoch,
            mean_motion: elements.mean_motion,
            eccentricity: elements.eccentricity,
            inclination: elements.inclination,
            ra_of_asc_node: elements.right_ascension,
            arg_of_pericenter: elements.argument_of_perigee,
            mean_anomaly: elements.mean_anomaly,
            bstar: elements.drag_term,
            mean_motion_dot: elements.mean_motion_dot,
            mean_motion_ddot: elements.mean_motion_ddot,
            norad_cat_id: elements.norad_id,
            element_set_no: elements.element_set_number,
            rev_at_epoch: elements.revolution_number,
        }
    }
}

/// Parse a JSON array of OMM records (a single object is accepted too)
pub fn parse_omm_json(json: &str) -> Result<Vec<OmmRecord>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<OmmRecord>),
        One(Box<OmmRecord>),
    }

    let parsed: OneOrMany = serde_json::from_str(json).context("Failed to deserialize OMM JSON")?;
    Ok(match parsed {
        OneOrMany::Many(records) => records,
        OneOrMany::One(record) => vec![*record],
    })
}
