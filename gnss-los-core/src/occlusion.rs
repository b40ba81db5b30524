///! Line-of-sight occlusion test against a spherical body centred at the frame origin.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{LosError, Result};

/// Cartesian position in meters, Earth-centred frame
pub type Position = Vector3<f64>;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// How a blocked line is decided once the discriminant is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcclusionModel {
    /// Any intersection of the infinite line through both points blocks.
    #[default]
    InfiniteLine,
    /// Only an intersection lying between the two points blocks.
    Segment,
}

/// Returns `true` when the line from `observer` to `target` does not pass
/// through the sphere of `radius` around the origin.
///
/// An absent position on either side is never visible. The check is made
/// against the infinite line, so a sphere lying behind both points still
/// counts as an obstruction (see [`OcclusionModel::Segment`] for the strict
/// variant).
pub fn is_visible(observer: Option<&Position>, target: Option<&Position>, radius: f64) -> bool {
    match (observer, target) {
        (Some(observer), Some(target)) => discriminant(observer, target, radius) <= 0.0,
        _ => false,
    }
}

/// Same as [`is_visible`] but only blocks when the chord through the sphere
/// overlaps the open segment between the two points.
pub fn is_visible_segment(observer: Option<&Position>, target: Option<&Position>, radius: f64) -> bool {
    let (Some(observer), Some(target)) = (observer, target) else {
        return false;
    };

    let disc = discriminant(observer, target, radius);
    if disc <= 0.0 {
        return true;
    }

    // evaluate in a fixed endpoint order so swapping them cannot change the rounding
    let (from, to) = if observer.as_slice() <= target.as_slice() {
        (observer, target)
    } else {
        (target, observer)
    };
    let direction = to - from;
    let a = direction.norm_squared();
    let half_b = direction.dot(from);
    let root = disc.sqrt();
    let t_enter = (-half_b - root) / a;
    let t_exit = (-half_b + root) / a;

    // blocked iff (t_enter, t_exit) meets (0, 1)
    !(t_enter < 1.0 && t_exit > 0.0)
}

/// Quarter of the ray-sphere discriminant `b² - 4ac`, written as
/// `r²·|B - A|² - |A × B|²`.
///
/// Both terms are unchanged when the endpoints are swapped, so the sign is
/// exactly symmetric, and no large observer-relative terms cancel.
fn discriminant(observer: &Position, target: &Position, radius: f64) -> f64 {
    let chord = (target - observer).norm_squared();
    let moment = observer.cross(target).norm_squared();
    radius * radius * chord - moment
}

/// Spherical occluding body centred at the frame origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Occluder {
    radius: f64,
    model: OcclusionModel,
}

impl Occluder {
    pub fn new(radius: f64) -> Result<Self> {
        Self::with_model(radius, OcclusionModel::default())
    }

    pub fn with_model(radius: f64, model: OcclusionModel) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(LosError::InvalidRadius(radius));
        }
        Ok(Self { radius, model })
    }

    pub fn earth() -> Self {
        Self { radius: EARTH_RADIUS_M, model: OcclusionModel::InfiniteLine }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn model(&self) -> OcclusionModel {
        self.model
    }

    /// Applies the configured model.
    pub fn is_visible(&self, observer: Option<&Position>, target: Option<&Position>) -> bool {
        self.is_visible_with(self.model, observer, target)
    }

    pub fn is_visible_with(
        &self,
        model: OcclusionModel,
        observer: Option<&Position>,
        target: Option<&Position>,
    ) -> bool {
        match model {
            OcclusionModel::InfiniteLine => is_visible(observer, target, self.radius),
            OcclusionModel::Segment => is_visible_segment(observer, target, self.radius),
        }
    }
}
