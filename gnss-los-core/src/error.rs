///! Construction-time errors for the visibility engine.
///!
///! Ticks never fail; an unavailable position is a normal "not visible"
///! outcome. Everything here is a configuration mistake caught while the
///! context is being built.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LosError {
    /// Occluder radius must be finite and strictly positive
    #[error("occluder radius must be finite and > 0, got {0}")]
    InvalidRadius(f64),

    /// Group toggles must name a group that was loaded
    #[error("unknown group '{0}'")]
    UnknownGroup(String),

    /// Two tracked bodies share the same display name
    #[error("duplicate tracked body '{0}'")]
    DuplicateBody(String),

    /// Group names differ only by case, so toggles could not tell them apart
    #[error("group '{requested}' clashes with existing group '{existing}'")]
    GroupNameClash { existing: String, requested: String },

    /// Bodies and groups need a non-empty display name
    #[error("empty {0} name")]
    EmptyName(&'static str),
}

pub type Result<T> = std::result::Result<T, LosError>;
