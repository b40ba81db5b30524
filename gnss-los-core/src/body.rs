///! Tracked and reference bodies, and the position sampling seam.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::occlusion::Position;

/// Index of a tracked body in load order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub usize);

impl BodyId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Constellation tag, e.g. "GPS", "Galileo", "GLONASS"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupTag(String);

impl GroupTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive match, used for toggles typed by a user
    pub fn matches(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name.trim())
    }
}

impl fmt::Display for GroupTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for GroupTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Display color (RGBA, 0-255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse "#rrggbb" or "#rrggbbaa"
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self { r: channel(0)?, g: channel(2)?, b: channel(4)?, a: channel(6)? }),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Samples a body's position at a simulation time.
///
/// `None` means the state is not known at that time (before the element
/// epoch, a propagation gap, a decayed object). It is not an error.
pub trait PositionSampler {
    fn position_at(&self, time: DateTime<Utc>) -> Option<Position>;
}

impl<F> PositionSampler for F
where
    F: Fn(DateTime<Utc>) -> Option<Position>,
{
    fn position_at(&self, time: DateTime<Utc>) -> Option<Position> {
        self(time)
    }
}

/// A body that never moves, or is never known
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPosition(pub Option<Position>);

impl PositionSampler for FixedPosition {
    fn position_at(&self, _time: DateTime<Utc>) -> Option<Position> {
        self.0
    }
}

/// Identity shared by tracked and reference bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyInfo {
    pub name: String,
    pub color: Color,
}

/// The observer every tracked body is tested against (e.g. the ISS).
pub struct ReferenceBody {
    info: BodyInfo,
    sampler: Box<dyn PositionSampler>,
}

impl ReferenceBody {
    pub fn new(name: impl Into<String>, color: Color, sampler: impl PositionSampler + 'static) -> Self {
        Self {
            info: BodyInfo { name: name.into(), color },
            sampler: Box::new(sampler),
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &BodyInfo {
        &self.info
    }

    pub fn position_at(&self, time: DateTime<Utc>) -> Option<Position> {
        self.sampler.position_at(time)
    }
}

impl fmt::Debug for ReferenceBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceBody").field("info", &self.info).finish_non_exhaustive()
    }
}

/// A satellite whose visibility from the reference body is monitored.
pub struct TrackedBody {
    id: BodyId,
    group: GroupTag,
    info: BodyInfo,
    sampler: Box<dyn PositionSampler>,
}

impl TrackedBody {
    pub(crate) fn new(id: BodyId, group: GroupTag, info: BodyInfo, sampler: Box<dyn PositionSampler>) -> Self {
        Self { id, group, info, sampler }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn group(&self) -> &GroupTag {
        &self.group
    }

    pub fn color(&self) -> Color {
        self.info.color
    }

    pub fn position_at(&self, time: DateTime<Utc>) -> Option<Position> {
        self.sampler.position_at(time)
    }
}

impl fmt::Debug for TrackedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedBody")
            .field("id", &self.id)
            .field("group", &self.group)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#ff0000"), Some(Color::RED));
        assert_eq!(Color::from_hex("#0000ff80"), Some(Color { r: 0, g: 0, b: 255, a: 128 }));
        assert_eq!(Color::from_hex("ff0000"), None);
        assert_eq!(Color::from_hex("#ff00"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
        assert_eq!(Color::YELLOW.to_hex(), "#ffff00ff");
    }

    #[test]
    fn test_group_tag_matches_case_insensitively() {
        let tag = GroupTag::new("GLONASS");
        assert!(tag.matches("glonass"));
        assert!(tag.matches("  Glonass "));
        assert!(!tag.matches("GPS"));
    }

    #[test]
    fn test_closure_sampler() {
        let sampler = |_t: DateTime<Utc>| Some(Position::new(1.0, 2.0, 3.0));
        let body = ReferenceBody::new("ISS (ZARYA)", Color::RED, sampler);
        assert_eq!(body.position_at(Utc::now()), Some(Position::new(1.0, 2.0, 3.0)));
        assert_eq!(body.name(), "ISS (ZARYA)");
    }
}
