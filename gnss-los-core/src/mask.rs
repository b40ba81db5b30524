///! Per-group presentation mask.
///!
///! The mask only gates what is shown. LOS keeps being computed for
///! disabled groups so re-enabling one is immediate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::body::{BodyId, GroupTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaskState {
    Enabled,
    Disabled,
}

impl MaskState {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled { MaskState::Enabled } else { MaskState::Disabled }
    }

    pub fn is_enabled(self) -> bool {
        self == MaskState::Enabled
    }
}

/// A group changing state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskTransition {
    pub group: GroupTag,
    pub from: MaskState,
    pub to: MaskState,
}

/// Set of enabled groups. Groups start enabled when registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMask {
    known: BTreeSet<GroupTag>,
    enabled: BTreeSet<GroupTag>,
}

impl GroupMask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group in the `Enabled` state. No-op if already known.
    pub fn register(&mut self, group: &GroupTag) {
        if self.known.insert(group.clone()) {
            self.enabled.insert(group.clone());
        }
    }

    pub fn is_known(&self, group: &GroupTag) -> bool {
        self.known.contains(group)
    }

    pub fn is_enabled(&self, group: &GroupTag) -> bool {
        self.enabled.contains(group)
    }

    pub fn state(&self, group: &GroupTag) -> Option<MaskState> {
        self.is_known(group)
            .then(|| MaskState::from_enabled(self.is_enabled(group)))
    }

    /// Set a known group's state. Returns the transition if the state changed.
    ///
    /// Unknown groups are ignored and yield `None`; callers resolve names first.
    pub fn set(&mut self, group: &GroupTag, enabled: bool) -> Option<MaskTransition> {
        let from = self.state(group)?;
        let to = MaskState::from_enabled(enabled);
        if from == to {
            return None;
        }

        if enabled {
            self.enabled.insert(group.clone());
        } else {
            self.enabled.remove(group);
        }
        Some(MaskTransition { group: group.clone(), from, to })
    }

    pub fn toggle(&mut self, group: &GroupTag) -> Option<MaskTransition> {
        let enabled = self.is_enabled(group);
        self.set(group, !enabled)
    }

    pub fn enabled_groups(&self) -> impl Iterator<Item = &GroupTag> {
        self.enabled.iter()
    }
}

/// Presentation side effects of a mask transition.
///
/// Implemented by whatever draws bodies and segments. Both calls are made
/// back to back for one transition.
pub trait RenderLayer {
    /// Show or hide the bodies (points, labels, markers) of a group
    fn set_bodies_shown(&mut self, group: &GroupTag, bodies: &[BodyId], shown: bool);

    /// Show or hide the LOS segments of a group
    fn set_segments_shown(&mut self, group: &GroupTag, bodies: &[BodyId], shown: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_start_enabled() {
        let mut mask = GroupMask::new();
        let gps = GroupTag::new("GPS");
        mask.register(&gps);
        assert_eq!(mask.state(&gps), Some(MaskState::Enabled));
        assert_eq!(mask.state(&GroupTag::new("Galileo")), None);
    }

    #[test]
    fn test_set_reports_only_real_transitions() {
        let mut mask = GroupMask::new();
        let gps = GroupTag::new("GPS");
        mask.register(&gps);

        assert_eq!(mask.set(&gps, true), None);
        let t = mask.set(&gps, false).unwrap();
        assert_eq!(t.from, MaskState::Enabled);
        assert_eq!(t.to, MaskState::Disabled);
        assert!(!mask.is_enabled(&gps));
        assert_eq!(mask.set(&gps, false), None);

        let t = mask.toggle(&gps).unwrap();
        assert_eq!(t.to, MaskState::Enabled);
    }

    #[test]
    fn test_register_does_not_reenable() {
        let mut mask = GroupMask::new();
        let glo = GroupTag::new("GLONASS");
        mask.register(&glo);
        mask.set(&glo, false);
        mask.register(&glo);
        assert!(!mask.is_enabled(&glo));
    }

    #[test]
    fn test_unknown_group_is_ignored() {
        let mut mask = GroupMask::new();
        assert_eq!(mask.set(&GroupTag::new("BeiDou"), false), None);
        assert_eq!(mask.enabled_groups().count(), 0);
    }
}
