///! Explicit engine context: occluder, reference body, tracked bodies (grouped, in
///! load order) and the group mask. Built once at startup and passed to every tick.

use std::collections::HashSet;

use crate::body::{BodyId, BodyInfo, Color, GroupTag, PositionSampler, ReferenceBody, TrackedBody};
use crate::error::{LosError, Result};
use crate::mask::{GroupMask, MaskTransition, RenderLayer};
use crate::occlusion::Occluder;

#[derive(Debug)]
pub struct VisibilityContext {
    occluder: Occluder,
    reference: ReferenceBody,
    bodies: Vec<TrackedBody>,
    /// Groups in the order their first body was loaded, with their members
    groups: Vec<(GroupTag, Vec<BodyId>)>,
    mask: GroupMask,
}

impl VisibilityContext {
    pub fn builder(occluder: Occluder, reference: ReferenceBody) -> ContextBuilder {
        ContextBuilder {
            occluder,
            reference,
            bodies: Vec::new(),
            names: HashSet::new(),
        }
    }

    pub fn occluder(&self) -> &Occluder {
        &self.occluder
    }

    pub fn reference(&self) -> &ReferenceBody {
        &self.reference
    }

    /// All tracked bodies in load order
    pub fn bodies(&self) -> &[TrackedBody] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&TrackedBody> {
        self.bodies.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupTag> {
        self.groups.iter().map(|(tag, _)| tag)
    }

    pub fn group_members(&self, group: &GroupTag) -> &[BodyId] {
        self.groups
            .iter()
            .find(|(tag, _)| tag == group)
            .map(|(_, members)| members.as_slice())
            .unwrap_or(&[])
    }

    /// Look a group up by user-typed name (case-insensitive)
    pub fn resolve_group(&self, name: &str) -> Result<&GroupTag> {
        self.groups()
            .find(|tag| tag.matches(name))
            .ok_or_else(|| LosError::UnknownGroup(name.trim().to_string()))
    }

    pub fn mask(&self) -> &GroupMask {
        &self.mask
    }

    /// Whether a body's group is currently shown
    pub fn is_shown(&self, id: BodyId) -> bool {
        self.body(id).is_some_and(|body| self.mask.is_enabled(body.group()))
    }

    /// Apply a group toggle event.
    ///
    /// On a real transition both presentation effects are applied to `layer`
    /// before returning; repeated events for the current state do nothing.
    pub fn set_group_enabled(
        &mut self,
        group: &str,
        enabled: bool,
        layer: &mut dyn RenderLayer,
    ) -> Result<Option<MaskTransition>> {
        let tag = self.resolve_group(group)?.clone();
        let transition = self.mask.set(&tag, enabled);
        if let Some(t) = &transition {
            self.apply_transition(t, layer);
        }
        Ok(transition)
    }

    pub fn toggle_group(
        &mut self,
        group: &str,
        layer: &mut dyn RenderLayer,
    ) -> Result<Option<MaskTransition>> {
        let tag = self.resolve_group(group)?.clone();
        let enabled = self.mask.is_enabled(&tag);
        self.set_group_enabled(tag.as_str(), !enabled, layer)
    }

    fn apply_transition(&self, transition: &MaskTransition, layer: &mut dyn RenderLayer) {
        let shown = transition.to.is_enabled();
        let members = self.group_members(&transition.group);
        layer.set_bodies_shown(&transition.group, members, shown);
        layer.set_segments_shown(&transition.group, members, shown);
        tracing::info!(
            "Group {} {:?} -> {:?} ({} bodies)",
            transition.group,
            transition.from,
            transition.to,
            members.len()
        );
    }
}

/// Collects tracked bodies in load order and validates them.
pub struct ContextBuilder {
    occluder: Occluder,
    reference: ReferenceBody,
    bodies: Vec<(GroupTag, BodyInfo, Box<dyn PositionSampler>)>,
    names: HashSet<String>,
}

impl ContextBuilder {
    /// Append a tracked body. Names must be unique and non-empty.
    pub fn add_body(
        &mut self,
        group: impl Into<GroupTag>,
        name: impl Into<String>,
        color: Color,
        sampler: impl PositionSampler + 'static,
    ) -> Result<BodyId> {
        let group = group.into();
        let name = name.into();
        if group.as_str().trim().is_empty() {
            return Err(LosError::EmptyName("group"));
        }
        if name.trim().is_empty() {
            return Err(LosError::EmptyName("body"));
        }
        if let Some((existing, _, _)) = self
            .bodies
            .iter()
            .find(|(tag, _, _)| *tag != group && tag.matches(group.as_str()))
        {
            return Err(LosError::GroupNameClash {
                existing: existing.to_string(),
                requested: group.to_string(),
            });
        }
        if !self.names.insert(name.clone()) {
            return Err(LosError::DuplicateBody(name));
        }

        let id = BodyId(self.bodies.len());
        self.bodies.push((group, BodyInfo { name, color }, Box::new(sampler)));
        Ok(id)
    }

    /// Chaining variant of [`ContextBuilder::add_body`]
    pub fn with_body(
        mut self,
        group: impl Into<GroupTag>,
        name: impl Into<String>,
        color: Color,
        sampler: impl PositionSampler + 'static,
    ) -> Result<Self> {
        self.add_body(group, name, color, sampler)?;
        Ok(self)
    }

    pub fn build(self) -> VisibilityContext {
        let mut mask = GroupMask::new();
        let mut groups: Vec<(GroupTag, Vec<BodyId>)> = Vec::new();
        let mut bodies = Vec::with_capacity(self.bodies.len());

        for (index, (group, info, sampler)) in self.bodies.into_iter().enumerate() {
            let id = BodyId(index);
            mask.register(&group);
            match groups.iter_mut().find(|(tag, _)| *tag == group) {
                Some((_, members)) => members.push(id),
                None => groups.push((group.clone(), vec![id])),
            }
            bodies.push(TrackedBody::new(id, group, info, sampler));
        }

        tracing::debug!(
            "Visibility context: reference {}, {} bodies in {} groups",
            self.reference.name(),
            bodies.len(),
            groups.len()
        );

        VisibilityContext {
            occluder: self.occluder,
            reference: self.reference,
            bodies,
            groups,
            mask,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::body::FixedPosition;
    use crate::occlusion::Position;

    /// Records every presentation call in order
    #[derive(Default)]
    pub(crate) struct RecordingLayer {
        pub calls: Vec<(String, &'static str, Vec<BodyId>, bool)>,
    }

    impl RenderLayer for RecordingLayer {
        fn set_bodies_shown(&mut self, group: &GroupTag, bodies: &[BodyId], shown: bool) {
            self.calls.push((group.to_string(), "bodies", bodies.to_vec(), shown));
        }

        fn set_segments_shown(&mut self, group: &GroupTag, bodies: &[BodyId], shown: bool) {
            self.calls.push((group.to_string(), "segments", bodies.to_vec(), shown));
        }
    }

    pub(crate) fn fixed(x: f64, y: f64, z: f64) -> FixedPosition {
        FixedPosition(Some(Position::new(x, y, z)))
    }

    fn create_test_context() -> VisibilityContext {
        let reference = ReferenceBody::new("ISS", Color::RED, fixed(8.0e6, 0.0, 0.0));
        VisibilityContext::builder(Occluder::earth(), reference)
            .with_body("GPS", "GPS A", Color::BLUE, fixed(0.0, 8.0e6, 0.0)).unwrap()
            .with_body("Galileo", "GAL A", Color::BLUE, fixed(0.0, -8.0e6, 0.0)).unwrap()
            .with_body("GPS", "GPS B", Color::BLUE, fixed(-8.0e6, 0.0, 0.0)).unwrap()
            .build()
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let ctx = create_test_context();
        let groups: Vec<&str> = ctx.groups().map(GroupTag::as_str).collect();
        assert_eq!(groups, vec!["GPS", "Galileo"]);
        assert_eq!(ctx.group_members(&GroupTag::new("GPS")), &[BodyId(0), BodyId(2)]);
        assert_eq!(ctx.body(BodyId(1)).unwrap().name(), "GAL A");
    }

    #[test]
    fn test_duplicate_and_empty_names_rejected() {
        let reference = ReferenceBody::new("ISS", Color::RED, fixed(8.0e6, 0.0, 0.0));
        let mut builder = VisibilityContext::builder(Occluder::earth(), reference);
        builder.add_body("GPS", "PRN 10", Color::BLUE, fixed(0.0, 1.0, 0.0)).unwrap();
        assert_eq!(
            builder.add_body("GPS", "PRN 10", Color::BLUE, fixed(0.0, 1.0, 0.0)),
            Err(LosError::DuplicateBody("PRN 10".to_string()))
        );
        assert_eq!(
            builder.add_body("", "PRN 11", Color::BLUE, fixed(0.0, 1.0, 0.0)),
            Err(LosError::EmptyName("group"))
        );
        assert_eq!(
            builder.add_body("GPS", " ", Color::BLUE, fixed(0.0, 1.0, 0.0)),
            Err(LosError::EmptyName("body"))
        );
    }

    #[test]
    fn test_group_names_differing_by_case_rejected() {
        let reference = ReferenceBody::new("ISS", Color::RED, fixed(8.0e6, 0.0, 0.0));
        let mut builder = VisibilityContext::builder(Occluder::earth(), reference);
        builder.add_body("GPS", "PRN 1", Color::BLUE, fixed(0.0, 1.0, 0.0)).unwrap();
        assert_eq!(
            builder.add_body("gps", "PRN 2", Color::BLUE, fixed(0.0, 1.0, 0.0)),
            Err(LosError::GroupNameClash {
                existing: "GPS".to_string(),
                requested: "gps".to_string(),
            })
        );
        assert_eq!(builder.add_body("GPS", "PRN 2", Color::BLUE, fixed(0.0, 1.0, 0.0)), Ok(BodyId(1)));

        let ctx = builder.build();
        assert_eq!(ctx.groups().count(), 1);
        assert_eq!(ctx.group_members(&GroupTag::new("GPS")), &[BodyId(0), BodyId(1)]);
    }

    #[test]
    fn test_toggle_applies_both_effects() {
        let mut ctx = create_test_context();
        let mut layer = RecordingLayer::default();

        let t = ctx.set_group_enabled("gps", false, &mut layer).unwrap().unwrap();
        assert_eq!(t.group, GroupTag::new("GPS"));
        assert_eq!(layer.calls.len(), 2);
        assert_eq!(layer.calls[0], ("GPS".to_string(), "bodies", vec![BodyId(0), BodyId(2)], false));
        assert_eq!(layer.calls[1], ("GPS".to_string(), "segments", vec![BodyId(0), BodyId(2)], false));
        assert!(!ctx.is_shown(BodyId(0)));
        assert!(ctx.is_shown(BodyId(1)));

        // same state again: no effects
        assert_eq!(ctx.set_group_enabled("GPS", false, &mut layer).unwrap(), None);
        assert_eq!(layer.calls.len(), 2);

        ctx.toggle_group("GPS", &mut layer).unwrap();
        assert!(ctx.is_shown(BodyId(2)));
        assert_eq!(layer.calls.len(), 4);
    }

    #[test]
    fn test_unknown_group_toggle_is_error() {
        let mut ctx = create_test_context();
        let mut layer = RecordingLayer::default();
        assert_eq!(
            ctx.set_group_enabled("GLONASS", false, &mut layer),
            Err(LosError::UnknownGroup("GLONASS".to_string()))
        );
        assert!(layer.calls.is_empty());
    }
}
