///! Conditional LOS line segments, one per tracked body.
///!
///! Segments are recomputed on every access at the time of the last tick,
///! so what the renderer draws cannot disagree with the visibility set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::body::{BodyId, Color, TrackedBody};
use crate::context::VisibilityContext;
use crate::occlusion::Position;

/// Endpoints of a drawable LOS line (reference body → tracked body)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: Position,
    pub to: Position,
}

impl Segment {
    pub fn length(&self) -> f64 {
        (self.to - self.from).norm()
    }
}

/// Registration of drawable line primitives with the external renderer
pub trait PrimitiveRegistry {
    fn register_line(&mut self, body: BodyId, name: &str, color: Color);
}

#[derive(Debug, Clone, Default)]
pub struct SegmentPublisher {
    time: Option<DateTime<Utc>>,
    line_color: Option<Color>,
}

impl SegmentPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw every line in one color instead of the body's own color
    pub fn with_line_color(mut self, color: Color) -> Self {
        self.line_color = Some(color);
        self
    }

    /// Color the line for `body` is drawn in
    pub fn line_color(&self, body: &TrackedBody) -> Color {
        self.line_color.unwrap_or(body.color())
    }

    /// Register one line primitive per tracked body, in load order.
    pub fn register(&self, ctx: &VisibilityContext, registry: &mut dyn PrimitiveRegistry) {
        for body in ctx.bodies() {
            registry.register_line(body.id(), body.name(), self.line_color(body));
        }
        tracing::debug!("Registered {} LOS line primitives", ctx.len());
    }

    /// Pin the evaluation time to the tick that just ran
    pub fn on_tick(&mut self, time: DateTime<Utc>) {
        self.time = Some(time);
    }

    /// Current segment for `id`, or `None` before the first tick, when the
    /// pair is occluded, when a position is unknown, or when the body's group
    /// is masked off.
    pub fn segment(&self, ctx: &VisibilityContext, id: BodyId) -> Option<Segment> {
        let time = self.time?;
        Self::segment_at(ctx, id, time)
    }

    /// Evaluate a segment at an explicit time
    pub fn segment_at(ctx: &VisibilityContext, id: BodyId, time: DateTime<Utc>) -> Option<Segment> {
        let body = ctx.body(id)?;
        if !ctx.mask().is_enabled(body.group()) {
            return None;
        }

        let from = ctx.reference().position_at(time)?;
        let to = body.position_at(time)?;
        ctx.occluder()
            .is_visible(Some(&from), Some(&to))
            .then_some(Segment { from, to })
    }

    /// All currently drawable segments in load order
    pub fn segments<'a>(&'a self, ctx: &'a VisibilityContext) -> impl Iterator<Item = (BodyId, Segment)> + 'a {
        ctx.bodies()
            .iter()
            .filter_map(move |body| self.segment(ctx, body.id()).map(|s| (body.id(), s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{FixedPosition, ReferenceBody};
    use crate::context::tests::{fixed, RecordingLayer};
    use crate::occlusion::Occluder;
    use crate::tracker::VisibilityTracker;
    use chrono::TimeZone;

    #[derive(Default)]
    struct Registry {
        lines: Vec<(BodyId, String, Color)>,
    }

    impl PrimitiveRegistry for Registry {
        fn register_line(&mut self, body: BodyId, name: &str, color: Color) {
            self.lines.push((body, name.to_string(), color));
        }
    }

    fn create_test_context() -> VisibilityContext {
        VisibilityContext::builder(
            Occluder::earth(),
            ReferenceBody::new("ISS", Color::RED, fixed(8_000_000.0, 0.0, 0.0)),
        )
        .with_body("GPS", "A", Color::BLUE, fixed(0.0, 20_000_000.0, 0.0)).unwrap()
        .with_body("GPS", "B", Color::BLUE, fixed(-8_000_000.0, 0.0, 0.0)).unwrap()
        .with_body("Galileo", "C", Color::WHITE, fixed(0.0, 0.0, 20_000_000.0)).unwrap()
        .with_body("Galileo", "D", Color::WHITE, FixedPosition(None)).unwrap()
        .build()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 23, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_register_one_line_per_body() {
        let ctx = create_test_context();
        let mut registry = Registry::default();
        SegmentPublisher::new().with_line_color(Color::YELLOW).register(&ctx, &mut registry);
        assert_eq!(registry.lines.len(), 4);
        assert_eq!(registry.lines[2], (BodyId(2), "C".to_string(), Color::YELLOW));

        let mut registry = Registry::default();
        SegmentPublisher::new().register(&ctx, &mut registry);
        assert_eq!(registry.lines[0].2, Color::BLUE);
        assert_eq!(registry.lines[2].2, Color::WHITE);
    }

    #[test]
    fn test_segment_absent_before_first_tick() {
        let ctx = create_test_context();
        assert_eq!(SegmentPublisher::new().segment(&ctx, BodyId(0)), None);
    }

    #[test]
    fn test_segment_follows_visibility() {
        let ctx = create_test_context();
        let mut tracker = VisibilityTracker::new();
        let mut publisher = SegmentPublisher::new();
        let set = tracker.tick(&ctx, t0()).clone();
        publisher.on_tick(set.time());

        for body in ctx.bodies() {
            assert_eq!(publisher.segment(&ctx, body.id()).is_some(), set.is_visible(body.id()));
        }

        let seg = publisher.segment(&ctx, BodyId(0)).unwrap();
        assert_eq!(seg.from, Position::new(8_000_000.0, 0.0, 0.0));
        assert_eq!(seg.to, Position::new(0.0, 20_000_000.0, 0.0));
        assert_eq!(seg.length(), (8.0e6_f64.powi(2) + 2.0e7_f64.powi(2)).sqrt());
        assert_eq!(publisher.segments(&ctx).map(|(id, _)| id).collect::<Vec<_>>(), vec![BodyId(0), BodyId(2)]);
    }

    #[test]
    fn test_masked_group_hides_segments_only() {
        let mut ctx = create_test_context();
        let mut layer = RecordingLayer::default();
        let mut tracker = VisibilityTracker::new();
        let mut publisher = SegmentPublisher::new();

        let before = tracker.tick(&ctx, t0()).clone();
        ctx.set_group_enabled("Galileo", false, &mut layer).unwrap();
        let after = tracker.tick(&ctx, t0()).clone();
        publisher.on_tick(t0());

        assert_eq!(before, after);
        assert!(after.is_visible(BodyId(2)));
        assert_eq!(publisher.segment(&ctx, BodyId(2)), None);
        assert!(publisher.segment(&ctx, BodyId(0)).is_some());
    }
}
