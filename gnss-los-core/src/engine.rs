///! One tick of the whole pipeline: tracker, then segment publisher and
///! report sink, all at the same simulation time.

use chrono::{DateTime, Utc};

use crate::body::{BodyId, Color};
use crate::context::VisibilityContext;
use crate::error::Result;
use crate::mask::{MaskTransition, RenderLayer};
use crate::report::{ReportConsumer, ReportSink, VisibilityReport};
use crate::segment::{PrimitiveRegistry, Segment, SegmentPublisher};
use crate::tracker::{TickStats, VisibilitySet, VisibilityTracker};

#[derive(Debug)]
pub struct VisibilityEngine {
    context: VisibilityContext,
    tracker: VisibilityTracker,
    publisher: SegmentPublisher,
    sink: ReportSink,
}

impl VisibilityEngine {
    pub fn new(context: VisibilityContext) -> Self {
        Self::with_publisher(context, SegmentPublisher::new())
    }

    pub fn with_publisher(context: VisibilityContext, publisher: SegmentPublisher) -> Self {
        Self {
            context,
            tracker: VisibilityTracker::new(),
            publisher,
            sink: ReportSink::new(),
        }
    }

    pub fn context(&self) -> &VisibilityContext {
        &self.context
    }

    /// Register one line primitive per tracked body with the renderer
    pub fn register_primitives(&self, registry: &mut dyn PrimitiveRegistry) {
        self.publisher.register(&self.context, registry);
    }

    /// Run one tick at `time` and hand the report to `consumer`.
    pub fn tick(&mut self, time: DateTime<Utc>, consumer: &mut dyn ReportConsumer) -> &VisibilityReport {
        let set = self.tracker.tick(&self.context, time);
        self.publisher.on_tick(set.time());
        let report = self.sink.on_tick(&self.context, set);
        consumer.display(report);
        report
    }

    /// Segment accessor for the renderer, evaluated at the last tick's time
    pub fn segment(&self, id: BodyId) -> Option<Segment> {
        self.publisher.segment(&self.context, id)
    }

    /// Color the renderer draws the line for `id` in
    pub fn line_color(&self, id: BodyId) -> Option<Color> {
        self.context.body(id).map(|body| self.publisher.line_color(body))
    }

    pub fn segments(&self) -> impl Iterator<Item = (BodyId, Segment)> + '_ {
        self.publisher.segments(&self.context)
    }

    pub fn visibility(&self) -> Option<&VisibilitySet> {
        self.tracker.current()
    }

    pub fn report(&self) -> Option<&VisibilityReport> {
        self.sink.current()
    }

    pub fn stats(&self) -> TickStats {
        self.tracker.stats()
    }

    /// Group toggle event from the UI
    pub fn set_group_enabled(
        &mut self,
        group: &str,
        enabled: bool,
        layer: &mut dyn RenderLayer,
    ) -> Result<Option<MaskTransition>> {
        self.context.set_group_enabled(group, enabled, layer)
    }

    pub fn toggle_group(&mut self, group: &str, layer: &mut dyn RenderLayer) -> Result<Option<MaskTransition>> {
        self.context.toggle_group(group, layer)
    }
}
