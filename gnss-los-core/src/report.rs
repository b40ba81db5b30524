///! Ordered list of currently visible body names, for the UI table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::body::GroupTag;
use crate::context::VisibilityContext;
use crate::tracker::VisibilitySet;

/// One visible row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub name: String,
    pub group: GroupTag,
}

/// Everything the table shows for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityReport {
    pub time: DateTime<Utc>,
    pub reference: String,
    /// Visible, unmasked bodies in load order
    pub entries: Vec<ReportEntry>,
}

impl VisibilityReport {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Receives the full report once per tick and replaces whatever it showed
pub trait ReportConsumer {
    fn display(&mut self, report: &VisibilityReport);
}

#[derive(Debug, Clone, Default)]
pub struct ReportSink {
    current: Option<VisibilityReport>,
}

impl ReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the report from `set`. The previous report is discarded.
    pub fn on_tick(&mut self, ctx: &VisibilityContext, set: &VisibilitySet) -> &VisibilityReport {
        let entries = ctx
            .bodies()
            .iter()
            .filter(|body| set.is_visible(body.id()) && ctx.mask().is_enabled(body.group()))
            .map(|body| ReportEntry {
                name: body.name().to_string(),
                group: body.group().clone(),
            })
            .collect();

        self.current.insert(VisibilityReport {
            time: set.time(),
            reference: ctx.reference().name().to_string(),
            entries,
        })
    }

    pub fn current(&self) -> Option<&VisibilityReport> {
        self.current.as_ref()
    }
}
