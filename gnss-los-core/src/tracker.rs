///! Per-tick visibility computation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::body::BodyId;
use crate::context::VisibilityContext;

/// Snapshot of which tracked bodies the reference body can see at `time`.
///
/// Indexed by [`BodyId`]; overwritten on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilitySet {
    time: DateTime<Utc>,
    entries: Vec<bool>,
}

impl VisibilitySet {
    pub fn empty(time: DateTime<Utc>, len: usize) -> Self {
        Self { time, entries: vec![false; len] }
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn is_visible(&self, id: BodyId) -> bool {
        self.entries.get(id.index()).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyId, bool)> + '_ {
        self.entries.iter().enumerate().map(|(i, v)| (BodyId(i), *v))
    }

    /// Visible bodies in load order
    pub fn visible(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.iter().filter_map(|(id, v)| v.then_some(id))
    }

    pub fn visible_count(&self) -> usize {
        self.entries.iter().filter(|v| **v).count()
    }
}

/// Counters from the last tick, for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStats {
    pub visible: usize,
    /// Bodies without a position at the tick time
    pub unknown: usize,
    pub reference_absent: bool,
}

/// Owns the latest [`VisibilitySet`]; nothing else survives between ticks.
#[derive(Debug, Clone, Default)]
pub struct VisibilityTracker {
    current: Option<VisibilitySet>,
    stats: TickStats,
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute visibility of every tracked body at `time`.
    ///
    /// If the reference position is unknown every body is marked not
    /// visible without sampling the tracked bodies.
    pub fn tick(&mut self, ctx: &VisibilityContext, time: DateTime<Utc>) -> &VisibilitySet {
        let mut set = VisibilitySet::empty(time, ctx.len());
        let mut stats = TickStats::default();

        match ctx.reference().position_at(time) {
            None => {
                stats.reference_absent = true;
                tracing::trace!("{} has no position at {}, nothing visible", ctx.reference().name(), time);
            }
            Some(observer) => {
                let occluder = ctx.occluder();
                for body in ctx.bodies() {
                    let target = body.position_at(time);
                    if target.is_none() {
                        stats.unknown += 1;
                    }
                    let visible = occluder.is_visible(Some(&observer), target.as_ref());
                    set.entries[body.id().index()] = visible;
                }
                stats.visible = set.visible_count();
            }
        }

        tracing::trace!(
            "tick {}: {}/{} visible, {} unknown",
            time,
            stats.visible,
            set.len(),
            stats.unknown
        );

        self.stats = stats;
        self.current.insert(set)
    }

    /// Set from the most recent tick
    pub fn current(&self) -> Option<&VisibilitySet> {
        self.current.as_ref()
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    /// Time of the most recent tick
    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.current.as_ref().map(VisibilitySet::time)
    }
}
