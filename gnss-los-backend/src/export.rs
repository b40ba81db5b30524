///! Periodic JSON snapshot of the visibility table and LOS lines, for
///! external viewers that poll a file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gnss_los_core::{GroupTag, Position, ReportEntry, TickStats, VisibilityEngine};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLine {
    pub name: String,
    pub group: GroupTag,
    /// Line color, which may differ from the body color
    pub color: String,
    /// Meters
    pub from: [f64; 3],
    pub to: [f64; 3],
    pub length_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub time: DateTime<Utc>,
    pub reference: String,
    pub reference_color: String,
    pub visible: Vec<ReportEntry>,
    pub lines: Vec<SnapshotLine>,
    pub stats: TickStats,
}

fn to_array(p: &Position) -> [f64; 3] {
    [p.x, p.y, p.z]
}

impl Snapshot {
    /// State of `engine` as of its last tick; `None` before the first tick
    pub fn capture(engine: &VisibilityEngine) -> Option<Self> {
        let report = engine.report()?;
        let ctx = engine.context();

        let lines = engine
            .segments()
            .filter_map(|(id, segment)| {
                let body = ctx.body(id)?;
                Some(SnapshotLine {
                    name: body.name().to_string(),
                    group: body.group().clone(),
                    color: engine.line_color(id)?.to_hex(),
                    from: to_array(&segment.from),
                    to: to_array(&segment.to),
                    length_m: segment.length(),
                })
            })
            .collect();

        Some(Self {
            time: report.time,
            reference: report.reference.clone(),
            reference_color: ctx.reference().info().color.to_hex(),
            visible: report.entries.clone(),
            lines,
            stats: engine.stats(),
        })
    }
}

pub struct SnapshotExporter {
    path: PathBuf,
    every_ticks: u64,
    ticks: u64,
}

impl SnapshotExporter {
    pub fn new(path: impl Into<PathBuf>, every_ticks: u64) -> Self {
        Self {
            path: path.into(),
            every_ticks: every_ticks.max(1),
            ticks: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Count a tick and write a snapshot when due. Returns whether a file
    /// was written.
    pub fn on_tick(&mut self, engine: &VisibilityEngine) -> Result<bool> {
        self.ticks += 1;
        if self.ticks % self.every_ticks != 0 {
            return Ok(false);
        }
        let Some(snapshot) = Snapshot::capture(engine) else {
            return Ok(false);
        };
        self.write(&snapshot)?;
        Ok(true)
    }

    /// Write through a temporary file so readers never see a partial snapshot
    pub fn write(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&tmp, json).with_context(|| format!("Failed to write {:?}", tmp))?;
        std::fs::rename(&tmp, &self.path).with_context(|| format!("Failed to replace {:?}", self.path))?;
        tracing::trace!("Snapshot written to {:?}", self.path);
        Ok(())
    }
}
