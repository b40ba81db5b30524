///! Terminal stand-in for the 3D viewer: keeps the registered line
///! primitives and the visible-satellites table, and logs when they change.

use std::collections::BTreeMap;

use gnss_los_core::{
    BodyId, Color, GroupTag, PrimitiveRegistry, RenderLayer, ReportConsumer, Segment, VisibilityContext,
    VisibilityReport,
};

#[derive(Debug, Clone)]
pub struct LinePrimitive {
    pub name: String,
    pub color: Color,
    /// Segment visibility flag from the group mask
    pub shown: bool,
    /// Body markers (point + label) visibility flag
    pub body_shown: bool,
    /// Set while a segment is drawn this frame
    pub active: Option<Segment>,
}

#[derive(Debug, Default)]
pub struct ConsolePresenter {
    lines: BTreeMap<BodyId, LinePrimitive>,
    table: Vec<String>,
    reports: u64,
}

impl ConsolePresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self, id: BodyId) -> Option<&LinePrimitive> {
        self.lines.get(&id)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Names currently in the table
    pub fn table(&self) -> &[String] {
        &self.table
    }

    pub fn reports_received(&self) -> u64 {
        self.reports
    }

    /// Pull this frame's segments into the registered primitives. Returns
    /// how many lines are drawn.
    pub fn draw(&mut self, segments: impl IntoIterator<Item = (BodyId, Segment)>) -> usize {
        for line in self.lines.values_mut() {
            line.active = None;
        }
        for (id, segment) in segments {
            match self.lines.get_mut(&id) {
                Some(line) if line.shown => line.active = Some(segment),
                Some(_) => {}
                None => tracing::warn!("Segment for unregistered body {}", id),
            }
        }
        let drawn = self.lines.values().filter(|l| l.active.is_some()).count();
        tracing::trace!("Drew {} LOS line(s)", drawn);
        drawn
    }

    pub fn format_table(report: &VisibilityReport) -> String {
        let mut output = format!(
            "{} sees {} satellite(s) at {}\n",
            report.reference,
            report.len(),
            report.time.format("%Y-%m-%d %H:%M:%S UTC")
        );
        for entry in &report.entries {
            output.push_str(&format!("  {:<10} {}\n", entry.group, entry.name));
        }
        output
    }

    pub fn format_groups(ctx: &VisibilityContext) -> String {
        let mut output = String::new();
        for group in ctx.groups() {
            let state = if ctx.mask().is_enabled(group) { "on" } else { "off" };
            output.push_str(&format!(
                "  {:<10} {:<3} {} bodies\n",
                group,
                state,
                ctx.group_members(group).len()
            ));
        }
        output
    }

    fn set_flags(&mut self, bodies: &[BodyId], f: impl Fn(&mut LinePrimitive)) {
        for id in bodies {
            if let Some(line) = self.lines.get_mut(id) {
                f(line);
            }
        }
    }
}

impl PrimitiveRegistry for ConsolePresenter {
    fn register_line(&mut self, body: BodyId, name: &str, color: Color) {
        self.lines.insert(
            body,
            LinePrimitive {
                name: name.to_string(),
                color,
                shown: true,
                body_shown: true,
                active: None,
            },
        );
    }
}

impl RenderLayer for ConsolePresenter {
    fn set_bodies_shown(&mut self, group: &GroupTag, bodies: &[BodyId], shown: bool) {
        tracing::debug!("{} markers {}", group, if shown { "shown" } else { "hidden" });
        self.set_flags(bodies, |line| line.body_shown = shown);
    }

    fn set_segments_shown(&mut self, group: &GroupTag, bodies: &[BodyId], shown: bool) {
        tracing::debug!("{} LOS lines {}", group, if shown { "shown" } else { "hidden" });
        self.set_flags(bodies, |line| {
            line.shown = shown;
            if !shown {
                line.active = None;
            }
        });
    }
}

impl ReportConsumer for ConsolePresenter {
    fn display(&mut self, report: &VisibilityReport) {
        self.reports += 1;
        let names: Vec<String> = report.names().map(str::to_string).collect();
        if names != self.table {
            tracing::info!("{}", Self::format_table(report).trim_end());
        }
        self.table = names;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gnss_los_core::{Position, ReportEntry};

    fn report(names: &[&str]) -> VisibilityReport {
        VisibilityReport {
            time: Utc::now(),
            reference: "ISS".to_string(),
            entries: names
                .iter()
                .map(|n| ReportEntry {
                    name: n.to_string(),
                    group: GroupTag::new("GPS"),
                })
                .collect(),
        }
    }

    fn segment() -> Segment {
        Segment {
            from: Position::new(7.0e6, 0.0, 0.0),
            to: Position::new(0.0, 2.0e7, 0.0),
        }
    }

    #[test]
    fn test_table_replaced_each_report() {
        let mut presenter = ConsolePresenter::new();
        presenter.display(&report(&["PRN 1", "PRN 2"]));
        assert_eq!(presenter.table(), ["PRN 1", "PRN 2"]);
        presenter.display(&report(&["PRN 2"]));
        assert_eq!(presenter.table(), ["PRN 2"]);
        presenter.display(&report(&[]));
        assert!(presenter.table().is_empty());
        assert_eq!(presenter.reports_received(), 3);
    }

    #[test]
    fn test_draw_respects_segment_flag() {
        let mut presenter = ConsolePresenter::new();
        presenter.register_line(BodyId(0), "PRN 1", Color::YELLOW);
        presenter.register_line(BodyId(1), "E01", Color::YELLOW);
        assert_eq!(presenter.line_count(), 2);

        assert_eq!(presenter.draw([(BodyId(0), segment()), (BodyId(1), segment())]), 2);

        presenter.set_segments_shown(&GroupTag::new("Galileo"), &[BodyId(1)], false);
        assert!(presenter.line(BodyId(1)).unwrap().active.is_none());
        assert_eq!(presenter.draw([(BodyId(0), segment()), (BodyId(1), segment())]), 1);

        // next frame with nothing visible clears the lines
        assert_eq!(presenter.draw(std::iter::empty()), 0);
        assert!(presenter.line(BodyId(0)).unwrap().active.is_none());
    }

    #[test]
    fn test_body_flags() {
        let mut presenter = ConsolePresenter::new();
        presenter.register_line(BodyId(0), "PRN 1", Color::YELLOW);
        presenter.set_bodies_shown(&GroupTag::new("GPS"), &[BodyId(0), BodyId(9)], false);
        let line = presenter.line(BodyId(0)).unwrap();
        assert!(!line.body_shown);
        assert!(line.shown);
    }

    #[test]
    fn test_format_table() {
        let text = ConsolePresenter::format_table(&report(&["PRN 1"]));
        assert!(text.starts_with("ISS sees 1 satellite(s)"));
        assert!(text.contains("GPS"));
        assert!(text.contains("PRN 1"));
    }
}
