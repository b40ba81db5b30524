///! Scene setup from configuration and the frame loop.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gnss_los_core::{Occluder, ReferenceBody, SegmentPublisher, VisibilityContext, VisibilityEngine};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::MissedTickBehavior;

use crate::catalog::load_elements;
use crate::clock::SimulationClock;
use crate::config::BackendConfig;
use crate::console::{parse_command, Command, HELP};
use crate::export::SnapshotExporter;
use crate::presenter::ConsolePresenter;
use crate::propagation::Sgp4Sampler;

/// Build the engine from the configured catalogs. Returns it with the
/// simulation start time.
pub fn build_engine(config: &BackendConfig) -> Result<(VisibilityEngine, DateTime<Utc>)> {
    let occluder = Occluder::with_model(config.occluder_radius_m, config.occlusion_model)?;

    let elements = load_elements(&config.reference.source).context("Failed to load reference body")?;
    let first = elements.first().context("Reference catalog is empty")?;
    if elements.len() > 1 {
        tracing::warn!(
            "Reference catalog {:?} has {} records, using the first",
            config.reference.source,
            elements.len()
        );
    }
    let sampler = Sgp4Sampler::from_elements(first)?;
    let epoch = sampler.epoch();
    let name = config.reference.name.clone().unwrap_or_else(|| sampler.name().to_string());
    let reference = ReferenceBody::new(name, config.reference.color(), sampler);

    let mut builder = VisibilityContext::builder(occluder, reference);
    for group in &config.groups {
        let group_name = group.name.as_deref().map(str::trim).context("Group without a name")?;
        let elements =
            load_elements(&group.source).with_context(|| format!("Failed to load group {}", group_name))?;

        let color = group.color();
        let mut added = 0;
        for element in &elements {
            let sampler = match Sgp4Sampler::from_elements(element) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("{}: {:#}", group_name, e);
                    continue;
                }
            };
            let name = sampler.name().to_string();
            match builder.add_body(group_name, name, color, sampler) {
                Ok(_) => added += 1,
                Err(e) => tracing::warn!("{}: {}", group_name, e),
            }
        }
        tracing::info!("Loaded {} {} satellite(s) from {:?}", added, group_name, group.source);
    }

    let context = builder.build();
    let publisher = SegmentPublisher::new().with_line_color(config.line_color());
    let start = config.start_time.or(epoch).unwrap_or_else(Utc::now);

    Ok((VisibilityEngine::with_publisher(context, publisher), start))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Driver {
    engine: VisibilityEngine,
    clock: SimulationClock,
    presenter: ConsolePresenter,
    exporter: Option<SnapshotExporter>,
    period: Duration,
}

impl Driver {
    pub fn new(engine: VisibilityEngine, clock: SimulationClock, frame_rate_hz: f64) -> Result<Self> {
        let period = Duration::try_from_secs_f64(1.0 / frame_rate_hz)
            .with_context(|| format!("Invalid frame rate {} Hz", frame_rate_hz))?;
        if period.is_zero() {
            anyhow::bail!("Frame rate {} Hz is too high", frame_rate_hz);
        }

        let mut presenter = ConsolePresenter::new();
        engine.register_primitives(&mut presenter);

        Ok(Self {
            engine,
            clock,
            presenter,
            exporter: None,
            period,
        })
    }

    pub fn with_exporter(mut self, exporter: SnapshotExporter) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn engine(&self) -> &VisibilityEngine {
        &self.engine
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn presenter(&self) -> &ConsolePresenter {
        &self.presenter
    }

    /// One frame: advance the clock, tick the engine, redraw the lines
    pub fn frame(&mut self, real_elapsed: Duration) -> Result<()> {
        let time = self.clock.advance(real_elapsed);
        self.engine.tick(time, &mut self.presenter);
        self.presenter.draw(self.engine.segments());

        let stats = self.engine.stats();
        tracing::debug!(
            "Tick {}: {} visible, {} unknown{}",
            time.format("%H:%M:%S"),
            stats.visible,
            stats.unknown,
            if stats.reference_absent { ", reference absent" } else { "" }
        );

        if let Some(exporter) = self.exporter.as_mut() {
            if let Err(e) = exporter.on_tick(&self.engine) {
                tracing::warn!("Snapshot export to {:?} failed: {:#}", exporter.path(), e);
            }
        }
        Ok(())
    }

    pub fn handle_line(&mut self, line: &str) -> Flow {
        if line.trim().is_empty() {
            return Flow::Continue;
        }
        match parse_command(line) {
            Ok(command) => self.handle_command(command),
            Err(e) => {
                println!("{}", e);
                Flow::Continue
            }
        }
    }

    pub fn handle_command(&mut self, command: Command) -> Flow {
        let result = match command {
            Command::Enable(group) => self.engine.set_group_enabled(&group, true, &mut self.presenter),
            Command::Disable(group) => self.engine.set_group_enabled(&group, false, &mut self.presenter),
            Command::Toggle(group) => self.engine.toggle_group(&group, &mut self.presenter),
            Command::Groups => {
                print!("{}", ConsolePresenter::format_groups(self.engine.context()));
                return Flow::Continue;
            }
            Command::Status => {
                match self.engine.report() {
                    Some(report) => print!("{}", ConsolePresenter::format_table(report)),
                    None => println!("No tick yet"),
                }
                return Flow::Continue;
            }
            Command::Pause => {
                self.clock.pause();
                tracing::info!("Clock paused at {}", self.clock.current());
                return Flow::Continue;
            }
            Command::Resume => {
                self.clock.resume();
                tracing::info!("Clock resumed");
                return Flow::Continue;
            }
            Command::Speed(multiplier) => {
                match self.clock.set_multiplier(multiplier) {
                    Ok(()) => tracing::info!("Clock multiplier set to {}", multiplier),
                    Err(e) => println!("{}", e),
                }
                return Flow::Continue;
            }
            Command::Help => {
                println!("{}", HELP);
                return Flow::Continue;
            }
            Command::Quit => return Flow::Quit,
        };

        match result {
            Ok(Some(_)) => {}
            Ok(None) => println!("No change"),
            Err(e) => println!("{}", e),
        }
        Flow::Continue
    }

    /// Run frames at the configured rate while reading commands from
    /// `input`, until `quit` or Ctrl-C. End of input keeps the loop running.
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut lines = input.lines();
        let mut input_open = true;
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut last = Instant::now();
        tracing::info!("Running at {:.1} Hz, x{} speed", 1.0 / self.period.as_secs_f64(), self.clock.multiplier());

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = Instant::now();
                    self.frame(now - last)?;
                    last = now;
                }
                line = lines.next_line(), if input_open => match line {
                    Ok(Some(line)) => {
                        if self.handle_line(&line) == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::debug!("Command input closed");
                        input_open = false;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read command: {}", e);
                        input_open = false;
                    }
                },
                _ = &mut ctrl_c => {
                    tracing::info!("Interrupted");
                    break;
                }
            }
        }

        tracing::info!("Stopped at {}", self.clock.current());
        Ok(())
    }
}
