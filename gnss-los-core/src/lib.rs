//! Line-of-sight visibility engine
//!
//! Decides, once per simulation tick, which tracked satellites a reference
//! body (e.g. the ISS) can see past a spherical occluder (the Earth).
//!
//! ## Main Components
//! - `occlusion`: the ray-sphere LOS predicate
//! - `VisibilityTracker`: per-tick visibility set
//! - `SegmentPublisher`: lazily evaluated LOS line per body
//! - `ReportSink`: ordered list of visible names for the UI
//! - `GroupMask`: per-constellation presentation toggles
//! - `VisibilityEngine`: the above wired together around a `VisibilityContext`

pub mod body;
pub mod context;
pub mod engine;
pub mod error;
pub mod mask;
pub mod occlusion;
pub mod report;
pub mod segment;
pub mod tracker;

pub use body::{BodyId, BodyInfo, Color, FixedPosition, GroupTag, PositionSampler, ReferenceBody, TrackedBody};
pub use context::{ContextBuilder, VisibilityContext};
pub use engine::VisibilityEngine;
pub use error::LosError;
pub use mask::{GroupMask, MaskState, MaskTransition, RenderLayer};
pub use occlusion::{is_visible, is_visible_segment, Occluder, OcclusionModel, Position, EARTH_RADIUS_M};
pub use report::{ReportConsumer, ReportEntry, ReportSink, VisibilityReport};
pub use segment::{PrimitiveRegistry, Segment, SegmentPublisher};
pub use tracker::{TickStats, VisibilitySet, VisibilityTracker};
