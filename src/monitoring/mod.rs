//! Monitoring Module
//!
//! Per-run step timing.
//!
//! # Components
//!
//! - [`ExecutionTimeline`]: step start/finish timing for reports and Gantt charts

pub mod timeline;

pub use timeline::{EventType, ExecutionTimeline, StepTiming, TimelineEvent};
