//! Execution Timeline
//!
//! Records when each chain step starts and finishes, for run reports
//! and Gantt charts.

use std::time::{Duration, Instant};

/// Type of timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// Step started executing
    Started,
    /// Step finished with a text result
    Completed,
    /// Step finished with a failure stored in the record
    Degraded,
}

/// A single event in the execution timeline.
#[derive(Debug, Clone)]
pub struct TimelineEvent {
    /// Position of the step in the chain
    pub position: usize,
    /// Label shown in reports
    pub label: String,
    pub event_type: EventType,
    pub timestamp: Instant,
}

/// Timing of one finished step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTiming {
    pub position: usize,
    pub label: String,
    pub start_ms: u128,
    pub duration_ms: u128,
    pub degraded: bool,
}

/// Tracks the execution timeline of one run.
#[derive(Debug, Clone)]
pub struct ExecutionTimeline {
    events: Vec<TimelineEvent>,
    start_time: Instant,
}

impl ExecutionTimeline {
    /// Creates a new timeline starting now.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// Records an event for the step at `position`.
    pub fn add_event(&mut self, position: usize, label: impl Into<String>, event_type: EventType) {
        self.events.push(TimelineEvent {
            position,
            label: label.into(),
            event_type,
            timestamp: Instant::now(),
        });
    }

    pub fn get_events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Time since the timeline was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Number of steps that finished degraded.
    pub fn degraded_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type == EventType::Degraded)
            .count()
    }

    /// Timings of finished steps, in chain order.
    pub fn timings(&self) -> Vec<StepTiming> {
        let mut timings: Vec<StepTiming> = Vec::new();

        for event in &self.events {
            let elapsed = event.timestamp.duration_since(self.start_time).as_millis();
            match event.event_type {
                EventType::Started => timings.push(StepTiming {
                    position: event.position,
                    label: event.label.clone(),
                    start_ms: elapsed,
                    duration_ms: 0,
                    degraded: false,
                }),
                EventType::Completed | EventType::Degraded => {
                    if let Some(timing) = timings
                        .iter_mut()
                        .rev()
                        .find(|t| t.position == event.position)
                    {
                        timing.duration_ms = elapsed - timing.start_ms;
                        timing.degraded = event.event_type == EventType::Degraded;
                    }
                }
            }
        }

        timings.sort_by_key(|t| t.position);
        timings
    }

    /// Generates an ASCII Gantt chart, 50 columns wide.
    pub fn gantt_chart(&self) -> String {
        let mut output = String::from("\nExecution Timeline:\n\n");

        let total_time = self.elapsed().as_millis();
        let timings = self.timings();
        if total_time == 0 || timings.is_empty() {
            return output;
        }

        let scale = 50.0 / total_time as f64;

        for timing in timings {
            let start_pos = (timing.start_ms as f64 * scale) as usize;
            let width = ((timing.duration_ms as f64 * scale).max(1.0)) as usize;
            let fill = if timing.degraded { "x" } else { "#" };

            let mut bar = " ".repeat(start_pos);
            bar.push_str(&fill.repeat(width));

            output.push_str(&format!(
                "{:>2}. {} |{}| ({} ms)\n",
                timing.position + 1,
                truncate(&timing.label, 16),
                bar,
                timing.duration_ms
            ));
        }

        output.push_str(&format!("\nTotal: {} ms\n", total_time));
        output
    }
}

impl Default for ExecutionTimeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Pads or truncates a label to `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_timings_in_chain_order() {
        let mut timeline = ExecutionTimeline::new();
        timeline.add_event(0, "fetch", EventType::Started);
        thread::sleep(Duration::from_millis(20));
        timeline.add_event(0, "fetch", EventType::Completed);
        timeline.add_event(1, "summarize", EventType::Started);
        thread::sleep(Duration::from_millis(20));
        timeline.add_event(1, "summarize", EventType::Degraded);

        let timings = timeline.timings();
        assert_eq!(timings.len(), 2);
        assert_eq!(timings[0].label, "fetch");
        assert!(timings[0].duration_ms >= 20);
        assert!(!timings[0].degraded);
        assert!(timings[1].degraded);
        assert_eq!(timeline.degraded_count(), 1);
    }

    #[test]
    fn test_same_label_twice() {
        let mut timeline = ExecutionTimeline::new();
        timeline.add_event(0, "editor", EventType::Started);
        timeline.add_event(0, "editor", EventType::Completed);
        timeline.add_event(1, "editor", EventType::Started);
        timeline.add_event(1, "editor", EventType::Completed);

        assert_eq!(timeline.timings().len(), 2);
    }

    #[test]
    fn test_started_only_has_zero_duration() {
        let mut timeline = ExecutionTimeline::new();
        timeline.add_event(0, "fetch", EventType::Started);

        let timings = timeline.timings();
        assert_eq!(timings[0].duration_ms, 0);
    }

    #[test]
    fn test_gantt_chart_generation() {
        let mut timeline = ExecutionTimeline::new();
        timeline.add_event(0, "fetch page", EventType::Started);
        thread::sleep(Duration::from_millis(30));
        timeline.add_event(0, "fetch page", EventType::Completed);
        timeline.add_event(1, "a very long step label", EventType::Started);
        thread::sleep(Duration::from_millis(30));
        timeline.add_event(1, "a very long step label", EventType::Degraded);

        let chart = timeline.gantt_chart();
        assert!(chart.contains(" 1. fetch page"));
        assert!(chart.contains(" 2. a very long s..."));
        assert!(chart.contains("x|"));
        assert!(chart.contains("#|"));
        assert!(chart.contains("Total:"));
    }

    #[test]
    fn test_gantt_chart_empty() {
        let timeline = ExecutionTimeline::new();
        let chart = timeline.gantt_chart();
        assert!(chart.contains("Timeline"));
        assert!(!chart.contains("Total:"));
    }
}
