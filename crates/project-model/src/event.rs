//! Recorded mouse telemetry.
//!
//! The capture layer writes a JSON sidecar next to the video containing
//! timestamped mouse events. Positions are in pixels relative to the
//! capture-area origin; timestamps are seconds since recording start.

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;

/// Kind of recorded input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseEventKind {
    Move,
    Click,
    Scroll,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    #[serde(other)]
    Other,
}

/// A single recorded input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    /// Seconds since recording start.
    pub timestamp: f64,

    /// Pixels from the capture-area left edge.
    pub x: f64,

    /// Pixels from the capture-area top edge.
    pub y: f64,

    #[serde(rename = "type")]
    pub kind: MouseEventKind,

    /// Absent on `move` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<MouseButton>,

    /// Press (`true`) or release (`false`). Absent on `move` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressed: Option<bool>,
}

impl MouseEvent {
    /// Create a move event.
    pub fn moved(timestamp: f64, x: f64, y: f64) -> Self {
        Self {
            timestamp,
            x,
            y,
            kind: MouseEventKind::Move,
            button: None,
            pressed: None,
        }
    }

    /// Create a button press event.
    pub fn click(timestamp: f64, x: f64, y: f64, button: MouseButton) -> Self {
        Self {
            timestamp,
            x,
            y,
            kind: MouseEventKind::Click,
            button: Some(button),
            pressed: Some(true),
        }
    }

    /// Whether this is a click that started a press. Clicks recorded
    /// without a `pressed` flag count as presses.
    pub fn is_press(&self) -> bool {
        self.kind == MouseEventKind::Click && self.pressed.unwrap_or(true)
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Errors raised while loading mouse metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Malformed metadata: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Event {index} has a non-finite {field}")]
    NonFinite { index: usize, field: &'static str },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MetadataFile {
    Bare(Vec<MouseEvent>),
    Wrapped { events: Vec<MouseEvent> },
}

/// The full recorded event list, ordered by timestamp.
///
/// Immutable once built; lookups binary-search the timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MouseTrack {
    events: Vec<MouseEvent>,
    was_resorted: bool,
}

impl MouseTrack {
    /// Build a track. Events are stably sorted if they are out of order.
    pub fn new(mut events: Vec<MouseEvent>) -> Self {
        let sorted = events
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp);
        if !sorted {
            events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        }
        Self {
            events,
            was_resorted: !sorted,
        }
    }

    /// Parse the JSON sidecar. Accepts a bare array or `{"events": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        let events = match serde_json::from_str::<MetadataFile>(json)? {
            MetadataFile::Bare(events) => events,
            MetadataFile::Wrapped { events } => events,
        };

        for (index, event) in events.iter().enumerate() {
            for (field, value) in [("timestamp", event.timestamp), ("x", event.x), ("y", event.y)]
            {
                if !value.is_finite() {
                    return Err(MetadataError::NonFinite { index, field });
                }
            }
        }

        Ok(Self::new(events))
    }

    /// Serialize as a bare JSON array.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.events)
    }

    pub fn events(&self) -> &[MouseEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether the source list had to be re-sorted on load.
    pub fn was_resorted(&self) -> bool {
        self.was_resorted
    }

    /// The last event at or before `time_secs`, or the first event when
    /// none precede it. `None` only when the track is empty.
    pub fn event_at(&self, time_secs: f64) -> Option<&MouseEvent> {
        let idx = self.events.partition_point(|e| e.timestamp <= time_secs);
        if idx == 0 {
            self.events.first()
        } else {
            self.events.get(idx - 1)
        }
    }

    /// Mouse position at `time_secs` using [`MouseTrack::event_at`].
    pub fn position_at(&self, time_secs: f64) -> Option<Point2D> {
        self.event_at(time_secs).map(MouseEvent::position)
    }

    /// Button-press events in timestamp order.
    pub fn presses(&self) -> impl Iterator<Item = &MouseEvent> {
        self.events.iter().filter(|e| e.is_press())
    }
}

impl From<Vec<MouseEvent>> for MouseTrack {
    fn from(events: Vec<MouseEvent>) -> Self {
        Self::new(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> MouseTrack {
        MouseTrack::new(vec![
            MouseEvent::moved(0.5, 10.0, 10.0),
            MouseEvent::moved(1.0, 20.0, 20.0),
            MouseEvent::click(2.0, 30.0, 30.0, MouseButton::Left),
        ])
    }

    #[test]
    fn test_event_at_picks_last_at_or_before() {
        let track = track();
        assert_eq!(track.position_at(1.0), Some(Point2D::new(20.0, 20.0)));
        assert_eq!(track.position_at(1.99), Some(Point2D::new(20.0, 20.0)));
        assert_eq!(track.position_at(5.0), Some(Point2D::new(30.0, 30.0)));
    }

    #[test]
    fn test_event_at_before_first_returns_first() {
        let track = track();
        assert_eq!(track.position_at(0.0), Some(Point2D::new(10.0, 10.0)));
    }

    #[test]
    fn test_empty_track_has_no_position() {
        let track = MouseTrack::default();
        assert!(track.position_at(1.0).is_none());
    }

    #[test]
    fn test_parse_tolerates_missing_optional_fields() {
        let json = r#"[
            {"timestamp":0.0,"x":1,"y":2,"type":"move"},
            {"timestamp":0.5,"x":3,"y":4,"type":"click","button":"left","pressed":true},
            {"timestamp":0.7,"x":3,"y":4,"type":"click","button":"left","pressed":false},
            {"timestamp":0.9,"x":5,"y":6,"type":"scroll"}
        ]"#;
        let track = MouseTrack::from_json(json).unwrap();
        assert_eq!(track.len(), 4);
        assert_eq!(track.events()[0].button, None);
        assert_eq!(track.presses().count(), 1);
    }

    #[test]
    fn test_parse_wrapped_form_and_unknown_button() {
        let json = r#"{"events":[{"timestamp":1.0,"x":1,"y":1,"type":"click","button":"back"}]}"#;
        let track = MouseTrack::from_json(json).unwrap();
        assert_eq!(track.events()[0].button, Some(MouseButton::Other));
        assert!(track.events()[0].is_press());
    }

    #[test]
    fn test_unsorted_events_are_resorted() {
        let track = MouseTrack::new(vec![
            MouseEvent::moved(2.0, 2.0, 2.0),
            MouseEvent::moved(1.0, 1.0, 1.0),
        ]);
        assert!(track.was_resorted());
        assert_eq!(track.events()[0].timestamp, 1.0);
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        let json = r#"[{"timestamp":0.0,"x":1,"y":2,"type":"hover"}]"#;
        assert!(MouseTrack::from_json(json).is_err());
    }

    #[test]
    fn test_json_roundtrip_omits_absent_fields() {
        let json = track().to_json().unwrap();
        assert!(json.contains("\"type\":\"move\""));
        assert!(!json.contains("\"button\":null"));
        let parsed = MouseTrack::from_json(&json).unwrap();
        assert_eq!(parsed, track());
    }
}
