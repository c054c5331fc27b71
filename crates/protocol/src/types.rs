use serde::{Deserialize, Serialize};

use crate::EventId;

/// A half-open time span `[start, end)` in milliseconds.
///
/// Touching spans (`a.end == b.start`) do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// An icon drawn on top of an event.
///
/// `h_pos` places the icon's anchor along the event (0 = start, 1 = end);
/// `h_align` says which point of the icon sits on that anchor
/// (0 = left edge, 1 = right edge). The width is in screen pixels, so the
/// time span the icon covers depends on the current zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IconSpec {
    pub h_pos: f64,
    pub pixel_width: f64,
    #[serde(default = "IconSpec::default_h_align")]
    pub h_align: f64,
}

impl IconSpec {
    pub fn new(h_pos: f64, pixel_width: f64, h_align: f64) -> Self {
        Self {
            h_pos,
            pixel_width,
            h_align,
        }
    }

    fn default_h_align() -> f64 {
        0.5
    }
}

/// The mutable attributes of a timeline event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAttrs {
    /// Start time in milliseconds.
    pub start: f64,
    /// End time in milliseconds.
    pub end: f64,
    /// Paint and hit-test priority among overlapping events. Higher wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<IconSpec>,
}

impl EventAttrs {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            rank: None,
            icons: Vec::new(),
        }
    }

    pub fn with_rank(mut self, rank: f64) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn with_icon(mut self, icon: IconSpec) -> Self {
        self.icons.push(icon);
        self
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }

    pub fn has_icons(&self) -> bool {
        !self.icons.is_empty()
    }

    /// Rank used for ordering; an unset rank sorts below every set one.
    pub fn rank_key(&self) -> f64 {
        self.rank.unwrap_or(f64::NEG_INFINITY)
    }
}

/// A complete event record, as read from scenario files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    pub id: EventId,
    #[serde(flatten)]
    pub attrs: EventAttrs,
}

impl EventSpec {
    pub fn new(id: impl Into<EventId>, attrs: EventAttrs) -> Self {
        Self {
            id: id.into(),
            attrs,
        }
    }
}

/// Which lane implementation a row packs its events into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LaneKind {
    /// Strictly non-overlapping lanes; a row grows as many as it needs.
    Stack,
    /// A single lane in which events may overlap, ordered by rank.
    Simple,
}

impl LaneKind {
    /// Lane kind for a row's "allow multiple lanes" setting.
    pub fn from_allow_multiple(allow_multiple_lanes: bool) -> Self {
        if allow_multiple_lanes {
            LaneKind::Stack
        } else {
            LaneKind::Simple
        }
    }
}

/// Per-row settings chosen when the row's pane is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowConfig {
    /// Pack overlapping events into separate lanes. When off, the row keeps
    /// a single lane and draws overlapping events on top of each other.
    #[serde(default = "RowConfig::default_allow_multiple_lanes")]
    pub allow_multiple_lanes: bool,
}

impl RowConfig {
    fn default_allow_multiple_lanes() -> bool {
        true
    }

    pub fn lane_kind(&self) -> LaneKind {
        LaneKind::from_allow_multiple(self.allow_multiple_lanes)
    }
}

impl Default for RowConfig {
    fn default() -> Self {
        Self {
            allow_multiple_lanes: Self::default_allow_multiple_lanes(),
        }
    }
}

/// Read-only view of a row's lane assignment, in lane-then-paint order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneSnapshot {
    pub lanes: Vec<Vec<EventId>>,
}
