//! Lanes: horizontal tracks within a row.
//!
//! A row packs its events into an ordered list of lanes. Which kind of lane
//! it uses is fixed when the row is set up ([`LaneKind`]):
//!
//! - [`StackLane`] keeps its events sorted by effective start and refuses any
//!   event whose effective interval would overlap a neighbour.
//! - [`SimpleLane`] accepts everything and orders events by rank, so that the
//!   highest-ranked event paints on top and wins hit-tests.
//!
//! Lanes never hold the events themselves, only a [`LaneEvent`] entry with
//! the event's id and the bounds computed when it was last placed.

pub mod simple;
pub mod stack;

pub use simple::SimpleLane;
pub use stack::StackLane;

use thiserror::Error;
use timeline_lanes_protocol::{EventAttrs, EventId, Interval, LaneKind};

use crate::edges::effective_edges;

/// Misuse of a lane or lane array.
///
/// A [`Lane`] returns these before modifying anything, as do the up-front
/// id checks of [`LaneArray`](crate::LaneArray). One surfacing from the
/// middle of a relocation, vacancy fill or rebuild means the array's own
/// bookkeeping was already inconsistent, and the array is left partly
/// updated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LaneError {
    #[error("event {0} is already placed")]
    DuplicateEvent(EventId),
    #[error("event {0} is not placed")]
    UnknownEvent(EventId),
    #[error("event {0} does not fit in this lane")]
    DoesNotFit(EventId),
}

/// A lane's record of one event.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneEvent {
    pub id: EventId,
    /// The event's own `[start, end)`.
    pub raw: Interval,
    /// `raw` widened by icon overhang at the zoom it was computed for.
    pub edges: Interval,
    /// Rank key; an unset rank is `f64::NEG_INFINITY`.
    pub rank: f64,
}

impl LaneEvent {
    pub fn new(id: EventId, attrs: &EventAttrs, millis_per_pixel: f64) -> Self {
        Self {
            id,
            raw: attrs.interval(),
            edges: effective_edges(attrs, millis_per_pixel),
            rank: attrs.rank_key(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Lane {
    Stack(StackLane),
    Simple(SimpleLane),
}

impl Lane {
    pub fn new(kind: LaneKind) -> Self {
        match kind {
            LaneKind::Stack => Lane::Stack(StackLane::new()),
            LaneKind::Simple => Lane::Simple(SimpleLane::new()),
        }
    }

    pub fn kind(&self) -> LaneKind {
        match self {
            Lane::Stack(_) => LaneKind::Stack,
            Lane::Simple(_) => LaneKind::Simple,
        }
    }

    /// Events in lane order: effective start for stack lanes, ascending rank
    /// for simple lanes.
    pub fn events(&self) -> &[LaneEvent] {
        match self {
            Lane::Stack(lane) => lane.events(),
            Lane::Simple(lane) => lane.events(),
        }
    }

    pub fn event(&self, index: usize) -> Option<&LaneEvent> {
        self.events().get(index)
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }

    pub fn contains(&self, id: &EventId) -> bool {
        match self {
            Lane::Stack(lane) => lane.contains(id),
            Lane::Simple(lane) => lane.contains(id),
        }
    }

    /// Whether `event` could be added without breaking the lane's ordering.
    pub fn could_fit_event(&self, event: &LaneEvent) -> bool {
        match self {
            Lane::Stack(lane) => lane.could_fit_event(event),
            Lane::Simple(_) => true,
        }
    }

    /// Whether an event already in the lane can take new bounds without
    /// moving past its current neighbours.
    pub fn event_still_fits(&self, event: &LaneEvent) -> bool {
        match self {
            Lane::Stack(lane) => lane.event_still_fits(event),
            Lane::Simple(_) => true,
        }
    }

    pub fn add(&mut self, event: LaneEvent) -> Result<(), LaneError> {
        match self {
            Lane::Stack(lane) => lane.add(event),
            Lane::Simple(lane) => lane.add(event),
        }
    }

    pub fn remove(&mut self, id: &EventId) -> Result<LaneEvent, LaneError> {
        match self {
            Lane::Stack(lane) => lane.remove(id),
            Lane::Simple(lane) => lane.remove(id),
        }
    }

    pub fn update(&mut self, event: LaneEvent) -> Result<(), LaneError> {
        match self {
            Lane::Stack(lane) => lane.update(event),
            Lane::Simple(lane) => lane.update(event),
        }
    }

    /// Events whose interval intersects `query`. Stack lanes test effective
    /// edges, simple lanes raw intervals.
    pub fn collisions_with_interval(&self, query: Interval) -> Vec<&LaneEvent> {
        match self {
            Lane::Stack(lane) => lane.collisions_with_interval(query).iter().collect(),
            Lane::Simple(lane) => lane.collisions_with_interval(query),
        }
    }

    pub fn event_at_time(&self, t: f64) -> Option<&LaneEvent> {
        match self {
            Lane::Stack(lane) => lane.event_at_time(t),
            Lane::Simple(lane) => lane.event_at_time(t),
        }
    }
}
