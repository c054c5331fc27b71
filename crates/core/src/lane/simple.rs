use timeline_lanes_protocol::{EventId, Interval};

use super::{LaneError, LaneEvent};
use crate::search;

/// A lane that accepts overlapping events.
///
/// Events are ordered by ascending rank so that later entries paint on top.
/// A newly added event goes in front of any events of equal rank, leaving
/// the earliest-added of a tie on top.
///
/// Lookups by id are linear. A row only uses a simple lane when it asked for
/// a single overlapping track, which is expected to stay small.
#[derive(Debug, Clone, Default)]
pub struct SimpleLane {
    events: Vec<LaneEvent>,
    ranks: Vec<f64>,
}

impl SimpleLane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[LaneEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.position(id).is_some()
    }

    pub fn add(&mut self, event: LaneEvent) -> Result<(), LaneError> {
        if self.contains(&event.id) {
            return Err(LaneError::DuplicateEvent(event.id));
        }
        self.insert_ranked(event);
        Ok(())
    }

    pub fn remove(&mut self, id: &EventId) -> Result<LaneEvent, LaneError> {
        let i = self
            .position(id)
            .ok_or_else(|| LaneError::UnknownEvent(id.clone()))?;
        self.ranks.remove(i);
        Ok(self.events.remove(i))
    }

    /// Replaces an event's cached bounds, moving it if its rank changed.
    pub fn update(&mut self, event: LaneEvent) -> Result<(), LaneError> {
        let Some(i) = self.position(&event.id) else {
            return Err(LaneError::UnknownEvent(event.id));
        };
        if self.ranks[i] == event.rank {
            self.events[i] = event;
        } else {
            self.ranks.remove(i);
            self.events.remove(i);
            self.insert_ranked(event);
        }
        Ok(())
    }

    /// Events whose raw interval intersects `query`, in paint order.
    pub fn collisions_with_interval(&self, query: Interval) -> Vec<&LaneEvent> {
        self.events
            .iter()
            .filter(|e| e.raw.overlaps(&query))
            .collect()
    }

    /// The topmost event whose raw interval strictly contains `t`.
    pub fn event_at_time(&self, t: f64) -> Option<&LaneEvent> {
        self.events
            .iter()
            .rev()
            .find(|e| e.raw.start < t && t < e.raw.end)
    }

    fn position(&self, id: &EventId) -> Option<usize> {
        self.events.iter().position(|e| e.id == *id)
    }

    fn insert_ranked(&mut self, event: LaneEvent) {
        let i = search::index_at_or_after(&self.ranks, event.rank);
        self.ranks.insert(i, event.rank);
        self.events.insert(i, event);
    }
}
