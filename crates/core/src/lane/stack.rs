use std::collections::HashMap;

use timeline_lanes_protocol::{EventId, Interval};

use super::{LaneError, LaneEvent};
use crate::search;

/// A lane whose events never overlap.
///
/// Events are sorted by effective start, with `starts` and `ends` kept as
/// parallel arrays for binary search. For consecutive events `a`, `b`:
/// `a.edges.end <= b.edges.start`, which also keeps `ends` sorted.
#[derive(Debug, Clone, Default)]
pub struct StackLane {
    events: Vec<LaneEvent>,
    starts: Vec<f64>,
    ends: Vec<f64>,
    slots: HashMap<EventId, usize>,
}

impl StackLane {
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
        self.slots.contains_key(id)
    }

    /// Effective starts, in lane order.
    pub fn starts(&self) -> &[f64] {
        &self.starts
    }

    /// Effective ends, in lane order.
    pub fn ends(&self) -> &[f64] {
        &self.ends
    }

    pub fn could_fit_event(&self, event: &LaneEvent) -> bool {
        let slot = self.insertion_slot(&event.edges);
        self.fits_between(slot.checked_sub(1), slot, &event.edges)
    }

    pub fn event_still_fits(&self, event: &LaneEvent) -> bool {
        match self.slots.get(&event.id) {
            Some(&slot) => self.fits_between(slot.checked_sub(1), slot + 1, &event.edges),
            None => false,
        }
    }

    pub fn add(&mut self, event: LaneEvent) -> Result<(), LaneError> {
        if self.slots.contains_key(&event.id) {
            return Err(LaneError::DuplicateEvent(event.id));
        }
        let slot = self.insertion_slot(&event.edges);
        if !self.fits_between(slot.checked_sub(1), slot, &event.edges) {
            return Err(LaneError::DoesNotFit(event.id));
        }

        self.starts.insert(slot, event.edges.start);
        self.ends.insert(slot, event.edges.end);
        self.slots.insert(event.id.clone(), slot);
        self.events.insert(slot, event);
        self.reindex_after(slot);
        Ok(())
    }

    pub fn remove(&mut self, id: &EventId) -> Result<LaneEvent, LaneError> {
        let slot = self
            .slots
            .remove(id)
            .ok_or_else(|| LaneError::UnknownEvent(id.clone()))?;
        self.starts.remove(slot);
        self.ends.remove(slot);
        let event = self.events.remove(slot);
        if slot < self.events.len() {
            self.reindex_from(slot);
        }
        Ok(event)
    }

    /// Replaces the cached bounds of an event already in the lane.
    ///
    /// The event keeps its slot. Callers must have checked
    /// [`event_still_fits`](Self::event_still_fits) with the same bounds;
    /// bounds that would reorder the lane are a logic error and trip a debug
    /// assertion.
    pub fn update(&mut self, event: LaneEvent) -> Result<(), LaneError> {
        let Some(&slot) = self.slots.get(&event.id) else {
            return Err(LaneError::UnknownEvent(event.id));
        };
        debug_assert!(
            self.fits_between(slot.checked_sub(1), slot + 1, &event.edges),
            "update of {} would break lane order",
            event.id
        );
        self.starts[slot] = event.edges.start;
        self.ends[slot] = event.edges.end;
        self.events[slot] = event;
        Ok(())
    }

    /// Events whose effective interval intersects `query`, in lane order.
    ///
    /// Runs from the first event ending after `query.start` through the last
    /// event starting before `query.end`.
    pub fn collisions_with_interval(&self, query: Interval) -> &[LaneEvent] {
        let first = search::index_after(&self.ends, query.start);
        match search::index_before(&self.starts, query.end) {
            Some(last) if first <= last => &self.events[first..=last],
            _ => &[],
        }
    }

    /// The event whose effective interval covers `t`.
    ///
    /// An event's end is accepted as a hit when no later event starts there.
    pub fn event_at_time(&self, t: f64) -> Option<&LaneEvent> {
        let next = search::index_after(&self.ends, t);
        if next < self.events.len() && self.starts[next] <= t {
            return Some(&self.events[next]);
        }
        let prev = next.checked_sub(1)?;
        (self.starts[prev] <= t && t <= self.ends[prev]).then(|| &self.events[prev])
    }

    fn insertion_slot(&self, edges: &Interval) -> usize {
        search::index_after(&self.starts, edges.start)
    }

    /// Whether `edges` sits between the events at `before` and `after`.
    /// Out-of-range neighbours impose no constraint.
    fn fits_between(&self, before: Option<usize>, after: usize, edges: &Interval) -> bool {
        let clear_before = before.is_none_or(|i| self.ends[i] <= edges.start);
        let clear_after = self.starts.get(after).is_none_or(|&s| s >= edges.end);
        clear_before && clear_after
    }

    fn reindex_after(&mut self, slot: usize) {
        self.reindex_from(slot + 1);
    }

    fn reindex_from(&mut self, from: usize) {
        for (i, event) in self.events.iter().enumerate().skip(from) {
            if let Some(s) = self.slots.get_mut(&event.id) {
                *s = i;
            }
        }
    }
}
