use std::collections::HashMap;

use timeline_lanes_protocol::{EventAttrs, EventId, Interval, LaneKind, LaneSnapshot};
use tracing::{debug, trace};

use crate::lane::{Lane, LaneError, LaneEvent};

/// What handling an attribute change did to an event's placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// Effective edges did not change; the lane entry was refreshed only.
    Unchanged,
    /// The event stayed in its lane with new bounds.
    InPlace,
    /// The event moved to another lane.
    Moved { from: usize, to: usize },
}

#[derive(Debug, Clone)]
struct Placement {
    lane: usize,
    attrs: EventAttrs,
    edges: Interval,
}

/// The lanes of one timeline row.
///
/// Assigns each event to the lowest-numbered lane it fits in and keeps that
/// packing tight as events come and go or change shape:
///
/// - a changed event falls toward lane 0 when an earlier lane has room,
///   otherwise stays put if it still fits, otherwise moves to the first later
///   lane with room (a new lane if none has);
/// - whenever an event leaves a lane, events from later lanes that overlapped
///   the gap are pulled back into it, cascading forward;
/// - no lane is left empty when a public method returns.
///
/// Every event is in exactly one lane. The array stores each event's latest
/// attributes so it can re-place everything when the zoom changes.
#[derive(Debug, Clone)]
pub struct LaneArray {
    kind: LaneKind,
    millis_per_pixel: f64,
    lanes: Vec<Lane>,
    placements: HashMap<EventId, Placement>,
}

impl LaneArray {
    pub fn new(kind: LaneKind, millis_per_pixel: f64) -> Self {
        Self {
            kind,
            millis_per_pixel,
            lanes: Vec::new(),
            placements: HashMap::new(),
        }
    }

    pub fn kind(&self) -> LaneKind {
        self.kind
    }

    pub fn millis_per_pixel(&self) -> f64 {
        self.millis_per_pixel
    }

    /// Number of lanes.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn lane(&self, index: usize) -> Option<&Lane> {
        self.lanes.get(index)
    }

    pub fn lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.iter()
    }

    pub fn num_events(&self) -> usize {
        self.placements.len()
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.placements.contains_key(id)
    }

    pub fn lane_of(&self, id: &EventId) -> Option<usize> {
        self.placements.get(id).map(|p| p.lane)
    }

    /// Effective edges the event was last placed with.
    pub fn edges_of(&self, id: &EventId) -> Option<Interval> {
        self.placements.get(id).map(|p| p.edges)
    }

    /// Hit-test: the event drawn at `time` in lane `lane_index`.
    pub fn event_at(&self, lane_index: usize, time: f64) -> Option<&EventId> {
        self.lanes
            .get(lane_index)?
            .event_at_time(time)
            .map(|e| &e.id)
    }

    pub fn snapshot(&self) -> LaneSnapshot {
        LaneSnapshot {
            lanes: self
                .lanes
                .iter()
                .map(|lane| lane.events().iter().map(|e| e.id.clone()).collect())
                .collect(),
        }
    }

    /// Places a new event in the first lane it fits, appending a lane if
    /// none has room. Returns the lane index.
    pub fn add_event(&mut self, id: EventId, attrs: EventAttrs) -> Result<usize, LaneError> {
        if self.placements.contains_key(&id) {
            return Err(LaneError::DuplicateEvent(id));
        }
        let entry = LaneEvent::new(id, &attrs, self.millis_per_pixel);
        let lane = self.first_fitting_lane(0, &entry);
        self.place(lane, entry, attrs)?;
        Ok(lane)
    }

    /// Removes an event and fills the gap it leaves from later lanes.
    pub fn remove_event(&mut self, id: &EventId) -> Result<(), LaneError> {
        let Some(placement) = self.placements.get(id) else {
            return Err(LaneError::UnknownEvent(id.clone()));
        };
        let (lane, edges) = (placement.lane, placement.edges);
        self.lanes[lane].remove(id)?;
        self.placements.remove(id);
        debug!(event = %id, lane, "removed event");

        self.fill_vacancy(lane, edges)?;
        self.trim_empty_lanes();
        self.close_gaps();
        Ok(())
    }

    /// Re-places an event whose attributes changed.
    pub fn update_event(
        &mut self,
        id: &EventId,
        attrs: EventAttrs,
    ) -> Result<Relocation, LaneError> {
        let Some(placement) = self.placements.get(id) else {
            return Err(LaneError::UnknownEvent(id.clone()));
        };
        let (old_lane, old_edges) = (placement.lane, placement.edges);
        let entry = LaneEvent::new(id.clone(), &attrs, self.millis_per_pixel);

        if entry.edges == old_edges {
            self.lanes[old_lane].update(entry)?;
            self.record(id, old_lane, attrs, old_edges);
            return Ok(Relocation::Unchanged);
        }

        let new_lane = match (0..old_lane).find(|&i| self.lanes[i].could_fit_event(&entry)) {
            Some(earlier) => earlier,
            None if self.lanes[old_lane].event_still_fits(&entry) => {
                let edges = entry.edges;
                self.lanes[old_lane].update(entry)?;
                self.record(id, old_lane, attrs, edges);
                trace!(event = %id, lane = old_lane, "updated in place");
                return Ok(Relocation::InPlace);
            }
            None => self.first_fitting_lane(old_lane + 1, &entry),
        };

        self.lanes[old_lane].remove(id)?;
        self.place(new_lane, entry, attrs)?;
        debug!(event = %id, from = old_lane, to = new_lane, "relocated event");

        self.fill_vacancy(old_lane, old_edges)?;
        self.trim_empty_lanes();
        let closed = self.close_gaps();

        // The vacancy fill may have pulled the event itself back.
        match self.lane_of(id).unwrap_or(new_lane) {
            to if to == old_lane && closed == 0 => Ok(Relocation::InPlace),
            to => Ok(Relocation::Moved { from: old_lane, to }),
        }
    }

    /// Sets the zoom. Effective edges depend on it whenever an event has
    /// icons, so in that case every event is re-placed from scratch.
    ///
    /// Returns whether the lanes were rebuilt.
    pub fn set_millis_per_pixel(&mut self, millis_per_pixel: f64) -> Result<bool, LaneError> {
        if millis_per_pixel == self.millis_per_pixel {
            return Ok(false);
        }
        self.millis_per_pixel = millis_per_pixel;
        if self.placements.values().any(|p| p.attrs.has_icons()) {
            self.rebuild_lanes()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Discards every lane and re-adds all events in their previous
    /// lane-then-position order.
    pub fn rebuild_lanes(&mut self) -> Result<(), LaneError> {
        let order: Vec<EventId> = self
            .lanes
            .iter()
            .flat_map(|lane| lane.events().iter().map(|e| e.id.clone()))
            .collect();
        let mut placements = std::mem::take(&mut self.placements);
        self.lanes.clear();

        for id in order {
            let Some(placement) = placements.remove(&id) else {
                continue;
            };
            self.add_event(id, placement.attrs)?;
        }
        debug!(
            lanes = self.lanes.len(),
            events = self.placements.len(),
            millis_per_pixel = self.millis_per_pixel,
            "rebuilt lanes"
        );
        Ok(())
    }

    fn first_fitting_lane(&self, from: usize, entry: &LaneEvent) -> usize {
        (from..self.lanes.len())
            .find(|&i| self.lanes[i].could_fit_event(entry))
            .unwrap_or(self.lanes.len())
    }

    /// Adds `entry` to lane `index`, creating the lane if `index` is one
    /// past the end.
    fn place(&mut self, index: usize, entry: LaneEvent, attrs: EventAttrs) -> Result<(), LaneError> {
        if index == self.lanes.len() {
            self.lanes.push(Lane::new(self.kind));
            trace!(lane = index, "opened lane");
        }
        let id = entry.id.clone();
        let edges = entry.edges;
        self.lanes[index].add(entry)?;
        self.record(&id, index, attrs, edges);
        Ok(())
    }

    fn record(&mut self, id: &EventId, lane: usize, attrs: EventAttrs, edges: Interval) {
        self.placements
            .insert(id.clone(), Placement { lane, attrs, edges });
    }

    /// Pulls events that overlap `vacancy` from lanes after `lane_index`
    /// back into it. Each pulled event leaves a vacancy of its own, which is
    /// filled the same way.
    fn fill_vacancy(&mut self, lane_index: usize, vacancy: Interval) -> Result<(), LaneError> {
        for source in lane_index + 1..self.lanes.len() {
            let candidates: Vec<LaneEvent> = self.lanes[source]
                .collisions_with_interval(vacancy)
                .into_iter()
                .cloned()
                .collect();

            for candidate in candidates {
                if !self.lanes[lane_index].could_fit_event(&candidate) {
                    continue;
                }
                let id = candidate.id.clone();
                let edges = candidate.edges;
                self.lanes[source].remove(&id)?;
                self.lanes[lane_index].add(candidate)?;
                if let Some(placement) = self.placements.get_mut(&id) {
                    placement.lane = lane_index;
                }
                trace!(event = %id, from = source, to = lane_index, "filled vacancy");

                self.fill_vacancy(source, edges)?;
            }
        }
        Ok(())
    }

    fn trim_empty_lanes(&mut self) {
        while self.lanes.last().is_some_and(Lane::is_empty) {
            self.lanes.pop();
            trace!(lanes = self.lanes.len(), "trimmed empty lane");
        }
    }

    /// Drops empty lanes that still have events after them. A lane's last
    /// event can leave without any later event overlapping its old edges
    /// (after an in-place shrink, for one), and vacancy filling never
    /// reaches those.
    fn close_gaps(&mut self) -> usize {
        let before = self.lanes.len();
        self.lanes.retain(|lane| !lane.is_empty());
        let closed = before - self.lanes.len();
        if closed == 0 {
            return 0;
        }
        for (index, lane) in self.lanes.iter().enumerate() {
            for event in lane.events() {
                if let Some(placement) = self.placements.get_mut(&event.id) {
                    placement.lane = index;
                }
            }
        }
        debug!(closed, "closed empty lanes");
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeline_lanes_protocol::IconSpec;

    fn id(s: &str) -> EventId {
        EventId::from(s)
    }

    fn stack() -> LaneArray {
        LaneArray::new(LaneKind::Stack, 1.0)
    }

    fn add(lanes: &mut LaneArray, name: &str, start: f64, end: f64) -> usize {
        lanes
            .add_event(id(name), EventAttrs::new(start, end))
            .expect("event fits somewhere")
    }

    fn layout(lanes: &LaneArray) -> Vec<Vec<String>> {
        lanes
            .snapshot()
            .lanes
            .into_iter()
            .map(|lane| lane.iter().map(ToString::to_string).collect())
            .collect()
    }

    #[test]
    fn touching_events_share_lane() {
        let mut lanes = stack();
        assert_eq!(add(&mut lanes, "e1", 0.0, 10.0), 0);
        assert_eq!(add(&mut lanes, "e2", 10.0, 20.0), 0);
        assert_eq!(lanes.len(), 1);
    }

    #[test]
    fn overlapping_events_stack() {
        let mut lanes = stack();
        assert_eq!(add(&mut lanes, "e1", 0.0, 10.0), 0);
        assert_eq!(add(&mut lanes, "e2", 5.0, 15.0), 1);
        assert_eq!(lanes.lane_of(&id("e2")), Some(1));
        assert_eq!(lanes.num_events(), 2);
    }

    #[test]
    fn removal_pulls_later_event_back() {
        let mut lanes = stack();
        add(&mut lanes, "e1", 0.0, 10.0);
        add(&mut lanes, "e2", 5.0, 15.0);
        assert_eq!(lanes.remove_event(&id("e1")), Ok(()));
        assert_eq!(lanes.len(), 1);
        assert_eq!(lanes.lane_of(&id("e2")), Some(0));
    }

    #[test]
    fn resize_falls_to_earlier_lane() {
        let mut lanes = stack();
        add(&mut lanes, "e1", 0.0, 10.0);
        add(&mut lanes, "e2", 5.0, 15.0);
        let moved = lanes.update_event(&id("e2"), EventAttrs::new(20.0, 25.0));
        assert_eq!(moved, Ok(Relocation::Moved { from: 1, to: 0 }));
        assert_eq!(lanes.len(), 1);
        assert_eq!(layout(&lanes), [["e1", "e2"]]);
    }

    #[test]
    fn resize_in_place_when_still_fitting() {
        let mut lanes = stack();
        add(&mut lanes, "a", 0.0, 10.0);
        add(&mut lanes, "b", 20.0, 30.0);
        let result = lanes.update_event(&id("b"), EventAttrs::new(12.0, 40.0));
        assert_eq!(result, Ok(Relocation::InPlace));
        assert_eq!(lanes.edges_of(&id("b")), Some(Interval::new(12.0, 40.0)));
    }

    #[test]
    fn growing_event_moves_forward_and_vacancy_refills() {
        let mut lanes = stack();
        add(&mut lanes, "a", 0.0, 10.0);
        add(&mut lanes, "b", 10.0, 20.0);
        add(&mut lanes, "c", 12.0, 18.0);
        assert_eq!(layout(&lanes), [vec!["a", "b"], vec!["c"]]);

        // `b` now collides with `a`, so it has to leave lane 0. Its old slot
        // [10, 20) is then refilled by `c`.
        let result = lanes.update_event(&id("b"), EventAttrs::new(5.0, 20.0));
        assert_eq!(result, Ok(Relocation::Moved { from: 0, to: 1 }));
        assert_eq!(layout(&lanes), [vec!["a", "c"], vec!["b"]]);
    }

    #[test]
    fn vacancy_fill_cascades() {
        let mut lanes = stack();
        add(&mut lanes, "a", 0.0, 10.0);
        add(&mut lanes, "b", 5.0, 15.0);
        add(&mut lanes, "c", 8.0, 20.0);
        assert_eq!(lanes.len(), 3);

        // Removing `a` pulls `b` into lane 0, which frees lane 1 for `c`.
        assert_eq!(lanes.remove_event(&id("a")), Ok(()));
        assert_eq!(layout(&lanes), [["b"], ["c"]]);
    }

    #[test]
    fn removal_after_shrink_leaves_no_gap() {
        let mut lanes = stack();
        add(&mut lanes, "a", 0.0, 10.0);
        add(&mut lanes, "b", 5.0, 15.0);
        add(&mut lanes, "c", 8.0, 20.0);
        let shrunk = lanes.update_event(&id("b"), EventAttrs::new(5.0, 6.0));
        assert_eq!(shrunk, Ok(Relocation::InPlace));

        // Nothing in lane 2 overlaps what is left of `b`.
        assert_eq!(lanes.remove_event(&id("b")), Ok(()));
        assert_eq!(layout(&lanes), [["a"], ["c"]]);
        assert_eq!(lanes.lane_of(&id("c")), Some(1));
    }

    #[test]
    fn unchanged_edges_are_noop() {
        let mut lanes = stack();
        add(&mut lanes, "a", 0.0, 10.0);
        add(&mut lanes, "b", 5.0, 15.0);
        let before = lanes.snapshot();
        let result = lanes.update_event(&id("b"), EventAttrs::new(5.0, 15.0).with_rank(4.0));
        assert_eq!(result, Ok(Relocation::Unchanged));
        assert_eq!(lanes.snapshot(), before);
    }

    #[test]
    fn misuse_is_rejected() {
        let mut lanes = stack();
        add(&mut lanes, "a", 0.0, 10.0);
        assert_eq!(
            lanes.add_event(id("a"), EventAttrs::new(50.0, 60.0)),
            Err(LaneError::DuplicateEvent(id("a")))
        );
        assert_eq!(
            lanes.remove_event(&id("zz")),
            Err(LaneError::UnknownEvent(id("zz")))
        );
        assert_eq!(
            lanes.update_event(&id("zz"), EventAttrs::new(0.0, 1.0)),
            Err(LaneError::UnknownEvent(id("zz")))
        );
        assert_eq!(layout(&lanes), [["a"]]);
    }

    #[test]
    fn event_at_per_lane() {
        let mut lanes = stack();
        add(&mut lanes, "a", 0.0, 10.0);
        add(&mut lanes, "b", 5.0, 15.0);
        assert_eq!(lanes.event_at(0, 3.0), Some(&id("a")));
        assert_eq!(lanes.event_at(1, 3.0), None);
        assert_eq!(lanes.event_at(1, 12.0), Some(&id("b")));
        assert_eq!(lanes.event_at(0, 50.0), None);
        assert_eq!(lanes.event_at(7, 3.0), None);
    }

    #[test]
    fn zoom_rebuilds_only_with_icons() {
        let mut lanes = stack();
        add(&mut lanes, "a", 0.0, 10.0);
        add(&mut lanes, "b", 15.0, 20.0);
        assert_eq!(lanes.set_millis_per_pixel(5.0), Ok(false));

        // At 1ms/px a 4px icon at the end of `a` still clears `b`; at 5ms/px
        // it overhangs into `b`, forcing `b` into a second lane.
        let icon = EventAttrs::new(0.0, 10.0).with_icon(IconSpec::new(1.0, 4.0, 0.0));
        assert_eq!(lanes.set_millis_per_pixel(1.0), Ok(false));
        assert!(lanes.update_event(&id("a"), icon).is_ok());
        assert_eq!(lanes.len(), 1);

        assert_eq!(lanes.set_millis_per_pixel(5.0), Ok(true));
        assert_eq!(layout(&lanes), [["a"], ["b"]]);
        assert_eq!(lanes.edges_of(&id("a")), Some(Interval::new(0.0, 30.0)));

        assert_eq!(lanes.set_millis_per_pixel(5.0), Ok(false));
        assert_eq!(lanes.set_millis_per_pixel(0.5), Ok(true));
        assert_eq!(layout(&lanes), [["a", "b"]]);
    }

    #[test]
    fn simple_kind_uses_one_lane() {
        let mut lanes = LaneArray::new(LaneKind::Simple, 1.0);
        assert!(lanes.add_event(id("a"), EventAttrs::new(0.0, 10.0).with_rank(2.0)).is_ok());
        assert!(lanes.add_event(id("b"), EventAttrs::new(5.0, 15.0).with_rank(1.0)).is_ok());
        assert!(lanes.add_event(id("c"), EventAttrs::new(0.0, 20.0)).is_ok());
        assert_eq!(layout(&lanes), [["c", "b", "a"]]);
        assert_eq!(lanes.event_at(0, 7.0), Some(&id("a")));

        assert_eq!(lanes.remove_event(&id("a")), Ok(()));
        assert_eq!(lanes.event_at(0, 7.0), Some(&id("b")));
        assert_eq!(lanes.remove_event(&id("b")), Ok(()));
        assert_eq!(lanes.remove_event(&id("c")), Ok(()));
        assert!(lanes.is_empty());
    }
}
