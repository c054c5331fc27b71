use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use timeline_lanes_protocol::{EventId, LaneKind, RowConfig};

use super::{ModelError, TimelineEvent};
use crate::signal::Signal;

/// An ordered set of events shown on one timeline row.
///
/// Membership changes are announced after they are applied, carrying the
/// ids involved in their new order.
#[derive(Debug)]
pub struct Row {
    config: RowConfig,
    order: RefCell<Vec<EventId>>,
    events: RefCell<HashMap<EventId, Rc<TimelineEvent>>>,
    events_added: Signal<Vec<EventId>>,
    events_removed: Signal<Vec<EventId>>,
    events_moved: Signal<Vec<EventId>>,
}

impl Row {
    pub fn new(config: RowConfig) -> Self {
        Self {
            config,
            order: RefCell::new(Vec::new()),
            events: RefCell::new(HashMap::new()),
            events_added: Signal::new(),
            events_removed: Signal::new(),
            events_moved: Signal::new(),
        }
    }

    pub fn config(&self) -> RowConfig {
        self.config
    }

    pub fn lane_kind(&self) -> LaneKind {
        self.config.lane_kind()
    }

    pub fn len(&self) -> usize {
        self.order.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.borrow().is_empty()
    }

    pub fn event_ids(&self) -> Vec<EventId> {
        self.order.borrow().clone()
    }

    pub fn event(&self, id: &EventId) -> Option<Rc<TimelineEvent>> {
        self.events.borrow().get(id).cloned()
    }

    /// Events in row order.
    pub fn events(&self) -> Vec<Rc<TimelineEvent>> {
        let events = self.events.borrow();
        self.order
            .borrow()
            .iter()
            .filter_map(|id| events.get(id).cloned())
            .collect()
    }

    pub fn add_event(&self, event: Rc<TimelineEvent>) -> Result<(), ModelError> {
        self.add_events([event])
    }

    /// Appends several events and announces them together. Nothing is added
    /// if any id is already present or repeated.
    pub fn add_events(
        &self,
        events: impl IntoIterator<Item = Rc<TimelineEvent>>,
    ) -> Result<(), ModelError> {
        let events: Vec<Rc<TimelineEvent>> = events.into_iter().collect();
        {
            let existing = self.events.borrow();
            let mut seen = std::collections::HashSet::new();
            for event in &events {
                if existing.contains_key(event.id()) || !seen.insert(event.id().clone()) {
                    return Err(ModelError::DuplicateEvent(event.id().clone()));
                }
            }
        }
        if events.is_empty() {
            return Ok(());
        }

        let ids: Vec<EventId> = events.iter().map(|e| e.id().clone()).collect();
        {
            let mut table = self.events.borrow_mut();
            for event in events {
                table.insert(event.id().clone(), event);
            }
            self.order.borrow_mut().extend(ids.iter().cloned());
        }
        self.events_added.emit(&ids);
        Ok(())
    }

    pub fn remove_event(&self, id: &EventId) -> Result<Rc<TimelineEvent>, ModelError> {
        let removed = self
            .events
            .borrow_mut()
            .remove(id)
            .ok_or_else(|| ModelError::UnknownEvent(id.clone()))?;
        self.order.borrow_mut().retain(|e| e != id);
        self.events_removed.emit(&vec![id.clone()]);
        Ok(removed)
    }

    /// Moves an event to `index` in row order, clamped to the last position.
    pub fn move_event(&self, id: &EventId, index: usize) -> Result<(), ModelError> {
        {
            let mut order = self.order.borrow_mut();
            let from = order
                .iter()
                .position(|e| e == id)
                .ok_or_else(|| ModelError::UnknownEvent(id.clone()))?;
            let moved = order.remove(from);
            let to = index.min(order.len());
            order.insert(to, moved);
        }
        self.events_moved.emit(&vec![id.clone()]);
        Ok(())
    }

    pub fn events_added(&self) -> &Signal<Vec<EventId>> {
        &self.events_added
    }

    pub fn events_removed(&self) -> &Signal<Vec<EventId>> {
        &self.events_removed
    }

    pub fn events_moved(&self) -> &Signal<Vec<EventId>> {
        &self.events_moved
    }
}

impl Default for Row {
    fn default() -> Self {
        Self::new(RowConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeline_lanes_protocol::EventAttrs;

    fn event(id: &str) -> Rc<TimelineEvent> {
        TimelineEvent::new(id, EventAttrs::new(0.0, 1.0))
    }

    fn ids(row: &Row) -> Vec<String> {
        row.event_ids().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn add_and_remove_announce_ids() {
        let row = Row::default();
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        row.events_added()
            .connect(move |ids: &Vec<EventId>| l.borrow_mut().push(format!("+{}", ids.len())));
        let l = Rc::clone(&log);
        row.events_removed()
            .connect(move |ids: &Vec<EventId>| l.borrow_mut().push(format!("-{}", ids[0])));

        assert_eq!(row.add_events([event("a"), event("b")]), Ok(()));
        assert_eq!(row.remove_event(&EventId::from("a")).map(|e| e.id().clone()), Ok(EventId::from("a")));
        assert_eq!(*log.borrow(), ["+2", "-a"]);
        assert_eq!(ids(&row), ["b"]);
    }

    #[test]
    fn duplicates_are_rejected_atomically() {
        let row = Row::default();
        assert_eq!(row.add_event(event("a")), Ok(()));
        assert_eq!(
            row.add_events([event("b"), event("a")]),
            Err(ModelError::DuplicateEvent(EventId::from("a")))
        );
        assert_eq!(
            row.add_events([event("c"), event("c")]),
            Err(ModelError::DuplicateEvent(EventId::from("c")))
        );
        assert_eq!(ids(&row), ["a"]);
        assert_eq!(
            row.remove_event(&EventId::from("zz")).map(|_| ()),
            Err(ModelError::UnknownEvent(EventId::from("zz")))
        );
    }

    #[test]
    fn move_reorders_and_clamps() {
        let row = Row::default();
        let moves = Rc::new(RefCell::new(Vec::new()));
        let m = Rc::clone(&moves);
        row.events_moved()
            .connect(move |ids: &Vec<EventId>| m.borrow_mut().push(ids.clone()));

        assert_eq!(row.add_events([event("a"), event("b"), event("c")]), Ok(()));
        assert!(moves.borrow().is_empty());
        assert_eq!(row.move_event(&EventId::from("a"), 99), Ok(()));
        assert_eq!(ids(&row), ["b", "c", "a"]);
        assert_eq!(row.move_event(&EventId::from("c"), 0), Ok(()));
        assert_eq!(ids(&row), ["c", "b", "a"]);
        let order: Vec<String> = row.events().iter().map(|e| e.id().to_string()).collect();
        assert_eq!(order, ["c", "b", "a"]);

        assert_eq!(
            *moves.borrow(),
            [vec![EventId::from("a")], vec![EventId::from("c")]]
        );
        assert!(row.move_event(&EventId::from("zz"), 0).is_err());
        assert_eq!(moves.borrow().len(), 2);
    }
}
