use std::cell::{Ref, RefCell};
use std::rc::Rc;

use timeline_lanes_protocol::{EventAttrs, EventId, EventSpec, IconSpec};

use crate::signal::Signal;

/// A timeline event whose attributes can be edited in place.
///
/// Every edit emits [`changed`](Self::changed) once, after the new
/// attributes are stored.
#[derive(Debug)]
pub struct TimelineEvent {
    id: EventId,
    attrs: RefCell<EventAttrs>,
    changed: Signal<()>,
}

impl TimelineEvent {
    pub fn new(id: impl Into<EventId>, attrs: EventAttrs) -> Rc<Self> {
        Rc::new(Self {
            id: id.into(),
            attrs: RefCell::new(attrs),
            changed: Signal::new(),
        })
    }

    pub fn from_spec(spec: EventSpec) -> Rc<Self> {
        Self::new(spec.id, spec.attrs)
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    /// Current attributes. Do not hold the borrow across an edit.
    pub fn attrs(&self) -> Ref<'_, EventAttrs> {
        self.attrs.borrow()
    }

    pub fn changed(&self) -> &Signal<()> {
        &self.changed
    }

    pub fn edit(&self, f: impl FnOnce(&mut EventAttrs)) {
        f(&mut *self.attrs.borrow_mut());
        self.changed.emit(&());
    }

    pub fn set_interval(&self, start: f64, end: f64) {
        self.edit(|attrs| {
            attrs.start = start;
            attrs.end = end;
        });
    }

    pub fn set_rank(&self, rank: Option<f64>) {
        self.edit(|attrs| attrs.rank = rank);
    }

    pub fn set_icons(&self, icons: Vec<IconSpec>) {
        self.edit(|attrs| attrs.icons = icons);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn each_edit_notifies_once() {
        let event = TimelineEvent::new("e", EventAttrs::new(0.0, 1.0));
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        event.changed().connect(move |_| h.set(h.get() + 1));

        event.set_interval(2.0, 3.0);
        event.set_rank(Some(1.0));
        event.set_icons(vec![IconSpec::new(0.0, 8.0, 0.5)]);
        assert_eq!(hits.get(), 3);
        assert_eq!(event.attrs().interval().start, 2.0);
        assert_eq!(event.attrs().rank, Some(1.0));
        assert!(event.attrs().has_icons());
    }

    #[test]
    fn listeners_see_new_attributes() {
        let event = TimelineEvent::new("e", EventAttrs::new(0.0, 1.0));
        let seen = Rc::new(Cell::new(0.0));
        let weak = Rc::downgrade(&event);
        let s = Rc::clone(&seen);
        event.changed().connect(move |_| {
            if let Some(event) = weak.upgrade() {
                s.set(event.attrs().end);
            }
        });
        event.set_interval(0.0, 42.0);
        assert_eq!(seen.get(), 42.0);
    }
}
