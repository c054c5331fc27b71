use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use timeline_lanes_protocol::{EventId, LaneSnapshot};
use tracing::{debug, error};

use crate::lane::LaneError;
use crate::lane_array::LaneArray;
use crate::model::{Row, TimeScale, TimelineEvent};
use crate::signal::ListenerId;

struct Shared {
    lanes: RefCell<LaneArray>,
    tracked: RefCell<HashMap<EventId, (Weak<TimelineEvent>, ListenerId)>>,
}

/// Keeps a [`LaneArray`] in step with a [`Row`] and the timeline zoom.
///
/// Listens for events entering and leaving the row, for edits to each
/// event in it, and for zoom changes. All listeners are detached by
/// [`dispose`](Self::dispose), which also runs on drop.
///
/// The lanes are borrowed while a change is being handled, so do not edit
/// events or the row while holding the [`Ref`] returned by
/// [`lanes`](Self::lanes).
pub struct RowLanes {
    row: Rc<Row>,
    scale: Rc<TimeScale>,
    shared: Rc<Shared>,
    row_listeners: Option<(ListenerId, ListenerId)>,
    scale_listener: Option<ListenerId>,
}

impl RowLanes {
    pub fn new(row: Rc<Row>, scale: Rc<TimeScale>) -> Self {
        let shared = Rc::new(Shared {
            lanes: RefCell::new(LaneArray::new(row.lane_kind(), scale.millis_per_pixel())),
            tracked: RefCell::new(HashMap::new()),
        });
        for event in row.events() {
            track(&shared, &event);
        }

        let added = {
            let shared = Rc::downgrade(&shared);
            let weak_row = Rc::downgrade(&row);
            row.events_added().connect(move |ids: &Vec<EventId>| {
                let (Some(shared), Some(row)) = (shared.upgrade(), weak_row.upgrade()) else {
                    return;
                };
                for id in ids {
                    if let Some(event) = row.event(id) {
                        track(&shared, &event);
                    }
                }
            })
        };
        let removed = {
            let shared = Rc::downgrade(&shared);
            row.events_removed().connect(move |ids: &Vec<EventId>| {
                if let Some(shared) = shared.upgrade() {
                    for id in ids {
                        untrack(&shared, id);
                    }
                }
            })
        };
        let zoomed = {
            let shared = Rc::downgrade(&shared);
            scale.changed().connect(move |millis_per_pixel: &f64| {
                if let Some(shared) = shared.upgrade() {
                    let result = shared
                        .lanes
                        .borrow_mut()
                        .set_millis_per_pixel(*millis_per_pixel);
                    if let Some(true) = report("zoom", result) {
                        debug!(millis_per_pixel, "zoom invalidated icon edges");
                    }
                }
            })
        };

        Self {
            row,
            scale,
            shared,
            row_listeners: Some((added, removed)),
            scale_listener: Some(zoomed),
        }
    }

    pub fn row(&self) -> &Rc<Row> {
        &self.row
    }

    pub fn lanes(&self) -> Ref<'_, LaneArray> {
        self.shared.lanes.borrow()
    }

    /// Number of lanes.
    pub fn len(&self) -> usize {
        self.lanes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes().is_empty()
    }

    pub fn num_events(&self) -> usize {
        self.lanes().num_events()
    }

    pub fn lane_of(&self, id: &EventId) -> Option<usize> {
        self.lanes().lane_of(id)
    }

    /// Hit-test for cursor and hover handling.
    pub fn event_at(&self, lane_index: usize, time: f64) -> Option<EventId> {
        self.lanes().event_at(lane_index, time).cloned()
    }

    pub fn snapshot(&self) -> LaneSnapshot {
        self.lanes().snapshot()
    }

    pub fn is_disposed(&self) -> bool {
        self.row_listeners.is_none()
    }

    /// Detaches every listener this binding registered. The lanes keep their
    /// last state but stop following the row.
    pub fn dispose(&mut self) {
        if let Some((added, removed)) = self.row_listeners.take() {
            self.row.events_added().disconnect(added);
            self.row.events_removed().disconnect(removed);
        }
        if let Some(zoomed) = self.scale_listener.take() {
            self.scale.changed().disconnect(zoomed);
        }
        for (_, (event, listener)) in self.shared.tracked.borrow_mut().drain() {
            if let Some(event) = event.upgrade() {
                event.changed().disconnect(listener);
            }
        }
    }
}

impl Drop for RowLanes {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for RowLanes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowLanes")
            .field("lanes", &*self.lanes())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

fn track(shared: &Rc<Shared>, event: &Rc<TimelineEvent>) {
    let id = event.id().clone();
    let attrs = event.attrs().clone();
    if report("add", shared.lanes.borrow_mut().add_event(id.clone(), attrs)).is_none() {
        return;
    }

    let weak_shared = Rc::downgrade(shared);
    let weak_event = Rc::downgrade(event);
    let listener = event.changed().connect(move |_| {
        let (Some(shared), Some(event)) = (weak_shared.upgrade(), weak_event.upgrade()) else {
            return;
        };
        let attrs = event.attrs().clone();
        let result = shared.lanes.borrow_mut().update_event(event.id(), attrs);
        report("update", result);
    });
    shared
        .tracked
        .borrow_mut()
        .insert(id, (Rc::downgrade(event), listener));
}

fn untrack(shared: &Shared, id: &EventId) {
    let tracked = shared.tracked.borrow_mut().remove(id);
    if let Some((event, listener)) = tracked
        && let Some(event) = event.upgrade()
    {
        event.changed().disconnect(listener);
    }
    report("remove", shared.lanes.borrow_mut().remove_event(id));
}

/// The row never hands the lanes a duplicate or unknown id, so an error here
/// means the two have drifted apart.
fn report<T>(op: &str, result: Result<T, LaneError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!(op, error = %e, "lane bookkeeping out of sync with row");
            None
        }
    }
}
