//! Single-threaded change notification.
//!
//! A [`Signal`] calls its listeners synchronously, in connection order.
//! Listeners may connect or disconnect listeners (on the same signal or any
//! other) while being called; such requests are queued and take effect once
//! the outermost [`Signal::emit`] on that signal returns, so every listener
//! sees a given emission against the same listener set.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`Signal::connect`], used to disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Rc<dyn Fn(&T)>;

enum Pending<T> {
    Connect(ListenerId, Listener<T>),
    Disconnect(ListenerId),
}

struct Registry<T> {
    listeners: Vec<(ListenerId, Listener<T>)>,
    pending: Vec<Pending<T>>,
    dispatch_depth: usize,
    next_id: u64,
}

impl<T> Registry<T> {
    fn is_live(&self, id: ListenerId) -> bool {
        let mut live = self.listeners.iter().any(|(l, _)| *l == id);
        for op in &self.pending {
            match op {
                Pending::Connect(l, _) if *l == id => live = true,
                Pending::Disconnect(l) if *l == id => live = false,
                _ => {}
            }
        }
        live
    }

    fn apply_pending(&mut self) {
        for op in std::mem::take(&mut self.pending) {
            match op {
                Pending::Connect(id, listener) => self.listeners.push((id, listener)),
                Pending::Disconnect(id) => self.listeners.retain(|(l, _)| *l != id),
            }
        }
    }
}

pub struct Signal<T> {
    registry: RefCell<Registry<T>>,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(Registry {
                listeners: Vec::new(),
                pending: Vec::new(),
                dispatch_depth: 0,
                next_id: 0,
            }),
        }
    }

    pub fn connect(&self, listener: impl Fn(&T) + 'static) -> ListenerId {
        let mut registry = self.registry.borrow_mut();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        let listener: Listener<T> = Rc::new(listener);
        if registry.dispatch_depth > 0 {
            registry.pending.push(Pending::Connect(id, listener));
        } else {
            registry.listeners.push((id, listener));
        }
        id
    }

    /// Returns whether `id` was connected.
    pub fn disconnect(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.borrow_mut();
        if !registry.is_live(id) {
            return false;
        }
        if registry.dispatch_depth > 0 {
            registry.pending.push(Pending::Disconnect(id));
        } else {
            registry.listeners.retain(|(l, _)| *l != id);
        }
        true
    }

    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Listener<T>> = {
            let mut registry = self.registry.borrow_mut();
            registry.dispatch_depth += 1;
            registry
                .listeners
                .iter()
                .map(|(_, l)| Rc::clone(l))
                .collect()
        };

        for listener in &snapshot {
            listener(value);
        }

        let mut registry = self.registry.borrow_mut();
        registry.dispatch_depth -= 1;
        if registry.dispatch_depth == 0 {
            registry.apply_pending();
        }
    }

    /// Number of connected listeners, not counting queued changes.
    pub fn len(&self) -> usize {
        self.registry.borrow().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn calls_listeners_in_order() {
        let signal = Signal::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b"] {
            let log = Rc::clone(&log);
            signal.connect(move |v| log.borrow_mut().push(format!("{tag}{v}")));
        }
        signal.emit(&1);
        assert_eq!(*log.borrow(), ["a1", "b1"]);
    }

    #[test]
    fn disconnect_stops_delivery() {
        let signal = Signal::<()>::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let id = signal.connect(move |_| h.set(h.get() + 1));
        signal.emit(&());
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(&());
        assert_eq!(hits.get(), 1);
        assert!(signal.is_empty());
    }

    #[test]
    fn connect_during_dispatch_waits_for_next_emit() {
        let signal = Rc::new(Signal::<()>::new());
        let late_hits = Rc::new(Cell::new(0));
        let connected = Rc::new(Cell::new(false));

        let s = Rc::downgrade(&signal);
        let late = Rc::clone(&late_hits);
        let done = Rc::clone(&connected);
        signal.connect(move |_| {
            if done.replace(true) {
                return;
            }
            if let Some(s) = s.upgrade() {
                let late = Rc::clone(&late);
                s.connect(move |_| late.set(late.get() + 1));
            }
        });

        signal.emit(&());
        assert_eq!(late_hits.get(), 0);
        assert_eq!(signal.len(), 2);
        signal.emit(&());
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn disconnect_during_dispatch_still_delivers_current_emit() {
        let signal = Rc::new(Signal::<()>::new());
        let second_hits = Rc::new(Cell::new(0));
        let second_id = Rc::new(Cell::new(None));

        let s = Rc::downgrade(&signal);
        let target = Rc::clone(&second_id);
        signal.connect(move |_| {
            if let (Some(s), Some(id)) = (s.upgrade(), target.get()) {
                s.disconnect(id);
            }
        });
        let hits = Rc::clone(&second_hits);
        second_id.set(Some(signal.connect(move |_| hits.set(hits.get() + 1))));

        signal.emit(&());
        assert_eq!(second_hits.get(), 1);
        signal.emit(&());
        assert_eq!(second_hits.get(), 1);
        assert_eq!(signal.len(), 1);
    }

    #[test]
    fn nested_emit_defers_until_outermost_returns() {
        let signal = Rc::new(Signal::<u8>::new());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = Rc::downgrade(&signal);
        let log = Rc::clone(&seen);
        signal.connect(move |depth| {
            log.borrow_mut().push(*depth);
            let Some(s) = s.upgrade() else { return };
            if *depth == 0 {
                let log = Rc::clone(&log);
                s.connect(move |d| log.borrow_mut().push(100 + *d));
                s.emit(&1);
                assert_eq!(s.len(), 1);
            }
        });

        signal.emit(&0);
        assert_eq!(*seen.borrow(), [0, 1]);
        assert_eq!(signal.len(), 2);
    }
}
