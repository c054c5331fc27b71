//! The row and event objects a [`LaneArray`](crate::LaneArray) is wired to.
//!
//! These are shared, interior-mutable objects (`Rc` + `RefCell`) that
//! announce every change through a [`Signal`](crate::signal::Signal).

pub mod event;
pub mod row;
pub mod scale;

pub use event::TimelineEvent;
pub use row::Row;
pub use scale::TimeScale;

use thiserror::Error;
use timeline_lanes_protocol::EventId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("row already has event {0}")]
    DuplicateEvent(EventId),
    #[error("row has no event {0}")]
    UnknownEvent(EventId),
}
