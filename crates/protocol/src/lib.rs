pub mod event_id;
pub mod types;

pub use event_id::EventId;
pub use types::{EventAttrs, EventSpec, IconSpec, Interval, LaneKind, LaneSnapshot, RowConfig};
