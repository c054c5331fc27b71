//! Lane assignment for timeline rows.
//!
//! A timeline row draws many time-interval events; overlapping ones cannot
//! share a horizontal track. [`LaneArray`] packs a row's events into as few
//! non-overlapping lanes as it can and keeps that packing tight, with as
//! little movement as possible, while events are added, removed, resized or
//! restyled. [`RowLanes`] wires a lane array to a [`model::Row`] so that it
//! follows the row's change notifications on its own.

pub mod edges;
pub mod lane;
pub mod lane_array;
pub mod model;
pub mod row_lanes;
pub mod search;
pub mod signal;

pub use edges::effective_edges;
pub use lane::{Lane, LaneError, LaneEvent, SimpleLane, StackLane};
pub use lane_array::{LaneArray, Relocation};
pub use row_lanes::RowLanes;
