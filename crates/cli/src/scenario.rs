use std::rc::Rc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use timeline_lanes_core::RowLanes;
use timeline_lanes_core::model::{ModelError, Row, TimeScale, TimelineEvent};
use timeline_lanes_protocol::{EventId, EventSpec, IconSpec, LaneKind, LaneSnapshot, RowConfig};

/// A row to build and a sequence of edits to replay against it.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: RowConfig,
    #[serde(default = "Scenario::default_millis_per_pixel")]
    pub millis_per_pixel: f64,
    #[serde(default)]
    pub events: Vec<EventSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One edit, as the row and timeline would see it from user interaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    Add {
        event: EventSpec,
    },
    Remove {
        id: EventId,
    },
    /// Changes whichever attributes are given.
    Edit {
        id: EventId,
        #[serde(default)]
        start: Option<f64>,
        #[serde(default)]
        end: Option<f64>,
        #[serde(default)]
        rank: Option<f64>,
        #[serde(default)]
        icons: Option<Vec<IconSpec>>,
    },
    Move {
        id: EventId,
        index: usize,
    },
    Zoom {
        millis_per_pixel: f64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub lane_kind: LaneKind,
    pub millis_per_pixel: f64,
    /// Lanes after each step, in step order.
    pub history: Vec<LaneSnapshot>,
    pub lanes: LaneSnapshot,
}

impl Scenario {
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    fn default_millis_per_pixel() -> f64 {
        1.0
    }

    pub fn run(&self) -> Result<Report> {
        let row = Rc::new(Row::new(self.config));
        row.add_events(self.events.iter().cloned().map(TimelineEvent::from_spec))
            .context("loading initial events")?;
        let scale = Rc::new(TimeScale::new(self.millis_per_pixel));
        let lanes = RowLanes::new(Rc::clone(&row), Rc::clone(&scale));

        let mut history = Vec::with_capacity(self.steps.len());
        for (i, step) in self.steps.iter().enumerate() {
            step.apply(&row, &scale)
                .with_context(|| format!("step {i} ({step:?})"))?;
            history.push(lanes.snapshot());
        }

        Ok(Report {
            lane_kind: row.lane_kind(),
            millis_per_pixel: scale.millis_per_pixel(),
            history,
            lanes: lanes.snapshot(),
        })
    }
}

impl Step {
    fn apply(&self, row: &Row, scale: &TimeScale) -> Result<(), ModelError> {
        match self {
            Step::Add { event } => row.add_event(TimelineEvent::from_spec(event.clone()))?,
            Step::Remove { id } => {
                row.remove_event(id)?;
            }
            Step::Edit {
                id,
                start,
                end,
                rank,
                icons,
            } => {
                let event = row
                    .event(id)
                    .ok_or_else(|| ModelError::UnknownEvent(id.clone()))?;
                event.edit(|attrs| {
                    if let Some(start) = start {
                        attrs.start = *start;
                    }
                    if let Some(end) = end {
                        attrs.end = *end;
                    }
                    if rank.is_some() {
                        attrs.rank = *rank;
                    }
                    if let Some(icons) = icons {
                        attrs.icons.clone_from(icons);
                    }
                });
            }
            Step::Move { id, index } => row.move_event(id, *index)?,
            Step::Zoom { millis_per_pixel } => scale.set_millis_per_pixel(*millis_per_pixel),
        }
        Ok(())
    }
}
