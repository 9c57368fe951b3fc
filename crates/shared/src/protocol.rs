use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BallNumber, Draw, DrawId, SequencerState};

/// Point-in-time view of the sequencer, replaced as a whole on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerSnapshot {
    pub draw_id: Option<DrawId>,
    pub state: SequencerState,
    pub draw: Option<Draw>,
    pub revealed: Vec<BallNumber>,
    pub started_at: Option<DateTime<Utc>>,
}

impl SequencerSnapshot {
    pub fn is_current(&self, draw_id: DrawId) -> bool {
        self.draw_id == Some(draw_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SequencerEvent {
    DrawStarted {
        draw_id: DrawId,
        draw: Draw,
        started_at: DateTime<Utc>,
    },
    BallRevealed {
        draw_id: DrawId,
        number: BallNumber,
        revealed: Vec<BallNumber>,
    },
    AnnouncementStarted {
        draw_id: DrawId,
    },
    NumberAnnounced {
        draw_id: DrawId,
        number: BallNumber,
    },
    DrawCompleted {
        draw_id: DrawId,
        numbers: Vec<BallNumber>,
    },
    DrawCancelled {
        draw_id: DrawId,
        state: SequencerState,
    },
}

impl SequencerEvent {
    pub fn draw_id(&self) -> DrawId {
        match self {
            SequencerEvent::DrawStarted { draw_id, .. }
            | SequencerEvent::BallRevealed { draw_id, .. }
            | SequencerEvent::AnnouncementStarted { draw_id }
            | SequencerEvent::NumberAnnounced { draw_id, .. }
            | SequencerEvent::DrawCompleted { draw_id, .. }
            | SequencerEvent::DrawCancelled { draw_id, .. } => *draw_id,
        }
    }
}
