//! Draw sequencing: sampling a draw, revealing balls one by one on a
//! presentation surface, then announcing the result through speech.

use async_trait::async_trait;
use shared::domain::BallNumber;

pub mod config;
pub mod sampler;
mod sequencer;

pub use config::{Phrasebook, SequencerConfig, Timings};
pub use sampler::{sample_draw, sample_draw_bounded, RandomSource, RngSource, MAX_SAMPLING_ATTEMPTS};
pub use sequencer::DrawSequencer;

/// Identifies one animated ball element on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BallElementId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Start,
    Restart,
    LuckIndicator,
}

/// Where a draw is shown. Only `reveal_ball` gates the sequence; the rest are
/// immediate state changes.
#[async_trait]
pub trait PresentationSurface: Send + Sync {
    /// Animates `number` into the machine as `element` and resolves when that
    /// element's animation has ended.
    async fn reveal_ball(&self, element: BallElementId, number: BallNumber) -> anyhow::Result<()>;
    fn discard_ball(&self, element: BallElementId) -> anyhow::Result<()>;
    /// Redraws the revealed list, already sorted ascending.
    fn render_revealed(&self, revealed: &[BallNumber]) -> anyhow::Result<()>;
    fn set_control_visible(&self, control: Control, visible: bool) -> anyhow::Result<()>;
    fn set_progress_visible(&self, visible: bool) -> anyhow::Result<()>;
    /// Large single-number display while that number is being announced.
    fn spotlight(&self, number: Option<BallNumber>) -> anyhow::Result<()>;
    fn show_message(&self, lines: &[String]) -> anyhow::Result<()>;
    /// Back to the initial layout: start control shown, result controls and
    /// message hidden, revealed list empty, every ball element removed.
    fn reset(&self) -> anyhow::Result<()>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod support;

#[cfg(test)]
#[path = "tests/sampler_tests.rs"]
mod sampler_tests;

#[cfg(test)]
#[path = "tests/sequencer_tests.rs"]
mod sequencer_tests;
