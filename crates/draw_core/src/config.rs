use std::time::Duration;

use serde::Deserialize;
use shared::domain::BallNumber;
use speech::{Utterance, DEFAULT_LOCALE};

/// Fixed pacing of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// How long a surface animates one ball into place.
    pub ball_animation: Duration,
    pub between_balls: Duration,
    /// Pause after the last ball before announcements begin.
    pub settle: Duration,
    pub announcement_gap: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            ball_animation: Duration::from_millis(800),
            between_balls: Duration::from_millis(600),
            settle: Duration::from_millis(500),
            announcement_gap: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Phrasebook {
    pub lead_in: String,
    /// Appended to each announced number.
    pub number_suffix: String,
    pub closing: String,
    pub message_lines: Vec<String>,
}

impl Phrasebook {
    pub fn korean() -> Self {
        Self {
            lead_in: "당첨 번호는".into(),
            number_suffix: "번".into(),
            closing: "진접 직원 여러분, 이 번호로 꼭 당첨되세요!".into(),
            message_lines: vec!["진접 직원 여러분".into(), "이 번호로 꼭 당첨되세요!".into()],
        }
    }

    pub fn number(&self, number: BallNumber) -> String {
        format!("{number}{}", self.number_suffix)
    }
}

impl Default for Phrasebook {
    fn default() -> Self {
        Self::korean()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequencerConfig {
    pub timings: Timings,
    pub phrasebook: Phrasebook,
    pub locale: String,
    pub speech_rate: f32,
    pub speech_pitch: f32,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            phrasebook: Phrasebook::default(),
            locale: DEFAULT_LOCALE.into(),
            speech_rate: 1.0,
            speech_pitch: 1.0,
        }
    }
}

impl SequencerConfig {
    pub fn utterance(&self, text: impl Into<String>) -> Utterance {
        Utterance::new(text)
            .with_lang(self.locale.clone())
            .with_rate(self.speech_rate)
            .with_pitch(self.speech_pitch)
    }
}
