//! Speech output capability used to announce drawn numbers.
//!
//! Engines implement [`SpeechOutput`]. Every engine must keep at most one
//! utterance active: starting a new one supersedes the previous utterance.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

mod simulated;

pub use simulated::{SimulatedSpeech, UtteranceSink};

pub const DEFAULT_LOCALE: &str = "ko-KR";

const RATE_RANGE: std::ops::RangeInclusive<f32> = 0.1..=10.0;
const PITCH_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

#[derive(Debug, Error, PartialEq)]
pub enum SpeechError {
    #[error("speech rate {0} is outside 0.1..=10.0")]
    RateOutOfRange(f32),
    #[error("speech pitch {0} is outside 0.0..=2.0")]
    PitchOutOfRange(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lang: DEFAULT_LOCALE.to_string(),
            rate: 1.0,
            pitch: 1.0,
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn validate(&self) -> Result<(), SpeechError> {
        if !RATE_RANGE.contains(&self.rate) {
            return Err(SpeechError::RateOutOfRange(self.rate));
        }
        if !PITCH_RANGE.contains(&self.pitch) {
            return Err(SpeechError::PitchOutOfRange(self.pitch));
        }
        Ok(())
    }
}

/// How a `speak` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    Finished,
    /// Superseded by a newer utterance or cancelled.
    Interrupted,
    /// Nothing was spoken: the engine is unavailable or the text was empty.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Speaks `utterance` and resolves once it has ended. Engines that cannot
    /// speak resolve immediately with [`SpeechOutcome::Skipped`].
    async fn speak(&self, utterance: Utterance) -> anyhow::Result<SpeechOutcome>;
    /// Stops the active utterance, if any.
    fn cancel_active(&self);
    fn is_available(&self) -> bool;
}

/// Engine for platforms without speech synthesis.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSpeech;

#[async_trait]
impl SpeechOutput for UnsupportedSpeech {
    async fn speak(&self, _utterance: Utterance) -> anyhow::Result<SpeechOutcome> {
        Ok(SpeechOutcome::Skipped)
    }

    fn cancel_active(&self) {}

    fn is_available(&self) -> bool {
        false
    }
}

fn normalize_lang(lang: &str) -> String {
    lang.trim().replace('_', "-").to_ascii_lowercase()
}

/// Picks the voice for `locale`: exact locale match first (`ko-KR` and
/// `ko_KR` are equal), then any voice sharing the language prefix. `None`
/// leaves the choice to the platform default.
pub fn select_voice(voices: &[Voice], locale: &str) -> Option<Voice> {
    let wanted = normalize_lang(locale);
    if let Some(exact) = voices.iter().find(|voice| normalize_lang(&voice.lang) == wanted) {
        return Some(exact.clone());
    }

    let language = wanted.split('-').next().unwrap_or_default();
    let prefixed = if language.is_empty() {
        None
    } else {
        voices
            .iter()
            .find(|voice| normalize_lang(&voice.lang).starts_with(language))
            .cloned()
    };

    if prefixed.is_none() {
        warn!(locale, "speech: no voice for locale, using platform default");
    }
    prefixed
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
