use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use draw_core::{Phrasebook, SequencerConfig, Timings};
use serde::Deserialize;
use speech::{Utterance, Voice, DEFAULT_LOCALE};

const DEFAULT_CONFIG_FILE: &str = "lotto.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub locale: String,
    pub speech: bool,
    pub speech_rate: f32,
    pub speech_pitch: f32,
    pub color: bool,
    pub ball_animation_ms: u64,
    pub between_balls_ms: u64,
    pub settle_ms: u64,
    pub announcement_gap_ms: u64,
    pub voices: Vec<Voice>,
    pub phrases: Phrasebook,
}

impl Default for Settings {
    fn default() -> Self {
        let timings = Timings::default();
        Self {
            locale: DEFAULT_LOCALE.into(),
            speech: true,
            speech_rate: 1.0,
            speech_pitch: 1.0,
            color: true,
            ball_animation_ms: timings.ball_animation.as_millis() as u64,
            between_balls_ms: timings.between_balls.as_millis() as u64,
            settle_ms: timings.settle.as_millis() as u64,
            announcement_gap_ms: timings.announcement_gap.as_millis() as u64,
            voices: vec![Voice::new("Yuna", "ko-KR"), Voice::new("Samantha", "en-US")],
            phrases: Phrasebook::korean(),
        }
    }
}

impl Settings {
    pub fn timings(&self) -> Timings {
        Timings {
            ball_animation: Duration::from_millis(self.ball_animation_ms),
            between_balls: Duration::from_millis(self.between_balls_ms),
            settle: Duration::from_millis(self.settle_ms),
            announcement_gap: Duration::from_millis(self.announcement_gap_ms),
        }
    }

    pub fn sequencer_config(&self) -> SequencerConfig {
        SequencerConfig {
            timings: self.timings(),
            phrasebook: self.phrases.clone(),
            locale: self.locale.clone(),
            speech_rate: self.speech_rate,
            speech_pitch: self.speech_pitch,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        Utterance::new("")
            .with_rate(self.speech_rate)
            .with_pitch(self.speech_pitch)
            .validate()
            .context("invalid speech settings")?;
        if self.phrases.message_lines.is_empty() {
            anyhow::bail!("phrases.message_lines must hold at least one line");
        }
        Ok(())
    }
}

/// Defaults, then `lotto.toml` (or `explicit_path`), then `LOTTO_*` environment
/// variables.
pub fn load_settings(explicit_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = match explicit_path {
        Some(path) => read_settings_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                read_settings_file(default_path)?
            } else {
                Settings::default()
            }
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    parse_settings(&raw).with_context(|| format!("invalid config file '{}'", path.display()))
}

pub fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str::<Settings>(raw)?)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("LOTTO_LOCALE") {
        settings.locale = v;
    }
    if let Some(v) = lookup("LOTTO__LOCALE") {
        settings.locale = v;
    }

    if let Some(flag) = lookup("LOTTO_SPEECH").as_deref().and_then(parse_flag) {
        settings.speech = flag;
    }
    if let Some(rate) = lookup("LOTTO_SPEECH_RATE").and_then(|v| v.parse::<f32>().ok()) {
        settings.speech_rate = rate;
    }
    if let Some(flag) = lookup("LOTTO_COLOR").as_deref().and_then(parse_flag) {
        settings.color = flag;
    }

    let millis = |key: &str| lookup(key).and_then(|v| v.parse::<u64>().ok());
    if let Some(ms) = millis("LOTTO__BALL_ANIMATION_MS") {
        settings.ball_animation_ms = ms;
    }
    if let Some(ms) = millis("LOTTO__BETWEEN_BALLS_MS") {
        settings.between_balls_ms = ms;
    }
    if let Some(ms) = millis("LOTTO__SETTLE_MS") {
        settings.settle_ms = ms;
    }
    if let Some(ms) = millis("LOTTO__ANNOUNCEMENT_GAP_MS") {
        settings.announcement_gap_ms = ms;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
