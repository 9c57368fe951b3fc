use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::debug;

use crate::{select_voice, SpeechOutcome, SpeechOutput, Utterance, Voice};

const DEFAULT_PER_CHAR: Duration = Duration::from_millis(90);
const MIN_UTTERANCE: Duration = Duration::from_millis(200);

/// Observer invoked when an utterance starts, with the voice chosen for it.
pub type UtteranceSink = Arc<dyn Fn(&Utterance, Option<&Voice>) + Send + Sync>;

struct ActiveUtterance {
    id: u64,
    cancel: oneshot::Sender<()>,
}

/// Speech engine that "speaks" for a duration proportional to the text length.
///
/// Used where no synthesizer is attached, so that timing and supersession
/// behave like a real engine.
pub struct SimulatedSpeech {
    voice: Option<Voice>,
    per_char: Duration,
    sink: Option<UtteranceSink>,
    active: Mutex<Option<ActiveUtterance>>,
    next_id: AtomicU64,
}

impl SimulatedSpeech {
    pub fn new(voices: &[Voice], locale: &str) -> Self {
        Self {
            voice: select_voice(voices, locale),
            per_char: DEFAULT_PER_CHAR,
            sink: None,
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_per_char(mut self, per_char: Duration) -> Self {
        self.per_char = per_char;
        self
    }

    pub fn with_sink(mut self, sink: UtteranceSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    pub fn duration_for(&self, utterance: &Utterance) -> Duration {
        let chars = utterance.text.chars().count() as f64;
        let spoken_nanos = self.per_char.as_nanos() as f64 * chars / f64::from(utterance.rate);
        Duration::from_nanos(spoken_nanos.round() as u64).max(MIN_UTTERANCE)
    }

    pub fn is_speaking(&self) -> bool {
        self.active
            .lock()
            .map(|active| active.is_some())
            .unwrap_or(false)
    }

    fn replace_active(&self, next: ActiveUtterance) {
        let previous = match self.active.lock() {
            Ok(mut active) => active.replace(next),
            Err(poisoned) => poisoned.into_inner().replace(next),
        };
        if let Some(previous) = previous {
            debug!(utterance_id = previous.id, "speech: superseded active utterance");
            let _ = previous.cancel.send(());
        }
    }

    fn clear_active(&self, id: u64) {
        let mut active = match self.active.lock() {
            Ok(active) => active,
            Err(poisoned) => poisoned.into_inner(),
        };
        if active.as_ref().map(|current| current.id) == Some(id) {
            *active = None;
        }
    }
}

#[async_trait]
impl SpeechOutput for SimulatedSpeech {
    async fn speak(&self, utterance: Utterance) -> anyhow::Result<SpeechOutcome> {
        utterance.validate()?;
        if utterance.text.trim().is_empty() {
            return Ok(SpeechOutcome::Skipped);
        }

        let duration = self.duration_for(&utterance);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (cancel, cancelled) = oneshot::channel();
        self.replace_active(ActiveUtterance { id, cancel });

        if let Some(sink) = &self.sink {
            sink(&utterance, self.voice.as_ref());
        }
        debug!(
            utterance_id = id,
            lang = %utterance.lang,
            duration_ms = duration.as_millis() as u64,
            "speech: speaking"
        );

        let outcome = tokio::select! {
            _ = tokio::time::sleep(duration) => SpeechOutcome::Finished,
            _ = cancelled => SpeechOutcome::Interrupted,
        };

        self.clear_active(id);
        Ok(outcome)
    }

    fn cancel_active(&self) {
        let previous = match self.active.lock() {
            Ok(mut active) => active.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(previous) = previous {
            debug!(utterance_id = previous.id, "speech: cancelled active utterance");
            let _ = previous.cancel.send(());
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}
