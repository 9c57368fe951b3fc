use std::{
    collections::{BTreeSet, HashSet, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::anyhow;
use async_trait::async_trait;
use shared::{
    domain::{BallNumber, SequencerState},
    protocol::SequencerSnapshot,
};
use speech::{SimulatedSpeech, SpeechOutcome, SpeechOutput, Utterance, UtteranceSink, Voice};

use crate::{BallElementId, Control, DrawSequencer, PresentationSurface, RandomSource};

pub(crate) struct ScriptedSource {
    values: VecDeque<u8>,
}

impl ScriptedSource {
    pub(crate) fn new(values: &[u8]) -> Self {
        Self {
            values: values.iter().copied().collect(),
        }
    }
}

impl RandomSource for ScriptedSource {
    fn next_in_range(&mut self, low: u8, _high: u8) -> u8 {
        self.values.pop_front().unwrap_or(low)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SurfaceCall {
    Reset,
    Reveal(BallElementId, u8),
    Discard(BallElementId),
    Render(Vec<u8>),
    Control(Control, bool),
    Progress(bool),
    Spotlight(Option<u8>),
    Message(Vec<String>),
}

pub(crate) struct RecordingSurface {
    animation: Duration,
    fail_reveals: bool,
    calls: Mutex<Vec<SurfaceCall>>,
    live: Mutex<BTreeSet<BallElementId>>,
    visible: Mutex<HashSet<Control>>,
}

impl RecordingSurface {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::build(false))
    }

    pub(crate) fn failing_reveals() -> Arc<Self> {
        Arc::new(Self::build(true))
    }

    fn build(fail_reveals: bool) -> Self {
        Self {
            animation: Duration::from_millis(800),
            fail_reveals,
            calls: Mutex::new(Vec::new()),
            live: Mutex::new(BTreeSet::new()),
            visible: Mutex::new(HashSet::from([Control::Start])),
        }
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().expect("calls lock").push(call);
    }

    pub(crate) fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn revealed_order(&self) -> Vec<u8> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Reveal(_, number) => Some(number),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn renders(&self) -> Vec<Vec<u8>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Render(numbers) => Some(numbers),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, wanted: &SurfaceCall) -> usize {
        self.calls().iter().filter(|call| *call == wanted).count()
    }

    pub(crate) fn live_elements(&self) -> usize {
        self.live.lock().expect("live lock").len()
    }

    pub(crate) fn is_visible(&self, control: Control) -> bool {
        self.visible.lock().expect("visible lock").contains(&control)
    }
}

#[async_trait]
impl PresentationSurface for RecordingSurface {
    async fn reveal_ball(&self, element: BallElementId, number: BallNumber) -> anyhow::Result<()> {
        self.record(SurfaceCall::Reveal(element, number.get()));
        if self.fail_reveals {
            return Err(anyhow!("animation host detached"));
        }
        self.live.lock().expect("live lock").insert(element);
        tokio::time::sleep(self.animation).await;
        Ok(())
    }

    fn discard_ball(&self, element: BallElementId) -> anyhow::Result<()> {
        self.record(SurfaceCall::Discard(element));
        self.live.lock().expect("live lock").remove(&element);
        Ok(())
    }

    fn render_revealed(&self, revealed: &[BallNumber]) -> anyhow::Result<()> {
        self.record(SurfaceCall::Render(
            revealed.iter().map(|number| number.get()).collect(),
        ));
        Ok(())
    }

    fn set_control_visible(&self, control: Control, visible: bool) -> anyhow::Result<()> {
        self.record(SurfaceCall::Control(control, visible));
        let mut shown = self.visible.lock().expect("visible lock");
        if visible {
            shown.insert(control);
        } else {
            shown.remove(&control);
        }
        Ok(())
    }

    fn set_progress_visible(&self, visible: bool) -> anyhow::Result<()> {
        self.record(SurfaceCall::Progress(visible));
        Ok(())
    }

    fn spotlight(&self, number: Option<BallNumber>) -> anyhow::Result<()> {
        self.record(SurfaceCall::Spotlight(number.map(BallNumber::get)));
        Ok(())
    }

    fn show_message(&self, lines: &[String]) -> anyhow::Result<()> {
        self.record(SurfaceCall::Message(lines.to_vec()));
        Ok(())
    }

    fn reset(&self) -> anyhow::Result<()> {
        self.record(SurfaceCall::Reset);
        self.live.lock().expect("live lock").clear();
        let mut shown = self.visible.lock().expect("visible lock");
        shown.clear();
        shown.insert(Control::Start);
        Ok(())
    }
}

pub(crate) struct FailingSpeech;

#[async_trait]
impl SpeechOutput for FailingSpeech {
    async fn speak(&self, _utterance: Utterance) -> anyhow::Result<SpeechOutcome> {
        Err(anyhow!("audio device lost"))
    }

    fn cancel_active(&self) {}

    fn is_available(&self) -> bool {
        true
    }
}

/// Simulated Korean speech that records every utterance text.
pub(crate) fn recording_speech() -> (Arc<SimulatedSpeech>, Arc<Mutex<Vec<String>>>) {
    let spoken = Arc::new(Mutex::new(Vec::new()));
    let sink: UtteranceSink = {
        let spoken = Arc::clone(&spoken);
        Arc::new(move |utterance: &Utterance, _voice: Option<&Voice>| {
            spoken.lock().expect("spoken lock").push(utterance.text.clone());
        })
    };
    let speech = SimulatedSpeech::new(&[Voice::new("Yuna", "ko-KR")], "ko-KR").with_sink(sink);
    (Arc::new(speech), spoken)
}

pub(crate) async fn wait_for_state(
    sequencer: &DrawSequencer,
    state: SequencerState,
) -> SequencerSnapshot {
    let mut snapshots = sequencer.watch_snapshot();
    let snapshot = snapshots
        .wait_for(|snapshot| snapshot.state == state)
        .await
        .expect("sequencer dropped")
        .clone();
    snapshot
}
