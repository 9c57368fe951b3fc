use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use chrono::Utc;
use shared::{
    domain::{BallNumber, Draw, DrawId, RevealedSet, SequencerState},
    error::DrawError,
    protocol::{SequencerEvent, SequencerSnapshot},
};
use speech::SpeechOutput;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    sampler::{sample_draw, RandomSource},
    BallElementId, Control, PresentationSurface, SequencerConfig,
};

struct ActiveSequence {
    draw_id: DrawId,
    task: JoinHandle<()>,
}

/// Runs one draw at a time: reveal, announce, done. `start` from any state
/// aborts the running sequence and begins a fresh one.
pub struct DrawSequencer {
    surface: Arc<dyn PresentationSurface>,
    speech: Arc<dyn SpeechOutput>,
    random: Mutex<Box<dyn RandomSource>>,
    config: SequencerConfig,
    active: tokio::sync::Mutex<Option<ActiveSequence>>,
    snapshot: watch::Sender<SequencerSnapshot>,
    events: broadcast::Sender<SequencerEvent>,
    next_draw_id: AtomicU64,
    next_element_id: AtomicU64,
}

fn log_surface_error(result: anyhow::Result<()>, operation: &'static str) {
    if let Err(err) = result {
        warn!(operation, "draw: presentation surface failed: {err:#}");
    }
}

impl DrawSequencer {
    pub fn new(
        surface: Arc<dyn PresentationSurface>,
        speech: Arc<dyn SpeechOutput>,
        random: impl RandomSource + 'static,
        config: SequencerConfig,
    ) -> Arc<Self> {
        let (snapshot, _) = watch::channel(SequencerSnapshot::default());
        let (events, _) = broadcast::channel(256);
        let random: Box<dyn RandomSource> = Box::new(random);
        Arc::new(Self {
            surface,
            speech,
            random: Mutex::new(random),
            config,
            active: tokio::sync::Mutex::new(None),
            snapshot,
            events,
            next_draw_id: AtomicU64::new(1),
            next_element_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SequencerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> SequencerState {
        self.snapshot.borrow().state
    }

    pub fn watch_snapshot(&self) -> watch::Receiver<SequencerSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SequencerEvent> {
        self.events.subscribe()
    }

    /// Cancels whatever is running, samples a fresh draw and starts revealing it.
    /// If sampling fails the sequencer is left reset in `Idle`.
    pub async fn start(self: &Arc<Self>) -> Result<Draw, DrawError> {
        let mut active = self.active.lock().await;
        self.cancel_locked(&mut active).await;

        let draw = {
            let mut random = match self.random.lock() {
                Ok(random) => random,
                Err(poisoned) => poisoned.into_inner(),
            };
            sample_draw(&mut **random)
        };
        let draw = match draw {
            Ok(draw) => draw,
            Err(err) => {
                error!("draw: sampling failed: {err}");
                return Err(err);
            }
        };

        self.launch_locked(&mut active, draw.clone());
        Ok(draw)
    }

    /// Like [`start`](Self::start), but replays a caller-provided draw.
    pub async fn start_with(self: &Arc<Self>, draw: Draw) -> DrawId {
        let mut active = self.active.lock().await;
        self.cancel_locked(&mut active).await;
        self.launch_locked(&mut active, draw)
    }

    /// Cancels the running sequence, if any, and resets to `Idle`.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        self.cancel_locked(&mut active).await;
    }

    /// Waits for the running sequence to end on its own, closing phrase
    /// included. A concurrent `start` waits behind it.
    pub async fn join(&self) {
        let mut active = self.active.lock().await;
        if let Some(current) = active.take() {
            if let Err(err) = current.task.await {
                error!(draw_id = current.draw_id.0, "draw: sequence task failed: {err}");
            }
        }
    }

    async fn cancel_locked(&self, active: &mut Option<ActiveSequence>) {
        if let Some(previous) = active.take() {
            previous.task.abort();
            match previous.task.await {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => {}
                Err(err) => error!(draw_id = previous.draw_id.0, "draw: sequence task failed: {err}"),
            }

            let state = self.state();
            if state != SequencerState::Done {
                info!(draw_id = previous.draw_id.0, %state, "draw: cancelled");
                let _ = self.events.send(SequencerEvent::DrawCancelled {
                    draw_id: previous.draw_id,
                    state,
                });
            }
        }

        self.speech.cancel_active();
        log_surface_error(self.surface.reset(), "reset");
        self.snapshot.send_replace(SequencerSnapshot::default());
    }

    fn launch_locked(self: &Arc<Self>, active: &mut Option<ActiveSequence>, draw: Draw) -> DrawId {
        let draw_id = DrawId(self.next_draw_id.fetch_add(1, Ordering::Relaxed));
        let started_at = Utc::now();

        log_surface_error(self.surface.set_control_visible(Control::Start, false), "hide start");
        log_surface_error(self.surface.set_progress_visible(true), "show progress");

        self.transition(SequencerState::Drawing);
        self.snapshot.send_modify(|snapshot| {
            snapshot.draw_id = Some(draw_id);
            snapshot.draw = Some(draw.clone());
            snapshot.revealed.clear();
            snapshot.started_at = Some(started_at);
        });
        info!(draw_id = draw_id.0, numbers = ?Vec::<u8>::from(draw.clone()), "draw: started");
        let _ = self.events.send(SequencerEvent::DrawStarted {
            draw_id,
            draw: draw.clone(),
            started_at,
        });

        let task = tokio::spawn(Arc::clone(self).run_sequence(draw_id, draw));
        *active = Some(ActiveSequence { draw_id, task });
        draw_id
    }

    fn transition(&self, next: SequencerState) {
        self.snapshot.send_modify(|snapshot| {
            if !snapshot.state.can_advance_to(next) {
                warn!(from = %snapshot.state, to = %next, "draw: unexpected state transition");
            }
            snapshot.state = next;
        });
    }

    async fn run_sequence(self: Arc<Self>, draw_id: DrawId, draw: Draw) {
        let timings = self.config.timings;
        let mut revealed = RevealedSet::default();
        let order = draw.reveal_order();

        for (index, &number) in order.iter().enumerate() {
            self.reveal(number).await;

            revealed.insert(number);
            log_surface_error(self.surface.render_revealed(revealed.as_slice()), "render revealed");
            self.snapshot
                .send_modify(|snapshot| snapshot.revealed = revealed.as_slice().to_vec());
            let _ = self.events.send(SequencerEvent::BallRevealed {
                draw_id,
                number,
                revealed: revealed.as_slice().to_vec(),
            });
            debug!(draw_id = draw_id.0, number = number.get(), revealed = revealed.len(), "draw: ball revealed");

            let pause = if index + 1 < order.len() {
                timings.between_balls
            } else {
                timings.settle
            };
            tokio::time::sleep(pause).await;
        }

        self.transition(SequencerState::Announcing);
        log_surface_error(self.surface.set_progress_visible(false), "hide progress");
        let _ = self.events.send(SequencerEvent::AnnouncementStarted { draw_id });

        let phrases = &self.config.phrasebook;
        self.say(&phrases.lead_in).await;
        for &number in revealed.as_slice() {
            tokio::time::sleep(timings.announcement_gap).await;
            log_surface_error(self.surface.spotlight(Some(number)), "spotlight");
            self.say(&phrases.number(number)).await;
            log_surface_error(self.surface.spotlight(None), "clear spotlight");
            let _ = self.events.send(SequencerEvent::NumberAnnounced { draw_id, number });
        }

        log_surface_error(self.surface.show_message(&phrases.message_lines), "show message");
        log_surface_error(self.surface.set_control_visible(Control::Restart, true), "show restart");
        log_surface_error(
            self.surface.set_control_visible(Control::LuckIndicator, true),
            "show luck indicator",
        );
        self.transition(SequencerState::Done);
        info!(draw_id = draw_id.0, "draw: completed");
        let _ = self.events.send(SequencerEvent::DrawCompleted {
            draw_id,
            numbers: revealed.as_slice().to_vec(),
        });

        // Nothing waits on the closing phrase; a restart cancels it.
        self.say(&phrases.closing).await;
    }

    async fn reveal(&self, number: BallNumber) {
        let element = BallElementId(self.next_element_id.fetch_add(1, Ordering::Relaxed));
        if let Err(err) = self.surface.reveal_ball(element, number).await {
            warn!(element = element.0, number = number.get(), "draw: reveal failed: {err:#}");
        }
        log_surface_error(self.surface.discard_ball(element), "discard ball");
    }

    async fn say(&self, text: &str) {
        if !self.speech.is_available() {
            return;
        }
        match self.speech.speak(self.config.utterance(text)).await {
            Ok(outcome) => debug!(?outcome, text, "draw: utterance ended"),
            Err(err) => warn!(text, "draw: speech failed: {err:#}"),
        }
    }
}
