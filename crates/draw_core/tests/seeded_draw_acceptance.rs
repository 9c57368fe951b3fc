use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use draw_core::{
    BallElementId, Control, DrawSequencer, PresentationSurface, RandomSource, SequencerConfig,
};
use shared::domain::{BallNumber, SequencerState};
use speech::UnsupportedSpeech;

struct FixedSequence(VecDeque<u8>);

impl RandomSource for FixedSequence {
    fn next_in_range(&mut self, low: u8, _high: u8) -> u8 {
        self.0.pop_front().unwrap_or(low)
    }
}

#[derive(Default)]
struct Screen {
    revealed_balls: Mutex<Vec<u8>>,
    lists: Mutex<Vec<Vec<u8>>>,
    message: Mutex<Option<Vec<String>>>,
    restart_visible: Mutex<bool>,
}

#[async_trait]
impl PresentationSurface for Screen {
    async fn reveal_ball(&self, _element: BallElementId, number: BallNumber) -> anyhow::Result<()> {
        self.revealed_balls.lock().expect("lock").push(number.get());
        tokio::time::sleep(std::time::Duration::from_millis(800)).await;
        Ok(())
    }

    fn discard_ball(&self, _element: BallElementId) -> anyhow::Result<()> {
        Ok(())
    }

    fn render_revealed(&self, revealed: &[BallNumber]) -> anyhow::Result<()> {
        self.lists
            .lock()
            .expect("lock")
            .push(revealed.iter().map(|n| n.get()).collect());
        Ok(())
    }

    fn set_control_visible(&self, control: Control, visible: bool) -> anyhow::Result<()> {
        if control == Control::Restart {
            *self.restart_visible.lock().expect("lock") = visible;
        }
        Ok(())
    }

    fn set_progress_visible(&self, _visible: bool) -> anyhow::Result<()> {
        Ok(())
    }

    fn spotlight(&self, _number: Option<BallNumber>) -> anyhow::Result<()> {
        Ok(())
    }

    fn show_message(&self, lines: &[String]) -> anyhow::Result<()> {
        *self.message.lock().expect("lock") = Some(lines.to_vec());
        Ok(())
    }

    fn reset(&self) -> anyhow::Result<()> {
        self.lists.lock().expect("lock").clear();
        *self.message.lock().expect("lock") = None;
        *self.restart_visible.lock().expect("lock") = false;
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn seeded_draw_reveals_progressively_and_finishes() {
    let screen = Arc::new(Screen::default());
    let sequencer = DrawSequencer::new(
        screen.clone(),
        Arc::new(UnsupportedSpeech),
        FixedSequence(VecDeque::from([7, 23, 41, 3, 45, 18])),
        SequencerConfig::default(),
    );

    sequencer.start().await.expect("start");
    let mut snapshots = sequencer.watch_snapshot();
    snapshots
        .wait_for(|snapshot| snapshot.state == SequencerState::Done)
        .await
        .expect("sequencer alive");

    assert_eq!(
        *screen.revealed_balls.lock().expect("lock"),
        vec![7, 23, 41, 3, 45, 18]
    );

    let lists = screen.lists.lock().expect("lock").clone();
    let sorted_prefixes: Vec<Vec<u8>> = lists
        .iter()
        .map(|list| {
            let mut sorted = list.clone();
            sorted.sort_unstable();
            sorted
        })
        .collect();
    assert_eq!(lists, sorted_prefixes);
    assert_eq!(
        lists,
        vec![
            vec![7],
            vec![7, 23],
            vec![7, 23, 41],
            vec![3, 7, 23, 41],
            vec![3, 7, 23, 41, 45],
            vec![3, 7, 18, 23, 41, 45],
        ]
    );

    assert_eq!(
        screen.message.lock().expect("lock").clone(),
        Some(vec![
            "진접 직원 여러분".to_string(),
            "이 번호로 꼭 당첨되세요!".to_string()
        ])
    );
    assert!(*screen.restart_visible.lock().expect("lock"));
    assert_eq!(sequencer.state(), SequencerState::Done);
}
