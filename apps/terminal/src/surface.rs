//! Presentation surface that renders the draw as lines of terminal text.

use std::{
    collections::BTreeSet,
    io::Write,
    sync::Mutex,
    time::Duration,
};

use anyhow::anyhow;
use async_trait::async_trait;
use draw_core::{BallElementId, Control, PresentationSurface};
use shared::domain::{BallNumber, ColorBand};

const RESET: &str = "\x1b[0m";

fn band_color(band: ColorBand) -> &'static str {
    match band {
        ColorBand::Band0 => "\x1b[1;33m",
        ColorBand::Band1 => "\x1b[1;34m",
        ColorBand::Band2 => "\x1b[1;31m",
        ColorBand::Band3 => "\x1b[1;90m",
        ColorBand::Band4 => "\x1b[1;32m",
    }
}

pub struct TerminalSurface<W: Write + Send> {
    out: Mutex<W>,
    animation: Duration,
    color: bool,
    live: Mutex<BTreeSet<BallElementId>>,
}

impl<W: Write + Send> TerminalSurface<W> {
    pub fn new(out: W, animation: Duration, color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            animation,
            color,
            live: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn live_elements(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or(0)
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn ball(&self, number: BallNumber) -> String {
        if self.color {
            format!("{}({number:>2}){RESET}", band_color(number.band()))
        } else {
            format!("({number:>2})")
        }
    }

    fn line(&self, text: &str) -> anyhow::Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow!("terminal output lock poisoned"))?;
        writeln!(out, "{text}")?;
        out.flush()?;
        Ok(())
    }

    fn live(&self) -> anyhow::Result<std::sync::MutexGuard<'_, BTreeSet<BallElementId>>> {
        self.live
            .lock()
            .map_err(|_| anyhow!("ball element registry lock poisoned"))
    }
}

#[async_trait]
impl<W: Write + Send> PresentationSurface for TerminalSurface<W> {
    async fn reveal_ball(&self, element: BallElementId, number: BallNumber) -> anyhow::Result<()> {
        {
            self.live()?.insert(element);
        }
        self.line(&format!("  ... {} rolls out of the machine", self.ball(number)))?;
        tokio::time::sleep(self.animation).await;
        Ok(())
    }

    fn discard_ball(&self, element: BallElementId) -> anyhow::Result<()> {
        self.live()?.remove(&element);
        Ok(())
    }

    fn render_revealed(&self, revealed: &[BallNumber]) -> anyhow::Result<()> {
        let balls: Vec<String> = revealed.iter().map(|number| self.ball(*number)).collect();
        self.line(&format!("  drawn: {}", balls.join(" ")))
    }

    fn set_control_visible(&self, control: Control, visible: bool) -> anyhow::Result<()> {
        if !visible {
            return Ok(());
        }
        match control {
            Control::Start => self.line("[Enter] draw numbers, [q] quit"),
            Control::Restart => self.line("[Enter] draw again, [q] quit"),
            Control::LuckIndicator => self.line("  Good luck!"),
        }
    }

    fn set_progress_visible(&self, visible: bool) -> anyhow::Result<()> {
        if visible {
            self.line("Drawing...")?;
        }
        Ok(())
    }

    fn spotlight(&self, number: Option<BallNumber>) -> anyhow::Result<()> {
        match number {
            Some(number) => self.line(&format!("      >>> {} <<<", self.ball(number))),
            None => Ok(()),
        }
    }

    fn show_message(&self, lines: &[String]) -> anyhow::Result<()> {
        self.line("")?;
        for text in lines {
            self.line(&format!("  {text}"))?;
        }
        Ok(())
    }

    fn reset(&self) -> anyhow::Result<()> {
        self.live()?.clear();
        self.line("----------------------------------------")
    }
}
