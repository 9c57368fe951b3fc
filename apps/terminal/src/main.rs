use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use draw_core::{Control, DrawSequencer, PresentationSurface, RngSource};
use shared::domain::Draw;
use speech::{SimulatedSpeech, SpeechOutput, UnsupportedSpeech, Utterance, UtteranceSink, Voice};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod surface;

use config::{load_settings, Settings};
use surface::TerminalSurface;

#[derive(Parser, Debug)]
#[command(about = "Animated 6/45 lottery draw in the terminal")]
struct Args {
    /// Run this many draws back to back instead of waiting for Enter.
    #[arg(long)]
    rounds: Option<u32>,
    /// Seed for a reproducible draw.
    #[arg(long)]
    seed: Option<u64>,
    /// Replay these six numbers, in reveal order.
    #[arg(long, value_delimiter = ',')]
    numbers: Option<Vec<u8>>,
    #[arg(long)]
    no_speech: bool,
    #[arg(long)]
    no_color: bool,
    #[arg(long)]
    locale: Option<String>,
    /// Print sequencer events to stdout as JSON lines; the draw itself goes to stderr.
    #[arg(long)]
    json: bool,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if self.no_speech {
            settings.speech = false;
        }
        if self.no_color {
            settings.color = false;
        }
        if let Some(locale) = &self.locale {
            settings.locale = locale.clone();
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn speech_output(settings: &Settings, to_stderr: bool) -> Arc<dyn SpeechOutput> {
    if !settings.speech {
        return Arc::new(UnsupportedSpeech);
    }

    let sink: UtteranceSink = Arc::new(move |utterance: &Utterance, voice: Option<&Voice>| {
        let voice = voice.map_or("default voice", |voice| voice.name.as_str());
        let line = format!("  [speech/{voice}] {}", utterance.text);
        if to_stderr {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    });
    Arc::new(SimulatedSpeech::new(&settings.voices, &settings.locale).with_sink(sink))
}

fn spawn_event_printer(sequencer: &DrawSequencer) {
    let mut events = sequencer.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(err) => warn!("failed to encode sequencer event: {err}"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event printer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn start_round(sequencer: &Arc<DrawSequencer>, replay: Option<&Draw>) -> Result<()> {
    match replay {
        Some(draw) => {
            sequencer.start_with(draw.clone()).await;
        }
        None => {
            sequencer.start().await.context("failed to sample a draw")?;
        }
    }
    Ok(())
}

async fn run_rounds(
    sequencer: &Arc<DrawSequencer>,
    rounds: u32,
    replay: Option<&Draw>,
) -> Result<()> {
    for round in 1..=rounds {
        info!(round, rounds, "starting round");
        start_round(sequencer, replay).await?;
        sequencer.join().await;
    }
    Ok(())
}

async fn run_interactive(sequencer: &Arc<DrawSequencer>, replay: Option<&Draw>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let command = line.trim();
                if command.eq_ignore_ascii_case("q") || command.eq_ignore_ascii_case("quit") {
                    break;
                }
                start_round(sequencer, replay).await?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    sequencer.stop().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut settings = load_settings(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;

    let replay = args
        .numbers
        .as_deref()
        .map(Draw::from_numbers)
        .transpose()
        .context("--numbers must be six distinct values in 1..=45")?;

    let config = settings.sequencer_config();
    let out: Box<dyn Write + Send> = if args.json {
        Box::new(std::io::stderr())
    } else {
        Box::new(std::io::stdout())
    };
    let surface = Arc::new(TerminalSurface::new(
        out,
        config.timings.ball_animation,
        settings.color,
    ));
    let speech = speech_output(&settings, args.json);
    let sequencer = match args.seed {
        Some(seed) => DrawSequencer::new(surface.clone(), speech, RngSource::seeded(seed), config),
        None => DrawSequencer::new(surface.clone(), speech, RngSource::from_entropy(), config),
    };

    if args.json {
        spawn_event_printer(&sequencer);
    }

    match args.rounds {
        Some(rounds) => run_rounds(&sequencer, rounds, replay.as_ref()).await,
        None => {
            surface.set_control_visible(Control::Start, true)?;
            run_interactive(&sequencer, replay.as_ref()).await
        }
    }
}
