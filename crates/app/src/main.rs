use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use metronome_visualiser_core::{
    AppConfig, BeatClock, BeatSchedule, MappingMatrix, RenderGraph, SceneInstance, TempoSpec,
};
use tracing_subscriber::EnvFilter;

fn main() -> metronome_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_live(args),
        Commands::Schedule(args) => run_schedule(args),
    }
}

fn run_live(args: RunArgs) -> metronome_visualiser_core::Result<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(bpm) = args.bpm {
        config.clock.bpm = bpm;
    }
    if let Some(beats) = args.beats_per_measure {
        config.clock.beats_per_measure = beats;
    }
    if let Some(subdivisions) = args.subdivisions {
        config.clock.subdivisions_per_beat = subdivisions;
    }

    let mut retempo = match (args.retempo_at, args.retempo_bpm) {
        (Some(at), Some(bpm)) => Some((at, bpm)),
        (None, None) => None,
        _ => {
            return Err("--retempo-at and --retempo-bpm must be given together".into());
        }
    };

    let spec = config.clock.tempo_spec()?;
    tracing::info!(%spec, duration = args.duration, "starting live metronome");

    let mut clock = BeatClock::new(spec);
    let mut mappings = MappingMatrix::new();
    let mut render = RenderGraph::new(SceneInstance::new(spec.beats_per_measure()));

    let frame_interval =
        Duration::from_secs_f64(1.0 / f64::from(config.display.frame_rate.max(1)));
    let started = Instant::now();
    clock.play(0.0)?;

    let mut last_position = None;
    loop {
        std::thread::sleep(frame_interval);
        let now = started.elapsed().as_secs_f64();
        if now > args.duration {
            break;
        }

        if let Some((at, bpm)) = retempo {
            if now >= at {
                clock.set_tempo_bpm(bpm, now)?;
                tracing::info!(bpm, at_seconds = now, "tempo changed");
                retempo = None;
            }
        }

        let sample = clock.sample(now)?;
        mappings.apply_from_sample(&sample);
        render.apply_updates(mappings.updates().to_vec());
        render.advance_frame();

        let position = (sample.beat, sample.subdivision);
        if last_position != Some(position) {
            tracing::info!("{}", render.draw_line());
            last_position = Some(position);
        }
    }

    let now = started.elapsed().as_secs_f64();
    clock.pause(now)?;
    let total_beats = clock.elapsed_beats(now)?;
    tracing::info!(total_beats, "demo finished");
    Ok(())
}

fn run_schedule(args: ScheduleArgs) -> metronome_visualiser_core::Result<()> {
    let spec = TempoSpec::new(args.bpm, args.beats_per_measure, args.subdivisions)?;
    tracing::info!(%spec, duration = args.duration, output = ?args.output, "precomputing beat schedule");

    let schedule = BeatSchedule::generate(&spec, args.duration)?;
    schedule.save(&args.output)?;

    tracing::info!(events = schedule.events.len(), "schedule written");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Phase-accurate visual metronome", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the live metronome demo in the terminal.
    Run(RunArgs),
    /// Precompute a beat schedule and persist it as JSON.
    Schedule(ScheduleArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Optional JSON config file with clock and display defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Tempo in beats per minute.
    #[arg(long)]
    bpm: Option<f64>,
    /// Beats per measure.
    #[arg(long)]
    beats_per_measure: Option<u32>,
    /// Subdivisions per beat.
    #[arg(long)]
    subdivisions: Option<u32>,
    /// How long to run, in seconds.
    #[arg(long, default_value_t = 8.0)]
    duration: f64,
    /// Seconds into the run at which to apply a tempo change.
    #[arg(long)]
    retempo_at: Option<f64>,
    /// Tempo to switch to at the retempo point.
    #[arg(long)]
    retempo_bpm: Option<f64>,
}

#[derive(Args, Debug)]
struct ScheduleArgs {
    /// Tempo in beats per minute.
    #[arg(long, default_value_t = 120.0)]
    bpm: f64,
    /// Beats per measure.
    #[arg(long, default_value_t = 4)]
    beats_per_measure: u32,
    /// Subdivisions per beat.
    #[arg(long, default_value_t = 1)]
    subdivisions: u32,
    /// Length of the schedule, in seconds.
    #[arg(long, default_value_t = 60.0)]
    duration: f64,
    /// Output path for the generated JSON schedule.
    output: PathBuf,
}
