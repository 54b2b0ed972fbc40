//! pitchpilot - sing to steer through the gaps
//!
//! Runs one session from the chosen audio source, prints the observed vocal
//! range and, if the score allows it, song recommendations.

use std::path::Path;
use std::process::ExitCode;
use std::sync::PoisonError;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pitchpilot::audio::{
    AudioSource, MicrophoneSource, SilentSource, SynthSource, WavFileSource, GUIDE_TONE,
};
use pitchpilot::cli::{Args, SourceKind};
use pitchpilot::error::{ConfigError, SessionError};
use pitchpilot::game::{drive_offline, GameSessionController, SessionResult, SessionRunner};
use pitchpilot::params::GameConfig;
use pitchpilot::recommend::{
    RecommendationResult, ScoringProfile, SongCatalog, VocalAnalysisProfile, VoiceTestResult,
};

/// Everything printed at the end of a run
#[derive(Serialize)]
struct Report {
    result: SessionResult,
    recommendations: Vec<RecommendationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refused: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> pitchpilot::Result<()> {
    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let catalog = match &args.catalog {
        Some(path) => SongCatalog::load(path)?,
        None => {
            warn!("No catalog given; recommendations will be empty");
            SongCatalog::default()
        }
    };

    let mut controller = match args.seed {
        Some(seed) => GameSessionController::with_seed(config.clone(), seed),
        None => GameSessionController::from_entropy(config.clone()),
    };
    let max_ticks = args.max_seconds.map(|s| config.timing.seconds_to_ticks(s));
    let hop_ms = config.timing.sampler_interval_ms;

    let (result, mut controller) = match args.source {
        SourceKind::Mic => run_live(controller, args, &config)?,
        offline => {
            let mut source = open_offline_source(offline, args, &config, hop_ms)?;
            controller.start()?;
            info!(source = ?offline, "Running session offline");
            let result = drive_offline(&mut controller, &mut source, max_ticks);
            (result, Some(controller))
        }
    };

    let Some(result) = result else {
        return Err(SessionError::NotEnded.into());
    };

    let (recommendations, refused) = match controller.as_mut() {
        Some(controller) => match recommend(controller, &catalog, args) {
            Ok(list) => (list, None),
            Err(e @ SessionError::InsufficientScore { .. }) => (Vec::new(), Some(e.to_string())),
            Err(e) => return Err(e.into()),
        },
        None => (Vec::new(), Some("session controller unavailable".to_string())),
    };

    let report = Report {
        result,
        recommendations,
        refused,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &catalog);
    }
    Ok(())
}

fn open_offline_source(
    kind: SourceKind,
    args: &Args,
    config: &GameConfig,
    hop_ms: u64,
) -> pitchpilot::Result<Box<dyn AudioSource>> {
    let source: Box<dyn AudioSource> = match kind {
        SourceKind::Wav => {
            let path = args.wav.as_deref().ok_or_else(|| {
                ConfigError::Invalid("--source wav requires --wav <PATH>".to_string())
            })?;
            Box::new(WavFileSource::open(path, &config.analyzer, hop_ms)?)
        }
        SourceKind::Synth => Box::new(SynthSource::new(
            GUIDE_TONE,
            &config.analyzer,
            hop_ms,
            args.synth_duration_secs(),
        )?),
        SourceKind::Silent | SourceKind::Mic => Box::new(SilentSource),
    };
    Ok(source)
}

/// Real-time microphone session on a runner thread
fn run_live(
    controller: GameSessionController,
    args: &Args,
    config: &GameConfig,
) -> pitchpilot::Result<(Option<SessionResult>, Option<GameSessionController>)> {
    let analyzer = config.analyzer.clone();
    let record = args.record.clone();
    let runner = SessionRunner::spawn(controller, move || {
        MicrophoneSource::open(&analyzer, record.as_deref())
            .map(|mic| Box::new(mic) as Box<dyn AudioSource>)
    })?;

    println!("Sing to steer: higher pitch moves up. Press Ctrl-C to quit.");

    // Out-of-range limits behave as no limit
    let deadline = args
        .max_seconds
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .and_then(|d| Instant::now().checked_add(d));
    while !runner.is_finished() {
        if deadline.map_or(false, |d| Instant::now() >= d) {
            break;
        }
        thread::sleep(Duration::from_millis(100));
    }

    let shared = runner.controller();
    let result = runner.stop();

    // The runner thread is gone, so this is the last handle
    let controller = std::sync::Arc::try_unwrap(shared)
        .ok()
        .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner));
    Ok((result, controller))
}

fn recommend(
    controller: &mut GameSessionController,
    catalog: &SongCatalog,
    args: &Args,
) -> Result<Vec<RecommendationResult>, SessionError> {
    let preferences = args.preferences();

    if let Some(path) = &args.voice_tests {
        match load_voice_tests(path) {
            Ok(takes) => {
                let trim = controller.config().scoring.comfortable_trim;
                let analysis = VocalAnalysisProfile::from_test_results(&takes, trim)
                    .or_session_range(controller.vocal_profile(), trim);
                let profile = ScoringProfile::Analysis(analysis);
                return controller.request_recommendations_for(
                    &profile,
                    catalog.songs(),
                    preferences.as_ref(),
                );
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Ignoring voice tests"),
        }
    }

    if args.full_flow() {
        controller.request_recommendations(catalog.songs(), preferences.as_ref())
    } else {
        controller.quick_recommendations(catalog.songs())
    }
}

fn load_voice_tests(path: &Path) -> pitchpilot::Result<Vec<VoiceTestResult>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn print_report(report: &Report, catalog: &SongCatalog) {
    let result = &report.result;
    let profile = &result.vocal_profile;

    println!();
    println!("Score: {}", result.score);
    println!("Lives: {}/{}", result.lives_remaining, result.max_lives);
    if profile.is_empty() {
        println!("Range: no pitch detected");
    } else {
        println!(
            "Range: {} - {} ({:.0}-{:.0} Hz, {} semitones)",
            profile.min_note, profile.max_note, profile.min_hz, profile.max_hz, result.range_semitones
        );
    }
    if !result.capture_available {
        println!("(no microphone was available; the session ran on silence)");
    }

    if let Some(reason) = &report.refused {
        println!("\nNo recommendations: {}", reason);
        return;
    }

    println!("\nRecommended songs:");
    if report.recommendations.is_empty() {
        println!("  (none)");
    }
    for (rank, rec) in report.recommendations.iter().enumerate() {
        let title = catalog
            .songs()
            .iter()
            .find(|s| s.id == rec.song_id)
            .map(|s| format!("{} - {}", s.artist, s.title))
            .unwrap_or_else(|| rec.song_id.clone());
        println!(
            "  {:>2}. {:<40} {:>3}  {}",
            rank + 1,
            title,
            rec.match_score,
            rec.reason_tags.join(", ")
        );
    }
}
