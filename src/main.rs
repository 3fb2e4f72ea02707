//! decisim CLI
//!
//! Usage:
//!   decisim --gesture "0.22,0.44;0.46,0.61;0.82,0.78"   # Score a gesture
//!   decisim --ladder proof-first --reveal 3 --commit      # Walk the evidence ladder
//!   decisim --replay trace.json                           # Verify a trace or payload
//!   decisim --gesture "..." --export trace.json           # Export the captured trace
//!   decisim --serve                                       # HTTP API server
//!   decisim --gesture "..." --json                        # JSON output

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use colored::Colorize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use decisim::config::SimConfig;
use decisim::core::{
    gesture_view, ladder_view, run_server, GestureModel, GestureSession, LadderAction, LadderModel,
    LadderSession, ReplayEngine,
};
use decisim::error::{Error, Result};
use decisim::types::{GestureView, LadderView, PlaybackResult, PointerKind, Sample};
use decisim::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "decisim",
    version = VERSION,
    about = "Deterministic decision simulations: gesture scoring and evidence ladders",
    long_about = "decisim turns pointer gestures and evidence reveals into replayable decisions.\n\n\
                  Modes:\n  \
                  --gesture   Score a pointer path between Route A and Route B\n  \
                  --ladder    Reveal evidence steps for a route and try to seal it\n  \
                  --replay    Verify a saved trace envelope or ladder payload\n  \
                  --serve     HTTP API server mode"
)]
struct Args {
    /// Gesture path as "x,y;x,y;..." in the unit square
    #[arg(short, long)]
    gesture: Option<String>,

    /// Evidence ladder route (config default when given without a value)
    #[arg(short, long, num_args = 0..=1, default_missing_value = "")]
    ladder: Option<String>,

    /// Number of ladder steps to reveal
    #[arg(long, default_value_t = 3)]
    reveal: usize,

    /// Commit the seal after revealing
    #[arg(long)]
    commit: bool,

    /// Replay and verify a trace envelope or ladder payload
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Write the captured trace/payload to this file
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (overrides config)
    #[arg(long)]
    addr: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show criterion breakdown and debug logs
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.no_color {
        colored::control::set_override(false);
    }

    match run(args).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "decisim=debug" } else { "decisim=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns false when a replay did not verify
async fn run(args: Args) -> Result<bool> {
    let mut config = SimConfig::load_or_default(args.config.as_deref())?;
    if let Some(addr) = &args.addr {
        config.server_addr = addr.clone();
    }

    if args.serve {
        run_server(config).await?;
        return Ok(true);
    }
    if let Some(path) = &args.replay {
        return run_replay(path, &config, &args);
    }
    if let Some(points) = &args.gesture {
        run_gesture(points, &config, &args)?;
        return Ok(true);
    }
    if let Some(route) = &args.ladder {
        let route = if route.is_empty() { config.default_route.clone() } else { route.clone() };
        run_ladder(&route, &config, &args)?;
        return Ok(true);
    }

    Args::command().print_help()?;
    Ok(true)
}

// =============================================================================
// GESTURE
// =============================================================================

/// Parse "x,y;x,y;..." into points
fn parse_points(input: &str) -> Result<Vec<(f64, f64)>> {
    let points = input
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| Error::InvalidInput(format!("expected x,y but got '{}'", pair)))?;
            let parse = |v: &str| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|_| Error::InvalidInput(format!("not a number: '{}'", v.trim())))
            };
            Ok((parse(x)?, parse(y)?))
        })
        .collect::<Result<Vec<_>>>()?;

    if points.len() < 2 {
        return Err(Error::InvalidInput("a gesture needs at least two points".to_string()));
    }
    Ok(points)
}

fn run_gesture(input: &str, config: &SimConfig, args: &Args) -> Result<()> {
    let points = parse_points(input)?;
    let last = points.len() - 1;
    let mut session = GestureSession::new(GestureModel::standard());

    for (i, (x, y)) in points.iter().enumerate() {
        let kind = match i {
            0 => PointerKind::Down,
            i if i == last => PointerKind::Up,
            _ => PointerKind::Move,
        };
        session.dispatch_sample(Sample::new(kind, i as u64 + 1, *x, *y, 1, "cli"));
    }

    let view = gesture_view(session.state());
    if args.json {
        print_json(&view)?;
    } else {
        print_gesture(&view, args.verbose);
    }

    if let Some(path) = &args.export {
        let envelope = session.export(&config.trace_version(), &config.gesture_source);
        write_export(path, config, &serde_json::to_string_pretty(&envelope)?)?;
    }
    Ok(())
}

fn print_gesture(view: &GestureView, verbose: bool) {
    let phase = view.phase.to_string().color(view.phase.color_name()).bold();
    println!("{} {} ({} samples, certainty {}%)", "Gesture".bold(), phase, view.sample_count, view.certainty);

    let breakdown = match &view.breakdown {
        Some(b) => b,
        None => {
            println!("  {}", "No decision: the gesture never crossed the movement threshold".dimmed());
            return;
        }
    };

    println!(
        "  Route A ({}) {:>7.2}   Route B ({}) {:>7.2}",
        decisim::types::Route::A.label(),
        breakdown.score_a,
        decisim::types::Route::B.label(),
        breakdown.score_b
    );
    let verdict = format!("{} wins", breakdown.winner_label);
    if breakdown.tie {
        println!("  {} {}", verdict.yellow().bold(), "(tie-break)".yellow());
    } else {
        println!("  {}", verdict.green().bold());
    }

    for reason in &breakdown.reasons {
        println!("  {} {}", "-".dimmed(), reason);
    }

    if verbose {
        println!();
        println!("  {:<16} {:>6} {:>9} {:>8} {:>8}", "criterion", "weight", "emphasis", "A", "B");
        for row in &breakdown.rows {
            let line = format!(
                "  {:<16} {:>6.2} {:>9.4} {:>8.2} {:>8.2}",
                row.label, row.weight, row.emphasis, row.to_a, row.to_b
            );
            match row.favors {
                Some(decisim::types::Route::A) => println!("{}", line.cyan()),
                Some(decisim::types::Route::B) => println!("{}", line.magenta()),
                None => println!("{}", line),
            }
        }
        println!("  {} {}", "reason:".dimmed(), view.last_reason.dimmed());
    }
}

// =============================================================================
// LADDER
// =============================================================================

fn run_ladder(route: &str, config: &SimConfig, args: &Args) -> Result<()> {
    let model = LadderModel::standard();
    let steps: Vec<String> = model.steps().iter().map(|s| s.id.clone()).collect();
    let mut session = LadderSession::new(model, route)?;

    for step in steps.iter().take(args.reveal) {
        session.dispatch(LadderAction::PointerStart { pointer_id: 1 });
        session.dispatch(LadderAction::PointerFrame { pointer_id: 1, ratio: 1.0 });
        session.dispatch(LadderAction::PointerEnd { pointer_id: 1 });
        session.dispatch(LadderAction::ConfirmStep { step_id: step.clone() });
    }
    let commit = if args.commit {
        Some(session.dispatch(LadderAction::CommitSeal))
    } else {
        None
    };

    let view = ladder_view(session.model(), session.state());
    if args.json {
        print_json(&view)?;
    } else {
        print_ladder(&view, args.verbose);
        if let Some(result) = commit {
            if result.accepted {
                println!("  {}", "Decision sealed".green().bold());
            } else {
                println!("  {} {}", "Seal refused:".yellow().bold(), result.reason);
            }
        }
    }

    if let Some(path) = &args.export {
        let engine = ReplayEngine::new(config, GestureModel::standard(), LadderModel::standard());
        let payload = engine.build_replay_payload(&session);
        write_export(path, config, &engine.serialize_payload(&payload)?)?;
    }
    Ok(())
}

fn print_ladder(view: &LadderView, verbose: bool) {
    let stage = view.stage.to_string().color(view.stage.color_name()).bold();
    println!("{} {} on {}", "Ladder".bold(), stage, view.route_label);
    println!(
        "  confidence {:>3}  uncertainty {:>3}  band {}  seal {}  grade {}",
        view.confidence, view.uncertainty, view.band, view.seal, view.grade
    );
    for card in &view.cards {
        let deltas = match (card.gain, card.drop) {
            (Some(gain), Some(drop)) => format!("+{} / -{}", gain, drop),
            _ => String::new(),
        };
        println!("  [{:?}] {:<24} {}", card.state, card.label, deltas.dimmed());
    }
    if verbose {
        println!("  {} {}", "reason:".dimmed(), view.last_reason.dimmed());
    }
}

// =============================================================================
// REPLAY
// =============================================================================

fn run_replay(path: &Path, config: &SimConfig, args: &Args) -> Result<bool> {
    let json = std::fs::read_to_string(path)?;
    let engine = ReplayEngine::new(config, GestureModel::standard(), LadderModel::standard());
    let result = engine.verify_json(&json);

    if args.json {
        print_json(&result)?;
    } else {
        print_playback(&result);
    }
    Ok(result.ok)
}

fn print_playback(result: &PlaybackResult) {
    if result.ok {
        println!("{} {}", "OK".green().bold(), result.message);
    } else {
        println!("{} {}", "FAILED".red().bold(), result.message);
    }
    if let Some(hash) = &result.hash {
        println!("  hash {}", hash.dimmed());
    }
    if let Some(report) = &result.report {
        for mismatch in &report.mismatches {
            println!("  {}", mismatch.to_string().yellow());
        }
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Relative paths land in the configured export directory
fn write_export(path: &Path, config: &SimConfig, contents: &str) -> Result<()> {
    let target = if path.is_absolute() {
        path.to_path_buf()
    } else {
        config.export_dir.join(path)
    };
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, contents)?;
    tracing::info!("Exported to {}", target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_points() {
        let points = parse_points("0.1,0.2; 0.3,0.4;").unwrap();
        assert_eq!(points, vec![(0.1, 0.2), (0.3, 0.4)]);
    }

    #[test]
    fn test_parse_points_rejects_garbage() {
        assert!(parse_points("0.1,0.2;nope").is_err());
        assert!(parse_points("0.1,x;0.2,0.3").is_err());
        assert!(parse_points("0.5,0.5").is_err());
    }

    #[test]
    fn test_write_export_uses_export_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = SimConfig {
            export_dir: dir.path().join("out"),
            ..SimConfig::default()
        };
        write_export(Path::new("trace.json"), &config, "{}").unwrap();
        assert!(dir.path().join("out/trace.json").exists());
    }
}
