use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use grid_2048::app::{App, AppEvent};
use grid_2048::config::Config;
use grid_2048::input::{self, parse_command};
use grid_2048::session::now_unix_seconds;
use grid_2048::simulate::{self, GameSummary};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "grid-2048", version, about = "Play 2048 in the terminal")]
struct Args {
    #[command(subcommand)]
    cmd: Option<Cmd>,
    /// TOML config file; flags below override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Board size (4, 5 or 6)
    #[arg(long)]
    size: Option<usize>,
    /// Seed for a reproducible tile sequence
    #[arg(long)]
    seed: Option<u64>,
    /// Resume from and save to this file (.json for JSON, anything else binary)
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,
    /// Tracing filter, e.g. "info", "grid_2048=debug"
    #[arg(long)]
    log: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Play interactively, one command per line (default)
    Play,
    /// Run random-policy games in parallel and print aggregate stats
    Simulate {
        /// Number of games
        #[arg(long, default_value_t = 100)]
        games: u64,
        /// Per-game: stop after this many moves
        #[arg(long)]
        max_moves: Option<u64>,
        /// Print the aggregate as JSON
        #[arg(long)]
        json: bool,
        /// Suppress the progress bar
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => Config::from_toml(path).with_context(|| format!("reading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(size) = args.size { cfg.board_size = size; }
    if let Some(seed) = args.seed { cfg.seed = Some(seed); }
    if let Some(save) = args.save { cfg.save_path = Some(save); }
    if let Some(log) = args.log { cfg.log = log; }
    cfg.validate()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(cfg.log.clone()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match args.cmd.unwrap_or(Cmd::Play) {
        Cmd::Play => play(&cfg),
        Cmd::Simulate { games, max_moves, json, quiet } => run_simulation(&cfg, games, max_moves, json, quiet),
    }
}

fn play(cfg: &Config) -> anyhow::Result<()> {
    let mut app = App::from_config(cfg)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render(&mut out, &app)?;
    writeln!(out, "type `help` for commands")?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let Some(cmd) = parse_command(&line) else {
            if !line.trim().is_empty() {
                writeln!(out, "unknown command: {}", line.trim())?;
            }
            continue;
        };
        let mut redraw = false;
        for event in app.handle(cmd) {
            match event {
                AppEvent::Moved(_) | AppEvent::Undone | AppEvent::NewGame { .. } => redraw = true,
                AppEvent::NoOp => writeln!(out, "nothing moved")?,
                AppEvent::NothingToUndo => writeln!(out, "nothing to undo")?,
                AppEvent::Won => writeln!(out, "You win! Keep playing or type `new`.")?,
                AppEvent::GameOver => {
                    let session = app.engine().session();
                    writeln!(
                        out,
                        "Game over. Final score: {} in {} moves.",
                        session.score(),
                        session.moves()
                    )?;
                }
                AppEvent::Unlocked(a) => writeln!(out, "Achievement unlocked: {} ({})", a.title(), a.description())?,
                AppEvent::Rejected(reason) => writeln!(out, "{reason}")?,
                AppEvent::Share(text) => writeln!(out, "{text}")?,
                AppEvent::Help => writeln!(out, "{}", input::HELP)?,
                AppEvent::Quit => return Ok(()),
            }
        }
        if redraw {
            render(&mut out, &app)?;
        }
    }
    app.save()?;
    Ok(())
}

fn render<W: Write>(out: &mut W, app: &App) -> io::Result<()> {
    write!(out, "{}", app.engine().board())?;
    writeln!(out, "{}", app.status_line(now_unix_seconds()))?;
    out.flush()
}

fn run_simulation(cfg: &Config, games: u64, max_moves: Option<u64>, json: bool, quiet: bool) -> anyhow::Result<()> {
    let start = Instant::now();
    let base_seed = cfg.seed.unwrap_or_else(now_unix_seconds);
    info!(games, size = cfg.board_size, base_seed, "starting simulation");

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(games);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} games ({eta})")?
                .progress_chars("=>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let results: Vec<GameSummary> = (0..games)
        .into_par_iter()
        .map(|i| {
            let r = simulate::play_random_game(cfg.board_size, base_seed.wrapping_add(i), max_moves);
            pb.inc(1);
            r
        })
        .collect::<Result<Vec<_>, _>>()?;
    pb.finish_and_clear();

    let agg = simulate::summarize(&results);
    if json {
        println!("{}", serde_json::to_string_pretty(&agg)?);
    } else {
        println!(
            "games: {} | mean score: {:.1} | best score: {} | highest tile: {} | wins: {} | moves: {} | {:.2}s",
            agg.games,
            agg.mean_score,
            agg.best_score,
            agg.highest_tile,
            agg.wins,
            agg.total_moves,
            start.elapsed().as_secs_f64()
        );
    }
    Ok(())
}
