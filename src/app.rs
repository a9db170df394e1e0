//! Application shell: owns one engine per active game and turns user
//! commands into atomic engine cycles, observer notifications and saves.

use std::path::{Path, PathBuf};

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, warn};

use crate::achievements::{Achievement, AchievementTracker};
use crate::config::Config;
use crate::engine::{EngineError, Score};
use crate::events::{GameEvent, Observer};
use crate::input::{swipe_direction, Command, DEFAULT_MIN_SWIPE_DISTANCE};
use crate::persistence::{self, PersistError, SavedGame};
use crate::session::{format_clock, GridEngine, Turn};

/// What the front-end should show after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Moved(Turn),
    NoOp,
    Won,
    GameOver,
    Undone,
    NothingToUndo,
    NewGame { size: usize },
    Unlocked(Achievement),
    Rejected(String),
    Share(String),
    Help,
    Quit,
}

pub fn share_message(score: Score) -> String {
    format!("I scored {score} points in 2048! Can you beat my score?")
}

pub struct App {
    engine: GridEngine,
    best_score: Score,
    achievements: AchievementTracker,
    observers: Vec<Box<dyn Observer>>,
    save_path: Option<PathBuf>,
    min_swipe_distance: f32,
}

impl App {
    pub fn new(engine: GridEngine) -> Self {
        Self::with_progress(engine, 0, Vec::new())
    }

    /// Start from an engine plus progress carried over from earlier games.
    pub fn with_progress(engine: GridEngine, best_score: Score, unlocked: Vec<Achievement>) -> Self {
        let best_score = best_score.max(engine.score());
        Self {
            engine,
            best_score,
            achievements: AchievementTracker::from_unlocked(unlocked),
            observers: Vec::new(),
            save_path: None,
            min_swipe_distance: DEFAULT_MIN_SWIPE_DISTANCE,
        }
    }

    /// Build from configuration, resuming from `save_path` when one is set.
    pub fn from_config(cfg: &Config) -> Result<Self, EngineError> {
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        match &cfg.save_path {
            Some(path) => {
                let resumed = persistence::load_or_fresh(path, cfg.board_size, rng)?;
                Ok(Self::with_progress(resumed.engine, resumed.best_score, resumed.achievements)
                    .with_save_path(path))
            }
            None => Ok(Self::new(GridEngine::with_rng(cfg.board_size, rng)?)),
        }
    }

    pub fn with_save_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.save_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn engine(&self) -> &GridEngine {
        &self.engine
    }

    pub fn best_score(&self) -> Score {
        self.best_score
    }

    pub fn achievements(&self) -> &AchievementTracker {
        &self.achievements
    }

    /// Run one command to completion.
    pub fn handle(&mut self, cmd: Command) -> Vec<AppEvent> {
        debug!(?cmd, "command");
        let mut events = match cmd {
            Command::Swipe { dx, dy } => {
                return match swipe_direction(dx as f32, dy as f32, self.min_swipe_distance) {
                    Some(dir) => self.handle(Command::Move(dir)),
                    None => vec![AppEvent::NoOp],
                };
            }
            Command::Move(dir) => {
                let turn = self.engine.play(dir);
                if !turn.outcome.changed {
                    let event = if turn.game_over { AppEvent::GameOver } else { AppEvent::NoOp };
                    return vec![event];
                }
                self.best_score = self.best_score.max(self.engine.score());
                let mut events = vec![AppEvent::Moved(turn)];
                self.publish(&GameEvent::Moved(turn));
                if turn.first_win {
                    self.publish(&GameEvent::Won);
                    events.push(AppEvent::Won);
                }
                if turn.game_over {
                    self.publish(&GameEvent::GameOver);
                    events.push(AppEvent::GameOver);
                }
                events
            }
            Command::Undo => {
                if !self.engine.undo() {
                    return vec![AppEvent::NothingToUndo];
                }
                self.publish(&GameEvent::Undone { steps: 1 });
                vec![AppEvent::Undone]
            }
            Command::NewGame => {
                let size = self.engine.size().get();
                self.new_game(size)
            }
            Command::Resize(size) => self.new_game(size),
            Command::Share => return vec![AppEvent::Share(share_message(self.engine.score()))],
            Command::Help => return vec![AppEvent::Help],
            Command::Quit => {
                self.save_or_warn();
                return vec![AppEvent::Quit];
            }
        };
        events.extend(self.achievements.take_new().into_iter().map(AppEvent::Unlocked));
        self.save_or_warn();
        events
    }

    fn new_game(&mut self, size: usize) -> Vec<AppEvent> {
        match self.engine.initialize(size) {
            Ok(_) => {
                self.publish(&GameEvent::NewGame);
                vec![AppEvent::NewGame { size }]
            }
            Err(e) => vec![AppEvent::Rejected(e.to_string())],
        }
    }

    fn publish(&mut self, event: &GameEvent) {
        let session = self.engine.session();
        self.achievements.on_event(event, session);
        for observer in &mut self.observers {
            observer.on_event(event, session);
        }
    }

    /// Persist the current game to the configured path, if any.
    pub fn save(&self) -> Result<(), PersistError> {
        let Some(path) = &self.save_path else {
            return Ok(());
        };
        let save = SavedGame::capture(self.engine.session(), self.best_score, self.achievements.unlocked());
        persistence::write_save_to_path(path, &save)
    }

    fn save_or_warn(&self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "failed to save game");
        }
    }

    /// One-line summary: score, best, moves and elapsed clock.
    pub fn status_line(&self, now_unix_s: u64) -> String {
        let session = self.engine.session();
        format!(
            "score: {} | best: {} | moves: {} | time: {}",
            session.score(),
            self.best_score,
            session.moves(),
            format_clock(session.elapsed_s(now_unix_s))
        )
    }
}
