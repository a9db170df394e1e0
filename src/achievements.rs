//! Achievement tracking as a passive observer of game events.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::{Score, Tile};
use crate::events::{GameEvent, Observer};
use crate::session::GameSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    Tile128,
    Tile256,
    Tile512,
    Tile1024,
    Tile2048,
    Tile4096,
    Score1k,
    Score10k,
    Score50k,
    Centurion,
    Comeback,
}

const TILE_MILESTONES: [(Tile, Achievement); 6] = [
    (128, Achievement::Tile128),
    (256, Achievement::Tile256),
    (512, Achievement::Tile512),
    (1024, Achievement::Tile1024),
    (2048, Achievement::Tile2048),
    (4096, Achievement::Tile4096),
];

const SCORE_MILESTONES: [(Score, Achievement); 3] = [
    (1_000, Achievement::Score1k),
    (10_000, Achievement::Score10k),
    (50_000, Achievement::Score50k),
];

const CENTURION_MOVES: u64 = 100;

impl Achievement {
    pub const ALL: [Achievement; 11] = [
        Achievement::Tile128,
        Achievement::Tile256,
        Achievement::Tile512,
        Achievement::Tile1024,
        Achievement::Tile2048,
        Achievement::Tile4096,
        Achievement::Score1k,
        Achievement::Score10k,
        Achievement::Score50k,
        Achievement::Centurion,
        Achievement::Comeback,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Achievement::Tile128 => "Getting started",
            Achievement::Tile256 => "Quarter way",
            Achievement::Tile512 => "Halfway there",
            Achievement::Tile1024 => "So close",
            Achievement::Tile2048 => "2048!",
            Achievement::Tile4096 => "Beyond",
            Achievement::Score1k => "Scorer",
            Achievement::Score10k => "High scorer",
            Achievement::Score50k => "Legend",
            Achievement::Centurion => "Centurion",
            Achievement::Comeback => "Second thoughts",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Achievement::Tile128 => "Reach the 128 tile",
            Achievement::Tile256 => "Reach the 256 tile",
            Achievement::Tile512 => "Reach the 512 tile",
            Achievement::Tile1024 => "Reach the 1024 tile",
            Achievement::Tile2048 => "Reach the 2048 tile",
            Achievement::Tile4096 => "Reach the 4096 tile",
            Achievement::Score1k => "Score 1,000 points in one game",
            Achievement::Score10k => "Score 10,000 points in one game",
            Achievement::Score50k => "Score 50,000 points in one game",
            Achievement::Centurion => "Make 100 moves in one game",
            Achievement::Comeback => "Undo a move",
        }
    }
}

/// Unlocks each achievement at most once across games.
#[derive(Debug, Clone, Default)]
pub struct AchievementTracker {
    unlocked: BTreeSet<Achievement>,
    fresh: Vec<Achievement>,
}

impl AchievementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume with previously unlocked achievements.
    pub fn from_unlocked<I: IntoIterator<Item = Achievement>>(unlocked: I) -> Self {
        Self { unlocked: unlocked.into_iter().collect(), fresh: Vec::new() }
    }

    pub fn is_unlocked(&self, a: Achievement) -> bool {
        self.unlocked.contains(&a)
    }

    /// Unlocked achievements in declaration order.
    pub fn unlocked(&self) -> Vec<Achievement> {
        self.unlocked.iter().copied().collect()
    }

    /// Drain achievements unlocked since the last call.
    pub fn take_new(&mut self) -> Vec<Achievement> {
        std::mem::take(&mut self.fresh)
    }

    fn unlock(&mut self, a: Achievement) {
        if self.unlocked.insert(a) {
            info!(achievement = a.title(), "achievement unlocked");
            self.fresh.push(a);
        }
    }

    fn check_session(&mut self, session: &GameSession) {
        let highest = session.board().highest_tile();
        for (tile, a) in TILE_MILESTONES {
            if highest >= tile {
                self.unlock(a);
            }
        }
        for (score, a) in SCORE_MILESTONES {
            if session.score() >= score {
                self.unlock(a);
            }
        }
        if session.moves() >= CENTURION_MOVES {
            self.unlock(Achievement::Centurion);
        }
    }
}

impl Observer for AchievementTracker {
    fn on_event(&mut self, event: &GameEvent, session: &GameSession) {
        match event {
            GameEvent::Moved(turn) if turn.outcome.changed => self.check_session(session),
            GameEvent::Undone { .. } => self.unlock(Achievement::Comeback),
            _ => {}
        }
    }
}
