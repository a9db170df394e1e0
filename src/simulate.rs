//! Headless self-play with a uniformly random legal-move policy.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use crate::engine::{EngineError, Move, Score, Tile};
use crate::session::GridEngine;

// Decorrelates the policy stream from the tile-spawn stream.
const POLICY_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub seed: u64,
    pub score: Score,
    pub moves: u64,
    pub highest_tile: Tile,
    pub won: bool,
    pub finished: bool,
}

/// Play one game to the end (or `max_moves`) picking random legal moves.
pub fn play_random_game(size: usize, seed: u64, max_moves: Option<u64>) -> Result<GameSummary, EngineError> {
    let mut engine = GridEngine::with_seed(size, seed)?;
    let mut policy = StdRng::seed_from_u64(seed ^ POLICY_SEED_SALT);
    while !engine.is_over() {
        if max_moves.is_some_and(|limit| engine.moves() >= limit) {
            break;
        }
        let legal: Vec<Move> = Move::ALL.into_iter().filter(|&d| engine.board().can_move(d)).collect();
        let Some(&dir) = legal.choose(&mut policy) else {
            break;
        };
        engine.play(dir);
    }
    Ok(GameSummary {
        seed,
        score: engine.score(),
        moves: engine.moves(),
        highest_tile: engine.board().highest_tile(),
        won: engine.has_won(),
        finished: engine.is_over(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregate {
    pub games: usize,
    pub mean_score: f64,
    pub best_score: Score,
    pub highest_tile: Tile,
    pub wins: usize,
    pub total_moves: u64,
}

pub fn summarize(games: &[GameSummary]) -> Aggregate {
    let total: Score = games.iter().map(|g| g.score).sum();
    Aggregate {
        games: games.len(),
        mean_score: if games.is_empty() { 0.0 } else { total as f64 / games.len() as f64 },
        best_score: games.iter().map(|g| g.score).max().unwrap_or(0),
        highest_tile: games.iter().map(|g| g.highest_tile).max().unwrap_or(0),
        wins: games.iter().filter(|g| g.won).count(),
        total_moves: games.iter().map(|g| g.moves).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_game_runs_to_completion() {
        let summary = play_random_game(4, 7, None).unwrap();
        assert!(summary.finished);
        assert!(summary.moves > 0);
        assert!(summary.highest_tile >= 8);
        assert_eq!(summary, play_random_game(4, 7, None).unwrap());
    }

    #[test]
    fn move_cap_is_respected() {
        let summary = play_random_game(6, 1, Some(25)).unwrap();
        assert_eq!(summary.moves, 25);
        assert!(!summary.finished);
    }

    #[test]
    fn unsupported_size_fails() {
        assert_eq!(play_random_game(2, 1, None), Err(EngineError::UnsupportedSize(2)));
    }

    #[test]
    fn aggregate_stats() {
        let games: Vec<GameSummary> = (0..4).map(|s| play_random_game(4, s, None).unwrap()).collect();
        let agg = summarize(&games);
        assert_eq!(agg.games, 4);
        assert_eq!(agg.best_score, games.iter().map(|g| g.score).max().unwrap());
        assert_eq!(agg.total_moves, games.iter().map(|g| g.moves).sum::<u64>());
        assert!(agg.mean_score > 0.0);
        assert_eq!(summarize(&[]).mean_score, 0.0);
    }
}
