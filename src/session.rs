//! Stateful game engine: one live session, its undo history and RNG.
//!
//! The engine performs no I/O and never calls into renderers, storage or
//! achievement tracking; those read its state and the [`Turn`] values it
//! returns.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, trace};

use crate::engine::{Board, BoardSize, EngineError, Move, Score, Spawn};
use crate::history::{History, Snapshot};

/// Live state of one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    board: Board,
    score: Score,
    moves: u64,
    won: bool,
    over: bool,
    started_at_unix_s: u64,
    /// Set when the game ends; freezes the elapsed clock.
    finished_at_unix_s: Option<u64>,
}

impl GameSession {
    fn fresh(size: BoardSize) -> Self {
        Self {
            board: Board::empty(size),
            score: 0,
            moves: 0,
            won: false,
            over: false,
            started_at_unix_s: now_unix_seconds(),
            finished_at_unix_s: None,
        }
    }

    /// Rebuild a session from stored parts. `won` is latched if the board
    /// already holds a winning tile; `over` is derived from the board.
    pub fn from_parts(board: Board, score: Score, moves: u64, won: bool, started_at_unix_s: u64) -> Self {
        let won = won || board.reached_win_tile();
        let over = board.is_terminal();
        let finished_at_unix_s = over.then(now_unix_seconds);
        Self { board, score, moves, won, over, started_at_unix_s, finished_at_unix_s }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn size(&self) -> BoardSize {
        self.board.size()
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }

    pub fn won(&self) -> bool {
        self.won
    }

    pub fn over(&self) -> bool {
        self.over
    }

    pub fn started_at_unix_s(&self) -> u64 {
        self.started_at_unix_s
    }

    pub fn finished_at_unix_s(&self) -> Option<u64> {
        self.finished_at_unix_s
    }

    /// Seconds played as of `now_unix_s`; stops counting once the game is over.
    pub fn elapsed_s(&self, now_unix_s: u64) -> u64 {
        let end = self.finished_at_unix_s.map_or(now_unix_s, |t| t.min(now_unix_s));
        end.saturating_sub(self.started_at_unix_s)
    }

    fn set_over(&mut self, over: bool) {
        self.over = over;
        self.finished_at_unix_s = match (over, self.finished_at_unix_s) {
            (true, Some(t)) => Some(t),
            (true, None) => Some(now_unix_seconds()),
            (false, _) => None,
        };
    }
}

/// What a single `apply_move` did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveOutcome {
    pub changed: bool,
    pub score_delta: Score,
    pub merges: u32,
}

impl MoveOutcome {
    pub const NO_OP: MoveOutcome = MoveOutcome { changed: false, score_delta: 0, merges: 0 };
}

/// Result of one full move cycle (see [`GridEngine::play`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    pub direction: Move,
    pub outcome: MoveOutcome,
    pub spawn: Option<Spawn>,
    /// This move produced the first tile >= 2048 of the session.
    pub first_win: bool,
    pub game_over: bool,
}

/// Owns exactly one [`GameSession`] plus its undo history.
///
/// ```
/// use grid_2048::engine::Move;
/// use grid_2048::session::GridEngine;
///
/// let mut engine = GridEngine::with_seed(4, 42).unwrap();
/// assert_eq!(engine.board().count_empty(), 14);
/// let turn = engine.play(Move::Left);
/// assert_eq!(engine.moves(), u64::from(turn.outcome.changed));
/// ```
#[derive(Debug, Clone)]
pub struct GridEngine {
    session: GameSession,
    history: History,
    rng: StdRng,
}

impl GridEngine {
    /// New game seeded from OS entropy.
    pub fn new(size: usize) -> Result<Self, EngineError> {
        Self::with_rng(size, StdRng::from_entropy())
    }

    /// New game with a deterministic tile sequence.
    pub fn with_seed(size: usize, seed: u64) -> Result<Self, EngineError> {
        Self::with_rng(size, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(size: usize, rng: StdRng) -> Result<Self, EngineError> {
        let size = BoardSize::new(size)?;
        let mut engine = Self { session: GameSession::fresh(size), history: History::new(), rng };
        engine.spawn_tile();
        engine.spawn_tile();
        Ok(engine)
    }

    /// Resume an existing session with an empty history.
    pub fn from_session(session: GameSession, rng: StdRng) -> Self {
        Self { session, history: History::new(), rng }
    }

    /// Replace the current game with a fresh one of `size`, clearing history.
    ///
    /// On an unsupported size the current game is left untouched.
    pub fn initialize(&mut self, size: usize) -> Result<&GameSession, EngineError> {
        let size = BoardSize::new(size)?;
        self.session = GameSession::fresh(size);
        self.history.clear();
        self.spawn_tile();
        self.spawn_tile();
        debug!(%size, "initialized game");
        Ok(&self.session)
    }

    /// Slide and merge the board in `dir`, adding merged values to the score.
    ///
    /// Does not spawn, record history or count the move; a no-op leaves the
    /// session unchanged.
    pub fn apply_move(&mut self, dir: Move) -> MoveOutcome {
        let shifted = self.session.board.shift(dir);
        if !shifted.changed {
            return MoveOutcome::NO_OP;
        }
        self.session.board = shifted.board;
        self.session.score = self.session.score.saturating_add(shifted.score);
        if self.session.board.reached_win_tile() {
            self.session.won = true;
        }
        MoveOutcome { changed: true, score_delta: shifted.score, merges: shifted.merges }
    }

    /// Place a 2 (90%) or 4 (10%) in a random empty cell, if any.
    pub fn spawn_tile(&mut self) -> Option<Spawn> {
        let spawn = self.session.board.insert_random_tile(&mut self.rng);
        trace!(?spawn, "spawned tile");
        spawn
    }

    /// Full board with no equal neighbours.
    pub fn is_terminal(&self) -> bool {
        self.session.board.is_terminal()
    }

    /// Latched: stays true once a winning tile has been seen this session.
    pub fn has_won(&self) -> bool {
        self.session.won || self.session.board.reached_win_tile()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.session.board.clone(),
            score: self.session.score,
            moves: self.session.moves,
        }
    }

    /// Replace board, score and moves. `won` and `over` are left as they are.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<(), EngineError> {
        let expected = self.session.size().get();
        if snapshot.board.dim() != expected {
            return Err(EngineError::DimensionMismatch { expected, found: snapshot.board.dim() });
        }
        self.session.board = snapshot.board;
        self.session.score = snapshot.score;
        self.session.moves = snapshot.moves;
        Ok(())
    }

    /// One atomic move cycle: record history, move, spawn, update flags.
    ///
    /// Ignored once the game is over. A move that changes nothing records no
    /// history, does not count and spawns nothing.
    pub fn play(&mut self, dir: Move) -> Turn {
        if self.session.over {
            return Turn {
                direction: dir,
                outcome: MoveOutcome::NO_OP,
                spawn: None,
                first_win: false,
                game_over: true,
            };
        }
        let before = self.snapshot();
        let was_won = self.session.won;
        let outcome = self.apply_move(dir);
        if !outcome.changed {
            return Turn { direction: dir, outcome, spawn: None, first_win: false, game_over: false };
        }
        self.history.push(before);
        self.session.moves += 1;
        let spawn = self.spawn_tile();
        let over = self.is_terminal();
        self.session.set_over(over);
        let first_win = !was_won && self.session.won;
        debug!(
            direction = %dir,
            score = self.session.score,
            moves = self.session.moves,
            over = self.session.over,
            "move applied"
        );
        Turn { direction: dir, outcome, spawn, first_win, game_over: self.session.over }
    }

    /// Rewind one move. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.undo_steps(1)
    }

    /// Rewind up to `steps` moves; `over` is recomputed, `won` stays latched.
    pub fn undo_steps(&mut self, steps: usize) -> bool {
        let Some(snapshot) = self.history.pop_n(steps) else {
            return false;
        };
        // History only ever holds boards of the current size.
        if self.restore(snapshot).is_err() {
            self.history.clear();
            return false;
        }
        let over = self.is_terminal();
        self.session.set_over(over);
        debug!(steps, moves = self.session.moves, "undo");
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn board(&self) -> &Board {
        &self.session.board
    }

    pub fn size(&self) -> BoardSize {
        self.session.size()
    }

    pub fn score(&self) -> Score {
        self.session.score
    }

    pub fn moves(&self) -> u64 {
        self.session.moves
    }

    pub fn is_over(&self) -> bool {
        self.session.over
    }
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// `mm:ss` clock text for an elapsed duration in seconds.
pub fn format_clock(elapsed_s: u64) -> String {
    format!("{:02}:{:02}", elapsed_s / 60, elapsed_s % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Tile, WIN_TILE};
    use crate::history::HISTORY_CAPACITY;

    fn engine_with(rows: Vec<Vec<Tile>>, seed: u64) -> GridEngine {
        let board = Board::from_rows(rows).unwrap();
        let session = GameSession::from_parts(board, 0, 0, false, 0);
        GridEngine::from_session(session, StdRng::seed_from_u64(seed))
    }

    fn two_twos() -> Vec<Vec<Tile>> {
        let mut rows = vec![vec![0; 4]; 4];
        rows[0][0] = 2;
        rows[0][1] = 2;
        rows
    }

    #[test]
    fn initialize_spawns_two_tiles() {
        for size in [4, 5, 6] {
            let engine = GridEngine::with_seed(size, 1).unwrap();
            assert_eq!(engine.board().count_empty(), size * size - 2);
            assert_eq!(engine.score(), 0);
            assert_eq!(engine.moves(), 0);
            assert!(!engine.has_won());
            assert!(!engine.is_over());
            assert!(!engine.can_undo());
        }
    }

    #[test]
    fn unsupported_size_is_an_error() {
        assert_eq!(GridEngine::with_seed(3, 1).unwrap_err(), EngineError::UnsupportedSize(3));
        let mut engine = GridEngine::with_seed(4, 1).unwrap();
        let before = engine.board().clone();
        assert_eq!(engine.initialize(9).unwrap_err(), EngineError::UnsupportedSize(9));
        assert_eq!(engine.board(), &before);
    }

    #[test]
    fn left_merge_scores() {
        let mut engine = engine_with(two_twos(), 3);
        let outcome = engine.apply_move(Move::Left);
        assert!(outcome.changed);
        assert_eq!(outcome.score_delta, 4);
        assert_eq!(engine.score(), 4);
        assert_eq!(engine.board().rows()[0], vec![4, 0, 0, 0]);
    }

    #[test]
    fn no_op_move_commits_nothing() {
        let mut rows = vec![vec![0; 4]; 4];
        rows[0] = vec![2, 4, 2, 4];
        let mut engine = engine_with(rows, 3);
        let turn = engine.play(Move::Left);
        assert!(!turn.outcome.changed);
        assert_eq!(turn.spawn, None);
        assert_eq!(engine.moves(), 0);
        assert_eq!(engine.score(), 0);
        assert!(!engine.can_undo());
        assert_eq!(engine.board().count_empty(), 12);
    }

    #[test]
    fn play_records_history_and_spawns() {
        let mut engine = engine_with(two_twos(), 3);
        let turn = engine.play(Move::Right);
        assert!(turn.outcome.changed);
        assert!(turn.spawn.is_some());
        assert_eq!(engine.moves(), 1);
        assert_eq!(engine.score(), 4);
        assert_eq!(engine.board().count_empty(), 14);
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn undo_restores_previous_state() {
        let mut engine = engine_with(two_twos(), 5);
        let start = engine.snapshot();
        engine.play(Move::Left);
        assert!(engine.undo());
        assert_eq!(engine.snapshot(), start);
        assert!(!engine.undo());
    }

    #[test]
    fn undo_steps_rewinds_several_moves() {
        let mut engine = GridEngine::with_seed(4, 11).unwrap();
        let start = engine.snapshot();
        let mut played = 0;
        for dir in Move::ALL.iter().cycle().take(40) {
            if engine.play(*dir).outcome.changed {
                played += 1;
            }
            if played == 3 {
                break;
            }
        }
        assert_eq!(played, 3);
        assert!(engine.undo_steps(3));
        assert_eq!(engine.snapshot(), start);
    }

    #[test]
    fn history_is_bounded() {
        let mut engine = GridEngine::with_seed(6, 2).unwrap();
        let mut played = 0;
        for dir in Move::ALL.iter().cycle().take(200) {
            if engine.play(*dir).outcome.changed {
                played += 1;
            }
        }
        assert!(played > HISTORY_CAPACITY);
        assert_eq!(engine.history().len(), HISTORY_CAPACITY);
    }

    #[test]
    fn snapshot_is_a_deep_copy() {
        let mut engine = engine_with(two_twos(), 5);
        let snap = engine.snapshot();
        engine.apply_move(Move::Left);
        assert_eq!(snap.board.rows()[0], vec![2, 2, 0, 0]);
        assert_eq!(snap.score, 0);
    }

    #[test]
    fn restore_rejects_other_sizes() {
        let mut engine = GridEngine::with_seed(4, 1).unwrap();
        let other = GridEngine::with_seed(5, 1).unwrap().snapshot();
        assert_eq!(
            engine.restore(other),
            Err(EngineError::DimensionMismatch { expected: 4, found: 5 })
        );
    }

    #[test]
    fn win_latches() {
        let mut rows = vec![vec![0; 4]; 4];
        rows[0][0] = 1024;
        rows[0][1] = 1024;
        rows[3][3] = 2;
        let mut engine = engine_with(rows, 8);
        assert!(!engine.has_won());
        let turn = engine.play(Move::Left);
        assert!(turn.first_win);
        assert!(engine.has_won());
        assert_eq!(engine.board().get(0, 0), WIN_TILE);

        let second = engine.play(Move::Down);
        assert!(!second.first_win);
        // Undo removes the tile but not the latch.
        engine.undo_steps(2);
        assert!(engine.board().highest_tile() < WIN_TILE);
        assert!(engine.has_won());
    }

    #[test]
    fn board_with_win_tile_reports_won() {
        let mut rows = vec![vec![0; 5]; 5];
        rows[2][3] = 2048;
        let engine = engine_with(rows, 1);
        assert!(engine.has_won());
        assert!(engine.session().won());
    }

    #[test]
    fn terminal_board_ends_game_and_ignores_input() {
        let rows = vec![
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
        ];
        let mut engine = engine_with(rows, 1);
        assert!(engine.is_terminal());
        assert!(engine.is_over());
        let turn = engine.play(Move::Up);
        assert!(turn.game_over);
        assert!(!turn.outcome.changed);
    }

    #[test]
    fn undo_after_loss_reopens_game() {
        // One move away from a locked board: merging the 2s fills the last gap.
        let rows = vec![
            vec![2, 2, 8, 16],
            vec![32, 64, 128, 256],
            vec![2, 4, 8, 16],
            vec![32, 64, 128, 256],
        ];
        let mut engine = engine_with(rows, 4);
        // Whatever spawns in the last gap (0,3) has no equal neighbour.
        let turn = engine.play(Move::Left);
        assert!(turn.game_over);
        assert!(engine.is_over());
        let finished = engine.session().finished_at_unix_s().unwrap();
        // The clock stops at the losing move.
        assert_eq!(engine.session().elapsed_s(u64::MAX), engine.session().elapsed_s(finished));
        assert!(engine.undo());
        assert!(!engine.is_over());
        assert_eq!(engine.session().finished_at_unix_s(), None);
        assert_eq!(engine.session().elapsed_s(u64::MAX), u64::MAX);
    }

    #[test]
    fn initialize_clears_history_and_flags() {
        let mut engine = engine_with(two_twos(), 5);
        engine.play(Move::Left);
        engine.initialize(5).unwrap();
        assert_eq!(engine.size().get(), 5);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.moves(), 0);
        assert!(!engine.can_undo());
        assert_eq!(engine.board().count_empty(), 23);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(3600), "60:00");
    }
}
