//! grid-2048: a 2048 grid engine with undo, persistence and achievements
//!
//! This crate provides:
//! - A square `Board` (4x4, 5x5 or 6x6) with pure slide/merge operations (`engine` module)
//! - `GridEngine`, which owns one live game plus a bounded undo history (`session` module)
//! - Saved-game storage in JSON or a checksummed binary frame (`persistence` module)
//! - Achievements, input classification and a thin `App` shell for front-ends
//!
//! Quick start:
//! ```
//! use grid_2048::engine::Move;
//! use grid_2048::session::GridEngine;
//!
//! // Deterministic game with a seeded RNG
//! let mut engine = GridEngine::with_seed(4, 42).unwrap();
//! let turn = engine.play(Move::Left);
//! if turn.outcome.changed {
//!     assert_eq!(engine.moves(), 1);
//!     assert!(engine.can_undo());
//! }
//! println!("{}", engine.board());
//! ```
//!
//! Full loop (simplest possible)
//! ```
//! use grid_2048::engine::Move;
//! use grid_2048::session::GridEngine;
//!
//! let mut engine = GridEngine::with_seed(4, 123).unwrap();
//! let mut turns = 0;
//! while !engine.is_over() && turns < 64 {
//!     let dir = Move::ALL[turns % 4];
//!     engine.play(dir);
//!     turns += 1;
//! }
//! let _final_score = engine.score();
//! assert!(engine.board().highest_tile() >= 2);
//! ```
//!
pub mod achievements;
pub mod app;
pub mod config;
pub mod engine;
pub mod events;
pub mod history;
pub mod input;
pub mod persistence;
pub mod session;
pub mod simulate;
