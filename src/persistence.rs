//! Saved-game storage.
//!
//! A [`SavedGame`] carries everything needed to resume: board, score, moves,
//! the won latch, the best score and unlocked achievements. Two encodings are
//! provided:
//! - JSON (`.json` paths), for inspection and hand editing.
//! - A compact binary frame: `G2S1` magic, version byte, postcard body and a
//!   CRC32C trailer over all preceding bytes.
//!
//! Loading always validates the board against the declared size; a file that
//! is missing, corrupt or inconsistent degrades to a fresh game in
//! [`load_or_fresh`].

use std::fs;
use std::io;
use std::path::Path;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::achievements::Achievement;
use crate::engine::{Board, BoardSize, EngineError, Score, Tile};
use crate::session::{GameSession, GridEngine};

const MAGIC: &[u8; 4] = b"G2S1";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1;
const CHECKSUM_LEN: usize = 4;

#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("postcard error: {0}")]
    Postcard(#[from] postcard::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("checksum mismatch")]
    Checksum,
    #[error("file too short or malformed")]
    Malformed,
    #[error("invalid saved game: {0}")]
    Engine(#[from] EngineError),
}

/// Serializable state of one game plus cross-game progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGame {
    pub size: usize,
    pub board: Vec<Vec<Tile>>,
    pub score: Score,
    pub moves: u64,
    #[serde(default)]
    pub won: bool,
    #[serde(default)]
    pub best_score: Score,
    #[serde(default)]
    pub started_at_unix_s: u64,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

impl SavedGame {
    pub fn capture(session: &GameSession, best_score: Score, achievements: Vec<Achievement>) -> Self {
        Self {
            size: session.size().get(),
            board: session.board().rows(),
            score: session.score(),
            moves: session.moves(),
            won: session.won(),
            best_score: best_score.max(session.score()),
            started_at_unix_s: session.started_at_unix_s(),
            achievements,
        }
    }

    /// Validate size and board shape, then rebuild the live session.
    pub fn to_session(&self) -> Result<GameSession, EngineError> {
        let size = BoardSize::new(self.size)?;
        let board = Board::from_rows_sized(size, self.board.clone())?;
        Ok(GameSession::from_parts(board, self.score, self.moves, self.won, self.started_at_unix_s))
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.to_session().map(|_| ())
    }
}

pub fn to_json(save: &SavedGame) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(save)?)
}

pub fn from_json(text: &str) -> Result<SavedGame, PersistError> {
    let save: SavedGame = serde_json::from_str(text)?;
    save.validate()?;
    Ok(save)
}

/// Encode to the checksummed binary frame.
pub fn encode_save(save: &SavedGame) -> Result<Vec<u8>, PersistError> {
    let body = postcard::to_allocvec(save)?;
    let mut buf = Vec::with_capacity(HEADER_LEN + body.len() + CHECKSUM_LEN);
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&body);
    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    Ok(buf)
}

/// Decode and validate a binary frame.
pub fn decode_save(bytes: &[u8]) -> Result<SavedGame, PersistError> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(PersistError::Malformed);
    }
    // Checksum first so a damaged body never reaches the decoder.
    let (content, trailer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let file_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if file_crc != crc32c::crc32c(content) {
        return Err(PersistError::Checksum);
    }
    if &content[..4] != MAGIC || content[4] != VERSION {
        return Err(PersistError::MagicOrVersion);
    }
    let save: SavedGame = postcard::from_bytes(&content[HEADER_LEN..])?;
    save.validate()?;
    Ok(save)
}

fn is_json_path(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("json")
}

/// Write a save, JSON for `.json` paths and the binary frame otherwise.
///
/// The file is written next to its destination and renamed into place.
pub fn write_save_to_path<P: AsRef<Path>>(path: P, save: &SavedGame) -> Result<(), PersistError> {
    let path = path.as_ref();
    let bytes = if is_json_path(path) { to_json(save)?.into_bytes() } else { encode_save(save)? };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn read_save_from_path<P: AsRef<Path>>(path: P) -> Result<SavedGame, PersistError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    if is_json_path(path) {
        let text = std::str::from_utf8(&bytes).map_err(|_| PersistError::Malformed)?;
        from_json(text)
    } else {
        decode_save(&bytes)
    }
}

/// An engine ready to play plus the cross-game progress that came with it.
#[derive(Debug)]
pub struct Resumed {
    pub engine: GridEngine,
    pub best_score: Score,
    pub achievements: Vec<Achievement>,
    /// False when a fresh game had to be started.
    pub restored: bool,
}

/// Resume from `path`, or start a fresh `fallback_size` game when there is
/// nothing usable to resume.
///
/// Best score and achievements survive a finished or unreadable game as long
/// as the file itself decodes. Only an unsupported `fallback_size` fails.
pub fn load_or_fresh(path: &Path, fallback_size: usize, rng: StdRng) -> Result<Resumed, EngineError> {
    let save = match read_save_from_path(path) {
        Ok(save) => save,
        Err(PersistError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no saved game, starting fresh");
            return fresh(fallback_size, rng, 0, Vec::new());
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "discarding unreadable saved game");
            return fresh(fallback_size, rng, 0, Vec::new());
        }
    };
    let session = save.to_session()?;
    if session.over() {
        info!("saved game had ended, starting fresh");
        return fresh(session.size().get(), rng, save.best_score, save.achievements);
    }
    info!(size = %session.size(), score = session.score(), moves = session.moves(), "resumed saved game");
    Ok(Resumed {
        engine: GridEngine::from_session(session, rng),
        best_score: save.best_score,
        achievements: save.achievements,
        restored: true,
    })
}

fn fresh(size: usize, rng: StdRng, best_score: Score, achievements: Vec<Achievement>) -> Result<Resumed, EngineError> {
    Ok(Resumed { engine: GridEngine::with_rng(size, rng)?, best_score, achievements, restored: false })
}
