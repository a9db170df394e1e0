//! Keyboard token and swipe-gesture classification.

use crate::engine::Move;

/// Minimum swipe travel, in pixels, along the dominant axis.
pub const DEFAULT_MIN_SWIPE_DISTANCE: f32 = 30.0;

/// A user intent for the application shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Move),
    /// Touch displacement in pixels, classified by [`swipe_direction`].
    Swipe { dx: i32, dy: i32 },
    Undo,
    NewGame,
    Resize(usize),
    Share,
    Help,
    Quit,
}

/// Map a key name or typed token to a command.
///
/// Accepts arrow key names, `w a s d` in either case, and the word forms
/// `up`/`down`/`left`/`right`, `undo`, `new`, `size N`, `swipe DX DY`, `share`,
/// `help`, `quit`.
pub fn parse_command(token: &str) -> Option<Command> {
    let token = token.trim();
    let mut parts = token.split_whitespace();
    let head = parts.next()?;
    match head {
        "ArrowUp" | "w" | "W" => return Some(Command::Move(Move::Up)),
        "ArrowDown" | "s" | "S" => return Some(Command::Move(Move::Down)),
        "ArrowLeft" | "a" | "A" => return Some(Command::Move(Move::Left)),
        "ArrowRight" | "d" | "D" => return Some(Command::Move(Move::Right)),
        _ => {}
    }
    if let Ok(dir) = head.parse::<Move>() {
        return Some(Command::Move(dir));
    }
    match head.to_ascii_lowercase().as_str() {
        "u" | "undo" => Some(Command::Undo),
        "n" | "new" => Some(Command::NewGame),
        "size" => parts.next()?.parse().ok().map(Command::Resize),
        "swipe" => {
            let dx = parts.next()?.parse().ok()?;
            let dy = parts.next()?.parse().ok()?;
            Some(Command::Swipe { dx, dy })
        }
        "share" => Some(Command::Share),
        "h" | "help" | "?" => Some(Command::Help),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

/// Classify a touch swipe by its displacement (screen coordinates, y down).
///
/// The axis with the larger travel wins; travel at or below `min_distance`
/// on that axis is not a swipe.
pub fn swipe_direction(dx: f32, dy: f32, min_distance: f32) -> Option<Move> {
    if dx.abs() > dy.abs() {
        if dx.abs() <= min_distance {
            return None;
        }
        Some(if dx > 0.0 { Move::Right } else { Move::Left })
    } else {
        if dy.abs() <= min_distance {
            return None;
        }
        Some(if dy > 0.0 { Move::Down } else { Move::Up })
    }
}

pub const HELP: &str = "\
moves: w/a/s/d, arrows or up/down/left/right
u | undo      undo the last move
n | new       start a new game
size N        start a new N x N game (4, 5 or 6)
swipe DX DY   replay a touch swipe of DX, DY pixels
share         print a shareable score line
q | quit      save and exit";
