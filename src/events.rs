use crate::session::{GameSession, Turn};

/// Something that happened to a session, published after each command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    NewGame,
    Moved(Turn),
    Undone { steps: usize },
    Won,
    GameOver,
}

/// Read-only consumer of engine events (renderer, audio cues, achievements).
pub trait Observer {
    fn on_event(&mut self, event: &GameEvent, session: &GameSession);
}
