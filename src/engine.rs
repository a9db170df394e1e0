use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All four directions, in `[Up, Down, Left, Right]` order.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// True for moves that slide tiles along rows.
    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Move::Left | Move::Right)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(s)
    }
}

impl FromStr for Move {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Move::Up),
            "down" => Ok(Move::Down),
            "left" => Ok(Move::Left),
            "right" => Ok(Move::Right),
            _ => Err(EngineError::UnknownMove(s.to_string())),
        }
    }
}

/// Cell value: 0 for empty, otherwise a power of two >= 2.
pub type Tile = u64;
pub type Score = u64;

/// The tile value that sets the won latch.
pub const WIN_TILE: Tile = 2048;

/// Board dimensions a game may be played on.
pub const SUPPORTED_SIZES: [usize; 3] = [4, 5, 6];

/// Largest tile a cell may hold. Well above anything reachable on a 6x6
/// board; tiles of this value no longer merge.
pub const MAX_TILE: Tile = 1 << 40;

/// Caller contract violations. The engine has no other failure path.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unsupported board size {0} (supported: 4, 5, 6)")]
    UnsupportedSize(usize),
    #[error("board dimensions do not match size {expected}: found a line of {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("invalid tile value {0}: expected 0 or a power of two in 2..=2^40")]
    InvalidTile(Tile),
    #[error("unknown move direction {0:?}")]
    UnknownMove(String),
}

/// A validated, supported board dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct BoardSize(usize);

impl BoardSize {
    pub const DEFAULT: BoardSize = BoardSize(4);

    pub fn new(n: usize) -> Result<Self, EngineError> {
        if SUPPORTED_SIZES.contains(&n) {
            Ok(BoardSize(n))
        } else {
            Err(EngineError::UnsupportedSize(n))
        }
    }

    /// Side length.
    #[inline]
    pub fn get(self) -> usize {
        self.0
    }

    /// Total number of cells.
    #[inline]
    pub fn cells(self) -> usize {
        self.0 * self.0
    }
}

impl Default for BoardSize {
    fn default() -> Self {
        BoardSize::DEFAULT
    }
}

impl TryFrom<usize> for BoardSize {
    type Error = EngineError;
    fn try_from(n: usize) -> Result<Self, Self::Error> {
        BoardSize::new(n)
    }
}

impl From<BoardSize> for usize {
    fn from(s: BoardSize) -> Self {
        s.0
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{0}x{0}", self.0)
    }
}

/// True if `value` may legally occupy a cell.
#[inline]
pub fn is_valid_tile(value: Tile) -> bool {
    value == 0 || (value >= 2 && value <= MAX_TILE && value.is_power_of_two())
}

#[inline]
fn mergeable(a: Tile, b: Tile) -> bool {
    a == b && a != 0 && a < MAX_TILE
}

/// Result of sliding a single line toward index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineShift {
    pub line: Vec<Tile>,
    pub score: Score,
    pub merges: u32,
}

/// Slide and merge one line toward its first element.
///
/// Non-empty tiles are compacted in order, then scanned once from the
/// leading edge: the first equal pair found collapses into a tile of double
/// value, and the merged tile is not eligible again during this pass. The
/// line is padded with empties on the trailing side.
///
/// ```
/// use grid_2048::engine::slide_line;
/// let s = slide_line(&[2, 2, 2, 2]);
/// assert_eq!(s.line, vec![4, 4, 0, 0]);
/// assert_eq!(s.score, 8);
/// ```
pub fn slide_line(line: &[Tile]) -> LineShift {
    let mut out = Vec::with_capacity(line.len());
    let mut score: Score = 0;
    let mut merges = 0;
    let mut tiles = line.iter().copied().filter(|&t| t != 0).peekable();
    while let Some(tile) = tiles.next() {
        if tiles.peek().is_some_and(|&next| mergeable(tile, next)) {
            tiles.next();
            let merged = tile * 2;
            score = score.saturating_add(merged);
            merges += 1;
            out.push(merged);
        } else {
            out.push(tile);
        }
    }
    out.resize(line.len(), 0);
    LineShift { line: out, score, merges }
}

/// Where a random tile landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spawn {
    pub row: usize,
    pub col: usize,
    pub value: Tile,
}

/// Result of shifting a whole board in one direction (no random insert).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shifted {
    pub board: Board,
    pub score: Score,
    pub merges: u32,
    pub changed: bool,
}

/// Square N×N board stored row-major.
///
/// `Clone` is a deep copy; history snapshots never alias a live board.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: BoardSize,
    cells: Vec<Tile>,
}

impl Board {
    /// An all-empty board of the given size.
    pub fn empty(size: BoardSize) -> Self {
        Board { size, cells: vec![0; size.cells()] }
    }

    /// Build a board from rows, validating size, shape and tile values.
    ///
    /// ```
    /// use grid_2048::engine::Board;
    /// let b = Board::from_rows(vec![vec![2, 2, 0, 0]; 4]).unwrap();
    /// assert_eq!(b.count_empty(), 8);
    /// ```
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Self, EngineError> {
        let size = BoardSize::new(rows.len())?;
        Self::from_rows_sized(size, rows)
    }

    /// Like [`Board::from_rows`] but against a declared size.
    pub fn from_rows_sized(size: BoardSize, rows: Vec<Vec<Tile>>) -> Result<Self, EngineError> {
        let n = size.get();
        if rows.len() != n {
            return Err(EngineError::DimensionMismatch { expected: n, found: rows.len() });
        }
        let mut cells = Vec::with_capacity(size.cells());
        for row in rows {
            if row.len() != n {
                return Err(EngineError::DimensionMismatch { expected: n, found: row.len() });
            }
            if let Some(&bad) = row.iter().find(|&&v| !is_valid_tile(v)) {
                return Err(EngineError::InvalidTile(bad));
            }
            cells.extend(row);
        }
        Ok(Board { size, cells })
    }

    /// Copy the board out as rows.
    pub fn rows(&self) -> Vec<Vec<Tile>> {
        self.cells.chunks(self.dim()).map(|r| r.to_vec()).collect()
    }

    #[inline]
    pub fn size(&self) -> BoardSize {
        self.size
    }

    /// Side length.
    #[inline]
    pub fn dim(&self) -> usize {
        self.size.get()
    }

    /// Row-major cell values.
    #[inline]
    pub fn cells(&self) -> &[Tile] {
        &self.cells
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Tile {
        self.cells[row * self.dim() + col]
    }

    /// Slide/merge all lines in `dir`. Pure: `self` is untouched.
    pub fn shift(&self, dir: Move) -> Shifted {
        let n = self.dim();
        let mut cells = vec![0; self.size.cells()];
        let mut score: Score = 0;
        let mut merges = 0;
        for idx in 0..n {
            let positions: Vec<usize> = line_positions(n, dir, idx).collect();
            let line: Vec<Tile> = positions.iter().map(|&p| self.cells[p]).collect();
            let shifted = slide_line(&line);
            for (&p, &v) in positions.iter().zip(&shifted.line) {
                cells[p] = v;
            }
            score = score.saturating_add(shifted.score);
            merges += shifted.merges;
        }
        let board = Board { size: self.size, cells };
        let changed = board != *self;
        Shifted { board, score, merges, changed }
    }

    /// True if shifting in `dir` would change the board.
    pub fn can_move(&self, dir: Move) -> bool {
        self.shift(dir).changed
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a uniformly chosen empty cell.
    ///
    /// Returns `None` (and leaves the board untouched) when the board is full.
    pub fn insert_random_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Spawn> {
        let empty = self.empty_cells();
        if empty.is_empty() {
            return None;
        }
        let idx = empty[rng.gen_range(0..empty.len())];
        let value = generate_random_tile(rng);
        self.cells[idx] = value;
        let n = self.dim();
        Some(Spawn { row: idx / n, col: idx % n, value })
    }

    /// Builder-style variant of [`Board::insert_random_tile`].
    ///
    /// ```
    /// use grid_2048::engine::{Board, BoardSize};
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::empty(BoardSize::DEFAULT).with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        self.insert_random_tile(rng);
        self
    }

    /// Indices (row-major) of empty cells.
    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 0)
            .map(|(i, _)| i)
            .collect()
    }

    #[inline]
    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|&&v| v == 0).count()
    }

    /// True if two horizontally or vertically adjacent cells hold the same tile.
    pub fn has_adjacent_pair(&self) -> bool {
        let n = self.dim();
        for row in 0..n {
            for col in 0..n {
                let v = self.get(row, col);
                if col + 1 < n && mergeable(v, self.get(row, col + 1)) {
                    return true;
                }
                if row + 1 < n && mergeable(v, self.get(row + 1, col)) {
                    return true;
                }
            }
        }
        false
    }

    /// No empty cell and no mergeable neighbours: no move can change the board.
    pub fn is_terminal(&self) -> bool {
        self.count_empty() == 0 && !self.has_adjacent_pair()
    }

    /// Highest tile value on the board (0 for an empty board).
    pub fn highest_tile(&self) -> Tile {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Sum of all tile values.
    pub fn tile_sum(&self) -> u64 {
        self.cells.iter().sum()
    }

    /// True if any cell is at least [`WIN_TILE`].
    #[inline]
    pub fn reached_win_tile(&self) -> bool {
        self.highest_tile() >= WIN_TILE
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({}, {:?})", self.size, self.rows())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.dim();
        let separator = "-".repeat(n * 8 - 1);
        writeln!(f)?;
        for (i, row) in self.cells.chunks(n).enumerate() {
            if i > 0 {
                writeln!(f, "{separator}")?;
            }
            let line: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}

/// Cell indices of line `idx`, starting at the edge tiles slide toward.
fn line_positions(n: usize, dir: Move, idx: usize) -> impl Iterator<Item = usize> {
    (0..n).map(move |k| match dir {
        Move::Left => idx * n + k,
        Move::Right => idx * n + (n - 1 - k),
        Move::Up => k * n + idx,
        Move::Down => (n - 1 - k) * n + idx,
    })
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Tile {
    if rng.gen_range(0..10) < 9 { 2 } else { 4 }
}

fn format_val(val: Tile) -> String {
    match val {
        0 => " ".repeat(7),
        x => format!("{:^7}", x),
    }
}
