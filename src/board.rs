//! The 10x10 draughts board and the pieces on it.
//!
//! The board is a grid of optional pieces indexed by `(row, col)`. Only the dark
//! squares, where `(row + col)` is odd, can ever hold a piece. Red starts on rows
//! 0-3 and advances toward row 9; Blue starts on rows 6-9 and advances toward row 0.
//!
//! Pieces are plain values. Code that mutates the board must look pieces up again
//! by position afterwards instead of holding on to an old copy.

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::str::FromStr;

use thiserror::Error;

use crate::constants::{COLS, ROWS, START_ROWS};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Blue,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::Red => Color::Blue,
            Color::Blue => Color::Red,
        }
    }

    /// Row delta of a forward step for men of this color.
    pub fn forward(self) -> isize {
        match self {
            Color::Red => 1,
            Color::Blue => -1,
        }
    }

    /// The row on which men of this color are promoted.
    pub fn promotion_row(self) -> usize {
        match self {
            Color::Red => ROWS - 1,
            Color::Blue => 0,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Blue => write!(f, "blue"),
        }
    }
}

/// A board coordinate as `(row, col)`.
pub type Point = (usize, usize);

/// Whether a coordinate is on the board and on a dark square.
#[inline]
pub fn is_playable((row, col): Point) -> bool {
    row < ROWS && col < COLS && (row + col) % 2 == 1
}

/// Move one square from `p` in direction `(dr, dc)`, staying on the board.
#[inline]
pub fn step((row, col): Point, (dr, dc): (isize, isize)) -> Option<Point> {
    let r = row.checked_add_signed(dr)?;
    let c = col.checked_add_signed(dc)?;
    (r < ROWS && c < COLS).then_some((r, c))
}

/// A single piece.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    /// Identity assigned when the piece is created; never reused.
    pub id: u8,
    pub color: Color,
    pub king: bool,
    pub row: usize,
    pub col: usize,
}

impl Piece {
    #[inline]
    pub fn pos(&self) -> Point {
        (self.row, self.col)
    }

    /// One-character rendering: `r`/`b` for men, `R`/`B` for kings.
    pub fn symbol(&self) -> char {
        match (self.color, self.king) {
            (Color::Red, false) => 'r',
            (Color::Red, true) => 'R',
            (Color::Blue, false) => 'b',
            (Color::Blue, true) => 'B',
        }
    }
}

/// Men and kings held by one side.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Material {
    pub men: u32,
    pub kings: u32,
}

impl Material {
    pub fn total(&self) -> u32 {
        self.men + self.kings
    }
}

/// Errors from building a board by hand or from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("({0}, {1}) is not a playable square")]
    NotPlayable(usize, usize),

    #[error("({0}, {1}) is already occupied")]
    Occupied(usize, usize),

    #[error("expected 10 rows, found {0}")]
    RowCount(usize),

    #[error("row {row} has {len} squares, expected 10")]
    RowLength { row: usize, len: usize },

    #[error("unknown board symbol '{0}'")]
    UnknownSymbol(char),

    #[error("no piece ids left on this board")]
    TooManyPieces,
}

/// The board grid.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Option<Piece>; COLS]; ROWS],
    /// Id handed to the next piece created on this board.
    next_id: u8,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// The standard starting position: 20 men per side.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for row in 0..ROWS {
            let color = if row < START_ROWS {
                Color::Red
            } else if row >= ROWS - START_ROWS {
                Color::Blue
            } else {
                continue;
            };
            for col in (0..COLS).filter(|&c| is_playable((row, c))) {
                board.cells[row][col] = Some(Piece {
                    id: board.next_id,
                    color,
                    king: false,
                    row,
                    col,
                });
                board.next_id += 1;
            }
        }
        board
    }

    /// A board without any pieces.
    pub fn empty() -> Self {
        Self {
            cells: [[None; COLS]; ROWS],
            next_id: 0,
        }
    }

    /// Put a new piece on an empty dark square.
    pub fn place(&mut self, row: usize, col: usize, color: Color, king: bool) -> Result<Piece, BoardError> {
        if !is_playable((row, col)) {
            return Err(BoardError::NotPlayable(row, col));
        }
        if self.cells[row][col].is_some() {
            return Err(BoardError::Occupied(row, col));
        }
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(BoardError::TooManyPieces)?;
        let piece = Piece {
            id,
            color,
            king,
            row,
            col,
        };
        self.cells[row][col] = Some(piece);
        Ok(piece)
    }

    /// Parse a board from ten lines of ten symbols.
    ///
    /// `r`/`b` are men, `R`/`B` are kings, `.` is an empty square. Whitespace
    /// inside a line is ignored and blank lines are skipped.
    pub fn from_ascii(text: &str) -> Result<Self, BoardError> {
        let rows: Vec<Vec<char>> = text
            .lines()
            .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect::<Vec<_>>())
            .filter(|row| !row.is_empty())
            .collect();
        if rows.len() != ROWS {
            return Err(BoardError::RowCount(rows.len()));
        }

        let mut board = Self::empty();
        for (row, symbols) in rows.iter().enumerate() {
            if symbols.len() != COLS {
                return Err(BoardError::RowLength {
                    row,
                    len: symbols.len(),
                });
            }
            for (col, &ch) in symbols.iter().enumerate() {
                let (color, king) = match ch {
                    '.' => continue,
                    'r' => (Color::Red, false),
                    'R' => (Color::Red, true),
                    'b' => (Color::Blue, false),
                    'B' => (Color::Blue, true),
                    other => return Err(BoardError::UnknownSymbol(other)),
                };
                board.place(row, col, color, king)?;
            }
        }
        Ok(board)
    }

    /// The piece at `(row, col)`, or `None` for empty or off-board squares.
    #[inline]
    pub fn get_piece(&self, row: usize, col: usize) -> Option<Piece> {
        if row >= ROWS || col >= COLS {
            return None;
        }
        self.cells[row][col]
    }

    #[inline]
    pub fn get(&self, (row, col): Point) -> Option<Piece> {
        self.get_piece(row, col)
    }

    /// Read-only view of the grid, enough to render the position.
    pub fn cells(&self) -> &[[Option<Piece>; COLS]; ROWS] {
        &self.cells
    }

    /// All pieces of one color in row-major order.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = Piece> + '_ {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .copied()
            .filter(move |p| p.color == color)
    }

    pub fn material(&self, color: Color) -> Material {
        self.pieces(color).fold(Material::default(), |mut m, p| {
            if p.king {
                m.kings += 1;
            } else {
                m.men += 1;
            }
            m
        })
    }

    /// Hash of the occupied squares (color and king flag only, not identity).
    pub fn position_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for cell in self.cells.iter().flatten() {
            cell.map(|p| (p.color, p.king)).hash(&mut hasher);
        }
        hasher.finish()
    }

    pub(crate) fn remove(&mut self, (row, col): Point) -> Option<Piece> {
        self.cells[row][col].take()
    }

    /// Move the piece at `from` to the empty square `to`, keeping its stored
    /// coordinates in sync.
    pub(crate) fn relocate(&mut self, from: Point, to: Point) {
        if let Some(mut piece) = self.remove(from) {
            piece.row = to.0;
            piece.col = to.1;
            self.cells[to.0][to.1] = Some(piece);
        }
    }

    /// Crown the man at `p` if it stands on its promotion row.
    /// Returns whether a promotion happened.
    pub(crate) fn promote_if_due(&mut self, (row, col): Point) -> bool {
        match &mut self.cells[row][col] {
            Some(piece) if !piece.king && row == piece.color.promotion_row() => {
                piece.king = true;
                true
            }
            _ => false,
        }
    }
}

impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_ascii(s)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for cell in row {
                let ch = cell.map_or('.', |p| p.symbol());
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
