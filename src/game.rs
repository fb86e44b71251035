//! Move application and the turn state machine.
//!
//! [`apply_move`] validates and plays a move directly on a [`Board`]; [`Game`]
//! wraps a board with whose turn it is and whether a piece is in the middle of
//! a multi-capture, and is what the search tree snapshots at every node.
//!
//! A request `(from, to)` is legal when `to` is the destination of one of the
//! piece's legal chains (the whole chain is played), or the first landing square
//! of a legal chain with more than one capture (only that jump is played and the
//! same piece must continue).

use log::debug;
use thiserror::Error;

use crate::board::{Board, Color, Point};
use crate::movegen::{
    Destination, Move, can_capture, continuation_moves, has_legal_move, legal_moves,
    legal_moves_from,
};

/// What happened after a move was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The turn is over.
    Applied,
    /// The piece now at this square must capture again before the turn ends.
    MustContinue(Point),
}

/// Reasons a move request is rejected. The board is never modified on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move from {from:?} to {to:?}")]
    IllegalMove { from: Point, to: Point },

    #[error("no piece at {0:?}")]
    NoPiece(Point),

    #[error("piece at {at:?} is {found}, but {expected} is to move")]
    WrongColor {
        at: Point,
        expected: Color,
        found: Color,
    },

    #[error("the game is over")]
    GameOver,
}

/// The winner, if either side has no pieces or no legal move.
pub fn winner(board: &Board) -> Option<Color> {
    [Color::Red, Color::Blue]
        .into_iter()
        .find(|&color| !has_legal_move(board, color))
        .map(Color::opponent)
}

/// Pick the move a `(from, to)` request denotes among `candidates`.
///
/// The flag is set when only the first jump of a longer chain was requested.
fn resolve(candidates: &[Move], to: Point) -> Option<(Move, bool)> {
    candidates
        .iter()
        .find(|mv| mv.to() == to)
        .map(|mv| (mv.clone(), false))
        .or_else(|| {
            candidates
                .iter()
                .find(|mv| mv.captures() > 1 && mv.path.first() == Some(&to))
                .map(|mv| (mv.first_hop(), true))
        })
}

/// Play `mv` on the board without validating it, and report the winner if the
/// move decided the game.
///
/// Walks the piece through every landing square and removes the captured
/// pieces. When `partial` is set, `mv` is the first jump of a longer chain: the
/// piece is never crowned mid-chain and must continue. Otherwise a man ending
/// on the far rank is crowned, which ends the turn, as does a finished game; a
/// piece that captured and can capture again must continue.
pub(crate) fn execute(board: &mut Board, mv: &Move, partial: bool) -> (MoveOutcome, Option<Color>) {
    let mut at = mv.from;
    for &landing in &mv.path {
        board.relocate(at, landing);
        at = landing;
    }
    for &sq in &mv.captured {
        board.remove(sq);
    }

    if partial {
        return (MoveOutcome::MustContinue(at), None);
    }
    let promoted = board.promote_if_due(at);
    let decided = winner(board);
    if !promoted && decided.is_none() && mv.is_capture() && can_capture(board, at) {
        (MoveOutcome::MustContinue(at), None)
    } else {
        (MoveOutcome::Applied, decided)
    }
}

/// Validate and play a move for the piece at `from`.
///
/// Majority capture over the piece's whole side applies. On error the board is
/// left untouched.
pub fn apply_move(board: &mut Board, from: Point, to: Point) -> Result<MoveOutcome, MoveError> {
    if board.get(from).is_none() {
        return Err(MoveError::NoPiece(from));
    }
    let (mv, partial) = resolve(&legal_moves_from(board, from), to)
        .ok_or(MoveError::IllegalMove { from, to })?;
    Ok(execute(board, &mv, partial).0)
}

/// Whose turn it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnState {
    /// Start of a normal turn.
    AwaitingMove(Color),
    /// The piece at `at` is mid-capture and must move again.
    ContinuationRequired { color: Color, at: Point },
    /// The game is over; holds the winner.
    Terminal(Color),
}

/// A board together with its turn state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    state: TurnState,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// The starting position with Blue to move.
    pub fn new() -> Self {
        Self::from_board(Board::new(), Color::Blue)
    }

    /// Start from an arbitrary position with `to_move` on turn.
    pub fn from_board(board: Board, to_move: Color) -> Self {
        let state = match winner(&board) {
            Some(w) => TurnState::Terminal(w),
            None => TurnState::AwaitingMove(to_move),
        };
        Self { board, state }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// The color to move, or `None` once the game is over.
    pub fn to_move(&self) -> Option<Color> {
        match self.state {
            TurnState::AwaitingMove(color) | TurnState::ContinuationRequired { color, .. } => {
                Some(color)
            }
            TurnState::Terminal(_) => None,
        }
    }

    /// The piece that must keep capturing, if any.
    pub fn forced(&self) -> Option<Point> {
        match self.state {
            TurnState::ContinuationRequired { at, .. } => Some(at),
            _ => None,
        }
    }

    pub fn winner(&self) -> Option<Color> {
        match self.state {
            TurnState::Terminal(w) => Some(w),
            _ => None,
        }
    }

    /// Every legal move in the current state.
    pub fn legal_moves(&self) -> Vec<Move> {
        match self.state {
            TurnState::AwaitingMove(color) => legal_moves(&self.board, color),
            TurnState::ContinuationRequired { at, .. } => continuation_moves(&self.board, at),
            TurnState::Terminal(_) => Vec::new(),
        }
    }

    /// Legal destinations of the piece at `from` in the current state.
    pub fn legal_destinations(&self, from: Point) -> Vec<Destination> {
        self.legal_moves()
            .iter()
            .filter(|mv| mv.from == from)
            .map(Destination::from)
            .collect()
    }

    fn check_mover(&self, from: Point) -> Result<Color, MoveError> {
        let color = self.to_move().ok_or(MoveError::GameOver)?;
        let piece = self.board.get(from).ok_or(MoveError::NoPiece(from))?;
        if piece.color != color {
            return Err(MoveError::WrongColor {
                at: from,
                expected: color,
                found: piece.color,
            });
        }
        Ok(color)
    }

    /// Validate and play the piece at `from` to `to`.
    pub fn play(&mut self, from: Point, to: Point) -> Result<MoveOutcome, MoveError> {
        let color = self.check_mover(from)?;
        let candidates: Vec<Move> = self
            .legal_moves()
            .into_iter()
            .filter(|mv| mv.from == from)
            .collect();
        let (mv, partial) = resolve(&candidates, to).ok_or(MoveError::IllegalMove { from, to })?;
        Ok(self.commit(color, &mv, partial))
    }

    /// Play a move previously produced by [`Game::legal_moves`] for this state.
    ///
    /// Only the mover is checked: the piece must still stand on `mv.from` and
    /// belong to the side on turn.
    pub fn apply(&mut self, mv: &Move) -> Result<MoveOutcome, MoveError> {
        let color = self.check_mover(mv.from)?;
        Ok(self.commit(color, mv, false))
    }

    fn commit(&mut self, color: Color, mv: &Move, partial: bool) -> MoveOutcome {
        let (outcome, winner) = execute(&mut self.board, mv, partial);
        debug!("{color} played {mv} ({outcome:?})");
        self.state = match (winner, outcome) {
            (Some(w), _) => TurnState::Terminal(w),
            (None, MoveOutcome::MustContinue(at)) => TurnState::ContinuationRequired { color, at },
            (None, MoveOutcome::Applied) => TurnState::AwaitingMove(color.opponent()),
        };
        outcome
    }
}
