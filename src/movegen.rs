//! Legal move generation under Polish draughts rules.
//!
//! - Men step one square diagonally forward and capture over an adjacent enemy
//!   in any of the four diagonal directions.
//! - Kings slide over any number of empty squares and capture an enemy at any
//!   distance, landing on any empty square beyond it.
//! - Capturing is mandatory and only the longest chains available to the side
//!   are legal (majority capture). A piece that can capture, but not as many
//!   pieces as the best chain of its side, has no legal move at all.
//!
//! Captured pieces stay on the board until the chain completes: they block
//! sliding kings and can't be jumped a second time. The moving piece's origin
//! is treated as empty, and no chain lands twice on the same square.

use std::fmt;

use crate::board::{step, Board, Color, Piece, Point};
use crate::constants::DIAGONALS;

/// A move: the landing squares from `from` to the destination, and the
/// positions of the pieces it captures in capture order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Point,
    /// Landing squares in order; the last one is the destination.
    pub path: Vec<Point>,
    pub captured: Vec<Point>,
}

impl Move {
    pub fn simple(from: Point, to: Point) -> Self {
        Self {
            from,
            path: vec![to],
            captured: Vec::new(),
        }
    }

    /// Final landing square.
    #[inline]
    pub fn to(&self) -> Point {
        self.path.last().copied().unwrap_or(self.from)
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        !self.captured.is_empty()
    }

    /// Number of pieces captured.
    #[inline]
    pub fn captures(&self) -> usize {
        self.captured.len()
    }

    /// The first jump of a capture chain as a move of its own.
    pub(crate) fn first_hop(&self) -> Move {
        Move {
            from: self.from,
            path: self.path.iter().take(1).copied().collect(),
            captured: self.captured.iter().take(1).copied().collect(),
        }
    }

    fn same_result(&self, other: &Move) -> bool {
        self.from == other.from
            && self.to() == other.to()
            && self.captured.len() == other.captured.len()
            && self.captured.iter().all(|c| other.captured.contains(c))
    }
}

impl fmt::Display for Move {
    /// `6,1-5,0` for a step, `3,2x5,4x7,6` for a capture chain.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.is_capture() { 'x' } else { '-' };
        write!(f, "{},{}", self.from.0, self.from.1)?;
        for (row, col) in &self.path {
            write!(f, "{sep}{row},{col}")?;
        }
        Ok(())
    }
}

/// A legal destination of one piece with the pieces captured on the way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    pub to: Point,
    pub captured: Vec<Point>,
}

impl From<&Move> for Destination {
    fn from(mv: &Move) -> Self {
        Self {
            to: mv.to(),
            captured: mv.captured.clone(),
        }
    }
}

/// Single jumps available to `piece` standing at `at` in the middle of a chain.
///
/// Returns `(landing, captured)` pairs. `path` holds the squares landed on so
/// far and `captured` the pieces already taken in this chain.
fn jumps(board: &Board, piece: &Piece, at: Point, path: &[Point], captured: &[Point]) -> Vec<(Point, Point)> {
    let origin = piece.pos();
    let occupant = |sq: Point| if sq == origin { None } else { board.get(sq) };
    let visited = |sq: Point| sq == origin || path.contains(&sq);
    let capturable = |sq: Point| {
        occupant(sq).is_some_and(|p| p.color != piece.color) && !captured.contains(&sq)
    };

    let mut out = Vec::new();
    for dir in DIAGONALS {
        if piece.king {
            // Slide to the first occupied square on this diagonal.
            let mut target = step(at, dir);
            while let Some(sq) = target {
                if occupant(sq).is_some() {
                    break;
                }
                target = step(sq, dir);
            }
            let Some(victim) = target.filter(|&sq| capturable(sq)) else {
                continue;
            };
            let mut landing = step(victim, dir);
            while let Some(sq) = landing {
                if occupant(sq).is_some() {
                    break;
                }
                if !visited(sq) {
                    out.push((sq, victim));
                }
                landing = step(sq, dir);
            }
        } else {
            let Some(victim) = step(at, dir) else { continue };
            let Some(landing) = step(victim, dir) else { continue };
            if capturable(victim) && occupant(landing).is_none() && !visited(landing) {
                out.push((landing, victim));
            }
        }
    }
    out
}

/// Whether the piece at `from` has at least one capture.
pub fn can_capture(board: &Board, from: Point) -> bool {
    board
        .get(from)
        .is_some_and(|piece| !jumps(board, &piece, from, &[], &[]).is_empty())
}

/// Whether any piece of `color` has a capture.
pub fn any_capture(board: &Board, color: Color) -> bool {
    board.pieces(color).any(|p| can_capture(board, p.pos()))
}

/// Every complete capture chain of the piece at `from`.
///
/// A chain is complete when no further jump is possible from its last landing
/// square. Chains with the same destination and the same captured pieces are
/// reported once.
pub fn capture_chains(board: &Board, from: Point) -> Vec<Move> {
    let Some(piece) = board.get(from) else {
        return Vec::new();
    };

    let mut chains: Vec<Move> = Vec::new();
    let mut stack: Vec<(Point, Vec<Point>, Vec<Point>)> = vec![(from, Vec::new(), Vec::new())];
    while let Some((at, path, captured)) = stack.pop() {
        let hops = jumps(board, &piece, at, &path, &captured);
        if hops.is_empty() {
            if !captured.is_empty() {
                let chain = Move { from, path, captured };
                if !chains.iter().any(|c| c.same_result(&chain)) {
                    chains.push(chain);
                }
            }
            continue;
        }
        for (landing, victim) in hops.into_iter().rev() {
            let mut next_path = path.clone();
            next_path.push(landing);
            let mut next_captured = captured.clone();
            next_captured.push(victim);
            stack.push((landing, next_path, next_captured));
        }
    }
    chains
}

/// Length of the longest capture chain available to `color` (0 if none).
pub fn max_captures(board: &Board, color: Color) -> usize {
    board
        .pieces(color)
        .flat_map(|p| capture_chains(board, p.pos()))
        .map(|c| c.captures())
        .max()
        .unwrap_or(0)
}

/// Non-capturing moves of the piece at `from`, ignoring the capture obligation.
pub fn simple_moves(board: &Board, from: Point) -> Vec<Move> {
    let Some(piece) = board.get(from) else {
        return Vec::new();
    };

    let mut moves = Vec::new();
    if piece.king {
        for dir in DIAGONALS {
            let mut next = step(from, dir);
            while let Some(sq) = next {
                if board.get(sq).is_some() {
                    break;
                }
                moves.push(Move::simple(from, sq));
                next = step(sq, dir);
            }
        }
    } else {
        let forward = piece.color.forward();
        for dc in [-1, 1] {
            if let Some(sq) = step(from, (forward, dc)) {
                if board.get(sq).is_none() {
                    moves.push(Move::simple(from, sq));
                }
            }
        }
    }
    moves
}

/// Keep only the chains of maximal length.
fn longest(chains: Vec<Move>) -> Vec<Move> {
    let best = chains.iter().map(Move::captures).max().unwrap_or(0);
    chains.into_iter().filter(|c| c.captures() == best).collect()
}

/// All legal moves for `color`, majority capture applied.
pub fn legal_moves(board: &Board, color: Color) -> Vec<Move> {
    let chains: Vec<Move> = board
        .pieces(color)
        .flat_map(|p| capture_chains(board, p.pos()))
        .collect();
    if chains.is_empty() {
        return board
            .pieces(color)
            .flat_map(|p| simple_moves(board, p.pos()))
            .collect();
    }
    longest(chains)
}

/// Legal moves of the piece at `from`, majority capture over its whole side applied.
pub fn legal_moves_from(board: &Board, from: Point) -> Vec<Move> {
    let Some(piece) = board.get(from) else {
        return Vec::new();
    };
    if !any_capture(board, piece.color) {
        return simple_moves(board, from);
    }
    let best = max_captures(board, piece.color);
    capture_chains(board, from)
        .into_iter()
        .filter(|c| c.captures() == best)
        .collect()
}

/// Legal destinations of the piece at `from` with the pieces each one captures.
pub fn legal_destinations(board: &Board, from: Point) -> Vec<Destination> {
    legal_moves_from(board, from).iter().map(Destination::from).collect()
}

/// Moves of a piece that must keep capturing: its own longest chains.
pub fn continuation_moves(board: &Board, at: Point) -> Vec<Move> {
    longest(capture_chains(board, at))
}

/// Whether `color` has any legal move at all.
pub fn has_legal_move(board: &Board, color: Color) -> bool {
    any_capture(board, color)
        || board
            .pieces(color)
            .any(|p| !simple_moves(board, p.pos()).is_empty())
}
