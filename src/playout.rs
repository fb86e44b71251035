//! Monte Carlo playouts (bounded game simulation).
//!
//! A playout plays moves chosen by a move picker from some position until the
//! game ends, a position repeats, or the step bound is reached, and then turns
//! the final position into a reward in `[0, 1]` for one color:
//! - 1.0 / 0.0 when that color wins / loses
//! - [`DRAW_REWARD`] when a position repeats within the playout
//! - an evaluator's score when the step bound is hit

use std::collections::HashSet;

use fastrand::Rng;

use crate::board::{Board, Color};
use crate::constants::{
    DRAW_REWARD, KING_VALUE, MATERIAL_MAX, MATERIAL_WEIGHT, PAWN_VALUE, RATIO_KING_WEIGHT,
    SIGMOID_K,
};
use crate::game::{Game, MoveError};
use crate::movegen::Move;

/// Reward for `perspective` once the game has a winner.
#[inline]
pub fn terminal_reward(winner: Color, perspective: Color) -> f64 {
    if winner == perspective { 1.0 } else { 0.0 }
}

/// Share of the material held by `perspective`, men counting 1 and kings 2.
///
/// Returns 0.5 on an empty board.
pub fn ratio_score(board: &Board, perspective: Color) -> f64 {
    let score = |color: Color| {
        let m = board.material(color);
        (m.men + RATIO_KING_WEIGHT * m.kings) as f64
    };
    let own = score(perspective);
    let total = own + score(perspective.opponent());
    if total == 0.0 { 0.5 } else { own / total }
}

/// Weights of the sigmoid material evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialWeights {
    pub pawn_value: f64,
    pub king_value: f64,
    /// Largest expected material difference, used to normalise.
    pub material_max: f64,
    pub sigmoid_k: f64,
    pub weight: f64,
}

impl Default for MaterialWeights {
    fn default() -> Self {
        Self {
            pawn_value: PAWN_VALUE,
            king_value: KING_VALUE,
            material_max: MATERIAL_MAX,
            sigmoid_k: SIGMOID_K,
            weight: MATERIAL_WEIGHT,
        }
    }
}

/// Material difference mapped through a logistic curve into `(0, 1)`.
pub fn material_sigmoid(board: &Board, perspective: Color, weights: &MaterialWeights) -> f64 {
    let value = |color: Color| {
        let m = board.material(color);
        m.men as f64 * weights.pawn_value + m.kings as f64 * weights.king_value
    };
    let diff = value(perspective) - value(perspective.opponent());
    let normalized = if weights.material_max != 0.0 {
        diff / weights.material_max
    } else {
        0.0
    };
    1.0 / (1.0 + (-weights.sigmoid_k * weights.weight * normalized).exp())
}

/// Pick uniformly among `moves`.
#[inline]
pub fn uniform_pick(_game: &Game, moves: &[Move], rng: &mut Rng) -> usize {
    rng.usize(..moves.len())
}

/// Perform a playout from `game` and score it for `perspective`.
///
/// `pick` returns the index of the move to play among the legal ones;
/// `evaluate` scores the position when `max_steps` half-moves have been played
/// without a result.
///
/// # Errors
/// A [`MoveError`] means a generated move could not be replayed on the board
/// it was generated from.
pub fn mcplayout<P, E>(
    game: &Game,
    perspective: Color,
    max_steps: usize,
    rng: &mut Rng,
    mut pick: P,
    evaluate: E,
) -> Result<f64, MoveError>
where
    P: FnMut(&Game, &[Move], &mut Rng) -> usize,
    E: Fn(&Board, Color) -> f64,
{
    let mut game = game.clone();
    let mut seen = HashSet::new();

    for _ in 0..max_steps {
        let Some(color) = game.to_move() else {
            break;
        };
        if !seen.insert((game.board().position_key(), game.state())) {
            return Ok(DRAW_REWARD);
        }

        let moves = game.legal_moves();
        if moves.is_empty() {
            return Ok(if color == perspective { 0.0 } else { 1.0 });
        }
        let idx = pick(&game, &moves, rng);
        game.apply(&moves[idx])?;
    }

    Ok(match game.winner() {
        Some(w) => terminal_reward(w, perspective),
        None => evaluate(game.board(), perspective),
    })
}
