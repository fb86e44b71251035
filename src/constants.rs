//! Constants for board geometry, search parameters and evaluation weights.
//!
//! Every tunable the engine uses lives here so that the CLI and the console
//! engine only ever override them explicitly (iteration counts, policy choice).

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of rows on the board.
pub const ROWS: usize = 10;

/// Number of columns on the board.
pub const COLS: usize = 10;

/// Rows filled with men at the start, counted from each side's back rank.
pub const START_ROWS: usize = 4;

/// Men per side at the start of a game.
pub const PIECES_PER_SIDE: usize = START_ROWS * COLS / 2;

/// The four diagonal directions as (row, col) deltas.
pub const DIAGONALS: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Default number of search iterations per move.
pub const N_ITERATIONS: usize = 300;

/// Iterations of the inner search run by the nested policy.
pub const NESTED_ITERATIONS: usize = 50;

/// Exploration constant of UCB1.
pub const UCB_C: f64 = std::f64::consts::SQRT_2;

/// Weight of the inner-search value in the nested policy's selection score.
pub const NESTED_GAMMA: f64 = 0.5;

/// Progressive widening constant `k` in `k * visits^alpha`.
pub const PW_K: f64 = 1.0;

/// Progressive widening exponent `alpha` in `k * visits^alpha`.
pub const PW_ALPHA: f64 = 0.5;

/// Progress report period (number of iterations between trace reports).
pub const REPORT_PERIOD: usize = 100;

// =============================================================================
// Rollouts
// =============================================================================

/// Maximum half-moves played in one rollout before the position is scored.
pub const MAX_ROLLOUT_STEPS: usize = 30;

/// Reward for a rollout that revisits a position.
pub const DRAW_REWARD: f64 = 0.5;

/// Probability of playing a promoting move in heuristic rollouts.
pub const PROB_HEURISTIC_PROMOTE: f64 = 0.9;

/// Probability of restricting heuristic rollouts to moves that leave
/// nothing for the opponent to capture.
pub const PROB_HEURISTIC_SAFE: f64 = 0.8;

// =============================================================================
// Evaluation
// =============================================================================

/// Weight of a king in the ratio evaluation (men count 1).
pub const RATIO_KING_WEIGHT: u32 = 2;

/// Material value of a man in the sigmoid evaluation.
pub const PAWN_VALUE: f64 = 1.0;

/// Material value of a king in the sigmoid evaluation.
pub const KING_VALUE: f64 = 10.0;

/// Largest material difference the sigmoid evaluation expects.
pub const MATERIAL_MAX: f64 = 440.0;

/// Steepness of the material sigmoid.
pub const SIGMOID_K: f64 = 1.0;

/// Weight applied to the normalised material difference.
pub const MATERIAL_WEIGHT: f64 = 0.5;
