//! Rollout and selection policies plugged into the search tree.
//!
//! | policy | expansion | rollout | step-bound score |
//! |---|---|---|---|
//! | [`RandomRollout`] | all untried moves | uniform | material ratio |
//! | [`HeuristicRollout`] | all untried moves | promotion / safety biased | material ratio |
//! | [`MaterialHeuristic`] | all untried moves | uniform | material sigmoid |
//! | [`ProgressiveWidening`] | `k * visits^alpha` children | uniform | material ratio |
//! | [`NestedSearch`] | all untried moves | one move of an inner search | material ratio |

use std::fmt;
use std::str::FromStr;

use fastrand::Rng;
use thiserror::Error;

use crate::board::{Board, Color};
use crate::constants::{
    MAX_ROLLOUT_STEPS, NESTED_GAMMA, NESTED_ITERATIONS, PROB_HEURISTIC_PROMOTE,
    PROB_HEURISTIC_SAFE, PW_ALPHA, PW_K,
};
use crate::game::{Game, TurnState};
use crate::mcts::{SearchError, SearchTree, TreeNode, tree_search};
use crate::movegen::{Move, any_capture};
use crate::playout::{MaterialWeights, material_sigmoid, mcplayout, ratio_score, uniform_pick};

/// Result of scoring one leaf, both values for the search color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    /// Estimated probability of winning, in `[0, 1]`.
    pub reward: f64,
    /// Secondary estimate; only [`NestedSearch`] makes it differ from `reward`.
    pub auxiliary: f64,
}

impl Evaluation {
    pub fn new(reward: f64) -> Self {
        Self {
            reward,
            auxiliary: reward,
        }
    }
}

/// A search strategy: how leaves are scored, when nodes grow new children, and
/// what is added to UCB1 during selection.
pub trait Policy {
    fn name(&self) -> &'static str;

    /// Score `game` for `perspective`.
    fn rollout(&mut self, game: &Game, perspective: Color, rng: &mut Rng) -> Result<Evaluation, SearchError>;

    /// Whether `node` should get a new child instead of descending further.
    fn should_expand(&self, node: &TreeNode) -> bool {
        !node.untried.is_empty()
    }

    /// Term added to a child's UCB1 score.
    fn selection_bonus(&self, _child: &TreeNode) -> f64 {
        0.0
    }
}

/// Uniformly random playouts scored by the material ratio.
#[derive(Clone, Debug)]
pub struct RandomRollout {
    pub max_steps: usize,
}

impl Default for RandomRollout {
    fn default() -> Self {
        Self {
            max_steps: MAX_ROLLOUT_STEPS,
        }
    }
}

impl Policy for RandomRollout {
    fn name(&self) -> &'static str {
        "random"
    }

    fn rollout(&mut self, game: &Game, perspective: Color, rng: &mut Rng) -> Result<Evaluation, SearchError> {
        let reward = mcplayout(game, perspective, self.max_steps, rng, uniform_pick, ratio_score)?;
        Ok(Evaluation::new(reward))
    }
}

/// Playouts that prefer promoting moves and moves that leave the opponent
/// nothing to capture.
#[derive(Clone, Debug)]
pub struct HeuristicRollout {
    pub max_steps: usize,
    pub prob_promote: f64,
    pub prob_safe: f64,
}

impl Default for HeuristicRollout {
    fn default() -> Self {
        Self {
            max_steps: MAX_ROLLOUT_STEPS,
            prob_promote: PROB_HEURISTIC_PROMOTE,
            prob_safe: PROB_HEURISTIC_SAFE,
        }
    }
}

/// Whether `mv` crowns a man.
fn promotes(board: &Board, mv: &Move) -> bool {
    board
        .get(mv.from)
        .is_some_and(|p| !p.king && mv.to().0 == p.color.promotion_row())
}

/// Whether the opponent has no capture after `mv`.
fn is_safe(game: &Game, mv: &Move) -> bool {
    let mut next = game.clone();
    if next.apply(mv).is_err() {
        return false;
    }
    match next.state() {
        TurnState::AwaitingMove(opponent) => !any_capture(next.board(), opponent),
        TurnState::ContinuationRequired { .. } | TurnState::Terminal(_) => true,
    }
}

impl HeuristicRollout {
    fn pick(&self, game: &Game, moves: &[Move], rng: &mut Rng) -> usize {
        let choose = |candidates: Vec<usize>, rng: &mut Rng| {
            (!candidates.is_empty()).then(|| candidates[rng.usize(..candidates.len())])
        };

        if rng.f64() < self.prob_promote {
            let promoting: Vec<usize> = (0..moves.len())
                .filter(|&i| promotes(game.board(), &moves[i]))
                .collect();
            if let Some(i) = choose(promoting, rng) {
                return i;
            }
        }
        if rng.f64() < self.prob_safe {
            let safe: Vec<usize> = (0..moves.len()).filter(|&i| is_safe(game, &moves[i])).collect();
            if let Some(i) = choose(safe, rng) {
                return i;
            }
        }
        rng.usize(..moves.len())
    }
}

impl Policy for HeuristicRollout {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn rollout(&mut self, game: &Game, perspective: Color, rng: &mut Rng) -> Result<Evaluation, SearchError> {
        let this = &*self;
        let reward = mcplayout(
            game,
            perspective,
            this.max_steps,
            rng,
            |g, moves, rng| this.pick(g, moves, rng),
            ratio_score,
        )?;
        Ok(Evaluation::new(reward))
    }
}

/// Uniform playouts scored by a material sigmoid where kings weigh heavily.
#[derive(Clone, Debug, Default)]
pub struct MaterialHeuristic {
    pub rollout: RandomRollout,
    pub weights: MaterialWeights,
}

impl Policy for MaterialHeuristic {
    fn name(&self) -> &'static str {
        "material"
    }

    fn rollout(&mut self, game: &Game, perspective: Color, rng: &mut Rng) -> Result<Evaluation, SearchError> {
        let weights = self.weights;
        let reward = mcplayout(
            game,
            perspective,
            self.rollout.max_steps,
            rng,
            uniform_pick,
            |board, color| material_sigmoid(board, color, &weights),
        )?;
        Ok(Evaluation::new(reward))
    }
}

/// Limits the children of a node to `k * visits^alpha`; scores leaves with
/// random playouts.
#[derive(Clone, Debug)]
pub struct ProgressiveWidening {
    pub k: f64,
    pub alpha: f64,
    pub rollout: RandomRollout,
}

impl Default for ProgressiveWidening {
    fn default() -> Self {
        Self {
            k: PW_K,
            alpha: PW_ALPHA,
            rollout: RandomRollout::default(),
        }
    }
}

impl ProgressiveWidening {
    /// Children allowed for a node visited `visits` times.
    pub fn max_children(&self, visits: u32) -> f64 {
        self.k * f64::from(visits + 1).powf(self.alpha)
    }
}

impl Policy for ProgressiveWidening {
    fn name(&self) -> &'static str {
        "progressive"
    }

    fn rollout(&mut self, game: &Game, perspective: Color, rng: &mut Rng) -> Result<Evaluation, SearchError> {
        self.rollout.rollout(game, perspective, rng)
    }

    fn should_expand(&self, node: &TreeNode) -> bool {
        !node.untried.is_empty() && (node.children.len() as f64) < self.max_children(node.v)
    }
}

/// Scores a leaf by running a small inner search from it, playing the inner
/// search's move once and measuring the material ratio. The inner search's
/// own value estimate is added to the selection score.
#[derive(Clone, Debug)]
pub struct NestedSearch {
    pub iterations: usize,
    pub gamma: f64,
    pub inner: RandomRollout,
}

impl Default for NestedSearch {
    fn default() -> Self {
        Self {
            iterations: NESTED_ITERATIONS,
            gamma: NESTED_GAMMA,
            inner: RandomRollout::default(),
        }
    }
}

impl NestedSearch {
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }
}

impl Policy for NestedSearch {
    fn name(&self) -> &'static str {
        "nested"
    }

    fn rollout(&mut self, game: &Game, perspective: Color, rng: &mut Rng) -> Result<Evaluation, SearchError> {
        let Some(to_move) = game.to_move() else {
            return Ok(Evaluation::new(ratio_score(game.board(), perspective)));
        };

        let mut tree = SearchTree::new(game);
        let Some(mv) = tree_search(&mut tree, self.iterations, &mut self.inner, rng)? else {
            return Ok(Evaluation::new(ratio_score(game.board(), perspective)));
        };

        // The best child's win rate is for `to_move`.
        let value = tree.best_child().map_or(0.5, |c| c.winrate().max(0.0));
        let auxiliary = if to_move == perspective { value } else { 1.0 - value };

        let mut next = game.clone();
        next.apply(&mv)?;
        Ok(Evaluation {
            reward: ratio_score(next.board(), perspective),
            auxiliary,
        })
    }

    fn selection_bonus(&self, child: &TreeNode) -> f64 {
        if child.v == 0 {
            0.0
        } else {
            self.gamma * child.aux / f64::from(child.v)
        }
    }
}

/// Error from parsing a [`PolicyKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown policy '{0}' (expected random, heuristic, material, progressive or nested)")]
pub struct ParsePolicyError(pub String);

/// Names the available policies, for the CLI and the console engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PolicyKind {
    #[default]
    Random,
    Heuristic,
    Material,
    Progressive,
    Nested,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 5] = [
        PolicyKind::Random,
        PolicyKind::Heuristic,
        PolicyKind::Material,
        PolicyKind::Progressive,
        PolicyKind::Nested,
    ];

    /// A policy of this kind with default parameters.
    pub fn build(self) -> Box<dyn Policy> {
        match self {
            PolicyKind::Random => Box::new(RandomRollout::default()),
            PolicyKind::Heuristic => Box::new(HeuristicRollout::default()),
            PolicyKind::Material => Box::new(MaterialHeuristic::default()),
            PolicyKind::Progressive => Box::new(ProgressiveWidening::default()),
            PolicyKind::Nested => Box::new(NestedSearch::default()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Random => "random",
            PolicyKind::Heuristic => "heuristic",
            PolicyKind::Material => "material",
            PolicyKind::Progressive => "progressive",
            PolicyKind::Nested => "nested",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        PolicyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or(ParsePolicyError(s))
    }
}
