//! Monte Carlo Tree Search over draughts positions.
//!
//! Each iteration:
//! 1. descends from the root with UCB1 while the policy says a node is fully expanded,
//! 2. expands one untried move (chosen uniformly at random),
//! 3. scores the new node with the policy's rollout,
//! 4. propagates the reward back to the root.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Every node owns
//! its own [`Game`] snapshot, so nothing is shared between nodes. A move that
//! leaves a capture unfinished produces a child where the same color moves again.
//!
//! Rewards are stored from the point of view of the color that made the move
//! into a node, which is what its parent maximises during selection.

use fastrand::Rng;
use log::{debug, trace};
use thiserror::Error;

use crate::board::{Board, Color};
use crate::constants::{REPORT_PERIOD, UCB_C};
use crate::game::{Game, MoveError};
use crate::movegen::Move;
use crate::playout::terminal_reward;
use crate::policy::{Evaluation, Policy};

/// Errors that abort a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A move stored in the tree no longer matches the board it was generated
    /// for. This is an engine bug, never a normal game condition.
    #[error("stale move in search tree: {0}")]
    InvariantViolation(#[from] MoveError),
}

/// Index of a node in the [`SearchTree`] arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Position and turn state at this node
    pub game: Game,
    /// Move that led here (`None` at the root)
    pub mv: Option<Move>,
    /// Color that played `mv` (`None` at the root)
    pub mover: Option<Color>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Legal moves not yet expanded into children
    pub untried: Vec<Move>,
    /// Number of visits
    pub v: u32,
    /// Accumulated reward for `mover`
    pub w: f64,
    /// Accumulated auxiliary value for `mover` (used by nested search)
    pub aux: f64,
}

impl TreeNode {
    fn new(game: Game, mv: Option<Move>, mover: Option<Color>, parent: Option<NodeId>) -> Self {
        let untried = game.legal_moves();
        Self {
            game,
            mv,
            mover,
            parent,
            children: Vec::new(),
            untried,
            v: 0,
            w: 0.0,
            aux: 0.0,
        }
    }

    /// Average reward for the color that moved into this node.
    ///
    /// Returns -0.1 for unvisited nodes.
    #[inline]
    pub fn winrate(&self) -> f64 {
        if self.v > 0 {
            self.w / self.v as f64
        } else {
            -0.1
        }
    }
}

/// Arena holding every node of one search.
#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<TreeNode>,
}

impl SearchTree {
    /// A tree holding only the root for `game`.
    pub fn new(game: &Game) -> Self {
        Self {
            nodes: vec![TreeNode::new(game.clone(), None, None, None)],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in allocation order; the root comes first.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    fn allocate(&mut self, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Children of `id` in expansion order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &TreeNode> + '_ {
        self.get(id).children.iter().map(move |&c| self.get(c))
    }

    /// The most visited child of the root.
    pub fn best_child(&self) -> Option<&TreeNode> {
        self.children(self.root()).max_by_key(|c| c.v)
    }
}

/// UCB1 score of `child`, plus whatever bonus the policy adds.
fn urgency<P: Policy + ?Sized>(child: &TreeNode, ln_parent: f64, policy: &P) -> f64 {
    if child.v == 0 {
        return f64::INFINITY;
    }
    let n = child.v as f64;
    child.w / n + UCB_C * (ln_parent / n).sqrt() + policy.selection_bonus(child)
}

/// Select the child of `id` with the highest urgency.
fn most_urgent<P: Policy + ?Sized>(tree: &SearchTree, id: NodeId, policy: &P) -> Option<NodeId> {
    let node = tree.get(id);
    let ln_parent = f64::from(node.v.max(1)).ln();
    node.children.iter().copied().max_by(|&a, &b| {
        urgency(tree.get(a), ln_parent, policy)
            .partial_cmp(&urgency(tree.get(b), ln_parent, policy))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

/// Descend from the root to the first node the policy wants to expand, or to
/// a node without children.
fn tree_descend<P: Policy + ?Sized>(tree: &SearchTree, policy: &P) -> NodeId {
    let mut id = tree.root();
    loop {
        let node = tree.get(id);
        if node.children.is_empty() || policy.should_expand(node) {
            return id;
        }
        match most_urgent(tree, id, policy) {
            Some(child) => id = child,
            None => return id,
        }
    }
}

/// Expand one random untried move of `id` and return the new child.
fn expand(tree: &mut SearchTree, id: NodeId, rng: &mut Rng) -> Result<NodeId, SearchError> {
    let node = tree.get_mut(id);
    let idx = rng.usize(..node.untried.len());
    let mv = node.untried.swap_remove(idx);
    let mover = node.game.to_move();

    let mut game = node.game.clone();
    game.apply(&mv)?;

    let child = tree.allocate(TreeNode::new(game, Some(mv), mover, Some(id)));
    tree.get_mut(id).children.push(child);
    Ok(child)
}

/// Propagate an evaluation from `leaf` to the root.
///
/// `eval` is expressed for `perspective`; each node is credited from the point
/// of view of its own mover.
fn tree_update(tree: &mut SearchTree, leaf: NodeId, perspective: Color, eval: Evaluation) {
    let mut cur = Some(leaf);
    while let Some(id) = cur {
        let node = tree.get_mut(id);
        node.v += 1;
        if let Some(mover) = node.mover {
            if mover == perspective {
                node.w += eval.reward;
                node.aux += eval.auxiliary;
            } else {
                node.w += 1.0 - eval.reward;
                node.aux += 1.0 - eval.auxiliary;
            }
        }
        cur = node.parent;
    }
}

/// Run `iterations` search iterations and return the most visited root move.
///
/// Returns `Ok(None)` when the side to move at the root has no legal move.
///
/// # Errors
/// [`SearchError::InvariantViolation`] if a stored move can't be replayed.
pub fn tree_search<P: Policy + ?Sized>(
    tree: &mut SearchTree,
    iterations: usize,
    policy: &mut P,
    rng: &mut Rng,
) -> Result<Option<Move>, SearchError> {
    let root = tree.get(tree.root());
    let Some(perspective) = root.game.to_move() else {
        return Ok(None);
    };
    if root.untried.is_empty() && root.children.is_empty() {
        return Ok(None);
    }

    for i in 0..iterations {
        let mut leaf = tree_descend(tree, policy);
        if policy.should_expand(tree.get(leaf)) {
            leaf = expand(tree, leaf, rng)?;
        }

        let node = tree.get(leaf);
        let eval = match node.game.winner() {
            Some(w) => Evaluation::new(terminal_reward(w, perspective)),
            None => policy.rollout(&node.game, perspective, rng)?,
        };
        tree_update(tree, leaf, perspective, eval);

        if i % REPORT_PERIOD == 0 {
            trace!(
                "{}: iteration {i}/{iterations}, {} nodes",
                policy.name(),
                tree.len()
            );
        }
    }

    dump_children(tree);
    Ok(best_move(tree))
}

/// Search `iterations` times for `color` on `board` and return the chosen move.
///
/// Returns `Ok(None)` only when `color` has no legal move on `board`.
pub fn search<P: Policy + ?Sized>(
    board: &Board,
    color: Color,
    iterations: usize,
    policy: &mut P,
    rng: &mut Rng,
) -> Result<Option<Move>, SearchError> {
    let mut tree = SearchTree::new(&Game::from_board(board.clone(), color));
    tree_search(&mut tree, iterations, policy, rng)
}

/// Find the best move (most visited child).
fn best_move(tree: &SearchTree) -> Option<Move> {
    tree.best_child().and_then(|c| c.mv.clone())
}

/// Log statistics of the root's children.
pub fn dump_children(tree: &SearchTree) {
    for child in tree.children(tree.root()) {
        if let Some(mv) = &child.mv {
            debug!(
                "move {mv} v={} w={:.1} wr={:.3}",
                child.v,
                child.w,
                child.winrate()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RandomRollout;

    #[test]
    fn test_visit_counts_add_up() {
        let game = Game::new();
        let mut tree = SearchTree::new(&game);
        let mut policy = RandomRollout::default();
        let mut rng = Rng::with_seed(42);
        let best = tree_search(&mut tree, 60, &mut policy, &mut rng).unwrap();

        let root = tree.get(tree.root());
        assert_eq!(root.v, 60);
        let child_visits: u32 = tree.children(tree.root()).map(|c| c.v).sum();
        assert_eq!(child_visits, 60);
        assert!(game.legal_moves().contains(&best.unwrap()));
    }

    #[test]
    fn test_root_children_cover_all_moves() {
        let game = Game::new();
        let mut tree = SearchTree::new(&game);
        let mut rng = Rng::with_seed(5);
        tree_search(&mut tree, 40, &mut RandomRollout::default(), &mut rng).unwrap();
        // Plain UCB1 expands every root move before revisiting any of them.
        assert_eq!(tree.get(tree.root()).children.len(), game.legal_moves().len());
        assert!(tree.get(tree.root()).untried.is_empty());
    }

    #[test]
    fn test_movers_follow_turn_state() {
        let mut tree = SearchTree::new(&Game::new());
        let mut rng = Rng::with_seed(9);
        tree_search(&mut tree, 80, &mut RandomRollout::default(), &mut rng).unwrap();
        for node in tree.nodes().iter().skip(1) {
            let parent = tree.get(node.parent.unwrap());
            assert_eq!(node.mover, parent.game.to_move());
            assert!(node.v > 0);
            assert!(node.w >= 0.0 && node.w <= node.v as f64);
        }
    }

    #[test]
    fn test_no_move_when_lost() {
        let mut board = Board::empty();
        board.place(3, 2, Color::Red, false).unwrap();
        let mut rng = Rng::with_seed(1);
        let mv = search(&board, Color::Blue, 20, &mut RandomRollout::default(), &mut rng).unwrap();
        assert_eq!(mv, None);
    }

    #[test]
    fn test_stale_move_aborts_search() {
        let mut tree = SearchTree::new(&Game::new());
        let root = tree.root();
        tree.get_mut(root).untried = vec![Move::simple((5, 0), (4, 1))];
        let mut rng = Rng::with_seed(4);
        let result = tree_search(&mut tree, 10, &mut RandomRollout::default(), &mut rng);
        assert!(matches!(
            result,
            Err(SearchError::InvariantViolation(MoveError::NoPiece((5, 0))))
        ));
    }

    #[test]
    fn test_tree_update_flips_only_for_opponent() {
        let mut tree = SearchTree::new(&Game::new());
        let mut rng = Rng::with_seed(2);
        let root = tree.root();
        let child = expand(&mut tree, root, &mut rng).unwrap();
        assert_eq!(tree.get(child).mover, Some(Color::Blue));

        tree_update(&mut tree, child, Color::Blue, Evaluation::new(0.75));
        assert_eq!(tree.get(child).w, 0.75);
        tree_update(&mut tree, child, Color::Red, Evaluation::new(0.75));
        assert_eq!(tree.get(child).w, 1.0);
        assert_eq!(tree.get(tree.root()).v, 2);
        assert_eq!(tree.get(tree.root()).w, 0.0);
    }
}
