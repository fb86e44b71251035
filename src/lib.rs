//! Draughts-MCTS: a 10x10 draughts engine driven by Monte Carlo Tree Search.
//!
//! The rules follow international draughts: men move forward and capture in
//! every direction, kings fly along diagonals, capturing is mandatory and the
//! longest capture sequence must be taken, and a man reaching the far rank is
//! crowned and ends its move there.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions and engine parameters
//! - [`board`] - Pieces, colors and the board grid
//! - [`movegen`] - Simple moves, capture chains and majority capture
//! - [`game`] - Move application and the turn state machine
//! - [`playout`] - Bounded random games and position evaluation
//! - [`policy`] - Pluggable rollout and selection strategies
//! - [`mcts`] - Monte Carlo Tree Search
//! - [`console`] - Text protocol for GUIs and scripts
//!
//! ## Example
//!
//! ```
//! use draughts_mcts::board::{Board, Color};
//! use draughts_mcts::game::{apply_move, MoveOutcome};
//! use draughts_mcts::mcts::search;
//! use draughts_mcts::policy::RandomRollout;
//!
//! // Blue opens
//! let mut board = Board::new();
//! assert_eq!(apply_move(&mut board, (6, 1), (5, 0)), Ok(MoveOutcome::Applied));
//!
//! // Let the search answer for Red
//! let mut rng = fastrand::Rng::with_seed(7);
//! let reply = search(&board, Color::Red, 50, &mut RandomRollout::default(), &mut rng)
//!     .unwrap()
//!     .unwrap();
//! println!("Red plays {reply}");
//! ```

pub mod board;
pub mod console;
pub mod constants;
pub mod game;
pub mod mcts;
pub mod movegen;
pub mod playout;
pub mod policy;
