//! Integration tests for draughts-mcts
//!
//! Rule scenarios driven through the public API, plus random-walk checks of the
//! properties every reachable position must keep.

use std::collections::HashSet;

use draughts_mcts::board::{Board, Color, is_playable};
use draughts_mcts::constants::PIECES_PER_SIDE;
use draughts_mcts::game::{Game, MoveError, MoveOutcome, TurnState, apply_move, winner};
use draughts_mcts::movegen::{legal_destinations, legal_moves};

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

/// Build a board from ten rows of `.`, `r`, `R`, `b` and `B`.
fn board(rows: &[&str]) -> Board {
    Board::from_ascii(&rows.join("\n")).unwrap()
}

/// Red man on (3, 2) with two blue men lined up for a double capture.
fn double_capture() -> Board {
    board(&[
        "..........",
        "..........",
        "..........",
        "..r.......",
        "...b......",
        "..........",
        ".....b....",
        "..........",
        "..........",
        "b.........",
    ])
}

// =============================================================================
// Basic moves
// =============================================================================

#[test]
fn test_blue_opening_step() {
    let mut game = Game::new();
    assert_eq!(game.play((6, 1), (5, 0)), Ok(MoveOutcome::Applied));
    assert_eq!(game.state(), TurnState::AwaitingMove(Color::Red));
    assert!(game.board().get((6, 1)).is_none());
    assert_eq!(game.board().get((5, 0)).map(|p| p.color), Some(Color::Blue));
}

#[test]
fn test_single_capture() {
    let mut board = board(&[
        "..........",
        "..........",
        "..........",
        "..r.......",
        "...b......",
        "..........",
        "..........",
        "..........",
        "..........",
        "b.........",
    ]);
    let destinations = legal_destinations(&board, (3, 2));
    assert_eq!(destinations.len(), 1);
    assert_eq!(destinations[0].to, (5, 4));
    assert_eq!(destinations[0].captured, vec![(4, 3)]);

    assert_eq!(apply_move(&mut board, (3, 2), (5, 4)), Ok(MoveOutcome::Applied));
    assert!(board.get((4, 3)).is_none());
    assert!(board.get((3, 2)).is_none());
    assert_eq!(board.material(Color::Blue).total(), 1);
}

#[test]
fn test_double_capture_hop_by_hop() {
    let mut board = double_capture();
    assert_eq!(
        apply_move(&mut board, (3, 2), (5, 4)),
        Ok(MoveOutcome::MustContinue((5, 4)))
    );
    assert!(board.get((4, 3)).is_none());
    assert_eq!(apply_move(&mut board, (5, 4), (7, 6)), Ok(MoveOutcome::Applied));
    assert!(board.get((6, 5)).is_none());
    assert_eq!(board.get((7, 6)).map(|p| p.color), Some(Color::Red));
}

#[test]
fn test_illegal_requests_leave_board_untouched() {
    let mut board = double_capture();
    let before = board.clone();

    // Blue (4, 3) can capture (3, 2), so the quiet step is illegal.
    assert!(matches!(
        apply_move(&mut board, (9, 0), (8, 1)),
        Err(MoveError::IllegalMove { .. })
    ));
    assert_eq!(
        apply_move(&mut board, (3, 2), (4, 1)),
        Err(MoveError::IllegalMove {
            from: (3, 2),
            to: (4, 1)
        })
    );
    assert_eq!(apply_move(&mut board, (0, 1), (1, 0)), Err(MoveError::NoPiece((0, 1))));
    assert_eq!(board, before);
}

// =============================================================================
// Majority capture
// =============================================================================

fn majority() -> Board {
    board(&[
        "..........",
        "..........",
        ".......r..",
        "..r.....b.",
        "...b......",
        "........b.",
        "..........",
        "..........",
        "..........",
        "..........",
    ])
}

#[test]
fn test_majority_capture_rejects_shorter_chain() {
    let mut board = majority();
    let before = board.clone();
    assert!(matches!(
        apply_move(&mut board, (3, 2), (5, 4)),
        Err(MoveError::IllegalMove { .. })
    ));
    assert_eq!(board, before);

    let moves = legal_moves(&board, Color::Red);
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].from, (2, 7));
    assert_eq!(moves[0].captures(), 2);
}

#[test]
fn test_majority_capture_full_chain() {
    let mut board = majority();
    assert_eq!(apply_move(&mut board, (2, 7), (6, 7)), Ok(MoveOutcome::Applied));
    assert!(board.get((3, 8)).is_none());
    assert!(board.get((5, 8)).is_none());
    assert_eq!(board.material(Color::Blue).total(), 1);
}

#[test]
fn test_majority_capture_first_hop() {
    let mut game = Game::from_board(majority(), Color::Red);
    assert_eq!(game.play((2, 7), (4, 9)), Ok(MoveOutcome::MustContinue((4, 9))));
    assert_eq!(game.to_move(), Some(Color::Red));
    assert_eq!(game.forced(), Some((4, 9)));
    assert_eq!(game.play((4, 9), (6, 7)), Ok(MoveOutcome::Applied));
    assert_eq!(game.state(), TurnState::AwaitingMove(Color::Blue));
}

// =============================================================================
// Kings and promotion
// =============================================================================

#[test]
fn test_flying_king_capture_landings() {
    let board = board(&[
        ".R........",
        "..........",
        "..........",
        "....b.....",
        "..........",
        "..........",
        "..........",
        "..........",
        "..........",
        "b.........",
    ]);
    let mut landings: Vec<_> = legal_destinations(&board, (0, 1)).iter().map(|d| d.to).collect();
    landings.sort_unstable();
    assert_eq!(landings, vec![(4, 5), (5, 6), (6, 7), (7, 8), (8, 9)]);
    assert!(
        legal_destinations(&board, (0, 1))
            .iter()
            .all(|d| d.captured == vec![(3, 4)])
    );
}

#[test]
fn test_promotion_by_simple_move() {
    let mut board = board(&[
        "..........",
        "..........",
        "..........",
        "....b.....",
        "..........",
        "..........",
        "..........",
        "..........",
        ".r........",
        "..........",
    ]);
    assert_eq!(apply_move(&mut board, (8, 1), (9, 2)), Ok(MoveOutcome::Applied));
    assert!(board.get((9, 2)).is_some_and(|p| p.king));
    assert_eq!(board.material(Color::Red).kings, 1);
}

// =============================================================================
// End of game
// =============================================================================

#[test]
fn test_capturing_last_piece_wins() {
    let mut game = Game::from_board(
        board(&[
            "..........",
            "..........",
            "..........",
            "..r.......",
            "...b......",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
        ]),
        Color::Red,
    );
    assert_eq!(game.play((3, 2), (5, 4)), Ok(MoveOutcome::Applied));
    assert_eq!(game.winner(), Some(Color::Red));
    assert_eq!(game.state(), TurnState::Terminal(Color::Red));
    assert!(game.legal_moves().is_empty());
    assert_eq!(game.play((5, 4), (6, 5)), Err(MoveError::GameOver));
}

#[test]
fn test_starting_position_has_no_winner() {
    assert_eq!(winner(&Board::new()), None);
    assert_eq!(legal_moves(&Board::new(), Color::Blue).len(), 9);
    assert_eq!(legal_moves(&Board::new(), Color::Red).len(), 9);
}

// =============================================================================
// Random walks
// =============================================================================

fn check_invariants(game: &Game) {
    let board = game.board();
    let mut ids = HashSet::new();
    for color in [Color::Red, Color::Blue] {
        assert!(board.material(color).total() <= PIECES_PER_SIDE as u32);
        for piece in board.pieces(color) {
            assert!(is_playable(piece.pos()), "{piece:?} on a light square");
            assert!(ids.insert(piece.id), "duplicate id {}", piece.id);
            if piece.row == color.promotion_row() {
                assert!(piece.king, "uncrowned man on {:?}", piece.pos());
            }
        }
    }

    let moves = game.legal_moves();
    if let Some(mover) = game.to_move() {
        for mv in &moves {
            let to = mv.to();
            assert!(is_playable(to), "{mv} lands on a light square");
            // A king's chain may come back to its own start square.
            assert!(to == mv.from || board.get(to).is_none(), "{mv} lands on a piece");
            for &sq in &mv.captured {
                assert!(
                    board.get(sq).is_some_and(|p| p.color != mover),
                    "{mv} captures a square without an enemy piece"
                );
            }
        }
    }
    if let Some(longest) = moves.iter().map(|m| m.captures()).max() {
        assert!(moves.iter().all(|m| m.captures() == longest));
    }
    match game.state() {
        TurnState::Terminal(w) => {
            assert_eq!(winner(board), Some(w));
            assert!(moves.is_empty());
        }
        TurnState::ContinuationRequired { at, .. } => {
            assert!(!moves.is_empty());
            assert!(moves.iter().all(|m| m.from == at && m.is_capture()));
        }
        TurnState::AwaitingMove(_) => assert!(!moves.is_empty()),
    }
}

#[test]
fn test_random_walks_keep_invariants() {
    for seed in 0..8 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut game = Game::new();
        let mut counts = (PIECES_PER_SIDE as u32, PIECES_PER_SIDE as u32);

        for _ in 0..150 {
            check_invariants(&game);
            let moves = game.legal_moves();
            if moves.is_empty() {
                break;
            }
            let mv = &moves[rng.usize(..moves.len())];
            let mover = game.to_move().unwrap();
            let before = game.board().get(mv.from).unwrap();

            game.play(mv.from, mv.to()).unwrap();

            let after = game.board().get(mv.to()).unwrap();
            assert_eq!(after.id, before.id);
            assert_eq!(after.color, mover);

            let now = (
                game.board().material(Color::Red).total(),
                game.board().material(Color::Blue).total(),
            );
            assert!(now.0 <= counts.0 && now.1 <= counts.1);
            counts = now;
        }
    }
}
