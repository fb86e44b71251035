//! Text protocol for driving the engine from a terminal or a GUI.
//!
//! The framing follows the Go Text Protocol: every line is an optional
//! numeric id, a command and its arguments; every answer is `=<id> <text>` on
//! success or `?<id> <error>` on failure, followed by a blank line.
//!
//! ## Supported Commands
//!
//! - `name` - Return engine name
//! - `version` - Return engine version
//! - `protocol_version` - Return protocol version (2)
//! - `list_commands` - List all supported commands
//! - `known_command <cmd>` - Check if a command is supported
//! - `quit` - Exit the program
//! - `clear_board` - Reset to the starting position
//! - `showboard` - Print the board
//! - `turn` - Print the color to move (and the forced piece, if any)
//! - `legal <row> <col>` - List the destinations of a piece
//! - `play <row> <col> <row> <col>` - Play a move
//! - `genmove` - Search and play a move for the side on turn
//! - `winner` - Print the winner, or `none`
//! - `iterations <n>` - Set the search iterations per move
//! - `policy <kind>` - Select the search policy
//! - `seed <n>` - Reseed the search
//!
//! ## Example
//!
//! ```ignore
//! use draughts_mcts::console::ConsoleEngine;
//! let mut engine = ConsoleEngine::new();
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};

use fastrand::Rng;
use log::{info, warn};

use crate::board::Point;
use crate::constants::N_ITERATIONS;
use crate::game::{Game, MoveOutcome};
use crate::mcts::{SearchTree, tree_search};
use crate::policy::PolicyKind;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "clear_board",
    "genmove",
    "iterations",
    "known_command",
    "legal",
    "list_commands",
    "name",
    "play",
    "policy",
    "protocol_version",
    "quit",
    "seed",
    "showboard",
    "turn",
    "version",
    "winner",
];

/// Console engine state.
pub struct ConsoleEngine {
    /// Current game
    game: Game,
    /// Search iterations per generated move
    iterations: usize,
    /// Policy used by `genmove`
    policy: PolicyKind,
    rng: Rng,
}

impl Default for ConsoleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleEngine {
    /// Create an engine with default settings.
    pub fn new() -> Self {
        Self::with_settings(N_ITERATIONS, PolicyKind::default(), Rng::new())
    }

    pub fn with_settings(iterations: usize, policy: PolicyKind, rng: Rng) -> Self {
        Self {
            game: Game::new(),
            iterations,
            policy,
            rng,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Run the command loop on stdin and stdout.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Run the command loop until `quit` or end of input.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, args);
            if !success {
                warn!("{command_line}: {message}");
            }
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    fn parse_point(row: &str, col: &str) -> Result<Point, String> {
        let parse = |s: &str| s.parse::<usize>().map_err(|_| format!("invalid coordinate '{s}'"));
        Ok((parse(row)?, parse(col)?))
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "2".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(cmd) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "clear_board" => {
                self.game = Game::new();
                (true, String::new())
            }

            "showboard" => (true, format!("\n{}", self.game.board())),

            "turn" => match (self.game.to_move(), self.game.forced()) {
                (Some(color), Some((r, c))) => (true, format!("{color} {r} {c}")),
                (Some(color), None) => (true, color.to_string()),
                (None, _) => (true, "none".to_string()),
            },

            "legal" => {
                let [row, col] = args else {
                    return (false, "expected: legal <row> <col>".to_string());
                };
                let from = match Self::parse_point(row, col) {
                    Ok(p) => p,
                    Err(e) => return (false, e),
                };
                let targets: Vec<String> = self
                    .game
                    .legal_destinations(from)
                    .iter()
                    .map(|d| format!("{},{}", d.to.0, d.to.1))
                    .collect();
                (true, targets.join(" "))
            }

            "play" => {
                let [fr, fc, tr, tc] = args else {
                    return (false, "expected: play <row> <col> <row> <col>".to_string());
                };
                let (from, to) = match (Self::parse_point(fr, fc), Self::parse_point(tr, tc)) {
                    (Ok(from), Ok(to)) => (from, to),
                    (Err(e), _) | (_, Err(e)) => return (false, e),
                };
                match self.game.play(from, to) {
                    Ok(MoveOutcome::Applied) => (true, String::new()),
                    Ok(MoveOutcome::MustContinue((r, c))) => (true, format!("continue {r} {c}")),
                    Err(e) => (false, e.to_string()),
                }
            }

            "genmove" => {
                let Some(color) = self.game.to_move() else {
                    return (false, "the game is over".to_string());
                };
                let mut policy = self.policy.build();
                let mut tree = SearchTree::new(&self.game);
                let mv = match tree_search(&mut tree, self.iterations, policy.as_mut(), &mut self.rng) {
                    Ok(Some(mv)) => mv,
                    Ok(None) => return (true, "resign".to_string()),
                    Err(e) => return (false, e.to_string()),
                };
                if let Some(best) = tree.best_child() {
                    info!("{color} ({}) plays {mv}, winrate {:.3}", self.policy, best.winrate());
                }
                match self.game.apply(&mv) {
                    Ok(_) => (true, mv.to_string()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "winner" => (
                true,
                self.game
                    .winner()
                    .map_or_else(|| "none".to_string(), |w| w.to_string()),
            ),

            "iterations" => match args.first().map(|s| s.parse::<usize>()) {
                Some(Ok(n)) if n > 0 => {
                    self.iterations = n;
                    (true, String::new())
                }
                Some(_) => (false, "invalid iteration count".to_string()),
                None => (false, "missing argument".to_string()),
            },

            "policy" => match args.first().map(|s| s.parse::<PolicyKind>()) {
                Some(Ok(kind)) => {
                    self.policy = kind;
                    (true, String::new())
                }
                Some(Err(e)) => (false, e.to_string()),
                None => (true, self.policy.to_string()),
            },

            "seed" => match args.first().map(|s| s.parse::<u64>()) {
                Some(Ok(seed)) => {
                    self.rng = Rng::with_seed(seed);
                    (true, String::new())
                }
                Some(Err(_)) => (false, "invalid seed".to_string()),
                None => (false, "missing argument".to_string()),
            },

            _ => (false, format!("unknown command: {command}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;

    fn engine() -> ConsoleEngine {
        ConsoleEngine::with_settings(20, PolicyKind::Random, Rng::with_seed(3))
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = ConsoleEngine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = ConsoleEngine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_name_command() {
        let mut engine = engine();
        let (success, response) = engine.execute("name", &[]);
        assert!(success);
        assert_eq!(response, "draughts-mcts");
    }

    #[test]
    fn test_known_command() {
        let mut engine = engine();

        let (success, response) = engine.execute("known_command", &["genmove"]);
        assert!(success);
        assert_eq!(response, "true");

        let (success, response) = engine.execute("known_command", &["boardsize"]);
        assert!(success);
        assert_eq!(response, "false");
    }

    #[test]
    fn test_play_and_clear() {
        let mut engine = engine();

        let (success, _) = engine.execute("play", &["6", "1", "5", "0"]);
        assert!(success);
        assert_eq!(engine.game().to_move(), Some(Color::Red));
        assert_eq!(engine.execute("turn", &[]), (true, "red".to_string()));

        let (success, _) = engine.execute("play", &["6", "3", "5", "4"]);
        assert!(!success);

        let (success, _) = engine.execute("clear_board", &[]);
        assert!(success);
        assert_eq!(engine.game(), &Game::new());
    }

    #[test]
    fn test_legal() {
        let mut engine = engine();
        assert_eq!(engine.execute("legal", &["6", "1"]), (true, "5,0 5,2".to_string()));
        assert_eq!(engine.execute("legal", &["3", "2"]), (true, String::new()));
        assert!(!engine.execute("legal", &["6"]).0);
        assert!(!engine.execute("legal", &["x", "1"]).0);
    }

    #[test]
    fn test_genmove_plays_for_side_on_turn() {
        let mut engine = engine();
        let (success, response) = engine.execute("genmove", &[]);
        assert!(success, "{response}");
        assert_eq!(engine.game().to_move(), Some(Color::Red));
        assert_eq!(engine.execute("winner", &[]), (true, "none".to_string()));
    }

    #[test]
    fn test_settings() {
        let mut engine = engine();
        assert!(engine.execute("iterations", &["5"]).0);
        assert!(!engine.execute("iterations", &["0"]).0);
        assert!(engine.execute("policy", &["progressive"]).0);
        assert_eq!(engine.execute("policy", &[]), (true, "progressive".to_string()));
        assert!(!engine.execute("policy", &["greedy"]).0);
        assert!(engine.execute("seed", &["7"]).0);
        assert!(!engine.execute("seed", &["-1"]).0);
    }

    #[test]
    fn test_serve_formats_responses() {
        let mut engine = engine();
        let input = b"1 name\nbogus\n# comment\n2 quit\nname\n";
        let mut output = Vec::new();
        engine.serve(&input[..], &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text,
            "=1 draughts-mcts\n\n? unknown command: bogus\n\n=2 \n\n"
        );
    }
}
