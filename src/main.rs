//! Draughts-MCTS: a 10x10 draughts engine.
//!
//! ## Usage
//!
//! - `draughts-mcts` - Show a demo
//! - `draughts-mcts console` - Start the text protocol server
//! - `draughts-mcts selfplay --red nested --blue random` - Play two policies against each other

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fastrand::Rng;
use log::info;

use draughts_mcts::board::Color;
use draughts_mcts::console::ConsoleEngine;
use draughts_mcts::constants::N_ITERATIONS;
use draughts_mcts::game::Game;
use draughts_mcts::mcts::{SearchTree, tree_search};
use draughts_mcts::policy::{PolicyKind, RandomRollout};

/// Draughts-MCTS: a 10x10 draughts engine
#[derive(Parser)]
#[command(name = "draughts-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a short search from the starting position
    Demo,
    /// Start the text protocol server on stdin/stdout
    Console {
        #[arg(long, default_value_t = N_ITERATIONS)]
        iterations: usize,
        #[arg(long, default_value_t = PolicyKind::Random)]
        policy: PolicyKind,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Play one game between two policies
    Selfplay {
        #[arg(long, default_value_t = PolicyKind::Random)]
        red: PolicyKind,
        #[arg(long, default_value_t = PolicyKind::Random)]
        blue: PolicyKind,
        #[arg(long, default_value_t = N_ITERATIONS)]
        iterations: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 200)]
        max_plies: usize,
    },
}

fn rng_from(seed: Option<u64>) -> Rng {
    seed.map_or_else(Rng::new, Rng::with_seed)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Console {
            iterations,
            policy,
            seed,
        }) => {
            let mut engine = ConsoleEngine::with_settings(iterations, policy, rng_from(seed));
            engine.run().context("console I/O failed")?;
        }
        Some(Commands::Selfplay {
            red,
            blue,
            iterations,
            seed,
            max_plies,
        }) => run_selfplay(red, blue, iterations, rng_from(seed), max_plies)?,
        Some(Commands::Demo) | None => run_demo()?,
    }
    Ok(())
}

fn run_demo() -> Result<()> {
    println!("Draughts-MCTS: 10x10 draughts with Monte Carlo Tree Search\n");

    let game = Game::new();
    println!("{}", game.board());

    let iterations = 100;
    println!("Running {iterations} MCTS iterations for {}...", Color::Blue);
    let mut tree = SearchTree::new(&game);
    let mut rng = Rng::new();
    let best = tree_search(&mut tree, iterations, &mut RandomRollout::default(), &mut rng)?
        .context("no legal move in the starting position")?;

    println!("Best move: {best}");
    for child in tree.children(tree.root()) {
        if let Some(mv) = &child.mv {
            println!(
                "  {:<10} visits {:>4}  winrate {:.1}%",
                mv.to_string(),
                child.v,
                child.winrate() * 100.0
            );
        }
    }
    Ok(())
}

fn run_selfplay(
    red: PolicyKind,
    blue: PolicyKind,
    iterations: usize,
    mut rng: Rng,
    max_plies: usize,
) -> Result<()> {
    let mut game = Game::new();
    let mut red_policy = red.build();
    let mut blue_policy = blue.build();

    for ply in 0..max_plies {
        let Some(color) = game.to_move() else {
            break;
        };
        let policy = match color {
            Color::Red => red_policy.as_mut(),
            Color::Blue => blue_policy.as_mut(),
        };
        let mut tree = SearchTree::new(&game);
        let Some(mv) = tree_search(&mut tree, iterations, policy, &mut rng)? else {
            break;
        };
        game.apply(&mv)
            .with_context(|| format!("search produced an unplayable move {mv}"))?;
        info!("ply {ply}: {color} ({}) {mv}", policy.name());
    }

    println!("{}", game.board());
    match game.winner() {
        Some(winner) => {
            let kind = if winner == Color::Red { red } else { blue };
            println!("{winner} ({kind}) wins");
        }
        None => println!("unfinished after {max_plies} plies"),
    }
    Ok(())
}
