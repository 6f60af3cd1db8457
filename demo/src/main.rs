//! CONCORD Distributed MAPF Solver — Demo CLI
//!
//! Runs one or all of the three grid reference scenarios.  Each scenario
//! builds a small multi-agent path finding instance, runs the distributed
//! conflict-based search to consensus with the round driver, and prints a
//! walk-through of the result.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- opposing-swap
//!   cargo run -p demo -- disjoint-trio
//!   cargo run -p demo -- shared-goal-deadlock

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use concord_ref_grid::scenarios::{disjoint_trio, opposing_swap, shared_goal_deadlock};

// ── CLI definition ────────────────────────────────────────────────────────────

/// CONCORD — distributed conflict-based search demo.
///
/// Each subcommand runs one or all of the three grid scenarios,
/// demonstrating conflict branching, solution consensus, and infeasibility
/// detection without a central coordinator.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "CONCORD grid reference scenario demo",
    long_about = "Runs CONCORD demo scenarios showing distributed constraint-tree\n\
                  search, conflict exchange, and termination by consensus."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three grid scenarios in sequence.
    RunAll,
    /// Scenario 1: Opposing Swap (two agents trade ends of a line).
    OpposingSwap,
    /// Scenario 2: Disjoint Trio (conflict-free root solution).
    DisjointTrio,
    /// Scenario 3: Shared-Goal Deadlock (consensus on infeasibility).
    SharedGoalDeadlock,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::OpposingSwap => run_opposing_swap(),
        Command::DisjointTrio => run_disjoint_trio(),
        Command::SharedGoalDeadlock => run_shared_goal_deadlock(),
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> concord_contracts::error::ConcordResult<()> {
    run_opposing_swap()?;
    run_disjoint_trio()?;
    run_shared_goal_deadlock()?;
    Ok(())
}

fn run_opposing_swap() -> concord_contracts::error::ConcordResult<()> {
    opposing_swap::run_scenario().map(|_| ())
}

fn run_disjoint_trio() -> concord_contracts::error::ConcordResult<()> {
    disjoint_trio::run_scenario().map(|_| ())
}

fn run_shared_goal_deadlock() -> concord_contracts::error::ConcordResult<()> {
    shared_goal_deadlock::run_scenario().map(|_| ())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("CONCORD — Distributed Multi-Agent Path Finding");
    println!("Grid Reference Demo");
    println!("==============================================");
    println!();
    println!("Per-round solver loop for every agent:");
    println!("  [1] Drain inbox: adopt better incumbents, mirror declared conflicts");
    println!("  [2] Pop the cheapest constraint-tree node from OPEN");
    println!("  [3] Valid node: declare it as the new incumbent to all peers");
    println!("  [4] Conflicting node: branch locally, send the mirror constraint");
    println!("  [5] Empty OPEN: declare exhaustion; all-exhausted agreement ends the run");
    println!();
}
