//! # `sat_circuit`
//!
//! `sat_circuit` simulates, one clock tick at a time, a hardware DPLL SAT solver.
//! It parses CNF problems in DIMACS format, loads them into the circuit's clause
//! memory and runs the clock until the controller raises `done`.
//!
//! ## Usage
//!
//! ```sh
//! sat_circuit [GLOBAL_OPTIONS] [SUBCOMMAND]
//! ```
//!
//! -   `path`: If provided as the *only* argument (without a subcommand), it's treated as
//!     a path to a DIMACS .cnf file to be simulated.
//!
//! ### Subcommands
//!
//! 1.  **`file`**: `sat_circuit file --path <path_to_cnf_file> [OPTIONS]`
//! 2.  **`text`**: `sat_circuit text --input "1 -2 0 2 3 0" [OPTIONS]`
//! 3.  **`dir`**: `sat_circuit dir --path <directory> [OPTIONS]`
//! 4.  **`completions`**: `sat_circuit completions bash`
//!
//! ### Common Options
//!
//! -   `-d, --debug`: Print the instance size and chosen widths.
//! -   `-v`: Logging verbosity, repeatable. `RUST_LOG` overrides it.
//! -   `--verify <BOOL>`: Check the model against the clauses (default: `true`).
//! -   `--stats <BOOL>`: Print statistics (default: `true`).
//! -   `-p, --print-solution`: Print the model as a DIMACS `v` line.
//! -   `-t, --trace`: Print a per-tick trace.
//! -   `--clause-bits`, `--var-bits`, `--clause-size`: Circuit widths. Fitted to the
//!     instance when omitted.
//! -   `--max-ticks`: Tick budget.

mod command_line;

use clap::{CommandFactory, Parser};
use command_line::cli::{Cli, Commands, init_tracing, solve_dir, solve_file, solve_text};

/// Global allocator using `tikv-jemallocator`, which also provides the memory
/// statistics in the report.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() {
    let cli = Cli::parse();

    let result = match (cli.command, cli.path) {
        (Some(Commands::File { path, common }), _) => {
            init_tracing(&common);
            solve_file(&path, &common)
        }
        (Some(Commands::Text { input, common }), _) => {
            init_tracing(&common);
            solve_text(&input, &common)
        }
        (Some(Commands::Dir { path, common }), _) => {
            init_tracing(&common);
            solve_dir(&path, &common)
        }
        (Some(Commands::Completions { shell }), _) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
        (None, Some(path)) => {
            init_tracing(&cli.common);
            solve_file(&path, &cli.common)
        }
        (None, None) => Err(String::from(
            "No command provided. Use --help for more information.",
        )),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
