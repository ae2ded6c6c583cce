#![allow(clippy::cast_precision_loss)]

use clap::{ArgAction, Args, Parser, Subcommand};
use sat_circuit::circuit::configs::CircuitConfig;
use sat_circuit::circuit::dimacs::{Instance, parse_file, parse_str};
use sat_circuit::circuit::dpll::SolveResult;
use sat_circuit::circuit::simulation::{DEFAULT_MAX_TICKS, Outcome, Simulation};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tikv_jemalloc_ctl::{epoch, stats};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Defines the command-line interface for the circuit simulator.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(
    name = "sat_circuit",
    version,
    about = "Cycle-accurate simulation of a DPLL SAT solving circuit"
)]
pub(crate) struct Cli {
    /// An optional global path argument. If provided without a subcommand,
    /// it's treated as the path to a DIMACS .cnf file to solve.
    #[arg(global = true)]
    pub path: Option<PathBuf>,

    /// Specifies the subcommand to execute (e.g. `file`, `text`, `dir`).
    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Common options applicable to all commands.
    #[command(flatten)]
    pub common: CommonOptions,
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Simulate a CNF file in DIMACS format.
    File {
        /// Path to the DIMACS .cnf file.
        #[arg(long)]
        path: PathBuf,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Simulate a CNF formula provided as plain text.
    Text {
        /// Literal CNF input as a string (e.g. "1 -2 0\n2 3 0").
        /// Literals are space-separated and 0 terminates a clause.
        #[arg(short, long)]
        input: String,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Simulate every `.cnf` file below a directory.
    Dir {
        /// Path to the directory.
        #[arg(long)]
        path: PathBuf,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Defines common command-line options shared across different subcommands.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Enable debug output, including the circuit's widths and each mode transition.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Logging verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub(crate) verbose: u8,

    /// Check a found model against the original clauses.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) verify: bool,

    /// Print problem and circuit statistics after the run.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) stats: bool,

    /// Print the satisfying assignment if there is one.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    /// Print a per-tick trace of the controller and the propagation engine.
    #[arg(short, long, default_value_t = false)]
    pub(crate) trace: bool,

    /// Clause address width. Fitted to the instance when omitted.
    #[arg(long)]
    pub(crate) clause_bits: Option<u32>,

    /// Variable id width. Fitted to the instance when omitted.
    #[arg(long)]
    pub(crate) var_bits: Option<u32>,

    /// Literal slots per clause. Fitted to the instance when omitted.
    #[arg(long)]
    pub(crate) clause_size: Option<usize>,

    /// Give up after this many clock ticks.
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    pub(crate) max_ticks: u64,
}

impl CommonOptions {
    /// The widths to build the circuit with. Any width not given on the
    /// command line is taken from the fitted configuration.
    fn config(&self, instance: &Instance) -> Result<CircuitConfig, String> {
        let fitted = instance.fit().map_err(|e| e.to_string())?;
        if self.clause_bits.is_none() && self.var_bits.is_none() && self.clause_size.is_none() {
            return Ok(fitted);
        }
        CircuitConfig::new(
            self.clause_bits.unwrap_or_else(|| fitted.clause_bits()),
            self.var_bits.unwrap_or_else(|| fitted.var_bits()),
            self.clause_size.unwrap_or_else(|| fitted.clause_size()),
        )
        .map_err(|e| e.to_string())
    }

    const fn log_filter(&self) -> &'static str {
        match (self.verbose, self.debug) {
            (0, false) => "warn",
            (0 | 1, _) => "info",
            (2, _) => "debug",
            _ => "trace",
        }
    }
}

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the
/// verbosity flags.
pub(crate) fn init_tracing(common: &CommonOptions) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(common.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses a DIMACS file and reports on it.
pub(crate) fn solve_file(path: &Path, common: &CommonOptions) -> Result<(), String> {
    let time = std::time::Instant::now();
    let instance = parse_file(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let elapsed = time.elapsed();

    solve_and_report(&instance, common, Some(path), elapsed)
}

/// Parses in-memory DIMACS text and reports on it.
pub(crate) fn solve_text(input: &str, common: &CommonOptions) -> Result<(), String> {
    let time = std::time::Instant::now();
    let instance = parse_str(input).map_err(|e| e.to_string())?;
    let elapsed = time.elapsed();

    solve_and_report(&instance, common, None, elapsed)
}

/// Solves a directory of CNF files.
/// This function walks every `.cnf` file below the directory, parses each
/// file, simulates it, and reports the results.
///
/// # Arguments
/// * `path` - The path to the directory containing CNF files.
/// * `common` - Common options such as verification and statistics.
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) -> Result<(), String> {
    if !path.is_dir() {
        return Err(format!("Provided path is not a directory: {}", path.display()));
    }

    for entry in walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let file_path = entry.path();
        if !file_path.is_file() {
            continue;
        }

        if file_path.extension().is_none_or(|ext| ext != "cnf") {
            eprintln!("Skipping non-CNF file: {}", file_path.display());
            continue;
        }

        solve_file(file_path, common)?;
    }

    Ok(())
}

/// Builds the circuit for `instance`, runs it and prints the report.
///
/// # Arguments
/// * `instance` - The parsed CNF instance.
/// * `common` - Widths, tick budget and reporting options.
/// * `label` - An optional label for the problem (e.g. file path).
/// * `parse_time` - The time taken to parse the input.
pub(crate) fn solve_and_report(
    instance: &Instance,
    common: &CommonOptions,
    label: Option<&Path>,
    parse_time: Duration,
) -> Result<(), String> {
    if let Some(name) = label {
        println!("Solving: {}", name.display());
    }

    let config = common.config(instance)?;
    if common.debug {
        println!("Variables: {}", instance.num_vars);
        println!("Clauses: {}", instance.clauses.len());
        println!(
            "Widths: C={} V={} K={} ({}-bit clause words)",
            config.clause_bits(),
            config.var_bits(),
            config.clause_size(),
            config.word_bits()
        );
    }

    let mut simulation = Simulation::from_instance(instance, Some(config)).map_err(|e| e.to_string())?;
    if common.trace {
        simulation = simulation.with_trace();
    }

    let _ = epoch::advance();
    let time = std::time::Instant::now();
    let outcome = simulation.run(common.max_ticks).map_err(|e| e.to_string())?;
    let elapsed = time.elapsed();
    debug!(?elapsed, ticks = outcome.ticks, "simulation finished");

    if let Some(trace) = simulation.trace() {
        print!("{}", trace.render());
    }

    if common.verify {
        verify_solution(instance, &outcome)?;
    }

    if common.stats {
        let (allocated, resident) = memory_usage().unwrap_or((0.0, 0.0));
        print_stats(parse_time, elapsed, instance, &config, &outcome, allocated, resident);
    }

    if common.print_solution {
        if let Some(model) = &outcome.model {
            let values = (1..=instance.num_vars)
                .map(|v| {
                    let value = model.get(v).unwrap_or(false);
                    format!("{}{v}", if value { "" } else { "-" })
                })
                .collect::<Vec<_>>();
            println!("v {} 0", values.join(" "));
        }
    }

    println!("\n{}", outcome.result);
    Ok(())
}

/// Checks a found model against the instance.
///
/// # Errors
/// If the circuit reported SAT with a model that falsifies a clause.
pub(crate) fn verify_solution(instance: &Instance, outcome: &Outcome) -> Result<(), String> {
    match (&outcome.model, outcome.result) {
        (Some(model), _) => {
            let ok = instance.verify(model);
            println!("Verified: {ok:?}");
            if ok {
                Ok(())
            } else {
                Err(String::from("Solution failed verification!"))
            }
        }
        (None, SolveResult::Unsat) => {
            println!("UNSAT");
            Ok(())
        }
        (None, result) => Err(format!("No model for result {result}")),
    }
}

/// Allocated and resident memory in MiB, as reported by jemalloc.
fn memory_usage() -> Option<(f64, f64)> {
    epoch::advance().ok()?;
    let allocated = stats::allocated::mib().ok()?.read().ok()?;
    let resident = stats::resident::mib().ok()?.read().ok()?;
    Some((
        allocated as f64 / (1024.0 * 1024.0),
        resident as f64 / (1024.0 * 1024.0),
    ))
}

/// Helper function to print a single statistic line in a formatted table row.
///
/// # Arguments
/// * `label` - The description of the statistic.
/// * `value` - The value of the statistic, implementing `std::fmt::Display`.
pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Helper function to print a statistic line that includes a rate (value/second).
///
/// # Arguments
/// * `label` - The description of the statistic.
/// * `value` - The raw count for the statistic.
/// * `elapsed` - The elapsed time in seconds, used to calculate the rate.
pub(crate) fn stat_line_with_rate(label: &str, value: u64, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints a summary of problem and circuit statistics.
pub(crate) fn print_stats(
    parse_time: Duration,
    elapsed: Duration,
    instance: &Instance,
    config: &CircuitConfig,
    outcome: &Outcome,
    allocated: f64,
    resident: f64,
) {
    let elapsed_secs = elapsed.as_secs_f64();
    let s = &outcome.stats;

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", instance.num_vars);
    stat_line("Clauses", instance.clauses.len());
    stat_line("Literals", instance.num_literals());
    stat_line("Clause address bits (C)", config.clause_bits());
    stat_line("Variable id bits (V)", config.var_bits());
    stat_line("Clause size (K)", config.clause_size());

    println!("========================[ Circuit Statistics ]========================");
    stat_line_with_rate("Ticks", s.ticks, elapsed_secs);
    stat_line_with_rate("Decisions", s.decisions, elapsed_secs);
    stat_line_with_rate("Implications", s.implications, elapsed_secs);
    stat_line_with_rate("Conflicts", s.conflicts, elapsed_secs);
    stat_line("Flips", s.flips);
    stat_line("Sweeps", s.sweeps);
    stat_line("Pops", s.pops);
    stat_line("Backtracks", s.backtracks);
    stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
    stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> CommonOptions {
        CommonOptions {
            verify: true,
            stats: false,
            max_ticks: DEFAULT_MAX_TICKS,
            ..CommonOptions::default()
        }
    }

    #[test]
    fn test_parse_bare_path() {
        let cli = Cli::try_parse_from(["sat_circuit", "problem.cnf"]).unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("problem.cnf")));
        assert!(cli.command.is_none());
        assert!(cli.common.verify);
        assert_eq!(cli.common.max_ticks, DEFAULT_MAX_TICKS);
    }

    #[test]
    fn test_parse_widths_and_verbosity() {
        let cli = Cli::try_parse_from([
            "sat_circuit",
            "text",
            "--input",
            "1 0",
            "--var-bits",
            "4",
            "-vv",
            "--stats",
            "false",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Text { input, common }) => {
                assert_eq!(input, "1 0");
                assert_eq!(common.var_bits, Some(4));
                assert_eq!(common.verbose, 2);
                assert!(!common.stats);
                assert_eq!(common.log_filter(), "debug");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_log_filter() {
        let mut common = options();
        assert_eq!(common.log_filter(), "warn");
        common.debug = true;
        assert_eq!(common.log_filter(), "info");
        common.verbose = 3;
        assert_eq!(common.log_filter(), "trace");
    }

    #[test]
    fn test_config_overrides_fitted_widths() {
        let instance = parse_str("1 -2 0\n3 0\n").unwrap();
        let mut common = options();
        assert_eq!(common.config(&instance).unwrap(), instance.fit().unwrap());

        common.var_bits = Some(5);
        let config = common.config(&instance).unwrap();
        assert_eq!(config.var_bits(), 5);
        assert_eq!(config.clause_size(), 2);

        common.var_bits = Some(0);
        assert!(common.config(&instance).is_err());
    }

    #[test]
    fn test_solve_text_reports() {
        assert!(solve_text("1 0\n-1 2 0\n", &options()).is_ok());
        assert!(solve_text("1 0\n-1 0\n", &options()).is_ok());
        assert!(solve_text("1 x 0\n", &options()).is_err());
    }

    #[test]
    fn test_budget_is_an_error() {
        let common = CommonOptions {
            max_ticks: 2,
            ..options()
        };
        let err = solve_text("1 2 0\n-1 2 0\n", &common).unwrap_err();
        assert!(err.contains("did not terminate"));
    }

    #[test]
    fn test_solve_dir_rejects_file() {
        assert!(solve_dir(Path::new("Cargo.toml"), &options()).is_err());
    }
}
