use std::time::Duration;

use clap::{Parser, ValueEnum};

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
	BestFirst,
	DepthFirst,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BalancingArg {
	Static,
	Dynamic,
}

fn parse_time_limit(raw: &str) -> Result<Duration, String> {
	let seconds: f64 = raw.parse().map_err(|_| format!("'{}' is not a number of seconds", raw))?;
	Duration::try_from_secs_f64(seconds).map_err(|error| format!("invalid time limit '{}': {}", raw, error))
}

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(version = VERSION)]
#[command(about = "Optimal task graph scheduler for identical processors", long_about = None)]
pub struct Args {
	/// The DOT file containing the task graph
	#[arg(required_unless_present = "generate")]
	pub input: Option<String>,

	/// The number of processors to schedule the tasks on
	#[arg(required_unless_present = "generate")]
	pub processors: Option<usize>,

	/// The number of threads used by the search. With more than 1, the strategy is ignored
	#[arg(short = 'p', long = "parallel", default_value_t = 1)]
	pub cores: usize,

	/// The output DOT file. Defaults to INPUT-output.dot
	#[arg(short, long)]
	pub output: Option<String>,

	/// The sequential search strategy
	#[arg(long, value_enum, default_value_t = StrategyArg::BestFirst)]
	pub strategy: StrategyArg,

	/// How the parallel search spreads states over its threads
	#[arg(long, value_enum, default_value_t = BalancingArg::Dynamic)]
	pub balancing: BalancingArg,

	/// Stop at the first complete schedule instead of proving optimality
	#[arg(long)]
	pub first_solution: bool,

	/// Give up after this many seconds, and output the best schedule found so far
	#[arg(long, value_parser = parse_time_limit)]
	pub time_limit: Option<Duration>,

	/// Print the schedule as a text Gantt chart
	#[arg(long)]
	pub gantt: bool,

	/// Log the progress of the search
	#[arg(short, long)]
	pub verbose: bool,

	/// Write a random task graph with this many tasks (to OUTPUT, or stdout) instead of scheduling
	#[arg(long)]
	pub generate: Option<usize>,

	/// The seed of the random graph generator
	#[arg(long, default_value_t = 0)]
	pub seed: u64,

	/// The probability of a dependency between any pair of generated tasks
	#[arg(long, default_value_t = 0.3)]
	pub density: f64,
}
