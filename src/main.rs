mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Args, BalancingArg, StrategyArg};
use optimal_scheduler::graph::generator::{GeneratorConfig, generate_random_graph};
use optimal_scheduler::graph::parser::parse_graph_file;
use optimal_scheduler::graph::writer::{write_file, write_graph, write_schedule};
use optimal_scheduler::render::render_gantt;
use optimal_scheduler::{Balancing, SchedulerError, SearchConfig, Strategy, TerminationPolicy, schedule_with};

fn init_logging(verbose: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
	};
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn default_output(input: &str) -> String {
	match input.strip_suffix(".dot") {
		Some(stem) => format!("{}-output.dot", stem),
		None => format!("{}-output.dot", input),
	}
}

fn generate(args: &Args, num_tasks: usize) -> Result<(), SchedulerError> {
	let graph = generate_random_graph(&GeneratorConfig::new(num_tasks, args.density, args.seed))?;
	let contents = write_graph(&graph);
	match &args.output {
		Some(output) => {
			write_file(output, &contents)?;
			info!(output = output.as_str(), tasks = num_tasks, "wrote random graph");
		}
		None => print!("{}", contents),
	}
	Ok(())
}

fn run(args: &Args, input: &str, processors: usize) -> Result<(), SchedulerError> {
	let graph = parse_graph_file(input)?;
	println!(
		"Found {} tasks and {} dependencies, scheduling on {} processors using {} cores",
		graph.num_tasks(), graph.dependencies().len(), processors, args.cores
	);

	let strategy = if args.cores > 1 {
		Strategy::Parallel(match args.balancing {
			BalancingArg::Static => Balancing::Static,
			BalancingArg::Dynamic => Balancing::Dynamic,
		})
	} else {
		match args.strategy {
			StrategyArg::BestFirst => Strategy::BestFirst,
			StrategyArg::DepthFirst => Strategy::DepthFirst,
		}
	};
	let termination = if args.first_solution { TerminationPolicy::FirstSolution } else { TerminationPolicy::Exhaustive };
	let mut config = SearchConfig::new(processors, args.cores).with_strategy(strategy).with_termination(termination);
	if let Some(time_limit) = args.time_limit {
		config = config.with_time_limit(time_limit);
	}

	let result = schedule_with(&graph, &config)?;
	let verdict = if result.optimal { "optimal" } else { "best found" };
	println!("Makespan: {} ({})", result.makespan, verdict);
	println!(
		"Opened {} states and closed {} states in {:.3}s using {} workers",
		result.statistics.opened_states, result.statistics.closed_states,
		result.statistics.elapsed.as_secs_f64(), result.statistics.workers
	);
	if args.gantt {
		print!("{}", render_gantt(&graph, &result));
	}

	let output = args.output.clone().unwrap_or_else(|| default_output(input));
	write_file(&output, &write_schedule(&graph, &result))?;
	println!("Wrote schedule to {}", output);
	Ok(())
}

fn main() -> ExitCode {
	let args = Args::parse();
	init_logging(args.verbose);

	let outcome = match (args.generate, args.input.as_deref(), args.processors) {
		(Some(num_tasks), _, _) => generate(&args, num_tasks),
		(None, Some(input), Some(processors)) => run(&args, input, processors),
		// clap requires both positional arguments when not generating
		_ => Ok(()),
	};

	match outcome {
		Ok(()) => ExitCode::SUCCESS,
		Err(failure) => {
			error!("{}", failure);
			ExitCode::FAILURE
		}
	}
}
