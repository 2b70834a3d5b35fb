pub mod best_first;
pub mod bound;
pub mod branch_and_bound;
pub mod closed;
pub mod expander;
pub mod frontier;
pub mod greedy;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::info;

use crate::cost::CostEstimator;
use crate::error::SchedulerError;
use crate::graph::{TaskGraph, Time};
use crate::parallel::run_parallel;
use crate::state::{MAX_PROCESSORS, PartialSchedule};
use best_first::BestFirstSearch;
use branch_and_bound::DepthFirstSearch;
use closed::ClosedSet;

/// Lets the caller abandon a running search from another thread. Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
	stopped: Arc<AtomicBool>,
}

impl StopHandle {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn stop(&self) {
		self.stopped.store(true, Ordering::Release);
	}

	pub fn is_stopped(&self) -> bool {
		self.stopped.load(Ordering::Acquire)
	}
}

/// The stop handle of a search, combined with its optional deadline
#[derive(Clone, Debug)]
pub struct Cancellation {
	stop: StopHandle,
	deadline: Option<Instant>,
}

impl Cancellation {
	pub fn never() -> Self {
		Self { stop: StopHandle::new(), deadline: None }
	}

	/// A time limit that doesn't fit in an `Instant` means that there is no deadline
	pub fn new(stop: StopHandle, time_limit: Option<Duration>) -> Self {
		Self { stop, deadline: time_limit.and_then(|limit| Instant::now().checked_add(limit)) }
	}

	pub fn is_cancelled(&self) -> bool {
		if self.stop.is_stopped() {
			return true;
		}
		if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
			self.stop.stop();
			return true;
		}
		false
	}
}

/// How the parallel coordinator spreads states over its workers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Balancing {
	/// The seed states are dealt out once, and every worker keeps its own children
	Static,

	/// Every child is sent to the queue of the next worker, in round-robin order
	Dynamic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
	BestFirst,
	DepthFirst,
	Parallel(Balancing),
}

/// When a search is allowed to stop
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TerminationPolicy {
	/// Run until the bound proves that the best schedule is optimal
	#[default]
	Exhaustive,

	/// Stop as soon as any complete schedule is found. The result is only flagged as optimal
	/// when its makespan equals the lower bound of the empty schedule.
	FirstSolution,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
	pub processors: usize,
	pub cores: usize,
	pub strategy: Strategy,
	pub termination: TerminationPolicy,
	pub time_limit: Option<Duration>,
	pub stop: StopHandle,
}

impl SearchConfig {
	/// Uses best-first search on 1 core, and dynamic balancing on more cores
	pub fn new(processors: usize, cores: usize) -> Self {
		let strategy = if cores > 1 { Strategy::Parallel(Balancing::Dynamic) } else { Strategy::BestFirst };
		Self {
			processors,
			cores,
			strategy,
			termination: TerminationPolicy::default(),
			time_limit: None,
			stop: StopHandle::new(),
		}
	}

	pub fn with_strategy(mut self, strategy: Strategy) -> Self {
		self.strategy = strategy;
		self
	}

	pub fn with_termination(mut self, termination: TerminationPolicy) -> Self {
		self.termination = termination;
		self
	}

	pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
		self.time_limit = Some(time_limit);
		self
	}

	pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
		self.stop = stop;
		self
	}
}

impl Default for SearchConfig {
	fn default() -> Self {
		Self::new(1, 1)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledTask {
	/// Starts counting at 1
	pub processor: usize,
	pub start_time: Time,
}

#[derive(Clone, Debug)]
pub struct SearchStatistics {
	pub opened_states: u64,
	pub closed_states: usize,
	pub elapsed: Duration,
	pub workers: usize,
}

#[derive(Clone, Debug)]
pub struct ScheduleResult {
	/// The placement of every task, in the index order of the graph
	pub tasks: Vec<ScheduledTask>,
	pub makespan: Time,
	pub optimal: bool,
	pub statistics: SearchStatistics,
}

/// What every search engine hands back to `schedule_with`
pub struct SearchOutcome {
	pub state: Arc<PartialSchedule>,
	pub optimal: bool,
	pub opened: u64,
	pub closed: usize,
}

/// Computes a minimum-makespan schedule of `graph` on `processors` identical processors,
/// using `cores` threads
pub fn schedule(graph: &TaskGraph, processors: usize, cores: usize) -> Result<ScheduleResult, SchedulerError> {
	schedule_with(graph, &SearchConfig::new(processors, cores))
}

pub fn schedule_with(graph: &TaskGraph, config: &SearchConfig) -> Result<ScheduleResult, SchedulerError> {
	if config.processors == 0 || config.processors > MAX_PROCESSORS {
		return Err(SchedulerError::InvalidProcessorCount { count: config.processors, max: MAX_PROCESSORS });
	}
	if config.cores == 0 {
		return Err(SchedulerError::InvalidCoreCount);
	}

	let started = Instant::now();
	let estimator = CostEstimator::new(graph, config.processors);
	let cancellation = Cancellation::new(config.stop.clone(), config.time_limit);
	info!(
		graph = graph.get_name(), tasks = graph.num_tasks(), processors = config.processors,
		strategy = ?config.strategy, "scheduling"
	);

	let (outcome, workers) = match config.strategy {
		Strategy::BestFirst => {
			let closed = ClosedSet::new();
			(BestFirstSearch::new(&estimator, &closed, &cancellation).run(), 1)
		}
		Strategy::DepthFirst => {
			let search = DepthFirstSearch::new(&estimator, &cancellation).with_termination(config.termination);
			(search.run(), 1)
		}
		Strategy::Parallel(balancing) => {
			let outcome = run_parallel(&estimator, config.cores, balancing, config.termination, &cancellation);
			(outcome, config.cores)
		}
	};

	let state = &outcome.state;
	debug_assert!(state.is_complete());
	let tasks = (0 .. graph.num_tasks()).map(|task| ScheduledTask {
		processor: state.get_processor(task).map_or(0, |processor| processor + 1),
		start_time: state.get_start_time(task).unwrap_or(0),
	}).collect();
	let result = ScheduleResult {
		tasks,
		makespan: state.maximum_finish_time(),
		optimal: outcome.optimal,
		statistics: SearchStatistics {
			opened_states: outcome.opened,
			closed_states: outcome.closed,
			elapsed: started.elapsed(),
			workers,
		},
	};
	info!(
		makespan = result.makespan, optimal = result.optimal, opened = outcome.opened,
		closed = outcome.closed, elapsed = ?result.statistics.elapsed, "search finished"
	);
	Ok(result)
}
