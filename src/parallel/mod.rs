pub mod queue;
pub mod worker;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tracing::{info, warn};

use crate::cost::CostEstimator;
use crate::search::{Balancing, Cancellation, SearchOutcome, TerminationPolicy};
use crate::search::best_first::{BestFirstSearch, Seeded};
use crate::search::bound::BestBound;
use crate::search::closed::ClosedSet;
use crate::search::frontier::Frontier;
use queue::WorkQueue;
use worker::{LocalSource, SharedSearch, SharedSource, WorkSource, run_worker};

/// Spawns 1 scoped thread per source, and joins all of them. Returns the total number of
/// opened states, and whether any worker panicked.
fn run_workers<S: WorkSource + Send>(shared: &SharedSearch, sources: Vec<S>) -> (u64, bool) {
	thread::scope(|scope| {
		let handles: Vec<_> = sources.into_iter().enumerate().map(
			|(id, source)| scope.spawn(move || run_worker(id, shared, source))
		).collect();

		let mut opened = 0;
		let mut panicked = false;
		for handle in handles {
			match handle.join() {
				Ok(worker_opened) => opened += worker_opened,
				Err(_) => panicked = true,
			}
		}
		(opened, panicked)
	})
}

/// Searches for an optimal schedule using `cores` worker threads.
///
/// The sequential best-first search first grows a frontier of about `tasks * cores` states.
/// These states are dealt round-robin to the workers, which share the closed set and the
/// best bound.
pub fn run_parallel(
	estimator: &CostEstimator, cores: usize, balancing: Balancing,
	termination: TerminationPolicy, cancellation: &Cancellation
) -> SearchOutcome {
	let cores = cores.max(1);
	let closed = ClosedSet::new();
	let target = estimator.graph().num_tasks().max(1) * cores;
	let (states, incumbent, seed_opened) = match BestFirstSearch::new(estimator, &closed, cancellation).seed_frontier(target) {
		Seeded::Finished(outcome) => return outcome,
		Seeded::Frontier { states, incumbent, opened } => (states, incumbent, opened),
	};

	let root_bound = estimator.f_cost(&estimator.root());
	let bound = BestBound::with_incumbent(Arc::clone(&incumbent));
	let shared = SharedSearch::new(estimator, &closed, &bound, cancellation, termination);
	info!(workers = cores, seeds = states.len(), ?balancing, ?termination, "starting parallel search");

	let (worker_opened, panicked) = match balancing {
		Balancing::Static => {
			let mut frontiers: Vec<Frontier> = (0 .. cores).map(|_| Frontier::new()).collect();
			for (index, (f_cost, state)) in states.into_iter().enumerate() {
				frontiers[index % cores].push(state, f_cost);
			}
			let sources: Vec<LocalSource> = frontiers.into_iter().map(LocalSource::new).collect();
			run_workers(&shared, sources)
		}
		Balancing::Dynamic => {
			let queues: Vec<WorkQueue> = (0 .. cores).map(|_| WorkQueue::new()).collect();
			let cursor = AtomicUsize::new(0);
			let in_flight = AtomicUsize::new(states.len());
			for (index, (f_cost, state)) in states.into_iter().enumerate() {
				queues[index % cores].push(state, f_cost);
			}
			let sources: Vec<SharedSource> = (0 .. cores).map(
				|id| SharedSource::new(id, &queues, &cursor, &in_flight)
			).collect();
			run_workers(&shared, sources)
		}
	};

	let state = bound.best().unwrap_or(incumbent);
	let interrupted = shared.interrupted.load(Ordering::Acquire);
	let halted = shared.halted.load(Ordering::Acquire);
	let optimal = if panicked || interrupted {
		false
	} else if halted {
		state.maximum_finish_time() <= root_bound
	} else {
		true
	};
	if panicked {
		warn!("a worker panicked, so the result may not be optimal");
	}

	SearchOutcome { state, optimal, opened: seed_opened + worker_opened, closed: closed.len() }
}
