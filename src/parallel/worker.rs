use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use tracing::{debug, info_span, trace, warn};

use crate::cost::CostEstimator;
use crate::graph::Time;
use crate::parallel::queue::{IDLE_POLL, WorkQueue};
use crate::search::{Cancellation, TerminationPolicy};
use crate::search::bound::BestBound;
use crate::search::closed::ClosedSet;
use crate::search::expander::Expander;
use crate::search::frontier::Frontier;
use crate::state::PartialSchedule;

/// Everything the workers of 1 parallel search share
pub struct SharedSearch<'a, 'g> {
	pub estimator: &'a CostEstimator<'g>,
	pub closed: &'a ClosedSet,
	pub bound: &'a BestBound,
	pub cancellation: &'a Cancellation,
	pub termination: TerminationPolicy,

	/// Raised when a worker found its first solution under `TerminationPolicy::FirstSolution`,
	/// or when a worker panicked
	pub halted: AtomicBool,

	/// Raised when a worker noticed that the search was cancelled
	pub interrupted: AtomicBool,
}

impl<'a, 'g> SharedSearch<'a, 'g> {
	pub fn new(
		estimator: &'a CostEstimator<'g>, closed: &'a ClosedSet, bound: &'a BestBound,
		cancellation: &'a Cancellation, termination: TerminationPolicy
	) -> Self {
		Self {
			estimator, closed, bound, cancellation, termination,
			halted: AtomicBool::new(false),
			interrupted: AtomicBool::new(false),
		}
	}

	pub fn should_stop(&self) -> bool {
		if self.halted.load(Ordering::Acquire) {
			return true;
		}
		if self.cancellation.is_cancelled() {
			self.interrupted.store(true, Ordering::Release);
			return true;
		}
		false
	}
}

/// Where a worker gets its states from, and where it puts the children
pub trait WorkSource {
	/// The next state to process, or `None` when this worker should stop
	fn next(&mut self, shared: &SharedSearch) -> Option<(Time, Arc<PartialSchedule>)>;

	fn push(&mut self, state: Arc<PartialSchedule>, f_cost: Time);

	/// Called after every state returned by `next` has been processed
	fn done(&mut self) {}
}

/// Static balancing: the worker owns its frontier, and stops when it runs dry
pub struct LocalSource {
	frontier: Frontier,
}

impl LocalSource {
	pub fn new(frontier: Frontier) -> Self {
		Self { frontier }
	}
}

impl WorkSource for LocalSource {
	fn next(&mut self, shared: &SharedSearch) -> Option<(Time, Arc<PartialSchedule>)> {
		if shared.should_stop() {
			return None;
		}
		self.frontier.pop()
	}

	fn push(&mut self, state: Arc<PartialSchedule>, f_cost: Time) {
		self.frontier.push(state, f_cost);
	}
}

/// Dynamic balancing: the worker pops from its own queue, and sends every child to the queue
/// of the next worker.
///
/// `in_flight` counts the states that are queued or being processed, by any worker. An empty
/// queue only means that the search is over when that count is 0.
pub struct SharedSource<'q> {
	id: usize,
	queues: &'q [WorkQueue],
	cursor: &'q AtomicUsize,
	in_flight: &'q AtomicUsize,
}

impl<'q> SharedSource<'q> {
	pub fn new(id: usize, queues: &'q [WorkQueue], cursor: &'q AtomicUsize, in_flight: &'q AtomicUsize) -> Self {
		Self { id, queues, cursor, in_flight }
	}
}

impl WorkSource for SharedSource<'_> {
	fn next(&mut self, shared: &SharedSearch) -> Option<(Time, Arc<PartialSchedule>)> {
		loop {
			if shared.should_stop() {
				return None;
			}
			if let Some(entry) = self.queues[self.id].pop_timeout(IDLE_POLL) {
				return Some(entry);
			}
			if self.in_flight.load(Ordering::Acquire) == 0 {
				return None;
			}
		}
	}

	fn push(&mut self, state: Arc<PartialSchedule>, f_cost: Time) {
		self.in_flight.fetch_add(1, Ordering::AcqRel);
		let target = self.cursor.fetch_add(1, Ordering::Relaxed) % self.queues.len();
		self.queues[target].push(state, f_cost);
	}

	fn done(&mut self) {
		self.in_flight.fetch_sub(1, Ordering::AcqRel);
	}
}

/// Raises the halt flag when the worker that owns it unwinds, so that the other workers stop
/// instead of waiting for work that will never come
pub struct PanicGuard<'s> {
	halted: &'s AtomicBool,
}

impl<'s> PanicGuard<'s> {
	pub fn new(halted: &'s AtomicBool) -> Self {
		Self { halted }
	}
}

impl Drop for PanicGuard<'_> {
	fn drop(&mut self) {
		if thread::panicking() {
			warn!("worker panicked, abandoning the search");
			self.halted.store(true, Ordering::Release);
		}
	}
}

/// Runs a best-first loop until `source` runs dry or the search is stopped. Returns the number
/// of states this worker opened.
pub fn run_worker<S: WorkSource>(id: usize, shared: &SharedSearch, mut source: S) -> u64 {
	let span = info_span!("worker", id);
	let _entered = span.enter();
	let _guard = PanicGuard::new(&shared.halted);

	let expander = Expander::new(shared.estimator);
	let mut opened = 0;
	let mut expanded = 0u64;
	while let Some((f_cost, state)) = source.next(shared) {
		if process(shared, &expander, &mut source, f_cost, &state, &mut opened) {
			expanded += 1;
		}
		source.done();
	}
	debug!(opened, expanded, "worker finished");
	opened
}

/// Returns true if `state` was expanded
fn process<S: WorkSource>(
	shared: &SharedSearch, expander: &Expander, source: &mut S,
	f_cost: Time, state: &Arc<PartialSchedule>, opened: &mut u64
) -> bool {
	if f_cost >= shared.bound.get() {
		return false;
	}
	if state.is_complete() {
		if shared.bound.try_improve(state) {
			debug!(makespan = state.maximum_finish_time(), "found a better schedule");
			if shared.termination == TerminationPolicy::FirstSolution {
				shared.halted.store(true, Ordering::Release);
			}
		}
		return false;
	}
	if !shared.closed.insert_if_absent(state) {
		return false;
	}

	trace!(f_cost, depth = state.scheduled_count(), "expanding state");
	let upper_bound = shared.bound.get();
	for child in expander.children(state) {
		if shared.closed.contains(&child) {
			continue;
		}
		let child_cost = shared.estimator.f_cost(&child);
		if child_cost >= upper_bound {
			continue;
		}
		source.push(Arc::new(child), child_cost);
		*opened += 1;
	}
	true
}
