use crate::graph::{TaskGraph, Time};
use crate::state::PartialSchedule;

/// Computes admissible lower bounds on the makespan of every complete schedule that can be
/// reached from a given state.
///
/// The estimator has no mutable state, so a single instance is shared (by reference) between
/// the sequential engines and all parallel workers.
#[derive(Debug, Clone, Copy)]
pub struct CostEstimator<'g> {
	graph: &'g TaskGraph,
	num_processors: usize,
}

impl<'g> CostEstimator<'g> {
	pub fn new(graph: &'g TaskGraph, num_processors: usize) -> Self {
		debug_assert!(num_processors > 0);
		Self { graph, num_processors }
	}

	pub fn graph(&self) -> &'g TaskGraph { self.graph }

	pub fn num_processors(&self) -> usize { self.num_processors }

	/// The state in which nothing has been scheduled yet
	pub fn root(&self) -> PartialSchedule {
		PartialSchedule::empty(self.graph.num_tasks(), self.num_processors)
	}

	/// The f-cost of `state`: the maximum of all lower bounds. It is computed at most once per
	/// state. For complete states, it is exactly the makespan.
	pub fn f_cost(&self, state: &PartialSchedule) -> Time {
		state.cached_f_cost(|| {
			self.load_balance_bound(state)
				.max(self.bottom_level_bound(state))
				.max(self.data_ready_bound(state))
		})
	}

	/// All task weight plus the idle time committed so far, spread perfectly over the
	/// processors (rounded up).
	pub fn load_balance_bound(&self, state: &PartialSchedule) -> Time {
		let processors = self.num_processors as Time;
		(self.graph.total_weight() + state.idle_time() + processors - 1) / processors
	}

	/// The latest `start + bottom level` of the scheduled tasks
	pub fn bottom_level_bound(&self, state: &PartialSchedule) -> Time {
		state.scheduled().iter().map(
			|task| state.get_start_time(task).unwrap_or(0) + self.graph.bottom_level(task)
		).max().unwrap_or(0)
	}

	/// The latest `earliest start + bottom level` of the tasks that are available
	pub fn data_ready_bound(&self, state: &PartialSchedule) -> Time {
		self.available_tasks(state).map(
			|task| self.earliest_start_anywhere(state, task) + self.graph.bottom_level(task)
		).max().unwrap_or(0)
	}

	/// Returns true if and only if `task` is not scheduled, but all its predecessors are
	pub fn is_available(&self, state: &PartialSchedule, task: usize) -> bool {
		!state.is_scheduled(task) && self.graph.predecessor_set(task).is_subset(state.scheduled())
	}

	/// The tasks that could be scheduled next, in ascending index order
	pub fn available_tasks<'s>(&'s self, state: &'s PartialSchedule) -> impl Iterator<Item = usize> + 's {
		(0 .. self.graph.num_tasks()).filter(move |task| self.is_available(state, *task))
	}

	/// The earliest time at which the available `task` could start on `processor`: after the
	/// processor is free, and after the data of every predecessor has arrived
	pub fn earliest_start_time(&self, state: &PartialSchedule, task: usize, processor: usize) -> Time {
		let mut ready_time = state.get_processor_finish_time(processor);
		for dependency in self.graph.task(task).get_predecessors() {
			let predecessor = dependency.get_source();
			let Some(predecessor_processor) = state.get_processor(predecessor) else {
				debug_assert!(false, "predecessor {} of task {} is not scheduled", predecessor, task);
				continue;
			};
			let mut arrival = state.get_start_time(predecessor).unwrap_or(0) + self.graph.task(predecessor).get_weight();
			if predecessor_processor != processor {
				arrival += dependency.get_weight();
			}
			ready_time = Time::max(ready_time, arrival);
		}
		ready_time
	}

	/// The minimum of `earliest_start_time` over all processors. All empty processors are
	/// interchangeable, so only the first of them needs to be considered.
	pub fn earliest_start_anywhere(&self, state: &PartialSchedule, task: usize) -> Time {
		(0 .. self.candidate_processors(state)).map(
			|processor| self.earliest_start_time(state, task, processor)
		).min().unwrap_or(0)
	}

	/// The processors that new tasks should be tried on: every processor that already has a
	/// task, plus the first empty processor (if any)
	pub fn candidate_processors(&self, state: &PartialSchedule) -> usize {
		usize::min(state.processors_in_use() + 1, self.num_processors)
	}
}
