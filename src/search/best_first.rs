use std::sync::Arc;

use tracing::{debug, trace};

use crate::cost::CostEstimator;
use crate::graph::Time;
use crate::search::{Cancellation, SearchOutcome};
use crate::search::closed::ClosedSet;
use crate::search::expander::Expander;
use crate::search::frontier::Frontier;
use crate::search::greedy::greedy_schedule;
use crate::state::PartialSchedule;

enum Step {
	Expanded,
	Skipped,
	Solved(Arc<PartialSchedule>),
	Exhausted,
}

/// The result of `BestFirstSearch::seed_frontier`
pub enum Seeded {
	/// The search finished before the frontier became large enough
	Finished(SearchOutcome),

	/// The open states, in ascending f-cost order, together with the incumbent that bounds them
	Frontier {
		states: Vec<(Time, Arc<PartialSchedule>)>,
		incumbent: Arc<PartialSchedule>,
		opened: u64,
	},
}

/// Single-threaded A* over partial schedules. Since the f-cost is admissible and never
/// decreases along a path, the first complete state that is popped is optimal.
///
/// The search starts with the greedy list schedule as incumbent: states whose f-cost is not
/// below its makespan are never pushed, and when the frontier runs dry, the incumbent itself
/// is optimal.
pub struct BestFirstSearch<'a, 'g> {
	estimator: &'a CostEstimator<'g>,
	expander: Expander<'a, 'g>,
	closed: &'a ClosedSet,
	cancellation: &'a Cancellation,
	frontier: Frontier,
	incumbent: Arc<PartialSchedule>,
	opened: u64,
}

impl<'a, 'g> BestFirstSearch<'a, 'g> {
	pub fn new(estimator: &'a CostEstimator<'g>, closed: &'a ClosedSet, cancellation: &'a Cancellation) -> Self {
		let incumbent = Arc::new(greedy_schedule(estimator));
		let root = Arc::new(estimator.root());
		let mut frontier = Frontier::new();
		frontier.push(Arc::clone(&root), estimator.f_cost(&root));
		debug!(
			upper_bound = incumbent.maximum_finish_time(), lower_bound = estimator.f_cost(&root),
			"starting best-first search"
		);
		Self {
			estimator,
			expander: Expander::new(estimator),
			closed,
			cancellation,
			frontier,
			incumbent,
			opened: 1,
		}
	}

	pub fn incumbent(&self) -> &Arc<PartialSchedule> { &self.incumbent }

	fn upper_bound(&self) -> Time { self.incumbent.maximum_finish_time() }

	fn step(&mut self) -> Step {
		let Some((f_cost, state)) = self.frontier.pop() else {
			return Step::Exhausted;
		};
		if state.is_complete() {
			return Step::Solved(state);
		}
		// Every state that is still open is at least as expensive as the incumbent
		if f_cost >= self.upper_bound() {
			return Step::Exhausted;
		}
		if !self.closed.insert_if_absent(&state) {
			return Step::Skipped;
		}

		trace!(f_cost, depth = state.scheduled_count(), "expanding state");
		let upper_bound = self.upper_bound();
		for child in self.expander.children(&state) {
			if self.closed.contains(&child) {
				continue;
			}
			let child_cost = self.estimator.f_cost(&child);
			if child_cost >= upper_bound {
				continue;
			}
			self.frontier.push(Arc::new(child), child_cost);
			self.opened += 1;
		}
		Step::Expanded
	}

	fn finish(&self, state: Arc<PartialSchedule>, optimal: bool) -> SearchOutcome {
		debug!(
			makespan = state.maximum_finish_time(), optimal, opened = self.opened,
			closed = self.closed.len(), "best-first search finished"
		);
		SearchOutcome { state, optimal, opened: self.opened, closed: self.closed.len() }
	}

	pub fn run(mut self) -> SearchOutcome {
		loop {
			if self.cancellation.is_cancelled() {
				return self.finish(Arc::clone(&self.incumbent), false);
			}
			match self.step() {
				Step::Solved(state) => return self.finish(state, true),
				Step::Exhausted => return self.finish(Arc::clone(&self.incumbent), true),
				Step::Expanded | Step::Skipped => {}
			}
		}
	}

	/// Runs the search until the frontier holds at least `target` states, and then hands
	/// the frontier over. The expanded states stay in the closed set.
	pub fn seed_frontier(mut self, target: usize) -> Seeded {
		loop {
			if self.frontier.len() >= target {
				debug!(states = self.frontier.len(), opened = self.opened, "frontier seeded");
				return Seeded::Frontier {
					states: self.frontier.drain_in_order(),
					incumbent: self.incumbent,
					opened: self.opened,
				};
			}
			if self.cancellation.is_cancelled() {
				return Seeded::Finished(self.finish(Arc::clone(&self.incumbent), false));
			}
			match self.step() {
				Step::Solved(state) => return Seeded::Finished(self.finish(state, true)),
				Step::Exhausted => return Seeded::Finished(self.finish(Arc::clone(&self.incumbent), true)),
				Step::Expanded | Step::Skipped => {}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::TaskGraphBuilder;
	use crate::search::StopHandle;
	use crate::testing::{assert_valid_state, load_fixture};

	fn solve(name: &str, processors: usize) -> SearchOutcome {
		let graph = load_fixture(name);
		let estimator = CostEstimator::new(&graph, processors);
		let closed = ClosedSet::new();
		let outcome = BestFirstSearch::new(&estimator, &closed, &Cancellation::never()).run();
		assert_valid_state(&graph, &outcome.state);
		outcome
	}

	#[test]
	fn test_out_tree_7() {
		assert_eq!(40, solve("out-tree-7", 1).state.maximum_finish_time());
		assert_eq!(28, solve("out-tree-7", 2).state.maximum_finish_time());
		assert_eq!(27, solve("out-tree-7", 3).state.maximum_finish_time());
		assert_eq!(22, solve("out-tree-7", 4).state.maximum_finish_time());
	}

	#[test]
	fn test_series_parallel_9() {
		assert_eq!(55, solve("series-parallel-9", 2).state.maximum_finish_time());
		assert_eq!(55, solve("series-parallel-9", 4).state.maximum_finish_time());
	}

	#[test]
	fn test_random_10() {
		assert_eq!(51, solve("random-10", 1).state.maximum_finish_time());
		assert_eq!(50, solve("random-10", 2).state.maximum_finish_time());
		assert_eq!(50, solve("random-10", 3).state.maximum_finish_time());
		assert_eq!(50, solve("random-10", 4).state.maximum_finish_time());
	}

	#[test]
	fn test_out_tree_11() {
		let two = solve("out-tree-11", 2);
		assert_eq!(350, two.state.maximum_finish_time());
		assert!(two.optimal);
		assert!(two.opened >= two.closed as u64);
		assert_eq!(227, solve("out-tree-11", 4).state.maximum_finish_time());
	}

	#[test]
	fn test_empty_graph() {
		let graph = TaskGraphBuilder::new("empty").build().unwrap();
		let estimator = CostEstimator::new(&graph, 3);
		let closed = ClosedSet::new();
		let outcome = BestFirstSearch::new(&estimator, &closed, &Cancellation::never()).run();
		assert!(outcome.state.is_complete());
		assert_eq!(0, outcome.state.maximum_finish_time());
		assert!(outcome.optimal);
	}

	#[test]
	fn test_cancelled_search_returns_incumbent() {
		let graph = load_fixture("out-tree-11");
		let estimator = CostEstimator::new(&graph, 2);
		let closed = ClosedSet::new();
		let stop = StopHandle::new();
		stop.stop();
		let cancellation = Cancellation::new(stop, None);
		let outcome = BestFirstSearch::new(&estimator, &closed, &cancellation).run();
		assert!(!outcome.optimal);
		assert!(outcome.state.is_complete());
		assert!(outcome.state.maximum_finish_time() >= 350);
	}

	#[test]
	fn test_seed_frontier() {
		let graph = load_fixture("out-tree-11");
		let estimator = CostEstimator::new(&graph, 2);
		let closed = ClosedSet::new();
		let seeded = BestFirstSearch::new(&estimator, &closed, &Cancellation::never()).seed_frontier(20);
		let Seeded::Frontier { states, incumbent, opened } = seeded else {
			panic!("the search should not finish while seeding");
		};
		assert!(states.len() >= 20);
		assert!(opened >= states.len() as u64);
		assert!(!closed.is_empty());
		for window in states.windows(2) {
			assert!(window[0].0 <= window[1].0);
		}
		for (f_cost, _) in &states {
			assert!(*f_cost < incumbent.maximum_finish_time());
		}

		// A tiny graph is solved before the frontier can grow
		let tiny = load_fixture("out-tree-7");
		let tiny_estimator = CostEstimator::new(&tiny, 4);
		let tiny_closed = ClosedSet::new();
		let seeded = BestFirstSearch::new(&tiny_estimator, &tiny_closed, &Cancellation::never()).seed_frontier(1000);
		let Seeded::Finished(outcome) = seeded else {
			panic!("the search should have finished");
		};
		assert_eq!(22, outcome.state.maximum_finish_time());
		assert!(outcome.optimal);
	}
}
