use std::sync::Arc;

use tracing::debug;

use crate::cost::CostEstimator;
use crate::graph::Time;
use crate::search::{Cancellation, SearchOutcome, TerminationPolicy};
use crate::search::closed::ClosedSet;
use crate::search::expander::Expander;
use crate::search::greedy::greedy_schedule;
use crate::state::PartialSchedule;

/// Depth-first branch-and-bound over an explicit stack. The best finish time found so far is
/// the cutoff: any state that can't finish strictly earlier is dropped. The frontier stays
/// small, but optimality is only proven once the stack is empty.
pub struct DepthFirstSearch<'a, 'g> {
	estimator: &'a CostEstimator<'g>,
	expander: Expander<'a, 'g>,
	cancellation: &'a Cancellation,
	termination: TerminationPolicy,
	closed: ClosedSet,
	stack: Vec<Arc<PartialSchedule>>,
	best: Arc<PartialSchedule>,
	best_finish_time: Time,
	opened: u64,
}

impl<'a, 'g> DepthFirstSearch<'a, 'g> {
	pub fn new(estimator: &'a CostEstimator<'g>, cancellation: &'a Cancellation) -> Self {
		let best = Arc::new(greedy_schedule(estimator));
		let best_finish_time = best.maximum_finish_time();
		Self {
			estimator,
			expander: Expander::new(estimator),
			cancellation,
			termination: TerminationPolicy::Exhaustive,
			closed: ClosedSet::new(),
			stack: Vec::new(),
			best,
			best_finish_time,
			opened: 0,
		}
	}

	pub fn with_termination(mut self, termination: TerminationPolicy) -> Self {
		self.termination = termination;
		self
	}

	fn finish(self, optimal: bool) -> SearchOutcome {
		debug!(
			makespan = self.best_finish_time, optimal, opened = self.opened,
			closed = self.closed.len(), "depth-first search finished"
		);
		SearchOutcome { state: self.best, optimal, opened: self.opened, closed: self.closed.len() }
	}

	pub fn run(mut self) -> SearchOutcome {
		let root = Arc::new(self.estimator.root());
		let lower_bound = self.estimator.f_cost(&root);
		if lower_bound < self.best_finish_time {
			self.stack.push(root);
			self.opened += 1;
		}

		while let Some(state) = self.stack.pop() {
			if self.cancellation.is_cancelled() {
				return self.finish(false);
			}
			// The cutoff may have dropped since this state was pushed
			if self.estimator.f_cost(&state) >= self.best_finish_time {
				continue;
			}
			if state.is_complete() {
				debug!(makespan = state.maximum_finish_time(), "found a better schedule");
				self.best_finish_time = state.maximum_finish_time();
				self.best = state;
				if self.termination == TerminationPolicy::FirstSolution {
					let optimal = self.best_finish_time <= lower_bound;
					return self.finish(optimal);
				}
				continue;
			}
			if !self.closed.insert_if_absent(&state) {
				continue;
			}

			let cutoff = self.best_finish_time;
			let mut children: Vec<(Time, PartialSchedule)> = self.expander.children(&state).into_iter()
				.filter(|child| child.maximum_finish_time() < cutoff)
				.map(|child| (self.estimator.f_cost(&child), child))
				.filter(|(f_cost, _)| *f_cost < cutoff)
				.collect();
			// The stack pops the last child first, which should be the most promising one
			children.sort_by(|a, b| b.0.cmp(&a.0));
			self.opened += children.len() as u64;
			self.stack.extend(children.into_iter().map(|(_, child)| Arc::new(child)));
		}

		self.finish(true)
	}
}
