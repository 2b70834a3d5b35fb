use crate::cost::CostEstimator;
use crate::state::PartialSchedule;

/// Generates the children of search states. Two rules avoid generating states that are
/// equivalent to states that are generated elsewhere:
///
/// - *processor symmetry*: all empty processors are interchangeable, so a task is placed on
///   every processor that is already in use, and on the first empty processor only.
/// - *canonical order*: when two tasks don't constrain each other, the task with the smaller
///   index is added first. A task `l` is *removable* from a state if no successor of `l` is
///   scheduled and `l` is the last task on its processor. Adding task `t` on processor `q` is
///   skipped when a removable `l > t` exists on another processor than `q` that is not a
///   predecessor of `t`, since adding `t` before `l` gives exactly the same state.
///
/// Both rules depend only on the state itself (not on the path to it), so they combine safely
/// with the closed set: every complete schedule keeps at least one generation order.
#[derive(Debug, Clone, Copy)]
pub struct Expander<'e, 'g> {
	estimator: &'e CostEstimator<'g>,
}

impl<'e, 'g> Expander<'e, 'g> {
	pub fn new(estimator: &'e CostEstimator<'g>) -> Self {
		Self { estimator }
	}

	/// The tasks that are last on their processor (by start time, then index) and don't have
	/// any scheduled successors
	pub fn removable_tasks(&self, state: &PartialSchedule) -> Vec<usize> {
		let graph = self.estimator.graph();
		let mut last_on_processor: Vec<Option<usize>> = vec![None; state.num_processors()];
		for task in state.scheduled().iter() {
			let Some(processor) = state.get_processor(task) else { continue };
			let key = (state.get_start_time(task), task);
			match last_on_processor[processor] {
				Some(last) if (state.get_start_time(last), last) > key => {}
				_ => last_on_processor[processor] = Some(task),
			}
		}

		last_on_processor.into_iter().flatten().filter(|task| {
			graph.task(*task).get_successors().iter().all(|d| !state.is_scheduled(d.get_destination()))
		}).collect()
	}

	fn is_deferred(&self, state: &PartialSchedule, removable: &[usize], task: usize, processor: usize) -> bool {
		let predecessors = self.estimator.graph().predecessor_set(task);
		removable.iter().any(|other| {
			*other > task && state.get_processor(*other) != Some(processor) && !predecessors.contains(*other)
		})
	}

	/// All children of `state` that survive the symmetry rules. Every child schedules exactly
	/// one more task, at the earliest time it can start on its processor.
	pub fn children(&self, state: &PartialSchedule) -> Vec<PartialSchedule> {
		let graph = self.estimator.graph();
		let removable = self.removable_tasks(state);
		let num_processors = self.estimator.candidate_processors(state);

		let mut children = Vec::new();
		for task in self.estimator.available_tasks(state) {
			let weight = graph.task(task).get_weight();
			for processor in 0 .. num_processors {
				if self.is_deferred(state, &removable, task, processor) {
					continue;
				}
				let start = self.estimator.earliest_start_time(state, task, processor);
				children.push(state.with_task(task, weight, processor, start));
			}
		}
		children
	}
}
