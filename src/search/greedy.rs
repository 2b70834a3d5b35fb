use crate::cost::CostEstimator;
use crate::state::PartialSchedule;

/// A list schedule: repeatedly takes the available task with the largest bottom level (ties go
/// to the smaller index), and puts it on the processor where it can start earliest (ties go to
/// the lower processor).
///
/// The result is a complete, valid schedule, but generally not an optimal one. The exact
/// searches use its makespan as their initial upper bound, and return it when they are
/// cancelled before finding anything better.
pub fn greedy_schedule(estimator: &CostEstimator) -> PartialSchedule {
	let graph = estimator.graph();
	let mut state = estimator.root();

	while !state.is_complete() {
		let next_task = estimator.available_tasks(&state).min_by_key(
			|task| (-graph.bottom_level(*task), *task)
		);
		let Some(task) = next_task else { break };

		let processor = (0 .. estimator.candidate_processors(&state)).min_by_key(
			|processor| estimator.earliest_start_time(&state, task, *processor)
		).unwrap_or(0);
		let start = estimator.earliest_start_time(&state, task, processor);
		state = state.with_task(task, graph.task(task).get_weight(), processor, start);
	}

	debug_assert!(state.is_complete());
	state
}
