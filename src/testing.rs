use std::collections::HashMap;
use std::fs;

use crate::cost::CostEstimator;
use crate::graph::{TaskGraph, Time};
use crate::graph::generator::GeneratorConfig;
use crate::graph::parser::parse_graph;
use crate::search::ScheduleResult;
use crate::state::PartialSchedule;

pub fn load_fixture(name: &str) -> TaskGraph {
	let path = format!("./test-graphs/{}.dot", name);
	let text = fs::read_to_string(&path).unwrap_or_else(|error| panic!("failed to read {}: {}", path, error));
	parse_graph(&text).unwrap()
}

/// Random graphs whose tasks and dependencies may have weight 0, so that several tasks can
/// start at the same time on the same processor
pub fn zero_weight_config(num_tasks: usize, density: f64, seed: u64) -> GeneratorConfig {
	GeneratorConfig {
		min_task_weight: 0,
		max_task_weight: 3,
		min_communication: 0,
		max_communication: 3,
		..GeneratorConfig::new(num_tasks, density, seed)
	}
}

fn explore(
	estimator: &CostEstimator, state: &PartialSchedule,
	memo: &mut HashMap<PartialSchedule, Time>, visited: &mut Vec<(PartialSchedule, Time)>
) -> Time {
	if state.is_complete() {
		return state.maximum_finish_time();
	}
	if let Some(optimum) = memo.get(state) {
		return *optimum;
	}

	let graph = estimator.graph();
	let mut optimum = Time::MAX;
	let available: Vec<usize> = estimator.available_tasks(state).collect();
	for task in available {
		for processor in 0 .. estimator.num_processors() {
			let start = estimator.earliest_start_time(state, task, processor);
			let child = state.with_task(task, graph.task(task).get_weight(), processor, start);
			optimum = optimum.min(explore(estimator, &child, memo, visited));
		}
	}
	memo.insert(state.clone(), optimum);
	visited.push((state.clone(), optimum));
	optimum
}

/// Every incomplete state that is reachable from the root without any pruning, together with
/// the smallest makespan of a complete schedule that extends it
pub fn all_reachable_optima(estimator: &CostEstimator) -> Vec<(PartialSchedule, Time)> {
	let mut visited = Vec::new();
	explore(estimator, &estimator.root(), &mut HashMap::new(), &mut visited);
	visited
}

pub fn brute_force_makespan(estimator: &CostEstimator) -> Time {
	let root = estimator.root();
	if root.is_complete() {
		return 0;
	}
	explore(estimator, &root, &mut HashMap::new(), &mut Vec::new())
}

pub fn assert_valid_state(graph: &TaskGraph, state: &PartialSchedule) {
	assert!(state.is_complete(), "schedule is incomplete");
	let placements: Vec<(usize, Time)> = (0 .. graph.num_tasks()).map(
		|task| (state.get_processor(task).unwrap(), state.get_start_time(task).unwrap())
	).collect();
	assert_valid_placements(graph, &placements);
	let finish = (0 .. graph.num_tasks()).map(
		|task| placements[task].1 + graph.task(task).get_weight()
	).max().unwrap_or(0);
	assert_eq!(finish, state.maximum_finish_time());
}

pub fn assert_valid_schedule(graph: &TaskGraph, result: &ScheduleResult) {
	assert_eq!(graph.num_tasks(), result.tasks.len());
	let placements: Vec<(usize, Time)> = result.tasks.iter().map(|task| {
		assert!(task.processor >= 1, "processors should be 1-indexed");
		(task.processor - 1, task.start_time)
	}).collect();
	assert_valid_placements(graph, &placements);
	let finish = (0 .. graph.num_tasks()).map(
		|task| placements[task].1 + graph.task(task).get_weight()
	).max().unwrap_or(0);
	assert_eq!(finish, result.makespan);
}

fn assert_valid_placements(graph: &TaskGraph, placements: &[(usize, Time)]) {
	for dependency in graph.dependencies() {
		let (source_processor, source_start) = placements[dependency.get_source()];
		let (destination_processor, destination_start) = placements[dependency.get_destination()];
		let mut ready = source_start + graph.task(dependency.get_source()).get_weight();
		if source_processor != destination_processor {
			ready += dependency.get_weight();
		}
		assert!(
			destination_start >= ready, "task {} starts at {}, but its data from task {} is only ready at {}",
			dependency.get_destination(), destination_start, dependency.get_source(), ready
		);
	}

	for first in 0 .. placements.len() {
		assert!(placements[first].1 >= 0);
		for second in first + 1 .. placements.len() {
			if placements[first].0 != placements[second].0 {
				continue;
			}
			let first_end = placements[first].1 + graph.task(first).get_weight();
			let second_end = placements[second].1 + graph.task(second).get_weight();
			let overlaps = placements[first].1 < second_end && placements[second].1 < first_end;
			let zero_weight = graph.task(first).get_weight() == 0 || graph.task(second).get_weight() == 0;
			assert!(
				!overlaps || zero_weight,
				"tasks {} and {} overlap on processor {}", first, second, placements[first].0
			);
		}
	}
}
