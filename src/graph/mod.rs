pub mod generator;
pub mod parser;
pub mod writer;

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::error::GraphError;
use crate::task_set::TaskSet;

pub type Time = i64;

/// Task indices must fit in a byte, so a graph can hold at most this many tasks.
pub const MAX_TASKS: usize = 256;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Dependency {
	source: usize,
	destination: usize,
	weight: Time,
}

impl Dependency {
	pub fn new(source: usize, destination: usize, weight: Time) -> Dependency {
		Dependency { source, destination, weight }
	}

	pub fn get_source(&self) -> usize { self.source }

	pub fn get_destination(&self) -> usize { self.destination }

	/// The communication cost, which is only paid when the source and destination run on
	/// different processors.
	pub fn get_weight(&self) -> Time { self.weight }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Task {
	id: String,
	index: usize,
	weight: Time,
	predecessors: Vec<Dependency>,
	successors: Vec<Dependency>,
}

impl Task {
	pub fn get_id(&self) -> &str { &self.id }

	pub fn get_index(&self) -> usize { self.index }

	pub fn get_weight(&self) -> Time { self.weight }

	/// The incoming dependencies, sorted by source index
	pub fn get_predecessors(&self) -> &[Dependency] { &self.predecessors }

	/// The outgoing dependencies, sorted by destination index
	pub fn get_successors(&self) -> &[Dependency] { &self.successors }
}

/// An immutable, validated task graph. Task indices follow a deterministic topological order,
/// so every predecessor of a task has a smaller index than the task itself.
#[derive(Debug, Clone)]
pub struct TaskGraph {
	name: String,
	tasks: Vec<Task>,
	dependencies: Vec<Dependency>,
	index_by_id: HashMap<String, usize>,
	total_weight: Time,
	bottom_levels: Vec<Time>,
	predecessor_sets: Vec<TaskSet>,
}

impl TaskGraph {
	pub fn get_name(&self) -> &str { &self.name }

	pub fn num_tasks(&self) -> usize { self.tasks.len() }

	pub fn is_empty(&self) -> bool { self.tasks.is_empty() }

	pub fn tasks(&self) -> &[Task] { &self.tasks }

	pub fn task(&self, index: usize) -> &Task { &self.tasks[index] }

	/// All dependencies, in the order in which they were declared
	pub fn dependencies(&self) -> &[Dependency] { &self.dependencies }

	pub fn find_task(&self, id: &str) -> Option<usize> {
		self.index_by_id.get(id).copied()
	}

	/// The sum of the weights of all tasks
	pub fn total_weight(&self) -> Time { self.total_weight }

	/// The length of the longest path from `task` to any sink, counting task weights only
	pub fn bottom_level(&self, task: usize) -> Time { self.bottom_levels[task] }

	/// The set of direct predecessors of `task`
	pub fn predecessor_set(&self, task: usize) -> &TaskSet { &self.predecessor_sets[task] }
}

/// Collects tasks and dependencies, and validates them in `build()`. Dependencies may refer to
/// tasks that are added later.
#[derive(Debug, Clone, Default)]
pub struct TaskGraphBuilder {
	name: String,
	ids: Vec<String>,
	weights: Vec<Time>,
	declared: HashMap<String, usize>,
	edges: Vec<(String, String, Time)>,
}

impl TaskGraphBuilder {
	pub fn new(name: &str) -> Self {
		Self { name: name.to_string(), ..Self::default() }
	}

	pub fn set_name(&mut self, name: &str) {
		self.name = name.to_string();
	}

	pub fn add_task(&mut self, id: &str, weight: Time) -> Result<(), GraphError> {
		if self.declared.contains_key(id) {
			return Err(GraphError::DuplicateTask(id.to_string()));
		}
		if weight < 0 {
			return Err(GraphError::NegativeWeight { item: format!("task '{}'", id), weight });
		}
		self.declared.insert(id.to_string(), self.ids.len());
		self.ids.push(id.to_string());
		self.weights.push(weight);
		Ok(())
	}

	pub fn add_dependency(&mut self, source: &str, destination: &str, weight: Time) -> Result<(), GraphError> {
		if weight < 0 {
			return Err(GraphError::NegativeWeight {
				item: format!("dependency '{}' -> '{}'", source, destination), weight
			});
		}
		self.edges.push((source.to_string(), destination.to_string(), weight));
		Ok(())
	}

	pub fn build(self) -> Result<TaskGraph, GraphError> {
		let num_tasks = self.ids.len();
		if num_tasks > MAX_TASKS {
			return Err(GraphError::TooManyTasks { count: num_tasks, max: MAX_TASKS });
		}

		let mut raw_edges = Vec::with_capacity(self.edges.len());
		let mut seen_edges = HashSet::with_capacity(self.edges.len());
		for (source, destination, weight) in &self.edges {
			let source_index = *self.declared.get(source)
				.ok_or_else(|| GraphError::UnknownTask(source.clone()))?;
			let destination_index = *self.declared.get(destination)
				.ok_or_else(|| GraphError::UnknownTask(destination.clone()))?;
			if source_index == destination_index {
				return Err(GraphError::Cycle(source.clone()));
			}
			if !seen_edges.insert((source_index, destination_index)) {
				return Err(GraphError::DuplicateDependency {
					from: source.clone(), to: destination.clone()
				});
			}
			raw_edges.push((source_index, destination_index, *weight));
		}

		let order = self.topological_order(&raw_edges)?;
		let mut new_index = vec![0; num_tasks];
		for (index, declared_index) in order.iter().enumerate() {
			new_index[*declared_index] = index;
		}

		let mut tasks: Vec<Task> = order.iter().enumerate().map(|(index, declared_index)| Task {
			id: self.ids[*declared_index].clone(),
			index,
			weight: self.weights[*declared_index],
			predecessors: Vec::new(),
			successors: Vec::new(),
		}).collect();

		let dependencies: Vec<Dependency> = raw_edges.iter().map(|(source, destination, weight)| {
			Dependency::new(new_index[*source], new_index[*destination], *weight)
		}).collect();
		for dependency in &dependencies {
			tasks[dependency.get_source()].successors.push(*dependency);
			tasks[dependency.get_destination()].predecessors.push(*dependency);
		}
		for task in &mut tasks {
			task.predecessors.sort_by_key(|d| d.get_source());
			task.successors.sort_by_key(|d| d.get_destination());
		}

		let mut bottom_levels = vec![0; num_tasks];
		for task in tasks.iter().rev() {
			let longest_tail = task.successors.iter()
				.map(|d| bottom_levels[d.get_destination()])
				.max().unwrap_or(0);
			bottom_levels[task.index] = task.weight + longest_tail;
		}

		let predecessor_sets = tasks.iter().map(
			|task| task.predecessors.iter().map(|d| d.get_source()).collect()
		).collect();

		let index_by_id = tasks.iter().map(|task| (task.id.clone(), task.index)).collect();
		let total_weight = tasks.iter().map(|task| task.weight).sum();

		Ok(TaskGraph {
			name: self.name,
			tasks,
			dependencies,
			index_by_id,
			total_weight,
			bottom_levels,
			predecessor_sets,
		})
	}

	/// Kahn's algorithm. Among the tasks that are ready, the one that was declared first goes
	/// first, which makes the order stable across runs.
	fn topological_order(&self, edges: &[(usize, usize, Time)]) -> Result<Vec<usize>, GraphError> {
		let num_tasks = self.ids.len();
		let mut remaining_predecessors = vec![0usize; num_tasks];
		let mut successors = vec![Vec::new(); num_tasks];
		for (source, destination, _) in edges {
			remaining_predecessors[*destination] += 1;
			successors[*source].push(*destination);
		}

		let mut ready: BinaryHeap<Reverse<usize>> = (0 .. num_tasks)
			.filter(|task| remaining_predecessors[*task] == 0)
			.map(Reverse)
			.collect();
		let mut order = Vec::with_capacity(num_tasks);
		while let Some(Reverse(task)) = ready.pop() {
			order.push(task);
			for successor in &successors[task] {
				remaining_predecessors[*successor] -= 1;
				if remaining_predecessors[*successor] == 0 {
					ready.push(Reverse(*successor));
				}
			}
		}

		if order.len() < num_tasks {
			let stuck = (0 .. num_tasks).find(|task| remaining_predecessors[*task] > 0).unwrap_or(0);
			return Err(GraphError::Cycle(self.ids[stuck].clone()));
		}
		Ok(order)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::load_fixture;

	fn diamond() -> TaskGraphBuilder {
		let mut builder = TaskGraphBuilder::new("diamond");
		builder.add_dependency("d", "b", 1).unwrap();
		builder.add_task("d", 4).unwrap();
		builder.add_task("c", 3).unwrap();
		builder.add_task("b", 2).unwrap();
		builder.add_task("a", 1).unwrap();
		builder.add_dependency("d", "c", 2).unwrap();
		builder.add_dependency("b", "a", 3).unwrap();
		builder.add_dependency("c", "a", 4).unwrap();
		builder
	}

	#[test]
	fn test_topological_order_follows_declarations() {
		let graph = diamond().build().unwrap();
		let ids: Vec<_> = graph.tasks().iter().map(|t| t.get_id()).collect();
		assert_eq!(vec!["d", "c", "b", "a"], ids);
		assert_eq!(Some(3), graph.find_task("a"));
		assert_eq!(None, graph.find_task("e"));
		for dependency in graph.dependencies() {
			assert!(dependency.get_source() < dependency.get_destination());
		}

		// Rebuilding gives exactly the same indices
		let again = diamond().build().unwrap();
		assert_eq!(graph.tasks(), again.tasks());
	}

	#[test]
	fn test_adjacency() {
		let graph = diamond().build().unwrap();
		let a = graph.task(3);
		assert_eq!(vec![1, 2], a.get_predecessors().iter().map(|d| d.get_source()).collect::<Vec<_>>());
		assert_eq!(4, a.get_predecessors()[0].get_weight());
		assert!(a.get_successors().is_empty());
		assert!(graph.predecessor_set(3).contains(1));
		assert!(graph.predecessor_set(3).contains(2));
		assert!(!graph.predecessor_set(3).contains(0));
		assert!(graph.predecessor_set(0).is_empty());
		assert_eq!(10, graph.total_weight());
	}

	#[test]
	fn test_bottom_levels() {
		let graph = diamond().build().unwrap();
		assert_eq!(1, graph.bottom_level(3));
		assert_eq!(3, graph.bottom_level(2));
		assert_eq!(4, graph.bottom_level(1));
		assert_eq!(8, graph.bottom_level(0));

		let tree = load_fixture("out-tree-7");
		let levels: Vec<_> = (0 .. 7).map(|task| tree.bottom_level(task)).collect();
		assert_eq!(vec![18, 13, 5, 6, 4, 7, 7], levels);
	}

	#[test]
	fn test_cycle_is_rejected() {
		let mut builder = diamond();
		builder.add_dependency("a", "d", 1).unwrap();
		assert!(matches!(builder.build(), Err(GraphError::Cycle(_))));

		let mut self_loop = TaskGraphBuilder::new("loop");
		self_loop.add_task("x", 1).unwrap();
		self_loop.add_dependency("x", "x", 0).unwrap();
		assert_eq!(Err(GraphError::Cycle("x".to_string())), self_loop.build().map(|_| ()));
	}

	#[test]
	fn test_invalid_declarations() {
		let mut builder = TaskGraphBuilder::new("invalid");
		builder.add_task("x", 1).unwrap();
		assert_eq!(Err(GraphError::DuplicateTask("x".to_string())), builder.add_task("x", 2));
		assert!(matches!(builder.add_task("y", -1), Err(GraphError::NegativeWeight { .. })));
		assert!(matches!(builder.add_dependency("x", "y", -5), Err(GraphError::NegativeWeight { .. })));

		builder.add_dependency("x", "z", 1).unwrap();
		assert_eq!(Err(GraphError::UnknownTask("z".to_string())), builder.clone().build().map(|_| ()));

		let mut duplicate = diamond();
		duplicate.add_dependency("d", "b", 7).unwrap();
		assert!(matches!(duplicate.build(), Err(GraphError::DuplicateDependency { .. })));
	}

	#[test]
	fn test_too_many_tasks() {
		let mut builder = TaskGraphBuilder::new("large");
		for task in 0 .. MAX_TASKS {
			builder.add_task(&task.to_string(), 1).unwrap();
		}
		assert_eq!(MAX_TASKS, builder.clone().build().unwrap().num_tasks());

		builder.add_task("one too many", 1).unwrap();
		assert_eq!(
			Err(GraphError::TooManyTasks { count: MAX_TASKS + 1, max: MAX_TASKS }),
			builder.build().map(|_| ())
		);
	}

	#[test]
	fn test_empty_graph() {
		let graph = TaskGraphBuilder::new("empty").build().unwrap();
		assert!(graph.is_empty());
		assert_eq!(0, graph.total_weight());
	}
}
