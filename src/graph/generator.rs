use rand::prelude::*;
use rand::rngs::StdRng;

use crate::error::GraphError;
use crate::graph::{TaskGraph, TaskGraphBuilder, Time};

/// Parameters for `generate_random_graph`. Task ids are `0 .. num_tasks`, and every
/// dependency goes from a lower id to a higher id, so the result is always acyclic.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
	pub num_tasks: usize,

	/// The probability that a dependency exists between any pair of tasks
	pub density: f64,

	pub min_task_weight: Time,
	pub max_task_weight: Time,

	pub min_communication: Time,
	pub max_communication: Time,

	pub seed: u64,
}

impl GeneratorConfig {
	pub fn new(num_tasks: usize, density: f64, seed: u64) -> Self {
		Self {
			num_tasks,
			density: density.clamp(0.0, 1.0),
			min_task_weight: 2,
			max_task_weight: 10,
			min_communication: 1,
			max_communication: 20,
			seed,
		}
	}
}

/// Generates a random task graph for benchmarking. The same configuration always gives the
/// same graph.
pub fn generate_random_graph(config: &GeneratorConfig) -> Result<TaskGraph, GraphError> {
	let mut rng = StdRng::seed_from_u64(config.seed);
	let mut builder = TaskGraphBuilder::new(&format!(
		"Random_Nodes_{}_Density_{}_Seed_{}", config.num_tasks, config.density, config.seed
	));

	for task in 0 .. config.num_tasks {
		let weight = rng.random_range(config.min_task_weight ..= config.max_task_weight.max(config.min_task_weight));
		builder.add_task(&task.to_string(), weight)?;
	}

	for destination in 1 .. config.num_tasks {
		for source in 0 .. destination {
			if rng.random_bool(config.density) {
				let weight = rng.random_range(
					config.min_communication ..= config.max_communication.max(config.min_communication)
				);
				builder.add_dependency(&source.to_string(), &destination.to_string(), weight)?;
			}
		}
	}

	builder.build()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_same_seed_same_graph() {
		let config = GeneratorConfig::new(12, 0.3, 42);
		let first = generate_random_graph(&config).unwrap();
		let second = generate_random_graph(&config).unwrap();
		assert_eq!(first.tasks(), second.tasks());
		assert_eq!(first.dependencies(), second.dependencies());
		assert_eq!(12, first.num_tasks());
	}

	#[test]
	fn test_weights_and_order() {
		let graph = generate_random_graph(&GeneratorConfig::new(30, 0.5, 7)).unwrap();
		for task in graph.tasks() {
			assert!((2 ..= 10).contains(&task.get_weight()));
			assert_eq!(task.get_id(), task.get_index().to_string());
		}
		for dependency in graph.dependencies() {
			assert!(dependency.get_source() < dependency.get_destination());
			assert!((1 ..= 20).contains(&dependency.get_weight()));
		}
	}

	#[test]
	fn test_density_extremes() {
		let empty = generate_random_graph(&GeneratorConfig::new(8, 0.0, 1)).unwrap();
		assert!(empty.dependencies().is_empty());

		let complete = generate_random_graph(&GeneratorConfig::new(8, 1.0, 1)).unwrap();
		assert_eq!(8 * 7 / 2, complete.dependencies().len());

		assert!(generate_random_graph(&GeneratorConfig::new(300, 0.0, 1)).is_err());
	}
}
