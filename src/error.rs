use crate::graph::Time;
use thiserror::Error;

/// Reasons why a task graph cannot be built or parsed. All of them are detected before the
/// search starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
	#[error("line {line}: {message}")]
	Parse { line: usize, message: String },

	#[error("task '{0}' is declared more than once")]
	DuplicateTask(String),

	#[error("dependency '{from}' -> '{to}' is declared more than once")]
	DuplicateDependency { from: String, to: String },

	#[error("dependency refers to unknown task '{0}'")]
	UnknownTask(String),

	#[error("task graph contains a cycle through task '{0}'")]
	Cycle(String),

	#[error("{item} has negative weight {weight}")]
	NegativeWeight { item: String, weight: Time },

	#[error("task graph has {count} tasks, but at most {max} are supported")]
	TooManyTasks { count: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum SchedulerError {
	#[error("invalid task graph: {0}")]
	Graph(#[from] GraphError),

	#[error("could not access '{path}': {source}")]
	Io { path: String, source: std::io::Error },

	#[error("processor count must be between 1 and {max}, got {count}")]
	InvalidProcessorCount { count: usize, max: usize },

	#[error("core count must be at least 1")]
	InvalidCoreCount,
}

impl SchedulerError {
	pub fn io(path: &str, source: std::io::Error) -> Self {
		Self::Io { path: path.to_string(), source }
	}
}
