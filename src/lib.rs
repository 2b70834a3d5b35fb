pub mod cost;
pub mod error;
pub mod graph;
pub mod parallel;
pub mod render;
pub mod search;
pub mod state;
pub mod task_set;

#[cfg(test)]
mod testing;

pub use error::{GraphError, SchedulerError};
pub use graph::{TaskGraph, TaskGraphBuilder, Time};
pub use search::{
	Balancing, ScheduleResult, ScheduledTask, SearchConfig, SearchStatistics, StopHandle, Strategy,
	TerminationPolicy, schedule, schedule_with,
};
