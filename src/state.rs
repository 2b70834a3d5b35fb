use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use crate::graph::Time;
use crate::task_set::TaskSet;

/// Marks a task that has not been assigned to a processor yet
pub const UNASSIGNED: u8 = u8::MAX;

/// Processor indices must fit in a byte and differ from `UNASSIGNED`
pub const MAX_PROCESSORS: usize = UNASSIGNED as usize;

/// A prefix of a valid schedule: some tasks have been assigned to a processor and a start
/// time, and the others have not been scheduled yet.
///
/// States are only created by `empty` and `with_task`. Once a state is shared with the search
/// (wrapped in an `Arc`) it is never mutated again, except for filling its f-cost cache.
///
/// Two states are equal if and only if their assignments, start times, and processor finish
/// times are equal. The order in which the tasks were added doesn't matter.
#[derive(Debug, Clone)]
pub struct PartialSchedule {
	assigned_processor: Vec<u8>,
	start_time: Vec<Time>,
	processor_finish_time: Vec<Time>,
	scheduled: TaskSet,
	scheduled_count: usize,
	last_scheduled: Option<usize>,
	idle_time: Time,
	processors_in_use: usize,
	f_cost: OnceLock<Time>,
}

impl PartialSchedule {

	/// The root state, in which no task has been scheduled
	pub fn empty(num_tasks: usize, num_processors: usize) -> Self {
		debug_assert!(num_processors <= MAX_PROCESSORS);
		Self {
			assigned_processor: vec![UNASSIGNED; num_tasks],
			start_time: vec![0; num_tasks],
			processor_finish_time: vec![0; num_processors],
			scheduled: TaskSet::new(),
			scheduled_count: 0,
			last_scheduled: None,
			idle_time: 0,
			processors_in_use: 0,
			f_cost: OnceLock::new(),
		}
	}

	/// Creates the child state in which `task` (with the given `weight`) starts at `start` on
	/// `processor`. The caller is responsible for choosing a start time that respects the
	/// dependencies of `task`.
	pub fn with_task(&self, task: usize, weight: Time, processor: usize, start: Time) -> Self {
		debug_assert!(!self.scheduled.contains(task));
		debug_assert!(processor < self.processor_finish_time.len());
		debug_assert!(start >= self.processor_finish_time[processor]);

		let mut child = Self {
			assigned_processor: self.assigned_processor.clone(),
			start_time: self.start_time.clone(),
			processor_finish_time: self.processor_finish_time.clone(),
			scheduled: self.scheduled,
			scheduled_count: self.scheduled_count + 1,
			last_scheduled: Some(task),
			idle_time: self.idle_time + start - self.processor_finish_time[processor],
			processors_in_use: self.processors_in_use.max(processor + 1),
			f_cost: OnceLock::new(),
		};
		child.assigned_processor[task] = processor as u8;
		child.start_time[task] = start;
		child.processor_finish_time[processor] = start + weight;
		child.scheduled.insert(task);
		debug_assert_eq!(child.scheduled_count, child.scheduled.len());
		child
	}

	pub fn num_tasks(&self) -> usize { self.assigned_processor.len() }

	pub fn num_processors(&self) -> usize { self.processor_finish_time.len() }

	pub fn get_processor(&self, task: usize) -> Option<usize> {
		match self.assigned_processor[task] {
			UNASSIGNED => None,
			processor => Some(processor as usize),
		}
	}

	pub fn get_start_time(&self, task: usize) -> Option<Time> {
		self.get_processor(task).map(|_| self.start_time[task])
	}

	pub fn processor_finish_times(&self) -> &[Time] { &self.processor_finish_time }

	pub fn get_processor_finish_time(&self, processor: usize) -> Time {
		self.processor_finish_time[processor]
	}

	/// The finish time of the latest task in this state, which is the makespan once the state
	/// is complete
	pub fn maximum_finish_time(&self) -> Time {
		self.processor_finish_time.iter().copied().max().unwrap_or(0)
	}

	pub fn scheduled(&self) -> &TaskSet { &self.scheduled }

	pub fn scheduled_count(&self) -> usize { self.scheduled_count }

	pub fn is_scheduled(&self, task: usize) -> bool { self.scheduled.contains(task) }

	pub fn is_complete(&self) -> bool { self.scheduled_count == self.num_tasks() }

	pub fn last_scheduled(&self) -> Option<usize> { self.last_scheduled }

	/// The total time that processors have been idle before their current finish time
	pub fn idle_time(&self) -> Time { self.idle_time }

	/// Processors are taken into use in ascending order, so processors `0 .. processors_in_use`
	/// have at least 1 task, and all others are still empty.
	pub fn processors_in_use(&self) -> usize { self.processors_in_use }

	/// Returns the memoized f-cost, or computes and stores it using `compute`
	pub fn cached_f_cost<F>(&self, compute: F) -> Time where F: FnOnce() -> Time {
		*self.f_cost.get_or_init(compute)
	}
}

impl PartialEq for PartialSchedule {
	fn eq(&self, other: &Self) -> bool {
		self.assigned_processor == other.assigned_processor &&
			self.start_time == other.start_time &&
			self.processor_finish_time == other.processor_finish_time
	}
}

impl Eq for PartialSchedule {}

impl Hash for PartialSchedule {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.assigned_processor.hash(state);
		self.start_time.hash(state);
		self.processor_finish_time.hash(state);
	}
}
