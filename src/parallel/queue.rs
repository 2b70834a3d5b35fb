use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::graph::Time;
use crate::search::frontier::Frontier;
use crate::state::PartialSchedule;

/// How long an idle worker waits for new work before it checks whether the search is over
pub const IDLE_POLL: Duration = Duration::from_millis(2);

/// The frontier of 1 worker in the dynamic policy. Any worker can push to it, but only its
/// owner pops from it.
#[derive(Default)]
pub struct WorkQueue {
	frontier: Mutex<Frontier>,
	available: Condvar,
}

impl WorkQueue {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&self, state: Arc<PartialSchedule>, f_cost: Time) {
		self.frontier.lock().unwrap_or_else(PoisonError::into_inner).push(state, f_cost);
		self.available.notify_one();
	}

	/// Pops the cheapest state, waiting at most `timeout` when the queue is empty
	pub fn pop_timeout(&self, timeout: Duration) -> Option<(Time, Arc<PartialSchedule>)> {
		let mut frontier = self.frontier.lock().unwrap_or_else(PoisonError::into_inner);
		if let Some(entry) = frontier.pop() {
			return Some(entry);
		}
		let (mut frontier, _) = self.available.wait_timeout(
			frontier, timeout
		).unwrap_or_else(PoisonError::into_inner);
		frontier.pop()
	}

	pub fn len(&self) -> usize {
		self.frontier.lock().unwrap_or_else(PoisonError::into_inner).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
