use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::graph::Time;
use crate::state::PartialSchedule;

/// The best complete schedule found so far, shared by all workers.
///
/// The makespan lives in an atomic register, so workers can read the bound on every expansion
/// without locking. Only a worker that lowers the register takes the lock to store its state.
pub struct BestBound {
	makespan: AtomicI64,
	best: Mutex<Option<Arc<PartialSchedule>>>,
}

impl BestBound {
	pub fn new() -> Self {
		Self { makespan: AtomicI64::new(Time::MAX), best: Mutex::new(None) }
	}

	pub fn with_incumbent(state: Arc<PartialSchedule>) -> Self {
		Self {
			makespan: AtomicI64::new(state.maximum_finish_time()),
			best: Mutex::new(Some(state)),
		}
	}

	/// The makespan of the best schedule so far, or `Time::MAX` if there is none
	pub fn get(&self) -> Time {
		self.makespan.load(Ordering::Acquire)
	}

	/// Replaces the best schedule by the complete `state` if and only if its makespan is
	/// strictly smaller. Returns true if `state` became the best schedule.
	pub fn try_improve(&self, state: &Arc<PartialSchedule>) -> bool {
		debug_assert!(state.is_complete());
		let makespan = state.maximum_finish_time();
		let mut current = self.get();
		loop {
			if makespan >= current {
				return false;
			}
			match self.makespan.compare_exchange_weak(current, makespan, Ordering::AcqRel, Ordering::Acquire) {
				Ok(_) => break,
				Err(actual) => current = actual,
			}
		}

		let mut best = self.best.lock().unwrap_or_else(PoisonError::into_inner);
		// Another worker may have lowered the register even further in the meantime
		if best.as_ref().is_none_or(|other| other.maximum_finish_time() > makespan) {
			*best = Some(Arc::clone(state));
		}
		true
	}

	pub fn best(&self) -> Option<Arc<PartialSchedule>> {
		self.best.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}
}

impl Default for BestBound {
	fn default() -> Self {
		Self::new()
	}
}
