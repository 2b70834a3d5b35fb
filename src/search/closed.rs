use std::sync::Arc;

use dashmap::DashSet;

use crate::state::PartialSchedule;

/// The set of states that have already been expanded. It can be shared by any number of
/// threads: `insert_if_absent` is the only mutation, and when several threads insert equal
/// states, exactly 1 of them wins.
#[derive(Default)]
pub struct ClosedSet {
	states: DashSet<Arc<PartialSchedule>>,
}

impl ClosedSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true if `state` was inserted, and false if an equal state was already closed
	pub fn insert_if_absent(&self, state: &Arc<PartialSchedule>) -> bool {
		self.states.insert(Arc::clone(state))
	}

	pub fn contains(&self, state: &PartialSchedule) -> bool {
		self.states.contains(state)
	}

	pub fn len(&self) -> usize { self.states.len() }

	pub fn is_empty(&self) -> bool { self.states.is_empty() }
}
