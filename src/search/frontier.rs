use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use crate::graph::Time;
use crate::state::PartialSchedule;

struct QueuedState {
	f_cost: Time,
	depth: usize,
	sequence: u64,
	state: Arc<PartialSchedule>,
}

impl PartialEq for QueuedState {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for QueuedState {}

impl PartialOrd for QueuedState {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for QueuedState {
	// `BinaryHeap` is a max-heap, so the *best* state must compare as the greatest
	fn cmp(&self, other: &Self) -> Ordering {
		other.f_cost.cmp(&self.f_cost)
			.then(self.depth.cmp(&other.depth))
			.then(other.sequence.cmp(&self.sequence))
	}
}

/// The open list of a best-first search. `pop` returns the state with the lowest f-cost. Ties
/// are broken in favour of states with more scheduled tasks, and then in favour of the state
/// that was pushed first, so the order is fully deterministic.
#[derive(Default)]
pub struct Frontier {
	heap: BinaryHeap<QueuedState>,
	next_sequence: u64,
}

impl Frontier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, state: Arc<PartialSchedule>, f_cost: Time) {
		let sequence = self.next_sequence;
		self.next_sequence += 1;
		self.heap.push(QueuedState { f_cost, depth: state.scheduled_count(), sequence, state });
	}

	pub fn pop(&mut self) -> Option<(Time, Arc<PartialSchedule>)> {
		self.heap.pop().map(|queued| (queued.f_cost, queued.state))
	}

	pub fn peek_f_cost(&self) -> Option<Time> {
		self.heap.peek().map(|queued| queued.f_cost)
	}

	pub fn len(&self) -> usize { self.heap.len() }

	pub fn is_empty(&self) -> bool { self.heap.is_empty() }

	/// Removes all states, in the order in which `pop` would have returned them
	pub fn drain_in_order(&mut self) -> Vec<(Time, Arc<PartialSchedule>)> {
		let mut states = Vec::with_capacity(self.len());
		while let Some(entry) = self.pop() {
			states.push(entry);
		}
		states
	}
}
