use crate::graph::MAX_TASKS;

const WORDS: usize = MAX_TASKS / 64;

/// A fixed-capacity bitset over dense task indices. Copying it is cheap, which lets every
/// search state carry its own set of scheduled tasks.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TaskSet {
	raw: [u64; WORDS]
}

impl TaskSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn contains(&self, index: usize) -> bool {
		self.raw[index / 64] & (1 << (index % 64)) != 0
	}

	pub fn insert(&mut self, index: usize) {
		self.raw[index / 64] |= 1 << (index % 64);
	}

	pub fn remove(&mut self, index: usize) {
		self.raw[index / 64] &= !(1 << (index % 64));
	}

	pub fn len(&self) -> usize {
		self.raw.iter().map(|word| word.count_ones() as usize).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.raw.iter().all(|word| *word == 0)
	}

	/// Returns true if and only if every index in `self` is also in `other`
	pub fn is_subset(&self, other: &TaskSet) -> bool {
		self.raw.iter().zip(other.raw.iter()).all(|(mine, theirs)| mine & !theirs == 0)
	}

	/// Iterates over the indices in this set in ascending order
	pub fn iter(&self) -> TaskSetIter<'_> {
		TaskSetIter { set: self, word: 0, remaining: self.raw[0] }
	}
}

impl FromIterator<usize> for TaskSet {
	fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
		let mut set = TaskSet::new();
		for index in iter {
			set.insert(index);
		}
		set
	}
}

pub struct TaskSetIter<'a> {
	set: &'a TaskSet,
	word: usize,
	remaining: u64,
}

impl Iterator for TaskSetIter<'_> {
	type Item = usize;

	fn next(&mut self) -> Option<Self::Item> {
		while self.remaining == 0 {
			self.word += 1;
			if self.word >= WORDS {
				return None;
			}
			self.remaining = self.set.raw[self.word];
		}
		let bit = self.remaining.trailing_zeros() as usize;
		self.remaining &= self.remaining - 1;
		Some(64 * self.word + bit)
	}
}

#[cfg(test)]
mod tests {
	use super::TaskSet;

	#[test]
	fn test_first_word() {
		let mut set = TaskSet::new();
		assert!(set.is_empty());
		assert!(!set.contains(0));
		assert!(!set.contains(10));
		assert!(!set.contains(63));
		set.insert(0);
		set.insert(10);
		set.insert(63);
		assert!(set.contains(0));
		assert!(set.contains(10));
		assert!(set.contains(63));
		assert!(!set.contains(1));
		assert!(!set.contains(11));
		assert!(!set.contains(62));
		assert_eq!(3, set.len());
		set.remove(63);
		assert!(!set.contains(63));
		assert!(set.contains(10));
		assert_eq!(2, set.len());
	}

	#[test]
	fn test_word_boundaries() {
		let mut set = TaskSet::new();
		set.insert(0);
		set.insert(64);
		set.insert(255);
		assert!(set.contains(0));
		assert!(set.contains(64));
		assert!(set.contains(255));
		assert!(!set.contains(65));
		set.remove(64);
		assert!(!set.contains(64));
		assert!(set.contains(0));
		assert!(!set.is_empty());
	}

	#[test]
	fn test_iteration_is_ascending() {
		let set: TaskSet = [200, 3, 64, 0, 127, 128].into_iter().collect();
		assert_eq!(vec![0, 3, 64, 127, 128, 200], set.iter().collect::<Vec<_>>());
		assert_eq!(0, TaskSet::new().iter().count());

		let only_last: TaskSet = [255].into_iter().collect();
		assert_eq!(vec![255], only_last.iter().collect::<Vec<_>>());
	}

	#[test]
	fn test_subset() {
		let small: TaskSet = [1, 70].into_iter().collect();
		let large: TaskSet = [1, 2, 70, 130].into_iter().collect();
		assert!(small.is_subset(&large));
		assert!(!large.is_subset(&small));
		assert!(TaskSet::new().is_subset(&small));
		assert!(small.is_subset(&small));
	}
}
