use std::collections::HashMap;

/// Sparse map from external numeric ids to dense row numbers.
#[derive(Debug, Clone, Default)]
pub struct PointIndex {
	rows: HashMap<u64, usize>,
}

impl PointIndex {
	/// Create an empty index.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an empty index sized for `capacity` ids.
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			rows: HashMap::with_capacity(capacity),
		}
	}

	/// Map `id` to `row`, returning the row it replaced.
	///
	/// Ids are not validated for uniqueness; the latest assignment wins.
	pub fn set(&mut self, id: f64, row: usize) -> Option<usize> {
		self.rows.insert(id_key(id), row)
	}

	/// Row assigned to `id`.
	pub fn get(&self, id: f64) -> Option<usize> {
		self.rows.get(&id_key(id)).copied()
	}

	/// Number of distinct ids.
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	/// Return `true` when no id is mapped.
	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}
}

/// Hash key of an id; `-0.0` and `0.0` share a key.
pub(crate) fn id_key(id: f64) -> u64 {
	if id == 0.0 { 0.0_f64.to_bits() } else { id.to_bits() }
}

#[cfg(test)]
mod tests {
	use super::PointIndex;

	#[test]
	fn latest_assignment_wins() {
		let mut index = PointIndex::new();
		assert_eq!(index.set(10.0, 0), None);
		assert_eq!(index.set(20.0, 1), None);
		assert_eq!(index.set(10.0, 2), Some(0));

		assert_eq!(index.get(10.0), Some(2));
		assert_eq!(index.get(20.0), Some(1));
		assert_eq!(index.len(), 2);
	}

	#[test]
	fn unknown_ids_are_not_found() {
		let mut index = PointIndex::with_capacity(4);
		assert!(index.is_empty());
		assert_eq!(index.get(1.0), None);
		index.set(1.5, 7);
		assert_eq!(index.get(1.0), None);
		assert_eq!(index.get(f64::NAN), None);
	}

	#[test]
	fn signed_zero_is_one_id() {
		let mut index = PointIndex::new();
		index.set(-0.0, 3);
		assert_eq!(index.get(0.0), Some(3));
	}
}
