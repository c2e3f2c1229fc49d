use crate::dm::Schema;
use crate::dm::text::{names_match, trim_text};

/// One decoded field word.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
	/// Numeric word widened to `f64`.
	Number(f64),
	/// Four raw ASCII bytes of an alphanumeric word.
	Text([u8; 4]),
}

impl Value {
	/// Numeric payload, if any.
	pub fn as_number(&self) -> Option<f64> {
		match self {
			Self::Number(value) => Some(*value),
			Self::Text(_) => None,
		}
	}

	/// Text chunk payload, if any.
	pub fn as_chunk(&self) -> Option<[u8; 4]> {
		match self {
			Self::Number(_) => None,
			Self::Text(chunk) => Some(*chunk),
		}
	}
}

/// All field values of one row, indexed like the schema entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
	/// Row number within the file.
	pub index: u64,
	/// Decoded values, one per schema entry.
	pub values: Vec<Value>,
}

impl Record {
	/// Numeric value of the first entry named `name`.
	pub fn number(&self, schema: &Schema, name: &str) -> Option<f64> {
		let idx = schema.position(name)?;
		self.values.get(idx)?.as_number()
	}

	/// Text of the first entry named `name` and the same-named entries right after it, trimmed.
	pub fn text(&self, schema: &Schema, name: &str) -> Option<String> {
		let start = schema.position(name)?;
		let mut raw = Vec::new();
		for (field, value) in schema.fields.get(start..)?.iter().zip(self.values.get(start..)?) {
			if !names_match(&field.name, name) {
				break;
			}
			if let Some(chunk) = value.as_chunk() {
				raw.extend_from_slice(&chunk);
			}
		}
		if raw.is_empty() {
			return None;
		}
		Some(trim_text(&raw))
	}
}
