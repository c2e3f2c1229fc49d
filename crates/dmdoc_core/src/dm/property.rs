use std::ops::Range;

use tracing::debug;

use crate::dm::text::{names_match, trim_text};
use crate::dm::{Attribute, FieldSchema, Mesh, Record, Schema, Scope};

/// Storage policy of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
	/// Declared but never stored.
	Inactive,
	/// Stored on every ingest.
	Active,
	/// Stored, and divided across groups by [`PropertyStore::segment`].
	Segmentable,
}

/// Column values in row order.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
	/// Numeric column.
	Numeric(Vec<f64>),
	/// Alphanumeric column.
	Text(Vec<String>),
}

impl ColumnValues {
	/// Number of stored rows.
	pub fn len(&self) -> usize {
		match self {
			Self::Numeric(values) => values.len(),
			Self::Text(values) => values.len(),
		}
	}

	/// Return `true` when no row is stored.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Numeric values, if this is a numeric column.
	pub fn as_numeric(&self) -> Option<&[f64]> {
		match self {
			Self::Numeric(values) => Some(values),
			Self::Text(_) => None,
		}
	}

	/// Text values, if this is an alphanumeric column.
	pub fn as_text(&self) -> Option<&[String]> {
		match self {
			Self::Numeric(_) => None,
			Self::Text(values) => Some(values),
		}
	}
}

/// One named column fed from a span of schema entries.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyColumn {
	/// Trimmed field name.
	pub name: String,
	/// Stored values.
	pub values: ColumnValues,
	/// Storage policy.
	pub activation: Activation,
	span: Range<usize>,
}

impl PropertyColumn {
	/// Schema entry slots feeding this column.
	pub fn span(&self) -> Range<usize> {
		self.span.clone()
	}

	/// Return `true` for numeric columns.
	pub fn is_numeric(&self) -> bool {
		matches!(self.values, ColumnValues::Numeric(_))
	}
}

/// Accumulates decoded records into named columns.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
	columns: Vec<PropertyColumn>,
	rows: usize,
}

impl PropertyStore {
	/// Create an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Declare a column fed from schema entry `start_slot`.
	///
	/// A declaration repeating the previous column's name at the slot right
	/// after its span extends that column instead; this rebuilds multi-word
	/// alphanumeric fields listed as one entry per word.
	pub fn declare(&mut self, name: &str, numeric: bool, start_slot: usize, activation: Activation) {
		if let Some(prev) = self.columns.last_mut() {
			if names_match(&prev.name, name) && prev.span.end == start_slot {
				prev.span.end += 1;
				return;
			}
		}

		let values = if numeric {
			ColumnValues::Numeric(Vec::new())
		} else {
			ColumnValues::Text(Vec::new())
		};
		self.columns.push(PropertyColumn {
			name: name.trim().to_owned(),
			values,
			activation,
			span: start_slot..start_slot + 1,
		});
	}

	/// Declare every schema entry, choosing activation per field.
	pub fn declare_schema(&mut self, schema: &Schema, mut activation: impl FnMut(&FieldSchema) -> Activation) {
		for (slot, field) in schema.fields.iter().enumerate() {
			self.declare(&field.name, field.is_numeric(), slot, activation(field));
		}
	}

	/// Declared columns in declaration order.
	pub fn columns(&self) -> &[PropertyColumn] {
		&self.columns
	}

	/// Look up a column by field name.
	pub fn column(&self, name: &str) -> Option<&PropertyColumn> {
		self.columns.iter().find(|column| names_match(&column.name, name))
	}

	/// Rows ingested so far.
	pub fn rows(&self) -> usize {
		self.rows
	}

	/// Append one row from a decoded record to every stored column.
	pub fn ingest(&mut self, record: &Record) {
		for column in self.columns.iter_mut().filter(|column| column.activation != Activation::Inactive) {
			let span = record.values.get(column.span.clone()).unwrap_or(&[]);
			match &mut column.values {
				ColumnValues::Numeric(values) => {
					let value = span.first().and_then(|value| value.as_number()).unwrap_or(f64::NAN);
					values.push(value);
				}
				ColumnValues::Text(values) => {
					let raw: Vec<u8> = span.iter().filter_map(|value| value.as_chunk()).flatten().collect();
					values.push(trim_text(&raw));
				}
			}
		}
		self.rows += 1;
	}

	/// Append a row with no source record: NaN for numbers, empty text.
	pub fn ingest_absent(&mut self) {
		for column in self.columns.iter_mut().filter(|column| column.activation != Activation::Inactive) {
			match &mut column.values {
				ColumnValues::Numeric(values) => values.push(f64::NAN),
				ColumnValues::Text(values) => values.push(String::new()),
			}
		}
		self.rows += 1;
	}

	/// Spread the last `window` values of every segmentable numeric column evenly.
	///
	/// Call once per group, after the group's last row and before the next
	/// group's first.
	pub fn segment(&mut self, window: usize) {
		if window == 0 {
			return;
		}

		let divisor = window as f64;
		for column in self.columns.iter_mut().filter(|column| column.activation == Activation::Segmentable) {
			if let ColumnValues::Numeric(values) = &mut column.values {
				let start = values.len().saturating_sub(window);
				for value in &mut values[start..] {
					*value /= divisor;
				}
			}
		}
	}

	/// Attach stored columns to `mesh`, consuming the store.
	///
	/// Columns as long as the point array become point data, all others cell
	/// data. Names already present in the target scope are left alone.
	pub fn materialize_into(self, mesh: &mut Mesh) {
		let point_count = mesh.point_count();
		for column in self.columns {
			if column.activation == Activation::Inactive {
				continue;
			}

			let scope = if column.values.len() == point_count { Scope::Point } else { Scope::Cell };
			let name = column.name;
			if !mesh.attach(scope, Attribute { name: name.clone(), values: column.values }) {
				debug!(name = %name, ?scope, "attribute already present, skipped");
			}
		}
	}
}
