use std::ops::Range;

use dmdoc::dm::{Activation, PropertyStore, Record, Schema, trim_text};

/// Print a payload as pretty JSON on stdout.
pub(crate) fn emit_json<T: serde::Serialize>(payload: &T) {
	match serde_json::to_string_pretty(payload) {
		Ok(text) => println!("{text}"),
		Err(err) => eprintln!("error: failed to encode json: {err}"),
	}
}

/// One logical column fed from a run of adjacent schema entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Column {
	pub name: String,
	pub numeric: bool,
	pub span: Range<usize>,
}

/// Logical columns of `schema` in header order, grouped the same way mesh attributes are.
pub(crate) fn columns(schema: &Schema) -> Vec<Column> {
	let mut store = PropertyStore::new();
	store.declare_schema(schema, |_| Activation::Active);
	store
		.columns()
		.iter()
		.map(|column| Column {
			name: column.name.clone(),
			numeric: column.is_numeric(),
			span: column.span(),
		})
		.collect()
}

fn column_number(record: &Record, column: &Column) -> Option<f64> {
	record.values.get(column.span.start)?.as_number()
}

fn column_text(record: &Record, column: &Column) -> Option<String> {
	let values = record.values.get(column.span.clone())?;
	let raw: Vec<u8> = values.iter().filter_map(|value| value.as_chunk()).flatten().collect();
	if raw.is_empty() {
		return None;
	}
	Some(trim_text(&raw))
}

/// Render one column of `record` for tabular output.
pub(crate) fn render_cell(record: &Record, column: &Column) -> String {
	if column.numeric {
		return match column_number(record, column) {
			Some(value) => format_number(value),
			None => "-".to_owned(),
		};
	}
	column_text(record, column).unwrap_or_default()
}

/// JSON value for one column of `record`; NaN becomes `null`.
pub(crate) fn json_cell(record: &Record, column: &Column) -> serde_json::Value {
	if column.numeric {
		return column_number(record, column)
			.and_then(serde_json::Number::from_f64)
			.map_or(serde_json::Value::Null, serde_json::Value::Number);
	}
	column_text(record, column).map_or(serde_json::Value::Null, serde_json::Value::String)
}

/// Compact float rendering: integers without a fraction, NaN as `-`.
pub(crate) fn format_number(value: f64) -> String {
	if value.is_nan() {
		return "-".to_owned();
	}
	if value.fract() == 0.0 && value.abs() < 1e15 {
		return format!("{}", value as i64);
	}
	format!("{value}")
}
