use crate::dm::{FieldSchema, FieldType, Record, RecordBytes, Result, Schema, Value};

/// Decode one field from a record.
///
/// Implicit fields never touch the record bytes and yield their default.
/// Numeric words go through the file's byte order; text words are raw.
pub fn decode_field(field: &FieldSchema, record: &RecordBytes<'_>) -> Result<Value> {
	if field.is_implicit() {
		return Ok(field.default);
	}

	let words = record.words();
	let slot = field.position - 1;
	match field.field_type {
		FieldType::Numeric => Ok(Value::Number(words.number(slot)?)),
		FieldType::Alphanumeric => Ok(Value::Text(words.chunk(slot)?)),
	}
}

/// Decode every schema entry of a record, in schema order.
pub fn decode_record(schema: &Schema, record: &RecordBytes<'_>) -> Result<Record> {
	let mut values = Vec::with_capacity(schema.fields.len());
	for field in &schema.fields {
		values.push(decode_field(field, record)?);
	}
	Ok(Record {
		index: record.index,
		values,
	})
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use dmdoc_testkit::{DmBuilder, num, text};

	use crate::dm::{PagedReader, Value, decode_field};

	#[test]
	fn implicit_field_ignores_record_bytes() {
		let mut builder = DmBuilder::new().numeric("XP").implicit_numeric("AU", 1.25).implicit_alpha("ZONE", "OX");
		for idx in 0..600 {
			builder = builder.num_row(&[idx as f64]);
		}
		let mut reader = PagedReader::new(Cursor::new(builder.to_bytes())).expect("reader opens");
		let schema = reader.schema().clone();
		let au = schema.field("AU").expect("AU declared");
		let zone = schema.field("ZONE").expect("ZONE declared");

		for index in 0..reader.record_count() {
			let record = reader.read_sequential(index).expect("record reads");
			assert_eq!(decode_field(au, &record).expect("AU decodes"), Value::Number(1.25));
			assert_eq!(decode_field(zone, &record).expect("ZONE decodes"), Value::Text(*b"OX  "));
		}
	}

	#[test]
	fn decodes_numbers_and_text_chunks() {
		let bytes = DmBuilder::new()
			.extended()
			.big_endian()
			.numeric("XP")
			.alpha("NAME", 2)
			.row(vec![num(-12.5), text("STOPE_A1")])
			.to_bytes();
		let mut reader = PagedReader::new(Cursor::new(bytes)).expect("reader opens");
		let schema = reader.schema().clone();
		let record = reader.read_record(0).expect("record decodes");

		assert_eq!(record.values, vec![Value::Number(-12.5), Value::Text(*b"STOP"), Value::Text(*b"E_A1")]);
		assert_eq!(record.number(&schema, "xp"), Some(-12.5));
		assert_eq!(record.text(&schema, "NAME").as_deref(), Some("STOPE_A1"));
	}
}
