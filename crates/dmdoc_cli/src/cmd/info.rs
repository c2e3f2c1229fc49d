use std::path::PathBuf;

use dmdoc::dm::{BuildOptions, FieldSchema, FileKind, PagedReader, Value, trim_text};

use crate::cmd::util::{emit_json, format_number};

#[derive(clap::Args)]
pub struct Args {
	pub file: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Print header metadata and the field schema.
pub fn run(args: Args) -> dmdoc::dm::Result<()> {
	let Args { file: path, json } = args;

	let reader = PagedReader::open(&path)?;
	let header = reader.header();
	let kind = FileKind::classify(&header.schema, &BuildOptions::default());

	if json {
		let payload = InfoJson {
			path: path.display().to_string(),
			width: header.config.width.as_str().to_owned(),
			endianness: header.config.endianness.as_str().to_owned(),
			kind: kind.as_str().to_owned(),
			file_name: header.file_name.clone(),
			directory: header.directory.clone(),
			description: header.description.clone(),
			owner: header.owner.clone(),
			modified: header.modified,
			page_count: header.page_count,
			last_page_records: header.last_page_records,
			record_len: header.schema.record_len,
			records_per_page: reader.records_per_page(),
			record_count: reader.record_count(),
			fields: header.schema.fields.iter().map(field_to_json).collect(),
		};
		emit_json(&payload);
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("width: {}", header.config.width.as_str());
	println!("endianness: {}", header.config.endianness.as_str());
	println!("kind: {}", kind.as_str());
	println!("file_name: {}", header.file_name);
	println!("description: {}", header.description);
	println!("modified: {}", header.modified);
	println!("pages: {}", header.page_count);
	println!("record_len: {}", header.schema.record_len);
	println!("records_per_page: {}", reader.records_per_page());
	println!("records: {}", reader.record_count());
	println!("fields: {}", header.schema.fields.len());
	println!("idx\tname\ttype\tposition\tword\tunit\tdefault");
	for (idx, field) in header.schema.fields.iter().enumerate() {
		println!(
			"{idx}\t{}\t{}\t{}\t{}\t{}\t{}",
			field.name,
			field.field_type.as_str(),
			field.position,
			field.word_number,
			field.unit,
			render_default(&field.default)
		);
	}

	Ok(())
}

fn render_default(value: &Value) -> String {
	match value {
		Value::Number(number) => format_number(*number),
		Value::Text(chunk) => trim_text(chunk),
	}
}

fn field_to_json(field: &FieldSchema) -> FieldJson {
	FieldJson {
		name: field.name.clone(),
		field_type: field.field_type.as_str().to_owned(),
		position: field.position,
		word_number: field.word_number,
		unit: field.unit.clone(),
		implicit: field.is_implicit(),
		default: render_default(&field.default),
	}
}

#[derive(serde::Serialize)]
struct InfoJson {
	path: String,
	width: String,
	endianness: String,
	kind: String,
	file_name: String,
	directory: String,
	description: String,
	owner: String,
	modified: i64,
	page_count: u64,
	last_page_records: u64,
	record_len: usize,
	records_per_page: u64,
	record_count: u64,
	fields: Vec<FieldJson>,
}

#[derive(serde::Serialize)]
struct FieldJson {
	name: String,
	#[serde(rename = "type")]
	field_type: String,
	position: usize,
	word_number: usize,
	unit: String,
	implicit: bool,
	default: String,
}
