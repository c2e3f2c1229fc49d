use std::path::PathBuf;

use dmdoc::dm::PagedReader;
use tracing::debug;

use crate::cmd::util::{columns, emit_json, json_cell, render_cell};

#[derive(clap::Args)]
pub struct Args {
	pub file: PathBuf,
	#[arg(long, default_value_t = 0)]
	pub offset: u64,
	#[arg(long)]
	pub limit: Option<u64>,
	#[arg(long)]
	pub json: bool,
}

/// Print decoded records, one row per record.
pub fn run(args: Args) -> dmdoc::dm::Result<()> {
	let Args { file: path, offset, limit, json } = args;

	let mut reader = PagedReader::open(&path)?;
	let cols = columns(reader.schema());
	let count = reader.record_count();
	let start = offset.min(count);
	let end = limit.map_or(count, |limit| start.saturating_add(limit).min(count));

	let mut records = Vec::with_capacity((end - start) as usize);
	for index in start..end {
		records.push(reader.read_sequential(index)?.decode()?);
	}

	if json {
		let payload = DumpJson {
			path: path.display().to_string(),
			record_count: count,
			offset: start,
			columns: cols.iter().map(|column| column.name.clone()).collect(),
			records: records
				.iter()
				.map(|record| RecordJson {
					index: record.index,
					values: cols
						.iter()
						.map(|column| (column.name.clone(), json_cell(record, column)))
						.collect(),
				})
				.collect(),
		};
		emit_json(&payload);
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("records: {count}");
	println!("shown: {}", records.len());
	let names: Vec<&str> = cols.iter().map(|column| column.name.as_str()).collect();
	println!("idx\t{}", names.join("\t"));
	for record in &records {
		let cells: Vec<String> = cols.iter().map(|column| render_cell(record, column)).collect();
		println!("{}\t{}", record.index, cells.join("\t"));
	}

	let stats = reader.stats();
	debug!(pages = stats.page_loads, seeks = stats.seeks, "dump page reads");
	Ok(())
}

#[derive(serde::Serialize)]
struct DumpJson {
	path: String,
	record_count: u64,
	offset: u64,
	columns: Vec<String>,
	records: Vec<RecordJson>,
}

#[derive(serde::Serialize)]
struct RecordJson {
	index: u64,
	values: serde_json::Map<String, serde_json::Value>,
}
