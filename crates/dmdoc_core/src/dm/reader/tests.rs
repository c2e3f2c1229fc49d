use std::io::Cursor;

use dmdoc_testkit::{DmBuilder, scratch_dir};

use crate::dm::{DmError, PagedReader, Width};

fn three_field_rows(rows: usize) -> DmBuilder {
	let mut builder = DmBuilder::new().numeric("XP").numeric("YP").numeric("ZP");
	for idx in 0..rows {
		let value = idx as f64;
		builder = builder.num_row(&[value, value * 2.0, value * 3.0]);
	}
	builder
}

#[test]
fn record_count_matches_sequential_enumeration() {
	for rows in [0_usize, 1, 169, 170, 400] {
		let builder = three_field_rows(rows);
		let mut reader = PagedReader::new(Cursor::new(builder.to_bytes())).expect("reader opens");
		let header = reader.header().clone();

		let expected = if header.page_count < 2 {
			0
		} else {
			(header.page_count - 2) * (508 / 3) + header.last_page_records
		};
		assert_eq!(reader.record_count(), expected);
		assert_eq!(reader.record_count(), rows as u64);

		let mut seen = 0_u64;
		while seen < reader.record_count() {
			reader.read_sequential(seen).expect("record reads");
			seen += 1;
		}
		assert_eq!(seen, rows as u64);
		assert!(matches!(reader.read_sequential(seen), Err(DmError::RecordOutOfRange { .. })));
	}
}

#[test]
fn records_iterator_yields_values_across_pages() {
	let mut reader = PagedReader::new(Cursor::new(three_field_rows(400).to_bytes())).expect("reader opens");
	let schema = reader.schema().clone();

	let records: Vec<_> = reader.records().collect::<Result<_, _>>().expect("all records decode");
	assert_eq!(records.len(), 400);
	assert_eq!(records[170].index, 170);
	assert_eq!(records[170].number(&schema, "YP"), Some(340.0));
	assert_eq!(records[399].number(&schema, "ZP"), Some(1197.0));
}

#[test]
fn sequential_scan_reads_each_page_once_without_seeking() {
	let mut reader = PagedReader::new(Cursor::new(three_field_rows(400).to_bytes())).expect("reader opens");
	for index in 0..reader.record_count() {
		reader.read_sequential(index).expect("record reads");
	}

	let stats = reader.stats();
	assert_eq!(stats.page_loads, 3);
	assert_eq!(stats.seeks, 0);
}

#[test]
fn random_reads_reuse_cached_page() {
	let mut reader = PagedReader::new(Cursor::new(three_field_rows(400).to_bytes())).expect("reader opens");

	let values: Vec<f64> = [5_u64, 7, 300, 301, 6]
		.into_iter()
		.map(|index| {
			let record = reader.read_random(index).expect("record reads");
			record.words().number(0).expect("XP decodes")
		})
		.collect();
	assert_eq!(values, vec![5.0, 7.0, 300.0, 301.0, 6.0]);

	let stats = reader.stats();
	assert_eq!(stats.page_loads, 3);
	assert_eq!(stats.seeks, 3);
}

#[test]
fn truncated_middle_page_is_fatal() {
	let bytes = three_field_rows(400).truncate(2048 + 1000).to_bytes();
	let mut reader = PagedReader::new(Cursor::new(bytes)).expect("header still parses");
	let err = reader.read_sequential(0).expect_err("short page fails");
	assert!(matches!(
		err,
		DmError::TruncatedFile {
			at: 2048,
			need: 2048,
			have: 1000
		}
	));
}

#[test]
fn short_final_page_is_accepted_when_records_fit() {
	let rows = 200;
	let full = three_field_rows(rows).to_bytes();
	let last_records = rows - 169;
	let keep = 2048 * 2 + last_records * 3 * 4;
	let mut reader = PagedReader::new(Cursor::new(full[..keep].to_vec())).expect("reader opens");
	let count = reader.records().filter(|record| record.is_ok()).count();
	assert_eq!(count, rows);

	let mut reader = PagedReader::new(Cursor::new(full[..keep - 4].to_vec())).expect("reader opens");
	let err = reader.read_random(199).expect_err("final record is cut");
	assert!(matches!(err, DmError::TruncatedFile { at: 4096, .. }));
}

#[test]
fn opens_extended_file_from_disk() {
	let dir = scratch_dir();
	let mut builder = DmBuilder::new().extended().big_endian().numeric("XP").numeric("YP");
	for idx in 0..300 {
		builder = builder.num_row(&[idx as f64 + 0.5, -(idx as f64)]);
	}
	let path = builder.write(dir.path(), "cloudpt.dm");

	let mut reader = PagedReader::open(&path).expect("file opens");
	assert_eq!(reader.config().width, Width::W64);
	assert_eq!(reader.records_per_page(), 254);
	assert_eq!(reader.record_count(), 300);

	let record = reader.read_record(299).expect("record decodes");
	let schema = reader.schema();
	assert_eq!(record.number(schema, "XP"), Some(299.5));
	assert_eq!(record.number(schema, "YP"), Some(-299.0));
}
