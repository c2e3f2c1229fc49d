//! Shared test helpers for workspace crates.
//!
//! [`DmBuilder`] lays out synthetic DataMine files byte by byte so tests do
//! not depend on binary fixtures.

use std::fs;
use std::path::{Path, PathBuf};

/// Sentinel stored in word 25 of extended-precision headers.
pub const EXTENDED_SENTINEL: f64 = 456789.0;
/// Default modification date written to headers.
pub const DEFAULT_DATE: f64 = 20240315.0;
/// Words per data page available to records.
pub const USABLE_WORDS: usize = 508;

/// Word width of a synthetic file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
	/// 4-byte words.
	Single,
	/// 8-byte words.
	Extended,
}

impl Precision {
	/// Bytes per word.
	pub fn word_size(self) -> usize {
		match self {
			Self::Single => 4,
			Self::Extended => 8,
		}
	}

	/// Bytes per page.
	pub fn page_size(self) -> usize {
		self.word_size() * 512
	}
}

/// Numeric byte order of a synthetic file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
	/// Little-endian numerics.
	Little,
	/// Big-endian numerics.
	Big,
}

/// One cell value supplied to [`DmBuilder::row`].
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
	/// Numeric value.
	Num(f64),
	/// Alphanumeric value, padded or cut to the field width.
	Text(String),
}

/// Numeric datum.
pub fn num(value: f64) -> Datum {
	Datum::Num(value)
}

/// Alphanumeric datum.
pub fn text(value: &str) -> Datum {
	Datum::Text(value.to_owned())
}

#[derive(Debug, Clone)]
struct FieldDef {
	name: String,
	numeric: bool,
	words: usize,
	implicit: Option<Datum>,
}

/// Builder for DataMine file bytes.
#[derive(Debug, Clone)]
pub struct DmBuilder {
	precision: Precision,
	order: ByteOrder,
	date: f64,
	description: String,
	fields: Vec<FieldDef>,
	rows: Vec<Vec<Datum>>,
	page_count: Option<u64>,
	last_page_records: Option<u64>,
	entry_count: Option<u64>,
	truncate: Option<usize>,
}

impl Default for DmBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl DmBuilder {
	/// Single precision, little-endian, plausible date, no fields.
	pub fn new() -> Self {
		Self {
			precision: Precision::Single,
			order: ByteOrder::Little,
			date: DEFAULT_DATE,
			description: "synthetic test file".to_owned(),
			fields: Vec::new(),
			rows: Vec::new(),
			page_count: None,
			last_page_records: None,
			entry_count: None,
			truncate: None,
		}
	}

	/// Use 8-byte words and 4096-byte pages.
	pub fn extended(mut self) -> Self {
		self.precision = Precision::Extended;
		self
	}

	/// Store numerics big-endian.
	pub fn big_endian(mut self) -> Self {
		self.order = ByteOrder::Big;
		self
	}

	/// Override the header date word.
	pub fn date(mut self, date: f64) -> Self {
		self.date = date;
		self
	}

	/// Override the description text.
	pub fn description(mut self, description: &str) -> Self {
		self.description = description.to_owned();
		self
	}

	/// Declare a numeric field.
	pub fn numeric(mut self, name: &str) -> Self {
		self.fields.push(FieldDef {
			name: name.to_owned(),
			numeric: true,
			words: 1,
			implicit: None,
		});
		self
	}

	/// Declare an alphanumeric field spanning `words` words.
	pub fn alpha(mut self, name: &str, words: usize) -> Self {
		self.fields.push(FieldDef {
			name: name.to_owned(),
			numeric: false,
			words: words.max(1),
			implicit: None,
		});
		self
	}

	/// Declare an implicit numeric field with a default.
	pub fn implicit_numeric(mut self, name: &str, default: f64) -> Self {
		self.fields.push(FieldDef {
			name: name.to_owned(),
			numeric: true,
			words: 1,
			implicit: Some(Datum::Num(default)),
		});
		self
	}

	/// Declare an implicit single-word alphanumeric field with a default.
	pub fn implicit_alpha(mut self, name: &str, default: &str) -> Self {
		self.fields.push(FieldDef {
			name: name.to_owned(),
			numeric: false,
			words: 1,
			implicit: Some(Datum::Text(default.to_owned())),
		});
		self
	}

	/// Append one row; values cover explicit fields in declaration order.
	pub fn row(mut self, values: Vec<Datum>) -> Self {
		self.rows.push(values);
		self
	}

	/// Append one all-numeric row.
	pub fn num_row(self, values: &[f64]) -> Self {
		self.row(values.iter().copied().map(Datum::Num).collect())
	}

	/// Force the header page count.
	pub fn page_count(mut self, pages: u64) -> Self {
		self.page_count = Some(pages);
		self
	}

	/// Force the header last-page record count.
	pub fn last_page_records(mut self, records: u64) -> Self {
		self.last_page_records = Some(records);
		self
	}

	/// Force the header schema entry count.
	pub fn entry_count(mut self, entries: u64) -> Self {
		self.entry_count = Some(entries);
		self
	}

	/// Cut the produced bytes to `len`.
	pub fn truncate(mut self, len: usize) -> Self {
		self.truncate = Some(len);
		self
	}

	/// Words per record.
	pub fn record_len(&self) -> usize {
		self.fields.iter().filter(|field| field.implicit.is_none()).map(|field| field.words).sum()
	}

	/// Records per full data page.
	pub fn records_per_page(&self) -> usize {
		USABLE_WORDS / self.record_len().max(1)
	}

	/// Lay out the file.
	pub fn to_bytes(&self) -> Vec<u8> {
		let ws = self.precision.word_size();
		let page = self.precision.page_size();
		let per_page = self.records_per_page();
		let data_pages = if self.rows.is_empty() { 0 } else { self.rows.len().div_ceil(per_page) };
		let last = if data_pages == 0 { 0 } else { self.rows.len() - (data_pages - 1) * per_page };

		let mut out = vec![0_u8; page * (1 + data_pages)];
		self.write_header(&mut out[..page], data_pages, last);

		for (idx, row) in self.rows.iter().enumerate() {
			let start = page * (1 + idx / per_page) + (idx % per_page) * self.record_len() * ws;
			self.write_row(&mut out[start..start + self.record_len() * ws], row);
		}

		if let Some(len) = self.truncate {
			out.truncate(len);
		}
		out
	}

	/// Write the file into `dir` and return its path.
	pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
		let path = dir.join(name);
		fs::write(&path, self.to_bytes()).expect("synthetic file writes");
		path
	}

	fn write_header(&self, out: &mut [u8], data_pages: usize, last: usize) {
		let (counts_word, fields_word) = match self.precision {
			Precision::Single => (25, 28),
			Precision::Extended => {
				self.put_number(out, 25, EXTENDED_SENTINEL);
				(26, 29)
			}
		};

		self.put_text(out, 0, 2, "TESTFILE");
		self.put_text(out, 2, 2, "TESTDIR");
		self.put_text(out, 4, 16, &self.description);
		self.put_text(out, 20, 2, "OWNER");
		self.put_number(out, 22, 7.0);
		self.put_number(out, 23, 5.0);
		self.put_number(out, 24, self.date);

		let mut entries = Vec::new();
		let mut position = 1;
		for field in &self.fields {
			for word_number in 1..=field.words {
				let slot = if field.implicit.is_some() {
					0
				} else {
					position += 1;
					position - 1
				};
				entries.push((field, slot, word_number));
			}
		}

		let entry_count = self.entry_count.unwrap_or(entries.len() as u64);
		self.put_number(out, counts_word, entry_count as f64);
		self.put_number(out, counts_word + 1, self.page_count.unwrap_or(1 + data_pages as u64) as f64);
		self.put_number(out, counts_word + 2, self.last_page_records.unwrap_or(last as u64) as f64);

		for (idx, (field, slot, word_number)) in entries.into_iter().enumerate() {
			let base = fields_word + idx * 7;
			if (base + 7) * self.precision.word_size() > out.len() {
				break;
			}
			self.put_text(out, base, 2, &field.name);
			self.put_text(out, base + 2, 1, if field.numeric { "N" } else { "A" });
			self.put_number(out, base + 3, slot as f64);
			self.put_number(out, base + 4, word_number as f64);
			self.put_text(out, base + 5, 1, "");
			match &field.implicit {
				Some(Datum::Num(value)) => self.put_number(out, base + 6, *value),
				Some(Datum::Text(value)) => self.put_text(out, base + 6, 1, value),
				None if field.numeric => self.put_number(out, base + 6, 0.0),
				None => self.put_text(out, base + 6, 1, ""),
			}
		}
	}

	fn write_row(&self, out: &mut [u8], row: &[Datum]) {
		let mut word = 0;
		let mut values = row.iter();
		for field in self.fields.iter().filter(|field| field.implicit.is_none()) {
			match values.next() {
				Some(Datum::Num(value)) => self.put_number(out, word, *value),
				Some(Datum::Text(value)) => self.put_text(out, word, field.words, value),
				None => {}
			}
			word += field.words;
		}
	}

	fn put_number(&self, out: &mut [u8], word: usize, value: f64) {
		let ws = self.precision.word_size();
		let dst = &mut out[word * ws..(word + 1) * ws];
		match (self.precision, self.order) {
			(Precision::Single, ByteOrder::Little) => dst.copy_from_slice(&(value as f32).to_le_bytes()),
			(Precision::Single, ByteOrder::Big) => dst.copy_from_slice(&(value as f32).to_be_bytes()),
			(Precision::Extended, ByteOrder::Little) => dst.copy_from_slice(&value.to_le_bytes()),
			(Precision::Extended, ByteOrder::Big) => dst.copy_from_slice(&value.to_be_bytes()),
		}
	}

	fn put_text(&self, out: &mut [u8], word: usize, words: usize, value: &str) {
		let ws = self.precision.word_size();
		let bytes = value.as_bytes();
		for idx in 0..words {
			let dst = &mut out[(word + idx) * ws..(word + idx + 1) * ws];
			dst.fill(b' ');
			for (offset, slot) in dst.iter_mut().take(4).enumerate() {
				if let Some(byte) = bytes.get(idx * 4 + offset) {
					*slot = *byte;
				}
			}
		}
	}
}

/// Create a scratch directory removed on drop.
pub fn scratch_dir() -> tempfile::TempDir {
	tempfile::tempdir().expect("temp dir creates")
}

#[cfg(test)]
mod tests {
	use super::{DmBuilder, num, text};

	#[test]
	fn lays_out_pages_for_rows() {
		let builder = DmBuilder::new().numeric("XP").alpha("NAME", 2);
		assert_eq!(builder.record_len(), 3);
		assert_eq!(builder.records_per_page(), 169);

		let mut builder = builder;
		for idx in 0..200 {
			builder = builder.row(vec![num(idx as f64), text("ABCDEFGH")]);
		}
		let bytes = builder.to_bytes();
		assert_eq!(bytes.len(), 2048 * 3);
	}

	#[test]
	fn empty_file_is_header_only() {
		let bytes = DmBuilder::new().extended().numeric("XP").to_bytes();
		assert_eq!(bytes.len(), 4096);
	}
}
