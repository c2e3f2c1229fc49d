use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::trace;

use crate::dm::bytes::{Words, read_full};
use crate::dm::{DmError, FileHeader, FormatConfig, Record, Result, Schema, decode_record};

/// Page I/O counters for one reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStats {
	/// Pages read from the source.
	pub page_loads: u64,
	/// Explicit seeks issued before a page read.
	pub seeks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
	Sequential,
	Random,
}

/// Fixed-length record reader over paged storage with a one-page cache.
///
/// The reader owns its source; dropping it releases the file handle. Reads
/// must not be interleaved: every call may replace the cached page.
#[derive(Debug)]
pub struct PagedReader<R = File> {
	header: FileHeader,
	source: R,
	page: Vec<u8>,
	cached_page: Option<u64>,
	source_page: Option<u64>,
	stats: PageStats,
}

impl PagedReader<File> {
	/// Open a file and parse its header.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		Self::new(File::open(path)?)
	}
}

impl<R: Read + Seek> PagedReader<R> {
	/// Parse the header from the start of `source`.
	pub fn new(mut source: R) -> Result<Self> {
		source.seek(SeekFrom::Start(0))?;
		let header = FileHeader::read_from(&mut source)?;
		let page = vec![0_u8; header.config.page_size()];

		Ok(Self {
			header,
			source,
			page,
			cached_page: None,
			source_page: Some(0),
			stats: PageStats::default(),
		})
	}

	/// Parsed header.
	pub fn header(&self) -> &FileHeader {
		&self.header
	}

	/// Field schema.
	pub fn schema(&self) -> &Schema {
		&self.header.schema
	}

	/// Width and byte order.
	pub fn config(&self) -> FormatConfig {
		self.header.config
	}

	/// Records in the file.
	pub fn record_count(&self) -> u64 {
		self.header.record_count()
	}

	/// Records held by one full data page.
	pub fn records_per_page(&self) -> u64 {
		self.header.records_per_page()
	}

	/// Page I/O counters so far.
	pub fn stats(&self) -> PageStats {
		self.stats
	}

	/// Read record `index`, continuing from the source position when possible.
	pub fn read_sequential(&mut self, index: u64) -> Result<RecordBytes<'_>> {
		self.locate(index, Access::Sequential)
	}

	/// Read record `index`, seeking whenever its page is not cached.
	pub fn read_random(&mut self, index: u64) -> Result<RecordBytes<'_>> {
		self.locate(index, Access::Random)
	}

	/// Decode record `index` into owned values.
	pub fn read_record(&mut self, index: u64) -> Result<Record> {
		self.read_random(index)?.decode()
	}

	/// Iterate every record in file order.
	pub fn records(&mut self) -> Records<'_, R> {
		Records {
			count: self.record_count(),
			reader: self,
			next: 0,
			done: false,
		}
	}

	fn locate(&mut self, index: u64, access: Access) -> Result<RecordBytes<'_>> {
		let count = self.record_count();
		if index >= count {
			return Err(DmError::RecordOutOfRange { index, count });
		}

		let per_page = self.records_per_page();
		let page = index / per_page;
		if self.cached_page != Some(page) {
			self.load_page(page, access)?;
		}

		let record_bytes = self.header.schema.record_len * self.header.config.word_size();
		let start = (index % per_page) as usize * record_bytes;
		let base = self.page_offset(page) + start as u64;
		let bytes = self.page.get(start..start + record_bytes).ok_or(DmError::Corrupt {
			at: base,
			reason: "record lies outside its page",
		})?;

		Ok(RecordBytes {
			index,
			page,
			words: Words::new(bytes, base, self.header.config),
			schema: &self.header.schema,
		})
	}

	fn load_page(&mut self, page: u64, access: Access) -> Result<()> {
		let offset = self.page_offset(page);
		let must_seek = match access {
			Access::Sequential => self.source_page != Some(page),
			Access::Random => true,
		};
		if must_seek {
			self.source.seek(SeekFrom::Start(offset))?;
			self.stats.seeks += 1;
		}

		self.cached_page = None;
		self.source_page = None;
		let have = read_full(&mut self.source, &mut self.page)?;
		self.stats.page_loads += 1;

		let is_last = page + 2 == self.header.page_count;
		let need = if is_last {
			self.header.last_page_records as usize * self.header.schema.record_len * self.header.config.word_size()
		} else {
			self.page.len()
		};
		if have < need {
			return Err(DmError::TruncatedFile { at: offset, need, have });
		}

		trace!(page, offset, bytes = have, "loaded data page");
		self.cached_page = Some(page);
		if have == self.page.len() {
			self.source_page = Some(page + 1);
		}
		Ok(())
	}

	fn page_offset(&self, page: u64) -> u64 {
		let page_size = self.header.config.page_size() as u64;
		self.header.header_size() as u64 + page * page_size
	}
}

/// Bounds-checked view of one record inside the cached page.
#[derive(Debug, Clone, Copy)]
pub struct RecordBytes<'a> {
	/// Record index within the file.
	pub index: u64,
	/// Data page holding the record.
	pub page: u64,
	words: Words<'a>,
	schema: &'a Schema,
}

impl<'a> RecordBytes<'a> {
	/// Word-level view of the record bytes.
	pub fn words(&self) -> Words<'a> {
		self.words
	}

	/// Schema the record is laid out by.
	pub fn schema(&self) -> &'a Schema {
		self.schema
	}

	/// Decode every field of the record.
	pub fn decode(&self) -> Result<Record> {
		decode_record(self.schema, self)
	}
}

/// Iterator over decoded records in file order.
pub struct Records<'r, R> {
	reader: &'r mut PagedReader<R>,
	next: u64,
	count: u64,
	done: bool,
}

impl<R: Read + Seek> Iterator for Records<'_, R> {
	type Item = Result<Record>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done || self.next >= self.count {
			return None;
		}

		let index = self.next;
		self.next += 1;
		let record = self.reader.read_sequential(index).and_then(|bytes| bytes.decode());
		if record.is_err() {
			self.done = true;
		}
		Some(record)
	}
}

#[cfg(test)]
mod tests;
