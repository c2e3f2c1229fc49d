use std::io::Read;

use tracing::{debug, warn};

use crate::dm::bytes::{Words, read_full};
use crate::dm::format::{BASE_PAGE_SIZE, USABLE_WORDS_PER_PAGE, date_is_plausible, sentinel_order};
use crate::dm::text::{MAX_NAME_LEN, names_match, truncate_name};
use crate::dm::{DmError, Endianness, FormatConfig, Result, Value, Width, detect_endianness};

/// Words occupied by one field entry in the header.
pub const FIELD_ENTRY_WORDS: usize = 7;
/// Header word holding the `YYYYMMDD` modification date.
pub const DATE_WORD: usize = 24;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
	/// Single numeric word.
	Numeric,
	/// Four ASCII characters per word.
	Alphanumeric,
}

impl FieldType {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Numeric => "numeric",
			Self::Alphanumeric => "alphanumeric",
		}
	}
}

/// One schema entry.
///
/// Alphanumeric fields wider than one word appear as consecutive entries
/// sharing a name, each with its own `word_number`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
	/// Trimmed field name.
	pub name: String,
	/// Declared type.
	pub field_type: FieldType,
	/// 1-based word slot within a record; `0` marks an implicit field.
	pub position: usize,
	/// 1-based word index within a multi-word field.
	pub word_number: usize,
	/// Unit label.
	pub unit: String,
	/// Value used by implicit fields for every row.
	pub default: Value,
}

impl FieldSchema {
	/// Return `true` when the field stores no per-record bytes.
	pub fn is_implicit(&self) -> bool {
		self.position == 0
	}

	/// Return `true` for numeric fields.
	pub fn is_numeric(&self) -> bool {
		self.field_type == FieldType::Numeric
	}
}

/// Ordered field entries and the derived record length.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
	/// Entries in header order.
	pub fields: Vec<FieldSchema>,
	/// Words per record: entries minus implicit entries.
	pub record_len: usize,
}

impl Schema {
	/// Build a schema, deriving the record length from the entries.
	pub fn new(fields: Vec<FieldSchema>) -> Self {
		let mut record_len = fields.len();
		for field in &fields {
			if field.is_implicit() {
				record_len -= 1;
			}
		}
		Self { fields, record_len }
	}

	/// Index of the first entry named `name`.
	pub fn position(&self, name: &str) -> Option<usize> {
		self.fields.iter().position(|field| names_match(&field.name, name))
	}

	/// First entry named `name`.
	pub fn field(&self, name: &str) -> Option<&FieldSchema> {
		self.position(name).and_then(|idx| self.fields.get(idx))
	}

	/// Return `true` when an entry named `name` exists.
	pub fn has(&self, name: &str) -> bool {
		self.position(name).is_some()
	}

	/// Records held by one full data page.
	pub fn records_per_page(&self) -> u64 {
		if self.record_len == 0 {
			return 0;
		}
		(USABLE_WORDS_PER_PAGE / self.record_len) as u64
	}
}

/// Word positions of the header counts, which differ by width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLayout {
	/// Word holding the schema entry count.
	pub entry_count_word: usize,
	/// Word holding the physical page count.
	pub page_count_word: usize,
	/// Word holding the record count of the final page.
	pub last_page_word: usize,
	/// First word of the field entry table.
	pub fields_word: usize,
}

impl HeaderLayout {
	/// Layout for a word width. Extended files keep the width sentinel in word 25.
	pub fn for_width(width: Width) -> Self {
		let shift = match width {
			Width::W32 => 0,
			Width::W64 => 1,
		};
		Self {
			entry_count_word: 25 + shift,
			page_count_word: 26 + shift,
			last_page_word: 27 + shift,
			fields_word: 28 + shift,
		}
	}
}

/// Parsed header page.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
	/// Width and byte order used for every later read.
	pub config: FormatConfig,
	/// Stored file name.
	pub file_name: String,
	/// Stored directory name.
	pub directory: String,
	/// Free-text description.
	pub description: String,
	/// Owner name.
	pub owner: String,
	/// Owner permission word.
	pub owner_permissions: f64,
	/// Permission word for everyone else.
	pub other_permissions: f64,
	/// Last-modified date as `YYYYMMDD`.
	pub modified: i64,
	/// Declared schema entries, implicit ones included.
	pub entry_count: usize,
	/// Physical pages including the header page.
	pub page_count: u64,
	/// Records stored on the final page.
	pub last_page_records: u64,
	/// Field schema.
	pub schema: Schema,
}

impl FileHeader {
	/// Bytes needed before width detection is possible.
	pub const MIN_SIZE: usize = BASE_PAGE_SIZE;

	/// Read the header page from the start of `reader`.
	///
	/// The second half of an extended header is only read once the width
	/// sentinel has been seen in the first half.
	pub fn read_from(reader: &mut impl Read) -> Result<Self> {
		let mut bytes = vec![0_u8; BASE_PAGE_SIZE];
		let have = read_full(reader, &mut bytes)?;
		if have < BASE_PAGE_SIZE {
			return Err(DmError::HeaderTooShort {
				have,
				need: BASE_PAGE_SIZE,
			});
		}

		let need = Width::W64.page_size();
		if sentinel_order(&bytes).is_some() {
			bytes.resize(need, 0);
			let more = read_full(reader, &mut bytes[BASE_PAGE_SIZE..])?;
			if more < need - BASE_PAGE_SIZE {
				return Err(DmError::HeaderTooShort {
					have: BASE_PAGE_SIZE + more,
					need,
				});
			}
		}

		Self::parse(&bytes)
	}

	/// Parse a header from the beginning of `bytes`.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		if bytes.len() < BASE_PAGE_SIZE {
			return Err(DmError::HeaderTooShort {
				have: bytes.len(),
				need: BASE_PAGE_SIZE,
			});
		}

		let sentinel = sentinel_order(bytes);
		let width = if sentinel.is_some() { Width::W64 } else { Width::W32 };
		let need = width.page_size();
		if bytes.len() < need {
			return Err(DmError::HeaderTooShort { have: bytes.len(), need });
		}

		let word_size = width.word_size();
		let date_word = &bytes[DATE_WORD * word_size..(DATE_WORD + 1) * word_size];
		let endianness = resolve_endianness(date_word, width, sentinel)?;
		let config = FormatConfig { width, endianness };
		debug!(width = width.as_str(), endianness = endianness.as_str(), "detected header format");

		let words = Words::new(&bytes[..need], 0, config);
		let layout = HeaderLayout::for_width(width);

		let entry_count = words.count(layout.entry_count_word, "schema entry count is not a count")? as usize;
		let date_known = [Endianness::Little, Endianness::Big]
			.into_iter()
			.any(|order| date_is_plausible(date_word, width, order));
		if entry_count == 0 && !date_known {
			return Err(DmError::Corrupt {
				at: words.offset_of(layout.entry_count_word),
				reason: "no schema entries and no plausible date",
			});
		}

		let table_end = layout.fields_word + entry_count * FIELD_ENTRY_WORDS;
		if table_end > words.len() {
			return Err(DmError::Corrupt {
				at: words.offset_of(layout.entry_count_word),
				reason: "schema entries overflow the header page",
			});
		}

		let schema = parse_schema(&words, layout.fields_word, entry_count)?;
		if schema.record_len > USABLE_WORDS_PER_PAGE {
			return Err(DmError::Corrupt {
				at: words.offset_of(layout.entry_count_word),
				reason: "record length exceeds page capacity",
			});
		}

		let page_count = words.count(layout.page_count_word, "page count is not a count")?;
		let last_page_records = words.count(layout.last_page_word, "last page record count is not a count")?;
		if page_count >= 2 && last_page_records > schema.records_per_page() {
			return Err(DmError::Corrupt {
				at: words.offset_of(layout.last_page_word),
				reason: "last page holds more records than a page can",
			});
		}

		Ok(Self {
			config,
			file_name: words.text(0, 2)?,
			directory: words.text(2, 2)?,
			description: words.text(4, 16)?,
			owner: words.text(20, 2)?,
			owner_permissions: words.number(22)?,
			other_permissions: words.number(23)?,
			modified: words.number(DATE_WORD)?.round() as i64,
			entry_count,
			page_count,
			last_page_records,
			schema,
		})
	}

	/// Bytes occupied by the header page.
	pub fn header_size(&self) -> usize {
		self.config.page_size()
	}

	/// Records held by one full data page.
	pub fn records_per_page(&self) -> u64 {
		self.schema.records_per_page()
	}

	/// Total records: full pages before the last plus the final page's count.
	pub fn record_count(&self) -> u64 {
		if self.page_count < 2 {
			return 0;
		}
		(self.page_count - 2) * self.records_per_page() + self.last_page_records
	}
}

fn resolve_endianness(date_word: &[u8], width: Width, sentinel: Option<Endianness>) -> Result<Endianness> {
	let by_date = detect_endianness(date_word, width);
	let plausible = date_is_plausible(date_word, width, by_date);

	match sentinel {
		None => {
			if !plausible {
				warn!("modification date is implausible in either byte order, assuming swapped numerics");
			}
			Ok(by_date)
		}
		Some(order) if !plausible || order == by_date => Ok(order),
		Some(_) => Err(DmError::UnsupportedByteOrder),
	}
}

fn parse_schema(words: &Words<'_>, start: usize, entry_count: usize) -> Result<Schema> {
	let mut fields = Vec::with_capacity(entry_count);
	let mut record_len = entry_count;
	let mut position_words = Vec::with_capacity(entry_count);

	for entry in 0..entry_count {
		let base = start + entry * FIELD_ENTRY_WORDS;
		let name = truncate_name(&words.text(base, 2)?, MAX_NAME_LEN);
		let field_type = match words.chunk(base + 2)?[0] {
			b'N' => FieldType::Numeric,
			_ => FieldType::Alphanumeric,
		};
		let position = words.count(base + 3, "field position is not a count")? as usize;
		let word_number = words.count(base + 4, "field word number is not a count")? as usize;
		let unit = words.text(base + 5, 1)?;
		let default = match field_type {
			FieldType::Numeric => Value::Number(words.number(base + 6)?),
			FieldType::Alphanumeric => Value::Text(words.chunk(base + 6)?),
		};

		if position == 0 {
			record_len -= 1;
		}
		position_words.push(base + 3);
		fields.push(FieldSchema {
			name,
			field_type,
			position,
			word_number,
			unit,
			default,
		});
	}

	for (field, word) in fields.iter().zip(position_words) {
		if field.position > record_len {
			return Err(DmError::Corrupt {
				at: words.offset_of(word),
				reason: "field position lies outside the record",
			});
		}
	}

	let schema = Schema::new(fields);
	debug_assert_eq!(schema.record_len, record_len);
	Ok(schema)
}
