/// Size of one header read and of a W32 page.
pub const BASE_PAGE_SIZE: usize = 2048;
/// Words per data page available to records; the trailing words are reserved.
pub const USABLE_WORDS_PER_PAGE: usize = 508;
/// Byte offset of the 8-byte width sentinel (word 25 read as a double).
pub const WIDTH_SENTINEL_OFFSET: usize = 25 * 8;
/// Sentinel value marking an extended-precision file.
pub const WIDTH_SENTINEL: f64 = 456789.0;
/// Inclusive bounds of a plausible `YYYYMMDD` modification date.
pub const PLAUSIBLE_DATES: std::ops::RangeInclusive<i64> = 19720101..=99991231;

/// On-disk word width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
	/// Single precision files: 4-byte words, 2048-byte pages.
	W32,
	/// Extended precision files: 8-byte words, 4096-byte pages.
	W64,
}

impl Width {
	/// Bytes per word.
	pub fn word_size(self) -> usize {
		match self {
			Self::W32 => 4,
			Self::W64 => 8,
		}
	}

	/// Bytes per physical page.
	pub fn page_size(self) -> usize {
		self.word_size() * 512
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::W32 => "single",
			Self::W64 => "extended",
		}
	}
}

/// Byte order of multi-byte numeric words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
	/// Little-endian numerics, read as stored.
	Little,
	/// Big-endian numerics, swapped on every read.
	Big,
}

impl Endianness {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Little => "little",
			Self::Big => "big",
		}
	}
}

/// Width and byte order of one open file.
///
/// Produced once by header parsing and passed to every later read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
	/// Word width.
	pub width: Width,
	/// Numeric byte order.
	pub endianness: Endianness,
}

impl FormatConfig {
	/// Bytes per word.
	pub fn word_size(self) -> usize {
		self.width.word_size()
	}

	/// Bytes per page, also the header size.
	pub fn page_size(self) -> usize {
		self.width.page_size()
	}

	/// Decode one numeric word, widening to `f64`.
	///
	/// Returns `None` unless `word` is exactly one word long.
	pub fn number(self, word: &[u8]) -> Option<f64> {
		if word.len() != self.word_size() {
			return None;
		}
		let mut buf = [0_u8; 8];
		let buf = &mut buf[..word.len()];
		buf.copy_from_slice(word);
		if self.endianness == Endianness::Big {
			swap_word(buf);
		}
		let value = match self.width {
			Width::W32 => f64::from(f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])),
			Width::W64 => f64::from_le_bytes([buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7]]),
		};
		Some(value)
	}
}

/// Swap bytes pairwise from the outside in: `b[i] <-> b[len-1-i]` for `i < len/2`.
pub fn swap_word(word: &mut [u8]) {
	let len = word.len();
	for i in 0..len / 2 {
		word.swap(i, len - 1 - i);
	}
}

/// Pick the word width from the first header half.
///
/// The 8 bytes at [`WIDTH_SENTINEL_OFFSET`] are compared against
/// [`WIDTH_SENTINEL`] in either byte order.
pub fn detect_width(header: &[u8]) -> Width {
	match sentinel_order(header) {
		Some(_) => Width::W64,
		None => Width::W32,
	}
}

/// Byte order in which the width sentinel matched, if it matched at all.
pub(crate) fn sentinel_order(header: &[u8]) -> Option<Endianness> {
	let raw: [u8; 8] = header.get(WIDTH_SENTINEL_OFFSET..WIDTH_SENTINEL_OFFSET + 8)?.try_into().ok()?;
	if f64::from_le_bytes(raw) == WIDTH_SENTINEL {
		return Some(Endianness::Little);
	}
	if f64::from_be_bytes(raw) == WIDTH_SENTINEL {
		return Some(Endianness::Big);
	}
	None
}

/// Infer numeric byte order from the raw date word.
///
/// A date that decodes to a plausible `YYYYMMDD` value as stored means
/// little-endian; anything else is taken as byte-swapped.
pub fn detect_endianness(date_word: &[u8], width: Width) -> Endianness {
	if date_is_plausible(date_word, width, Endianness::Little) {
		Endianness::Little
	} else {
		Endianness::Big
	}
}

pub(crate) fn date_is_plausible(date_word: &[u8], width: Width, endianness: Endianness) -> bool {
	FormatConfig { width, endianness }
		.number(date_word)
		.is_some_and(|value| value.is_finite() && PLAUSIBLE_DATES.contains(&(value.round() as i64)))
}
