use std::io::{ErrorKind, Read};

use crate::dm::text::trim_text;
use crate::dm::{DmError, FormatConfig, Result};

/// Bytes of text carried by one word, whatever the word width.
pub const TEXT_BYTES_PER_WORD: usize = 4;

/// Bounded word-indexed view over an immutable byte slice.
///
/// `base` is the file offset of `bytes[0]`, used only for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct Words<'a> {
	bytes: &'a [u8],
	base: u64,
	config: FormatConfig,
}

impl<'a> Words<'a> {
	/// Create a view whose first byte sits at file offset `base`.
	pub fn new(bytes: &'a [u8], base: u64, config: FormatConfig) -> Self {
		Self { bytes, base, config }
	}

	/// Number of whole words in the view.
	pub fn len(&self) -> usize {
		self.bytes.len() / self.config.word_size()
	}

	/// Return `true` when the view holds no whole word.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// File offset of word `idx`.
	pub fn offset_of(&self, idx: usize) -> u64 {
		self.base + (idx * self.config.word_size()) as u64
	}

	/// Raw bytes of word `idx`.
	pub fn word(&self, idx: usize) -> Result<&'a [u8]> {
		let size = self.config.word_size();
		let start = idx.checked_mul(size).ok_or(DmError::Corrupt {
			at: self.base,
			reason: "word index overflow",
		})?;
		self.bytes.get(start..start + size).ok_or(DmError::Corrupt {
			at: self.offset_of(idx),
			reason: "word lies outside its page",
		})
	}

	/// Numeric word with the file's byte order applied.
	pub fn number(&self, idx: usize) -> Result<f64> {
		self.config.number(self.word(idx)?).ok_or(DmError::Corrupt {
			at: self.offset_of(idx),
			reason: "word has the wrong width",
		})
	}

	/// Leading text bytes of word `idx`, never swapped.
	pub fn chunk(&self, idx: usize) -> Result<[u8; TEXT_BYTES_PER_WORD]> {
		let raw = self.word(idx)?;
		let mut out = [0_u8; TEXT_BYTES_PER_WORD];
		out.copy_from_slice(&raw[..TEXT_BYTES_PER_WORD]);
		Ok(out)
	}

	/// Trimmed text spanning `count` words from `start`.
	pub fn text(&self, start: usize, count: usize) -> Result<String> {
		let mut raw = Vec::with_capacity(count * TEXT_BYTES_PER_WORD);
		for idx in start..start + count {
			raw.extend_from_slice(&self.chunk(idx)?);
		}
		Ok(trim_text(&raw))
	}

	/// Numeric word that must hold a non-negative integer.
	pub fn count(&self, idx: usize, reason: &'static str) -> Result<u64> {
		let value = self.number(idx)?;
		if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
			return Err(DmError::Corrupt {
				at: self.offset_of(idx),
				reason,
			});
		}
		Ok(value as u64)
	}
}

/// Read until `buf` is full or the source is exhausted, returning bytes read.
pub fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
	let mut filled = 0;
	while filled < buf.len() {
		match reader.read(&mut buf[filled..]) {
			Ok(0) => break,
			Ok(read) => filled += read,
			Err(err) if err.kind() == ErrorKind::Interrupted => continue,
			Err(err) => return Err(err),
		}
	}
	Ok(filled)
}
