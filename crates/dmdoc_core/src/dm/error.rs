use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, DmError>;

/// Errors produced while reading and reconstructing DataMine files.
#[derive(Debug, Error)]
pub enum DmError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Fewer header bytes were available than the detected width requires.
	#[error("header too short: have {have} bytes, need {need}")]
	HeaderTooShort {
		/// Bytes available.
		have: usize,
		/// Bytes required for the header page.
		need: usize,
	},
	/// Header or page structure failed a consistency check.
	#[error("corrupt file at byte {at}: {reason}")]
	Corrupt {
		/// File byte offset of the offending word.
		at: u64,
		/// Failed check.
		reason: &'static str,
	},
	/// A data page ended before the bytes it must contain.
	#[error("truncated file at byte {at}: need {need} bytes, got {have}")]
	TruncatedFile {
		/// File byte offset where the page read started.
		at: u64,
		/// Bytes required.
		need: usize,
		/// Bytes actually read.
		have: usize,
	},
	/// Byte order that this reader cannot express.
	#[error("unsupported byte order")]
	UnsupportedByteOrder,
	/// Cell referenced a point id absent from the point file.
	#[error("dangling point reference in cell row {row}: id {id}")]
	DanglingPointReference {
		/// Row in the cell file.
		row: u64,
		/// Unresolved point id.
		id: f64,
	},
	/// Requested record lies past the end of the file.
	#[error("record {index} out of range (count={count})")]
	RecordOutOfRange {
		/// Requested record index.
		index: u64,
		/// Records in the file.
		count: u64,
	},
	/// Required field is not declared in the schema.
	#[error("field not found: {name}")]
	FieldNotFound {
		/// Requested field name.
		name: String,
	},
	/// Field exists but has the wrong type for its role.
	#[error("field {name} must be {expected}")]
	FieldTypeMismatch {
		/// Field name.
		name: String,
		/// Expected type label.
		expected: &'static str,
	},
	/// Topology builder operation called in the wrong stage.
	#[error("topology builder is {stage}, expected {expected}")]
	BuildOrder {
		/// Current stage label.
		stage: &'static str,
		/// Stage the operation requires.
		expected: &'static str,
	},
	/// File holds a plain table without geometry fields.
	#[error("file has no point or cell geometry")]
	NotGeometry,
	/// Companion point file for a cell file could not be located.
	#[error("companion point file not found for {path}")]
	CompanionNotFound {
		/// Cell file path.
		path: String,
	},
}
