mod bytes;
mod decode;
mod error;
mod file;
mod format;
mod header;
mod mesh;
mod point_index;
mod property;
mod reader;
mod text;
mod topology;
mod value;

/// Word-level view over record and header bytes.
pub use bytes::Words;
/// Field-level and record-level decoding.
pub use decode::{decode_field, decode_record};
/// Error and result aliases.
pub use error::{DmError, Result};
/// Whole-file entry points and companion lookup.
pub use file::{FileKind, can_decode, companion_points_path, decode, decode_wireframe, decode_with};
/// Word width, byte order, and detection helpers.
pub use format::{Endianness, FormatConfig, Width, detect_endianness, detect_width, swap_word};
/// File header and field schema.
pub use header::{FieldSchema, FieldType, FileHeader, HeaderLayout, Schema};
/// Reconstructed geometry and attributes.
pub use mesh::{Attribute, Cell, Mesh, Scope};
/// External point id lookup.
pub use point_index::PointIndex;
/// Columnar attribute accumulation.
pub use property::{Activation, ColumnValues, PropertyColumn, PropertyStore};
/// Paged record access.
pub use reader::{PageStats, PagedReader, RecordBytes, Records};
/// Fixed-width text helpers.
pub use text::{MAX_NAME_LEN, names_match, trim_text};
/// Staged mesh construction.
pub use topology::{BuildOptions, BuildReport, BuildStage, DanglingPolicy, TopologyBuilder};
/// Decoded field values and records.
pub use value::{Record, Value};
