use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::dm::{BuildOptions, BuildReport, Cell, DmError, FileHeader, Mesh, PagedReader, Result, Schema, TopologyBuilder};

/// Geometry role of a file, judged from its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
	/// Coordinates per row.
	Points,
	/// Three point references per row.
	Triangles,
	/// Two point references per row.
	Lines,
	/// One point reference per row.
	Vertices,
	/// No geometry fields.
	Table,
}

impl FileKind {
	/// Classify a schema using the field names in `options`.
	pub fn classify(schema: &Schema, options: &BuildOptions) -> Self {
		let references = options.cell_id_fields.iter().take_while(|name| schema.has(name)).count();
		match references {
			3 => return Self::Triangles,
			2 => return Self::Lines,
			1 => return Self::Vertices,
			_ => {}
		}
		if options.coordinate_fields.iter().all(|name| schema.has(name)) {
			return Self::Points;
		}
		Self::Table
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Points => "points",
			Self::Triangles => "triangles",
			Self::Lines => "lines",
			Self::Vertices => "vertices",
			Self::Table => "table",
		}
	}
}

/// Cheap check that `path` starts with a parseable DataMine header.
pub fn can_decode(path: impl AsRef<Path>) -> bool {
	let Ok(mut file) = File::open(path.as_ref()) else {
		return false;
	};
	FileHeader::read_from(&mut file).is_ok()
}

/// Decode one file into a mesh with default options.
///
/// Point files become point clouds with a vertex per point. Cell files are
/// paired with their companion point file (see [`companion_points_path`]).
pub fn decode(path: impl AsRef<Path>) -> Result<Mesh> {
	let (mesh, _) = decode_with(path, &BuildOptions::default())?;
	Ok(mesh)
}

/// Decode one file into a mesh, returning the build counts as well.
pub fn decode_with(path: impl AsRef<Path>, options: &BuildOptions) -> Result<(Mesh, BuildReport)> {
	let path = path.as_ref();
	let mut reader = PagedReader::open(path)?;
	let kind = FileKind::classify(reader.schema(), options);
	debug!(path = %path.display(), kind = kind.as_str(), "dispatching decode");

	match kind {
		FileKind::Points => {
			let mut builder = TopologyBuilder::new(options.clone());
			builder.load_points(&mut reader)?;
			let (mut mesh, mut report) = builder.finish()?;
			mesh.cells = (0..mesh.points.len()).map(Cell::Vertex).collect();
			report.cells = mesh.cells.len();
			Ok((mesh, report))
		}
		FileKind::Triangles | FileKind::Lines | FileKind::Vertices => {
			let points = companion_points_path(path).ok_or_else(|| DmError::CompanionNotFound {
				path: path.display().to_string(),
			})?;
			let mut point_reader = PagedReader::open(points)?;
			build(options, &mut point_reader, &mut reader, None)
		}
		FileKind::Table => Err(DmError::NotGeometry),
	}
}

/// Decode a point file, a cell file, and an optional stope summary.
pub fn decode_wireframe(points: impl AsRef<Path>, cells: impl AsRef<Path>, stopes: Option<&Path>, options: &BuildOptions) -> Result<(Mesh, BuildReport)> {
	let mut point_reader = PagedReader::open(points)?;
	let mut cell_reader = PagedReader::open(cells)?;
	let mut stope_reader = stopes.map(PagedReader::open).transpose()?;
	build(options, &mut point_reader, &mut cell_reader, stope_reader.as_mut())
}

/// Point file paired with a cell file: the trailing `tr` of the stem becomes `pt`.
///
/// The replacement keeps the suffix case (`TR` becomes `PT`). Returns `None` when
/// the stem has no such suffix or the file does not exist.
pub fn companion_points_path(cells: &Path) -> Option<PathBuf> {
	let stem = cells.file_stem()?.to_str()?;
	let split = stem.len().checked_sub(2)?;
	let (base, suffix) = (stem.get(..split)?, stem.get(split..)?);
	let replacement = match suffix {
		"tr" => "pt",
		"TR" => "PT",
		"Tr" => "Pt",
		"tR" => "pT",
		_ => return None,
	};

	let mut name = format!("{base}{replacement}");
	if let Some(ext) = cells.extension().and_then(|ext| ext.to_str()) {
		name.push('.');
		name.push_str(ext);
	}
	let candidate = cells.with_file_name(name);
	candidate.is_file().then_some(candidate)
}

fn build(options: &BuildOptions, points: &mut PagedReader, cells: &mut PagedReader, stopes: Option<&mut PagedReader>) -> Result<(Mesh, BuildReport)> {
	let mut builder = TopologyBuilder::new(options.clone());
	builder.load_points(points)?;
	builder.load_cells(cells)?;
	if let Some(stopes) = stopes {
		builder.join_stopes(stopes)?;
	}
	builder.finish()
}
