use std::path::PathBuf;

use dmdoc::dm::{
	Attribute, BuildOptions, BuildReport, ColumnValues, DanglingPolicy, DmError, Mesh, Scope, companion_points_path, decode_wireframe, decode_with,
};

use crate::cmd::util::emit_json;

#[derive(clap::Args)]
pub struct Args {
	/// Cell file, or a point file when no cell file is involved.
	pub file: PathBuf,
	#[arg(long)]
	pub points: Option<PathBuf>,
	#[arg(long)]
	pub stopes: Option<PathBuf>,
	#[arg(long = "point-id", default_value = "PID")]
	pub point_id_field: String,
	#[arg(long = "stope-field", default_value = "STOPE")]
	pub stope_field: String,
	/// Stope numerics copied to every cell instead of divided.
	#[arg(long = "undivided")]
	pub undivided: Vec<String>,
	/// Divide cell-file numerics across each run of cells sharing a stope id.
	#[arg(long = "segment-cells")]
	pub segment_cells: bool,
	#[arg(long)]
	pub strict: bool,
	#[arg(long)]
	pub json: bool,
}

/// Assemble a mesh from point, cell, and stope files and summarize it.
pub fn run(args: Args) -> dmdoc::dm::Result<()> {
	let Args {
		file: path,
		points,
		stopes,
		point_id_field,
		stope_field,
		undivided,
		segment_cells,
		strict,
		json,
	} = args;

	let options = BuildOptions {
		point_id_field,
		stope_field,
		undivided_stope_fields: undivided,
		segment_cell_numerics: segment_cells,
		on_dangling: if strict { DanglingPolicy::Fail } else { DanglingPolicy::Skip },
		..BuildOptions::default()
	};

	let (mesh, report) = if points.is_none() && stopes.is_none() {
		decode_with(&path, &options)?
	} else {
		let points = match points {
			Some(points) => points,
			None => companion_points_path(&path).ok_or_else(|| DmError::CompanionNotFound {
				path: path.display().to_string(),
			})?,
		};
		decode_wireframe(&points, &path, stopes.as_deref(), &options)?
	};

	if json {
		let payload = MeshJson {
			path: path.display().to_string(),
			points: mesh.points.len(),
			cells: mesh.cells.len(),
			triangles: count_kind(&mesh, "triangle"),
			lines: count_kind(&mesh, "line"),
			vertices: count_kind(&mesh, "vertex"),
			report: ReportJson::from(report),
			point_data: mesh.attributes(Scope::Point).iter().map(attribute_to_json).collect(),
			cell_data: mesh.attributes(Scope::Cell).iter().map(attribute_to_json).collect(),
		};
		emit_json(&payload);
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("points: {}", mesh.points.len());
	println!("cells: {}", mesh.cells.len());
	println!("triangles: {}", count_kind(&mesh, "triangle"));
	println!("lines: {}", count_kind(&mesh, "line"));
	println!("vertices: {}", count_kind(&mesh, "vertex"));
	println!("dangling_cells: {}", report.dangling_cells);
	println!("duplicate_point_ids: {}", report.duplicate_point_ids);
	println!("stope_rows: {}", report.stope_rows);
	println!("unmatched_stope_cells: {}", report.unmatched_stope_cells);
	println!();
	println!("scope\tname\tkind\tlen");
	for (scope, label) in [(Scope::Point, "point"), (Scope::Cell, "cell")] {
		for item in mesh.attributes(scope) {
			println!("{label}\t{}\t{}\t{}", item.name, value_kind(&item.values), item.values.len());
		}
	}

	Ok(())
}

fn count_kind(mesh: &Mesh, kind: &str) -> usize {
	mesh.cells.iter().filter(|cell| cell.kind_label() == kind).count()
}

fn value_kind(values: &ColumnValues) -> &'static str {
	match values {
		ColumnValues::Numeric(_) => "numeric",
		ColumnValues::Text(_) => "text",
	}
}

fn attribute_to_json(item: &Attribute) -> AttributeJson {
	AttributeJson {
		name: item.name.clone(),
		kind: value_kind(&item.values).to_owned(),
		len: item.values.len(),
	}
}

#[derive(serde::Serialize)]
struct MeshJson {
	path: String,
	points: usize,
	cells: usize,
	triangles: usize,
	lines: usize,
	vertices: usize,
	report: ReportJson,
	point_data: Vec<AttributeJson>,
	cell_data: Vec<AttributeJson>,
}

#[derive(serde::Serialize)]
struct ReportJson {
	dangling_cells: usize,
	duplicate_point_ids: usize,
	stope_rows: usize,
	unmatched_stope_cells: usize,
}

impl From<BuildReport> for ReportJson {
	fn from(report: BuildReport) -> Self {
		Self {
			dangling_cells: report.dangling_cells,
			duplicate_point_ids: report.duplicate_point_ids,
			stope_rows: report.stope_rows,
			unmatched_stope_cells: report.unmatched_stope_cells,
		}
	}
}

#[derive(serde::Serialize)]
struct AttributeJson {
	name: String,
	kind: String,
	len: usize,
}
