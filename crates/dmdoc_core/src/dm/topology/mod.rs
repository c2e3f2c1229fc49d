use std::io::{Read, Seek};
use std::mem;

use tracing::{debug, info, warn};

use crate::dm::point_index::id_key;
use crate::dm::text::names_match;
use crate::dm::{Activation, Cell, DmError, FieldSchema, Mesh, PagedReader, PointIndex, PropertyStore, Record, Result, Schema};

/// What to do with a cell that references an unknown point id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DanglingPolicy {
	/// Drop the cell, count it, and keep decoding.
	Skip,
	/// Abort with [`DmError::DanglingPointReference`].
	Fail,
}

/// Field names and policies used while assembling a mesh.
#[derive(Debug, Clone)]
pub struct BuildOptions {
	/// Point id field in the point file.
	pub point_id_field: String,
	/// Coordinate fields in the point file.
	pub coordinate_fields: [String; 3],
	/// Point id reference fields in the cell file, in cell order.
	pub cell_id_fields: [String; 3],
	/// Grouping field shared by the cell file and the stope summary.
	pub stope_field: String,
	/// Stope summary numerics copied to every cell without division.
	pub undivided_stope_fields: Vec<String>,
	/// Divide the cell file's own numerics across each run of cells sharing a stope id.
	pub segment_cell_numerics: bool,
	/// Handling of cells with unresolved point ids.
	pub on_dangling: DanglingPolicy,
}

impl Default for BuildOptions {
	fn default() -> Self {
		Self {
			point_id_field: "PID".to_owned(),
			coordinate_fields: ["XP".to_owned(), "YP".to_owned(), "ZP".to_owned()],
			cell_id_fields: ["PID1".to_owned(), "PID2".to_owned(), "PID3".to_owned()],
			stope_field: "STOPE".to_owned(),
			undivided_stope_fields: Vec::new(),
			segment_cell_numerics: false,
			on_dangling: DanglingPolicy::Skip,
		}
	}
}

/// Progress of a [`TopologyBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
	/// Nothing read yet.
	NotStarted,
	/// Point file ingested.
	PointsLoaded,
	/// Cell file ingested.
	CellsLoaded,
	/// Stope summary joined and segmented.
	Segmented,
	/// Mesh handed out; the builder accepts no more calls.
	Complete,
}

impl BuildStage {
	/// Stable label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::NotStarted => "not started",
			Self::PointsLoaded => "points loaded",
			Self::CellsLoaded => "cells loaded",
			Self::Segmented => "segmented",
			Self::Complete => "complete",
		}
	}
}

/// Counts collected while building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
	/// Points in the mesh.
	pub points: usize,
	/// Cells in the mesh.
	pub cells: usize,
	/// Cell rows dropped for unresolved point ids.
	pub dangling_cells: usize,
	/// Point rows whose id repeated an earlier row.
	pub duplicate_point_ids: usize,
	/// Rows read from the stope summary.
	pub stope_rows: usize,
	/// Cells whose stope id has no summary row.
	pub unmatched_stope_cells: usize,
}

/// Assembles a mesh from a point file, a cell file, and an optional stope summary.
///
/// Calls must follow the stage order; each stage reads its file sequentially.
#[derive(Debug)]
pub struct TopologyBuilder {
	options: BuildOptions,
	stage: BuildStage,
	index: PointIndex,
	mesh: Mesh,
	point_props: PropertyStore,
	cell_props: PropertyStore,
	stope_props: PropertyStore,
	cell_stopes: Option<Vec<f64>>,
	cell_stope_is_text: bool,
	report: BuildReport,
}

impl TopologyBuilder {
	/// Create a builder in [`BuildStage::NotStarted`].
	pub fn new(options: BuildOptions) -> Self {
		Self {
			options,
			stage: BuildStage::NotStarted,
			index: PointIndex::new(),
			mesh: Mesh::default(),
			point_props: PropertyStore::new(),
			cell_props: PropertyStore::new(),
			stope_props: PropertyStore::new(),
			cell_stopes: None,
			cell_stope_is_text: false,
			report: BuildReport::default(),
		}
	}

	/// Current stage.
	pub fn stage(&self) -> BuildStage {
		self.stage
	}

	/// Counts collected so far.
	pub fn report(&self) -> BuildReport {
		self.report
	}

	/// Scan the point file, indexing ids and collecting coordinates.
	///
	/// Without an id field, the row number serves as the id.
	pub fn load_points<R: Read + Seek>(&mut self, reader: &mut PagedReader<R>) -> Result<()> {
		self.expect_stage(BuildStage::NotStarted)?;

		let schema = reader.schema().clone();
		let coords = [
			numeric_slot(&schema, &self.options.coordinate_fields[0])?,
			numeric_slot(&schema, &self.options.coordinate_fields[1])?,
			numeric_slot(&schema, &self.options.coordinate_fields[2])?,
		];
		let id_slot = optional_numeric_slot(&schema, &self.options.point_id_field)?;

		let coordinate_fields = &self.options.coordinate_fields;
		self.point_props.declare_schema(&schema, |field| {
			if coordinate_fields.iter().any(|name| names_match(&field.name, name)) {
				Activation::Inactive
			} else {
				Activation::Active
			}
		});

		self.index = PointIndex::with_capacity(reader.record_count() as usize);
		for record in reader.records() {
			let record = record?;
			let row = self.mesh.points.len();
			let id = id_slot.map_or(row as f64, |slot| number_at(&record, slot));
			if let Some(previous) = self.index.set(id, row) {
				self.report.duplicate_point_ids += 1;
				debug!(id, previous, row, "duplicate point id, later row wins");
			}
			self.mesh.points.push(coords.map(|slot| number_at(&record, slot)));
			self.point_props.ingest(&record);
		}

		debug!(points = self.mesh.points.len(), "loaded points");
		self.stage = BuildStage::PointsLoaded;
		Ok(())
	}

	/// Scan the cell file, resolving point ids into cells.
	///
	/// Cell arity follows the leading run of id fields present in the schema.
	/// A numeric stope field records the stope id of every kept cell; a text
	/// one stays an ordinary cell property.
	pub fn load_cells<R: Read + Seek>(&mut self, reader: &mut PagedReader<R>) -> Result<()> {
		self.expect_stage(BuildStage::PointsLoaded)?;

		let schema = reader.schema().clone();
		let mut id_slots = Vec::with_capacity(3);
		for name in &self.options.cell_id_fields {
			match optional_numeric_slot(&schema, name)? {
				Some(slot) => id_slots.push(slot),
				None => break,
			}
		}
		if id_slots.is_empty() {
			return Err(DmError::FieldNotFound {
				name: self.options.cell_id_fields[0].clone(),
			});
		}
		let stope_position = schema.position(&self.options.stope_field);
		let stope_slot = stope_position.filter(|slot| schema.fields[*slot].is_numeric());
		self.cell_stope_is_text = stope_position.is_some() && stope_slot.is_none();

		let options = &self.options;
		let segmenting = options.segment_cell_numerics && stope_slot.is_some();
		self.cell_props.declare_schema(&schema, |field| cell_activation(options, field, segmenting));

		let mut stopes = stope_slot.map(|_| Vec::new());
		let mut run: Option<(u64, usize)> = None;
		for record in reader.records() {
			let record = record?;
			let mut points = [0_usize; 3];
			let mut dangling = None;
			for (point, slot) in points.iter_mut().zip(&id_slots) {
				let id = number_at(&record, *slot);
				match self.index.get(id) {
					Some(row) => *point = row,
					None => {
						dangling = Some(id);
						break;
					}
				}
			}

			if let Some(id) = dangling {
				if self.options.on_dangling == DanglingPolicy::Fail {
					return Err(DmError::DanglingPointReference { row: record.index, id });
				}
				self.report.dangling_cells += 1;
				debug!(row = record.index, id, "skipping cell with dangling point reference");
				continue;
			}

			let cell = match id_slots.len() {
				1 => Cell::Vertex(points[0]),
				2 => Cell::Line([points[0], points[1]]),
				_ => Cell::Triangle(points),
			};
			let stope = stope_slot.map(|slot| number_at(&record, slot));
			if let Some(stope) = stope.filter(|_| segmenting) {
				let key = id_key(stope);
				run = match run {
					Some((current, len)) if current == key => Some((current, len + 1)),
					Some((_, len)) => {
						self.cell_props.segment(len);
						Some((key, 1))
					}
					None => Some((key, 1)),
				};
			}

			self.mesh.cells.push(cell);
			self.cell_props.ingest(&record);
			if let (Some(stopes), Some(stope)) = (stopes.as_mut(), stope) {
				stopes.push(stope);
			}
		}
		if let Some((_, len)) = run {
			self.cell_props.segment(len);
		}

		if self.report.dangling_cells > 0 {
			warn!(skipped = self.report.dangling_cells, "cells referenced unknown point ids");
		}
		debug!(cells = self.mesh.cells.len(), "loaded cells");
		self.cell_stopes = stopes;
		self.stage = BuildStage::CellsLoaded;
		Ok(())
	}

	/// Join stope summary rows onto cells and spread their totals per stope.
	///
	/// Each contiguous run of cells sharing a stope id receives that stope's
	/// row once per cell; segmentable columns are then divided by the run
	/// length.
	pub fn join_stopes<R: Read + Seek>(&mut self, reader: &mut PagedReader<R>) -> Result<()> {
		self.expect_stage(BuildStage::CellsLoaded)?;
		let Some(cell_stopes) = self.cell_stopes.take() else {
			if self.cell_stope_is_text {
				return Err(DmError::FieldTypeMismatch {
					name: self.options.stope_field.clone(),
					expected: "numeric",
				});
			}
			return Err(DmError::FieldNotFound {
				name: self.options.stope_field.clone(),
			});
		};

		let schema = reader.schema().clone();
		let key_slot = numeric_slot(&schema, &self.options.stope_field)?;

		let mut stope_index = PointIndex::new();
		let mut rows: Vec<Record> = Vec::with_capacity(reader.record_count() as usize);
		for record in reader.records() {
			let record = record?;
			stope_index.set(number_at(&record, key_slot), rows.len());
			rows.push(record);
		}
		self.report.stope_rows = rows.len();

		let options = &self.options;
		self.stope_props.declare_schema(&schema, |field| stope_activation(options, field));

		let mut start = 0;
		while start < cell_stopes.len() {
			let key = id_key(cell_stopes[start]);
			let mut end = start + 1;
			while end < cell_stopes.len() && id_key(cell_stopes[end]) == key {
				end += 1;
			}

			match stope_index.get(cell_stopes[start]) {
				Some(row) => {
					for _ in start..end {
						self.stope_props.ingest(&rows[row]);
					}
				}
				None => {
					for _ in start..end {
						self.stope_props.ingest_absent();
					}
					self.report.unmatched_stope_cells += end - start;
				}
			}
			self.stope_props.segment(end - start);
			start = end;
		}

		debug!(stopes = rows.len(), cells = cell_stopes.len(), "joined stope summary");
		self.stage = BuildStage::Segmented;
		Ok(())
	}

	/// Attach properties and hand out the mesh. Later calls fail.
	pub fn finish(&mut self) -> Result<(Mesh, BuildReport)> {
		if !matches!(self.stage, BuildStage::PointsLoaded | BuildStage::CellsLoaded | BuildStage::Segmented) {
			return Err(DmError::BuildOrder {
				stage: self.stage.as_str(),
				expected: BuildStage::PointsLoaded.as_str(),
			});
		}

		let mut mesh = mem::take(&mut self.mesh);
		mem::take(&mut self.point_props).materialize_into(&mut mesh);
		mem::take(&mut self.cell_props).materialize_into(&mut mesh);
		mem::take(&mut self.stope_props).materialize_into(&mut mesh);
		self.index = PointIndex::new();

		self.report.points = mesh.points.len();
		self.report.cells = mesh.cells.len();
		self.stage = BuildStage::Complete;
		info!(
			points = self.report.points,
			cells = self.report.cells,
			dangling = self.report.dangling_cells,
			"mesh assembled"
		);
		Ok((mesh, self.report))
	}

	fn expect_stage(&self, expected: BuildStage) -> Result<()> {
		if self.stage != expected {
			return Err(DmError::BuildOrder {
				stage: self.stage.as_str(),
				expected: expected.as_str(),
			});
		}
		Ok(())
	}
}

fn cell_activation(options: &BuildOptions, field: &FieldSchema, segmenting: bool) -> Activation {
	if options.cell_id_fields.iter().any(|name| names_match(&field.name, name)) {
		return Activation::Inactive;
	}
	if segmenting && field.is_numeric() && !names_match(&field.name, &options.stope_field) {
		return Activation::Segmentable;
	}
	Activation::Active
}

fn stope_activation(options: &BuildOptions, field: &FieldSchema) -> Activation {
	if names_match(&field.name, &options.stope_field) {
		return Activation::Inactive;
	}
	if !field.is_numeric() || options.undivided_stope_fields.iter().any(|name| names_match(&field.name, name)) {
		return Activation::Active;
	}
	Activation::Segmentable
}

fn numeric_slot(schema: &Schema, name: &str) -> Result<usize> {
	optional_numeric_slot(schema, name)?.ok_or_else(|| DmError::FieldNotFound { name: name.to_owned() })
}

fn optional_numeric_slot(schema: &Schema, name: &str) -> Result<Option<usize>> {
	let Some(slot) = schema.position(name) else {
		return Ok(None);
	};
	if !schema.fields[slot].is_numeric() {
		return Err(DmError::FieldTypeMismatch {
			name: name.to_owned(),
			expected: "numeric",
		});
	}
	Ok(Some(slot))
}

fn number_at(record: &Record, slot: usize) -> f64 {
	record.values.get(slot).and_then(|value| value.as_number()).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests;
