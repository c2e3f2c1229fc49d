use std::io::Cursor;

use dmdoc_testkit::{DmBuilder, num, text};

use crate::dm::{BuildOptions, BuildStage, Cell, ColumnValues, DanglingPolicy, DmError, PagedReader, Scope, TopologyBuilder};

type MemReader = PagedReader<Cursor<Vec<u8>>>;

fn open(builder: DmBuilder) -> MemReader {
	PagedReader::new(Cursor::new(builder.to_bytes())).expect("reader opens")
}

fn points() -> MemReader {
	open(
		DmBuilder::new()
			.numeric("XP")
			.numeric("YP")
			.numeric("ZP")
			.numeric("PID")
			.num_row(&[0.0, 0.0, 0.0, 10.0])
			.num_row(&[1.0, 0.0, 0.0, 20.0])
			.num_row(&[0.0, 1.0, 0.0, 30.0]),
	)
}

fn triangles(rows: &[[f64; 3]]) -> MemReader {
	let mut builder = DmBuilder::new().numeric("PID1").numeric("PID2").numeric("PID3");
	for row in rows {
		builder = builder.num_row(row);
	}
	open(builder)
}

fn five_points() -> MemReader {
	open(
		DmBuilder::new()
			.numeric("XP")
			.numeric("YP")
			.numeric("ZP")
			.numeric("PID")
			.num_row(&[0.0, 0.0, 0.0, 1.0])
			.num_row(&[1.0, 0.0, 0.0, 2.0])
			.num_row(&[0.0, 1.0, 0.0, 3.0])
			.num_row(&[1.0, 1.0, 0.0, 4.0])
			.num_row(&[2.0, 2.0, 0.0, 5.0]),
	)
}

#[test]
fn builds_single_triangle() {
	let mut builder = TopologyBuilder::new(BuildOptions::default());
	builder.load_points(&mut points()).expect("points load");
	builder.load_cells(&mut triangles(&[[10.0, 20.0, 30.0]])).expect("cells load");
	let (mesh, report) = builder.finish().expect("mesh builds");

	assert_eq!(mesh.points, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
	assert_eq!(mesh.cells, vec![Cell::Triangle([0, 1, 2])]);
	assert_eq!(report.points, 3);
	assert_eq!(report.cells, 1);
	assert_eq!(report.dangling_cells, 0);
	assert!(mesh.attribute(Scope::Point, "PID").is_some());
	assert!(mesh.attribute(Scope::Point, "XP").is_none());
	assert_eq!(builder.stage(), BuildStage::Complete);
}

#[test]
fn dangling_reference_skips_only_that_cell() {
	let mut builder = TopologyBuilder::new(BuildOptions::default());
	builder.load_points(&mut points()).expect("points load");
	builder.load_cells(&mut triangles(&[[10.0, 20.0, 40.0]])).expect("cells load");
	let (mesh, report) = builder.finish().expect("mesh builds");
	assert_eq!(mesh.points.len(), 3);
	assert!(mesh.cells.is_empty());
	assert_eq!(report.dangling_cells, 1);

	let mut builder = TopologyBuilder::new(BuildOptions::default());
	builder.load_points(&mut points()).expect("points load");
	builder
		.load_cells(&mut triangles(&[[30.0, 20.0, 10.0], [10.0, 99.0, 30.0], [20.0, 30.0, 10.0]]))
		.expect("cells load");
	let (mesh, _) = builder.finish().expect("mesh builds");
	assert_eq!(mesh.cells, vec![Cell::Triangle([2, 1, 0]), Cell::Triangle([1, 2, 0])]);
}

#[test]
fn fail_policy_raises_dangling_reference() {
	let options = BuildOptions {
		on_dangling: DanglingPolicy::Fail,
		..BuildOptions::default()
	};
	let mut builder = TopologyBuilder::new(options);
	builder.load_points(&mut points()).expect("points load");
	let err = builder
		.load_cells(&mut triangles(&[[10.0, 20.0, 30.0], [10.0, 20.0, 40.0]]))
		.expect_err("dangling id fails");
	assert!(matches!(err, DmError::DanglingPointReference { row: 1, id } if id == 40.0));
}

#[test]
fn stages_must_run_in_order() {
	let mut builder = TopologyBuilder::new(BuildOptions::default());
	let err = builder.load_cells(&mut triangles(&[])).expect_err("cells before points fail");
	assert!(matches!(err, DmError::BuildOrder { stage: "not started", .. }));
	assert!(matches!(builder.finish(), Err(DmError::BuildOrder { .. })));

	builder.load_points(&mut points()).expect("points load");
	assert!(matches!(builder.join_stopes(&mut points()), Err(DmError::BuildOrder { .. })));
	builder.finish().expect("point cloud finishes");
	assert!(matches!(builder.finish(), Err(DmError::BuildOrder { stage: "complete", .. })));
}

#[test]
fn line_cells_and_missing_point_ids() {
	let mut cloud = open(
		DmBuilder::new()
			.numeric("XP")
			.numeric("YP")
			.numeric("ZP")
			.num_row(&[0.0, 0.0, 0.0])
			.num_row(&[5.0, 0.0, 0.0])
			.num_row(&[5.0, 5.0, 0.0]),
	);
	let mut lines = open(
		DmBuilder::new()
			.numeric("PID1")
			.numeric("PID2")
			.alpha("TAG", 2)
			.row(vec![num(0.0), num(1.0), text("EDGE_A")])
			.row(vec![num(1.0), num(2.0), text("EDGE_B")]),
	);

	let mut builder = TopologyBuilder::new(BuildOptions::default());
	builder.load_points(&mut cloud).expect("points load");
	builder.load_cells(&mut lines).expect("cells load");
	let (mesh, _) = builder.finish().expect("mesh builds");

	assert_eq!(mesh.cells, vec![Cell::Line([0, 1]), Cell::Line([1, 2])]);
	assert_eq!(
		mesh.attribute(Scope::Cell, "TAG").map(|item| &item.values),
		Some(&ColumnValues::Text(vec!["EDGE_A".to_owned(), "EDGE_B".to_owned()]))
	);
}

#[test]
fn duplicate_point_ids_keep_latest_row() {
	let mut cloud = open(
		DmBuilder::new()
			.numeric("XP")
			.numeric("YP")
			.numeric("ZP")
			.numeric("PID")
			.num_row(&[0.0, 0.0, 0.0, 1.0])
			.num_row(&[9.0, 9.0, 9.0, 1.0]),
	);
	let mut cells = open(DmBuilder::new().numeric("PID1").num_row(&[1.0]));

	let mut builder = TopologyBuilder::new(BuildOptions::default());
	builder.load_points(&mut cloud).expect("points load");
	builder.load_cells(&mut cells).expect("cells load");
	let (mesh, report) = builder.finish().expect("mesh builds");
	assert_eq!(report.duplicate_point_ids, 1);
	assert_eq!(mesh.cells, vec![Cell::Vertex(1)]);
}

#[test]
fn stope_totals_are_spread_across_their_cells() {
	let mut cloud = five_points();
	let mut cells = open(
		DmBuilder::new()
			.numeric("PID1")
			.numeric("PID2")
			.numeric("PID3")
			.numeric("STOPE")
			.num_row(&[1.0, 2.0, 3.0, 100.0])
			.num_row(&[2.0, 3.0, 4.0, 100.0])
			.num_row(&[1.0, 3.0, 9.0, 100.0])
			.num_row(&[1.0, 2.0, 4.0, 200.0])
			.num_row(&[1.0, 3.0, 4.0, 300.0]),
	);
	let mut stopes = open(
		DmBuilder::new()
			.numeric("STOPE")
			.numeric("TONNES")
			.numeric("AU")
			.alpha("LEVEL", 1)
			.row(vec![num(100.0), num(1000.0), num(2.5), text("L1")])
			.row(vec![num(200.0), num(300.0), num(4.0), text("L2")]),
	);

	let options = BuildOptions {
		undivided_stope_fields: vec!["AU".to_owned()],
		..BuildOptions::default()
	};
	let mut builder = TopologyBuilder::new(options);
	builder.load_points(&mut cloud).expect("points load");
	builder.load_cells(&mut cells).expect("cells load");
	builder.join_stopes(&mut stopes).expect("stopes join");
	assert_eq!(builder.stage(), BuildStage::Segmented);
	let (mesh, report) = builder.finish().expect("mesh builds");

	assert_eq!(mesh.cells.len(), 4);
	assert_eq!(report.dangling_cells, 1);
	assert_eq!(report.stope_rows, 2);
	assert_eq!(report.unmatched_stope_cells, 1);

	let tonnes = mesh.attribute(Scope::Cell, "TONNES").expect("tonnes attached");
	let tonnes = tonnes.values.as_numeric().expect("numeric");
	assert_eq!(&tonnes[..3], &[500.0, 500.0, 300.0]);
	assert!(tonnes[3].is_nan());

	let au = mesh.attribute(Scope::Cell, "AU").expect("grade attached");
	assert_eq!(&au.values.as_numeric().expect("numeric")[..3], &[2.5, 2.5, 4.0]);

	let level = mesh.attribute(Scope::Cell, "LEVEL").expect("level attached");
	assert_eq!(
		level.values.as_text().expect("text"),
		&["L1".to_owned(), "L1".to_owned(), "L2".to_owned(), String::new()]
	);

	let stope = mesh.attribute(Scope::Cell, "STOPE").expect("cell stope attached");
	assert_eq!(stope.values.as_numeric().expect("numeric"), &[100.0, 100.0, 200.0, 300.0]);
}

#[test]
fn join_requires_stope_field_on_cells() {
	let mut builder = TopologyBuilder::new(BuildOptions::default());
	builder.load_points(&mut points()).expect("points load");
	builder.load_cells(&mut triangles(&[[10.0, 20.0, 30.0]])).expect("cells load");
	let err = builder.join_stopes(&mut points()).expect_err("no stope field");
	assert!(matches!(err, DmError::FieldNotFound { ref name } if name == "STOPE"));
}

#[test]
fn text_stope_column_stays_a_cell_property() {
	let mut cells = open(
		DmBuilder::new()
			.numeric("PID1")
			.numeric("PID2")
			.numeric("PID3")
			.alpha("STOPE", 2)
			.row(vec![num(10.0), num(20.0), num(30.0), text("NORTH_01")]),
	);

	let mut builder = TopologyBuilder::new(BuildOptions::default());
	builder.load_points(&mut points()).expect("points load");
	builder.load_cells(&mut cells).expect("text stope column is accepted");
	let err = builder.join_stopes(&mut points()).expect_err("text stope key cannot join");
	assert!(matches!(err, DmError::FieldTypeMismatch { ref name, expected: "numeric" } if name == "STOPE"));

	let (mesh, _) = builder.finish().expect("mesh builds");
	assert_eq!(mesh.cells, vec![Cell::Triangle([0, 1, 2])]);
	assert_eq!(
		mesh.attribute(Scope::Cell, "STOPE").map(|item| &item.values),
		Some(&ColumnValues::Text(vec!["NORTH_01".to_owned()]))
	);
}

#[test]
fn cell_numerics_are_spread_across_stope_runs() {
	let mut cloud = five_points();
	let cell_file = || {
		DmBuilder::new()
			.numeric("PID1")
			.numeric("PID2")
			.numeric("PID3")
			.numeric("STOPE")
			.numeric("TONNES")
			.num_row(&[1.0, 2.0, 3.0, 100.0, 90.0])
			.num_row(&[2.0, 3.0, 4.0, 100.0, 90.0])
			.num_row(&[1.0, 3.0, 9.0, 100.0, 77.0])
			.num_row(&[1.0, 2.0, 4.0, 100.0, 90.0])
			.num_row(&[1.0, 3.0, 4.0, 200.0, 40.0])
	};

	let options = BuildOptions {
		segment_cell_numerics: true,
		..BuildOptions::default()
	};
	let mut builder = TopologyBuilder::new(options);
	builder.load_points(&mut cloud).expect("points load");
	builder.load_cells(&mut open(cell_file())).expect("cells load");
	let (mesh, report) = builder.finish().expect("mesh builds");

	assert_eq!(report.dangling_cells, 1);
	let tonnes = mesh.attribute(Scope::Cell, "TONNES").expect("tonnes attached");
	assert_eq!(tonnes.values, ColumnValues::Numeric(vec![30.0, 30.0, 30.0, 40.0]));
	let stope = mesh.attribute(Scope::Cell, "STOPE").expect("stope attached");
	assert_eq!(stope.values, ColumnValues::Numeric(vec![100.0, 100.0, 100.0, 200.0]));

	let mut cloud = five_points();
	let mut builder = TopologyBuilder::new(BuildOptions::default());
	builder.load_points(&mut cloud).expect("points load");
	builder.load_cells(&mut open(cell_file())).expect("cells load");
	let (mesh, _) = builder.finish().expect("mesh builds");
	let tonnes = mesh.attribute(Scope::Cell, "TONNES").expect("tonnes attached");
	assert_eq!(tonnes.values, ColumnValues::Numeric(vec![90.0, 90.0, 90.0, 40.0]));
}
