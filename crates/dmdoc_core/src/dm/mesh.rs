use crate::dm::ColumnValues;

/// One cell as indices into the mesh point array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
	/// Single point.
	Vertex(usize),
	/// Segment between two points.
	Line([usize; 2]),
	/// Triangle over three points.
	Triangle([usize; 3]),
}

impl Cell {
	/// Point indices of the cell.
	pub fn points(&self) -> &[usize] {
		match self {
			Self::Vertex(point) => std::slice::from_ref(point),
			Self::Line(points) => points,
			Self::Triangle(points) => points,
		}
	}

	/// Stable lowercase label.
	pub fn kind_label(&self) -> &'static str {
		match self {
			Self::Vertex(_) => "vertex",
			Self::Line(_) => "line",
			Self::Triangle(_) => "triangle",
		}
	}
}

/// Whether an attribute is attached per point or per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
	/// One value per point.
	Point,
	/// One value per cell.
	Cell,
}

/// Named property values attached to a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
	/// Property name.
	pub name: String,
	/// Values in point or cell order.
	pub values: ColumnValues,
}

/// Reconstructed geometry with its properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
	/// Point coordinates in point-file row order.
	pub points: Vec<[f64; 3]>,
	/// Cells in cell-file row order, dangling rows omitted.
	pub cells: Vec<Cell>,
	/// Point-scoped attributes.
	pub point_data: Vec<Attribute>,
	/// Cell-scoped attributes.
	pub cell_data: Vec<Attribute>,
}

impl Mesh {
	/// Number of points.
	pub fn point_count(&self) -> usize {
		self.points.len()
	}

	/// Attributes of one scope.
	pub fn attributes(&self, scope: Scope) -> &[Attribute] {
		match scope {
			Scope::Point => &self.point_data,
			Scope::Cell => &self.cell_data,
		}
	}

	/// Look up an attribute by exact name.
	pub fn attribute(&self, scope: Scope, name: &str) -> Option<&Attribute> {
		self.attributes(scope).iter().find(|item| item.name == name)
	}

	/// Attach an attribute unless one with the same name exists in `scope`.
	///
	/// Returns `false` when the attribute was skipped.
	pub fn attach(&mut self, scope: Scope, attribute: Attribute) -> bool {
		if self.attribute(scope, &attribute.name).is_some() {
			return false;
		}
		match scope {
			Scope::Point => self.point_data.push(attribute),
			Scope::Cell => self.cell_data.push(attribute),
		}
		true
	}
}
