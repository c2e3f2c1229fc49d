/// Record listing command.
pub mod dump;
/// Header and schema command.
pub mod info;
/// Mesh assembly command.
pub mod mesh;

pub(crate) mod util;
