//! Public library API for reading DataMine `.dm` mine-model files.

/// Header parsing, paged record access, field decoding, and mesh reconstruction.
pub mod dm;
