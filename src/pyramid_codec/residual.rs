//! Residual pyramid module
//!
//! This module builds and reconstructs residual pyramids, encodes their
//! residual payload and frames them in the PYR container.

pub mod bit_vector;
pub mod container;
pub mod payload;
pub mod pyramid;

pub use bit_vector::BitVector;
pub use container::{
    CONTAINER_MAGIC, container_bytes, read_container, read_container_file, write_container,
    write_container_file,
};
pub use payload::{ResidualEncoder, ResidualPayload};
pub use pyramid::{BuildStats, Pyramid, PyramidCodec};
