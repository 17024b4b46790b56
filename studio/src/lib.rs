//! Decoder for compiled Source studio models: the `.mdl` header file, the `.vtx`
//! optimized mesh file and the `.vvd` vertex file.

pub mod binaries;
pub mod error;
pub mod prelude;
pub mod studio;

pub use error::{Result, StudioError};
