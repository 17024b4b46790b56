pub mod layout;
pub mod mdl;
pub mod mdl_headers;
pub mod model;
pub mod vtx;
pub mod vvd;

pub use mdl::MDL;
pub use model::StudioModel;
pub use vtx::VTX;
pub use vvd::VVD;

/// Outcome of comparing a companion file's checksum with the studio header's.
///
/// A mismatch does not stop decoding; the files most likely come from different compiles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ChecksumStatus {
    /// No studio header was given to compare against.
    #[default]
    Unchecked,
    Matched,
    Mismatch { expected: i32, found: i32 },
}

impl ChecksumStatus {
    pub fn compare(expected: Option<i32>, found: i32, file: &str) -> Self {
        match expected {
            None => Self::Unchecked,
            Some(expected) if expected == found => Self::Matched,
            Some(expected) => {
                log::warn!("{file} checksum {found} does not match studio header checksum {expected}");
                Self::Mismatch { expected, found }
            }
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}
