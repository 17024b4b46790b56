//! Record sizes that depend on the studio version.
//!
//! Versions 49 and up append a topology index count and offset to every VTX strip
//! group and strip. The VTX file's own version stays at 7, so the layout has to come
//! from the companion `.mdl`. The appended fields are stepped over, never read.

use std::ops::RangeInclusive;

/// Studio versions this decoder has layouts for. Others decode with the nearest layout.
pub const KNOWN_STUDIO_VERSIONS: RangeInclusive<i32> = 44..=49;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VtxLayout {
    pub strip_group: usize,
    pub strip: usize,
}

impl VtxLayout {
    pub const BASELINE: Self = Self {
        strip_group: 25,
        strip: 27,
    };

    pub const TOPOLOGY: Self = Self {
        strip_group: 33,
        strip: 35,
    };

    pub fn for_studio_version(version: i32) -> Self {
        VTX_LAYOUTS
            .iter()
            .rev()
            .find(|(first, _)| version >= *first)
            .map_or(Self::BASELINE, |(_, layout)| *layout)
    }
}

impl Default for VtxLayout {
    fn default() -> Self {
        Self::BASELINE
    }
}

/// (first studio version, layout), ascending.
const VTX_LAYOUTS: &[(i32, VtxLayout)] = &[(0, VtxLayout::BASELINE), (49, VtxLayout::TOPOLOGY)];

/// Logs versions outside [`KNOWN_STUDIO_VERSIONS`]. They are decoded anyway.
pub fn check_studio_version(version: i32) {
    if !KNOWN_STUDIO_VERSIONS.contains(&version) {
        log::warn!(
            "Studio version {version} is outside {KNOWN_STUDIO_VERSIONS:?}, using layout {:?}",
            VtxLayout::for_studio_version(version)
        );
    }
}
