pub use crate::error::{Result, StudioError};
pub use crate::studio::{
    layout::VtxLayout,
    mdl::{MdlOptions, MDL},
    mdl_headers::{HitboxNameBase, StudioFlag, StudioHeader},
    model::{AssemblyConfig, StudioModel},
    vtx::{VTXStrip, VTXStripGroup, VTXVertex, VTX},
    vvd::{ModelVertex, VVD},
    ChecksumStatus,
};
pub use common::prelude::*;
