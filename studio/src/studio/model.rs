use common::{
    vfile::VFileResolver,
    vpath::{VGlobalPath, VPath},
};
use ini::Ini;

use super::{
    mdl::{MdlOptions, MDL},
    mdl_headers::{HitboxNameBase, StudioHeader},
    vtx::VTX,
    vvd::VVD,
};
use crate::error::{Result, StudioError};

/// Mesh file renderer prefixes, most preferred first. Empty is the plain `.vtx`.
pub const DEFAULT_VTX_VARIANTS: [&str; 4] = ["dx90", "dx80", "sw", ""];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblyConfig {
    pub vtx_variants: Vec<String>,
    pub mdl: MdlOptions,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            vtx_variants: DEFAULT_VTX_VARIANTS.iter().map(|v| v.to_string()).collect(),
            mdl: MdlOptions::default(),
        }
    }
}

impl AssemblyConfig {
    /// Reads the `[studio]` section:
    ///
    /// ```ini
    /// [studio]
    /// vtx_variant = dx90
    /// vtx_variant =
    /// hitbox_names = record
    /// ```
    ///
    /// `vtx_variant` may repeat and keeps its order. Anything missing keeps its default.
    pub fn from_ini(ini: &Ini) -> Self {
        let mut config = Self::default();
        let Some(studio) = ini.section(Some("studio")) else {
            return config;
        };

        let variants: Vec<String> = studio
            .get_all("vtx_variant")
            .map(|v| v.trim().to_ascii_lowercase())
            .collect();
        if !variants.is_empty() {
            config.vtx_variants = variants;
        }

        match studio.get("hitbox_names").map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("record") => {
                config.mdl.hitbox_names = HitboxNameBase::Record
            }
            Some(v) if v.eq_ignore_ascii_case("file") => {
                config.mdl.hitbox_names = HitboxNameBase::File
            }
            Some(v) => log::warn!(
                "Unknown hitbox_names {v:?}, using {:?}",
                config.mdl.hitbox_names
            ),
            None => (),
        }

        config
    }

    fn vtx_ext(variant: &str) -> String {
        if variant.is_empty() {
            "vtx".to_owned()
        } else {
            format!("{variant}.vtx")
        }
    }
}

/// A studio header with whichever companion files could be found.
#[derive(Clone, Debug)]
pub struct StudioModel {
    pub mdl: MDL,
    pub vtx: Option<VTX>,
    /// Which mesh variant was loaded
    pub vtx_path: Option<String>,
    pub vvd: Option<VVD>,
}

impl StudioModel {
    /// Loads `models/x/y` or `models/x/y.mdl` and its companions.
    ///
    /// Only the `.mdl` is required. The companions are decoded against its header, so
    /// their checksums are compared and the mesh layout follows its version.
    pub fn load(
        resolver: &dyn VFileResolver,
        path: &str,
        config: &AssemblyConfig,
    ) -> Result<Self> {
        let mdl_path = if VGlobalPath::new(path).ext().eq_ignore_ascii_case("mdl") {
            path.to_owned()
        } else {
            format!("{path}.mdl")
        };
        if !resolver.exists(&mdl_path) {
            return Err(StudioError::MissingFile { path: mdl_path });
        }
        let mdl_vpath = VGlobalPath::new(&mdl_path);
        let companion = |ext: &str| mdl_vpath.with_ext(ext);

        let mdl = MDL::read_with(&resolver.open(&mdl_path)?, config.mdl)?;

        let vtx_path = config
            .vtx_variants
            .iter()
            .map(|variant| companion(&AssemblyConfig::vtx_ext(variant)))
            .find(|path| resolver.exists(path));
        let vtx = match &vtx_path {
            Some(vtx_path) => {
                log::debug!("Using {vtx_path} for {mdl_path}");
                Some(VTX::read(&resolver.open(vtx_path)?, Some(&mdl.header))?)
            }
            None => {
                log::warn!("No mesh file for {mdl_path} in {:?}", config.vtx_variants);
                None
            }
        };

        let vvd_path = companion("vvd");
        let vvd = if resolver.exists(&vvd_path) {
            Some(VVD::read(&resolver.open(&vvd_path)?, Some(&mdl.header))?)
        } else {
            log::warn!("No vertex file for {mdl_path}");
            None
        };

        Ok(Self {
            mdl,
            vtx,
            vtx_path,
            vvd,
        })
    }

    /// Decodes files already in memory.
    pub fn from_bytes(
        mdl: &[u8],
        vtx: Option<&[u8]>,
        vvd: Option<&[u8]>,
        options: MdlOptions,
    ) -> Result<Self> {
        let mdl = MDL::read_with(mdl, options)?;
        let vtx = vtx
            .map(|data| VTX::read(data, Some(&mdl.header)))
            .transpose()?;
        let vvd = vvd
            .map(|data| VVD::read(data, Some(&mdl.header)))
            .transpose()?;

        Ok(Self {
            mdl,
            vtx,
            vtx_path: None,
            vvd,
        })
    }

    pub fn header(&self) -> &StudioHeader {
        &self.mdl.header
    }

    /// False if any loaded companion was compiled with a different checksum.
    pub fn checksums_consistent(&self) -> bool {
        let vtx_ok = self.vtx.as_ref().map_or(true, |vtx| !vtx.checksum.is_mismatch());
        let vvd_ok = self.vvd.as_ref().map_or(true, |vvd| !vvd.checksum.is_mismatch());
        vtx_ok && vvd_ok
    }
}
