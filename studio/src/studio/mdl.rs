use crate::{
    binaries::{read_array, ByteSource, ReadBudget},
    error::Result,
    studio::layout,
};

pub use super::mdl_headers::{
    AnimDesc, BodyPart, Bone, BoneController, Hitbox, HitboxNameBase, HitboxSet, Mesh, Model,
    StudioFlag, StudioHeader, STUDIO_ID,
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MdlOptions {
    pub hitbox_names: HitboxNameBase,
}

/// Decoded studio header file.
#[derive(Clone, Debug)]
pub struct MDL {
    pub header: StudioHeader,
    pub bones: Vec<Bone>,
    pub bone_controllers: Vec<BoneController>,
    pub hitbox_sets: Vec<HitboxSet>,
    pub anim_descs: Vec<AnimDesc>,
    pub body_parts: Vec<BodyPart>,
    /// Material names, in the order meshes refer to them
    pub materials: Vec<String>,
    /// Directories searched for the materials
    pub material_dirs: Vec<String>,
    pub surface_prop: Option<String>,
    pub key_values: Option<String>,
}

impl MDL {
    pub fn read(data: &[u8]) -> Result<Self> {
        Self::read_with(data, MdlOptions::default())
    }

    pub fn read_with(data: &[u8], options: MdlOptions) -> Result<Self> {
        let budget = ReadBudget::for_len(data.len());
        let src = ByteSource::with_budget(data, &budget);

        let header: StudioHeader = src.record(0, "studio_header")?;
        if header.id != STUDIO_ID {
            log::warn!("Unexpected studio id {:?}", header.id);
        }
        layout::check_studio_version(header.version);

        let bones = header.bone.read_records(&src, 0, "bone_offset")?;
        let bone_controllers = header
            .bone_controller
            .read_records(&src, 0, "bonecontroller_offset")?;
        let hitbox_sets = header.hitbox.resolve(
            &src,
            0,
            HitboxSet::SIZE,
            "hitbox_offset",
            |src, at| HitboxSet::read(src, at, options.hitbox_names),
        )?;
        let anim_descs = header.local_anim.read_records(&src, 0, "localanim_offset")?;
        let body_parts = header.body_part.read_records(&src, 0, "bodypart_offset")?;

        let materials = read_materials(&src, &header)?;
        let material_dirs = read_material_dirs(&src, &header)?;

        let surface_prop = header
            .surface_prop_index
            .read_opt_str(&src, 0, "surfaceprop_index")?;
        let key_values = read_key_values(&src, &header)?;

        log::debug!(
            "Read {:?}: {} bones, {} hitbox sets, {} anims, {} body parts, {} materials",
            header.name,
            bones.len(),
            hitbox_sets.len(),
            anim_descs.len(),
            body_parts.len(),
            materials.len()
        );

        Ok(Self {
            header,
            bones,
            bone_controllers,
            hitbox_sets,
            anim_descs,
            body_parts,
            materials,
            material_dirs,
            surface_prop,
            key_values,
        })
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// First material search directory.
    pub fn material_dir(&self) -> Option<&str> {
        self.material_dirs.first().map(String::as_str)
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name.eq_ignore_ascii_case(name))
    }
}

// texture_offset holds an i32 X. At texture_offset + X is an array of texture_count
// name offsets, each relative to texture_offset.
fn read_materials(src: &ByteSource, header: &StudioHeader) -> Result<Vec<String>> {
    if header.texture.is_empty() {
        return Ok(Vec::new());
    }
    let table = header.texture.start(0);
    let names = table + i64::from(src.read_i32(table, "texture_offset")?);

    read_array(src, names, header.texture.count, 4, "texture_offset", |src, at| {
        src.read_indirect_str(at, table, "texture_name")
    })
}

// texturedir_offset always leads to the first directory, even when texturedir_count is 0.
// A larger count adds the directories that follow it.
fn read_material_dirs(src: &ByteSource, header: &StudioHeader) -> Result<Vec<String>> {
    let dirs = &header.texture_dir;
    if dirs.offset == 0 {
        return Ok(Vec::new());
    }
    let count = if dirs.count == 0 { 1 } else { dirs.count };

    read_array(src, dirs.start(0), count, 4, "texturedir_offset", |src, at| {
        src.read_indirect_str(at, 0, "texturedir_name")
    })
}

fn read_key_values(src: &ByteSource, header: &StudioHeader) -> Result<Option<String>> {
    let key_value = &header.key_value;
    if key_value.count <= 0 || key_value.offset == 0 {
        return Ok(None);
    }
    let bytes = src.bytes(key_value.start(0), key_value.count as usize, "keyvalue_index")?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(Some(bytes[..end].iter().map(|&b| char::from(b)).collect()))
}
