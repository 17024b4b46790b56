// Records of the studio header file (.mdl). Layouts follow studio.h from the Source SDK;
// everything is packed and little-endian.
//
// Strings are stored as offsets. Most are relative to the start of the record that holds
// the offset, the ones in the main header are relative to the start of the file.

use flagset::{flags, FlagSet};
use glam::{Quat, Vec3, Vec4};

use crate::{
    binaries::{BinArray, BinOffset, BinaryData, ByteSource, RecordReader},
    error::Result,
};

pub const STUDIO_ID: [u8; 4] = *b"IDST";

flags! {
    pub enum StudioFlag: u32 {
        AutogeneratedHitbox = 0x0000_0001,
        UsesEnvCubemap = 0x0000_0002,
        ForceOpaque = 0x0000_0004,
        TranslucentTwoPass = 0x0000_0008,
        StaticProp = 0x0000_0010,
        UsesFbTexture = 0x0000_0020,
        HasShadowLod = 0x0000_0040,
        UsesBumpmapping = 0x0000_0080,
        UseShadowLodMaterials = 0x0000_0100,
        Obsolete = 0x0000_0200,
        Unused = 0x0000_0400,
        NoForcedFade = 0x0000_0800,
        ForcePhonemeCrossfade = 0x0000_1000,
        ConstantDirectionalLightDot = 0x0000_2000,
        FlexesConverted = 0x0000_4000,
        BuiltInPreviewMode = 0x0000_8000,
        AmbientBoost = 0x0001_0000,
        DoNotCastShadows = 0x0002_0000,
        CastTextureShadows = 0x0004_0000,
    }
}

/// studiohdr_t, the first 408 bytes of the file.
///
/// Offsets in here are from the very beginning of the file. Note that counts and offsets
/// are not always paired and ordered consistently.
#[derive(Clone, Debug)]
pub struct StudioHeader {
    pub id: [u8; 4],   // Model format ID, such as "IDST"
    pub version: i32,  // Format version number, such as 48
    pub checksum: i32, // This has to be the same in the vtx and vvd files to load
    pub name: String,   // Internal name of the model, null padded to 64 bytes
    pub data_length: i32,

    pub eye_position: Vec3,
    pub illum_position: Vec3, // Used to calculate ambient light contribution and cubemap reflections
    pub hull_min: Vec3,
    pub hull_max: Vec3,
    pub view_bbmin: Vec3,
    pub view_bbmax: Vec3,

    pub flags: FlagSet<StudioFlag>,

    pub bone: BinArray<Bone>,
    pub bone_controller: BinArray<BoneController>,
    pub hitbox: BinArray<HitboxSet>,
    pub local_anim: BinArray<AnimDesc>,
    pub local_seq: BinArray<()>,

    pub activity_list_version: i32,
    pub events_indexed: i32,

    /// Points at an offset to the material name offsets, see [`crate::studio::MDL`].
    pub texture: BinArray<()>,
    /// Absolute offsets of the material search directories.
    pub texture_dir: BinArray<BinOffset>,

    // Each skin family assigns a texture id to a skin location
    pub skin_reference_count: i32,
    pub skin_family_count: i32,
    pub skin_reference_index: i32,

    pub body_part: BinArray<BodyPart>,
    pub attachment: BinArray<()>,

    pub local_node: BinArray<()>,
    pub local_node_name_index: BinOffset,

    pub flex_desc: BinArray<()>,
    pub flex_controller: BinArray<()>,
    pub flex_rules: BinArray<()>,
    pub ik_chain: BinArray<()>,
    pub mouths: BinArray<()>,
    pub local_pose_param: BinArray<()>,

    // Single null-terminated string
    pub surface_prop_index: BinOffset,

    // Unusual: index comes first, then count. The count is in bytes of text.
    pub key_value: BinArray<u8>,

    pub ik_lock: BinArray<()>,

    pub mass: f32,
    pub contents: i32,

    pub include_model: BinArray<()>,

    pub anim_blocks_name_index: BinOffset,
    pub anim_blocks: BinArray<()>,

    pub bone_table_name_index: BinOffset,

    pub directional_dot_product: u8,
    pub root_lod: u8,
    // 0 means any allowed, N means Lod 0 -> (N-1)
    pub num_allowed_root_lods: u8,

    pub flex_controller_ui: BinArray<()>,
    pub vert_anim_fixed_point_scale: f32,

    /// Offset of studiohdr2_t, zero when absent.
    pub studiohdr2_index: i32,
}

impl BinaryData for StudioHeader {
    const SIZE: usize = 408;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        let id = r.bytes()?;
        let version = r.i32()?;
        let checksum = r.i32()?;
        let name = r.fixed_str::<64>()?;
        let data_length = r.i32()?;

        let eye_position = r.vec3()?;
        let illum_position = r.vec3()?;
        let hull_min = r.vec3()?;
        let hull_max = r.vec3()?;
        let view_bbmin = r.vec3()?;
        let view_bbmax = r.vec3()?;

        let flags = FlagSet::<StudioFlag>::new_truncated(r.u32()?);

        let bone = BinArray::read_count_offset(r)?;
        let bone_controller = BinArray::read_count_offset(r)?;
        let hitbox = BinArray::read_count_offset(r)?;
        let local_anim = BinArray::read_count_offset(r)?;
        let local_seq = BinArray::read_count_offset(r)?;

        let activity_list_version = r.i32()?;
        let events_indexed = r.i32()?;

        let texture = BinArray::read_count_offset(r)?;
        let texture_dir = BinArray::read_count_offset(r)?;

        let skin_reference_count = r.i32()?;
        let skin_family_count = r.i32()?;
        let skin_reference_index = r.i32()?;

        let body_part = BinArray::read_count_offset(r)?;
        let attachment = BinArray::read_count_offset(r)?;

        let local_node = BinArray::read_count_offset(r)?;
        let local_node_name_index = BinOffset::read(r)?;

        let flex_desc = BinArray::read_count_offset(r)?;
        let flex_controller = BinArray::read_count_offset(r)?;
        let flex_rules = BinArray::read_count_offset(r)?;
        let ik_chain = BinArray::read_count_offset(r)?;
        let mouths = BinArray::read_count_offset(r)?;
        let local_pose_param = BinArray::read_count_offset(r)?;

        let surface_prop_index = BinOffset::read(r)?;
        let key_value = BinArray::read_offset_count(r)?;
        let ik_lock = BinArray::read_count_offset(r)?;

        let mass = r.f32()?;
        let contents = r.i32()?;

        let include_model = BinArray::read_count_offset(r)?;
        r.skip(4)?; // virtualModel, runtime pointer

        let anim_blocks_name_index = BinOffset::read(r)?;
        let anim_blocks = BinArray::read_count_offset(r)?;
        r.skip(4)?; // animblockModel, runtime pointer

        let bone_table_name_index = BinOffset::read(r)?;
        r.skip(8)?; // vertex_base, offset_base

        let directional_dot_product = r.u8()?;
        let root_lod = r.u8()?;
        let num_allowed_root_lods = r.u8()?;
        r.skip(1 + 4)?; // unused0, unused1

        let flex_controller_ui = BinArray::read_count_offset(r)?;
        let vert_anim_fixed_point_scale = r.f32()?;
        r.skip(4)?; // unused2

        let studiohdr2_index = r.i32()?;
        r.skip(4)?; // unused3

        Ok(Self {
            id,
            version,
            checksum,
            name,
            data_length,
            eye_position,
            illum_position,
            hull_min,
            hull_max,
            view_bbmin,
            view_bbmax,
            flags,
            bone,
            bone_controller,
            hitbox,
            local_anim,
            local_seq,
            activity_list_version,
            events_indexed,
            texture,
            texture_dir,
            skin_reference_count,
            skin_family_count,
            skin_reference_index,
            body_part,
            attachment,
            local_node,
            local_node_name_index,
            flex_desc,
            flex_controller,
            flex_rules,
            ik_chain,
            mouths,
            local_pose_param,
            surface_prop_index,
            key_value,
            ik_lock,
            mass,
            contents,
            include_model,
            anim_blocks_name_index,
            anim_blocks,
            bone_table_name_index,
            directional_dot_product,
            root_lod,
            num_allowed_root_lods,
            flex_controller_ui,
            vert_anim_fixed_point_scale,
            studiohdr2_index,
        })
    }
}

/// mstudiobone_t
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Index of the parent bone, -1 for none
    pub parent: i32,
    /// Bone controller index per channel, -1 for none
    pub bone_controller: [i32; 6],

    // default values
    pub pos: Vec3,
    pub quat: Quat,
    pub rot: Vec3,
    // compression scale
    pub pos_scale: Vec3,
    pub rot_scale: Vec3,

    /// 3x4 matrix, one row per entry
    pub pose_to_bone: [Vec4; 3],
    pub q_alignment: Quat,
    pub flags: i32,
    pub proc_type: i32,
    pub proc_index: i32,
    /// Index into the physically simulated bones
    pub physics_bone: i32,
    pub surface_prop: Option<String>,
    pub contents: i32,
}

impl BinaryData for Bone {
    const SIZE: usize = 216;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        let name_index = BinOffset::read(r)?;
        let parent = r.i32()?;
        let bone_controller = r.i32_array()?;
        let pos = r.vec3()?;
        let quat = r.quat()?;
        let rot = r.vec3()?;
        let pos_scale = r.vec3()?;
        let rot_scale = r.vec3()?;
        let pose_to_bone = [r.vec4()?, r.vec4()?, r.vec4()?];
        let q_alignment = r.quat()?;
        let flags = r.i32()?;
        let proc_type = r.i32()?;
        let proc_index = r.i32()?;
        let physics_bone = r.i32()?;
        let surface_prop_index = BinOffset::read(r)?;
        let contents = r.i32()?;
        r.skip(8 * 4)?;

        Ok(Self {
            name: r.record_str(name_index, "bone.name_index")?,
            parent,
            bone_controller,
            pos,
            quat,
            rot,
            pos_scale,
            rot_scale,
            pose_to_bone,
            q_alignment,
            flags,
            proc_type,
            proc_index,
            physics_bone,
            surface_prop: surface_prop_index.read_opt_str(
                r.src(),
                r.start(),
                "bone.surface_prop_index",
            )?,
            contents,
        })
    }
}

/// mstudiobonecontroller_t
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoneController {
    pub bone: i32,
    pub kind: i32,
    pub start: f32,
    pub end: f32,
    pub rest: i32,
    pub input_field: i32,
}

impl BinaryData for BoneController {
    const SIZE: usize = 56;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        let controller = Self {
            bone: r.i32()?,
            kind: r.i32()?,
            start: r.f32()?,
            end: r.f32()?,
            rest: r.i32()?,
            input_field: r.i32()?,
        };
        r.skip(8 * 4)?;
        Ok(controller)
    }
}

/// Where hitbox name offsets are measured from.
///
/// Hitbox set names are relative to the set record, but hitbox names have been read
/// both relative to the hitbox record and relative to the start of the file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HitboxNameBase {
    /// Relative to the hitbox record, and an offset of zero means no name.
    #[default]
    Record,
    /// Relative to the start of the file.
    File,
}

/// mstudiohitboxset_t
#[derive(Clone, Debug, PartialEq)]
pub struct HitboxSet {
    pub name: String,
    pub hitboxes: Vec<Hitbox>,
}

impl HitboxSet {
    pub const SIZE: usize = 12;

    pub fn read(src: &ByteSource, at: i64, names: HitboxNameBase) -> Result<Self> {
        let mut r = src.reader(at, Self::SIZE, "hitbox_set")?;
        let name_index = BinOffset::read(&mut r)?;
        let hitboxes = BinArray::<Hitbox>::read_count_offset(&mut r)?;

        Ok(Self {
            name: r.record_str(name_index, "hitbox_set.name_index")?,
            hitboxes: hitboxes.resolve(src, at, Hitbox::SIZE, "hitbox_set.hitbox_index", |src, at| {
                Hitbox::read(&mut src.reader(at, Hitbox::SIZE, "hitbox")?, names)
            })?,
        })
    }
}

/// mstudiobbox_t
#[derive(Clone, Debug, PartialEq)]
pub struct Hitbox {
    pub bone: i32,
    /// Intersection group
    pub group: i32,
    pub bbmin: Vec3,
    pub bbmax: Vec3,
    pub name: String,
}

impl Hitbox {
    pub const SIZE: usize = 68;

    pub fn read(r: &mut RecordReader<'_>, names: HitboxNameBase) -> Result<Self> {
        let bone = r.i32()?;
        let group = r.i32()?;
        let bbmin = r.vec3()?;
        let bbmax = r.vec3()?;
        let name_index = BinOffset::read(r)?;
        r.skip(8 * 4)?;

        let name = match names {
            HitboxNameBase::Record => name_index
                .read_opt_str(r.src(), r.start(), "hitbox.name_index")?
                .unwrap_or_default(),
            HitboxNameBase::File => name_index.read_str(r.src(), 0, "hitbox.name_index")?,
        };

        Ok(Self {
            bone,
            group,
            bbmin,
            bbmax,
            name,
        })
    }
}

/// mstudioanimdesc_t
#[derive(Clone, Debug, PartialEq)]
pub struct AnimDesc {
    pub base_ptr: i32,
    pub name: String,
    pub fps: f32,
    /// Looping/non-looping flags
    pub flags: i32,
    pub num_frames: i32,

    // piecewise movement
    pub movement: BinArray<()>,

    pub anim_block: i32,
    /// Non-zero when anim data isn't in sections
    pub anim_index: i32,

    pub ik_rule: BinArray<()>,
    pub anim_block_ik_rule_index: i32,

    pub local_hierarchy: BinArray<()>,

    pub section_index: i32,
    /// Frames in each fast lookup section, zero if not used
    pub section_frames: i32,

    pub zero_frame_span: i16,
    pub zero_frame_count: i16,
    pub zero_frame_index: i32,
    pub zero_frame_stall_time: f32,
}

impl BinaryData for AnimDesc {
    const SIZE: usize = 100;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        let base_ptr = r.i32()?;
        let name_index = BinOffset::read(r)?;
        let fps = r.f32()?;
        let flags = r.i32()?;
        let num_frames = r.i32()?;
        let movement = BinArray::read_count_offset(r)?;
        r.skip(6 * 4)?;
        let anim_block = r.i32()?;
        let anim_index = r.i32()?;
        let ik_rule = BinArray::read_count_offset(r)?;
        let anim_block_ik_rule_index = r.i32()?;
        let local_hierarchy = BinArray::read_count_offset(r)?;
        let section_index = r.i32()?;
        let section_frames = r.i32()?;
        let zero_frame_span = r.i16()?;
        let zero_frame_count = r.i16()?;
        let zero_frame_index = r.i32()?;
        let zero_frame_stall_time = r.f32()?;

        Ok(Self {
            base_ptr,
            name: r.record_str(name_index, "anim_desc.name_index")?,
            fps,
            flags,
            num_frames,
            movement,
            anim_block,
            anim_index,
            ik_rule,
            anim_block_ik_rule_index,
            local_hierarchy,
            section_index,
            section_frames,
            zero_frame_span,
            zero_frame_count,
            zero_frame_index,
            zero_frame_stall_time,
        })
    }
}

/// mstudiobodyparts_t, maps one to one with the vtx body parts
#[derive(Clone, Debug, PartialEq)]
pub struct BodyPart {
    pub name: String,
    pub base: i32,
    pub models: Vec<Model>,
}

impl BinaryData for BodyPart {
    const SIZE: usize = 16;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        let name_index = BinOffset::read(r)?;
        let num_models = r.i32()?;
        let base = r.i32()?;
        let models = BinArray::<Model>::new(num_models, r.i32()?);

        Ok(Self {
            name: r.record_str(name_index, "bodypart.name_index")?,
            base,
            models: models.read_records(r.src(), r.start(), "bodypart.model_index")?,
        })
    }
}

/// mstudiomodel_t
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub name: String,
    pub kind: i32,
    pub bounding_radius: f32,
    pub meshes: Vec<Mesh>,

    pub num_vertices: i32,
    /// Byte offset of the first vertex in the vvd vertex block
    pub vertex_index: i32,
    /// Byte offset of the first tangent in the vvd tangent block
    pub tangents_index: i32,

    pub attachments: BinArray<()>,
    pub eyeballs: BinArray<()>,
}

impl Model {
    /// Index of this model's first vertex in the vvd vertex array.
    pub fn first_vertex(&self) -> i32 {
        self.vertex_index / 0x30
    }

    pub fn first_tangent(&self) -> i32 {
        self.tangents_index / 0x10
    }
}

impl BinaryData for Model {
    const SIZE: usize = 148;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        let name = r.fixed_str::<64>()?;
        let kind = r.i32()?;
        let bounding_radius = r.f32()?;
        let meshes = BinArray::<Mesh>::read_count_offset(r)?;
        let num_vertices = r.i32()?;
        let vertex_index = r.i32()?;
        let tangents_index = r.i32()?;
        let attachments = BinArray::read_count_offset(r)?;
        let eyeballs = BinArray::read_count_offset(r)?;
        r.skip(8)?; // mstudio_modelvertexdata_t, runtime pointers
        r.skip(8 * 4)?;

        Ok(Self {
            name,
            kind,
            bounding_radius,
            meshes: meshes.read_records(r.src(), r.start(), "model.mesh_index")?,
            num_vertices,
            vertex_index,
            tangents_index,
            attachments,
            eyeballs,
        })
    }
}

/// mstudiomesh_t
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub material: i32,
    /// Negative offset back to the owning model
    pub model_index: i32,
    pub num_vertices: i32,
    /// Vertex offset relative to the owning model's first vertex
    pub vertex_offset: i32,
    pub flexes: BinArray<()>,
    pub material_type: i32,
    pub material_param: i32,
    pub mesh_id: i32,
    pub center: Vec3,
    pub num_lod_vertexes: [i32; 8],
}

impl BinaryData for Mesh {
    const SIZE: usize = 116;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        let material = r.i32()?;
        let model_index = r.i32()?;
        let num_vertices = r.i32()?;
        let vertex_offset = r.i32()?;
        let flexes = BinArray::read_count_offset(r)?;
        let material_type = r.i32()?;
        let material_param = r.i32()?;
        let mesh_id = r.i32()?;
        let center = r.vec3()?;
        r.skip(4)?; // modelvertexdata, runtime pointer
        let num_lod_vertexes = r.i32_array()?;
        r.skip(8 * 4)?;

        Ok(Self {
            material,
            model_index,
            num_vertices,
            vertex_offset,
            flexes,
            material_type,
            material_param,
            mesh_id,
            center,
            num_lod_vertexes,
        })
    }
}

/// Minimal header for companion file tests.
#[cfg(test)]
pub(crate) fn test_header(version: i32, checksum: i32) -> StudioHeader {
    let mut data = vec![0; StudioHeader::SIZE];
    data[..4].copy_from_slice(&STUDIO_ID);
    data[4..8].copy_from_slice(&version.to_le_bytes());
    data[8..12].copy_from_slice(&checksum.to_le_bytes());
    ByteSource::new(&data).record(0, "studio_header").unwrap()
}
