use glam::{Vec2, Vec3, Vec4};

use super::{
    mdl_headers::{Model, StudioHeader},
    ChecksumStatus,
};
use crate::{
    binaries::{read_array, BinaryData, ByteSource, ReadBudget, RecordReader},
    error::{Result, StudioError},
};

pub const VVD_ID: [u8; 4] = *b"IDSV";
pub const VVD_VERSION: i32 = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexFileHeader {
    pub id: [u8; 4],                 // MODEL_VERTEX_FILE_ID
    pub version: i32,                // MODEL_VERTEX_FILE_VERSION
    pub checksum: i32,               // same as studiohdr_t, ensures sync
    pub num_lods: i32,               // num of valid lods
    pub num_lod_vertexes: [i32; 8],  // num verts for desired root lod
    pub num_fixups: i32,             // num of vertexFileFixup_t
    pub fixup_table_start: i32,      // offset from base to fixup table
    pub vertex_data_start: i32,      // offset from base to vertex block
    pub tangent_data_start: i32,     // offset from base to tangent block
}

impl BinaryData for VertexFileHeader {
    const SIZE: usize = 64;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            id: r.bytes()?,
            version: r.i32()?,
            checksum: r.i32()?,
            num_lods: r.i32()?,
            num_lod_vertexes: r.i32_array()?,
            num_fixups: r.i32()?,
            fixup_table_start: r.i32()?,
            vertex_data_start: r.i32()?,
            tangent_data_start: r.i32()?,
        })
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
pub struct BoneWeights {
    pub weight: [f32; 3],
    pub bone: [u8; 3],
    pub num_bones: u8,
}

/// mstudiovertex_t. Laid out as in the file, so a slice of these can be uploaded as is.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
pub struct ModelVertex {
    pub bone_weights: BoneWeights,
    pub pos: Vec3,
    pub norm: Vec3,
    pub uv: Vec2,
}

impl BinaryData for ModelVertex {
    const SIZE: usize = 48;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        let weight = [r.f32()?, r.f32()?, r.f32()?];
        let bone = r.bytes()?;
        let num_bones = r.u8()?;
        Ok(Self {
            bone_weights: BoneWeights {
                weight,
                bone,
                num_bones,
            },
            pos: r.vec3()?,
            norm: r.vec3()?,
            uv: r.vec2()?,
        })
    }
}

/// Decoded vertex data file. Fixups are left uninterpreted, see
/// [`VertexFileHeader::num_fixups`].
#[derive(Clone, Debug)]
pub struct VVD {
    pub header: VertexFileHeader,
    pub verts: Vec<ModelVertex>,
    /// One per vertex, w holds the bitangent sign
    pub tangents: Vec<Vec4>,
    pub checksum: ChecksumStatus,
}

impl VVD {
    pub fn read(data: &[u8], companion: Option<&StudioHeader>) -> Result<Self> {
        let budget = ReadBudget::for_len(data.len());
        let src = ByteSource::with_budget(data, &budget);

        let header: VertexFileHeader = src.record(0, "vvd_header")?;
        if header.id != VVD_ID {
            log::warn!("Unexpected vvd id {:?}", header.id);
        }
        if header.version != VVD_VERSION {
            log::warn!("Unexpected vvd version {}", header.version);
        }

        let count = vertex_count(&src, &header)?;
        let verts: Vec<ModelVertex> = read_array(
            &src,
            header.vertex_data_start.into(),
            count,
            ModelVertex::SIZE,
            "vertex_data_start",
            |src, at| src.record(at, "vertex"),
        )?;
        let tangents: Vec<Vec4> = read_array(
            &src,
            header.tangent_data_start.into(),
            count,
            Vec4::SIZE,
            "tangent_data_start",
            |src, at| src.record(at, "tangent"),
        )?;

        let checksum =
            ChecksumStatus::compare(companion.map(|h| h.checksum), header.checksum, "vvd");

        log::debug!("Read vvd: {} vertices, {} fixups", count, header.num_fixups);

        Ok(Self {
            header,
            verts,
            tangents,
            checksum,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.verts.len()
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.verts)
    }

    pub fn tangent_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.tangents)
    }

    /// The run of vertices an mdl model owns, without applying fixups.
    pub fn model_vertices(&self, model: &Model) -> Option<&[ModelVertex]> {
        let start = usize::try_from(model.first_vertex()).ok()?;
        let len = usize::try_from(model.num_vertices).ok()?;
        self.verts.get(start..start.checked_add(len)?)
    }
}

/// The vertex block runs up to the tangent block, so its length gives the count.
fn vertex_count(src: &ByteSource, header: &VertexFileHeader) -> Result<i32> {
    let start = i64::from(header.vertex_data_start);
    let end = i64::from(header.tangent_data_start);
    let span = end - start;
    if span < 0 || span % ModelVertex::SIZE as i64 != 0 {
        return Err(StudioError::corrupt("tangent_data_start", start..end, src.len()));
    }
    Ok((span / ModelVertex::SIZE as i64) as i32)
}
