// VTX is Source's hardware optimized mesh strip format. It stores material, skinning and
// triangle strip information for each LOD of each mesh in the MDL.
//
// The extension has a renderer prefix (.dx90.vtx, .dx80.vtx, .sw.vtx, or none), StudioMDL
// usually writes identical files for all of them.
//
// Every header holds its children as (count, offset) with the offset measured from the
// start of that header, so each level is decoded from the absolute offset of its parent.

use std::ops::Range;

use flagset::{flags, FlagSet};

use super::{layout::VtxLayout, mdl_headers::StudioHeader, ChecksumStatus};
use crate::{
    binaries::{BinArray, BinOffset, BinaryData, ByteSource, ReadBudget, RecordReader},
    error::{Result, StudioError},
};

/// OPTIMIZED_MODEL_FILE_VERSION. Studio version 49 changed the layout without changing this.
pub const VTX_VERSION: i32 = 7;

flags! {
    pub enum MeshFlag: u8 {
        IsTeeth = 0x01,
        IsEyes = 0x02,
    }
}

flags! {
    pub enum StripGroupFlag: u8 {
        IsFlexed = 0x01,
        IsHwSkinned = 0x02,
        IsDeltaFlexed = 0x04,
        SuppressHwMorph = 0x08,
    }
}

flags! {
    pub enum StripFlag: u8 {
        IsTriList = 0x01,
        IsTriStrip = 0x02,
    }
}

#[derive(Clone, Debug)]
pub struct VTX {
    pub header: VTXFileHeader,
    /// Layout the strip groups and strips were read with
    pub layout: VtxLayout,
    pub body: Vec<VTXBodyPart>,
    /// One list per LOD, empty when the file has none
    pub material_replacements: Vec<Vec<MaterialReplacement>>,
    pub checksum: ChecksumStatus,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VTXBodyPart {
    pub models: Vec<VTXModel>,
}

/// Maps one to one with models in the mdl file.
#[derive(Clone, Debug, PartialEq)]
pub struct VTXModel {
    pub lods: Vec<VTXModelLOD>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VTXModelLOD {
    /// Distance at which the engine switches to this LOD
    pub switch_point: f32,
    pub meshes: Vec<VTXMesh>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VTXMesh {
    pub flags: FlagSet<MeshFlag>,
    pub strip_groups: Vec<VTXStripGroup>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VTXStripGroup {
    pub header: StripGroupHeader,
    // These are the arrays of all verts and indices for this mesh. Strips index into this.
    pub verts: Vec<VTXVertex>,
    pub indices: Vec<u16>,
    pub strips: Vec<VTXStrip>,
}

/// A strip is a piece of a strip group which is divided by bones.
#[derive(Clone, Debug, PartialEq)]
pub struct VTXStrip {
    pub header: StripHeader,
    /// This strip's run of the group's vertices
    pub verts: Vec<VTXVertex>,
    /// This strip's run of the group's indices
    pub indices: Vec<u16>,
}

impl VTXStrip {
    pub fn is_tri_list(&self) -> bool {
        self.header.flags.contains(StripFlag::IsTriList)
    }
}

/// Material swapped in for one LOD.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialReplacement {
    pub material_id: i16,
    pub name: String,
}

impl BinaryData for MaterialReplacement {
    const SIZE: usize = 6;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        let material_id = r.i16()?;
        let name_index = BinOffset::read(r)?;
        Ok(Self {
            material_id,
            name: r.record_str(name_index, "material_replacement.name_offset")?,
        })
    }
}

impl VTX {
    /// Decodes with the layout for `companion`'s studio version, and compares checksums
    /// against it. Without a companion the baseline layout is used.
    pub fn read(data: &[u8], companion: Option<&StudioHeader>) -> Result<Self> {
        let layout = companion.map_or_else(VtxLayout::default, |header| {
            VtxLayout::for_studio_version(header.version)
        });
        Self::read_with_layout(data, layout, companion)
    }

    pub fn read_with_layout(
        data: &[u8],
        layout: VtxLayout,
        companion: Option<&StudioHeader>,
    ) -> Result<Self> {
        let budget = ReadBudget::for_len(data.len());
        let src = ByteSource::with_budget(data, &budget);

        let header: VTXFileHeader = src.record(0, "vtx_header")?;
        if header.version != VTX_VERSION {
            log::warn!("Unexpected vtx version {}", header.version);
        }

        let body = header.body_parts.resolve(
            &src,
            0,
            BodyPartHeader::SIZE,
            "body_part_offset",
            |src, at| read_body_part(src, at, layout),
        )?;
        let material_replacements = read_material_replacements(&src, &header)?;

        let checksum = ChecksumStatus::compare(
            companion.map(|h| h.checksum),
            header.check_sum,
            "vtx",
        );

        log::debug!(
            "Read vtx: {} body parts, {} lods, layout {:?}",
            body.len(),
            header.num_lods,
            layout
        );

        Ok(Self {
            header,
            layout,
            body,
            material_replacements,
            checksum,
        })
    }
}

fn read_body_part(src: &ByteSource, at: i64, layout: VtxLayout) -> Result<VTXBodyPart> {
    let header: BodyPartHeader = src.record(at, "vtx_body_part")?;
    Ok(VTXBodyPart {
        models: header.models.resolve(
            src,
            at,
            ModelHeader::SIZE,
            "vtx_body_part.model_offset",
            |src, at| read_model(src, at, layout),
        )?,
    })
}

fn read_model(src: &ByteSource, at: i64, layout: VtxLayout) -> Result<VTXModel> {
    let header: ModelHeader = src.record(at, "vtx_model")?;
    Ok(VTXModel {
        lods: header.lods.resolve(
            src,
            at,
            ModelLODHeader::SIZE,
            "vtx_model.lod_offset",
            |src, at| read_model_lod(src, at, layout),
        )?,
    })
}

fn read_model_lod(src: &ByteSource, at: i64, layout: VtxLayout) -> Result<VTXModelLOD> {
    let header: ModelLODHeader = src.record(at, "vtx_model_lod")?;
    Ok(VTXModelLOD {
        switch_point: header.switch_point,
        meshes: header.meshes.resolve(
            src,
            at,
            MeshHeader::SIZE,
            "vtx_model_lod.mesh_offset",
            |src, at| read_mesh(src, at, layout),
        )?,
    })
}

fn read_mesh(src: &ByteSource, at: i64, layout: VtxLayout) -> Result<VTXMesh> {
    let header: MeshHeader = src.record(at, "vtx_mesh")?;
    Ok(VTXMesh {
        flags: header.flags,
        strip_groups: header.strip_groups.resolve(
            src,
            at,
            layout.strip_group,
            "vtx_mesh.strip_group_offset",
            |src, at| read_strip_group(src, at, layout),
        )?,
    })
}

fn read_strip_group(src: &ByteSource, at: i64, layout: VtxLayout) -> Result<VTXStripGroup> {
    // Version 49+ records are longer, the reader is sized to the layout so the
    // trailing fields are stepped over.
    let mut r = src.reader(at, layout.strip_group, "vtx_strip_group")?;
    let header = StripGroupHeader::read(&mut r)?;

    let verts = header
        .verts
        .read_records(src, at, "vtx_strip_group.vert_offset")?;
    let indices = header
        .indices
        .read_records(src, at, "vtx_strip_group.index_offset")?;

    let vert_span = header.verts.span(at, VTXVertex::SIZE);
    let index_span = header.indices.span(at, u16::SIZE);

    let strips = header.strips.resolve(
        src,
        at,
        layout.strip,
        "vtx_strip_group.strip_offset",
        |src, at| {
            let header = StripHeader::read(&mut src.reader(at, layout.strip, "vtx_strip")?)?;
            Ok(VTXStrip {
                verts: read_strip_run(src, header.verts, &vert_span, "vtx_strip.vert_offset")?,
                indices: read_strip_run(
                    src,
                    header.indices,
                    &index_span,
                    "vtx_strip.index_offset",
                )?,
                header,
            })
        },
    )?;

    Ok(VTXStripGroup {
        header,
        verts,
        indices,
        strips,
    })
}

/// Reads a strip's run out of its group's flat array. The strip's offset is a byte
/// offset from the start of that array, and the run must stay inside it.
fn read_strip_run<T: BinaryData>(
    src: &ByteSource,
    run: BinArray<T>,
    group_array: &Range<i64>,
    field: &'static str,
) -> Result<Vec<T>> {
    let span = run.span(group_array.start, T::SIZE);
    if run.count < 0 || span.start < group_array.start || span.end > group_array.end {
        return Err(StudioError::corrupt(field, span, src.len()));
    }
    run.read_records(src, group_array.start, field)
}

fn read_material_replacements(
    src: &ByteSource,
    header: &VTXFileHeader,
) -> Result<Vec<Vec<MaterialReplacement>>> {
    if header.material_replacement_list_offset == 0 {
        return Ok(Vec::new());
    }
    let lists = BinArray::<MaterialReplacementListHeader>::new(
        header.num_lods,
        header.material_replacement_list_offset,
    );
    lists.resolve(
        src,
        0,
        MaterialReplacementListHeader::SIZE,
        "material_replacement_list_offset",
        |src, at| {
            let list: MaterialReplacementListHeader =
                src.record(at, "material_replacement_list")?;
            list.replacements
                .read_records(src, at, "material_replacement_list.replacement_offset")
        },
    )
}

// this structure is in <mod folder>/src/public/optimize.h
#[derive(Clone, Debug)]
pub struct VTXFileHeader {
    // file version as defined by OPTIMIZED_MODEL_FILE_VERSION (currently 7)
    pub version: i32,

    // hardware params that affect how the model is to be optimized.
    pub vert_cache_size: i32,
    pub max_bones_per_strip: u16,
    pub max_bones_per_tri: u16,
    pub max_bones_per_vert: i32,

    // must match checkSum in the .mdl
    pub check_sum: i32,

    pub num_lods: i32, // Also specified in ModelHeader's and should match

    // Offset to materialReplacementList Array. one of these for each LOD
    pub material_replacement_list_offset: i32,

    pub body_parts: BinArray<BodyPartHeader>,
}

impl BinaryData for VTXFileHeader {
    const SIZE: usize = 36;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            version: r.i32()?,
            vert_cache_size: r.i32()?,
            max_bones_per_strip: r.u16()?,
            max_bones_per_tri: r.u16()?,
            max_bones_per_vert: r.i32()?,
            check_sum: r.i32()?,
            num_lods: r.i32()?,
            material_replacement_list_offset: r.i32()?,
            body_parts: BinArray::read_count_offset(r)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct BodyPartHeader {
    pub models: BinArray<ModelHeader>,
}

impl BinaryData for BodyPartHeader {
    const SIZE: usize = 8;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            models: BinArray::read_count_offset(r)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ModelHeader {
    pub lods: BinArray<ModelLODHeader>,
}

impl BinaryData for ModelHeader {
    const SIZE: usize = 8;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            lods: BinArray::read_count_offset(r)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ModelLODHeader {
    pub meshes: BinArray<MeshHeader>,
    pub switch_point: f32,
}

impl BinaryData for ModelLODHeader {
    const SIZE: usize = 12;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            meshes: BinArray::read_count_offset(r)?,
            switch_point: r.f32()?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct MeshHeader {
    pub strip_groups: BinArray<StripGroupHeader>,
    pub flags: FlagSet<MeshFlag>,
}

impl BinaryData for MeshHeader {
    const SIZE: usize = 9;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            strip_groups: BinArray::read_count_offset(r)?,
            flags: FlagSet::new_truncated(r.u8()?),
        })
    }
}

/// Baseline strip group. From studio version 49 a topology index count and offset
/// follow, see [`VtxLayout`].
#[derive(Clone, Debug, PartialEq)]
pub struct StripGroupHeader {
    pub verts: BinArray<VTXVertex>,
    pub indices: BinArray<u16>,
    pub strips: BinArray<StripHeader>,
    pub flags: FlagSet<StripGroupFlag>,
}

impl BinaryData for StripGroupHeader {
    const SIZE: usize = 25;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            verts: BinArray::read_count_offset(r)?,
            indices: BinArray::read_count_offset(r)?,
            strips: BinArray::read_count_offset(r)?,
            flags: FlagSet::new_truncated(r.u8()?),
        })
    }
}

/// Baseline strip, with the same version 49 extension as [`StripGroupHeader`].
///
/// Offsets are into the owning strip group's vertex and index arrays.
#[derive(Clone, Debug, PartialEq)]
pub struct StripHeader {
    pub indices: BinArray<u16>,
    pub verts: BinArray<VTXVertex>,
    pub num_bones: i16,
    pub flags: FlagSet<StripFlag>,
    pub bone_state_changes: BinArray<()>,
}

impl BinaryData for StripHeader {
    const SIZE: usize = 27;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            indices: BinArray::read_count_offset(r)?,
            verts: BinArray::read_count_offset(r)?,
            num_bones: r.i16()?,
            flags: FlagSet::new_truncated(r.u8()?),
            bone_state_changes: BinArray::read_count_offset(r)?,
        })
    }
}

/// Nine bytes in the file, with no padding between vertices.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VTXVertex {
    // these index into the mesh's vert[origMeshVertID]'s bones
    pub bone_weight_index: [u8; 3],
    pub num_bones: u8,

    /// Index into the vvd vertices, relative to the owning mesh's first vertex
    pub orig_mesh_vert_id: u16,

    // for sw skinned verts, these are indices into the global list of bones
    // for hw skinned verts, these are hardware bone indices
    pub bone_id: [i8; 3],
}

impl BinaryData for VTXVertex {
    const SIZE: usize = 9;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        let bone_weight_index = r.bytes()?;
        let num_bones = r.u8()?;
        let orig_mesh_vert_id = r.u16()?;
        let bone_id = r.bytes::<3>()?.map(|b| b as i8);
        Ok(Self {
            bone_weight_index,
            num_bones,
            orig_mesh_vert_id,
            bone_id,
        })
    }
}

struct MaterialReplacementListHeader {
    replacements: BinArray<MaterialReplacement>,
}

impl BinaryData for MaterialReplacementListHeader {
    const SIZE: usize = 8;

    fn read(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            replacements: BinArray::read_count_offset(r)?,
        })
    }
}

#[cfg(test)]
mod vtx_tests {
    use super::*;
    use crate::{binaries::writer::ByteWriter, studio::mdl_headers::test_header};

    const MATERIAL_REPLACEMENT_LIST: usize = 24;
    const BODY_PART_OFFSET: usize = 32;

    /// Where the interesting records of a single strip file start.
    struct Layout {
        model: usize,
        strips: usize,
    }

    /// One body part, model, LOD, mesh and strip group holding three vertices and
    /// three indices, followed by `num_strips` strip records each covering all of them.
    fn single_strip_file(layout: VtxLayout, checksum: i32, num_strips: i32) -> (ByteWriter, Layout) {
        let mut w = ByteWriter::new();
        w.append_i32(VTX_VERSION);
        w.append_i32(24);
        w.append_u16(53);
        w.append_u16(9);
        w.append_i32(3);
        w.append_i32(checksum);
        w.append_i32(1);
        w.append_i32(0);
        w.append_i32(1);
        w.append_i32(VTXFileHeader::SIZE as i32);

        // body part, model and lod each point at the record right after them
        w.append_i32(1);
        w.append_i32(BodyPartHeader::SIZE as i32);
        let model = w.get_offset();
        w.append_i32(1);
        w.append_i32(ModelHeader::SIZE as i32);
        w.append_i32(1);
        w.append_i32(ModelLODHeader::SIZE as i32);
        w.append_f32(12.5);

        w.append_i32(1);
        w.append_i32(MeshHeader::SIZE as i32);
        w.append_u8(0x02);

        let group = w.get_offset();
        w.append_zeroes(layout.strip_group);
        let strips = w.get_offset();
        for _ in 0..num_strips {
            w.append_zeroes(layout.strip);
        }

        let verts = w.get_offset();
        for id in [10u16, 11, 12] {
            w.append_u8_slice(&[0, 1, 2]);
            w.append_u8(1);
            w.append_u16(id);
            w.append_i8(-1);
            w.append_i8(4);
            w.append_i8(5);
        }
        let indices = w.get_offset();
        for i in [0u16, 2, 1] {
            w.append_u16(i);
        }

        w.replace_with_i32(group, 3);
        w.replace_with_i32(group + 4, (verts - group) as i32);
        w.replace_with_i32(group + 8, 3);
        w.replace_with_i32(group + 12, (indices - group) as i32);
        w.replace_with_i32(group + 16, num_strips);
        w.replace_with_i32(group + 20, (strips - group) as i32);
        w.replace(group + 24, &[0x02]);

        for i in 0..num_strips as usize {
            set_strip(&mut w, strips + i * layout.strip, (3, 0), (3, 0));
        }

        (
            w,
            Layout { model, strips },
        )
    }

    /// Writes (count, byte offset) runs for indices then vertices.
    fn set_strip(w: &mut ByteWriter, at: usize, indices: (i32, i32), verts: (i32, i32)) {
        w.replace_with_i32(at, indices.0);
        w.replace_with_i32(at + 4, indices.1);
        w.replace_with_i32(at + 8, verts.0);
        w.replace_with_i32(at + 12, verts.1);
        w.replace(at + 16, &2i16.to_le_bytes());
        w.replace(at + 18, &[0x01]);
    }

    fn only_group(vtx: &VTX) -> &VTXStripGroup {
        &vtx.body[0].models[0].lods[0].meshes[0].strip_groups[0]
    }

    #[test]
    fn test_single_strip() {
        let (w, _) = single_strip_file(VtxLayout::BASELINE, 1, 1);

        let vtx = VTX::read(&w.data, None).unwrap();
        assert_eq!(vtx.header.version, VTX_VERSION);
        assert_eq!(vtx.header.vert_cache_size, 24);
        assert_eq!(vtx.header.max_bones_per_strip, 53);
        assert_eq!(vtx.header.max_bones_per_tri, 9);
        assert_eq!(vtx.header.max_bones_per_vert, 3);
        assert_eq!(vtx.checksum, ChecksumStatus::Unchecked);
        assert_eq!(vtx.layout, VtxLayout::BASELINE);
        assert!(vtx.material_replacements.is_empty());

        assert_eq!(vtx.body.len(), 1);
        assert_eq!(vtx.body[0].models.len(), 1);
        let lod = &vtx.body[0].models[0].lods[0];
        assert_eq!(lod.switch_point, 12.5);
        assert_eq!(lod.meshes.len(), 1);
        assert!(lod.meshes[0].flags.contains(MeshFlag::IsEyes));

        let group = only_group(&vtx);
        assert!(group.header.flags.contains(StripGroupFlag::IsHwSkinned));
        assert_eq!(group.verts.len(), 3);
        assert_eq!(group.indices, vec![0, 2, 1]);
        assert_eq!(group.strips.len(), 1);

        let strip = &group.strips[0];
        assert!(strip.is_tri_list());
        assert_eq!(strip.header.num_bones, 2);
        assert_eq!(strip.indices, vec![0, 2, 1]);
        assert_eq!(strip.verts.len(), 3);
        let ids: Vec<u16> = strip.verts.iter().map(|v| v.orig_mesh_vert_id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(
            strip.verts[0],
            VTXVertex {
                bone_weight_index: [0, 1, 2],
                num_bones: 1,
                orig_mesh_vert_id: 10,
                bone_id: [-1, 4, 5],
            }
        );
    }

    #[test]
    fn test_strip_runs_are_offset_into_group() {
        let (mut w, at) = single_strip_file(VtxLayout::BASELINE, 1, 2);
        set_strip(&mut w, at.strips, (2, 0), (2, 0));
        set_strip(
            &mut w,
            at.strips + VtxLayout::BASELINE.strip,
            (1, 2 * 2),
            (1, 2 * VTXVertex::SIZE as i32),
        );

        let vtx = VTX::read(&w.data, None).unwrap();
        let group = only_group(&vtx);
        assert_eq!(group.strips[0].indices, vec![0, 2]);
        assert_eq!(group.strips[1].indices, vec![1]);
        assert_eq!(group.strips[1].verts[0].orig_mesh_vert_id, 12);
    }

    #[test]
    fn test_no_strips() {
        let (w, _) = single_strip_file(VtxLayout::BASELINE, 1, 0);

        let vtx = VTX::read(&w.data, None).unwrap();
        let group = only_group(&vtx);
        assert!(group.strips.is_empty());
        assert_eq!(group.verts.len(), 3);
        assert_eq!(group.indices.len(), 3);
    }

    #[test]
    fn test_topology_layout_from_companion() {
        let (w, _) = single_strip_file(VtxLayout::TOPOLOGY, 7, 2);
        let companion = test_header(49, 7);

        let vtx = VTX::read(&w.data, Some(&companion)).unwrap();
        assert_eq!(vtx.layout, VtxLayout::TOPOLOGY);
        assert_eq!(vtx.checksum, ChecksumStatus::Matched);

        let group = only_group(&vtx);
        assert_eq!(group.strips.len(), 2);
        for strip in &group.strips {
            assert_eq!(strip.indices, vec![0, 2, 1]);
            assert_eq!(strip.header.num_bones, 2);
        }

        let explicit = VTX::read_with_layout(&w.data, VtxLayout::TOPOLOGY, None).unwrap();
        assert_eq!(only_group(&explicit), group);
    }

    #[test]
    fn test_strip_vertices_outside_group() {
        let (mut w, at) = single_strip_file(VtxLayout::BASELINE, 1, 1);
        set_strip(&mut w, at.strips, (3, 0), (3, 1));

        let err = VTX::read(&w.data, None).unwrap_err();
        assert!(matches!(err, StudioError::CorruptData { .. }));
        assert_eq!(err.field(), Some("vtx_strip.vert_offset"));
    }

    #[test]
    fn test_strip_indices_outside_group() {
        let (mut w, at) = single_strip_file(VtxLayout::BASELINE, 1, 1);
        set_strip(&mut w, at.strips, (3, 2), (3, 0));

        let err = VTX::read(&w.data, None).unwrap_err();
        assert_eq!(err.field(), Some("vtx_strip.index_offset"));
    }

    #[test]
    fn test_negative_strip_run() {
        let (mut w, at) = single_strip_file(VtxLayout::BASELINE, 1, 1);
        set_strip(&mut w, at.strips, (3, 0), (-1, 0));

        let err = VTX::read(&w.data, None).unwrap_err();
        assert_eq!(err.field(), Some("vtx_strip.vert_offset"));
    }

    #[test]
    fn test_checksum_mismatch_still_decodes() {
        let (w, _) = single_strip_file(VtxLayout::BASELINE, 6, 1);
        let companion = test_header(48, 5);

        let vtx = VTX::read(&w.data, Some(&companion)).unwrap();
        assert_eq!(
            vtx.checksum,
            ChecksumStatus::Mismatch {
                expected: 5,
                found: 6
            }
        );
        assert_eq!(only_group(&vtx).strips.len(), 1);
    }

    #[test]
    fn test_material_replacements() {
        let (mut w, _) = single_strip_file(VtxLayout::BASELINE, 1, 1);
        let list = w.get_offset();
        w.append_i32(1);
        w.append_i32(8);
        let replacement = w.get_offset();
        w.append_i16(2);
        w.append_i32(MaterialReplacement::SIZE as i32);
        w.append_cstr("models/alt");
        w.replace_with_i32(MATERIAL_REPLACEMENT_LIST, list as i32);

        let vtx = VTX::read(&w.data, None).unwrap();
        assert_eq!(replacement, list + 8);
        assert_eq!(
            vtx.material_replacements,
            vec![vec![MaterialReplacement {
                material_id: 2,
                name: "models/alt".to_owned(),
            }]]
        );
    }

    #[test]
    fn test_bad_body_part_offset() {
        let (mut w, _) = single_strip_file(VtxLayout::BASELINE, 1, 1);
        w.replace_with_i32(BODY_PART_OFFSET, 10_000);

        let err = VTX::read(&w.data, None).unwrap_err();
        assert!(matches!(err, StudioError::CorruptData { .. }));
        assert_eq!(err.field(), Some("body_part_offset"));
    }

    #[test]
    fn test_negative_lod_count() {
        let (mut w, at) = single_strip_file(VtxLayout::BASELINE, 1, 1);
        w.replace_with_i32(at.model, -1);

        let err = VTX::read(&w.data, None).unwrap_err();
        assert_eq!(err.field(), Some("vtx_mesh.strip_group_offset"));
    }

    #[test]
    fn test_wrong_layout_misreads_second_strip() {
        // Baseline strides over a version 49 file start the second strip 8 bytes early,
        // inside the first strip's topology fields.
        let (w, _) = single_strip_file(VtxLayout::TOPOLOGY, 1, 2);

        let vtx = VTX::read_with_layout(&w.data, VtxLayout::BASELINE, None).unwrap();
        let group = only_group(&vtx);
        assert_eq!(group.strips.len(), 2);
        assert_eq!(group.strips[0].indices, vec![0, 2, 1]);
        assert_eq!(group.strips[0].header.num_bones, 2);

        // The real index run is read as the vertex run, and the vertex count as num_bones
        let second = &group.strips[1];
        assert!(second.indices.is_empty());
        assert_eq!(second.verts, group.verts);
        assert_eq!(second.header.num_bones, 3);
        assert!(!second.is_tri_list());
        assert_eq!(second.header.bone_state_changes, BinArray::new(0, 0x0100_0200));

        let right = VTX::read_with_layout(&w.data, VtxLayout::TOPOLOGY, None).unwrap();
        let second = &only_group(&right).strips[1];
        assert_eq!(second.indices, vec![0, 2, 1]);
        assert_eq!(second.header.num_bones, 2);
        assert!(second.is_tri_list());
    }

    /// Every record at every level points at the same `k` children.
    fn aliased_tree(k: i32) -> ByteWriter {
        let k_usize = k as usize;
        let body_parts = VTXFileHeader::SIZE;
        let models = body_parts + k_usize * BodyPartHeader::SIZE;
        let lods = models + k_usize * ModelHeader::SIZE;
        let meshes = lods + k_usize * ModelLODHeader::SIZE;
        let groups = meshes + k_usize * MeshHeader::SIZE;
        let end = groups + k_usize * VtxLayout::BASELINE.strip_group;

        let mut w = ByteWriter::new();
        w.append_i32(VTX_VERSION);
        w.append_zeroes(24);
        w.append_i32(k);
        w.append_i32(body_parts as i32);
        w.append_zeroes(end - w.get_offset());

        let levels = [
            (body_parts, BodyPartHeader::SIZE, models),
            (models, ModelHeader::SIZE, lods),
            (lods, ModelLODHeader::SIZE, meshes),
            (meshes, MeshHeader::SIZE, groups),
        ];
        for (start, size, children) in levels {
            for i in 0..k_usize {
                let at = start + i * size;
                w.replace_with_i32(at, k);
                w.replace_with_i32(at + 4, children as i32 - at as i32);
            }
        }
        w
    }

    #[test]
    fn test_aliased_children_exhaust_read_budget() {
        let w = aliased_tree(12);
        assert_eq!(w.data.len(), 780);

        let err = VTX::read(&w.data, None).unwrap_err();
        assert!(matches!(err, StudioError::CorruptData { len: 780, .. }));
        assert_eq!(err.field(), Some("vtx_mesh.strip_group_offset"));
    }

    #[test]
    fn test_unshared_chain_decodes() {
        let w = aliased_tree(1);

        let vtx = VTX::read(&w.data, None).unwrap();
        let groups = &vtx.body[0].models[0].lods[0].meshes[0].strip_groups;
        assert_eq!(groups.len(), 1);
        assert!(groups[0].strips.is_empty());
        assert!(groups[0].verts.is_empty());
    }
}
