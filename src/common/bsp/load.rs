// Copyright © 2018 Cormac O'Brien
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of this software
// and associated documentation files (the "Software"), to deal in the Software without
// restriction, including without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all copies or
// substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
// BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use std::{
    fs::File,
    io::{BufReader, Cursor, Read, Seek, SeekFrom},
    path::Path,
};

use crate::common::{
    bsp::{
        gamelump::{self, DETAIL_PROP_LUMP_ID, STATIC_PROP_LUMP_ID},
        polygon, tree, BspBrush, BspBrushSide, BspContents, BspCubemap, BspData, BspDispInfo,
        BspDispVert, BspEdge, BspEdgeIndex, BspError, BspErrorKind, BspFace, BspLeaf, BspLumpId,
        BspModel, BspNode, BspNodeChild, BspPlane, BspTexData, BspTexInfo, BspWarning,
        DispTriTags, SurfaceFlags, LUMP_COUNT, MAX_MAP_LEAFBRUSHES, MAX_MAP_LEAFFACES,
    },
    config::BspImportConfig,
    util::cstring_from_bytes,
};

use byteorder::{LittleEndian, ReadBytesExt};
use cgmath::Vector3;
use failure::{Error, ResultExt};
use num::FromPrimitive;

pub const VBSP_MAGIC: i32 =
    ('V' as i32) | ('B' as i32) << 8 | ('S' as i32) << 16 | ('P' as i32) << 24;

/// Versions older than this are loaded with a warning.
pub const VBSP_MIN_VERSION: i32 = 19;

const PLANE_SIZE: usize = 20;
const VERTEX_SIZE: usize = 12;
const EDGE_SIZE: usize = 4;
const SURFEDGE_SIZE: usize = 4;
const NODE_SIZE: usize = 32;
const LEAF_SIZE: usize = 32;
const LEAF_SIZE_V0: usize = 56;
const FACE_SIZE: usize = 56;
const TEXINFO_SIZE: usize = 72;
const TEXDATA_SIZE: usize = 32;
const STRING_TABLE_SIZE: usize = 4;
const BRUSH_SIZE: usize = 12;
const BRUSH_SIDE_SIZE: usize = 8;
const LEAF_FACE_SIZE: usize = 2;
const LEAF_BRUSH_SIZE: usize = 2;
const MODEL_SIZE: usize = 48;
const DISP_INFO_SIZE: usize = 176;
const DISP_VERT_SIZE: usize = 20;
const DISP_TRI_SIZE: usize = 2;
const CUBEMAP_SIZE: usize = 16;

// edge and corner neighbor records, which are not used
const DISP_NEIGHBOR_SIZE: usize = 88;
// per-leaf ambient light cube, only present in version 0 leaves
const LEAF_AMBIENT_SIZE: usize = 24;

#[derive(Clone, Debug)]
pub struct BspLump {
    pub offset: u64,
    pub size: usize,
    pub version: i32,
    pub four_cc: [u8; 4],
}

impl BspLump {
    fn from_raw(offset: i32, size: i32, version: i32, four_cc: [u8; 4]) -> Result<BspLump, Error> {
        ensure!(offset >= 0, "Lump offset must not be negative (was {})", offset);
        ensure!(size >= 0, "Lump size must not be negative (was {})", size);

        Ok(BspLump {
            offset: offset as u64,
            size: size as usize,
            version,
            four_cc,
        })
    }
}

#[derive(Clone, Debug)]
pub struct BspHeader {
    pub version: i32,
    pub lumps: Vec<BspLump>,
    pub map_revision: i32,
}

impl BspHeader {
    pub fn lump(&self, id: BspLumpId) -> &BspLump {
        &self.lumps[id as usize]
    }
}

fn check_alignment<S>(seeker: &mut S, ofs: u64) -> Result<(), Error>
where
    S: Seek,
{
    ensure!(
        seeker.seek(SeekFrom::Current(0))? == seeker.seek(SeekFrom::Start(ofs))?,
        "BSP read misaligned"
    );

    Ok(())
}

fn read_header<R>(reader: &mut R, warnings: &mut Vec<BspWarning>) -> Result<BspHeader, Error>
where
    R: Read,
{
    let magic = reader.read_i32::<LittleEndian>()?;
    if magic != VBSP_MAGIC {
        return Err(BspErrorKind::BadMagic { found: magic }.into());
    }

    let version = reader.read_i32::<LittleEndian>()?;
    if version < VBSP_MIN_VERSION {
        warn!(
            "Map version {} is older than {}, continuing anyway",
            version, VBSP_MIN_VERSION
        );
        warnings.push(BspWarning::OldVersion {
            found: version,
            minimum: VBSP_MIN_VERSION,
        });
    }

    let mut lumps = Vec::with_capacity(LUMP_COUNT);
    for l in 0..LUMP_COUNT {
        let offset = reader.read_i32::<LittleEndian>()?;
        let size = reader.read_i32::<LittleEndian>()?;
        let lump_version = reader.read_i32::<LittleEndian>()?;
        let mut four_cc = [0; 4];
        reader.read_exact(&mut four_cc)?;

        let name = match BspLumpId::from_usize(l) {
            Some(id) => format!("{:?}:", id),
            None => format!("Lump {}:", l),
        };
        debug!(
            "{: <28} Offset = 0x{:>08x} | Size = 0x{:>08x} | Version = {}",
            name, offset, size, lump_version
        );

        lumps.push(
            BspLump::from_raw(offset, size, lump_version, four_cc).context("Failed to read lump")?,
        );
    }

    let map_revision = reader.read_i32::<LittleEndian>()?;

    Ok(BspHeader {
        version,
        lumps,
        map_revision,
    })
}

/// Reads a lump as an array of fixed-size records.
fn read_lump<R, T, F>(
    reader: &mut R,
    header: &BspHeader,
    id: BspLumpId,
    record_size: usize,
    mut read_record: F,
) -> Result<Vec<T>, Error>
where
    R: Read + Seek,
    F: FnMut(&mut R) -> Result<T, Error>,
{
    let lump = header.lump(id);
    if lump.size % record_size != 0 {
        return Err(BspErrorKind::MisalignedLump {
            lump: id,
            size: lump.size,
            record_size,
        }
        .into());
    }

    let count = lump.size / record_size;
    debug!("{:?} count = {}", id, count);

    let mut records = Vec::with_capacity(count);
    if count == 0 {
        return Ok(records);
    }

    reader.seek(SeekFrom::Start(lump.offset))?;
    for _ in 0..count {
        records.push(read_record(reader)?);
    }
    check_alignment(reader, lump.offset + lump.size as u64)?;

    Ok(records)
}

fn read_lump_bytes<R>(reader: &mut R, lump: &BspLump) -> Result<Vec<u8>, Error>
where
    R: Read + Seek,
{
    let mut data = Vec::with_capacity(lump.size);
    if lump.size == 0 {
        return Ok(data);
    }

    reader.seek(SeekFrom::Start(lump.offset))?;
    (&mut *reader).take(lump.size as u64).read_to_end(&mut data)?;
    check_alignment(reader, lump.offset + lump.size as u64)?;

    Ok(data)
}

pub(crate) fn read_vector3<R>(reader: &mut R) -> Result<Vector3<f32>, Error>
where
    R: ReadBytesExt,
{
    Ok(Vector3::new(
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
    ))
}

fn read_i16x3<R>(reader: &mut R) -> Result<[i16; 3], Error>
where
    R: ReadBytesExt,
{
    Ok([
        reader.read_i16::<LittleEndian>()?,
        reader.read_i16::<LittleEndian>()?,
        reader.read_i16::<LittleEndian>()?,
    ])
}

fn read_index<R>(reader: &mut R, what: &str) -> Result<usize, Error>
where
    R: ReadBytesExt,
{
    match reader.read_i32::<LittleEndian>()? {
        i if i < 0 => bail!("Invalid {} ({})", what, i),
        i => Ok(i as usize),
    }
}

fn load_plane<R>(reader: &mut R) -> Result<BspPlane, Error>
where
    R: ReadBytesExt,
{
    let normal = read_vector3(reader)?;
    let dist = reader.read_f32::<LittleEndian>()?;
    let kind = reader.read_i32::<LittleEndian>()?;

    Ok(BspPlane::new(normal, dist, kind))
}

fn load_edge<R>(reader: &mut R) -> Result<BspEdge, Error>
where
    R: ReadBytesExt,
{
    Ok(BspEdge {
        vertex_ids: [
            reader.read_u16::<LittleEndian>()?,
            reader.read_u16::<LittleEndian>()?,
        ],
    })
}

fn load_surfedge<R>(reader: &mut R) -> Result<BspEdgeIndex, Error>
where
    R: ReadBytesExt,
{
    Ok(BspEdgeIndex::from_surfedge(reader.read_i32::<LittleEndian>()?))
}

fn load_node<R>(reader: &mut R) -> Result<BspNode, Error>
where
    R: ReadBytesExt,
{
    let plane_id = read_index(reader, "node plane id")?;
    let children = [
        BspNodeChild::from_raw(reader.read_i32::<LittleEndian>()?),
        BspNodeChild::from_raw(reader.read_i32::<LittleEndian>()?),
    ];
    let min = read_i16x3(reader)?;
    let max = read_i16x3(reader)?;
    let face_id = reader.read_u16::<LittleEndian>()? as usize;
    let face_count = reader.read_u16::<LittleEndian>()? as usize;
    let area = reader.read_i16::<LittleEndian>()?;
    let _padding = reader.read_i16::<LittleEndian>()?;

    Ok(BspNode {
        plane_id,
        children,
        min,
        max,
        face_id,
        face_count,
        area,
    })
}

fn load_leaf<R>(reader: &mut R, version: i32) -> Result<BspLeaf, Error>
where
    R: ReadBytesExt,
{
    let contents = BspContents::from_bits_truncate(reader.read_i32::<LittleEndian>()? as u32);
    let cluster = match reader.read_i16::<LittleEndian>()? {
        c if c < 0 => None,
        c => Some(c as usize),
    };

    // 9 bits of area, 7 bits of flags
    let area_flags = reader.read_u16::<LittleEndian>()?;
    let area = area_flags & 0x1ff;
    let flags = (area_flags >> 9) as u8;

    let min = read_i16x3(reader)?;
    let max = read_i16x3(reader)?;
    let leafface_id = reader.read_u16::<LittleEndian>()? as usize;
    let leafface_count = reader.read_u16::<LittleEndian>()? as usize;
    let leafbrush_id = reader.read_u16::<LittleEndian>()? as usize;
    let leafbrush_count = reader.read_u16::<LittleEndian>()? as usize;
    let water_data_id = reader.read_i16::<LittleEndian>()?;

    if version == 0 {
        let mut ambient = [0; LEAF_AMBIENT_SIZE];
        reader.read_exact(&mut ambient)?;
    }

    let _padding = reader.read_i16::<LittleEndian>()?;

    Ok(BspLeaf {
        contents,
        cluster,
        area,
        flags,
        min,
        max,
        leafface_id,
        leafface_count,
        leafbrush_id,
        leafbrush_count,
        water_data_id,
    })
}

fn load_face<R>(reader: &mut R) -> Result<BspFace, Error>
where
    R: ReadBytesExt,
{
    let plane_id = reader.read_u16::<LittleEndian>()? as usize;
    let side = reader.read_u8()?;
    let on_node = reader.read_u8()? != 0;
    let edge_id = reader.read_i32::<LittleEndian>()?;
    let edge_count = reader.read_i16::<LittleEndian>()?;
    let texinfo_id = reader.read_i16::<LittleEndian>()?;
    let dispinfo_id = reader.read_i16::<LittleEndian>()?;
    let fog_volume_id = reader.read_i16::<LittleEndian>()?;

    let mut light_styles = [0; 4];
    reader.read_exact(&mut light_styles)?;

    let light_offset = reader.read_i32::<LittleEndian>()?;
    let area = reader.read_f32::<LittleEndian>()?;
    let lightmap_mins = [
        reader.read_i32::<LittleEndian>()?,
        reader.read_i32::<LittleEndian>()?,
    ];
    let lightmap_size = [
        reader.read_i32::<LittleEndian>()?,
        reader.read_i32::<LittleEndian>()?,
    ];
    let original_face_id = reader.read_i32::<LittleEndian>()?;
    let primitive_count = reader.read_u16::<LittleEndian>()?;
    let primitive_id = reader.read_u16::<LittleEndian>()?;
    let smoothing_groups = reader.read_u32::<LittleEndian>()?;

    Ok(BspFace {
        plane_id,
        side,
        on_node,
        edge_id,
        edge_count,
        texinfo_id,
        dispinfo_id,
        fog_volume_id,
        light_styles,
        light_offset,
        area,
        lightmap_mins,
        lightmap_size,
        original_face_id,
        primitive_count,
        primitive_id,
        smoothing_groups,
    })
}

fn load_texinfo<R>(reader: &mut R) -> Result<BspTexInfo, Error>
where
    R: ReadBytesExt,
{
    let mut vecs = [[[0.0f32; 4]; 2]; 2];
    for set in vecs.iter_mut() {
        for axis in set.iter_mut() {
            for component in axis.iter_mut() {
                *component = reader.read_f32::<LittleEndian>()?;
            }
        }
    }

    let flags = SurfaceFlags::from_bits_truncate(reader.read_i32::<LittleEndian>()? as u32);
    let texdata_id = reader.read_i32::<LittleEndian>()?;

    Ok(BspTexInfo {
        texture_vecs: vecs[0],
        lightmap_vecs: vecs[1],
        flags,
        texdata_id,
    })
}

fn load_texdata<R>(reader: &mut R) -> Result<BspTexData, Error>
where
    R: ReadBytesExt,
{
    Ok(BspTexData {
        reflectivity: read_vector3(reader)?,
        name_id: reader.read_i32::<LittleEndian>()?,
        width: reader.read_i32::<LittleEndian>()?,
        height: reader.read_i32::<LittleEndian>()?,
        view_width: reader.read_i32::<LittleEndian>()?,
        view_height: reader.read_i32::<LittleEndian>()?,
    })
}

fn load_brush<R>(reader: &mut R) -> Result<BspBrush, Error>
where
    R: ReadBytesExt,
{
    Ok(BspBrush {
        side_id: read_index(reader, "brush side id")?,
        side_count: read_index(reader, "brush side count")?,
        contents: BspContents::from_bits_truncate(reader.read_i32::<LittleEndian>()? as u32),
    })
}

fn load_brush_side<R>(reader: &mut R) -> Result<BspBrushSide, Error>
where
    R: ReadBytesExt,
{
    Ok(BspBrushSide {
        plane_id: reader.read_u16::<LittleEndian>()? as usize,
        texinfo_id: reader.read_i16::<LittleEndian>()?,
        dispinfo_id: reader.read_i16::<LittleEndian>()?,
        bevel: reader.read_u8()? != 0,
        thin: reader.read_u8()? != 0,
    })
}

fn load_model<R>(reader: &mut R) -> Result<BspModel, Error>
where
    R: ReadBytesExt,
{
    Ok(BspModel {
        min: read_vector3(reader)?,
        max: read_vector3(reader)?,
        origin: read_vector3(reader)?,
        head_node: read_index(reader, "model head node")?,
        face_id: read_index(reader, "model face id")?,
        face_count: read_index(reader, "model face count")?,
    })
}

fn load_disp_info<R>(reader: &mut R) -> Result<BspDispInfo, Error>
where
    R: ReadBytesExt,
{
    let start_position = read_vector3(reader)?;
    let disp_vert_id = read_index(reader, "displacement vertex id")?;
    let disp_tri_id = read_index(reader, "displacement triangle id")?;
    let power = reader.read_i32::<LittleEndian>()?;
    let min_tess = reader.read_i32::<LittleEndian>()?;
    let smoothing_angle = reader.read_f32::<LittleEndian>()?;
    let contents = BspContents::from_bits_truncate(reader.read_i32::<LittleEndian>()? as u32);
    let map_face = reader.read_u16::<LittleEndian>()? as usize;
    let _padding = reader.read_u16::<LittleEndian>()?;
    let lightmap_alpha_id = reader.read_i32::<LittleEndian>()?;
    let lightmap_sample_position_id = reader.read_i32::<LittleEndian>()?;

    let mut neighbors = [0; DISP_NEIGHBOR_SIZE];
    reader.read_exact(&mut neighbors)?;

    let mut allowed_verts = [0; 10];
    for v in allowed_verts.iter_mut() {
        *v = reader.read_u32::<LittleEndian>()?;
    }

    Ok(BspDispInfo {
        start_position,
        disp_vert_id,
        disp_tri_id,
        power,
        min_tess,
        smoothing_angle,
        contents,
        map_face,
        lightmap_alpha_id,
        lightmap_sample_position_id,
        allowed_verts,
    })
}

fn load_disp_vert<R>(reader: &mut R) -> Result<BspDispVert, Error>
where
    R: ReadBytesExt,
{
    Ok(BspDispVert {
        vec: read_vector3(reader)?,
        dist: reader.read_f32::<LittleEndian>()?,
        alpha: reader.read_f32::<LittleEndian>()?,
    })
}

fn load_cubemap<R>(reader: &mut R) -> Result<BspCubemap, Error>
where
    R: ReadBytesExt,
{
    Ok(BspCubemap {
        origin: [
            reader.read_i32::<LittleEndian>()?,
            reader.read_i32::<LittleEndian>()?,
            reader.read_i32::<LittleEndian>()?,
        ],
        size: reader.read_i32::<LittleEndian>()?,
    })
}

/// Resolves texture names through the string table and string data lumps.
fn resolve_texture_names(texdata: &[BspTexData], table: &[i32], data: &[u8]) -> Vec<String> {
    texdata
        .iter()
        .enumerate()
        .map(|(i, td)| {
            let offset = if td.name_id < 0 {
                None
            } else {
                table.get(td.name_id as usize).cloned()
            };

            match offset {
                Some(o) if o >= 0 && (o as usize) < data.len() => {
                    cstring_from_bytes(&data[o as usize..])
                }
                _ => {
                    debug!("Texdata {} has no valid name (string id {})", i, td.name_id);
                    String::new()
                }
            }
        })
        .collect()
}

/// Decodes the run-length encoded potentially visible set of every cluster.
pub(crate) fn decode_visibility(data: &[u8]) -> Result<Vec<Vec<usize>>, Error> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = Cursor::new(data);
    let cluster_count = read_index(&mut reader, "visibility cluster count")?;
    let mut offsets = Vec::with_capacity(cluster_count);
    for _ in 0..cluster_count {
        let pvs = read_index(&mut reader, "visibility offset")?;
        let _pas = reader.read_i32::<LittleEndian>()?;
        offsets.push(pvs);
    }

    let mut visible = Vec::with_capacity(cluster_count);
    for (cluster, offset) in offsets.into_iter().enumerate() {
        ensure!(
            offset < data.len(),
            "Visibility offset {} of cluster {} is out of range",
            offset,
            cluster
        );
        visible.push(decode_cluster_row(&data[offset..], cluster_count));
    }

    Ok(visible)
}

fn decode_cluster_row(data: &[u8], cluster_count: usize) -> Vec<usize> {
    let mut cluster = 0;
    let mut visible = Vec::new();
    let mut it = data.iter();

    while cluster < cluster_count {
        match it.next() {
            // a zero byte signals the start of an RLE sequence
            Some(0) => match it.next() {
                Some(skip) => cluster += 8 * *skip as usize,
                None => break,
            },

            Some(bits) => {
                for shift in 0..8 {
                    if bits & 1 << shift != 0 && cluster < cluster_count {
                        visible.push(cluster);
                    }

                    cluster += 1;
                }
            }

            None => break,
        }
    }

    visible
}

/// Loads a map from the given file.
pub fn load_file<P>(path: P, config: &BspImportConfig) -> Result<BspData, BspError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    info!("Loading map from {}", path.display());
    let file = File::open(path)?;
    load(file, config)
}

/// Loads a map from a seekable byte stream.
///
/// Lump data outside the stream causes an I/O error. Structural problems which make the data
/// unusable are fatal; recoverable irregularities are recorded in [`BspData::warnings`].
pub fn load<R>(src: R, config: &BspImportConfig) -> Result<BspData, BspError>
where
    R: Read + Seek,
{
    let mut reader = BufReader::new(src);
    Ok(load_data(&mut reader, config)?)
}

fn load_data<R>(reader: &mut R, config: &BspImportConfig) -> Result<BspData, Error>
where
    R: Read + Seek,
{
    let mut warnings = Vec::new();
    let header = read_header(reader, &mut warnings)?;
    info!(
        "Map version {}, revision {}",
        header.version, header.map_revision
    );

    let entities = cstring_from_bytes(&read_lump_bytes(reader, header.lump(BspLumpId::Entities))?);

    let planes = read_lump(reader, &header, BspLumpId::Planes, PLANE_SIZE, load_plane)?;
    let vertices = read_lump(reader, &header, BspLumpId::Vertexes, VERTEX_SIZE, read_vector3)?;
    let edges = read_lump(reader, &header, BspLumpId::Edges, EDGE_SIZE, load_edge)?;
    let edgelist = read_lump(
        reader,
        &header,
        BspLumpId::Surfedges,
        SURFEDGE_SIZE,
        load_surfedge,
    )?;

    let texinfo = read_lump(reader, &header, BspLumpId::TexInfo, TEXINFO_SIZE, load_texinfo)?;
    let texdata = read_lump(reader, &header, BspLumpId::TexData, TEXDATA_SIZE, load_texdata)?;
    let string_table = read_lump(
        reader,
        &header,
        BspLumpId::TexDataStringTable,
        STRING_TABLE_SIZE,
        |r| Ok(r.read_i32::<LittleEndian>()?),
    )?;
    let string_data = read_lump_bytes(reader, header.lump(BspLumpId::TexDataStringData))?;
    let texture_names = resolve_texture_names(&texdata, &string_table, &string_data);

    let faces = read_lump(reader, &header, BspLumpId::Faces, FACE_SIZE, load_face)?;
    let original_faces = read_lump(
        reader,
        &header,
        BspLumpId::OriginalFaces,
        FACE_SIZE,
        load_face,
    )?;

    let nodes = read_lump(reader, &header, BspLumpId::Nodes, NODE_SIZE, load_node)?;

    let leaf_version = header.lump(BspLumpId::Leafs).version;
    let leaf_size = match leaf_version {
        0 => LEAF_SIZE_V0,
        _ => LEAF_SIZE,
    };
    let leaves = read_lump(reader, &header, BspLumpId::Leafs, leaf_size, |r| {
        load_leaf(r, leaf_version)
    })?;

    tree::validate_tree(&nodes, leaves.len(), planes.len())?;

    let leaf_faces = read_lump(
        reader,
        &header,
        BspLumpId::LeafFaces,
        LEAF_FACE_SIZE,
        |r| Ok(r.read_u16::<LittleEndian>()?),
    )?;
    check_leaf_table(
        &mut warnings,
        BspLumpId::LeafFaces,
        leaf_faces.len(),
        MAX_MAP_LEAFFACES,
    );

    let leaf_brushes = read_lump(
        reader,
        &header,
        BspLumpId::LeafBrushes,
        LEAF_BRUSH_SIZE,
        |r| Ok(r.read_u16::<LittleEndian>()?),
    )?;
    check_leaf_table(
        &mut warnings,
        BspLumpId::LeafBrushes,
        leaf_brushes.len(),
        MAX_MAP_LEAFBRUSHES,
    );

    let brushes = read_lump(reader, &header, BspLumpId::Brushes, BRUSH_SIZE, load_brush)?;
    let brush_sides = read_lump(
        reader,
        &header,
        BspLumpId::BrushSides,
        BRUSH_SIDE_SIZE,
        load_brush_side,
    )?;

    let models = read_lump(reader, &header, BspLumpId::Models, MODEL_SIZE, load_model)?;

    let disp_infos = read_lump(
        reader,
        &header,
        BspLumpId::DispInfo,
        DISP_INFO_SIZE,
        load_disp_info,
    )?;
    let disp_verts = read_lump(
        reader,
        &header,
        BspLumpId::DispVerts,
        DISP_VERT_SIZE,
        load_disp_vert,
    )?;
    let disp_tris = read_lump(reader, &header, BspLumpId::DispTris, DISP_TRI_SIZE, |r| {
        Ok(DispTriTags::from_bits_truncate(r.read_u16::<LittleEndian>()?))
    })?;
    let cubemaps = read_lump(reader, &header, BspLumpId::Cubemaps, CUBEMAP_SIZE, load_cubemap)?;

    let visibility = if config.parse_visibility {
        let data = read_lump_bytes(reader, header.lump(BspLumpId::Visibility))?;
        let vis = decode_visibility(&data).context("Failed to decode visibility")?;
        debug!("Decoded visibility for {} clusters", vis.len());
        Some(vis.into_boxed_slice())
    } else {
        None
    };

    let game_lumps = gamelump::read_directory(reader, header.lump(BspLumpId::GameLump))?;

    let static_props = match gamelump::find(&game_lumps, STATIC_PROP_LUMP_ID) {
        Some(lump) => Some(gamelump::read_static_props(reader, lump)?),
        None => {
            warn!("No static prop game lump");
            warnings.push(BspWarning::MissingGameLump(*b"sprp"));
            None
        }
    };

    let detail_props = match gamelump::find(&game_lumps, DETAIL_PROP_LUMP_ID) {
        Some(lump) => Some(gamelump::read_detail_props(
            reader,
            lump,
            config.import_detail_objects,
        )?),
        None => {
            warn!("No detail prop game lump");
            warnings.push(BspWarning::MissingGameLump(*b"dprp"));
            None
        }
    };

    let (polygons, skipped_faces) =
        polygon::build_polygons(&faces, &edgelist, &edges, &vertices, &planes);
    debug!(
        "Built {} face polygons, skipped {}",
        faces.len() - skipped_faces,
        skipped_faces
    );

    Ok(BspData {
        header,
        entities,
        planes: planes.into_boxed_slice(),
        vertices: vertices.into_boxed_slice(),
        edges: edges.into_boxed_slice(),
        edgelist: edgelist.into_boxed_slice(),
        nodes: nodes.into_boxed_slice(),
        leaves: leaves.into_boxed_slice(),
        faces: faces.into_boxed_slice(),
        original_faces: original_faces.into_boxed_slice(),
        texinfo: texinfo.into_boxed_slice(),
        texdata: texdata.into_boxed_slice(),
        texture_names: texture_names.into_boxed_slice(),
        brushes: brushes.into_boxed_slice(),
        brush_sides: brush_sides.into_boxed_slice(),
        leaf_faces: leaf_faces.into_boxed_slice(),
        leaf_brushes: leaf_brushes.into_boxed_slice(),
        models: models.into_boxed_slice(),
        disp_infos: disp_infos.into_boxed_slice(),
        disp_verts: disp_verts.into_boxed_slice(),
        disp_tris: disp_tris.into_boxed_slice(),
        cubemaps: cubemaps.into_boxed_slice(),
        game_lumps: game_lumps.into_boxed_slice(),
        static_props,
        detail_props,
        visibility,
        polygons,
        skipped_faces,
        warnings,
    })
}

fn check_leaf_table(warnings: &mut Vec<BspWarning>, lump: BspLumpId, count: usize, max: usize) {
    if count == 0 {
        warn!("{:?} lump is empty", lump);
        warnings.push(BspWarning::EmptyLump(lump));
    } else if count > max {
        warn!("{:?} has {} entries, limit is {}", lump, count, max);
        warnings.push(BspWarning::TooManyRecords { lump, count, max });
    }
}
