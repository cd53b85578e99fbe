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

//! Builders for small in-memory map files.

use std::io::Cursor;

use crate::common::{
    bsp::{
        gamelump::{game_lump_id, PROP_NAME_LEN},
        load, BspData, BspLumpId, LUMP_COUNT, VBSP_MAGIC,
    },
    config::BspImportConfig,
};

use byteorder::{LittleEndian, WriteBytesExt};

const HEADER_SIZE: usize = 4 + 4 + LUMP_COUNT * 16 + 4;

pub struct BspWriter {
    version: i32,
    lumps: Vec<(i32, Vec<u8>)>,
    game_lumps: Vec<([u8; 4], u16, Vec<u8>)>,
}

impl BspWriter {
    pub fn new() -> BspWriter {
        BspWriter {
            version: 20,
            lumps: vec![(0, Vec::new()); LUMP_COUNT],
            game_lumps: Vec::new(),
        }
    }

    pub fn version(&mut self, version: i32) -> &mut BspWriter {
        self.version = version;
        self
    }

    pub fn lump(&mut self, id: BspLumpId, data: Vec<u8>) -> &mut BspWriter {
        self.lumps[id as usize].1 = data;
        self
    }

    pub fn lump_version(&mut self, id: BspLumpId, version: i32) -> &mut BspWriter {
        self.lumps[id as usize].0 = version;
        self
    }

    pub fn game_lump(&mut self, code: [u8; 4], version: u16, data: Vec<u8>) -> &mut BspWriter {
        self.game_lumps.push((code, version, data));
        self
    }

    fn game_lump_data(&self, offset: usize) -> Vec<u8> {
        let mut data = Vec::new();
        data.write_i32::<LittleEndian>(self.game_lumps.len() as i32)
            .unwrap();

        let mut data_offset = offset + 4 + 16 * self.game_lumps.len();
        for (code, version, lump) in self.game_lumps.iter() {
            data.write_i32::<LittleEndian>(game_lump_id(*code)).unwrap();
            data.write_u16::<LittleEndian>(0).unwrap();
            data.write_u16::<LittleEndian>(*version).unwrap();
            data.write_i32::<LittleEndian>(data_offset as i32).unwrap();
            data.write_i32::<LittleEndian>(lump.len() as i32).unwrap();
            data_offset += lump.len();
        }

        for (_, _, lump) in self.game_lumps.iter() {
            data.extend_from_slice(lump);
        }

        data
    }

    pub fn finish(&self) -> Vec<u8> {
        let mut directory = Vec::new();
        let mut body = Vec::new();

        for (i, (version, lump)) in self.lumps.iter().enumerate() {
            let offset = HEADER_SIZE + body.len();
            let lump = if i == BspLumpId::GameLump as usize && !self.game_lumps.is_empty() {
                self.game_lump_data(offset)
            } else {
                lump.clone()
            };

            directory.push((offset, lump.len(), *version));
            body.extend_from_slice(&lump);
        }

        let mut data = Vec::new();
        data.write_i32::<LittleEndian>(VBSP_MAGIC).unwrap();
        data.write_i32::<LittleEndian>(self.version).unwrap();
        for (offset, len, version) in directory {
            data.write_i32::<LittleEndian>(offset as i32).unwrap();
            data.write_i32::<LittleEndian>(len as i32).unwrap();
            data.write_i32::<LittleEndian>(version).unwrap();
            data.extend_from_slice(&[0; 4]);
        }
        data.write_i32::<LittleEndian>(1).unwrap();
        assert_eq!(data.len(), HEADER_SIZE);

        data.extend_from_slice(&body);
        data
    }

    pub fn load(&self) -> BspData {
        load(Cursor::new(self.finish()), &BspImportConfig::default()).unwrap()
    }
}

fn write_vector3(data: &mut Vec<u8>, v: [f32; 3]) {
    for c in v.iter() {
        data.write_f32::<LittleEndian>(*c).unwrap();
    }
}

fn write_i16x3(data: &mut Vec<u8>, v: [i16; 3]) {
    for c in v.iter() {
        data.write_i16::<LittleEndian>(*c).unwrap();
    }
}

pub fn plane(normal: [f32; 3], dist: f32) -> Vec<u8> {
    let mut data = Vec::new();
    write_vector3(&mut data, normal);
    data.write_f32::<LittleEndian>(dist).unwrap();
    data.write_i32::<LittleEndian>(0).unwrap();
    data
}

pub fn vertex(v: [f32; 3]) -> Vec<u8> {
    let mut data = Vec::new();
    write_vector3(&mut data, v);
    data
}

pub fn edge(a: u16, b: u16) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_u16::<LittleEndian>(a).unwrap();
    data.write_u16::<LittleEndian>(b).unwrap();
    data
}

pub fn surfedge(s: i32) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_i32::<LittleEndian>(s).unwrap();
    data
}

pub fn node(plane_id: i32, children: [i32; 2], face_id: u16, face_count: u16) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_i32::<LittleEndian>(plane_id).unwrap();
    data.write_i32::<LittleEndian>(children[0]).unwrap();
    data.write_i32::<LittleEndian>(children[1]).unwrap();
    write_i16x3(&mut data, [-1024; 3]);
    write_i16x3(&mut data, [1024; 3]);
    data.write_u16::<LittleEndian>(face_id).unwrap();
    data.write_u16::<LittleEndian>(face_count).unwrap();
    data.write_i16::<LittleEndian>(0).unwrap();
    data.write_i16::<LittleEndian>(0).unwrap();
    data
}

/// A version 1 leaf.
pub fn leaf(
    cluster: i16,
    leafface_id: u16,
    leafface_count: u16,
    leafbrush_id: u16,
    leafbrush_count: u16,
) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_i32::<LittleEndian>(0).unwrap();
    data.write_i16::<LittleEndian>(cluster).unwrap();
    data.write_u16::<LittleEndian>(1).unwrap();
    write_i16x3(&mut data, [-1024; 3]);
    write_i16x3(&mut data, [1024; 3]);
    data.write_u16::<LittleEndian>(leafface_id).unwrap();
    data.write_u16::<LittleEndian>(leafface_count).unwrap();
    data.write_u16::<LittleEndian>(leafbrush_id).unwrap();
    data.write_u16::<LittleEndian>(leafbrush_count).unwrap();
    data.write_i16::<LittleEndian>(-1).unwrap();
    data.write_i16::<LittleEndian>(0).unwrap();
    data
}

pub fn face(plane_id: u16, edge_id: i32, edge_count: i16, texinfo_id: i16) -> Vec<u8> {
    face_ex(plane_id, 0, edge_id, edge_count, texinfo_id, -1, 0)
}

pub fn face_ex(
    plane_id: u16,
    side: u8,
    edge_id: i32,
    edge_count: i16,
    texinfo_id: i16,
    dispinfo_id: i16,
    smoothing_groups: u32,
) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_u16::<LittleEndian>(plane_id).unwrap();
    data.write_u8(side).unwrap();
    data.write_u8(0).unwrap();
    data.write_i32::<LittleEndian>(edge_id).unwrap();
    data.write_i16::<LittleEndian>(edge_count).unwrap();
    data.write_i16::<LittleEndian>(texinfo_id).unwrap();
    data.write_i16::<LittleEndian>(dispinfo_id).unwrap();
    data.write_i16::<LittleEndian>(-1).unwrap();
    data.extend_from_slice(&[0, 255, 255, 255]);
    data.write_i32::<LittleEndian>(-1).unwrap();
    data.write_f32::<LittleEndian>(0.0).unwrap();
    for _ in 0..4 {
        data.write_i32::<LittleEndian>(0).unwrap();
    }
    data.write_i32::<LittleEndian>(-1).unwrap();
    data.write_u16::<LittleEndian>(0).unwrap();
    data.write_u16::<LittleEndian>(0).unwrap();
    data.write_u32::<LittleEndian>(smoothing_groups).unwrap();
    data
}

pub fn texinfo(s: [f32; 4], t: [f32; 4], flags: u32, texdata_id: i32) -> Vec<u8> {
    let mut data = Vec::new();
    for c in s.iter().chain(t.iter()) {
        data.write_f32::<LittleEndian>(*c).unwrap();
    }
    for _ in 0..8 {
        data.write_f32::<LittleEndian>(0.0).unwrap();
    }
    data.write_i32::<LittleEndian>(flags as i32).unwrap();
    data.write_i32::<LittleEndian>(texdata_id).unwrap();
    data
}

pub fn texdata(name_id: i32, width: i32, height: i32) -> Vec<u8> {
    let mut data = Vec::new();
    write_vector3(&mut data, [0.5; 3]);
    for v in [name_id, width, height, width, height].iter() {
        data.write_i32::<LittleEndian>(*v).unwrap();
    }
    data
}

pub fn brush(side_id: i32, side_count: i32, contents: u32) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_i32::<LittleEndian>(side_id).unwrap();
    data.write_i32::<LittleEndian>(side_count).unwrap();
    data.write_i32::<LittleEndian>(contents as i32).unwrap();
    data
}

pub fn brush_side(plane_id: u16, texinfo_id: i16, bevel: bool) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_u16::<LittleEndian>(plane_id).unwrap();
    data.write_i16::<LittleEndian>(texinfo_id).unwrap();
    data.write_i16::<LittleEndian>(-1).unwrap();
    data.write_u8(bevel as u8).unwrap();
    data.write_u8(0).unwrap();
    data
}

pub fn model(min: [f32; 3], max: [f32; 3], head_node: i32, face_id: i32, face_count: i32) -> Vec<u8> {
    let mut data = Vec::new();
    write_vector3(&mut data, min);
    write_vector3(&mut data, max);
    write_vector3(&mut data, [0.0; 3]);
    data.write_i32::<LittleEndian>(head_node).unwrap();
    data.write_i32::<LittleEndian>(face_id).unwrap();
    data.write_i32::<LittleEndian>(face_count).unwrap();
    data
}

pub fn disp_info(start: [f32; 3], disp_vert_id: i32, power: i32, map_face: u16) -> Vec<u8> {
    let mut data = Vec::new();
    write_vector3(&mut data, start);
    data.write_i32::<LittleEndian>(disp_vert_id).unwrap();
    data.write_i32::<LittleEndian>(0).unwrap();
    data.write_i32::<LittleEndian>(power).unwrap();
    data.write_i32::<LittleEndian>(0).unwrap();
    data.write_f32::<LittleEndian>(45.0).unwrap();
    data.write_i32::<LittleEndian>(1).unwrap();
    data.write_u16::<LittleEndian>(map_face).unwrap();
    data.write_u16::<LittleEndian>(0).unwrap();
    data.write_i32::<LittleEndian>(0).unwrap();
    data.write_i32::<LittleEndian>(0).unwrap();
    data.extend_from_slice(&[0; 88]);
    for _ in 0..10 {
        data.write_u32::<LittleEndian>(0xffff_ffff).unwrap();
    }
    data
}

pub fn disp_vert(vec: [f32; 3], dist: f32, alpha: f32) -> Vec<u8> {
    let mut data = Vec::new();
    write_vector3(&mut data, vec);
    data.write_f32::<LittleEndian>(dist).unwrap();
    data.write_f32::<LittleEndian>(alpha).unwrap();
    data
}

fn write_name(data: &mut Vec<u8>, name: &str) {
    let mut bytes = name.as_bytes().to_vec();
    bytes.resize(PROP_NAME_LEN, 0);
    data.extend_from_slice(&bytes);
}

/// A static prop sub-lump with one leaf table entry and `count` props at `(i, 0, 0)`.
pub fn static_props(names: &[&str], count: usize, version: u16) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_i32::<LittleEndian>(names.len() as i32).unwrap();
    for name in names {
        write_name(&mut data, name);
    }

    data.write_i32::<LittleEndian>(1).unwrap();
    data.write_u16::<LittleEndian>(0).unwrap();

    data.write_i32::<LittleEndian>(count as i32).unwrap();
    for i in 0..count {
        write_vector3(&mut data, [i as f32, 0.0, 0.0]);
        write_vector3(&mut data, [0.0, 90.0, 0.0]);
        data.write_u16::<LittleEndian>(0).unwrap();
        data.write_u16::<LittleEndian>(0).unwrap();
        data.write_u16::<LittleEndian>(1).unwrap();
        data.write_u8(6).unwrap();
        data.write_u8(0).unwrap();
        data.write_i32::<LittleEndian>(0).unwrap();
        data.write_f32::<LittleEndian>(-1.0).unwrap();
        data.write_f32::<LittleEndian>(0.0).unwrap();
        write_vector3(&mut data, [0.0; 3]);

        if version >= 5 {
            data.write_f32::<LittleEndian>(1.0).unwrap();
        }
        if version >= 6 {
            data.write_u16::<LittleEndian>(0).unwrap();
            data.write_u16::<LittleEndian>(0).unwrap();
        }
        if version >= 10 {
            data.extend_from_slice(&[0; 8]);
            data.write_u32::<LittleEndian>(0).unwrap();
        }
    }

    data
}

/// A detail prop sub-lump with `sprite_count` unit sprites and `object_count` sprite objects.
pub fn detail_props(names: &[&str], sprite_count: usize, object_count: usize) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_i32::<LittleEndian>(names.len() as i32).unwrap();
    for name in names {
        write_name(&mut data, name);
    }

    data.write_i32::<LittleEndian>(sprite_count as i32).unwrap();
    for _ in 0..sprite_count {
        for v in [-8.0, 16.0, 8.0, 0.0, 0.0, 0.0, 1.0, 1.0].iter() {
            data.write_f32::<LittleEndian>(*v).unwrap();
        }
    }

    data.write_i32::<LittleEndian>(object_count as i32).unwrap();
    for i in 0..object_count {
        write_vector3(&mut data, [i as f32 * 64.0, 0.0, 0.0]);
        write_vector3(&mut data, [0.0, 0.0, 0.0]);
        data.write_u16::<LittleEndian>(0).unwrap();
        data.write_u16::<LittleEndian>(0).unwrap();
        data.extend_from_slice(&[255, 255, 255, 0]);
        data.write_u32::<LittleEndian>(0).unwrap();
        data.extend_from_slice(&[0, 0, 0, 0, 0]);
        data.extend_from_slice(&[0; 3]);
        data.write_u8(1).unwrap();
        data.extend_from_slice(&[0; 3]);
        data.write_f32::<LittleEndian>(1.0).unwrap();
    }

    data
}

/// Run-length encodes one visibility row per cluster, without using zero runs.
pub fn visibility(rows: &[&[u8]]) -> Vec<u8> {
    let mut data = Vec::new();
    let header_len = 4 + 8 * rows.len();
    data.write_i32::<LittleEndian>(rows.len() as i32).unwrap();

    let mut offset = header_len;
    for row in rows {
        data.write_i32::<LittleEndian>(offset as i32).unwrap();
        data.write_i32::<LittleEndian>(offset as i32).unwrap();
        offset += row.len();
    }

    for row in rows {
        data.extend_from_slice(row);
    }

    data
}

fn concat<I>(records: I) -> Vec<u8>
where
    I: IntoIterator<Item = Vec<u8>>,
{
    records.into_iter().flat_map(|r| r.into_iter()).collect()
}

pub fn u16s(values: &[u16]) -> Vec<u8> {
    let mut data = Vec::new();
    for v in values {
        data.write_u16::<LittleEndian>(*v).unwrap();
    }
    data
}

fn string_lumps(writer: &mut BspWriter, names: &[&str]) {
    let mut table = Vec::new();
    let mut strings = Vec::new();
    for name in names {
        table.push(strings.len() as i32);
        strings.extend_from_slice(name.as_bytes());
        strings.push(0);
    }

    writer.lump(
        BspLumpId::TexDataStringTable,
        concat(table.iter().map(|&t| surfedge(t))),
    );
    writer.lump(BspLumpId::TexDataStringData, strings);
}

/// The standard texinfo set: 0 is unused, 1 maps one texel per unit, 2 is `NODRAW` and 3 is `SKY`.
fn standard_texinfo(writer: &mut BspWriter) {
    writer.lump(
        BspLumpId::TexInfo,
        [
            texinfo([0.0; 4], [0.0; 4], 0, -1),
            texinfo([1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], 0, 0),
            texinfo([1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], 0x80, 0),
            texinfo([1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], 0x04, 0),
        ]
        .concat(),
    );
    writer.lump(BspLumpId::TexData, texdata(0, 128, 128));
    string_lumps(writer, &["BRICK/WALL01"]);
}

/// A single 128x128 face on the plane z = 0, facing up, under a node splitting at x = 64.
pub fn quad_map() -> BspWriter {
    let mut writer = BspWriter::new();
    writer
        .lump(
            BspLumpId::Planes,
            [plane([0.0, 0.0, 1.0], 0.0), plane([1.0, 0.0, 0.0], 64.0)].concat(),
        )
        .lump(
            BspLumpId::Vertexes,
            [
                vertex([0.0, 0.0, 0.0]),
                vertex([0.0, 128.0, 0.0]),
                vertex([128.0, 128.0, 0.0]),
                vertex([128.0, 0.0, 0.0]),
            ]
            .concat(),
        )
        .lump(
            BspLumpId::Edges,
            [edge(0, 0), edge(0, 1), edge(1, 2), edge(2, 3), edge(3, 0)].concat(),
        )
        .lump(
            BspLumpId::Surfedges,
            concat([1, 2, 3, 4].iter().map(|&s| surfedge(s))),
        )
        .lump(BspLumpId::Faces, face(0, 0, 4, 1))
        .lump(BspLumpId::Nodes, node(1, [-1, -2], 0, 1))
        .lump(BspLumpId::Leafs, [leaf(0, 0, 1, 0, 0), leaf(1, 1, 0, 0, 0)].concat())
        .lump_version(BspLumpId::Leafs, 1)
        .lump(BspLumpId::LeafFaces, u16s(&[0]))
        .lump(
            BspLumpId::Models,
            model([0.0; 3], [128.0, 128.0, 0.0], 0, 0, 1),
        );
    standard_texinfo(&mut writer);
    writer
}

/// Two faces under a two-node tree.
///
/// Node 0 splits at x = 64 with leaf 0 in front and node 1 behind. Node 1 splits at y = 64 into
/// leaves 1 and 2. Leaf 0 holds face 0, leaves 1 and 2 both hold face 1. Leaves 0 and 1 hold
/// brush 0.
pub fn split_map() -> BspWriter {
    let mut writer = BspWriter::new();
    writer
        .lump(
            BspLumpId::Planes,
            [
                plane([0.0, 0.0, 1.0], 0.0),
                plane([1.0, 0.0, 0.0], 64.0),
                plane([0.0, 1.0, 0.0], 64.0),
            ]
            .concat(),
        )
        .lump(
            BspLumpId::Vertexes,
            [
                vertex([64.0, 0.0, 0.0]),
                vertex([64.0, 128.0, 0.0]),
                vertex([128.0, 128.0, 0.0]),
                vertex([128.0, 0.0, 0.0]),
                vertex([0.0, 0.0, 0.0]),
                vertex([0.0, 128.0, 0.0]),
            ]
            .concat(),
        )
        .lump(
            BspLumpId::Edges,
            [
                edge(0, 0),
                edge(0, 1),
                edge(1, 2),
                edge(2, 3),
                edge(3, 0),
                edge(4, 5),
                edge(5, 1),
                edge(0, 4),
            ]
            .concat(),
        )
        .lump(
            BspLumpId::Surfedges,
            concat([1, 2, 3, 4, 5, 6, -1, 7].iter().map(|&s| surfedge(s))),
        )
        .lump(BspLumpId::Faces, [face(0, 0, 4, 1), face(0, 4, 4, 1)].concat())
        .lump(
            BspLumpId::Nodes,
            [node(1, [-1, 1], 0, 2), node(2, [-2, -3], 1, 1)].concat(),
        )
        .lump(
            BspLumpId::Leafs,
            [
                leaf(0, 0, 1, 0, 1),
                leaf(1, 1, 1, 1, 1),
                leaf(2, 2, 1, 0, 0),
            ]
            .concat(),
        )
        .lump_version(BspLumpId::Leafs, 1)
        .lump(BspLumpId::LeafFaces, u16s(&[0, 1, 1]))
        .lump(BspLumpId::LeafBrushes, u16s(&[0, 0]))
        .lump(
            BspLumpId::Models,
            model([0.0; 3], [128.0, 128.0, 0.0], 0, 0, 2),
        );
    standard_texinfo(&mut writer);
    writer
}

/// Two perpendicular 128x128 faces meeting along the edge from (0, 0, 0) to (0, 128, 0).
///
/// Face 0 lies on z = 0 facing up, face 1 lies on x = 0 facing -x and drops to z = -128. Their
/// smoothing groups and texinfos are given per face.
pub fn corner_map(smoothing_groups: [u32; 2], texinfo_ids: [i16; 2]) -> BspWriter {
    let mut writer = BspWriter::new();
    writer
        .lump(
            BspLumpId::Planes,
            [plane([0.0, 0.0, 1.0], 0.0), plane([1.0, 0.0, 0.0], 0.0)].concat(),
        )
        .lump(
            BspLumpId::Vertexes,
            [
                vertex([0.0, 0.0, 0.0]),
                vertex([0.0, 128.0, 0.0]),
                vertex([128.0, 128.0, 0.0]),
                vertex([128.0, 0.0, 0.0]),
                vertex([0.0, 128.0, -128.0]),
                vertex([0.0, 0.0, -128.0]),
            ]
            .concat(),
        )
        .lump(
            BspLumpId::Edges,
            [
                edge(0, 0),
                edge(0, 1),
                edge(1, 2),
                edge(2, 3),
                edge(3, 0),
                edge(1, 4),
                edge(4, 5),
                edge(5, 0),
            ]
            .concat(),
        )
        .lump(
            BspLumpId::Surfedges,
            concat([1, 2, 3, 4, -1, -7, -6, -5].iter().map(|&s| surfedge(s))),
        )
        .lump(
            BspLumpId::Faces,
            [
                face_ex(0, 0, 0, 4, texinfo_ids[0], -1, smoothing_groups[0]),
                face_ex(1, 1, 4, 4, texinfo_ids[1], -1, smoothing_groups[1]),
            ]
            .concat(),
        )
        .lump(BspLumpId::Nodes, node(0, [-1, -2], 0, 2))
        .lump(BspLumpId::Leafs, [leaf(0, 0, 2, 0, 0), leaf(1, 2, 0, 0, 0)].concat())
        .lump_version(BspLumpId::Leafs, 1)
        .lump(BspLumpId::LeafFaces, u16s(&[0, 1]))
        .lump(
            BspLumpId::Models,
            model([0.0, 0.0, -128.0], [128.0, 128.0, 0.0], 0, 0, 2),
        );
    standard_texinfo(&mut writer);
    writer
}

/// A 128x128 face on z = 0 and a triangle on x = 0 that touches it only at the origin.
///
/// Both faces use texinfo 1 and the given smoothing groups.
pub fn pinch_map(smoothing_groups: u32) -> BspWriter {
    let mut writer = BspWriter::new();
    writer
        .lump(
            BspLumpId::Planes,
            [plane([0.0, 0.0, 1.0], 0.0), plane([1.0, 0.0, 0.0], 0.0)].concat(),
        )
        .lump(
            BspLumpId::Vertexes,
            [
                vertex([0.0, 0.0, 0.0]),
                vertex([0.0, 128.0, 0.0]),
                vertex([128.0, 128.0, 0.0]),
                vertex([128.0, 0.0, 0.0]),
                vertex([0.0, 0.0, -128.0]),
                vertex([0.0, -128.0, -128.0]),
            ]
            .concat(),
        )
        .lump(
            BspLumpId::Edges,
            [
                edge(0, 0),
                edge(0, 1),
                edge(1, 2),
                edge(2, 3),
                edge(3, 0),
                edge(0, 4),
                edge(4, 5),
                edge(5, 0),
            ]
            .concat(),
        )
        .lump(
            BspLumpId::Surfedges,
            concat([1, 2, 3, 4, -7, -6, -5].iter().map(|&s| surfedge(s))),
        )
        .lump(
            BspLumpId::Faces,
            [
                face_ex(0, 0, 0, 4, 1, -1, smoothing_groups),
                face_ex(1, 1, 4, 3, 1, -1, smoothing_groups),
            ]
            .concat(),
        )
        .lump(BspLumpId::Nodes, node(0, [-1, -2], 0, 2))
        .lump(BspLumpId::Leafs, [leaf(0, 0, 2, 0, 0), leaf(1, 2, 0, 0, 0)].concat())
        .lump_version(BspLumpId::Leafs, 1)
        .lump(BspLumpId::LeafFaces, u16s(&[0, 1]))
        .lump(
            BspLumpId::Models,
            model([0.0, -128.0, -128.0], [128.0, 128.0, 0.0], 0, 0, 2),
        );
    standard_texinfo(&mut writer);
    writer
}

/// A map holding a single axis-aligned cube brush spanning -64 to 64 on every axis.
///
/// The brush's top side uses texinfo `top_texinfo`; every other side uses texinfo 1.
pub fn cube_map(top_texinfo: i16) -> BspWriter {
    let mut writer = BspWriter::new();
    writer
        .lump(
            BspLumpId::Planes,
            [
                plane([1.0, 0.0, 0.0], 64.0),
                plane([-1.0, 0.0, 0.0], 64.0),
                plane([0.0, 1.0, 0.0], 64.0),
                plane([0.0, -1.0, 0.0], 64.0),
                plane([0.0, 0.0, 1.0], 64.0),
                plane([0.0, 0.0, -1.0], 64.0),
            ]
            .concat(),
        )
        .lump(BspLumpId::Brushes, brush(0, 6, 1))
        .lump(
            BspLumpId::BrushSides,
            [
                brush_side(0, 1, false),
                brush_side(1, 1, false),
                brush_side(2, 1, false),
                brush_side(3, 1, false),
                brush_side(4, top_texinfo, false),
                brush_side(5, 1, false),
            ]
            .concat(),
        );
    standard_texinfo(&mut writer);
    writer
}

/// The quad map with its face turned into a flat power-2 displacement.
///
/// The center vertex is raised 10 units and the first vertex has full alpha.
pub fn displacement_map() -> BspWriter {
    let mut writer = quad_map();
    let mut verts = Vec::new();
    for i in 0..25 {
        let dist = if i == 12 { 10.0 } else { 0.0 };
        let alpha = if i == 0 { 255.0 } else { 0.0 };
        verts.push(disp_vert([0.0, 0.0, 1.0], dist, alpha));
    }

    writer
        .lump(BspLumpId::Faces, face_ex(0, 0, 0, 4, 1, 0, 0))
        .lump(BspLumpId::DispInfo, disp_info([0.0; 3], 0, 2, 0))
        .lump(BspLumpId::DispVerts, verts.concat());
    writer
}
