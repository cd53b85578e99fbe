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

//! Source engine BSP ("VBSP") file and data structure handling.
//!
//! # Data Structure
//!
//! A compiled map is a binary space partitioning tree. Each internal node splits space with a
//! plane; each child represents one side of the plane. The leaves of the tree are convex regions
//! of space which reference the faces and brushes touching them. The world and every brush entity
//! are stored as separate models, each with its own head node.
//!
//! # File Format
//!
//! The header begins with the magic number `VBSP` and a 32-bit version number. This is followed
//! by a directory of 64 lumps, each consisting of a 32-bit offset, a 32-bit size, a 32-bit lump
//! version and a four-byte identifier, and finally a 32-bit map revision. All values are
//! little-endian.
//!
//! Most lumps are flat arrays of fixed-size records. The lump size must be an exact multiple of
//! the record size.
//!
//! ## Entities
//!
//! Lump 0 holds the entity text, stored in the same brace-delimited key-value format used by
//! earlier engines. It is stored as a NUL-terminated string.
//!
//! ## Faces and edges
//!
//! Faces reference a run of "surfedges", which are signed indices into the edge lump. A
//! non-negative surfedge traverses its edge from the first vertex to the second; a negative one
//! traverses edge `-surfedge` in reverse. Face vertices are stored clockwise when viewed from the
//! front of the face.
//!
//! ## Nodes
//!
//! Node children are stored as signed 32-bit integers. Non-negative values are node indices;
//! negative values encode leaf index `-1 - child`.
//!
//! ## Game lumps
//!
//! Lump 35 is a directory of engine-specific sub-lumps identified by a four-character code.
//! Unlike the main lumps, sub-lump offsets are absolute file offsets. Static props (`sprp`) and
//! detail props (`dprp`) are stored here.

mod error;
pub mod gamelump;
mod load;
mod polygon;
mod tree;
#[cfg(test)]
pub(crate) mod test_util;

use cgmath::{InnerSpace, Vector2, Vector3};

pub use self::{
    error::{BspError, BspErrorKind, BspWarning},
    gamelump::{
        DetailObject, DetailPropLump, DetailPropType, DetailSprite, GameLump, StaticProp,
        StaticPropLump, StaticPropVersion,
    },
    load::{load, load_file, BspHeader, BspLump, VBSP_MAGIC, VBSP_MIN_VERSION},
    polygon::{BspPolygon, MAX_SURFINFO_VERTS},
};

pub const LUMP_COUNT: usize = 64;
pub const MAX_MAP_LEAFFACES: usize = 65536;
pub const MAX_MAP_LEAFBRUSHES: usize = 65536;
pub const MAX_DISP_POWER: i32 = 4;

#[derive(Copy, Clone, Debug, Eq, FromPrimitive, Hash, PartialEq)]
pub enum BspLumpId {
    Entities = 0,
    Planes = 1,
    TexData = 2,
    Vertexes = 3,
    Visibility = 4,
    Nodes = 5,
    TexInfo = 6,
    Faces = 7,
    Lighting = 8,
    Occlusion = 9,
    Leafs = 10,
    FaceIds = 11,
    Edges = 12,
    Surfedges = 13,
    Models = 14,
    WorldLights = 15,
    LeafFaces = 16,
    LeafBrushes = 17,
    Brushes = 18,
    BrushSides = 19,
    Areas = 20,
    AreaPortals = 21,
    Unused22 = 22,
    Unused23 = 23,
    Unused24 = 24,
    Unused25 = 25,
    DispInfo = 26,
    OriginalFaces = 27,
    PhysDisp = 28,
    PhysCollide = 29,
    VertNormals = 30,
    VertNormalIndices = 31,
    DispLightmapAlphas = 32,
    DispVerts = 33,
    DispLightmapSamplePositions = 34,
    GameLump = 35,
    LeafWaterData = 36,
    Primitives = 37,
    PrimVerts = 38,
    PrimIndices = 39,
    PakFile = 40,
    ClipPortalVerts = 41,
    Cubemaps = 42,
    TexDataStringData = 43,
    TexDataStringTable = 44,
    Overlays = 45,
    LeafMinDistToWater = 46,
    FaceMacroTextureInfo = 47,
    DispTris = 48,
    PhysCollideSurface = 49,
    WaterOverlays = 50,
    LeafAmbientIndexHdr = 51,
    LeafAmbientIndex = 52,
    LightingHdr = 53,
    WorldLightsHdr = 54,
    LeafAmbientLightingHdr = 55,
    LeafAmbientLighting = 56,
    XzipPakFile = 57,
    FacesHdr = 58,
    MapFlags = 59,
    OverlayFades = 60,
    OverlaySystemLevels = 61,
    PhysLevel = 62,
    DispMultiBlend = 63,
}

bitflags! {
    pub struct SurfaceFlags: u32 {
        const LIGHT = 0x0001;
        const SKY2D = 0x0002;
        const SKY = 0x0004;
        const WARP = 0x0008;
        const TRANS = 0x0010;
        const NOPORTAL = 0x0020;
        const TRIGGER = 0x0040;
        const NODRAW = 0x0080;
        const HINT = 0x0100;
        const SKIP = 0x0200;
        const NOLIGHT = 0x0400;
        const BUMPLIGHT = 0x0800;
        const NOSHADOWS = 0x1000;
        const NODECALS = 0x2000;
        const NOCHOP = 0x4000;
        const HITBOX = 0x8000;
    }
}

impl SurfaceFlags {
    /// Flags of surfaces which are never drawn.
    pub fn invisible() -> SurfaceFlags {
        SurfaceFlags::NODRAW | SurfaceFlags::HINT | SurfaceFlags::SKIP | SurfaceFlags::TRIGGER
    }

    pub fn sky() -> SurfaceFlags {
        SurfaceFlags::SKY | SurfaceFlags::SKY2D
    }
}

bitflags! {
    pub struct BspContents: u32 {
        const SOLID = 0x0000_0001;
        const WINDOW = 0x0000_0002;
        const AUX = 0x0000_0004;
        const GRATE = 0x0000_0008;
        const SLIME = 0x0000_0010;
        const WATER = 0x0000_0020;
        const BLOCKLOS = 0x0000_0040;
        const OPAQUE = 0x0000_0080;
        const TESTFOGVOLUME = 0x0000_0100;
        const TEAM1 = 0x0000_0800;
        const TEAM2 = 0x0000_1000;
        const IGNORE_NODRAW_OPAQUE = 0x0000_2000;
        const MOVEABLE = 0x0000_4000;
        const AREAPORTAL = 0x0000_8000;
        const PLAYERCLIP = 0x0001_0000;
        const MONSTERCLIP = 0x0002_0000;
        const ORIGIN = 0x0100_0000;
        const MONSTER = 0x0200_0000;
        const DEBRIS = 0x0400_0000;
        const DETAIL = 0x0800_0000;
        const TRANSLUCENT = 0x1000_0000;
        const LADDER = 0x2000_0000;
        const HITBOX = 0x4000_0000;
    }
}

bitflags! {
    pub struct DispTriTags: u16 {
        const SURFACE = 0x01;
        const WALKABLE = 0x02;
        const BUILDABLE = 0x04;
        const SURFPROP1 = 0x08;
        const SURFPROP2 = 0x10;
    }
}

/// A splitting plane.
///
/// `sign_bits` is derived from the normal when the plane is created: bit `j` is set if component
/// `j` of the normal is negative.
#[derive(Clone, Debug, PartialEq)]
pub struct BspPlane {
    normal: Vector3<f32>,
    dist: f32,
    kind: i32,
    sign_bits: u8,
}

impl BspPlane {
    pub fn new(normal: Vector3<f32>, dist: f32, kind: i32) -> BspPlane {
        let mut sign_bits = 0;
        for j in 0..3 {
            if normal[j] < 0.0 {
                sign_bits |= 1 << j;
            }
        }

        BspPlane {
            normal,
            dist,
            kind,
            sign_bits,
        }
    }

    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    pub fn dist(&self) -> f32 {
        self.dist
    }

    /// The axis-alignment type stored with the plane.
    pub fn kind(&self) -> i32 {
        self.kind
    }

    pub fn sign_bits(&self) -> u8 {
        self.sign_bits
    }

    pub fn point_dist(&self, point: Vector3<f32>) -> f32 {
        point.dot(self.normal) - self.dist
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BspNodeChild {
    Node(usize),
    Leaf(usize),
}

#[derive(Clone, Debug)]
pub struct BspNode {
    pub plane_id: usize,
    pub children: [BspNodeChild; 2],
    pub min: [i16; 3],
    pub max: [i16; 3],
    pub face_id: usize,
    pub face_count: usize,
    pub area: i16,
}

#[derive(Clone, Debug)]
pub struct BspLeaf {
    pub contents: BspContents,
    /// Visibility cluster, or `None` if the leaf is outside the visible world.
    pub cluster: Option<usize>,
    pub area: u16,
    pub flags: u8,
    pub min: [i16; 3],
    pub max: [i16; 3],
    pub leafface_id: usize,
    pub leafface_count: usize,
    pub leafbrush_id: usize,
    pub leafbrush_count: usize,
    pub water_data_id: i16,
}

#[derive(Clone, Debug)]
pub struct BspEdge {
    pub vertex_ids: [u16; 2],
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BspEdgeDirection {
    Forward = 0,
    Backward = 1,
}

#[derive(Clone, Debug)]
pub struct BspEdgeIndex {
    pub direction: BspEdgeDirection,
    pub index: usize,
}

impl BspEdgeIndex {
    pub fn from_surfedge(surfedge: i32) -> BspEdgeIndex {
        if surfedge < 0 {
            BspEdgeIndex {
                direction: BspEdgeDirection::Backward,
                index: -(surfedge as i64) as usize,
            }
        } else {
            BspEdgeIndex {
                direction: BspEdgeDirection::Forward,
                index: surfedge as usize,
            }
        }
    }

    /// Returns the vertex indices of this edge in traversal order, or `None` if the edge does not
    /// exist.
    pub fn endpoints(&self, edges: &[BspEdge]) -> Option<[usize; 2]> {
        let edge = edges.get(self.index)?;
        let [a, b] = edge.vertex_ids;
        Some(match self.direction {
            BspEdgeDirection::Forward => [a as usize, b as usize],
            BspEdgeDirection::Backward => [b as usize, a as usize],
        })
    }
}

#[derive(Clone, Debug)]
pub struct BspFace {
    pub plane_id: usize,
    /// Nonzero if the face points away from its plane's normal.
    pub side: u8,
    pub on_node: bool,
    pub edge_id: i32,
    pub edge_count: i16,
    pub texinfo_id: i16,
    pub dispinfo_id: i16,
    pub fog_volume_id: i16,
    pub light_styles: [u8; 4],
    pub light_offset: i32,
    pub area: f32,
    pub lightmap_mins: [i32; 2],
    pub lightmap_size: [i32; 2],
    pub original_face_id: i32,
    pub primitive_count: u16,
    pub primitive_id: u16,
    pub smoothing_groups: u32,
}

impl BspFace {
    pub fn texinfo(&self) -> Option<usize> {
        match self.texinfo_id {
            t if t < 0 => None,
            t => Some(t as usize),
        }
    }

    pub fn dispinfo(&self) -> Option<usize> {
        match self.dispinfo_id {
            d if d < 0 => None,
            d => Some(d as usize),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BspTexInfo {
    /// Texture projection vectors. Components 0 to 2 are the axis and component 3 is the offset.
    pub texture_vecs: [[f32; 4]; 2],
    pub lightmap_vecs: [[f32; 4]; 2],
    pub flags: SurfaceFlags,
    pub texdata_id: i32,
}

impl BspTexInfo {
    /// Projects a point onto this texinfo's texture axes, in texels.
    pub fn texel_coords(&self, point: Vector3<f32>) -> Vector2<f32> {
        let [s, t] = self.texture_vecs;
        Vector2::new(
            point.dot(Vector3::new(s[0], s[1], s[2])) + s[3],
            point.dot(Vector3::new(t[0], t[1], t[2])) + t[3],
        )
    }
}

#[derive(Clone, Debug)]
pub struct BspTexData {
    pub reflectivity: Vector3<f32>,
    pub name_id: i32,
    pub width: i32,
    pub height: i32,
    pub view_width: i32,
    pub view_height: i32,
}

#[derive(Clone, Debug)]
pub struct BspBrush {
    pub side_id: usize,
    pub side_count: usize,
    pub contents: BspContents,
}

#[derive(Clone, Debug)]
pub struct BspBrushSide {
    pub plane_id: usize,
    pub texinfo_id: i16,
    pub dispinfo_id: i16,
    pub bevel: bool,
    pub thin: bool,
}

#[derive(Clone, Debug)]
pub struct BspModel {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
    pub origin: Vector3<f32>,
    pub head_node: usize,
    pub face_id: usize,
    pub face_count: usize,
}

#[derive(Clone, Debug)]
pub struct BspDispInfo {
    pub start_position: Vector3<f32>,
    pub disp_vert_id: usize,
    pub disp_tri_id: usize,
    pub power: i32,
    pub min_tess: i32,
    pub smoothing_angle: f32,
    pub contents: BspContents,
    pub map_face: usize,
    pub lightmap_alpha_id: i32,
    pub lightmap_sample_position_id: i32,
    pub allowed_verts: [u32; 10],
}

impl BspDispInfo {
    /// Number of vertices along one side of the displacement grid.
    pub fn side_len(&self) -> usize {
        (1 << self.power) + 1
    }

    pub fn vertex_count(&self) -> usize {
        self.side_len() * self.side_len()
    }
}

#[derive(Clone, Debug)]
pub struct BspDispVert {
    pub vec: Vector3<f32>,
    pub dist: f32,
    pub alpha: f32,
}

#[derive(Clone, Debug)]
pub struct BspCubemap {
    pub origin: [i32; 3],
    pub size: i32,
}

/// Parsed contents of a map file.
///
/// All indices stored in the records are indices into the corresponding slices of this structure.
#[derive(Debug)]
pub struct BspData {
    pub(crate) header: BspHeader,
    pub(crate) entities: String,
    pub(crate) planes: Box<[BspPlane]>,
    pub(crate) vertices: Box<[Vector3<f32>]>,
    pub(crate) edges: Box<[BspEdge]>,
    pub(crate) edgelist: Box<[BspEdgeIndex]>,
    pub(crate) nodes: Box<[BspNode]>,
    pub(crate) leaves: Box<[BspLeaf]>,
    pub(crate) faces: Box<[BspFace]>,
    pub(crate) original_faces: Box<[BspFace]>,
    pub(crate) texinfo: Box<[BspTexInfo]>,
    pub(crate) texdata: Box<[BspTexData]>,
    pub(crate) texture_names: Box<[String]>,
    pub(crate) brushes: Box<[BspBrush]>,
    pub(crate) brush_sides: Box<[BspBrushSide]>,
    pub(crate) leaf_faces: Box<[u16]>,
    pub(crate) leaf_brushes: Box<[u16]>,
    pub(crate) models: Box<[BspModel]>,
    pub(crate) disp_infos: Box<[BspDispInfo]>,
    pub(crate) disp_verts: Box<[BspDispVert]>,
    pub(crate) disp_tris: Box<[DispTriTags]>,
    pub(crate) cubemaps: Box<[BspCubemap]>,
    pub(crate) game_lumps: Box<[GameLump]>,
    pub(crate) static_props: Option<StaticPropLump>,
    pub(crate) detail_props: Option<DetailPropLump>,
    pub(crate) visibility: Option<Box<[Vec<usize>]>>,
    pub(crate) polygons: Box<[Option<BspPolygon>]>,
    pub(crate) skipped_faces: usize,
    pub(crate) warnings: Vec<BspWarning>,
}

impl BspData {
    pub fn header(&self) -> &BspHeader {
        &self.header
    }

    pub fn version(&self) -> i32 {
        self.header.version
    }

    pub fn map_revision(&self) -> i32 {
        self.header.map_revision
    }

    /// Returns the entity text exactly as stored, without the terminating NUL.
    pub fn entities(&self) -> &str {
        &self.entities
    }

    pub fn planes(&self) -> &[BspPlane] {
        &self.planes
    }

    pub fn vertices(&self) -> &[Vector3<f32>] {
        &self.vertices
    }

    pub fn edges(&self) -> &[BspEdge] {
        &self.edges
    }

    pub fn edgelist(&self) -> &[BspEdgeIndex] {
        &self.edgelist
    }

    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    pub fn leaves(&self) -> &[BspLeaf] {
        &self.leaves
    }

    pub fn faces(&self) -> &[BspFace] {
        &self.faces
    }

    pub fn original_faces(&self) -> &[BspFace] {
        &self.original_faces
    }

    pub fn texinfo(&self) -> &[BspTexInfo] {
        &self.texinfo
    }

    pub fn texdata(&self) -> &[BspTexData] {
        &self.texdata
    }

    /// Texture names, indexed by texdata.
    pub fn texture_names(&self) -> &[String] {
        &self.texture_names
    }

    pub fn brushes(&self) -> &[BspBrush] {
        &self.brushes
    }

    pub fn brush_sides(&self) -> &[BspBrushSide] {
        &self.brush_sides
    }

    pub fn leaf_faces(&self) -> &[u16] {
        &self.leaf_faces
    }

    pub fn leaf_brushes(&self) -> &[u16] {
        &self.leaf_brushes
    }

    pub fn models(&self) -> &[BspModel] {
        &self.models
    }

    pub fn disp_infos(&self) -> &[BspDispInfo] {
        &self.disp_infos
    }

    pub fn disp_verts(&self) -> &[BspDispVert] {
        &self.disp_verts
    }

    pub fn disp_tris(&self) -> &[DispTriTags] {
        &self.disp_tris
    }

    pub fn cubemaps(&self) -> &[BspCubemap] {
        &self.cubemaps
    }

    pub fn game_lumps(&self) -> &[GameLump] {
        &self.game_lumps
    }

    pub fn static_props(&self) -> Option<&StaticPropLump> {
        self.static_props.as_ref()
    }

    pub fn detail_props(&self) -> Option<&DetailPropLump> {
        self.detail_props.as_ref()
    }

    /// Reconstructed face polygons, indexed by face. Faces which could not be reconstructed are
    /// `None`.
    pub fn polygons(&self) -> &[Option<BspPolygon>] {
        &self.polygons
    }

    pub fn polygon(&self, face_id: usize) -> Option<&BspPolygon> {
        self.polygons.get(face_id).and_then(|p| p.as_ref())
    }

    /// Number of faces skipped during polygon reconstruction.
    pub fn skipped_faces(&self) -> usize {
        self.skipped_faces
    }

    pub fn warnings(&self) -> &[BspWarning] {
        &self.warnings
    }

    /// Returns the list of clusters visible from `cluster`, if visibility was decoded.
    pub fn visible_clusters(&self, cluster: usize) -> Option<&[usize]> {
        self.visibility.as_ref()?.get(cluster).map(|v| &v[..])
    }

    pub fn visibility(&self) -> Option<&[Vec<usize>]> {
        self.visibility.as_ref().map(|v| &v[..])
    }

    pub fn face_texinfo(&self, face_id: usize) -> Option<&BspTexInfo> {
        let face = self.faces.get(face_id)?;
        self.texinfo.get(face.texinfo()?)
    }

    pub fn texinfo_texdata(&self, texinfo: &BspTexInfo) -> Option<&BspTexData> {
        if texinfo.texdata_id < 0 {
            return None;
        }

        self.texdata.get(texinfo.texdata_id as usize)
    }

    /// Returns the texture name referenced by a texinfo, or `None` if it has no texture data.
    pub fn texinfo_texture_name(&self, texinfo: &BspTexInfo) -> Option<&str> {
        if texinfo.texdata_id < 0 {
            return None;
        }

        self.texture_names
            .get(texinfo.texdata_id as usize)
            .map(|s| s.as_str())
    }

    /// Returns the vertices of a face in traversal order.
    ///
    /// Unlike [`BspData::polygon`], this does not apply the polygon skip rules. Returns `None` if
    /// any index along the way is out of range.
    pub fn face_vertices(&self, face_id: usize) -> Option<Vec<Vector3<f32>>> {
        let face = self.faces.get(face_id)?;
        if face.edge_id < 0 || face.edge_count < 0 {
            return None;
        }

        let first = face.edge_id as usize;
        let count = face.edge_count as usize;
        let mut verts = Vec::with_capacity(count);
        for edge_index in self.edgelist.get(first..first + count)? {
            let [start, _] = edge_index.endpoints(&self.edges)?;
            verts.push(*self.vertices.get(start)?);
        }

        Some(verts)
    }

    /// Returns the face normal of a face, accounting for which side of its plane it faces.
    pub fn face_normal(&self, face_id: usize) -> Option<Vector3<f32>> {
        let face = self.faces.get(face_id)?;
        let normal = self.planes.get(face.plane_id)?.normal();
        Some(if face.side != 0 { -normal } else { normal })
    }
}
