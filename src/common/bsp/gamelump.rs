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

//! Game lump directory and the static and detail prop sub-lumps.

use std::io::{Read, Seek, SeekFrom};

use crate::common::{
    bsp::{load::read_vector3, BspErrorKind, BspLump},
    util::read_fixed_cstring,
};

use byteorder::{LittleEndian, ReadBytesExt};
use cgmath::{Vector2, Vector3};
use failure::{Error, ResultExt};
use num::FromPrimitive;

/// Game lump identifiers are four-character codes stored big-end first.
pub const fn game_lump_id(code: [u8; 4]) -> i32 {
    (code[0] as i32) << 24 | (code[1] as i32) << 16 | (code[2] as i32) << 8 | code[3] as i32
}

pub const STATIC_PROP_LUMP_ID: i32 = game_lump_id(*b"sprp");
pub const DETAIL_PROP_LUMP_ID: i32 = game_lump_id(*b"dprp");

pub const PROP_NAME_LEN: usize = 128;
const GAME_LUMP_ENTRY_SIZE: usize = 16;
const DETAIL_SPRITE_SIZE: usize = 32;
const DETAIL_OBJECT_SIZE: usize = 52;

#[derive(Clone, Debug)]
pub struct GameLump {
    pub id: i32,
    pub flags: u16,
    pub version: u16,
    /// Absolute offset into the file.
    pub offset: u64,
    pub size: usize,
}

impl GameLump {
    /// Returns the four-character code of this lump.
    pub fn code(&self) -> [u8; 4] {
        [
            (self.id >> 24) as u8,
            (self.id >> 16) as u8,
            (self.id >> 8) as u8,
            self.id as u8,
        ]
    }
}

pub fn read_directory<R>(reader: &mut R, lump: &BspLump) -> Result<Vec<GameLump>, Error>
where
    R: Read + Seek,
{
    let mut lumps = Vec::new();
    if lump.size == 0 {
        return Ok(lumps);
    }

    reader.seek(SeekFrom::Start(lump.offset))?;
    let count = read_count(reader, "game lump count")?;
    ensure!(
        4 + count * GAME_LUMP_ENTRY_SIZE <= lump.size,
        "Game lump directory of {} entries does not fit in {} bytes",
        count,
        lump.size
    );

    for _ in 0..count {
        let id = reader.read_i32::<LittleEndian>()?;
        let flags = reader.read_u16::<LittleEndian>()?;
        let version = reader.read_u16::<LittleEndian>()?;
        let offset = reader.read_i32::<LittleEndian>()?;
        let size = reader.read_i32::<LittleEndian>()?;
        ensure!(
            offset >= 0 && size >= 0,
            "Invalid game lump extent (offset {}, size {})",
            offset,
            size
        );

        let game_lump = GameLump {
            id,
            flags,
            version,
            offset: offset as u64,
            size: size as usize,
        };
        debug!(
            "Game lump {} version {} at 0x{:>08x}, 0x{:>08x} bytes",
            String::from_utf8_lossy(&game_lump.code()),
            version,
            offset,
            size
        );
        lumps.push(game_lump);
    }

    Ok(lumps)
}

pub fn find(lumps: &[GameLump], id: i32) -> Option<&GameLump> {
    lumps.iter().find(|l| l.id == id)
}

fn read_count<R>(reader: &mut R, what: &str) -> Result<usize, Error>
where
    R: ReadBytesExt,
{
    match reader.read_i32::<LittleEndian>()? {
        c if c < 0 => bail!("Invalid {} ({})", what, c),
        c => Ok(c as usize),
    }
}

fn read_name_dictionary<R>(reader: &mut R, lump_size: usize) -> Result<Vec<String>, Error>
where
    R: Read,
{
    let count = read_count(reader, "name dictionary size")?;
    ensure!(
        count.saturating_mul(PROP_NAME_LEN) <= lump_size,
        "Name dictionary of {} entries does not fit in {} bytes",
        count,
        lump_size
    );
    let mut names = Vec::with_capacity(count);
    for _ in 0..count {
        names.push(read_fixed_cstring(reader, PROP_NAME_LEN)?);
    }

    Ok(names)
}

fn read_vector2<R>(reader: &mut R) -> Result<Vector2<f32>, Error>
where
    R: ReadBytesExt,
{
    Ok(Vector2::new(
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
    ))
}

#[derive(Copy, Clone, Debug, Eq, FromPrimitive, PartialEq)]
pub enum StaticPropVersion {
    V4 = 4,
    V5 = 5,
    V6 = 6,
    V10 = 10,
}

impl StaticPropVersion {
    pub fn record_size(&self) -> usize {
        match *self {
            StaticPropVersion::V4 => 56,
            StaticPropVersion::V5 => 60,
            StaticPropVersion::V6 => 64,
            StaticPropVersion::V10 => 76,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StaticProp {
    pub origin: Vector3<f32>,
    /// Pitch, yaw and roll in degrees.
    pub angles: Vector3<f32>,
    pub model_id: usize,
    pub leaf_id: usize,
    pub leaf_count: usize,
    pub solid: u8,
    pub flags: u8,
    pub skin: i32,
    pub fade_min: f32,
    pub fade_max: f32,
    pub lighting_origin: Vector3<f32>,
    pub forced_fade_scale: Option<f32>,
    pub dx_level: Option<[u16; 2]>,
    pub cpu_gpu_levels: Option<[u8; 4]>,
    pub diffuse_modulation: Option<[u8; 4]>,
    pub flags_ex: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct StaticPropLump {
    pub version: StaticPropVersion,
    pub names: Vec<String>,
    pub props: Vec<StaticProp>,
}

impl StaticPropLump {
    pub fn prop_model(&self, prop: &StaticProp) -> Option<&str> {
        self.names.get(prop.model_id).map(|s| s.as_str())
    }
}

fn load_static_prop<R>(reader: &mut R, version: StaticPropVersion) -> Result<StaticProp, Error>
where
    R: Read,
{
    let origin = read_vector3(reader)?;
    let angles = read_vector3(reader)?;
    let model_id = reader.read_u16::<LittleEndian>()? as usize;
    let leaf_id = reader.read_u16::<LittleEndian>()? as usize;
    let leaf_count = reader.read_u16::<LittleEndian>()? as usize;
    let solid = reader.read_u8()?;
    let flags = reader.read_u8()?;
    let skin = reader.read_i32::<LittleEndian>()?;
    let fade_min = reader.read_f32::<LittleEndian>()?;
    let fade_max = reader.read_f32::<LittleEndian>()?;
    let lighting_origin = read_vector3(reader)?;

    let mut prop = StaticProp {
        origin,
        angles,
        model_id,
        leaf_id,
        leaf_count,
        solid,
        flags,
        skin,
        fade_min,
        fade_max,
        lighting_origin,
        forced_fade_scale: None,
        dx_level: None,
        cpu_gpu_levels: None,
        diffuse_modulation: None,
        flags_ex: None,
    };

    if version == StaticPropVersion::V4 {
        return Ok(prop);
    }

    prop.forced_fade_scale = Some(reader.read_f32::<LittleEndian>()?);

    if version == StaticPropVersion::V5 {
        return Ok(prop);
    }

    prop.dx_level = Some([
        reader.read_u16::<LittleEndian>()?,
        reader.read_u16::<LittleEndian>()?,
    ]);

    if version == StaticPropVersion::V10 {
        let mut levels = [0; 4];
        reader.read_exact(&mut levels)?;
        let mut modulation = [0; 4];
        reader.read_exact(&mut modulation)?;
        prop.cpu_gpu_levels = Some(levels);
        prop.diffuse_modulation = Some(modulation);
        prop.flags_ex = Some(reader.read_u32::<LittleEndian>()?);
    }

    Ok(prop)
}

/// Reads the static prop sub-lump.
///
/// A zero-length lump yields an empty result. Versions other than 4, 5, 6 and 10 are rejected.
pub fn read_static_props<R>(reader: &mut R, lump: &GameLump) -> Result<StaticPropLump, Error>
where
    R: Read + Seek,
{
    let version = match StaticPropVersion::from_u16(lump.version) {
        Some(v) => v,
        None if lump.size == 0 => StaticPropVersion::V4,
        None => {
            return Err(BspErrorKind::UnsupportedStaticPropVersion {
                version: lump.version,
            }
            .into())
        }
    };

    let mut result = StaticPropLump {
        version,
        names: Vec::new(),
        props: Vec::new(),
    };

    if lump.size == 0 {
        return Ok(result);
    }

    reader.seek(SeekFrom::Start(lump.offset))?;
    result.names = read_name_dictionary(reader, lump.size).context("Failed to read static prop names")?;

    // the leaf table is not used
    let leaf_count = read_count(reader, "static prop leaf count")?;
    reader.seek(SeekFrom::Current(2 * leaf_count as i64))?;

    let prop_count = read_count(reader, "static prop count")?;
    debug!(
        "{} static props (version {:?}), {} models",
        prop_count,
        version,
        result.names.len()
    );

    ensure!(
        prop_count.saturating_mul(version.record_size()) <= lump.size,
        "{} static props do not fit in {} bytes",
        prop_count,
        lump.size
    );
    result.props.reserve(prop_count);
    for _ in 0..prop_count {
        result.props.push(load_static_prop(reader, version)?);
    }

    Ok(result)
}

#[derive(Copy, Clone, Debug, Eq, FromPrimitive, PartialEq)]
pub enum DetailPropType {
    Model = 0,
    Sprite = 1,
    ShapeCross = 2,
    ShapeTri = 3,
}

#[derive(Clone, Debug)]
pub struct DetailSprite {
    pub upper_left: Vector2<f32>,
    pub lower_right: Vector2<f32>,
    pub tex_upper_left: Vector2<f32>,
    pub tex_lower_right: Vector2<f32>,
}

#[derive(Clone, Debug)]
pub struct DetailObject {
    pub origin: Vector3<f32>,
    pub angles: Vector3<f32>,
    /// Index into the name dictionary for models or the sprite dictionary for sprites.
    pub model_id: usize,
    pub leaf_id: usize,
    pub lighting: [u8; 4],
    pub light_styles: u32,
    pub light_style_count: u8,
    pub sway_amount: u8,
    pub shape_angle: u8,
    pub shape_size: u8,
    pub orientation: u8,
    pub kind: Option<DetailPropType>,
    pub scale: f32,
}

#[derive(Clone, Debug, Default)]
pub struct DetailPropLump {
    pub names: Vec<String>,
    pub sprites: Vec<DetailSprite>,
    pub objects: Vec<DetailObject>,
}

fn load_detail_sprite<R>(reader: &mut R) -> Result<DetailSprite, Error>
where
    R: ReadBytesExt,
{
    Ok(DetailSprite {
        upper_left: read_vector2(reader)?,
        lower_right: read_vector2(reader)?,
        tex_upper_left: read_vector2(reader)?,
        tex_lower_right: read_vector2(reader)?,
    })
}

fn load_detail_object<R>(reader: &mut R) -> Result<DetailObject, Error>
where
    R: ReadBytesExt,
{
    let origin = read_vector3(reader)?;
    let angles = read_vector3(reader)?;
    let model_id = reader.read_u16::<LittleEndian>()? as usize;
    let leaf_id = reader.read_u16::<LittleEndian>()? as usize;
    let mut lighting = [0; 4];
    reader.read_exact(&mut lighting)?;
    let light_styles = reader.read_u32::<LittleEndian>()?;
    let light_style_count = reader.read_u8()?;
    let sway_amount = reader.read_u8()?;
    let shape_angle = reader.read_u8()?;
    let shape_size = reader.read_u8()?;
    let orientation = reader.read_u8()?;
    let mut padding = [0; 3];
    reader.read_exact(&mut padding)?;
    let kind = DetailPropType::from_u8(reader.read_u8()?);
    reader.read_exact(&mut padding)?;
    let scale = reader.read_f32::<LittleEndian>()?;

    Ok(DetailObject {
        origin,
        angles,
        model_id,
        leaf_id,
        lighting,
        light_styles,
        light_style_count,
        sway_amount,
        shape_angle,
        shape_size,
        orientation,
        kind,
        scale,
    })
}

/// Reads the detail prop sub-lump.
///
/// The object array is only read when `import_detail_objects` is false; otherwise the result
/// holds the two dictionaries and no objects.
pub fn read_detail_props<R>(
    reader: &mut R,
    lump: &GameLump,
    import_detail_objects: bool,
) -> Result<DetailPropLump, Error>
where
    R: Read + Seek,
{
    let mut result = DetailPropLump::default();
    if lump.size == 0 {
        return Ok(result);
    }

    reader.seek(SeekFrom::Start(lump.offset))?;
    result.names = read_name_dictionary(reader, lump.size).context("Failed to read detail prop names")?;

    let sprite_count = read_count(reader, "detail sprite count")?;
    ensure!(
        sprite_count.saturating_mul(DETAIL_SPRITE_SIZE) <= lump.size,
        "Detail sprite dictionary does not fit in its lump"
    );
    result.sprites.reserve(sprite_count);
    for _ in 0..sprite_count {
        result.sprites.push(load_detail_sprite(reader)?);
    }

    if !import_detail_objects {
        let object_count = read_count(reader, "detail object count")?;
        ensure!(
            object_count.saturating_mul(DETAIL_OBJECT_SIZE) <= lump.size,
            "Detail objects do not fit in their lump"
        );
        result.objects.reserve(object_count);
        for _ in 0..object_count {
            result.objects.push(load_detail_object(reader)?);
        }
    }

    debug!(
        "{} detail models, {} detail sprites, {} detail objects",
        result.names.len(),
        result.sprites.len(),
        result.objects.len()
    );

    Ok(result)
}
