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

use crate::{
    common::{
        bsp::{BspData, DetailPropType},
        math::{self, Angles},
    },
    import::mesh::{MeshBuilder, MeshDescription, MeshVertex},
};

use cgmath::{Angle, Deg, InnerSpace, Vector2, Vector3};

/// Material used for sprite detail props when the map doesn't name one.
pub const DETAIL_SPRITE_MATERIAL: &str = "detail/detailsprites";

/// Where a static prop model should be placed, in target space.
#[derive(Clone, Debug, PartialEq)]
pub struct PropPlacement {
    pub model: String,
    pub origin: Vector3<f32>,
    pub angles: Angles,
    pub skin: i32,
    pub solid: u8,
}

/// Returns the placement of every static prop with a valid model name.
pub fn static_prop_placements(bsp: &BspData) -> Vec<PropPlacement> {
    let lump = match bsp.static_props() {
        Some(l) => l,
        None => return Vec::new(),
    };

    lump.props
        .iter()
        .filter_map(|prop| {
            let model = match lump.prop_model(prop) {
                Some(m) => m,
                None => {
                    warn!("Static prop references invalid model {}", prop.model_id);
                    return None;
                }
            };

            Some(PropPlacement {
                model: model.to_lowercase().replace('\\', "/"),
                origin: math::to_target_space(prop.origin),
                angles: Angles::from_vector(prop.angles).to_target_space(),
                skin: prop.skin,
                solid: prop.solid,
            })
        })
        .collect()
}

/// Renders every sprite detail object as an upright quad turned by its yaw.
pub fn render_detail_props_to_mesh(bsp: &BspData) -> MeshDescription {
    let mut builder = MeshBuilder::new();

    let lump = match bsp.detail_props() {
        Some(l) => l,
        None => return builder.build(),
    };

    let material = builder.material(DETAIL_SPRITE_MATERIAL);

    for object in lump.objects.iter() {
        if object.kind != Some(DetailPropType::Sprite) {
            continue;
        }

        let sprite = match lump.sprites.get(object.model_id) {
            Some(s) => s,
            None => continue,
        };

        let yaw = Deg(object.angles.y);
        let right = Vector3::new(yaw.sin(), -yaw.cos(), 0.0);
        let up = Vector3::unit_z();
        let normal = right.cross(up).normalize();

        let corner = |s: f32, t: f32, uv: Vector2<f32>| {
            MeshVertex::new(
                object.origin + (right * s + up * t) * object.scale,
                normal,
                uv,
            )
        };

        let (ul, lr) = (sprite.upper_left, sprite.lower_right);
        let (tul, tlr) = (sprite.tex_upper_left, sprite.tex_lower_right);
        let quad = [
            corner(ul.x, ul.y, tul),
            corner(lr.x, ul.y, Vector2::new(tlr.x, tul.y)),
            corner(lr.x, lr.y, tlr),
            corner(ul.x, lr.y, Vector2::new(tul.x, tlr.y)),
        ];

        builder.add_polygon(&quad, material);
    }

    builder.build()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::{
        bsp::{load, test_util},
        config::BspImportConfig,
    };

    use std::io::Cursor;

    #[test]
    fn test_static_prop_placements() {
        let bsp = test_util::quad_map()
            .game_lump(
                *b"sprp",
                6,
                test_util::static_props(&["Models\\Props\\Crate.mdl"], 2, 6),
            )
            .load();

        let placements = static_prop_placements(&bsp);
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[1].model, "models/props/crate.mdl");
        assert_eq!(placements[1].origin, Vector3::new(1.905, 0.0, 0.0));
        assert_eq!(placements[1].angles.yaw, Deg(-90.0));
        assert_eq!(placements[1].solid, 6);
    }

    #[test]
    fn test_no_static_props() {
        let bsp = test_util::quad_map().load();
        assert!(static_prop_placements(&bsp).is_empty());
    }

    #[test]
    fn test_detail_sprites() {
        let data = test_util::quad_map()
            .game_lump(*b"dprp", 4, test_util::detail_props(&[], 1, 3))
            .finish();
        let config = BspImportConfig {
            import_detail_objects: false,
            ..BspImportConfig::default()
        };
        let bsp = load(Cursor::new(data), &config).unwrap();

        let mesh = render_detail_props_to_mesh(&bsp);
        assert_eq!(mesh.triangle_count(), 6);
        assert_eq!(mesh.vertices.len(), 12);
        assert_eq!(mesh.materials, vec![DETAIL_SPRITE_MATERIAL.to_owned()]);

        let (min, max) = mesh.bounds().unwrap();
        assert!(min.z.abs() < 0.001);
        assert!((max.z - 16.0 * 1.905).abs() < 0.001);
        assert!((max.x - 128.0 * 1.905).abs() < 0.001);

        // yaw 0 sprites face -x
        for v in mesh.vertices.iter() {
            assert!((v.normal - Vector3::new(-1.0, 0.0, 0.0)).magnitude() < 0.001);
        }
    }

    #[test]
    fn test_detail_objects_skipped() {
        let bsp = test_util::quad_map()
            .game_lump(*b"dprp", 4, test_util::detail_props(&[], 1, 3))
            .load();
        assert!(render_detail_props_to_mesh(&bsp).is_empty());
    }
}
