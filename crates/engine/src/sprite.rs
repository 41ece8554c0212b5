//! Screen-space sprite geometry.
//!
//! Positions and sizes are in pixels with the origin at the top-left corner of
//! the client area. The GPU side lives in `gfx::sprite`.

use crate::math::{make_affine, make_orthographic, Mat4, TransformationMatrix, Vec2, Vec3, Vec4, VertexData};
use crate::texture::TextureMetadata;

pub const INDICES: [u32; 6] = [0, 1, 2, 1, 3, 2];

/// Flipping on one axis reverses the winding of the quad, so sprites are
/// drawn without back-face culling.
pub const CULL_BACK_FACES: bool = false;

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteState {
    pub position: Vec2,
    pub rotation: f32,
    pub size: Vec2,
    pub color: Vec4,
    /// `(0, 0)` is the top-left of the quad and `(1, 1)` the bottom-right.
    pub anchor_point: Vec2,
    pub is_flip_x: bool,
    pub is_flip_y: bool,
    /// Texture rectangle in texels.
    pub texture_left_top: Vec2,
    pub texture_size: Vec2,
}

impl Default for SpriteState {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            size: Vec2::new(640.0, 360.0),
            color: Vec4::ONE,
            anchor_point: Vec2::ZERO,
            is_flip_x: false,
            is_flip_y: false,
            texture_left_top: Vec2::ZERO,
            texture_size: Vec2::new(100.0, 100.0),
        }
    }
}

impl SpriteState {
    /// Makes the sprite show the whole texture at its native size.
    pub fn adjust_texture_size(&mut self, metadata: TextureMetadata) {
        self.texture_left_top = Vec2::ZERO;
        self.texture_size = Vec2::new(metadata.width as f32, metadata.height as f32);
        self.size = self.texture_size;
    }

    /// Unit quad in the order bottom-left, top-left, bottom-right, top-right.
    pub fn vertices(&self, metadata: TextureMetadata) -> [VertexData; 4] {
        let mut left = -self.anchor_point.x;
        let mut right = 1.0 - self.anchor_point.x;
        let mut top = -self.anchor_point.y;
        let mut bottom = 1.0 - self.anchor_point.y;

        if self.is_flip_x {
            left = -left;
            right = -right;
        }
        if self.is_flip_y {
            top = -top;
            bottom = -bottom;
        }

        let width = metadata.width as f32;
        let height = metadata.height as f32;
        let tex_left = self.texture_left_top.x / width;
        let tex_right = (self.texture_left_top.x + self.texture_size.x) / width;
        let tex_top = self.texture_left_top.y / height;
        let tex_bottom = (self.texture_left_top.y + self.texture_size.y) / height;

        let vertex = |x: f32, y: f32, u: f32, v: f32| VertexData {
            position: [x, y, 0.0, 1.0],
            texcoord: [u, v],
            normal: [0.0, 0.0, -1.0],
        };

        [
            vertex(left, bottom, tex_left, tex_bottom),
            vertex(left, top, tex_left, tex_top),
            vertex(right, bottom, tex_right, tex_bottom),
            vertex(right, top, tex_right, tex_top),
        ]
    }

    pub fn world_matrix(&self) -> Mat4 {
        make_affine(
            Vec3::new(self.size.x, self.size.y, 1.0),
            Vec3::new(0.0, 0.0, self.rotation),
            Vec3::new(self.position.x, self.position.y, 0.0),
        )
    }

    pub fn transformation(&self, client_width: u32, client_height: u32) -> TransformationMatrix {
        let world = self.world_matrix();
        let view = Mat4::IDENTITY;
        let projection =
            make_orthographic(0.0, 0.0, client_width as f32, client_height as f32, 0.0, 100.0);
        TransformationMatrix::new(&(projection * view * world), &world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXTURE: TextureMetadata = TextureMetadata {
        width: 512,
        height: 256,
        mip_levels: 10,
    };

    fn positions(vertices: &[VertexData; 4]) -> Vec<[f32; 2]> {
        vertices.iter().map(|v| [v.position[0], v.position[1]]).collect()
    }

    #[test]
    fn adjust_texture_size_uses_the_whole_texture() {
        let mut sprite = SpriteState::default();
        sprite.texture_left_top = Vec2::new(3.0, 4.0);
        sprite.adjust_texture_size(TEXTURE);

        assert_eq!(sprite.texture_left_top, Vec2::ZERO);
        assert_eq!(sprite.texture_size, Vec2::new(512.0, 256.0));
        assert_eq!(sprite.size, Vec2::new(512.0, 256.0));
    }

    #[test]
    fn default_quad_spans_unit_square() {
        let mut sprite = SpriteState::default();
        sprite.adjust_texture_size(TEXTURE);
        let vertices = sprite.vertices(TEXTURE);

        assert_eq!(
            positions(&vertices),
            vec![[0.0, 1.0], [0.0, 0.0], [1.0, 1.0], [1.0, 0.0]]
        );
        assert_eq!(vertices[0].texcoord, [0.0, 1.0]);
        assert_eq!(vertices[3].texcoord, [1.0, 0.0]);
    }

    #[test]
    fn anchor_point_centres_the_quad() {
        let sprite = SpriteState {
            anchor_point: Vec2::splat(0.5),
            ..Default::default()
        };
        assert_eq!(
            positions(&sprite.vertices(TEXTURE)),
            vec![[-0.5, 0.5], [-0.5, -0.5], [0.5, 0.5], [0.5, -0.5]]
        );
    }

    #[test]
    fn flip_mirrors_around_the_anchor() {
        let sprite = SpriteState {
            is_flip_x: true,
            is_flip_y: true,
            ..Default::default()
        };
        assert_eq!(
            positions(&sprite.vertices(TEXTURE)),
            vec![[0.0, -1.0], [0.0, 0.0], [-1.0, -1.0], [-1.0, 0.0]]
        );
    }

    #[test]
    fn texture_rectangle_becomes_uvs() {
        let sprite = SpriteState {
            texture_left_top: Vec2::new(128.0, 64.0),
            texture_size: Vec2::new(256.0, 128.0),
            ..Default::default()
        };
        let vertices = sprite.vertices(TEXTURE);
        assert_eq!(vertices[1].texcoord, [0.25, 0.25]);
        assert_eq!(vertices[2].texcoord, [0.75, 0.75]);
    }

    #[test]
    fn screen_corners_map_to_clip_corners() {
        let sprite = SpriteState {
            position: Vec2::new(0.0, 0.0),
            size: Vec2::new(1280.0, 720.0),
            ..Default::default()
        };
        let t = sprite.transformation(1280, 720);
        let wvp = Mat4::from_cols_array(&t.wvp);

        let top_left = wvp * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let bottom_right = wvp * Vec4::new(1.0, 1.0, 0.0, 1.0);
        assert!(top_left.abs_diff_eq(Vec4::new(-1.0, 1.0, 0.0, 1.0), 1e-5), "{top_left}");
        assert!(bottom_right.abs_diff_eq(Vec4::new(1.0, -1.0, 0.0, 1.0), 1e-5), "{bottom_right}");
        assert_eq!(Mat4::from_cols_array(&t.world), sprite.world_matrix());
    }

    /// Signed clip-space area of each triangle; D3D treats negative
    /// (clockwise) as front facing.
    fn signed_areas(sprite: &SpriteState) -> Vec<f32> {
        let wvp = Mat4::from_cols_array(&sprite.transformation(1280, 720).wvp);
        let clip: Vec<Vec2> = sprite
            .vertices(TEXTURE)
            .iter()
            .map(|v| {
                let p = wvp * Vec4::from_array(v.position);
                Vec2::new(p.x / p.w, p.y / p.w)
            })
            .collect();

        INDICES
            .chunks_exact(3)
            .map(|t| {
                let (a, b, c) = (clip[t[0] as usize], clip[t[1] as usize], clip[t[2] as usize]);
                (b - a).perp_dot(c - a)
            })
            .collect()
    }

    fn is_drawn(area: f32) -> bool {
        !CULL_BACK_FACES || area < 0.0
    }

    #[test]
    fn single_axis_flip_reverses_winding() {
        let plain = SpriteState::default();
        let flip_x = SpriteState {
            is_flip_x: true,
            ..Default::default()
        };
        let flip_y = SpriteState {
            is_flip_y: true,
            ..Default::default()
        };
        let flip_both = SpriteState {
            is_flip_x: true,
            is_flip_y: true,
            ..Default::default()
        };

        for area in signed_areas(&plain) {
            assert!(area < 0.0, "{area}");
        }
        for area in signed_areas(&flip_x).into_iter().chain(signed_areas(&flip_y)) {
            assert!(area > 0.0, "{area}");
        }
        for area in signed_areas(&flip_both) {
            assert!(area < 0.0, "{area}");
        }
    }

    #[test]
    fn flipped_sprites_are_not_culled() {
        for (is_flip_x, is_flip_y) in [(false, false), (true, false), (false, true), (true, true)] {
            let sprite = SpriteState {
                is_flip_x,
                is_flip_y,
                ..Default::default()
            };
            for area in signed_areas(&sprite) {
                assert!(is_drawn(area), "flip ({is_flip_x}, {is_flip_y}) culled, area {area}");
            }
        }
    }
}
