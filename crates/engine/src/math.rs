pub use glam::*;

/// Scale, then rotate about X, Y and Z (in that order), then translate.
pub fn make_affine(scale: Vec3, rotate: Vec3, translate: Vec3) -> Mat4 {
    Mat4::from_translation(translate)
        * Mat4::from_rotation_z(rotate.z)
        * Mat4::from_rotation_y(rotate.y)
        * Mat4::from_rotation_x(rotate.x)
        * Mat4::from_scale(scale)
}

/// Left-handed perspective projection mapping depth to `[0, 1]`.
pub fn make_perspective_fov(fov_y: f32, aspect_ratio: f32, near_clip: f32, far_clip: f32) -> Mat4 {
    Mat4::perspective_lh(fov_y, aspect_ratio, near_clip, far_clip)
}

/// Orthographic projection for screen-space coordinates: `(left, top)` maps to
/// the upper-left corner of clip space and `(right, bottom)` to the lower-right.
pub fn make_orthographic(
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    near_clip: f32,
    far_clip: f32,
) -> Mat4 {
    Mat4::orthographic_lh(left, right, bottom, top, near_clip, far_clip)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: Vec3,
    pub rotate: Vec3,
    pub translate: Vec3,
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        make_affine(self.scale, self.rotate, self.translate)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            rotate: Vec3::ZERO,
            translate: Vec3::ZERO,
        }
    }
}

// GPU-facing layouts. Plain arrays keep them free of SIMD alignment padding.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct VertexData {
    pub position: [f32; 4],
    pub texcoord: [f32; 2],
    pub normal: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Material {
    pub color: [f32; 4],
    pub enable_lighting: i32,
    pub padding: [f32; 3],
    pub uv_transform: [f32; 16],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [1.0; 4],
            enable_lighting: 0,
            padding: [0.0; 3],
            uv_transform: Mat4::IDENTITY.to_cols_array(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct TransformationMatrix {
    pub wvp: [f32; 16],
    pub world: [f32; 16],
}

impl TransformationMatrix {
    pub fn new(wvp: &Mat4, world: &Mat4) -> Self {
        Self {
            wvp: wvp.to_cols_array(),
            world: world.to_cols_array(),
        }
    }
}

impl Default for TransformationMatrix {
    fn default() -> Self {
        Self::new(&Mat4::IDENTITY, &Mat4::IDENTITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct DirectionalLightData {
    pub color: [f32; 4],
    pub direction: [f32; 3],
    pub intensity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn assert_vec3_near(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, 1e-5), "{a} != {b}");
    }

    #[test]
    fn affine_applies_scale_rotation_translation_in_order() {
        let m = make_affine(
            Vec3::new(2.0, 1.0, 1.0),
            Vec3::new(0.0, 0.0, FRAC_PI_2),
            Vec3::new(10.0, 0.0, 0.0),
        );
        // (1,0,0) -> scaled (2,0,0) -> rotated (0,2,0) -> translated (10,2,0)
        assert_vec3_near(m.transform_point3(Vec3::X), Vec3::new(10.0, 2.0, 0.0));
    }

    #[test]
    fn rotation_order_is_x_then_y_then_z() {
        let m = make_affine(Vec3::ONE, Vec3::new(FRAC_PI_2, FRAC_PI_2, 0.0), Vec3::ZERO);
        // Y axis: rotate X by 90 -> +Z, then rotate Y by 90 -> +X
        assert_vec3_near(m.transform_point3(Vec3::Y), Vec3::X);
    }

    #[test]
    fn orthographic_maps_screen_corners() {
        let m = make_orthographic(0.0, 0.0, 1280.0, 720.0, 0.0, 100.0);
        assert_vec3_near(m.project_point3(Vec3::ZERO), Vec3::new(-1.0, 1.0, 0.0));
        assert_vec3_near(
            m.project_point3(Vec3::new(1280.0, 720.0, 100.0)),
            Vec3::new(1.0, -1.0, 1.0),
        );
    }

    #[test]
    fn perspective_maps_near_and_far_to_unit_depth() {
        let m = make_perspective_fov(0.45, 16.0 / 9.0, 0.1, 100.0);
        let near = m.project_point3(Vec3::new(0.0, 0.0, 0.1));
        let far = m.project_point3(Vec3::new(0.0, 0.0, 100.0));
        assert!((near.z - 0.0).abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn transform_inverse_round_trips() {
        let t = Transform {
            scale: Vec3::new(1.0, 2.0, 3.0),
            rotate: Vec3::new(0.3, -0.2, 1.1),
            translate: Vec3::new(4.0, 5.0, -6.0),
        };
        let m = t.matrix();
        let p = Vec3::new(0.5, -1.5, 2.0);
        assert_vec3_near(m.inverse().transform_point3(m.transform_point3(p)), p);
    }

    #[test]
    fn gpu_layouts_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<VertexData>(), 36);
        assert_eq!(std::mem::size_of::<Material>(), 96);
        assert_eq!(std::mem::size_of::<TransformationMatrix>(), 128);
        assert_eq!(std::mem::size_of::<DirectionalLightData>(), 32);
    }
}
