use crate::math::{make_perspective_fov, DirectionalLightData, Mat4, Transform, Vec3, Vec4};

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub transform: Transform,
    pub fov_y: f32,
    pub aspect_ratio: f32,
    pub near_clip: f32,
    pub far_clip: f32,
}

impl Camera {
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            transform: Transform {
                translate: Vec3::new(0.0, 0.0, -10.0),
                ..Default::default()
            },
            fov_y: 0.45,
            aspect_ratio,
            near_clip: 0.1,
            far_clip: 100.0,
        }
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        make_perspective_fov(self.fov_y, self.aspect_ratio, self.near_clip, self.far_clip)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec4,
    direction: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            direction: Vec3::NEG_Y,
            intensity: 1.0,
        }
    }
}

impl DirectionalLight {
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Zero-length directions are ignored.
    pub fn set_direction(&mut self, direction: Vec3) {
        if let Some(d) = direction.try_normalize() {
            self.direction = d;
        }
    }

    pub fn data(&self) -> DirectionalLightData {
        DirectionalLightData {
            color: self.color.to_array(),
            direction: self.direction.to_array(),
            intensity: self.intensity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_is_inverse_of_camera_world() {
        let camera = Camera::new(16.0 / 9.0);
        let p = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, 10.0), 1e-5), "{p}");

        let identity = camera.view_matrix() * camera.world_matrix();
        assert!(identity.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn points_in_front_of_camera_land_in_depth_range() {
        let camera = Camera::new(16.0 / 9.0);
        let vp = camera.view_projection_matrix();

        let near = vp * Vec4::new(0.0, 0.0, -10.0 + 0.1, 1.0);
        let far = vp * Vec4::new(0.0, 0.0, -10.0 + 100.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-4);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);

        let origin = vp * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let depth = origin.z / origin.w;
        assert!(depth > 0.0 && depth < 1.0);
    }

    #[test]
    fn light_direction_is_normalized() {
        let mut light = DirectionalLight::default();
        light.set_direction(Vec3::new(0.0, -2.0, 2.0));
        assert!((light.direction().length() - 1.0).abs() < 1e-6);

        let before = light.direction();
        light.set_direction(Vec3::ZERO);
        assert_eq!(light.direction(), before);

        assert_eq!(light.data().intensity, 1.0);
    }
}
