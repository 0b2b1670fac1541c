use crate::ecs::{look_rotation, Ray};
use glam::{Quat, UVec2, Vec2, Vec3};

/// Perspective camera. Looks down its local +Z axis with +Y up and +X towards screen right.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, rotation: Quat, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { position, rotation, fov_y_radians, near, far }
    }

    pub fn looking_at(position: Vec3, target: Vec3, up: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        let rotation = look_rotation(target - position, up).unwrap_or(Quat::IDENTITY);
        Self::new(position, rotation, fov_y_radians, near, far)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    fn aspect(viewport: UVec2) -> f32 {
        if viewport.y == 0 {
            1.0
        } else {
            viewport.x as f32 / viewport.y as f32
        }
    }

    /// Generates a world-space ray originating from the camera through a screen-space position.
    /// Screen space has its origin at the top-left corner with y growing downwards.
    pub fn screen_ray(&self, screen: Vec2, viewport: UVec2) -> Option<Ray> {
        if viewport.x == 0 || viewport.y == 0 {
            return None;
        }
        let ndc_x = (2.0 * screen.x / viewport.x as f32) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / viewport.y as f32);
        let tan_half = (self.fov_y_radians * 0.5).tan();
        let local = Vec3::new(ndc_x * tan_half * Self::aspect(viewport), ndc_y * tan_half, 1.0);
        let dir = (self.rotation * local).normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        Some(Ray::new(self.position, dir))
    }

    pub fn project_point(&self, point: Vec3, viewport: UVec2) -> Option<Vec2> {
        if viewport.x == 0 || viewport.y == 0 {
            return None;
        }
        let local = self.rotation.inverse() * (point - self.position);
        if local.z <= self.near.max(f32::EPSILON) {
            return None;
        }
        let tan_half = (self.fov_y_radians * 0.5).tan();
        let ndc_x = local.x / (local.z * tan_half * Self::aspect(viewport));
        let ndc_y = local.y / (local.z * tan_half);
        let x = (ndc_x + 1.0) * 0.5 * viewport.x as f32;
        let y = (1.0 - ndc_y) * 0.5 * viewport.y as f32;
        Some(Vec2::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera3D {
        Camera3D::looking_at(Vec3::new(0.0, 1.0, -5.0), Vec3::ZERO, Vec3::Y, 60.0_f32.to_radians(), 0.1, 1000.0)
    }

    #[test]
    fn centre_ray_points_forward() {
        let cam = camera();
        let viewport = UVec2::new(1280, 720);
        let ray = cam.screen_ray(Vec2::new(640.0, 360.0), viewport).expect("ray");
        assert!((ray.direction - cam.forward()).length() < 1e-5);
    }

    #[test]
    fn project_point_inverts_screen_ray() {
        let cam = camera();
        let viewport = UVec2::new(800, 600);
        let point = Vec3::new(0.7, -0.3, 1.5);
        let screen = cam.project_point(point, viewport).expect("point in front of camera");
        let ray = cam.screen_ray(screen, viewport).expect("ray");
        let to_point = (point - cam.position).normalize();
        assert!((ray.direction - to_point).length() < 1e-4, "ray {:?} vs {:?}", ray.direction, to_point);
    }

    #[test]
    fn screen_right_matches_camera_right() {
        let cam = camera();
        let viewport = UVec2::new(800, 600);
        let right = cam.project_point(cam.right() * 0.5, viewport).expect("visible");
        let centre = cam.project_point(Vec3::ZERO, viewport).expect("visible");
        assert!(right.x > centre.x);
    }

    #[test]
    fn zero_viewport_yields_no_ray() {
        assert!(camera().screen_ray(Vec2::ZERO, UVec2::ZERO).is_none());
    }
}
