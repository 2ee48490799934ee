use glam::{Mat4, Vec2, Vec3, Vec4};

/// 2D orthographic camera.
///
/// The visible half-extent along each axis is the dimension divided by the
/// aspect ratio, so a 16x9 camera sees x in `[-9, 9]`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthoCamera {
    pub position: Vec2,
    /// World units per second.
    pub move_speed: f32,
    dimension: Vec2,
    aspect: f32,
    projection: Mat4,
}

impl OrthoCamera {
    pub fn new(width: f32, height: f32) -> Self {
        let mut camera = Self {
            position: Vec2::ZERO,
            move_speed: 2.5,
            dimension: Vec2::ONE,
            aspect: 1.0,
            projection: Mat4::IDENTITY,
        };
        camera.resize(width, height);
        camera
    }

    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.dimension = Vec2::new(width.max(f32::EPSILON), height.max(f32::EPSILON));
        self.aspect = self.dimension.x / self.dimension.y;
        let half = self.dimension / self.aspect;
        self.projection = Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, -1.0, 1.0);
    }

    pub fn dimension(&self) -> Vec2 {
        self.dimension
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        view_at(self.position)
    }

    /// Projection times view.
    pub fn combined(&self) -> Mat4 {
        self.combined_at(self.position)
    }

    /// Combined matrix as if the camera stood at `position`.
    pub fn combined_at(&self, position: Vec2) -> Mat4 {
        self.projection * view_at(position)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Clip-space position of a world point.
    pub fn project(&self, point: Vec3) -> Vec3 {
        let clip = self.combined() * Vec4::from((point, 1.0));
        clip.truncate() / clip.w
    }
}

fn view_at(position: Vec2) -> Mat4 {
    Mat4::from_translation(Vec3::new(-position.x, -position.y, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn half_extent_is_dimension_over_aspect() {
        let cam = OrthoCamera::new(16.0, 9.0);
        assert!((cam.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
        assert!(close(cam.project(Vec3::ZERO), Vec3::new(0.0, 0.0, 0.5)));
        assert!(close(cam.project(Vec3::new(9.0, 0.0, 0.0)), Vec3::new(1.0, 0.0, 0.5)));
    }

    #[test]
    fn moving_left_shifts_world_right() {
        let mut cam = OrthoCamera::new(16.0, 9.0);
        let before = cam.project(Vec3::ZERO);
        cam.translate(Vec2::new(-1.0, 0.0));
        let after = cam.project(Vec3::ZERO);
        assert!(after.x > before.x);
        assert_eq!(cam.position, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn combined_at_ignores_stored_position() {
        let mut cam = OrthoCamera::new(16.0, 9.0);
        let at_origin = cam.combined();
        cam.position = Vec2::new(3.0, 1.0);
        assert_eq!(cam.combined_at(Vec2::ZERO), at_origin);
        assert_ne!(cam.combined(), at_origin);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut cam = OrthoCamera::new(16.0, 9.0);
        cam.resize(10.0, 10.0);
        assert_eq!(cam.aspect_ratio(), 1.0);
        assert_eq!(cam.dimension(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn zero_height_does_not_divide_by_zero() {
        let cam = OrthoCamera::new(16.0, 0.0);
        assert!(cam.aspect_ratio().is_finite());
        assert!(cam.combined().is_finite());
    }
}
