use glam::{Mat4, Vec3};

/// Perspective camera as the viewer frames it. Angles are degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(eye: Vec3, fov_y: f32) -> Self {
        Self {
            eye,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y,
            near: 0.1,
            far: 100.0,
        }
    }

    /// Pulls the camera back along its current horizontal heading until a
    /// sphere of diameter `size_to_fit` around `box_center` fills the vertical
    /// field of view. Clip planes scale with `box_size`.
    pub fn frame_area(&mut self, size_to_fit: f32, box_size: f32, box_center: Vec3) {
        let half_size_to_fit = size_to_fit * 0.5;
        let half_fov_y = (self.fov_y * 0.5).to_radians();
        let distance = half_size_to_fit / half_fov_y.tan();

        let direction = ((self.eye - box_center) * Vec3::new(1.0, 0.0, 1.0))
            .try_normalize()
            .unwrap_or(Vec3::Z);

        self.eye = direction * distance + box_center;
        self.target = box_center;
        self.near = box_size / 100.0;
        self.far = box_size * 100.0;
    }

    pub fn distance(&self) -> f32 {
        self.eye.distance(self.target)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn clip_planes_scale_with_box() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 1.0), 35.0);
        camera.frame_area(10.0, 10.0, Vec3::ZERO);

        assert_relative_eq!(camera.near, 0.1, epsilon = 1e-6);
        assert_relative_eq!(camera.far, 1000.0, epsilon = 1e-3);
        assert_relative_eq!(camera.far / camera.near, 10_000.0, epsilon = 1e-1);

        let expected = 5.0 / (17.5_f32).to_radians().tan();
        assert_relative_eq!(camera.distance(), expected, epsilon = 1e-4);
    }

    #[test]
    fn framing_keeps_horizontal_heading() {
        let mut camera = Camera::new(Vec3::new(3.0, 7.0, 4.0), 35.0);
        let center = Vec3::new(1.0, 2.0, 3.0);
        camera.frame_area(4.0, 4.0, center);

        let offset = camera.eye - center;
        assert_relative_eq!(offset.y, 0.0);
        assert_relative_eq!(offset.x / offset.z, 2.0 / 1.0, epsilon = 1e-5);
        assert_eq!(camera.target, center);
    }

    #[test]
    fn framing_is_idempotent() {
        let mut camera = Camera::new(Vec3::new(-2.0, 1.0, 5.0), 35.0);
        camera.frame_area(6.0, 6.0, Vec3::new(0.5, 0.5, 0.5));
        let first = camera;
        camera.frame_area(6.0, 6.0, Vec3::new(0.5, 0.5, 0.5));

        assert_relative_eq!(camera.eye.x, first.eye.x, epsilon = 1e-5);
        assert_relative_eq!(camera.eye.z, first.eye.z, epsilon = 1e-5);
        assert_eq!(camera.near, first.near);
        assert_eq!(camera.far, first.far);
    }

    #[test]
    fn camera_straight_above_falls_back_to_z() {
        let mut camera = Camera::new(Vec3::new(0.0, 10.0, 0.0), 35.0);
        camera.frame_area(2.0, 2.0, Vec3::ZERO);

        assert_relative_eq!(camera.eye.x, 0.0);
        assert!(camera.eye.z > 0.0);
    }

    #[test]
    fn framed_center_projects_to_screen_center() {
        let mut camera = Camera::new(Vec3::new(1.0, 0.0, 1.0), 35.0);
        camera.frame_area(3.0, 3.0, Vec3::new(0.0, 1.0, 0.0));

        let clip = camera.view_projection(16.0 / 9.0).project_point3(Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(clip.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y, 0.0, epsilon = 1e-5);
        assert!(clip.z > -1.0 && clip.z < 1.0);
    }
}
